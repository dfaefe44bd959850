//! Configuration parameters for beat estimation

use crate::error::EstimationError;

/// Beat estimation configuration parameters
///
/// Only the tempo search range is configurable. The clustering widths,
/// tracking margins, and correction factors of the underlying method are
/// fixed constants in their modules: downstream behavior depends on their
/// exact published values, so they are not exposed as knobs.
#[derive(Debug, Clone)]
pub struct EstimationConfig {
    /// Minimum tempo to consider in BPM (default: 60.0)
    ///
    /// Candidate beat periods are octave-adjusted (halved/doubled) until
    /// their implied tempo falls inside `[min_bpm, max_bpm]`; candidates
    /// that cannot be adjusted into the range are dropped.
    pub min_bpm: f64,

    /// Maximum tempo to consider in BPM (default: 180.0)
    pub max_bpm: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            min_bpm: 60.0,
            max_bpm: 180.0,
        }
    }
}

impl EstimationConfig {
    /// Validate the configured tempo range
    ///
    /// # Errors
    ///
    /// Returns `EstimationError::InvalidInput` if either bound is
    /// non-finite, `min_bpm` is not positive, or the range is inverted.
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !self.min_bpm.is_finite() || !self.max_bpm.is_finite() {
            return Err(EstimationError::InvalidInput(format!(
                "Tempo bounds must be finite, got [{}, {}]",
                self.min_bpm, self.max_bpm
            )));
        }

        if self.min_bpm <= 0.0 {
            return Err(EstimationError::InvalidInput(format!(
                "Minimum tempo must be > 0 BPM, got {:.1}",
                self.min_bpm
            )));
        }

        if self.min_bpm > self.max_bpm {
            return Err(EstimationError::InvalidInput(format!(
                "Inverted tempo range: [{:.1}, {:.1}] BPM",
                self.min_bpm, self.max_bpm
            )));
        }

        Ok(())
    }
}
