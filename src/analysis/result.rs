//! Estimation result types

use serde::{Deserialize, Serialize};

use crate::features::tracking::tracker::BeatTracker;

/// A periodic beat estimate
///
/// `duration` is the beat period in milliseconds and `phase` the offset of
/// the beat grid from time zero, with `phase` always in `[0, duration)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Beat {
    /// Beat period in milliseconds (always > 1)
    pub duration: i32,

    /// Beat grid offset in milliseconds, in `[0, duration)`
    pub phase: i32,
}

impl Beat {
    /// Round a winning tracker into a beat estimate
    ///
    /// Returns `None` for a degenerate rounded period (≤ 1 ms or beyond
    /// `i32`), which a tracker seeded from a normalized candidate cannot
    /// produce in practice.
    pub(crate) fn from_tracker(tracker: &BeatTracker) -> Option<Self> {
        let duration = tracker.beat_duration().round() as i64;
        if duration <= 1 || duration > i32::MAX as i64 {
            return None;
        }

        let phase = (tracker.prediction().round() as i64).rem_euclid(duration);
        Some(Self {
            duration: duration as i32,
            phase: phase as i32,
        })
    }

    /// Tempo implied by this beat period, in BPM
    pub fn bpm(&self) -> f64 {
        60_000.0 / self.duration as f64
    }
}

/// Diagnostics describing one estimation call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimationMetadata {
    /// Number of onsets in the batch
    pub onset_count: usize,

    /// Number of induced candidate periods
    pub candidate_count: usize,

    /// Score of the winning tracker (0.0 when no tracker survived)
    pub best_score: f64,

    /// Processing time in milliseconds
    pub processing_time_ms: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tracking::tracker::IdSource;

    #[test]
    fn test_from_tracker_rounds_and_wraps_phase() {
        let ids = IdSource::new();
        let tracker = BeatTracker::new(499.6, 1249.4, &ids).unwrap();

        let beat = Beat::from_tracker(&tracker).unwrap();
        assert_eq!(beat.duration, 500);
        // prediction 1249.4 rounds to 1249; 1249 mod 500 = 249
        assert_eq!(beat.phase, 249);
    }

    #[test]
    fn test_phase_is_non_negative_for_negative_timestamps() {
        let ids = IdSource::new();
        let tracker = BeatTracker::new(500.0, -750.0, &ids).unwrap();

        let beat = Beat::from_tracker(&tracker).unwrap();
        assert_eq!(beat.duration, 500);
        assert_eq!(beat.phase, 250);
        assert!(beat.phase >= 0 && beat.phase < beat.duration);
    }

    #[test]
    fn test_bpm_conversion() {
        let beat = Beat {
            duration: 500,
            phase: 0,
        };
        assert!((beat.bpm() - 120.0).abs() < 1e-9);
    }
}
