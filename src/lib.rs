//! # Tactus
//!
//! A beat estimation engine for live symbolic performance: given a batch of
//! timestamped note onsets, it infers the underlying periodic beat (period
//! and phase) with a two-stage algorithm, inter-onset-interval clustering
//! followed by multi-hypothesis agent tracking.
//!
//! ## Features
//!
//! - **Tempo induction**: IOI clustering produces ranked candidate beat
//!   periods inside a caller-supplied tempo range
//! - **Agent tracking**: a population of hypothesis trackers follows each
//!   candidate through the onsets, forking on ambiguous evidence and
//!   expiring when the evidence dries up
//! - **Deterministic**: identical batches always yield bit-identical results
//!
//! ## Quick Start
//!
//! ```
//! use tactus::{estimate_beat, EstimationConfig, Onset};
//!
//! // 50 quarter notes at 120 BPM
//! let onsets: Vec<Onset> = (0..50).map(|i| Onset::new(i * 500, 120, 60, 80)).collect();
//!
//! let beat = estimate_beat(&onsets, &EstimationConfig::default())?;
//! let beat = beat.expect("a periodic batch has a beat");
//! assert_eq!(beat.duration, 500);
//! assert_eq!(beat.phase, 0);
//! # Ok::<(), tactus::EstimationError>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Onset batch → IOI clustering → candidate periods → tracker population → Beat
//! ```
//!
//! Each call is stateless given its batch: continuity across successive
//! batches is the caller's concern.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod config;
pub mod error;
pub mod features;
pub mod onset;

// Re-export main types
pub use analysis::result::{Beat, EstimationMetadata};
pub use config::EstimationConfig;
pub use error::EstimationError;
pub use onset::Onset;

use features::induction::ioi_clustering::induce_beat;
use features::tracking::population::track_beat;

/// Estimate the beat underlying a sorted onset batch
///
/// Runs tempo induction over the batch's inter-onset intervals, tracks the
/// induced candidate periods with a population of hypothesis agents, and
/// returns the beat of the highest-scoring survivor.
///
/// # Arguments
///
/// * `onsets` - Note onsets sorted ascending by timestamp
/// * `config` - Tempo range to search
///
/// # Returns
///
/// `Some(Beat)` with the winning period and phase, or `None` when the batch
/// carries too little evidence (empty batch, no induced candidate, or an
/// entirely expired population).
///
/// # Errors
///
/// Returns `EstimationError::InvalidInput` for an invalid tempo range or an
/// unsorted batch.
///
/// # Example
///
/// ```
/// use tactus::{estimate_beat, EstimationConfig, Onset};
///
/// let onsets: Vec<Onset> = (0..16).map(|i| Onset::new(1000 + i * 400, 90, 52, 70)).collect();
/// let beat = estimate_beat(&onsets, &EstimationConfig::default())?;
/// assert!(beat.is_some());
/// # Ok::<(), tactus::EstimationError>(())
/// ```
pub fn estimate_beat(
    onsets: &[Onset],
    config: &EstimationConfig,
) -> Result<Option<Beat>, EstimationError> {
    estimate_beat_with_metadata(onsets, config).map(|(beat, _)| beat)
}

/// Estimate the beat and report per-call diagnostics
///
/// Same pipeline as [`estimate_beat`], additionally returning an
/// [`EstimationMetadata`] with input/candidate counts, the winning score,
/// and the processing time.
///
/// # Errors
///
/// Returns `EstimationError` under the same conditions as [`estimate_beat`].
pub fn estimate_beat_with_metadata(
    onsets: &[Onset],
    config: &EstimationConfig,
) -> Result<(Option<Beat>, EstimationMetadata), EstimationError> {
    use std::time::Instant;
    let start_time = Instant::now();

    config.validate()?;

    if !onsets.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
        return Err(EstimationError::InvalidInput(
            "Onset batch must be sorted by timestamp".to_string(),
        ));
    }

    log::debug!(
        "Starting beat estimation: {} onsets, range [{:.1}, {:.1}] BPM",
        onsets.len(),
        config.min_bpm,
        config.max_bpm
    );

    let candidates = induce_beat(onsets, config.min_bpm, config.max_bpm)?;

    let winner = if candidates.is_empty() {
        None
    } else {
        track_beat(onsets, &candidates)?
    };

    let beat = winner.as_ref().and_then(Beat::from_tracker);
    let metadata = EstimationMetadata {
        onset_count: onsets.len(),
        candidate_count: candidates.len(),
        best_score: winner.as_ref().map(|t| t.score()).unwrap_or(0.0),
        processing_time_ms: start_time.elapsed().as_secs_f32() * 1000.0,
    };

    match &beat {
        Some(beat) => log::debug!(
            "Estimated beat: {} ms period, {} ms phase ({:.1} BPM) in {:.2} ms",
            beat.duration,
            beat.phase,
            beat.bpm(),
            metadata.processing_time_ms
        ),
        None => log::debug!(
            "No beat estimate from {} onsets ({} candidates)",
            onsets.len(),
            candidates.len()
        ),
    }

    Ok((beat, metadata))
}
