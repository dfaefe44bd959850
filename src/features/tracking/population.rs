//! Multi-hypothesis tracker population
//!
//! Seeds one tracker per (candidate period, plausible starting onset) pair
//! and drives the whole population through the onset sequence in a single
//! sweep, maintained as a priority queue ordered by each tracker's window
//! start. Ambiguous onsets fork new hypotheses; redundant hypotheses are
//! deduplicated on every pop; stale hypotheses expire. The caller receives
//! the single highest-scoring survivor.
//!
//! Trackers are always re-pushed after mutation rather than updated inside
//! the heap, so the heap never holds a stale sort key.
//!
//! # Reference
//!
//! Dixon, S. (2001). Automatic Extraction of Tempo and Beat from Expressive
//! Performances. *Journal of New Music Research*, 30(1), 39-58.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use super::tracker::{BeatTracker, IdSource};
use crate::error::EstimationError;
use crate::onset::Onset;

/// Onsets this close to the batch start seed tracker phases
///
/// The true starting phase is unknown, so every onset near the start of the
/// batch bootstraps one hypothesis per candidate period.
const TRACKER_START_WINDOW: f64 = 5000.0;

/// Two trackers within this period difference may be redundant
const SIMILAR_DURATION: f64 = 20.0;

/// Two trackers within this prediction difference may be redundant
const SIMILAR_PHASE: f64 = 40.0;

/// Track candidate beat periods through an onset sequence
///
/// Runs the full seed/advance/hit/fork/dedup/expire sweep and returns the
/// highest-scoring surviving tracker, or `None` when the population dies
/// out (no onsets, no candidates, or every tracker expired).
///
/// # Arguments
///
/// * `onsets` - Note onsets sorted ascending by timestamp
/// * `candidates` - Candidate beat periods in milliseconds, as induced
///
/// # Errors
///
/// Returns `EstimationError::InvalidInput` if a candidate period is not a
/// positive finite number.
pub fn track_beat(
    onsets: &[Onset],
    candidates: &[f64],
) -> Result<Option<BeatTracker>, EstimationError> {
    if onsets.is_empty() || candidates.is_empty() {
        return Ok(None);
    }

    let ids = IdSource::new();
    let mut queue: BinaryHeap<Reverse<BeatTracker>> = BinaryHeap::new();

    // Seed: one hypothesis per candidate period per plausible starting onset
    let batch_start = onsets[0].timestamp as f64;
    for onset in onsets
        .iter()
        .take_while(|o| o.timestamp as f64 - batch_start <= TRACKER_START_WINDOW)
    {
        for &period in candidates {
            queue.push(Reverse(BeatTracker::new(
                period,
                onset.timestamp as f64,
                &ids,
            )?));
        }
    }

    log::debug!(
        "Seeded {} trackers from {} candidate periods",
        queue.len(),
        candidates.len()
    );

    for onset in onsets {
        let onset_time = onset.timestamp as f64;
        let salience = onset.salience();

        // Bring the queue front up to this onset, gathering every tracker
        // whose window admits it
        let mut gathered: Vec<BeatTracker> = Vec::new();
        while let Some(mut tracker) = pop_deduped(&mut queue) {
            if tracker.is_margin_behind(onset_time) {
                if tracker.is_expired(onset_time) {
                    continue; // retired
                }
                tracker.next_beat();
                queue.push(Reverse(tracker));
                continue;
            }
            if tracker.may_hit(onset_time) {
                gathered.push(tracker);
                continue;
            }
            // This window opens after the onset, so every following one
            // does too
            queue.push(Reverse(tracker));
            break;
        }

        for mut tracker in gathered {
            if tracker.is_hit(onset_time) {
                // Confident: this is the tracker's beat
                tracker.register_hit(onset_time, salience);
                queue.push(Reverse(tracker));
            } else {
                // Plausible only: fork the "this was my beat" reading and
                // keep the original prediction untouched
                let mut fork = tracker.fork(&ids);
                fork.register_hit(onset_time, salience);
                queue.push(Reverse(tracker));
                queue.push(Reverse(fork));
            }
        }
    }

    let final_time = onsets[onsets.len() - 1].timestamp as f64;
    let population = queue.len();
    let best = queue
        .into_iter()
        .map(|Reverse(tracker)| tracker)
        .filter(|tracker| !tracker.is_expired(final_time))
        .max_by(|a, b| {
            a.score()
                .total_cmp(&b.score())
                .then_with(|| b.id().cmp(&a.id()))
        });

    match &best {
        Some(tracker) => log::debug!(
            "Tracking: {} survivors, best score {:.1} at period {:.1} ms",
            population,
            tracker.score(),
            tracker.beat_duration()
        ),
        None => log::warn!("Tracking: population of {} died out entirely", population),
    }

    Ok(best)
}

/// Pop the queue head, discarding redundant trackers right behind it
///
/// Successive heads similar to the popped tracker collapse into whichever
/// scores higher (the earlier one on ties). Stops at the first dissimilar
/// head, which bounds the population growth caused by repeated forking.
fn pop_deduped(queue: &mut BinaryHeap<Reverse<BeatTracker>>) -> Option<BeatTracker> {
    let Reverse(mut kept) = queue.pop()?;

    while let Some(Reverse(next)) = queue.peek() {
        if !is_similar(&kept, next) {
            break;
        }
        let Reverse(next) = queue.pop().expect("peeked element exists");
        if next.score() > kept.score() {
            kept = next;
        }
    }

    Some(kept)
}

/// Two trackers close in both period and phase represent the same hypothesis
fn is_similar(a: &BeatTracker, b: &BeatTracker) -> bool {
    (a.beat_duration() - b.beat_duration()).abs() <= SIMILAR_DURATION
        && (a.prediction() - b.prediction()).abs() <= SIMILAR_PHASE
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Evenly spaced onsets with constant note attributes
    fn periodic_train(count: usize, period_ms: i64) -> Vec<Onset> {
        (0..count as i64)
            .map(|i| Onset::new(i * period_ms, 100, 60, 80))
            .collect()
    }

    #[test]
    fn test_periodic_train_wins_with_its_period() {
        let onsets = periodic_train(50, 500);
        let best = track_beat(&onsets, &[500.0, 1000.0, 750.0])
            .unwrap()
            .expect("population should survive");

        assert!(
            (best.beat_duration() - 500.0).abs() < 1.0,
            "Winner should track the 500 ms period, got {:.2}",
            best.beat_duration()
        );
        // The winner's prediction sits on the final onset
        assert!((best.prediction() - 24_500.0).abs() < 1.0);
    }

    #[test]
    fn test_empty_inputs_produce_no_winner() {
        assert!(track_beat(&[], &[500.0]).unwrap().is_none());
        let onsets = periodic_train(10, 500);
        assert!(track_beat(&onsets, &[]).unwrap().is_none());
    }

    #[test]
    fn test_invalid_candidate_period_is_rejected() {
        let onsets = periodic_train(10, 500);
        assert!(track_beat(&onsets, &[0.0]).is_err());
        assert!(track_beat(&onsets, &[-500.0]).is_err());
    }

    #[test]
    fn test_ambiguous_onset_forks_one_clone_and_leaves_original() {
        // One tracker at 500 ms phase 0; an onset 100 ms late is inside the
        // outer window (150 ms) but outside the inner margin (40 ms)
        let ids = IdSource::new();
        let mut queue: BinaryHeap<Reverse<BeatTracker>> = BinaryHeap::new();
        queue.push(Reverse(BeatTracker::new(500.0, 1000.0, &ids).unwrap()));

        let onset_time = 1100.0;
        let mut gathered = Vec::new();
        while let Some(tracker) = pop_deduped(&mut queue) {
            assert!(!tracker.is_margin_behind(onset_time));
            if tracker.may_hit(onset_time) {
                gathered.push(tracker);
            } else {
                break;
            }
        }
        assert_eq!(gathered.len(), 1);

        let tracker = gathered.pop().unwrap();
        assert!(!tracker.is_hit(onset_time));

        let mut fork = tracker.fork(&ids);
        fork.register_hit(onset_time, 100.0);

        // Original prediction and score are untouched; the fork carries the
        // hit and a fresh identity
        assert_eq!(tracker.prediction(), 1000.0);
        assert_eq!(tracker.score(), 0.0);
        assert_eq!(fork.prediction(), 1100.0);
        assert!(fork.score() > 0.0);
        assert_ne!(fork.id(), tracker.id());
    }

    #[test]
    fn test_dedup_keeps_single_survivor_of_similar_pair() {
        let ids = IdSource::new();
        let mut queue: BinaryHeap<Reverse<BeatTracker>> = BinaryHeap::new();

        let weak = BeatTracker::new(500.0, 1000.0, &ids).unwrap();
        let mut strong = BeatTracker::new(510.0, 1020.0, &ids).unwrap();
        strong.register_hit(1020.0, 80.0);
        queue.push(Reverse(weak));
        queue.push(Reverse(strong));

        let survivor = pop_deduped(&mut queue).unwrap();
        assert!(queue.is_empty(), "Similar pair must collapse to one tracker");
        assert!(
            (survivor.score() - 80.0).abs() < 1e-9,
            "The higher-scoring tracker survives"
        );
    }

    #[test]
    fn test_dedup_stops_at_first_dissimilar_head() {
        let ids = IdSource::new();
        let mut queue: BinaryHeap<Reverse<BeatTracker>> = BinaryHeap::new();
        queue.push(Reverse(BeatTracker::new(500.0, 1000.0, &ids).unwrap()));
        queue.push(Reverse(BeatTracker::new(800.0, 1100.0, &ids).unwrap()));

        let first = pop_deduped(&mut queue).unwrap();
        assert_eq!(first.beat_duration(), 500.0);
        assert_eq!(queue.len(), 1, "Dissimilar tracker must survive the pop");
    }

    #[test]
    fn test_stale_trackers_expire_out_of_population() {
        // A long gap in the middle: trackers seeded at the start that never
        // hit again die before the second half begins
        let mut onsets = periodic_train(10, 500);
        let resume = 20_000;
        for i in 0..10i64 {
            onsets.push(Onset::new(resume + i * 500, 100, 60, 80));
        }

        let best = track_beat(&onsets, &[500.0]).unwrap();
        // The population is reseeded only at the batch start, so everything
        // expires across the 15.5 s silence
        assert!(best.is_none(), "All trackers should expire across the gap");
    }

    #[test]
    fn test_winner_survives_moderate_gap() {
        // A 4 s rest is well inside the expiry time
        let mut onsets = periodic_train(10, 500);
        let resume = 8_500;
        for i in 0..20i64 {
            onsets.push(Onset::new(resume + i * 500, 100, 60, 80));
        }

        let best = track_beat(&onsets, &[500.0]).unwrap().expect("survivor");
        assert!((best.beat_duration() - 500.0).abs() < 5.0);
    }

    #[test]
    fn test_determinism_same_batch_same_winner() {
        let onsets: Vec<Onset> = (0..60i64)
            .map(|i| {
                let jitter = [0, 13, -9, 21, -17, 6][(i % 6) as usize];
                Onset::new(i * 500 + jitter, 80 + (i as i32 % 40), 48 + (i as i32 % 24), 60 + (i as i32 % 30))
            })
            .collect();
        let candidates = [500.0, 1000.0, 250.0, 750.0];

        let a = track_beat(&onsets, &candidates).unwrap().expect("winner");
        let b = track_beat(&onsets, &candidates).unwrap().expect("winner");

        assert_eq!(a.id(), b.id());
        assert_eq!(a.score().to_bits(), b.score().to_bits());
        assert_eq!(a.beat_duration().to_bits(), b.beat_duration().to_bits());
        assert_eq!(a.prediction().to_bits(), b.prediction().to_bits());
    }
}
