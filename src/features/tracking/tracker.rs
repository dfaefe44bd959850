//! Beat hypothesis agents
//!
//! A tracker follows one (period, phase) beat hypothesis through the onset
//! sequence, accumulating a salience-weighted match score. Its period adapts
//! to timing errors but may never drift more than 20% from the period it was
//! seeded with; a fork resets that budget.

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use ordered_float::OrderedFloat;

use crate::error::EstimationError;

/// Half-width of the confident-hit window in milliseconds
const INNER_MARGIN: f64 = 40.0;

/// Fraction of the period the plausible window extends before a prediction
///
/// The window is intentionally asymmetric: onsets anticipating a beat are
/// tolerated less than onsets lagging it.
const OUTER_MARGIN_PRE: f64 = 0.15;

/// Fraction of the period the plausible window extends after a prediction
const OUTER_MARGIN_POST: f64 = 0.30;

/// Score penalty slope towards the outer window edges
const MISS_PENALTY_FACTOR: f64 = 0.5;

/// Maximum cumulative period drift, as a fraction of the seed period
const MAX_CHANGE_FACTOR: f64 = 0.2;

/// Fraction of a hit's timing error fed back into the period
const CORRECTION_FACTOR: f64 = 0.02;

/// A tracker with no hit for this long is retired
const EXPIRY_TIME: f64 = 10_000.0;

/// Monotonic id generator for tracker creation order
///
/// Owned by one estimation call and injected wherever trackers are
/// constructed; ids are only used as a deterministic ordering tie-break.
#[derive(Debug, Default)]
pub struct IdSource {
    next: AtomicU64,
}

impl IdSource {
    /// Create a generator starting at id 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw the next id
    pub fn next_id(&self) -> u64 {
        self.next.fetch_add(1, AtomicOrdering::Relaxed)
    }
}

/// One beat hypothesis agent
///
/// Trackers order by the start of their plausible window (earliest first),
/// with creation order breaking ties. This is a total order, as the
/// population's priority queue and dedup require.
#[derive(Debug)]
pub struct BeatTracker {
    id: u64,
    initial_beat_duration: f64,
    beat_duration: f64,
    /// Next predicted beat instant in milliseconds
    timestamp: f64,
    last_hit_timestamp: f64,
    score: f64,
}

impl BeatTracker {
    /// Create a fresh tracker from an induced period and a seed onset time
    ///
    /// # Errors
    ///
    /// Returns `EstimationError::InvalidInput` if the period is not a
    /// positive finite number.
    pub fn new(beat_duration: f64, timestamp: f64, ids: &IdSource) -> Result<Self, EstimationError> {
        if !beat_duration.is_finite() || beat_duration <= 0.0 {
            return Err(EstimationError::InvalidInput(format!(
                "Tracker period must be positive, got {}",
                beat_duration
            )));
        }

        Ok(Self {
            id: ids.next_id(),
            initial_beat_duration: beat_duration,
            beat_duration,
            timestamp,
            last_hit_timestamp: timestamp,
            score: 0.0,
        })
    }

    /// Advance the prediction one period with no hit registered
    pub fn next_beat(&mut self) {
        self.timestamp += self.beat_duration;
    }

    /// Confident match: the onset lies within the inner margin
    pub fn is_hit(&self, onset_time: f64) -> bool {
        (onset_time - self.timestamp).abs() <= INNER_MARGIN
    }

    /// Plausible match: the onset lies within the asymmetric outer window
    pub fn may_hit(&self, onset_time: f64) -> bool {
        self.window_start() <= onset_time && onset_time <= self.window_end()
    }

    /// The onset has passed this tracker's whole window; the tracker must
    /// be advanced or retired before the onset can be evaluated against it
    pub fn is_margin_behind(&self, onset_time: f64) -> bool {
        onset_time > self.window_end()
    }

    /// No hit registered within the expiry time
    pub fn is_expired(&self, onset_time: f64) -> bool {
        onset_time - self.last_hit_timestamp > EXPIRY_TIME
    }

    /// Register an onset as this tracker's beat
    ///
    /// The score gains the onset's salience scaled by how well-timed the
    /// hit was: full weight at the prediction, about half at either window
    /// edge. The period is nudged towards the observed timing, with the
    /// cumulative drift from the seed period clamped to 20%, and the
    /// prediction snaps to the hit.
    pub fn register_hit(&mut self, hit_timestamp: f64, salience: f64) {
        let error = hit_timestamp - self.timestamp;

        let penalty = if error < 0.0 {
            1.0 + MISS_PENALTY_FACTOR * error / (self.beat_duration * OUTER_MARGIN_PRE)
        } else {
            1.0 - MISS_PENALTY_FACTOR * error / (self.beat_duration * OUTER_MARGIN_POST)
        };
        self.score += salience * penalty.clamp(0.0, 1.0);

        let max_drift = MAX_CHANGE_FACTOR * self.initial_beat_duration;
        self.beat_duration = (self.beat_duration + error * CORRECTION_FACTOR).clamp(
            self.initial_beat_duration - max_drift,
            self.initial_beat_duration + max_drift,
        );

        self.timestamp = hit_timestamp;
        self.last_hit_timestamp = hit_timestamp;
    }

    /// Fork an alternative hypothesis from this tracker's current state
    ///
    /// The fork copies the period and predictions but draws a fresh id,
    /// starts scoring from zero, and measures its drift budget from the
    /// period at the fork point.
    pub fn fork(&self, ids: &IdSource) -> Self {
        Self {
            id: ids.next_id(),
            initial_beat_duration: self.beat_duration,
            beat_duration: self.beat_duration,
            timestamp: self.timestamp,
            last_hit_timestamp: self.last_hit_timestamp,
            score: 0.0,
        }
    }

    /// Creation-order id
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current beat period in milliseconds
    pub fn beat_duration(&self) -> f64 {
        self.beat_duration
    }

    /// Next predicted beat instant in milliseconds
    pub fn prediction(&self) -> f64 {
        self.timestamp
    }

    /// Accumulated match score
    pub fn score(&self) -> f64 {
        self.score
    }

    fn window_start(&self) -> f64 {
        self.timestamp - self.beat_duration * OUTER_MARGIN_PRE
    }

    fn window_end(&self) -> f64 {
        self.timestamp + self.beat_duration * OUTER_MARGIN_POST
    }

    fn sort_key(&self) -> (OrderedFloat<f64>, u64) {
        (OrderedFloat(self.window_start()), self.id)
    }
}

impl PartialEq for BeatTracker {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}

impl Eq for BeatTracker {}

impl PartialOrd for BeatTracker {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BeatTracker {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}
