//! Note onset events
//!
//! The engine consumes discrete note-start events, not audio. Each onset
//! carries a millisecond timestamp plus the raw note attributes, and derives
//! a salience (perceptual weight) that beat trackers use when scoring hits.

use serde::{Deserialize, Serialize};

/// Velocity range contributing to salience; values outside are clamped
const VELOCITY_FLOOR: i32 = 30;
const VELOCITY_CEILING: i32 = 90;

/// Pitch range contributing to salience; values outside are clamped
const PITCH_FLOOR: i32 = 30;
const PITCH_CEILING: i32 = 60;

/// A single played note event
///
/// Onsets order by `(timestamp, duration, pitch, velocity)`, giving the
/// total order a time-sorted batch is expected to follow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Onset {
    /// Note-start time in milliseconds
    pub timestamp: i64,

    /// Note duration in milliseconds (0 = unknown)
    pub duration: i32,

    /// MIDI pitch value
    pub pitch: i32,

    /// MIDI velocity
    pub velocity: i32,
}

impl Onset {
    /// Create a new onset event
    pub fn new(timestamp: i64, duration: i32, pitch: i32, velocity: i32) -> Self {
        Self {
            timestamp,
            duration,
            pitch,
            velocity,
        }
    }

    /// Perceptual importance of this onset, used as a hit weight
    ///
    /// Long, loud, low notes mark the beat more strongly than short, quiet,
    /// high ones:
    ///
    /// ```text
    /// salience = duration * clamp(velocity, 30, 90) / clamp(pitch, 30, 60)
    /// ```
    ///
    /// An onset with unknown duration (0) has zero salience.
    pub fn salience(&self) -> f64 {
        let velocity = self.velocity.clamp(VELOCITY_FLOOR, VELOCITY_CEILING);
        let pitch = self.pitch.clamp(PITCH_FLOOR, PITCH_CEILING);
        self.duration as f64 * velocity as f64 / pitch as f64
    }
}
