//! Example: Estimate the beat of a synthetic performance
//!
//! Builds a jittered quarter-note performance, runs the estimator, and
//! prints the detected period and phase.

use tactus::{estimate_beat_with_metadata, EstimationConfig, Onset};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::init();

    // 90 seconds of quarter notes at 120 BPM with expressive timing
    let jitter = [0i64, 15, -10, 22, -18, 8];
    let onsets: Vec<Onset> = (0..180i64)
        .map(|i| {
            Onset::new(
                i * 500 + jitter[(i % 6) as usize],
                80 + (i as i32 % 3) * 40,
                45 + (i as i32 % 18),
                55 + (i as i32 % 35),
            )
        })
        .collect();

    let config = EstimationConfig::default();
    let (beat, metadata) = estimate_beat_with_metadata(&onsets, &config)?;

    println!("Estimation results:");
    println!("  Onsets: {}", metadata.onset_count);
    println!("  Candidate periods: {}", metadata.candidate_count);
    match beat {
        Some(beat) => {
            println!(
                "  Beat: {} ms period, {} ms phase ({:.1} BPM)",
                beat.duration,
                beat.phase,
                beat.bpm()
            );
            println!("  Winning score: {:.1}", metadata.best_score);
        }
        None => println!("  No beat detected"),
    }
    println!("  Processing time: {:.2} ms", metadata.processing_time_ms);

    Ok(())
}
