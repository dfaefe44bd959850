//! IOI-cluster tempo induction
//!
//! Produces candidate beat periods from a time-sorted onset batch by
//! clustering inter-onset intervals.
//!
//! # Algorithm
//!
//! 1. Compute the interval between every ordered pair of onsets, keeping
//!    those within `[MIN_IOI, MAX_IOI]`, and fold each into the nearest
//!    cluster (or a new singleton when none is close enough)
//! 2. Merge adjacent clusters whose means sit within one cluster width
//! 3. Score clusters by support, boosted when two clusters stand in a
//!    simple integer metrical relation
//! 4. Refine the top clusters into beat periods by averaging in related
//!    clusters at the same metrical level, then octave-adjust each period
//!    into the requested tempo range
//!
//! # Reference
//!
//! Dixon, S. (2001). Automatic Extraction of Tempo and Beat from Expressive
//! Performances. *Journal of New Music Research*, 30(1), 39-58.
//!
//! # Example
//!
//! ```
//! use tactus::features::induction::ioi_clustering::induce_beat;
//! use tactus::Onset;
//!
//! let onsets: Vec<Onset> = (0..8).map(|i| Onset::new(i * 500, 100, 60, 80)).collect();
//! let candidates = induce_beat(&onsets, 60.0, 180.0)?;
//! assert!((candidates[0] - 500.0).abs() < 1.0);
//! # Ok::<(), tactus::EstimationError>(())
//! ```

use super::cluster::{metrical_degree, relation_weight, Cluster, CLUSTER_WIDTH};
use crate::error::EstimationError;
use crate::onset::Onset;

/// Intervals shorter than this are ornamental (grace notes, chord spread),
/// not beat evidence
const MIN_IOI: f64 = 70.0;

/// Intervals longer than this carry no tempo information
const MAX_IOI: f64 = 2500.0;

/// How many top-supported clusters are refined into candidates
const NUM_BEST_CLUSTERS: usize = 10;

/// Induce candidate beat periods from a sorted onset batch
///
/// Clusters the inter-onset intervals of `onsets` and returns refined beat
/// periods in milliseconds, octave-adjusted into `[min_bpm, max_bpm]` and
/// ordered by descending support of their source cluster.
///
/// # Arguments
///
/// * `onsets` - Note onsets sorted ascending by timestamp
/// * `min_bpm` - Minimum tempo to consider
/// * `max_bpm` - Maximum tempo to consider
///
/// # Returns
///
/// Candidate beat periods in milliseconds, best-supported first. Fewer than
/// two onsets, or a batch with no usable interval, yields an empty list.
///
/// # Errors
///
/// Returns `EstimationError::InvalidInput` if the tempo range is
/// non-positive or inverted.
pub fn induce_beat(
    onsets: &[Onset],
    min_bpm: f64,
    max_bpm: f64,
) -> Result<Vec<f64>, EstimationError> {
    if min_bpm <= 0.0 || min_bpm > max_bpm {
        return Err(EstimationError::InvalidInput(format!(
            "Invalid tempo range: [{:.1}, {:.1}] BPM",
            min_bpm, max_bpm
        )));
    }

    debug_assert!(
        onsets.windows(2).all(|w| w[0].timestamp <= w[1].timestamp),
        "onset batch must be sorted by timestamp"
    );

    if onsets.len() < 2 {
        log::warn!("Too few onsets for induction: {}", onsets.len());
        return Ok(Vec::new());
    }

    log::debug!(
        "Inducing beat from {} onsets, range [{:.1}, {:.1}] BPM",
        onsets.len(),
        min_bpm,
        max_bpm
    );

    // Step 1: cluster the inter-onset intervals
    let mut clusters = cluster_intervals(onsets);

    if clusters.is_empty() {
        log::warn!("No inter-onset interval within [{:.0}, {:.0}] ms", MIN_IOI, MAX_IOI);
        return Ok(Vec::new());
    }

    // Step 2: merge clusters that drifted within one width of each other
    merge_adjacent(&mut clusters);

    // Step 3: support-based scores, boosted by metrical relations
    let scores = score_clusters(&clusters);

    // Step 4: refine the best clusters into tempo-range candidates
    let candidates = refine_candidates(&clusters, &scores, min_bpm, max_bpm);

    log::debug!(
        "Induction: {} clusters, {} candidates",
        clusters.len(),
        candidates.len()
    );

    Ok(candidates)
}

/// Build the sorted cluster list from all pairwise intervals
fn cluster_intervals(onsets: &[Onset]) -> Vec<Cluster> {
    let mut clusters: Vec<Cluster> = Vec::new();

    for i in 0..onsets.len() {
        for j in (i + 1)..onsets.len() {
            let interval = (onsets[j].timestamp - onsets[i].timestamp) as f64;
            if interval < MIN_IOI {
                continue;
            }
            if interval > MAX_IOI {
                // Sorted input: every later j only widens the gap
                break;
            }
            fold_interval(&mut clusters, interval);
        }
    }

    clusters
}

/// Fold one interval into the nearest cluster, or insert a new singleton
///
/// `clusters` is sorted ascending by mean. The candidates are the first
/// cluster whose mean is at least `interval - CLUSTER_WIDTH` and its
/// immediate successor; whichever is numerically closer absorbs the
/// interval if it lies within one width.
fn fold_interval(clusters: &mut Vec<Cluster>, interval: f64) {
    let nearest = clusters
        .iter()
        .position(|c| c.mean >= interval - CLUSTER_WIDTH)
        .map(|k| {
            if k + 1 < clusters.len()
                && (clusters[k + 1].mean - interval).abs() < (clusters[k].mean - interval).abs()
            {
                k + 1
            } else {
                k
            }
        })
        .filter(|&k| (clusters[k].mean - interval).abs() <= CLUSTER_WIDTH);

    match nearest {
        Some(k) => {
            clusters[k].absorb(interval);
            restore_order(clusters, k);
        }
        None => {
            let position = clusters
                .iter()
                .position(|c| c.mean > interval)
                .unwrap_or(clusters.len());
            clusters.insert(position, Cluster::new(interval));
        }
    }
}

/// Re-establish ascending mean order after an incremental mean update
///
/// Absorbing moves a mean by at most one width over the count, which can
/// invert the order against a tight neighbour; a local bubble fixes it.
fn restore_order(clusters: &mut [Cluster], mut k: usize) {
    while k > 0 && clusters[k - 1].mean > clusters[k].mean {
        clusters.swap(k - 1, k);
        k -= 1;
    }
    while k + 1 < clusters.len() && clusters[k].mean > clusters[k + 1].mean {
        clusters.swap(k, k + 1);
        k += 1;
    }
}

/// Merge the closest adjacent pair until all gaps reach one cluster width
fn merge_adjacent(clusters: &mut Vec<Cluster>) {
    while clusters.len() >= 2 {
        let mut closest = 0;
        let mut smallest_gap = f64::INFINITY;
        for i in 0..clusters.len() - 1 {
            let gap = clusters[i + 1].mean - clusters[i].mean;
            if gap < smallest_gap {
                smallest_gap = gap;
                closest = i;
            }
        }

        if smallest_gap >= CLUSTER_WIDTH {
            return;
        }

        // The weighted mean lands between the two sources, so the list
        // stays sorted.
        let absorbed = clusters.remove(closest + 1);
        clusters[closest].merge_with(&absorbed);
    }
}

/// Score every cluster: base support plus metrical-relation boosts
fn score_clusters(clusters: &[Cluster]) -> Vec<f64> {
    let mut scores: Vec<f64> = clusters.iter().map(|c| 10.0 * c.count as f64).collect();

    for i in 0..clusters.len() {
        for j in (i + 1)..clusters.len() {
            if let Some(degree) = metrical_degree(clusters[i].mean, clusters[j].mean) {
                let weight = relation_weight(degree);
                scores[i] += weight * clusters[j].count as f64;
                scores[j] += weight * clusters[i].count as f64;
            }
        }
    }

    scores
}

/// Refine the top-supported clusters into candidate beat periods
///
/// Each candidate period is the score-weighted mean of the cluster's own
/// mean and every metrically-related cluster's mean projected onto the
/// candidate's level (coarser means divided by the degree, finer means
/// multiplied by it). The refined period is then halved or doubled until
/// its implied tempo lies inside the range; periods that cannot be
/// adjusted into the range are dropped.
fn refine_candidates(
    clusters: &[Cluster],
    scores: &[f64],
    min_bpm: f64,
    max_bpm: f64,
) -> Vec<f64> {
    let min_period = 60_000.0 / max_bpm;
    let max_period = 60_000.0 / min_bpm;

    // Stable sort: equal support keeps ascending-mean order
    let mut by_support: Vec<usize> = (0..clusters.len()).collect();
    by_support.sort_by(|&a, &b| clusters[b].count.cmp(&clusters[a].count));

    let mut candidates = Vec::new();
    for &i in by_support.iter().take(NUM_BEST_CLUSTERS) {
        let mut weighted_sum = clusters[i].mean * scores[i];
        let mut total_weight = scores[i];

        for (j, other) in clusters.iter().enumerate() {
            if j == i {
                continue;
            }
            if let Some(degree) = metrical_degree(clusters[i].mean, other.mean) {
                let projected = if clusters[i].mean < other.mean {
                    other.mean / degree as f64
                } else {
                    other.mean * degree as f64
                };
                weighted_sum += projected * scores[j];
                total_weight += scores[j];
            }
        }

        // total_weight >= the cluster's own base score, which is positive
        let refined = weighted_sum / total_weight;

        let mut period = refined;
        while period < min_period {
            period *= 2.0;
        }
        while period > max_period {
            period /= 2.0;
        }

        if period >= min_period {
            candidates.push(period);
        } else {
            log::debug!(
                "Dropping candidate {:.1} ms: no octave fits [{:.1}, {:.1}] BPM",
                refined,
                min_bpm,
                max_bpm
            );
        }
    }

    candidates
}
