//! Inter-onset interval clusters
//!
//! A cluster accumulates inter-onset intervals believed to represent the
//! same underlying beat period. Clusters live only for the duration of one
//! induction call.

/// Maximum distance in milliseconds between an interval and a cluster mean
/// for the interval to join the cluster; also the merge threshold between
/// adjacent cluster means.
pub const CLUSTER_WIDTH: f64 = 25.0;

/// Smallest integer tempo multiple considered metrically related
const MIN_RELATION_DEGREE: f64 = 2.0;

/// Largest integer tempo multiple considered metrically related
const MAX_RELATION_DEGREE: f64 = 8.0;

/// An accumulator grouping inter-onset intervals of similar length
///
/// Invariant: `mean > 0` (intervals below the minimum IOI never reach a
/// cluster, so the incremental mean stays positive).
#[derive(Debug, Clone)]
pub struct Cluster {
    /// Running mean interval in milliseconds
    pub mean: f64,

    /// Number of intervals folded into this cluster
    pub count: u32,
}

impl Cluster {
    /// Create a singleton cluster from one interval
    pub fn new(interval: f64) -> Self {
        Self {
            mean: interval,
            count: 1,
        }
    }

    /// Fold one more interval into the running mean
    pub fn absorb(&mut self, interval: f64) {
        self.mean = (self.mean * self.count as f64 + interval) / (self.count + 1) as f64;
        self.count += 1;
    }

    /// Combine with another cluster: counts sum, means average by weight
    pub fn merge_with(&mut self, other: &Cluster) {
        let total = self.count + other.count;
        self.mean =
            (self.mean * self.count as f64 + other.mean * other.count as f64) / total as f64;
        self.count = total;
    }
}

/// Test whether two cluster means stand in an integer metrical relation
///
/// Returns the degree `d` in `[2, 8]` such that the coarser (larger) mean is
/// approximately `d` times the finer one. The tolerance is `CLUSTER_WIDTH`
/// when the reference mean is the finer level (error measured against the
/// projected-up reference), and `CLUSTER_WIDTH * d` when the reference is
/// the coarser level, matching the published induction method.
///
/// # Arguments
///
/// * `reference` - Mean of the cluster being scored or refined
/// * `other` - Mean of the cluster being compared against
pub fn metrical_degree(reference: f64, other: f64) -> Option<u32> {
    let reference_is_finer = reference < other;
    let ratio = if reference_is_finer {
        other / reference
    } else {
        reference / other
    };

    let degree = ratio.round();
    if !(MIN_RELATION_DEGREE..=MAX_RELATION_DEGREE).contains(&degree) {
        return None;
    }

    let (error, tolerance) = if reference_is_finer {
        ((reference * degree - other).abs(), CLUSTER_WIDTH)
    } else {
        ((reference - other * degree).abs(), CLUSTER_WIDTH * degree)
    };

    if error < tolerance {
        Some(degree as u32)
    } else {
        None
    }
}

/// Scoring weight for a metrical relation: simpler ratios count for more
///
/// Degree 2 weighs 4, degree 3 weighs 3, degree 4 weighs 2, and degrees
/// 5 through 8 weigh 1.
pub fn relation_weight(degree: u32) -> f64 {
    if degree >= 5 {
        1.0
    } else {
        (6 - degree) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_updates_incremental_mean() {
        let mut cluster = Cluster::new(500.0);
        cluster.absorb(510.0);
        assert_eq!(cluster.count, 2);
        assert!((cluster.mean - 505.0).abs() < 1e-9);

        cluster.absorb(490.0);
        assert_eq!(cluster.count, 3);
        assert!((cluster.mean - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_is_count_weighted() {
        let mut a = Cluster::new(500.0);
        a.absorb(500.0);
        a.absorb(500.0); // count 3
        let b = Cluster::new(520.0); // count 1

        a.merge_with(&b);
        assert_eq!(a.count, 4);
        assert!((a.mean - 505.0).abs() < 1e-9);
    }

    #[test]
    fn test_metrical_degree_exact_multiples() {
        assert_eq!(metrical_degree(250.0, 500.0), Some(2));
        assert_eq!(metrical_degree(500.0, 250.0), Some(2));
        assert_eq!(metrical_degree(300.0, 900.0), Some(3));
        assert_eq!(metrical_degree(100.0, 800.0), Some(8));
    }

    #[test]
    fn test_metrical_degree_rejects_out_of_range() {
        // Degree 1 (same level) and degree 9+ are not relations
        assert_eq!(metrical_degree(500.0, 510.0), None);
        assert_eq!(metrical_degree(100.0, 900.0), None);
    }

    #[test]
    fn test_metrical_degree_tolerance_is_direction_dependent() {
        // Finer reference: the projected-up error must stay inside one width
        assert_eq!(metrical_degree(250.0, 520.0), Some(2)); // error 20 < 25
        assert_eq!(metrical_degree(250.0, 530.0), None); // error 30 >= 25

        // Coarser reference: tolerance scales with the degree
        assert_eq!(metrical_degree(530.0, 250.0), Some(2)); // error 30 < 50
        assert_eq!(metrical_degree(560.0, 250.0), None); // error 60 >= 50
    }

    #[test]
    fn test_relation_weight_prefers_simple_ratios() {
        assert_eq!(relation_weight(2), 4.0);
        assert_eq!(relation_weight(3), 3.0);
        assert_eq!(relation_weight(4), 2.0);
        assert_eq!(relation_weight(5), 1.0);
        assert_eq!(relation_weight(8), 1.0);
    }
}
