//! Representative taxon pairs for each split.
//!
//! # Overview
//! Testing a split means asking whether taxa on one side look like the same
//! group as taxa on the other. Comparing every cross pair would cost
//! |small| × |big| posterior probabilities per split, so only about `K`
//! pairs are sampled, preferring taxa that sit close together in the tree.
//!
//! # Fairness caps
//! A greedy walk over the closest pairs tends to pick one "hub" taxon over and
//! over. Each taxon therefore has a cap on how many sampled pairs it may join:
//!
//! ```text
//! small-side cap = ceil(K / |small|) + 1
//! big-side cap   = ceil(K / |big|)   + 1
//! ```

use crate::matrix::SquareMatrix;
use crate::split::{Pair, Split};
use itertools::Itertools;

/// Default number of pairs sampled per split.
pub const DEFAULT_APPROX_PAIRS: usize = 10;

/// Sample up to `approx_pairs` (small, big) pairs across `split`.
///
/// # Algorithm
/// 1. Enumerate every (small-member, big-member) candidate, small-major
/// 2. Stable-sort candidates by ascending tree distance
/// 3. Walk the sorted list, skipping candidates whose small or big member is
///    already at its cap, until `approx_pairs` pairs are taken
///
/// Fewer pairs come back when the split is small and the caps run out.
///
/// # Example
/// ```
/// # use split_cluster::matrix::SquareMatrix;
/// # use split_cluster::sampler::sample_pairs;
/// # use split_cluster::split::{Pair, Split};
/// let split = Split::new(vec![0, 1], vec![2, 3]);
/// let distances = SquareMatrix::filled(4, 1.0);
/// let pairs = sample_pairs(&split, &distances, 10);
/// assert_eq!(pairs, vec![Pair::new(0, 2), Pair::new(0, 3), Pair::new(1, 2), Pair::new(1, 3)]);
/// ```
pub fn sample_pairs(split: &Split, distances: &SquareMatrix, approx_pairs: usize) -> Vec<Pair> {
    let (small, big) = split.small_big();
    let small_cap = approx_pairs.div_ceil(small.len()) + 1;
    let big_cap = approx_pairs.div_ceil(big.len()) + 1;

    let candidates: Vec<(Pair, f64)> = small
        .iter()
        .cartesian_product(big.iter())
        .map(|(&s, &b)| (Pair::new(s, b), distances.get(b, s)))
        .sorted_by(|x, y| x.1.total_cmp(&y.1))
        .collect();

    let num_taxa = distances.n();
    let mut small_count = vec![0usize; num_taxa];
    let mut big_count = vec![0usize; num_taxa];
    let mut pairs = Vec::with_capacity(approx_pairs);

    for (pair, _) in candidates {
        if pairs.len() >= approx_pairs {
            break;
        }
        if small_count[pair.first] >= small_cap || big_count[pair.second] >= big_cap {
            continue;
        }
        small_count[pair.first] += 1;
        big_count[pair.second] += 1;
        pairs.push(pair);
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;

    /// Distances on a line: taxon i sits at position i.
    fn line_distances(n: usize) -> SquareMatrix {
        let mut d = SquareMatrix::filled(n, 0.0);
        for (i, j) in (0..n).tuple_combinations() {
            d.set_symmetric(i, j, (j - i) as f64);
        }
        d
    }

    #[test]
    fn test_closest_pairs_first() {
        // small side {3,4}, big side {0,1,2}
        let split = Split::new(vec![0, 1, 2], vec![3, 4]);
        let pairs = sample_pairs(&split, &line_distances(5), 2);

        // distances: (3,2)=1 first, then (3,1)=2 and (4,2)=2 in enumeration order
        assert_eq!(pairs, vec![Pair::new(3, 2), Pair::new(3, 1)]);
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let split = Split::new(vec![0, 1], vec![2, 3, 4]);
        let pairs = sample_pairs(&split, &SquareMatrix::filled(5, 0.5), 3);
        assert_eq!(pairs, vec![Pair::new(0, 2), Pair::new(0, 3), Pair::new(0, 4)]);
    }

    #[test]
    fn test_caps_limit_hub_taxa() {
        // taxon 0 alone on the small side, 20 taxa on the big side, K = 10:
        // small cap = ceil(10/1)+1 = 11, big cap = ceil(10/20)+1 = 2
        let n = 21;
        let split = Split::new(vec![0], (1..n).collect());
        let pairs = sample_pairs(&split, &line_distances(n), 10);
        assert_eq!(pairs.len(), 10);
        assert!(pairs.iter().all(|p| p.first == 0));
        assert_eq!(pairs.iter().map(|p| p.second).collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());

        // two close hubs 0 and 1 against a wide big side
        let split = Split::new(vec![0, 1], (2..n).collect());
        let mut d = SquareMatrix::filled(n, 10.0);
        d.set_symmetric(0, 2, 0.1);
        d.set_symmetric(1, 2, 0.2);
        let pairs = sample_pairs(&split, &d, 10);

        // big cap = ceil(10/19)+1 = 2: taxon 2 is used at most twice
        assert!(pairs.iter().filter(|p| p.second == 2).count() <= 2);
        // small cap = ceil(10/2)+1 = 6
        let counts = pairs.iter().counts_by(|p| p.first);
        assert!(counts.values().all(|&c| c <= 6));
        assert_eq!(pairs.len(), 10);
    }

    #[test]
    fn test_sample_bound_and_orientation() {
        let n = 12;
        let d = line_distances(n);
        for cut in 2..n - 1 {
            let split = Split::new((0..cut).collect(), (cut..n).collect());
            let (small, big) = split.small_big();
            for k in [1, 3, 10, 50] {
                let pairs = sample_pairs(&split, &d, k);
                assert!(pairs.len() <= k);
                assert!(!pairs.is_empty());
                assert!(pairs.iter().all(|p| small.contains(&p.first) && big.contains(&p.second)));
                assert!(pairs.iter().all_unique());
            }
        }
    }

    #[test]
    fn test_small_split_runs_out_of_candidates() {
        // 2 x 2 = 4 candidates, K = 10
        let split = Split::new(vec![0, 1], vec![2, 3]);
        assert_eq!(sample_pairs(&split, &line_distances(4), 10).len(), 4);
    }
}
