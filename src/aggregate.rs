//! The global list of pairs that need posterior probabilities.

use crate::error::{ClusterError, Result};
use crate::split::Pair;
use itertools::Itertools;

/// Merge the per-split samples into one canonical work list.
///
/// Each pair is canonicalised to (min, max), the list is sorted
/// lexicographically and adjacent duplicates are dropped. Duplicates are only
/// adjacent after the full sort, so the order of these steps matters.
///
/// # Errors
/// [`ClusterError::NoPairs`] when no split produced any pair.
///
/// # Example
/// ```
/// # use split_cluster::aggregate::pairs_to_calculate;
/// # use split_cluster::split::Pair;
/// let per_split = vec![
///     vec![Pair::new(3, 0), Pair::new(1, 2)],
///     vec![Pair::new(0, 3)],
/// ];
/// let pairs = pairs_to_calculate(&per_split).unwrap();
/// assert_eq!(pairs, vec![Pair::new(0, 3), Pair::new(1, 2)]);
/// ```
pub fn pairs_to_calculate(per_split: &[Vec<Pair>]) -> Result<Vec<Pair>> {
    let pairs: Vec<Pair> = per_split
        .iter()
        .flatten()
        .map(|p| p.canonical())
        .sorted()
        .dedup()
        .collect();

    if pairs.is_empty() {
        return Err(ClusterError::NoPairs);
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_unique_and_upper_triangle() {
        let per_split = vec![
            vec![Pair::new(4, 1), Pair::new(2, 0), Pair::new(0, 5)],
            vec![Pair::new(1, 4), Pair::new(0, 2)],
            vec![],
            vec![Pair::new(0, 5), Pair::new(3, 1)],
        ];
        let pairs = pairs_to_calculate(&per_split).unwrap();

        assert_eq!(
            pairs,
            vec![Pair::new(0, 2), Pair::new(0, 5), Pair::new(1, 3), Pair::new(1, 4)]
        );
        assert!(pairs.iter().all(|p| p.first < p.second));
        assert!(pairs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_non_adjacent_duplicates_are_removed() {
        // duplicates separated by other pairs in the input
        let per_split = vec![vec![Pair::new(0, 1), Pair::new(2, 3)], vec![Pair::new(1, 0)]];
        assert_eq!(
            pairs_to_calculate(&per_split).unwrap(),
            vec![Pair::new(0, 1), Pair::new(2, 3)]
        );
    }

    #[test]
    fn test_empty_is_an_error() {
        assert!(matches!(pairs_to_calculate(&[]), Err(ClusterError::NoPairs)));
        assert!(matches!(pairs_to_calculate(&[vec![], vec![]]), Err(ClusterError::NoPairs)));
    }
}
