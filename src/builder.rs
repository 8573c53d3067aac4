//! Build the final partition by introducing unsupported splits.
//!
//! # Overview
//! Clustering starts from a single group holding every taxon. Splits are visited
//! in tree order; each split the support test rejects cuts every group that
//! straddles it into its two sides.
//!
//! # Example
//! ```text
//! taxa 0..6, splits in tree order:
//!   s0: {0,1,2} | {3,4,5}   unsatisfied → [[0,1,2],[3,4,5]]
//!   s1: {0,1}   | {2,3,4,5} satisfied   → unchanged
//!   s2: {4,5}   | {0,1,2,3} unsatisfied → [[0,1,2],[3],[4,5]]
//! ```

use crate::bitset::Bitset;
use crate::split::Split;

/// An exhaustive, disjoint grouping of the taxa 0..N.
///
/// Each group is non-empty and in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    groups: Vec<Vec<usize>>,
}

impl Partition {
    /// All taxa in one group.
    pub fn single(num_taxa: usize) -> Self {
        Partition { groups: vec![(0..num_taxa).collect()] }
    }

    pub fn groups(&self) -> &[Vec<usize>] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn into_groups(self) -> Vec<Vec<usize>> {
        self.groups
    }

    /// Cut every group that has members on both sides of `split`.
    ///
    /// A straddling group is replaced, in place, by its members on the left
    /// followed by its members on the right; relative order is kept. Groups on
    /// one side only pass through untouched.
    ///
    /// # Panics
    /// If a group confirmed to straddle the split yields an empty side. That can
    /// only happen when the partition or the split is corrupt.
    pub fn introduce(&mut self, split: &Split, num_taxa: usize) {
        let left = Bitset::from_indices(num_taxa, split.left());
        let right = Bitset::from_indices(num_taxa, split.right());

        let mut groups = Vec::with_capacity(self.groups.len() + 1);
        for group in self.groups.drain(..) {
            let in_left = group.iter().any(|&t| left.contains(t));
            let in_right = group.iter().any(|&t| right.contains(t));
            if !in_left || !in_right {
                groups.push(group);
                continue;
            }

            let (on_left, on_right): (Vec<usize>, Vec<usize>) =
                group.iter().partition(|&&t| left.contains(t));
            assert!(!on_left.is_empty(), "split left side vanished from a straddling group");
            assert!(!on_right.is_empty(), "split right side vanished from a straddling group");
            groups.push(on_left);
            groups.push(on_right);
        }
        self.groups = groups;
    }

    /// Order groups by their smallest member.
    pub fn sort_groups(&mut self) {
        self.groups.sort_by_key(|g| g.iter().min().copied());
    }

    /// Returns whether every taxon in 0..`num_taxa` appears in exactly one group.
    pub fn is_exact_cover(&self, num_taxa: usize) -> bool {
        let mut seen = vec![false; num_taxa];
        for &taxon in self.groups.iter().flatten() {
            if taxon >= num_taxa || seen[taxon] {
                return false;
            }
            seen[taxon] = true;
        }
        seen.into_iter().all(|s| s)
    }

    /// Group members replaced by their names.
    pub fn named<'a>(&self, names: &'a [String]) -> Vec<Vec<&'a str>> {
        self.groups
            .iter()
            .map(|g| g.iter().map(|&t| names[t].as_str()).collect())
            .collect()
    }
}

/// Run the cluster builder over `splits` in order.
///
/// `satisfied(i, split)` is the support test; every split it rejects is introduced.
/// The result is sorted by smallest member.
pub fn build_partition<F>(num_taxa: usize, splits: &[Split], mut satisfied: F) -> Partition
where
    F: FnMut(usize, &Split) -> bool,
{
    let mut partition = Partition::single(num_taxa);
    for (idx, split) in splits.iter().enumerate() {
        if !satisfied(idx, split) {
            partition.introduce(split, num_taxa);
        }
    }
    partition.sort_groups();
    partition
}
