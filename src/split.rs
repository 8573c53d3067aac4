//! Splits (bipartitions of the taxa) and the taxon pairs sampled across them.
//!
//! # What is a split?
//! Removing one internal branch of a tree divides the taxa into two groups:
//! ```text
//!      root
//!     /    \
//!   {A,B}  {C,D}  ← this branch induces the split {A,B} | {C,D}
//! ```
//! A split is *trivial* when one side holds a single taxon; those never reach
//! the clustering engine.

/// A non-trivial bipartition of the taxon indices 0..N.
///
/// Both sides are non-empty and kept in ascending index order. Which side is
/// `left` has no meaning beyond the order in which the tree adapter found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    left: Vec<usize>,
    right: Vec<usize>,
}

impl Split {
    /// Builds a split, sorting each side.
    pub fn new(mut left: Vec<usize>, mut right: Vec<usize>) -> Self {
        left.sort_unstable();
        right.sort_unstable();
        Split { left, right }
    }

    pub fn left(&self) -> &[usize] {
        &self.left
    }

    pub fn right(&self) -> &[usize] {
        &self.right
    }

    /// Returns `(small, big)`: the side with fewer members first.
    ///
    /// On equal sizes `left` counts as the small side.
    ///
    /// # Example
    /// ```
    /// # use split_cluster::split::Split;
    /// let s = Split::new(vec![0, 1, 2], vec![3, 4]);
    /// let (small, big) = s.small_big();
    /// assert_eq!(small, &[3, 4]);
    /// assert_eq!(big, &[0, 1, 2]);
    /// ```
    pub fn small_big(&self) -> (&[usize], &[usize]) {
        if self.left.len() > self.right.len() {
            (&self.right[..], &self.left[..])
        } else {
            (&self.left[..], &self.right[..])
        }
    }

    /// Total number of taxa covered by both sides.
    pub fn num_taxa(&self) -> usize {
        self.left.len() + self.right.len()
    }
}

/// Two taxon indices.
///
/// Inside a per-split sample, `first` is the small-side member and `second`
/// the big-side member. In the global work list the pair is canonical
/// (`first < second`). Ordering is lexicographic on (first, second).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair {
    pub first: usize,
    pub second: usize,
}

impl Pair {
    pub fn new(first: usize, second: usize) -> Self {
        Pair { first, second }
    }

    /// The same two taxa ordered as (min, max).
    ///
    /// # Example
    /// ```
    /// # use split_cluster::split::Pair;
    /// assert_eq!(Pair::new(5, 2).canonical(), Pair::new(2, 5));
    /// ```
    pub fn canonical(self) -> Self {
        if self.first > self.second {
            Pair { first: self.second, second: self.first }
        } else {
            self
        }
    }
}

impl From<(usize, usize)> for Pair {
    fn from((first, second): (usize, usize)) -> Self {
        Pair { first, second }
    }
}
