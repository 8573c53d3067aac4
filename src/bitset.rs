//! Compact bitset representation for taxon sets.
//!
//! # Overview
//! A bitset records which taxa belong to a clade, a split side or a cluster group.
//! Each bit position corresponds to a taxon index.
//!
//! # Example
//! For taxa [A, B, C, D] mapped to indices [0, 1, 2, 3]:
//! - Clade {A, C} → bitset `0b0101` (bits 0 and 2 set)
//! - Group {B, C, D} → bitset `0b1110` (bits 1, 2, 3 set)

/// A compact bitset over taxon indices.
///
/// Internally stores bits in `Vec<u64>` words to support arbitrarily many taxa.
/// Each u64 word holds 64 taxon indices.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Bitset(pub Vec<u64>);

impl Bitset {
    /// Creates a new bitset with all bits set to 0.
    ///
    /// # Parameters
    /// - `words`: Number of u64 words needed. Use [`Bitset::words_for`] to compute it.
    ///
    /// # Example
    /// ```
    /// # use split_cluster::bitset::Bitset;
    /// // 100 taxa need 2 words (128 bits)
    /// let bs = Bitset::zeros(Bitset::words_for(100));
    /// assert_eq!(bs.0.len(), 2);
    /// ```
    pub fn zeros(words: usize) -> Self {
        Bitset(vec![0u64; words])
    }

    /// Number of words needed to hold `num_taxa` bits.
    #[inline]
    pub fn words_for(num_taxa: usize) -> usize {
        num_taxa.div_ceil(64)
    }

    /// Builds a bitset sized for `num_taxa` with the given indices set.
    ///
    /// # Example
    /// ```
    /// # use split_cluster::bitset::Bitset;
    /// let bs = Bitset::from_indices(4, &[0, 2]);
    /// assert_eq!(bs.0[0], 0b0101);
    /// ```
    pub fn from_indices(num_taxa: usize, indices: &[usize]) -> Self {
        let mut bs = Bitset::zeros(Self::words_for(num_taxa));
        for &idx in indices {
            bs.set(idx);
        }
        bs
    }

    /// Sets the bit at the given index to 1.
    #[inline]
    pub fn set(&mut self, idx: usize) {
        let word = idx >> 6;     // Equivalent to idx / 64
        let bit = idx & 63;      // Equivalent to idx % 64
        self.0[word] |= 1u64 << bit;
    }

    /// Returns whether the bit at `idx` is set. Indices past the end read as unset.
    ///
    /// # Example
    /// ```
    /// # use split_cluster::bitset::Bitset;
    /// let bs = Bitset::from_indices(70, &[3, 65]);
    /// assert!(bs.contains(65));
    /// assert!(!bs.contains(4));
    /// assert!(!bs.contains(500));
    /// ```
    #[inline]
    pub fn contains(&self, idx: usize) -> bool {
        self.0
            .get(idx >> 6)
            .is_some_and(|w| w & (1u64 << (idx & 63)) != 0)
    }

    /// Performs bitwise OR with another bitset (union operation).
    ///
    /// Merges two taxon sets: `self` becomes `self ∪ other`
    ///
    /// # Example
    /// ```
    /// # use split_cluster::bitset::Bitset;
    /// let mut left = Bitset::zeros(1);
    /// left.set(0);   // {0}
    ///
    /// let mut right = Bitset::zeros(1);
    /// right.set(1);  // {1}
    ///
    /// left.or_assign(&right);  // {0} ∪ {1} = {0, 1}
    /// assert_eq!(left.0[0], 0b11);
    /// ```
    #[inline]
    pub fn or_assign(&mut self, other: &Bitset) {
        for (a, b) in self.0.iter_mut().zip(&other.0) {
            *a |= *b;
        }
    }

    /// Counts the number of set bits (population count).
    #[inline]
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Complement within the first `num_taxa` bits; bits past `num_taxa` stay 0.
    ///
    /// # Example
    /// Input:  0b0011 (4 taxa) → Output: 0b1100
    pub fn complement(&self, num_taxa: usize) -> Bitset {
        let mut out = Bitset::zeros(self.0.len());
        for i in 0..num_taxa {
            if !self.contains(i) {
                out.set(i);
            }
        }
        out
    }

    /// Iterates over set indices in ascending order.
    ///
    /// # Example
    /// ```
    /// # use split_cluster::bitset::Bitset;
    /// let bs = Bitset::from_indices(130, &[129, 1, 64]);
    /// assert_eq!(bs.ones().collect::<Vec<_>>(), vec![1, 64, 129]);
    /// ```
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .map(move |bit| (w << 6) + bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitset_basic() {
        let mut bs = Bitset::zeros(1);
        bs.set(0);
        bs.set(2);
        assert_eq!(bs.0[0], 0b0101);
        assert!(bs.contains(2));
        assert!(!bs.contains(1));
    }

    #[test]
    fn test_bitset_or() {
        let mut bs1 = Bitset::from_indices(4, &[0, 1]);
        let bs2 = Bitset::from_indices(4, &[2, 3]);

        bs1.or_assign(&bs2);
        assert_eq!(bs1.0[0], 0b1111);
        assert_eq!(bs1.count_ones(), 4);
    }

    /// ```text
    ///           root
    ///          /    \
    ///        node1   D
    ///        /   \
    ///       A    node2
    ///            /   \
    ///           B     C
    /// ```
    ///
    /// Taxa: A=0, B=1, C=2, D=3
    ///
    /// - node2: {B, C} → `0b0110`, complement {A, D} → `0b1001`
    /// - node1: {A, B, C} → `0b0111`, complement {D} → `0b1000`
    #[test]
    fn test_mini_tree_complements() {
        let node2 = Bitset::from_indices(4, &[1, 2]);
        assert_eq!(node2.complement(4).0[0], 0b1001);

        let mut node1 = Bitset::from_indices(4, &[0]);
        node1.or_assign(&node2);
        assert_eq!(node1.0[0], 0b0111);
        assert_eq!(node1.complement(4).0[0], 0b1000);
    }

    #[test]
    fn test_large_set() {
        // More than 64 taxa (multiple words)
        let bs = Bitset::from_indices(128, &[0, 63, 64, 127]);

        assert_eq!(bs.count_ones(), 4);
        assert_eq!(bs.0[0], 1u64 | (1u64 << 63));
        assert_eq!(bs.0[1], 1u64 | (1u64 << 63));
        assert_eq!(bs.ones().collect::<Vec<_>>(), vec![0, 63, 64, 127]);

        // complement must not spill into bits past num_taxa
        let comp = Bitset::from_indices(70, &[0]).complement(70);
        assert_eq!(comp.count_ones(), 69);
        assert!(!comp.contains(70));
    }
}
