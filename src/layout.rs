//! Extract splits and tree distances from a phylogenetic tree.
//!
//! # Overview
//! A [`TreeLayout`] is everything the clustering engine needs from a tree:
//! the ordered list of non-trivial splits and the full patristic distance
//! matrix between taxa. It is computed once when a tree is attached and is
//! immutable afterwards.
//!
//! # Why taxon NAMES and not node IDs
//! Node IDs are assigned during tree parsing. The caller's taxon names fix the
//! index of each taxon, so every leaf is looked up by name.

use crate::bitset::Bitset;
use crate::error::{ClusterError, Result};
use crate::matrix::SquareMatrix;
use crate::split::Split;
use phylotree::tree::Tree as PhyloTree;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Anything that can describe the taxa as splits plus a distance matrix.
///
/// Implemented for [`phylotree::tree::Tree`] and for an already computed [`TreeLayout`].
pub trait TreeSource {
    /// Computes the layout for the taxa named (and indexed) by `names`.
    fn layout(&self, names: &[String]) -> Result<TreeLayout>;
}

/// Splits in tree order plus the N×N distance matrix.
#[derive(Debug, Clone)]
pub struct TreeLayout {
    splits: Vec<Split>,
    distances: SquareMatrix,
}

/// One root-to-leaf path: each ancestor with its distance from the root.
type RootPath = Vec<(usize, f64)>;

impl TreeLayout {
    /// Builds a layout from precomputed splits and distances.
    ///
    /// The taxon count is the side length of `distances`. Every split must have
    /// two non-empty, disjoint sides that together cover 0..N.
    ///
    /// # Errors
    /// [`ClusterError::InvalidSplit`] naming the first offending split.
    pub fn new(splits: Vec<Split>, distances: SquareMatrix) -> Result<Self> {
        let n = distances.n();
        for (index, split) in splits.iter().enumerate() {
            let invalid = |reason: &str| ClusterError::InvalidSplit { index, reason: reason.to_string() };
            if split.left().is_empty() || split.right().is_empty() {
                return Err(invalid("one side is empty"));
            }
            if split.num_taxa() != n {
                return Err(invalid("sides do not cover every taxon exactly once"));
            }
            let mut seen = Bitset::zeros(Bitset::words_for(n));
            for &taxon in split.left().iter().chain(split.right()) {
                if taxon >= n {
                    return Err(invalid("taxon index out of range"));
                }
                if seen.contains(taxon) {
                    return Err(invalid("sides overlap"));
                }
                seen.set(taxon);
            }
        }
        Ok(TreeLayout { splits, distances })
    }

    /// Extract the layout of a phylogenetic tree.
    ///
    /// # Algorithm
    /// 1. Map each leaf to its taxon index through its name
    /// 2. DFS from the root, building clade bitsets bottom-up (OR of children)
    ///    and recording each leaf's root path with cumulative branch lengths
    /// 3. Walk the nodes in pre-order, turning every non-root clade into a split;
    ///    skip trivial splits and bipartitions already seen from another branch
    /// 4. Patristic distance for every pair: `depth(a) + depth(b) - 2 * depth(lca)`
    ///
    /// Missing branch lengths count as 0.0.
    ///
    /// # Errors
    /// - [`ClusterError::TaxonCountMismatch`] if the leaf count differs from `names.len()`
    /// - [`ClusterError::UnnamedLeaf`] / [`ClusterError::UnknownLeaf`] for leaves that
    ///   cannot be mapped, [`ClusterError::DuplicateName`] if two leaves share a name
    /// - [`ClusterError::Tree`] if the tree is empty or malformed
    pub fn from_tree(tree: &PhyloTree, names: &[String]) -> Result<Self> {
        let num_taxa = names.len();
        let leaves = tree.get_leaves();
        if leaves.len() != num_taxa {
            return Err(ClusterError::TaxonCountMismatch { expected: num_taxa, found: leaves.len() });
        }

        // Step 1: node_id → taxon index (based on the caller's names)
        let name_to_index: HashMap<&str, usize> =
            names.iter().enumerate().map(|(idx, name)| (name.as_str(), idx)).collect();
        let mut node_to_taxon: HashMap<usize, usize> = HashMap::with_capacity(num_taxa);
        let mut claimed = vec![false; num_taxa];
        for &leaf_id in &leaves {
            let name = tree
                .get(&leaf_id)?
                .name
                .as_deref()
                .ok_or(ClusterError::UnnamedLeaf { node: leaf_id })?;
            let idx = *name_to_index
                .get(name)
                .ok_or_else(|| ClusterError::UnknownLeaf { name: name.to_string() })?;
            if claimed[idx] {
                return Err(ClusterError::DuplicateName { name: name.to_string() });
            }
            claimed[idx] = true;
            node_to_taxon.insert(leaf_id, idx);
        }

        // Step 2: clade bitsets and root paths
        let root_id = tree.get_root()?;
        let mut walk = Walk {
            tree,
            node_to_taxon: &node_to_taxon,
            words: Bitset::words_for(num_taxa),
            preorder: Vec::new(),
            clades: HashMap::new(),
            paths: vec![None; num_taxa],
        };
        let mut path = Vec::new();
        walk.visit(root_id, 0.0, &mut path)?;

        // Step 3: splits in pre-order
        let splits = Self::collect_splits(&walk, root_id, num_taxa);

        // Step 4: distances (every leaf was visited, so every path is present)
        let paths: Vec<RootPath> = walk
            .paths
            .into_iter()
            .enumerate()
            .map(|(idx, p)| p.ok_or_else(|| ClusterError::UnknownLeaf { name: names[idx].clone() }))
            .collect::<Result<_>>()?;
        let distances = Self::patristic_distances(&paths);

        tracing::debug!(taxa = num_taxa, splits = splits.len(), "extracted tree layout");
        Ok(TreeLayout { splits, distances })
    }

    /// Non-trivial, distinct splits in pre-order.
    ///
    /// # What we skip
    /// - Root node (doesn't create a bipartition)
    /// - Trivial splits: either side holds fewer than 2 taxa
    /// - A bipartition already produced by another branch. With a bifurcating
    ///   root both root children induce the same split; only the first is kept.
    ///
    /// Bipartitions are compared on their canonical side, the one that does NOT
    /// contain taxon 0.
    fn collect_splits(walk: &Walk<'_>, root_id: usize, num_taxa: usize) -> Vec<Split> {
        let mut seen: HashSet<Bitset> = HashSet::new();
        let mut splits = Vec::new();

        for node_id in &walk.preorder {
            if *node_id == root_id {
                continue;
            }
            let Some(clade) = walk.clades.get(node_id) else { continue };
            let size = clade.count_ones();
            if size < 2 || num_taxa - size < 2 {
                continue;
            }

            let complement = clade.complement(num_taxa);
            let canonical = if clade.contains(0) { complement.clone() } else { clade.clone() };
            if !seen.insert(canonical) {
                continue;
            }

            splits.push(Split::new(clade.ones().collect(), complement.ones().collect()));
        }

        splits
    }

    /// Pairwise patristic distances, computed in parallel over i<j and mirrored.
    fn patristic_distances(paths: &[RootPath]) -> SquareMatrix {
        let n = paths.len();
        let pairs: Vec<(usize, usize, f64)> = (0..n)
            .into_par_iter()
            .flat_map_iter(|i| (i + 1..n).map(move |j| (i, j)))
            .map(|(i, j)| (i, j, path_distance(&paths[i], &paths[j])))
            .collect();

        let mut distances = SquareMatrix::filled(n, 0.0);
        for (i, j, d) in pairs {
            distances.set_symmetric(i, j, d);
        }
        distances
    }

    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    pub fn distances(&self) -> &SquareMatrix {
        &self.distances
    }

    pub fn num_taxa(&self) -> usize {
        self.distances.n()
    }

    pub fn into_parts(self) -> (Vec<Split>, SquareMatrix) {
        (self.splits, self.distances)
    }
}

/// Distance between two leaves given their root paths.
fn path_distance(a: &RootPath, b: &RootPath) -> f64 {
    let lca_depth = a
        .iter()
        .zip(b)
        .take_while(|(x, y)| x.0 == y.0)
        .last()
        .map_or(0.0, |(x, _)| x.1);
    let depth_a = a.last().map_or(0.0, |x| x.1);
    let depth_b = b.last().map_or(0.0, |x| x.1);
    depth_a + depth_b - 2.0 * lca_depth
}

/// DFS state while extracting a layout.
struct Walk<'a> {
    tree: &'a PhyloTree,
    node_to_taxon: &'a HashMap<usize, usize>,
    words: usize,
    // Node IDs in pre-order
    preorder: Vec<usize>,
    // Key: node_id, Value: Bitset of taxa under this node
    clades: HashMap<usize, Bitset>,
    // Root path of each taxon, indexed by taxon
    paths: Vec<Option<RootPath>>,
}

impl Walk<'_> {
    /// Recursively compute clade bitsets via DFS.
    ///
    /// - **Leaf node**: bitset with its single taxon set; its root path is recorded
    /// - **Internal node**: OR together all child bitsets
    fn visit(&mut self, node_id: usize, depth: f64, path: &mut RootPath) -> Result<Bitset> {
        self.preorder.push(node_id);
        path.push((node_id, depth));

        let tree = self.tree;
        let node = tree.get(&node_id)?;
        let mut bitset = Bitset::zeros(self.words);

        if node.children.is_empty() {
            if let Some(&taxon) = self.node_to_taxon.get(&node_id) {
                bitset.set(taxon);
                self.paths[taxon] = Some(path.clone());
            }
        } else {
            for &child_id in &node.children {
                let child = tree.get(&child_id)?;
                let child_depth = depth + child.parent_edge.unwrap_or(0.0);
                let child_bitset = self.visit(child_id, child_depth, path)?;
                bitset.or_assign(&child_bitset);
            }
        }

        path.pop();
        self.clades.insert(node_id, bitset.clone());
        Ok(bitset)
    }
}

impl TreeSource for PhyloTree {
    fn layout(&self, names: &[String]) -> Result<TreeLayout> {
        TreeLayout::from_tree(self, names)
    }
}

impl TreeSource for TreeLayout {
    fn layout(&self, names: &[String]) -> Result<TreeLayout> {
        if self.num_taxa() != names.len() {
            return Err(ClusterError::TaxonCountMismatch { expected: names.len(), found: self.num_taxa() });
        }
        Ok(self.clone())
    }
}
