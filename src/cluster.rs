//! The clustering run: names, then a tree, then any number of clusterings.
//!
//! # Lifecycle
//! ```text
//! Clusterer::new ──add_names──► named ──add_tree──► ready ──► pairs_to_calculate
//!                                                       └──► produce_clusters (repeatable)
//! ```
//! Splits and per-split pairs are computed once, when the tree is attached.
//! Every failed call leaves the state as it was.

use crate::aggregate;
use crate::builder::{build_partition, Partition};
use crate::error::{ClusterError, Result};
use crate::io::parse_newick;
use crate::layout::TreeSource;
use crate::matrix::SquareMatrix;
use crate::sampler::{sample_pairs, DEFAULT_APPROX_PAIRS};
use crate::split::{Pair, Split};
use crate::support::SupportMethod;
use std::collections::HashSet;
use tracing::{debug, info};

/// Settings that apply to a whole clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Approximate number of pairs sampled per split (`K`).
    pub approx_pairs: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        ClusterConfig { approx_pairs: DEFAULT_APPROX_PAIRS }
    }
}

impl ClusterConfig {
    pub fn with_approx_pairs(mut self, approx_pairs: usize) -> Self {
        self.approx_pairs = approx_pairs;
        self
    }

    /// # Errors
    /// [`ClusterError::InvalidSampleCount`] when `approx_pairs` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.approx_pairs == 0 {
            return Err(ClusterError::InvalidSampleCount(self.approx_pairs));
        }
        Ok(())
    }
}

/// One clustering run over a fixed set of taxa and a fixed tree.
///
/// # Example
/// ```
/// # use split_cluster::{Clusterer, SupportMethod};
/// let mut run = Clusterer::with_defaults();
/// run.add_names(["A", "B", "C", "D"].map(String::from).to_vec()).unwrap();
/// run.add_newick("((A:1,B:1):1,(C:1,D:1):1);").unwrap();
///
/// let pairs = run.pairs_to_calculate().unwrap();
/// assert!(pairs.iter().all(|p| p.first < p.second));
///
/// // weak support across the only split: it is introduced
/// let pp = vec![0.1; 16];
/// let clusters = run.produce_clusters(&pp, 0.5, SupportMethod::Mean).unwrap();
/// assert_eq!(clusters.groups(), &[vec![0, 1], vec![2, 3]]);
/// ```
#[derive(Debug, Clone)]
pub struct Clusterer {
    config: ClusterConfig,
    names: Vec<String>,
    splits: Vec<Split>,
    pairs: Vec<Vec<Pair>>,
    ready: bool,
}

impl Clusterer {
    /// # Errors
    /// Rejects an invalid [`ClusterConfig`].
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::empty(config))
    }

    pub fn with_defaults() -> Self {
        Self::empty(ClusterConfig::default())
    }

    fn empty(config: ClusterConfig) -> Self {
        Clusterer { config, names: Vec::new(), splits: Vec::new(), pairs: Vec::new(), ready: false }
    }

    /// Attach the taxon names; their order fixes the taxon indices.
    ///
    /// # Errors
    /// - [`ClusterError::NamesAlreadySet`] if names were attached before
    /// - [`ClusterError::NoTaxa`] for an empty list
    /// - [`ClusterError::DuplicateName`] if a name repeats
    pub fn add_names(&mut self, names: Vec<String>) -> Result<()> {
        if !self.names.is_empty() {
            return Err(ClusterError::NamesAlreadySet { count: self.names.len() });
        }
        if names.is_empty() {
            return Err(ClusterError::NoTaxa);
        }
        {
            let mut seen = HashSet::with_capacity(names.len());
            if let Some(dup) = names.iter().find(|n| !seen.insert(n.as_str())) {
                return Err(ClusterError::DuplicateName { name: dup.clone() });
            }
        }

        info!(taxa = names.len(), "taxon names attached");
        self.names = names;
        Ok(())
    }

    /// Attach the tree, extract its splits and sample pairs for each of them.
    ///
    /// # Errors
    /// - [`ClusterError::NamesNotSet`] before [`Clusterer::add_names`]
    /// - [`ClusterError::TreeAlreadyAttached`] on a second call
    /// - whatever the [`TreeSource`] reports, e.g. [`ClusterError::TaxonCountMismatch`]
    pub fn add_tree<T: TreeSource + ?Sized>(&mut self, tree: &T) -> Result<()> {
        if self.ready {
            return Err(ClusterError::TreeAlreadyAttached);
        }
        if self.names.is_empty() {
            return Err(ClusterError::NamesNotSet);
        }

        let layout = tree.layout(&self.names)?;
        if layout.num_taxa() != self.num_taxa() {
            return Err(ClusterError::TaxonCountMismatch { expected: self.num_taxa(), found: layout.num_taxa() });
        }
        let (splits, distances) = layout.into_parts();

        let pairs: Vec<Vec<Pair>> = splits
            .iter()
            .map(|split| sample_pairs(split, &distances, self.config.approx_pairs))
            .collect();

        info!(
            splits = splits.len(),
            sampled = pairs.iter().map(Vec::len).sum::<usize>(),
            "tree attached"
        );
        self.splits = splits;
        self.pairs = pairs;
        self.ready = true;
        Ok(())
    }

    /// Parse a Newick string and attach it as the tree.
    pub fn add_newick(&mut self, newick: &str) -> Result<()> {
        let tree = parse_newick(newick)?;
        self.add_tree(&tree)
    }

    /// The canonical, sorted, de-duplicated pairs whose PP the caller must supply.
    ///
    /// # Errors
    /// [`ClusterError::NotReady`] without a tree, [`ClusterError::NoPairs`] when
    /// the tree has no non-trivial split.
    pub fn pairs_to_calculate(&self) -> Result<Vec<Pair>> {
        if !self.ready {
            return Err(ClusterError::NotReady);
        }
        aggregate::pairs_to_calculate(&self.pairs)
    }

    /// Cluster the taxa given a flattened N×N PP matrix.
    ///
    /// Only the entries at `pp[small * N + big]` of the sampled pairs are read.
    ///
    /// # Errors
    /// [`ClusterError::NotReady`] without a tree, [`ClusterError::InvalidThreshold`]
    /// for a NaN or infinite threshold, [`ClusterError::MatrixSizeMismatch`]
    /// when `pp` does not hold N×N values.
    pub fn produce_clusters(&self, pp: &[f64], threshold: f64, method: SupportMethod) -> Result<Partition> {
        if !self.ready {
            return Err(ClusterError::NotReady);
        }
        if !threshold.is_finite() {
            return Err(ClusterError::InvalidThreshold(threshold));
        }
        let pp = SquareMatrix::from_flat(self.num_taxa(), pp.to_vec())?;

        let partition = build_partition(self.num_taxa(), &self.splits, |idx, _| {
            let satisfied = method.is_satisfied(&self.pairs[idx], &pp, threshold);
            debug!(split = idx, satisfied, "tested split");
            satisfied
        });

        info!(groups = partition.len(), threshold, %method, "clusters produced");
        Ok(partition)
    }

    /// The support statistic of one split, for reporting.
    ///
    /// # Errors
    /// As [`Clusterer::produce_clusters`]; an out-of-range split reads as `None`.
    pub fn split_support(&self, split: usize, pp: &[f64], method: SupportMethod) -> Result<Option<f64>> {
        if !self.ready {
            return Err(ClusterError::NotReady);
        }
        let pp = SquareMatrix::from_flat(self.num_taxa(), pp.to_vec())?;
        Ok(self.pairs.get(split).map(|pairs| method.statistic(pairs, &pp)))
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn num_taxa(&self) -> usize {
        self.names.len()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Non-trivial splits in tree order (empty before a tree is attached).
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Sampled (small, big) pairs of split `split`.
    pub fn pairs_for_split(&self, split: usize) -> Option<&[Pair]> {
        self.pairs.get(split).map(Vec::as_slice)
    }
}
