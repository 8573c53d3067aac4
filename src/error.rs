//! Error type shared by the clustering engine, the tree adapter and the I/O layer.

use phylotree::tree::TreeError;
use thiserror::Error;

/// Everything that can go wrong while clustering, short of a broken internal invariant.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Taxon names were already attached.
    #[error("taxon names are already set ({count} names)")]
    NamesAlreadySet { count: usize },

    /// An empty name list was supplied.
    #[error("at least one taxon name is required")]
    NoTaxa,

    /// The same name was supplied twice.
    #[error("taxon name `{name}` appears more than once")]
    DuplicateName { name: String },

    /// A tree was attached before the names.
    #[error("taxon names must be set before attaching a tree")]
    NamesNotSet,

    /// A tree is already attached.
    #[error("a tree is already attached")]
    TreeAlreadyAttached,

    /// Output was requested before a tree was attached.
    #[error("no tree attached: splits and pairs have not been computed")]
    NotReady,

    /// The tree (or a precomputed layout) does not describe the attached taxa.
    #[error("tree describes {found} taxa but {expected} names are set")]
    TaxonCountMismatch { expected: usize, found: usize },

    /// A leaf carries a name that is not in the name list.
    #[error("tree leaf `{name}` is not among the taxon names")]
    UnknownLeaf { name: String },

    /// A leaf has no name at all.
    #[error("tree contains an unnamed leaf (node {node})")]
    UnnamedLeaf { node: usize },

    /// A precomputed split is not a bipartition of 0..N.
    #[error("split {index} is not a valid bipartition: {reason}")]
    InvalidSplit { index: usize, reason: String },

    /// A flattened square matrix had the wrong number of entries.
    #[error("matrix has {found} entries but {expected} ({n}x{n}) were expected")]
    MatrixSizeMismatch { n: usize, expected: usize, found: usize },

    /// The sampled pair list came out empty.
    #[error("no pairs to calculate: the tree has no non-trivial splits or does not match the names")]
    NoPairs,

    /// The aggregate support method is not recognised.
    #[error("unknown support method `{0}` (expected `mean`)")]
    UnknownMethod(String),

    /// The configured number of pairs per split is unusable.
    #[error("approximate pair count per split must be at least 1 (got {0})")]
    InvalidSampleCount(usize),

    /// The support threshold is NaN or infinite.
    #[error("support threshold must be a finite number (got {0})")]
    InvalidThreshold(f64),

    /// Newick parsing failed.
    #[error("failed to parse Newick tree: {0}")]
    Newick(String),

    /// Tree traversal failed.
    #[error(transparent)]
    Tree(#[from] TreeError),

    /// A requested pair had no posterior probability in the input table.
    #[error("no posterior probability supplied for pair ({first}, {second})")]
    MissingProbability { first: String, second: String },

    /// A line of an input table could not be parsed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
