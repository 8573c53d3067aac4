//! Posterior-probability support for a single split.
//!
//! High PP across a split's sampled pairs means the two sides cannot be told
//! apart, so the split is *satisfied* and stays collapsed. Low PP means the
//! sides should be separated and the split is introduced into the partition.

use crate::error::{ClusterError, Result};
use crate::matrix::SquareMatrix;
use crate::split::Pair;
use std::fmt;
use std::str::FromStr;

/// How the sampled PP values of a split are aggregated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SupportMethod {
    /// Arithmetic mean, compared as `mean + f64::EPSILON >= threshold`.
    #[default]
    Mean,
}

impl SupportMethod {
    /// Looks up a method by its legacy numeric code (`0` = mean).
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(SupportMethod::Mean),
            other => Err(ClusterError::UnknownMethod(other.to_string())),
        }
    }

    /// The aggregate statistic over `pairs`, reading `pp[first * n + second]`.
    ///
    /// `pairs` is a per-split sample, so `first` is the small-side taxon.
    pub fn statistic(self, pairs: &[Pair], pp: &SquareMatrix) -> f64 {
        match self {
            SupportMethod::Mean => {
                let sum: f64 = pairs.iter().map(|p| pp.get(p.first, p.second)).sum();
                sum / pairs.len() as f64
            }
        }
    }

    /// Returns true when the split is satisfied (do not introduce it).
    ///
    /// # Example
    /// ```
    /// # use split_cluster::matrix::SquareMatrix;
    /// # use split_cluster::split::Pair;
    /// # use split_cluster::support::SupportMethod;
    /// let pp = SquareMatrix::filled(4, 0.5);
    /// let pairs = [Pair::new(0, 2), Pair::new(1, 3)];
    /// assert!(SupportMethod::Mean.is_satisfied(&pairs, &pp, 0.5));
    /// assert!(!SupportMethod::Mean.is_satisfied(&pairs, &pp, 0.6));
    /// ```
    pub fn is_satisfied(self, pairs: &[Pair], pp: &SquareMatrix, threshold: f64) -> bool {
        match self {
            SupportMethod::Mean => self.statistic(pairs, pp) + f64::EPSILON >= threshold,
        }
    }
}

impl FromStr for SupportMethod {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(SupportMethod::Mean),
            _ => Err(ClusterError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for SupportMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupportMethod::Mean => write!(f, "mean"),
        }
    }
}
