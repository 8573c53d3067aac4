//! Python binding layer for split clustering.
//!
//! Exposes a `Clusterer` class mirroring the Rust lifecycle:
//! names, then a Newick tree, then pairs and clusters.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::cluster::{ClusterConfig, Clusterer};
use crate::error::ClusterError;
use crate::support::SupportMethod;

fn to_py_err(e: ClusterError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Tree-guided clustering of taxa from pairwise posterior probabilities.
///
/// Args:
///     pairs_per_split: Approximate number of pairs sampled per split (default: 10)
///
/// Raises:
///     ValueError: If pairs_per_split is 0
#[pyclass(name = "Clusterer")]
struct PyClusterer {
    inner: Clusterer,
}

#[pymethods]
impl PyClusterer {
    #[new]
    #[pyo3(signature = (pairs_per_split=10))]
    fn new(pairs_per_split: usize) -> PyResult<Self> {
        let config = ClusterConfig::default().with_approx_pairs(pairs_per_split);
        let inner = Clusterer::new(config).map_err(to_py_err)?;
        Ok(PyClusterer { inner })
    }

    /// Attach taxon names; their order fixes the taxon indices.
    ///
    /// Raises:
    ///     ValueError: If names were already set, are empty, or repeat
    fn add_names(&mut self, names: Vec<String>) -> PyResult<()> {
        self.inner.add_names(names).map_err(to_py_err)
    }

    /// Attach a Newick tree whose leaves are the taxon names.
    ///
    /// Raises:
    ///     ValueError: If names are missing, a tree is already attached, or the tree is invalid
    fn add_newick(&mut self, newick: &str) -> PyResult<()> {
        self.inner.add_newick(newick).map_err(to_py_err)
    }

    /// Returns:
    ///     A list of (i, j) taxon index pairs, i < j, that need posterior probabilities
    fn pairs_to_calculate(&self) -> PyResult<Vec<(usize, usize)>> {
        let pairs = self.inner.pairs_to_calculate().map_err(to_py_err)?;
        Ok(pairs.into_iter().map(|p| (p.first, p.second)).collect())
    }

    /// Cluster the taxa.
    ///
    /// Args:
    ///     pp: Flattened N*N posterior probability matrix (row-major)
    ///     threshold: Support threshold
    ///     method: Support statistic, "mean" (default)
    ///
    /// Returns:
    ///     A list of groups, each a sorted list of taxon indices
    #[pyo3(signature = (pp, threshold, method="mean"))]
    fn produce_clusters(&self, pp: Vec<f64>, threshold: f64, method: &str) -> PyResult<Vec<Vec<usize>>> {
        let method: SupportMethod = method.parse().map_err(to_py_err)?;
        let partition = self.inner.produce_clusters(&pp, threshold, method).map_err(to_py_err)?;
        Ok(partition.into_groups())
    }

    #[getter]
    fn names(&self) -> Vec<String> {
        self.inner.names().to_vec()
    }

    #[getter]
    fn num_splits(&self) -> usize {
        self.inner.splits().len()
    }
}

/// Python module definition
#[pymodule]
fn split_cluster(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyClusterer>()?;
    Ok(())
}
