//! Flattened square matrices over taxon indices.
//!
//! Both the tree-distance matrix and the posterior-probability matrix are N×N,
//! stored row-major in a single `Vec<f64>`: entry (i, j) lives at `i * n + j`.

use crate::error::{ClusterError, Result};

/// A row-major N×N matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    n: usize,
    values: Vec<f64>,
}

impl SquareMatrix {
    /// An `n`×`n` matrix filled with `value`.
    pub fn filled(n: usize, value: f64) -> Self {
        SquareMatrix { n, values: vec![value; n * n] }
    }

    /// Wraps a flattened matrix, checking that it holds exactly `n * n` values.
    ///
    /// # Example
    /// ```
    /// # use split_cluster::matrix::SquareMatrix;
    /// let m = SquareMatrix::from_flat(2, vec![0.0, 1.5, 1.5, 0.0]).unwrap();
    /// assert_eq!(m.get(0, 1), 1.5);
    /// assert!(SquareMatrix::from_flat(2, vec![0.0; 3]).is_err());
    /// ```
    pub fn from_flat(n: usize, values: Vec<f64>) -> Result<Self> {
        let expected = n * n;
        if values.len() != expected {
            return Err(ClusterError::MatrixSizeMismatch { n, expected, found: values.len() });
        }
        Ok(SquareMatrix { n, values })
    }

    /// Side length.
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.values[i * self.n + j] = value;
    }

    /// Writes `value` at (i, j) and (j, i).
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f64) {
        self.set(i, j, value);
        self.set(j, i, value);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }
}
