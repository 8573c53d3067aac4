//! Crate root: lightweight module orchestration and public re-exports.
//!
//! Modules:
//! - `layout`: splits and patristic distances extracted from a tree (`TreeSource`).
//! - `sampler`: fairness-capped pair sampling per split.
//! - `aggregate`: the global, de-duplicated list of pairs to calculate.
//! - `support`: posterior-probability support test for one split.
//! - `builder`: partition construction from rejected splits.
//! - `cluster`: the `Clusterer` lifecycle tying the above together.
//! - `bitset`, `matrix`, `split`: shared data types.
//! - `io`: reading trees and PP tables, writing pairs and clusters.
//! - `api`: Python bindings via `pyo3` (gated behind "python" feature).

pub mod aggregate;
pub mod bitset;
pub mod builder;
pub mod cluster;
pub mod error;
pub mod io;
pub mod layout;
pub mod matrix;
pub mod sampler;
pub mod split;
pub mod support;

#[cfg(feature = "python")]
pub mod api;

// Re-export frequently used types & functions
pub use builder::Partition;
pub use cluster::{ClusterConfig, Clusterer};
pub use error::{ClusterError, Result};
pub use layout::{TreeLayout, TreeSource};
pub use split::{Pair, Split};
pub use support::SupportMethod;
