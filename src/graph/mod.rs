//! Graph views derived from an analysis result.

pub mod projector;
pub mod stats;

pub use projector::project;
pub use stats::{cluster_sizes, most_connected, ClusterSize};
