//! Fan-out over providers for a point or a box.

pub mod grid;
pub mod summary;

pub use grid::GridAggregator;
pub use summary::{PointResults, SummaryAggregator};
