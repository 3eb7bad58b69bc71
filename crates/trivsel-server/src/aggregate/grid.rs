//! Bounding-box fan-out: every grid sample is resolved concurrently.

use futures::future::join_all;
use trivsel_core::{BoundingBox, GridPlan, GridPoint};

use super::summary::SummaryAggregator;

#[derive(Clone)]
pub struct GridAggregator {
    summary: SummaryAggregator,
}

impl GridAggregator {
    pub fn new(summary: SummaryAggregator) -> Self {
        Self { summary }
    }

    /// Resolve up to 40 samples over `bounds`, returned in row-major order.
    ///
    /// There is no internal concurrency cap; all samples and all providers
    /// per sample are in flight at once.
    pub async fn resolve(&self, bounds: BoundingBox, requested_points: f64) -> Vec<GridPoint> {
        let plan = GridPlan::new(bounds, requested_points);
        tracing::info!(
            rows = plan.rows,
            cols = plan.cols,
            points = plan.point_count,
            "Resolving grid"
        );

        let lookups = plan.samples().into_iter().map(|sample| async move {
            let results = self.summary.resolve(sample.coord).await;
            results.into_grid_point(sample)
        });
        join_all(lookups).await
    }
}
