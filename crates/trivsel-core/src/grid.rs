//! Partitioning of a bounding box into grid sample points.

use crate::geo::{BoundingBox, Coordinate};

pub const DEFAULT_GRID_POINTS: f64 = 25.0;
pub const MIN_GRID_POINTS: f64 = 1.0;
pub const MAX_GRID_POINTS: f64 = 40.0;

/// A single sample position in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSample {
    pub id: String,
    pub row: usize,
    pub col: usize,
    pub coord: Coordinate,
}

/// Layout of a sampled grid over a box.
///
/// `rows = floor(sqrt(n))`, `cols = ceil(n / rows)`; the final row may be
/// partial so that exactly `ceil(n)` samples are produced. A fractional `n`
/// shapes the layout as given and only rounds the sample count.
#[derive(Debug, Clone, PartialEq)]
pub struct GridPlan {
    pub bounds: BoundingBox,
    pub point_count: usize,
    pub rows: usize,
    pub cols: usize,
    pub lat_step: f64,
    pub lon_step: f64,
}

impl GridPlan {
    /// Build a plan for `requested` points, clamped to `[1, 40]`.
    pub fn new(bounds: BoundingBox, requested: f64) -> Self {
        let count = clamp_point_count(requested);
        let point_count = count.ceil() as usize;
        let rows = (count.sqrt().floor() as usize).max(1);
        let cols = (count / rows as f64).ceil() as usize;

        let lat_step = (bounds.max_lat - bounds.min_lat) / rows.saturating_sub(1).max(1) as f64;
        let lon_step = (bounds.max_lon - bounds.min_lon) / cols.saturating_sub(1).max(1) as f64;

        Self {
            bounds,
            point_count,
            rows,
            cols,
            lat_step,
            lon_step,
        }
    }

    /// Enumerate sample positions row by row, stopping after `point_count`.
    pub fn samples(&self) -> Vec<GridSample> {
        let mut samples = Vec::with_capacity(self.point_count);
        'rows: for row in 0..self.rows {
            let lat = self.bounds.min_lat + row as f64 * self.lat_step;
            for col in 0..self.cols {
                if samples.len() >= self.point_count {
                    break 'rows;
                }
                let lon = self.bounds.min_lon + col as f64 * self.lon_step;
                samples.push(GridSample {
                    id: format!("p-{}", samples.len()),
                    row,
                    col,
                    coord: Coordinate::new(lat, lon),
                });
            }
        }
        samples
    }
}

/// Clamp to `[1, 40]`; NaN collapses to the minimum.
pub fn clamp_point_count(requested: f64) -> f64 {
    if requested.is_nan() {
        return MIN_GRID_POINTS;
    }
    requested.clamp(MIN_GRID_POINTS, MAX_GRID_POINTS)
}
