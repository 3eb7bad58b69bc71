pub mod fallback;
pub mod geo;
pub mod grid;
pub mod models;

pub use geo::{Bound, BoundingBox, Coordinate, GeoError, GeoValidator, SERVICE_AREA};
pub use grid::{GridPlan, GridSample, DEFAULT_GRID_POINTS, MAX_GRID_POINTS};
pub use models::{
    ClimateData, ElevationData, EnergyContext, EnergyData, GridPoint, HealthStatus, Location,
    Observation, PollutionData, ProviderResult, Reading, SourceCatalog, SourceInfo,
    SourceTagged, Summary, SummaryMeta, MOCK_SOURCE,
};
