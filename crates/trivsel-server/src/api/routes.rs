//! REST API routes.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use crate::api::error::ApiError;
use crate::api::rate_limit::{enforce_rate_limit, RateLimitGuard};
use crate::api::request_id::trace_request;
use crate::config::Config;
use crate::state::AppState;
use trivsel_core::{
    ClimateData, Coordinate, ElevationData, EnergyData, GeoValidator, GridPoint, HealthStatus,
    PollutionData, ProviderResult, Reading, SourceCatalog, SourceInfo, SourceTagged, Summary,
    DEFAULT_GRID_POINTS,
};

/// Create the API router.
pub fn create_router(config: &Config) -> Router<Arc<AppState>> {
    let global = RateLimitGuard::global(config);
    let grid = RateLimitGuard::grid(config);

    // Grid has its own, much stricter limiter on top of the global one.
    let grid_routes = Router::new()
        .route("/v1/grid", get(get_grid))
        .layer(middleware::from_fn_with_state(grid, enforce_rate_limit));

    Router::new()
        .route("/health", get(health_check))
        .route("/sources", get(list_sources))
        .route("/v1/klima", get(get_climate))
        .route("/v1/forurensing", get(get_pollution))
        .route("/v1/hoyde", get(get_elevation))
        .route("/v1/energi", get(get_energy))
        .route("/v1/sammendrag", get(get_summary))
        .merge(grid_routes)
        .layer(middleware::from_fn_with_state(global, enforce_rate_limit))
        .layer(middleware::from_fn_with_state(
            config.trust_proxy,
            trace_request,
        ))
}

// === Query parsing ===

/// Raw `lat`/`lon` as sent; parsed by hand so malformed numbers surface as
/// validation errors rather than extractor rejections.
#[derive(Debug, Deserialize)]
pub struct CoordinateQuery {
    lat: Option<String>,
    lon: Option<String>,
}

impl CoordinateQuery {
    /// Undecodable query strings (duplicate keys, bad escapes) count as
    /// missing coordinates.
    fn from_query(
        query: Result<Query<Self>, QueryRejection>,
    ) -> Result<Coordinate, ApiError> {
        let Query(query) = query.map_err(|_| ApiError::MissingCoordinates)?;
        query.validate()
    }

    fn validate(&self) -> Result<Coordinate, ApiError> {
        let (Some(lat), Some(lon)) = (self.lat.as_deref(), self.lon.as_deref()) else {
            return Err(ApiError::MissingCoordinates);
        };
        Ok(GeoValidator::validate(parse_or_nan(lat), parse_or_nan(lon))?)
    }
}

fn parse_or_nan(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(f64::NAN)
}

fn parse_finite(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridQuery {
    min_lat: Option<String>,
    max_lat: Option<String>,
    min_lon: Option<String>,
    max_lon: Option<String>,
    points: Option<String>,
    #[allow(dead_code)] // Accepted for forward compatibility; every layer is always returned.
    layers: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GridParams {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
    points: f64,
}

impl GridQuery {
    fn parse(&self) -> Result<GridParams, ApiError> {
        let field = |raw: &Option<String>| parse_finite(raw.as_deref());
        let (Some(min_lat), Some(max_lat), Some(min_lon), Some(max_lon)) = (
            field(&self.min_lat),
            field(&self.max_lat),
            field(&self.min_lon),
            field(&self.max_lon),
        ) else {
            return Err(ApiError::InvalidParameters);
        };

        // Passed through unrounded; the planner shapes the grid from it.
        let points = match self.points.as_deref() {
            None => DEFAULT_GRID_POINTS,
            Some(raw) => parse_finite(Some(raw)).ok_or(ApiError::InvalidParameters)?,
        };

        Ok(GridParams {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            points,
        })
    }
}

fn available<T: SourceTagged>(
    result: ProviderResult<T>,
    unavailable: &'static str,
) -> Result<Json<Reading<T>>, ApiError> {
    result
        .into_reading()
        .map(Json)
        .ok_or(ApiError::Unavailable(unavailable))
}

// === Handlers ===

async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

async fn list_sources() -> Json<SourceCatalog> {
    Json(source_catalog())
}

pub fn source_catalog() -> SourceCatalog {
    let source = |name: &str, kind: &str, description: &str, attribution: Option<&str>| {
        SourceInfo {
            name: name.to_string(),
            kind: kind.to_string(),
            description: description.to_string(),
            attribution: attribution.map(str::to_string),
        }
    };

    SourceCatalog {
        sources: vec![
            source(
                "MET Norway",
                "Climate",
                "Temperature, Wind, Precipitation from Locationforecast 2.0",
                Some("Data from MET Norway, licensed under CC BY 4.0"),
            ),
            source(
                "Kartverket / GeoNorge",
                "Elevation",
                "Elevation data for coordinates",
                Some("© Kartverket via GeoNorge"),
            ),
            source(
                "MET AirQuality",
                "Pollution",
                "Air quality forecast",
                Some("Data from MET Norway"),
            ),
            source(
                "Mock Energy Provider",
                "Energy",
                "Simulated energy grid context for MVP",
                None,
            ),
        ],
    }
}

async fn get_climate(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Reading<ClimateData>>, ApiError> {
    let coord = CoordinateQuery::from_query(query)?;
    let result = state.providers().climate.fetch(coord.lat, coord.lon).await;
    available(result, "Climate data unavailable")
}

async fn get_pollution(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Reading<PollutionData>>, ApiError> {
    let coord = CoordinateQuery::from_query(query)?;
    let result = state.providers().pollution.fetch(coord.lat, coord.lon).await;
    available(result, "Pollution data unavailable")
}

async fn get_elevation(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Reading<ElevationData>>, ApiError> {
    let coord = CoordinateQuery::from_query(query)?;
    let result = state.providers().elevation.fetch(coord.lat, coord.lon).await;
    available(result, "Elevation data unavailable")
}

async fn get_energy(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Reading<EnergyData>>, ApiError> {
    let coord = CoordinateQuery::from_query(query)?;
    let result = state.providers().energy.fetch(coord.lat, coord.lon).await;
    available(result, "Energy data unavailable")
}

async fn get_summary(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CoordinateQuery>, QueryRejection>,
) -> Result<Json<Summary>, ApiError> {
    let coord = CoordinateQuery::from_query(query)?;
    Ok(Json(state.summary().summarize(coord).await))
}

async fn get_grid(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GridQuery>, QueryRejection>,
) -> Result<Json<Vec<GridPoint>>, ApiError> {
    let Query(query) = query.map_err(|_| ApiError::InvalidParameters)?;
    let params = query.parse()?;
    let bounds = GeoValidator::validate_box(
        params.min_lat,
        params.max_lat,
        params.min_lon,
        params.max_lon,
    )
    .map_err(|err| ApiError::Validation(format!("Grid bounds outside allowed area: {}", err)))?;

    Ok(Json(state.grid().resolve(bounds, params.points).await))
}
