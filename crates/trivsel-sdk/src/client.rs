//! HTTP client for the Trivsel gateway.

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use trivsel_core::{
    BoundingBox, ClimateData, ElevationData, EnergyData, GridPoint, HealthStatus, PollutionData,
    Reading, SourceCatalog, Summary,
};

/// Client for one gateway instance.
#[derive(Debug, Clone)]
pub struct TrivselClient {
    base_url: String,
    client: reqwest::Client,
}

/// Parameters for `/v1/grid`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridRequest {
    pub bounds: BoundingBox,
    /// Requested sample count; the gateway clamps it to 1..=40 and defaults to 25.
    pub points: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl TrivselClient {
    /// Create a new client. Trailing slashes on `base_url` are ignored.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        self.get("/health", &[]).await
    }

    pub async fn sources(&self) -> Result<SourceCatalog> {
        self.get("/sources", &[]).await
    }

    /// Current weather. Fails when the gateway reports climate as unavailable.
    pub async fn climate(&self, lat: f64, lon: f64) -> Result<Reading<ClimateData>> {
        self.get("/v1/klima", &point_query(lat, lon)).await
    }

    pub async fn pollution(&self, lat: f64, lon: f64) -> Result<Reading<PollutionData>> {
        self.get("/v1/forurensing", &point_query(lat, lon)).await
    }

    pub async fn elevation(&self, lat: f64, lon: f64) -> Result<Reading<ElevationData>> {
        self.get("/v1/hoyde", &point_query(lat, lon)).await
    }

    pub async fn energy(&self, lat: f64, lon: f64) -> Result<Reading<EnergyData>> {
        self.get("/v1/energi", &point_query(lat, lon)).await
    }

    /// All providers for one point in a single call.
    pub async fn summary(&self, lat: f64, lon: f64) -> Result<Summary> {
        self.get("/v1/sammendrag", &point_query(lat, lon)).await
    }

    pub async fn grid(&self, request: GridRequest) -> Result<Vec<GridPoint>> {
        self.get("/v1/grid", &grid_query(&request)).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(url = %url, "Gateway request");

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        anyhow::bail!("{} failed ({}): {}", path, status, error_message(&text))
    }
}

fn point_query(lat: f64, lon: f64) -> Vec<(&'static str, String)> {
    vec![("lat", lat.to_string()), ("lon", lon.to_string())]
}

fn grid_query(request: &GridRequest) -> Vec<(&'static str, String)> {
    let bounds = request.bounds;
    let mut query = vec![
        ("minLat", bounds.min_lat.to_string()),
        ("maxLat", bounds.max_lat.to_string()),
        ("minLon", bounds.min_lon.to_string()),
        ("maxLon", bounds.max_lon.to_string()),
    ];
    if let Some(points) = request.points {
        query.push(("points", points.to_string()));
    }
    query
}

/// The gateway's `{error}` message, or the raw body when it is not JSON.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error)
        .unwrap_or_else(|_| body.trim().to_string())
}
