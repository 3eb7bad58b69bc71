//! Terrain height from Kartverket via the GeoNorge point API.
//!
//! Falls back to a smooth deterministic pseudo-elevation so repeated failed
//! lookups at one point stay stable.

use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;
use trivsel_core::fallback::mock_elevation;
use trivsel_core::{ElevationData, Observation, ProviderResult};

use super::{cached_fetch, fetch_json, ProviderError, ProviderKind};
use crate::cache::TtlCache;
use crate::fetcher::RetryingFetcher;

const KIND: ProviderKind = ProviderKind::Elevation;

#[derive(Debug, Deserialize)]
struct ElevationPoint {
    #[serde(default)]
    properties: Option<ElevationProperties>,
}

#[derive(Debug, Deserialize)]
struct ElevationProperties {
    #[serde(default)]
    value: Option<f64>,
}

pub struct ElevationProvider {
    fetcher: Arc<RetryingFetcher>,
    cache: Arc<TtlCache<Observation<ElevationData>>>,
    base_url: String,
}

impl ElevationProvider {
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        cache: Arc<TtlCache<Observation<ElevationData>>>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch(&self, lat: f64, lon: f64) -> ProviderResult<ElevationData> {
        cached_fetch(KIND, &self.cache, lat, lon, self.fetch_upstream(lat, lon), |err| {
            warn!(
                provider = KIND.as_str(),
                error = %err,
                "Failed to fetch elevation, falling back to mock"
            );
            ProviderResult::mock(ElevationData {
                elevation_meters: mock_elevation(lat, lon),
            })
        })
        .await
    }

    async fn fetch_upstream(&self, lat: f64, lon: f64) -> Result<ElevationData, ProviderError> {
        // GeoNorge expects WGS84 (EPSG:4326) and the unrounded position.
        let url = format!(
            "{}?nord={}&ost={}&koordsys=4326&geojson=true",
            self.base_url, lat, lon
        );

        let point: ElevationPoint = fetch_json(&self.fetcher, &url).await?;
        let elevation_meters = point
            .properties
            .and_then(|props| props.value)
            .ok_or(ProviderError::MissingField("properties.value"))?;

        Ok(ElevationData { elevation_meters })
    }
}
