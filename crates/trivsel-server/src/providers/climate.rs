//! Weather from MET Norway Locationforecast. No fallback: failures are
//! reported as `Unavailable`.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};
use trivsel_core::{ClimateData, Observation, ProviderResult};

use super::{cached_fetch, fetch_json, ProviderError, ProviderKind};
use crate::cache::TtlCache;
use crate::fetcher::RetryingFetcher;

const KIND: ProviderKind = ProviderKind::Climate;

#[derive(Debug, Deserialize)]
struct LocationForecast {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    #[serde(default)]
    timeseries: Vec<ForecastStep>,
}

#[derive(Debug, Deserialize)]
struct ForecastStep {
    data: ForecastStepData,
}

#[derive(Debug, Deserialize)]
struct ForecastStepData {
    instant: InstantData,
    #[serde(default)]
    next_1_hours: Option<PeriodData>,
}

#[derive(Debug, Deserialize)]
struct InstantData {
    details: InstantDetails,
}

#[derive(Debug, Deserialize)]
struct InstantDetails {
    air_temperature: f64,
    wind_speed: f64,
}

#[derive(Debug, Deserialize)]
struct PeriodData {
    #[serde(default)]
    details: Option<PeriodDetails>,
}

#[derive(Debug, Deserialize)]
struct PeriodDetails {
    #[serde(default)]
    precipitation_amount: Option<f64>,
}

pub struct ClimateProvider {
    fetcher: Arc<RetryingFetcher>,
    cache: Arc<TtlCache<Observation<ClimateData>>>,
    base_url: String,
}

impl ClimateProvider {
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        cache: Arc<TtlCache<Observation<ClimateData>>>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch(&self, lat: f64, lon: f64) -> ProviderResult<ClimateData> {
        cached_fetch(KIND, &self.cache, lat, lon, self.fetch_upstream(lat, lon), |err| {
            error!(provider = KIND.as_str(), error = %err, "Failed to fetch climate data");
            ProviderResult::Unavailable
        })
        .await
    }

    async fn fetch_upstream(&self, lat: f64, lon: f64) -> Result<ClimateData, ProviderError> {
        let url = format!("{}?lat={:.3}&lon={:.3}", self.base_url, lat, lon);
        info!("Fetching climate data from {}", url);

        let forecast: LocationForecast = fetch_json(&self.fetcher, &url).await?;
        parse_forecast(forecast)
    }
}

fn parse_forecast(forecast: LocationForecast) -> Result<ClimateData, ProviderError> {
    let step = forecast
        .properties
        .timeseries
        .into_iter()
        .next()
        .ok_or(ProviderError::MissingField("properties.timeseries[0]"))?;

    let details = step.data.instant.details;
    let precipitation_mm = step
        .data
        .next_1_hours
        .and_then(|period| period.details)
        .and_then(|details| details.precipitation_amount)
        .unwrap_or(0.0);

    Ok(ClimateData {
        temperature_c: details.air_temperature,
        wind_speed_mps: details.wind_speed,
        precipitation_mm,
    })
}
