//! Air quality from MET Norway Airqualityforecast, with a fixed mock payload
//! when the upstream cannot answer.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};
use trivsel_core::fallback::{air_quality_index, mock_pollution, REAL_CONFIDENCE};
use trivsel_core::{Observation, PollutionData, ProviderResult};

use super::{cached_fetch, fetch_json, ProviderError, ProviderKind};
use crate::cache::TtlCache;
use crate::fetcher::RetryingFetcher;

const KIND: ProviderKind = ProviderKind::Pollution;

#[derive(Debug, Deserialize)]
struct AirQualityForecast {
    data: AirQualityData,
}

#[derive(Debug, Deserialize)]
struct AirQualityData {
    #[serde(default)]
    time: Vec<AirQualityStep>,
}

#[derive(Debug, Deserialize)]
struct AirQualityStep {
    variables: AirQualityVariables,
}

#[derive(Debug, Deserialize)]
struct AirQualityVariables {
    #[serde(default)]
    pm10_concentration: Option<Concentration>,
    #[serde(default)]
    pm25_concentration: Option<Concentration>,
    #[serde(default)]
    o3_concentration: Option<Concentration>,
    #[serde(default)]
    no2_concentration: Option<Concentration>,
}

#[derive(Debug, Deserialize)]
struct Concentration {
    #[serde(default)]
    value: Option<f64>,
}

fn value_of(concentration: Option<Concentration>) -> Option<f64> {
    concentration.and_then(|c| c.value)
}

pub struct PollutionProvider {
    fetcher: Arc<RetryingFetcher>,
    cache: Arc<TtlCache<Observation<PollutionData>>>,
    base_url: String,
}

impl PollutionProvider {
    pub fn new(
        fetcher: Arc<RetryingFetcher>,
        cache: Arc<TtlCache<Observation<PollutionData>>>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            cache,
            base_url: base_url.into(),
        }
    }

    pub async fn fetch(&self, lat: f64, lon: f64) -> ProviderResult<PollutionData> {
        cached_fetch(KIND, &self.cache, lat, lon, self.fetch_upstream(lat, lon), |err| {
            warn!(
                provider = KIND.as_str(),
                error = %err,
                "Failed to fetch pollution data, falling back to mock"
            );
            ProviderResult::mock(mock_pollution())
        })
        .await
    }

    async fn fetch_upstream(&self, lat: f64, lon: f64) -> Result<PollutionData, ProviderError> {
        let url = format!("{}?lat={:.3}&lon={:.3}", self.base_url, lat, lon);
        info!("Fetching pollution data from {}", url);

        let forecast: AirQualityForecast = fetch_json(&self.fetcher, &url).await?;
        parse_air_quality(forecast)
    }
}

fn parse_air_quality(forecast: AirQualityForecast) -> Result<PollutionData, ProviderError> {
    let step = forecast
        .data
        .time
        .into_iter()
        .next()
        .ok_or(ProviderError::MissingField("data.time[0]"))?;
    let vars = step.variables;

    let pm2_5 = value_of(vars.pm25_concentration);
    Ok(PollutionData {
        air_quality_index: pm2_5.map(air_quality_index),
        pm10: value_of(vars.pm10_concentration),
        pm2_5,
        o3: value_of(vars.o3_concentration),
        no2: value_of(vars.no2_concentration),
        confidence: REAL_CONFIDENCE.to_string(),
    })
}
