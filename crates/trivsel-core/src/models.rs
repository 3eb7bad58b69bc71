//! Core data models for the Trivsel gateway.
//!
//! Wire types use camelCase JSON to match what existing clients consume.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `source` value carried by every fallback payload.
pub const MOCK_SOURCE: &str = "mock";

/// Associates a payload type with the upstream that produces it for real.
pub trait SourceTagged {
    const REAL_SOURCE: &'static str;
}

/// Current weather at a point (MET Locationforecast).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClimateData {
    pub temperature_c: f64,
    pub wind_speed_mps: f64,
    pub precipitation_mm: f64,
}

impl SourceTagged for ClimateData {
    const REAL_SOURCE: &'static str = "met";
}

/// Pollutant concentrations (MET Airquality) plus a coarse index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollutionData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_quality_index: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm10: Option<f64>,
    #[serde(rename = "pm2_5", default, skip_serializing_if = "Option::is_none")]
    pub pm2_5: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o3: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no2: Option<f64>,
    pub confidence: String,
}

impl SourceTagged for PollutionData {
    const REAL_SOURCE: &'static str = "met";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElevationData {
    pub elevation_meters: f64,
}

impl SourceTagged for ElevationData {
    const REAL_SOURCE: &'static str = "kartverket";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyContext {
    pub grid_load_estimate: String,
    pub renewable_share: String,
    pub local_industry_indicator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergyData {
    pub energy_context: EnergyContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SourceTagged for EnergyData {
    // No real energy upstream is integrated yet.
    const REAL_SOURCE: &'static str = MOCK_SOURCE;
}

/// A payload together with the moment it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> Observation<T> {
    pub fn now(data: T) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Outcome of one provider lookup.
///
/// `Mock` is a deterministic stand-in produced after an upstream failure
/// (or by providers with no real upstream). `Unavailable` means the provider
/// has no fallback and the caller must surface the gap.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderResult<T> {
    Real(Observation<T>),
    Mock(Observation<T>),
    Unavailable,
}

impl<T> ProviderResult<T> {
    pub fn real(data: T) -> Self {
        Self::Real(Observation::now(data))
    }

    pub fn mock(data: T) -> Self {
        Self::Mock(Observation::now(data))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Self::Real(_))
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, Self::Mock(_))
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unavailable)
    }

    pub fn observation(&self) -> Option<&Observation<T>> {
        match self {
            Self::Real(obs) | Self::Mock(obs) => Some(obs),
            Self::Unavailable => None,
        }
    }
}

impl<T: SourceTagged> ProviderResult<T> {
    /// The `source` tag this result will carry on the wire.
    pub fn source(&self) -> Option<&'static str> {
        match self {
            Self::Real(_) => Some(T::REAL_SOURCE),
            Self::Mock(_) => Some(MOCK_SOURCE),
            Self::Unavailable => None,
        }
    }

    pub fn into_reading(self) -> Option<Reading<T>> {
        let source = self.source()?.to_string();
        match self {
            Self::Real(obs) | Self::Mock(obs) => Some(Reading {
                data: obs.data,
                timestamp: obs.timestamp,
                source,
            }),
            Self::Unavailable => None,
        }
    }
}

/// Wire form of an available provider result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading<T> {
    #[serde(flatten)]
    pub data: T,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

impl<T> Reading<T> {
    pub fn is_mock(&self) -> bool {
        self.source == MOCK_SOURCE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub within_bounds: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    pub sources_used: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Combined answer for one coordinate (`/v1/sammendrag`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub location: Location,
    pub klima: Option<Reading<ClimateData>>,
    pub forurensing: Option<Reading<PollutionData>>,
    pub hoyde: Option<Reading<ElevationData>>,
    pub energi: Option<Reading<EnergyData>>,
    pub meta: SummaryMeta,
}

/// One sample of a grid response. Missing layers were unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub klima: Option<Reading<ClimateData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forurensing: Option<Reading<PollutionData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hoyde: Option<Reading<ElevationData>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energi: Option<Reading<EnergyData>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceCatalog {
    pub sources: Vec<SourceInfo>,
}
