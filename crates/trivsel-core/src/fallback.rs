//! Deterministic stand-in payloads used when an upstream cannot answer.
//!
//! All generators are pure functions of the coordinate so that repeated
//! failed lookups at the same point return identical values.

use crate::models::{EnergyContext, EnergyData, PollutionData};

pub const MOCK_CONFIDENCE: &str = "low (mock)";
pub const REAL_CONFIDENCE: &str = "high";
pub const ENERGY_NOTE: &str = "Mock provider in MVP";

/// Three-level air quality category from PM2.5 (µg/m³).
///
/// `< 10` good (1), `< 20` fair (2), otherwise poor (3).
pub fn air_quality_index(pm2_5: f64) -> u8 {
    if pm2_5 < 10.0 {
        1
    } else if pm2_5 < 20.0 {
        2
    } else {
        3
    }
}

/// Fixed pollution payload returned when the air quality upstream fails.
pub fn mock_pollution() -> PollutionData {
    PollutionData {
        air_quality_index: Some(1),
        pm10: Some(15.5),
        pm2_5: Some(8.2),
        o3: Some(40.1),
        no2: Some(12.3),
        confidence: MOCK_CONFIDENCE.to_string(),
    }
}

/// Smooth pseudo-elevation in metres, one decimal, never negative.
pub fn mock_elevation(lat: f64, lon: f64) -> f64 {
    let raw = ((lat * 100.0).sin() * (lon * 100.0).cos() * 100.0).abs();
    (raw * 10.0).round() / 10.0
}

/// Simulated grid context. There is no real energy upstream yet.
pub fn mock_energy(lat: f64, lon: f64) -> EnergyData {
    let seed = (lat + lon) * 1000.0;
    let grid_load = 40.0 + seed % 40.0;
    let renewable = 50.0 + seed % 50.0;
    let industry = if seed % 2.0 > 1.0 { "High" } else { "Low" };

    EnergyData {
        energy_context: EnergyContext {
            grid_load_estimate: format!("{:.0}%", grid_load),
            renewable_share: format!("{:.0}%", renewable),
            local_industry_indicator: industry.to_string(),
        },
        note: Some(ENERGY_NOTE.to_string()),
    }
}
