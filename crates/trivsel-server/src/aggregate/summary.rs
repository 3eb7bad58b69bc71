//! Single-point fan-out across all providers.

use chrono::Utc;
use std::sync::Arc;
use trivsel_core::{
    ClimateData, Coordinate, ElevationData, EnergyData, GridPoint, GridSample, Location,
    PollutionData, ProviderResult, Summary, SummaryMeta,
};

use crate::providers::Providers;

/// Everything the four providers said about one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct PointResults {
    pub climate: ProviderResult<ClimateData>,
    pub pollution: ProviderResult<PollutionData>,
    pub elevation: ProviderResult<ElevationData>,
    pub energy: ProviderResult<EnergyData>,
}

impl PointResults {
    /// Distinct `source` tags that contributed, in provider order.
    pub fn sources_used(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        let tags = [
            self.climate.source(),
            self.pollution.source(),
            self.elevation.source(),
            self.energy.source(),
        ];
        for tag in tags.into_iter().flatten() {
            if !sources.iter().any(|s| s == tag) {
                sources.push(tag.to_string());
            }
        }
        sources
    }

    pub fn into_summary(self, coord: Coordinate) -> Summary {
        let sources_used = self.sources_used();
        Summary {
            location: Location {
                lat: coord.lat,
                lon: coord.lon,
                within_bounds: true,
            },
            klima: self.climate.into_reading(),
            forurensing: self.pollution.into_reading(),
            hoyde: self.elevation.into_reading(),
            energi: self.energy.into_reading(),
            meta: SummaryMeta {
                sources_used,
                generated_at: Utc::now(),
            },
        }
    }

    pub fn into_grid_point(self, sample: GridSample) -> GridPoint {
        GridPoint {
            id: sample.id,
            lat: sample.coord.lat,
            lon: sample.coord.lon,
            klima: self.climate.into_reading(),
            forurensing: self.pollution.into_reading(),
            hoyde: self.elevation.into_reading(),
            energi: self.energy.into_reading(),
        }
    }
}

#[derive(Clone)]
pub struct SummaryAggregator {
    providers: Arc<Providers>,
}

impl SummaryAggregator {
    pub fn new(providers: Arc<Providers>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    /// Query all providers concurrently and wait for every one of them.
    ///
    /// Providers absorb their own failures, so this never fails.
    pub async fn resolve(&self, coord: Coordinate) -> PointResults {
        let Coordinate { lat, lon } = coord;
        let providers = &self.providers;
        let (climate, pollution, elevation, energy) = tokio::join!(
            providers.climate.fetch(lat, lon),
            providers.pollution.fetch(lat, lon),
            providers.elevation.fetch(lat, lon),
            providers.energy.fetch(lat, lon),
        );

        let results = PointResults {
            climate,
            pollution,
            elevation,
            energy,
        };
        if results.pollution.is_mock() || results.elevation.is_mock() {
            tracing::debug!(
                lat,
                lon,
                sources = ?results.sources_used(),
                "Point resolved with mock data"
            );
        }
        results
    }

    pub async fn summarize(&self, coord: Coordinate) -> Summary {
        self.resolve(coord).await.into_summary(coord)
    }
}
