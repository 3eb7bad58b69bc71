//! Trivsel SDK - typed access to the environmental data gateway.

pub mod client;

pub use client::{GridRequest, TrivselClient};
pub use trivsel_core::{
    ClimateData, ElevationData, EnergyData, GridPoint, HealthStatus, PollutionData, Reading,
    SourceCatalog, Summary,
};
