//! Energy context. No real upstream is integrated; every answer is a
//! deterministic mock derived from the coordinate.

use trivsel_core::fallback::mock_energy;
use trivsel_core::{EnergyData, ProviderResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyProvider;

impl EnergyProvider {
    pub async fn fetch(&self, lat: f64, lon: f64) -> ProviderResult<EnergyData> {
        ProviderResult::mock(mock_energy(lat, lon))
    }
}
