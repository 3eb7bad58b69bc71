//! Process-wide state shared by all request handlers.

use std::sync::Arc;

use crate::aggregate::{GridAggregator, SummaryAggregator};
use crate::config::Config;
use crate::fetcher::{FetchError, HttpTransport, ReqwestTransport, RetryingFetcher};
use crate::providers::Providers;

/// Explicitly constructed gateway state. Caches live inside the providers,
/// rate-limit windows inside the router's limiters.
pub struct AppState {
    summary: SummaryAggregator,
    grid: GridAggregator,
}

impl AppState {
    /// Build state that talks to the real upstreams.
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let transport = Arc::new(ReqwestTransport::new(&config.user_agent)?);
        Ok(Self::with_transport(config, transport))
    }

    /// Build state over any transport (tests inject a scripted one).
    pub fn with_transport(config: Config, transport: Arc<dyn HttpTransport>) -> Self {
        let fetcher = Arc::new(RetryingFetcher::new(
            transport,
            config.retry_policy(),
            config.user_agent.clone(),
        ));
        let providers = Arc::new(Providers::from_config(fetcher, &config));
        let summary = SummaryAggregator::new(providers);
        let grid = GridAggregator::new(summary.clone());

        Self { summary, grid }
    }

    pub fn providers(&self) -> &Providers {
        self.summary.providers()
    }

    pub fn summary(&self) -> &SummaryAggregator {
        &self.summary
    }

    pub fn grid(&self) -> &GridAggregator {
        &self.grid
    }
}
