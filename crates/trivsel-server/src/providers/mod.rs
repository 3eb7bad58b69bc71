//! Provider adapters: one per data kind, each combining the shared TTL cache,
//! the retrying fetcher and a kind-specific fallback policy.
//!
//! | kind      | ttl  | key precision | on failure    |
//! |-----------|------|---------------|---------------|
//! | climate   | 30 m | 3 decimals    | `Unavailable` |
//! | pollution | 60 m | 3 decimals    | `Mock`        |
//! | elevation | 24 h | 4 decimals    | `Mock`        |
//! | energy    | -    | -             | always `Mock` |
//!
//! Only real upstream answers are cached, so a failing upstream is retried on
//! the next request instead of pinning a mock value.

pub mod climate;
pub mod elevation;
pub mod energy;
pub mod pollution;

use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{coordinate_key, TtlCache};
use crate::config::Config;
use crate::fetcher::{FetchError, RetryingFetcher};
use trivsel_core::{Observation, ProviderResult};

pub use climate::ClimateProvider;
pub use elevation::ElevationProvider;
pub use energy::EnergyProvider;
pub use pollution::PollutionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Climate,
    Pollution,
    Elevation,
    Energy,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Climate => "climate",
            Self::Pollution => "pollution",
            Self::Elevation => "elevation",
            Self::Energy => "energy",
        }
    }

    pub fn ttl(&self) -> Duration {
        match self {
            Self::Climate => Duration::from_secs(30 * 60),
            Self::Pollution => Duration::from_secs(60 * 60),
            Self::Elevation => Duration::from_secs(24 * 60 * 60),
            Self::Energy => Duration::ZERO,
        }
    }

    /// Decimal places kept in the cache key (3 ≈ 100 m cells, 4 ≈ 10 m).
    pub fn key_precision(&self) -> usize {
        match self {
            Self::Elevation => 4,
            _ => 3,
        }
    }

    pub fn cache_key(&self, lat: f64, lon: f64) -> String {
        coordinate_key(self.as_str(), lat, lon, self.key_precision())
    }
}

/// Why a provider could not produce a real answer. Never leaves the adapter.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("upstream rejected request with status {0}")]
    ClientStatus(u16),
    #[error("unexpected response shape: {0}")]
    Parse(String),
    #[error("response missing {0}")]
    MissingField(&'static str),
}

/// Fetch `url` and decode a JSON body, treating upstream 4xx as a failure.
pub(crate) async fn fetch_json<R: DeserializeOwned>(
    fetcher: &RetryingFetcher,
    url: &str,
) -> Result<R, ProviderError> {
    let response = fetcher.fetch(url).await?;
    if response.is_client_error() {
        return Err(ProviderError::ClientStatus(response.status));
    }
    serde_json::from_slice(&response.body).map_err(|err| ProviderError::Parse(err.to_string()))
}

/// Serve from `cache` when fresh; otherwise await `upstream`, caching a
/// successful answer for the kind's TTL. Failures go to `on_failure`, which
/// picks the adapter's degraded result and is never cached.
pub(crate) async fn cached_fetch<T, Fut, F>(
    kind: ProviderKind,
    cache: &TtlCache<Observation<T>>,
    lat: f64,
    lon: f64,
    upstream: Fut,
    on_failure: F,
) -> ProviderResult<T>
where
    T: Clone,
    Fut: Future<Output = Result<T, ProviderError>>,
    F: FnOnce(ProviderError) -> ProviderResult<T>,
{
    let cache_key = kind.cache_key(lat, lon);
    if let Some(cached) = cache.get(&cache_key) {
        tracing::debug!(provider = kind.as_str(), key = %cache_key, "Cache hit");
        return ProviderResult::Real(cached);
    }

    match upstream.await {
        Ok(data) => {
            let observation = Observation::now(data);
            cache.set(cache_key, observation.clone(), kind.ttl());
            ProviderResult::Real(observation)
        }
        Err(err) => on_failure(err),
    }
}

/// The four adapters sharing one fetcher.
pub struct Providers {
    pub climate: ClimateProvider,
    pub pollution: PollutionProvider,
    pub elevation: ElevationProvider,
    pub energy: EnergyProvider,
}

impl Providers {
    pub fn from_config(fetcher: Arc<RetryingFetcher>, config: &Config) -> Self {
        Self {
            climate: ClimateProvider::new(
                fetcher.clone(),
                Arc::new(TtlCache::new()),
                config.climate_url.clone(),
            ),
            pollution: PollutionProvider::new(
                fetcher.clone(),
                Arc::new(TtlCache::new()),
                config.pollution_url.clone(),
            ),
            elevation: ElevationProvider::new(
                fetcher,
                Arc::new(TtlCache::new()),
                config.elevation_url.clone(),
            ),
            energy: EnergyProvider,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_keys_use_kind_precision() {
        assert_eq!(
            ProviderKind::Climate.cache_key(58.15, 8.0),
            "climate:58.150:8.000"
        );
        assert_eq!(
            ProviderKind::Pollution.cache_key(58.15, 8.0),
            "pollution:58.150:8.000"
        );
        assert_eq!(
            ProviderKind::Elevation.cache_key(58.15, 8.0),
            "elevation:58.1500:8.0000"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cached_fetch_caches_only_successes() {
        let cache: TtlCache<Observation<f64>> = TtlCache::new();
        let failed = cached_fetch(
            ProviderKind::Climate,
            &cache,
            58.15,
            8.0,
            async { Err(ProviderError::MissingField("value")) },
            |_| ProviderResult::mock(0.0),
        )
        .await;
        assert!(failed.is_mock());
        assert!(cache.is_empty());

        let real = cached_fetch(
            ProviderKind::Climate,
            &cache,
            58.15,
            8.0,
            async { Ok(12.5) },
            |_| ProviderResult::Unavailable,
        )
        .await;
        assert!(real.is_real());

        // Fresh entry short-circuits the upstream.
        let cached = cached_fetch(
            ProviderKind::Climate,
            &cache,
            58.1501,
            8.0,
            async { Ok(99.0) },
            |_| ProviderResult::Unavailable,
        )
        .await;
        assert_eq!(cached, real);

        tokio::time::advance(ProviderKind::Climate.ttl() + Duration::from_secs(1)).await;
        let refreshed = cached_fetch(
            ProviderKind::Climate,
            &cache,
            58.15,
            8.0,
            async { Ok(99.0) },
            |_| ProviderResult::Unavailable,
        )
        .await;
        assert_eq!(refreshed.observation().map(|o| o.data), Some(99.0));
    }

    #[test]
    fn ttls() {
        assert_eq!(ProviderKind::Climate.ttl(), Duration::from_secs(1800));
        assert_eq!(ProviderKind::Pollution.ttl(), Duration::from_secs(3600));
        assert_eq!(ProviderKind::Elevation.ttl(), Duration::from_secs(86_400));
    }
}
