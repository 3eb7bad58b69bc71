//! Server configuration from environment.

use std::env;
use std::time::Duration;

use crate::backoff::RetryPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub log_level: String,
    pub log_json: bool,
    pub user_agent: String,
    pub trust_proxy: bool,
    pub rate_limit_enabled: bool,
    pub global_rate_limit: u32,
    pub global_rate_window_s: u64,
    pub grid_rate_limit: u32,
    pub grid_rate_window_s: u64,
    pub upstream_timeout_ms: u64,
    pub upstream_max_retries: u32,
    pub upstream_backoff_base_ms: u64,
    pub climate_url: String,
    pub pollution_url: String,
    pub elevation_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            log_level: "info".to_string(),
            log_json: false,
            user_agent: "TrivselGateway/1.0 (contact: ops@trivsel.local)".to_string(),
            trust_proxy: true,
            rate_limit_enabled: true,
            global_rate_limit: 60,
            global_rate_window_s: 10 * 60,
            grid_rate_limit: 1,
            grid_rate_window_s: 2 * 60,
            upstream_timeout_ms: 8_000,
            upstream_max_retries: 1,
            upstream_backoff_base_ms: 500,
            climate_url: "https://api.met.no/weatherapi/locationforecast/2.0/compact".to_string(),
            pollution_url: "https://api.met.no/weatherapi/airqualityforecast/0.1/".to_string(),
            elevation_url: "https://ws.geonorge.no/hoydedata/v1/punkt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env::var("TRIVSEL_PORT")
                .or_else(|_| env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.server_port),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: env::var("LOG_FORMAT")
                .map(|format| format.trim().eq_ignore_ascii_case("json"))
                .unwrap_or(defaults.log_json),
            user_agent: env::var("MET_USER_AGENT")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            trust_proxy: parse_bool("TRUST_PROXY").unwrap_or(defaults.trust_proxy),
            rate_limit_enabled: parse_bool("RATE_LIMIT_ENABLED")
                .unwrap_or(defaults.rate_limit_enabled),
            global_rate_limit: parse_var("GLOBAL_RATE_LIMIT").unwrap_or(defaults.global_rate_limit),
            global_rate_window_s: parse_var("GLOBAL_RATE_WINDOW_SECS")
                .unwrap_or(defaults.global_rate_window_s),
            grid_rate_limit: parse_var("GRID_RATE_LIMIT").unwrap_or(defaults.grid_rate_limit),
            grid_rate_window_s: parse_var("GRID_RATE_WINDOW_SECS")
                .unwrap_or(defaults.grid_rate_window_s),
            upstream_timeout_ms: parse_var("UPSTREAM_TIMEOUT_MS")
                .unwrap_or(defaults.upstream_timeout_ms),
            upstream_max_retries: parse_var("UPSTREAM_MAX_RETRIES")
                .unwrap_or(defaults.upstream_max_retries),
            upstream_backoff_base_ms: parse_var("UPSTREAM_BACKOFF_BASE_MS")
                .unwrap_or(defaults.upstream_backoff_base_ms),
            climate_url: env::var("MET_LOCATIONFORECAST_URL").unwrap_or(defaults.climate_url),
            pollution_url: env::var("MET_AIRQUALITY_URL").unwrap_or(defaults.pollution_url),
            elevation_url: env::var("GEONORGE_ELEVATION_URL").unwrap_or(defaults.elevation_url),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.upstream_max_retries,
            timeout: Duration::from_millis(self.upstream_timeout_ms),
            base_delay: Duration::from_millis(self.upstream_backoff_base_ms),
        }
    }

    pub fn global_rate_window(&self) -> Duration {
        Duration::from_secs(self.global_rate_window_s)
    }

    pub fn grid_rate_window(&self) -> Duration {
        Duration::from_secs(self.grid_rate_window_s)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_bool(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .and_then(|value| match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
