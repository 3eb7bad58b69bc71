//! Per-client rate limiting middleware.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::time::Duration;

use crate::api::error::ApiError;
use crate::config::Config;
use crate::rate_limiter::RateLimiter;

pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// A limiter plus how to identify clients and what to tell rejected ones.
#[derive(Clone)]
pub struct RateLimitGuard {
    limiter: RateLimiter,
    trust_proxy: bool,
    message: String,
}

impl RateLimitGuard {
    pub fn new(limiter: RateLimiter, trust_proxy: bool, message: impl Into<String>) -> Self {
        Self {
            limiter,
            trust_proxy,
            message: message.into(),
        }
    }

    /// Applies to every route.
    pub fn global(config: &Config) -> Self {
        let limiter = if config.rate_limit_enabled {
            RateLimiter::new(config.global_rate_limit, config.global_rate_window())
        } else {
            RateLimiter::disabled()
        };
        Self::new(limiter, config.trust_proxy, "Too Many Requests")
    }

    /// Applies to the grid endpoint only.
    pub fn grid(config: &Config) -> Self {
        let limiter = if config.rate_limit_enabled {
            RateLimiter::new(config.grid_rate_limit, config.grid_rate_window())
        } else {
            RateLimiter::disabled()
        };
        let message = format!(
            "Grid rate limit exceeded ({} req / {})",
            config.grid_rate_limit,
            describe_window(config.grid_rate_window())
        );
        Self::new(limiter, config.trust_proxy, message)
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }
}

fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}

/// Identify the caller: first X-Forwarded-For entry when the proxy is
/// trusted, otherwise the socket peer address.
pub fn client_ip(request: &Request, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = request
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        if let Some(ip) = forwarded {
            return ip;
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn enforce_rate_limit(
    State(guard): State<RateLimitGuard>,
    request: Request,
    next: Next,
) -> Response {
    if !guard.limiter.is_enabled() {
        return next.run(request).await;
    }

    let ip = client_ip(&request, guard.trust_proxy);
    if !guard.limiter.check(&ip) {
        tracing::warn!(ip = %ip, path = %request.uri().path(), "Rate limit exceeded");
        return ApiError::RateLimited(guard.message.clone()).into_response();
    }

    let remaining = guard.limiter.remaining(&ip);
    let mut response = next.run(request).await;
    // Innermost limiter wins: it is the stricter scope for this route.
    if !response.headers().contains_key(&RATE_LIMIT_REMAINING) {
        if let Ok(value) = HeaderValue::from_str(&remaining.to_string()) {
            response.headers_mut().insert(RATE_LIMIT_REMAINING, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(forwarded: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri("/health");
        if let Some(value) = forwarded {
            builder = builder.header("X-Forwarded-For", value);
        }
        let mut request = builder.body(Body::empty()).unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 7], 40000))));
        request
    }

    #[test]
    fn forwarded_header_used_only_when_trusted() {
        let request = request_with(Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_ip(&request, true), "203.0.113.9");
        assert_eq!(client_ip(&request, false), "10.0.0.7");
    }

    #[test]
    fn falls_back_to_socket_then_unknown() {
        assert_eq!(client_ip(&request_with(None), true), "10.0.0.7");
        let bare = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_ip(&bare, true), "unknown");
    }

    #[test]
    fn grid_message_names_limit_and_window() {
        let guard = RateLimitGuard::grid(&Config::default());
        assert_eq!(guard.message, "Grid rate limit exceeded (1 req / 2 min)");
        assert_eq!(guard.limiter().limit(), 1);
    }

    #[test]
    fn disabled_config_yields_disabled_limiters() {
        let config = Config {
            rate_limit_enabled: false,
            ..Config::default()
        };
        assert!(!RateLimitGuard::global(&config).limiter().is_enabled());
        assert!(!RateLimitGuard::grid(&config).limiter().is_enabled());
    }
}
