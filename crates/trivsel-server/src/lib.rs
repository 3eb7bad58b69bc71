//! Shared library surface for the Trivsel gateway binary and its tests.

pub mod aggregate;
pub mod api;
pub mod backoff;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod providers;
pub mod rate_limiter;
pub mod state;
