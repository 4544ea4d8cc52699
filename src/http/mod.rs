//! HTTP client module
//!
//! Provides the retrying request executor every PDS call goes through.
//!
//! # Features
//!
//! - **Outcome Classification**: success, client error (4xx), transient failure
//! - **Automatic Retries**: Bounded attempts with constant, linear or exponential backoff
//! - **Rate Limiting**: Optional token bucket rate limiter using governor

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
