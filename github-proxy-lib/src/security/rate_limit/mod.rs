//! Rate limiting for the proxy.
//!
//! Admission is decided in two tiers:
//!
//! 1. **Global** (`gate.rs`): one [`TokenBucket`] sized from the upstream API
//!    quota, so the proxy never spends more than the installation is allowed.
//! 2. **Per client** (`registry.rs`): a [`ClientLimiterRegistry`] holding one
//!    bucket per derived client key (`key.rs`), swept periodically to bound
//!    memory.
//!
//! # Example Usage
//!
//! ```ignore
//! use github_proxy_lib::security::rate_limit::{ClientLimiterRegistry, RateGate, TokenBucket};
//! use std::sync::Arc;
//!
//! let clients = Arc::new(ClientLimiterRegistry::per_minute(8, 60));
//! let gate = RateGate::new(TokenBucket::new(5000, 5000.0 / 3600.0), clients);
//!
//! if !gate.allow("192.0.2.10").is_admitted() {
//!     // Return 429 Too Many Requests
//! }
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [security.rate_limit]
//! client_burst = 8
//! client_requests_per_minute = 60
//! idle_ttl_secs = 1800
//! sweep_interval_secs = 1800
//! ```

mod bucket;
mod gate;
mod key;
mod registry;

pub use bucket::TokenBucket;
pub use gate::{AdmissionResult, Quota, QuotaFuture, QuotaProvider, RateGate};
pub use key::{extract_client_key, FORWARDED_FOR_HEADER, REAL_IP_HEADER};
pub use registry::ClientLimiterRegistry;
