//! # Hashwatt Core
//!
//! Resilient network hash rate sourcing and power estimation for the bitcoin
//! mining fleet.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Source adapters** for one premium and three free hash rate providers
//! - **A source router** that tries providers in priority order with retry
//! - **A stale-while-revalidate cache** with per-key single flight
//! - **A power calculator** turning EH/s into CONUS and global GW
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Provider adapters (Luxor, mempool.space, blockchain.info, Blockchair) |
//! | [`cache`] | Keyed get-or-fetch cache with stale fallback |
//! | [`clock`] | Wall-clock seam |
//! | [`config`] | Environment configuration |
//! | [`data_source`] | Source trait, registration and error types |
//! | [`domain`] | Hash rate samples, fetch results and request windows |
//! | [`error`] | Validation errors |
//! | [`http_client`] | HTTP client abstraction |
//! | [`power`] | Fleet efficiency model and power estimates |
//! | [`retry`] | Exponential backoff retry executor |
//! | [`routing`] | Priority-ordered fallback across sources |
//! | [`service`] | Cached entry point used by request handlers |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Local quota guard for metered providers |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hashwatt_core::{estimate_power, DayWindow, HashrateService, HashwattConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HashwattConfig::from_env()?;
//!     let service = HashrateService::from_config(&config)?;
//!
//!     let snapshot = service.snapshot(DayWindow::clamp(20)).await?;
//!     let power = estimate_power(snapshot.hashrate_ehs);
//!     println!("{} EH/s from {} ~ {} GW", snapshot.hashrate_ehs, snapshot.source, power.global_gw);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ HTTP handlers   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HashrateService │────▶│ StaleCache       │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Source Router  │────▶│ Retry executor   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ HashrateSource  │────▶│ HTTP Client      │
//! │ (Adapter Trait) │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Adapter failures are [`SourceError`] values that the router folds into
//! diagnostics. Only the cache boundary produces a caller-visible error:
//!
//! ```rust
//! use hashwatt_core::{CacheError, SourcesExhausted};
//!
//! fn describe(error: &CacheError<SourcesExhausted>) -> String {
//!     match error {
//!         CacheError::Fetch { source } => {
//!             format!("no data yet: {}", source.diagnostics.join("; "))
//!         }
//!         CacheError::StaleGraceExpired { age, .. } => {
//!             format!("last good value is {}s old", age.as_secs())
//!         }
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - The Luxor API key is read from the environment only and never logged

pub mod adapters;
pub mod cache;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod power;
pub mod retry;
pub mod routing;
pub mod service;
pub mod source;
pub mod throttling;

// Adapter implementations
pub use adapters::{BlockchainInfoAdapter, BlockchairAdapter, LuxorAdapter, MempoolAdapter};

// Caching
pub use cache::{CacheError, MarkStale, StaleCache};

// Time
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration
pub use config::HashwattConfig;

// Data source trait and types
pub use data_source::{
    HashrateSource, RegisteredSource, SourceError, SourceErrorKind, SourceFuture, SourceSpec,
};

// Domain models
pub use domain::{round2, DayWindow, FetchResult, HistoryPoint, Period};

// Error types
pub use error::ValidationError;

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse, ReqwestHttpClient,
};

// Power model
pub use power::{
    estimate_power, state_breakdown, weighted_efficiency, FleetModel, PowerEstimate, StatePower,
    CONUS_SHARE, FLEET,
};

// Retry logic
pub use retry::{Backoff, RetryConfig};

// Routing types
pub use routing::{SourceRouter, SourceRouterBuilder, SourceSnapshot};

// Service entry point
pub use service::{HashrateService, SnapshotError, SourcesExhausted};

// Source identifiers
pub use source::{ProviderId, SourceLabel};

// Throttling
pub use throttling::QuotaLimiter;
