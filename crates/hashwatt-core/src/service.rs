//! Cached hash rate lookups for request handlers.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::cache::{CacheError, StaleCache};
use crate::clock::{Clock, SystemClock};
use crate::config::HashwattConfig;
use crate::error::ValidationError;
use crate::routing::{SourceRouter, SourceRouterBuilder, SourceSnapshot};
use crate::{DayWindow, FetchResult};

/// Window used by the health probe.
const PROBE_WINDOW_DAYS: i64 = 1;

/// Every candidate source failed during one orchestration pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("all hash rate sources failed ({} diagnostics)", .diagnostics.len())]
pub struct SourcesExhausted {
    pub diagnostics: Vec<String>,
}

pub type SnapshotError = CacheError<SourcesExhausted>;

/// Router fronted by a per-window stale cache.
pub struct HashrateService {
    router: SourceRouter,
    cache: StaleCache<DayWindow, FetchResult, SourcesExhausted>,
}

impl HashrateService {
    pub fn new(
        router: SourceRouter,
        cache: StaleCache<DayWindow, FetchResult, SourcesExhausted>,
    ) -> Self {
        Self { router, cache }
    }

    /// Production wiring: reqwest transport, system clock.
    pub fn from_config(config: &HashwattConfig) -> Result<Self, ValidationError> {
        Self::with_router(
            SourceRouterBuilder::from_config(config).build(),
            config,
            Arc::new(SystemClock),
        )
    }

    pub fn with_router(
        router: SourceRouter,
        config: &HashwattConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ValidationError> {
        let cache = StaleCache::new(clock, config.fresh_ttl, config.stale_ttl)?;
        info!(
            fresh_ttl_secs = config.fresh_ttl.as_secs(),
            stale_ttl_secs = config.stale_ttl.as_secs(),
            luxor = config.luxor_configured(),
            "hash rate service ready"
        );
        Ok(Self::new(router, cache))
    }

    /// Cached hash rate for `window`.
    ///
    /// Total upstream failure is never cached: it surfaces as an error unless
    /// a prior value for the window is still within its stale grace.
    pub async fn snapshot(&self, window: DayWindow) -> Result<Arc<FetchResult>, SnapshotError> {
        self.cache
            .get_or_fetch(window, || async move {
                let result = self.router.orchestrate(window).await;
                if result.is_available() {
                    Ok(result)
                } else {
                    Err(SourcesExhausted {
                        diagnostics: result.errors().to_vec(),
                    })
                }
            })
            .await
    }

    /// Uncached one-day orchestration for health checks.
    pub async fn probe(&self) -> FetchResult {
        self.router
            .orchestrate(DayWindow::clamp(PROBE_WINDOW_DAYS))
            .await
    }

    pub fn sources(&self) -> Vec<SourceSnapshot> {
        self.router.snapshots()
    }

    pub fn cache(&self) -> &StaleCache<DayWindow, FetchResult, SourcesExhausted> {
        &self.cache
    }
}
