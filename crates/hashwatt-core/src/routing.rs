use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::adapters::{BlockchainInfoAdapter, BlockchairAdapter, LuxorAdapter, MempoolAdapter};
use crate::clock::{Clock, SystemClock};
use crate::config::HashwattConfig;
use crate::data_source::{HashrateSource, RegisteredSource, SourceError, SourceSpec};
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::retry::RetryConfig;
use crate::throttling::QuotaLimiter;
use crate::{DayWindow, FetchResult, ProviderId};

/// Registration state reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceSnapshot {
    #[serde(skip)]
    pub id: ProviderId,
    pub enabled: bool,
    pub note: Option<&'static str>,
}

/// Ordered source registry and fallback engine.
pub struct SourceRouter {
    sources: Vec<RegisteredSource>,
    retry: RetryConfig,
}

impl SourceRouter {
    /// Sources are ordered by priority; registration order only breaks ties.
    pub fn new(mut sources: Vec<RegisteredSource>, retry: RetryConfig) -> Self {
        sources.sort_by_key(|registered| registered.spec.priority);
        Self { sources, retry }
    }

    pub fn builder() -> SourceRouterBuilder {
        SourceRouterBuilder::new()
    }

    /// Registered sources in candidate order, enabled or not.
    pub fn source_chain(&self) -> Vec<ProviderId> {
        self.sources.iter().map(|registered| registered.spec.id).collect()
    }

    pub fn snapshots(&self) -> Vec<SourceSnapshot> {
        self.sources
            .iter()
            .map(|registered| SourceSnapshot {
                id: registered.spec.id,
                enabled: registered.spec.enabled,
                note: match (registered.spec.id, registered.spec.enabled) {
                    (ProviderId::Luxor, true) => Some("Configured"),
                    (ProviderId::Luxor, false) => Some("Not configured"),
                    _ => None,
                },
            })
            .collect()
    }

    /// Tries each enabled source in priority order and returns the first
    /// result with a positive hash rate.
    ///
    /// Never fails: when every candidate errors or reports zero, the
    /// `unavailable` sentinel carrying one diagnostic per candidate is
    /// returned instead.
    pub async fn orchestrate(&self, window: DayWindow) -> FetchResult {
        let mut diagnostics = Vec::new();

        for candidate in self.sources.iter().filter(|registered| registered.spec.enabled) {
            let provider = candidate.spec.id;
            debug!(source = %provider, %window, "trying source");

            match self.invoke(candidate, window).await {
                Ok(result) if result.hashrate_ehs > 0.0 => {
                    info!(
                        source = %provider,
                        hashrate_ehs = result.hashrate_ehs,
                        skipped = diagnostics.len(),
                        "source selected"
                    );
                    return result.with_errors(diagnostics);
                }
                Ok(_) => {
                    warn!(source = %provider, "source reported non-positive hash rate");
                    diagnostics.push(format!("{provider}: reported non-positive hash rate"));
                }
                Err(error) => {
                    warn!(source = %provider, %error, "source failed");
                    diagnostics.push(format!("{provider}: {}", error.message()));
                }
            }
        }

        warn!(failures = diagnostics.len(), %window, "all sources exhausted");
        FetchResult::unavailable(diagnostics)
    }

    async fn invoke(
        &self,
        candidate: &RegisteredSource,
        window: DayWindow,
    ) -> Result<FetchResult, SourceError> {
        let source: &dyn HashrateSource = candidate.source.as_ref();
        if candidate.spec.retryable {
            self.retry
                .run_while(|| source.fetch(window), SourceError::is_transient)
                .await
        } else {
            source.fetch(window).await
        }
    }
}

/// Builds the default four-source registry.
///
/// The premium source is always registered but only enabled when an API key
/// is present. Production wiring seeds the key through
/// [`SourceRouterBuilder::from_config`].
#[derive(Default)]
pub struct SourceRouterBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    clock: Option<Arc<dyn Clock>>,
    luxor_api_key: Option<String>,
    luxor_quota: Option<QuotaLimiter>,
    retry: RetryConfig,
}

impl SourceRouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the builder from loaded configuration.
    pub fn from_config(config: &HashwattConfig) -> Self {
        let builder = Self::new().with_retry(config.retry.clone());
        match &config.luxor_api_key {
            Some(key) => builder.with_luxor_key(key.clone()),
            None => builder,
        }
    }

    pub fn with_luxor_key(mut self, key: impl Into<String>) -> Self {
        self.luxor_api_key = Some(key.into());
        self
    }

    pub fn with_luxor_quota(mut self, quota: QuotaLimiter) -> Self {
        self.luxor_quota = Some(quota);
        self
    }

    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn build(self) -> SourceRouter {
        let http_client = self
            .http_client
            .unwrap_or_else(|| Arc::new(ReqwestHttpClient::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let mut luxor = LuxorAdapter::new(
            Arc::clone(&http_client),
            Arc::clone(&clock),
            self.luxor_api_key.unwrap_or_default(),
        );
        if let Some(quota) = self.luxor_quota {
            luxor = luxor.with_quota(quota);
        }
        let luxor_enabled = luxor.is_configured();

        let free: [(ProviderId, Arc<dyn HashrateSource>); 3] = [
            (
                ProviderId::Mempool,
                Arc::new(MempoolAdapter::new(Arc::clone(&http_client), Arc::clone(&clock))),
            ),
            (
                ProviderId::BlockchainInfo,
                Arc::new(BlockchainInfoAdapter::new(
                    Arc::clone(&http_client),
                    Arc::clone(&clock),
                )),
            ),
            (
                ProviderId::Blockchair,
                Arc::new(BlockchairAdapter::new(http_client, clock)),
            ),
        ];

        let mut sources = vec![RegisteredSource::new(
            SourceSpec::new(
                ProviderId::Luxor,
                SourceSpec::default_priority(ProviderId::Luxor),
                luxor_enabled,
                false,
            ),
            Arc::new(luxor),
        )];
        sources.extend(free.into_iter().map(|(id, source)| {
            RegisteredSource::new(
                SourceSpec::new(id, SourceSpec::default_priority(id), true, true),
                source,
            )
        }));

        SourceRouter::new(sources, self.retry)
    }
}
