use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::json;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::{fetch_json, recent_positive, Magnitude};
use crate::clock::Clock;
use crate::data_source::{HashrateSource, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::throttling::QuotaLimiter;
use crate::{DayWindow, FetchResult, ProviderId};

const GRAPHQL_URL: &str = "https://api.hashrateindex.com/graphql";
const API_KEY_HEADER: &str = "x-hi-api-key";

const NETWORK_HASHRATE_QUERY: &str = "query GetNetworkHashrate($inputInterval: ChartsInterval!) {
  getNetworkHashrate(inputInterval: $inputInterval) {
    nodes {
      timestamp
      networkHashrate7D
    }
  }
}";

/// Premium Hashrate Index source.
///
/// Reports EH/s directly. Calls are single-shot and metered by a local
/// [`QuotaLimiter`]; the router never wraps this adapter in retries.
#[derive(Clone)]
pub struct LuxorAdapter {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
    api_key: String,
    quota: QuotaLimiter,
}

impl LuxorAdapter {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            clock,
            api_key: api_key.into(),
            quota: QuotaLimiter::luxor_default(),
        }
    }

    pub fn with_quota(mut self, quota: QuotaLimiter) -> Self {
        self.quota = quota;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn fetch_window(&self, window: DayWindow) -> Result<FetchResult, SourceError> {
        if !self.is_configured() {
            return Err(SourceError::configuration("LUXOR_API_KEY not configured"));
        }

        if let Err(wait) = self.quota.acquire() {
            return Err(SourceError::rate_limited(format!(
                "local quota exhausted; retry in {:.0}s",
                wait.as_secs_f64()
            )));
        }

        let payload = json!({
            "query": NETWORK_HASHRATE_QUERY,
            "variables": { "inputInterval": chart_interval(window) },
        });
        let request = HttpRequest::post(GRAPHQL_URL)
            .with_json(&payload)
            .with_auth(&HttpAuth::Header {
                name: String::from(API_KEY_HEADER),
                value: self.api_key.clone(),
            });

        let response: GraphqlResponse =
            fetch_json(self.http_client.as_ref(), request).await?;

        let nodes = response
            .data
            .and_then(|data| data.get_network_hashrate)
            .map(|series| series.nodes)
            .unwrap_or_default();
        if nodes.is_empty() {
            return Err(SourceError::empty("no hashrate data"));
        }

        let cutoff = self.clock.now_secs() - window.as_secs();
        let mut history = recent_positive(
            nodes.iter().map(|node| {
                (
                    node.timestamp,
                    node.network_hashrate_7d.map(|value| value.0).unwrap_or(0.0),
                )
            }),
            cutoff,
        );
        history.sort_by_key(|point| point.timestamp);

        let Some(latest) = history.last().copied() else {
            return Err(SourceError::empty("no recent hashrate data"));
        };

        Ok(FetchResult::from_provider(
            ProviderId::Luxor,
            latest.hashrate_ehs,
            history,
        ))
    }
}

impl HashrateSource for LuxorAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Luxor
    }

    fn fetch(&self, window: DayWindow) -> SourceFuture<'_> {
        Box::pin(self.fetch_window(window))
    }
}

/// Hashrate Index only offers four chart spans.
fn chart_interval(window: DayWindow) -> &'static str {
    match window.days() {
        0..=7 => "_1_WEEK",
        8..=30 => "_1_MONTH",
        31..=90 => "_3_MONTHS",
        _ => "_1_YEAR",
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<GraphqlData>,
}

#[derive(Debug, Deserialize)]
struct GraphqlData {
    #[serde(rename = "getNetworkHashrate", default)]
    get_network_hashrate: Option<NetworkHashrateSeries>,
}

#[derive(Debug, Deserialize)]
struct NetworkHashrateSeries {
    #[serde(default)]
    nodes: Vec<NetworkHashrateNode>,
}

#[derive(Debug, Deserialize)]
struct NetworkHashrateNode {
    #[serde(deserialize_with = "epoch_seconds")]
    timestamp: i64,
    #[serde(rename = "networkHashrate7D", default)]
    network_hashrate_7d: Option<Magnitude>,
}

/// Accepts epoch seconds or an RFC3339 string.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(i64),
        Fractional(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Seconds(seconds) => Ok(seconds),
        Raw::Fractional(seconds) => Ok(seconds as i64),
        Raw::Text(text) => OffsetDateTime::parse(&text, &Rfc3339)
            .map(OffsetDateTime::unix_timestamp)
            .map_err(serde::de::Error::custom),
    }
}
