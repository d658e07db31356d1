use std::sync::Arc;

use serde::Deserialize;

use super::{fetch_json, recent_positive};
use crate::clock::Clock;
use crate::data_source::{HashrateSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{DayWindow, FetchResult, ProviderId};

const BASE_URL: &str = "https://api.blockchain.info/charts/hash-rate";

/// TH/s per EH/s.
const TERAHASHES_PER_EXAHASH: f64 = 1e6;

/// Secondary free source. The chart API reports TH/s and has no separate
/// current-value field; the newest sample in the window stands in for it.
#[derive(Clone)]
pub struct BlockchainInfoAdapter {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl BlockchainInfoAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        Self { http_client, clock }
    }

    async fn fetch_window(&self, window: DayWindow) -> Result<FetchResult, SourceError> {
        let endpoint = format!("{BASE_URL}?timespan={}days&format=json", window.days());
        let payload: ChartResponse = fetch_json(
            self.http_client.as_ref(),
            HttpRequest::get(endpoint),
        )
        .await?;

        let cutoff = self.clock.now_secs() - window.as_secs();
        let mut history = recent_positive(
            payload
                .values
                .iter()
                .map(|point| (point.x, point.y / TERAHASHES_PER_EXAHASH)),
            cutoff,
        );
        history.sort_by_key(|point| point.timestamp);

        let Some(latest) = history.last().copied() else {
            return Err(SourceError::empty("no hashrate data"));
        };

        Ok(FetchResult::from_provider(
            ProviderId::BlockchainInfo,
            latest.hashrate_ehs,
            history,
        ))
    }
}

impl HashrateSource for BlockchainInfoAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::BlockchainInfo
    }

    fn fetch(&self, window: DayWindow) -> SourceFuture<'_> {
        Box::pin(self.fetch_window(window))
    }
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    #[serde(default)]
    values: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    x: i64,
    y: f64,
}
