use std::sync::Arc;

use serde::Deserialize;

use super::{fetch_json, Magnitude};
use crate::clock::Clock;
use crate::data_source::{HashrateSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{DayWindow, FetchResult, HistoryPoint, ProviderId};

const STATS_URL: &str = "https://api.blockchair.com/bitcoin/stats";

/// H/s per EH/s.
const HASHES_PER_EXAHASH: f64 = 1e18;

/// Tertiary free source. The stats endpoint only carries a 24h average, so
/// the result holds a single point stamped "now" and the window is ignored.
#[derive(Clone)]
pub struct BlockchairAdapter {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl BlockchairAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        Self { http_client, clock }
    }

    async fn fetch_stats(&self) -> Result<FetchResult, SourceError> {
        let payload: StatsResponse = fetch_json(
            self.http_client.as_ref(),
            HttpRequest::get(STATS_URL),
        )
        .await?;

        let current = payload.data.hashrate_24h.0 / HASHES_PER_EXAHASH;
        Ok(FetchResult::from_provider(
            ProviderId::Blockchair,
            current,
            vec![HistoryPoint::new(self.clock.now_secs(), current)],
        ))
    }
}

impl HashrateSource for BlockchairAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Blockchair
    }

    fn fetch(&self, _window: DayWindow) -> SourceFuture<'_> {
        Box::pin(self.fetch_stats())
    }
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    data: StatsData,
}

#[derive(Debug, Deserialize)]
struct StatsData {
    hashrate_24h: Magnitude,
}
