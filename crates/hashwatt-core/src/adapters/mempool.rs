use std::sync::Arc;

use serde::Deserialize;

use super::{fetch_json, recent_positive};
use crate::clock::Clock;
use crate::data_source::{HashrateSource, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest};
use crate::{DayWindow, FetchResult, ProviderId};

const BASE_URL: &str = "https://mempool.space/api/v1/mining/hashrate";

/// H/s per EH/s.
const HASHES_PER_EXAHASH: f64 = 1e18;

/// Primary free source. Reports integer H/s and serves history in fixed
/// period buckets, so the request window is widened to the covering period
/// and trimmed back afterwards.
#[derive(Clone)]
pub struct MempoolAdapter {
    http_client: Arc<dyn HttpClient>,
    clock: Arc<dyn Clock>,
}

impl MempoolAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> Self {
        Self { http_client, clock }
    }

    async fn fetch_window(&self, window: DayWindow) -> Result<FetchResult, SourceError> {
        let endpoint = format!("{BASE_URL}/{}", window.period());
        let payload: MempoolHashrateResponse = fetch_json(
            self.http_client.as_ref(),
            HttpRequest::get(endpoint),
        )
        .await?;

        let cutoff = self.clock.now_secs() - window.as_secs();
        let history = recent_positive(
            payload
                .hashrates
                .iter()
                .map(|point| (point.timestamp, point.avg_hashrate / HASHES_PER_EXAHASH)),
            cutoff,
        );
        let current = payload.current_hashrate / HASHES_PER_EXAHASH;

        if history.is_empty() && current <= 0.0 {
            return Err(SourceError::empty("no hashrate data"));
        }

        Ok(FetchResult::from_provider(
            ProviderId::Mempool,
            current,
            history,
        ))
    }
}

impl HashrateSource for MempoolAdapter {
    fn id(&self) -> ProviderId {
        ProviderId::Mempool
    }

    fn fetch(&self, window: DayWindow) -> SourceFuture<'_> {
        Box::pin(self.fetch_window(window))
    }
}

#[derive(Debug, Deserialize)]
struct MempoolHashrateResponse {
    #[serde(rename = "currentHashrate")]
    current_hashrate: f64,
    #[serde(default)]
    hashrates: Vec<MempoolHashratePoint>,
}

#[derive(Debug, Deserialize)]
struct MempoolHashratePoint {
    timestamp: i64,
    #[serde(rename = "avgHashrate")]
    avg_hashrate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::test_support::{block_on, RecordingHttpClient};
    use crate::clock::ManualClock;
    use crate::data_source::SourceErrorKind;
    use crate::http_client::HttpResponse;
    use crate::HistoryPoint;

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 86_400;

    fn adapter(client: Arc<RecordingHttpClient>) -> MempoolAdapter {
        MempoolAdapter::new(client, Arc::new(ManualClock::new(NOW)))
    }

    #[test]
    fn converts_hashes_to_exahashes_and_trims_to_window() {
        let body = format!(
            r#"{{
                "currentHashrate": 612345678901234567890,
                "hashrates": [
                    {{ "timestamp": {old}, "avgHashrate": 500000000000000000000 }},
                    {{ "timestamp": {recent}, "avgHashrate": 600126000000000000000 }},
                    {{ "timestamp": {latest}, "avgHashrate": 0 }}
                ]
            }}"#,
            old = NOW - 10 * DAY,
            recent = NOW - DAY,
            latest = NOW,
        );
        let client = Arc::new(RecordingHttpClient::responding(&body));

        let result = block_on(adapter(client.clone()).fetch(DayWindow::clamp(5)))
            .expect("fetch should succeed");

        assert_eq!(result.hashrate_ehs, 612.35);
        assert_eq!(result.history, vec![HistoryPoint::new(NOW - DAY, 600.13)]);

        let requests = client.recorded_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].url,
            "https://mempool.space/api/v1/mining/hashrate/1w"
        );
    }

    #[test]
    fn non_success_status_is_unavailable() {
        let client = Arc::new(RecordingHttpClient::with_result(Ok(
            HttpResponse::with_status(503, "busy"),
        )));

        let error = block_on(adapter(client).fetch(DayWindow::default()))
            .expect_err("503 must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable);
        assert_eq!(error.message(), "returned status 503");
    }

    #[test]
    fn missing_current_value_is_malformed() {
        let client = Arc::new(RecordingHttpClient::responding(r#"{ "hashrates": [] }"#));

        let error = block_on(adapter(client).fetch(DayWindow::default()))
            .expect_err("missing field must fail");

        assert_eq!(error.kind(), SourceErrorKind::Malformed);
    }

    #[test]
    fn zero_current_and_no_history_is_empty() {
        let client = Arc::new(RecordingHttpClient::responding(
            r#"{ "currentHashrate": 0, "hashrates": [] }"#,
        ));

        let error = block_on(adapter(client).fetch(DayWindow::default()))
            .expect_err("no data must fail");

        assert_eq!(error.kind(), SourceErrorKind::Empty);
    }
}
