use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

use hashwatt_core::{
    BlockchainInfoAdapter, BlockchairAdapter, Clock, DayWindow, HashrateSource, HttpClient,
    HttpError, HttpRequest, HttpResponse, LuxorAdapter, ManualClock, MempoolAdapter, ProviderId,
    SourceErrorKind, SourceLabel,
};

const NOW: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

/// Replies with a fixed response regardless of the request.
struct FixedHttpClient {
    response: Result<HttpResponse, HttpError>,
}

impl HttpClient for FixedHttpClient {
    fn execute<'a>(
        &'a self,
        _request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let response = self.response.clone();
        Box::pin(async move { response })
    }
}

struct SourceCase {
    id: ProviderId,
    fixture: String,
    time_filtered: bool,
}

fn source_cases() -> Vec<SourceCase> {
    vec![
        SourceCase {
            id: ProviderId::Luxor,
            fixture: format!(
                r#"{{ "data": {{ "getNetworkHashrate": {{ "nodes": [
                    {{ "timestamp": {}, "networkHashrate7D": 605.123 }},
                    {{ "timestamp": {}, "networkHashrate7D": 611.5 }}
                ] }} }} }}"#,
                NOW - 2 * DAY,
                NOW - DAY
            ),
            time_filtered: true,
        },
        SourceCase {
            id: ProviderId::Mempool,
            fixture: format!(
                r#"{{ "currentHashrate": 612000000000000000000,
                     "hashrates": [
                        {{ "timestamp": {}, "avgHashrate": 601000000000000000000 }},
                        {{ "timestamp": {}, "avgHashrate": 608000000000000000000 }}
                     ] }}"#,
                NOW - 3 * DAY,
                NOW - DAY
            ),
            time_filtered: true,
        },
        SourceCase {
            id: ProviderId::BlockchainInfo,
            fixture: format!(
                r#"{{ "values": [
                    {{ "x": {}, "y": 598000000.0 }},
                    {{ "x": {}, "y": 603500000.0 }}
                ] }}"#,
                NOW - 2 * DAY,
                NOW - DAY
            ),
            time_filtered: true,
        },
        SourceCase {
            id: ProviderId::Blockchair,
            fixture: String::from(r#"{ "data": { "hashrate_24h": "606250000000000000000" } }"#),
            time_filtered: false,
        },
    ]
}

fn adapter_for(id: ProviderId, response: Result<HttpResponse, HttpError>) -> Arc<dyn HashrateSource> {
    let http_client: Arc<dyn HttpClient> = Arc::new(FixedHttpClient { response });
    let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(NOW));
    match id {
        ProviderId::Luxor => Arc::new(LuxorAdapter::new(http_client, clock, "contract-key")),
        ProviderId::Mempool => Arc::new(MempoolAdapter::new(http_client, clock)),
        ProviderId::BlockchainInfo => Arc::new(BlockchainInfoAdapter::new(http_client, clock)),
        ProviderId::Blockchair => Arc::new(BlockchairAdapter::new(http_client, clock)),
    }
}

fn is_two_decimal(value: f64) -> bool {
    ((value * 100.0).round() - value * 100.0).abs() < 1e-6
}

#[test]
fn every_source_reports_its_own_id() {
    for case in source_cases() {
        let adapter = adapter_for(case.id, Ok(HttpResponse::ok_json(case.fixture)));
        assert_eq!(adapter.id(), case.id);
    }
}

#[test]
fn every_source_normalizes_to_positive_exahashes() {
    let window = DayWindow::clamp(7);

    for case in source_cases() {
        let adapter = adapter_for(case.id, Ok(HttpResponse::ok_json(case.fixture.clone())));
        let result = block_on(adapter.fetch(window))
            .unwrap_or_else(|error| panic!("{} fixture should parse: {error}", case.id));

        assert_eq!(result.source, SourceLabel::Provider(case.id));
        assert!(!result.stale);
        assert_eq!(result.errors, None);
        assert!(
            (500.0..700.0).contains(&result.hashrate_ehs),
            "{} reported {} EH/s",
            case.id,
            result.hashrate_ehs
        );
        assert!(is_two_decimal(result.hashrate_ehs));
        assert!(!result.history.is_empty());
        assert!(result
            .history
            .windows(2)
            .all(|pair| pair[0].timestamp <= pair[1].timestamp));

        for point in &result.history {
            assert!(point.hashrate_ehs > 0.0);
            assert!(is_two_decimal(point.hashrate_ehs));
            if case.time_filtered {
                assert!(point.timestamp >= NOW - window.as_secs());
            }
        }
    }
}

#[test]
fn every_source_maps_error_status_to_unavailable() {
    for case in source_cases() {
        let adapter = adapter_for(case.id, Ok(HttpResponse::with_status(500, "oops")));
        let error = block_on(adapter.fetch(DayWindow::default()))
            .expect_err("error status must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable, "{}", case.id);
        assert_eq!(error.message(), "returned status 500", "{}", case.id);
    }
}

#[test]
fn every_source_maps_transport_failure_to_unavailable() {
    for case in source_cases() {
        let adapter = adapter_for(case.id, Err(HttpError::new("connection reset")));
        let error = block_on(adapter.fetch(DayWindow::default()))
            .expect_err("transport failure must fail");

        assert_eq!(error.kind(), SourceErrorKind::Unavailable, "{}", case.id);
        assert!(error.message().contains("connection reset"));
    }
}

#[test]
fn every_source_rejects_non_json_payloads() {
    for case in source_cases() {
        let adapter = adapter_for(case.id, Ok(HttpResponse::ok_json("<html>rate limited</html>")));
        let error = block_on(adapter.fetch(DayWindow::default()))
            .expect_err("html body must fail");

        assert_eq!(error.kind(), SourceErrorKind::Malformed, "{}", case.id);
    }
}

fn block_on<F>(future: F) -> F::Output
where
    F: Future,
{
    let waker = noop_waker();
    let mut context = Context::from_waker(&waker);
    let mut future = std::pin::pin!(future);

    loop {
        match future.as_mut().poll(&mut context) {
            Poll::Ready(output) => return output,
            Poll::Pending => std::thread::yield_now(),
        }
    }
}

fn noop_waker() -> Waker {
    // SAFETY: The vtable functions never dereference the data pointer and are no-op operations.
    unsafe { Waker::from_raw(noop_raw_waker()) }
}

fn noop_raw_waker() -> RawWaker {
    RawWaker::new(std::ptr::null(), &NOOP_RAW_WAKER_VTABLE)
}

unsafe fn noop_raw_waker_clone(_: *const ()) -> RawWaker {
    noop_raw_waker()
}

unsafe fn noop_raw_waker_wake(_: *const ()) {}

unsafe fn noop_raw_waker_wake_by_ref(_: *const ()) {}

unsafe fn noop_raw_waker_drop(_: *const ()) {}

static NOOP_RAW_WAKER_VTABLE: RawWakerVTable = RawWakerVTable::new(
    noop_raw_waker_clone,
    noop_raw_waker_wake,
    noop_raw_waker_wake_by_ref,
    noop_raw_waker_drop,
);
