//! JSON handlers.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /api/hashrate` | Current hash rate and power estimate |
//! | `GET /api/history` | Hash rate history with CONUS power per point |
//! | `GET /api/fleet` | Fleet efficiency model |
//! | `GET /api/states` | CONUS power split by state |
//! | `GET /api/health` | Source registration and a live probe |
//!
//! Every data route takes an optional `days` query parameter (default 20,
//! clamped to 0..=1095, unparseable values fall back to the default).

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::warn;

use hashwatt_core::{
    estimate_power, round2, state_breakdown, weighted_efficiency, DayWindow, FleetModel,
    HashrateService, SnapshotError, SourceLabel, SourceSnapshot, StatePower, CONUS_SHARE, FLEET,
};

pub type AppState = Arc<HashrateService>;

pub fn router(service: AppState) -> Router {
    Router::new()
        .route("/api/hashrate", get(hashrate_handler))
        .route("/api/history", get(history_handler))
        .route("/api/fleet", get(fleet_handler))
        .route("/api/states", get(states_handler))
        .route("/api/health", get(health_handler))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct DaysQuery {
    days: Option<String>,
}

impl DaysQuery {
    fn window(&self) -> DayWindow {
        self.days
            .as_deref()
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .map(DayWindow::clamp)
            .unwrap_or_default()
    }
}

/// A snapshot failure rendered as the unavailable sentinel with a 503.
pub struct ApiError(SnapshotError);

impl From<SnapshotError> for ApiError {
    fn from(value: SnapshotError) -> Self {
        Self(value)
    }
}

#[derive(Debug, Serialize)]
struct UnavailableBody<'a> {
    source: SourceLabel,
    hashrate_ehs: f64,
    errors: &'a [String],
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self.0, "no hash rate data to serve");
        let body = UnavailableBody {
            source: SourceLabel::Unavailable,
            hashrate_ehs: 0.0,
            errors: &self.0.fetch_error().diagnostics,
        };
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
struct HashrateBody {
    hashrate_ehs: f64,
    source: SourceLabel,
    conus_power_gw: f64,
    global_power_gw: f64,
    conus_share: f64,
    fleet_efficiency_jth: f64,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<Vec<String>>,
}

async fn hashrate_handler(
    State(service): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<HashrateBody>, ApiError> {
    let data = service.snapshot(query.window()).await?;
    let power = estimate_power(data.hashrate_ehs);

    Ok(Json(HashrateBody {
        hashrate_ehs: data.hashrate_ehs,
        source: data.source,
        conus_power_gw: power.conus_gw,
        global_power_gw: power.global_gw,
        conus_share: CONUS_SHARE,
        fleet_efficiency_jth: round2(weighted_efficiency()),
        stale: data.stale,
        errors: data.errors.clone(),
    }))
}

#[derive(Debug, Serialize)]
struct HistoryPointBody {
    timestamp: i64,
    hashrate_ehs: f64,
    conus_power_gw: f64,
}

#[derive(Debug, Serialize)]
struct HistoryBody {
    source: SourceLabel,
    history: Vec<HistoryPointBody>,
}

async fn history_handler(
    State(service): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<HistoryBody>, ApiError> {
    let data = service.snapshot(query.window()).await?;
    let history = data
        .history
        .iter()
        .map(|point| HistoryPointBody {
            timestamp: point.timestamp,
            hashrate_ehs: point.hashrate_ehs,
            conus_power_gw: estimate_power(point.hashrate_ehs).conus_gw,
        })
        .collect();

    Ok(Json(HistoryBody {
        source: data.source,
        history,
    }))
}

#[derive(Debug, Serialize)]
struct FleetBody {
    fleet: &'static [FleetModel],
    weighted_efficiency_jth: f64,
    conus_share: f64,
}

async fn fleet_handler() -> Json<FleetBody> {
    Json(FleetBody {
        fleet: &FLEET,
        weighted_efficiency_jth: round2(weighted_efficiency()),
        conus_share: CONUS_SHARE,
    })
}

#[derive(Debug, Serialize)]
struct StatesBody {
    source: SourceLabel,
    conus_power_gw: f64,
    states: Vec<StatePower>,
}

async fn states_handler(
    State(service): State<AppState>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<StatesBody>, ApiError> {
    let data = service.snapshot(query.window()).await?;
    let conus_power_gw = estimate_power(data.hashrate_ehs).conus_gw;

    Ok(Json(StatesBody {
        source: data.source,
        conus_power_gw,
        states: state_breakdown(conus_power_gw),
    }))
}

#[derive(Debug, Serialize)]
struct HealthBody {
    healthy: bool,
    sources: BTreeMap<&'static str, SourceSnapshot>,
    active_source: SourceLabel,
    current_hashrate_ehs: f64,
}

async fn health_handler(State(service): State<AppState>) -> Json<HealthBody> {
    let probe = service.probe().await;
    let sources = service
        .sources()
        .into_iter()
        .map(|snapshot| (snapshot.id.as_str(), snapshot))
        .collect();

    Json(HealthBody {
        healthy: probe.is_available(),
        sources,
        active_source: probe.source,
        current_hashrate_ehs: probe.hashrate_ehs,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use hashwatt_core::{
        DayWindow, FetchResult, HashrateSource, HashwattConfig, HistoryPoint, ManualClock,
        ProviderId, RegisteredSource, RetryConfig, SourceError, SourceFuture, SourceRouter,
        SourceSpec,
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    struct FixedSource {
        outcome: Result<FetchResult, SourceError>,
        last_window: AtomicU32,
    }

    impl HashrateSource for FixedSource {
        fn id(&self) -> ProviderId {
            ProviderId::Mempool
        }

        fn fetch(&self, window: DayWindow) -> SourceFuture<'_> {
            self.last_window.store(window.days(), Ordering::SeqCst);
            let outcome = self.outcome.clone();
            Box::pin(async move { outcome })
        }
    }

    fn fixed(outcome: Result<FetchResult, SourceError>) -> Arc<FixedSource> {
        Arc::new(FixedSource {
            outcome,
            last_window: AtomicU32::new(u32::MAX),
        })
    }

    fn service_with(source: Arc<FixedSource>) -> AppState {
        let router = SourceRouter::new(
            vec![RegisteredSource::new(
                SourceSpec::new(ProviderId::Mempool, 1, true, false),
                source,
            )],
            RetryConfig::default(),
        );
        let service = HashrateService::with_router(
            router,
            &HashwattConfig::default(),
            Arc::new(ManualClock::new(1_700_000_000)),
        )
        .expect("default config is valid");
        Arc::new(service)
    }

    fn healthy_source() -> Arc<FixedSource> {
        fixed(Ok(FetchResult::from_provider(
            ProviderId::Mempool,
            600.0,
            vec![
                HistoryPoint::new(1_699_900_000, 590.0),
                HistoryPoint::new(1_699_990_000, 600.0),
            ],
        )))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn hashrate_reports_power_and_source() {
        let app = router(service_with(healthy_source()));

        let (status, body) = get_json(app, "/api/hashrate").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["hashrate_ehs"], 600.0);
        assert_eq!(body["source"], "mempool.space");
        assert_eq!(body["global_power_gw"], 14.8);
        assert_eq!(body["conus_power_gw"], 5.59);
        assert_eq!(body["conus_share"], 0.378);
        assert_eq!(body["fleet_efficiency_jth"], 24.66);
        assert!(body.get("stale").is_none());
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn days_parameter_is_clamped_and_lenient() {
        let source = healthy_source();
        let service = service_with(source.clone());

        get_json(router(service.clone()), "/api/hashrate?days=5000").await;
        assert_eq!(source.last_window.load(Ordering::SeqCst), 1095);

        get_json(router(service.clone()), "/api/hashrate?days=-3").await;
        assert_eq!(source.last_window.load(Ordering::SeqCst), 0);

        get_json(router(service), "/api/hashrate?days=soon").await;
        assert_eq!(source.last_window.load(Ordering::SeqCst), 20);
    }

    #[tokio::test]
    async fn history_adds_conus_power_per_point() {
        let app = router(service_with(healthy_source()));

        let (status, body) = get_json(app, "/api/history?days=7").await;

        assert_eq!(status, StatusCode::OK);
        let history = body["history"].as_array().expect("history array");
        assert_eq!(history.len(), 2);
        assert_eq!(history[1]["timestamp"], 1_699_990_000);
        assert_eq!(history[1]["conus_power_gw"], 5.59);
    }

    #[tokio::test]
    async fn states_are_sorted_by_share() {
        let app = router(service_with(healthy_source()));

        let (_, body) = get_json(app, "/api/states").await;

        let states = body["states"].as_array().expect("states array");
        assert_eq!(states.len(), 48);
        assert_eq!(states[0]["state"], "Texas");
        assert_eq!(body["conus_power_gw"], 5.59);
    }

    #[tokio::test]
    async fn fleet_lists_every_model() {
        let app = router(service_with(healthy_source()));

        let (_, body) = get_json(app, "/api/fleet").await;

        assert_eq!(body["fleet"].as_array().map(Vec::len), Some(10));
        assert_eq!(body["fleet"][0]["model"], "Antminer S19j Pro");
        assert_eq!(body["weighted_efficiency_jth"], 24.66);
    }

    #[tokio::test]
    async fn total_failure_is_a_503_sentinel() {
        let app = router(service_with(fixed(Err(SourceError::unavailable(
            "returned status 502",
        )))));

        let (status, body) = get_json(app, "/api/hashrate").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            body,
            serde_json::json!({
                "source": "unavailable",
                "hashrate_ehs": 0.0,
                "errors": ["mempool.space: returned status 502"],
            })
        );
    }

    #[tokio::test]
    async fn health_reports_sources_and_probe() {
        let app = router(service_with(healthy_source()));

        let (status, body) = get_json(app, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
        assert_eq!(body["active_source"], "mempool.space");
        assert_eq!(body["current_hashrate_ehs"], 600.0);
        assert_eq!(body["sources"]["mempool.space"]["enabled"], true);
        assert_eq!(body["sources"]["mempool.space"]["note"], Value::Null);
    }
}
