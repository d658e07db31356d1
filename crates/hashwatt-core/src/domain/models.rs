use serde::Serialize;

use crate::{ProviderId, SourceLabel};

/// One network hash rate sample in EH/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryPoint {
    pub timestamp: i64,
    pub hashrate_ehs: f64,
}

impl HistoryPoint {
    pub fn new(timestamp: i64, hashrate_ehs: f64) -> Self {
        Self {
            timestamp,
            hashrate_ehs: round2(hashrate_ehs),
        }
    }
}

/// Normalized output of one sourcing pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchResult {
    pub source: SourceLabel,
    pub hashrate_ehs: f64,
    pub history: Vec<HistoryPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stale: bool,
}

impl FetchResult {
    /// Builds a provider result, rounding the current value and ordering history
    /// by timestamp.
    pub fn from_provider(
        provider: ProviderId,
        hashrate_ehs: f64,
        mut history: Vec<HistoryPoint>,
    ) -> Self {
        history.sort_by_key(|point| point.timestamp);
        Self {
            source: SourceLabel::Provider(provider),
            hashrate_ehs: round2(hashrate_ehs.max(0.0)),
            history,
            errors: None,
            stale: false,
        }
    }

    /// Sentinel produced when every candidate source failed.
    pub fn unavailable(errors: Vec<String>) -> Self {
        Self {
            source: SourceLabel::Unavailable,
            hashrate_ehs: 0.0,
            history: Vec::new(),
            errors: Some(errors),
            stale: false,
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors = if errors.is_empty() { None } else { Some(errors) };
        self
    }

    pub fn is_available(&self) -> bool {
        self.source != SourceLabel::Unavailable && self.hashrate_ehs > 0.0
    }

    pub fn errors(&self) -> &[String] {
        self.errors.as_deref().unwrap_or_default()
    }
}

/// Rounds to two decimal places, the precision every adapter reports.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_result_is_rounded_and_time_ordered() {
        let result = FetchResult::from_provider(
            ProviderId::Mempool,
            612.34567,
            vec![HistoryPoint::new(200, 1.0), HistoryPoint::new(100, 2.0)],
        );

        assert_eq!(result.hashrate_ehs, 612.35);
        assert_eq!(result.history[0].timestamp, 100);
        assert_eq!(result.history[1].timestamp, 200);
        assert!(result.is_available());
    }

    #[test]
    fn sentinel_serializes_errors_but_not_stale_flag() {
        let sentinel = FetchResult::unavailable(vec![String::from("mempool.space: timeout")]);
        let json = serde_json::to_value(&sentinel).expect("serializes");

        assert_eq!(json["source"], "unavailable");
        assert_eq!(json["hashrate_ehs"], 0.0);
        assert_eq!(json["errors"][0], "mempool.space: timeout");
        assert!(json.get("stale").is_none());
        assert!(!sentinel.is_available());
    }

    #[test]
    fn empty_diagnostics_are_omitted() {
        let result = FetchResult::from_provider(ProviderId::Blockchair, 1.0, Vec::new())
            .with_errors(Vec::new());
        assert!(result.errors.is_none());
        assert!(result.errors().is_empty());
    }
}
