mod blockchain_info;
mod blockchair;
mod luxor;
mod mempool;

pub use blockchain_info::BlockchainInfoAdapter;
pub use blockchair::BlockchairAdapter;
pub use luxor::LuxorAdapter;
pub use mempool::MempoolAdapter;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::data_source::SourceError;
use crate::http_client::{HttpClient, HttpRequest};
use crate::HistoryPoint;

/// Executes `request` and decodes a JSON body, mapping every failure mode to
/// a [`SourceError`]. Messages leave the provider out; the router prefixes it.
async fn fetch_json<T>(http_client: &dyn HttpClient, request: HttpRequest) -> Result<T, SourceError>
where
    T: DeserializeOwned,
{
    let response = http_client.execute(request).await.map_err(|e| {
        SourceError::unavailable(format!("transport error: {}", e.message()))
    })?;

    if !response.is_success() {
        return Err(SourceError::unavailable(format!(
            "returned status {}",
            response.status
        )));
    }

    serde_json::from_str(&response.body)
        .map_err(|e| SourceError::malformed(format!("failed to parse response: {e}")))
}

/// Keeps samples at or after `cutoff` with a positive value.
fn recent_positive(
    samples: impl IntoIterator<Item = (i64, f64)>,
    cutoff: i64,
) -> Vec<HistoryPoint> {
    samples
        .into_iter()
        .filter(|(timestamp, value)| *timestamp >= cutoff && *value > 0.0)
        .map(|(timestamp, value)| HistoryPoint::new(timestamp, value))
        .collect()
}

/// Providers disagree on whether large magnitudes are JSON numbers or
/// numeric strings; accept both.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Magnitude(f64);

impl<'de> Deserialize<'de> for Magnitude {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(f64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(Self(value)),
            Raw::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Self)
                .map_err(serde::de::Error::custom),
        }
    }
}
