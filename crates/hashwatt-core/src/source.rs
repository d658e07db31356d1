use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::ValidationError;

/// Canonical provider identifiers used in results and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderId {
    #[serde(rename = "luxor")]
    Luxor,
    #[serde(rename = "mempool.space")]
    Mempool,
    #[serde(rename = "blockchain.info")]
    BlockchainInfo,
    #[serde(rename = "blockchair")]
    Blockchair,
}

impl ProviderId {
    pub const ALL: [Self; 4] = [
        Self::Luxor,
        Self::Mempool,
        Self::BlockchainInfo,
        Self::Blockchair,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Luxor => "luxor",
            Self::Mempool => "mempool.space",
            Self::BlockchainInfo => "blockchain.info",
            Self::Blockchair => "blockchair",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "luxor" => Ok(Self::Luxor),
            "mempool.space" | "mempool" => Ok(Self::Mempool),
            "blockchain.info" => Ok(Self::BlockchainInfo),
            "blockchair" => Ok(Self::Blockchair),
            other => Err(ValidationError::InvalidSource {
                value: other.to_owned(),
            }),
        }
    }
}

/// Origin of a [`FetchResult`](crate::FetchResult): a provider, or the
/// exhaustion sentinel when every provider failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceLabel {
    Provider(ProviderId),
    Unavailable,
}

impl SourceLabel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider(provider) => provider.as_str(),
            Self::Unavailable => "unavailable",
        }
    }

    pub const fn provider(self) -> Option<ProviderId> {
        match self {
            Self::Provider(provider) => Some(provider),
            Self::Unavailable => None,
        }
    }
}

impl From<ProviderId> for SourceLabel {
    fn from(value: ProviderId) -> Self {
        Self::Provider(value)
    }
}

impl Display for SourceLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceLabel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
