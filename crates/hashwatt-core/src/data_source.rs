//! Hash rate source trait and its error and registration types.
//!
//! Every provider adapter implements [`HashrateSource`]. The router only ever
//! sees `Result<FetchResult, SourceError>`; unit conversion and filtering stay
//! inside the adapter.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::{DayWindow, FetchResult, ProviderId};

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The source is missing a credential and must not be invoked.
    Configuration,
    /// Transport failure, timeout, or non-success status.
    Unavailable,
    /// Local quota budget is exhausted.
    RateLimited,
    /// Payload could not be parsed or lacked an expected field.
    Malformed,
    /// Payload parsed but held no usable data.
    Empty,
}

/// Structured source failure, rendered into a router diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Configuration, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Malformed, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Empty, message)
    }

    fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Only transport and status failures can change on a second attempt.
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, SourceErrorKind::Unavailable)
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Configuration => "source.configuration",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Empty => "source.empty",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchResult, SourceError>> + Send + 'a>>;

/// Hash rate provider contract.
///
/// Implementations must be `Send + Sync`; one instance is shared by every
/// concurrent request.
pub trait HashrateSource: Send + Sync {
    /// Returns the provider this adapter talks to.
    fn id(&self) -> ProviderId;

    /// Fetches the current hash rate and the history covering `window`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failure, timeout, non-success
    /// status, a malformed payload, or a payload with no usable value.
    fn fetch(&self, window: DayWindow) -> SourceFuture<'_>;
}

/// Static registration data for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceSpec {
    pub id: ProviderId,
    /// Lower values are tried first.
    pub priority: u8,
    pub enabled: bool,
    /// Whether calls go through the retry executor.
    pub retryable: bool,
}

impl SourceSpec {
    pub const fn new(id: ProviderId, priority: u8, enabled: bool, retryable: bool) -> Self {
        Self {
            id,
            priority,
            enabled,
            retryable,
        }
    }

    /// Default priority slot for each provider.
    pub const fn default_priority(id: ProviderId) -> u8 {
        match id {
            ProviderId::Luxor => 0,
            ProviderId::Mempool => 1,
            ProviderId::BlockchainInfo => 2,
            ProviderId::Blockchair => 3,
        }
    }
}

/// A source adapter paired with its registration.
#[derive(Clone)]
pub struct RegisteredSource {
    pub spec: SourceSpec,
    pub source: Arc<dyn HashrateSource>,
}

impl RegisteredSource {
    pub fn new(spec: SourceSpec, source: Arc<dyn HashrateSource>) -> Self {
        Self { spec, source }
    }
}
