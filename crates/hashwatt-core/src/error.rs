use thiserror::Error;

/// Validation and configuration errors exposed by `hashwatt-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid period '{value}', expected one of 3d, 1w, 2w, 1m, 3m, 6m, 1y, 2y, 3y, all")]
    InvalidPeriod { value: String },
    #[error(
        "invalid source '{value}', expected one of luxor, mempool.space, blockchain.info, blockchair"
    )]
    InvalidSource { value: String },

    #[error("environment variable {name} must be a whole number of seconds: '{value}'")]
    InvalidSeconds { name: &'static str, value: String },
    #[error("fresh ttl must be greater than zero")]
    ZeroFreshTtl,
    #[error("stale ttl ({stale_secs}s) must be greater than fresh ttl ({fresh_secs}s)")]
    StaleTtlNotAfterFresh { fresh_secs: u64, stale_secs: u64 },
    #[error("retry policy must allow at least one attempt")]
    ZeroAttempts,
}
