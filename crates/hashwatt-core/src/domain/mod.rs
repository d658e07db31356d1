//! # Domain Models
//!
//! Canonical hash rate types shared by every adapter and by the cache.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`HistoryPoint`] | Timestamped hash rate sample in EH/s |
//! | [`FetchResult`] | Normalized result of one sourcing pass |
//! | [`Period`] | Upstream history bucket (`3d` .. `all`) |
//! | [`DayWindow`] | Clamped request window, also the cache key |
//!
//! Every value is in EH/s rounded to two decimals; unit conversion happens
//! inside the adapters and never leaks past them.

mod models;
mod period;

pub use models::{round2, FetchResult, HistoryPoint};
pub use period::{DayWindow, Period};
