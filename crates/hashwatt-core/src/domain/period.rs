use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Upstream history buckets, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "1w")]
    OneWeek,
    #[serde(rename = "2w")]
    TwoWeeks,
    #[serde(rename = "1m")]
    OneMonth,
    #[serde(rename = "3m")]
    ThreeMonths,
    #[serde(rename = "6m")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "3y")]
    ThreeYears,
    #[serde(rename = "all")]
    All,
}

impl Period {
    /// Bounded buckets with the number of days each one covers.
    const BUCKETS: [(u32, Self); 9] = [
        (3, Self::ThreeDays),
        (7, Self::OneWeek),
        (14, Self::TwoWeeks),
        (30, Self::OneMonth),
        (90, Self::ThreeMonths),
        (180, Self::SixMonths),
        (365, Self::OneYear),
        (730, Self::TwoYears),
        (1095, Self::ThreeYears),
    ];

    /// Smallest bucket whose coverage includes `days`, or [`Period::All`]
    /// past the widest bounded bucket.
    pub fn for_days(days: u32) -> Self {
        Self::BUCKETS
            .iter()
            .find(|(coverage, _)| days <= *coverage)
            .map(|(_, period)| *period)
            .unwrap_or(Self::All)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeDays => "3d",
            Self::OneWeek => "1w",
            Self::TwoWeeks => "2w",
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::ThreeYears => "3y",
            Self::All => "all",
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::BUCKETS
            .iter()
            .map(|(_, period)| *period)
            .chain(std::iter::once(Self::All))
            .find(|period| period.as_str() == normalized)
            .ok_or(ValidationError::InvalidPeriod { value: normalized })
    }
}

/// Requested history window in days, clamped to what the API serves.
///
/// This is also the cache key: every request for the same clamped window
/// shares one cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayWindow(u32);

impl DayWindow {
    pub const MAX_DAYS: u32 = 1095;
    pub const DEFAULT_DAYS: u32 = 20;

    pub fn clamp(days: i64) -> Self {
        Self(days.clamp(0, i64::from(Self::MAX_DAYS)) as u32)
    }

    pub const fn days(self) -> u32 {
        self.0
    }

    pub fn period(self) -> Period {
        Period::for_days(self.0)
    }

    /// Window length in seconds, used for history cutoffs.
    pub const fn as_secs(self) -> i64 {
        self.0 as i64 * 86_400
    }
}

impl Default for DayWindow {
    fn default() -> Self {
        Self(Self::DEFAULT_DAYS)
    }
}

impl Display for DayWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.0)
    }
}
