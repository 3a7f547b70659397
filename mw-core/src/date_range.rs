//! Date ranges attached to timeline events.

use std::fmt;

use chrono::{DateTime, Duration, FixedOffset};
use serde::{Deserialize, Serialize};

/// How precisely a range was stated, and how precisely it is written back out.
/// Ordered finest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Instant,
    Minute,
    Day,
    Month,
    Year,
}

impl Granularity {
    fn format(self) -> &'static str {
        match self {
            Granularity::Instant => "%Y-%m-%dT%H:%M:%S",
            Granularity::Minute => "%Y-%m-%dT%H:%M",
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
            Granularity::Year => "%Y",
        }
    }

    /// Whether `to` marks the exclusive end of the last covered unit
    /// (whole days, months, years) rather than a point in time.
    fn is_calendar_unit(self) -> bool {
        matches!(self, Granularity::Day | Granularity::Month | Granularity::Year)
    }
}

/// A span between two timezone-aware instants. `to` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    #[serde(rename = "fromDateTimeIso")]
    pub from: DateTime<FixedOffset>,
    #[serde(rename = "toDateTimeIso")]
    pub to: DateTime<FixedOffset>,
    pub granularity: Granularity,
}

impl DateRange {
    pub fn new(
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
        granularity: Granularity,
    ) -> Self {
        DateRange {
            from,
            to,
            granularity,
        }
    }

    /// Day-level range, the form calendar imports are written in.
    pub fn days(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> Self {
        Self::new(from, to, Granularity::Day)
    }

    /// Native grammar text for this range, e.g. `2024-01-01` or
    /// `2024-01-01 - 2024-01-03`.
    pub fn to_native_text(&self) -> String {
        let fmt = self.granularity.format();
        let start = self.from.format(fmt).to_string();

        if self.to <= self.from {
            return start;
        }

        let last = if self.granularity.is_calendar_unit() {
            self.to - Duration::nanoseconds(1)
        } else {
            self.to
        };
        let end = last.format(fmt).to_string();

        if end == start {
            start
        } else {
            format!("{} - {}", start, end)
        }
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_native_text())
    }
}
