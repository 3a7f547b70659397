//! Parsed timeline documents.
//!
//! A source file may hold several timelines; each carries its own header
//! and event list. Documents are immutable once built and are replaced
//! wholesale whenever the source is read again.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::date_range::DateRange;

/// Header key naming the view a document prefers to be shown in.
pub const VIEW_KEY: &str = "view";

/// Header key naming the IANA timezone dates are read in.
pub const TIMEZONE_KEY: &str = "timezone";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineDocument {
    pub timelines: Vec<Timeline>,
}

impl TimelineDocument {
    /// The timeline shown by default (index 0).
    pub fn first(&self) -> Option<&Timeline> {
        self.timelines.first()
    }

    /// Preferred view hint from the first timeline's header, if any.
    pub fn preferred_view(&self) -> Option<&str> {
        self.first().and_then(Timeline::preferred_view)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Recognized metadata. Sorted so serialization is stable.
    pub header: BTreeMap<String, String>,
    pub events: Vec<Event>,
}

impl Timeline {
    pub fn preferred_view(&self) -> Option<&str> {
        self.header.get(VIEW_KEY).map(String::as_str)
    }
}

/// One dated entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub date_range: DateRange,
    /// The date portion exactly as written in the source.
    pub date_text: String,
    pub text: String,
    pub description: Vec<String>,
    /// Zero-based source line of the date line.
    pub line: usize,
}
