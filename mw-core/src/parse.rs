//! Reader for the native timeline grammar.
//!
//! Only the subset mw itself produces and consumes is understood: an
//! optional header, dated event lines and free-form description lines.
//! The reader never fails; anything it does not recognize becomes
//! description text of the preceding event or is skipped.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::date_range::{DateRange, Granularity};
use crate::document::{Event, TIMEZONE_KEY, Timeline, TimelineDocument};
use crate::tz::{localize, named_zone};

/// Line separating two timelines in one source file.
pub const TIMELINE_BREAK: &str = "_-_-_break_-_-_";

/// Leading character that marks a body line as literal description text.
pub const LITERAL_PREFIX: char = '\\';

const FRONT_MATTER_FENCE: &str = "---";

const DATE: &str = r"\d{4}(?:-\d{2}(?:-\d{2}(?:[T ]\d{2}:\d{2}(?::\d{2})?)?)?)?";

static EVENT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*(?P<from>{DATE})(?:\s*(?:-|to)\s*(?P<to>{DATE}|now))?\s*:\s?(?P<text>.*)$"
    ))
    .expect("event line pattern is valid")
});

static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<key>[A-Za-z][\w-]*)\s*:\s*(?P<value>.*?)\s*$")
        .expect("header line pattern is valid")
});

/// Parse native grammar text into a document with at least one timeline.
pub fn parse(text: &str) -> TimelineDocument {
    let mut timelines = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();
    let mut chunk_start = 0;

    for (i, line) in text.lines().enumerate() {
        if line.trim() == TIMELINE_BREAK {
            timelines.push(parse_timeline(&chunk, chunk_start));
            chunk.clear();
            chunk_start = i + 1;
        } else {
            chunk.push(line);
        }
    }
    timelines.push(parse_timeline(&chunk, chunk_start));

    TimelineDocument { timelines }
}

/// Prepare a description line for writing, so that reading it back yields
/// the same text instead of a new event or timeline.
pub fn escape_description_line(line: &str) -> Cow<'_, str> {
    let literal = line.starts_with(LITERAL_PREFIX)
        || line.trim() == TIMELINE_BREAK
        || EVENT_LINE.is_match(line);
    if literal {
        Cow::Owned(format!("{LITERAL_PREFIX}{line}"))
    } else {
        Cow::Borrowed(line)
    }
}

fn parse_timeline(lines: &[&str], first_line: usize) -> Timeline {
    let mut header = BTreeMap::new();
    let body_start = read_header(lines, &mut header);
    let zone = header.get(TIMEZONE_KEY).and_then(|id| named_zone(id));

    let mut events: Vec<Event> = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(body_start) {
        if let Some(event) = parse_event_line(line, first_line + i, zone) {
            events.push(event);
        } else if let Some(last) = events.last_mut() {
            let line = line.trim_end();
            last.description
                .push(line.strip_prefix(LITERAL_PREFIX).unwrap_or(line).to_string());
        }
    }

    for event in &mut events {
        while event
            .description
            .last()
            .is_some_and(|l| l.trim().is_empty())
        {
            event.description.pop();
        }
    }

    Timeline { header, events }
}

/// Fill `header` from the top of a timeline; returns the index of the
/// first body line.
fn read_header(lines: &[&str], header: &mut BTreeMap<String, String>) -> usize {
    let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return lines.len();
    };

    if lines[first].trim() == FRONT_MATTER_FENCE {
        let Some(close) = lines[first + 1..]
            .iter()
            .position(|l| l.trim() == FRONT_MATTER_FENCE)
        else {
            return 0;
        };
        for line in &lines[first + 1..first + 1 + close] {
            insert_header_line(line, header);
        }
        return first + close + 2;
    }

    let mut i = first;
    while i < lines.len() && !EVENT_LINE.is_match(lines[i]) && insert_header_line(lines[i], header) {
        i += 1;
    }
    i
}

fn insert_header_line(line: &str, header: &mut BTreeMap<String, String>) -> bool {
    let Some(caps) = HEADER_LINE.captures(line) else {
        return false;
    };
    header.insert(caps["key"].to_lowercase(), caps["value"].to_string());
    true
}

fn parse_event_line(line: &str, line_no: usize, zone: Option<Tz>) -> Option<Event> {
    let caps = EVENT_LINE.captures(line)?;
    let from_text = &caps["from"];
    let (from, from_end, from_granularity) = parse_date(from_text, zone)?;

    let (to, granularity) = match caps.name("to").map(|m| m.as_str()) {
        None => (from_end, from_granularity),
        Some("now") => (Utc::now().fixed_offset(), from_granularity),
        Some(to_text) => {
            let (to_start, to_end, to_granularity) = parse_date(to_text, zone)?;
            let to = if to_granularity >= Granularity::Day {
                to_end
            } else {
                to_start
            };
            (to, from_granularity.min(to_granularity))
        }
    };

    let date_text = match caps.name("to") {
        Some(to) => line[caps.name("from")?.start()..to.end()].trim().to_string(),
        None => from_text.to_string(),
    };

    Some(Event {
        date_range: DateRange::new(from, to, granularity),
        date_text,
        text: caps["text"].trim().to_string(),
        description: Vec::new(),
        line: line_no,
    })
}

/// Parse one date; returns its start, the end of the unit it names and
/// its granularity. Invalid calendar dates yield `None`.
fn parse_date(
    text: &str,
    zone: Option<Tz>,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>, Granularity)> {
    let (start, end, granularity) = match text.len() {
        4 => {
            let start = NaiveDate::from_ymd_opt(text.parse().ok()?, 1, 1)?;
            (start, start.checked_add_months(Months::new(12))?, Granularity::Year)
        }
        7 => {
            let start = NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok()?;
            (start, start.checked_add_months(Months::new(1))?, Granularity::Month)
        }
        10 => {
            let start = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
            (start, start.succ_opt()?, Granularity::Day)
        }
        _ => {
            let normalized = text.replacen(' ', "T", 1);
            let (naive, granularity) = if normalized.len() == 16 {
                (
                    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M").ok()?,
                    Granularity::Minute,
                )
            } else {
                (
                    NaiveDateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S").ok()?,
                    Granularity::Instant,
                )
            };
            let at = localize(naive, zone);
            return Some((at, at, granularity));
        }
    };

    let midnight = |d: NaiveDate| localize(d.and_time(chrono::NaiveTime::MIN), zone);
    let (start, end) = (midnight(start), midnight(end));
    // DST transitions can shift midnight; keep the unit non-empty.
    let end = if end <= start { start + Duration::days(1) } else { end };
    Some((start, end, granularity))
}
