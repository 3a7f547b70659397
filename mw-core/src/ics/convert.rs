//! Calendar to native grammar conversion using the icalendar crate's parser.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveTime};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, read_calendar, unfold},
};
use regex::Regex;

use crate::date_range::DateRange;
use crate::error::{MwError, MwResult};
use crate::parse::escape_description_line;
use crate::tz::{in_zone, localize, named_zone};

/// File suffixes treated as calendar input.
pub const CALENDAR_EXTENSIONS: &[&str] = &["ical", "ics", "ifb", "icalendar"];

/// Suffix of generated native grammar files.
pub const NATIVE_EXTENSION: &str = "mw";

/// Separator rows conferencing tools put in invitation descriptions,
/// e.g. `-::~:~::~:~:~:~::-`.
static CALENDAR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?:[:~]*~[:~]*-?$").expect("marker pattern is valid"));

pub fn is_calendar_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            CALENDAR_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// `meetings.ics` becomes `meetings.mw` in the same directory.
pub fn native_path_for(path: &Path) -> PathBuf {
    path.with_extension(NATIVE_EXTENSION)
}

/// Convert a calendar file and write the result beside it.
///
/// The whole calendar is converted in memory first, so a malformed input
/// never leaves a partial file behind.
pub fn convert_file(path: &Path) -> MwResult<PathBuf> {
    let content = std::fs::read_to_string(path).map_err(|source| MwError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let native = convert_calendar(&content)?;
    let destination = native_path_for(path);

    std::fs::write(&destination, native).map_err(|source| MwError::Write {
        path: destination.clone(),
        source,
    })?;

    Ok(destination)
}

/// Convert calendar text into native grammar text, one block per VEVENT.
pub fn convert_calendar(content: &str) -> MwResult<String> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| MwError::IcsParse(e.to_string()))?;

    if calendar.components.is_empty() && !has_calendar_envelope(&unfolded) {
        return Err(MwError::IcsParse("no calendar components found".into()));
    }

    let mut components = Vec::new();
    collect_components(&calendar.components, &mut components);

    // The calendar's declared zone decides which day an instant falls on.
    let zone = components
        .iter()
        .find(|c| c.name == "VTIMEZONE")
        .and_then(|tz| tz.find_prop("TZID"))
        .and_then(|p| named_zone(p.val.as_ref()));

    let blocks = components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(|vevent| convert_event(vevent, zone))
        .collect::<MwResult<Vec<_>>>()?;

    if blocks.is_empty() {
        return Ok(String::new());
    }
    Ok(blocks.join("\n\n") + "\n")
}

fn has_calendar_envelope(content: &str) -> bool {
    content
        .lines()
        .any(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
}

fn collect_components<'c, 'a>(components: &'c [Component<'a>], out: &mut Vec<&'c Component<'a>>) {
    for component in components {
        out.push(component);
        collect_components(&component.components, out);
    }
}

fn convert_event(vevent: &Component, zone: Option<Tz>) -> MwResult<String> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.to_string())
        .unwrap_or_else(|| "(no uid)".to_string());

    let start = vevent
        .find_prop("DTSTART")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .ok_or_else(|| MwError::IcsParse(format!("event {} has no valid DTSTART", uid)))?;
    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok());

    let from = to_instant(start, zone);
    let to = end.map(|end| to_instant(end, zone)).unwrap_or(from);
    let range = DateRange::days(from, to);

    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| single_line(&unescape(p.val.as_ref())))
        .unwrap_or_default();

    let mut lines = vec![format!("{}: {}", range, summary).trim_end().to_string()];

    if let Some(description) = vevent.find_prop("DESCRIPTION") {
        let text = unescape(description.val.as_ref());
        lines.extend(
            text.lines()
                .filter(|line| !CALENDAR_MARKER.is_match(line.trim()))
                .map(|line| escape_description_line(line.trim_end()).into_owned()),
        );
    }

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    Ok(lines.join("\n"))
}

/// Resolve a DTSTART/DTEND value to an instant expressed in the calendar zone.
fn to_instant(value: DatePerhapsTime, zone: Option<Tz>) -> DateTime<FixedOffset> {
    match value {
        DatePerhapsTime::Date(date) => localize(date.and_time(NaiveTime::MIN), zone),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => in_zone(dt, zone),
            CalendarDateTime::Floating(naive) => localize(naive, zone),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                in_zone(localize(date_time, named_zone(&tzid)), zone)
            }
        },
    }
}

/// Event titles live on the date line; fold any line breaks into spaces.
fn single_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Undo RFC 5545 TEXT escaping.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
