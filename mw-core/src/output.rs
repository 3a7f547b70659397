//! Deciding what to produce and where to put it.
//!
//! The representation and destination can come from explicit flags, the
//! destination's file name, or the document's own header. [`resolve`]
//! applies those signals in a fixed order without touching the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Representation {
    Json,
    Timeline,
    Calendar,
    Resume,
}

impl Representation {
    pub const ALL: [Representation; 4] = [
        Representation::Json,
        Representation::Timeline,
        Representation::Calendar,
        Representation::Resume,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Representation::Json => "json",
            Representation::Timeline => "timeline",
            Representation::Calendar => "calendar",
            Representation::Resume => "resume",
        }
    }

    pub fn is_html(self) -> bool {
        self != Representation::Json
    }

    /// Destination used when none is given.
    pub fn default_destination(self) -> PathBuf {
        match self {
            Representation::Json => PathBuf::from("timeline.mw.json"),
            view => PathBuf::from(format!("{}.html", view.as_str())),
        }
    }

    /// Interpret a header `view` value. Only the HTML views qualify.
    pub fn from_view_hint(hint: &str) -> Option<Self> {
        hint.trim()
            .parse::<Representation>()
            .ok()
            .filter(|r| r.is_html())
    }
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Representation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Representation::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown output type '{}'", s))
    }
}

/// File name suffixes that imply a representation. First match wins.
const SUFFIX_RULES: &[(&str, Representation)] = &[
    (".json", Representation::Json),
    ("timeline.html", Representation::Timeline),
    ("calendar.html", Representation::Calendar),
    ("resume.html", Representation::Resume),
];

const HTML_SUFFIXES: &[&str] = &[".html", ".htm"];

/// Every signal that can influence the output, as given by the caller.
#[derive(Debug, Clone, Default)]
pub struct OutputRequest {
    pub representation: Option<Representation>,
    pub destination_flag: Option<PathBuf>,
    pub destination_arg: Option<PathBuf>,
    pub serving: bool,
    /// The document header's `view` value, if any.
    pub preferred_view: Option<String>,
}

impl OutputRequest {
    pub fn with_preferred_view(&self, view: Option<&str>) -> Self {
        OutputRequest {
            preferred_view: view.map(str::to_string),
            ..self.clone()
        }
    }
}

/// A fully resolved output: never ambiguous, destination always concrete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputSpec {
    pub representation: Representation,
    pub destination: PathBuf,
    pub serving: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Ambiguous output - {} & {}", flag.display(), arg.display())]
    AmbiguousDestination { flag: PathBuf, arg: PathBuf },

    #[error("json output cannot be served; use timeline, calendar or resume")]
    JsonNotServable,
}

/// Resolve the output representation and destination.
///
/// 1. A destination flag together with a positional destination is rejected.
/// 2. The representation comes from the explicit flag, else the
///    destination's suffix, else (when serving) the header's view hint,
///    else `timeline` in an HTML context and `json` otherwise.
/// 3. The destination is the flag, else the positional, else a default
///    for the representation.
/// 4. Serving json is rejected.
pub fn resolve(request: &OutputRequest) -> Result<OutputSpec, ResolveError> {
    let given_destination = match (&request.destination_flag, &request.destination_arg) {
        (Some(flag), Some(arg)) => {
            return Err(ResolveError::AmbiguousDestination {
                flag: flag.clone(),
                arg: arg.clone(),
            });
        }
        (Some(dest), None) | (None, Some(dest)) => Some(dest.as_path()),
        (None, None) => None,
    };

    let representation = request
        .representation
        .or_else(|| given_destination.and_then(representation_for_suffix))
        .or_else(|| {
            request
                .serving
                .then(|| request.preferred_view.as_deref())
                .flatten()
                .and_then(Representation::from_view_hint)
        })
        .unwrap_or_else(|| {
            if request.serving || given_destination.is_some_and(has_html_suffix) {
                Representation::Timeline
            } else {
                Representation::Json
            }
        });

    if request.serving && representation == Representation::Json {
        return Err(ResolveError::JsonNotServable);
    }

    let destination = given_destination
        .map(Path::to_path_buf)
        .unwrap_or_else(|| representation.default_destination());

    Ok(OutputSpec {
        representation,
        destination,
        serving: request.serving,
    })
}

fn lowercase_name(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}

fn representation_for_suffix(path: &Path) -> Option<Representation> {
    let name = lowercase_name(path);
    SUFFIX_RULES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|(_, representation)| *representation)
}

fn has_html_suffix(path: &Path) -> bool {
    let name = lowercase_name(path);
    HTML_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
