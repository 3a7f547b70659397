//! Reading source files into documents.

use std::path::Path;

use crate::document::TimelineDocument;
use crate::error::{MwError, MwResult};
use crate::parse::parse;

/// A freshly read source file and the document parsed from it.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub document: TimelineDocument,
    pub raw_text: String,
}

impl LoadedSource {
    pub fn from_text(raw_text: String) -> Self {
        LoadedSource {
            document: parse(&raw_text),
            raw_text,
        }
    }
}

/// Read and parse `path`. Nothing is cached; call again to pick up changes.
pub fn load(path: &Path) -> MwResult<LoadedSource> {
    let raw_text = std::fs::read_to_string(path).map_err(|source| MwError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(LoadedSource::from_text(raw_text))
}
