use std::path::Path;

use anyhow::{Context, Result};
use mw_core::ics;
use owo_colors::OwoColorize;

/// Convert a calendar file to a sibling native timeline file.
pub fn run(input: &Path) -> Result<()> {
    let written = ics::convert_file(input)
        .with_context(|| format!("Failed to convert {}", input.display()))?;

    tracing::debug!(input = %input.display(), output = %written.display(), "converted calendar");
    println!("{} {}", "Converted".green(), written.display());

    Ok(())
}
