use std::path::Path;

use anyhow::{Context, Result};
use mw_core::template::render_view;
use mw_core::{
    LoadedSource, MwResult, OutputRequest, RenderState, Representation, Templates, load, resolve,
};
use owo_colors::OwoColorize;

use crate::config::Settings;

/// One-shot render: resolve the output, read the input, write one file.
pub fn run(input: &Path, request: &OutputRequest, settings: &Settings) -> Result<()> {
    // Reject bad output combinations before touching any file
    let target = resolve(request)?;

    let source =
        load(input).with_context(|| format!("Failed to read input file {}", input.display()))?;

    let output = render(&source, target.representation, &settings.templates())?;

    std::fs::write(&target.destination, output)
        .with_context(|| format!("Failed to write {}", target.destination.display()))?;

    tracing::debug!(representation = %target.representation, "rendered");
    println!("{} {}", "Wrote".green(), target.destination.display());

    Ok(())
}

/// Produce the full output text for `representation` in memory.
pub fn render(
    source: &LoadedSource,
    representation: Representation,
    templates: &Templates,
) -> MwResult<String> {
    match representation {
        Representation::Json => Ok(serde_json::to_string(&source.document)?),
        view => {
            let state = RenderState::build(&source.document, &source.raw_text);
            render_view(templates, view, &state, "")
        }
    }
}
