use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use mw_core::{OutputRequest, load, resolve};

use crate::config::{Ports, Settings};
use crate::server::{self, AppState};

/// Start the live preview for `input`.
pub async fn run(
    input: PathBuf,
    request: OutputRequest,
    ports: Ports,
    settings: &Settings,
) -> Result<()> {
    // json has no interactive view; refuse before binding anything
    resolve(&request)?;

    load(&input).with_context(|| format!("Failed to read input file {}", input.display()))?;

    let state = AppState::new(
        input,
        settings.templates(),
        request,
        ports.socket,
        Duration::from_millis(settings.watch_debounce_ms),
    );

    server::serve(state, ports).await
}
