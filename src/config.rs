//! mw configuration.
//!
//! Settings come from built-in defaults, then `~/.config/mw/config.toml`
//! (optional), then `MW_*` environment variables. Serve ports have their
//! own precedence on top of that: `PORT`/`SOCKET_PORT` beat the command
//! line flags, which beat the settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use mw_core::Templates;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SOCKET_PORT: u16 = 3001;
const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 50;

pub const PORT_ENV: &str = "PORT";
pub const SOCKET_PORT_ENV: &str = "SOCKET_PORT";

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_socket_port() -> u16 {
    DEFAULT_SOCKET_PORT
}

fn default_watch_debounce_ms() -> u64 {
    DEFAULT_WATCH_DEBOUNCE_MS
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Directory holding timeline.html, calendar.html and resume.html.
    /// Unset means the views built into mw.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_socket_port")]
    pub socket_port: u16,

    /// How long to wait for a burst of file changes to settle
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("mw").join("config.toml"))
    }

    pub fn templates(&self) -> Templates {
        Templates::from_dir(self.template_dir.clone())
    }

    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::build(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(Some(path))
            .with_context(|| format!("Failed to load config from {}", path.display()))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path.to_path_buf()).required(false));
        }

        let settings = builder
            .add_source(Environment::with_prefix("MW").try_parsing(true))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}

/// The two listener ports of a live preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ports {
    pub http: u16,
    pub socket: u16,
}

impl Ports {
    /// Resolve ports from the process environment, flags and settings.
    pub fn from_env(flag: Option<u16>, socket_flag: Option<u16>, settings: &Settings) -> Result<Self> {
        Self::resolve(
            std::env::var(PORT_ENV).ok().as_deref(),
            std::env::var(SOCKET_PORT_ENV).ok().as_deref(),
            flag,
            socket_flag,
            settings,
        )
    }

    pub fn resolve(
        env_port: Option<&str>,
        env_socket_port: Option<&str>,
        flag: Option<u16>,
        socket_flag: Option<u16>,
        settings: &Settings,
    ) -> Result<Self> {
        Ok(Ports {
            http: pick_port(PORT_ENV, env_port, flag, settings.port)?,
            socket: pick_port(SOCKET_PORT_ENV, env_socket_port, socket_flag, settings.socket_port)?,
        })
    }
}

fn pick_port(name: &str, env: Option<&str>, flag: Option<u16>, configured: u16) -> Result<u16> {
    match env.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} must be a port number, got '{}'", name, value)),
        None => Ok(flag.unwrap_or(configured)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            template_dir: None,
            port: 4000,
            socket_port: 4001,
            watch_debounce_ms: DEFAULT_WATCH_DEBOUNCE_MS,
        }
    }

    #[test]
    fn env_beats_flag() {
        let ports = Ports::resolve(Some("8080"), Some("8081"), Some(9000), Some(9001), &settings())
            .unwrap();
        assert_eq!(ports, Ports { http: 8080, socket: 8081 });
    }

    #[test]
    fn flag_beats_settings() {
        let ports = Ports::resolve(None, None, Some(9000), None, &settings()).unwrap();
        assert_eq!(ports, Ports { http: 9000, socket: 4001 });
    }

    #[test]
    fn blank_env_is_ignored() {
        let ports = Ports::resolve(Some(""), Some("  "), None, None, &settings()).unwrap();
        assert_eq!(ports, Ports { http: 4000, socket: 4001 });
    }

    #[test]
    fn invalid_env_port_is_an_error() {
        let err = Ports::resolve(Some("http"), None, None, None, &settings()).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn missing_config_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.socket_port, DEFAULT_SOCKET_PORT);
        assert_eq!(settings.templates(), Templates::Builtin);
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "template_dir = \"/srv/views\"\nport = 8000\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();

        assert_eq!(settings.templates(), Templates::Dir(PathBuf::from("/srv/views")));
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.socket_port, DEFAULT_SOCKET_PORT);
    }
}
