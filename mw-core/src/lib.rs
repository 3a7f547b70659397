//! Core types for mw.
//!
//! This crate holds everything the `mw` binary needs that does not touch
//! the network:
//! - `document` / `parse`: timeline documents and the native grammar reader
//! - `ics`: iCalendar to native grammar conversion
//! - `output`: resolving what to render and where
//! - `state` / `template`: render snapshots and HTML injection

pub mod date_range;
pub mod document;
pub mod error;
pub mod ics;
pub mod loader;
pub mod output;
pub mod parse;
pub mod state;
pub mod template;
pub mod tz;

pub use date_range::{DateRange, Granularity};
pub use document::{Event, Timeline, TimelineDocument};
pub use error::{MwError, MwResult, TemplateError};
pub use loader::{LoadedSource, load};
pub use output::{OutputRequest, OutputSpec, Representation, ResolveError, resolve};
pub use state::RenderState;
pub use template::Templates;
