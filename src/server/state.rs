use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use mw_core::{
    LoadedSource, MwResult, OutputRequest, RenderState, Representation, ResolveError, Templates,
    TimelineDocument, load, resolve,
};

/// Shared application state
///
/// The source is re-read on every request and change event; only the
/// representation is fixed once it has been resolved.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    source: PathBuf,
    templates: Templates,
    request: OutputRequest,
    representation: OnceLock<Representation>,
    socket_url: String,
    watch_debounce: Duration,
    subscribers: AtomicUsize,
}

impl AppState {
    pub fn new(
        source: PathBuf,
        templates: Templates,
        request: OutputRequest,
        socket_port: u16,
        watch_debounce: Duration,
    ) -> Self {
        AppState {
            inner: Arc::new(Inner {
                source,
                templates,
                request,
                representation: OnceLock::new(),
                socket_url: format!("ws://localhost:{}", socket_port),
                watch_debounce,
                subscribers: AtomicUsize::new(0),
            }),
        }
    }

    pub fn source(&self) -> &Path {
        &self.inner.source
    }

    pub fn templates(&self) -> &Templates {
        &self.inner.templates
    }

    pub fn socket_url(&self) -> &str {
        &self.inner.socket_url
    }

    pub fn watch_debounce(&self) -> Duration {
        self.inner.watch_debounce
    }

    pub fn load(&self) -> MwResult<LoadedSource> {
        load(&self.inner.source)
    }

    /// The view served for the life of the process. The header's view hint
    /// is consulted the first time only, so the view never flips mid-session.
    pub fn representation(
        &self,
        document: &TimelineDocument,
    ) -> Result<Representation, ResolveError> {
        if let Some(representation) = self.inner.representation.get() {
            return Ok(*representation);
        }

        let request = self
            .inner
            .request
            .with_preferred_view(document.preferred_view());
        let resolved = resolve(&request)?.representation;

        Ok(*self.inner.representation.get_or_init(|| resolved))
    }

    /// Number of push-channel connections currently holding a watch.
    pub fn subscribers(&self) -> usize {
        self.inner.subscribers.load(Ordering::SeqCst)
    }

    /// Count a subscriber until the returned guard is dropped.
    pub fn subscribe(&self) -> Subscription {
        self.inner.subscribers.fetch_add(1, Ordering::SeqCst);
        Subscription {
            state: self.clone(),
        }
    }

    /// Message for push-channel subscribers, built from a fresh read.
    pub fn state_update(&self) -> MwResult<String> {
        let source = self.load()?;
        RenderState::build(&source.document, &source.raw_text).envelope()
    }
}

pub struct Subscription {
    state: AppState,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.state.inner.subscribers.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mw_core::parse::parse;

    fn state_for(path: PathBuf, request: OutputRequest) -> AppState {
        AppState::new(path, Templates::Builtin, request, 3001, Duration::ZERO)
    }

    fn serving() -> OutputRequest {
        OutputRequest {
            serving: true,
            ..Default::default()
        }
    }

    #[test]
    fn representation_is_resolved_once() {
        let state = state_for(PathBuf::from("a.mw"), serving());

        let first = state.representation(&parse("view: calendar\n")).unwrap();
        let second = state.representation(&parse("view: resume\n")).unwrap();

        assert_eq!(first, Representation::Calendar);
        assert_eq!(second, Representation::Calendar);
    }

    #[test]
    fn explicit_representation_ignores_header() {
        let request = OutputRequest {
            representation: Some(Representation::Resume),
            ..serving()
        };
        let state = state_for(PathBuf::from("a.mw"), request);

        assert_eq!(
            state.representation(&parse("view: calendar\n")).unwrap(),
            Representation::Resume
        );
    }

    #[test]
    fn socket_url_uses_socket_port() {
        let state = state_for(PathBuf::from("a.mw"), serving());
        assert_eq!(state.socket_url(), "ws://localhost:3001");
    }

    #[test]
    fn subscription_counts_until_dropped() {
        let state = state_for(PathBuf::from("a.mw"), serving());

        let first = state.subscribe();
        let second = state.clone().subscribe();
        assert_eq!(state.subscribers(), 2);

        drop(first);
        assert_eq!(state.subscribers(), 1);
        drop(second);
        assert_eq!(state.subscribers(), 0);
    }

    #[test]
    fn state_update_reads_latest_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mw");
        std::fs::write(&path, "2024-01-01: Before\n").unwrap();
        let state = state_for(path.clone(), serving());

        let before: serde_json::Value = serde_json::from_str(&state.state_update().unwrap()).unwrap();
        std::fs::write(&path, "2024-01-01: After\n").unwrap();
        let after: serde_json::Value = serde_json::from_str(&state.state_update().unwrap()).unwrap();

        assert_eq!(before["params"]["parsed"][0]["events"][0]["text"], "Before");
        assert_eq!(after["type"], "state");
        assert_eq!(after["params"]["parsed"][0]["events"][0]["text"], "After");
    }
}
