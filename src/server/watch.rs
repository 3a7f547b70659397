//! Change notifications for the served source file
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by deleting and recreating the file keep producing events.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// One watch per subscriber. Dropping it stops the underlying watcher.
pub struct SourceWatch {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<()>,
    debounce: Duration,
}

impl SourceWatch {
    pub fn new(path: &Path, debounce: Duration) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .with_context(|| format!("{} is not a file path", path.display()))?;
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if touches(&event, &file_name) => {
                    // Receiver gone means the subscriber is shutting down
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("watch error: {}", e),
            }
        })?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch {}", dir.display()))?;

        Ok(SourceWatch {
            _watcher: watcher,
            rx,
            debounce,
        })
    }

    /// Wait for the next change. Cancel-safe, so it can sit in `select!`.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Let a burst of writes finish, then drop the changes it queued.
    pub async fn settle(&mut self) {
        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
        }
        while self.rx.try_recv().is_ok() {}
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    let relevant = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn write_produces_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mw");
        std::fs::write(&path, "2024-01-01: One\n").unwrap();
        let mut watch = SourceWatch::new(&path, Duration::from_millis(20)).unwrap();

        std::fs::write(&path, "2024-01-01: Two\n").unwrap();

        assert!(timeout(WAIT, watch.recv()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn recreated_file_is_still_watched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.mw");
        std::fs::write(&path, "2024-01-01: One\n").unwrap();
        let mut watch = SourceWatch::new(&path, Duration::from_millis(20)).unwrap();

        std::fs::remove_file(&path).unwrap();
        timeout(WAIT, watch.recv()).await.unwrap();
        watch.settle().await;

        std::fs::write(&path, "2024-01-01: Back\n").unwrap();
        assert!(timeout(WAIT, watch.recv()).await.unwrap().is_some());
    }

    #[test]
    fn only_the_source_file_counts() {
        let name = OsString::from("a.mw");
        let modify = |path: &str| {
            Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
                .add_path(PathBuf::from(path))
        };

        assert!(touches(&modify("/tmp/x/a.mw"), &name));
        assert!(!touches(&modify("/tmp/x/b.mw"), &name));
        assert!(!touches(
            &Event::new(EventKind::Access(notify::event::AccessKind::Any))
                .add_path(PathBuf::from("/tmp/x/a.mw")),
            &name
        ));
    }
}
