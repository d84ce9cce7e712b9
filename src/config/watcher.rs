//! Configuration file watcher for hot reload.
//!
//! The parent directory is watched rather than the file itself, so editors
//! that save by writing a temporary file and renaming it over the original
//! still trigger a reload.

use std::path::{Path, PathBuf};
use std::time::Duration;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use crate::config::loader::load_config;
use crate::config::schema::DispatchConfig;

/// Sends every valid revision of one configuration file.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<DispatchConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<DispatchConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching in a background thread.
    ///
    /// Only configurations that load and validate are forwarded; the
    /// returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let directory = watched_directory(&path);
        let target = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &target) => reload(&target, &update_tx),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path, tx: &mpsc::UnboundedSender<DispatchConfig>) {
    tracing::info!(path = %path.display(), "Config file change detected, reloading");
    match load_config(path) {
        Ok(config) => {
            if tx.send(config).is_err() {
                tracing::debug!("Config update dropped, server no longer listening");
            }
        }
        Err(e) => tracing::error!(error = %e, "Failed to reload config, keeping current dispatch table"),
    }
}

fn watched_directory(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Whether `event` writes or replaces the file at `path`.
fn touches(event: &Event, path: &Path) -> bool {
    let relevant_kind = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
    let Some(name) = path.file_name() else {
        return false;
    };
    relevant_kind && event.paths.iter().any(|p| p.file_name() == Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_only_config_file_events_trigger() {
        let config = Path::new("/etc/dispatch/dispatch.toml");

        assert!(touches(&event(EventKind::Modify(ModifyKind::Any), "/etc/dispatch/dispatch.toml"), config));
        assert!(touches(&event(EventKind::Create(CreateKind::File), "/etc/dispatch/dispatch.toml"), config));
        assert!(!touches(&event(EventKind::Modify(ModifyKind::Any), "/etc/dispatch/index.json"), config));
        assert!(!touches(&event(EventKind::Remove(RemoveKind::File), "/etc/dispatch/dispatch.toml"), config));
    }

    #[test]
    fn test_bare_file_name_watches_working_directory() {
        assert_eq!(watched_directory(Path::new("dispatch.toml")), PathBuf::from("."));
        assert_eq!(watched_directory(Path::new("/etc/dispatch.toml")), PathBuf::from("/etc"));
    }
}
