//! Filesystem watcher feeding vault events to the preview loop.

use std::path::{Path, PathBuf};

use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use tokio::sync::mpsc;
use tracing::{trace, warn};

use crate::domain::event::VaultEvent;

use super::error::InfraError;

const EVENT_BUFFER: usize = 64;

/// Keeps the underlying watcher alive; events stop when it is dropped.
#[derive(Debug)]
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl VaultWatcher {
    /// Watch `root` recursively. Event paths are reported relative to it.
    pub fn spawn(root: &Path) -> Result<(Self, mpsc::Receiver<VaultEvent>), InfraError> {
        let root = std::fs::canonicalize(root)?;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let event_root = root.clone();
        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| match result {
                Ok(event) => {
                    for translated in translate(&event, &event_root) {
                        trace!(
                            target = "infra::watcher",
                            op = "event",
                            event = translated.kind(),
                            path = %translated.path(),
                            "vault event"
                        );
                        if tx.blocking_send(translated).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => warn!(
                    target = "infra::watcher",
                    op = "event",
                    result = "error",
                    error = %err,
                    "file watcher reported an error"
                ),
            },
            Config::default(),
        )
        .map_err(|err| InfraError::watch(format!("failed to create file watcher: {err}")))?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|err| {
                InfraError::watch(format!("failed to watch `{}`: {err}", root.display()))
            })?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Vault events described by one raw notification. Paths outside `root` are
/// dropped.
pub fn translate(event: &Event, root: &Path) -> Vec<VaultEvent> {
    let relative = |path: &PathBuf| relative_to(path, root);

    match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            match (event.paths.first(), event.paths.get(1)) {
                (Some(from), Some(to)) => match (relative(from), relative(to)) {
                    (Some(from), Some(to)) => vec![VaultEvent::Renamed { from, to }],
                    (Some(from), None) => vec![VaultEvent::Deleted(from)],
                    (None, Some(to)) => vec![VaultEvent::Modified(to)],
                    (None, None) => Vec::new(),
                },
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => event
            .paths
            .iter()
            .filter_map(relative)
            .map(VaultEvent::Deleted)
            .collect(),
        EventKind::Create(_) | EventKind::Modify(_) => event
            .paths
            .iter()
            .filter_map(relative)
            .map(VaultEvent::Modified)
            .collect(),
        _ => Vec::new(),
    }
}

fn relative_to(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let relative = relative.to_string_lossy().replace('\\', "/");
    (!relative.is_empty()).then_some(relative)
}
