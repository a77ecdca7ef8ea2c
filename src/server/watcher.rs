// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Debounced poll watching of the document tree.
//!
//! Content-compare polling at a tunable interval. Raw events are coalesced per file and emitted
//! once the file has been quiet for one poll interval.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// One settled change to a watched document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub file_name: String,
}

#[derive(Debug)]
pub enum WatchError {
    Watch {
        path: PathBuf,
        source: notify::Error,
    },
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watch { path, source } => write!(f, "cannot watch {path:?}: {source}"),
        }
    }
}

impl std::error::Error for WatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Watch { source, .. } => Some(source),
        }
    }
}

/// Keeps the poll thread alive for as long as the server runs.
#[derive(Debug)]
pub struct DocumentWatcher {
    _watcher: PollWatcher,
}

/// Starts polling `root` recursively and returns the settled-change stream.
pub fn watch_documents(
    root: &Path,
    poll_interval: Duration,
) -> Result<(DocumentWatcher, mpsc::UnboundedReceiver<WatchEvent>), WatchError> {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<PathBuf>();

    let config = Config::default()
        .with_poll_interval(poll_interval)
        .with_compare_contents(true);

    let mut watcher = PollWatcher::new(
        move |result: Result<Event, notify::Error>| match result {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    return;
                }
                for path in event.paths {
                    if is_watched_document(&path) {
                        let _ = raw_tx.send(path);
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "watcher event error");
            }
        },
        config,
    )
    .map_err(|source| WatchError::Watch {
        path: root.to_path_buf(),
        source,
    })?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|source| WatchError::Watch {
            path: root.to_path_buf(),
            source,
        })?;

    debug!(path = ?root, interval = ?poll_interval, "watching documents");

    let (settled_tx, settled_rx) = mpsc::unbounded_channel();
    tokio::spawn(debounce(raw_rx, settled_tx, poll_interval));

    Ok((DocumentWatcher { _watcher: watcher }, settled_rx))
}

fn is_watched_document(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("html"))
}

/// Coalesces raw per-path events; a file is emitted once it stayed quiet for `quiet`.
async fn debounce(
    mut raw: mpsc::UnboundedReceiver<PathBuf>,
    settled: mpsc::UnboundedSender<WatchEvent>,
    quiet: Duration,
) {
    let mut pending: HashMap<String, Instant> = HashMap::new();

    loop {
        let next_deadline = pending.values().min().copied();
        let sleep_target = next_deadline.unwrap_or_else(|| Instant::now() + quiet);

        tokio::select! {
            changed = raw.recv() => {
                let Some(path) = changed else { break };
                let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                    continue;
                };
                pending.insert(file_name.to_owned(), Instant::now() + quiet);
            }
            _ = tokio::time::sleep_until(sleep_target), if next_deadline.is_some() => {
                let now = Instant::now();
                let due: Vec<String> = pending
                    .iter()
                    .filter(|(_, deadline)| **deadline <= now)
                    .map(|(file_name, _)| file_name.clone())
                    .collect();
                for file_name in due {
                    pending.remove(&file_name);
                    debug!(file = %file_name, "document settled");
                    if settled.send(WatchEvent { file_name }).is_err() {
                        return;
                    }
                }
            }
        }
    }
}
