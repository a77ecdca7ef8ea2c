// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The push channel (client side).
//!
//! A persistent WebSocket subscription to the dev server. Delivery is at-most-once and
//! best-effort; the channel implements no retry or backoff of its own, and reconnection after a
//! transport drop belongs to the embedder.

use std::fmt;
use std::sync::Arc;

use futures::StreamExt;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;
use tracing::debug;

use crate::editor::Editor;
use crate::model::{RemoteSyncOutcome, SyncMessage};

#[derive(Debug)]
pub enum ChannelError {
    Connect {
        url: String,
        source: tungstenite::Error,
    },
    Transport {
        source: tungstenite::Error,
    },
}

impl fmt::Display for ChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect { url, source } => write!(f, "cannot connect to {url}: {source}"),
            Self::Transport { source } => write!(f, "sync channel dropped: {source}"),
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } => Some(source),
            Self::Transport { source } => Some(source),
        }
    }
}

/// What one delivered message caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Content fetched and merged quietly.
    Applied { file_name: String },
    /// The session holds a local binding; the push was ignored.
    BindingPrecedence { file_name: String },
    /// The push names a file this session does not track.
    ForeignFile { file_name: String },
    /// The fetch soft-missed; the next watcher signal retries.
    FetchMissed { file_name: String },
    /// All in-memory state was discarded and the session re-initialized.
    FullReload,
}

/// Subscribes an editor to a dev server's pushes.
pub struct SyncChannel {
    editor: Arc<Editor>,
}

impl SyncChannel {
    pub fn new(editor: Arc<Editor>) -> Self {
        Self { editor }
    }

    /// Applies one push message to the session.
    pub async fn dispatch(&self, message: SyncMessage) -> Dispatch {
        match message {
            SyncMessage::Partial { file_name } => self.dispatch_partial(file_name).await,
            SyncMessage::FullReload => {
                let outcome = self.editor.full_reload().await;
                debug!(?outcome, "full reload settled");
                Dispatch::FullReload
            }
        }
    }

    async fn dispatch_partial(&self, file_name: String) -> Dispatch {
        // The fetch happens outside the lock; bound-ness is decided again when the result is
        // offered to the session, so an open completing mid-fetch still wins.
        {
            let session = self.editor.session().lock().await;
            if session.binding().is_some() {
                debug!(file = %file_name, "push ignored; binding precedence");
                return Dispatch::BindingPrecedence { file_name };
            }
            if session.last_known_file_name() != Some(file_name.as_str()) {
                debug!(file = %file_name, "push for an untracked file ignored");
                return Dispatch::ForeignFile { file_name };
            }
        }

        let Some(fetcher) = self.editor.fetcher() else {
            debug!(file = %file_name, "no fetcher configured; push skipped");
            return Dispatch::FetchMissed { file_name };
        };
        let Some(content) = fetcher.fetch(&file_name).await else {
            return Dispatch::FetchMissed { file_name };
        };

        match self.editor.apply_remote(&file_name, content).await {
            RemoteSyncOutcome::Applied => Dispatch::Applied { file_name },
            RemoteSyncOutcome::IgnoredBound => Dispatch::BindingPrecedence { file_name },
            RemoteSyncOutcome::IgnoredForeign => Dispatch::ForeignFile { file_name },
        }
    }

    /// Connects to `url` and pumps frames until the transport drops.
    pub async fn run(&self, url: &str) -> Result<(), ChannelError> {
        let (mut stream, _response) =
            connect_async(url)
                .await
                .map_err(|source| ChannelError::Connect {
                    url: url.to_owned(),
                    source,
                })?;
        debug!(%url, "sync channel connected");

        while let Some(frame) = stream.next().await {
            let frame = frame.map_err(|source| ChannelError::Transport { source })?;
            let text = match frame {
                tungstenite::Message::Text(text) => text,
                tungstenite::Message::Close(_) => break,
                // Pings and pongs are the transport's business.
                _ => continue,
            };
            let message: SyncMessage = match serde_json::from_str(&text) {
                Ok(message) => message,
                Err(err) => {
                    debug!(error = %err, "skipping malformed sync frame");
                    continue;
                }
            };
            let outcome = self.dispatch(message).await;
            debug!(?outcome, "sync frame dispatched");
        }

        debug!(%url, "sync channel closed");
        Ok(())
    }
}
