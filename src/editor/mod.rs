// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Orchestration of session operations.
//!
//! All operations run on one logical thread: synchronous portions execute under the session
//! lock, the lock is released at every I/O boundary (file read/write, network fetch, picker
//! interaction), and state is re-validated after resume. A save that completes after the user
//! opened a different file must not touch the new binding.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::model::{
    CapabilityError, CapabilityHost, DocumentSession, FileCapability, PickOutcome,
    RemoteSyncOutcome, TypeFilter,
};
use crate::observe::{ChangeDetector, DirtyEdge};
use crate::store::PrefsStore;
use crate::sync::DocumentFetcher;

/// Save-as suggestion when no file was ever bound.
pub const DEFAULT_SUGGESTED_NAME: &str = "design.html";

/// What an operation did. Cancellations and no-ops are outcomes, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpOutcome {
    Done,
    /// The user dismissed the picker; no session state was touched.
    Cancelled,
    /// Save or reload invoked with nothing to act on.
    NotBound,
    /// The binding changed while the operation was suspended at an I/O boundary; nothing was
    /// applied to the session.
    Superseded,
    /// An unbound sync was skipped (no hint, no fetcher, or a soft fetch miss); it will be
    /// retried on the next watcher signal.
    SyncSkipped,
}

/// Owns the session and wires the gateway, detector, preference slot, and fetcher around it.
pub struct Editor {
    session: Arc<Mutex<DocumentSession>>,
    detector: Arc<ChangeDetector>,
    dirty_edges: Option<mpsc::UnboundedReceiver<DirtyEdge>>,
    host: Arc<dyn CapabilityHost>,
    prefs: PrefsStore,
    fetcher: Option<DocumentFetcher>,
    filter: TypeFilter,
}

impl Editor {
    /// A fresh editor; the session starts unbound, seeded with the durable hint when one exists.
    pub fn new(host: Arc<dyn CapabilityHost>, prefs: PrefsStore) -> Self {
        let mut detector = ChangeDetector::new();
        let dirty_edges = detector.take_events();
        let session = DocumentSession::with_last_known_file_name(prefs.last_opened_file());
        Self {
            session: Arc::new(Mutex::new(session)),
            detector: Arc::new(detector),
            dirty_edges,
            host,
            prefs,
            fetcher: None,
            filter: TypeFilter::html(),
        }
    }

    /// Enables unbound fetch-sync against a dev server.
    pub fn with_fetcher(mut self, fetcher: DocumentFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn session(&self) -> &Arc<Mutex<DocumentSession>> {
        &self.session
    }

    pub fn detector(&self) -> &Arc<ChangeDetector> {
        &self.detector
    }

    pub fn fetcher(&self) -> Option<&DocumentFetcher> {
        self.fetcher.as_ref()
    }

    /// Forwards dirty edges from the detector into the session. Call once; the stream is
    /// non-restartable.
    pub fn spawn_dirty_pump(&mut self) -> Option<JoinHandle<()>> {
        let mut events = self.dirty_edges.take()?;
        let session = self.session.clone();
        Some(tokio::spawn(async move {
            while events.recv().await.is_some() {
                session.lock().await.mark_dirty();
            }
        }))
    }

    /// Startup settling: an unbound session with a durable hint attempts one fetch-sync.
    pub async fn initialize(&self) -> OpOutcome {
        let wants_sync = {
            let session = self.session.lock().await;
            session.binding().is_none() && session.last_known_file_name().is_some()
        };
        if !wants_sync {
            return OpOutcome::SyncSkipped;
        }
        self.fetch_sync().await
    }

    /// Open: user-driven picker, then bind-and-load.
    pub async fn open(&self) -> Result<OpOutcome, CapabilityError> {
        let capability = match self.host.acquire_for_read(&self.filter).await? {
            PickOutcome::Picked(capability) => capability,
            PickOutcome::Cancelled => return Ok(OpOutcome::Cancelled),
        };
        self.open_with(capability).await
    }

    /// Binds an already-acquired capability and loads its content.
    pub async fn open_with(
        &self,
        capability: Arc<dyn FileCapability>,
    ) -> Result<OpOutcome, CapabilityError> {
        let content = capability.read().await?;
        {
            let _suspend = self.detector.suspend();
            let mut session = self.session.lock().await;
            session.bind_loaded(capability.clone(), content);
        }
        self.detector.mark_clean();
        self.record_hint(capability.name());
        Ok(OpOutcome::Done)
    }

    /// Save: writes the current content through the bound capability.
    ///
    /// A no-op when unbound. On failure the session stays dirty and the error is surfaced
    /// unchanged; retrying is safe.
    pub async fn save(&self) -> Result<OpOutcome, CapabilityError> {
        let (capability, generation, content) = {
            let session = self.session.lock().await;
            let Some(binding) = session.binding() else {
                return Ok(OpOutcome::NotBound);
            };
            (
                binding.capability().clone(),
                binding.generation(),
                session.content().to_owned(),
            )
        };

        capability.write(&content).await?;

        let mut session = self.session.lock().await;
        if session.note_saved(generation) {
            drop(session);
            self.detector.mark_clean();
            Ok(OpOutcome::Done)
        } else {
            debug!(
                file = capability.name(),
                "save completed against a superseded binding"
            );
            Ok(OpOutcome::Superseded)
        }
    }

    /// Save-as: user-driven save-target picker, then write-and-bind.
    pub async fn save_as(&self) -> Result<OpOutcome, CapabilityError> {
        let suggested = {
            let session = self.session.lock().await;
            session
                .last_known_file_name()
                .unwrap_or(DEFAULT_SUGGESTED_NAME)
                .to_owned()
        };
        let capability = match self
            .host
            .acquire_for_write(&suggested, &self.filter)
            .await?
        {
            PickOutcome::Picked(capability) => capability,
            PickOutcome::Cancelled => return Ok(OpOutcome::Cancelled),
        };
        self.save_as_with(capability).await
    }

    /// Writes the current in-memory content to a newly chosen capability and binds it.
    pub async fn save_as_with(
        &self,
        capability: Arc<dyn FileCapability>,
    ) -> Result<OpOutcome, CapabilityError> {
        let content = {
            let session = self.session.lock().await;
            session.content().to_owned()
        };

        capability.write(&content).await?;

        {
            let mut session = self.session.lock().await;
            session.bind_saved(capability.clone());
        }
        self.detector.mark_clean();
        self.record_hint(capability.name());
        Ok(OpOutcome::Done)
    }

    /// Reload: bound sessions re-read the capability, discarding in-memory edits; unbound
    /// sessions with a hint perform a remote fetch-sync instead.
    pub async fn reload(&self) -> Result<OpOutcome, CapabilityError> {
        let snapshot = {
            let session = self.session.lock().await;
            session
                .binding()
                .map(|binding| (binding.capability().clone(), binding.generation()))
        };

        let Some((capability, generation)) = snapshot else {
            return Ok(self.fetch_sync().await);
        };

        let content = capability.read().await?;

        let applied = {
            let _suspend = self.detector.suspend();
            let mut session = self.session.lock().await;
            session.replace_from_disk(generation, content)
        };
        if applied {
            self.detector.mark_clean();
            Ok(OpOutcome::Done)
        } else {
            debug!(
                file = capability.name(),
                "reload completed against a superseded binding"
            );
            Ok(OpOutcome::Superseded)
        }
    }

    /// Offers a server-pushed update to the session.
    pub async fn apply_remote(&self, file_name: &str, content: String) -> RemoteSyncOutcome {
        let outcome = {
            let _suspend = self.detector.suspend();
            let mut session = self.session.lock().await;
            session.apply_remote_sync(file_name, content)
        };
        match outcome {
            RemoteSyncOutcome::Applied => self.detector.mark_clean(),
            RemoteSyncOutcome::IgnoredBound => {
                debug!(file = file_name, "remote sync ignored; binding precedence");
            }
            RemoteSyncOutcome::IgnoredForeign => {
                debug!(file = file_name, "remote sync for an untracked file ignored");
            }
        }
        outcome
    }

    /// Full reload: discard all in-memory session state and settle again from the durable hint.
    pub async fn full_reload(&self) -> OpOutcome {
        let hint = self.prefs.last_opened_file();
        {
            let _suspend = self.detector.suspend();
            let mut session = self.session.lock().await;
            session.reset(hint);
        }
        self.detector.mark_clean();
        self.initialize().await
    }

    /// Mirrors the edited surface into the session so saves capture what the user sees.
    ///
    /// The dirty axis is untouched; that signal belongs to the change detector.
    pub async fn sync_surface(&self, content: String) {
        self.session.lock().await.set_content(content);
    }

    async fn fetch_sync(&self) -> OpOutcome {
        let Some(file_name) = self.prefs.last_opened_file() else {
            return OpOutcome::SyncSkipped;
        };
        let Some(fetcher) = self.fetcher.as_ref() else {
            return OpOutcome::SyncSkipped;
        };
        let Some(content) = fetcher.fetch(&file_name).await else {
            return OpOutcome::SyncSkipped;
        };
        match self.apply_remote(&file_name, content).await {
            RemoteSyncOutcome::Applied => OpOutcome::Done,
            RemoteSyncOutcome::IgnoredBound => OpOutcome::Superseded,
            RemoteSyncOutcome::IgnoredForeign => OpOutcome::SyncSkipped,
        }
    }

    /// The durable hint is advisory; losing it must not abort a successful bind.
    fn record_hint(&self, file_name: &str) {
        if let Err(err) = self.prefs.record(file_name) {
            warn!(error = %err, "preference slot not updated");
        }
    }
}
