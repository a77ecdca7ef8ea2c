// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The document session state machine.
//!
//! One session exists per editing surface. It owns the current file binding, the dirty flag, and
//! the authoritative document content; every mutation goes through the transition methods here.
//! The session is the single reconciliation point for local edits and server-pushed changes.

use std::fmt;
use std::sync::Arc;

use super::capability::FileCapability;

/// Derived view of the binding/dirty axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    UnboundClean,
    UnboundDirty,
    BoundClean,
    BoundDirty,
}

/// The association between a session and one file capability.
///
/// The generation is allocated per bind and lets an operation that suspended at an I/O boundary
/// detect that the binding it snapshotted has since been replaced.
#[derive(Clone)]
pub struct Binding {
    capability: Arc<dyn FileCapability>,
    generation: u64,
}

impl Binding {
    pub fn capability(&self) -> &Arc<dyn FileCapability> {
        &self.capability
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn file_name(&self) -> &str {
        self.capability.name()
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("file_name", &self.file_name())
            .field("generation", &self.generation)
            .finish()
    }
}

/// Outcome of offering a server-pushed update to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteSyncOutcome {
    Applied,
    /// A local binding always takes precedence over remote pushes.
    IgnoredBound,
    /// The push names a file this session does not track.
    IgnoredForeign,
}

#[derive(Debug)]
pub struct DocumentSession {
    binding: Option<Binding>,
    last_known_file_name: Option<String>,
    dirty: bool,
    content: String,
    next_generation: u64,
}

impl DocumentSession {
    pub fn new() -> Self {
        Self::with_last_known_file_name(None)
    }

    /// A fresh session seeded with the durable last-opened-file hint, when one exists.
    ///
    /// The hint is what lets an unbound session match server pushes before any file was opened
    /// in this process.
    pub fn with_last_known_file_name(last_known_file_name: Option<String>) -> Self {
        Self {
            binding: None,
            last_known_file_name,
            dirty: false,
            content: String::new(),
            next_generation: 1,
        }
    }

    pub fn state(&self) -> SessionState {
        match (self.binding.is_some(), self.dirty) {
            (false, false) => SessionState::UnboundClean,
            (false, true) => SessionState::UnboundDirty,
            (true, false) => SessionState::BoundClean,
            (true, true) => SessionState::BoundDirty,
        }
    }

    pub fn binding(&self) -> Option<&Binding> {
        self.binding.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn last_known_file_name(&self) -> Option<&str> {
        self.last_known_file_name.as_deref()
    }

    fn bind(&mut self, capability: Arc<dyn FileCapability>) {
        self.last_known_file_name = Some(capability.name().to_owned());
        let generation = self.next_generation;
        self.next_generation += 1;
        self.binding = Some(Binding {
            capability,
            generation,
        });
    }

    /// Open: bind `capability` and replace the content wholesale with what was read from it.
    ///
    /// Valid from any state; lands `BoundClean`.
    pub fn bind_loaded(&mut self, capability: Arc<dyn FileCapability>, content: String) {
        self.bind(capability);
        self.content = content;
        self.dirty = false;
    }

    /// Save-as: bind `capability` around the current in-memory content.
    ///
    /// Valid from any state; lands `BoundClean` regardless of prior dirtiness. The caller has
    /// already written the content through the capability.
    pub fn bind_saved(&mut self, capability: Arc<dyn FileCapability>) {
        self.bind(capability);
        self.dirty = false;
    }

    /// Local edit signal from the change detector.
    ///
    /// Returns true when this call performed the clean-to-dirty edge; already-dirty sessions
    /// absorb the signal as a no-op.
    pub fn mark_dirty(&mut self) -> bool {
        if self.dirty {
            return false;
        }
        self.dirty = true;
        true
    }

    /// Mirror of the edited surface's content.
    ///
    /// The surface is edited in place and stays authoritative between clean transitions; glue
    /// calls this so saves capture what the user actually sees. The dirty axis is untouched,
    /// that signal belongs to the change detector.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }

    /// Save completion for the binding generation the save snapshotted.
    ///
    /// Returns false, leaving all state untouched, when the binding has since been replaced; the
    /// write landed on the old file and must not clear the new binding's dirty flag.
    pub fn note_saved(&mut self, generation: u64) -> bool {
        if !self.is_current_generation(generation) {
            return false;
        }
        self.dirty = false;
        true
    }

    /// Reload completion: replace content with what was re-read from the bound capability.
    ///
    /// Returns false, leaving all state untouched, when `generation` no longer names the current
    /// binding.
    pub fn replace_from_disk(&mut self, generation: u64, content: String) -> bool {
        if !self.is_current_generation(generation) {
            return false;
        }
        self.content = content;
        self.dirty = false;
        true
    }

    fn is_current_generation(&self, generation: u64) -> bool {
        self.binding
            .as_ref()
            .is_some_and(|binding| binding.generation == generation)
    }

    /// Server-pushed update. Applied iff the session is unbound and `file_name` is the tracked
    /// file; lands `UnboundClean`.
    ///
    /// Applying over `UnboundDirty` silently overwrites unsaved local edits: the server is
    /// authoritative while no binding exists, and the presentation layer documents that window
    /// as an explicit caveat.
    pub fn apply_remote_sync(&mut self, file_name: &str, content: String) -> RemoteSyncOutcome {
        if self.binding.is_some() {
            return RemoteSyncOutcome::IgnoredBound;
        }
        if self.last_known_file_name.as_deref() != Some(file_name) {
            return RemoteSyncOutcome::IgnoredForeign;
        }
        self.content = content;
        self.dirty = false;
        RemoteSyncOutcome::Applied
    }

    /// Full reload: discard every piece of in-memory state and start over.
    ///
    /// `hint` is the durable last-opened-file slot re-read by the caller; it survives the reset
    /// the way it survives a real page reload. Generations stay monotonic across resets so a
    /// stale completion can never match a post-reset binding.
    pub fn reset(&mut self, hint: Option<String>) {
        let next_generation = self.next_generation;
        *self = Self::with_last_known_file_name(hint);
        self.next_generation = next_generation;
    }
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::new()
    }
}
