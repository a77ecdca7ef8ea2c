// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The dev server: file watching plus push fan-out.

pub mod push;
pub mod watcher;

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use push::{RunningServer, ServerError};
pub use watcher::{WatchError, WatchEvent};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Which push behavior a deployment emits.
///
/// Mutually exclusive; a deployment picks one at startup, never per message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Per-file change notifications that sessions merge quietly.
    #[default]
    Partial,
    /// Any change tells every client to discard its state and reload from scratch.
    FullReload,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    root: PathBuf,
    port: u16,
    mode: SyncMode,
    poll_interval: Duration,
}

impl ServerConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            port: DEFAULT_PORT,
            mode: SyncMode::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Port 0 binds an ephemeral port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
