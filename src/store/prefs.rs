// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The durable last-opened-file slot.
//!
//! One key-value slot persisted across process restarts: the name of the last file ever bound.
//! It is the hint that lets an unbound session re-establish live sync. Written on every
//! successful bind, read at startup and on every unbound reload, never cleared by normal
//! operation.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::disk::{write_atomic, WriteDurability};

const PREFS_FILENAME: &str = "galatea-prefs.json";

#[derive(Debug)]
pub enum PrefsError {
    Io {
        path: PathBuf,
        source: io::Error,
    },
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "io error at {path:?}: {source}"),
            Self::Json { path, source } => write!(f, "json error at {path:?}: {source}"),
        }
    }
}

impl std::error::Error for PrefsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(rename = "lastOpenedFile", default, skip_serializing_if = "Option::is_none")]
    last_opened_file: Option<String>,
}

/// Reads and writes the preference slot at a fixed path.
#[derive(Debug, Clone)]
pub struct PrefsStore {
    path: PathBuf,
    durability: WriteDurability,
}

impl PrefsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            durability: WriteDurability::default(),
        }
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    /// The per-user default location. `None` when the platform exposes no data directory.
    pub fn in_user_data_dir() -> Option<Self> {
        let dir = dirs::data_dir()?;
        Some(Self::new(dir.join("galatea").join(PREFS_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The durable hint, or `None` when the slot is absent or unreadable.
    ///
    /// The slot is advisory; a corrupt or missing file degrades to "no hint" rather than an
    /// error.
    pub fn last_opened_file(&self) -> Option<String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                debug!(path = ?self.path, error = %err, "preference slot unreadable");
                return None;
            }
        };
        match serde_json::from_str::<PrefsFile>(&raw) {
            Ok(prefs) => prefs.last_opened_file,
            Err(err) => {
                debug!(path = ?self.path, error = %err, "preference slot corrupt");
                None
            }
        }
    }

    /// Records `file_name` as the last opened file.
    pub fn record(&self, file_name: &str) -> Result<(), PrefsError> {
        let prefs = PrefsFile {
            last_opened_file: Some(file_name.to_owned()),
        };
        let raw = serde_json::to_string_pretty(&prefs).map_err(|source| PrefsError::Json {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, format!("{raw}\n").as_bytes(), self.durability).map_err(
            |source| PrefsError::Io {
                path: self.path.clone(),
                source,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::PrefsStore;
    use crate::testutil::TempDir;

    struct PrefsTestCtx {
        _tmp: TempDir,
        store: PrefsStore,
    }

    #[fixture]
    fn ctx() -> PrefsTestCtx {
        let tmp = TempDir::new("prefs");
        let store = PrefsStore::new(tmp.path().join("state").join("galatea-prefs.json"));
        PrefsTestCtx { _tmp: tmp, store }
    }

    #[rstest]
    fn missing_slot_reads_as_no_hint(ctx: PrefsTestCtx) {
        assert_eq!(ctx.store.last_opened_file(), None);
    }

    #[rstest]
    fn record_then_read_round_trips(ctx: PrefsTestCtx) {
        ctx.store.record("design.html").unwrap();
        assert_eq!(
            ctx.store.last_opened_file(),
            Some("design.html".to_owned())
        );

        ctx.store.record("landing.html").unwrap();
        assert_eq!(
            ctx.store.last_opened_file(),
            Some("landing.html".to_owned())
        );
    }

    #[rstest]
    fn slot_uses_the_wire_key(ctx: PrefsTestCtx) {
        ctx.store.record("design.html").unwrap();
        let raw = std::fs::read_to_string(ctx.store.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["lastOpenedFile"].as_str(), Some("design.html"));
    }

    #[rstest]
    fn corrupt_slot_degrades_to_no_hint(ctx: PrefsTestCtx) {
        std::fs::create_dir_all(ctx.store.path().parent().unwrap()).unwrap();
        std::fs::write(ctx.store.path(), "{not json").unwrap();
        assert_eq!(ctx.store.last_opened_file(), None);
    }
}
