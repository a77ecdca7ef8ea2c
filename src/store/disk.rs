// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Disk-backed file capabilities.
//!
//! A capability wraps exactly one path the host surface already resolved (picker dialog, CLI
//! argument, test fixture). Writes are staged to a temp file and renamed into place so a failure
//! midway leaves the previous content intact.

use std::fs;
use std::io;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::model::{CapabilityError, FileCapability};

/// Durability applied to capability writes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Fast, best-effort persistence.
    ///
    /// - Writes a temp file and renames atomically into place.
    /// - Does not perform per-file fsync/sync.
    #[default]
    BestEffort,

    /// Slower, best-effort durability.
    ///
    /// Attempts to flush written file contents to stable storage before the rename. Exact
    /// guarantees are platform/filesystem-dependent.
    Durable,
}

/// Read/write handle to one file on the local filesystem.
#[derive(Debug, Clone)]
pub struct DiskCapability {
    path: PathBuf,
    name: String,
    durability: WriteDurability,
}

impl DiskCapability {
    /// Wraps `path`. Fails when the path carries no file name to track.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, CapabilityError> {
        let path = path.into();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return Err(CapabilityError::Io {
                name: path.to_string_lossy().into_owned(),
                source: io::Error::other("path has no file name"),
            });
        };
        let name = name.to_owned();
        Ok(Self {
            path,
            name,
            durability: WriteDurability::default(),
        })
    }

    pub fn with_durability(mut self, durability: WriteDurability) -> Self {
        self.durability = durability;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FileCapability for DiskCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<String, CapabilityError> {
        fs::read_to_string(&self.path).map_err(|source| capability_error(&self.name, source))
    }

    async fn write(&self, content: &str) -> Result<(), CapabilityError> {
        write_atomic(&self.path, content.as_bytes(), self.durability)
            .map_err(|source| capability_error(&self.name, source))
    }
}

fn capability_error(name: &str, source: io::Error) -> CapabilityError {
    if source.kind() == io::ErrorKind::PermissionDenied {
        CapabilityError::AccessDenied {
            name: name.to_owned(),
        }
    } else {
        CapabilityError::Io {
            name: name.to_owned(),
            source,
        }
    }
}

/// Staged overwrite: temp file next to `path`, then an atomic rename into place.
pub(crate) fn write_atomic(
    path: &Path,
    contents: &[u8],
    durability: WriteDurability,
) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(io::Error::other("refusing to write through a symlink"));
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let Some(parent) = path.parent() else {
        return Err(io::Error::other("path has no parent"));
    };
    let Some(file_name) = path.file_name() else {
        return Err(io::Error::other("path has no file name"));
    };

    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent)?;
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let tmp_path = parent.join(format!(
        ".galatea.tmp.{}.{}",
        file_name.to_string_lossy(),
        nanos
    ));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)?;

    let staged = (|| -> io::Result<()> {
        file.write_all(contents)?;
        if durability == WriteDurability::Durable {
            file.sync_all()?;
        }
        Ok(())
    })();
    drop(file);

    if let Err(err) = staged {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err);
    }

    Ok(())
}
