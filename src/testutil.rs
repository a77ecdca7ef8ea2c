// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Shared helpers for unit tests: scratch directories and scripted capability doubles.

use std::collections::VecDeque;
use std::env;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::model::{CapabilityError, CapabilityHost, FileCapability, PickOutcome, TypeFilter};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub(crate) struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    pub(crate) fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("galatea-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    pub(crate) fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// In-memory file capability.
///
/// Optionally gated so a test can hold a write in flight while it mutates the session, and
/// optionally made to deny access like a host revocation would.
pub(crate) struct MemoryCapability {
    name: String,
    content: Mutex<String>,
    deny_access: AtomicBool,
    write_gate: Option<Arc<Semaphore>>,
}

impl MemoryCapability {
    pub(crate) fn new(name: &str, content: &str) -> Self {
        Self {
            name: name.to_owned(),
            content: Mutex::new(content.to_owned()),
            deny_access: AtomicBool::new(false),
            write_gate: None,
        }
    }

    /// A capability whose writes block until the returned semaphore receives a permit.
    pub(crate) fn gated(name: &str, content: &str) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let mut capability = Self::new(name, content);
        capability.write_gate = Some(gate.clone());
        (capability, gate)
    }

    pub(crate) fn deny_access(&self) {
        self.deny_access.store(true, Ordering::Relaxed);
    }

    pub(crate) fn stored(&self) -> String {
        self.content.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileCapability for MemoryCapability {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read(&self) -> Result<String, CapabilityError> {
        if self.deny_access.load(Ordering::Relaxed) {
            return Err(CapabilityError::AccessDenied {
                name: self.name.clone(),
            });
        }
        Ok(self.content.lock().unwrap().clone())
    }

    async fn write(&self, content: &str) -> Result<(), CapabilityError> {
        if let Some(gate) = self.write_gate.as_ref() {
            gate.acquire().await.unwrap().forget();
        }
        if self.deny_access.load(Ordering::Relaxed) {
            return Err(CapabilityError::AccessDenied {
                name: self.name.clone(),
            });
        }
        *self.content.lock().unwrap() = content.to_owned();
        Ok(())
    }
}

/// Host whose picker interactions are scripted up front.
#[derive(Default)]
pub(crate) struct ScriptedHost {
    read_picks: Mutex<VecDeque<PickOutcome>>,
    write_picks: Mutex<VecDeque<PickOutcome>>,
    last_suggested_name: Mutex<Option<String>>,
}

impl ScriptedHost {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_read(&self, outcome: PickOutcome) {
        self.read_picks.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn push_write(&self, outcome: PickOutcome) {
        self.write_picks.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn last_suggested_name(&self) -> Option<String> {
        self.last_suggested_name.lock().unwrap().clone()
    }
}

#[async_trait]
impl CapabilityHost for ScriptedHost {
    async fn acquire_for_read(
        &self,
        _filter: &TypeFilter,
    ) -> Result<PickOutcome, CapabilityError> {
        Ok(self
            .read_picks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PickOutcome::Cancelled))
    }

    async fn acquire_for_write(
        &self,
        suggested_name: &str,
        _filter: &TypeFilter,
    ) -> Result<PickOutcome, CapabilityError> {
        *self.last_suggested_name.lock().unwrap() = Some(suggested_name.to_owned());
        Ok(self
            .write_picks
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(PickOutcome::Cancelled))
    }
}
