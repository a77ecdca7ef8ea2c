// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The file-capability seam the session core binds against.
//!
//! A capability is an opaque, revocable handle to exactly one file, produced by the host's
//! selection surface after explicit user consent. The session never sees a path; disk-backed
//! implementations live in `store`.

use std::fmt;
use std::io;
use std::sync::Arc;

use async_trait::async_trait;

/// MIME type plus extension restriction a host picker applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFilter {
    mime: &'static str,
    extension: &'static str,
}

impl TypeFilter {
    /// The filter for HTML design documents.
    pub fn html() -> Self {
        Self {
            mime: "text/html",
            extension: ".html",
        }
    }

    pub fn mime(&self) -> &str {
        self.mime
    }

    pub fn extension(&self) -> &str {
        self.extension
    }

    pub fn matches(&self, file_name: &str) -> bool {
        let Some(stem) = file_name.strip_suffix(self.extension) else {
            return false;
        };
        !stem.is_empty()
    }
}

#[derive(Debug)]
pub enum CapabilityError {
    /// The host revoked (or never granted) access between acquisition and use.
    AccessDenied { name: String },
    Io { name: String, source: io::Error },
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied { name } => write!(f, "access to {name:?} denied by the host"),
            Self::Io { name, source } => write!(f, "io error on {name:?}: {source}"),
        }
    }
}

impl std::error::Error for CapabilityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AccessDenied { .. } => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Read/write access to one file.
///
/// `write` commits the full content as a single unit: a failure midway is never observable as
/// success, and the previous content survives it.
#[async_trait]
pub trait FileCapability: Send + Sync {
    /// Bare file name, used for sync matching and as the save-as suggestion.
    fn name(&self) -> &str;

    async fn read(&self) -> Result<String, CapabilityError>;

    async fn write(&self, content: &str) -> Result<(), CapabilityError>;
}

/// Result of a user-driven picker interaction.
///
/// Cancellation is an outcome, not an error; it must not alter any session state.
pub enum PickOutcome {
    Picked(Arc<dyn FileCapability>),
    Cancelled,
}

impl fmt::Debug for PickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Picked(capability) => f
                .debug_tuple("Picked")
                .field(&capability.name())
                .finish(),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// The host's file-selection surface.
#[async_trait]
pub trait CapabilityHost: Send + Sync {
    async fn acquire_for_read(&self, filter: &TypeFilter)
        -> Result<PickOutcome, CapabilityError>;

    /// `suggested_name` seeds the default name in the save dialog.
    async fn acquire_for_write(
        &self,
        suggested_name: &str,
        filter: &TypeFilter,
    ) -> Result<PickOutcome, CapabilityError>;
}

/// Host for embeddings without a selection surface (server-tracked sessions, headless tools).
///
/// Every acquisition resolves as cancelled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPickerHost;

#[async_trait]
impl CapabilityHost for NoPickerHost {
    async fn acquire_for_read(
        &self,
        _filter: &TypeFilter,
    ) -> Result<PickOutcome, CapabilityError> {
        Ok(PickOutcome::Cancelled)
    }

    async fn acquire_for_write(
        &self,
        _suggested_name: &str,
        _filter: &TypeFilter,
    ) -> Result<PickOutcome, CapabilityError> {
        Ok(PickOutcome::Cancelled)
    }
}
