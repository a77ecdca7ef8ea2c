// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! The document session state machine, the capability seam it binds against, and the push
//! protocol's wire messages.

pub mod capability;
pub mod message;
pub mod session;

pub use capability::{
    CapabilityError, CapabilityHost, FileCapability, NoPickerHost, PickOutcome, TypeFilter,
};
pub use message::SyncMessage;
pub use session::{Binding, DocumentSession, RemoteSyncOutcome, SessionState};
