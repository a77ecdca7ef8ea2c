// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Persistence: disk-backed file capabilities and the durable preference slot.

pub mod disk;
pub mod prefs;

pub use disk::{DiskCapability, WriteDurability};
pub use prefs::{PrefsError, PrefsStore};
