// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Client side of live sync: document fetches and the push channel.

pub mod channel;
pub mod fetch;

pub use channel::{ChannelError, Dispatch, SyncChannel};
pub use fetch::DocumentFetcher;
