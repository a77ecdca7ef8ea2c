// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Document fetches against the dev server.
//!
//! A fetch tries the conventional design subdirectory first, then the server root; the first 2xx
//! wins. Anything else, including transport failures and timeouts, is a soft miss: the sync is
//! skipped and retried on the next watcher signal.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(4);

/// Conventional subdirectory design documents live in.
pub(crate) const DESIGN_SUBDIR: &str = "design";

#[derive(Debug, Clone)]
pub struct DocumentFetcher {
    base: String,
    client: reqwest::Client,
}

impl DocumentFetcher {
    /// `base` is the dev server origin, e.g. `http://127.0.0.1:8787`.
    pub fn new(base: impl Into<String>) -> Self {
        Self::with_timeout(base, DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(base: impl Into<String>, timeout: Duration) -> Self {
        let base = base.into().trim_end_matches('/').to_owned();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static configuration");
        Self { base, client }
    }

    /// Fetches `file_name`, or `None` on a soft miss.
    pub async fn fetch(&self, file_name: &str) -> Option<String> {
        let buster = cache_buster();
        let candidates = [
            format!("{}/{DESIGN_SUBDIR}/{file_name}?t={buster}", self.base),
            format!("{}/{file_name}?t={buster}", self.base),
        ];

        for url in candidates {
            match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.text().await {
                        Ok(text) => return Some(text),
                        Err(err) => {
                            debug!(%url, error = %err, "fetch body unreadable");
                        }
                    }
                }
                Ok(response) => {
                    debug!(%url, status = %response.status(), "fetch miss");
                }
                Err(err) => {
                    debug!(%url, error = %err, "fetch transport error");
                }
            }
        }

        debug!(file = file_name, "sync skipped; retrying on the next watcher signal");
        None
    }
}

/// Millisecond timestamp appended as `?t=` so intermediaries never serve a stale body.
fn cache_buster() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}
