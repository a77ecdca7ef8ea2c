// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Push-protocol wire messages.

use serde::{Deserialize, Serialize};

/// Server-to-client push message.
///
/// A closed union: a deployment emits either partial messages or full reloads, never both.
/// Delivery is at-most-once and best-effort; there is no acknowledgement or replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SyncMessage {
    /// One watched file changed; sessions tracking `file_name` fetch it and merge quietly.
    Partial {
        #[serde(rename = "fileName")]
        file_name: String,
    },
    /// A watched file changed; every client discards its state and reloads from scratch.
    FullReload,
}

#[cfg(test)]
mod tests {
    use super::SyncMessage;

    #[test]
    fn partial_wire_shape() {
        let message = SyncMessage::Partial {
            file_name: "design.html".to_owned(),
        };
        let encoded = serde_json::to_string(&message).unwrap();
        assert_eq!(encoded, r#"{"kind":"partial","fileName":"design.html"}"#);
    }

    #[test]
    fn full_reload_wire_shape() {
        let encoded = serde_json::to_string(&SyncMessage::FullReload).unwrap();
        assert_eq!(encoded, r#"{"kind":"full-reload"}"#);
    }

    #[test]
    fn decodes_messages_from_the_wire() {
        let message: SyncMessage =
            serde_json::from_str(r#"{"kind":"partial","fileName":"landing.html"}"#).unwrap();
        assert_eq!(
            message,
            SyncMessage::Partial {
                file_name: "landing.html".to_owned()
            }
        );

        let message: SyncMessage = serde_json::from_str(r#"{"kind":"full-reload"}"#).unwrap();
        assert_eq!(message, SyncMessage::FullReload);
    }

    #[test]
    fn rejects_unknown_kinds() {
        serde_json::from_str::<SyncMessage>(r#"{"kind":"rebuild"}"#).unwrap_err();
    }
}
