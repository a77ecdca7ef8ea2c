// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! End-to-end live sync: watcher to push server to sync channel to session.

use std::env;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::StreamExt;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite;

use galatea::editor::{Editor, OpOutcome};
use galatea::model::{NoPickerHost, SessionState, SyncMessage};
use galatea::server::{RunningServer, ServerConfig, SyncMode};
use galatea::store::PrefsStore;
use galatea::sync::{Dispatch, DocumentFetcher, SyncChannel};

const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);
const TEST_POLL_INTERVAL: Duration = Duration::from_millis(25);

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("galatea-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

struct SyncTestCtx {
    tmp: TempDir,
    server: RunningServer,
    editor: Arc<Editor>,
    channel: SyncChannel,
}

async fn ctx(prefix: &str, mode: SyncMode) -> SyncTestCtx {
    let tmp = TempDir::new(prefix);
    let design_dir = tmp.path().join("design");
    fs::create_dir_all(&design_dir).unwrap();
    fs::write(design_dir.join("design.html"), "<h1>v1</h1>").unwrap();

    let server = RunningServer::bind(
        ServerConfig::new(tmp.path())
            .with_port(0)
            .with_mode(mode)
            .with_poll_interval(TEST_POLL_INTERVAL),
    )
    .await
    .unwrap();

    // Let the watcher take its baseline scan before the tests start mutating files.
    tokio::time::sleep(4 * TEST_POLL_INTERVAL).await;

    let prefs = PrefsStore::new(tmp.path().join("state").join("galatea-prefs.json"));
    prefs.record("design.html").unwrap();

    let editor = Arc::new(
        Editor::new(Arc::new(NoPickerHost), prefs)
            .with_fetcher(DocumentFetcher::new(server.http_base())),
    );
    let channel = SyncChannel::new(editor.clone());

    SyncTestCtx {
        tmp,
        server,
        editor,
        channel,
    }
}

/// Reads push frames until one decodes as a `SyncMessage`.
async fn next_push(
    stream: &mut (impl futures::Stream<Item = Result<tungstenite::Message, tungstenite::Error>>
              + Unpin),
) -> SyncMessage {
    timeout(SETTLE_TIMEOUT, async {
        loop {
            let frame = stream.next().await.expect("push stream ended").unwrap();
            if let tungstenite::Message::Text(text) = frame {
                return serde_json::from_str(&text).expect("push frames are sync messages");
            }
        }
    })
    .await
    .expect("no push arrived in time")
}

#[tokio::test]
async fn startup_settles_an_unbound_session_from_the_server() {
    let ctx = ctx("startup", SyncMode::Partial).await;

    assert_eq!(ctx.editor.initialize().await, OpOutcome::Done);

    let session = ctx.editor.session().lock().await;
    assert_eq!(session.state(), SessionState::UnboundClean);
    assert_eq!(session.content(), "<h1>v1</h1>");
    drop(session);

    ctx.server.shutdown();
}

#[tokio::test]
async fn partial_mode_pushes_a_changed_document_into_unbound_sessions() {
    let ctx = ctx("partial", SyncMode::Partial).await;
    ctx.editor.initialize().await;

    let (mut stream, _response) = connect_async(ctx.server.ws_url()).await.unwrap();

    fs::write(
        ctx.tmp.path().join("design").join("design.html"),
        "<h1>v2</h1>",
    )
    .unwrap();

    let message = next_push(&mut stream).await;
    assert_eq!(
        message,
        SyncMessage::Partial {
            file_name: "design.html".to_owned()
        }
    );

    let outcome = ctx.channel.dispatch(message).await;
    assert_eq!(
        outcome,
        Dispatch::Applied {
            file_name: "design.html".to_owned()
        }
    );

    let session = ctx.editor.session().lock().await;
    assert_eq!(session.state(), SessionState::UnboundClean);
    assert_eq!(session.content(), "<h1>v2</h1>");
    drop(session);

    ctx.server.shutdown();
}

#[tokio::test]
async fn fetch_falls_back_to_the_server_root() {
    let ctx = ctx("fallback", SyncMode::Partial).await;
    fs::write(ctx.tmp.path().join("landing.html"), "<p>root-level</p>").unwrap();

    let fetcher = DocumentFetcher::new(ctx.server.http_base());
    assert_eq!(
        fetcher.fetch("landing.html").await.as_deref(),
        Some("<p>root-level</p>")
    );
    assert_eq!(fetcher.fetch("missing.html").await, None);

    // Non-document names are refused by the server even when such a file exists.
    fs::write(ctx.tmp.path().join("style.css"), "body {}").unwrap();
    assert_eq!(fetcher.fetch("style.css").await, None);

    ctx.server.shutdown();
}

#[tokio::test]
async fn full_reload_mode_discards_session_state_and_resettles() {
    let ctx = ctx("full-reload", SyncMode::FullReload).await;

    // A bound, dirty session; the reload push must not care.
    let design_path = ctx.tmp.path().join("design").join("design.html");
    let capability = galatea::store::DiskCapability::new(&design_path).unwrap();
    ctx.editor.open_with(Arc::new(capability)).await.unwrap();
    ctx.editor.sync_surface("<h1>edited</h1>".to_owned()).await;
    ctx.editor.session().lock().await.mark_dirty();

    let (mut stream, _response) = connect_async(ctx.server.ws_url()).await.unwrap();

    fs::write(&design_path, "<h1>v2</h1>").unwrap();

    let message = next_push(&mut stream).await;
    assert_eq!(message, SyncMessage::FullReload);

    let outcome = ctx.channel.dispatch(message).await;
    assert_eq!(outcome, Dispatch::FullReload);

    // Re-initialized from scratch: unbound, and settled against the server again.
    let session = ctx.editor.session().lock().await;
    assert_eq!(session.state(), SessionState::UnboundClean);
    assert!(session.binding().is_none());
    assert_eq!(session.content(), "<h1>v2</h1>");
    assert_eq!(session.last_known_file_name(), Some("design.html"));
    drop(session);

    ctx.server.shutdown();
}
