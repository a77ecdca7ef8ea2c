// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Push fan-out and document serving.
//!
//! One publisher (the watcher pump), N subscribers (connected sync channels). Pushes are
//! broadcast as JSON text frames over `/sync`; missed pushes are never replayed. The same
//! server answers the fetch contract: `GET /design/{file}` then `GET /{file}`, raw document
//! text, `?t` ignored.

use std::fmt;
use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::watcher::watch_documents;
use super::{ServerConfig, SyncMode, WatchError};
use crate::model::SyncMessage;
use crate::sync::fetch::DESIGN_SUBDIR;

const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const PUSH_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug)]
pub enum ServerError {
    Bind { port: u16, source: io::Error },
    Watch(WatchError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { port, source } => {
                write!(f, "cannot bind 127.0.0.1:{port}: {source}")
            }
            Self::Watch(source) => write!(f, "{source}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Bind { source, .. } => Some(source),
            Self::Watch(source) => Some(source),
        }
    }
}

#[derive(Clone)]
struct AppState {
    root: PathBuf,
    push: broadcast::Sender<SyncMessage>,
}

/// A bound dev server. Dropping it (or calling [`RunningServer::shutdown`]) stops the watcher,
/// the pump, and the listener.
pub struct RunningServer {
    local_addr: SocketAddr,
    server: JoinHandle<()>,
    pump: JoinHandle<()>,
    _watcher: super::watcher::DocumentWatcher,
}

impl RunningServer {
    /// Binds `127.0.0.1:<port>`, starts watching, and begins pushing.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let (watcher, mut events) = watch_documents(config.root(), config.poll_interval())
            .map_err(ServerError::Watch)?;

        let (push, _) = broadcast::channel(PUSH_CHANNEL_CAPACITY);

        let state = AppState {
            root: config.root().to_path_buf(),
            push: push.clone(),
        };
        let router = Router::new()
            .route("/sync", get(sync_socket))
            .route(&format!("/{DESIGN_SUBDIR}/{{file}}"), get(serve_design_document))
            .route("/{file}", get(serve_root_document))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", config.port()))
            .await
            .map_err(|source| ServerError::Bind {
                port: config.port(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| ServerError::Bind {
            port: config.port(),
            source,
        })?;

        info!(%local_addr, mode = ?config.mode(), root = ?config.root(), "sync server listening");

        let mode = config.mode();
        let pump = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let message = match mode {
                    SyncMode::Partial => SyncMessage::Partial {
                        file_name: event.file_name,
                    },
                    SyncMode::FullReload => SyncMessage::FullReload,
                };
                info!(?message, "pushing change");
                // No subscribers is not an error; pushes are fire-and-forget.
                let _ = push.send(message);
            }
        });

        let server = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                warn!(error = %err, "sync server terminated");
            }
        });

        Ok(Self {
            local_addr,
            server,
            pump,
            _watcher: watcher,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Origin for document fetches, e.g. `http://127.0.0.1:8787`.
    pub fn http_base(&self) -> String {
        format!("http://{}", self.local_addr)
    }

    /// URL sync channels subscribe to.
    pub fn ws_url(&self) -> String {
        format!("ws://{}/sync", self.local_addr)
    }

    pub fn shutdown(self) {
        self.server.abort();
        self.pump.abort();
    }
}

async fn sync_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let pushes = state.push.subscribe();
    ws.on_upgrade(move |socket| push_to_socket(socket, pushes))
}

async fn push_to_socket(socket: WebSocket, mut pushes: broadcast::Receiver<SyncMessage>) {
    debug!("sync channel subscribed");
    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            push = pushes.recv() => {
                let message = match push {
                    Ok(message) => message,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // At-most-once delivery: missed pushes are simply gone.
                        warn!(skipped, "sync channel lagging");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let frame = match serde_json::to_string(&message) {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(error = %err, "push not serializable");
                        continue;
                    }
                };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    // Clients have nothing to say; pings are answered by the transport.
                    Some(Ok(_)) => {}
                    _ => break,
                }
            }
        }
    }
    debug!("sync channel unsubscribed");
}

async fn serve_design_document(
    State(state): State<AppState>,
    UrlPath(file_name): UrlPath<String>,
) -> Response {
    serve_document(&state.root.join(DESIGN_SUBDIR), &file_name)
}

async fn serve_root_document(
    State(state): State<AppState>,
    UrlPath(file_name): UrlPath<String>,
) -> Response {
    serve_document(&state.root, &file_name)
}

fn serve_document(dir: &Path, file_name: &str) -> Response {
    if !is_plain_document_name(file_name) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let path = dir.join(file_name);
    match fs::read_to_string(&path) {
        Ok(body) => ([(header::CONTENT_TYPE, HTML_CONTENT_TYPE)], body).into_response(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => StatusCode::NOT_FOUND.into_response(),
        Err(err) => {
            warn!(path = ?path, error = %err, "document read failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Bare `.html` name: no separators, no traversal, nothing hidden.
fn is_plain_document_name(file_name: &str) -> bool {
    if file_name.is_empty() || file_name.starts_with('.') {
        return false;
    }
    if file_name.contains(['/', '\\']) {
        return false;
    }
    Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("html"))
}
