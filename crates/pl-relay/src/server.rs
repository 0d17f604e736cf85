//! HTTP and WebSocket server
//!
//! Accepts connections, decodes inbound frames, and feeds the session
//! router through a single event channel. Each connection gets exactly
//! one reader loop and one writer task, registered at accept time; the
//! router never learns about the transport beyond the registry.

use std::sync::Arc;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use pl_protocol::ClientMessage;

use crate::config::RelayConfig;
use crate::registry::{ConnectionId, ConnectionRegistry};
use crate::router::{Router, RouterEvent};

/// Capacity of the router's inbound event channel
const ROUTER_QUEUE: usize = 1024;

/// Static liveness response for `GET /`
const LIVENESS: &str = "Server is running";

/// Shared application state passed to axum handlers
#[derive(Clone)]
pub struct AppState {
    registry: Arc<ConnectionRegistry>,
    events: mpsc::Sender<RouterEvent>,
}

/// Build the axum router with all routes
pub fn build_router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/", get(liveness_handler))
        .route("/ws", get(ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

/// Handle returned by `start()`: exposes the bound port and keeps the
/// router and server tasks alive
pub struct ServerHandle {
    /// Port the listener is bound to
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
    _router: tokio::task::JoinHandle<()>,
}

/// Bind the listener and start the relay.
///
/// With `port = 0` the OS picks an ephemeral port, reported through the
/// returned handle.
pub async fn start(config: RelayConfig, cancel: CancellationToken) -> std::io::Result<ServerHandle> {
    let registry = Arc::new(ConnectionRegistry::new());
    let (event_tx, event_rx) = mpsc::channel(ROUTER_QUEUE);

    let router = Router::new(Arc::clone(&registry), config.displacement);
    let router_handle = tokio::spawn(router.run(event_rx, cancel.clone()));

    let state = AppState {
        registry,
        events: event_tx,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.listen_address()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Relay listening on {}", local_addr);

    let server_handle = tokio::spawn(async move {
        let shutdown = async move { cancel.cancelled().await };
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
        _router: router_handle,
    })
}

/// Liveness endpoint
async fn liveness_handler() -> &'static str {
    LIVENESS
}

/// WebSocket upgrade handler
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive a single WebSocket connection until it closes
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (id, mut outbound) = state.registry.register();
    tracing::info!(conn = %id, "Client connected");

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Writer: outbound queue -> JSON text frames
    let writer_id = id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let frame = match message.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::error!(conn = %writer_id, "Failed to encode event: {}", e);
                    continue;
                }
            };
            if ws_tx.send(WsMessage::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    // Reader: text frames -> router events
    read_frames(&mut ws_rx, &id, &state.events).await;

    // The transport reports the loss exactly once, whatever the cause.
    let _ = state
        .events
        .send(RouterEvent::Disconnected { id: id.clone() })
        .await;

    state.registry.unregister(&id);
    writer.abort();
    tracing::info!(conn = %id, "Client disconnected");
}

/// Forward decoded frames to the router until the socket closes
async fn read_frames(
    ws_rx: &mut (impl Stream<Item = Result<WsMessage, axum::Error>> + Unpin),
    id: &ConnectionId,
    events: &mpsc::Sender<RouterEvent>,
) {
    while let Some(Ok(frame)) = ws_rx.next().await {
        match frame {
            WsMessage::Text(text) => match ClientMessage::decode(&text) {
                Ok(message) => {
                    if events
                        .send(RouterEvent::Inbound {
                            id: id.clone(),
                            message,
                        })
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(conn = %id, "Dropped undecodable frame: {}", e);
                }
            },
            WsMessage::Binary(_) => {
                tracing::warn!(conn = %id, "Dropped non-text frame");
            }
            WsMessage::Close(_) => break,
            // axum answers pings automatically
            WsMessage::Ping(_) | WsMessage::Pong(_) => {}
        }
    }
}
