//! GeoSketch loopback solver server
//!
//! Development endpoint for the editor's solver channel. It speaks the same
//! protocol as a real solver but performs no constraint solving.
//!
//! ## Protocol
//!
//! Clients send one intent per text frame:
//! ```json
//! { "operation": "create_point", "data": { "uid": "...", "point": { "x": 10, "y": 10 } } }
//! ```
//! Placement intents are answered with the coordinates they carried:
//! ```json
//! { "points": [{ "uid": "...", "x": 10, "y": 10 }] }
//! ```

mod solver;

use axum::{
    Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use geosketch_core::protocol::Intent;
use solver::LoopbackSolver;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

const DEFAULT_ADDR: &str = "0.0.0.0:3030";
const ADDR_ENV: &str = "GEOSKETCH_SERVER_ADDR";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "geosketch_server=info,tower_http=info".into()),
        )
        .init();

    let addr = match listen_addr(std::env::var(ADDR_ENV).ok().as_deref()) {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid {ADDR_ENV}: {e}");
            std::process::exit(2);
        }
    };

    let app = Router::new()
        .route("/", get(index))
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    info!("GeoSketch loopback solver listening on {}", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {e}");
    }
}

fn listen_addr(raw: Option<&str>) -> Result<SocketAddr, std::net::AddrParseError> {
    raw.unwrap_or(DEFAULT_ADDR).parse()
}

async fn index() -> &'static str {
    "GeoSketch Loopback Solver - Connect via WebSocket at /ws"
}

async fn health() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

/// Serve one editor connection until it closes.
async fn handle_socket(socket: WebSocket) {
    let conn_id = Uuid::new_v4();
    info!("New connection: {}", conn_id);

    let (mut sender, mut receiver) = socket.split();
    let mut solver = LoopbackSolver::new();

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let Some(reply) = handle_frame(&mut solver, text.as_str()) else {
                    continue;
                };
                if sender.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {} // Ignore binary and ping/pong
            Err(e) => {
                warn!("WebSocket error for {}: {}", conn_id, e);
                break;
            }
        }
    }

    info!("Connection closed: {} ({} intents)", conn_id, solver.handled());
}

/// Decode one inbound frame and produce the serialized reply, if any.
fn handle_frame(solver: &mut LoopbackSolver, text: &str) -> Option<String> {
    let intent: Intent = match serde_json::from_str(text) {
        Ok(intent) => intent,
        Err(e) => {
            warn!("Invalid intent: {}", e);
            return None;
        }
    };
    let update = solver.apply(&intent)?;
    match serde_json::to_string(&update) {
        Ok(json) => Some(json),
        Err(e) => {
            error!("Failed to encode update: {}", e);
            None
        }
    }
}
