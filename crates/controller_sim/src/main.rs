use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, Mutex};
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::{info, warn};

mod config;
mod controller;

use config::{load_settings, Settings};
use controller::Controller;

struct AppState {
    controller: Mutex<Controller>,
    events: broadcast::Sender<String>,
}

impl AppState {
    fn new(settings: &Settings) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            controller: Mutex::new(Controller::new(settings)),
            events,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings()?;
    let app = build_router(Arc::new(AppState::new(&settings)));

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(%addr, "controller simulator listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/ws", get(ws_handler))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

/// Every feedback frame goes to every connected client, including the one
/// whose intent caused it.
async fn ws_connection(state: Arc<AppState>, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let mut events = BroadcastStream::new(state.events.subscribe());
    info!("controller: client connected");

    let send_task = tokio::spawn(async move {
        while let Some(event) = events.next().await {
            let text = match event {
                Ok(text) => text,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "controller: slow client missed feedback");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            continue;
        };
        let frames = state.controller.lock().await.handle_text(&text);
        for frame in frames {
            match frame.encode() {
                Ok(encoded) => {
                    let _ = state.events.send(encoded);
                }
                Err(err) => warn!(%err, "controller: failed to encode feedback"),
            }
        }
    }

    send_task.abort();
    info!("controller: client disconnected");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
