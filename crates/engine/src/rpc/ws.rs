use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use crate::rpc::cors::cors_layer;
use crate::rpc::methods::{handle_raw_request, EngineState};

pub fn router(state: EngineState) -> Router {
    Router::new().route("/sync", get(sync_ws_route)).layer(cors_layer()).with_state(state)
}

pub async fn serve(listener: TcpListener, state: EngineState) -> Result<()> {
    axum::serve(listener, router(state)).await.context("engine sync websocket server failed")
}

async fn sync_ws_route(
    ws: WebSocketUpgrade,
    State(state): State<EngineState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: EngineState) {
    while let Some(message_result) = socket.recv().await {
        let Ok(message) = message_result else {
            break;
        };

        match message {
            WsMessage::Text(payload) => {
                let Some(response) = handle_raw_request(payload.as_bytes(), &state) else {
                    continue;
                };
                if let Ok(encoded) = serde_json::to_string(&response) {
                    if socket.send(WsMessage::Text(encoded.into())).await.is_err() {
                        break;
                    }
                } else {
                    break;
                }
            }
            WsMessage::Binary(payload) => {
                let Some(response) = handle_raw_request(payload.as_ref(), &state) else {
                    continue;
                };
                if let Ok(encoded) = serde_json::to_vec(&response) {
                    if socket.send(WsMessage::Binary(encoded.into())).await.is_err() {
                        break;
                    }
                } else {
                    break;
                }
            }
            WsMessage::Ping(payload) => {
                if socket.send(WsMessage::Pong(payload)).await.is_err() {
                    break;
                }
            }
            WsMessage::Pong(_) => {}
            WsMessage::Close(_) => break,
        }
    }
}
