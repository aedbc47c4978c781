use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::message::RealtimeEvent;
use tokio::time::Duration;

use crate::auth::CurrentUser;
use crate::auth::extractor::authenticate_token;
use crate::core::ServerState;
use crate::realtime::scopes_for;
use crate::utils::AppError;

const PING_INTERVAL_SECS: u64 = 30;

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// Authenticate before upgrading so a bad token is a plain 401
pub async fn upgrade(
    State(state): State<ServerState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let user = authenticate_token(state.get_jwt_service(), &query.token)?;
    Ok(ws.on_upgrade(move |socket| session(socket, state, user)))
}

async fn session(socket: WebSocket, state: ServerState, user: CurrentUser) {
    let (mut sink, mut stream) = socket.split();

    let scopes = scopes_for(&user);
    let mut subscription = state.bus.subscribe(scopes.clone());
    tracing::info!(
        user_id = user.id,
        role = %user.role,
        connection_id = subscription.id(),
        "Real-time client connected"
    );

    let ready = RealtimeEvent::ready(&scopes).to_json();
    if sink.send(Message::Text(ready.into())).await.is_err() {
        return;
    }

    let mut ping_interval = tokio::time::interval(Duration::from_secs(PING_INTERVAL_SECS));
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            frame = subscription.recv() => {
                match frame {
                    Some(text) => {
                        if sink.send(Message::Text(text.as_ref().into())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!(user_id = user.id, error = %e, "Real-time socket error");
                        break;
                    }
                }
            }
        }
    }

    tracing::info!(
        user_id = user.id,
        connection_id = subscription.id(),
        "Real-time client disconnected"
    );
}
