//! WebSocket transport: the upgrade handler and the per-connection loop.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::StreamExt;
use gn_shared::{ClientMsg, ServerMsg};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::server::lobby;
use crate::server::session::{self, Session};
use crate::server::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let conn = state.next_conn_id();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMsg>();
    let mut session = Session::new(conn, tx);
    tracing::info!(%conn, "client connected");

    let _ = send_ws(&mut socket, &ServerMsg::Welcome).await;

    let (hb_interval, pong_timeout_ms) = {
        let config = state.config.read().await;
        (config.heartbeat_interval_secs, config.heartbeat_timeout_ms)
    };
    let mut heartbeat = tokio::time::interval(Duration::from_secs(hb_interval.max(1)));
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick fires immediately; skip it so the ping cadence starts later
    heartbeat.tick().await;

    let pong_deadline = tokio::time::sleep(Duration::from_secs(3600));
    tokio::pin!(pong_deadline);
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            biased;

            // Outbound deliveries queued by lobby broadcasts.
            Some(msg) = rx.recv() => {
                send_ws(&mut socket, &msg).await;
            }

            _ = heartbeat.tick() => {
                if awaiting_pong {
                    tracing::warn!(%conn, "heartbeat pong still outstanding");
                }
                send_ws(&mut socket, &ServerMsg::HeartbeatPing).await;
                awaiting_pong = true;
                pong_deadline
                    .as_mut()
                    .reset(Instant::now() + Duration::from_millis(pong_timeout_ms));
            }

            // A missed pong is logged only; the socket close below is the
            // authoritative disconnect.
            _ = &mut pong_deadline, if awaiting_pong => {
                tracing::warn!(%conn, "heartbeat pong missed");
                awaiting_pong = false;
            }

            inbound = socket.next() => {
                match inbound {
                    Some(Ok(Message::Text(txt))) => {
                        match serde_json::from_str::<ClientMsg>(&txt) {
                            Ok(ClientMsg::HeartbeatPong) => {
                                awaiting_pong = false;
                                session::heartbeat_pong(&state, &session).await;
                            }
                            Ok(msg) => {
                                tracing::debug!(%conn, received = ?msg);
                                if let Some(resp) =
                                    session::handle_client_msg(&state, &mut session, msg).await
                                {
                                    send_ws(&mut socket, &resp).await;
                                }
                            }
                            Err(_) => {
                                tracing::warn!(%conn, raw = %txt, "malformed ClientMsg JSON");
                                send_ws(
                                    &mut socket,
                                    &ServerMsg::Error {
                                        message: "malformed message".into(),
                                    },
                                )
                                .await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(%conn, "client disconnecting");
    if let Some(slug) = session.slug.clone() {
        lobby::leave(&state, &slug, conn).await;
    }
}

async fn send_ws(socket: &mut WebSocket, msg: &ServerMsg) {
    match serde_json::to_string(msg) {
        Ok(txt) => {
            let _ = socket.send(Message::Text(txt)).await;
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize ServerMsg for websocket send");
        }
    }
}
