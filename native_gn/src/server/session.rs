//! Per-connection session scratch and the unified client-message handler.

use gn_shared::{ClientMsg, PlayerId, ServerMsg};
use tokio::sync::mpsc::UnboundedSender;

use crate::game::GameAction;
use crate::server::lobby::{self, now_ms};
use crate::server::state::AppState;

/// What the transport remembers about one connection: its transient
/// identity and, after the first successful join, the lobby and display
/// name it is bound to.
pub struct Session {
    pub conn: PlayerId,
    pub slug: Option<String>,
    pub name: Option<String>,
    pub tx: UnboundedSender<ServerMsg>,
}

impl Session {
    pub fn new(conn: PlayerId, tx: UnboundedSender<ServerMsg>) -> Self {
        Session {
            conn,
            slug: None,
            name: None,
            tx,
        }
    }
}

/// Centralized dispatch for every inbound message, shared by any transport.
/// Returns the error to send back, if any; successful operations deliver
/// their results through broadcasts instead.
pub async fn handle_client_msg(
    state: &AppState,
    session: &mut Session,
    msg: ClientMsg,
) -> Option<ServerMsg> {
    let result = match msg {
        ClientMsg::JoinLobby { slug, player_name } => {
            match lobby::join_lobby(state, &slug, &player_name, session.conn, session.tx.clone())
                .await
            {
                Ok(()) => {
                    session.slug = Some(slug);
                    session.name = Some(player_name);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        ClientMsg::UpdateLobbyTitle { slug, new_title } => {
            lobby::update_title(state, &slug, session.conn, &new_title).await
        }
        ClientMsg::UpdatePlayerName { slug, new_name } => {
            match lobby::update_player_name(state, &slug, session.conn, &new_name).await {
                Ok(()) => {
                    session.name = Some(new_name);
                    Ok(())
                }
                Err(e) => Err(e),
            }
        }
        ClientMsg::UpdateGameType { slug, game_type } => {
            lobby::update_game_type(state, &slug, session.conn, game_type).await
        }
        ClientMsg::UpdateGameOptions { slug, options } => {
            lobby::update_game_options(state, &slug, session.conn, options).await
        }
        ClientMsg::ChangeLeader { slug, new_leader } => {
            lobby::change_leader(state, &slug, session.conn, new_leader).await
        }
        ClientMsg::AddBot { slug, style } => {
            lobby::add_bot(state, &slug, session.conn, &style).await
        }
        ClientMsg::RemoveBot { slug, bot } => {
            lobby::remove_bot(state, &slug, session.conn, bot).await
        }
        ClientMsg::StartGame { slug } => lobby::start_game(state, &slug, session.conn).await,
        ClientMsg::RequestState { slug } => {
            lobby::request_state(state, &slug, session.conn).await
        }
        ClientMsg::SelectCard {
            slug,
            card,
            will_burn,
            tokens_used,
        } => {
            lobby::handle_game_action(
                state,
                &slug,
                session.conn,
                GameAction::SelectCard {
                    card,
                    will_burn,
                    tokens_used,
                },
            )
            .await
        }
        ClientMsg::PlaceBid {
            slug,
            card,
            will_burn,
            tokens_used,
        } => {
            lobby::handle_game_action(
                state,
                &slug,
                session.conn,
                GameAction::PlaceBid {
                    card,
                    will_burn,
                    tokens_used,
                },
            )
            .await
        }
        ClientMsg::DraftCard { slug, card } => {
            lobby::handle_game_action(state, &slug, session.conn, GameAction::DraftCard { card })
                .await
        }
        ClientMsg::HeartbeatPong => {
            heartbeat_pong(state, session).await;
            Ok(())
        }
    };

    match result {
        Ok(()) => None,
        Err(e) => Some(ServerMsg::Error {
            message: e.to_string(),
        }),
    }
}

/// A heartbeat response refreshes the participant's last-ping stamp and the
/// lobby's activity clock. Liveness is observational only; the transport's
/// close event drives actual disconnects.
pub async fn heartbeat_pong(state: &AppState, session: &Session) {
    let Some(slug) = &session.slug else { return };
    let Some(lobby_arc) = state.lobby(slug).await else {
        return;
    };
    let mut lobby = lobby_arc.write().await;
    let now = now_ms();
    lobby.last_activity_ms = now;
    if let Some(p) = lobby
        .participants
        .iter_mut()
        .find(|p| p.id == session.conn)
    {
        p.last_ping_ms = now;
    }
}
