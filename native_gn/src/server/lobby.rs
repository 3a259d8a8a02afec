//! The lobby registry: presence, leadership, game lifecycle and fan-out.
//!
//! All mutations go through the owning lobby's write lock. Broadcasts are
//! per-viewer: projections differ between recipients, so fan-out walks the
//! participant list and sends individually; bots never receive deliveries.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Result};
use gn_shared::{
    GameOptions, GameType, LobbySnapshot, ParticipantSnapshot, PlayerId, ServerMsg,
};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

use crate::game::henhur::NewPlayer;
use crate::game::{construct_game, ActiveGame, GameAction};
use crate::pretty;
use crate::server::state::AppState;
use crate::server::bot_driver;

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub struct Participant {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub is_bot: bool,
    pub bot_style: Option<String>,
    pub joined_at_ms: u64,
    pub last_ping_ms: u64,
    /// Delivery channel into the participant's websocket task. Absent for
    /// bots and for disconnected participants.
    pub tx: Option<UnboundedSender<ServerMsg>>,
}

pub struct Lobby {
    pub slug: String,
    pub title: String,
    pub leader: PlayerId,
    pub game_type: GameType,
    pub game_options: GameOptions,
    pub participants: Vec<Participant>,
    pub game: Option<ActiveGame>,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
    last_printed_log_len: usize,
}

impl Lobby {
    fn new(slug: &str, leader: PlayerId) -> Self {
        let now = now_ms();
        Lobby {
            slug: slug.to_owned(),
            title: format!("{slug} game night"),
            leader,
            game_type: GameType::default(),
            game_options: GameOptions::default(),
            participants: Vec::new(),
            game: None,
            created_at_ms: now,
            last_activity_ms: now,
            last_printed_log_len: 0,
        }
    }

    pub fn participant(&self, id: PlayerId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id == id)
    }

    fn participant_mut(&mut self, id: PlayerId) -> Option<&mut Participant> {
        self.participants.iter_mut().find(|p| p.id == id)
    }

    pub fn player_name(&self, id: PlayerId) -> Option<&str> {
        self.participant(id).map(|p| p.name.as_str())
    }

    /// No human is connected; the lobby is a candidate for cleanup.
    fn abandoned(&self) -> bool {
        self.participants
            .iter()
            .all(|p| p.is_bot || !p.connected)
    }

    pub fn snapshot(&self) -> LobbySnapshot {
        LobbySnapshot {
            slug: self.slug.clone(),
            title: self.title.clone(),
            leader: self.leader,
            game_type: self.game_type,
            game_options: self.game_options.clone(),
            players: self
                .participants
                .iter()
                .map(|p| ParticipantSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    connected: p.connected,
                    is_bot: p.is_bot,
                    bot_style: p.bot_style.clone(),
                    joined_at_ms: p.joined_at_ms,
                })
                .collect(),
            game_in_progress: self.game.is_some(),
        }
    }

    fn send_to(&self, id: PlayerId, msg: ServerMsg) {
        if let Some(p) = self.participant(id) {
            if let Some(tx) = &p.tx {
                let _ = tx.send(msg);
            }
        }
    }

    /// Send the current lobby snapshot to every connected human.
    pub fn broadcast_lobby(&self) {
        let snapshot = self.snapshot();
        for p in &self.participants {
            if p.is_bot || !p.connected {
                continue;
            }
            if let Some(tx) = &p.tx {
                let _ = tx.send(ServerMsg::LobbyUpdated(snapshot.clone()));
            }
        }
    }

    /// Send each connected human their own projection of the game, and
    /// print any new turn events to the server console.
    pub fn broadcast_game(&mut self, started: bool) {
        if self.game.is_none() {
            return;
        }
        self.print_new_events();
        let game = self.game.as_ref().expect("checked above");
        for p in &self.participants {
            if p.is_bot || !p.connected {
                continue;
            }
            if let Some(tx) = &p.tx {
                let view = game.view_for(p.id);
                let msg = if started {
                    ServerMsg::GameStarted(view)
                } else {
                    ServerMsg::GameStateUpdated(view)
                };
                let _ = tx.send(msg);
            }
        }
    }

    fn print_new_events(&mut self) {
        let Some(game) = &self.game else { return };
        let history = game.history();
        let total = history.len();
        // history is capped, so the cursor can also fall behind the front
        let start = self.last_printed_log_len.min(total);
        for event in &history[start..] {
            let line = pretty::format_turn_event(event, |id| {
                self.participants
                    .iter()
                    .find(|p| p.id == id)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| id.to_string())
            });
            tracing::info!(lobby = %self.slug, "{line}");
        }
        self.last_printed_log_len = total;
    }
}

/// Join (or create) a lobby. A participant with the same display name is
/// reconnected: their transient identity rebinds to the new connection and
/// any attached game follows. Unknown names append a fresh participant.
pub async fn join_lobby(
    state: &AppState,
    slug: &str,
    player_name: &str,
    conn: PlayerId,
    tx: UnboundedSender<ServerMsg>,
) -> Result<()> {
    if player_name.trim().is_empty() {
        bail!("a display name is required");
    }

    let lobby_arc = {
        let mut lobbies = state.lobbies.write().await;
        lobbies
            .entry(slug.to_owned())
            .or_insert_with(|| Arc::new(RwLock::new(Lobby::new(slug, conn))))
            .clone()
    };
    state.timers.cancel_cleanup(slug);

    let mut lobby = lobby_arc.write().await;
    let now = now_ms();
    lobby.last_activity_ms = now;

    match lobby
        .participants
        .iter_mut()
        .find(|p| p.name == player_name)
    {
        Some(existing) => {
            let old = existing.id;
            existing.id = conn;
            existing.connected = true;
            existing.last_ping_ms = now;
            existing.tx = Some(tx);
            if lobby.leader == old {
                lobby.leader = conn;
            }
            if let Some(game) = &mut lobby.game {
                game.on_player_reconnect(old, conn, player_name);
            }
            tracing::info!(slug, name = player_name, %old, %conn, "participant reconnected");
        }
        None => {
            lobby.participants.push(Participant {
                id: conn,
                name: player_name.to_owned(),
                connected: true,
                is_bot: false,
                bot_style: None,
                joined_at_ms: now,
                last_ping_ms: now,
                tx: Some(tx),
            });
            tracing::info!(slug, name = player_name, %conn, "participant joined");
        }
    }

    lobby.broadcast_lobby();
    if let Some(game) = &lobby.game {
        lobby.send_to(conn, ServerMsg::GameStateUpdated(game.view_for(conn)));
    }
    Ok(())
}

/// Transport-close handler: mark the participant disconnected and, if the
/// lobby is now abandoned, arm the deferred cleanup.
pub async fn leave(state: &AppState, slug: &str, conn: PlayerId) {
    let Some(lobby_arc) = state.lobby(slug).await else {
        return;
    };
    let abandoned = {
        let mut lobby = lobby_arc.write().await;
        let Some(p) = lobby.participant_mut(conn) else {
            return;
        };
        p.connected = false;
        p.tx = None;
        tracing::info!(slug, %conn, "participant disconnected");
        if let Some(game) = &mut lobby.game {
            game.set_connected(conn, false);
        }
        lobby.broadcast_lobby();
        lobby.abandoned()
    };

    // a departure can close the selection gate, so re-drive the game
    after_game_mutation(state, slug).await;

    if abandoned {
        let delay = state.config.read().await.lobby_cleanup_secs;
        let handle = tokio::spawn(cleanup_after(
            state.clone(),
            slug.to_owned(),
            Duration::from_secs(delay),
        ));
        state.timers.set_cleanup(slug, handle);
    }
}

/// Deferred cleanup: fires minutes after a lobby empties, and re-verifies
/// that nobody came back before dropping the lobby and its game.
async fn cleanup_after(state: AppState, slug: String, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(lobby_arc) = state.lobby(&slug).await else {
        return;
    };
    let still_abandoned = lobby_arc.read().await.abandoned();
    if !still_abandoned {
        return;
    }
    state.lobbies.write().await.remove(&slug);
    {
        let lobby = lobby_arc.read().await;
        for p in &lobby.participants {
            if p.is_bot {
                state.bots.remove_bot(p.id);
            }
        }
    }
    tracing::info!(slug, "dropped abandoned lobby");
    state.timers.cleanup_lobby(&slug);
}

/// Leader-only lobby mutations are silently ignored for anyone else: no
/// state change and no feedback.
macro_rules! leader_only {
    ($lobby:expr, $requester:expr) => {
        if $lobby.leader != $requester {
            return Ok(());
        }
    };
}

pub async fn update_title(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    new_title: &str,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    leader_only!(lobby, requester);
    lobby.title = new_title.to_owned();
    lobby.last_activity_ms = now_ms();
    lobby.broadcast_lobby();
    Ok(())
}

pub async fn update_game_type(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    game_type: GameType,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    leader_only!(lobby, requester);
    if lobby.game.is_some() {
        bail!("cannot change the game while one is in progress");
    }
    lobby.game_type = game_type;
    lobby.last_activity_ms = now_ms();
    lobby.broadcast_lobby();
    Ok(())
}

pub async fn update_game_options(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    options: GameOptions,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    leader_only!(lobby, requester);
    lobby.game_options = options;
    lobby.last_activity_ms = now_ms();
    lobby.broadcast_lobby();
    Ok(())
}

pub async fn change_leader(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    new_leader: PlayerId,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    leader_only!(lobby, requester);
    if lobby.participant(new_leader).is_none() {
        bail!("that player is not in the lobby");
    }
    lobby.leader = new_leader;
    lobby.last_activity_ms = now_ms();
    lobby.broadcast_lobby();
    Ok(())
}

/// Rename the requesting participant. Display names are the reconnection
/// key, so duplicates are rejected.
pub async fn update_player_name(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    new_name: &str,
) -> Result<()> {
    if new_name.trim().is_empty() {
        bail!("a display name is required");
    }
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    if lobby
        .participants
        .iter()
        .any(|p| p.name == new_name && p.id != requester)
    {
        bail!("that name is taken");
    }
    let Some(p) = lobby.participant_mut(requester) else {
        bail!("you are not in this lobby");
    };
    p.name = new_name.to_owned();
    if let Some(game) = &mut lobby.game {
        game.rename_player(requester, new_name);
    }
    lobby.last_activity_ms = now_ms();
    lobby.broadcast_lobby();
    Ok(())
}

pub async fn add_bot(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    style: &str,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    leader_only!(lobby, requester);
    if lobby.game.is_some() {
        bail!("cannot add bots while a game is in progress");
    }
    let Some(handler) = state.bots.handler(lobby.game_type) else {
        bail!("this game has no bot support");
    };
    if !handler.available_styles().iter().any(|s| s.id == style) {
        bail!("unknown bot style");
    }
    let taken: Vec<String> = lobby.participants.iter().map(|p| p.name.clone()).collect();
    let name = handler.generate_name(style, &taken);
    let id = state.next_conn_id();
    let now = now_ms();
    lobby.participants.push(Participant {
        id,
        name: name.clone(),
        connected: true,
        is_bot: true,
        bot_style: Some(style.to_owned()),
        joined_at_ms: now,
        last_ping_ms: now,
        tx: None,
    });
    state.bots.register_bot(id, &name, style, lobby.game_type);
    lobby.last_activity_ms = now;
    lobby.broadcast_lobby();
    tracing::info!(slug, %id, name, style, "bot added");
    Ok(())
}

pub async fn remove_bot(
    state: &AppState,
    slug: &str,
    requester: PlayerId,
    bot: PlayerId,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let mut lobby = lobby_arc.write().await;
    leader_only!(lobby, requester);
    if lobby.game.is_some() {
        bail!("cannot remove bots while a game is in progress");
    }
    let Some(pos) = lobby
        .participants
        .iter()
        .position(|p| p.id == bot && p.is_bot)
    else {
        bail!("no such bot");
    };
    lobby.participants.remove(pos);
    state.bots.remove_bot(bot);
    lobby.last_activity_ms = now_ms();
    lobby.broadcast_lobby();
    Ok(())
}

/// Leader-only: construct the configured game over the current roster and
/// deliver everyone their opening projection.
pub async fn start_game(state: &AppState, slug: &str, requester: PlayerId) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    {
        let mut lobby = lobby_arc.write().await;
        leader_only!(lobby, requester);
        if lobby.game.is_some() {
            bail!("a game is already in progress");
        }
        let present = lobby
            .participants
            .iter()
            .filter(|p| p.connected || p.is_bot)
            .count();
        if present < 2 {
            bail!("need at least two players to start");
        }
        let roster: Vec<NewPlayer> = lobby
            .participants
            .iter()
            .map(|p| NewPlayer {
                id: p.id,
                name: p.name.clone(),
                is_bot: p.is_bot,
            })
            .collect();
        let mut game = construct_game(lobby.game_type, &lobby.game_options, roster)?;
        game.start();
        lobby.game = Some(game);
        lobby.last_activity_ms = now_ms();
        tracing::info!(slug, players = lobby.participants.len(), "game started");
        lobby.broadcast_game(true);
    }
    drive_after_broadcast(state, slug).await;
    Ok(())
}

/// Re-send the requester's projection, without a broadcast.
pub async fn request_state(state: &AppState, slug: &str, conn: PlayerId) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    let lobby = lobby_arc.read().await;
    match &lobby.game {
        Some(game) => {
            lobby.send_to(conn, ServerMsg::GameStateUpdated(game.view_for(conn)));
            Ok(())
        }
        None => {
            lobby.send_to(conn, ServerMsg::LobbyUpdated(lobby.snapshot()));
            Ok(())
        }
    }
}

/// Apply a player's in-game action, then broadcast and re-drive timers and
/// bots. Failures are reported to the caller and change nothing.
pub async fn handle_game_action(
    state: &AppState,
    slug: &str,
    conn: PlayerId,
    action: GameAction,
) -> Result<()> {
    let Some(lobby_arc) = state.lobby(slug).await else {
        bail!("no such lobby");
    };
    {
        let mut lobby = lobby_arc.write().await;
        let Some(game) = &mut lobby.game else {
            bail!("no game in progress");
        };
        game.apply_action(conn, action)?;
        lobby.last_activity_ms = now_ms();
        lobby.broadcast_game(false);
    }
    drive_after_broadcast(state, slug).await;
    Ok(())
}

/// Broadcast the current game state and re-drive scheduled work. Safe to
/// call when nothing changed.
pub async fn after_game_mutation(state: &AppState, slug: &str) {
    let Some(lobby_arc) = state.lobby(slug).await else {
        return;
    };
    {
        let mut lobby = lobby_arc.write().await;
        if lobby.game.is_none() {
            return;
        }
        lobby.broadcast_game(false);
    }
    drive_after_broadcast(state, slug).await;
}

/// After any broadcast: arm the bounded reveal delay when a reveal phase is
/// pending, and re-plan bot actions.
async fn drive_after_broadcast(state: &AppState, slug: &str) {
    let Some(lobby_arc) = state.lobby(slug).await else {
        return;
    };
    let needs_reveal = {
        let lobby = lobby_arc.read().await;
        lobby
            .game
            .as_ref()
            .map(|g| g.awaiting_reveal())
            .unwrap_or(false)
    };
    if needs_reveal {
        let delay = state.config.read().await.reveal_delay_ms;
        let handle = tokio::spawn(reveal_after(
            state.clone(),
            slug.to_owned(),
            Duration::from_millis(delay),
        ));
        state.timers.set_reveal(slug, handle);
    }
    bot_driver::schedule_bots(state.clone(), slug.to_owned());
}

/// The bounded pause between a reveal phase and its resolution. Re-enters
/// the lobby's serialized executor and re-verifies the phase at fire time.
///
/// Boxed explicitly: this mutually recurses with `drive_after_broadcast`
/// through `tokio::spawn`, and leaving the return type as `impl Future`
/// makes that recursive opaque type unsolvable for auto-trait (`Send`)
/// purposes. A concrete `Pin<Box<dyn Future + Send>>` breaks the cycle.
fn reveal_after(
    state: AppState,
    slug: String,
    delay: Duration,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>> {
    Box::pin(async move {
        tokio::time::sleep(delay).await;
        let Some(lobby_arc) = state.lobby(&slug).await else {
            return;
        };
        let resolved = {
            let mut lobby = lobby_arc.write().await;
            match &mut lobby.game {
                Some(game) => match game.resolve_reveal() {
                    Ok(resolved) => resolved,
                    Err(e) => {
                        tracing::warn!(slug, error = %e, "reveal resolution failed");
                        false
                    }
                },
                None => false,
            }
        };
        if resolved {
            after_game_mutation(&state, &slug).await;
        }
    })
}
