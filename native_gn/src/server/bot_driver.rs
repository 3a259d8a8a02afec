//! The bot scheduler: timer-driven dispatch of pending bot actions.
//!
//! Every game-state broadcast re-plans this lobby's bots: the previous
//! timers are cancelled, and one fresh timer is armed per bot awaiting an
//! action. When a timer fires it re-validates under the lobby lock, picks
//! an action through the game's normal interface, applies it and triggers
//! the next broadcast (which re-plans again).

use std::time::Duration;

use gn_shared::PlayerId;

use crate::server::lobby;
use crate::server::state::AppState;

/// Re-plan bot timers for a lobby. Cheap no-op when no game or no pending
/// bots exist.
pub fn schedule_bots(state: AppState, slug: String) {
    tokio::spawn(async move {
        plan(state, slug).await;
    });
}

async fn plan(state: AppState, slug: String) {
    let Some(lobby_arc) = state.lobby(&slug).await else {
        state.timers.replace_bot_timers(&slug, Vec::new());
        return;
    };
    let (pending, game_type) = {
        let lobby = lobby_arc.read().await;
        match &lobby.game {
            Some(game) => (game.pending_bots(), game.game_type()),
            None => {
                drop(lobby);
                state.timers.replace_bot_timers(&slug, Vec::new());
                return;
            }
        }
    };

    let Some(handler) = state.bots.handler(game_type) else {
        state.timers.replace_bot_timers(&slug, Vec::new());
        return;
    };
    let config = state.config.read().await.clone();

    let mut handles = Vec::with_capacity(pending.len());
    for (index, bot) in pending.into_iter().enumerate() {
        let style = state.bots.style_of(bot).unwrap_or_default();
        let delay = handler.action_delay_ms(&config, &style, index);
        handles.push(tokio::spawn(bot_turn(
            state.clone(),
            slug.clone(),
            bot,
            style,
            Duration::from_millis(delay),
        )));
    }
    state.timers.replace_bot_timers(&slug, handles);
}

async fn bot_turn(state: AppState, slug: String, bot: PlayerId, style: String, delay: Duration) {
    tokio::time::sleep(delay).await;
    let Some(lobby_arc) = state.lobby(&slug).await else {
        return;
    };
    let applied = {
        let mut lobby = lobby_arc.write().await;
        let game_type = lobby.game.as_ref().map(|g| g.game_type());
        let Some(game) = &mut lobby.game else {
            return;
        };
        // the plan may be stale; re-validate before acting
        if !game.pending_bots().contains(&bot) {
            return;
        }
        let Some(handler) = game_type.and_then(|gt| state.bots.handler(gt)) else {
            return;
        };
        let Some(action) = handler.choose(bot, &style, game) else {
            tracing::warn!(slug, %bot, style, "bot found no action to take");
            return;
        };
        match game.apply_action(bot, action) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(slug, %bot, error = %e, "bot action rejected");
                false
            }
        }
    };
    if applied {
        // broadcast + re-plan runs in a fresh task, so the re-plan's
        // cancellation of this (already finished) timer is harmless
        tokio::spawn(async move {
            lobby::after_game_mutation(&state, &slug).await;
        });
    }
}
