//! Lobby snapshots broadcast on every lobby change.

use serde::{Deserialize, Serialize};

use crate::game::{GameOptions, GameType};
use crate::player::PlayerId;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticipantSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub is_bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_style: Option<String>,
    pub joined_at_ms: u64,
}

/// The lobby as every member sees it. Sent on the `lobby-updated` channel
/// after any lobby-level change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub slug: String,
    pub title: String,
    pub leader: PlayerId,
    pub game_type: GameType,
    #[serde(default)]
    pub game_options: GameOptions,
    pub players: Vec<ParticipantSnapshot>,
    pub game_in_progress: bool,
}
