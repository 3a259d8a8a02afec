//! Client-server messaging protocol.
//!
//! Both enums serialize as `{"type": "<kebab-case event>", "data": {...}}`,
//! which is the wire naming the event channels use.

use serde::{Deserialize, Serialize};

use crate::game::{GameOptions, GameType, GameView};
use crate::lobby::LobbySnapshot;
use crate::player::PlayerId;

/// Messages clients send to the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMsg {
    JoinLobby {
        slug: String,
        player_name: String,
    },
    UpdateLobbyTitle {
        slug: String,
        new_title: String,
    },
    UpdatePlayerName {
        slug: String,
        new_name: String,
    },
    UpdateGameType {
        slug: String,
        game_type: GameType,
    },
    UpdateGameOptions {
        slug: String,
        options: GameOptions,
    },
    ChangeLeader {
        slug: String,
        new_leader: PlayerId,
    },
    AddBot {
        slug: String,
        style: String,
    },
    RemoveBot {
        slug: String,
        bot: PlayerId,
    },
    StartGame {
        slug: String,
    },
    RequestState {
        slug: String,
    },
    /// HenHur race phase: commit a card, a burn election and tokens.
    SelectCard {
        slug: String,
        card: String,
        will_burn: bool,
        #[serde(default)]
        tokens_used: Vec<String>,
    },
    /// HenHur auction phase: commit a bid.
    PlaceBid {
        slug: String,
        card: String,
        will_burn: bool,
        #[serde(default)]
        tokens_used: Vec<String>,
    },
    /// HenHur drafting: take one card from the auction pool.
    DraftCard {
        slug: String,
        card: String,
    },
    HeartbeatPong,
}

/// Messages the server sends to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMsg {
    Welcome,
    LobbyUpdated(LobbySnapshot),
    GameStarted(GameView),
    GameStateUpdated(GameView),
    Error {
        message: String,
    },
    HeartbeatPing,
}
