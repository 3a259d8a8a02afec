//! Turn/phase enums, game actions, turn events and per-viewer game views.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::player::{PlayerId, PlayerView};

/// Which of the supported games a lobby is set up for.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum GameType {
    HenHur,
    DiceFactory,
    War,
    KillTeamDraft,
    HeistCity,
}

impl Default for GameType {
    fn default() -> Self {
        GameType::HenHur
    }
}

/// Opaque per-lobby game configuration. Which fields are recognized depends
/// on the lobby's game type; unknown fields are ignored.
pub type GameOptions = serde_json::Map<String, serde_json::Value>;

/// The two turn kinds HenHur alternates between, derived from turn parity.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Race,
    Auction,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    RaceSelection,
    RaceReveal,
    RaceResolution,
    AuctionSelection,
    AuctionReveal,
    AuctionDrafting,
    GameOver,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackView {
    pub spaces_per_lap: i32,
    pub laps_to_win: u32,
}

/// A revealed selection or bid, as shown to its owner (and to everyone
/// during reveal phases).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelectionPublic {
    pub card: Card,
    pub will_burn: bool,
    pub tokens_used: Vec<String>,
}

/// An effect paused awaiting player input. The executor stops at the first
/// such effect; the descriptor is surfaced in the view.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PendingInput {
    pub player: PlayerId,
    pub kind: String,
    pub distance: i32,
    pub requires_adjacent: bool,
}

/// One entry in the append-only turn history.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TurnEvent {
    GameStarted {
        players: Vec<String>,
    },
    CardPlayed {
        player: PlayerId,
        card: String,
        burned: bool,
        distance: i32,
        priority: i32,
    },
    BidRevealed {
        player: PlayerId,
        card: String,
        value: i32,
    },
    Drafted {
        player: PlayerId,
        card: String,
    },
    PoolDiscarded {
        count: usize,
    },
    PoolRevealed {
        count: usize,
    },
    LapCompleted {
        player: PlayerId,
        lap: u32,
    },
    TurnAdvanced {
        round: u32,
        turn: u32,
        kind: TurnKind,
    },
    WinnerDeclared {
        player: PlayerId,
    },
}

/// Per-viewer projection of a HenHur game. Turn-wide fields are identical
/// for every viewer; player entries differ (see [`PlayerView`]).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HenHurView {
    pub round: u32,
    pub turn: u32,
    pub turn_kind: TurnKind,
    pub phase: Phase,
    pub track: TrackView,
    pub players: Vec<PlayerView>,
    pub auction_pool: Vec<Card>,
    pub auction_order: Vec<PlayerId>,
    pub current_drafter: Option<PlayerId>,
    pub winner: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_input: Option<PendingInput>,
    #[serde(default)]
    pub history: Vec<TurnEvent>,
}

/// Per-viewer projection of whatever game a lobby is running.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "kebab-case")]
pub enum GameView {
    HenHur(HenHurView),
}
