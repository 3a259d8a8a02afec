//! Game engines and the contract the lobby layer drives them through.

pub mod catalog;
pub mod deck;
pub mod dice;
pub mod effects;
pub mod henhur;

use anyhow::{bail, Result};
use gn_shared::{GameType, GameView, PlayerId};

use henhur::HenHurGame;

/// An in-game action, as dispatched to whichever engine the lobby runs.
#[derive(Clone, Debug)]
pub enum GameAction {
    SelectCard {
        card: String,
        will_burn: bool,
        tokens_used: Vec<String>,
    },
    PlaceBid {
        card: String,
        will_burn: bool,
        tokens_used: Vec<String>,
    },
    DraftCard {
        card: String,
    },
}

/// The game bound to a lobby. Each supported game is a variant; games share
/// this contract and nothing else.
pub enum ActiveGame {
    HenHur(HenHurGame),
}

impl ActiveGame {
    pub fn game_type(&self) -> GameType {
        match self {
            ActiveGame::HenHur(_) => GameType::HenHur,
        }
    }

    /// Idempotent post-construction initialization.
    pub fn start(&mut self) {
        match self {
            ActiveGame::HenHur(game) => game.start(),
        }
    }

    /// Apply a player action. Illegal combinations come back as errors with
    /// a user-readable message; state is unchanged on failure.
    pub fn apply_action(&mut self, actor: PlayerId, action: GameAction) -> Result<()> {
        match self {
            ActiveGame::HenHur(game) => match action {
                GameAction::SelectCard {
                    card,
                    will_burn,
                    tokens_used,
                } => game.submit_selection(actor, &card, will_burn, tokens_used),
                GameAction::PlaceBid {
                    card,
                    will_burn,
                    tokens_used,
                } => game.submit_bid(actor, &card, will_burn, tokens_used),
                GameAction::DraftCard { card } => game.draft_card(actor, &card),
            },
        }
    }

    /// Pure projection of current state for one viewer.
    pub fn view_for(&self, viewer: PlayerId) -> GameView {
        match self {
            ActiveGame::HenHur(game) => GameView::HenHur(game.view_for(viewer)),
        }
    }

    pub fn pending_bots(&self) -> Vec<PlayerId> {
        match self {
            ActiveGame::HenHur(game) => game.pending_bots(),
        }
    }

    pub fn on_player_reconnect(&mut self, old: PlayerId, new: PlayerId, name: &str) {
        match self {
            ActiveGame::HenHur(game) => game.on_player_reconnect(old, new, name),
        }
    }

    pub fn set_connected(&mut self, id: PlayerId, connected: bool) {
        match self {
            ActiveGame::HenHur(game) => game.set_connected(id, connected),
        }
    }

    pub fn rename_player(&mut self, id: PlayerId, new_name: &str) {
        match self {
            ActiveGame::HenHur(game) => game.rename_player(id, new_name),
        }
    }

    /// The engine's append-only turn history.
    pub fn history(&self) -> &[gn_shared::TurnEvent] {
        match self {
            ActiveGame::HenHur(game) => &game.history,
        }
    }

    /// Whether a bounded reveal delay should be armed for this state.
    pub fn awaiting_reveal(&self) -> bool {
        match self {
            ActiveGame::HenHur(game) => game.awaiting_reveal(),
        }
    }

    /// Reveal-timer re-entry; no-op when the phase has already moved on.
    pub fn resolve_reveal(&mut self) -> Result<bool> {
        match self {
            ActiveGame::HenHur(game) => game.resolve_reveal(),
        }
    }
}

/// Options recognized for HenHur lobbies; unknown fields are ignored.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct HenHurOptions {
    pub variant: String,
    #[serde(rename = "selectedCards")]
    pub selected_cards: Option<Vec<String>>,
}

impl Default for HenHurOptions {
    fn default() -> Self {
        HenHurOptions {
            variant: "standard".to_owned(),
            selected_cards: None,
        }
    }
}

/// Build the game instance for a lobby's game type. Only HenHur constructs
/// today; the other game types are recognized but not yet playable here.
pub fn construct_game(
    game_type: GameType,
    options: &gn_shared::GameOptions,
    roster: Vec<henhur::NewPlayer>,
) -> Result<ActiveGame> {
    match game_type {
        GameType::HenHur => {
            let opts: HenHurOptions =
                serde_json::from_value(serde_json::Value::Object(options.clone()))
                    .unwrap_or_default();
            if opts.variant != "standard" {
                tracing::warn!(variant = %opts.variant, "unknown HenHur variant, using standard");
            }
            let mut config = henhur::HenHurConfig::default();
            config.selected_cards = opts.selected_cards;
            let game = HenHurGame::new(roster, config, dice::Dice::from_entropy());
            Ok(ActiveGame::HenHur(game))
        }
        other => bail!("{:?} is not playable on this server yet", other),
    }
}
