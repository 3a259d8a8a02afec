//! Bot registry and the HenHur bot brains.
//!
//! The registry is process-wide: a map of bot identities plus one handler
//! per game type. Handlers advertise playable styles, invent themed names,
//! report which bots owe an action, shape humanized delays and make the
//! style-specific decision. Bots act through exactly the same action
//! interface as humans.

use std::collections::HashMap;
use std::sync::Mutex;

use gn_shared::{Card, CardEffect, GameType, Phase, PlayerId, TokenAction};

use crate::config::Config;
use crate::game::henhur::{HenHurGame, HenHurPlayer, TokenCategory};
use crate::game::{ActiveGame, GameAction};

#[derive(Clone, Copy, Debug)]
pub struct BotStyle {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub difficulty: u8,
}

#[derive(Clone, Debug)]
pub struct BotInfo {
    pub display_name: String,
    pub style: String,
    pub game_type: GameType,
}

pub trait BotHandler: Send + Sync {
    fn available_styles(&self) -> &'static [BotStyle];

    /// Pick a themed display name not already taken in the lobby.
    fn generate_name(&self, style: &str, taken: &[String]) -> String;

    fn pending_bots(&self, game: &ActiveGame) -> Vec<PlayerId>;

    /// Humanized reaction time: a style-scaled base, a stagger per batch
    /// position and a uniform jitter.
    fn action_delay_ms(&self, config: &Config, style: &str, index: usize) -> u64;

    fn choose(&self, bot: PlayerId, style: &str, game: &ActiveGame) -> Option<GameAction>;
}

pub struct BotRegistry {
    handlers: HashMap<GameType, Box<dyn BotHandler>>,
    bots: Mutex<HashMap<PlayerId, BotInfo>>,
}

impl BotRegistry {
    pub fn new() -> Self {
        let mut handlers: HashMap<GameType, Box<dyn BotHandler>> = HashMap::new();
        handlers.insert(GameType::HenHur, Box::new(HenHurBots));
        BotRegistry {
            handlers,
            bots: Mutex::new(HashMap::new()),
        }
    }

    pub fn handler(&self, game_type: GameType) -> Option<&dyn BotHandler> {
        self.handlers.get(&game_type).map(|h| h.as_ref())
    }

    pub fn register_bot(&self, id: PlayerId, display_name: &str, style: &str, game_type: GameType) {
        self.bots.lock().expect("bot registry poisoned").insert(
            id,
            BotInfo {
                display_name: display_name.to_owned(),
                style: style.to_owned(),
                game_type,
            },
        );
    }

    pub fn remove_bot(&self, id: PlayerId) {
        self.bots.lock().expect("bot registry poisoned").remove(&id);
    }

    pub fn style_of(&self, id: PlayerId) -> Option<String> {
        self.bots
            .lock()
            .expect("bot registry poisoned")
            .get(&id)
            .map(|info| info.style.clone())
    }
}

impl Default for BotRegistry {
    fn default() -> Self {
        BotRegistry::new()
    }
}

const STEADY: &str = "steady";
const FIREBRAND: &str = "firebrand";
const MAGPIE: &str = "magpie";

static HENHUR_STYLES: [BotStyle; 3] = [
    BotStyle {
        id: STEADY,
        name: "Steady Beak",
        description: "Plays the fastest card it holds and never burns.",
        difficulty: 1,
    },
    BotStyle {
        id: FIREBRAND,
        name: "Firebrand",
        description: "Burns early and spends tokens for speed.",
        difficulty: 2,
    },
    BotStyle {
        id: MAGPIE,
        name: "Magpie",
        description: "Hoards tokens and bids hard for drafts.",
        difficulty: 2,
    },
];

fn style_names(style: &str) -> &'static [&'static str] {
    match style {
        FIREBRAND => &["Scorch", "Road Rooster", "Hot Wing", "Kentucky Fury"],
        MAGPIE => &["Nest Egg", "Coop Keeper", "Greedy Gizzard", "Shiny"],
        _ => &["Henrietta", "Clucky", "Omelette", "Benedict"],
    }
}

/// The HenHur bot handler.
pub struct HenHurBots;

impl HenHurBots {
    fn player<'g>(game: &'g HenHurGame, bot: PlayerId) -> Option<&'g HenHurPlayer> {
        game.players.iter().find(|p| p.id == bot)
    }

    /// Every spendable token of the given category (wild included),
    /// repeated per count held.
    fn tokens_of(game: &HenHurGame, player: &HenHurPlayer, category: TokenCategory) -> Vec<String> {
        let mut out = Vec::new();
        for (token_type, spec) in &game.config.token_types {
            if spec.category == category || spec.category == TokenCategory::Wild {
                for _ in 0..player.token_count(token_type) {
                    out.push(token_type.clone());
                }
            }
        }
        out
    }

    fn gains_tokens(card: &Card) -> bool {
        card.effect.iter().any(|e| {
            matches!(
                e,
                CardEffect::AffectTokenPool {
                    action: TokenAction::Gain,
                    ..
                }
            )
        })
    }

    fn race_pick<'h>(style: &str, hand: &'h [Card]) -> Option<&'h Card> {
        match style {
            MAGPIE => hand
                .iter()
                .max_by_key(|c| (Self::gains_tokens(c) as i32, c.race_number)),
            _ => hand.iter().max_by_key(|c| c.race_number),
        }
    }

    fn bid_pick<'h>(style: &str, hand: &'h [Card]) -> Option<&'h Card> {
        match style {
            STEADY => hand.iter().min_by_key(|c| c.trick_number),
            _ => hand.iter().max_by_key(|c| c.trick_number),
        }
    }
}

impl BotHandler for HenHurBots {
    fn available_styles(&self) -> &'static [BotStyle] {
        &HENHUR_STYLES
    }

    fn generate_name(&self, style: &str, taken: &[String]) -> String {
        let pool = style_names(style);
        for name in pool {
            if !taken.iter().any(|t| t == name) {
                return (*name).to_owned();
            }
        }
        let mut n = 2;
        loop {
            let candidate = format!("{} {}", pool[0], n);
            if !taken.iter().any(|t| *t == candidate) {
                return candidate;
            }
            n += 1;
        }
    }

    fn pending_bots(&self, game: &ActiveGame) -> Vec<PlayerId> {
        game.pending_bots()
    }

    fn action_delay_ms(&self, config: &Config, style: &str, index: usize) -> u64 {
        let base = match style {
            FIREBRAND => config.bot_base_delay_ms * 3 / 4,
            MAGPIE => config.bot_base_delay_ms * 5 / 4,
            _ => config.bot_base_delay_ms,
        };
        let jitter = if config.bot_jitter_ms == 0 {
            0
        } else {
            let now_ns = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.subsec_nanos() as u64)
                .unwrap_or(0);
            now_ns % config.bot_jitter_ms
        };
        base + index as u64 * config.bot_stagger_ms + jitter
    }

    fn choose(&self, bot: PlayerId, style: &str, game: &ActiveGame) -> Option<GameAction> {
        let ActiveGame::HenHur(game) = game;
        let player = Self::player(game, bot)?;
        match game.phase {
            Phase::RaceSelection => {
                let card = Self::race_pick(style, &player.deck.hand)?;
                let will_burn = style == FIREBRAND
                    && !card.burn_effect.is_empty()
                    && player.has_empty_burn_slot();
                let tokens_used = if style == FIREBRAND {
                    Self::tokens_of(game, player, TokenCategory::Race)
                } else {
                    Vec::new()
                };
                Some(GameAction::SelectCard {
                    card: card.key().to_owned(),
                    will_burn,
                    tokens_used,
                })
            }
            Phase::AuctionSelection => {
                let card = Self::bid_pick(style, &player.deck.hand)?;
                let will_burn = style == FIREBRAND
                    && !card.burn_effect.is_empty()
                    && player.has_empty_burn_slot();
                let tokens_used = if style == MAGPIE {
                    Self::tokens_of(game, player, TokenCategory::Auction)
                } else {
                    Vec::new()
                };
                Some(GameAction::PlaceBid {
                    card: card.key().to_owned(),
                    will_burn,
                    tokens_used,
                })
            }
            Phase::AuctionDrafting => {
                let pick = match style {
                    MAGPIE => game.auction_pool.iter().max_by_key(|c| c.trick_number),
                    _ => game.auction_pool.iter().max_by_key(|c| c.race_number),
                }?;
                Some(GameAction::DraftCard {
                    card: pick.key().to_owned(),
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_avoid_collisions() {
        let bots = HenHurBots;
        let mut taken: Vec<String> = Vec::new();
        for _ in 0..6 {
            let name = bots.generate_name(STEADY, &taken);
            assert!(!taken.contains(&name));
            taken.push(name);
        }
    }

    #[test]
    fn delays_stagger_by_batch_index() {
        let bots = HenHurBots;
        let mut config = Config::default();
        config.bot_jitter_ms = 0;
        let first = bots.action_delay_ms(&config, STEADY, 0);
        let second = bots.action_delay_ms(&config, STEADY, 1);
        assert_eq!(second - first, config.bot_stagger_ms);
    }

    #[test]
    fn styles_are_advertised() {
        let bots = HenHurBots;
        let styles = bots.available_styles();
        assert!(styles.iter().any(|s| s.id == STEADY));
        assert!(styles.iter().any(|s| s.id == FIREBRAND));
        assert!(styles.iter().any(|s| s.id == MAGPIE));
    }
}
