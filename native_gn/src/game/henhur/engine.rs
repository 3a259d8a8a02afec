//! Core HenHur state: players, config, constructors and projections.
//!
//! Behavior lives in the sibling modules: race selection and resolution in
//! `race`, bids and drafting in `auction`, turn advancement and the shared
//! auction deck in `flow`.

use std::collections::BTreeMap;

use gn_shared::{
    Card, DeckType, HenHurView, PendingInput, Phase, PlayerId, PlayerStats, PlayerView,
    SelectionPublic, TrackView, TurnEvent, TurnKind,
};

use crate::game::catalog;
use crate::game::deck::PlayerDeck;
use crate::game::dice::Dice;

pub(crate) const MAX_HISTORY: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenCategory {
    Priority,
    Race,
    Auction,
    Wild,
}

#[derive(Clone, Copy, Debug)]
pub struct TokenSpec {
    pub category: TokenCategory,
    pub value: i32,
}

#[derive(Clone, Debug)]
pub struct HenHurConfig {
    pub turns_per_round: u32,
    pub hand_size: usize,
    pub max_tokens: u32,
    pub burn_slots: usize,
    pub spaces_per_lap: i32,
    pub laps_to_win: u32,
    pub token_types: BTreeMap<String, TokenSpec>,
    /// Card ids admitted into the shared auction deck; `None` admits all.
    pub selected_cards: Option<Vec<String>>,
}

impl Default for HenHurConfig {
    fn default() -> Self {
        let mut token_types = BTreeMap::new();
        token_types.insert(
            catalog::TOKEN_PRIORITY.to_owned(),
            TokenSpec {
                category: TokenCategory::Priority,
                value: 1,
            },
        );
        token_types.insert(
            catalog::TOKEN_RACE.to_owned(),
            TokenSpec {
                category: TokenCategory::Race,
                value: 1,
            },
        );
        token_types.insert(
            catalog::TOKEN_AUCTION.to_owned(),
            TokenSpec {
                category: TokenCategory::Auction,
                value: 1,
            },
        );
        token_types.insert(
            catalog::TOKEN_WILD.to_owned(),
            TokenSpec {
                category: TokenCategory::Wild,
                value: 1,
            },
        );
        HenHurConfig {
            turns_per_round: 6,
            hand_size: 5,
            max_tokens: 8,
            burn_slots: 3,
            spaces_per_lap: 12,
            laps_to_win: 3,
            token_types,
            selected_cards: None,
        }
    }
}

/// A committed race selection or auction bid. The card is held by value so
/// resolution does not depend on the hand still containing it.
#[derive(Clone, Debug)]
pub struct Selection {
    pub card: Card,
    pub will_burn: bool,
    pub tokens_used: Vec<String>,
}

#[derive(Debug)]
pub struct HenHurPlayer {
    pub id: PlayerId,
    pub name: String,
    pub connected: bool,
    pub is_bot: bool,
    pub lane: u8,
    pub space: i32,
    pub lap: u32,
    pub tokens: BTreeMap<String, u32>,
    pub burn_slots: Vec<Option<Card>>,
    pub deck: PlayerDeck,
    pub selection: Option<Selection>,
    pub ready: bool,
    pub priority_modifier: i32,
    pub mat: BTreeMap<String, i32>,
    pub stats: PlayerStats,
}

impl HenHurPlayer {
    pub fn token_sum(&self) -> u32 {
        self.tokens.values().sum()
    }

    pub fn token_count(&self, token_type: &str) -> u32 {
        self.tokens.get(token_type).copied().unwrap_or(0)
    }

    pub fn has_empty_burn_slot(&self) -> bool {
        self.burn_slots.iter().any(|s| s.is_none())
    }
}

/// Roster entry handed in by the lobby when a game starts.
#[derive(Clone, Debug)]
pub struct NewPlayer {
    pub id: PlayerId,
    pub name: String,
    pub is_bot: bool,
}

pub struct HenHurGame {
    pub config: HenHurConfig,
    pub players: Vec<HenHurPlayer>,
    pub round: u32,
    pub turn: u32,
    pub phase: Phase,
    pub auction_pool: Vec<Card>,
    pub auction_order: Vec<PlayerId>,
    pub current_drafter: Option<PlayerId>,
    /// Persistent draw source for auction pools; front is the top.
    pub shared_deck: Vec<Card>,
    pub winner: Option<PlayerId>,
    pub pending_input: Option<PendingInput>,
    pub history: Vec<TurnEvent>,
    pub(crate) dice: Dice,
    pub(crate) deck_policy: fn(u32) -> Vec<DeckType>,
    pub(crate) next_instance: u32,
    started: bool,
}

impl HenHurGame {
    pub fn new(roster: Vec<NewPlayer>, config: HenHurConfig, mut dice: Dice) -> Self {
        let mut next_instance = 0;
        let base = catalog::base_deck();
        let players = roster
            .into_iter()
            .map(|p| {
                let mut cards = catalog::expand_deck(&base, &mut next_instance);
                dice.shuffle(&mut cards);
                HenHurPlayer {
                    id: p.id,
                    name: p.name,
                    connected: true,
                    is_bot: p.is_bot,
                    lane: 0,
                    space: 0,
                    lap: 1,
                    tokens: config.token_types.keys().map(|k| (k.clone(), 0)).collect(),
                    burn_slots: vec![None; config.burn_slots],
                    deck: PlayerDeck::new(cards),
                    selection: None,
                    ready: false,
                    priority_modifier: 0,
                    mat: BTreeMap::new(),
                    stats: PlayerStats::default(),
                }
            })
            .collect();

        let mut game = HenHurGame {
            config,
            players,
            round: 1,
            turn: 1,
            phase: Phase::Waiting,
            auction_pool: Vec::new(),
            auction_order: Vec::new(),
            current_drafter: None,
            shared_deck: Vec::new(),
            winner: None,
            pending_input: None,
            history: Vec::new(),
            dice,
            deck_policy: catalog::default_available_decks,
            next_instance,
            started: false,
        };
        game.seed_shared_deck();
        game
    }

    /// Swap the auction-refill policy (which lap decks are available at a
    /// given highest lap). Variants inject their own mapping here.
    pub fn with_deck_policy(mut self, policy: fn(u32) -> Vec<DeckType>) -> Self {
        self.deck_policy = policy;
        self
    }

    fn seed_shared_deck(&mut self) {
        let lap1 = catalog::lap1_deck();
        let admitted: Vec<Card> = match &self.config.selected_cards {
            Some(ids) => lap1.into_iter().filter(|c| ids.contains(&c.id)).collect(),
            None => lap1,
        };
        let mut expanded = catalog::expand_deck(&admitted, &mut self.next_instance);
        self.dice.shuffle(&mut expanded);
        self.shared_deck = expanded;
    }

    /// Idempotent initialization: deal opening hands, reveal the first
    /// auction pool and open turn 1 for selections.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let hand_size = self.config.hand_size;
        for idx in 0..self.players.len() {
            let player = &mut self.players[idx];
            player.deck.draw(hand_size, &mut self.dice);
        }
        self.reveal_pool();
        self.phase = Phase::RaceSelection;
        let names = self.players.iter().map(|p| p.name.clone()).collect();
        self.log(TurnEvent::GameStarted { players: names });
    }

    pub fn turn_kind(&self) -> TurnKind {
        if self.turn % 2 == 1 {
            TurnKind::Race
        } else {
            TurnKind::Auction
        }
    }

    pub fn highest_lap(&self) -> u32 {
        self.players.iter().map(|p| p.lap).max().unwrap_or(1)
    }

    pub(crate) fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub(crate) fn log(&mut self, event: TurnEvent) {
        self.history.push(event);
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(0..excess);
        }
    }

    fn token_bonus(&self, tokens: &[String], wanted: TokenCategory) -> i32 {
        tokens
            .iter()
            .filter_map(|t| self.config.token_types.get(t))
            .filter(|spec| spec.category == wanted || spec.category == TokenCategory::Wild)
            .map(|spec| spec.value)
            .sum()
    }

    pub(crate) fn priority_bonus(&self, tokens: &[String]) -> i32 {
        self.token_bonus(tokens, TokenCategory::Priority)
    }

    pub(crate) fn race_bonus(&self, tokens: &[String]) -> i32 {
        self.token_bonus(tokens, TokenCategory::Race)
    }

    pub(crate) fn auction_bonus(&self, tokens: &[String]) -> i32 {
        self.token_bonus(tokens, TokenCategory::Auction)
    }

    /// Players whose input gates the current phase: everyone connected plus
    /// every bot.
    pub(crate) fn all_ready(&self) -> bool {
        let mut any = false;
        for p in &self.players {
            if p.connected || p.is_bot {
                any = true;
                if !p.ready {
                    return false;
                }
            }
        }
        any
    }

    /// Non-human players whose action is awaited in the current phase.
    pub fn pending_bots(&self) -> Vec<PlayerId> {
        match self.phase {
            Phase::RaceSelection | Phase::AuctionSelection => self
                .players
                .iter()
                .filter(|p| p.is_bot && !p.ready)
                .map(|p| p.id)
                .collect(),
            Phase::AuctionDrafting => self
                .current_drafter
                .filter(|id| {
                    self.player_index(*id)
                        .map(|idx| self.players[idx].is_bot)
                        .unwrap_or(false)
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Rebind a player's transient connection identity, by old id first and
    /// by display name as a fallback.
    pub fn on_player_reconnect(&mut self, old: PlayerId, new: PlayerId, name: &str) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == old) {
            player.id = new;
            player.connected = true;
            return;
        }
        if let Some(player) = self.players.iter_mut().find(|p| p.name == name) {
            player.id = new;
            player.connected = true;
            return;
        }
        tracing::warn!(%old, %new, name, "reconnect found no matching player");
    }

    pub fn set_connected(&mut self, id: PlayerId, connected: bool) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.connected = connected;
        }
        // A departure can leave everyone else ready; re-check the gate.
        if !connected {
            self.check_selection_gate();
        }
    }

    pub fn rename_player(&mut self, id: PlayerId, new_name: &str) {
        if let Some(player) = self.players.iter_mut().find(|p| p.id == id) {
            player.name = new_name.to_owned();
        }
    }

    /// Per-viewer projection: the viewer's own entry carries the full hand
    /// and pending selection; everyone else is a public snapshot. During
    /// reveal phases committed selections are visible to all.
    pub fn view_for(&self, viewer: PlayerId) -> HenHurView {
        let revealing = matches!(self.phase, Phase::RaceReveal | Phase::AuctionReveal);
        let players = self
            .players
            .iter()
            .map(|p| {
                let own = p.id == viewer;
                let selection = if own || revealing {
                    p.selection.as_ref().map(|s| SelectionPublic {
                        card: s.card.clone(),
                        will_burn: s.will_burn,
                        tokens_used: s.tokens_used.clone(),
                    })
                } else {
                    None
                };
                PlayerView {
                    id: p.id,
                    name: p.name.clone(),
                    connected: p.connected,
                    is_bot: p.is_bot,
                    lane: p.lane,
                    space: p.space,
                    lap: p.lap,
                    hand_count: p.deck.hand.len(),
                    draw_count: p.deck.draw.len(),
                    discard_count: p.deck.discard.len(),
                    tokens: p.tokens.clone(),
                    burn_slots: p.burn_slots.clone(),
                    ready: p.ready,
                    stats: p.stats,
                    hand: own.then(|| p.deck.hand.clone()),
                    selection,
                    priority_modifier: own.then_some(p.priority_modifier),
                    mat: own.then(|| p.mat.clone()),
                }
            })
            .collect();

        HenHurView {
            round: self.round,
            turn: self.turn,
            turn_kind: self.turn_kind(),
            phase: self.phase,
            track: TrackView {
                spaces_per_lap: self.config.spaces_per_lap,
                laps_to_win: self.config.laps_to_win,
            },
            players,
            auction_pool: self.auction_pool.clone(),
            auction_order: self.auction_order.clone(),
            current_drafter: self.current_drafter,
            winner: self.winner,
            pending_input: self.pending_input.clone(),
            history: self.history.clone(),
        }
    }
}

#[cfg(test)]
impl HenHurGame {
    /// A started game over `count` players with scripted dice: shuffles are
    /// identity and rolls pop from `rolls` in order of use.
    pub(crate) fn test_game(count: usize, config: HenHurConfig, rolls: Vec<i32>) -> Self {
        let roster = (0..count)
            .map(|i| NewPlayer {
                id: PlayerId(i as u64 + 1),
                name: format!("P{}", i + 1),
                is_bot: false,
            })
            .collect();
        let mut game = HenHurGame::new(roster, config, Dice::scripted(rolls));
        game.start();
        game
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gn_shared::Priority;

    #[test]
    fn start_deals_hands_and_reveals_the_first_pool() {
        let game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        assert_eq!(game.phase, Phase::RaceSelection);
        assert_eq!((game.round, game.turn), (1, 1));
        assert_eq!(game.turn_kind(), TurnKind::Race);
        for player in &game.players {
            assert_eq!(player.deck.hand.len(), game.config.hand_size);
            assert_eq!(player.lap, 1);
            assert_eq!(player.space, 0);
        }
        // auction pool is player count + 1, revealed eagerly at game start
        assert_eq!(game.auction_pool.len(), 3);
    }

    #[test]
    fn start_is_idempotent() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        let hand_before = game.players[0].deck.hand.len();
        let pool_before: Vec<String> =
            game.auction_pool.iter().map(|c| c.key().to_owned()).collect();
        game.start();
        assert_eq!(game.players[0].deck.hand.len(), hand_before);
        let pool_after: Vec<String> =
            game.auction_pool.iter().map(|c| c.key().to_owned()).collect();
        assert_eq!(pool_before, pool_after);
    }

    #[test]
    fn views_hide_other_hands_but_share_turn_state() {
        let game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        let view = game.view_for(PlayerId(1));
        assert!(view.players[0].hand.is_some());
        assert!(view.players[1].hand.is_none());
        assert_eq!(view.players[1].hand_count, game.config.hand_size);
        assert_eq!(view.auction_pool.len(), 3);
        assert_eq!(view.track.laps_to_win, game.config.laps_to_win);
    }

    #[test]
    fn reveal_phase_exposes_selections_to_everyone() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        let key = game.players[0].deck.hand[0].key().to_owned();
        game.submit_selection(PlayerId(1), &key, false, vec![]).unwrap();

        // still selection phase: only the owner sees their commitment
        let view = game.view_for(PlayerId(2));
        assert!(view.players[0].selection.is_none());

        let key2 = game.players[1].deck.hand[0].key().to_owned();
        game.submit_selection(PlayerId(2), &key2, false, vec![]).unwrap();
        assert_eq!(game.phase, Phase::RaceReveal);
        let view = game.view_for(PlayerId(2));
        assert!(view.players[0].selection.is_some());
    }

    #[test]
    fn pending_bots_tracks_phase_and_readiness() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        game.players[1].is_bot = true;
        assert_eq!(game.pending_bots(), vec![PlayerId(2)]);

        let key = game.players[1].deck.hand[0].key().to_owned();
        game.submit_selection(PlayerId(2), &key, false, vec![]).unwrap();
        assert!(game.pending_bots().is_empty());
    }

    #[test]
    fn reconnect_rebinds_by_id_then_by_name() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        game.set_connected(PlayerId(1), false);

        game.on_player_reconnect(PlayerId(1), PlayerId(9), "P1");
        assert_eq!(game.players[0].id, PlayerId(9));
        assert!(game.players[0].connected);

        // stale old id falls back to the display-name match
        game.on_player_reconnect(PlayerId(42), PlayerId(11), "P2");
        assert_eq!(game.players[1].id, PlayerId(11));
    }

    #[test]
    fn priority_roll_uses_base_plus_die() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![4]);
        let rolled = game.dice.roll_priority(&Priority::Rolled {
            base: 2,
            dice: "d6".into(),
        });
        assert_eq!(rolled, 6);
    }
}
