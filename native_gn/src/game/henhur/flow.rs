//! Turn advancement, the reveal gate, win detection and the shared
//! auction deck.

use anyhow::Result;
use gn_shared::{Card, Phase, TurnEvent, TurnKind};

use crate::game::catalog;

use super::engine::HenHurGame;

impl HenHurGame {
    /// Move a selection phase into its reveal phase once every connected
    /// player (and every bot) has committed. Also called after disconnects,
    /// which can remove the last missing commitment.
    pub(crate) fn check_selection_gate(&mut self) {
        if !self.all_ready() {
            return;
        }
        match self.phase {
            Phase::RaceSelection => self.phase = Phase::RaceReveal,
            Phase::AuctionSelection => self.phase = Phase::AuctionReveal,
            _ => {}
        }
    }

    /// Whether the server should arm the bounded reveal delay.
    pub fn awaiting_reveal(&self) -> bool {
        matches!(self.phase, Phase::RaceReveal | Phase::AuctionReveal)
    }

    /// Timer re-entry point: resolve whichever reveal is pending. Returns
    /// false when the phase moved on before the timer fired.
    pub fn resolve_reveal(&mut self) -> Result<bool> {
        match self.phase {
            Phase::RaceReveal => {
                self.resolve_race()?;
                Ok(true)
            }
            Phase::AuctionReveal => {
                self.resolve_auction()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// After race resolution: declare a winner if anyone has finished,
    /// otherwise advance the turn. Among several finishers the one furthest
    /// along the lap wins.
    pub(crate) fn check_win_or_advance(&mut self) {
        let mut candidates: Vec<usize> = (0..self.players.len())
            .filter(|idx| self.players[*idx].lap > self.config.laps_to_win)
            .collect();
        if candidates.is_empty() {
            self.advance_turn();
            return;
        }
        candidates.sort_by(|a, b| self.players[*b].space.cmp(&self.players[*a].space));
        let winner = self.players[candidates[0]].id;
        self.winner = Some(winner);
        self.phase = Phase::GameOver;
        self.log(TurnEvent::WinnerDeclared { player: winner });
    }

    /// Clear per-turn state and open the next turn's selection phase. The
    /// auction pool is retained across turns so clients can keep showing
    /// it; a fresh pool is revealed when a race turn begins with the pool
    /// consumed, so bids can be planned during the race.
    pub(crate) fn advance_turn(&mut self) {
        for player in &mut self.players {
            player.selection = None;
            player.ready = false;
        }
        self.auction_order.clear();
        self.current_drafter = None;
        self.pending_input = None;

        self.turn += 1;
        if self.turn > self.config.turns_per_round {
            self.round += 1;
            self.turn = 1;
        }
        let kind = self.turn_kind();
        self.phase = match kind {
            TurnKind::Race => Phase::RaceSelection,
            TurnKind::Auction => Phase::AuctionSelection,
        };
        self.log(TurnEvent::TurnAdvanced {
            round: self.round,
            turn: self.turn,
            kind,
        });

        if self.auction_pool.is_empty() {
            self.reveal_pool();
        }
    }

    /// Slice the next auction pool (player count + 1 cards) off the shared
    /// deck, refilling the deck first when it runs short.
    pub(crate) fn reveal_pool(&mut self) {
        let need = self.players.len() + 1;
        if self.shared_deck.len() < need {
            self.refill_shared_deck();
        }
        let take = need.min(self.shared_deck.len());
        self.auction_pool = self.shared_deck.drain(..take).collect();
        self.log(TurnEvent::PoolRevealed { count: take });
    }

    /// Extend the shared deck from every deck the refill policy makes
    /// available at the current highest lap. The refill batch is expanded
    /// by copies, stamped and shuffled; existing deck order is preserved.
    fn refill_shared_deck(&mut self) {
        let decks = (self.deck_policy)(self.highest_lap());
        let mut batch: Vec<Card> = Vec::new();
        for deck in decks {
            let cards = catalog::deck_cards(deck);
            let admitted: Vec<Card> = match &self.config.selected_cards {
                Some(ids) => cards.into_iter().filter(|c| ids.contains(&c.id)).collect(),
                None => cards,
            };
            batch.extend(catalog::expand_deck(&admitted, &mut self.next_instance));
        }
        self.dice.shuffle(&mut batch);
        self.shared_deck.extend(batch);
    }
}
