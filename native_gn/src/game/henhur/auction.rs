//! Auction turns: bids, value ordering and the draft.

use anyhow::{bail, Result};
use gn_shared::{Phase, PlayerId, TurnEvent};

use super::engine::{HenHurGame, Selection};

impl HenHurGame {
    /// Commit an auction bid. Validation matches race selections, plus a
    /// bid may only elect to burn a card that has a burn effect.
    pub fn submit_bid(
        &mut self,
        player: PlayerId,
        card_key: &str,
        will_burn: bool,
        tokens_used: Vec<String>,
    ) -> Result<()> {
        if self.winner.is_some() {
            bail!("the race is over");
        }
        if self.phase != Phase::AuctionSelection {
            bail!("bids are not open right now");
        }
        let idx = self
            .player_index(player)
            .ok_or_else(|| anyhow::anyhow!("unknown player"))?;
        self.validate_commit(idx, card_key, will_burn, &tokens_used)?;

        let card = self.players[idx]
            .deck
            .hand_card(card_key)
            .cloned()
            .expect("validated in hand");
        if will_burn && card.burn_effect.is_empty() {
            bail!("this card cannot be burned in auctions");
        }

        self.players[idx].selection = Some(Selection {
            card,
            will_burn,
            tokens_used,
        });
        self.players[idx].ready = true;
        self.check_selection_gate();
        Ok(())
    }

    /// Order the revealed bids into the draft order and spend the bid
    /// cards. Bid value is the card's trick number plus auction token
    /// bonuses; ties break on a fresh priority roll, then lower index.
    pub(crate) fn resolve_auction(&mut self) -> Result<()> {
        if self.phase != Phase::AuctionReveal {
            bail!("no auction to resolve");
        }

        let mut order: Vec<(usize, i32, i32)> = Vec::new();
        for idx in 0..self.players.len() {
            let Some(selection) = self.players[idx].selection.clone() else {
                continue;
            };
            let value = selection.card.trick_number + self.auction_bonus(&selection.tokens_used);
            let tiebreak = self.dice.roll_priority(&selection.card.priority);
            order.push((idx, value, tiebreak));
        }
        order.sort_by(|a, b| (b.1, b.2).cmp(&(a.1, a.2)));

        for (idx, value, _) in &order {
            let selection = self.players[*idx]
                .selection
                .take()
                .expect("bid collected above");
            self.spend_bid(*idx, &selection, *value);
        }

        self.auction_order = order
            .iter()
            .map(|(idx, _, _)| self.players[*idx].id)
            .collect();

        if self.auction_order.is_empty() {
            self.advance_turn();
            return Ok(());
        }
        self.current_drafter = self.auction_order.first().copied();
        self.phase = Phase::AuctionDrafting;
        Ok(())
    }

    fn spend_bid(&mut self, idx: usize, selection: &Selection, value: i32) {
        let player_id = self.players[idx].id;
        let bid = self.players[idx]
            .deck
            .take_from_hand(selection.card.key())
            .expect("bid card still in hand");

        if selection.will_burn {
            let slot = self.players[idx]
                .burn_slots
                .iter_mut()
                .find(|s| s.is_none())
                .expect("validated at bid time");
            *slot = Some(bid);
            self.players[idx].stats.cards_burned += 1;
            self.run_effects(idx, &selection.card.burn_effect, true);
        } else {
            // a discarded bid is spent as currency; its play effect does not fire
            self.players[idx].deck.discard_card(bid);
        }

        self.consume_tokens(idx, &selection.tokens_used);
        if self.players[idx].deck.hand.is_empty() {
            let hand_size = self.config.hand_size;
            self.players[idx].deck.draw(hand_size, &mut self.dice);
        }

        self.log(TurnEvent::BidRevealed {
            player: player_id,
            card: selection.card.title.clone(),
            value,
        });
        self.players[idx].ready = false;
    }

    /// Take one card from the pool, in draft order. The drafted card goes
    /// on top of the drafter's draw pile. When the last drafter picks, the
    /// leftover pool is discarded and the turn advances.
    pub fn draft_card(&mut self, player: PlayerId, card_key: &str) -> Result<()> {
        if self.winner.is_some() {
            bail!("the race is over");
        }
        if self.phase != Phase::AuctionDrafting {
            bail!("drafting is not open right now");
        }
        if self.current_drafter != Some(player) {
            bail!("it is not your turn to draft");
        }
        let idx = self
            .player_index(player)
            .ok_or_else(|| anyhow::anyhow!("unknown player"))?;
        let Some(pos) = self.auction_pool.iter().position(|c| c.key() == card_key) else {
            bail!("that card is not in the pool");
        };

        let card = self.auction_pool.remove(pos);
        self.log(TurnEvent::Drafted {
            player,
            card: card.title.clone(),
        });
        self.players[idx].deck.place_on_top(card);

        let drafted_so_far = self
            .auction_order
            .iter()
            .position(|id| *id == player)
            .expect("drafter comes from auction order")
            + 1;
        if drafted_so_far >= self.auction_order.len() {
            let leftover = self.auction_pool.len();
            if leftover > 0 {
                self.log(TurnEvent::PoolDiscarded { count: leftover });
            }
            self.auction_pool.clear();
            self.current_drafter = None;
            self.advance_turn();
        } else {
            self.current_drafter = Some(self.auction_order[drafted_so_far]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::{HenHurConfig, HenHurGame};
    use gn_shared::{Card, CardEffect, DeckType, Phase, PlayerId, Priority, TurnKind};

    fn bid_card(id: &str, trick_number: i32, priority: Priority) -> Card {
        Card {
            id: id.into(),
            title: id.into(),
            deck_type: DeckType::Lap1,
            trick_number,
            race_number: 1,
            priority,
            text: String::new(),
            effect: vec![],
            burn_effect: vec![],
            copies: 1,
            instance_id: Some(id.into()),
        }
    }

    fn auction_game() -> HenHurGame {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        game.turn = 2;
        game.phase = Phase::AuctionSelection;
        game
    }

    /// Equal bid values fall back to a fresh priority roll of the bid card.
    #[test]
    fn auction_value_ties_break_on_rolled_priority() {
        let mut game = auction_game();
        game.players[0].deck.hand = vec![bid_card("b1", 6, Priority::Fixed(3))];
        game.players[1].deck.hand = vec![bid_card("b2", 6, Priority::Fixed(5))];

        game.submit_bid(PlayerId(1), "b1", false, vec![]).unwrap();
        game.submit_bid(PlayerId(2), "b2", false, vec![]).unwrap();
        assert_eq!(game.phase, Phase::AuctionReveal);
        game.resolve_reveal().unwrap();

        assert_eq!(game.auction_order, vec![PlayerId(2), PlayerId(1)]);
        assert_eq!(game.auction_pool.len(), 3);
        assert_eq!(game.current_drafter, Some(PlayerId(2)));
        assert_eq!(game.phase, Phase::AuctionDrafting);
    }

    /// Leftover pool cards are discarded when drafting finishes, never
    /// returned to the shared deck.
    #[test]
    fn draft_leftovers_are_discarded_not_returned() {
        let mut game = auction_game();
        game.phase = Phase::AuctionDrafting;
        game.auction_pool = vec![
            bid_card("a", 1, Priority::Fixed(1)),
            bid_card("b", 2, Priority::Fixed(1)),
            bid_card("c", 3, Priority::Fixed(1)),
        ];
        game.auction_order = vec![PlayerId(1), PlayerId(2)];
        game.current_drafter = Some(PlayerId(1));

        game.draft_card(PlayerId(1), "a").unwrap();
        assert_eq!(game.current_drafter, Some(PlayerId(2)));
        game.draft_card(PlayerId(2), "c").unwrap();

        // drafted cards sit on top of the draw piles
        assert_eq!(game.players[0].deck.draw.front().unwrap().key(), "a");
        assert_eq!(game.players[1].deck.draw.front().unwrap().key(), "c");

        // the leftover card is gone for good
        assert!(game.shared_deck.iter().all(|card| card.key() != "b"));
        assert!(game.auction_pool.iter().all(|card| card.key() != "b"));

        // drafting completion advanced into the next race turn
        assert_eq!(game.turn, 3);
        assert_eq!(game.turn_kind(), TurnKind::Race);
        assert_eq!(game.phase, Phase::RaceSelection);
        assert_eq!(game.current_drafter, None);
    }

    #[test]
    fn drafting_out_of_turn_is_rejected() {
        let mut game = auction_game();
        game.phase = Phase::AuctionDrafting;
        game.auction_pool = vec![bid_card("a", 1, Priority::Fixed(1))];
        game.auction_order = vec![PlayerId(1), PlayerId(2)];
        game.current_drafter = Some(PlayerId(1));

        let err = game.draft_card(PlayerId(2), "a").unwrap_err();
        assert!(err.to_string().contains("not your turn"));
        assert_eq!(game.auction_pool.len(), 1);
    }

    #[test]
    fn bids_cannot_burn_cards_without_burn_effects() {
        let mut game = auction_game();
        game.players[0].deck.hand = vec![bid_card("plain", 4, Priority::Fixed(1))];

        let err = game
            .submit_bid(PlayerId(1), "plain", true, vec![])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "this card cannot be burned in auctions"
        );
        assert!(!game.players[0].ready);
    }

    #[test]
    fn auction_tokens_raise_bid_value_and_burns_fire() {
        let mut game = auction_game();
        let mut burnable = bid_card("burnable", 2, Priority::Fixed(1));
        burnable.burn_effect = vec![CardEffect::ModifyPriority { adjustment: 3 }];
        game.players[0].deck.hand = vec![burnable];
        game.players[0].tokens.insert("A+".into(), 2);
        game.players[1].deck.hand = vec![bid_card("rich", 3, Priority::Fixed(9))];

        game.submit_bid(PlayerId(1), "burnable", true, vec!["A+".into(), "A+".into()])
            .unwrap();
        game.submit_bid(PlayerId(2), "rich", false, vec![]).unwrap();
        game.resolve_reveal().unwrap();

        // 2 + 2 auction tokens beats 3
        assert_eq!(game.auction_order.first(), Some(&PlayerId(1)));
        assert_eq!(game.players[0].token_count("A+"), 0);
        assert_eq!(game.players[0].stats.cards_burned, 1);
        // the burn effect survives into the next race's priority computation
        assert_eq!(game.players[0].priority_modifier, 3);
        // the losing bid is spent as currency: no play effect, just discard
        assert_eq!(game.players[1].deck.discard.len(), 1);
    }
}
