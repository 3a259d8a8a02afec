//! Race turns: selection intake and priority-ordered resolution.

use anyhow::{bail, Result};
use gn_shared::{Phase, PlayerId, TurnEvent};

use crate::game::effects::{self, EffectContext};

use super::engine::{HenHurGame, Selection};

impl HenHurGame {
    /// Commit a race selection: a card from hand, a burn election and the
    /// tokens to spend on bonuses. The turn resolves once every connected
    /// player has committed.
    pub fn submit_selection(
        &mut self,
        player: PlayerId,
        card_key: &str,
        will_burn: bool,
        tokens_used: Vec<String>,
    ) -> Result<()> {
        if self.winner.is_some() {
            bail!("the race is over");
        }
        if self.phase != Phase::RaceSelection {
            bail!("selections are not open right now");
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
        self.players[idx].selection = Some(Selection {
            card,
            will_burn,
            tokens_used,
        });
        self.players[idx].ready = true;
        self.check_selection_gate();
        Ok(())
    }

    /// Shared validation for race selections and auction bids.
    pub(crate) fn validate_commit(
        &self,
        idx: usize,
        card_key: &str,
        will_burn: bool,
        tokens_used: &[String],
    ) -> Result<()> {
        let player = &self.players[idx];
        if player.ready {
            bail!("you have already committed this turn");
        }
        if player.deck.hand_card(card_key).is_none() {
            bail!("that card is not in your hand");
        }
        // duplicates consume multiple tokens of the same type
        for token in tokens_used {
            let wanted = tokens_used.iter().filter(|t| *t == token).count() as u32;
            if player.token_count(token) < wanted {
                bail!("not enough {token} tokens");
            }
        }
        if will_burn && !player.has_empty_burn_slot() {
            bail!("all burn slots are full");
        }
        Ok(())
    }

    /// Execute the revealed selections in descending priority order.
    /// Ties resolve to the lower player index (stable sort).
    pub(crate) fn resolve_race(&mut self) -> Result<()> {
        if self.phase != Phase::RaceReveal {
            bail!("no race to resolve");
        }
        self.phase = Phase::RaceResolution;

        let mut order: Vec<(usize, i32)> = Vec::new();
        for idx in 0..self.players.len() {
            let Some(selection) = self.players[idx].selection.clone() else {
                continue;
            };
            let rolled = self.dice.roll_priority(&selection.card.priority);
            let total = rolled
                + self.players[idx].priority_modifier
                + self.priority_bonus(&selection.tokens_used);
            order.push((idx, total));
        }
        order.sort_by(|a, b| b.1.cmp(&a.1));

        for (idx, priority) in order {
            let selection = self.players[idx]
                .selection
                .take()
                .expect("selection collected above");
            self.resolve_one_play(idx, &selection, priority);
        }

        self.check_win_or_advance();
        Ok(())
    }

    fn resolve_one_play(&mut self, idx: usize, selection: &Selection, priority: i32) {
        let distance = selection.card.race_number + self.race_bonus(&selection.tokens_used);
        let before = self.players[idx].lap;
        let after = effects::apply_move(
            &mut self.players[idx],
            distance,
            self.config.spaces_per_lap,
        );
        let player_id = self.players[idx].id;
        for lap in (before + 1)..=after {
            self.log(TurnEvent::LapCompleted {
                player: player_id,
                lap,
            });
        }

        let played = self.players[idx]
            .deck
            .take_from_hand(selection.card.key())
            .expect("selected card still in hand");

        if selection.will_burn {
            let slot = self.players[idx]
                .burn_slots
                .iter_mut()
                .find(|s| s.is_none())
                .expect("validated at selection time");
            *slot = Some(played);
            self.players[idx].stats.cards_burned += 1;
            self.run_effects(idx, &selection.card.burn_effect, true);
        } else {
            self.players[idx].deck.discard_card(played);
            self.run_effects(idx, &selection.card.effect, false);
        }

        self.players[idx].stats.cards_played += 1;
        self.consume_tokens(idx, &selection.tokens_used);

        if self.players[idx].deck.hand.is_empty() {
            let hand_size = self.config.hand_size;
            self.players[idx].deck.draw(hand_size, &mut self.dice);
        }

        self.log(TurnEvent::CardPlayed {
            player: player_id,
            card: selection.card.title.clone(),
            burned: selection.will_burn,
            distance,
            priority,
        });

        let player = &mut self.players[idx];
        player.ready = false;
        player.priority_modifier = 0;
    }

    pub(crate) fn run_effects(
        &mut self,
        actor: usize,
        effects_list: &[gn_shared::CardEffect],
        is_burn: bool,
    ) {
        let run = effects::execute(
            effects_list,
            EffectContext {
                actor,
                target: None,
                is_burn,
            },
            &mut self.players,
            &self.config,
            &mut self.dice,
        );
        if let Some(pending) = run.pending {
            if self.pending_input.is_none() {
                self.pending_input = Some(pending);
            }
        }
    }

    pub(crate) fn consume_tokens(&mut self, idx: usize, tokens_used: &[String]) {
        for token in tokens_used {
            if let Some(count) = self.players[idx].tokens.get_mut(token) {
                *count = count.saturating_sub(1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::engine::{HenHurConfig, HenHurGame};
    use gn_shared::{Card, DeckType, Phase, PlayerId, Priority, TurnEvent};

    fn racer(id: &str, race_number: i32, priority: Priority) -> Card {
        Card {
            id: id.into(),
            title: id.into(),
            deck_type: DeckType::Base,
            trick_number: 1,
            race_number,
            priority,
            text: String::new(),
            effect: vec![],
            burn_effect: vec![],
            copies: 1,
            instance_id: Some(id.into()),
        }
    }

    /// Two racers contest priority; equal totals resolve to the lower
    /// player index.
    #[test]
    fn race_priority_orders_resolution_with_index_tiebreak() {
        let config = HenHurConfig {
            spaces_per_lap: 12,
            ..Default::default()
        };
        // priority rolls: P1 gets 3 (total 1+3=4), P2 gets 2 (total 2+2=4)
        let mut game = HenHurGame::test_game(2, config, vec![3, 2]);
        game.players[0].deck.hand = vec![racer(
            "r1",
            3,
            Priority::Rolled {
                base: 1,
                dice: "d4".into(),
            },
        )];
        game.players[1].deck.hand = vec![racer(
            "r2",
            5,
            Priority::Rolled {
                base: 2,
                dice: "d4".into(),
            },
        )];

        game.submit_selection(PlayerId(1), "r1", false, vec![]).unwrap();
        game.submit_selection(PlayerId(2), "r2", false, vec![]).unwrap();
        assert_eq!(game.phase, Phase::RaceReveal);
        game.resolve_reveal().unwrap();

        assert_eq!(game.players[0].space, 3);
        assert_eq!(game.players[1].space, 5);
        assert_eq!(game.players[0].lap, 1);
        assert_eq!(game.players[1].lap, 1);

        let played: Vec<(PlayerId, i32)> = game
            .history
            .iter()
            .filter_map(|e| match e {
                TurnEvent::CardPlayed {
                    player, priority, ..
                } => Some((*player, *priority)),
                _ => None,
            })
            .collect();
        assert_eq!(played, vec![(PlayerId(1), 4), (PlayerId(2), 4)]);
    }

    /// Crossing the finish line on the winning lap ends the game before
    /// the turn advances.
    #[test]
    fn lap_wrap_past_the_finish_line_wins() {
        let config = HenHurConfig {
            spaces_per_lap: 10,
            laps_to_win: 1,
            ..Default::default()
        };
        let mut game = HenHurGame::test_game(2, config, vec![]);
        game.players[0].space = 8;
        game.players[0].deck.hand = vec![racer("fast", 5, Priority::Fixed(2))];
        game.players[1].deck.hand = vec![racer("slow", 1, Priority::Fixed(1))];

        game.submit_selection(PlayerId(1), "fast", false, vec![]).unwrap();
        game.submit_selection(PlayerId(2), "slow", false, vec![]).unwrap();
        game.resolve_reveal().unwrap();

        assert_eq!(game.players[0].space, 3);
        assert_eq!(game.players[0].lap, 2);
        assert_eq!(game.winner, Some(PlayerId(1)));
        assert_eq!(game.phase, Phase::GameOver);

        let err = game
            .submit_selection(PlayerId(2), "slow", false, vec![])
            .unwrap_err();
        assert!(err.to_string().contains("over"));
    }

    #[test]
    fn selection_validation_rejects_bad_commits() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);

        let err = game
            .submit_selection(PlayerId(1), "nonsense", false, vec![])
            .unwrap_err();
        assert!(err.to_string().contains("not in your hand"));

        let key = game.players[0].deck.hand[0].key().to_owned();
        let err = game
            .submit_selection(PlayerId(1), &key, false, vec!["R+".into()])
            .unwrap_err();
        assert!(err.to_string().contains("tokens"));

        game.players[0].burn_slots.iter_mut().for_each(|s| {
            *s = Some(racer("filler", 1, Priority::Fixed(1)));
        });
        let err = game
            .submit_selection(PlayerId(1), &key, true, vec![])
            .unwrap_err();
        assert!(err.to_string().contains("burn slots"));

        game.phase = Phase::AuctionSelection;
        let err = game
            .submit_selection(PlayerId(1), &key, false, vec![])
            .unwrap_err();
        assert!(err.to_string().contains("not open"));
    }

    #[test]
    fn tokens_add_bonuses_and_are_consumed() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        game.players[0].tokens.insert("R+".into(), 1);
        game.players[0].tokens.insert("P+".into(), 1);
        game.players[0].deck.hand = vec![racer("mover", 2, Priority::Fixed(1))];
        game.players[1].deck.hand = vec![racer("other", 1, Priority::Fixed(9))];

        game.submit_selection(PlayerId(1), "mover", false, vec!["R+".into(), "P+".into()])
            .unwrap();
        game.submit_selection(PlayerId(2), "other", false, vec![]).unwrap();
        game.resolve_reveal().unwrap();

        // race bonus added the R+ token's value
        assert_eq!(game.players[0].space, 3);
        assert_eq!(game.players[0].token_count("R+"), 0);
        assert_eq!(game.players[0].token_count("P+"), 0);

        // priority total carried the P+ bonus
        let p1_priority = game.history.iter().find_map(|e| match e {
            TurnEvent::CardPlayed {
                player, priority, ..
            } if *player == PlayerId(1) => Some(*priority),
            _ => None,
        });
        assert_eq!(p1_priority, Some(2));
    }

    #[test]
    fn burning_fills_a_slot_and_runs_the_burn_effect() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        let mut burner = racer("burner", 2, Priority::Fixed(3));
        burner.burn_effect = vec![gn_shared::CardEffect::ModifyPriority { adjustment: 2 }];
        game.players[0].deck.hand = vec![burner];
        game.players[1].deck.hand = vec![racer("other", 1, Priority::Fixed(1))];

        game.submit_selection(PlayerId(1), "burner", true, vec![]).unwrap();
        game.submit_selection(PlayerId(2), "other", false, vec![]).unwrap();
        game.resolve_reveal().unwrap();

        assert_eq!(
            game.players[0]
                .burn_slots
                .iter()
                .filter(|s| s.is_some())
                .count(),
            1
        );
        assert_eq!(game.players[0].stats.cards_burned, 1);
        // the burned card is diverted, not discarded
        assert!(game.players[0].deck.discard.is_empty());
        // the burn effect's priority bump was wiped by the per-turn reset
        assert_eq!(game.players[0].priority_modifier, 0);
    }

    #[test]
    fn empty_hand_refills_after_resolution() {
        let mut game = HenHurGame::test_game(2, HenHurConfig::default(), vec![]);
        game.players[0].deck.hand = vec![racer("last", 1, Priority::Fixed(1))];
        game.players[1].deck.hand = vec![racer("other", 1, Priority::Fixed(2))];

        game.submit_selection(PlayerId(1), "last", false, vec![]).unwrap();
        game.submit_selection(PlayerId(2), "other", false, vec![]).unwrap();
        game.resolve_reveal().unwrap();

        assert_eq!(game.players[0].deck.hand.len(), game.config.hand_size);
    }
}
