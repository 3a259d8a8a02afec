//! The card-effect executor.
//!
//! Effects run sequentially against the acting player and the wider game
//! state. An effect that needs a target the player has not supplied stops
//! the run and surfaces a pending-input descriptor; the remaining suffix of
//! that card's effects is not executed.

use gn_shared::{CardEffect, MatOperation, PendingInput, TargetSelection, TokenAction};

use super::dice::Dice;
use super::henhur::{HenHurConfig, HenHurPlayer};

pub struct EffectContext {
    pub actor: usize,
    pub target: Option<usize>,
    pub is_burn: bool,
}

#[derive(Default)]
pub struct EffectRun {
    pub pending: Option<PendingInput>,
}

/// Advance a player along the track, wrapping laps in both directions.
/// Backward motion floors at lap 1, space 0. Returns the new lap.
pub fn apply_move(player: &mut HenHurPlayer, distance: i32, spaces_per_lap: i32) -> u32 {
    player.space += distance;
    while player.space >= spaces_per_lap {
        player.space -= spaces_per_lap;
        player.lap += 1;
    }
    while player.space < 0 {
        if player.lap <= 1 {
            player.lap = 1;
            player.space = 0;
        } else {
            player.lap -= 1;
            player.space += spaces_per_lap;
        }
    }
    player.stats.distance_moved += distance.unsigned_abs();
    player.lap
}

/// Push an opponent without lap wrapping; their space floors at 0.
fn push_opponent(target: &mut HenHurPlayer, distance: i32) {
    target.space = (target.space + distance).max(0);
}

fn adjacent(a: &HenHurPlayer, b: &HenHurPlayer) -> bool {
    a.lap == b.lap && (a.space - b.space).abs() <= 1
}

pub fn execute(
    effects: &[CardEffect],
    ctx: EffectContext,
    players: &mut [HenHurPlayer],
    config: &HenHurConfig,
    dice: &mut Dice,
) -> EffectRun {
    let mut run = EffectRun::default();
    tracing::trace!(
        actor = ctx.actor,
        is_burn = ctx.is_burn,
        count = effects.len(),
        "executing effects"
    );
    for effect in effects {
        match effect {
            CardEffect::MovePlayerPosition { distance } => {
                apply_move(&mut players[ctx.actor], *distance, config.spaces_per_lap);
            }
            CardEffect::MoveOpponentPosition {
                distance,
                target_selection,
                requires_adjacent,
            } => match target_selection {
                TargetSelection::Choose => {
                    let Some(target) = ctx.target else {
                        run.pending = Some(PendingInput {
                            player: players[ctx.actor].id,
                            kind: "choose_opponent".into(),
                            distance: *distance,
                            requires_adjacent: *requires_adjacent,
                        });
                        return run;
                    };
                    if *requires_adjacent && !adjacent(&players[ctx.actor], &players[target]) {
                        tracing::warn!(
                            actor = %players[ctx.actor].id,
                            target = %players[target].id,
                            "target not adjacent; effect skipped"
                        );
                        continue;
                    }
                    push_opponent(&mut players[target], *distance);
                }
                TargetSelection::All => {
                    for idx in 0..players.len() {
                        if idx != ctx.actor {
                            push_opponent(&mut players[idx], *distance);
                        }
                    }
                }
                TargetSelection::Random => {
                    let others: Vec<usize> =
                        (0..players.len()).filter(|i| *i != ctx.actor).collect();
                    if let Some(&target) = others.get(dice.pick_index(others.len().max(1))) {
                        push_opponent(&mut players[target], *distance);
                    }
                }
            },
            CardEffect::AffectTokenPool {
                action,
                token_type,
                count,
            } => {
                let player = &mut players[ctx.actor];
                let current = player.token_count(token_type);
                let next = match action {
                    TokenAction::Gain => {
                        let headroom = config.max_tokens.saturating_sub(player.token_sum());
                        current + (*count).max(0).unsigned_abs().min(headroom)
                    }
                    TokenAction::Spend => current.saturating_sub((*count).max(0).unsigned_abs()),
                    TokenAction::Set => {
                        // direct assignment, still clipped so the pool cap holds
                        let others = player.token_sum() - current;
                        (*count)
                            .max(0)
                            .unsigned_abs()
                            .min(config.max_tokens.saturating_sub(others))
                    }
                };
                player.tokens.insert(token_type.clone(), next);
            }
            CardEffect::DrawCards { count } => {
                players[ctx.actor].deck.draw(*count, dice);
            }
            CardEffect::DiscardCards { count } => {
                let player = &mut players[ctx.actor];
                for _ in 0..*count {
                    if player.deck.hand.is_empty() {
                        break;
                    }
                    let card = player.deck.hand.remove(0);
                    player.deck.discard_card(card);
                }
            }
            CardEffect::ModifyPriority { adjustment } => {
                players[ctx.actor].priority_modifier += adjustment;
            }
            CardEffect::AffectPlayerMat {
                property,
                value,
                operation,
            } => {
                let entry = players[ctx.actor]
                    .mat
                    .entry(property.clone())
                    .or_insert(0);
                match operation {
                    MatOperation::Set => *entry = *value,
                    MatOperation::Add => *entry += *value,
                }
            }
        }
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::deck::PlayerDeck;
    use crate::game::henhur::HenHurConfig;
    use gn_shared::{PlayerId, PlayerStats};
    use std::collections::BTreeMap;

    fn player(id: u64) -> HenHurPlayer {
        HenHurPlayer {
            id: PlayerId(id),
            name: format!("p{id}"),
            connected: true,
            is_bot: false,
            lane: 0,
            space: 0,
            lap: 1,
            tokens: BTreeMap::new(),
            burn_slots: vec![None; 3],
            deck: PlayerDeck::default(),
            selection: None,
            ready: false,
            priority_modifier: 0,
            mat: BTreeMap::new(),
            stats: PlayerStats::default(),
        }
    }

    fn ctx(actor: usize) -> EffectContext {
        EffectContext {
            actor,
            target: None,
            is_burn: false,
        }
    }

    #[test]
    fn move_wraps_laps_forward() {
        let mut p = player(0);
        p.space = 8;
        apply_move(&mut p, 5, 10);
        assert_eq!(p.space, 3);
        assert_eq!(p.lap, 2);
        assert_eq!(p.stats.distance_moved, 5);
    }

    #[test]
    fn backward_move_floors_at_lap_one_space_zero() {
        let mut p = player(0);
        p.space = 2;
        apply_move(&mut p, -5, 10);
        assert_eq!(p.space, 0);
        assert_eq!(p.lap, 1);

        let mut q = player(1);
        q.lap = 2;
        q.space = 1;
        apply_move(&mut q, -3, 10);
        assert_eq!(q.lap, 1);
        assert_eq!(q.space, 8);
    }

    #[test]
    fn token_gain_is_clipped_by_the_pool_cap() {
        let mut config = HenHurConfig::default();
        config.max_tokens = 3;
        let mut p = player(0);
        p.tokens.insert("R+".into(), 2);
        p.tokens.insert("A+".into(), 1);
        p.tokens.insert("P+".into(), 0);
        let mut players = vec![p];
        let mut dice = Dice::scripted(vec![]);

        let effects = [CardEffect::AffectTokenPool {
            action: TokenAction::Gain,
            token_type: "P+".into(),
            count: 3,
        }];
        let run = execute(&effects, ctx(0), &mut players, &config, &mut dice);
        assert!(run.pending.is_none());
        assert_eq!(players[0].token_count("P+"), 0);
        assert_eq!(players[0].token_sum(), 3);
    }

    #[test]
    fn token_spend_floors_at_zero_and_set_assigns() {
        let config = HenHurConfig::default();
        let mut p = player(0);
        p.tokens.insert("R+".into(), 1);
        let mut players = vec![p];
        let mut dice = Dice::scripted(vec![]);

        let effects = [
            CardEffect::AffectTokenPool {
                action: TokenAction::Spend,
                token_type: "R+".into(),
                count: 5,
            },
            CardEffect::AffectTokenPool {
                action: TokenAction::Set,
                token_type: "A+".into(),
                count: 2,
            },
        ];
        execute(&effects, ctx(0), &mut players, &config, &mut dice);
        assert_eq!(players[0].token_count("R+"), 0);
        assert_eq!(players[0].token_count("A+"), 2);
    }

    #[test]
    fn choose_without_target_surfaces_pending_input() {
        let config = HenHurConfig::default();
        let mut players = vec![player(0), player(1)];
        players[1].space = 4;
        let mut dice = Dice::scripted(vec![]);

        let effects = [
            CardEffect::MoveOpponentPosition {
                distance: -2,
                target_selection: TargetSelection::Choose,
                requires_adjacent: false,
            },
            // suffix must not run once input is required
            CardEffect::ModifyPriority { adjustment: 9 },
        ];
        let run = execute(&effects, ctx(0), &mut players, &config, &mut dice);
        let pending = run.pending.expect("pending input");
        assert_eq!(pending.kind, "choose_opponent");
        assert_eq!(players[1].space, 4);
        assert_eq!(players[0].priority_modifier, 0);
    }

    #[test]
    fn opponent_push_floors_at_zero_with_supplied_target() {
        let config = HenHurConfig::default();
        let mut players = vec![player(0), player(1)];
        players[1].space = 1;
        let mut dice = Dice::scripted(vec![]);

        let effects = [CardEffect::MoveOpponentPosition {
            distance: -4,
            target_selection: TargetSelection::Choose,
            requires_adjacent: false,
        }];
        let run = execute(
            &effects,
            EffectContext {
                actor: 0,
                target: Some(1),
                is_burn: false,
            },
            &mut players,
            &config,
            &mut dice,
        );
        assert!(run.pending.is_none());
        assert_eq!(players[1].space, 0);
        assert_eq!(players[1].lap, 1);
    }

    #[test]
    fn mat_properties_set_and_add() {
        let config = HenHurConfig::default();
        let mut players = vec![player(0)];
        let mut dice = Dice::scripted(vec![]);

        let effects = [
            CardEffect::AffectPlayerMat {
                property: "momentum".into(),
                value: 2,
                operation: MatOperation::Set,
            },
            CardEffect::AffectPlayerMat {
                property: "momentum".into(),
                value: 3,
                operation: MatOperation::Add,
            },
        ];
        execute(&effects, ctx(0), &mut players, &config, &mut dice);
        assert_eq!(players[0].mat.get("momentum"), Some(&5));
    }
}
