//! Built-in HenHur card tables and deck expansion.
//!
//! Cards are data: the engine only ever interprets the effect lists. A few
//! cards intentionally carry empty effect lists; their gameplay value is
//! the printed race/trick numbers alone.

use gn_shared::{Card, CardEffect, DeckType, MatOperation, Priority, TargetSelection, TokenAction};

pub const TOKEN_PRIORITY: &str = "P+";
pub const TOKEN_RACE: &str = "R+";
pub const TOKEN_AUCTION: &str = "A+";
pub const TOKEN_WILD: &str = "W*";

#[allow(clippy::too_many_arguments)]
fn card(
    id: &str,
    title: &str,
    deck_type: DeckType,
    trick_number: i32,
    race_number: i32,
    priority: Priority,
    text: &str,
    effect: Vec<CardEffect>,
    burn_effect: Vec<CardEffect>,
) -> Card {
    Card {
        id: id.into(),
        title: title.into(),
        deck_type,
        trick_number,
        race_number,
        priority,
        text: text.into(),
        effect,
        burn_effect,
        copies: 2,
        instance_id: None,
    }
}

fn gain(token_type: &str, count: i32) -> CardEffect {
    CardEffect::AffectTokenPool {
        action: TokenAction::Gain,
        token_type: token_type.into(),
        count,
    }
}

/// The deck every player starts with.
pub fn base_deck() -> Vec<Card> {
    vec![
        card(
            "steady-trot",
            "Steady Trot",
            DeckType::Base,
            1,
            2,
            Priority::Fixed(3),
            "A reliable pace around the track.",
            vec![],
            vec![CardEffect::MovePlayerPosition { distance: 2 }],
        ),
        card(
            "sprint",
            "Sprint",
            DeckType::Base,
            2,
            4,
            Priority::Rolled {
                base: 1,
                dice: "d4".into(),
            },
            "A burst of speed, if the legs hold.",
            vec![],
            vec![CardEffect::MovePlayerPosition { distance: 2 }],
        ),
        card(
            "peck-order",
            "Peck Order",
            DeckType::Base,
            3,
            1,
            Priority::Fixed(5),
            "Assert dominance before the next charge.",
            vec![CardEffect::ModifyPriority { adjustment: 2 }],
            vec![CardEffect::ModifyPriority { adjustment: 4 }],
        ),
        card(
            "scratch-for-feed",
            "Scratch for Feed",
            DeckType::Base,
            2,
            2,
            Priority::Fixed(2),
            "Turn up something useful in the dirt.",
            vec![gain(TOKEN_RACE, 1)],
            vec![gain(TOKEN_RACE, 1), gain(TOKEN_AUCTION, 1)],
        ),
        card(
            "flap",
            "Flap",
            DeckType::Base,
            1,
            3,
            Priority::Rolled {
                base: 2,
                dice: "d4".into(),
            },
            "Inelegant but effective.",
            vec![],
            vec![],
        ),
    ]
}

pub fn lap1_deck() -> Vec<Card> {
    vec![
        card(
            "wing-boost",
            "Wing Boost",
            DeckType::Lap1,
            4,
            5,
            Priority::Rolled {
                base: 1,
                dice: "d6".into(),
            },
            "Catch the draft and keep the cards coming.",
            vec![CardEffect::DrawCards { count: 1 }],
            vec![CardEffect::MovePlayerPosition { distance: 3 }],
        ),
        card(
            "shove",
            "Shove",
            DeckType::Lap1,
            3,
            3,
            Priority::Fixed(4),
            "Knock a rival off their line.",
            vec![CardEffect::MoveOpponentPosition {
                distance: -2,
                target_selection: TargetSelection::Choose,
                requires_adjacent: false,
            }],
            vec![CardEffect::MoveOpponentPosition {
                distance: -1,
                target_selection: TargetSelection::All,
                requires_adjacent: false,
            }],
        ),
        card(
            "grain-cache",
            "Grain Cache",
            DeckType::Lap1,
            5,
            2,
            Priority::Fixed(2),
            "Stockpile for the bidding wars ahead.",
            vec![gain(TOKEN_AUCTION, 1), gain(TOKEN_PRIORITY, 1)],
            vec![CardEffect::AffectTokenPool {
                action: TokenAction::Set,
                token_type: TOKEN_WILD.into(),
                count: 2,
            }],
        ),
        card(
            "molt",
            "Molt",
            DeckType::Lap1,
            2,
            1,
            Priority::Fixed(1),
            "Shed the dead weight.",
            vec![
                CardEffect::DiscardCards { count: 1 },
                CardEffect::DrawCards { count: 2 },
            ],
            vec![],
        ),
        card(
            "strut",
            "Strut",
            DeckType::Lap1,
            4,
            4,
            Priority::Rolled {
                base: 2,
                dice: "d4".into(),
            },
            "All show. The crowd loves it.",
            vec![],
            vec![],
        ),
    ]
}

pub fn lap2_deck() -> Vec<Card> {
    vec![
        card(
            "thunder-cluck",
            "Thunder Cluck",
            DeckType::Lap2,
            6,
            6,
            Priority::Rolled {
                base: 2,
                dice: "d6".into(),
            },
            "The pack scatters before it.",
            vec![CardEffect::MovePlayerPosition { distance: 1 }],
            vec![CardEffect::MovePlayerPosition { distance: 4 }],
        ),
        card(
            "hypnotic-dance",
            "Hypnotic Dance",
            DeckType::Lap2,
            7,
            3,
            Priority::Fixed(6),
            "Build momentum nobody can account for.",
            vec![CardEffect::AffectPlayerMat {
                property: "momentum".into(),
                value: 1,
                operation: MatOperation::Add,
            }],
            vec![CardEffect::AffectPlayerMat {
                property: "momentum".into(),
                value: 3,
                operation: MatOperation::Set,
            }],
        ),
        card(
            "fowl-play",
            "Fowl Play",
            DeckType::Lap2,
            5,
            4,
            Priority::Fixed(4),
            "Strictly against the rules, loosely enforced.",
            vec![CardEffect::MoveOpponentPosition {
                distance: -3,
                target_selection: TargetSelection::Choose,
                requires_adjacent: true,
            }],
            vec![CardEffect::ModifyPriority { adjustment: 3 }],
        ),
    ]
}

pub fn lap3_deck() -> Vec<Card> {
    vec![
        card(
            "phoenix-feather",
            "Phoenix Feather",
            DeckType::Lap3,
            8,
            8,
            Priority::Rolled {
                base: 3,
                dice: "d6".into(),
            },
            "Borrowed plumage, real speed.",
            vec![CardEffect::DrawCards { count: 2 }],
            vec![CardEffect::MovePlayerPosition { distance: 6 }],
        ),
        card(
            "final-flap",
            "Final Flap",
            DeckType::Lap3,
            9,
            7,
            Priority::Fixed(7),
            "Everything left, all at once.",
            vec![gain(TOKEN_WILD, 1)],
            vec![CardEffect::MoveOpponentPosition {
                distance: -4,
                target_selection: TargetSelection::All,
                requires_adjacent: false,
            }],
        ),
    ]
}

pub fn deck_cards(deck: DeckType) -> Vec<Card> {
    match deck {
        DeckType::Base => base_deck(),
        DeckType::Lap1 => lap1_deck(),
        DeckType::Lap2 => lap2_deck(),
        DeckType::Lap3 => lap3_deck(),
    }
}

/// Expand catalog cards into playable instances: one clone per `copies`,
/// each stamped with a distinct instance id.
pub fn expand_deck(cards: &[Card], counter: &mut u32) -> Vec<Card> {
    let mut out = Vec::new();
    for card in cards {
        for _ in 0..card.copies.max(1) {
            let mut instance = card.clone();
            instance.instance_id = Some(format!("{}#{:03}", card.id, *counter));
            *counter += 1;
            out.push(instance);
        }
    }
    out
}

/// Default auction-refill policy: which lap decks feed the shared deck at
/// the given highest lap. Injected into the engine so variants can swap it.
pub fn default_available_decks(highest_lap: u32) -> Vec<DeckType> {
    match highest_lap {
        0 | 1 => vec![DeckType::Lap1],
        2 => vec![DeckType::Lap1, DeckType::Lap2],
        _ => vec![DeckType::Lap2, DeckType::Lap3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expansion_stamps_distinct_instance_ids() {
        let mut counter = 0;
        let expanded = expand_deck(&base_deck(), &mut counter);
        let mut ids: Vec<&str> = expanded.iter().map(|c| c.key()).collect();
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), before);
        assert_eq!(before as u32, counter);
    }

    #[test]
    fn refill_policy_widens_with_laps() {
        assert_eq!(default_available_decks(1), vec![DeckType::Lap1]);
        assert_eq!(
            default_available_decks(2),
            vec![DeckType::Lap1, DeckType::Lap2]
        );
        assert_eq!(
            default_available_decks(3),
            vec![DeckType::Lap2, DeckType::Lap3]
        );
    }
}
