//! Card value objects and the card-effect vocabulary.

use serde::{Deserialize, Serialize};

/// Which deck a card belongs to. Lap decks enter the auction as the race
/// progresses; the base deck seeds every player's starting pile.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DeckType {
    Base,
    Lap1,
    Lap2,
    Lap3,
}

/// A card's priority: either a fixed value or a base plus a die roll made
/// fresh each time the card contests ordering.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Priority {
    Fixed(i32),
    Rolled { base: i32, dice: String },
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetSelection {
    Choose,
    All,
    Random,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenAction {
    Gain,
    Spend,
    Set,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatOperation {
    Set,
    Add,
}

/// A single card effect. Cards carry one list for normal play and a second
/// list applied when the card is burned.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "params", rename_all = "snake_case")]
pub enum CardEffect {
    MovePlayerPosition {
        distance: i32,
    },
    MoveOpponentPosition {
        distance: i32,
        target_selection: TargetSelection,
        #[serde(default)]
        requires_adjacent: bool,
    },
    AffectTokenPool {
        action: TokenAction,
        token_type: String,
        count: i32,
    },
    DrawCards {
        count: usize,
    },
    DiscardCards {
        count: usize,
    },
    ModifyPriority {
        adjustment: i32,
    },
    AffectPlayerMat {
        property: String,
        value: i32,
        operation: MatOperation,
    },
}

fn default_copies() -> u32 {
    2
}

/// A card as it exists in decks, hands and the auction pool. `instance_id`
/// is stamped when a deck is expanded so that two copies of the same card
/// are distinguishable in hands and selections.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub id: String,
    pub title: String,
    pub deck_type: DeckType,
    pub trick_number: i32,
    pub race_number: i32,
    pub priority: Priority,
    pub text: String,
    #[serde(default)]
    pub effect: Vec<CardEffect>,
    #[serde(default)]
    pub burn_effect: Vec<CardEffect>,
    #[serde(default = "default_copies")]
    pub copies: u32,
    #[serde(default)]
    pub instance_id: Option<String>,
}

impl Card {
    /// The key clients use to refer to this card in selections: the stamped
    /// instance id when present, the catalog id otherwise.
    pub fn key(&self) -> &str {
        self.instance_id.as_deref().unwrap_or(&self.id)
    }
}
