//! Per-player card piles: draw, hand, discard, exhaust.

use std::collections::VecDeque;

use gn_shared::Card;

use super::dice::Dice;

#[derive(Clone, Debug, Default)]
pub struct PlayerDeck {
    pub draw: VecDeque<Card>,
    pub hand: Vec<Card>,
    pub discard: Vec<Card>,
    pub exhaust: Vec<Card>,
}

impl PlayerDeck {
    pub fn new(cards: Vec<Card>) -> Self {
        PlayerDeck {
            draw: cards.into(),
            ..Default::default()
        }
    }

    /// Draw up to `n` cards into the hand. When the draw pile runs dry the
    /// discard pile is shuffled in and drawing continues; if both piles are
    /// empty the result is simply shorter than requested.
    pub fn draw(&mut self, n: usize, dice: &mut Dice) -> Vec<Card> {
        let mut drawn = Vec::with_capacity(n);
        while drawn.len() < n {
            if self.draw.is_empty() {
                if self.discard.is_empty() {
                    break;
                }
                let mut refresh: Vec<Card> = self.discard.drain(..).collect();
                dice.shuffle(&mut refresh);
                self.draw = refresh.into();
            }
            if let Some(card) = self.draw.pop_front() {
                drawn.push(card);
            }
        }
        self.hand.extend(drawn.iter().cloned());
        drawn
    }

    pub fn discard_card(&mut self, card: Card) {
        self.discard.push(card);
    }

    /// Place a drafted card on top of the draw pile.
    pub fn place_on_top(&mut self, card: Card) {
        self.draw.push_front(card);
    }

    pub fn hand_card(&self, key: &str) -> Option<&Card> {
        self.hand.iter().find(|c| c.key() == key)
    }

    pub fn take_from_hand(&mut self, key: &str) -> Option<Card> {
        let pos = self.hand.iter().position(|c| c.key() == key)?;
        Some(self.hand.remove(pos))
    }

    /// Every card this deck owns, across all piles.
    pub fn total_cards(&self) -> usize {
        self.draw.len() + self.hand.len() + self.discard.len() + self.exhaust.len()
    }
}
