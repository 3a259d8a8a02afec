//! Dice notation, priority rolls and shuffling.
//!
//! Every game owns one [`Dice`] value seeded at construction, so a full
//! playthrough is reproducible from a seed. Tests that need exact roll
//! values use the scripted variant, which pops predetermined results.

use std::collections::VecDeque;

use gn_shared::Priority;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub enum Dice {
    Seeded(StdRng),
    /// Pops predetermined roll results; shuffles become no-ops.
    Scripted(VecDeque<i32>),
}

impl Dice {
    pub fn from_entropy() -> Self {
        Dice::Seeded(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn seeded(seed: u64) -> Self {
        Dice::Seeded(StdRng::seed_from_u64(seed))
    }

    pub fn scripted(rolls: Vec<i32>) -> Self {
        Dice::Scripted(rolls.into())
    }

    fn roll_die(&mut self, sides: i32) -> i32 {
        match self {
            Dice::Seeded(rng) => rng.random_range(1..=sides.max(1)),
            Dice::Scripted(queue) => queue.pop_front().unwrap_or(1),
        }
    }

    /// Roll `[N]d<M>` notation (N defaults to 1) and return the sum.
    /// Malformed notation rolls nothing and returns 0.
    pub fn roll_notation(&mut self, notation: &str) -> i32 {
        let Some((count, sides)) = parse_notation(notation) else {
            tracing::warn!(notation, "malformed dice notation");
            return 0;
        };
        (0..count).map(|_| self.roll_die(sides)).sum()
    }

    /// A card's contested ordering value: fixed priorities pass through,
    /// rolled priorities add a fresh roll to their base.
    pub fn roll_priority(&mut self, priority: &Priority) -> i32 {
        match priority {
            Priority::Fixed(v) => *v,
            Priority::Rolled { base, dice } => base + self.roll_notation(dice),
        }
    }

    /// In-place Fisher-Yates. Scripted dice keep the input order so tests
    /// control deck composition exactly.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        if let Dice::Seeded(rng) = self {
            items.shuffle(rng);
        }
    }

    /// Pick an index in `0..len`. Callers guarantee `len > 0`.
    pub fn pick_index(&mut self, len: usize) -> usize {
        match self {
            Dice::Seeded(rng) => rng.random_range(0..len.max(1)),
            Dice::Scripted(queue) => {
                queue.pop_front().unwrap_or(0).unsigned_abs() as usize % len.max(1)
            }
        }
    }
}

fn parse_notation(notation: &str) -> Option<(i32, i32)> {
    let (count, sides) = notation.split_once(['d', 'D'])?;
    let count = if count.is_empty() {
        1
    } else {
        count.parse::<i32>().ok().filter(|n| *n > 0)?
    };
    let sides = sides.parse::<i32>().ok().filter(|m| *m > 0)?;
    Some((count, sides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_die_defaults_to_one_roll() {
        let mut dice = Dice::seeded(7);
        for _ in 0..50 {
            let v = dice.roll_notation("d6");
            assert!((1..=6).contains(&v));
        }
    }

    #[test]
    fn multi_dice_sum_within_bounds() {
        let mut dice = Dice::seeded(11);
        for _ in 0..50 {
            let v = dice.roll_notation("2d4");
            assert!((2..=8).contains(&v));
        }
    }

    #[test]
    fn malformed_notation_rolls_zero() {
        let mut dice = Dice::seeded(0);
        assert_eq!(dice.roll_notation("banana"), 0);
        assert_eq!(dice.roll_notation("d"), 0);
        assert_eq!(dice.roll_notation("0d6"), 0);
        assert_eq!(dice.roll_notation("2d0"), 0);
    }

    #[test]
    fn scripted_rolls_pop_in_order() {
        let mut dice = Dice::scripted(vec![3, 2]);
        assert_eq!(dice.roll_notation("d4"), 3);
        assert_eq!(dice.roll_notation("d4"), 2);
        // exhausted script falls back to 1
        assert_eq!(dice.roll_notation("d4"), 1);
    }

    #[test]
    fn priority_roll_adds_base() {
        let mut dice = Dice::scripted(vec![3]);
        assert_eq!(dice.roll_priority(&Priority::Fixed(5)), 5);
        assert_eq!(
            dice.roll_priority(&Priority::Rolled {
                base: 1,
                dice: "d4".into()
            }),
            4
        );
    }
}
