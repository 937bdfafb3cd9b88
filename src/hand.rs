use crate::dispatcher::ActivitySlot;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        match self {
            Hand::Left => 0,
            Hand::Right => 1,
        }
    }

    /// Side label carried by entity notifications.
    pub fn side(self) -> &'static str {
        match self {
            Hand::Left => "left",
            Hand::Right => "right",
        }
    }

    pub fn other(self) -> Hand {
        match self {
            Hand::Left => Hand::Right,
            Hand::Right => Hand::Left,
        }
    }

    pub fn activity_slot(self) -> ActivitySlot {
        match self {
            Hand::Left => ActivitySlot::LEFT_HAND,
            Hand::Right => ActivitySlot::RIGHT_HAND,
        }
    }

    /// Prefix used for the registration names of per-hand modules.
    pub fn module_prefix(self) -> &'static str {
        match self {
            Hand::Left => "Left",
            Hand::Right => "Right",
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.side())
    }
}

/// A value per hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sided<T> {
    pub left: T,
    pub right: T,
}

impl<T> Sided<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn from_fn(mut f: impl FnMut(Hand) -> T) -> Self {
        Self { left: f(Hand::Left), right: f(Hand::Right) }
    }

    pub fn get(&self, hand: Hand) -> &T {
        match hand {
            Hand::Left => &self.left,
            Hand::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, hand: Hand) -> &mut T {
        match hand {
            Hand::Left => &mut self.left,
            Hand::Right => &mut self.right,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Sided<U> {
        Sided { left: f(self.left), right: f(self.right) }
    }
}

impl<T: Clone> Sided<T> {
    pub fn splat(value: T) -> Self {
        Self { left: value.clone(), right: value }
    }
}

impl<T> Index<Hand> for Sided<T> {
    type Output = T;

    fn index(&self, hand: Hand) -> &T {
        self.get(hand)
    }
}

impl<T> IndexMut<Hand> for Sided<T> {
    fn index_mut(&mut self, hand: Hand) -> &mut T {
        self.get_mut(hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hands_map_to_their_slots() {
        assert_eq!(Hand::Left.activity_slot().as_str(), "leftHand");
        assert_eq!(Hand::Right.activity_slot().as_str(), "rightHand");
        assert_eq!(Hand::Left.other(), Hand::Right);
        assert_eq!(Hand::Right.to_string(), "right");
    }

    #[test]
    fn sided_indexing_follows_hand() {
        let mut values = Sided::from_fn(|hand| hand.index() * 10);
        assert_eq!(values[Hand::Left], 0);
        values[Hand::Right] += 1;
        assert_eq!(values.right, 11);
        let doubled = values.map(|v| v * 2);
        assert_eq!(doubled, Sided::new(0, 22));
    }
}
