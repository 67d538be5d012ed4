use core::{convert::TryFrom, str::FromStr};

use crate::card::ParseError;
use crate::constants::SUIT_CHARS;

/// A card suit, ordered clubs to spades. The discriminant is the suit index
/// used throughout the card tables.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub enum Suit {
    Clubs = 0,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    /// All four suits in ascending order, index-aligned with
    /// [`SUIT_CHARS`] and the card tables.
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    /// Returns the lowercase single-character text form used in the card
    /// wire format.
    pub fn to_char(self) -> char {
        SUIT_CHARS[self as usize]
    }
}

impl TryFrom<u8> for Suit {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Suit::ALL.get(value as usize).copied().ok_or(ParseError)
    }
}

impl FromStr for Suit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, ParseError> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let idx = SUIT_CHARS.iter().position(|&x| x == c).ok_or(ParseError)?;
                Ok(Suit::ALL[idx])
            }
            _ => Err(ParseError),
        }
    }
}
