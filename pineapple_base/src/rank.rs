use core::{convert::TryFrom, str::FromStr};

use crate::card::ParseError;
use crate::constants::RANK_CHARS;

/// A card rank, deuce low and ace high. The discriminant is the rank index
/// used throughout the card tables.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub enum Rank {
    Two = 0,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    /// All thirteen ranks in ascending order, index-aligned with
    /// [`RANK_CHARS`] and the card tables.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Returns the single-character text form used in the card wire format.
    pub fn to_char(self) -> char {
        RANK_CHARS[self as usize]
    }
}

impl TryFrom<u8> for Rank {
    type Error = ParseError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rank::ALL.get(value as usize).copied().ok_or(ParseError)
    }
}

impl FromStr for Rank {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                let idx = RANK_CHARS.iter().position(|&r| r == c).ok_or(ParseError)?;
                Ok(Rank::ALL[idx])
            }
            _ => Err(ParseError),
        }
    }
}
