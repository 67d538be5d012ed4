use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use crate::constants::{
    CARDS, CARDS_STR, CARD_COUNT, RANK_CHARS, SUIT_CHARS, WILD_X_INDEX, WILD_Y_INDEX,
};
use crate::rank::Rank;
use crate::suit::Suit;

/// A card from the 54-card Pineapple deck: the standard 52 cards plus two
/// distinguishable jokers.
///
/// Indices `0..52` encode `4 * rank + suit` (deuces to aces, clubs to
/// spades); indices 52 and 53 are the jokers, which compare equal on
/// [`is_wild`](Card::is_wild) but remain distinct set members.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct Card(u8);

impl Card {
    /// The first joker, written `Xj`.
    pub const WILD_X: Card = Card(WILD_X_INDEX as u8);

    /// The second joker, written `Yj`.
    pub const WILD_Y: Card = Card(WILD_Y_INDEX as u8);

    /// Creates a new card of the given `rank` and `suit`.
    pub fn new(rank: Rank, suit: Suit) -> Self {
        CARDS[4 * (rank as usize) + suit as usize]
    }

    /// Creates a card from its deck index, or `None` if the index is out of
    /// range.
    pub fn from_index(idx: u8) -> Option<Self> {
        if (idx as usize) < CARD_COUNT {
            Some(Card(idx))
        } else {
            None
        }
    }

    pub(crate) const fn from_index_unchecked(idx: u8) -> Self {
        Card(idx)
    }

    /// Returns the position of the card in the 54-card deck ordered by rank
    /// and then suit, with the jokers last.
    pub fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if the card is one of the two jokers.
    pub fn is_wild(self) -> bool {
        self.0 as usize >= WILD_X_INDEX
    }

    /// Returns the rank of the card, or `None` for a joker.
    pub fn rank(self) -> Option<Rank> {
        if self.is_wild() {
            None
        } else {
            (self.0 / 4).try_into().ok()
        }
    }

    /// Returns the suit of the card, or `None` for a joker.
    pub fn suit(self) -> Option<Suit> {
        if self.is_wild() {
            None
        } else {
            (self.0 % 4).try_into().ok()
        }
    }

    /// Rank index in `0..13`. Must not be called on a joker.
    #[inline]
    pub fn rank_index(self) -> usize {
        debug_assert!(!self.is_wild());
        (self.0 / 4) as usize
    }

    /// Suit index in `0..4`. Must not be called on a joker.
    #[inline]
    pub fn suit_index(self) -> usize {
        debug_assert!(!self.is_wild());
        (self.0 % 4) as usize
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

/// An error which can be returned when parsing a [`Card`] or
/// [`CardSet`](crate::CardSet).
///
/// This error is used as the error type for all [`FromStr`] implementations
/// in pineapple_base.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ParseError;

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse value")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

impl FromStr for Card {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Xj" => return Ok(Card::WILD_X),
            "Yj" => return Ok(Card::WILD_Y),
            _ => {}
        }

        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(rank), Some(suit), None) => {
                let rank = RANK_CHARS.iter().position(|&c| c == rank).ok_or(ParseError)?;
                let suit = SUIT_CHARS.iter().position(|&c| c == suit).ok_or(ParseError)?;
                Ok(CARDS[4 * rank + suit])
            }
            _ => Err(ParseError),
        }
    }
}

impl fmt::Debug for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", CARDS_STR[self.idx()])
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", CARDS_STR[self.idx()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cmp::Ordering;
    use rstest::*;

    #[rstest]
    #[case::two_of_clubs("2c", Card::new(Rank::Two, Suit::Clubs))]
    #[case::eight_of_hearts("8h", Card::new(Rank::Eight, Suit::Hearts))]
    #[case::jack_of_diamonds("Jd", Card::new(Rank::Jack, Suit::Diamonds))]
    #[case::king_of_spades("Ks", Card::new(Rank::King, Suit::Spades))]
    #[case::ace_of_diamonds("Ad", Card::new(Rank::Ace, Suit::Diamonds))]
    #[case::first_joker("Xj", Card::WILD_X)]
    #[case::second_joker("Yj", Card::WILD_Y)]
    fn parse(#[case] s: &str, #[case] expected: Card) -> Result<(), ParseError> {
        let card: Card = s.parse()?;
        assert_eq!(card, expected);
        Ok(())
    }

    #[rstest]
    #[case::empty("")]
    #[case::two_cards("2c 5h")]
    #[case::invalid_rank("1h")]
    #[case::invalid_suit("Kf")]
    #[case::uppercase_joker_suit("XJ")]
    fn invalid_parse(#[case] s: &str) {
        let card = s.parse::<Card>();
        assert_eq!(card, Err(ParseError));
    }

    #[test]
    fn text_round_trip() {
        for card in CARDS {
            let text = card.to_string();
            assert_eq!(text.parse::<Card>(), Ok(card));
        }
    }

    #[rstest]
    #[case::same_rank("3c", "3s")]
    #[case::same_suit("5c", "6c")]
    #[case::aces_high("Kh", "Ah")]
    #[case::joker_after_ace("As", "Xj")]
    #[case::jokers_distinct("Xj", "Yj")]
    fn order(#[case] lower: &str, #[case] higher: &str) -> Result<(), ParseError> {
        let lower_card = lower.parse::<Card>()?;
        let higher_card = higher.parse::<Card>()?;
        let result = lower_card.cmp(&higher_card);
        assert_eq!(result, Ordering::Less);
        Ok(())
    }

    #[test]
    fn jokers_are_wild_and_rankless() {
        for card in [Card::WILD_X, Card::WILD_Y] {
            assert!(card.is_wild());
            assert_eq!(card.rank(), None);
            assert_eq!(card.suit(), None);
        }
        assert_ne!(Card::WILD_X, Card::WILD_Y);
    }
}
