use core::fmt;
use core::iter::FusedIterator;
use core::str::FromStr;

use crate::card::{Card, ParseError};
use crate::constants::{CARD_COUNT, STANDARD_CARD_COUNT};

const FULL_MASK: u64 = (1 << CARD_COUNT) - 1;
const STANDARD_MASK: u64 = (1 << STANDARD_CARD_COUNT) - 1;

/// An unordered collection of cards from the 54-card Pineapple deck,
/// stored as a 54-bit mask.
///
/// All set operations are O(1) on the mask; iteration yields cards in
/// ascending index order.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct CardSet(u64);

impl CardSet {
    /// Constructs an empty set.
    pub const fn new() -> CardSet {
        CardSet(0)
    }

    /// Constructs the set of all 52 standard cards, without the jokers.
    pub const fn standard() -> CardSet {
        CardSet(STANDARD_MASK)
    }

    /// Constructs the set of all 54 cards, jokers included.
    pub const fn full() -> CardSet {
        CardSet(FULL_MASK)
    }

    /// Returns `true` if the set contains the given card.
    #[inline]
    pub fn contains(&self, card: Card) -> bool {
        self.0 & (1 << card.idx()) != 0
    }

    /// Inserts a card into the set. Inserting a card already present is a
    /// no-op.
    #[inline]
    pub fn insert(&mut self, card: Card) {
        self.0 |= 1 << card.idx();
    }

    /// Removes a card from the set. Removing an absent card is a no-op.
    #[inline]
    pub fn remove(&mut self, card: Card) {
        self.0 &= !(1 << card.idx());
    }

    /// Returns the number of cards in the set.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    /// Returns `true` if the set does not contain any cards.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the set of cards present in `self` or `other`.
    #[inline]
    pub fn union(&self, other: &CardSet) -> CardSet {
        CardSet(self.0 | other.0)
    }

    /// Returns the set of cards present in both `self` and `other`.
    #[inline]
    pub fn intersection(&self, other: &CardSet) -> CardSet {
        CardSet(self.0 & other.0)
    }

    /// Returns the set of cards present in `self` but not in `other`.
    #[inline]
    pub fn difference(&self, other: &CardSet) -> CardSet {
        CardSet(self.0 & !other.0)
    }

    /// Returns `true` if the two sets have no cards in common.
    #[inline]
    pub fn is_disjoint(&self, other: &CardSet) -> bool {
        self.0 & other.0 == 0
    }

    /// Returns the number of jokers in the set.
    #[inline]
    pub fn wild_count(&self) -> usize {
        (self.0 >> STANDARD_CARD_COUNT).count_ones() as usize
    }

    /// Returns the set with any jokers removed.
    #[inline]
    pub fn without_wilds(&self) -> CardSet {
        CardSet(self.0 & STANDARD_MASK)
    }

    /// Fills `out` with distinct cards sampled uniformly from the set,
    /// without replacement, using the supplied generator.
    ///
    /// Returns `false` (leaving `out` untouched) if the set holds fewer
    /// cards than requested. Identical seeds draw identical cards, which is
    /// what makes search traces reproducible.
    pub fn sample_into(&self, rng: &mut fastrand::Rng, out: &mut [Card]) -> bool {
        let len = self.len();
        if out.len() > len {
            return false;
        }

        let mut members = [Card::WILD_X; CARD_COUNT];
        for (slot, card) in members.iter_mut().zip(self.iter()) {
            *slot = card;
        }

        for i in 0..out.len() {
            members.swap(i, rng.usize(i..len));
            out[i] = members[i];
        }
        true
    }

    /// The raw 54-bit mask; bit `i` corresponds to the card with index `i`.
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Returns an iterator over all cards in the set, in ascending index
    /// order.
    pub fn iter(&self) -> Iter {
        Iter { remaining: self.0 }
    }
}

impl Extend<Card> for CardSet {
    #[inline]
    fn extend<T: IntoIterator<Item = Card>>(&mut self, iter: T) {
        for card in iter {
            self.insert(card);
        }
    }
}

impl FromIterator<Card> for CardSet {
    #[inline]
    fn from_iter<T: IntoIterator<Item = Card>>(iter: T) -> Self {
        let mut set = CardSet::new();
        set.extend(iter);
        set
    }
}

impl FromStr for CardSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "" {
            return Ok(CardSet::new());
        }

        let mut set = CardSet::new();
        let mut count = 0;
        for result in s.trim().split(' ').map(Card::from_str) {
            set.insert(result?);
            count += 1;
        }

        if set.len() != count {
            Err(ParseError)
        } else {
            Ok(set)
        }
    }
}

impl fmt::Debug for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first_entry = true;
        for card in self.iter() {
            if first_entry {
                write!(f, "{:?}", card)?;
                first_entry = false;
            } else {
                write!(f, " {:?}", card)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for CardSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl IntoIterator for &CardSet {
    type Item = Card;
    type IntoIter = Iter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct Iter {
    remaining: u64,
}

impl Iterator for Iter {
    type Item = Card;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let idx = self.remaining.trailing_zeros() as u8;
        self.remaining &= self.remaining - 1;
        Card::from_index(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.remaining.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for Iter {}
impl FusedIterator for Iter {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::duplicate_card("Ah 5h 4c 3c Ah")]
    #[case::bad_card("Ah 5x")]
    fn failed_parse(#[case] s: &str) {
        let result = s.parse::<CardSet>();
        assert!(result.is_err());
    }

    #[rstest]
    #[case(&[], 0)]
    #[case(&["Ah"], 1)]
    #[case(&["Ah", "As"], 2)]
    #[case(&["Jh", "Tc", "7h", "5s", "Xj", "Yj"], 6)]
    fn insert_and_count(#[case] cards: &[&str], #[case] expected: usize) -> Result<(), ParseError> {
        let mut set = CardSet::new();
        for &card in cards {
            set.insert(card.parse()?);
        }

        assert_eq!(set.len(), expected);
        for &card in cards {
            assert!(set.contains(card.parse()?));
        }
        Ok(())
    }

    #[test]
    fn full_and_standard() {
        assert_eq!(CardSet::full().len(), 54);
        assert_eq!(CardSet::standard().len(), 52);
        assert_eq!(CardSet::full().wild_count(), 2);
        assert_eq!(CardSet::standard().wild_count(), 0);
        assert_eq!(CardSet::full().without_wilds(), CardSet::standard());
    }

    #[rstest]
    #[case("Ah Kd 2c", "Kd 7s", "Ah 2c")]
    #[case("", "Kd 7s", "")]
    #[case("Xj Yj 5d", "Yj", "Xj 5d")]
    fn union_difference_law(
        #[case] a: &str,
        #[case] b: &str,
        #[case] expected: &str,
    ) -> Result<(), ParseError> {
        let a: CardSet = a.parse()?;
        let b: CardSet = b.parse()?;
        let expected: CardSet = expected.parse()?;

        assert_eq!(a.union(&b).difference(&b), a.difference(&b));
        assert_eq!(a.difference(&b), expected);
        Ok(())
    }

    #[test]
    fn iteration_preserves_cardinality_and_order() {
        let set: CardSet = "Qs 2c Xj 9d 9c Ah".parse().unwrap();
        let cards: Vec<Card> = set.iter().collect();

        assert_eq!(cards.len(), set.len());
        for pair in cards.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        let rebuilt: CardSet = cards.into_iter().collect();
        assert_eq!(rebuilt, set);
    }

    #[test]
    fn sampling_is_seed_deterministic() {
        let set = CardSet::standard();
        let mut first = [Card::WILD_X; 5];
        let mut second = [Card::WILD_X; 5];

        assert!(set.sample_into(&mut fastrand::Rng::with_seed(7), &mut first));
        assert!(set.sample_into(&mut fastrand::Rng::with_seed(7), &mut second));
        assert_eq!(first, second);

        let sampled: CardSet = first.iter().copied().collect();
        assert_eq!(sampled.len(), 5, "sampled cards must be distinct");
        for card in first {
            assert!(set.contains(card));
        }
    }

    #[test]
    fn sampling_more_than_available_fails() {
        let set: CardSet = "Ah Kd".parse().unwrap();
        let mut out = [Card::WILD_X; 3];
        assert!(!set.sample_into(&mut fastrand::Rng::with_seed(1), &mut out));
    }
}
