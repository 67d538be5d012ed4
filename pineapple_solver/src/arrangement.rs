use core::fmt;

use pineapple_base::{Card, CardSet};

use crate::evaluator::{rank_five, rank_three, HandCategory, HandRank};
use crate::scoring;

/// One of the three face-up rows of an arrangement.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub enum RowId {
    Top,
    Middle,
    Bottom,
}

impl RowId {
    /// All rows, top to bottom.
    pub const ALL: [RowId; 3] = [RowId::Top, RowId::Middle, RowId::Bottom];

    /// The number of cards the row holds when full.
    pub fn capacity(self) -> usize {
        match self {
            RowId::Top => 3,
            RowId::Middle | RowId::Bottom => 5,
        }
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Top => write!(f, "top"),
            RowId::Middle => write!(f, "middle"),
            RowId::Bottom => write!(f, "bottom"),
        }
    }
}

/// A single row: up to `capacity` cards stored inline. Rows grow
/// monotonically; cards are never removed.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Row {
    cards: [Card; 5],
    len: u8,
    capacity: u8,
}

impl Row {
    fn with_capacity(capacity: usize) -> Row {
        Row {
            cards: [Card::WILD_X; 5],
            len: 0,
            capacity: capacity as u8,
        }
    }

    /// The cards placed in the row so far.
    pub fn cards(&self) -> &[Card] {
        &self.cards[..self.len as usize]
    }

    /// Returns the number of cards in the row.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` if the row holds no cards.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The number of cards the row holds when full.
    pub fn capacity(&self) -> usize {
        self.capacity as usize
    }

    /// Returns `true` if the row is at capacity.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    /// Open slots remaining in the row.
    pub fn free_slots(&self) -> usize {
        (self.capacity - self.len) as usize
    }

    fn push(&mut self, card: Card) {
        debug_assert!(!self.is_full());
        self.cards[self.len as usize] = card;
        self.len += 1;
    }

    /// Ranks the row's current cards, with missing cards counting as the
    /// worst possible kickers.
    pub fn hand_rank(&self) -> HandRank {
        if self.capacity == 3 {
            rank_three(self.cards())
        } else {
            rank_five(self.cards())
        }
    }
}

/// The three-row placement object: `top` (3 cards), `middle` (5) and
/// `bottom` (5).
///
/// Placements are not validated for foul safety; fouling is only meaningful
/// once the arrangement is complete.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Arrangement {
    top: Row,
    middle: Row,
    bottom: Row,
}

impl Arrangement {
    /// Constructs an empty arrangement.
    pub fn new() -> Arrangement {
        Arrangement {
            top: Row::with_capacity(3),
            middle: Row::with_capacity(5),
            bottom: Row::with_capacity(5),
        }
    }

    /// Builds an arrangement from explicit row contents, or `None` if any
    /// row exceeds its capacity.
    pub fn from_rows(top: &[Card], middle: &[Card], bottom: &[Card]) -> Option<Arrangement> {
        if top.len() > 3 || middle.len() > 5 || bottom.len() > 5 {
            return None;
        }
        let mut arrangement = Arrangement::new();
        for (&row, cards) in RowId::ALL.iter().zip([top, middle, bottom]) {
            for &card in cards {
                arrangement.place(card, row);
            }
        }
        Some(arrangement)
    }

    /// The requested row.
    pub fn row(&self, id: RowId) -> &Row {
        match id {
            RowId::Top => &self.top,
            RowId::Middle => &self.middle,
            RowId::Bottom => &self.bottom,
        }
    }

    fn row_mut(&mut self, id: RowId) -> &mut Row {
        match id {
            RowId::Top => &mut self.top,
            RowId::Middle => &mut self.middle,
            RowId::Bottom => &mut self.bottom,
        }
    }

    /// Returns `true` if the row has an open slot for another card.
    pub fn can_place(&self, id: RowId) -> bool {
        !self.row(id).is_full()
    }

    /// Places a card in the row. Only valid after a `can_place` check.
    pub fn place(&mut self, card: Card, id: RowId) {
        self.row_mut(id).push(card);
    }

    /// Total number of cards placed across the three rows.
    pub fn placed_count(&self) -> usize {
        self.top.len() + self.middle.len() + self.bottom.len()
    }

    /// The set of all cards placed in the arrangement.
    pub fn placed(&self) -> CardSet {
        let mut set = CardSet::new();
        for id in RowId::ALL {
            set.extend(self.row(id).cards().iter().copied());
        }
        set
    }

    /// Returns `true` once all three rows are at capacity (13 cards).
    pub fn is_complete(&self) -> bool {
        self.top.is_full() && self.middle.is_full() && self.bottom.is_full()
    }

    /// Ranks the given row's current cards.
    pub fn row_hand_rank(&self, id: RowId) -> HandRank {
        self.row(id).hand_rank()
    }

    /// Returns `true` if the completed arrangement breaks the row-ordering
    /// rule, i.e. `bottom < middle` or `middle < top` by hand strength.
    ///
    /// Must only be asked of a complete arrangement.
    pub fn is_fouled(&self) -> bool {
        debug_assert!(self.is_complete());
        let top = self.top.hand_rank();
        let middle = self.middle.hand_rank();
        let bottom = self.bottom.hand_rank();
        bottom < middle || middle < top
    }

    /// Sum of the per-row royalty bonuses, or 0 for a fouled arrangement.
    ///
    /// Must only be asked of a complete arrangement.
    pub fn royalties(&self) -> u32 {
        if self.is_fouled() {
            return 0;
        }
        RowId::ALL
            .iter()
            .map(|&id| scoring::row_royalty(id, self.row(id).hand_rank()))
            .sum()
    }

    /// Returns `true` if the completed arrangement qualifies for Fantasy
    /// Land: a top row of queens-or-better pair (or trips) without a foul.
    pub fn fantasy_land(&self) -> bool {
        if !self.is_complete() || self.is_fouled() {
            return false;
        }
        self.top.hand_rank() >= scoring::FANTASY_QUALIFYING_TOP
    }

    /// Returns `true` if the completed arrangement would retain Fantasy
    /// Land: trips up top, or quads-or-better in the middle or bottom.
    /// This is a scoring signal only; Fantasy-Land gameplay itself is not
    /// simulated.
    pub fn fantasy_retention(&self) -> bool {
        if !self.is_complete() || self.is_fouled() {
            return false;
        }
        self.top.hand_rank().category() == HandCategory::ThreeOfAKind
            || self.middle.hand_rank().category() >= HandCategory::FourOfAKind
            || self.bottom.hand_rank().category() >= HandCategory::FourOfAKind
    }
}

impl Default for Arrangement {
    fn default() -> Arrangement {
        Arrangement::new()
    }
}

impl fmt::Display for Arrangement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in RowId::ALL.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}:", id)?;
            for card in self.row(*id).cards() {
                write!(f, " {}", card)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    pub(crate) fn cards(s: &str) -> Vec<Card> {
        if s.is_empty() {
            return Vec::new();
        }
        s.split(' ').map(|c| c.parse().unwrap()).collect()
    }

    fn arrangement(top: &str, middle: &str, bottom: &str) -> Arrangement {
        Arrangement::from_rows(&cards(top), &cards(middle), &cards(bottom)).unwrap()
    }

    #[test]
    fn grows_monotonically() {
        let mut a = Arrangement::new();
        assert!(!a.is_complete());
        assert_eq!(a.placed_count(), 0);

        for card in cards("Ah Kd 2c") {
            assert!(a.can_place(RowId::Top));
            a.place(card, RowId::Top);
        }
        assert!(!a.can_place(RowId::Top));
        assert!(a.can_place(RowId::Middle));
        assert_eq!(a.placed_count(), 3);
        assert_eq!(a.placed(), "Ah Kd 2c".parse().unwrap());
    }

    #[test]
    fn complete_means_thirteen() {
        let a = arrangement("2c 3c 4c", "5c 6c 7c 8c 9c", "5d 6d 7d 8d 9d");
        assert!(a.is_complete());
        assert_eq!(a.placed_count(), 13);
        assert_eq!(a.placed().len(), 13);
    }

    #[rstest]
    #[case::ordered("2c 3d 4h", "9c 9d 2h 5s 6s", "Kc Kd Ks 5d 6c", false)]
    #[case::equal_categories("Ah Kd 2c", "9c 9d 2h 5s 6s", "9h 9s 3h 5d 6c", false)]
    #[case::top_beats_middle("Ah Ad 2c", "9c 8d 2h 5s 6s", "Kc Kd Ks 5d 6c", true)]
    #[case::middle_beats_bottom("2c 3d 4h", "Kc Kd Ks 5d 6c", "9c 9d 2h 5s 6s", true)]
    fn foul_definition(
        #[case] top: &str,
        #[case] middle: &str,
        #[case] bottom: &str,
        #[case] fouled: bool,
    ) {
        let a = arrangement(top, middle, bottom);
        assert!(a.is_complete());
        assert_eq!(a.is_fouled(), fouled);
    }

    #[test]
    fn foul_matches_rank_order() {
        let a = arrangement("Ah Ad 2c", "9c 8d 2h 5s 6s", "Kc Kd Ks 5d 6c");
        let top = a.row_hand_rank(RowId::Top);
        let middle = a.row_hand_rank(RowId::Middle);
        assert!(middle < top);
        assert!(a.is_fouled());
    }

    #[rstest]
    #[case::nothing("2c 3d 4h", "9c 9d 2h 5s 6s", "Kc Kd 2s 5d 6c", 0)]
    #[case::top_pair_of_sixes("6c 6d 4h", "9c 9d 2h 5s Qs", "Kc Kd Ks 5d 6h", 1 + 0 + 0)]
    #[case::top_aces("Ac Ad 4h", "9c 9d 9h 5s Js", "Kc Kd Ks Kh 6h", 9 + 2 + 10)]
    #[case::top_trips_of_twos("2c 2d 2h", "9c 9d 9h 5s Kd", "Ts Js Qs Ks As", 10 + 2 + 25)]
    #[case::wild_quads_middle("2c 3d 4h", "Xj Yj As Ad Ac", "Th Jh Qh Kh Ah", 20 + 25)]
    #[case::fouled_forfeits("Ah Ad 2c", "9c 8d 2h 5s 6s", "Kc Kd Ks 5d 6c", 0)]
    fn royalty_table(
        #[case] top: &str,
        #[case] middle: &str,
        #[case] bottom: &str,
        #[case] expected: u32,
    ) {
        let a = arrangement(top, middle, bottom);
        assert_eq!(a.royalties(), expected);
    }

    #[rstest]
    #[case::queens_qualify("Qc Qd 4h", "9c 9d 9h 5s Js", "Kc Kd Ks Kh 6h", true)]
    #[case::jacks_do_not("Jc Jd 4h", "9c 9d 9h 5s Td", "Kc Kd Ks Kh 6h", false)]
    #[case::trips_qualify("5c 5d 5h", "9c 9d 9h 2s Js", "Kc Kd Ks Kh 6h", true)]
    #[case::foul_disqualifies("Qc Qd Qh", "9c 8d 2h 5s 6s", "Kc Kd Ks 5d 6c", false)]
    fn fantasy_land_qualification(
        #[case] top: &str,
        #[case] middle: &str,
        #[case] bottom: &str,
        #[case] expected: bool,
    ) {
        let a = arrangement(top, middle, bottom);
        assert_eq!(a.fantasy_land(), expected);
    }

    #[test]
    fn fantasy_retention_needs_trips_or_quads() {
        let kept = arrangement("5c 5d 5h", "9c 9d 9h 2s Js", "Kc Kd Ks Kh 6h");
        assert!(kept.fantasy_retention());

        let lost = arrangement("Qc Qd 4h", "9c 9d 9h 5s Js", "Kc Kd Ks 5h 6h");
        assert!(!lost.fantasy_retention());
    }
}
