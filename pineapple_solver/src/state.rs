use pineapple_base::{Card, CardSet};

use crate::arrangement::{Arrangement, RowId};
use crate::moves::Action;

/// Maximum number of cards in hand at once (the street-0 opener).
pub const MAX_DEALT: usize = 5;

/// Number of cards received on each of streets 1 through 4.
pub const STREET_DEAL: usize = 3;

/// The last street; a hand is complete after its placements.
pub const LAST_STREET: u8 = 4;

/// Cards currently in hand awaiting placement, stored inline so states can
/// be copied freely inside playouts.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Dealt {
    cards: [Card; MAX_DEALT],
    len: u8,
}

impl Dealt {
    /// Builds a hand from the given cards. Panics if more than
    /// [`MAX_DEALT`] are supplied.
    pub fn new(cards: &[Card]) -> Dealt {
        assert!(cards.len() <= MAX_DEALT);
        let mut dealt = Dealt {
            cards: [Card::WILD_X; MAX_DEALT],
            len: cards.len() as u8,
        };
        dealt.cards[..cards.len()].copy_from_slice(cards);
        dealt
    }

    /// The cards in hand.
    pub fn cards(&self) -> &[Card] {
        &self.cards[..self.len as usize]
    }

    /// Number of cards in hand.
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Returns `true` when no cards are waiting to be placed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

/// A snapshot of one player's view of the hand: the partial arrangement,
/// the deck bookkeeping sets, the street number and the cards in hand.
///
/// The three bookkeeping sets and the placed cards are pairwise disjoint;
/// their complement within the 54-card deck is the unseen set from which
/// opponents and future draws are sampled. The facade validates this before
/// searching.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct State {
    pub(crate) arrangement: Arrangement,
    pub(crate) unseen: CardSet,
    pub(crate) discarded: CardSet,
    pub(crate) known_opponent: CardSet,
    pub(crate) street: u8,
    pub(crate) dealt: Dealt,
}

impl State {
    /// Constructs a snapshot. No validation happens here; the facade
    /// validates once, at its boundary.
    pub fn new(
        arrangement: Arrangement,
        unseen: CardSet,
        discarded: CardSet,
        known_opponent: CardSet,
        street: u8,
        dealt: &[Card],
    ) -> State {
        State {
            arrangement,
            unseen,
            discarded,
            known_opponent,
            street,
            dealt: Dealt::new(dealt),
        }
    }

    /// Convenience constructor for the start of a hand: an empty
    /// arrangement, the full 54-card deck minus the dealt cards unseen.
    pub fn opener(dealt: &[Card]) -> State {
        let mut unseen = CardSet::full();
        for &card in dealt {
            unseen.remove(card);
        }
        State::new(Arrangement::new(), unseen, CardSet::new(), CardSet::new(), 0, dealt)
    }

    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    pub fn unseen(&self) -> &CardSet {
        &self.unseen
    }

    pub fn discarded(&self) -> &CardSet {
        &self.discarded
    }

    pub fn known_opponent(&self) -> &CardSet {
        &self.known_opponent
    }

    pub fn street(&self) -> u8 {
        self.street
    }

    pub fn dealt(&self) -> &[Card] {
        self.dealt.cards()
    }

    /// Returns `true` once the arrangement holds all 13 cards.
    pub fn is_terminal(&self) -> bool {
        self.arrangement.is_complete()
    }

    /// Applies a generated action: places the cards, records the discard,
    /// clears the hand and advances the street.
    ///
    /// The caller is responsible for only applying actions produced for
    /// this exact state.
    pub fn apply(&mut self, action: &Action) {
        match action {
            Action::Opener { rows } => {
                debug_assert_eq!(self.street, 0);
                let dealt = self.dealt;
                for (i, &card) in dealt.cards().iter().enumerate() {
                    debug_assert!(self.arrangement.can_place(rows[i]));
                    self.arrangement.place(card, rows[i]);
                }
            }
            Action::Street { places, discard } => {
                debug_assert!(self.street >= 1);
                for &(card, row) in places {
                    debug_assert!(self.arrangement.can_place(row));
                    self.arrangement.place(card, row);
                }
                self.discarded.insert(*discard);
            }
            Action::Fold => {}
        }
        self.dealt.clear();
        if self.street < LAST_STREET {
            self.street += 1;
        }
    }

    /// Draws the next street's cards from the unseen set using the supplied
    /// generator. Returns `false` when the deck cannot cover the draw.
    pub(crate) fn draw(&mut self, rng: &mut fastrand::Rng, count: usize) -> bool {
        let mut buffer = [Card::WILD_X; MAX_DEALT];
        if !self.unseen.sample_into(rng, &mut buffer[..count]) {
            return false;
        }
        for &card in &buffer[..count] {
            self.unseen.remove(card);
        }
        self.dealt = Dealt::new(&buffer[..count]);
        true
    }

    /// Total open slots across the three rows.
    pub(crate) fn free_slots(&self) -> usize {
        RowId::ALL
            .iter()
            .map(|&id| self.arrangement.row(id).free_slots())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves;

    fn cards(s: &str) -> Vec<Card> {
        s.split(' ').map(|c| c.parse().unwrap()).collect()
    }

    #[test]
    fn opener_state_bookkeeping() {
        let dealt = cards("As Ks Qs Js Ts");
        let state = State::opener(&dealt);

        assert_eq!(state.street(), 0);
        assert_eq!(state.dealt().len(), 5);
        assert_eq!(state.unseen().len(), 49);
        for card in dealt {
            assert!(!state.unseen().contains(card));
        }
    }

    #[test]
    fn applying_an_opener_advances_the_street() {
        let mut state = State::opener(&cards("As Ks Qs Js Ts"));
        let actions = moves::generate(&state, 8);
        state.apply(&actions[0]);

        assert_eq!(state.street(), 1);
        assert!(state.dealt().is_empty());
        assert_eq!(state.arrangement().placed_count(), 5);
    }

    #[test]
    fn drawing_removes_cards_from_unseen() {
        let mut state = State::opener(&cards("As Ks Qs Js Ts"));
        let actions = moves::generate(&state, 8);
        state.apply(&actions[0]);

        let before = *state.unseen();
        assert!(state.draw(&mut fastrand::Rng::with_seed(3), STREET_DEAL));
        assert_eq!(state.dealt().len(), 3);
        assert_eq!(state.unseen().len(), before.len() - 3);
        for &card in state.dealt() {
            assert!(before.contains(card));
            assert!(!state.unseen().contains(card));
        }
    }
}
