use crate::Card;

/// Number of cards in a standard deck, without the jokers.
pub const STANDARD_CARD_COUNT: usize = 52;

/// Number of cards in the full Pineapple deck, jokers included.
pub const CARD_COUNT: usize = 54;

/// Number of distinct ranks in a standard 52-card deck.
pub const RANK_COUNT: usize = 13;

/// Number of jokers in the deck.
pub const WILD_COUNT: usize = 2;

/// Card index of the first joker.
pub const WILD_X_INDEX: usize = 52;

/// Card index of the second joker.
pub const WILD_Y_INDEX: usize = 53;

/// All 54 cards in index order (deuces to aces, clubs to spades, then the
/// two jokers).
pub static CARDS: [Card; CARD_COUNT] = {
    let mut data = [Card::from_index_unchecked(0); CARD_COUNT];
    let mut idx = 0u8;
    while (idx as usize) < CARD_COUNT {
        data[idx as usize] = Card::from_index_unchecked(idx);
        idx += 1;
    }
    data
};

/// Wire-format characters for the thirteen ranks, deuces to aces.
pub static RANK_CHARS: [char; RANK_COUNT] = [
    '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K', 'A',
];

/// Wire-format characters for the four suits, clubs to spades.
pub static SUIT_CHARS: [char; 4] = ['c', 'd', 'h', 's'];

/// Two-character text forms for all cards, in index order.
pub static CARDS_STR: [&str; CARD_COUNT] = [
    "2c", "2d", "2h", "2s", "3c", "3d", "3h", "3s", "4c", "4d", "4h", "4s", "5c", "5d", "5h", "5s",
    "6c", "6d", "6h", "6s", "7c", "7d", "7h", "7s", "8c", "8d", "8h", "8s", "9c", "9d", "9h", "9s",
    "Tc", "Td", "Th", "Ts", "Jc", "Jd", "Jh", "Js", "Qc", "Qd", "Qh", "Qs", "Kc", "Kd", "Kh", "Ks",
    "Ac", "Ad", "Ah", "As", "Xj", "Yj",
];

/// Full English language names of all card ranks.
pub static RANK_NAMES: [&str; RANK_COUNT] = [
    "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Jack", "Queen",
    "King", "Ace",
];

/// Full English language plural names of all card ranks.
pub static PLURAL_RANK_NAMES: [&str; RANK_COUNT] = [
    "Twos", "Threes", "Fours", "Fives", "Sixes", "Sevens", "Eights", "Nines", "Tens", "Jacks",
    "Queens", "Kings", "Aces",
];
