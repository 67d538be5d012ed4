use core::fmt;

use pineapple_base::constants::{PLURAL_RANK_NAMES, RANK_COUNT, RANK_NAMES};
use pineapple_base::Card;

/// A poker hand-ranking category, i.e. a straight, a flush, etc.
///
/// Only [`HighCard`](HandCategory::HighCard), [`Pair`](HandCategory::Pair)
/// and [`ThreeOfAKind`](HandCategory::ThreeOfAKind) are reachable by the
/// 3-card top row.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash)]
pub enum HandCategory {
    /// A hand that does not fall into any of the other categories.
    HighCard = 0,
    /// Two cards of one rank, and up to three cards of other ranks.
    Pair,
    /// Two cards of one rank, two cards of another rank and a fifth card of
    /// a different, third rank.
    TwoPair,
    /// Three cards of the same rank, and up to two cards of other ranks.
    ThreeOfAKind,
    /// Five cards of sequential rank, with at least two different suits.
    Straight,
    /// Five cards of the same suit, but without sequential rank.
    Flush,
    /// Three cards of one rank and two cards of another rank.
    FullHouse,
    /// Four cards of the same rank and one card of another rank.
    FourOfAKind,
    /// Five cards of sequential rank, all of the same suit, excluding an
    /// ace-high sequence.
    StraightFlush,
    /// The sequence A-K-Q-J-T all of the same suit, i.e. an ace-high
    /// straight flush.
    RoyalFlush,
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandCategory::HighCard => write!(f, "High Card"),
            HandCategory::Pair => write!(f, "Pair"),
            HandCategory::TwoPair => write!(f, "Two Pair"),
            HandCategory::ThreeOfAKind => write!(f, "Three of a Kind"),
            HandCategory::Straight => write!(f, "Straight"),
            HandCategory::Flush => write!(f, "Flush"),
            HandCategory::FullHouse => write!(f, "Full House"),
            HandCategory::FourOfAKind => write!(f, "Four of a Kind"),
            HandCategory::StraightFlush => write!(f, "Straight Flush"),
            HandCategory::RoyalFlush => write!(f, "Royal Flush"),
        }
    }
}

impl HandCategory {
    fn from_packed(value: u32) -> HandCategory {
        match value {
            0 => HandCategory::HighCard,
            1 => HandCategory::Pair,
            2 => HandCategory::TwoPair,
            3 => HandCategory::ThreeOfAKind,
            4 => HandCategory::Straight,
            5 => HandCategory::Flush,
            6 => HandCategory::FullHouse,
            7 => HandCategory::FourOfAKind,
            8 => HandCategory::StraightFlush,
            9 => HandCategory::RoyalFlush,
            _ => unreachable!(),
        }
    }
}

/// The strength ranking of a row hand.
///
/// Compares lexicographically: category first, then the tiebreak ranks in
/// canonical descending order. Rows with fewer cards than their capacity
/// rank as if the missing cards were the worst possible kickers, so adding
/// a card never lowers the ranking.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug, Hash, Default)]
pub struct HandRank(pub u32);

const CATEGORY_SHIFT: u32 = 20;

impl HandRank {
    /// Returns the hand-ranking category (i.e. high card, pair, etc.)
    /// corresponding to the hand ranking.
    pub fn category(&self) -> HandCategory {
        HandCategory::from_packed(self.0 >> CATEGORY_SHIFT)
    }

    /// Returns the `i`-th tiebreak rank index (0-based, most significant
    /// first), or `None` when that tiebreak slot is vacant.
    pub fn tiebreak(&self, i: usize) -> Option<usize> {
        debug_assert!(i < 5);
        let nibble = (self.0 >> (16 - 4 * i as u32)) & 0xf;
        if nibble == 0 {
            None
        } else {
            Some(nibble as usize - 1)
        }
    }

    pub(crate) fn pack(category: HandCategory, tiebreaks: &[usize]) -> HandRank {
        debug_assert!(tiebreaks.len() <= 5);
        let mut value = (category as u32) << CATEGORY_SHIFT;
        for (i, &rank) in tiebreaks.iter().enumerate() {
            debug_assert!(rank < RANK_COUNT);
            value |= ((rank + 1) as u32) << (16 - 4 * i as u32);
        }
        HandRank(value)
    }
}

impl fmt::Display for HandRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = self.category();
        match category {
            HandCategory::RoyalFlush => write!(f, "{}", category),
            HandCategory::HighCard | HandCategory::Flush => match self.tiebreak(0) {
                Some(r) => write!(f, "{}, {}-high", category, RANK_NAMES[r]),
                None => write!(f, "{}", category),
            },
            HandCategory::Pair | HandCategory::ThreeOfAKind | HandCategory::FourOfAKind => {
                write!(f, "{}, {}", category, PLURAL_RANK_NAMES[self.tiebreak(0).unwrap()])
            }
            HandCategory::TwoPair => write!(
                f,
                "{}, {} and {}",
                category,
                PLURAL_RANK_NAMES[self.tiebreak(0).unwrap()],
                PLURAL_RANK_NAMES[self.tiebreak(1).unwrap()],
            ),
            HandCategory::FullHouse => write!(
                f,
                "{}, {} over {}",
                category,
                PLURAL_RANK_NAMES[self.tiebreak(0).unwrap()],
                PLURAL_RANK_NAMES[self.tiebreak(1).unwrap()],
            ),
            HandCategory::Straight | HandCategory::StraightFlush => {
                write!(f, "{}, {}-high", category, RANK_NAMES[self.tiebreak(0).unwrap()])
            }
        }
    }
}

/// Straight windows as rank bitmasks, ace-high first, the wheel last.
/// Each entry is (high card rank index, window mask).
const STRAIGHT_WINDOWS: [(usize, u16); 10] = [
    (12, 0b1111100000000),
    (11, 0b0111110000000),
    (10, 0b0011111000000),
    (9, 0b0001111100000),
    (8, 0b0000111110000),
    (7, 0b0000011111000),
    (6, 0b0000001111100),
    (5, 0b0000000111110),
    (4, 0b0000000011111),
    (3, 0b1000000001111),
];

/// Rank and suit histograms of the non-wild cards of a hand, plus the wild
/// count. Built once per evaluation; everything downstream reads counts.
struct Histogram {
    counts: [u8; RANK_COUNT],
    suit_masks: [u16; 4],
    natural_mask: u16,
    naturals: usize,
    wilds: usize,
    total: usize,
}

impl Histogram {
    fn of(cards: &[Card]) -> Histogram {
        let mut h = Histogram {
            counts: [0; RANK_COUNT],
            suit_masks: [0; 4],
            natural_mask: 0,
            naturals: 0,
            wilds: 0,
            total: cards.len(),
        };
        for &card in cards {
            if card.is_wild() {
                h.wilds += 1;
            } else {
                let r = card.rank_index();
                h.counts[r] += 1;
                h.suit_masks[card.suit_index()] |= 1 << r;
                h.natural_mask |= 1 << r;
                h.naturals += 1;
            }
        }
        h
    }

    /// Highest rank that is not `exclude` and, when `absent_only` is set,
    /// not already among the naturals. Used to pick wild kickers.
    fn best_free_rank(&self, exclude: usize, absent_only: bool) -> usize {
        for r in (0..RANK_COUNT).rev() {
            if r == exclude {
                continue;
            }
            if absent_only && self.counts[r] > 0 {
                continue;
            }
            return r;
        }
        0
    }
}

/// Returns the rank of the best 5-card hand that can be made from the given
/// cards by substituting each joker with any standard card not already
/// present.
///
/// Accepts 0 to 5 cards; a hand with fewer than 5 cards ranks as if the
/// missing cards were the worst possible kickers, which makes the result a
/// monotone lower bound for any completion of the row.
///
/// The joker search is structural: categories are tried in descending
/// order and the first reachable one is taken, so the cost is O(1) and the
/// function does not allocate.
///
/// # Examples
///
/// ```
/// use pineapple_solver::{rank_five, HandCategory};
///
/// let cards: Vec<_> = ["As", "Ks", "Qs", "Js", "Xj"]
///     .iter()
///     .map(|s| s.parse().unwrap())
///     .collect();
/// assert_eq!(rank_five(&cards).category(), HandCategory::RoyalFlush);
/// ```
pub fn rank_five(cards: &[Card]) -> HandRank {
    debug_assert!(cards.len() <= 5);
    let h = Histogram::of(cards);

    if h.total == 5 {
        if let Some(rank) = try_straight_flush(&h) {
            return rank;
        }
    }
    if let Some(rank) = try_quads(&h) {
        return rank;
    }
    if let Some(rank) = try_full_house(&h) {
        return rank;
    }
    if h.total == 5 {
        if let Some(rank) = try_flush(&h) {
            return rank;
        }
        if let Some(rank) = try_straight(&h) {
            return rank;
        }
    }
    if let Some(rank) = try_trips(&h) {
        return rank;
    }
    if let Some(rank) = try_two_pair(&h) {
        return rank;
    }
    if let Some(rank) = try_pair(&h) {
        return rank;
    }
    high_card(&h)
}

/// Returns the rank of the best 3-card top-row hand, with the same joker
/// substitution and partial-hand contract as [`rank_five`].
///
/// Only high card, pair and three of a kind are reachable in three cards.
pub fn rank_three(cards: &[Card]) -> HandRank {
    debug_assert!(cards.len() <= 3);
    let h = Histogram::of(cards);

    // Trips: all naturals share one rank and jokers cover the rest.
    if h.total == 3 {
        for r in (0..RANK_COUNT).rev() {
            let c = h.counts[r] as usize;
            if c == h.naturals && c + h.wilds >= 3 && c > 0 {
                return HandRank::pack(HandCategory::ThreeOfAKind, &[r]);
            }
        }
    }

    if h.total >= 2 {
        if let Some(rank) = try_pair(&h) {
            return rank;
        }
    }
    high_card(&h)
}

fn try_straight_flush(h: &Histogram) -> Option<HandRank> {
    for &(high, window) in &STRAIGHT_WINDOWS {
        for suit in 0..4 {
            // Every natural must be of this suit and inside the window;
            // the jokers fill whatever is missing.
            let inside = (h.suit_masks[suit] & window).count_ones() as usize;
            if inside == h.naturals {
                return Some(if high == 12 {
                    HandRank::pack(HandCategory::RoyalFlush, &[])
                } else {
                    HandRank::pack(HandCategory::StraightFlush, &[high])
                });
            }
        }
    }
    None
}

fn try_quads(h: &Histogram) -> Option<HandRank> {
    if h.total < 4 {
        return None;
    }
    for r in (0..RANK_COUNT).rev() {
        let c = h.counts[r] as usize;
        if c == 0 || c + h.wilds < 4 {
            continue;
        }
        let others = h.naturals - c;
        if others > h.total - 4 {
            continue;
        }
        let leftover_wilds = h.wilds - (4 - c);

        let mut tiebreaks = [r, 0];
        let kicker = if leftover_wilds > 0 {
            Some(h.best_free_rank(r, false))
        } else {
            (0..RANK_COUNT).rev().find(|&k| k != r && h.counts[k] > 0)
        };
        return Some(match kicker {
            Some(k) => {
                tiebreaks[1] = k;
                HandRank::pack(HandCategory::FourOfAKind, &tiebreaks)
            }
            None => HandRank::pack(HandCategory::FourOfAKind, &tiebreaks[..1]),
        });
    }
    None
}

fn try_full_house(h: &Histogram) -> Option<HandRank> {
    if h.total != 5 {
        return None;
    }
    for t in (0..RANK_COUNT).rev() {
        let ct = h.counts[t] as usize;
        if ct == 0 || ct > 3 {
            continue;
        }
        for p in (0..RANK_COUNT).rev() {
            if p == t {
                continue;
            }
            let cp = h.counts[p] as usize;
            if cp > 2 || ct + cp != h.naturals {
                continue;
            }
            let wt = 3 - ct;
            let wp = 2usize.saturating_sub(cp);
            if wt + wp == h.wilds {
                return Some(HandRank::pack(HandCategory::FullHouse, &[t, p]));
            }
        }
    }
    None
}

fn try_flush(h: &Histogram) -> Option<HandRank> {
    let suit = (0..4).find(|&s| h.suit_masks[s].count_ones() as usize == h.naturals)?;
    if h.naturals == 0 {
        return None;
    }

    // Jokers become the highest ranks absent from the made suit.
    let mut tiebreaks = [0usize; 5];
    let mut n = 0;
    let mut wilds_left = h.wilds;
    for r in (0..RANK_COUNT).rev() {
        if h.suit_masks[suit] & (1 << r) != 0 {
            tiebreaks[n] = r;
            n += 1;
        } else if wilds_left > 0 {
            tiebreaks[n] = r;
            n += 1;
            wilds_left -= 1;
        }
        if n == 5 {
            break;
        }
    }
    Some(HandRank::pack(HandCategory::Flush, &tiebreaks))
}

fn try_straight(h: &Histogram) -> Option<HandRank> {
    // Duplicated naturals can never fit in five sequential ranks.
    if (h.natural_mask.count_ones() as usize) != h.naturals {
        return None;
    }
    for &(high, window) in &STRAIGHT_WINDOWS {
        if h.natural_mask & !window == 0 {
            return Some(HandRank::pack(HandCategory::Straight, &[high]));
        }
    }
    None
}

fn try_trips(h: &Histogram) -> Option<HandRank> {
    if h.total < 3 {
        return None;
    }
    for r in (0..RANK_COUNT).rev() {
        let c = h.counts[r] as usize;
        if c == 0 || c + h.wilds < 3 {
            continue;
        }
        let wt = 3usize.saturating_sub(c);
        let mut leftover_wilds = h.wilds - wt;

        let mut tiebreaks = [r, 0, 0];
        let mut n = 1;
        let mut kickers_left = h.total.saturating_sub(3).min(2);
        for k in (0..RANK_COUNT).rev() {
            if kickers_left == 0 {
                break;
            }
            if k == r {
                continue;
            }
            if h.counts[k] > 0 {
                tiebreaks[n] = k;
                n += 1;
                kickers_left -= 1;
            } else if leftover_wilds > 0 {
                tiebreaks[n] = k;
                n += 1;
                leftover_wilds -= 1;
                kickers_left -= 1;
            }
        }
        return Some(HandRank::pack(HandCategory::ThreeOfAKind, &tiebreaks[..n]));
    }
    None
}

fn try_two_pair(h: &Histogram) -> Option<HandRank> {
    let mut pairs = [0usize; 2];
    let mut n = 0;
    for r in (0..RANK_COUNT).rev() {
        if h.counts[r] >= 2 {
            if n < 2 {
                pairs[n] = r;
            }
            n += 1;
        }
    }
    if n < 2 {
        return None;
    }

    let kicker = (0..RANK_COUNT)
        .rev()
        .find(|&k| h.counts[k] > 0 && k != pairs[0] && k != pairs[1]);
    Some(match kicker {
        Some(k) => HandRank::pack(HandCategory::TwoPair, &[pairs[0], pairs[1], k]),
        None => HandRank::pack(HandCategory::TwoPair, &pairs),
    })
}

fn try_pair(h: &Histogram) -> Option<HandRank> {
    if h.total < 2 {
        return None;
    }

    let pair_rank = if h.wilds >= 1 {
        // A joker pairs the best natural; two naturals-free jokers pair up
        // as aces themselves.
        match (0..RANK_COUNT).rev().find(|&r| h.counts[r] > 0) {
            Some(r) => r,
            None if h.wilds >= 2 => 12,
            None => return None,
        }
    } else {
        (0..RANK_COUNT).rev().find(|&r| h.counts[r] >= 2)?
    };

    let mut tiebreaks = [pair_rank, 0, 0, 0];
    let mut n = 1;
    for k in (0..RANK_COUNT).rev() {
        if n == 4 {
            break;
        }
        if k == pair_rank {
            continue;
        }
        for _ in 0..h.counts[k] {
            if n < 4 {
                tiebreaks[n] = k;
                n += 1;
            }
        }
    }
    Some(HandRank::pack(HandCategory::Pair, &tiebreaks[..n]))
}

fn high_card(h: &Histogram) -> HandRank {
    let mut tiebreaks = [0usize; 5];
    let mut n = 0;

    // A lone joker with no naturals to pair ranks as an ace high.
    let mut wilds_left = h.wilds;
    for r in (0..RANK_COUNT).rev() {
        if n == 5 {
            break;
        }
        if h.counts[r] > 0 {
            tiebreaks[n] = r;
            n += 1;
        } else if wilds_left > 0 {
            tiebreaks[n] = r;
            n += 1;
            wilds_left -= 1;
        }
    }
    HandRank::pack(HandCategory::HighCard, &tiebreaks[..n])
}
