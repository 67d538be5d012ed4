//! Fast static evaluation for non-terminal states: per-row reachability
//! bounds, foul-risk estimates, and the scalar used to order candidate
//! actions and drive the playout default policy.
//!
//! Everything here is an estimate. Upper bounds err on the side of
//! optimism so that foul pruning never drops a placement that could still
//! be saved by the right run-out.

use pineapple_base::{Card, CardSet};

use crate::arrangement::{Arrangement, Row, RowId};
use crate::evaluator::{HandCategory, HandRank};
use crate::scoring::{self, FOUL_PENALTY};
use crate::state::State;

const TOP_WEIGHT: f64 = 0.3;
const MIDDLE_WEIGHT: f64 = 0.5;
const BOTTOM_WEIGHT: f64 = 0.5;

/// Straight windows shared with the evaluator, ace-high first.
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

/// Per-rank and per-suit availability in the unseen set.
struct Outs {
    rank_counts: [u8; 13],
    suit_masks: [u16; 4],
    wilds: usize,
}

impl Outs {
    fn of(unseen: &CardSet) -> Outs {
        let mut outs = Outs {
            rank_counts: [0; 13],
            suit_masks: [0; 4],
            wilds: unseen.wild_count(),
        };
        for card in unseen.without_wilds().iter() {
            let r = card.rank_index();
            outs.rank_counts[r] += 1;
            outs.suit_masks[card.suit_index()] |= 1 << r;
        }
        outs
    }
}

/// Shape of the cards already placed in one row.
struct RowShape {
    counts: [u8; 13],
    suit_masks: [u16; 4],
    natural_mask: u16,
    naturals: usize,
    wilds: usize,
    capacity: usize,
    len: usize,
}

impl RowShape {
    fn of(row: &Row) -> RowShape {
        let mut shape = RowShape {
            counts: [0; 13],
            suit_masks: [0; 4],
            natural_mask: 0,
            naturals: 0,
            wilds: 0,
            capacity: row.capacity(),
            len: row.len(),
        };
        for &card in row.cards() {
            if card.is_wild() {
                shape.wilds += 1;
            } else {
                let r = card.rank_index();
                shape.counts[r] += 1;
                shape.suit_masks[card.suit_index()] |= 1 << r;
                shape.natural_mask |= 1 << r;
                shape.naturals += 1;
            }
        }
        shape
    }

    fn free(&self) -> usize {
        self.capacity - self.len
    }

    fn distinct_ranks(&self) -> usize {
        self.natural_mask.count_ones() as usize
    }

    /// Most copies of rank `r` this row could end up holding, counting its
    /// own jokers, the unseen supply, and the open slots.
    fn achievable(&self, r: usize, outs: &Outs) -> usize {
        let base = self.counts[r] as usize + self.wilds;
        let supply = outs.rank_counts[r] as usize + outs.wilds;
        (base + supply).min(base + self.free()).min(4 + self.wilds)
    }
}

/// The best hand rank the row could still reach given the unseen cards.
/// Optimistic: tiebreak slots the bound cannot pin down are filled with
/// aces.
pub(crate) fn row_upper_bound(row: &Row, unseen: &CardSet) -> HandRank {
    if row.is_full() {
        return row.hand_rank();
    }
    let shape = RowShape::of(row);
    let outs = Outs::of(unseen);
    if shape.capacity == 3 {
        top_upper_bound(&shape, &outs)
    } else {
        five_upper_bound(&shape, &outs)
    }
}

fn top_upper_bound(shape: &RowShape, outs: &Outs) -> HandRank {
    // Trips need every natural on one rank.
    if shape.distinct_ranks() <= 1 {
        if shape.naturals == 0 {
            for r in (0..13).rev() {
                if shape.achievable(r, outs) >= 3 {
                    return HandRank::pack(HandCategory::ThreeOfAKind, &[r]);
                }
            }
        } else {
            let r = shape.natural_mask.trailing_zeros() as usize;
            if shape.achievable(r, outs) >= 3 {
                return HandRank::pack(HandCategory::ThreeOfAKind, &[r]);
            }
        }
    }

    for r in (0..13).rev() {
        let others = shape.naturals - shape.counts[r] as usize;
        if others <= shape.capacity - 2 && shape.achievable(r, outs) >= 2 {
            return HandRank::pack(HandCategory::Pair, &[r, 12]);
        }
    }
    HandRank::pack(HandCategory::HighCard, &[12, 12, 12])
}

fn five_upper_bound(shape: &RowShape, outs: &Outs) -> HandRank {
    let free = shape.free();

    for &(high, window) in &STRAIGHT_WINDOWS {
        for suit in 0..4 {
            let present = (shape.suit_masks[suit] & window).count_ones() as usize;
            if present != shape.naturals {
                continue;
            }
            let supply = (outs.suit_masks[suit] & window).count_ones() as usize + outs.wilds;
            if supply >= free {
                return if high == 12 {
                    HandRank::pack(HandCategory::RoyalFlush, &[])
                } else {
                    HandRank::pack(HandCategory::StraightFlush, &[high])
                };
            }
        }
    }

    for r in (0..13).rev() {
        let others = shape.naturals - shape.counts[r] as usize;
        if others <= shape.capacity - 4 && shape.achievable(r, outs) >= 4 {
            return HandRank::pack(HandCategory::FourOfAKind, &[r, 12]);
        }
    }

    if shape.distinct_ranks() <= 2 {
        for t in (0..13).rev() {
            if shape.achievable(t, outs) < 3 {
                continue;
            }
            let leftover = shape.natural_mask & !(1 << t);
            if leftover.count_ones() > 1 {
                continue;
            }
            let pair_ok = if leftover == 0 {
                (0..13).rev().any(|p| p != t && shape.achievable(p, outs) >= 2)
            } else {
                let p = leftover.trailing_zeros() as usize;
                shape.achievable(p, outs) >= 2
            };
            if pair_ok && (shape.counts[t] as usize) <= 3 {
                return HandRank::pack(HandCategory::FullHouse, &[t, 12]);
            }
        }
    }

    for suit in 0..4 {
        if (shape.suit_masks[suit].count_ones() as usize) == shape.naturals {
            let supply = outs.suit_masks[suit].count_ones() as usize + outs.wilds;
            if supply >= free {
                return HandRank::pack(HandCategory::Flush, &[12, 11, 10, 9, 8]);
            }
        }
    }

    if shape.distinct_ranks() == shape.naturals {
        for &(high, window) in &STRAIGHT_WINDOWS {
            if shape.natural_mask & !window != 0 {
                continue;
            }
            let mut uncovered = 0;
            for r in 0..13 {
                if window & (1 << r) != 0
                    && shape.natural_mask & (1 << r) == 0
                    && outs.rank_counts[r] == 0
                {
                    uncovered += 1;
                }
            }
            if uncovered <= shape.wilds + outs.wilds {
                return HandRank::pack(HandCategory::Straight, &[high]);
            }
        }
    }

    for r in (0..13).rev() {
        let others = shape.naturals - shape.counts[r] as usize;
        if others <= shape.capacity - 3 && shape.achievable(r, outs) >= 3 {
            return HandRank::pack(HandCategory::ThreeOfAKind, &[r, 12, 12]);
        }
    }

    let mut pair_ranks = (0..13).rev().filter(|&r| shape.achievable(r, outs) >= 2);
    if let Some(first) = pair_ranks.next() {
        if pair_ranks.next().is_some() {
            return HandRank::pack(HandCategory::TwoPair, &[first, 12, 12]);
        }
        return HandRank::pack(HandCategory::Pair, &[first, 12, 12, 12]);
    }
    HandRank::pack(HandCategory::HighCard, &[12, 12, 12, 12, 12])
}

/// Returns `true` when no completion of the arrangement can avoid a foul:
/// some upper row's current strength already exceeds everything a lower
/// row could still become.
pub(crate) fn foul_forced(arrangement: &Arrangement, unseen: &CardSet) -> bool {
    let lb_top = arrangement.row(RowId::Top).hand_rank();
    let lb_middle = arrangement.row(RowId::Middle).hand_rank();
    let ub_middle = row_upper_bound(arrangement.row(RowId::Middle), unseen);
    let ub_bottom = row_upper_bound(arrangement.row(RowId::Bottom), unseen);

    lb_top > ub_middle || lb_middle > ub_bottom || lb_top > ub_bottom
}

fn pair_risk(lb_hi: HandRank, lb_lo: HandRank, ub_lo: HandRank) -> f64 {
    if lb_hi > ub_lo {
        return 1.0;
    }
    if lb_lo >= lb_hi {
        return 0.0;
    }
    match ub_lo.category() as i32 - lb_hi.category() as i32 {
        gap if gap >= 2 => 0.05,
        1 => 0.15,
        _ => 0.4,
    }
}

/// Estimated cost of fouling, in `[0, FOUL_PENALTY]`.
pub(crate) fn foul_risk(arrangement: &Arrangement, unseen: &CardSet) -> f64 {
    if arrangement.is_complete() {
        return if arrangement.is_fouled() { FOUL_PENALTY } else { 0.0 };
    }

    let lb_top = arrangement.row(RowId::Top).hand_rank();
    let lb_middle = arrangement.row(RowId::Middle).hand_rank();
    let lb_bottom = arrangement.row(RowId::Bottom).hand_rank();
    let ub_middle = row_upper_bound(arrangement.row(RowId::Middle), unseen);
    let ub_bottom = row_upper_bound(arrangement.row(RowId::Bottom), unseen);

    let upper = pair_risk(lb_top, lb_middle, ub_middle);
    let lower = pair_risk(lb_middle, lb_bottom, ub_bottom);
    FOUL_PENALTY * (1.0 - (1.0 - upper) * (1.0 - lower))
}

/// Probability estimate that completions foul, in `[0, 1]`.
pub(crate) fn foul_probability(arrangement: &Arrangement, unseen: &CardSet) -> f64 {
    foul_risk(arrangement, unseen) / FOUL_PENALTY
}

/// Royalties of the rows as currently ranked; completed rows contribute
/// their real royalty, partial rows whatever their partial hand already
/// pays.
pub(crate) fn partial_royalties(arrangement: &Arrangement) -> u32 {
    RowId::ALL
        .iter()
        .map(|&id| scoring::row_royalty(id, arrangement.row(id).hand_rank()))
        .sum()
}

/// The fast scalar for non-terminal states: partial royalties, weighted
/// per-row reachability, minus the foul risk.
pub(crate) fn static_score(state: &State) -> f64 {
    let arrangement = state.arrangement();
    let unseen = state.unseen();

    let top = row_upper_bound(arrangement.row(RowId::Top), unseen).category() as u32 as f64;
    let middle = row_upper_bound(arrangement.row(RowId::Middle), unseen).category() as u32 as f64;
    let bottom = row_upper_bound(arrangement.row(RowId::Bottom), unseen).category() as u32 as f64;

    partial_royalties(arrangement) as f64 + TOP_WEIGHT * top + MIDDLE_WEIGHT * middle
        + BOTTOM_WEIGHT * bottom
        - foul_risk(arrangement, unseen)
}

/// Probability estimate of ending in Fantasy Land: a queens-or-better top
/// without a foul.
pub(crate) fn fantasy_land_probability(arrangement: &Arrangement, unseen: &CardSet) -> f64 {
    if arrangement.is_complete() {
        return if arrangement.fantasy_land() { 1.0 } else { 0.0 };
    }

    let top = arrangement.row(RowId::Top);
    let clean = 1.0 - foul_probability(arrangement, unseen);
    if top.hand_rank() >= crate::scoring::FANTASY_QUALIFYING_TOP {
        return clean;
    }
    if row_upper_bound(top, unseen) < crate::scoring::FANTASY_QUALIFYING_TOP {
        return 0.0;
    }
    if unseen.is_empty() {
        return 0.0;
    }

    // Crude outs ratio: queens-or-better (or jokers) remaining, spread over
    // the open top slots.
    let outs = unseen
        .iter()
        .filter(|c| c.is_wild() || c.rank_index() >= 10)
        .count();
    let ratio = outs as f64 / unseen.len() as f64 * top.free_slots() as f64;
    ratio.min(0.75) * clean
}

/// Ordering score for a candidate action: the static value of the state it
/// produces, with a nudge for keeping the rows already ordered.
pub(crate) fn action_score(after: &State) -> f64 {
    let arrangement = after.arrangement();
    let ordered = {
        let top = arrangement.row(RowId::Top).hand_rank();
        let middle = arrangement.row(RowId::Middle).hand_rank();
        let bottom = arrangement.row(RowId::Bottom).hand_rank();
        top <= middle && middle <= bottom
    };
    static_score(after) + if ordered { 0.5 } else { 0.0 }
}

/// Greedy placement of a full set of opponent cards, used by playouts to
/// build the sampled opponent arrangement. Strong cards sink to the lower
/// rows; each card goes to the open row that scores best.
pub(crate) fn place_all_greedy(cards: &mut [Card]) -> Arrangement {
    // Jokers last so they patch whatever row needs them most.
    cards.sort_by_key(|c| {
        if c.is_wild() {
            (1, 0)
        } else {
            (0, 12 - c.rank_index() as i32)
        }
    });

    let mut arrangement = Arrangement::new();
    for &card in cards.iter() {
        let mut best: Option<(RowId, f64)> = None;
        for id in RowId::ALL {
            if !arrangement.can_place(id) {
                continue;
            }
            let mut trial = arrangement;
            trial.place(card, id);
            let score = greedy_row_score(&trial);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((id, score));
            }
        }
        let (id, _) = best.expect("13 cards always fit in 13 slots");
        arrangement.place(card, id);
    }
    arrangement
}

fn greedy_row_score(arrangement: &Arrangement) -> f64 {
    let top = arrangement.row(RowId::Top).hand_rank();
    let middle = arrangement.row(RowId::Middle).hand_rank();
    let bottom = arrangement.row(RowId::Bottom).hand_rank();
    let mut violations = 0.0;
    if top > middle {
        violations += 1.0;
    }
    if middle > bottom {
        violations += 1.0;
    }
    partial_royalties(arrangement) as f64 - 8.0 * violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::State;
    use pineapple_base::Card;
    use rstest::rstest;

    fn cards(s: &str) -> Vec<Card> {
        if s.is_empty() {
            return Vec::new();
        }
        s.split(' ').map(|c| c.parse().unwrap()).collect()
    }

    fn unseen_without(rows: &[&str]) -> CardSet {
        let mut unseen = CardSet::full();
        for row in rows {
            for card in cards(row) {
                unseen.remove(card);
            }
        }
        unseen
    }

    #[rstest]
    #[case::empty_bottom_reaches_royal("", 5, HandCategory::RoyalFlush)]
    #[case::suited_run_reaches_royal("As Ks Qs", 5, HandCategory::RoyalFlush)]
    #[case::offsuit_cards_cap_lower("2c 7d 9h", 5, HandCategory::ThreeOfAKind)]
    fn five_card_bounds(
        #[case] row: &str,
        #[case] _capacity: usize,
        #[case] expected: HandCategory,
    ) {
        let row_cards = cards(row);
        let arrangement = Arrangement::from_rows(&[], &[], &row_cards).unwrap();
        let unseen = unseen_without(&[row]);
        let bound = row_upper_bound(arrangement.row(RowId::Bottom), &unseen);
        assert_eq!(bound.category(), expected);
    }

    #[test]
    fn bound_never_underestimates_partial_rank() {
        let arrangement =
            Arrangement::from_rows(&[], &[], &cards("Kc Kd Kh Ks")).unwrap();
        let unseen = unseen_without(&["Kc Kd Kh Ks"]);
        let bound = row_upper_bound(arrangement.row(RowId::Bottom), &unseen);
        assert!(bound >= arrangement.row(RowId::Bottom).hand_rank());
    }

    #[test]
    fn top_bound_respects_exhausted_outs() {
        // Top holds 2c 7d; no pair outs remain in a tiny unseen set.
        let arrangement = Arrangement::from_rows(&cards("2c 7d"), &[], &[]).unwrap();
        let unseen: CardSet = "Ah Kd".parse().unwrap();
        let bound = row_upper_bound(arrangement.row(RowId::Top), &unseen);
        assert_eq!(bound.category(), HandCategory::HighCard);
    }

    #[test]
    fn aces_over_nothing_forces_the_foul() {
        // Top already holds aces; middle is locked to a nine-high board
        // with only deuces and treys left unseen.
        let arrangement = Arrangement::from_rows(
            &cards("Ah Ad 2c"),
            &cards("9c 8d 7h 5s 3h"),
            &cards("Kc Kd Ks 5d 6c"),
        )
        .unwrap();
        let unseen: CardSet = "2d 2h 3c 3d".parse().unwrap();
        assert!(foul_forced(&arrangement, &unseen));
    }

    #[test]
    fn open_rows_are_not_foul_forced() {
        let arrangement = Arrangement::from_rows(
            &[],
            &cards("9s 9d"),
            &cards("Ks Kd Kh Kc"),
        )
        .unwrap();
        let unseen = unseen_without(&["9s 9d", "Ks Kd Kh Kc"]);
        assert!(!foul_forced(&arrangement, &unseen));
    }

    #[test]
    fn foul_risk_is_bounded_and_spikes_when_forced() {
        let safe = Arrangement::from_rows(&[], &[], &[]).unwrap();
        let unseen = CardSet::full();
        let risk = foul_risk(&safe, &unseen);
        assert!((0.0..=FOUL_PENALTY).contains(&risk));

        let forced = Arrangement::from_rows(
            &cards("Ah Ad 2c"),
            &cards("9c 8d 7h 5s 3h"),
            &cards("Kc Kd Ks 5d 6c"),
        )
        .unwrap();
        let tiny: CardSet = "2d 2h 3c 3d".parse().unwrap();
        assert_eq!(foul_risk(&forced, &tiny), FOUL_PENALTY);
    }

    #[test]
    fn static_score_prefers_made_royalties() {
        let quads = State::new(
            Arrangement::from_rows(&[], &[], &cards("Kc Kd Kh Ks")).unwrap(),
            unseen_without(&["Kc Kd Kh Ks"]),
            CardSet::new(),
            CardSet::new(),
            1,
            &[],
        );
        let nothing = State::new(
            Arrangement::from_rows(&[], &[], &cards("2c 7d 9h Js")).unwrap(),
            unseen_without(&["2c 7d 9h Js"]),
            CardSet::new(),
            CardSet::new(),
            1,
            &[],
        );
        assert!(static_score(&quads) > static_score(&nothing));
    }

    #[test]
    fn greedy_placement_fills_thirteen_without_fouling_easy_hands() {
        let mut hand = cards("As Ad 2c 3d 4h 5s 6c 7d 8h 9s Tc Jd Qh");
        let arrangement = place_all_greedy(&mut hand);
        assert!(arrangement.is_complete());
        assert!(!arrangement.is_fouled());
    }

    #[test]
    fn fantasy_probability_tracks_the_top_row() {
        let made = Arrangement::from_rows(&cards("Qc Qd"), &[], &cards("Kc Kd Kh")).unwrap();
        let unseen = unseen_without(&["Qc Qd", "Kc Kd Kh"]);
        assert!(fantasy_land_probability(&made, &unseen) > 0.5);

        let hopeless = Arrangement::from_rows(&cards("2c 3d 4h"), &[], &[]).unwrap();
        let unseen = unseen_without(&["2c 3d 4h"]);
        assert_eq!(fantasy_land_probability(&hopeless, &unseen), 0.0);
    }
}
