//! Row-vs-row scoring: the royalty table, the foul penalty, and the two
//! terminal value functions used at playout leaves.
//!
//! Scoring follows the standard OFC 1-6 convention: one point per row won,
//! three more for a scoop, plus the winner's royalties minus the loser's.
//! A fouled side loses every row comparison and forfeits its royalties.

use crate::arrangement::{Arrangement, RowId};
use crate::evaluator::{HandCategory, HandRank};

/// Magnitude of fouling in the self-evaluation value function: the three
/// rows plus the scoop that a foul concedes under 1-6 scoring.
pub const FOUL_PENALTY: f64 = 6.0;

/// Bonus for winning all three row comparisons.
pub const SCOOP_BONUS: f64 = 3.0;

/// Weight of the per-row category credit in [`self_score`].
const STRENGTH_CREDIT: f64 = 0.1;

/// The weakest top row that qualifies for Fantasy Land: a pair of queens.
pub(crate) const FANTASY_QUALIFYING_TOP: HandRank = HandRank((HandCategory::Pair as u32) << 20 | 11 << 16);

/// Returns the royalty bonus for holding the given hand in the given row.
///
/// Royalties are asymmetric by design: the same full house is worth 12 in
/// the middle but only 6 on the bottom, and the top row only ever pays for
/// sixes-or-better pairs and trips.
pub fn row_royalty(row: RowId, rank: HandRank) -> u32 {
    let category = rank.category();
    match row {
        RowId::Top => match category {
            HandCategory::Pair => {
                let pair_rank = rank.tiebreak(0).unwrap_or(0) as u32;
                // Sixes (rank index 4) pay 1, aces (12) pay 9.
                pair_rank.saturating_sub(3)
            }
            HandCategory::ThreeOfAKind => 10 + rank.tiebreak(0).unwrap_or(0) as u32,
            _ => 0,
        },
        RowId::Middle => match category {
            HandCategory::ThreeOfAKind => 2,
            HandCategory::Straight => 4,
            HandCategory::Flush => 8,
            HandCategory::FullHouse => 12,
            HandCategory::FourOfAKind => 20,
            HandCategory::StraightFlush => 30,
            HandCategory::RoyalFlush => 50,
            _ => 0,
        },
        RowId::Bottom => match category {
            HandCategory::Straight => 2,
            HandCategory::Flush => 4,
            HandCategory::FullHouse => 6,
            HandCategory::FourOfAKind => 10,
            HandCategory::StraightFlush => 15,
            HandCategory::RoyalFlush => 25,
            _ => 0,
        },
    }
}

/// Terminal score of a completed arrangement when no opponent model is
/// available: royalties less the foul penalty, with a small per-row
/// strength credit so that equal-royalty completions still order sensibly.
pub fn self_score(arrangement: &Arrangement) -> f64 {
    debug_assert!(arrangement.is_complete());
    if arrangement.is_fouled() {
        return -FOUL_PENALTY;
    }

    let credit: f64 = RowId::ALL
        .iter()
        .map(|&id| arrangement.row_hand_rank(id).category() as u32 as f64)
        .sum::<f64>()
        * STRENGTH_CREDIT;
    arrangement.royalties() as f64 + credit
}

/// Score of `ours` against `theirs` under the matchup rule, from our
/// perspective. Both arrangements must be complete.
pub fn matchup_score(ours: &Arrangement, theirs: &Arrangement) -> f64 {
    debug_assert!(ours.is_complete() && theirs.is_complete());

    match (ours.is_fouled(), theirs.is_fouled()) {
        (true, true) => return 0.0,
        (true, false) => return -(3.0 + SCOOP_BONUS + theirs.royalties() as f64),
        (false, true) => return 3.0 + SCOOP_BONUS + ours.royalties() as f64,
        (false, false) => {}
    }

    let mut score = 0.0;
    let mut rows_won = 0;
    let mut rows_lost = 0;
    for id in RowId::ALL {
        match ours.row_hand_rank(id).cmp(&theirs.row_hand_rank(id)) {
            core::cmp::Ordering::Greater => {
                score += 1.0;
                rows_won += 1;
            }
            core::cmp::Ordering::Less => {
                score -= 1.0;
                rows_lost += 1;
            }
            core::cmp::Ordering::Equal => {}
        }
    }
    if rows_won == 3 {
        score += SCOOP_BONUS;
    } else if rows_lost == 3 {
        score -= SCOOP_BONUS;
    }

    score + ours.royalties() as f64 - theirs.royalties() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::Arrangement;
    use pineapple_base::Card;
    use rstest::rstest;

    fn cards(s: &str) -> Vec<Card> {
        s.split(' ').map(|c| c.parse().unwrap()).collect()
    }

    fn arrangement(top: &str, middle: &str, bottom: &str) -> Arrangement {
        Arrangement::from_rows(&cards(top), &cards(middle), &cards(bottom)).unwrap()
    }

    /// Weak but clean: no royalties anywhere.
    fn weak() -> Arrangement {
        arrangement("2c 3d 4h", "7c 7d 2h 5c 8s", "Tc Td 3s 5d 6c")
    }

    /// Strong: top aces (9), middle trips (2), bottom quads (10).
    fn strong() -> Arrangement {
        arrangement("Ac Ad 4s", "9c 9d 9h 6s Js", "Kc Kd Kh Ks 7s")
    }

    /// Fouled: top pair of aces over a nine-high middle.
    fn fouled() -> Arrangement {
        arrangement("Ah As 2s", "9s 8d 2d 4c 6d", "Qc Qd Qs 5h 6h")
    }

    #[test]
    fn matchup_is_antisymmetric() {
        let a = strong();
        let b = weak();
        assert_eq!(matchup_score(&a, &b), -matchup_score(&b, &a));
    }

    #[test]
    fn scoop_adds_three() {
        // Strong wins every row against weak: 3 rows + 3 scoop + 21 - 0.
        let score = matchup_score(&strong(), &weak());
        assert_eq!(score, 3.0 + 3.0 + 21.0);
    }

    #[test]
    fn foul_loses_everything() {
        let score = matchup_score(&fouled(), &weak());
        assert_eq!(score, -6.0);

        // Against a royalty holder the foul also pays their bonuses.
        let score = matchup_score(&fouled(), &strong());
        assert_eq!(score, -6.0 - 21.0);
    }

    #[test]
    fn double_foul_washes() {
        assert_eq!(matchup_score(&fouled(), &fouled()), 0.0);
    }

    #[rstest]
    #[case::pair_of_fives(RowId::Top, "5c 5d 2h", 0)]
    #[case::pair_of_sixes(RowId::Top, "6c 6d 2h", 1)]
    #[case::pair_of_aces(RowId::Top, "Ac Ad 2h", 9)]
    #[case::trips_of_twos(RowId::Top, "2c 2d 2h", 10)]
    #[case::trips_of_aces(RowId::Top, "Ac Ad Ah", 22)]
    fn top_row_royalties(#[case] row: RowId, #[case] hand: &str, #[case] expected: u32) {
        let rank = crate::evaluator::rank_three(&cards(hand));
        assert_eq!(row_royalty(row, rank), expected);
    }

    #[rstest]
    #[case::straight_middle(RowId::Middle, "5c 6d 7h 8s 9c", 4)]
    #[case::straight_bottom(RowId::Bottom, "5c 6d 7h 8s 9c", 2)]
    #[case::flush_middle(RowId::Middle, "2h 5h 7h Th Kh", 8)]
    #[case::flush_bottom(RowId::Bottom, "2h 5h 7h Th Kh", 4)]
    #[case::boat_middle(RowId::Middle, "8c 8d 8h Ks Kc", 12)]
    #[case::boat_bottom(RowId::Bottom, "8c 8d 8h Ks Kc", 6)]
    #[case::quads_middle(RowId::Middle, "8c 8d 8h 8s Kc", 20)]
    #[case::quads_bottom(RowId::Bottom, "8c 8d 8h 8s Kc", 10)]
    #[case::sf_middle(RowId::Middle, "5d 6d 7d 8d 9d", 30)]
    #[case::sf_bottom(RowId::Bottom, "5d 6d 7d 8d 9d", 15)]
    #[case::royal_middle(RowId::Middle, "Th Jh Qh Kh Ah", 50)]
    #[case::royal_bottom(RowId::Bottom, "Th Jh Qh Kh Ah", 25)]
    #[case::pair_pays_nothing(RowId::Bottom, "8c 8d 2h 5s Kc", 0)]
    fn five_card_royalties(#[case] row: RowId, #[case] hand: &str, #[case] expected: u32) {
        let rank = crate::evaluator::rank_five(&cards(hand));
        assert_eq!(row_royalty(row, rank), expected);
    }

    #[test]
    fn self_score_rewards_royalties_and_punishes_fouls() {
        assert!(self_score(&strong()) > self_score(&weak()));
        assert_eq!(self_score(&fouled()), -FOUL_PENALTY);
    }
}
