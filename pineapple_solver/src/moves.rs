//! Legal-move generation: the street-0 opener enumerator and the
//! place-2-discard-1 generator for streets 1 through 4.
//!
//! Returned actions are ordered best-first by the static heuristic; the
//! search uses that order to bias initial visits, so it must be
//! deterministic for a given state.

use core::fmt;

use pineapple_base::Card;

use crate::arrangement::RowId;
use crate::heuristic;
use crate::state::State;

/// A placement decision, in one of its two street-dependent shapes.
///
/// An opener maps each dealt card (by position) to a row; a street action
/// places two of the three dealt cards and discards the third. `Fold` is
/// only emitted for conceded states where no placement is physically
/// possible.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Action {
    /// Street 0: `rows[i]` receives the `i`-th dealt card. Entries past the
    /// dealt count are padding and always [`RowId::Bottom`].
    Opener { rows: [RowId; 5] },
    /// Streets 1..4: two placements and the discarded card.
    Street {
        places: [(Card, RowId); 2],
        discard: Card,
    },
    /// No legal placement exists; the hand is conceded.
    Fold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Opener { rows } => {
                write!(f, "opener to [")?;
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", row)?;
                }
                write!(f, "]")
            }
            Action::Street { places, discard } => write!(
                f,
                "{}>{} {}>{} discard {}",
                places[0].0, places[0].1, places[1].0, places[1].1, discard
            ),
            Action::Fold => write!(f, "fold"),
        }
    }
}

const ROW_ORDER: [RowId; 3] = [RowId::Top, RowId::Middle, RowId::Bottom];

fn row_position(row: RowId) -> usize {
    match row {
        RowId::Top => 0,
        RowId::Middle => 1,
        RowId::Bottom => 2,
    }
}

/// Jokers are interchangeable for placement purposes, so they share one
/// rank class when deduplicating symmetric assignments.
fn rank_class(card: Card) -> usize {
    if card.is_wild() {
        13
    } else {
        card.rank_index()
    }
}

/// Enumerates the legal actions for the state, best-first.
///
/// `opener_limit` caps the street-0 candidate list; street lists are small
/// enough (at most 27 actions) to always be returned whole.
pub(crate) fn generate(state: &State, opener_limit: usize) -> Vec<Action> {
    if state.street() == 0 {
        opener_actions(state, opener_limit)
    } else {
        street_actions(state)
    }
}

struct Scored {
    action: Action,
    score: f64,
    foul_forced: bool,
}

fn sort_and_strip(mut scored: Vec<Scored>, limit: usize) -> Vec<Action> {
    // Foul-forced candidates only survive when nothing else does: a forced
    // foul still beats conceding the hand.
    if scored.iter().any(|s| !s.foul_forced) {
        scored.retain(|s| !s.foul_forced);
    }
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(core::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored.into_iter().map(|s| s.action).collect()
}

fn score(state: &State, action: Action) -> Scored {
    let mut after = *state;
    after.apply(&action);
    Scored {
        action,
        score: heuristic::action_score(&after),
        foul_forced: heuristic::foul_forced(after.arrangement(), after.unseen()),
    }
}

fn opener_actions(state: &State, limit: usize) -> Vec<Action> {
    let dealt = state.dealt();
    let k = dealt.len();
    debug_assert!(k >= 1 && k <= 5);

    let free: Vec<usize> = ROW_ORDER
        .iter()
        .map(|&id| state.arrangement().row(id).free_slots())
        .collect();

    let mut scored = Vec::new();
    'assignment: for code in 0..3usize.pow(k as u32) {
        let mut rows = [RowId::Bottom; 5];
        let mut used = [0usize; 3];
        let mut digits = code;
        for slot in rows.iter_mut().take(k) {
            let d = digits % 3;
            digits /= 3;
            *slot = ROW_ORDER[d];
            used[d] += 1;
        }
        for d in 0..3 {
            if used[d] > free[d] {
                continue 'assignment;
            }
        }
        // Same-rank cards are interchangeable: keep only the assignment
        // where they land in top-to-bottom order of their dealt position.
        for i in 0..k {
            for j in (i + 1)..k {
                if rank_class(dealt[i]) == rank_class(dealt[j])
                    && row_position(rows[i]) > row_position(rows[j])
                {
                    continue 'assignment;
                }
            }
        }
        scored.push(score(state, Action::Opener { rows }));
    }

    if scored.is_empty() {
        return vec![Action::Fold];
    }
    sort_and_strip(scored, limit)
}

fn street_actions(state: &State) -> Vec<Action> {
    let dealt = state.dealt();
    debug_assert_eq!(dealt.len(), 3);

    if state.free_slots() < 2 {
        return vec![Action::Fold];
    }

    let mut scored = Vec::new();
    for discard_idx in 0..3 {
        let discard = dealt[discard_idx];
        let kept: Vec<Card> = (0..3).filter(|&i| i != discard_idx).map(|i| dealt[i]).collect();
        let (a, b) = (kept[0], kept[1]);

        for ra in ROW_ORDER {
            let free_a = state.arrangement().row(ra).free_slots();
            if free_a == 0 {
                continue;
            }
            for rb in ROW_ORDER {
                if ra == rb {
                    if free_a < 2 {
                        continue;
                    }
                } else if state.arrangement().row(rb).free_slots() == 0 {
                    continue;
                }
                if rank_class(a) == rank_class(b) && row_position(ra) > row_position(rb) {
                    continue;
                }
                let action = Action::Street {
                    places: [(a, ra), (b, rb)],
                    discard,
                };
                scored.push(score(state, action));
            }
        }
    }

    if scored.is_empty() {
        return vec![Action::Fold];
    }
    sort_and_strip(scored, usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrangement::Arrangement;
    use pineapple_base::CardSet;

    fn cards(s: &str) -> Vec<Card> {
        if s.is_empty() {
            return Vec::new();
        }
        s.split(' ').map(|c| c.parse().unwrap()).collect()
    }

    fn opener_state(dealt: &str) -> State {
        State::opener(&cards(dealt))
    }

    #[test]
    fn opener_candidates_are_bounded_and_legal() {
        let state = opener_state("As Ks Qs Js Ts");
        let actions = generate(&state, 30);
        assert!(!actions.is_empty());
        assert!(actions.len() <= 30);

        for action in &actions {
            let mut after = state;
            after.apply(action);
            assert_eq!(after.arrangement().placed_count(), 5);
            assert_eq!(after.arrangement().placed().len(), 5, "no card reuse");
        }
    }

    #[test]
    fn royal_opener_goes_to_the_bottom_first() {
        let state = opener_state("As Ks Qs Js Ts");
        let actions = generate(&state, 30);
        let all_bottom = Action::Opener {
            rows: [RowId::Bottom; 5],
        };
        assert_eq!(actions[0], all_bottom);
    }

    #[test]
    fn three_aces_go_up_top() {
        // A three-card opener (Fantasy-Land style deal) must offer the
        // trips-top candidate, and the heuristic must rank it first.
        let state = opener_state("Ah Ad Ac");
        let actions = generate(&state, 30);
        let trips_top = Action::Opener {
            rows: [RowId::Top, RowId::Top, RowId::Top, RowId::Bottom, RowId::Bottom],
        };
        assert!(actions.contains(&trips_top));
        assert_eq!(actions[0], trips_top);
    }

    #[test]
    fn street_actions_cover_every_discard() {
        let arrangement = Arrangement::from_rows(
            &[],
            &cards("9s 9d"),
            &cards("Ks Kd Kh Kc"),
        )
        .unwrap();
        let mut unseen = CardSet::full();
        for card in arrangement.placed().iter() {
            unseen.remove(card);
        }
        for card in cards("2c 3d 4h") {
            unseen.remove(card);
        }
        let state = State::new(
            arrangement,
            unseen,
            CardSet::new(),
            CardSet::new(),
            1,
            &cards("2c 3d 4h"),
        );

        let actions = generate(&state, 30);
        assert!(!actions.is_empty());

        let mut discards = CardSet::new();
        for action in &actions {
            match action {
                Action::Street { discard, .. } => discards.insert(*discard),
                other => panic!("unexpected action {:?}", other),
            }

            // Legality: applying any generated action keeps the state valid
            // and leaves no prefix that is already doomed to foul.
            let mut after = state;
            after.apply(action);
            assert_eq!(after.arrangement().placed_count(), 8);
            assert_eq!(after.discarded().len(), 1);
            assert!(!crate::heuristic::foul_forced(
                after.arrangement(),
                after.unseen()
            ));
        }
        assert_eq!(discards.len(), 3, "each dealt card must be discardable");
    }

    #[test]
    fn full_rows_are_respected() {
        let arrangement = Arrangement::from_rows(
            &cards("2c 3d 4h"),
            &cards("9s 9d 8c 7d 6h"),
            &cards("Ks Kd Kh"),
        )
        .unwrap();
        let mut unseen = CardSet::full();
        for card in arrangement.placed().iter() {
            unseen.remove(card);
        }
        for card in cards("Kc 5s 5d") {
            unseen.remove(card);
        }
        let state = State::new(
            arrangement,
            unseen,
            CardSet::new(),
            CardSet::new(),
            3,
            &cards("Kc 5s 5d"),
        );

        for action in generate(&state, 30) {
            if let Action::Street { places, .. } = action {
                for (_, row) in places {
                    assert_eq!(row, RowId::Bottom, "only the bottom row has slots");
                }
            }
        }
    }

    #[test]
    fn equal_rank_placements_are_deduplicated() {
        let state = opener_state("5h 5s Kd");
        let actions = generate(&state, 100);

        // 5h->top/5s->middle survives, the mirrored assignment does not.
        for action in &actions {
            if let Action::Opener { rows } = action {
                assert!(row_position(rows[0]) <= row_position(rows[1]));
            }
        }
    }

    #[test]
    fn no_open_slots_concedes() {
        let arrangement = Arrangement::from_rows(
            &cards("2c 3d 4h"),
            &cards("9s 9d 8c 7d 6h"),
            &cards("Ks Kd Kh Kc 5s"),
        )
        .unwrap();
        let mut unseen = CardSet::full();
        for card in arrangement.placed().iter() {
            unseen.remove(card);
        }
        for card in cards("Ah Ad Ac") {
            unseen.remove(card);
        }
        let state = State::new(
            arrangement,
            unseen,
            CardSet::new(),
            CardSet::new(),
            4,
            &cards("Ah Ad Ac"),
        );

        assert_eq!(generate(&state, 30), vec![Action::Fold]);
    }
}
