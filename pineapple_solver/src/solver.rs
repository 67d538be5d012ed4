//! The solver facade: input validation, street dispatch, and the public
//! `solve` / `analyze` contracts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pineapple_base::CardSet;

use crate::arrangement::RowId;
use crate::error::SolveError;
use crate::evaluator::HandRank;
use crate::heuristic;
use crate::mcts::{self, ChildStat};
use crate::moves::{self, Action};
use crate::scoring::FOUL_PENALTY;
use crate::state::{State, LAST_STREET, MAX_DEALT, STREET_DEAL};
use crate::time::{Clock, MonotonicClock};

/// How worker threads share the search.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Parallelism {
    /// Independent trees per worker, merged by summing per-action
    /// statistics.
    Root,
    /// One shared tree; workers apply virtual loss while descending.
    Tree,
}

/// Which value function scores terminal playout states.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ValueModel {
    /// Sample an opponent completion and score the row-vs-row matchup.
    Matchup,
    /// Royalties minus foul penalty; no opponent model.
    SelfEvaluation,
}

/// Progressive widening: a node at `N` visits exposes `ceil(k * N^alpha)`
/// actions.
#[derive(Clone, Copy, Debug)]
pub struct ProgressiveWidening {
    pub k: f64,
    pub alpha: f64,
}

impl Default for ProgressiveWidening {
    fn default() -> ProgressiveWidening {
        ProgressiveWidening { k: 2.0, alpha: 0.5 }
    }
}

/// Bounded transposition value cache shared by all workers.
#[derive(Clone, Copy, Debug)]
pub struct TranspositionMemo {
    pub capacity: usize,
}

impl Default for TranspositionMemo {
    fn default() -> TranspositionMemo {
        TranspositionMemo { capacity: 65_536 }
    }
}

/// Tunables for a [`Solver`]. The defaults are sensible for interactive
/// use: single-threaded, UCT exploration at sqrt(2), light playout
/// randomness.
#[derive(Clone, Debug)]
pub struct Options {
    pub threads: usize,
    pub exploration_c: f64,
    pub parallelism: Parallelism,
    pub value_model: ValueModel,
    pub eps_greedy: f64,
    pub progressive_widening: Option<ProgressiveWidening>,
    pub transposition_memo: Option<TranspositionMemo>,
    pub rng_seed: u64,
    /// Street-0 candidate cap for the opener enumerator.
    pub opener_candidates: usize,
    /// Minimum merged visits for an action to win under root parallelism.
    pub min_merge_visits: u64,
    pub virtual_loss: f64,
    /// Soft bound on tree nodes before least-visited pruning kicks in.
    pub node_cap: usize,
    /// How many entries to report in [`Decision::top_actions`].
    pub top_actions: usize,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            threads: 1,
            exploration_c: std::f64::consts::SQRT_2,
            parallelism: Parallelism::Root,
            value_model: ValueModel::Matchup,
            eps_greedy: 0.1,
            progressive_widening: None,
            transposition_memo: None,
            rng_seed: 0,
            opener_candidates: 32,
            min_merge_visits: 1,
            virtual_loss: 1.0,
            node_cap: 200_000,
            top_actions: 5,
        }
    }
}

/// Limits on a single `solve` call: a wall-clock deadline, a simulation
/// cap, a cancellation handle, or any combination; whichever trips first.
#[derive(Clone, Default)]
pub struct Budget {
    pub time_limit: Option<Duration>,
    pub max_simulations: Option<u64>,
    pub cancellation: Option<Arc<AtomicBool>>,
}

impl Budget {
    /// A budget capped at `count` simulations.
    pub fn simulations(count: u64) -> Budget {
        Budget {
            max_simulations: Some(count),
            ..Budget::default()
        }
    }

    /// A budget capped at `limit` of wall-clock time.
    pub fn time_limit(limit: Duration) -> Budget {
        Budget {
            time_limit: Some(limit),
            ..Budget::default()
        }
    }

    /// Attaches a cooperative cancellation flag.
    pub fn with_cancellation(mut self, handle: Arc<AtomicBool>) -> Budget {
        self.cancellation = Some(handle);
        self
    }
}

/// One entry of [`Decision::top_actions`].
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct ActionValue {
    pub action: Action,
    pub mean_value: f64,
    pub visits: u64,
}

/// The outcome of a `solve` call.
#[derive(Clone, PartialEq, Debug)]
pub struct Decision {
    pub action: Action,
    pub expected_score: f64,
    /// Best root child's share of all root visits, in `[0, 1]`.
    pub confidence: f64,
    pub simulations: u64,
    pub elapsed: Duration,
    /// `false` when the search was cut short by the deadline or the
    /// cancellation flag; the action is still the best seen so far.
    pub complete: bool,
    /// `true` when thread creation failed and the engine fell back to a
    /// single-threaded search.
    pub degraded: bool,
    pub top_actions: Vec<ActionValue>,
}

/// The outcome of an `analyze` call: a cheap static snapshot, no search.
#[derive(Clone, PartialEq, Debug)]
pub struct Summary {
    /// Current hand rank of top, middle and bottom, partial rows included.
    pub per_row_type: [HandRank; 3],
    pub current_royalties: u32,
    pub foul_probability: f64,
    pub fantasy_land_probability: f64,
    /// Candidate actions with their static heuristic scores, best first.
    pub top_actions: Vec<(Action, f64)>,
}

/// Street-aware driver around the move generator and the MCTS engine.
pub struct Solver {
    options: Options,
    clock: Box<dyn Clock>,
}

impl Solver {
    pub fn new(options: Options) -> Solver {
        Solver {
            options,
            clock: Box::new(MonotonicClock::new()),
        }
    }

    /// Injects a clock; tests use this to drive deadlines by hand.
    pub fn with_clock(options: Options, clock: Box<dyn Clock>) -> Solver {
        Solver { options, clock }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Finds the best placement (and discard) for the state under the
    /// given budget.
    pub fn solve(&self, state: &State, budget: &Budget) -> Result<Decision, SolveError> {
        validate(state, true)?;
        let started = self.clock.now();

        let actions = moves::generate(state, self.options.opener_candidates);
        if actions.len() == 1 && actions[0] == Action::Fold {
            return Ok(Decision {
                action: Action::Fold,
                expected_score: -FOUL_PENALTY,
                confidence: 1.0,
                simulations: 0,
                elapsed: self.clock.now() - started,
                complete: true,
                degraded: false,
                top_actions: vec![ActionValue {
                    action: Action::Fold,
                    mean_value: -FOUL_PENALTY,
                    visits: 0,
                }],
            });
        }

        let outcome = mcts::search(state, &actions, &self.options, budget, self.clock.as_ref());
        let elapsed = self.clock.now() - started;

        let cancelled = budget
            .cancellation
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Relaxed));
        let timed_out = budget.time_limit.map_or(false, |limit| elapsed >= limit);
        let complete = !cancelled && !timed_out;

        let total_visits: u64 = outcome.stats.iter().map(|s| s.visits).sum();
        let best = choose_best(&outcome.stats, &self.options);

        let (action, expected_score, confidence) = match best {
            Some(stat) => (
                stat.action,
                stat.mean(),
                stat.visits as f64 / total_visits.max(1) as f64,
            ),
            // Nothing was simulated (e.g. cancelled before the first
            // playout): fall back to the first candidate in static order.
            None => (actions[0], 0.0, 0.0),
        };

        let mut ranked = outcome.stats.clone();
        ranked.sort_by(|a, b| {
            b.visits
                .cmp(&a.visits)
                .then(b.mean().partial_cmp(&a.mean()).unwrap_or(core::cmp::Ordering::Equal))
                .then(a.order.cmp(&b.order))
        });
        let top_actions = ranked
            .iter()
            .take(self.options.top_actions)
            .map(|s| ActionValue {
                action: s.action,
                mean_value: s.mean(),
                visits: s.visits,
            })
            .collect();

        log::debug!(
            "solve: street {} finished with {} simulations ({} dropped) in {:?}",
            state.street(),
            outcome.simulations,
            outcome.dropped,
            elapsed
        );

        Ok(Decision {
            action,
            expected_score,
            confidence,
            simulations: outcome.simulations,
            elapsed,
            complete,
            degraded: outcome.degraded,
            top_actions,
        })
    }

    /// Static snapshot of the state: row types, royalties, foul and
    /// Fantasy-Land estimates, and the heuristic-ordered candidate list.
    pub fn analyze(&self, state: &State) -> Result<Summary, SolveError> {
        validate(state, false)?;

        let arrangement = state.arrangement();
        let per_row_type = [
            arrangement.row_hand_rank(RowId::Top),
            arrangement.row_hand_rank(RowId::Middle),
            arrangement.row_hand_rank(RowId::Bottom),
        ];
        let current_royalties = if arrangement.is_complete() {
            arrangement.royalties()
        } else {
            heuristic::partial_royalties(arrangement)
        };

        let top_actions = if dealt_matches_street(state) {
            moves::generate(state, self.options.opener_candidates)
                .into_iter()
                .map(|action| {
                    let mut after = *state;
                    after.apply(&action);
                    (action, heuristic::action_score(&after))
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(Summary {
            per_row_type,
            current_royalties,
            foul_probability: heuristic::foul_probability(arrangement, state.unseen()),
            fantasy_land_probability: heuristic::fantasy_land_probability(
                arrangement,
                state.unseen(),
            ),
            top_actions,
        })
    }
}

fn dealt_matches_street(state: &State) -> bool {
    if state.street() == 0 {
        (1..=MAX_DEALT).contains(&state.dealt().len())
    } else {
        state.dealt().len() == STREET_DEAL
    }
}

fn choose_best<'a>(stats: &'a [ChildStat], options: &Options) -> Option<&'a ChildStat> {
    let visited: Vec<&ChildStat> = stats.iter().filter(|s| s.visits > 0).collect();
    if visited.is_empty() {
        return None;
    }

    if options.threads > 1 && options.parallelism == Parallelism::Root {
        // Merged-tree rule: best mean among sufficiently-visited actions.
        let qualified = visited
            .iter()
            .filter(|s| s.visits >= options.min_merge_visits)
            .max_by(|a, b| {
                a.mean()
                    .partial_cmp(&b.mean())
                    .unwrap_or(core::cmp::Ordering::Equal)
                    .then(a.visits.cmp(&b.visits))
                    .then(b.order.cmp(&a.order))
            });
        if let Some(best) = qualified {
            return Some(*best);
        }
    }

    // Robust-child rule: most visits, ties by mean, then generator order.
    visited.into_iter().max_by(|a, b| {
        a.visits
            .cmp(&b.visits)
            .then(a.mean().partial_cmp(&b.mean()).unwrap_or(core::cmp::Ordering::Equal))
            .then(b.order.cmp(&a.order))
    })
}

fn validate(state: &State, for_solve: bool) -> Result<(), SolveError> {
    if state.street() > LAST_STREET {
        return Err(SolveError::InvalidInput(format!(
            "street {} out of range 0..=4",
            state.street()
        )));
    }

    let dealt = state.dealt();
    let dealt_set: CardSet = dealt.iter().copied().collect();
    if dealt_set.len() != dealt.len() {
        return Err(SolveError::InvalidInput(
            "duplicate card among dealt cards".to_owned(),
        ));
    }

    let placed = state.arrangement().placed();
    let regions: [(&str, CardSet); 4] = [
        ("placed", placed),
        ("dealt", dealt_set),
        ("discarded", *state.discarded()),
        ("opponent", *state.known_opponent()),
    ];
    for (i, (name_a, a)) in regions.iter().enumerate() {
        for (name_b, b) in regions.iter().skip(i + 1) {
            if !a.is_disjoint(b) {
                return Err(SolveError::InvalidInput(format!(
                    "card present in both {} and {} sets",
                    name_a, name_b
                )));
            }
        }
        if !a.is_disjoint(state.unseen()) {
            return Err(SolveError::InconsistentState(format!(
                "{} cards still counted as unseen",
                name_a
            )));
        }
    }

    if state.known_opponent().len() > 13 {
        return Err(SolveError::InvalidInput(
            "opponent cannot hold more than 13 cards".to_owned(),
        ));
    }

    if state.arrangement().is_complete() && !dealt.is_empty() {
        return Err(SolveError::InconsistentState(
            "complete arrangement with cards still dealt".to_owned(),
        ));
    }

    if !for_solve {
        return Ok(());
    }

    if !dealt_matches_street(state) {
        return Err(SolveError::InvalidInput(format!(
            "street {} does not deal {} cards",
            state.street(),
            dealt.len()
        )));
    }

    if state.street() == 0 && state.free_slots() < dealt.len() {
        return Err(SolveError::InvalidInput(
            "not enough open slots for the opener".to_owned(),
        ));
    }

    // Whatever happens from here on, the remaining self streets and the
    // opponent completion must be coverable by the unseen set.
    let future_streets = (LAST_STREET - state.street()) as usize;
    let needed = STREET_DEAL * future_streets + 13 - state.known_opponent().len();
    let available = state.unseen().len();
    if needed > available {
        return Err(SolveError::ExhaustedDeck { needed, available });
    }

    Ok(())
}
