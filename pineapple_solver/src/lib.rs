//! A search and evaluation engine for Pineapple Open-Face Chinese poker.
//!
//! Given a partial arrangement of the three rows (top of 3 cards, middle
//! and bottom of 5) plus the cards just dealt, the solver computes the
//! placement (and, from the second street on, the discard) that
//! maximizes the expected score against an unknown opponent, while
//! respecting the row-ordering rule that prevents fouling.
//!
//! # Features
//!
//! - Bit-packed cards and card sets with full joker support: the two
//!   jokers are distinct set members that the evaluator resolves to the
//!   best possible substitute card.
//! - An allocation-free hand evaluator for 3- and 5-card rows, with
//!   partial hands ranking as if the missing cards were the worst possible
//!   kickers.
//! - A legal-move generator that enumerates the 3^5 opener assignments and
//!   the place-2-discard-1 street actions, pruning placements that are
//!   already doomed to foul.
//! - A parallel Monte-Carlo tree search (UCT) with optional progressive
//!   widening and a bounded transposition value cache, supporting both
//!   independent root trees and a shared tree with virtual loss.
//! - Deterministic, seedable search: for a fixed seed and one thread,
//!   decisions are reproducible bit for bit.
//!
//! # Example
//!
//! ```
//! use pineapple_solver::base::Card;
//! use pineapple_solver::{Budget, Options, Solver, State};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Parse the five-card opener and build the starting state.
//!     let dealt = ["Ah", "Ad", "Kc", "7s", "2d"]
//!         .iter()
//!         .map(|s| s.parse::<Card>())
//!         .collect::<Result<Vec<_>, _>>()?;
//!     let state = State::opener(&dealt);
//!
//!     // Search with a modest simulation budget.
//!     let solver = Solver::new(Options::default());
//!     let decision = solver.solve(&state, &Budget::simulations(500))?;
//!
//!     println!(
//!         "best: {} (expected {:+.2}, {} simulations)",
//!         decision.action, decision.expected_score, decision.simulations
//!     );
//!     Ok(())
//! }
//! ```

mod arrangement;
mod error;
mod evaluator;
mod heuristic;
mod mcts;
mod moves;
mod scoring;
mod solver;
mod state;
mod time;

/// Card primitives re-exported from [`pineapple_base`].
pub mod base {
    pub use pineapple_base::{Card, CardSet, ParseError, Rank, Suit, CARDS};
}

pub use arrangement::{Arrangement, Row, RowId};
pub use error::SolveError;
pub use evaluator::{rank_five, rank_three, HandCategory, HandRank};
pub use moves::Action;
pub use scoring::{matchup_score, row_royalty, self_score, FOUL_PENALTY, SCOOP_BONUS};
pub use solver::{
    ActionValue, Budget, Decision, Options, Parallelism, ProgressiveWidening, Solver, Summary,
    TranspositionMemo, ValueModel,
};
pub use state::{Dealt, State};
pub use time::{Clock, ManualClock, MonotonicClock};
