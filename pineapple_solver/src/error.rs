use core::fmt;

/// An error returned by the solver facade for inputs it refuses to search.
///
/// Budget exhaustion and cancellation are *not* errors; they are routine
/// outcomes reported through [`Decision::complete`](crate::Decision).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    /// Malformed input: a duplicate card across self/opponent/discard/dealt,
    /// a row over capacity, a dealt-card count that does not match the
    /// street, or a street out of range.
    InvalidInput(String),
    /// The requested operation needs more unseen cards than remain.
    ExhaustedDeck { needed: usize, available: usize },
    /// The state contradicts itself (e.g. a complete arrangement with cards
    /// still waiting to be placed); indicates a caller bug.
    InconsistentState(String),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            SolveError::ExhaustedDeck { needed, available } => write!(
                f,
                "exhausted deck: {} unseen cards required, {} available",
                needed, available
            ),
            SolveError::InconsistentState(msg) => write!(f, "inconsistent state: {}", msg),
        }
    }
}

impl std::error::Error for SolveError {}
