use thiserror::Error;

/// Convenience alias for results whose error is a [`LearningError`].
pub type Result<T> = std::result::Result<T, LearningError>;

/// Everything that can go wrong while building alphabets and automata or while running a
/// learning experiment. Symbols and words are rendered through [`crate::Show`] so that the
/// error type does not depend on the symbol type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LearningError {
    #[error("alphabet must contain at least one symbol")]
    EmptyAlphabet,
    #[error("symbol `{0}` occurs more than once in the alphabet")]
    DuplicateSymbol(String),
    #[error("symbol `{0}` is not part of the alphabet")]
    UnknownSymbol(String),
    #[error("invalid transition structure: {0}")]
    InvalidTransitions(String),
    #[error("membership oracle could not answer: {0}")]
    OracleUnavailable(String),
    #[error("{0} is not a counterexample, hypothesis and system agree on it")]
    NotACounterexample(String),
    #[error("cannot {operation} while in state {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },
    #[error("observation table is not closed, row of {0} matches no short prefix")]
    NotClosed(String),
}
