use thiserror::Error;

/// Error taxonomy for the decision core.
///
/// `DeadlineExceeded` and `NoCandidate` from the design notes are
/// deliberately absent here: the former is ordinary PVS control flow (the
/// last completed iteration's move is returned, nothing is raised), and the
/// latter is handled internally by falling back to the first two empty
/// cells and reporting `mode: "no_candidate_fallback"` in the `Decision`.
#[derive(Debug, Error)]
pub enum Connect6Error {
    #[error("invalid move: {0}")]
    InvalidMove(String),

    #[error("state is terminal, no further moves may be applied")]
    TerminalState,

    #[error("MCTS root could not be expanded")]
    EmptyMctsRoot,

    #[error("oracle failure: {0}")]
    OracleFailure(String),
}

pub type Result<T> = std::result::Result<T, Connect6Error>;
