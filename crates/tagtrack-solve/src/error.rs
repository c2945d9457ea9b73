use thiserror::Error;

/// Failure modes of the closed-form solvers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SolveError {
    #[error("need at least {needed} point correspondences, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },
    #[error("object / image point counts must match: {0} vs {1}")]
    MismatchedPoints(usize, usize),
    #[error("svd failed")]
    SvdFailed,
    #[error("degenerate point configuration")]
    DegeneratePoints,
}
