use thiserror::Error;

/// Errors returned to callers of the surgery engine.
///
/// All of these are request-validation refusals, recovered locally by the
/// caller; none are fatal. Randomized failure effects are *not* errors —
/// they are a designed outcome of a successful roll against probability.
#[derive(Error, Debug)]
pub enum SurgeryError {
    #[error("patient is mid-operation under another surgeon")]
    Busy,

    #[error("action {0:?} is not a legal step from node '{1}'")]
    InvalidTransition(crate::resolver::actions::ActionKind, String),

    #[error("missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("target not found: {0}")]
    TargetNotFound(String),

    #[error("chassis mismatch: {0}")]
    ChassisMismatch(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SurgeryError>;
