//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent rejected or degraded network operations.
///
/// None of these are fatal: the registry stays usable after any of them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("user already exists: {0}")]
    DuplicateUser(String),

    #[error("user not found: {0}")]
    UnknownUser(String),

    #[error("parent not found: {0}")]
    UnknownParent(String),

    #[error("network is empty")]
    EmptyNetwork,

    #[error("no interactions to analyze for user: {0}")]
    NoInteractionData(String),

    #[error("name already taken: {0}")]
    NameTaken(String),

    #[error("invalid user name: {0:?}")]
    InvalidName(String),

    #[error("network structures diverged: {0}")]
    Inconsistent(String),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
