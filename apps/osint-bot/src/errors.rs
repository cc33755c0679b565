use thiserror::Error;

/// Why a search did not produce results. Every variant is recovered by the
/// bot front end; none of them ends the process.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("input is not a 10-digit number")]
    InvalidNumber,
    #[error("insufficient credits: have {balance}, need {cost}")]
    InsufficientCredits { balance: i64, cost: i64 },
    #[error("user {0} is not registered")]
    UnknownUser(i64),
    #[error("lookup failed: {0}")]
    Upstream(String),
    #[error("no results found")]
    NotFound,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("caller {0} may not grant credits")]
    Unauthorized(i64),
    #[error("credit amount must be positive, got {0}")]
    InvalidAmount(i64),
    #[error("user {0} not found")]
    UserNotFound(i64),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
