use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} is too long")]
    TooLong(&'static str),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("invalid date range: {0}")]
    InvalidDateRange(String),
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("invalid sort: {0}")]
    InvalidSort(String),
}
