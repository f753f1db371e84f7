//! Error types for the datefinder ecosystem.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur in datefinder operations.
#[derive(Error, Debug)]
pub enum DateFinderError {
    #[error("Cannot modify past dates: {0}")]
    PastDate(NaiveDate),

    #[error("Date {0} is not eligible for confirmation")]
    NotEligible(NaiveDate),

    #[error("Date {0} is already confirmed")]
    AlreadyConfirmed(NaiveDate),

    #[error("Date {0} is not confirmed")]
    NotConfirmed(NaiveDate),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for datefinder operations.
pub type DateFinderResult<T> = Result<T, DateFinderError>;
