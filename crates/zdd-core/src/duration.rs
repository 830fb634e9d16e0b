//! Rollover duration parsing.
//!
//! Durations use unit suffixes (`480s`, `1m`, `1h30m`, `250ms`). A bare `0`
//! is accepted as zero; any other unit-less number is rejected.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("Duration must be a positive number in the format of 1m")]
    Negative,

    #[error("invalid duration {0:?}")]
    Invalid(String),
}

/// Parse a rollover duration. Negative values are rejected, zero is allowed.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    let (negative, magnitude) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    if magnitude.is_empty() {
        return Err(DurationError::Invalid(input.to_string()));
    }

    let parsed = if magnitude == "0" {
        Duration::ZERO
    } else {
        humantime::parse_duration(magnitude)
            .map_err(|_| DurationError::Invalid(input.to_string()))?
    };

    if negative && !parsed.is_zero() {
        return Err(DurationError::Negative);
    }
    Ok(parsed)
}
