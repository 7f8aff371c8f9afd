//! HTTP request handlers for the REST API.

pub mod booking;
pub mod provider;
pub mod stats;

use std::str::FromStr;

use crate::http::error::AppError;

/// Parse a path segment into a typed id, reporting malformed input as a
/// validation error rather than a 404.
pub(crate) fn parse_id<T: FromStr>(kind: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>()
        .map_err(|_| AppError::Validation(format!("invalid {kind} id '{raw}'")))
}
