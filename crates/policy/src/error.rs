//! Policy error types.

use crate::Rejection;
use thiserror::Error;

/// Policy errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The viewer is not allowed to see the requested object.
    ///
    /// Raised by [`Query::execute_one`](crate::Query::execute_one) when the
    /// object exists but every candidate was filtered out.
    #[error("permission denied: {0}")]
    Denied(Rejection),

    /// A capability name, viewer spec or policy assignment is malformed.
    #[error("invalid policy: {0}")]
    Invalid(String),

    /// Failed to parse a policy configuration file.
    #[error("failed to parse policy config: {0}")]
    Parse(String),

    /// An I/O error occurred while reading policy configuration.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
