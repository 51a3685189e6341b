//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No object exists with the given ID.
    #[error("no object found with id '{id}'")]
    ObjectNotFound { id: String },

    /// An object ID could not be parsed.
    #[error("invalid object id '{id}'")]
    InvalidId { id: String },

    /// A `--policy` argument is not of the form `capability=policy`.
    #[error("invalid policy assignment '{0}', expected capability=policy")]
    InvalidAssignment(String),

    /// Configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the storage layer.
    #[error(transparent)]
    Storage(#[from] storage::Error),

    /// An error occurred in the policy layer.
    #[error(transparent)]
    Policy(#[from] policy::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
