//! Global policy tiers and the process-wide policy configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// A policy attached to one capability of an object.
///
/// The four global tiers are recognized by their wire names. Anything else is
/// kept verbatim as [`PolicyValue::Unrecognized`] and denies every viewer
/// except the omnipotent one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PolicyValue {
    /// Anyone, including logged-out viewers (when public access is enabled).
    Public,
    /// Any logged-in user.
    User,
    /// Administrators only.
    Admin,
    /// Nobody.
    NoOne,
    /// A value this build does not understand.
    Unrecognized(String),
}

impl PolicyValue {
    pub const PUBLIC: &'static str = "public";
    pub const USER: &'static str = "users";
    pub const ADMIN: &'static str = "admin";
    pub const NOONE: &'static str = "no-one";

    /// The recognized global tiers, weakest first.
    pub const GLOBAL: [PolicyValue; 4] = [
        PolicyValue::Public,
        PolicyValue::User,
        PolicyValue::Admin,
        PolicyValue::NoOne,
    ];

    /// Interpret a stored policy string. Never fails.
    pub fn parse(value: &str) -> Self {
        match value {
            Self::PUBLIC => PolicyValue::Public,
            Self::USER => PolicyValue::User,
            Self::ADMIN => PolicyValue::Admin,
            Self::NOONE => PolicyValue::NoOne,
            other => PolicyValue::Unrecognized(other.to_string()),
        }
    }

    /// The wire name of this policy.
    pub fn as_str(&self) -> &str {
        match self {
            PolicyValue::Public => Self::PUBLIC,
            PolicyValue::User => Self::USER,
            PolicyValue::Admin => Self::ADMIN,
            PolicyValue::NoOne => Self::NOONE,
            PolicyValue::Unrecognized(raw) => raw.as_str(),
        }
    }

    /// Human-readable name, suitable for display next to an object.
    pub fn name(&self) -> &'static str {
        match self {
            PolicyValue::Public => "Public (No Login Required)",
            PolicyValue::User => "All Users",
            PolicyValue::Admin => "Administrators",
            PolicyValue::NoOne => "No One",
            PolicyValue::Unrecognized(_) => "Unknown Policy",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, PolicyValue::Unrecognized(_))
    }

    fn strength(&self) -> u8 {
        match self {
            PolicyValue::Public => 0,
            PolicyValue::User => 1,
            PolicyValue::Admin => 2,
            PolicyValue::NoOne => 3,
            PolicyValue::Unrecognized(_) => 4,
        }
    }

    /// Whether this policy admits strictly fewer viewers than `other`.
    pub fn is_stronger_than(&self, other: &PolicyValue) -> bool {
        self.strength() > other.strength()
    }
}

impl From<String> for PolicyValue {
    fn from(value: String) -> Self {
        PolicyValue::parse(&value)
    }
}

impl From<&str> for PolicyValue {
    fn from(value: &str) -> Self {
        PolicyValue::parse(value)
    }
}

impl From<PolicyValue> for String {
    fn from(value: PolicyValue) -> Self {
        match value {
            PolicyValue::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for PolicyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide policy settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// When false, [`PolicyValue::Public`] is treated as [`PolicyValue::User`].
    #[serde(default)]
    pub allow_public: bool,
}

impl PolicyConfig {
    pub fn new(allow_public: bool) -> Self {
        Self { allow_public }
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))
    }
}
