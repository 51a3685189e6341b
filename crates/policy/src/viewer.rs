//! The identity a policy is evaluated against.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user identifier as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is asking.
///
/// Ordinary viewers are classified by login and admin status. The omnipotent
/// viewer is used for system work and bypasses every policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Viewer {
    Ordinary { user: Option<UserId>, admin: bool },
    Omnipotent,
}

impl Viewer {
    /// A logged-out visitor.
    pub fn public() -> Self {
        Viewer::Ordinary {
            user: None,
            admin: false,
        }
    }

    pub fn user(id: impl Into<String>) -> Self {
        Viewer::Ordinary {
            user: Some(UserId::new(id)),
            admin: false,
        }
    }

    pub fn admin(id: impl Into<String>) -> Self {
        Viewer::Ordinary {
            user: Some(UserId::new(id)),
            admin: true,
        }
    }

    pub fn omnipotent() -> Self {
        Viewer::Omnipotent
    }

    pub fn is_omnipotent(&self) -> bool {
        matches!(self, Viewer::Omnipotent)
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, Viewer::Ordinary { user: Some(_), .. })
    }

    /// Admin status only counts for logged-in viewers.
    pub fn is_admin(&self) -> bool {
        matches!(
            self,
            Viewer::Ordinary {
                user: Some(_),
                admin: true
            }
        )
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            Viewer::Ordinary { user, .. } => user.as_ref(),
            Viewer::Omnipotent => None,
        }
    }
}

/// Parses `public`, `omnipotent`, `user:NAME` and `admin:NAME`.
impl FromStr for Viewer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => return Ok(Viewer::public()),
            "omnipotent" => return Ok(Viewer::omnipotent()),
            _ => {}
        }

        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| Error::Invalid(format!("unknown viewer spec '{s}'")))?;
        if name.is_empty() {
            return Err(Error::Invalid(format!("viewer spec '{s}' has no user name")));
        }

        match kind {
            "user" => Ok(Viewer::user(name)),
            "admin" => Ok(Viewer::admin(name)),
            _ => Err(Error::Invalid(format!("unknown viewer spec '{s}'"))),
        }
    }
}

impl fmt::Display for Viewer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Viewer::Omnipotent => f.write_str("omnipotent"),
            Viewer::Ordinary { user: None, .. } => f.write_str("public"),
            Viewer::Ordinary {
                user: Some(id),
                admin: true,
            } => write!(f, "admin:{id}"),
            Viewer::Ordinary {
                user: Some(id),
                admin: false,
            } => write!(f, "user:{id}"),
        }
    }
}
