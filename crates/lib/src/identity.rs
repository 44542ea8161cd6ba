//! Stable keys distinguishing members of a managed collection.
//!
//! An [`Identity`] is either a string or an integer. Engine objects that arrive
//! without one are assigned a generated identity the first time they are
//! resolved or admitted to a collection.

use serde::{Deserialize, Serialize};

/// Key identifying an engine object within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identity {
    /// Numeric identity.
    Num(i64),
    /// String identity.
    Str(String),
}

impl Identity {
    /// Generate a fresh, random identity.
    pub fn generate() -> Self {
        Self::Str(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the identity as a string slice if it is a string identity.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Identity::Str(s) => Some(s),
            Identity::Num(_) => None,
        }
    }

    /// Returns the identity as an integer if it is a numeric identity.
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Identity::Num(n) => Some(*n),
            Identity::Str(_) => None,
        }
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&Identity> for Identity {
    fn from(id: &Identity) -> Self {
        id.clone()
    }
}

impl From<i64> for Identity {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<u32> for Identity {
    fn from(n: u32) -> Self {
        Self::Num(n as i64)
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identity::Num(n) => write!(f, "{n}"),
            Identity::Str(s) => write!(f, "{s}"),
        }
    }
}

impl PartialEq<str> for Identity {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == Some(other)
    }
}

impl PartialEq<&str> for Identity {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}

impl PartialEq<i64> for Identity {
    fn eq(&self, other: &i64) -> bool {
        self.as_num() == Some(*other)
    }
}
