//! Credential candidate pairs

use serde::{Deserialize, Serialize};

/// Where a credential pair came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Cross product of a user list and a password list
    Dictionary,
    /// Character-set enumeration
    BruteForce,
    /// Dictionary entry with an appended mutation
    Mutation,
    /// Pre-paired breach-list entry
    Stuffing,
}

/// One (username, password) candidate. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub provenance: Provenance,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            provenance,
        }
    }

    /// Stable identity used for per-session deduplication. Two pairs with
    /// the same username and password are the same candidate regardless of
    /// which generator produced them.
    pub fn identity(&self) -> String {
        format!("{}\u{0}{}", self.username, self.password)
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.username, self.password)
    }
}
