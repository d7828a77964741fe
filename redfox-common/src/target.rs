//! Resolved audit target

use serde::{Deserialize, Serialize};

/// Connection parameters for one target. Immutable once resolved from the
/// user-supplied URL string; resolution itself lives in the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Target {
    /// "http" or "https"
    pub scheme: String,
    pub host: String,
    pub port: u16,
    /// Login endpoint path, "/" when none was given
    pub path: String,
    /// The full normalized URL the executor posts to
    pub url: String,
    /// Form field carrying the username
    pub username_field: String,
    /// Form field carrying the password
    pub password_field: String,
}

impl Target {
    pub fn uses_tls(&self) -> bool {
        self.scheme == "https"
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}
