//! Session and per-attempt outcome types
//!
//! A Session is one complete run of the engine against one target with one
//! credential source and mode. It moves monotonically through its states
//! and is serializable so that a completed run round-trips through JSON
//! without loss.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::credential::Credential;
use crate::target::Target;

/// Strategy used to generate candidate pairs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AttackMode {
    Dictionary,
    BruteForce,
    Hybrid,
    Stuffing,
}

impl std::str::FromStr for AttackMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dictionary" => Ok(AttackMode::Dictionary),
            "brute-force" | "bruteforce" => Ok(AttackMode::BruteForce),
            "hybrid" => Ok(AttackMode::Hybrid),
            "stuffing" => Ok(AttackMode::Stuffing),
            other => Err(format!("unknown attack mode: {other}")),
        }
    }
}

impl std::fmt::Display for AttackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AttackMode::Dictionary => "dictionary",
            AttackMode::BruteForce => "brute-force",
            AttackMode::Hybrid => "hybrid",
            AttackMode::Stuffing => "stuffing",
        };
        write!(f, "{name}")
    }
}

/// Classification of a single authentication attempt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Success,
    InvalidCredentials,
    NetworkError,
    Timeout,
    RateLimited,
}

impl OutcomeKind {
    /// Timeouts count as failures; network and throttling problems count
    /// as errors in the session tallies.
    pub fn is_error(&self) -> bool {
        matches!(self, OutcomeKind::NetworkError | OutcomeKind::RateLimited)
    }
}

/// Terminal result of one authentication attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Outcome {
    pub credential: Credential,
    pub kind: OutcomeKind,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub latency_ms: u64,
    /// HTTP status of the final response, when one was received
    pub status_code: Option<u16>,
    /// Error detail or response metadata
    pub detail: Option<String>,
}

impl Outcome {
    pub fn new(credential: Credential, kind: OutcomeKind, latency_ms: u64) -> Self {
        Self {
            credential,
            kind,
            timestamp: chrono::Utc::now(),
            latency_ms,
            status_code: None,
            detail: None,
        }
    }

    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.kind == OutcomeKind::Success
    }
}

/// Session lifecycle states, ordered; a session never moves backwards
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionState {
    Configured,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    fn rank(&self) -> u8 {
        match self {
            SessionState::Configured => 0,
            SessionState::Running => 1,
            // The three terminal states share a rank; once terminal a
            // session cannot move again.
            SessionState::Completed | SessionState::Cancelled | SessionState::Failed => 2,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.rank() == 2
    }
}

/// Aggregate counters for a session. The sum of the per-kind fields always
/// equals the number of terminal outcomes recorded.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tally {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub errored: u64,
}

impl Tally {
    pub fn is_consistent(&self) -> bool {
        self.attempted == self.succeeded + self.failed + self.errored
    }
}

/// One complete run of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub target: Target,
    pub mode: AttackMode,
    pub state: SessionState,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub ended_at: Option<chrono::DateTime<chrono::Utc>>,
    pub tally: Tally,
    /// Terminal outcomes in first-seen order, one per distinct credential
    pub outcomes: Vec<Outcome>,
    /// Reason for a Failed or Cancelled end, when any
    pub failure_reason: Option<String>,
}

impl Session {
    pub fn new(target: Target, mode: AttackMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            target,
            mode,
            state: SessionState::Configured,
            started_at: None,
            ended_at: None,
            tally: Tally::default(),
            outcomes: Vec::new(),
            failure_reason: None,
        }
    }

    /// Advance to the next state. Returns false (leaving the session
    /// untouched) when the transition would regress or leave a terminal
    /// state.
    pub fn advance(&mut self, next: SessionState) -> bool {
        if self.state.is_terminal() || next.rank() <= self.state.rank() {
            return false;
        }
        if next == SessionState::Running {
            self.started_at = Some(chrono::Utc::now());
        }
        if next.is_terminal() {
            self.ended_at = Some(chrono::Utc::now());
        }
        self.state = next;
        true
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Sustained throughput over the whole run, attempts per second
    pub fn attempts_per_second(&self) -> f64 {
        match self.duration() {
            Some(d) if d.num_milliseconds() > 0 => {
                self.tally.attempted as f64 / (d.num_milliseconds() as f64 / 1000.0)
            }
            _ => 0.0,
        }
    }

    pub fn successes(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn first_success(&self) -> Option<&Outcome> {
        self.successes().next()
    }

    /// Distinct usernames and passwords seen across all outcomes
    pub fn unique_counts(&self) -> (usize, usize) {
        let mut users: HashSet<&str> = HashSet::new();
        let mut passwords: HashSet<&str> = HashSet::new();
        for outcome in &self.outcomes {
            users.insert(&outcome.credential.username);
            passwords.insert(&outcome.credential.password);
        }
        (users.len(), passwords.len())
    }

    pub fn average_latency_ms(&self) -> u64 {
        if self.outcomes.is_empty() {
            return 0;
        }
        let total: u64 = self.outcomes.iter().map(|o| o.latency_ms).sum();
        total / self.outcomes.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Provenance;

    fn test_target() -> Target {
        Target {
            scheme: "http".to_string(),
            host: "example.test".to_string(),
            port: 80,
            path: "/login".to_string(),
            url: "http://example.test/login".to_string(),
            username_field: "username".to_string(),
            password_field: "password".to_string(),
        }
    }

    #[test]
    fn test_state_never_regresses() {
        let mut session = Session::new(test_target(), AttackMode::Dictionary);
        assert!(session.advance(SessionState::Running));
        assert!(session.advance(SessionState::Completed));
        assert!(!session.advance(SessionState::Running));
        assert!(!session.advance(SessionState::Cancelled));
        assert_eq!(session.state, SessionState::Completed);
    }

    #[test]
    fn test_advance_sets_timestamps() {
        let mut session = Session::new(test_target(), AttackMode::Stuffing);
        assert!(session.started_at.is_none());
        session.advance(SessionState::Running);
        assert!(session.started_at.is_some());
        session.advance(SessionState::Failed);
        assert!(session.ended_at.is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let mut session = Session::new(test_target(), AttackMode::Dictionary);
        session.advance(SessionState::Running);
        session.outcomes.push(
            Outcome::new(
                Credential::new("admin", "admin", Provenance::Dictionary),
                OutcomeKind::Success,
                42,
            )
            .with_status(200),
        );
        session.tally = Tally {
            attempted: 1,
            succeeded: 1,
            failed: 0,
            errored: 0,
        };
        session.advance(SessionState::Completed);

        let encoded = serde_json::to_string(&session).unwrap();
        let decoded: Session = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.id, session.id);
        assert_eq!(decoded.target, session.target);
        assert_eq!(decoded.mode, session.mode);
        assert_eq!(decoded.state, session.state);
        assert_eq!(decoded.outcomes, session.outcomes);
        assert_eq!(decoded.tally, session.tally);
    }

    #[test]
    fn test_tally_consistency() {
        let tally = Tally {
            attempted: 4,
            succeeded: 1,
            failed: 3,
            errored: 0,
        };
        assert!(tally.is_consistent());

        let broken = Tally {
            attempted: 5,
            ..tally
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_attack_mode_parsing() {
        assert_eq!("dictionary".parse::<AttackMode>(), Ok(AttackMode::Dictionary));
        assert_eq!("Brute-Force".parse::<AttackMode>(), Ok(AttackMode::BruteForce));
        assert_eq!("STUFFING".parse::<AttackMode>(), Ok(AttackMode::Stuffing));
        assert!("smart".parse::<AttackMode>().is_err());
    }
}
