//! Common data model shared across RedFox crates
//!
//! This crate defines the types exchanged between the engine and the CLI:
//! - Target - Resolved connection parameters for one audit target
//! - Credential - One (username, password) candidate with provenance
//! - Session/Outcome - One complete run and its per-attempt results

pub mod credential;
pub mod session;
pub mod target;

pub use credential::{Credential, Provenance};
pub use session::{AttackMode, Outcome, OutcomeKind, Session, SessionState, Tally};
pub use target::Target;
