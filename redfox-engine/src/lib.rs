//! RedFox Engine - Concurrent credential-auditing core
//!
//! This crate provides the components behind a RedFox run: target
//! resolution, credential sources for the supported attack modes, a
//! worker-pool scheduler with rate limiting and retry, the HTTP attempt
//! executor, thread-safe result aggregation, and report generation.

pub mod aggregate;
pub mod credentials;
pub mod error;
pub mod executor;
pub mod ratelimit;
pub mod report;
pub mod resolver;
pub mod scheduler;
pub mod wordlist;


pub use error::{BackoffStrategy, EngineError, EngineResult, NetworkErrorClass};

pub use credentials::{
    source_for_mode, BruteForceOptions, BruteForceSource, CredentialSource, DictionarySource,
    HybridSource, StuffingSource,
};

pub use aggregate::{Aggregator, Progress};

pub use executor::{AttemptExecutor, HttpExecutor, HttpExecutorOptions};

pub use ratelimit::RateLimiter;

pub use report::{render, ReportFormat};

pub use resolver::resolve_target;

pub use scheduler::{Scheduler, SchedulerConfig, SuccessPolicy};

// Re-export the shared data model so engine consumers only need one import
// path for the common case.
pub use redfox_common::{
    AttackMode, Credential, Outcome, OutcomeKind, Provenance, Session, SessionState, Tally, Target,
};
