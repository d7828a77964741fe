//! Error types for the engine

use thiserror::Error;

/// Transient errors are retried with backoff; permanent ones abort the
/// session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NetworkErrorClass {
    Transient,
    Permanent,
}

/// Main error type for engine operations
#[derive(Debug, Error, Clone)]
pub enum EngineError {
    #[error("invalid target '{input}': {reason}")]
    InvalidTarget { input: String, reason: String },

    #[error("input error: {reason}")]
    Input { reason: String },

    #[error("credential source exhausted: {reason}")]
    ExhaustedInput { reason: String },

    #[error("network error: {details}")]
    Network {
        details: String,
        class: NetworkErrorClass,
    },

    #[error("attempt timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("target signalled throttling")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("configuration error: {field} - {reason}")]
    Config { field: String, reason: String },

    #[error("report generation failed: {reason}")]
    Report { reason: String },

    #[error("session cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn input(reason: impl Into<String>) -> Self {
        Self::Input {
            reason: reason.into(),
        }
    }

    pub fn exhausted(reason: impl Into<String>) -> Self {
        Self::ExhaustedInput {
            reason: reason.into(),
        }
    }

    pub fn invalid_target(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTarget {
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn network_transient(details: impl Into<String>) -> Self {
        Self::Network {
            details: details.into(),
            class: NetworkErrorClass::Transient,
        }
    }

    pub fn network_permanent(details: impl Into<String>) -> Self {
        Self::Network {
            details: details.into(),
            class: NetworkErrorClass::Permanent,
        }
    }

    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn report(reason: impl Into<String>) -> Self {
        Self::Report {
            reason: reason.into(),
        }
    }

    /// Whether the scheduler may re-queue the attempt that produced this
    /// error.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::Network { class, .. } => *class == NetworkErrorClass::Transient,
            EngineError::RateLimited { .. } => true,
            _ => false,
        }
    }

    /// Whether the error must end the whole session rather than a single
    /// attempt.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Network {
                class: NetworkErrorClass::Permanent,
                ..
            } | EngineError::InvalidTarget { .. }
                | EngineError::Input { .. }
                | EngineError::ExhaustedInput { .. }
                | EngineError::Config { .. }
        )
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Backoff curve applied between retries of one candidate
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum BackoffStrategy {
    Fixed {
        delay_ms: u64,
    },
    Exponential {
        initial_delay_ms: u64,
        multiplier: f64,
        max_delay_ms: u64,
    },
}

impl BackoffStrategy {
    /// Delay before retry number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> std::time::Duration {
        let ms = match self {
            BackoffStrategy::Fixed { delay_ms } => *delay_ms,
            BackoffStrategy::Exponential {
                initial_delay_ms,
                multiplier,
                max_delay_ms,
            } => {
                let delay = (*initial_delay_ms as f64) * multiplier.powi(attempt as i32);
                (delay as u64).min(*max_delay_ms)
            }
        };
        std::time::Duration::from_millis(ms)
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffStrategy::Exponential {
            initial_delay_ms: 200,
            multiplier: 2.0,
            max_delay_ms: 5_000,
        }
    }
}
