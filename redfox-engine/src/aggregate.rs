//! Thread-safe result aggregation
//!
//! Every terminal outcome is recorded exactly once per credential
//! identity. A re-attempted candidate replaces its earlier outcome but
//! keeps its original position, so the final outcome list reflects
//! first-seen order.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use dashmap::DashMap;
use redfox_common::{Outcome, OutcomeKind, Tally};

/// Point-in-time counters for live progress reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub errored: u64,
    /// Candidates the session expects in total, when known.
    pub expected: u64,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.expected == 0 {
            return 0.0;
        }
        (self.attempted as f64 / self.expected as f64) * 100.0
    }
}

/// Accumulation point for attempt outcomes across all workers.
pub struct Aggregator {
    outcomes: DashMap<String, Outcome>,
    order: Mutex<Vec<String>>,
    attempted: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    errored: AtomicU64,
    expected: u64,
}

impl Aggregator {
    pub fn new(expected: u64) -> Self {
        Self {
            outcomes: DashMap::new(),
            order: Mutex::new(Vec::new()),
            attempted: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            errored: AtomicU64::new(0),
            expected,
        }
    }

    /// Record a terminal outcome. Returns true when this credential had
    /// not been seen before; false when the outcome replaced an earlier
    /// one for the same identity.
    pub fn record(&self, outcome: Outcome) -> bool {
        let identity = outcome.credential.identity();
        self.bump(outcome.kind, 1);

        match self.outcomes.insert(identity.clone(), outcome) {
            Some(previous) => {
                // Replacement: the candidate is still one attempt in the
                // tallies, so back out the old classification.
                self.bump(previous.kind, -1);
                false
            }
            None => {
                self.attempted.fetch_add(1, Ordering::SeqCst);
                self.order
                    .lock()
                    .expect("aggregator order lock poisoned")
                    .push(identity);
                true
            }
        }
    }

    fn bump(&self, kind: OutcomeKind, delta: i64) {
        let counter = match kind {
            OutcomeKind::Success => &self.succeeded,
            OutcomeKind::InvalidCredentials | OutcomeKind::Timeout => &self.failed,
            OutcomeKind::NetworkError | OutcomeKind::RateLimited => &self.errored,
        };
        if delta >= 0 {
            counter.fetch_add(delta as u64, Ordering::SeqCst);
        } else {
            counter.fetch_sub((-delta) as u64, Ordering::SeqCst);
        }
    }

    pub fn progress(&self) -> Progress {
        Progress {
            attempted: self.attempted.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            errored: self.errored.load(Ordering::SeqCst),
            expected: self.expected,
        }
    }

    pub fn tally(&self) -> Tally {
        let progress = self.progress();
        Tally {
            attempted: progress.attempted,
            succeeded: progress.succeeded,
            failed: progress.failed,
            errored: progress.errored,
        }
    }

    /// Drain into the final outcome list, first-seen order. Call once,
    /// after all workers have stopped recording.
    pub fn drain_outcomes(&self) -> Vec<Outcome> {
        let order = std::mem::take(
            &mut *self.order.lock().expect("aggregator order lock poisoned"),
        );
        order
            .into_iter()
            .filter_map(|identity| self.outcomes.remove(&identity).map(|(_, outcome)| outcome))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redfox_common::{Credential, Provenance};

    fn outcome(user: &str, pass: &str, kind: OutcomeKind) -> Outcome {
        Outcome::new(Credential::new(user, pass, Provenance::Dictionary), kind, 10)
    }

    #[test]
    fn test_tallies_match_recorded_outcomes() {
        let agg = Aggregator::new(4);
        agg.record(outcome("a", "1", OutcomeKind::InvalidCredentials));
        agg.record(outcome("a", "2", OutcomeKind::Success));
        agg.record(outcome("b", "1", OutcomeKind::Timeout));
        agg.record(outcome("b", "2", OutcomeKind::NetworkError));

        let tally = agg.tally();
        assert_eq!(tally.attempted, 4);
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failed, 2);
        assert_eq!(tally.errored, 1);
        assert!(tally.is_consistent());
    }

    #[test]
    fn test_reattempt_replaces_without_double_count() {
        let agg = Aggregator::new(1);
        assert!(agg.record(outcome("a", "1", OutcomeKind::NetworkError)));
        assert!(!agg.record(outcome("a", "1", OutcomeKind::Success)));

        let tally = agg.tally();
        assert_eq!(tally.attempted, 1);
        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.errored, 0);
        assert!(tally.is_consistent());

        let outcomes = agg.drain_outcomes();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].kind, OutcomeKind::Success);
    }

    #[test]
    fn test_outcomes_keep_first_seen_order() {
        let agg = Aggregator::new(3);
        agg.record(outcome("a", "1", OutcomeKind::InvalidCredentials));
        agg.record(outcome("b", "1", OutcomeKind::InvalidCredentials));
        agg.record(outcome("c", "1", OutcomeKind::InvalidCredentials));
        // Re-attempt the first candidate last; it keeps its slot.
        agg.record(outcome("a", "1", OutcomeKind::Success));

        let order: Vec<String> = agg
            .drain_outcomes()
            .into_iter()
            .map(|o| o.credential.to_string())
            .collect();
        assert_eq!(order, vec!["a:1", "b:1", "c:1"]);
    }

    #[test]
    fn test_progress_percent() {
        let agg = Aggregator::new(200);
        agg.record(outcome("a", "1", OutcomeKind::InvalidCredentials));
        agg.record(outcome("a", "2", OutcomeKind::InvalidCredentials));
        assert!((agg.progress().percent() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_concurrent_recording_is_consistent() {
        use std::sync::Arc;
        let agg = Arc::new(Aggregator::new(400));
        let mut handles = Vec::new();
        for worker in 0..4 {
            let agg = Arc::clone(&agg);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let kind = if i % 10 == 0 {
                        OutcomeKind::NetworkError
                    } else {
                        OutcomeKind::InvalidCredentials
                    };
                    agg.record(outcome(&format!("u{worker}"), &format!("p{i}"), kind));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let tally = agg.tally();
        assert_eq!(tally.attempted, 400);
        assert!(tally.is_consistent());
    }
}
