//! Bounded worker-pool scheduling
//!
//! One producer task feeds candidates from the credential source into a
//! bounded channel; a fixed pool of workers pulls from it, paces itself
//! through the shared rate limiter, and reports outcomes to a single
//! aggregation task. Cancellation (stop-on-first-success, wall-clock
//! budget, external signal) propagates through one token: workers finish
//! their in-flight attempt and stop pulling new work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use redfox_common::{
    AttackMode, Credential, Outcome, OutcomeKind, Session, SessionState, Target,
};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aggregate::Aggregator;
use crate::credentials::CredentialSource;
use crate::error::{BackoffStrategy, EngineError, EngineResult};
use crate::executor::AttemptExecutor;
use crate::ratelimit::RateLimiter;

/// What to do when a valid credential is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// Keep going and collect every valid pair.
    ContinueAll,
    /// Cancel the remaining candidates after the first success.
    StopOnFirst,
}

/// Scheduler knobs.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Worker pool size.
    pub workers: usize,
    /// Sustained attempts per second across all workers; zero disables.
    pub rate_limit: f64,
    /// Re-queues allowed per candidate after a transient error.
    pub max_retries: u32,
    pub backoff: BackoffStrategy,
    /// Wall-clock budget for the whole session.
    pub budget: Option<Duration>,
    pub success_policy: SuccessPolicy,
    /// How often progress is logged while running.
    pub progress_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            workers: 20,
            rate_limit: 0.0,
            max_retries: 3,
            backoff: BackoffStrategy::default(),
            budget: None,
            success_policy: SuccessPolicy::ContinueAll,
            progress_interval: Duration::from_secs(5),
        }
    }
}

enum WorkerEvent {
    Outcome(Outcome),
    Fatal(EngineError),
}

/// Drives one session: produce candidates, execute attempts, aggregate.
pub struct Scheduler {
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> EngineResult<Self> {
        if config.workers == 0 {
            return Err(EngineError::config("workers", "must be at least 1"));
        }
        Ok(Self { config })
    }

    /// Run a session to completion.
    ///
    /// Always returns the session with whatever outcomes were collected;
    /// a fatal error ends it in the `Failed` state with the reason set
    /// rather than discarding partial results.
    pub async fn run(
        &self,
        target: Target,
        mode: AttackMode,
        mut source: Box<dyn CredentialSource>,
        executor: Arc<dyn AttemptExecutor>,
        external: CancellationToken,
    ) -> EngineResult<Session> {
        let mut session = Session::new(target.clone(), mode);
        session.advance(SessionState::Running);

        let expected = source.total();
        info!(
            session = %session.id,
            target = %target,
            %mode,
            candidates = expected,
            workers = self.config.workers,
            source = %source.describe(),
            "session started"
        );

        let aggregator = Arc::new(Aggregator::new(expected));
        let limiter = Arc::new(RateLimiter::new(self.config.rate_limit));
        let stop = external.child_token();

        let budget_hit = Arc::new(AtomicBool::new(false));
        let stopped_on_success = Arc::new(AtomicBool::new(false));
        let fatal: Arc<Mutex<Option<EngineError>>> = Arc::new(Mutex::new(None));

        if let Some(budget) = self.config.budget {
            let stop = stop.clone();
            let budget_hit = Arc::clone(&budget_hit);
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(budget) => {
                        warn!(budget_secs = budget.as_secs(), "wall-clock budget exhausted");
                        budget_hit.store(true, Ordering::SeqCst);
                        stop.cancel();
                    }
                    _ = stop.cancelled() => {}
                }
            });
        }

        let (work_tx, work_rx) = mpsc::channel::<Credential>(self.config.workers * 2);
        let (event_tx, event_rx) = mpsc::channel::<WorkerEvent>(self.config.workers * 2);
        let work_rx = Arc::new(Mutex::new(work_rx));

        // Producer: drain the source into the bounded work channel.
        let producer = {
            let stop = stop.clone();
            tokio::spawn(async move {
                while let Some(pair) = source.next_pair() {
                    tokio::select! {
                        _ = stop.cancelled() => break,
                        sent = work_tx.send(pair) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
                source.position()
            })
        };

        let mut workers = Vec::with_capacity(self.config.workers);
        for worker_id in 0..self.config.workers {
            let ctx = WorkerContext {
                worker_id,
                target: target.clone(),
                work_rx: Arc::clone(&work_rx),
                event_tx: event_tx.clone(),
                executor: Arc::clone(&executor),
                limiter: Arc::clone(&limiter),
                stop: stop.clone(),
                max_retries: self.config.max_retries,
                backoff: self.config.backoff.clone(),
            };
            workers.push(tokio::spawn(run_worker(ctx)));
        }
        drop(event_tx);

        // Aggregation loop: the only task that touches the aggregator's
        // write path besides progress reads.
        let collector = {
            let aggregator = Arc::clone(&aggregator);
            let stop = stop.clone();
            let stopped_on_success = Arc::clone(&stopped_on_success);
            let fatal = Arc::clone(&fatal);
            let success_policy = self.config.success_policy;
            let progress_interval = self.config.progress_interval;
            tokio::spawn(async move {
                collect_events(
                    event_rx,
                    aggregator,
                    stop,
                    success_policy,
                    stopped_on_success,
                    fatal,
                    progress_interval,
                )
                .await;
            })
        };

        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "worker task panicked");
            }
        }
        let final_position = producer.await.unwrap_or(0);
        if let Err(e) = collector.await {
            error!(error = %e, "collector task panicked");
        }

        session.tally = aggregator.tally();
        session.outcomes = aggregator.drain_outcomes();

        let fatal_error = fatal.lock().await.take();
        let final_state = if let Some(err) = fatal_error {
            session.failure_reason = Some(err.to_string());
            SessionState::Failed
        } else if stopped_on_success.load(Ordering::SeqCst) {
            SessionState::Completed
        } else if budget_hit.load(Ordering::SeqCst) {
            session.failure_reason = Some("wall-clock budget exhausted".to_string());
            SessionState::Cancelled
        } else if external.is_cancelled() {
            session.failure_reason = Some("cancelled".to_string());
            SessionState::Cancelled
        } else {
            SessionState::Completed
        };
        session.advance(final_state);

        info!(
            session = %session.id,
            state = ?session.state,
            attempted = session.tally.attempted,
            succeeded = session.tally.succeeded,
            position = final_position,
            "session ended"
        );
        Ok(session)
    }
}

struct WorkerContext {
    worker_id: usize,
    target: Target,
    work_rx: Arc<Mutex<mpsc::Receiver<Credential>>>,
    event_tx: mpsc::Sender<WorkerEvent>,
    executor: Arc<dyn AttemptExecutor>,
    limiter: Arc<RateLimiter>,
    stop: CancellationToken,
    max_retries: u32,
    backoff: BackoffStrategy,
}

async fn run_worker(ctx: WorkerContext) {
    loop {
        // Holding the receiver lock only while pulling keeps the other
        // workers unblocked during the attempt itself.
        let pair = {
            let mut rx = ctx.work_rx.lock().await;
            tokio::select! {
                _ = ctx.stop.cancelled() => None,
                pair = rx.recv() => pair,
            }
        };
        let Some(pair) = pair else { break };

        ctx.limiter.acquire().await;
        if let Some(event) = attempt_with_retries(&ctx, &pair).await {
            if ctx.event_tx.send(event).await.is_err() {
                break;
            }
        }
    }
    debug!(worker = ctx.worker_id, "worker finished");
}

/// Execute one candidate, re-queueing it locally after transient errors
/// up to the retry budget. Returns `None` when the session was cancelled
/// before a terminal classification was reached.
async fn attempt_with_retries(ctx: &WorkerContext, pair: &Credential) -> Option<WorkerEvent> {
    let mut last_error: Option<EngineError> = None;

    for attempt in 0..=ctx.max_retries {
        if attempt > 0 {
            // A server-provided Retry-After wins over the configured
            // backoff curve.
            let delay = match &last_error {
                Some(EngineError::RateLimited {
                    retry_after_ms: Some(ms),
                }) => Duration::from_millis(*ms),
                _ => ctx.backoff.delay_for(attempt - 1),
            };
            tokio::select! {
                _ = ctx.stop.cancelled() => return None,
                _ = tokio::time::sleep(delay) => {}
            }
            ctx.limiter.acquire().await;
        }

        match ctx.executor.execute(&ctx.target, pair).await {
            Ok(outcome) => return Some(WorkerEvent::Outcome(outcome)),
            Err(e) if e.is_fatal() => return Some(WorkerEvent::Fatal(e)),
            Err(e) if e.is_recoverable() => {
                debug!(
                    worker = ctx.worker_id,
                    credential = %pair,
                    attempt,
                    error = %e,
                    "transient error, will retry"
                );
                last_error = Some(e);
            }
            Err(e) => {
                return Some(WorkerEvent::Outcome(terminal_from_error(pair, &e)));
            }
        }
    }

    // Retry budget exhausted: the last transient error becomes the
    // candidate's terminal classification.
    let err = last_error.unwrap_or(EngineError::Cancelled);
    warn!(credential = %pair, error = %err, "retries exhausted");
    Some(WorkerEvent::Outcome(terminal_from_error(pair, &err)))
}

fn terminal_from_error(pair: &Credential, err: &EngineError) -> Outcome {
    let kind = match err {
        EngineError::RateLimited { .. } => OutcomeKind::RateLimited,
        EngineError::Timeout { .. } => OutcomeKind::Timeout,
        _ => OutcomeKind::NetworkError,
    };
    Outcome::new(pair.clone(), kind, 0).with_detail(err.to_string())
}

async fn collect_events(
    mut event_rx: mpsc::Receiver<WorkerEvent>,
    aggregator: Arc<Aggregator>,
    stop: CancellationToken,
    success_policy: SuccessPolicy,
    stopped_on_success: Arc<AtomicBool>,
    fatal: Arc<Mutex<Option<EngineError>>>,
    progress_interval: Duration,
) {
    let mut ticker = tokio::time::interval(progress_interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    ticker.tick().await;

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                match event {
                    WorkerEvent::Outcome(outcome) => {
                        if outcome.is_success() {
                            info!(credential = %outcome.credential, "valid credential found");
                            if success_policy == SuccessPolicy::StopOnFirst {
                                stopped_on_success.store(true, Ordering::SeqCst);
                                stop.cancel();
                            }
                        }
                        aggregator.record(outcome);
                    }
                    WorkerEvent::Fatal(err) => {
                        error!(error = %err, "fatal error, aborting session");
                        let mut slot = fatal.lock().await;
                        if slot.is_none() {
                            *slot = Some(err);
                        }
                        drop(slot);
                        stop.cancel();
                    }
                }
            }
            _ = ticker.tick() => {
                let p = aggregator.progress();
                info!(
                    attempted = p.attempted,
                    succeeded = p.succeeded,
                    failed = p.failed,
                    errored = p.errored,
                    percent = format!("{:.1}", p.percent()),
                    "progress"
                );
            }
        }
    }
}
