//! End-to-end pipeline tests: wordlist files through the scheduler to a
//! rendered report, using a canned executor instead of live HTTP.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redfox_common::{AttackMode, Credential, Outcome, OutcomeKind, Session, SessionState, Target};
use redfox_engine::{
    render, resolve_target, wordlist, AttemptExecutor, DictionarySource, EngineResult,
    ReportFormat, Scheduler, SchedulerConfig, SuccessPolicy,
};
use tempfile::NamedTempFile;
use tokio_util::sync::CancellationToken;

/// Accepts exactly one credential pair, rejects everything else.
struct OneValidPair {
    username: String,
    password: String,
}

#[async_trait]
impl AttemptExecutor for OneValidPair {
    async fn execute(&self, _target: &Target, credential: &Credential) -> EngineResult<Outcome> {
        let kind = if credential.username == self.username && credential.password == self.password
        {
            OutcomeKind::Success
        } else {
            OutcomeKind::InvalidCredentials
        };
        Ok(Outcome::new(credential.clone(), kind, 2).with_status(200))
    }
}

fn wordlist_file(entries: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for entry in entries {
        writeln!(file, "{entry}").unwrap();
    }
    file
}

async fn run_scan(stop_on_first: bool) -> Session {
    let users_file = wordlist_file(&["admin", "operator", "guest"]);
    let passwords_file = wordlist_file(&["123456", "# a comment", "letmein", "hunter2"]);

    let users = wordlist::parse_input(users_file.path().to_str().unwrap(), &[]).unwrap();
    let passwords = wordlist::parse_input(passwords_file.path().to_str().unwrap(), &[]).unwrap();
    assert_eq!(passwords.len(), 3);

    let source = Box::new(DictionarySource::new(users, passwords).unwrap());
    let target = resolve_target("http://127.0.0.1:9999/login", "username", "password").unwrap();
    let executor = Arc::new(OneValidPair {
        username: "operator".to_string(),
        password: "hunter2".to_string(),
    });

    let scheduler = Scheduler::new(SchedulerConfig {
        workers: 4,
        success_policy: if stop_on_first {
            SuccessPolicy::StopOnFirst
        } else {
            SuccessPolicy::ContinueAll
        },
        progress_interval: Duration::from_secs(60),
        ..Default::default()
    })
    .unwrap();

    scheduler
        .run(
            target,
            AttackMode::Dictionary,
            source,
            executor,
            CancellationToken::new(),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn full_scan_finds_the_planted_credential() {
    let session = run_scan(false).await;

    assert_eq!(session.state, SessionState::Completed);
    assert_eq!(session.tally.attempted, 9);
    assert_eq!(session.tally.succeeded, 1);
    assert_eq!(session.tally.failed, 8);
    assert!(session.tally.is_consistent());

    let found = session.first_success().unwrap();
    assert_eq!(found.credential.username, "operator");
    assert_eq!(found.credential.password, "hunter2");
}

#[tokio::test]
async fn stop_on_first_ends_early_but_reports_the_hit() {
    let session = run_scan(true).await;

    assert_eq!(session.state, SessionState::Completed);
    assert_eq!(session.tally.succeeded, 1);
    assert!(session.tally.attempted <= 9);
    assert!(session.first_success().is_some());
}

#[tokio::test]
async fn rendered_reports_cover_every_format_and_json_round_trips() {
    let session = run_scan(false).await;

    for format in ReportFormat::ALL {
        let bytes = render(&session, *format).unwrap();
        assert!(!bytes.is_empty());
    }

    let json = render(&session, ReportFormat::Json).unwrap();
    let restored: Session = serde_json::from_slice(&json).unwrap();
    assert_eq!(restored.id, session.id);
    assert_eq!(restored.tally, session.tally);
    assert_eq!(restored.outcomes.len(), session.outcomes.len());
}
