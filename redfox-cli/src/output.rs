//! Report persistence and terminal summary

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use redfox_common::Session;
use redfox_engine::{render, ReportFormat};
use tracing::info;

/// Write a report into `results_dir` as `scan_YYYYMMDD_HHMMSS.<ext>`.
pub fn persist(session: &Session, format: ReportFormat, results_dir: &Path) -> Result<PathBuf> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let filename = format!("scan_{}.{}", timestamp, format.extension());
    let path = results_dir.join(filename);
    persist_to(session, format, &path)?;
    Ok(path)
}

/// Write a report to an explicit path.
pub fn persist_to(session: &Session, format: ReportFormat, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }
    let bytes = render(session, format)?;
    std::fs::write(path, bytes)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    info!(path = %path.display(), %format, "report written");
    Ok(())
}

/// Print the session summary to stdout.
pub fn print_summary(session: &Session) {
    println!();
    println!("target:      {}", session.target);
    println!("mode:        {}", session.mode);
    println!("state:       {:?}", session.state);
    if let Some(reason) = &session.failure_reason {
        println!("reason:      {reason}");
    }
    if let Some(duration) = session.duration() {
        let secs = duration.num_milliseconds() as f64 / 1000.0;
        println!("duration:    {secs:.1}s");
        println!("throughput:  {:.1} attempts/s", session.attempts_per_second());
    }
    println!(
        "attempts:    {} ({} ok, {} failed, {} errored)",
        session.tally.attempted,
        session.tally.succeeded,
        session.tally.failed,
        session.tally.errored
    );

    let successes: Vec<_> = session.successes().collect();
    if successes.is_empty() {
        println!("\nno valid credentials found");
    } else {
        println!("\nvalid credentials:");
        for outcome in successes {
            println!(
                "  {:20} {:30} [{}] {}ms",
                outcome.credential.username,
                outcome.credential.password,
                outcome
                    .status_code
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                outcome.latency_ms
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redfox_common::{AttackMode, SessionState};
    use redfox_engine::resolve_target;

    fn sample_session() -> Session {
        let target = resolve_target("http://127.0.0.1:8080/login", "username", "password").unwrap();
        let mut session = Session::new(target, AttackMode::Dictionary);
        session.advance(SessionState::Running);
        session.advance(SessionState::Completed);
        session
    }

    #[test]
    fn test_persist_uses_timestamped_filename() {
        let dir = tempfile::tempdir().unwrap();
        let session = sample_session();

        let path = persist(&session, ReportFormat::Json, dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("scan_"));
        assert!(name.ends_with(".json"));
        assert!(path.is_file());

        let restored: Session =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(restored.id, session.id);
    }

    #[test]
    fn test_persist_to_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let session = sample_session();
        let path = dir.path().join("nested").join("report.csv");

        persist_to(&session, ReportFormat::Csv, &path).unwrap();
        assert!(path.is_file());
    }
}
