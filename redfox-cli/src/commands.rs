//! Command implementations

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use redfox_common::{AttackMode, SessionState};
use redfox_engine::{
    resolve_target, wordlist, AttemptExecutor, BruteForceOptions, BruteForceSource,
    CredentialSource, DictionarySource, HttpExecutor, HttpExecutorOptions, HybridSource,
    ReportFormat, Scheduler, SchedulerConfig, StuffingSource, SuccessPolicy,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cli::{BenchmarkArgs, ScanArgs, ValidateArgs};
use crate::config::AppConfig;
use crate::output;

/// Run one audit session and report the results.
pub async fn scan(args: ScanArgs, config: &AppConfig) -> Result<i32> {
    let mode = AttackMode::from_str(&args.mode).map_err(anyhow::Error::msg)?;
    let target = resolve_target(&args.target, &args.username_field, &args.password_field)?;
    let source = build_source(&args, mode, config)?;

    let executor = Arc::new(HttpExecutor::new(HttpExecutorOptions {
        timeout: Duration::from_secs(args.timeout.unwrap_or(config.scan.timeout_secs)),
        user_agent: config
            .scan
            .user_agent
            .clone()
            .unwrap_or_else(|| format!("redfox/{}", env!("CARGO_PKG_VERSION"))),
        proxy: args.proxy.clone(),
        cookies: args.cookies.clone(),
    })?);

    let scheduler = Scheduler::new(SchedulerConfig {
        workers: args.threads.unwrap_or(config.scan.threads),
        rate_limit: args.rate_limit.unwrap_or(config.scan.rate_limit),
        max_retries: args.retries.unwrap_or(config.scan.max_retries),
        budget: args.budget.map(Duration::from_secs),
        success_policy: if args.stop_on_first {
            SuccessPolicy::StopOnFirst
        } else {
            SuccessPolicy::ContinueAll
        },
        ..Default::default()
    })?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing in-flight attempts");
                cancel.cancel();
            }
        });
    }

    let session = scheduler
        .run(target, mode, source, executor, cancel)
        .await?;

    output::print_summary(&session);

    let format = match &args.format {
        Some(f) => ReportFormat::from_str(f)?,
        None => ReportFormat::from_str(&config.output.format)?,
    };
    if let Some(path) = &args.output {
        output::persist_to(&session, format, path)?;
        println!("\nreport: {}", path.display());
    } else if config.output.save_results && !args.no_save {
        let path = output::persist(&session, format, &config.output.results_dir)?;
        println!("\nreport: {}", path.display());
    }

    Ok(match session.state {
        SessionState::Failed => 1,
        _ => 0,
    })
}

fn build_source(
    args: &ScanArgs,
    mode: AttackMode,
    config: &AppConfig,
) -> Result<Box<dyn CredentialSource>> {
    let search_dirs = &config.wordlists.search_dirs;

    if mode == AttackMode::Stuffing {
        let list = args
            .password
            .as_deref()
            .context("stuffing mode needs the user:password list via --password")?;
        let path = resolve_wordlist_path(list, search_dirs)?;
        let mut source: Box<dyn CredentialSource> = Box::new(StuffingSource::from_file(path)?);
        apply_resume(&mut source, args.resume_from)?;
        return Ok(source);
    }

    let users = load_users(args, config)?;
    let mut source: Box<dyn CredentialSource> = match mode {
        AttackMode::Dictionary => {
            let passwords = load_passwords(args, config)?;
            Box::new(DictionarySource::new(users, passwords)?)
        }
        AttackMode::Hybrid => {
            let passwords = load_passwords(args, config)?;
            Box::new(HybridSource::new(users, passwords)?)
        }
        AttackMode::BruteForce => Box::new(BruteForceSource::new(
            users,
            BruteForceOptions {
                charset: args.charset.chars().collect(),
                min_length: args.min_length,
                max_length: args.max_length,
            },
        )?),
        AttackMode::Stuffing => unreachable!(),
    };
    apply_resume(&mut source, args.resume_from)?;
    info!(source = %source.describe(), candidates = source.total(), "credential source ready");
    Ok(source)
}

fn load_users(args: &ScanArgs, config: &AppConfig) -> Result<Vec<String>> {
    let search_dirs = &config.wordlists.search_dirs;
    if let Some(input) = &args.user {
        return Ok(wordlist::parse_input(input, search_dirs)?);
    }
    if let Some(default) = &config.wordlists.users {
        return Ok(wordlist::load_lines(default)?);
    }
    bail!("no username input given and no default wordlist configured");
}

fn load_passwords(args: &ScanArgs, config: &AppConfig) -> Result<Vec<String>> {
    let search_dirs = &config.wordlists.search_dirs;
    if let Some(input) = &args.password {
        return Ok(wordlist::parse_input(input, search_dirs)?);
    }
    if let Some(default) = &config.wordlists.passwords {
        return Ok(wordlist::load_lines(default)?);
    }
    bail!("no password input given and no default wordlist configured");
}

fn resolve_wordlist_path(input: &str, search_dirs: &[PathBuf]) -> Result<PathBuf> {
    let direct = PathBuf::from(input);
    if direct.is_file() {
        return Ok(direct);
    }
    wordlist::resolve_path(input, search_dirs)
        .with_context(|| format!("wordlist not found: {input}"))
}

fn apply_resume(source: &mut Box<dyn CredentialSource>, offset: Option<u64>) -> Result<()> {
    if let Some(offset) = offset {
        source.seek(offset)?;
        info!(offset, "resuming credential source");
    }
    Ok(())
}

/// Repeat a dictionary scan and report sustained throughput.
pub async fn benchmark(args: BenchmarkArgs, config: &AppConfig) -> Result<i32> {
    let target = resolve_target(&args.target, "username", "password")?;
    let search_dirs = &config.wordlists.search_dirs;
    let users = wordlist::parse_input(&args.users, search_dirs)?;
    let passwords = wordlist::parse_input(&args.passwords, search_dirs)?;

    let executor: Arc<dyn AttemptExecutor> = Arc::new(HttpExecutor::new(HttpExecutorOptions {
        timeout: Duration::from_secs(config.scan.timeout_secs),
        ..Default::default()
    })?);
    let scheduler = Scheduler::new(SchedulerConfig {
        workers: args.threads.unwrap_or(config.scan.threads),
        max_retries: 0,
        ..Default::default()
    })?;

    println!(
        "benchmark: {} candidates x {} iterations against {}",
        users.len() * passwords.len(),
        args.iterations,
        target
    );

    let mut rates = Vec::with_capacity(args.iterations as usize);
    for iteration in 1..=args.iterations {
        let source = Box::new(DictionarySource::new(users.clone(), passwords.clone())?);
        let session = scheduler
            .run(
                target.clone(),
                AttackMode::Dictionary,
                source,
                Arc::clone(&executor),
                CancellationToken::new(),
            )
            .await?;

        let rate = session.attempts_per_second();
        let secs = session
            .duration()
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0);
        println!(
            "  iteration {iteration}: {} attempts in {secs:.2}s ({rate:.1}/s, {} errored)",
            session.tally.attempted, session.tally.errored
        );
        rates.push(rate);
    }

    let average = rates.iter().sum::<f64>() / rates.len() as f64;
    println!("\naverage sustained throughput: {average:.1} attempts/s");
    Ok(0)
}

/// Validation findings for a target and its scan settings.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check a target specification and wordlists without any login attempts.
pub async fn validate(args: ValidateArgs, config: &AppConfig) -> Result<i32> {
    let mut report = ValidationReport::default();

    let target = match resolve_target(&args.target, "username", "password") {
        Ok(target) => {
            if target.host == "localhost" || target.host == "127.0.0.1" {
                report.warn("target points at the local host");
            }
            if !target.uses_tls() {
                report.warn("target uses plain http, credentials travel unencrypted");
            }
            Some(target)
        }
        Err(e) => {
            report.error(e.to_string());
            None
        }
    };

    for (label, input) in [("users", &args.users), ("passwords", &args.passwords)] {
        if let Some(input) = input {
            match wordlist::parse_input(input, &config.wordlists.search_dirs) {
                Ok(entries) => {
                    println!("{label}: {} entries", entries.len());
                    if entries.len() < 3 {
                        report.warn(format!("{label} list is very small ({})", entries.len()));
                    }
                }
                Err(e) => report.error(format!("{label}: {e}")),
            }
        }
    }

    if args.probe {
        if let Some(target) = &target {
            let executor = HttpExecutor::new(HttpExecutorOptions::default())?;
            match executor.check_connectivity(target).await {
                Ok(status) => println!("probe: target reachable (status {status})"),
                Err(e) => report.error(format!("probe failed: {e}")),
            }
        }
    }

    if !report.warnings.is_empty() {
        println!("warnings:");
        for warning in &report.warnings {
            println!("  - {warning}");
        }
    }
    if report.is_valid() {
        println!("validation passed");
        Ok(0)
    } else {
        println!("errors:");
        for error in &report.errors {
            println!("  - {error}");
        }
        Ok(1)
    }
}

/// Show wordlists discoverable through the configured search paths.
pub fn list_wordlists(config: &AppConfig) -> Result<i32> {
    let mut found = false;
    for dir in &config.wordlists.search_dirs {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        if names.is_empty() {
            continue;
        }
        names.sort();
        found = true;
        println!("{}:", dir.display());
        for name in names {
            println!("  {name}");
        }
    }
    if !found {
        println!("no wordlists found in the configured search directories");
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn scan_args(argv: &[&str]) -> ScanArgs {
        let mut full = vec!["redfox", "scan"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Scan(args) => args,
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_users_fall_back_to_configured_wordlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.txt");
        std::fs::write(&path, "admin\nroot\n").unwrap();

        let mut config = AppConfig::default();
        config.wordlists.users = Some(path);

        let args = scan_args(&["-t", "http://x.example", "-p", "hunter2"]);
        let users = load_users(&args, &config).unwrap();
        assert_eq!(users, vec!["admin", "root"]);
    }

    #[test]
    fn test_explicit_user_flag_wins_over_configured_wordlist() {
        let mut config = AppConfig::default();
        config.wordlists.users = Some(PathBuf::from("/nonexistent/users.txt"));

        let args = scan_args(&["-t", "http://x.example", "-u", "operator", "-p", "x"]);
        let users = load_users(&args, &config).unwrap();
        assert_eq!(users, vec!["operator"]);
    }

    #[test]
    fn test_no_user_input_anywhere_is_an_error() {
        let config = AppConfig::default();
        let args = scan_args(&["-t", "http://x.example", "-p", "x"]);
        assert!(load_users(&args, &config).is_err());
    }
}
