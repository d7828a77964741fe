//! Command-line interface definition

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "redfox",
    version,
    about = "Concurrent credential-auditing engine for authorized security testing",
    long_about = "redfox audits authentication endpoints you are authorized to test.\n\
                  It schedules candidate credentials from wordlists or generators\n\
                  across a bounded worker pool, respects rate limits, and writes\n\
                  reports in JSON, HTML, CSV, TXT, or XML.\n\n\
                  Examples:\n  \
                  redfox scan -t http://target.example/login -u admin -p passwords.txt\n  \
                  redfox scan -t https://target.example -u users.txt -p rockyou.txt --mode hybrid --stop-on-first\n  \
                  redfox validate http://target.example/login\n  \
                  redfox benchmark -t http://test.example -u users.txt -p passwords.txt -i 3"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the startup banner
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a credential audit against one target
    #[command(arg_required_else_help = true)]
    Scan(ScanArgs),

    /// Measure sustained attempt throughput against a test target
    #[command(arg_required_else_help = true)]
    Benchmark(BenchmarkArgs),

    /// Check a target and scan settings without attempting any logins
    Validate(ValidateArgs),

    /// List wordlists found in the configured search directories
    ListWordlists,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    /// Target login URL, host:port, or bare host
    #[arg(short, long, value_name = "TARGET")]
    pub target: String,

    /// Username, comma-separated list, or wordlist file.
    /// Falls back to the configured default wordlist when omitted.
    #[arg(short, long, value_name = "USER|FILE")]
    pub user: Option<String>,

    /// Password, comma-separated list, or wordlist file.
    /// In stuffing mode this is the user:password breach list.
    #[arg(short, long, value_name = "PASS|FILE")]
    pub password: Option<String>,

    /// Attack mode [dictionary, brute-force, hybrid, stuffing]
    #[arg(short, long, default_value = "dictionary", value_name = "MODE")]
    pub mode: String,

    /// Worker pool size
    #[arg(short = 'T', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Per-attempt timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Retries per candidate after a transient error
    #[arg(long, value_name = "NUM")]
    pub retries: Option<u32>,

    /// Maximum sustained attempts per second across all workers
    #[arg(long, value_name = "RPS")]
    pub rate_limit: Option<f64>,

    /// Wall-clock budget for the whole session, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub budget: Option<u64>,

    /// Stop as soon as one valid credential is found
    #[arg(long)]
    pub stop_on_first: bool,

    /// Resume the credential source from this offset
    #[arg(long, value_name = "OFFSET")]
    pub resume_from: Option<u64>,

    /// Report format [json, html, csv, txt, xml]
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Write the report to this file instead of the results directory
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Do not persist a report file
    #[arg(long)]
    pub no_save: bool,

    /// Form field carrying the username
    #[arg(long, default_value = "username", value_name = "FIELD")]
    pub username_field: String,

    /// Form field carrying the password
    #[arg(long, default_value = "password", value_name = "FIELD")]
    pub password_field: String,

    /// Proxy server, e.g. http://127.0.0.1:8080
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Cookie header sent with every attempt
    #[arg(long, value_name = "COOKIES")]
    pub cookies: Option<String>,

    /// Character set for brute-force mode
    #[arg(long, default_value = "abcdefghijklmnopqrstuvwxyz0123456789", value_name = "CHARS")]
    pub charset: String,

    /// Minimum password length for brute-force mode
    #[arg(long, default_value_t = 1, value_name = "LEN")]
    pub min_length: u32,

    /// Maximum password length for brute-force mode
    #[arg(long, default_value_t = 4, value_name = "LEN")]
    pub max_length: u32,
}

#[derive(clap::Args, Debug)]
pub struct BenchmarkArgs {
    /// Target URL to benchmark against
    #[arg(short, long, value_name = "TARGET")]
    pub target: String,

    /// Username wordlist
    #[arg(short, long, value_name = "FILE")]
    pub users: String,

    /// Password wordlist
    #[arg(short, long, value_name = "FILE")]
    pub passwords: String,

    /// Number of benchmark iterations
    #[arg(short, long, default_value_t = 3, value_name = "NUM")]
    pub iterations: u32,

    /// Worker pool size
    #[arg(short = 'T', long, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Target to validate
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Username wordlist to check
    #[arg(short, long, value_name = "FILE")]
    pub users: Option<String>,

    /// Password wordlist to check
    #[arg(short, long, value_name = "FILE")]
    pub passwords: Option<String>,

    /// Probe the target with a GET request
    #[arg(long)]
    pub probe: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_scan_requires_a_target() {
        let result = Cli::try_parse_from(["redfox", "scan", "-u", "admin"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from([
            "redfox", "scan", "-t", "http://x.example", "-u", "admin", "-p", "pw.txt",
        ])
        .unwrap();
        match cli.command {
            Command::Scan(args) => {
                assert_eq!(args.target, "http://x.example");
                assert_eq!(args.user.as_deref(), Some("admin"));
                assert_eq!(args.mode, "dictionary");
                assert_eq!(args.username_field, "username");
                assert!(!args.stop_on_first);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_scan_user_list_is_optional() {
        // Usernames may come from the configured default wordlist.
        let cli = Cli::try_parse_from([
            "redfox", "scan", "-t", "http://x.example", "-p", "pw.txt",
        ])
        .unwrap();
        match cli.command {
            Command::Scan(args) => assert!(args.user.is_none()),
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn test_global_flags_parse_anywhere() {
        let cli = Cli::try_parse_from([
            "redfox", "validate", "http://x.example", "-vv", "--quiet",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(cli.quiet);
    }

    #[test]
    fn test_benchmark_defaults() {
        let cli = Cli::try_parse_from([
            "redfox", "benchmark", "-t", "http://x.example", "-u", "u.txt", "-p", "p.txt",
        ])
        .unwrap();
        match cli.command {
            Command::Benchmark(args) => {
                assert_eq!(args.iterations, 3);
                assert!(args.threads.is_none());
            }
            _ => panic!("expected benchmark"),
        }
    }
}
