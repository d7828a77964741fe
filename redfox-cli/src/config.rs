//! TOML configuration
//!
//! CLI flags override config values, which override the built-in
//! defaults. The file is looked up at the path given with `--config`,
//! then `./redfox.toml`, then `~/.config/redfox/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub scan: ScanConfig,
    pub wordlists: WordlistConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Base log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Optional log file; logs go to stderr only when unset
    pub log_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub threads: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Attempts per second across all workers; zero disables limiting
    pub rate_limit: f64,
    pub user_agent: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 20,
            timeout_secs: 30,
            max_retries: 3,
            rate_limit: 0.0,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WordlistConfig {
    /// Default username wordlist when the flag names none
    pub users: Option<PathBuf>,
    /// Default password wordlist when the flag names none
    pub passwords: Option<PathBuf>,
    /// Directories searched for wordlists given by bare name
    pub search_dirs: Vec<PathBuf>,
}

impl Default for WordlistConfig {
    fn default() -> Self {
        Self {
            users: None,
            passwords: None,
            search_dirs: redfox_engine::wordlist::DEFAULT_SEARCH_DIRS
                .iter()
                .map(PathBuf::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default report format
    pub format: String,
    /// Whether scan reports are written to disk
    pub save_results: bool,
    /// Directory reports are written into
    pub results_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            save_results: true,
            results_dir: PathBuf::from("./reports"),
        }
    }
}

impl AppConfig {
    /// Load configuration, falling back to defaults when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in Self::default_locations() {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from("redfox.toml")];
        if let Some(home) = std::env::var_os("HOME") {
            locations.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("redfox")
                    .join("config.toml"),
            );
        }
        locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.scan.threads, 20);
        assert_eq!(config.scan.timeout_secs, 30);
        assert_eq!(config.scan.max_retries, 3);
        assert_eq!(config.scan.rate_limit, 0.0);
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.output.format, "json");
        assert!(config.output.save_results);
        assert!(!config.wordlists.search_dirs.is_empty());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scan]\nthreads = 50\nrate_limit = 10.0\n\n[output]\nformat = \"csv\""
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.scan.threads, 50);
        assert_eq!(config.scan.rate_limit, 10.0);
        assert_eq!(config.scan.timeout_secs, 30);
        assert_eq!(config.output.format, "csv");
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [").unwrap();
        assert!(AppConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/redfox.toml"))).is_err());
    }
}
