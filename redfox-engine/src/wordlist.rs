//! Wordlist loading and inline input parsing.
//!
//! An input string is interpreted as, in order: an existing file path,
//! a comma-separated list, a multiline blob, or a single literal value.
//! File lookups fall back to a set of search directories so short names
//! like `rockyou.txt` resolve against system wordlist collections.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EngineError, EngineResult};

/// Directories consulted when a wordlist name is not a path that exists.
pub const DEFAULT_SEARCH_DIRS: &[&str] = &[
    "/usr/share/wordlists",
    "/usr/share/seclists",
    "/usr/share/redfox/wordlists",
];

/// Interpret `input` as a wordlist file or an inline value list.
pub fn parse_input(input: &str, search_dirs: &[PathBuf]) -> EngineResult<Vec<String>> {
    if Path::new(input).exists() {
        return load_lines(Path::new(input));
    }
    if let Some(found) = resolve_path(input, search_dirs) {
        return load_lines(&found);
    }
    if input.contains(',') {
        return Ok(parse_comma_separated(input));
    }
    if input.contains('\n') {
        return Ok(parse_multiline(input));
    }
    if input.is_empty() {
        return Err(EngineError::exhausted("empty input value"));
    }
    Ok(vec![input.to_string()])
}

/// Search for a wordlist by name under the configured directories.
pub fn resolve_path(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    for dir in search_dirs {
        let candidate = dir.join(name);
        if candidate.is_file() {
            debug!(path = %candidate.display(), "resolved wordlist via search path");
            return Some(candidate);
        }
    }
    None
}

/// Read a wordlist file: one entry per line, trimmed, blank lines and
/// `#` comments skipped. An empty result is an error.
pub fn load_lines(path: &Path) -> EngineResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        EngineError::input(format!("failed to read {}: {}", path.display(), e))
    })?;

    let items: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return Err(EngineError::exhausted(format!(
            "wordlist is empty: {}",
            path.display()
        )));
    }

    debug!(path = %path.display(), entries = items.len(), "loaded wordlist");
    Ok(items)
}

/// Read a credential-stuffing list of `username:password` lines.
/// Malformed lines are skipped with a warning rather than aborting.
pub fn load_pairs(path: &Path) -> EngineResult<Vec<(String, String)>> {
    let lines = load_lines(path)?;
    let mut pairs = Vec::with_capacity(lines.len());

    for (index, line) in lines.iter().enumerate() {
        match line.split_once(':') {
            Some((user, pass)) => pairs.push((user.to_string(), pass.to_string())),
            None => warn!(line = index + 1, "skipping malformed stuffing entry"),
        }
    }

    if pairs.is_empty() {
        return Err(EngineError::exhausted(format!(
            "no usable user:password pairs in {}",
            path.display()
        )));
    }
    Ok(pairs)
}

fn parse_comma_separated(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_multiline(input: &str) -> Vec<String> {
    input
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Suffixes appended to each dictionary word in hybrid mode.
const MUTATION_SUFFIXES: &[&str] = &["1", "123", "!", "2024", "2025", "@123"];

/// Expand one dictionary word into its hybrid variants. The base word
/// comes first so plain dictionary hits are found before mutations.
pub fn mutations_for(word: &str) -> Vec<String> {
    let mut variants = Vec::with_capacity(2 + 2 * MUTATION_SUFFIXES.len());
    variants.push(word.to_string());

    let capitalized = capitalize(word);
    let has_cap_variant = capitalized != word;
    if has_cap_variant {
        variants.push(capitalized.clone());
    }

    for suffix in MUTATION_SUFFIXES {
        variants.push(format!("{word}{suffix}"));
        if has_cap_variant {
            variants.push(format!("{capitalized}{suffix}"));
        }
    }
    variants
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
