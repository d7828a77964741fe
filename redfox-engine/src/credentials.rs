//! Credential pair generation for every attack mode
//!
//! Each source produces a lazy, finite sequence of candidate pairs and
//! can be re-positioned by offset, so an interrupted session resumes
//! from exactly where it stopped.

use std::path::PathBuf;

use redfox_common::{AttackMode, Credential, Provenance};
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::wordlist;

/// Candidate limit applied to combinatorial modes before a session
/// starts, so a typo in a length bound cannot enqueue billions of pairs.
pub const MAX_CANDIDATES: u64 = 10_000_000;

/// A positioned stream of credential pairs.
///
/// `next_pair` advances the cursor; `seek` rewinds or fast-forwards it.
/// Implementations are deterministic: the pair at a given offset never
/// changes for the same configuration.
pub trait CredentialSource: Send {
    /// Produce the next candidate, or `None` when exhausted.
    fn next_pair(&mut self) -> Option<Credential>;

    /// Zero-based offset of the next candidate to be produced.
    fn position(&self) -> u64;

    /// Move the cursor to `offset`. Seeking past the end is an error.
    fn seek(&mut self, offset: u64) -> EngineResult<()>;

    /// Total number of candidates this source will produce.
    fn total(&self) -> u64;

    /// Human-readable summary for logging.
    fn describe(&self) -> String;
}

/// Dictionary mode: row-major cross product of a user list and a
/// password list, or paired (zip) iteration of the two.
#[derive(Debug)]
pub struct DictionarySource {
    users: Vec<String>,
    passwords: Vec<String>,
    paired: bool,
    cursor: u64,
}

impl DictionarySource {
    pub fn new(users: Vec<String>, passwords: Vec<String>) -> EngineResult<Self> {
        Self::build(users, passwords, false)
    }

    /// Zip the two lists instead of crossing them. Iteration stops at
    /// the shorter list.
    pub fn paired(users: Vec<String>, passwords: Vec<String>) -> EngineResult<Self> {
        Self::build(users, passwords, true)
    }

    fn build(users: Vec<String>, passwords: Vec<String>, paired: bool) -> EngineResult<Self> {
        if users.is_empty() {
            return Err(EngineError::exhausted("user list is empty"));
        }
        if passwords.is_empty() {
            return Err(EngineError::exhausted("password list is empty"));
        }
        let source = Self {
            users,
            passwords,
            paired,
            cursor: 0,
        };
        if source.total() > MAX_CANDIDATES {
            return Err(EngineError::input(format!(
                "dictionary cross product would generate {} candidates (limit {})",
                source.total(),
                MAX_CANDIDATES
            )));
        }
        Ok(source)
    }

    fn pair_at(&self, offset: u64) -> Credential {
        if self.paired {
            let i = offset as usize;
            Credential::new(&self.users[i], &self.passwords[i], Provenance::Dictionary)
        } else {
            let per_user = self.passwords.len() as u64;
            let user = &self.users[(offset / per_user) as usize];
            let pass = &self.passwords[(offset % per_user) as usize];
            Credential::new(user, pass, Provenance::Dictionary)
        }
    }
}

impl CredentialSource for DictionarySource {
    fn next_pair(&mut self) -> Option<Credential> {
        if self.cursor >= self.total() {
            return None;
        }
        let pair = self.pair_at(self.cursor);
        self.cursor += 1;
        Some(pair)
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn seek(&mut self, offset: u64) -> EngineResult<()> {
        if offset > self.total() {
            return Err(EngineError::input(format!(
                "seek offset {} past end of source ({})",
                offset,
                self.total()
            )));
        }
        self.cursor = offset;
        Ok(())
    }

    fn total(&self) -> u64 {
        if self.paired {
            self.users.len().min(self.passwords.len()) as u64
        } else {
            (self.users.len() as u64) * (self.passwords.len() as u64)
        }
    }

    fn describe(&self) -> String {
        format!(
            "dictionary: {} users x {} passwords ({})",
            self.users.len(),
            self.passwords.len(),
            if self.paired { "paired" } else { "cross product" }
        )
    }
}

/// Length and alphabet bounds for brute-force enumeration.
#[derive(Debug, Clone)]
pub struct BruteForceOptions {
    pub charset: Vec<char>,
    pub min_length: u32,
    pub max_length: u32,
}

impl Default for BruteForceOptions {
    fn default() -> Self {
        Self {
            charset: "abcdefghijklmnopqrstuvwxyz0123456789".chars().collect(),
            min_length: 1,
            max_length: 4,
        }
    }
}

/// Brute-force mode: enumerate every charset string from `min_length`
/// to `max_length` as the password for each username.
///
/// Candidates are decoded from the cursor on demand, so nothing is
/// materialized and seeking is O(1).
#[derive(Debug)]
pub struct BruteForceSource {
    users: Vec<String>,
    options: BruteForceOptions,
    passwords_per_user: u64,
    cursor: u64,
}

impl BruteForceSource {
    pub fn new(users: Vec<String>, options: BruteForceOptions) -> EngineResult<Self> {
        if users.is_empty() {
            return Err(EngineError::exhausted("user list is empty"));
        }
        if options.charset.is_empty() {
            return Err(EngineError::config("charset", "must not be empty"));
        }
        if options.min_length == 0 || options.min_length > options.max_length {
            return Err(EngineError::config(
                "length bounds",
                format!(
                    "invalid range {}..={}",
                    options.min_length, options.max_length
                ),
            ));
        }

        let base = options.charset.len() as u64;
        let mut passwords_per_user: u64 = 0;
        for len in options.min_length..=options.max_length {
            let count = base
                .checked_pow(len)
                .ok_or_else(|| EngineError::config("max_length", "keyspace overflow"))?;
            passwords_per_user = passwords_per_user
                .checked_add(count)
                .ok_or_else(|| EngineError::config("max_length", "keyspace overflow"))?;
        }

        let total = passwords_per_user.saturating_mul(users.len() as u64);
        if total > MAX_CANDIDATES {
            return Err(EngineError::input(format!(
                "brute force would generate {} candidates (limit {})",
                total, MAX_CANDIDATES
            )));
        }

        debug!(keyspace = total, "brute force keyspace computed");
        Ok(Self {
            users,
            options,
            passwords_per_user,
            cursor: 0,
        })
    }

    /// Decode password index `index` within one user's keyspace: all
    /// strings of min_length first, then min_length+1, and so on.
    fn password_at(&self, mut index: u64) -> String {
        let base = self.options.charset.len() as u64;
        let mut length = self.options.min_length;
        loop {
            let count = base.pow(length);
            if index < count {
                break;
            }
            index -= count;
            length += 1;
        }

        let mut chars = vec![self.options.charset[0]; length as usize];
        for slot in chars.iter_mut().rev() {
            *slot = self.options.charset[(index % base) as usize];
            index /= base;
        }
        chars.into_iter().collect()
    }
}

impl CredentialSource for BruteForceSource {
    fn next_pair(&mut self) -> Option<Credential> {
        if self.cursor >= self.total() {
            return None;
        }
        let user = &self.users[(self.cursor / self.passwords_per_user) as usize];
        let password = self.password_at(self.cursor % self.passwords_per_user);
        let pair = Credential::new(user, password, Provenance::BruteForce);
        self.cursor += 1;
        Some(pair)
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn seek(&mut self, offset: u64) -> EngineResult<()> {
        if offset > self.total() {
            return Err(EngineError::input(format!(
                "seek offset {} past end of source ({})",
                offset,
                self.total()
            )));
        }
        self.cursor = offset;
        Ok(())
    }

    fn total(&self) -> u64 {
        self.passwords_per_user * self.users.len() as u64
    }

    fn describe(&self) -> String {
        format!(
            "brute-force: {} users, charset {} chars, length {}..={}",
            self.users.len(),
            self.options.charset.len(),
            self.options.min_length,
            self.options.max_length
        )
    }
}

/// Hybrid mode: every dictionary password expanded with its mutation
/// variants, crossed with each username.
pub struct HybridSource {
    inner: DictionarySource,
}

impl HybridSource {
    pub fn new(users: Vec<String>, base_passwords: Vec<String>) -> EngineResult<Self> {
        if base_passwords.is_empty() {
            return Err(EngineError::exhausted("password list is empty"));
        }
        let mut expanded = Vec::new();
        for word in &base_passwords {
            expanded.extend(wordlist::mutations_for(word));
        }
        debug!(
            base = base_passwords.len(),
            expanded = expanded.len(),
            "expanded hybrid password list"
        );
        Ok(Self {
            inner: DictionarySource::build(users, expanded, false)?,
        })
    }
}

impl CredentialSource for HybridSource {
    fn next_pair(&mut self) -> Option<Credential> {
        self.inner.next_pair().map(|mut pair| {
            pair.provenance = Provenance::Mutation;
            pair
        })
    }

    fn position(&self) -> u64 {
        self.inner.position()
    }

    fn seek(&mut self, offset: u64) -> EngineResult<()> {
        self.inner.seek(offset)
    }

    fn total(&self) -> u64 {
        self.inner.total()
    }

    fn describe(&self) -> String {
        format!("hybrid: {}", self.inner.describe())
    }
}

/// Credential-stuffing mode: pre-paired breach-list entries, attempted
/// in file order.
pub struct StuffingSource {
    pairs: Vec<(String, String)>,
    cursor: u64,
}

impl StuffingSource {
    pub fn new(pairs: Vec<(String, String)>) -> EngineResult<Self> {
        if pairs.is_empty() {
            return Err(EngineError::exhausted("stuffing list is empty"));
        }
        Ok(Self { pairs, cursor: 0 })
    }

    pub fn from_file(path: PathBuf) -> EngineResult<Self> {
        Self::new(wordlist::load_pairs(&path)?)
    }
}

impl CredentialSource for StuffingSource {
    fn next_pair(&mut self) -> Option<Credential> {
        let (user, pass) = self.pairs.get(self.cursor as usize)?;
        let pair = Credential::new(user, pass, Provenance::Stuffing);
        self.cursor += 1;
        Some(pair)
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn seek(&mut self, offset: u64) -> EngineResult<()> {
        if offset > self.total() {
            return Err(EngineError::input(format!(
                "seek offset {} past end of source ({})",
                offset,
                self.total()
            )));
        }
        self.cursor = offset;
        Ok(())
    }

    fn total(&self) -> u64 {
        self.pairs.len() as u64
    }

    fn describe(&self) -> String {
        format!("stuffing: {} paired entries", self.pairs.len())
    }
}

/// Build the source matching an attack mode from already-loaded inputs.
pub fn source_for_mode(
    mode: &AttackMode,
    users: Vec<String>,
    passwords: Vec<String>,
    brute_force: BruteForceOptions,
) -> EngineResult<Box<dyn CredentialSource>> {
    match mode {
        AttackMode::Dictionary => Ok(Box::new(DictionarySource::new(users, passwords)?)),
        AttackMode::BruteForce => Ok(Box::new(BruteForceSource::new(users, brute_force)?)),
        AttackMode::Hybrid => Ok(Box::new(HybridSource::new(users, passwords)?)),
        AttackMode::Stuffing => {
            let pairs = users
                .into_iter()
                .zip(passwords)
                .collect::<Vec<(String, String)>>();
            Ok(Box::new(StuffingSource::new(pairs)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> Vec<String> {
        vec!["admin".to_string(), "guest".to_string()]
    }

    fn passwords() -> Vec<String> {
        vec!["123".to_string(), "456".to_string(), "789".to_string()]
    }

    #[test]
    fn test_dictionary_cross_product_order() {
        let mut source = DictionarySource::new(users(), passwords()).unwrap();
        assert_eq!(source.total(), 6);

        let pairs: Vec<String> = std::iter::from_fn(|| source.next_pair())
            .map(|c| c.to_string())
            .collect();
        assert_eq!(
            pairs,
            vec![
                "admin:123",
                "admin:456",
                "admin:789",
                "guest:123",
                "guest:456",
                "guest:789"
            ]
        );
        assert!(source.next_pair().is_none());
    }

    #[test]
    fn test_dictionary_paired_stops_at_shorter_list() {
        let mut source = DictionarySource::paired(users(), passwords()).unwrap();
        assert_eq!(source.total(), 2);

        assert_eq!(source.next_pair().unwrap().to_string(), "admin:123");
        assert_eq!(source.next_pair().unwrap().to_string(), "guest:456");
        assert!(source.next_pair().is_none());
    }

    #[test]
    fn test_seek_resumes_deterministically() {
        let mut first = DictionarySource::new(users(), passwords()).unwrap();
        let all: Vec<Credential> = std::iter::from_fn(|| first.next_pair()).collect();

        let mut resumed = DictionarySource::new(users(), passwords()).unwrap();
        resumed.seek(4).unwrap();
        assert_eq!(resumed.position(), 4);
        assert_eq!(resumed.next_pair().unwrap(), all[4]);
        assert_eq!(resumed.next_pair().unwrap(), all[5]);
        assert!(resumed.next_pair().is_none());
    }

    #[test]
    fn test_seek_past_end_is_rejected() {
        let mut source = DictionarySource::new(users(), passwords()).unwrap();
        assert!(source.seek(7).is_err());
        assert!(source.seek(6).is_ok());
        assert!(source.next_pair().is_none());
    }

    #[test]
    fn test_empty_wordlist_is_exhausted_input() {
        let err = DictionarySource::new(vec![], passwords()).unwrap_err();
        assert!(matches!(err, EngineError::ExhaustedInput { .. }));
        let err = DictionarySource::new(users(), vec![]).unwrap_err();
        assert!(matches!(err, EngineError::ExhaustedInput { .. }));
    }

    #[test]
    fn test_brute_force_enumeration_order() {
        let options = BruteForceOptions {
            charset: vec!['a', 'b'],
            min_length: 1,
            max_length: 2,
        };
        let mut source = BruteForceSource::new(vec!["root".to_string()], options).unwrap();
        assert_eq!(source.total(), 6);

        let passwords: Vec<String> = std::iter::from_fn(|| source.next_pair())
            .map(|c| c.password)
            .collect();
        assert_eq!(passwords, vec!["a", "b", "aa", "ab", "ba", "bb"]);
    }

    #[test]
    fn test_brute_force_seek_matches_sequential() {
        let options = BruteForceOptions {
            charset: "abc".chars().collect(),
            min_length: 1,
            max_length: 3,
        };
        let mut sequential =
            BruteForceSource::new(vec!["root".to_string()], options.clone()).unwrap();
        let all: Vec<Credential> = std::iter::from_fn(|| sequential.next_pair()).collect();

        let mut seeked = BruteForceSource::new(vec!["root".to_string()], options).unwrap();
        for offset in [0u64, 3, 12, 38] {
            seeked.seek(offset).unwrap();
            assert_eq!(seeked.next_pair().unwrap(), all[offset as usize]);
        }
    }

    #[test]
    fn test_brute_force_keyspace_limit() {
        let options = BruteForceOptions {
            charset: "abcdefghijklmnopqrstuvwxyz".chars().collect(),
            min_length: 1,
            max_length: 8,
        };
        let err = BruteForceSource::new(vec!["root".to_string()], options).unwrap_err();
        assert!(matches!(err, EngineError::Input { .. }));
    }

    #[test]
    fn test_brute_force_rejects_bad_length_range() {
        let options = BruteForceOptions {
            charset: vec!['a'],
            min_length: 3,
            max_length: 2,
        };
        let err = BruteForceSource::new(vec!["root".to_string()], options).unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }

    #[test]
    fn test_hybrid_marks_mutation_provenance() {
        let mut source =
            HybridSource::new(vec!["admin".to_string()], vec!["winter".to_string()]).unwrap();
        let first = source.next_pair().unwrap();
        assert_eq!(first.password, "winter");
        assert_eq!(first.provenance, Provenance::Mutation);
        assert!(source.total() > 1);
    }

    #[test]
    fn test_stuffing_preserves_file_order() {
        let mut source = StuffingSource::new(vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ])
        .unwrap();
        assert_eq!(source.next_pair().unwrap().to_string(), "a:1");
        assert_eq!(source.next_pair().unwrap().to_string(), "b:2");
        assert!(source.next_pair().is_none());
    }

    #[test]
    fn test_source_factory_matches_mode() {
        let source =
            source_for_mode(&AttackMode::Dictionary, users(), passwords(), BruteForceOptions::default())
                .unwrap();
        assert_eq!(source.total(), 6);

        let source =
            source_for_mode(&AttackMode::Hybrid, users(), passwords(), BruteForceOptions::default())
                .unwrap();
        assert!(source.total() > 6);
    }
}
