//! Persistent store of acknowledged findings.
//!
//! A finding is identified by a content-stable key, so it stays suppressed
//! while unrelated lines around it move. File layout: one 64-char lowercase
//! hex SHA-256 digest per line, append-only.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

/// Default store location, relative to the working directory.
pub const DEFAULT_STORE_FILE: &str = ".migration-assistant-ignore";

/// Suppression key for a finding: hex SHA-256 of
/// `trim(path)::trim(line_text)::trim(rule_id)`.
pub fn compute_key(path: &str, line_text: &str, rule_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.trim().as_bytes());
    hasher.update(b"::");
    hasher.update(line_text.trim().as_bytes());
    hasher.update(b"::");
    hasher.update(rule_id.trim().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Keys loaded at open plus keys appended since. Appends go through a single
/// writer so concurrent callers never interleave partial records.
pub struct SuppressionStore {
    path: PathBuf,
    keys: RwLock<HashSet<String>>,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl SuppressionStore {
    /// Open the store at `path`. A missing file is an empty store; so is an
    /// unreadable one, with a warning.
    pub fn open(path: &Path) -> Self {
        let keys = match std::fs::read_to_string(path) {
            Ok(text) => text
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => HashSet::new(),
            Err(e) => {
                warn!(path = %path.display(), "ignoring unreadable suppression store: {e}");
                HashSet::new()
            }
        };
        debug!(path = %path.display(), keys = keys.len(), "suppression store opened");
        Self {
            path: path.to_path_buf(),
            keys: RwLock::new(keys),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.keys.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    /// Record `key`. Returns `false` without touching the file when the key
    /// is already present. The record is flushed before returning.
    pub fn append(&self, key: &str) -> io::Result<bool> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if self.contains(key) {
            return Ok(false);
        }
        if writer.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            *writer = Some(BufWriter::new(file));
        }
        if let Some(w) = writer.as_mut() {
            writeln!(w, "{key}")?;
            w.flush()?;
        }
        self.keys
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string());
        Ok(true)
    }
}
