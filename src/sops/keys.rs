//! AGE private key assembly.
//!
//! Keys come from two environment sources: `SOPS_AGE_KEY` (inline,
//! newline-separated) and `SOPS_AGE_KEY_FILE` (path to a key file). Both
//! may be set; their keys are concatenated in that order. Blank lines and
//! `#` comments are dropped.

use crate::constants::{AGE_KEY_ENV, AGE_KEY_FILE_ENV};
use crate::sops::error::KeyLoadError;
use std::path::{Path, PathBuf};

/// The decryption key material handed to the sops subprocess.
///
/// Read-only after construction; shared freely across workers.
#[derive(Debug, Clone)]
pub struct AgeKeys {
    keys: Vec<String>,
    key_file: Option<PathBuf>,
}

impl AgeKeys {
    /// Load keys from the process environment. Fails with `MissingKey`
    /// when neither source yields a usable key, which aborts startup.
    pub fn from_env() -> Result<Self, KeyLoadError> {
        let inline = std::env::var(AGE_KEY_ENV).ok();
        let file = std::env::var(AGE_KEY_FILE_ENV).ok().map(PathBuf::from);
        Self::from_sources(inline.as_deref(), file.as_deref())
    }

    /// Assemble keys from explicit sources. This is the testable core of
    /// `from_env`.
    pub fn from_sources(
        inline: Option<&str>,
        key_file: Option<&Path>,
    ) -> Result<Self, KeyLoadError> {
        let mut raw = Vec::new();

        if let Some(inline) = inline {
            raw.extend(inline.lines().map(str::to_string));
        }

        if let Some(path) = key_file {
            let contents =
                std::fs::read_to_string(path).map_err(|source| KeyLoadError::KeyFileUnreadable {
                    path: path.to_path_buf(),
                    source,
                })?;
            raw.extend(contents.lines().map(str::to_string));
        }

        let mut keys: Vec<String> = Vec::new();
        for line in &raw {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            // Dedup preserving first-seen order; the same key supplied both
            // inline and via file must not be forwarded twice.
            if !keys.iter().any(|k| k == line) {
                keys.push(line.to_string());
            }
        }

        if keys.is_empty() {
            return Err(KeyLoadError::MissingKey);
        }

        Ok(Self {
            keys,
            key_file: key_file.map(Path::to_path_buf),
        })
    }

    /// Number of usable keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The environment variables forwarded to the sops subprocess: the
    /// filtered keys re-joined inline, plus the original file path when
    /// one was configured.
    pub fn env_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = vec![(AGE_KEY_ENV, self.keys.join("\n"))];
        if let Some(path) = &self.key_file {
            vars.push((AGE_KEY_FILE_ENV, path.display().to_string()));
        }
        vars
    }
}
