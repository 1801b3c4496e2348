//! Typed errors for key loading, validation, and decryption.
//!
//! Every variant maps to a fixed reason code. The codes end up as metric
//! labels and condition messages, so they are stable strings rather than
//! Display output.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors constructing the key set at startup. Both are fatal: the process
/// exits non-zero with the diagnostic.
#[derive(Debug, Error)]
pub enum KeyLoadError {
    #[error("no AGE keys found in SOPS_AGE_KEY or SOPS_AGE_KEY_FILE")]
    MissingKey,

    #[error("failed to read AGE key file {path}: {source}")]
    KeyFileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl KeyLoadError {
    pub fn reason(&self) -> &'static str {
        match self {
            KeyLoadError::MissingKey => "missing-key",
            KeyLoadError::KeyFileUnreadable { .. } => "key-file-unreadable",
        }
    }
}

/// Structural validation failures for a candidate encrypted payload.
///
/// Checked before any subprocess is spawned; rejects everything that does
/// not carry a top-level `sops` mapping with a non-empty `mac`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("encrypted payload is empty")]
    Empty,

    #[error("encrypted payload is not valid YAML: {0}")]
    InvalidYaml(String),

    #[error("encrypted payload root is not a mapping")]
    NotAMapping,

    #[error("missing sops metadata block")]
    MissingSopsMetadata,

    #[error("sops metadata block is not a mapping")]
    InvalidSopsMetadata,

    #[error("missing MAC in sops metadata")]
    MissingMac,
}

impl ValidationError {
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::Empty => "empty-payload",
            ValidationError::InvalidYaml(_) => "invalid-yaml",
            ValidationError::NotAMapping => "not-a-mapping",
            ValidationError::MissingSopsMetadata => "missing-sops-metadata",
            ValidationError::InvalidSopsMetadata => "invalid-sops-metadata",
            ValidationError::MissingMac => "missing-mac",
        }
    }
}

/// Failures driving the sops subprocess or parsing its output.
///
/// `Timeout` is the driver's own deadline firing; `Canceled` is the child
/// dying to an external signal before producing an exit code. Stderr in
/// `CommandFailed` is already bounded; stdout (the plaintext) never enters
/// an error value.
#[derive(Debug, Error)]
pub enum DecryptError {
    #[error("sops binary not found on PATH")]
    BinaryMissing,

    #[error("sops decrypt timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("sops decrypt was canceled")]
    Canceled,

    #[error("sops exited with code {code:?}: {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("i/o error driving sops: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse decrypted output: {0}")]
    ParseFailed(String),

    #[error("decrypted output root is not a mapping")]
    UnexpectedShape,
}

impl DecryptError {
    pub fn reason(&self) -> &'static str {
        match self {
            DecryptError::BinaryMissing => "binary-missing",
            DecryptError::Timeout { .. } => "timeout",
            DecryptError::Canceled => "canceled",
            DecryptError::CommandFailed { .. } => "subprocess-failed",
            DecryptError::Io(_) => "io",
            DecryptError::ParseFailed(_) => "parse-failed",
            DecryptError::UnexpectedShape => "unexpected-shape",
        }
    }
}
