//! Subprocess-based SOPS decryption.
//!
//! The driver serializes the encrypted payload to a unique temp file,
//! invokes `sops -d <path>` with the AGE key environment, bounds the
//! subprocess with a timeout, and parses the decrypted YAML into typed
//! key/value pairs. The temp file is removed on every exit path (drop),
//! and plaintext never reaches disk, logs, or error values.
//!
//! Safe for concurrent use: each call owns its temp file and child
//! process; the key material is read-only.

use crate::constants::{DEFAULT_DECRYPT_TIMEOUT_SECS, MAX_STDERR_BYTES, SOPS_BINARY};
use crate::observability::metrics;
use crate::sops::error::DecryptError;
use crate::sops::keys::AgeKeys;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::io::Write;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tracing::debug;

/// Decrypted secret material. Transient: built per reconciliation, never
/// persisted or logged.
///
/// Both views are derived from the same converted form of each value, so
/// `string_data[k]` is always the UTF-8 reading of `data[k]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecryptedPayload {
    /// Key/value pairs as bytes, the form written into the Secret.
    pub data: BTreeMap<String, Vec<u8>>,
    /// The same pairs as strings, for callers that want text.
    pub string_data: BTreeMap<String, String>,
}

/// The decryption seam the reconciler is driven through. Implemented by
/// [`SopsDecryptor`] in production and by stubs in tests.
#[async_trait]
pub trait Decrypt: Send + Sync {
    /// Decrypt and parse into typed key/value pairs.
    async fn decrypt(&self, encrypted: &[u8]) -> Result<DecryptedPayload, DecryptError>;

    /// Decrypt and return the raw plaintext bytes.
    async fn decrypt_raw(&self, encrypted: &[u8]) -> Result<Vec<u8>, DecryptError>;
}

/// Drives the external `sops` binary.
#[derive(Debug, Clone)]
pub struct SopsDecryptor {
    keys: AgeKeys,
    timeout: Duration,
}

impl SopsDecryptor {
    pub fn new(keys: AgeKeys) -> Self {
        Self {
            keys,
            timeout: Duration::from_secs(DEFAULT_DECRYPT_TIMEOUT_SECS),
        }
    }

    /// Override the per-invocation subprocess deadline. A caller with a
    /// shorter deadline composes it by wrapping the returned future.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run_sops(&self, encrypted: &[u8]) -> Result<Vec<u8>, DecryptError> {
        let start = Instant::now();
        let sops = which::which(SOPS_BINARY).map_err(|_| DecryptError::BinaryMissing)?;

        // Unique per-invocation file, 0600 on unix, removed on drop on
        // every exit path below.
        let mut tmp = tempfile::Builder::new()
            .prefix("sops-")
            .suffix(".yaml")
            .tempfile()?;
        tmp.write_all(encrypted)?;
        tmp.flush()?;

        debug!(
            path = %tmp.path().display(),
            timeout_secs = self.timeout.as_secs(),
            "invoking sops -d"
        );

        let mut cmd = tokio::process::Command::new(sops);
        cmd.arg("-d")
            .arg(tmp.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future (caller cancellation or our timeout)
            // must not leak the child.
            .kill_on_drop(true);
        for (key, value) in self.keys.env_vars() {
            cmd.env(key, value);
        }

        let child = cmd.spawn()?;
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(DecryptError::Timeout {
                    after: self.timeout,
                })
            }
        };

        metrics::observe_decrypt_duration(start.elapsed().as_secs_f64());

        if output.status.success() {
            return Ok(output.stdout);
        }

        // No exit code means the child died to a signal: an external
        // cancellation rather than a sops failure.
        let Some(code) = output.status.code() else {
            return Err(DecryptError::Canceled);
        };

        // sops stderr carries key/diagnostic messages, never payload, but
        // it is still bounded before leaving the driver.
        let stderr = truncate_stderr(&output.stderr);
        Err(DecryptError::CommandFailed {
            code: Some(code),
            stderr,
        })
    }
}

#[async_trait]
impl Decrypt for SopsDecryptor {
    async fn decrypt(&self, encrypted: &[u8]) -> Result<DecryptedPayload, DecryptError> {
        let plaintext = self.run_sops(encrypted).await?;
        parse_decrypted_yaml(&plaintext)
    }

    async fn decrypt_raw(&self, encrypted: &[u8]) -> Result<Vec<u8>, DecryptError> {
        self.run_sops(encrypted).await
    }
}

fn truncate_stderr(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    if text.len() > MAX_STDERR_BYTES {
        let mut end = MAX_STDERR_BYTES;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &text[..end])
    } else {
        text.to_string()
    }
}

/// Parse decrypted YAML into a [`DecryptedPayload`].
///
/// The root must be a mapping. A top-level `sops` key is dropped (present
/// when the encrypted document carried its metadata inline). Values are
/// converted to a single canonical form:
///
/// - strings stay as-is
/// - integers become their decimal representation
/// - integral floats collapse to the integer form, others keep the
///   shortest round-trip decimal
/// - booleans become `true` / `false`
/// - nulls become the empty string
/// - mappings and sequences re-serialize to YAML, trailing newline
///   stripped
pub fn parse_decrypted_yaml(plaintext: &[u8]) -> Result<DecryptedPayload, DecryptError> {
    let root: serde_yaml::Value = serde_yaml::from_slice(plaintext)
        .map_err(|e| DecryptError::ParseFailed(e.to_string()))?;

    let serde_yaml::Value::Mapping(mapping) = root else {
        return Err(DecryptError::UnexpectedShape);
    };

    let mut payload = DecryptedPayload::default();
    for (key, value) in mapping {
        let serde_yaml::Value::String(key) = key else {
            // Non-string keys cannot name Secret entries.
            return Err(DecryptError::UnexpectedShape);
        };
        if key == "sops" {
            continue;
        }
        let text = convert_value(&value)?;
        payload.data.insert(key.clone(), text.clone().into_bytes());
        payload.string_data.insert(key, text);
    }

    Ok(payload)
}

fn convert_value(value: &serde_yaml::Value) -> Result<String, DecryptError> {
    match value {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        serde_yaml::Value::Bool(b) => Ok(if *b { "true" } else { "false" }.to_string()),
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Ok(u.to_string())
            } else {
                let f = n.as_f64().unwrap_or(0.0);
                if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Ok((f as i64).to_string())
                } else {
                    // Display for f64 is the shortest round-trip decimal.
                    Ok(f.to_string())
                }
            }
        }
        serde_yaml::Value::Mapping(_) | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Tagged(_) => {
            let yaml = serde_yaml::to_string(value)
                .map_err(|e| DecryptError::ParseFailed(e.to_string()))?;
            Ok(yaml.trim_end_matches('\n').to_string())
        }
    }
}
