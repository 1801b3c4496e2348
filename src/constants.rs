//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Operator identity, used for the managed-by label and the event reporter.
pub const OPERATOR_NAME: &str = "sops-secrets-operator";

/// API group of the SopsSecret custom resource.
pub const API_GROUP: &str = "secrets.sops.io";

/// Finalizer placed on SopsSecret resources so the derived Secret is
/// cleaned up before the resource disappears from the API.
pub const FINALIZER: &str = "secrets.sops.io/finalizer";

/// Fixed label marking derived Secrets as operator-managed.
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Fixed label carrying the name of the owning SopsSecret.
pub const SOURCE_NAME_LABEL: &str = "secrets.sops.io/sopssecret";

/// Fixed annotation carrying `<namespace>/<name>` of the owning SopsSecret.
pub const SOURCE_ANNOTATION: &str = "secrets.sops.io/source";

/// Name of the external decryption binary looked up on PATH.
pub const SOPS_BINARY: &str = "sops";

/// Environment variable carrying inline AGE private keys (newline-separated).
pub const AGE_KEY_ENV: &str = "SOPS_AGE_KEY";

/// Environment variable pointing at a file of AGE private keys.
pub const AGE_KEY_FILE_ENV: &str = "SOPS_AGE_KEY_FILE";

/// Default timeout for a single sops decrypt invocation (seconds).
pub const DEFAULT_DECRYPT_TIMEOUT_SECS: u64 = 30;

/// Periodic requeue interval after a successful or absorbed reconciliation
/// (seconds). Drift is detected within this window even without watch events.
pub const DEFAULT_REQUEUE_INTERVAL_SECS: u64 = 300;

/// Short requeue after adding the finalizer so the next pass observes the
/// updated object (seconds).
pub const FINALIZER_REQUEUE_SECS: u64 = 1;

/// Default HTTP server port for health probes and metrics.
pub const DEFAULT_HEALTH_PORT: u16 = 8080;

/// Upper bound on sops stderr carried into errors, events, and conditions.
pub const MAX_STDERR_BYTES: usize = 500;
