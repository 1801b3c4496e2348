//! Reconciler context and error type.

use crate::constants::DEFAULT_REQUEUE_INTERVAL_SECS;
use crate::controller::backoff::BackoffTracker;
use crate::controller::events::EventPublisher;
use crate::sops::Decrypt;
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors a reconciliation pass returns to the work queue.
///
/// Validation and decryption failures never appear here: those are
/// absorbed into status and events with a periodic requeue. What remains
/// is API infrastructure trouble (retried with backoff by the queue) and
/// the fatal owner-identity case.
#[derive(Debug, Error)]
pub enum Error {
    #[error("kubernetes api error: {0}")]
    KubeApi(#[from] kube::Error),

    #[error("failed to serialize status patch: {0}")]
    StatusSerialization(#[from] serde_json::Error),

    #[error("object has no name or uid; cannot set controller owner reference")]
    OwnerIdentity,

    #[error("object has no namespace")]
    MissingNamespace,
}

/// Shared state handed to every reconciliation.
///
/// The decryptor and event publisher are trait objects so tests can stub
/// the subprocess and the API server away.
pub struct Context {
    pub client: Client,
    pub decryptor: Arc<dyn Decrypt>,
    pub events: Arc<dyn EventPublisher>,
    /// Periodic requeue after success and after absorbed failures.
    pub requeue_interval: Duration,
    /// Per-key consecutive error counts for the error policy.
    pub backoff: BackoffTracker,
}

impl Context {
    pub fn new(
        client: Client,
        decryptor: Arc<dyn Decrypt>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            client,
            decryptor,
            events,
            requeue_interval: Duration::from_secs(DEFAULT_REQUEUE_INTERVAL_SECS),
            backoff: BackoffTracker::default(),
        }
    }
}
