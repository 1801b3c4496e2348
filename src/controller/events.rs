//! Kubernetes Event recording.
//!
//! A thin trait over `kube_runtime::events::Recorder` so the reconciler
//! can emit standard Events visible via `kubectl describe`, while tests
//! run against a no-op implementation.
//!
//! Events are fire-and-forget: failures are logged as warnings and never
//! propagate. A failed event must never break reconciliation. Messages
//! carry names and reason codes only, never decrypted material.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ObjectReference;
use kube_runtime::events::{Event, EventType, Recorder, Reporter};
use tracing::warn;

/// Well-known event reason strings, as they appear in the REASON column
/// of `kubectl get events`.
pub mod reasons {
    /// Encrypted payload decrypted successfully
    pub const DECRYPTED: &str = "Decrypted";
    /// The sops subprocess or output parsing failed
    pub const DECRYPT_FAILED: &str = "DecryptFailed";
    /// Derived Secret created
    pub const SECRET_CREATED: &str = "SecretCreated";
    /// Derived Secret updated in place
    pub const SECRET_UPDATED: &str = "SecretUpdated";
    /// Derived Secret deleted during finalization
    pub const SECRET_DELETED: &str = "SecretDeleted";
    /// Payload failed structural validation
    pub const VALIDATION_FAILED: &str = "ValidationFailed";
}

/// Trait for publishing Kubernetes Events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an Event on the given resource. Never returns an error.
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        note: Option<String>,
    );
}

/// Production implementation wrapping `kube_runtime::events::Recorder`.
pub struct KubeEventPublisher {
    recorder: Recorder,
}

impl KubeEventPublisher {
    /// The controller name appears as the reporting component on Events.
    pub fn new(client: kube::Client, controller_name: &str) -> Self {
        let reporter = Reporter {
            controller: controller_name.to_string(),
            instance: None,
        };
        Self {
            recorder: Recorder::new(client, reporter),
        }
    }
}

#[async_trait]
impl EventPublisher for KubeEventPublisher {
    async fn publish(
        &self,
        resource_ref: &ObjectReference,
        type_: EventType,
        reason: &str,
        note: Option<String>,
    ) {
        let event = Event {
            type_,
            reason: reason.to_string(),
            note,
            action: "Reconcile".to_string(),
            secondary: None,
        };
        if let Err(e) = self.recorder.publish(&event, resource_ref).await {
            warn!(reason, error = %e, "Failed to publish Kubernetes event");
        }
    }
}

/// No-op implementation for tests. No API interaction.
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        _type_: EventType,
        _reason: &str,
        _note: Option<String>,
    ) {
    }
}
