//! The reconciliation state machine.
//!
//! A single pass runs: deletion branch, finalizer branch, suspension
//! check, digest skip, validate, decrypt, derive and apply, status
//! commit. Every step is idempotent; re-entering with the same spec and
//! the same existing Secret converges to the same derived state.
//!
//! Transient API errors are returned to the work queue (which applies
//! backoff). Validation and decryption failures are absorbed into status
//! and events with a periodic requeue, so a user's fix is picked up
//! within a bounded window without hot-looping on a broken payload.

use crate::constants::{FINALIZER, FINALIZER_REQUEUE_SECS};
use crate::controller::context::{Context, Error};
use crate::controller::events::reasons;
use crate::controller::secret::{build_secret, derived_secret_name, is_controlled_by};
use crate::controller::status::{failure_status, success_status, write_status};
use crate::controller::validation::validate_sops_secret;
use crate::crd::SopsSecret;
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use kube::api::{DeleteParams, Patch, PatchParams, PostParams};
use kube::{Api, Resource, ResourceExt};
use kube_runtime::controller::Action;
use kube_runtime::events::EventType;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Hex-encoded SHA-256 over the exact encrypted payload bytes.
pub fn payload_digest(encrypted_payload: &str) -> String {
    use sha2::{Digest, Sha256};
    hex::encode(Sha256::digest(encrypted_payload.as_bytes()))
}

/// True when the last successful reconciliation covered both the current
/// payload bytes and the current generation.
pub fn digest_up_to_date(sops_secret: &SopsSecret, digest: &str) -> bool {
    let Some(status) = sops_secret.status.as_ref() else {
        return false;
    };
    status.last_input_digest.as_deref() == Some(digest)
        && status.observed_generation.is_some()
        && status.observed_generation == sops_secret.metadata.generation
}

/// Main reconciliation entry point, driven by the controller for events
/// on SopsSecrets and on Secrets they own.
pub async fn reconcile(
    sops_secret: Arc<SopsSecret>,
    ctx: Arc<Context>,
) -> Result<Action, Error> {
    let start = Instant::now();
    let name = sops_secret.name_any();
    let namespace = sops_secret.namespace().ok_or(Error::MissingNamespace)?;

    info!(resource = %name, namespace = %namespace, "Reconciling SopsSecret");
    metrics::inc_reconciliations();

    let result = reconcile_inner(&sops_secret, &ctx, &namespace).await;
    metrics::observe_reconcile_duration(start.elapsed().as_secs_f64());

    if result.is_ok() {
        ctx.backoff.clear(&format!("{namespace}/{name}"));
    }
    result
}

async fn reconcile_inner(
    sops_secret: &SopsSecret,
    ctx: &Context,
    namespace: &str,
) -> Result<Action, Error> {
    let name = sops_secret.name_any();
    let secrets: Api<Secret> = Api::namespaced(ctx.client.clone(), namespace);

    // Deletion branch: clean up the derived Secret, then release the
    // finalizer so the API server can drop the object.
    if sops_secret.metadata.deletion_timestamp.is_some() {
        return reconcile_delete(sops_secret, ctx, &secrets).await;
    }

    // Finalizer branch: add ours and requeue shortly so the next pass
    // observes the updated object.
    if !sops_secret.finalizers().iter().any(|f| f == FINALIZER) {
        add_finalizer(sops_secret, ctx, namespace).await?;
        return Ok(Action::requeue(Duration::from_secs(FINALIZER_REQUEUE_SECS)));
    }

    if sops_secret.spec.suspend {
        info!(resource = %name, "SopsSecret is suspended, skipping reconciliation");
        return Ok(Action::await_change());
    }

    // Digest skip: nothing to decrypt when the payload and generation are
    // unchanged and the derived Secret is still present. A missing Secret
    // falls through to a full pass (self-heal).
    let digest = payload_digest(&sops_secret.spec.encrypted_payload);
    if digest_up_to_date(sops_secret, &digest) {
        let secret_name = derived_secret_name(sops_secret);
        if secrets.get_opt(&secret_name).await?.is_some() {
            return Ok(Action::requeue(ctx.requeue_interval));
        }
        info!(resource = %name, secret = %secret_name, "Derived Secret missing, re-creating");
    }

    // Validate user-controlled fields, then the envelope, before spawning
    // anything.
    if let Err(e) = validate_sops_secret(sops_secret) {
        warn!(resource = %name, "Spec validation failed: {e}");
        metrics::inc_validation_failures();
        ctx.events
            .publish(
                &sops_secret.object_ref(&()),
                EventType::Warning,
                reasons::VALIDATION_FAILED,
                Some(e.to_string()),
            )
            .await;
        let status = failure_status(sops_secret, reasons::VALIDATION_FAILED, &e.to_string());
        write_status(ctx, sops_secret, &status).await?;
        return Ok(Action::requeue(ctx.requeue_interval));
    }

    if let Err(e) = crate::sops::validate_encrypted_payload(
        sops_secret.spec.encrypted_payload.as_bytes(),
    ) {
        warn!(resource = %name, reason = e.reason(), "Payload validation failed: {e}");
        metrics::inc_validation_failures();
        ctx.events
            .publish(
                &sops_secret.object_ref(&()),
                EventType::Warning,
                reasons::VALIDATION_FAILED,
                Some(e.to_string()),
            )
            .await;
        let status = failure_status(sops_secret, reasons::VALIDATION_FAILED, &e.to_string());
        write_status(ctx, sops_secret, &status).await?;
        return Ok(Action::requeue(ctx.requeue_interval));
    }

    // Decrypt through the driver seam.
    metrics::inc_decrypt_attempts();
    let payload = match ctx
        .decryptor
        .decrypt(sops_secret.spec.encrypted_payload.as_bytes())
        .await
    {
        Ok(payload) => payload,
        Err(e) => {
            error!(resource = %name, reason = e.reason(), "Decryption failed: {e}");
            metrics::inc_decrypt_failures(e.reason());
            ctx.events
                .publish(
                    &sops_secret.object_ref(&()),
                    EventType::Warning,
                    reasons::DECRYPT_FAILED,
                    Some(e.to_string()),
                )
                .await;
            let status = failure_status(sops_secret, reasons::DECRYPT_FAILED, &e.to_string());
            write_status(ctx, sops_secret, &status).await?;
            return Ok(Action::requeue(ctx.requeue_interval));
        }
    };

    ctx.events
        .publish(
            &sops_secret.object_ref(&()),
            EventType::Normal,
            reasons::DECRYPTED,
            Some("Successfully decrypted encrypted payload".to_string()),
        )
        .await;

    // Derive and apply. Owner identity failures are fatal to the pass.
    let desired = build_secret(sops_secret, &payload)?;
    let secret_name = derived_secret_name(sops_secret);

    match secrets.get_opt(&secret_name).await? {
        None => {
            secrets.create(&PostParams::default(), &desired).await?;
            info!(resource = %name, secret = %secret_name, "Created Secret");
            metrics::inc_secrets_created();
            ctx.events
                .publish(
                    &sops_secret.object_ref(&()),
                    EventType::Normal,
                    reasons::SECRET_CREATED,
                    Some(format!("Created Secret {secret_name}")),
                )
                .await;
        }
        Some(mut existing) => {
            existing.data = desired.data.clone();
            existing.string_data = None;
            existing.metadata.labels = desired.metadata.labels.clone();
            existing.metadata.annotations = desired.metadata.annotations.clone();
            existing.metadata.owner_references = desired.metadata.owner_references.clone();
            existing.type_ = desired.type_.clone();

            secrets
                .replace(&secret_name, &PostParams::default(), &existing)
                .await?;
            info!(resource = %name, secret = %secret_name, "Updated Secret");
            metrics::inc_secrets_updated();
            ctx.events
                .publish(
                    &sops_secret.object_ref(&()),
                    EventType::Normal,
                    reasons::SECRET_UPDATED,
                    Some(format!("Updated Secret {secret_name}")),
                )
                .await;
        }
    }

    // Status commit. Periodic requeue keeps drift bounded even without
    // watch events.
    let status = success_status(sops_secret, &secret_name, &digest);
    write_status(ctx, sops_secret, &status).await?;
    Ok(Action::requeue(ctx.requeue_interval))
}

async fn reconcile_delete(
    sops_secret: &SopsSecret,
    ctx: &Context,
    secrets: &Api<Secret>,
) -> Result<Action, Error> {
    let name = sops_secret.name_any();

    if sops_secret.finalizers().iter().any(|f| f == FINALIZER) {
        let secret_name = derived_secret_name(sops_secret);

        if let Some(secret) = secrets.get_opt(&secret_name).await? {
            // Only delete what we control; an unowned Secret of the same
            // name is left alone.
            if is_controlled_by(&secret, sops_secret) {
                match secrets.delete(&secret_name, &DeleteParams::default()).await {
                    Ok(_) => {}
                    Err(kube::Error::Api(ae)) if ae.code == 404 => {}
                    Err(e) => return Err(e.into()),
                }
                info!(resource = %name, secret = %secret_name, "Deleted managed Secret");
                metrics::inc_secrets_deleted();
                ctx.events
                    .publish(
                        &sops_secret.object_ref(&()),
                        EventType::Normal,
                        reasons::SECRET_DELETED,
                        Some(format!("Deleted Secret {secret_name}")),
                    )
                    .await;
            }
        }

        remove_finalizer(sops_secret, ctx).await?;
    }

    Ok(Action::await_change())
}

async fn add_finalizer(
    sops_secret: &SopsSecret,
    ctx: &Context,
    namespace: &str,
) -> Result<(), Error> {
    let api: Api<SopsSecret> = Api::namespaced(ctx.client.clone(), namespace);
    let mut finalizers = sops_secret.finalizers().to_vec();
    finalizers.push(FINALIZER.to_string());

    let patch = serde_json::json!({ "metadata": { "finalizers": finalizers } });
    api.patch(
        &sops_secret.name_any(),
        &PatchParams::default(),
        &Patch::Merge(patch),
    )
    .await?;
    Ok(())
}

async fn remove_finalizer(sops_secret: &SopsSecret, ctx: &Context) -> Result<(), Error> {
    let namespace = sops_secret.namespace().ok_or(Error::MissingNamespace)?;
    let api: Api<SopsSecret> = Api::namespaced(ctx.client.clone(), &namespace);
    let finalizers: Vec<String> = sops_secret
        .finalizers()
        .iter()
        .filter(|f| *f != FINALIZER)
        .cloned()
        .collect();

    let patch = serde_json::json!({ "metadata": { "finalizers": finalizers } });
    api.patch(
        &sops_secret.name_any(),
        &PatchParams::default(),
        &Patch::Merge(patch),
    )
    .await?;
    Ok(())
}

/// Error policy for the controller: log, count, requeue with per-key
/// progressive backoff. Counts reset on the next pass that completes
/// without an error.
pub fn error_policy(sops_secret: Arc<SopsSecret>, error: &Error, ctx: Arc<Context>) -> Action {
    let key = format!(
        "{}/{}",
        sops_secret.namespace().as_deref().unwrap_or("default"),
        sops_secret.name_any()
    );
    let backoff = ctx.backoff.record_error(&key);
    warn!(
        resource = %key,
        error = %error,
        backoff_secs = backoff.as_secs(),
        "Reconciliation error, will retry"
    );
    metrics::inc_reconciliation_errors();
    Action::requeue(backoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{SopsSecretSpec, SopsSecretStatus};
    use std::collections::BTreeMap;

    fn sops_secret(payload: &str) -> SopsSecret {
        let mut resource = SopsSecret::new(
            "app",
            SopsSecretSpec {
                encrypted_payload: payload.to_string(),
                secret_name: None,
                secret_type: "Opaque".to_string(),
                labels: BTreeMap::new(),
                annotations: BTreeMap::new(),
                suspend: false,
            },
        );
        resource.metadata.namespace = Some("default".to_string());
        resource.metadata.generation = Some(1);
        resource
    }

    #[test]
    fn digest_is_sha256_hex_of_exact_bytes() {
        // sha256("") and sha256("abc") are fixed vectors.
        assert_eq!(
            payload_digest(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            payload_digest("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn digest_is_stable_across_passes() {
        let payload = "username: ENC[...]\nsops:\n  mac: m\n";
        assert_eq!(payload_digest(payload), payload_digest(payload));
    }

    #[test]
    fn up_to_date_requires_digest_and_generation() {
        let payload = "a: b\n";
        let digest = payload_digest(payload);
        let mut resource = sops_secret(payload);

        // No status at all.
        assert!(!digest_up_to_date(&resource, &digest));

        // Matching digest, stale generation.
        resource.status = Some(SopsSecretStatus {
            last_input_digest: Some(digest.clone()),
            observed_generation: Some(0),
            ..SopsSecretStatus::default()
        });
        assert!(!digest_up_to_date(&resource, &digest));

        // Matching digest and generation.
        resource.status.as_mut().unwrap().observed_generation = Some(1);
        assert!(digest_up_to_date(&resource, &digest));

        // Changed payload invalidates.
        assert!(!digest_up_to_date(&resource, &payload_digest("a: c\n")));
    }
}
