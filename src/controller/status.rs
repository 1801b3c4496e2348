//! Status construction and writes.
//!
//! Status is always written through the status subresource so it never
//! conflicts with user edits to the spec. The full status object is built
//! here and merge-patched in one call.

use crate::constants::OPERATOR_NAME;
use crate::controller::context::{Context, Error};
use crate::crd::{
    set_condition, Condition, SopsSecret, SopsSecretStatus, CONDITION_DECRYPTED,
    CONDITION_READY, CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE,
};
use kube::api::{Patch, PatchParams};
use kube::{Api, ResourceExt};

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn condition(
    sops_secret: &SopsSecret,
    ctype: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: ctype.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        observed_generation: sops_secret.metadata.generation,
        last_transition_time: Some(now_rfc3339()),
    }
}

/// Current status with both `Decrypted` and `Ready` set False under the
/// given reason. Used for validation and decryption failures, which are
/// absorbed rather than retried immediately.
pub fn failure_status(sops_secret: &SopsSecret, reason: &str, message: &str) -> SopsSecretStatus {
    let mut status = sops_secret.status.clone().unwrap_or_default();
    set_condition(
        &mut status.conditions,
        condition(
            sops_secret,
            CONDITION_DECRYPTED,
            CONDITION_STATUS_FALSE,
            reason,
            message,
        ),
    );
    set_condition(
        &mut status.conditions,
        condition(
            sops_secret,
            CONDITION_READY,
            CONDITION_STATUS_FALSE,
            reason,
            message,
        ),
    );
    status
}

/// Status after a fully successful pass: digest, timestamp, observed
/// generation, and both conditions True.
pub fn success_status(
    sops_secret: &SopsSecret,
    secret_name: &str,
    digest: &str,
) -> SopsSecretStatus {
    let mut status = sops_secret.status.clone().unwrap_or_default();
    status.derived_secret_name = Some(secret_name.to_string());
    status.last_input_digest = Some(digest.to_string());
    status.last_decrypted_time = Some(now_rfc3339());
    status.observed_generation = sops_secret.metadata.generation;

    set_condition(
        &mut status.conditions,
        condition(
            sops_secret,
            CONDITION_DECRYPTED,
            CONDITION_STATUS_TRUE,
            "Success",
            "Successfully decrypted encrypted payload",
        ),
    );
    set_condition(
        &mut status.conditions,
        condition(
            sops_secret,
            CONDITION_READY,
            CONDITION_STATUS_TRUE,
            "Success",
            &format!("Secret {secret_name} is up to date"),
        ),
    );
    status
}

/// Merge-patch the status subresource with a fully built status.
pub async fn write_status(
    ctx: &Context,
    sops_secret: &SopsSecret,
    status: &SopsSecretStatus,
) -> Result<(), Error> {
    let api: Api<SopsSecret> = Api::namespaced(
        ctx.client.clone(),
        sops_secret.namespace().as_deref().unwrap_or("default"),
    );

    let patch = serde_json::json!({ "status": status });
    api.patch_status(
        &sops_secret.name_any(),
        &PatchParams::apply(OPERATOR_NAME),
        &Patch::Merge(patch),
    )
    .await?;

    Ok(())
}
