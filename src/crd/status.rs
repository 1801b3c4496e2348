//! Status types for the SopsSecret resource.
//!
//! Conditions follow the Kubernetes convention: at most one entry per
//! condition type, with the transition timestamp only moving when the
//! status value actually changes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition type set once the encrypted payload decrypts successfully.
pub const CONDITION_DECRYPTED: &str = "Decrypted";

/// Condition type set once the derived Secret is created/updated and the
/// status is committed.
pub const CONDITION_READY: &str = "Ready";

pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";
pub const CONDITION_STATUS_UNKNOWN: &str = "Unknown";

/// Observed state of a SopsSecret.
#[derive(Debug, Clone, Deserialize, Serialize, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SopsSecretStatus {
    /// Name of the derived Kubernetes Secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derived_secret_name: Option<String>,

    /// Hex-encoded SHA-256 of the encrypted payload bytes that were last
    /// successfully reconciled. Used to skip redundant decryptions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_input_digest: Option<String>,

    /// RFC3339 timestamp of the last successful decryption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_decrypted_time: Option<String>,

    /// Generation observed by the last successful reconciliation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Latest available observations, keyed by condition type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

/// A single status condition.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition (`Ready`, `Decrypted`).
    pub r#type: String,
    /// Status of condition (`True`, `False`, `Unknown`).
    pub status: String,
    /// Machine-readable reason code for the last transition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable message. Never contains decrypted material.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Generation the condition was computed against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// RFC3339 timestamp of the last status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// Insert or replace the condition of `new.type`, keeping at most one entry
/// per type. The transition time is preserved when the status value is
/// unchanged, so `lastTransitionTime` reflects actual state flips.
pub fn set_condition(conditions: &mut Vec<Condition>, mut new: Condition) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == new.r#type) {
        if existing.status == new.status {
            new.last_transition_time = existing.last_transition_time.clone();
        }
        *existing = new;
    } else {
        conditions.push(new);
    }
}
