//! The SopsSecret custom resource.
//!
//! A SopsSecret carries a SOPS-encrypted YAML document in its spec. The
//! operator decrypts it with the external `sops` binary and materializes a
//! native Kubernetes Secret in the same namespace, owned by the SopsSecret.
//!
//! # Example
//!
//! ```yaml
//! apiVersion: secrets.sops.io/v1alpha1
//! kind: SopsSecret
//! metadata:
//!   name: app-credentials
//!   namespace: default
//! spec:
//!   encryptedPayload: |
//!     username: ENC[AES256_GCM,data:...,type:str]
//!     password: ENC[AES256_GCM,data:...,type:str]
//!     sops:
//!       mac: ENC[AES256_GCM,data:...,type:str]
//!       version: 3.9.0
//!   secretName: app-credentials
//! ```

use crate::crd::status::SopsSecretStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Desired state of a SopsSecret.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "SopsSecret",
    group = "secrets.sops.io",
    version = "v1alpha1",
    namespaced,
    status = "SopsSecretStatus",
    printcolumn = r#"{"name":"Secret","type":"string","jsonPath":".status.derivedSecretName"}"#,
    printcolumn = r#"{"name":"Ready","type":"string","jsonPath":".status.conditions[?(@.type=='Ready')].status"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SopsSecretSpec {
    /// The SOPS-encrypted document, exactly as produced by `sops -e`.
    /// Must be a YAML mapping whose top-level `sops` block carries a MAC.
    /// The operator never mutates or interprets the encrypted values.
    pub encrypted_payload: String,

    /// Name of the Kubernetes Secret to create.
    /// Defaults to the SopsSecret name if not specified.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_name: Option<String>,

    /// Type of the Secret to create (e.g. `kubernetes.io/tls`).
    /// Defaults to `Opaque`.
    #[serde(default = "default_secret_type")]
    pub secret_type: String,

    /// Additional labels for the created Secret. Operator-managed label
    /// keys are reserved and cannot be overridden.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Additional annotations for the created Secret. Operator-managed
    /// annotation keys are reserved and cannot be overridden.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Suspend stops reconciliation for this resource when true.
    #[serde(default)]
    pub suspend: bool,
}

pub fn default_secret_type() -> String {
    "Opaque".to_string()
}
