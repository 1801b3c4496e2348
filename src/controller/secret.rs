//! Derivation of the target Secret.
//!
//! A pure transformation from a SopsSecret plus its decrypted payload to
//! the fully specified Secret the apply step writes. Operator-managed
//! label and annotation keys are reserved: user-supplied keys are added
//! only when they do not collide with the fixed set.

use crate::constants::{
    MANAGED_BY_LABEL, OPERATOR_NAME, SOURCE_ANNOTATION, SOURCE_NAME_LABEL,
};
use crate::controller::context::Error;
use crate::crd::SopsSecret;
use crate::sops::DecryptedPayload;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;

/// The name the derived Secret is created under: `spec.secretName` when
/// non-empty, otherwise the SopsSecret's own name.
pub fn derived_secret_name(sops_secret: &SopsSecret) -> String {
    match sops_secret.spec.secret_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => sops_secret.name_any(),
    }
}

/// Build the Secret derived from `sops_secret` and `payload`, including
/// the controlling owner reference.
///
/// Fails with [`Error::OwnerIdentity`] when the SopsSecret carries no
/// name or uid (a cache handing us a half-built object), and with
/// [`Error::MissingNamespace`] for a namespace-less object.
pub fn build_secret(
    sops_secret: &SopsSecret,
    payload: &DecryptedPayload,
) -> Result<Secret, Error> {
    let namespace = sops_secret.namespace().ok_or(Error::MissingNamespace)?;
    let owner_ref = sops_secret
        .controller_owner_ref(&())
        .ok_or(Error::OwnerIdentity)?;

    let mut labels = BTreeMap::from([
        (MANAGED_BY_LABEL.to_string(), OPERATOR_NAME.to_string()),
        (SOURCE_NAME_LABEL.to_string(), sops_secret.name_any()),
    ]);
    for (key, value) in &sops_secret.spec.labels {
        labels.entry(key.clone()).or_insert_with(|| value.clone());
    }

    let mut annotations = BTreeMap::from([(
        SOURCE_ANNOTATION.to_string(),
        format!("{}/{}", namespace, sops_secret.name_any()),
    )]);
    for (key, value) in &sops_secret.spec.annotations {
        annotations
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }

    let data: BTreeMap<String, ByteString> = payload
        .data
        .iter()
        .map(|(key, value)| (key.clone(), ByteString(value.clone())))
        .collect();

    let secret_type = if sops_secret.spec.secret_type.is_empty() {
        "Opaque".to_string()
    } else {
        sops_secret.spec.secret_type.clone()
    };

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(derived_secret_name(sops_secret)),
            namespace: Some(namespace),
            labels: Some(labels),
            annotations: Some(annotations),
            owner_references: Some(vec![owner_ref]),
            ..ObjectMeta::default()
        },
        type_: Some(secret_type),
        data: Some(data),
        ..Secret::default()
    })
}

/// Whether `secret` is controlled by `sops_secret`, by UID.
pub fn is_controlled_by(secret: &Secret, sops_secret: &SopsSecret) -> bool {
    let Some(uid) = sops_secret.uid() else {
        return false;
    };
    secret
        .metadata
        .owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|r| r.controller == Some(true) && r.uid == uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::SopsSecretSpec;

    fn sops_secret(name: &str, spec: SopsSecretSpec) -> SopsSecret {
        let mut resource = SopsSecret::new(name, spec);
        resource.metadata.namespace = Some("default".to_string());
        resource.metadata.uid = Some("uid-1234".to_string());
        resource
    }

    fn spec() -> SopsSecretSpec {
        SopsSecretSpec {
            encrypted_payload: "a: ENC[...]\nsops:\n  mac: m\n".to_string(),
            secret_name: None,
            secret_type: "Opaque".to_string(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            suspend: false,
        }
    }

    fn payload() -> DecryptedPayload {
        let mut payload = DecryptedPayload::default();
        payload
            .data
            .insert("username".to_string(), b"admin".to_vec());
        payload
            .string_data
            .insert("username".to_string(), "admin".to_string());
        payload
    }

    #[test]
    fn name_defaults_to_resource_name() {
        let resource = sops_secret("app", spec());
        assert_eq!(derived_secret_name(&resource), "app");
    }

    #[test]
    fn explicit_secret_name_wins() {
        let mut s = spec();
        s.secret_name = Some("custom-secret".to_string());
        let resource = sops_secret("app", s);
        assert_eq!(derived_secret_name(&resource), "custom-secret");
    }

    #[test]
    fn empty_secret_name_falls_back() {
        let mut s = spec();
        s.secret_name = Some(String::new());
        let resource = sops_secret("app", s);
        assert_eq!(derived_secret_name(&resource), "app");
    }

    #[test]
    fn secret_carries_data_type_and_owner() {
        let resource = sops_secret("app", spec());
        let secret = build_secret(&resource, &payload()).unwrap();

        assert_eq!(secret.metadata.name.as_deref(), Some("app"));
        assert_eq!(secret.metadata.namespace.as_deref(), Some("default"));
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
        assert_eq!(
            secret.data.as_ref().unwrap()["username"].0,
            b"admin".to_vec()
        );

        let owners = secret.metadata.owner_references.as_ref().unwrap();
        assert_eq!(owners.len(), 1);
        assert_eq!(owners[0].uid, "uid-1234");
        assert_eq!(owners[0].controller, Some(true));
        assert_eq!(owners[0].kind, "SopsSecret");
    }

    #[test]
    fn fixed_labels_and_annotations_present() {
        let resource = sops_secret("app", spec());
        let secret = build_secret(&resource, &payload()).unwrap();

        let labels = secret.metadata.labels.as_ref().unwrap();
        assert_eq!(labels[MANAGED_BY_LABEL], OPERATOR_NAME);
        assert_eq!(labels[SOURCE_NAME_LABEL], "app");

        let annotations = secret.metadata.annotations.as_ref().unwrap();
        assert_eq!(annotations[SOURCE_ANNOTATION], "default/app");
    }

    #[test]
    fn user_keys_merge_but_cannot_override_fixed_keys() {
        let mut s = spec();
        s.labels
            .insert("team".to_string(), "payments".to_string());
        s.labels
            .insert(MANAGED_BY_LABEL.to_string(), "someone-else".to_string());
        s.annotations
            .insert(SOURCE_ANNOTATION.to_string(), "spoofed".to_string());
        s.annotations
            .insert("note".to_string(), "kept".to_string());
        let resource = sops_secret("app", s);
        let secret = build_secret(&resource, &payload()).unwrap();

        let labels = secret.metadata.labels.as_ref().unwrap();
        assert_eq!(labels["team"], "payments");
        assert_eq!(labels[MANAGED_BY_LABEL], OPERATOR_NAME);

        let annotations = secret.metadata.annotations.as_ref().unwrap();
        assert_eq!(annotations["note"], "kept");
        assert_eq!(annotations[SOURCE_ANNOTATION], "default/app");
    }

    #[test]
    fn empty_secret_type_defaults_to_opaque() {
        let mut s = spec();
        s.secret_type = String::new();
        let resource = sops_secret("app", s);
        let secret = build_secret(&resource, &payload()).unwrap();
        assert_eq!(secret.type_.as_deref(), Some("Opaque"));
    }

    #[test]
    fn missing_uid_is_owner_identity_error() {
        let mut resource = sops_secret("app", spec());
        resource.metadata.uid = None;
        let err = build_secret(&resource, &payload()).unwrap_err();
        assert!(matches!(err, Error::OwnerIdentity));
    }

    #[test]
    fn missing_namespace_is_an_error() {
        let mut resource = sops_secret("app", spec());
        resource.metadata.namespace = None;
        let err = build_secret(&resource, &payload()).unwrap_err();
        assert!(matches!(err, Error::MissingNamespace));
    }

    #[test]
    fn controlled_by_matches_on_uid() {
        let resource = sops_secret("app", spec());
        let secret = build_secret(&resource, &payload()).unwrap();
        assert!(is_controlled_by(&secret, &resource));

        let mut other = sops_secret("app", spec());
        other.metadata.uid = Some("different-uid".to_string());
        assert!(!is_controlled_by(&secret, &other));
    }
}
