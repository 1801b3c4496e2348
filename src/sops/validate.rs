//! Structural validation of encrypted payloads.
//!
//! A valid payload is a YAML mapping whose top-level `sops` block is a
//! mapping with a non-empty `mac`. Anything else is rejected before a
//! subprocess is ever spawned, so malformed resources fail fast and
//! cheaply.

use crate::sops::error::ValidationError;

/// Check that `payload` looks like a SOPS-encrypted document.
///
/// Pure over the input bytes; does not verify the MAC (that is the sops
/// binary's job), only that the envelope is present.
pub fn validate_encrypted_payload(payload: &[u8]) -> Result<(), ValidationError> {
    if payload.is_empty() {
        return Err(ValidationError::Empty);
    }

    let root: serde_yaml::Value = serde_yaml::from_slice(payload)
        .map_err(|e| ValidationError::InvalidYaml(e.to_string()))?;

    let serde_yaml::Value::Mapping(mapping) = root else {
        return Err(ValidationError::NotAMapping);
    };

    let sops = mapping
        .get(serde_yaml::Value::String("sops".to_string()))
        .ok_or(ValidationError::MissingSopsMetadata)?;

    let serde_yaml::Value::Mapping(sops) = sops else {
        return Err(ValidationError::InvalidSopsMetadata);
    };

    match sops.get(serde_yaml::Value::String("mac".to_string())) {
        Some(serde_yaml::Value::String(mac)) if !mac.is_empty() => Ok(()),
        _ => Err(ValidationError::MissingMac),
    }
}
