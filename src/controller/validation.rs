//! CRD field validation.
//!
//! Validates user-supplied spec fields before they reach the API server:
//! the derived Secret name must be a legal resource name and the extra
//! label/annotation keys must be legal metadata keys. Failures are
//! absorbed into the `ValidationFailed` status path rather than thrown at
//! the API server as rejected writes.

use crate::crd::SopsSecret;
use anyhow::Result;
use regex::Regex;

/// Validate a Kubernetes resource name (RFC 1123 subdomain).
/// Lowercase alphanumeric, hyphens, dots; 1-253 characters; cannot start
/// or end with hyphen or dot.
pub fn validate_kubernetes_name(name: &str, field_name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(anyhow::anyhow!("{field_name} cannot be empty"));
    }

    if name.len() > 253 {
        return Err(anyhow::anyhow!(
            "{} '{}' exceeds maximum length of 253 characters (got {})",
            field_name,
            name,
            name.len()
        ));
    }

    let name_regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if !name_regex.is_match(name) {
        return Err(anyhow::anyhow!(
            "{field_name} '{name}' must be a valid Kubernetes name (lowercase alphanumeric, hyphens, dots; cannot start/end with hyphen or dot)"
        ));
    }

    Ok(())
}

/// Validate a label or annotation key: an optional DNS-subdomain prefix,
/// then a name segment of at most 63 characters.
pub fn validate_metadata_key(key: &str, field_name: &str) -> Result<()> {
    if key.is_empty() {
        return Err(anyhow::anyhow!("{field_name} key cannot be empty"));
    }

    let (prefix, name) = match key.rsplit_once('/') {
        Some((prefix, name)) => (Some(prefix), name),
        None => (None, key),
    };

    if let Some(prefix) = prefix {
        validate_kubernetes_name(prefix, &format!("{field_name} key prefix"))?;
    }

    if name.is_empty() || name.len() > 63 {
        return Err(anyhow::anyhow!(
            "{field_name} key '{key}' name segment must be 1-63 characters"
        ));
    }

    let name_regex = Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if !name_regex.is_match(name) {
        return Err(anyhow::anyhow!(
            "{field_name} key '{key}' must be alphanumeric with hyphens, underscores, dots"
        ));
    }

    Ok(())
}

/// Validate a label value: at most 63 characters, alphanumeric with
/// hyphens, underscores, dots. Empty values are legal.
pub fn validate_label_value(value: &str, field_name: &str) -> Result<()> {
    if value.is_empty() {
        return Ok(());
    }

    if value.len() > 63 {
        return Err(anyhow::anyhow!(
            "{} '{}' exceeds maximum length of 63 characters (got {})",
            field_name,
            value,
            value.len()
        ));
    }

    let value_regex = Regex::new(r"^[A-Za-z0-9]([-A-Za-z0-9_.]*[A-Za-z0-9])?$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if !value_regex.is_match(value) {
        return Err(anyhow::anyhow!(
            "{field_name} '{value}' must be alphanumeric with hyphens, underscores, dots"
        ));
    }

    Ok(())
}

/// Validate the user-controlled fields of a SopsSecret spec.
pub fn validate_sops_secret(sops_secret: &SopsSecret) -> Result<()> {
    if let Some(name) = sops_secret.spec.secret_name.as_deref() {
        if !name.is_empty() {
            validate_kubernetes_name(name, "spec.secretName")?;
        }
    }

    for (key, value) in &sops_secret.spec.labels {
        validate_metadata_key(key, "spec.labels")?;
        validate_label_value(value, "spec.labels value")?;
    }

    for key in sops_secret.spec.annotations.keys() {
        validate_metadata_key(key, "spec.annotations")?;
    }

    Ok(())
}
