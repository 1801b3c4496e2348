//! # Validator Unit Tests
//!
//! Boundary laws for the payload validator: it accepts exactly the inputs
//! whose root mapping carries a `sops` mapping with a non-empty `mac`,
//! and rejects all others with a fixed reason code.

use sops_secrets_operator::sops::{validate_encrypted_payload, ValidationError};

#[test]
fn accepts_minimal_envelope() {
    let accepted = vec![
        "sops:\n  mac: ENC[AES256_GCM,data:test,type:str]\n",
        "username: ENC[...]\nsops:\n  mac: m\n  version: 3.9.0\n",
        // Extra unknown sops fields are fine.
        "a: b\nsops:\n  mac: m\n  age:\n    - recipient: age1xyz\n",
    ];

    for input in accepted {
        assert!(
            validate_encrypted_payload(input.as_bytes()).is_ok(),
            "input should be accepted:\n{input}"
        );
    }
}

#[test]
fn rejects_everything_without_a_mac() {
    let rejected: Vec<(&str, ValidationError)> = vec![
        ("", ValidationError::Empty),
        ("   \n   ", ValidationError::NotAMapping),
        ("- a\n- b\n", ValidationError::NotAMapping),
        ("just a scalar", ValidationError::NotAMapping),
        (
            "username: test\npassword: secret\n",
            ValidationError::MissingSopsMetadata,
        ),
        (
            "username: ENC[...]\nsops: 42\n",
            ValidationError::InvalidSopsMetadata,
        ),
        (
            "username: ENC[...]\nsops:\n  version: 3.9.0\n",
            ValidationError::MissingMac,
        ),
        (
            "username: ENC[...]\nsops:\n  mac: \"\"\n",
            ValidationError::MissingMac,
        ),
        (
            "username: ENC[...]\nsops:\n  mac: null\n",
            ValidationError::MissingMac,
        ),
    ];

    for (input, expected) in rejected {
        assert_eq!(
            validate_encrypted_payload(input.as_bytes()),
            Err(expected),
            "input should be rejected:\n{input}"
        );
    }
}

#[test]
fn rejects_malformed_yaml_with_invalid_yaml_reason() {
    let err = validate_encrypted_payload(b"{{{not valid yaml").unwrap_err();
    assert!(matches!(err, ValidationError::InvalidYaml(_)));
    assert_eq!(err.reason(), "invalid-yaml");
}

#[test]
fn reason_codes_are_fixed() {
    assert_eq!(ValidationError::Empty.reason(), "empty-payload");
    assert_eq!(ValidationError::NotAMapping.reason(), "not-a-mapping");
    assert_eq!(
        ValidationError::MissingSopsMetadata.reason(),
        "missing-sops-metadata"
    );
    assert_eq!(
        ValidationError::InvalidSopsMetadata.reason(),
        "invalid-sops-metadata"
    );
    assert_eq!(ValidationError::MissingMac.reason(), "missing-mac");
}

#[test]
fn validation_never_touches_encrypted_values() {
    // A payload with deliberately odd encrypted values still validates on
    // envelope structure alone.
    let input = r#"
certificate: |
  ENC[AES256_GCM,data:aaaa,iv:bbbb,tag:cccc,type:str]
count: ENC[AES256_GCM,data:dddd,type:int]
sops:
  mac: ENC[AES256_GCM,data:eeee,type:str]
  lastmodified: "2026-01-01T00:00:00Z"
"#;
    assert!(validate_encrypted_payload(input.as_bytes()).is_ok());
}
