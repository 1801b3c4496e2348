//! # Decryption Driver Tests
//!
//! Exercises the subprocess driver against a fake `sops` shell script on
//! PATH, covering the success path, non-zero exit classification, and the
//! timeout path. Unix-only: the fake binary is a shell script.

#![cfg(unix)]

use sops_secrets_operator::sops::{AgeKeys, Decrypt, DecryptError, SopsDecryptor};
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::time::Duration;

/// Install a fake `sops` whose behavior is selected via FAKE_SOPS_MODE,
/// and prepend its directory to PATH for the duration of the test
/// process. The driver inherits the environment, so the mode variable
/// reaches the script.
fn install_fake_sops(dir: &std::path::Path) {
    let script = r#"#!/bin/sh
if [ ! -f "$2" ]; then
    echo "sops: no input file" >&2
    exit 2
fi
case "$FAKE_SOPS_MODE" in
    fail)
        echo "sops: MAC mismatch: file may have been tampered with" >&2
        exit 1
        ;;
    hang)
        sleep 30
        ;;
    *)
        printf 'username: admin\npassword: p@ss\nport: 5432\n'
        ;;
esac
"#;
    let path = dir.join("sops");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(script.as_bytes()).unwrap();
    drop(file);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let old_path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{}", dir.display(), old_path));
}

fn decryptor() -> SopsDecryptor {
    let keys = AgeKeys::from_sources(Some("AGE-SECRET-KEY-1TEST"), None).unwrap();
    SopsDecryptor::new(keys)
}

#[tokio::test]
async fn driver_classifies_subprocess_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    install_fake_sops(dir.path());

    let encrypted = b"payload: ENC[...]\nsops:\n  mac: m\n";

    // Success: stdout parses into both payload views.
    std::env::set_var("FAKE_SOPS_MODE", "ok");
    let payload = decryptor().decrypt(encrypted).await.unwrap();
    assert_eq!(payload.data["username"], b"admin");
    assert_eq!(payload.string_data["password"], "p@ss");
    assert_eq!(payload.string_data["port"], "5432");

    // Raw decryption returns stdout verbatim.
    let raw = decryptor().decrypt_raw(encrypted).await.unwrap();
    assert_eq!(raw, b"username: admin\npassword: p@ss\nport: 5432\n".to_vec());

    // Non-zero exit: classified as subprocess failure, stderr surfaced.
    std::env::set_var("FAKE_SOPS_MODE", "fail");
    let err = decryptor().decrypt(encrypted).await.unwrap_err();
    match &err {
        DecryptError::CommandFailed { code, stderr } => {
            assert_eq!(*code, Some(1));
            assert!(stderr.contains("MAC mismatch"));
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    assert_eq!(err.reason(), "subprocess-failed");

    // Driver deadline: classified as timeout, child reaped via
    // kill_on_drop.
    std::env::set_var("FAKE_SOPS_MODE", "hang");
    let err = decryptor()
        .with_timeout(Duration::from_millis(200))
        .decrypt(encrypted)
        .await
        .unwrap_err();
    assert!(matches!(err, DecryptError::Timeout { .. }));
    assert_eq!(err.reason(), "timeout");

    // Concurrency: each invocation owns its temp file and child, so
    // parallel calls cannot interfere. (Same test body: the fake binary
    // and mode variable are process-global.)
    std::env::set_var("FAKE_SOPS_MODE", "ok");
    let decryptor = std::sync::Arc::new(decryptor());
    let mut handles = Vec::new();
    for i in 0..8 {
        let d = decryptor.clone();
        handles.push(tokio::spawn(async move {
            let encrypted = format!("k{i}: ENC[...]\nsops:\n  mac: m\n");
            d.decrypt(encrypted.as_bytes()).await
        }));
    }

    for handle in handles {
        let payload = handle.await.unwrap().unwrap();
        assert_eq!(payload.string_data["username"], "admin");
    }

    std::env::remove_var("FAKE_SOPS_MODE");
}
