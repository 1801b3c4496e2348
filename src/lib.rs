//! # SOPS Secrets Operator
//!
//! A Kubernetes operator that reconciles `SopsSecret` custom resources
//! carrying SOPS-encrypted payloads into native Kubernetes Secrets.
//!
//! Users commit encrypted material to Git, apply it as a `SopsSecret`,
//! and the operator continuously ensures a matching plaintext Secret
//! exists, is owned by the source resource, and is cleaned up on
//! deletion.
//!
//! ## How it works
//!
//! 1. **Watch** - The controller watches `SopsSecret` resources across
//!    all namespaces, plus the Secrets they own (self-healing on
//!    out-of-band deletion).
//! 2. **Validate** - The encrypted payload must carry a `sops` metadata
//!    block with a MAC before anything is spawned.
//! 3. **Decrypt** - The external `sops` binary decrypts the payload with
//!    AGE keys loaded from the environment at startup.
//! 4. **Derive** - The decrypted key/value pairs become a Secret with
//!    operator-managed labels and a controlling owner reference.
//! 5. **Status** - Conditions, the input digest, and the observed
//!    generation record exactly what was reconciled.
//!
//! ## Required RBAC
//!
//! - `sopssecrets`, `sopssecrets/status`, `sopssecrets/finalizers` in
//!   `secrets.sops.io`: get, list, watch, create, update, patch, delete
//! - `secrets` (core): get, list, watch, create, update, patch, delete
//! - `events` (core): create, patch

pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod server;
pub mod sops;
