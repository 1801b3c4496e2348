//! # Custom Resource Definitions
//!
//! CRD types for the SOPS Secrets Operator.
//!
//! - `sops_secret.rs` - The SopsSecret resource and its spec
//! - `status.rs` - Status, conditions, and condition helpers

mod sops_secret;
mod status;

pub use sops_secret::{default_secret_type, SopsSecret, SopsSecretSpec};
pub use status::{
    set_condition, Condition, SopsSecretStatus, CONDITION_DECRYPTED, CONDITION_READY,
    CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, CONDITION_STATUS_UNKNOWN,
};
