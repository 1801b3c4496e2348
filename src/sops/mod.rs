//! # SOPS Decryption
//!
//! Everything that touches the external `sops` binary lives here.
//!
//! - `keys.rs` - AGE private key assembly from the environment
//! - `decrypt.rs` - the subprocess driver and decrypted-output parsing
//! - `validate.rs` - structural validation of encrypted payloads
//! - `error.rs` - typed error taxonomy with fixed reason codes
//!
//! The driver is the only place in the operator that spawns a subprocess.
//! Its surface is two methods over encrypted bytes, small enough to swap
//! for an in-process implementation without touching the reconciler.

mod decrypt;
mod error;
mod keys;
mod validate;

pub use decrypt::{parse_decrypted_yaml, Decrypt, DecryptedPayload, SopsDecryptor};
pub use error::{DecryptError, KeyLoadError, ValidationError};
pub use keys::AgeKeys;
pub use validate::validate_encrypted_payload;
