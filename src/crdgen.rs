//! # CRD Generator
//!
//! Prints the `SopsSecret` CustomResourceDefinition YAML to stdout.
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/sopssecret.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::core::CustomResourceExt;
use sops_secrets_operator::crd::SopsSecret;

fn main() {
    let crd = SopsSecret::crd();
    print!(
        "{}",
        serde_yaml::to_string(&crd).expect("CRD serialization cannot fail")
    );
}
