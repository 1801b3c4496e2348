//! Operator entry point.
//!
//! Wires together the key loader, the decryption driver, the HTTP probe
//! server, and the controller: a primary watch on SopsSecrets plus a
//! secondary watch on the Secrets they own, so an out-of-band edit or
//! deletion of a derived Secret re-enqueues its owner.

use anyhow::{Context as _, Result};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use kube_runtime::{watcher, Controller};
use sops_secrets_operator::constants::{DEFAULT_HEALTH_PORT, OPERATOR_NAME};
use sops_secrets_operator::controller::events::KubeEventPublisher;
use sops_secrets_operator::controller::{error_policy, reconcile, Context};
use sops_secrets_operator::crd::SopsSecret;
use sops_secrets_operator::observability::metrics;
use sops_secrets_operator::server::{start_server, ServerState};
use sops_secrets_operator::sops::{AgeKeys, SopsDecryptor};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sops_secrets_operator=info".into()),
        )
        .init();

    info!("Starting SOPS Secrets Operator v{}", env!("CARGO_PKG_VERSION"));

    metrics::register_metrics()?;

    let server_state = ServerState::new();
    let server_port = std::env::var("HEALTH_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_HEALTH_PORT);

    let probe_state = server_state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, probe_state).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Key material is loaded once; no keys is a startup failure with a
    // diagnostic, not a degraded mode.
    let keys = AgeKeys::from_env().context("Failed to load SOPS AGE keys")?;
    info!("Loaded {} AGE decryption key(s)", keys.len());

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let decryptor = Arc::new(SopsDecryptor::new(keys));
    let events = Arc::new(KubeEventPublisher::new(client.clone(), OPERATOR_NAME));
    let ctx = Arc::new(Context::new(client.clone(), decryptor, events));

    let sops_secrets: Api<SopsSecret> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client);

    server_state.set_ready(true);

    Controller::new(sops_secrets, watcher::Config::default())
        .owns(secrets, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(|result| async move {
            match result {
                Ok((obj, _action)) => info!("Reconciled {:?}", obj),
                Err(e) => error!("Reconciliation stream error: {:?}", e),
            }
        })
        .await;

    info!("Controller stopped");

    Ok(())
}
