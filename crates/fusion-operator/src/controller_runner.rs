//! Controller runner - builds the offering controller future
//!
//! Construction is kept separate from `main` so the binary only decides
//! which controllers to run and awaits them.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Api, Client};

use fusion_common::crd::{ManagedFusionOffering, StorageCluster};
use fusion_datafoundation::{error_policy, reconcile, Context};

/// Watcher timeout (seconds) - must be less than client read_timeout (30s)
/// This forces the API server to close the watch before the client times out,
/// preventing "body read timed out" errors on idle watches.
const WATCH_TIMEOUT_SECS: u32 = 25;

/// Build the ManagedFusionOffering controller for one namespace
///
/// Changes to the owned Secret and StorageCluster map back to the offering
/// through their controller owner references, so drift is corrected without
/// waiting for the periodic resync.
pub fn build_offering_controller(
    client: Client,
    namespace: &str,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    let ctx = Arc::new(Context::new(client.clone(), namespace));
    let offerings: Api<ManagedFusionOffering> = Api::namespaced(client.clone(), namespace);
    let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let storage_clusters: Api<StorageCluster> = Api::namespaced(client, namespace);

    tracing::info!(namespace = %namespace, "- ManagedFusionOffering controller");

    Box::pin(
        Controller::new(
            offerings,
            WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
        )
        .owns(secrets, WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS))
        .owns(
            storage_clusters,
            WatcherConfig::default().timeout(WATCH_TIMEOUT_SECS),
        )
        .shutdown_on_signal()
        .run(reconcile, error_policy, ctx)
        .for_each(log_reconcile_result("ManagedFusionOffering")),
    )
}

/// Log each reconcile result as it comes off the controller stream
fn log_reconcile_result<T: std::fmt::Debug, E: std::fmt::Debug>(
    controller_name: &'static str,
) -> impl Fn(Result<T, E>) -> std::future::Ready<()> {
    move |result| {
        match result {
            Ok(action) => tracing::debug!(?action, "{} reconciliation completed", controller_name),
            Err(e) => tracing::warn!(error = ?e, "{} reconciliation error", controller_name),
        }
        std::future::ready(())
    }
}
