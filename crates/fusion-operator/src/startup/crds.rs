//! Installs the agent's own CRD on startup using server-side apply

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, CustomResourceExt};

use fusion_common::crd::ManagedFusionOffering;
use fusion_common::FIELD_MANAGER;

/// Name of the ManagedFusionOffering CRD
pub const OFFERING_CRD_NAME: &str = "managedfusionofferings.fusion.dev";

/// Ensure the ManagedFusionOffering CRD matches this build
pub async fn ensure_offering_crd(client: &Client) -> anyhow::Result<()> {
    let crds: Api<CustomResourceDefinition> = Api::all(client.clone());
    let params = PatchParams::apply(FIELD_MANAGER).force();

    tracing::info!(crd = OFFERING_CRD_NAME, "Installing ManagedFusionOffering CRD...");
    crds.patch(
        OFFERING_CRD_NAME,
        &params,
        &Patch::Apply(&ManagedFusionOffering::crd()),
    )
    .await
    .map_err(|e| anyhow::anyhow!("failed to install {} CRD: {}", OFFERING_CRD_NAME, e))?;

    tracing::info!("ManagedFusionOffering CRD installed/updated");
    Ok(())
}
