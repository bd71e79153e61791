//! Registers the storage operator CRDs the agent writes against
//!
//! The StorageCluster and related CRDs belong to the downstream storage
//! operator. On a fresh cluster they are created from YAML templates so the
//! agent can start before that operator is installed. Existing CRDs are never
//! touched.

use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{Api, PostParams};
use kube::{Client, ResourceExt};
#[cfg(test)]
use mockall::automock;
use tracing::{error, info};

use fusion_common::kube_utils::is_already_exists;
use fusion_common::FIELD_MANAGER;

/// Directory the templates are read from when none is configured
pub const DEFAULT_CRD_DIR: &str = "shim/crds";

/// Templates registered by `bootstrap`, in order
pub const CRD_TEMPLATE_FILES: [&str; 3] = [
    "storageclusters.ocs.openshift.io.yaml",
    "ocsinitializations.ocs.openshift.io.yaml",
    "noobaas.noobaa.io.yaml",
];

/// Read and parse every template
///
/// Fails on the first unreadable or unparsable file, before anything is
/// registered.
pub fn load_crd_templates(dir: &Path) -> anyhow::Result<Vec<CustomResourceDefinition>> {
    CRD_TEMPLATE_FILES
        .iter()
        .map(|file| {
            let path = dir.join(file);
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("unable to read CRD template {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("unable to parse CRD template {}", path.display()))
        })
        .collect()
}

/// Minimal CRD registry the bootstrap needs
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CrdRegistry: Send + Sync {
    /// Whether a CRD with this name is registered
    async fn exists(&self, name: &str) -> Result<bool, kube::Error>;

    /// Register a CRD
    async fn create(&self, crd: &CustomResourceDefinition) -> Result<(), kube::Error>;
}

/// [`CrdRegistry`] backed by the Kubernetes API
pub struct KubeCrdRegistry {
    api: Api<CustomResourceDefinition>,
}

impl KubeCrdRegistry {
    /// Create a registry using the given client
    pub fn new(client: Client) -> Self {
        Self {
            api: Api::all(client),
        }
    }
}

#[async_trait]
impl CrdRegistry for KubeCrdRegistry {
    async fn exists(&self, name: &str) -> Result<bool, kube::Error> {
        Ok(self.api.get_opt(name).await?.is_some())
    }

    async fn create(&self, crd: &CustomResourceDefinition) -> Result<(), kube::Error> {
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        self.api.create(&params, crd).await?;
        Ok(())
    }
}

/// What happened to each CRD
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Newly registered
    pub created: Vec<String>,
    /// Already registered, left alone
    pub existing: Vec<String>,
    /// Lookup or registration failed
    pub failed: Vec<String>,
}

/// Register every CRD that is not registered yet
///
/// A failure on one CRD is logged and the rest are still attempted.
pub async fn register_crds(
    registry: &dyn CrdRegistry,
    crds: &[CustomResourceDefinition],
) -> BootstrapReport {
    let mut report = BootstrapReport::default();

    for crd in crds {
        let name = crd.name_any();
        match registry.exists(&name).await {
            Ok(true) => {
                info!(crd = %name, "CRD already exists");
                report.existing.push(name);
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                error!(crd = %name, error = %e, "Unable to look up CRD");
                report.failed.push(name);
                continue;
            }
        }

        info!(crd = %name, "Creating CRD");
        match registry.create(crd).await {
            Ok(()) => report.created.push(name),
            Err(e) if is_already_exists(&e) => {
                info!(crd = %name, "CRD was created concurrently");
                report.existing.push(name);
            }
            Err(e) => {
                error!(crd = %name, error = %e, "Unable to create CRD");
                report.failed.push(name);
            }
        }
    }

    report
}

/// Load the templates from `dir` and register them
pub async fn bootstrap_crds(client: Client, dir: &Path) -> anyhow::Result<BootstrapReport> {
    let crds = load_crd_templates(dir)?;
    let report = register_crds(&KubeCrdRegistry::new(client), &crds).await;

    info!(
        created = report.created.len(),
        existing = report.existing.len(),
        failed = report.failed.len(),
        "CRD bootstrap finished"
    );
    if !report.failed.is_empty() {
        anyhow::bail!("unable to register CRDs: {}", report.failed.join(", "));
    }
    Ok(report)
}
