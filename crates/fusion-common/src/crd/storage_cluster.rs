//! Typed subset of the downstream `ocs.openshift.io/v1` StorageCluster
//!
//! Only the fields the agent writes are modelled. The CRD itself belongs to
//! the storage operator and is registered from its YAML template, so schema
//! generation is disabled here.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::PersistentVolumeClaim;
use kube::CustomResource;
use serde::{Deserialize, Serialize};

use super::FeatureStrategy;

/// `reconcileStrategy` value that makes the storage operator deploy the gateway
pub const GATEWAY_STRATEGY_MANAGE: &str = "manage";

/// StorageCluster describes the storage cluster the downstream operator runs.
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[kube(
    group = "ocs.openshift.io",
    version = "v1",
    kind = "StorageCluster",
    namespaced,
    schema = "disabled",
    derive = "Default",
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct StorageClusterSpec {
    /// Let the storage operator label and taint nodes itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_nodes: Option<bool>,

    /// Run storage daemons on the host network
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_network: Option<bool>,

    /// Accept storage consumers from other clusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_remote_storage_consumers: Option<bool>,

    /// Groups of storage devices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub storage_device_sets: Vec<StorageDeviceSet>,

    /// Object gateway settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_cloud_gateway: Option<MultiCloudGatewaySpec>,

    /// Fields owned by the storage operator or an administrator
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A named group of identically-provisioned storage devices
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageDeviceSet {
    /// Device set name
    pub name: String,

    /// Number of device groups; each group has `replica` devices
    #[serde(default)]
    pub count: i32,

    /// Devices per group
    #[serde(default)]
    pub replica: i32,

    /// Whether devices may move between nodes
    #[serde(default)]
    pub portable: bool,

    /// Device class reported to the storage engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,

    /// Claim template each device is provisioned from
    #[serde(rename = "dataPVCTemplate", default)]
    pub data_pvc_template: PersistentVolumeClaim,

    /// Unmodelled device set fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Multi-cloud gateway settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultiCloudGatewaySpec {
    /// How the storage operator treats the gateway ("manage", "ignore", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconcile_strategy: Option<String>,

    /// Unmodelled gateway fields
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StorageCluster {
    /// Find a device set by name
    pub fn device_set(&self, name: &str) -> Option<&StorageDeviceSet> {
        self.spec.storage_device_sets.iter().find(|ds| ds.name == name)
    }

    /// Find a device set by name, mutably
    pub fn device_set_mut(&mut self, name: &str) -> Option<&mut StorageDeviceSet> {
        self.spec
            .storage_device_sets
            .iter_mut()
            .find(|ds| ds.name == name)
    }

    /// Gateway enable state as seen by the agent
    ///
    /// Any strategy other than [`GATEWAY_STRATEGY_MANAGE`] counts as unset.
    pub fn gateway_strategy(&self) -> FeatureStrategy {
        let manage = self
            .spec
            .multi_cloud_gateway
            .as_ref()
            .and_then(|mcg| mcg.reconcile_strategy.as_deref())
            == Some(GATEWAY_STRATEGY_MANAGE);
        if manage {
            FeatureStrategy::Enabled
        } else {
            FeatureStrategy::Unset
        }
    }

    /// Set the gateway enable state
    ///
    /// The gateway is never torn down once managed, so `Unset` writes
    /// nothing.
    pub fn set_gateway_strategy(&mut self, strategy: FeatureStrategy) {
        if strategy == FeatureStrategy::Enabled {
            self.spec
                .multi_cloud_gateway
                .get_or_insert_with(Default::default)
                .reconcile_strategy = Some(GATEWAY_STRATEGY_MANAGE.to_string());
        }
    }
}
