//! Desired StorageCluster for a DataFoundation offering
//!
//! A new cluster starts from the provider template. An existing cluster keeps
//! everything the storage operator or an administrator set; the agent only
//! owns the `default` device set count and the gateway strategy.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;

use fusion_common::crd::{StorageCluster, StorageClusterSpec, StorageDeviceSet};
use fusion_common::kube_utils::set_controller_reference;

use crate::error::ReconcileError;
use crate::guard::{guard, ScaleDecision};
use crate::planner::{plan_device_sets, UNIT_CAPACITY_TIB};
use crate::spec::OfferingSpec;
use crate::toggle::{toggle, ToggleDecision};

/// Name of the managed StorageCluster
pub const STORAGE_CLUSTER_NAME: &str = "ocs-storagecluster";
/// Device set whose count tracks the offering's capacity
pub const DEVICE_SET_NAME: &str = "default";

const DEVICE_SET_REPLICA: i32 = 3;
const DEVICE_CLASS: &str = "ssd";
const DEVICE_STORAGE_CLASS: &str = "gp2";

/// StorageCluster a fresh provider installation starts from
pub fn provider_template(namespace: &str) -> StorageCluster {
    let mut cluster = StorageCluster::new(
        STORAGE_CLUSTER_NAME,
        StorageClusterSpec {
            manage_nodes: Some(false),
            host_network: Some(true),
            allow_remote_storage_consumers: Some(true),
            storage_device_sets: vec![provider_device_set()],
            ..Default::default()
        },
    );
    cluster.metadata.namespace = Some(namespace.to_string());
    cluster
}

fn provider_device_set() -> StorageDeviceSet {
    StorageDeviceSet {
        name: DEVICE_SET_NAME.to_string(),
        count: 1,
        replica: DEVICE_SET_REPLICA,
        portable: true,
        device_class: Some(DEVICE_CLASS.to_string()),
        data_pvc_template: PersistentVolumeClaim {
            spec: Some(PersistentVolumeClaimSpec {
                access_modes: Some(vec!["ReadWriteOnce".to_string()]),
                storage_class_name: Some(DEVICE_STORAGE_CLASS.to_string()),
                volume_mode: Some("Block".to_string()),
                resources: Some(VolumeResourceRequirements {
                    requests: Some(BTreeMap::from([(
                        "storage".to_string(),
                        Quantity(format!("{}Ti", UNIT_CAPACITY_TIB)),
                    )])),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        },
        extra: BTreeMap::new(),
    }
}

/// Desired StorageCluster plus the policy decisions that produced it
#[derive(Clone, Debug)]
pub struct TopologyPlan {
    /// Object to apply
    pub cluster: StorageCluster,
    /// Device set count decision
    pub scale: ScaleDecision,
    /// Gateway strategy decision
    pub feature: ToggleDecision,
    /// Count written to the `default` device set
    pub device_set_count: i32,
}

/// Compute the desired StorageCluster from the stored one (if any)
pub fn desired_storage_cluster(
    current: Option<&StorageCluster>,
    namespace: &str,
    owner: &OwnerReference,
    spec: &OfferingSpec,
) -> Result<TopologyPlan, ReconcileError> {
    let current_count = match current.and_then(|sc| sc.device_set(DEVICE_SET_NAME)) {
        Some(ds) => u64::try_from(ds.count).map_err(|_| {
            ReconcileError::computation(
                "storageDeviceSets.count",
                format!("stored count {} is negative", ds.count),
            )
        })?,
        None => 0,
    };
    let current_strategy = current
        .map(StorageCluster::gateway_strategy)
        .unwrap_or_default();

    let scale = guard(plan_device_sets(spec.usable_capacity_units), current_count);
    let device_set_count = i32::try_from(scale.applied).map_err(|_| {
        ReconcileError::computation(
            "storageDeviceSets.count",
            format!("{} device sets exceeds the supported maximum", scale.applied),
        )
    })?;
    let feature = toggle(spec.enable_feature, current_strategy);

    let mut cluster = current
        .cloned()
        .unwrap_or_else(|| provider_template(namespace));
    set_controller_reference(&mut cluster.metadata, owner).map_err(|source| {
        ReconcileError::AlreadyOwned {
            kind: "StorageCluster",
            name: STORAGE_CLUSTER_NAME.to_string(),
            source,
        }
    })?;

    match cluster.device_set_mut(DEVICE_SET_NAME) {
        Some(ds) => ds.count = device_set_count,
        None => cluster.spec.storage_device_sets.push(StorageDeviceSet {
            count: device_set_count,
            ..provider_device_set()
        }),
    }
    cluster.set_gateway_strategy(feature.strategy);

    Ok(TopologyPlan {
        cluster,
        scale,
        feature,
        device_set_count,
    })
}
