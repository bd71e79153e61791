//! Custom Resource Definitions used by the managed fusion agent
//!
//! `ManagedFusionOffering` is the parent kind the agent owns and serves.
//! `StorageCluster` is a typed view of the downstream storage operator's
//! kind; its CRD is registered by the bootstrap command, not generated here.

mod offering;
mod storage_cluster;

pub use offering::{
    FeatureStrategy, ManagedFusionOffering, ManagedFusionOfferingSpec,
    ManagedFusionOfferingStatus, OfferingKind, OfferingPhase,
};
pub use storage_cluster::{
    MultiCloudGatewaySpec, StorageCluster, StorageClusterSpec, StorageDeviceSet,
    GATEWAY_STRATEGY_MANAGE,
};
