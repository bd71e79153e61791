//! ManagedFusionOffering CRD: a tenant's request for a managed storage offering
//!
//! `config` is a free-form string map; the offering-specific reconciler
//! parses and validates it on every pass.

use std::collections::BTreeMap;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// ManagedFusionOffering describes a storage offering the agent provisions.
///
/// Example:
/// ```yaml
/// apiVersion: fusion.dev/v1alpha1
/// kind: ManagedFusionOffering
/// metadata:
///   name: managed-fusion-df
///   namespace: fusion-agent
/// spec:
///   kind: DataFoundation
///   config:
///     usableCapacityInUnits: "10"
///     onboardingValidationKey: "MIIBIjANBgkqh..."
///     enableFeature: "true"
/// ```
#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "fusion.dev",
    version = "v1alpha1",
    kind = "ManagedFusionOffering",
    namespaced,
    shortname = "mfo",
    status = "ManagedFusionOfferingStatus",
    printcolumn = r#"{"name":"Kind","type":"string","jsonPath":".spec.kind"}"#,
    printcolumn = r#"{"name":"Phase","type":"string","jsonPath":".status.phase"}"#,
    printcolumn = r#"{"name":"DeviceSets","type":"integer","jsonPath":".status.deviceSetCount"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFusionOfferingSpec {
    /// Which offering this object requests
    pub kind: OfferingKind,

    /// Offering-specific configuration, validated by the reconciler
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Offering types the agent knows how to reconcile
#[derive(Clone, Copy, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum OfferingKind {
    /// Data Foundation: capacity-sized storage cluster plus onboarding key
    DataFoundation,
}

/// Observed state written back by the agent
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagedFusionOfferingStatus {
    /// Current phase
    #[serde(default)]
    pub phase: OfferingPhase,

    /// Human-readable message, set when the last pass failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Generation of the spec the last pass ran against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Device set count applied to the storage cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_set_count: Option<i32>,

    /// Gateway strategy applied to the storage cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_strategy: Option<FeatureStrategy>,

    /// RFC3339 time of the last recorded status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reconciled: Option<String>,
}

impl ManagedFusionOfferingStatus {
    /// True if both statuses report the same outcome, ignoring timestamps
    pub fn same_outcome(&self, other: &Self) -> bool {
        self.phase == other.phase
            && self.message == other.message
            && self.observed_generation == other.observed_generation
            && self.device_set_count == other.device_set_count
            && self.feature_strategy == other.feature_strategy
    }
}

/// ManagedFusionOffering phase
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum OfferingPhase {
    /// Not reconciled yet
    #[default]
    Pending,
    /// Both managed resources match the offering
    Ready,
    /// The last pass failed
    Failed,
}

/// Enable state of the optional gateway subsystem
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum FeatureStrategy {
    /// Not requested; the storage operator decides
    #[default]
    Unset,
    /// Deployed and managed by the storage operator
    Enabled,
}
