//! Data Foundation offering controller
//!
//! Turns a `ManagedFusionOffering` of kind `DataFoundation` into two managed
//! resources in the agent namespace:
//! - the `onboarding-ticket-key` Secret carrying the tenant's PEM-wrapped
//!   onboarding key
//! - the `ocs-storagecluster` StorageCluster, whose `default` device set is
//!   sized from the requested capacity
//!
//! Both are owned by the offering and garbage collected with it.

#![deny(missing_docs)]

pub mod controller;
pub mod error;
pub mod guard;
pub mod planner;
pub mod secret;
pub mod spec;
pub mod store;
pub mod toggle;
pub mod topology;

#[cfg(test)]
mod testing;

pub use controller::{error_policy, reconcile, reconcile_pass, Context, PassSummary};
pub use error::ReconcileError;
pub use spec::{OfferingSpec, ValidationError};
pub use store::{ApplyOutcome, KubeStore, ObjectStore, OfferingStatusWriter};
