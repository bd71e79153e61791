//! Common types for the managed fusion agent: CRDs, errors, events and utilities

#![deny(missing_docs)]

pub mod clock;
pub mod crd;
pub mod error;
pub mod events;
pub mod kube_utils;
pub mod telemetry;

pub use clock::{Clock, SystemClock};
pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Namespace the agent runs in when none is configured
pub const DEFAULT_AGENT_NAMESPACE: &str = "fusion-agent";

/// Field manager recorded on every write the agent makes
pub const FIELD_MANAGER: &str = "fusion-agent";
