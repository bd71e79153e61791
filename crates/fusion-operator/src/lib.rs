//! Managed fusion agent: offering controller wiring and startup utilities

#![deny(missing_docs)]

pub mod controller_runner;
/// Startup utilities (CRD install, CRD bootstrap)
pub mod startup;
