//! Startup utilities for the agent
//!
//! CRD installation for the agent's own offering type, plus the one-shot
//! bootstrap of the storage operator CRDs.

mod bootstrap;
mod crds;

pub use bootstrap::{
    bootstrap_crds, load_crd_templates, register_crds, BootstrapReport, CrdRegistry,
    KubeCrdRegistry, CRD_TEMPLATE_FILES, DEFAULT_CRD_DIR,
};
pub use crds::{ensure_offering_crd, OFFERING_CRD_NAME};
