//! Onboarding validation key secret
//!
//! The storage provider reads the tenant's onboarding public key from a
//! fixed secret in the agent namespace, PEM-wrapped.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use k8s_openapi::ByteString;
use kube::api::ObjectMeta;

use fusion_common::kube_utils::{set_controller_reference, AlreadyOwned};

/// Name of the secret the provider reads the onboarding key from
pub const ONBOARDING_SECRET_NAME: &str = "onboarding-ticket-key";
/// Data key holding the wrapped public key
pub const ONBOARDING_SECRET_DATA_KEY: &str = "key";

const PEM_HEADER: &str = "-----BEGIN PUBLIC KEY-----";
const PEM_FOOTER: &str = "-----END PUBLIC KEY-----";

/// Wrap a validation key in public-key PEM armour
///
/// Surrounding whitespace in `key` is dropped; nothing else is altered.
pub fn materialize(key: &str) -> Vec<u8> {
    format!("{}\n{}\n{}", PEM_HEADER, key.trim(), PEM_FOOTER).into_bytes()
}

/// Desired onboarding secret, derived from what is stored (if anything)
///
/// Labels, annotations and foreign owner references on an existing secret
/// are preserved; only the payload and our controller reference are set.
pub fn desired_secret(
    current: Option<&Secret>,
    namespace: &str,
    owner: &OwnerReference,
    validation_key: &str,
) -> Result<Secret, AlreadyOwned> {
    let mut secret = current.cloned().unwrap_or_else(|| Secret {
        metadata: ObjectMeta {
            name: Some(ONBOARDING_SECRET_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        ..Default::default()
    });

    set_controller_reference(&mut secret.metadata, owner)?;
    secret.data = Some(BTreeMap::from([(
        ONBOARDING_SECRET_DATA_KEY.to_string(),
        ByteString(materialize(validation_key)),
    )]));
    Ok(secret)
}
