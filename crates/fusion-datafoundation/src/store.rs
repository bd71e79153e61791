//! Store seam between the reconciler and the API server
//!
//! The reconciler only needs a namespaced get, a create and an optimistic
//! update per managed kind, plus a status patch on the parent offering.
//! Keeping these behind traits lets tests drive whole passes without a
//! cluster.

use std::fmt::Debug;
use std::marker::PhantomData;

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use fusion_common::crd::{ManagedFusionOffering, ManagedFusionOfferingStatus};
use fusion_common::kube_utils::is_conflict;
use fusion_common::{Error, FIELD_MANAGER};

/// Result of applying a desired object
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The object did not exist and was created
    Created,
    /// The object existed and differed
    Updated,
    /// The object already matched
    Unchanged,
}

/// Typed access to namespaced objects of one kind
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore<K: Send + Sync + 'static>: Send + Sync {
    /// Fetch an object; `Ok(None)` if it does not exist
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, Error>;

    /// Create an object
    ///
    /// Fails with [`Error::Conflict`] if it appeared since it was read.
    async fn create(&self, obj: &K) -> Result<K, Error>;

    /// Replace an object
    ///
    /// `obj` carries the `resourceVersion` it was read at; fails with
    /// [`Error::Conflict`] if the stored object has moved on.
    async fn update(&self, obj: &K) -> Result<K, Error>;
}

/// Writes the observed state of an offering
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OfferingStatusWriter: Send + Sync {
    /// Merge-patch the status subresource
    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ManagedFusionOfferingStatus,
    ) -> Result<(), Error>;
}

/// Create `desired` if nothing is stored, update it if it differs
pub async fn apply<K>(
    store: &dyn ObjectStore<K>,
    current: Option<&K>,
    desired: &K,
) -> Result<ApplyOutcome, Error>
where
    K: PartialEq + Send + Sync + 'static,
{
    match current {
        None => {
            store.create(desired).await?;
            Ok(ApplyOutcome::Created)
        }
        Some(current) if current == desired => Ok(ApplyOutcome::Unchanged),
        Some(_) => {
            store.update(desired).await?;
            Ok(ApplyOutcome::Updated)
        }
    }
}

/// [`ObjectStore`] backed by the Kubernetes API
pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K> KubeStore<K> {
    /// Create a store using the given client
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }
}

impl<K> KubeStore<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    fn api_for(&self, obj: &K) -> Result<(Api<K>, String), Error> {
        let name = obj.meta().name.clone().ok_or_else(|| {
            Error::internal_with_context("store", format!("{} has no name", K::kind(&())))
        })?;
        let namespace = obj.meta().namespace.clone().ok_or_else(|| {
            Error::internal_with_context(
                "store",
                format!("{} {} has no namespace", K::kind(&()), name),
            )
        })?;
        Ok((Api::namespaced(self.client.clone(), &namespace), name))
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(FIELD_MANAGER.to_string()),
        ..Default::default()
    }
}

/// Map a write failure, classifying 409s as conflicts on `kind`/`name`
fn write_error<K: Resource<DynamicType = ()>>(err: kube::Error, name: &str) -> Error {
    if !is_conflict(&err) {
        return err.into();
    }
    let message = match &err {
        kube::Error::Api(ae) => ae.message.clone(),
        other => other.to_string(),
    };
    Error::conflict(K::kind(&()), name, message)
}

#[async_trait]
impl<K> ObjectStore<K> for KubeStore<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, Error> {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn create(&self, obj: &K) -> Result<K, Error> {
        let (api, name) = self.api_for(obj)?;
        api.create(&post_params(), obj)
            .await
            .map_err(|e| write_error::<K>(e, &name))
    }

    async fn update(&self, obj: &K) -> Result<K, Error> {
        let (api, name) = self.api_for(obj)?;
        api.replace(&name, &post_params(), obj)
            .await
            .map_err(|e| write_error::<K>(e, &name))
    }
}

#[async_trait]
impl OfferingStatusWriter for KubeStore<ManagedFusionOffering> {
    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &ManagedFusionOfferingStatus,
    ) -> Result<(), Error> {
        let api: Api<ManagedFusionOffering> = Api::namespaced(self.client.clone(), namespace);
        let patch = serde_json::json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }
}
