//! Test doubles shared by the reconciler tests

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use k8s_openapi::api::core::v1::ObjectReference;
use kube::core::ErrorResponse;
use kube::runtime::events::EventType;
use kube::Resource;

use fusion_common::clock::FixedClock;
use fusion_common::crd::{
    ManagedFusionOffering, ManagedFusionOfferingSpec, ManagedFusionOfferingStatus, OfferingKind,
};
use fusion_common::events::EventPublisher;
use fusion_common::Error;

use crate::controller::Context;
use crate::store::{ObjectStore, OfferingStatusWriter};

pub(crate) const NAMESPACE: &str = "fusion-agent";

/// Store that behaves like the API server for get/create/replace
pub(crate) struct InMemoryStore<K> {
    objects: Mutex<BTreeMap<(String, String), K>>,
    version: AtomicU64,
    writes: AtomicUsize,
}

impl<K> Default for InMemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            version: AtomicU64::new(0),
            writes: AtomicUsize::new(0),
        }
    }
}

impl<K> InMemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    fn key(obj: &K) -> (String, String) {
        (
            obj.meta().namespace.clone().unwrap_or_default(),
            obj.meta().name.clone().unwrap_or_default(),
        )
    }

    fn stamp(&self, obj: &mut K) {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        obj.meta_mut().resource_version = Some(version.to_string());
    }

    /// Store an object without counting it as a write
    pub(crate) fn seed(&self, mut obj: K) {
        self.stamp(&mut obj);
        self.objects.lock().unwrap().insert(Self::key(&obj), obj);
    }

    pub(crate) fn object(&self, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(NAMESPACE.to_string(), name.to_string()))
            .cloned()
    }

    /// Creates and updates performed through the store trait
    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<K> ObjectStore<K> for InMemoryStore<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<K>, Error> {
        Ok(self
            .objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn create(&self, obj: &K) -> Result<K, Error> {
        let key = Self::key(obj);
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(Error::conflict(K::kind(&()), key.1, "already exists"));
        }
        let mut stored = obj.clone();
        self.stamp(&mut stored);
        objects.insert(key, stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }

    async fn update(&self, obj: &K) -> Result<K, Error> {
        let key = Self::key(obj);
        let mut objects = self.objects.lock().unwrap();
        let Some(existing) = objects.get(&key) else {
            return Err(Error::from(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: format!("{} not found", key.1),
                reason: "NotFound".to_string(),
                code: 404,
            })));
        };
        if existing.meta().resource_version != obj.meta().resource_version {
            return Err(Error::conflict(
                K::kind(&()),
                key.1,
                "the object has been modified",
            ));
        }
        let mut stored = obj.clone();
        self.stamp(&mut stored);
        objects.insert(key, stored.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(stored)
    }
}

/// Status writer that keeps every patch
#[derive(Default)]
pub(crate) struct RecordingStatusWriter {
    patches: Mutex<Vec<ManagedFusionOfferingStatus>>,
}

impl RecordingStatusWriter {
    pub(crate) fn patches(&self) -> Vec<ManagedFusionOfferingStatus> {
        self.patches.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> Option<ManagedFusionOfferingStatus> {
        self.patches.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl OfferingStatusWriter for RecordingStatusWriter {
    async fn patch_status(
        &self,
        _namespace: &str,
        _name: &str,
        status: &ManagedFusionOfferingStatus,
    ) -> Result<(), Error> {
        self.patches.lock().unwrap().push(status.clone());
        Ok(())
    }
}

/// Event publisher that keeps the reason of every event
#[derive(Default)]
pub(crate) struct RecordingPublisher {
    reasons: Mutex<Vec<String>>,
}

impl RecordingPublisher {
    pub(crate) fn reasons(&self) -> Vec<String> {
        self.reasons.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        _resource_ref: &ObjectReference,
        _type_: EventType,
        reason: &str,
        _action: &str,
        _note: Option<String>,
    ) {
        self.reasons.lock().unwrap().push(reason.to_string());
    }
}

/// Offering with a UID and generation, as the API server would return it
pub(crate) fn offering(config: &[(&str, &str)]) -> ManagedFusionOffering {
    let mut offering = ManagedFusionOffering::new(
        "managed-fusion-df",
        ManagedFusionOfferingSpec {
            kind: OfferingKind::DataFoundation,
            config: config
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        },
    );
    offering.metadata.namespace = Some(NAMESPACE.to_string());
    offering.metadata.uid = Some("offering-uid".to_string());
    offering.metadata.generation = Some(1);
    offering
}

pub(crate) fn context(
    secrets: Arc<dyn ObjectStore<k8s_openapi::api::core::v1::Secret>>,
    storage_clusters: Arc<dyn ObjectStore<fusion_common::crd::StorageCluster>>,
    status: Arc<dyn OfferingStatusWriter>,
    events: Arc<dyn EventPublisher>,
) -> Context {
    Context {
        namespace: NAMESPACE.to_string(),
        secrets,
        storage_clusters,
        status,
        events,
        clock: Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        )),
    }
}
