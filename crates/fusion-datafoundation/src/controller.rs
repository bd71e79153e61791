//! ManagedFusionOffering reconciliation controller
//!
//! Each pass re-reads both managed resources, recomputes what they should
//! look like from the offering's config, and applies the onboarding secret
//! before the StorageCluster. The first failure ends the pass with nothing
//! rolled back; the next pass starts over from store state.
//!
//! Two fields only ever move one way: the `default` device set count and the
//! gateway strategy. Requests that would move them back are logged, published
//! as Warning events and otherwise ignored.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::runtime::controller::Action;
use kube::runtime::events::EventType;
use kube::{Client, Resource, ResourceExt};
use tracing::{debug, error, info, warn};

use fusion_common::crd::{
    FeatureStrategy, ManagedFusionOffering, ManagedFusionOfferingStatus, OfferingPhase,
    StorageCluster,
};
use fusion_common::events::{actions, reasons, EventPublisher, KubeEventPublisher};
use fusion_common::{Clock, SystemClock};

use crate::error::ReconcileError;
use crate::secret::{desired_secret, ONBOARDING_SECRET_NAME};
use crate::spec::OfferingSpec;
use crate::store::{apply, ApplyOutcome, KubeStore, ObjectStore, OfferingStatusWriter};
use crate::topology::{desired_storage_cluster, TopologyPlan, STORAGE_CLUSTER_NAME};

/// Reporting component on published events
pub const CONTROLLER_NAME: &str = "fusion-offering-controller";

/// Periodic re-check after a successful pass
pub const RESYNC_INTERVAL: Duration = Duration::from_secs(300);

/// Dependencies of the reconciler
///
/// Every collaborator is behind a trait so tests can swap in doubles.
pub struct Context {
    /// Namespace the managed resources live in
    pub namespace: String,
    /// Onboarding secret store
    pub secrets: Arc<dyn ObjectStore<Secret>>,
    /// StorageCluster store
    pub storage_clusters: Arc<dyn ObjectStore<StorageCluster>>,
    /// Offering status writer
    pub status: Arc<dyn OfferingStatusWriter>,
    /// Kubernetes event publisher
    pub events: Arc<dyn EventPublisher>,
    /// Source of status timestamps
    pub clock: Arc<dyn Clock>,
}

impl Context {
    /// Create a context backed by the Kubernetes API
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            secrets: Arc::new(KubeStore::<Secret>::new(client.clone())),
            storage_clusters: Arc::new(KubeStore::<StorageCluster>::new(client.clone())),
            status: Arc::new(KubeStore::<ManagedFusionOffering>::new(client.clone())),
            events: Arc::new(KubeEventPublisher::new(client, CONTROLLER_NAME)),
            clock: Arc::new(SystemClock),
        }
    }
}

/// What a successful pass did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassSummary {
    /// Onboarding secret apply result
    pub secret: ApplyOutcome,
    /// StorageCluster apply result
    pub storage_cluster: ApplyOutcome,
    /// Count written to the `default` device set
    pub device_set_count: i32,
    /// Gateway strategy written to the StorageCluster
    pub feature_strategy: FeatureStrategy,
}

/// Reconcile a ManagedFusionOffering
///
/// Runs one pass and records its outcome on the offering's status.
pub async fn reconcile(
    offering: Arc<ManagedFusionOffering>,
    ctx: Arc<Context>,
) -> Result<Action, ReconcileError> {
    let name = offering.name_any();

    if offering.metadata.deletion_timestamp.is_some() {
        debug!(offering = %name, "Offering is being deleted, owned resources are garbage collected");
        return Ok(Action::await_change());
    }

    info!(offering = %name, kind = ?offering.spec.kind, "Reconciling ManagedFusionOffering");

    match reconcile_pass(&offering, &ctx).await {
        Ok(summary) => {
            info!(
                offering = %name,
                secret = ?summary.secret,
                storage_cluster = ?summary.storage_cluster,
                device_sets = summary.device_set_count,
                feature = ?summary.feature_strategy,
                "Offering reconciled"
            );
            let status = ready_status(&offering, &summary, ctx.clock.now());
            update_status(&offering, &ctx, status).await?;
            Ok(Action::requeue(RESYNC_INTERVAL))
        }
        Err(e) => {
            if let ReconcileError::Validation(ref validation) = e {
                warn!(
                    offering = %name,
                    fields = ?validation.fields(),
                    "Offering config failed validation"
                );
                ctx.events
                    .publish(
                        &offering.object_ref(&()),
                        EventType::Warning,
                        reasons::VALIDATION_FAILED,
                        actions::RECONCILE,
                        Some(validation.to_string()),
                    )
                    .await;
            }

            // a conflict only means we raced another writer
            if !e.is_conflict() {
                let status = failed_status(&offering, &e, ctx.clock.now());
                if let Err(status_err) = update_status(&offering, &ctx, status).await {
                    warn!(offering = %name, error = %status_err, "Failed to record failed status");
                }
            }
            Err(e)
        }
    }
}

/// One full pass: parse, then apply the secret, then the StorageCluster
pub async fn reconcile_pass(
    offering: &ManagedFusionOffering,
    ctx: &Context,
) -> Result<PassSummary, ReconcileError> {
    let name = offering.name_any();

    let spec = OfferingSpec::parse(&offering.spec.config)?;
    debug!(
        offering = %name,
        usable_capacity_units = spec.usable_capacity_units,
        enable_feature = spec.enable_feature,
        "Offering config parsed"
    );

    let owner = OwnerReference {
        block_owner_deletion: Some(true),
        ..offering
            .controller_owner_ref(&())
            .ok_or_else(|| ReconcileError::MissingOwnerIdentity(name.clone()))?
    };

    let secret = reconcile_onboarding_secret(&spec, &owner, ctx).await?;
    let (storage_cluster, plan) = reconcile_storage_cluster(offering, &spec, &owner, ctx).await?;

    Ok(PassSummary {
        secret,
        storage_cluster,
        device_set_count: plan.device_set_count,
        feature_strategy: plan.feature.strategy,
    })
}

async fn reconcile_onboarding_secret(
    spec: &OfferingSpec,
    owner: &OwnerReference,
    ctx: &Context,
) -> Result<ApplyOutcome, ReconcileError> {
    let current = ctx
        .secrets
        .get(&ctx.namespace, ONBOARDING_SECRET_NAME)
        .await?;
    let desired = desired_secret(
        current.as_ref(),
        &ctx.namespace,
        owner,
        &spec.onboarding_validation_key,
    )
    .map_err(|source| ReconcileError::AlreadyOwned {
        kind: "Secret",
        name: ONBOARDING_SECRET_NAME.to_string(),
        source,
    })?;

    let outcome = apply(ctx.secrets.as_ref(), current.as_ref(), &desired).await?;
    debug!(secret = ONBOARDING_SECRET_NAME, ?outcome, "Onboarding secret applied");
    Ok(outcome)
}

async fn reconcile_storage_cluster(
    offering: &ManagedFusionOffering,
    spec: &OfferingSpec,
    owner: &OwnerReference,
    ctx: &Context,
) -> Result<(ApplyOutcome, TopologyPlan), ReconcileError> {
    let name = offering.name_any();
    let current = ctx
        .storage_clusters
        .get(&ctx.namespace, STORAGE_CLUSTER_NAME)
        .await?;
    let plan = desired_storage_cluster(current.as_ref(), &ctx.namespace, owner, spec)?;

    if plan.scale.downscale_rejected() {
        warn!(
            offering = %name,
            desired = plan.scale.desired,
            current = plan.scale.current,
            "Requested capacity would shrink the storage cluster, keeping current device sets"
        );
        ctx.events
            .publish(
                &offering.object_ref(&()),
                EventType::Warning,
                reasons::DOWNSCALE_REJECTED,
                actions::SCALE,
                Some(format!(
                    "requested {} device sets but {} are provisioned; scaling down is not supported",
                    plan.scale.desired, plan.scale.current
                )),
            )
            .await;
    }

    if plan.feature.disable_ignored {
        warn!(offering = %name, "Gateway disable requested after enable, ignoring");
        ctx.events
            .publish(
                &offering.object_ref(&()),
                EventType::Warning,
                reasons::FEATURE_DISABLE_IGNORED,
                actions::TOGGLE,
                Some("the gateway cannot be disabled once enabled".to_string()),
            )
            .await;
    }

    let outcome = apply(ctx.storage_clusters.as_ref(), current.as_ref(), &plan.cluster).await?;
    debug!(
        storage_cluster = STORAGE_CLUSTER_NAME,
        ?outcome,
        device_sets = plan.device_set_count,
        "StorageCluster applied"
    );
    Ok((outcome, plan))
}

fn ready_status(
    offering: &ManagedFusionOffering,
    summary: &PassSummary,
    now: DateTime<Utc>,
) -> ManagedFusionOfferingStatus {
    ManagedFusionOfferingStatus {
        phase: OfferingPhase::Ready,
        message: None,
        observed_generation: offering.metadata.generation,
        device_set_count: Some(summary.device_set_count),
        feature_strategy: Some(summary.feature_strategy),
        last_reconciled: Some(now.to_rfc3339()),
    }
}

/// Failed status; the last applied count and strategy are kept
fn failed_status(
    offering: &ManagedFusionOffering,
    error: &ReconcileError,
    now: DateTime<Utc>,
) -> ManagedFusionOfferingStatus {
    let previous = offering.status.clone().unwrap_or_default();
    ManagedFusionOfferingStatus {
        phase: OfferingPhase::Failed,
        message: Some(error.to_string()),
        observed_generation: offering.metadata.generation,
        device_set_count: previous.device_set_count,
        feature_strategy: previous.feature_strategy,
        last_reconciled: Some(now.to_rfc3339()),
    }
}

/// Update ManagedFusionOffering status
async fn update_status(
    offering: &ManagedFusionOffering,
    ctx: &Context,
    status: ManagedFusionOfferingStatus,
) -> Result<(), ReconcileError> {
    // Check if status already matches - avoid update loop
    if let Some(ref current) = offering.status {
        if current.same_outcome(&status) {
            debug!(offering = %offering.name_any(), "Status unchanged, skipping update");
            return Ok(());
        }
    }

    let namespace = offering
        .namespace()
        .unwrap_or_else(|| ctx.namespace.clone());
    ctx.status
        .patch_status(&namespace, &offering.name_any(), &status)
        .await?;

    info!(offering = %offering.name_any(), phase = ?status.phase, "Updated offering status");
    Ok(())
}

/// Error policy for the controller
///
/// Conflicts retry almost immediately against a fresh read. Invalid config
/// waits for the offering to change.
pub fn error_policy(
    offering: Arc<ManagedFusionOffering>,
    error: &ReconcileError,
    _ctx: Arc<Context>,
) -> Action {
    let name = offering.name_any();
    match error.requeue_after() {
        Some(delay) if error.is_conflict() => {
            debug!(offering = %name, %error, "Write conflict, retrying");
            Action::requeue(delay)
        }
        Some(delay) => {
            error!(
                offering = %name,
                %error,
                retry_after_secs = delay.as_secs(),
                "Reconciliation failed"
            );
            Action::requeue(delay)
        }
        None => {
            warn!(offering = %name, %error, "Reconciliation failed, waiting for offering change");
            Action::await_change()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CONFLICT_REQUEUE, STORE_REQUEUE};
    use crate::secret::{materialize, ONBOARDING_SECRET_DATA_KEY};
    use crate::spec::{ENABLE_FEATURE_KEY, ONBOARDING_VALIDATION_KEY, USABLE_CAPACITY_KEY};
    use crate::store::{MockObjectStore, MockOfferingStatusWriter};
    use crate::testing::{
        context, offering, InMemoryStore, RecordingPublisher, RecordingStatusWriter, NAMESPACE,
    };
    use crate::topology::{provider_template, DEVICE_SET_NAME};
    use fusion_common::events::NoopEventPublisher;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use kube::core::ErrorResponse;

    struct Harness {
        secrets: Arc<InMemoryStore<Secret>>,
        clusters: Arc<InMemoryStore<StorageCluster>>,
        status: Arc<RecordingStatusWriter>,
        events: Arc<RecordingPublisher>,
        ctx: Arc<Context>,
    }

    impl Harness {
        fn new() -> Self {
            let secrets = Arc::new(InMemoryStore::<Secret>::default());
            let clusters = Arc::new(InMemoryStore::<StorageCluster>::default());
            let status = Arc::new(RecordingStatusWriter::default());
            let events = Arc::new(RecordingPublisher::default());
            let ctx = Arc::new(context(
                secrets.clone(),
                clusters.clone(),
                status.clone(),
                events.clone(),
            ));
            Self {
                secrets,
                clusters,
                status,
                events,
                ctx,
            }
        }

        fn cluster(&self) -> StorageCluster {
            self.clusters.object(STORAGE_CLUSTER_NAME).unwrap()
        }

        fn writes(&self) -> usize {
            self.secrets.writes() + self.clusters.writes()
        }
    }

    fn full_config(units: &'static str, enable: &'static str) -> Vec<(&'static str, &'static str)> {
        vec![
            (USABLE_CAPACITY_KEY, units),
            (ONBOARDING_VALIDATION_KEY, "KEY123"),
            (ENABLE_FEATURE_KEY, enable),
        ]
    }

    fn api_error(code: u16, reason: &str) -> fusion_common::Error {
        fusion_common::Error::from(kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: reason.to_string(),
            reason: reason.to_string(),
            code,
        }))
    }

    /// Stores that fail the test if the pass touches them
    fn untouched_context() -> Context {
        let mut secrets = MockObjectStore::<Secret>::new();
        secrets.expect_get().times(0);
        secrets.expect_create().times(0);
        secrets.expect_update().times(0);
        let mut clusters = MockObjectStore::<StorageCluster>::new();
        clusters.expect_get().times(0);
        clusters.expect_create().times(0);
        clusters.expect_update().times(0);
        context(
            Arc::new(secrets),
            Arc::new(clusters),
            Arc::new(RecordingStatusWriter::default()),
            Arc::new(NoopEventPublisher),
        )
    }

    // =========================================================================
    // Full passes against the in-memory store
    // =========================================================================

    #[tokio::test]
    async fn empty_store_converges_in_one_pass() {
        let h = Harness::new();
        let action = reconcile(Arc::new(offering(&full_config("10", "true"))), h.ctx.clone())
            .await
            .unwrap();
        assert_eq!(action, Action::requeue(RESYNC_INTERVAL));

        let secret = h.secrets.object(ONBOARDING_SECRET_NAME).unwrap();
        let payload = &secret.data.as_ref().unwrap()[ONBOARDING_SECRET_DATA_KEY].0;
        assert_eq!(
            String::from_utf8(payload.clone()).unwrap(),
            "-----BEGIN PUBLIC KEY-----\nKEY123\n-----END PUBLIC KEY-----"
        );
        let secret_owner = &secret.metadata.owner_references.as_ref().unwrap()[0];
        assert_eq!(secret_owner.uid, "offering-uid");
        assert_eq!(secret_owner.controller, Some(true));
        assert_eq!(secret_owner.block_owner_deletion, Some(true));

        let cluster = h.cluster();
        assert_eq!(cluster.device_set(DEVICE_SET_NAME).unwrap().count, 3);
        assert_eq!(cluster.gateway_strategy(), FeatureStrategy::Enabled);
        let cluster_owner = &cluster.metadata.owner_references.as_ref().unwrap()[0];
        assert_eq!(cluster_owner.kind, "ManagedFusionOffering");
        assert_eq!(cluster_owner.controller, Some(true));
        assert_eq!(cluster_owner.block_owner_deletion, Some(true));

        let status = h.status.last().unwrap();
        assert_eq!(status.phase, OfferingPhase::Ready);
        assert_eq!(status.device_set_count, Some(3));
        assert_eq!(status.feature_strategy, Some(FeatureStrategy::Enabled));
        assert_eq!(status.observed_generation, Some(1));
        assert_eq!(
            status.last_reconciled.as_deref(),
            Some("2024-05-01T12:00:00+00:00")
        );
        assert!(h.events.reasons().is_empty());
    }

    #[tokio::test]
    async fn second_pass_mutates_nothing() {
        let h = Harness::new();
        let mut parent = offering(&full_config("10", "true"));

        let first = reconcile_pass(&parent, &h.ctx).await.unwrap();
        assert_eq!(first.secret, ApplyOutcome::Created);
        assert_eq!(first.storage_cluster, ApplyOutcome::Created);
        assert_eq!(h.writes(), 2);

        let second = reconcile_pass(&parent, &h.ctx).await.unwrap();
        assert_eq!(second.secret, ApplyOutcome::Unchanged);
        assert_eq!(second.storage_cluster, ApplyOutcome::Unchanged);
        assert_eq!(h.writes(), 2);

        // status is not rewritten once the watcher has delivered it back
        reconcile(Arc::new(parent.clone()), h.ctx.clone())
            .await
            .unwrap();
        assert_eq!(h.status.patches().len(), 1);
        parent.status = h.status.last();
        reconcile(Arc::new(parent), h.ctx.clone()).await.unwrap();
        assert_eq!(h.status.patches().len(), 1);
        assert_eq!(h.writes(), 2);
    }

    #[tokio::test]
    async fn capacity_increase_scales_up() {
        let h = Harness::new();
        reconcile_pass(&offering(&full_config("10", "false")), &h.ctx)
            .await
            .unwrap();

        let summary = reconcile_pass(&offering(&full_config("20", "false")), &h.ctx)
            .await
            .unwrap();
        assert_eq!(summary.secret, ApplyOutcome::Unchanged);
        assert_eq!(summary.storage_cluster, ApplyOutcome::Updated);
        assert_eq!(h.cluster().device_set(DEVICE_SET_NAME).unwrap().count, 5);
    }

    #[tokio::test]
    async fn capacity_decrease_is_rejected_with_event() {
        let h = Harness::new();
        let mut existing = provider_template(NAMESPACE);
        existing.spec.storage_device_sets[0].count = 5;
        h.clusters.seed(existing);

        let summary = reconcile_pass(&offering(&full_config("4", "false")), &h.ctx)
            .await
            .unwrap();
        assert_eq!(summary.device_set_count, 5);
        assert_eq!(h.cluster().device_set(DEVICE_SET_NAME).unwrap().count, 5);
        assert_eq!(h.events.reasons(), vec![reasons::DOWNSCALE_REJECTED]);
    }

    #[tokio::test]
    async fn disable_after_enable_is_ignored_with_event() {
        let h = Harness::new();
        reconcile_pass(&offering(&full_config("8", "true")), &h.ctx)
            .await
            .unwrap();

        let summary = reconcile_pass(&offering(&full_config("8", "false")), &h.ctx)
            .await
            .unwrap();
        assert_eq!(summary.feature_strategy, FeatureStrategy::Enabled);
        assert_eq!(summary.storage_cluster, ApplyOutcome::Unchanged);
        assert_eq!(h.cluster().gateway_strategy(), FeatureStrategy::Enabled);
        assert_eq!(h.events.reasons(), vec![reasons::FEATURE_DISABLE_IGNORED]);
    }

    #[tokio::test]
    async fn key_change_updates_only_the_secret() {
        let h = Harness::new();
        reconcile_pass(&offering(&full_config("8", "false")), &h.ctx)
            .await
            .unwrap();

        let summary = reconcile_pass(
            &offering(&[
                (USABLE_CAPACITY_KEY, "8"),
                (ONBOARDING_VALIDATION_KEY, "ROTATED"),
            ]),
            &h.ctx,
        )
        .await
        .unwrap();
        assert_eq!(summary.secret, ApplyOutcome::Updated);
        assert_eq!(summary.storage_cluster, ApplyOutcome::Unchanged);

        let secret = h.secrets.object(ONBOARDING_SECRET_NAME).unwrap();
        assert_eq!(
            secret.data.unwrap()[ONBOARDING_SECRET_DATA_KEY].0,
            materialize("ROTATED")
        );
    }

    // =========================================================================
    // Failure paths
    // =========================================================================

    #[tokio::test]
    async fn invalid_config_touches_nothing() {
        let ctx = Arc::new(untouched_context());
        let parent = offering(&[(USABLE_CAPACITY_KEY, "10")]);

        let err = reconcile_pass(&parent, &ctx).await.unwrap_err();
        match err {
            ReconcileError::Validation(ref v) => {
                assert_eq!(v.fields(), vec![ONBOARDING_VALIDATION_KEY]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_config_records_failure_and_event() {
        let h = Harness::new();
        let err = reconcile(
            Arc::new(offering(&[(USABLE_CAPACITY_KEY, "0")])),
            h.ctx.clone(),
        )
        .await
        .unwrap_err();

        assert!(!err.is_retryable());
        assert_eq!(h.writes(), 0);
        assert_eq!(h.events.reasons(), vec![reasons::VALIDATION_FAILED]);

        let status = h.status.last().unwrap();
        assert_eq!(status.phase, OfferingPhase::Failed);
        let message = status.message.unwrap();
        assert!(message.contains(USABLE_CAPACITY_KEY));
        assert!(message.contains(ONBOARDING_VALIDATION_KEY));
    }

    #[tokio::test]
    async fn secret_failure_skips_storage_cluster() {
        let mut secrets = MockObjectStore::<Secret>::new();
        secrets.expect_get().returning(|_, _| Ok(None));
        secrets
            .expect_create()
            .times(1)
            .returning(|_| Err(api_error(500, "InternalError")));
        let mut clusters = MockObjectStore::<StorageCluster>::new();
        clusters.expect_get().times(0);
        clusters.expect_create().times(0);
        clusters.expect_update().times(0);
        let status = Arc::new(RecordingStatusWriter::default());
        let ctx = Arc::new(context(
            Arc::new(secrets),
            Arc::new(clusters),
            status.clone(),
            Arc::new(NoopEventPublisher),
        ));

        let err = reconcile(Arc::new(offering(&full_config("10", "true"))), ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::Store(_)));
        assert_eq!(err.requeue_after(), Some(STORE_REQUEUE));
        assert_eq!(status.last().unwrap().phase, OfferingPhase::Failed);
    }

    #[tokio::test]
    async fn stale_update_is_a_conflict_and_leaves_status_alone() {
        let mut secrets = MockObjectStore::<Secret>::new();
        secrets.expect_get().returning(|_, _| Ok(None));
        secrets.expect_create().returning(|obj| Ok(obj.clone()));
        let mut clusters = MockObjectStore::<StorageCluster>::new();
        clusters.expect_get().returning(|_, _| {
            let mut current = provider_template(NAMESPACE);
            current.metadata.resource_version = Some("1".to_string());
            Ok(Some(current))
        });
        clusters.expect_update().times(1).returning(|_| {
            Err(fusion_common::Error::conflict(
                "StorageCluster",
                STORAGE_CLUSTER_NAME,
                "the object has been modified",
            ))
        });
        let mut status = MockOfferingStatusWriter::new();
        status.expect_patch_status().times(0);
        let ctx = Arc::new(context(
            Arc::new(secrets),
            Arc::new(clusters),
            Arc::new(status),
            Arc::new(NoopEventPublisher),
        ));

        let parent = Arc::new(offering(&full_config("10", "true")));
        let err = reconcile(parent.clone(), ctx.clone()).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(err.is_retryable());
        assert_eq!(
            error_policy(parent, &err, ctx),
            Action::requeue(CONFLICT_REQUEUE)
        );
    }

    #[tokio::test]
    async fn foreign_controller_blocks_adoption() {
        let h = Harness::new();
        let mut existing = provider_template(NAMESPACE);
        existing.metadata.owner_references = Some(vec![OwnerReference {
            api_version: "apps/v1".to_string(),
            kind: "Deployment".to_string(),
            name: "someone-else".to_string(),
            uid: "other-uid".to_string(),
            controller: Some(true),
            block_owner_deletion: None,
        }]);
        h.clusters.seed(existing);

        let err = reconcile_pass(&offering(&full_config("10", "false")), &h.ctx)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::AlreadyOwned {
                kind: "StorageCluster",
                ..
            }
        ));
        // the secret step already committed
        assert_eq!(h.secrets.writes(), 1);
        assert_eq!(h.clusters.writes(), 0);
    }

    #[tokio::test]
    async fn offering_without_uid_cannot_own_children() {
        let ctx = Arc::new(untouched_context());
        let mut parent = offering(&full_config("10", "false"));
        parent.metadata.uid = None;

        let err = reconcile_pass(&parent, &ctx).await.unwrap_err();
        assert!(matches!(err, ReconcileError::MissingOwnerIdentity(_)));
    }

    #[tokio::test]
    async fn deleted_offering_is_left_to_garbage_collection() {
        let ctx = Arc::new(untouched_context());
        let mut parent = offering(&full_config("10", "false"));
        parent.metadata.deletion_timestamp = Some(Time(Utc::now()));

        let action = reconcile(Arc::new(parent), ctx).await.unwrap();
        assert_eq!(action, Action::await_change());
    }

    // =========================================================================
    // Error policy
    // =========================================================================

    #[test]
    fn error_policy_waits_on_invalid_config() {
        let ctx = Arc::new(untouched_context());
        let err = ReconcileError::computation("storageDeviceSets.count", "too large");
        assert_eq!(
            error_policy(Arc::new(offering(&[])), &err, ctx),
            Action::await_change()
        );
    }

    #[test]
    fn error_policy_backs_off_on_store_errors() {
        let ctx = Arc::new(untouched_context());
        let err = ReconcileError::from(api_error(503, "ServiceUnavailable"));
        assert_eq!(
            error_policy(Arc::new(offering(&[])), &err, ctx),
            Action::requeue(STORE_REQUEUE)
        );
    }
}
