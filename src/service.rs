use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::error::{PermitError, StoreError};
use crate::store::{Record, RecordStore, Versioned};
use crate::workflow::{
    ActionRequest, ActionResponse, Limits, Permit, Role, RoleEmails, TimeWindow, Transition,
    TransitionEngine, Worker, WorkerAction, WorkerProfile,
};

/// Configuration for conflict retries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt before a conflict is reported.
    pub max_retries: u32,
    /// Base delay in milliseconds for exponential backoff.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 25,
        }
    }
}

impl RetryConfig {
    /// delay = base_delay_ms * 2^(attempt - 1), saturating at `u64::MAX`.
    pub fn delay_for_attempt(&self, attempt: u32) -> u64 {
        let factor = 2u64
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        self.base_delay_ms.saturating_mul(factor)
    }
}

/// Input for creating a permit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPermit {
    pub validity_window: TimeWindow,
    pub role_emails: RoleEmails,
}

/// Runs permit and worker actions against a record store.
///
/// Every action is a read-validate-write cycle: the record is read with its
/// version, the engine computes the next value, and the store accepts it only
/// if the version is unchanged. On a version conflict the whole cycle runs
/// again on a fresh read.
pub struct PermitService<S> {
    store: S,
    engine: TransitionEngine,
    retry: RetryConfig,
    permit_id_offset: u64,
}

impl<S: RecordStore> PermitService<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, Limits::default(), RetryConfig::default(), 1000)
    }

    pub fn with_settings(
        store: S,
        limits: Limits,
        retry: RetryConfig,
        permit_id_offset: u64,
    ) -> Self {
        Self {
            store,
            engine: TransitionEngine::new(limits),
            retry,
            permit_id_offset,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a permit in `New` status with a fresh `WP-<n>` id.
    pub async fn create_permit(&self, input: NewPermit) -> Result<Permit, PermitError> {
        self.engine.validate_permit_window(&input.validity_window)?;
        let n = self.store.next_id("permit").await.map_err(storage)?;
        let id = format!("WP-{}", self.permit_id_offset + n);
        let permit = Permit::new(id, input.validity_window, input.role_emails, Utc::now());
        self.store.insert(&permit).await.map_err(storage)?;
        tracing::info!(permit = %permit.id, "permit created");
        Ok(permit)
    }

    pub async fn get_permit(&self, id: &str) -> Result<Permit, PermitError> {
        Ok(self.read::<Permit>(id).await?.value)
    }

    pub async fn list_permits(&self) -> Result<Vec<Permit>, PermitError> {
        self.store.list().await.map_err(storage)
    }

    /// Apply one action to a permit and return the committed transition.
    pub async fn handle(&self, request: &ActionRequest) -> Result<Transition, PermitError> {
        let mut transition = None;
        let result = self
            .update::<Permit, _>(&request.permit_id, |current| {
                let (next, t) = self.engine.apply(current, request, Utc::now())?;
                transition = Some(t);
                Ok(next)
            })
            .await;

        match (result, transition) {
            (Ok(_), Some(t)) => {
                tracing::info!(
                    permit = %t.permit_id,
                    role = %t.role,
                    action = %t.action,
                    from = %t.from,
                    to = %t.to,
                    "transition committed"
                );
                Ok(t)
            }
            (Ok(_), None) => Err(PermitError::StorageUnavailable(
                "update committed without a transition".into(),
            )),
            (Err(e), _) => {
                tracing::info!(
                    permit = %request.permit_id,
                    role = %request.role,
                    action = %request.action,
                    error = %e.kind(),
                    "action refused: {e}"
                );
                Err(e)
            }
        }
    }

    /// [`handle`](Self::handle) wrapped in the response envelope.
    pub async fn respond(&self, request: &ActionRequest) -> ActionResponse {
        self.handle(request).await.map(|t| t.to).into()
    }

    pub async fn register_worker(&self, profile: WorkerProfile) -> Result<Worker, PermitError> {
        let n = self.store.next_id("worker").await.map_err(storage)?;
        let worker = Worker::new(format!("W-{n}"), profile, Utc::now());
        self.store.insert(&worker).await.map_err(storage)?;
        tracing::info!(worker = %worker.id, "worker registered");
        Ok(worker)
    }

    pub async fn get_worker(&self, id: &str) -> Result<Worker, PermitError> {
        Ok(self.read::<Worker>(id).await?.value)
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>, PermitError> {
        self.store.list().await.map_err(storage)
    }

    pub async fn act_on_worker(
        &self,
        id: &str,
        role: Role,
        actor: &str,
        action: &WorkerAction,
    ) -> Result<Worker, PermitError> {
        let worker = self
            .update::<Worker, _>(id, |current| current.apply(role, actor, action, Utc::now()))
            .await?;
        tracing::info!(worker = %worker.id, status = %worker.status, %role, "worker updated");
        Ok(worker)
    }

    async fn read<R: Record>(&self, id: &str) -> Result<Versioned<R>, PermitError> {
        tracing::debug!(table = R::TABLE, id, "reading record");
        self.store.get(id).await.map_err(|e| match e {
            StoreError::NotFound(_) => PermitError::NotFound {
                entity: R::KIND,
                id: id.to_string(),
            },
            other => storage(other),
        })
    }

    /// Read, mutate and compare-and-swap `id`, retrying on version conflicts.
    ///
    /// `mutate` runs once per attempt against the freshly read value; its
    /// errors end the cycle without a write.
    async fn update<R, F>(&self, id: &str, mut mutate: F) -> Result<R, PermitError>
    where
        R: Record,
        F: FnMut(&R) -> Result<R, PermitError>,
    {
        let mut attempt = 0;
        loop {
            let current = self.read::<R>(id).await?;
            let next = mutate(&current.value)?;

            match self.store.compare_and_swap(current.version, &next).await {
                Ok(_) => return Ok(next),
                Err(StoreError::Conflict { found, .. }) if attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay_ms = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        id,
                        read_version = current.version,
                        found,
                        attempt,
                        max = self.retry.max_retries,
                        delay_ms,
                        "version conflict, retrying"
                    );
                    sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(StoreError::Conflict { .. }) => {
                    tracing::warn!(id, attempts = attempt + 1, "conflict retries exhausted");
                    return Err(PermitError::Conflict(id.to_string()));
                }
                Err(StoreError::NotFound(_)) => {
                    return Err(PermitError::NotFound {
                        entity: R::KIND,
                        id: id.to_string(),
                    });
                }
                Err(e) => return Err(storage(e)),
            }
        }
    }
}

fn storage(e: StoreError) -> PermitError {
    PermitError::StorageUnavailable(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::store::MemoryStore;
    use crate::workflow::{Action, PermitStatus, RenewalStatus};
    use chrono::{DateTime, TimeZone};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    fn new_permit() -> NewPermit {
        NewPermit {
            validity_window: TimeWindow::new(at(1, 8, 0), at(3, 8, 0)),
            role_emails: RoleEmails {
                requester: "sam@site".into(),
                reviewer: "dana@site".into(),
                approver: "ade@site".into(),
            },
        }
    }

    fn req(id: &str, role: Role, action: Action, payload: Value) -> ActionRequest {
        let (name, email) = match role {
            Role::Requester => ("Sam", "sam@site"),
            Role::Reviewer => ("Dana", "dana@site"),
            Role::Approver => ("Ade", "ade@site"),
        };
        ActionRequest::new(id, role, name, email, action).with_payload(payload)
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            base_delay_ms: 0,
        }
    }

    #[tokio::test]
    async fn end_to_end_scenario() {
        let svc = PermitService::new(MemoryStore::new());

        // 1. create and submit
        let permit = svc.create_permit(new_permit()).await.unwrap();
        assert_eq!(permit.id, "WP-1001");
        assert_eq!(permit.status, PermitStatus::New);
        let id = permit.id.as_str();
        let t = svc
            .handle(&req(id, Role::Requester, Action::Submit, json!({"work_type": "hot_work", "location": "Tank 2"})))
            .await
            .unwrap();
        assert_eq!(t.to, PermitStatus::PendingReview);

        // 2. review and approve
        svc.handle(&req(id, Role::Reviewer, Action::Review, json!({}))).await.unwrap();
        let p = svc.get_permit(id).await.unwrap();
        assert_eq!(p.status, PermitStatus::PendingApproval);
        assert!(p.document.reviewer_sig.is_some());
        svc.handle(&req(id, Role::Approver, Action::Approve, json!({}))).await.unwrap();
        assert_eq!(svc.get_permit(id).await.unwrap().status, PermitStatus::Active);

        // 3. renewal accepted for review
        svc.handle(&req(
            id,
            Role::Requester,
            Action::ProposeRenewal,
            json!({"from": "2024-01-01T09:00:00Z", "to": "2024-01-01T16:00:00Z"}),
        ))
        .await
        .unwrap();
        let p = svc.get_permit(id).await.unwrap();
        assert_eq!(p.renewals.len(), 1);
        assert_eq!(p.renewals[0].status, RenewalStatus::PendingReview);
        assert_eq!(p.status, PermitStatus::RenewalPendingReview);

        // 4. reviewer rejects it
        svc.handle(&req(id, Role::Reviewer, Action::Reject, json!({"reason": "insufficient gas readings"})))
            .await
            .unwrap();
        let p = svc.get_permit(id).await.unwrap();
        assert_eq!(p.renewals[0].status, RenewalStatus::Rejected);
        assert_eq!(p.status, PermitStatus::Active);

        // 5. overlapping the rejected window is fine
        svc.handle(&req(
            id,
            Role::Requester,
            Action::ProposeRenewal,
            json!({"from": "2024-01-01T09:30:00Z", "to": "2024-01-01T16:00:00Z"}),
        ))
        .await
        .unwrap();
        assert_eq!(svc.get_permit(id).await.unwrap().renewals.len(), 2);
        svc.handle(&req(id, Role::Reviewer, Action::Approve, json!({}))).await.unwrap();
        svc.handle(&req(id, Role::Approver, Action::Approve, json!({}))).await.unwrap();

        // 6. closure
        svc.handle(&req(id, Role::Requester, Action::InitiateClosure, json!({"site_restored": true})))
            .await
            .unwrap();
        svc.handle(&req(id, Role::Reviewer, Action::ApproveClosure, json!({}))).await.unwrap();
        let t = svc.handle(&req(id, Role::Approver, Action::Approve, json!({}))).await.unwrap();
        assert_eq!(t.to, PermitStatus::Closed);

        let closed = svc.get_permit(id).await.unwrap();
        let resp = svc.respond(&req(id, Role::Requester, Action::Submit, json!({}))).await;
        assert!(!resp.success);
        assert_eq!(resp.error, Some(ErrorKind::PermitClosed));
        assert_eq!(svc.get_permit(id).await.unwrap(), closed);
    }

    #[tokio::test]
    async fn failed_action_leaves_record_unchanged() {
        let svc = PermitService::new(MemoryStore::new());
        let id = svc.create_permit(new_permit()).await.unwrap().id;
        let before: Versioned<Permit> = svc.store().get(&id).await.unwrap();

        let err = svc
            .handle(&req(&id, Role::Approver, Action::Approve, json!({})))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        let after: Versioned<Permit> = svc.store().get(&id).await.unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn out_of_bounds_renewal_changes_nothing() {
        let svc = PermitService::new(MemoryStore::new());
        let id = svc.create_permit(new_permit()).await.unwrap().id;
        svc.handle(&req(&id, Role::Requester, Action::Submit, json!({}))).await.unwrap();
        svc.handle(&req(&id, Role::Reviewer, Action::Review, json!({}))).await.unwrap();
        svc.handle(&req(&id, Role::Approver, Action::Approve, json!({}))).await.unwrap();

        let resp = svc
            .respond(&req(
                &id,
                Role::Requester,
                Action::ProposeRenewal,
                json!({"from": "2024-01-03T04:00:00Z", "to": "2024-01-03T09:00:00Z"}),
            ))
            .await;
        assert_eq!(resp.error, Some(ErrorKind::OutOfBounds));
        let p = svc.get_permit(&id).await.unwrap();
        assert!(p.renewals.is_empty());
        assert_eq!(p.status, PermitStatus::Active);
    }

    #[tokio::test]
    async fn unknown_permit_is_not_found() {
        let svc = PermitService::new(MemoryStore::new());
        let resp = svc.respond(&req("WP-9", Role::Requester, Action::Submit, json!({}))).await;
        assert_eq!(resp.error, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn overlong_permit_is_refused() {
        let svc = PermitService::new(MemoryStore::new());
        let mut input = new_permit();
        input.validity_window = TimeWindow::new(at(1, 8, 0), at(9, 8, 0));
        let err = svc.create_permit(input).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPermitWindow);
        assert!(svc.list_permits().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_proposals_append_exactly_one_renewal() {
        let svc = Arc::new(PermitService::with_settings(
            MemoryStore::new(),
            Limits::default(),
            fast_retry(64),
            1000,
        ));
        let id = svc.create_permit(new_permit()).await.unwrap().id;
        svc.handle(&req(&id, Role::Requester, Action::Submit, json!({}))).await.unwrap();
        svc.handle(&req(&id, Role::Reviewer, Action::Review, json!({}))).await.unwrap();
        svc.handle(&req(&id, Role::Approver, Action::Approve, json!({}))).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..16u32 {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let from = at(1, 9, i);
                let to = at(1, 15, 0);
                let r = req(
                    &id,
                    Role::Requester,
                    Action::ProposeRenewal,
                    json!({"from": from, "to": to}),
                );
                svc.handle(&r).await
            }));
        }

        let mut successes = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => successes += 1,
                Err(e) => assert_eq!(e.kind(), ErrorKind::PendingRenewalExists),
            }
        }
        assert_eq!(successes, 1);
        assert_eq!(svc.get_permit(&id).await.unwrap().renewals.len(), 1);
    }

    /// Wraps a [`MemoryStore`] and fails compare-and-swap on demand.
    struct FlakyStore {
        inner: MemoryStore,
        conflicts_left: AtomicU32,
        io_failure: bool,
        swaps: AtomicU32,
    }

    impl FlakyStore {
        fn new(conflicts: u32, io_failure: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                conflicts_left: AtomicU32::new(conflicts),
                io_failure,
                swaps: AtomicU32::new(0),
            }
        }
    }

    impl RecordStore for FlakyStore {
        async fn get<R: Record>(&self, id: &str) -> Result<Versioned<R>, StoreError> {
            self.inner.get(id).await
        }

        async fn insert<R: Record>(&self, record: &R) -> Result<u64, StoreError> {
            self.inner.insert(record).await
        }

        async fn compare_and_swap<R: Record>(
            &self,
            expected: u64,
            record: &R,
        ) -> Result<u64, StoreError> {
            self.swaps.fetch_add(1, Ordering::SeqCst);
            if self.io_failure {
                return Err(StoreError::Io(std::io::Error::other("disk unplugged")));
            }
            let left = self.conflicts_left.load(Ordering::SeqCst);
            if left > 0 {
                self.conflicts_left.store(left - 1, Ordering::SeqCst);
                return Err(StoreError::Conflict {
                    id: record.id().to_string(),
                    expected,
                    found: expected + 1,
                });
            }
            self.inner.compare_and_swap(expected, record).await
        }

        async fn list<R: Record>(&self) -> Result<Vec<R>, StoreError> {
            self.inner.list().await
        }

        async fn next_id(&self, sequence: &str) -> Result<u64, StoreError> {
            self.inner.next_id(sequence).await
        }
    }

    #[tokio::test]
    async fn conflicts_are_retried_then_succeed() {
        let svc = PermitService::with_settings(FlakyStore::new(2, false), Limits::default(), fast_retry(3), 0);
        let id = svc.create_permit(new_permit()).await.unwrap().id;
        assert_eq!(id, "WP-1");

        let t = svc.handle(&req(&id, Role::Requester, Action::Submit, json!({}))).await.unwrap();
        assert_eq!(t.to, PermitStatus::PendingReview);
        assert_eq!(svc.store().swaps.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_conflict() {
        let svc = PermitService::with_settings(FlakyStore::new(10, false), Limits::default(), fast_retry(2), 1000);
        let id = svc.create_permit(new_permit()).await.unwrap().id;

        let err = svc.handle(&req(&id, Role::Requester, Action::Submit, json!({}))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(svc.store().swaps.load(Ordering::SeqCst), 3);
        assert_eq!(svc.get_permit(&id).await.unwrap().status, PermitStatus::New);
    }

    #[tokio::test]
    async fn storage_failures_are_not_retried() {
        let svc = PermitService::with_settings(FlakyStore::new(0, true), Limits::default(), fast_retry(3), 1000);
        let id = svc.create_permit(new_permit()).await.unwrap().id;

        let err = svc.handle(&req(&id, Role::Requester, Action::Submit, json!({}))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert_eq!(svc.store().swaps.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn worker_flow_through_service() {
        let svc = PermitService::new(MemoryStore::new());
        let w = svc
            .register_worker(WorkerProfile {
                name: "K. Mensah".into(),
                trade: "welder".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(w.id, "W-1");

        svc.act_on_worker(&w.id, Role::Reviewer, "Dana", &WorkerAction::Approve).await.unwrap();
        let w = svc.act_on_worker(&w.id, Role::Approver, "Ade", &WorkerAction::Approve).await.unwrap();
        assert_eq!(w.current.unwrap().trade, "welder");

        let err = svc
            .act_on_worker("W-99", Role::Reviewer, "Dana", &WorkerAction::Approve)
            .await
            .unwrap_err();
        assert_eq!(err, PermitError::NotFound { entity: "worker", id: "W-99".into() });
    }

    #[test]
    fn retry_config_exponential_backoff() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay_ms: 10,
        };
        assert_eq!(config.delay_for_attempt(1), 10);
        assert_eq!(config.delay_for_attempt(2), 20);
        assert_eq!(config.delay_for_attempt(3), 40);
    }

    #[test]
    fn backoff_saturates_for_large_attempts() {
        let config = RetryConfig {
            max_retries: 100,
            base_delay_ms: 25,
        };
        assert_eq!(config.delay_for_attempt(64), u64::MAX);
        assert_eq!(config.delay_for_attempt(100), u64::MAX);
        assert_eq!(config.delay_for_attempt(u32::MAX), u64::MAX);
    }
}
