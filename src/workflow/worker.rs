//! Worker records and their approval flow.
//!
//! A worker keeps the last approved profile in `current` and a proposed edit
//! in `pending`. Edits go through the same review/approve chain as permits and
//! only replace `current` once the approver signs off.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PermitError;

use super::permit::{Rejection, Signature};
use super::status::{Role, WorkerStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerProfile {
    pub name: String,
    pub company: String,
    pub trade: String,
    pub id_number: String,
    pub certificate_expiry: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub status: WorkerStatus,
    pub current: Option<WorkerProfile>,
    pub pending: Option<WorkerProfile>,
    pub reviewed_by: Option<Signature>,
    pub approved_by: Option<Signature>,
    pub rejection: Option<Rejection>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Actions on a worker record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WorkerAction {
    Propose { profile: WorkerProfile },
    Approve,
    Reject { reason: String },
}

impl WorkerAction {
    fn name(&self) -> &'static str {
        match self {
            WorkerAction::Propose { .. } => "propose",
            WorkerAction::Approve => "approve",
            WorkerAction::Reject { .. } => "reject",
        }
    }
}

impl Worker {
    /// A new worker awaiting review of its first profile.
    pub fn new(id: String, profile: WorkerProfile, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: WorkerStatus::PendingReview,
            current: None,
            pending: Some(profile),
            reviewed_by: None,
            approved_by: None,
            rejection: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The profile a reader should see: the proposal if one is pending,
    /// otherwise the approved snapshot.
    pub fn effective_profile(&self) -> Option<&WorkerProfile> {
        self.pending.as_ref().or(self.current.as_ref())
    }

    /// Apply `action` to a copy of this worker.
    pub fn apply(
        &self,
        role: Role,
        actor: &str,
        action: &WorkerAction,
        now: DateTime<Utc>,
    ) -> Result<Worker, PermitError> {
        let mut next = self.clone();
        match (self.status, role, action) {
            (WorkerStatus::Approved | WorkerStatus::Rejected, Role::Requester, WorkerAction::Propose { profile }) => {
                next.pending = Some(profile.clone());
                next.status = WorkerStatus::PendingReview;
                next.reviewed_by = None;
                next.approved_by = None;
                next.rejection = None;
            }
            (WorkerStatus::PendingReview, Role::Reviewer, WorkerAction::Approve) => {
                next.reviewed_by = Some(Signature::new(actor, now));
                next.status = WorkerStatus::PendingApproval;
            }
            (WorkerStatus::PendingApproval, Role::Approver, WorkerAction::Approve) => {
                next.approved_by = Some(Signature::new(actor, now));
                if let Some(profile) = next.pending.take() {
                    next.current = Some(profile);
                }
                next.status = WorkerStatus::Approved;
            }
            (
                WorkerStatus::PendingReview | WorkerStatus::PendingApproval,
                Role::Reviewer | Role::Approver,
                WorkerAction::Reject { reason },
            ) => {
                if reason.trim().is_empty() {
                    return Err(PermitError::InvalidPayload(
                        "a rejection reason is required".into(),
                    ));
                }
                next.pending = None;
                next.rejection = Some(Rejection {
                    by: actor.to_string(),
                    at: now,
                    reason: reason.trim().to_string(),
                    rejected_at_role: role,
                });
                next.status = WorkerStatus::Rejected;
            }
            (status, role, action) => {
                return Err(PermitError::InvalidTransition {
                    role: role.to_string(),
                    action: action.name().to_string(),
                    status: status.to_string(),
                });
            }
        }
        next.updated_at = now;
        Ok(next)
    }
}
