use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level permit status, persisted verbatim as its display string.
///
/// The normal lifecycle runs `New → Pending Review → Pending Approval → Active`,
/// then through the closure chain to `Closed`. Renewal statuses are entered
/// from `Active` and always fall back to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PermitStatus {
    New,
    #[serde(rename = "Pending Review")]
    PendingReview,
    #[serde(rename = "Pending Approval")]
    PendingApproval,
    Active,
    Rejected,
    #[serde(rename = "Closure Pending Review")]
    ClosurePendingReview,
    #[serde(rename = "Closure Pending Approval")]
    ClosurePendingApproval,
    Closed,
    #[serde(rename = "Renewal Pending Review")]
    RenewalPendingReview,
    #[serde(rename = "Renewal Pending Approval")]
    RenewalPendingApproval,
}

impl PermitStatus {
    pub const ALL: [PermitStatus; 10] = [
        PermitStatus::New,
        PermitStatus::PendingReview,
        PermitStatus::PendingApproval,
        PermitStatus::Active,
        PermitStatus::Rejected,
        PermitStatus::ClosurePendingReview,
        PermitStatus::ClosurePendingApproval,
        PermitStatus::Closed,
        PermitStatus::RenewalPendingReview,
        PermitStatus::RenewalPendingApproval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PermitStatus::New => "New",
            PermitStatus::PendingReview => "Pending Review",
            PermitStatus::PendingApproval => "Pending Approval",
            PermitStatus::Active => "Active",
            PermitStatus::Rejected => "Rejected",
            PermitStatus::ClosurePendingReview => "Closure Pending Review",
            PermitStatus::ClosurePendingApproval => "Closure Pending Approval",
            PermitStatus::Closed => "Closed",
            PermitStatus::RenewalPendingReview => "Renewal Pending Review",
            PermitStatus::RenewalPendingApproval => "Renewal Pending Approval",
        }
    }

    /// Requester data may only be overlaid before the first reviewer action.
    pub fn accepts_requester_overlay(&self) -> bool {
        matches!(self, PermitStatus::New | PermitStatus::PendingReview)
    }

    /// True while the permit's own review/approval cycle owns the status.
    pub fn in_initial_cycle(&self) -> bool {
        matches!(
            self,
            PermitStatus::New | PermitStatus::PendingReview | PermitStatus::PendingApproval
        )
    }
}

impl fmt::Display for PermitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three actors in the approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Requester,
    Reviewer,
    Approver,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Requester => write!(f, "Requester"),
            Role::Reviewer => write!(f, "Reviewer"),
            Role::Approver => write!(f, "Approver"),
        }
    }
}

/// Actions a client may request on a permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Submit,
    Review,
    Approve,
    Reject,
    InitiateClosure,
    ApproveClosure,
    RejectClosure,
    ProposeRenewal,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Submit => "submit",
            Action::Review => "review",
            Action::Approve => "approve",
            Action::Reject => "reject",
            Action::InitiateClosure => "initiate_closure",
            Action::ApproveClosure => "approve_closure",
            Action::RejectClosure => "reject_closure",
            Action::ProposeRenewal => "propose_renewal",
        };
        f.write_str(name)
    }
}

/// State of a single renewal request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalStatus {
    PendingReview,
    PendingApproval,
    Approved,
    Rejected,
}

impl RenewalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RenewalStatus::Approved | RenewalStatus::Rejected)
    }

    /// Parent permit status implied by this renewal being the tail.
    pub fn parent_status(&self) -> PermitStatus {
        match self {
            RenewalStatus::PendingReview => PermitStatus::RenewalPendingReview,
            RenewalStatus::PendingApproval => PermitStatus::RenewalPendingApproval,
            RenewalStatus::Approved | RenewalStatus::Rejected => PermitStatus::Active,
        }
    }
}

impl fmt::Display for RenewalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenewalStatus::PendingReview => write!(f, "pending_review"),
            RenewalStatus::PendingApproval => write!(f, "pending_approval"),
            RenewalStatus::Approved => write!(f, "approved"),
            RenewalStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Approval state of a worker record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerStatus {
    PendingReview,
    PendingApproval,
    Approved,
    Rejected,
}

impl fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerStatus::PendingReview => write!(f, "pending_review"),
            WorkerStatus::PendingApproval => write!(f, "pending_approval"),
            WorkerStatus::Approved => write!(f, "approved"),
            WorkerStatus::Rejected => write!(f, "rejected"),
        }
    }
}
