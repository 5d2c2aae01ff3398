use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::status::{PermitStatus, RenewalStatus, Role};

/// A half-open `[from, to)` time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn duration(&self) -> Duration {
        self.to - self.from
    }

    /// True when `other` lies entirely inside this window.
    pub fn contains(&self, other: &TimeWindow) -> bool {
        self.from <= other.from && other.to <= self.to
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            self.from.format("%Y-%m-%d %H:%M"),
            self.to.format("%Y-%m-%d %H:%M")
        )
    }
}

/// The e-mail of the person bound to each role on a permit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleEmails {
    pub requester: String,
    pub reviewer: String,
    pub approver: String,
}

impl RoleEmails {
    pub fn for_role(&self, role: Role) -> &str {
        match role {
            Role::Requester => &self.requester,
            Role::Reviewer => &self.reviewer,
            Role::Approver => &self.approver,
        }
    }
}

/// A typed signature. Rendered as `"<name> on <timestamp>"` but never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub name: String,
    pub at: DateTime<Utc>,
}

impl Signature {
    pub fn new(name: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            at,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.name, self.at.to_rfc3339())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    #[default]
    HotWork,
    ColdWork,
    ConfinedSpace,
    Excavation,
    Electrical,
    WorkingAtHeight,
}

/// Answer to a single hazard checklist question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    NotApplicable,
}

/// Fields owned by the requester and overlaid wholesale on submit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDetails {
    pub work_type: WorkType,
    pub location: String,
    pub description: String,
    pub equipment: String,
    /// Question key → answer.
    pub hazard_checklist: BTreeMap<String, Answer>,
    pub ppe: Vec<String>,
    pub workers: Vec<String>,
    /// Opaque reference into blob storage.
    pub map_overlay: Option<String>,
    pub attachments: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClosureRecord {
    pub receiver_sig: Option<Signature>,
    pub receiver_remarks: Option<String>,
    pub site_restored: bool,
    pub reviewer_sig: Option<Signature>,
    pub reviewer_remarks: Option<String>,
    pub issuer_sig: Option<Signature>,
    pub issuer_remarks: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    pub by: String,
    pub role: Role,
    pub at: DateTime<Utc>,
    pub text: String,
}

/// The permit's document payload.
///
/// Each field group belongs to exactly one role; the engine writes only the
/// group owned by the acting role.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Document {
    pub request: RequestDetails,
    pub requester_sig: Option<Signature>,
    pub reviewer_sig: Option<Signature>,
    pub reviewer_remarks: Option<String>,
    pub approver_sig: Option<Signature>,
    pub approver_remarks: Option<String>,
    pub closure: ClosureRecord,
    /// Closure attempts turned back by `reject_closure`, oldest first.
    pub superseded_closures: Vec<ClosureRecord>,
    pub remarks_log: Vec<Remark>,
}

/// Gas test readings captured with a renewal request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GasReadings {
    pub hydrocarbon: String,
    pub toxic: String,
    pub oxygen: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalSignatures {
    pub requester: Option<Signature>,
    pub reviewer: Option<Signature>,
    pub approver: Option<Signature>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub by: String,
    pub at: DateTime<Utc>,
    pub reason: String,
    pub rejected_at_role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Renewal {
    pub id: String,
    pub status: RenewalStatus,
    pub window: TimeWindow,
    pub readings: GasReadings,
    pub signatures: RenewalSignatures,
    pub rejection: Option<Rejection>,
    pub requested_at: DateTime<Utc>,
}

/// A work permit and everything recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permit {
    pub id: String,
    pub status: PermitStatus,
    pub validity_window: TimeWindow,
    pub role_emails: RoleEmails,
    pub document: Document,
    pub renewals: Vec<Renewal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Permit {
    pub fn new(
        id: String,
        validity_window: TimeWindow,
        role_emails: RoleEmails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: PermitStatus::New,
            validity_window,
            role_emails,
            document: Document::default(),
            renewals: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The renewal currently under mutation, if any.
    pub fn tail_renewal(&self) -> Option<&Renewal> {
        self.renewals.last()
    }

    pub fn tail_renewal_mut(&mut self) -> Option<&mut Renewal> {
        self.renewals.last_mut()
    }

    /// The most recent renewal that was approved.
    pub fn last_approved_renewal(&self) -> Option<&Renewal> {
        self.renewals
            .iter()
            .rev()
            .find(|r| r.status == RenewalStatus::Approved)
    }

    pub fn is_closed(&self) -> bool {
        self.status == PermitStatus::Closed
    }
}
