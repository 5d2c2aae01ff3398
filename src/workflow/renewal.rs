//! Renewal sub-workflow.
//!
//! Renewals form an append-only log on the permit. Only the tail is ever
//! mutated, and every change to it moves the parent status in the same call,
//! so the pair is written together or not at all.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::error::PermitError;

use super::permit::{Permit, Rejection, Renewal, RenewalSignatures, Signature};
use super::request::{RenewalDecision, RenewalProposal, SignOffPayload};
use super::status::{RenewalStatus, Role};

/// Reason recorded on a pending renewal when its parent permit is rejected.
pub const PARENT_REJECTED_REASON: &str = "Parent Permit Rejected";

/// Validate and append a renewal request.
///
/// While the permit is still in its own first review cycle the renewal is
/// bundled with it and the parent status is left alone; otherwise the parent
/// moves to `Renewal Pending Review`.
pub fn propose(
    permit: &mut Permit,
    proposal: &RenewalProposal,
    actor: &str,
    max_hours: u32,
    now: DateTime<Utc>,
) -> Result<(), PermitError> {
    let window = proposal.window();

    if window.to <= window.from {
        return Err(PermitError::InvalidRenewalWindow);
    }
    if !permit.validity_window.contains(&window) {
        return Err(PermitError::OutOfBounds);
    }
    if window.duration() > Duration::hours(i64::from(max_hours)) {
        return Err(PermitError::DurationExceeded {
            hours: window.duration().num_minutes() as f64 / 60.0,
            max_hours,
        });
    }
    if let Some(tail) = permit.tail_renewal()
        && !tail.status.is_terminal()
    {
        return Err(PermitError::PendingRenewalExists(tail.status.to_string()));
    }
    // Rejected renewals never constrain the next window.
    if let Some(prior) = permit.last_approved_renewal()
        && window.from < prior.window.to
    {
        return Err(PermitError::Overlap {
            prior_end: prior.window.to.to_rfc3339(),
        });
    }

    permit.renewals.push(Renewal {
        id: Uuid::new_v4().to_string(),
        status: RenewalStatus::PendingReview,
        window,
        readings: proposal.readings.clone(),
        signatures: RenewalSignatures {
            requester: Some(Signature::new(actor, now)),
            ..Default::default()
        },
        rejection: None,
        requested_at: now,
    });

    if !permit.status.in_initial_cycle() {
        sync_parent(permit);
    }
    Ok(())
}

/// Reviewer sign-off on the tail renewal.
pub fn review(
    permit: &mut Permit,
    renewal_id: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<(), PermitError> {
    let tail = tail_for_update(permit, renewal_id)?;
    tail.status = RenewalStatus::PendingApproval;
    tail.signatures.reviewer = Some(Signature::new(actor, now));
    sync_parent(permit);
    Ok(())
}

/// Approver sign-off on the tail renewal.
pub fn approve(
    permit: &mut Permit,
    renewal_id: Option<&str>,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<(), PermitError> {
    let tail = tail_for_update(permit, renewal_id)?;
    tail.status = RenewalStatus::Approved;
    tail.signatures.approver = Some(Signature::new(actor, now));
    sync_parent(permit);
    Ok(())
}

/// Reject the tail renewal; the permit returns to `Active`.
pub fn reject(
    permit: &mut Permit,
    renewal_id: Option<&str>,
    role: Role,
    actor: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), PermitError> {
    let tail = tail_for_update(permit, renewal_id)?;
    mark_rejected(tail, role, actor, reason, now);
    sync_parent(permit);
    Ok(())
}

/// Decide the renewal bundled with the permit's first review/approval.
///
/// Applies only while exactly one renewal exists. A pending bundled renewal
/// must be decided explicitly; one already rejected by the reviewer stays
/// rejected whatever the approver says.
pub fn decide_bundled(
    permit: &mut Permit,
    role: Role,
    actor: &str,
    sign_off: &SignOffPayload,
    now: DateTime<Utc>,
) -> Result<(), PermitError> {
    if permit.renewals.len() != 1 {
        return Ok(());
    }
    let permit_id = permit.id.clone();
    let tail = tail_for_update(permit, sign_off.renewal_id.as_deref())?;

    let expected = match role {
        Role::Reviewer => RenewalStatus::PendingReview,
        Role::Approver => RenewalStatus::PendingApproval,
        Role::Requester => return Ok(()),
    };

    if tail.status != expected {
        if tail.status == RenewalStatus::Rejected
            && sign_off.renewal_decision == Some(RenewalDecision::Accept)
        {
            tracing::warn!(
                permit = %permit_id,
                renewal = %tail.id,
                "ignoring accept on a renewal rejected at review"
            );
        }
        return Ok(());
    }

    let decision = sign_off.renewal_decision.ok_or_else(|| {
        PermitError::InvalidPayload(format!(
            "renewal {} is {}; renewal_decision is required",
            tail.id, tail.status
        ))
    })?;

    match (decision, role) {
        (RenewalDecision::Accept, Role::Reviewer) => {
            tail.status = RenewalStatus::PendingApproval;
            tail.signatures.reviewer = Some(Signature::new(actor, now));
        }
        (RenewalDecision::Accept, _) => {
            tail.status = RenewalStatus::Approved;
            tail.signatures.approver = Some(Signature::new(actor, now));
        }
        (RenewalDecision::Reject, _) => {
            let reason = sign_off
                .renewal_reason
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or("Rejected with permit sign-off");
            mark_rejected(tail, role, actor, reason, now);
        }
    }
    Ok(())
}

/// Force a pending tail renewal to `rejected` because its parent was rejected.
pub fn cascade_parent_rejection(
    permit: &mut Permit,
    role: Role,
    actor: &str,
    now: DateTime<Utc>,
) {
    if let Some(tail) = permit.tail_renewal_mut()
        && !tail.status.is_terminal()
    {
        mark_rejected(tail, role, actor, PARENT_REJECTED_REASON, now);
    }
}

fn mark_rejected(
    renewal: &mut Renewal,
    role: Role,
    actor: &str,
    reason: &str,
    now: DateTime<Utc>,
) {
    renewal.status = RenewalStatus::Rejected;
    renewal.rejection = Some(Rejection {
        by: actor.to_string(),
        at: now,
        reason: reason.to_string(),
        rejected_at_role: role,
    });
}

fn tail_for_update<'a>(
    permit: &'a mut Permit,
    renewal_id: Option<&str>,
) -> Result<&'a mut Renewal, PermitError> {
    let permit_id = permit.id.clone();
    let tail = permit.tail_renewal_mut().ok_or_else(|| PermitError::NotFound {
        entity: "renewal",
        id: format!("{permit_id}/tail"),
    })?;
    if let Some(id) = renewal_id
        && id != tail.id
    {
        return Err(PermitError::NotFound {
            entity: "renewal",
            id: format!("{permit_id}/{id}"),
        });
    }
    Ok(tail)
}

fn sync_parent(permit: &mut Permit) {
    if let Some(tail) = permit.tail_renewal() {
        permit.status = tail.status.parent_status();
    }
}
