use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PermitError;

use super::permit::{Permit, Remark, Signature, TimeWindow};
use super::renewal;
use super::request::{
    ActionRequest, ClosurePayload, RejectPayload, RenewalProposal, SignOffPayload, SubmitPayload,
};
use super::status::{Action, PermitStatus, Role};

/// Time limits enforced on permits and renewals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_permit_days: u32,
    pub max_renewal_hours: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_permit_days: 7,
            max_renewal_hours: 8,
        }
    }
}

/// A committed status change, kept for logging and audit output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub permit_id: String,
    pub role: Role,
    pub action: Action,
    pub from: PermitStatus,
    pub to: PermitStatus,
    pub at: DateTime<Utc>,
}

/// Computes permit transitions.
///
/// The engine is pure: it takes the loaded permit and a request and returns
/// the next version of the permit, or an error. It never touches the store,
/// so a failed request cannot leave a partial write behind.
#[derive(Debug, Clone, Default)]
pub struct TransitionEngine {
    limits: Limits,
}

impl TransitionEngine {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    /// Check a validity window for a new permit.
    pub fn validate_permit_window(&self, window: &TimeWindow) -> Result<(), PermitError> {
        if window.to <= window.from {
            return Err(PermitError::InvalidPermitWindow(
                "must end after it starts".into(),
            ));
        }
        let max = Duration::days(i64::from(self.limits.max_permit_days));
        if window.duration() > max {
            return Err(PermitError::InvalidPermitWindow(format!(
                "spans more than {} days",
                self.limits.max_permit_days
            )));
        }
        Ok(())
    }

    /// Evaluate `request` against `current` and return the updated permit.
    ///
    /// Checks run in a fixed order: closed permits first, then the role
    /// binding, then the transition table and payload.
    pub fn apply(
        &self,
        current: &Permit,
        request: &ActionRequest,
        now: DateTime<Utc>,
    ) -> Result<(Permit, Transition), PermitError> {
        if current.is_closed() {
            return Err(PermitError::PermitClosed(current.id.clone()));
        }

        let bound = current.role_emails.for_role(request.role);
        if !bound.eq_ignore_ascii_case(request.actor_email.trim()) {
            return Err(PermitError::RoleMismatch {
                role: request.role.to_string(),
                email: request.actor_email.clone(),
            });
        }

        let mut next = current.clone();
        self.dispatch(&mut next, request, now)?;
        next.updated_at = now;

        let transition = Transition {
            permit_id: current.id.clone(),
            role: request.role,
            action: request.action,
            from: current.status,
            to: next.status,
            at: now,
        };
        Ok((next, transition))
    }

    fn dispatch(
        &self,
        permit: &mut Permit,
        req: &ActionRequest,
        now: DateTime<Utc>,
    ) -> Result<(), PermitError> {
        use Action::*;
        use PermitStatus::*;
        use Role::*;

        let actor = req.actor_name.as_str();
        match (permit.status, req.role, req.action) {
            (status, Requester, Submit) if status.accepts_requester_overlay() => {
                let payload: SubmitPayload = req.decode()?;
                submit(permit, payload, actor, now);
            }
            (PendingReview, Reviewer, Review) => {
                let payload: SignOffPayload = req.decode()?;
                renewal::decide_bundled(permit, Reviewer, actor, &payload, now)?;
                permit.document.reviewer_sig = Some(Signature::new(actor, now));
                set_if_present(&mut permit.document.reviewer_remarks, payload.remarks);
                permit.status = PendingApproval;
            }
            (PendingReview | PendingApproval, Reviewer | Approver, Reject) => {
                let payload = decode_rejection(req)?;
                log_remark(permit, req, &payload.reason, now);
                renewal::cascade_parent_rejection(permit, req.role, actor, now);
                permit.status = Rejected;
            }
            (PendingApproval, Approver, Approve) => {
                let payload: SignOffPayload = req.decode()?;
                renewal::decide_bundled(permit, Approver, actor, &payload, now)?;
                permit.document.approver_sig = Some(Signature::new(actor, now));
                set_if_present(&mut permit.document.approver_remarks, payload.remarks);
                permit.status = Active;
            }
            (Active, Requester, InitiateClosure) => {
                let payload: ClosurePayload = req.decode()?;
                let closure = &mut permit.document.closure;
                closure.receiver_sig = Some(Signature::new(actor, now));
                closure.receiver_remarks = payload.remarks;
                closure.site_restored = payload.site_restored;
                permit.status = ClosurePendingReview;
            }
            (ClosurePendingReview, Reviewer, ApproveClosure) => {
                let payload: SignOffPayload = req.decode()?;
                let closure = &mut permit.document.closure;
                closure.reviewer_sig = Some(Signature::new(actor, now));
                set_if_present(&mut closure.reviewer_remarks, payload.remarks);
                permit.status = ClosurePendingApproval;
            }
            (ClosurePendingApproval, Approver, Approve) => {
                let payload: SignOffPayload = req.decode()?;
                let closure = &mut permit.document.closure;
                closure.issuer_sig = Some(Signature::new(actor, now));
                set_if_present(&mut closure.issuer_remarks, payload.remarks);
                permit.status = Closed;
            }
            (ClosurePendingReview | ClosurePendingApproval, Reviewer | Approver, RejectClosure) => {
                let payload = decode_rejection(req)?;
                log_remark(permit, req, &payload.reason, now);
                // Closure restarts from the receiver's sign-off.
                let superseded = std::mem::take(&mut permit.document.closure);
                permit.document.superseded_closures.push(superseded);
                permit.status = Active;
            }
            (
                Active | New | PendingReview | RenewalPendingReview | RenewalPendingApproval,
                Requester,
                ProposeRenewal,
            ) => {
                let proposal: RenewalProposal = req.decode()?;
                renewal::propose(permit, &proposal, actor, self.limits.max_renewal_hours, now)?;
            }
            (RenewalPendingReview, Reviewer, Approve) => {
                let payload: SignOffPayload = req.decode()?;
                renewal::review(permit, payload.renewal_id.as_deref(), actor, now)?;
            }
            (RenewalPendingApproval, Approver, Approve) => {
                let payload: SignOffPayload = req.decode()?;
                renewal::approve(permit, payload.renewal_id.as_deref(), actor, now)?;
            }
            (RenewalPendingReview | RenewalPendingApproval, Reviewer | Approver, Reject) => {
                let payload = decode_rejection(req)?;
                renewal::reject(
                    permit,
                    payload.renewal_id.as_deref(),
                    req.role,
                    actor,
                    &payload.reason,
                    now,
                )?;
            }
            (status, role, action) => {
                return Err(PermitError::InvalidTransition {
                    role: role.to_string(),
                    action: action.to_string(),
                    status: status.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Full overlay of the requester-owned fields. Nothing else in the document
/// is reachable from here.
fn submit(permit: &mut Permit, payload: SubmitPayload, actor: &str, now: DateTime<Utc>) {
    permit.document.request = payload.request;
    permit.document.requester_sig = Some(Signature::new(actor, now));
    permit.status = PermitStatus::PendingReview;
}

fn decode_rejection(req: &ActionRequest) -> Result<RejectPayload, PermitError> {
    let payload: RejectPayload = req.decode()?;
    if payload.reason.trim().is_empty() {
        return Err(PermitError::InvalidPayload(
            "a rejection reason is required".into(),
        ));
    }
    Ok(payload)
}

fn log_remark(permit: &mut Permit, req: &ActionRequest, text: &str, now: DateTime<Utc>) {
    permit.document.remarks_log.push(Remark {
        by: req.actor_name.clone(),
        role: req.role,
        at: now,
        text: text.trim().to_string(),
    });
}

fn set_if_present(slot: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *slot = Some(v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::workflow::permit::RoleEmails;
    use crate::workflow::renewal::PARENT_REJECTED_REASON;
    use crate::workflow::status::RenewalStatus;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, h, m, 0).unwrap()
    }

    fn permit() -> Permit {
        Permit::new(
            "WP-1001".into(),
            TimeWindow::new(at(1, 8, 0), at(3, 8, 0)),
            RoleEmails {
                requester: "sam@site".into(),
                reviewer: "dana@site".into(),
                approver: "ade@site".into(),
            },
            at(1, 7, 0),
        )
    }

    fn req(role: Role, action: Action, payload: Value) -> ActionRequest {
        let (name, email) = match role {
            Role::Requester => ("Sam", "sam@site"),
            Role::Reviewer => ("Dana", "dana@site"),
            Role::Approver => ("Ade", "ade@site"),
        };
        ActionRequest::new("WP-1001", role, name, email, action).with_payload(payload)
    }

    fn step(engine: &TransitionEngine, p: &Permit, r: ActionRequest) -> Permit {
        engine.apply(p, &r, at(1, 8, 0)).unwrap().0
    }

    fn active(engine: &TransitionEngine) -> Permit {
        let p = step(engine, &permit(), req(Role::Requester, Action::Submit, json!({"location": "Unit 4"})));
        let p = step(engine, &p, req(Role::Reviewer, Action::Review, json!({})));
        step(engine, &p, req(Role::Approver, Action::Approve, json!({})))
    }

    const ALL_ACTIONS: [Action; 8] = [
        Action::Submit,
        Action::Review,
        Action::Approve,
        Action::Reject,
        Action::InitiateClosure,
        Action::ApproveClosure,
        Action::RejectClosure,
        Action::ProposeRenewal,
    ];
    const ALL_ROLES: [Role; 3] = [Role::Requester, Role::Reviewer, Role::Approver];

    #[test]
    fn happy_path_to_active() {
        let engine = TransitionEngine::default();
        let p = step(&engine, &permit(), req(Role::Requester, Action::Submit, json!({"location": "Unit 4"})));
        assert_eq!(p.status, PermitStatus::PendingReview);
        assert_eq!(p.document.request.location, "Unit 4");

        let p = step(&engine, &p, req(Role::Reviewer, Action::Review, json!({"remarks": "gas free"})));
        assert_eq!(p.status, PermitStatus::PendingApproval);
        assert_eq!(p.document.reviewer_sig.as_ref().unwrap().name, "Dana");
        assert_eq!(p.document.reviewer_remarks.as_deref(), Some("gas free"));

        let p = step(&engine, &p, req(Role::Approver, Action::Approve, json!({})));
        assert_eq!(p.status, PermitStatus::Active);
        assert!(p.document.approver_sig.is_some());
    }

    #[test]
    fn closure_chain_ends_closed() {
        let engine = TransitionEngine::default();
        let p = active(&engine);
        let p = step(&engine, &p, req(Role::Requester, Action::InitiateClosure, json!({"remarks": "done", "site_restored": true})));
        assert_eq!(p.status, PermitStatus::ClosurePendingReview);
        assert!(p.document.closure.site_restored);

        let p = step(&engine, &p, req(Role::Reviewer, Action::ApproveClosure, json!({})));
        assert_eq!(p.status, PermitStatus::ClosurePendingApproval);

        let p = step(&engine, &p, req(Role::Approver, Action::Approve, json!({"remarks": "signed off"})));
        assert_eq!(p.status, PermitStatus::Closed);
        assert_eq!(p.document.closure.issuer_remarks.as_deref(), Some("signed off"));
    }

    #[test]
    fn closed_is_absorbing() {
        let engine = TransitionEngine::default();
        let mut p = active(&engine);
        p.status = PermitStatus::Closed;
        for role in ALL_ROLES {
            for action in ALL_ACTIONS {
                let err = engine.apply(&p, &req(role, action, json!({})), at(1, 9, 0)).unwrap_err();
                assert_eq!(err.kind(), ErrorKind::PermitClosed, "{role} {action}");
            }
        }
    }

    #[test]
    fn closed_check_precedes_role_binding() {
        let engine = TransitionEngine::default();
        let mut p = permit();
        p.status = PermitStatus::Closed;
        let stranger = ActionRequest::new("WP-1001", Role::Approver, "X", "x@elsewhere", Action::Approve);
        let err = engine.apply(&p, &stranger, at(1, 9, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermitClosed);
    }

    #[test]
    fn illegal_transitions_are_rejected() {
        let engine = TransitionEngine::default();
        let legal: &[(PermitStatus, Role, Action)] = &[
            (PermitStatus::New, Role::Requester, Action::Submit),
            (PermitStatus::New, Role::Requester, Action::ProposeRenewal),
            (PermitStatus::PendingReview, Role::Requester, Action::Submit),
            (PermitStatus::PendingReview, Role::Requester, Action::ProposeRenewal),
            (PermitStatus::PendingReview, Role::Reviewer, Action::Review),
            (PermitStatus::PendingReview, Role::Reviewer, Action::Reject),
            (PermitStatus::PendingReview, Role::Approver, Action::Reject),
            (PermitStatus::PendingApproval, Role::Reviewer, Action::Reject),
            (PermitStatus::PendingApproval, Role::Approver, Action::Reject),
            (PermitStatus::PendingApproval, Role::Approver, Action::Approve),
            (PermitStatus::Active, Role::Requester, Action::InitiateClosure),
            (PermitStatus::Active, Role::Requester, Action::ProposeRenewal),
            (PermitStatus::ClosurePendingReview, Role::Reviewer, Action::ApproveClosure),
            (PermitStatus::ClosurePendingReview, Role::Reviewer, Action::RejectClosure),
            (PermitStatus::ClosurePendingReview, Role::Approver, Action::RejectClosure),
            (PermitStatus::ClosurePendingApproval, Role::Approver, Action::Approve),
            (PermitStatus::ClosurePendingApproval, Role::Reviewer, Action::RejectClosure),
            (PermitStatus::ClosurePendingApproval, Role::Approver, Action::RejectClosure),
            (PermitStatus::RenewalPendingReview, Role::Requester, Action::ProposeRenewal),
            (PermitStatus::RenewalPendingReview, Role::Reviewer, Action::Approve),
            (PermitStatus::RenewalPendingReview, Role::Reviewer, Action::Reject),
            (PermitStatus::RenewalPendingReview, Role::Approver, Action::Reject),
            (PermitStatus::RenewalPendingApproval, Role::Requester, Action::ProposeRenewal),
            (PermitStatus::RenewalPendingApproval, Role::Approver, Action::Approve),
            (PermitStatus::RenewalPendingApproval, Role::Reviewer, Action::Reject),
            (PermitStatus::RenewalPendingApproval, Role::Approver, Action::Reject),
        ];

        for status in PermitStatus::ALL {
            if status == PermitStatus::Closed {
                continue;
            }
            let mut p = permit();
            p.status = status;
            for role in ALL_ROLES {
                for action in ALL_ACTIONS {
                    if legal.contains(&(status, role, action)) {
                        continue;
                    }
                    let err = engine
                        .apply(&p, &req(role, action, json!({"reason": "x"})), at(1, 9, 0))
                        .unwrap_err();
                    assert_eq!(err.kind(), ErrorKind::InvalidTransition, "{status} {role} {action}");
                }
            }
        }
    }

    #[test]
    fn role_binding_is_enforced() {
        let engine = TransitionEngine::default();
        let p = step(&engine, &permit(), req(Role::Requester, Action::Submit, json!({})));
        let imposter = ActionRequest::new("WP-1001", Role::Reviewer, "Eve", "eve@site", Action::Review);
        let err = engine.apply(&p, &imposter, at(1, 9, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RoleMismatch);

        let mixed_case = ActionRequest::new("WP-1001", Role::Reviewer, "Dana", "Dana@Site", Action::Review);
        assert!(engine.apply(&p, &mixed_case, at(1, 9, 0)).is_ok());
    }

    #[test]
    fn resubmission_cannot_touch_signatures() {
        let engine = TransitionEngine::default();
        let p = step(&engine, &permit(), req(Role::Requester, Action::Submit, json!({})));
        let p = step(&engine, &p, req(Role::Reviewer, Action::Review, json!({"remarks": "ok"})));
        let before = p.clone();

        // Past Pending Review a resubmit is illegal outright.
        let forged = json!({
            "location": "Elsewhere",
            "reviewer_sig": {"name": "forged", "at": "2024-01-01T00:00:00Z"},
            "approver_sig": {"name": "forged", "at": "2024-01-01T00:00:00Z"}
        });
        let err = engine.apply(&p, &req(Role::Requester, Action::Submit, forged.clone()), at(1, 9, 0));
        assert_eq!(err.unwrap_err().kind(), ErrorKind::InvalidTransition);
        assert_eq!(p, before);

        // While still in Pending Review the overlay only reaches requester fields.
        let mut pending = permit();
        pending.status = PermitStatus::PendingReview;
        pending.document.reviewer_remarks = Some("draft note".into());
        let p = step(&engine, &pending, req(Role::Requester, Action::Submit, forged));
        assert_eq!(p.document.request.location, "Elsewhere");
        assert!(p.document.reviewer_sig.is_none());
        assert!(p.document.approver_sig.is_none());
        assert_eq!(p.document.reviewer_remarks.as_deref(), Some("draft note"));
    }

    #[test]
    fn closure_fields_survive_requester_actions() {
        let engine = TransitionEngine::default();
        let p = active(&engine);
        let p = step(&engine, &p, req(Role::Requester, Action::InitiateClosure, json!({})));
        let p = step(&engine, &p, req(Role::Reviewer, Action::ApproveClosure, json!({"remarks": "ok"})));
        let sig = p.document.closure.reviewer_sig.clone();

        for action in ALL_ACTIONS {
            let r = req(Role::Requester, action, json!({"remarks": "stale", "reviewer_sig": null}));
            assert!(engine.apply(&p, &r, at(1, 9, 0)).is_err());
        }
        assert_eq!(p.document.closure.reviewer_sig, sig);
    }

    #[test]
    fn reject_closure_reopens_permit() {
        let engine = TransitionEngine::default();
        let p = active(&engine);
        let p = step(&engine, &p, req(Role::Requester, Action::InitiateClosure, json!({"remarks": "area swept"})));
        let p = step(&engine, &p, req(Role::Reviewer, Action::ApproveClosure, json!({"remarks": "checked"})));
        let p = step(&engine, &p, req(Role::Approver, Action::RejectClosure, json!({"reason": "scaffold still up"})));
        assert_eq!(p.status, PermitStatus::Active);
        assert!(p.document.closure.receiver_sig.is_none());
        assert_eq!(p.document.remarks_log.last().unwrap().text, "scaffold still up");

        let [attempt] = p.document.superseded_closures.as_slice() else {
            panic!("expected one superseded closure");
        };
        assert_eq!(attempt.receiver_remarks.as_deref(), Some("area swept"));
        assert_eq!(attempt.reviewer_sig.as_ref().unwrap().name, "Dana");
        assert_eq!(attempt.reviewer_remarks.as_deref(), Some("checked"));

        let p = step(&engine, &p, req(Role::Requester, Action::InitiateClosure, json!({})));
        assert_eq!(p.status, PermitStatus::ClosurePendingReview);
        assert_eq!(p.document.superseded_closures.len(), 1);
    }

    #[test]
    fn proposal_while_renewal_pending_is_refused() {
        let engine = TransitionEngine::default();
        let window = |from: &str, to: &str| json!({"from": from, "to": to});
        let p = step(
            &engine,
            &active(&engine),
            req(Role::Requester, Action::ProposeRenewal, window("2024-01-01T09:00:00Z", "2024-01-01T10:00:00Z")),
        );
        assert_eq!(p.status, PermitStatus::RenewalPendingReview);

        let second = req(Role::Requester, Action::ProposeRenewal, window("2024-01-01T12:00:00Z", "2024-01-01T13:00:00Z"));
        let err = engine.apply(&p, &second, at(1, 9, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PendingRenewalExists);

        // Window checks still come first.
        let outside = req(Role::Requester, Action::ProposeRenewal, window("2024-01-03T07:00:00Z", "2024-01-03T09:00:00Z"));
        let err = engine.apply(&p, &outside, at(1, 9, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfBounds);

        let p = step(&engine, &p, req(Role::Reviewer, Action::Approve, json!({})));
        assert_eq!(p.status, PermitStatus::RenewalPendingApproval);
        let err = engine.apply(&p, &second, at(1, 9, 0)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PendingRenewalExists);
        assert_eq!(p.renewals.len(), 1);
    }

    #[test]
    fn rejection_requires_reason() {
        let engine = TransitionEngine::default();
        let p = step(&engine, &permit(), req(Role::Requester, Action::Submit, json!({})));
        let err = engine
            .apply(&p, &req(Role::Reviewer, Action::Reject, json!({"reason": "  "})), at(1, 9, 0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }

    #[test]
    fn parent_rejection_cascades_to_pending_renewal() {
        let engine = TransitionEngine::default();
        let p = step(&engine, &permit(), req(Role::Requester, Action::Submit, json!({})));
        let p = step(
            &engine,
            &p,
            req(Role::Requester, Action::ProposeRenewal, json!({"from": "2024-01-01T09:00:00Z", "to": "2024-01-01T16:00:00Z"})),
        );
        assert_eq!(p.status, PermitStatus::PendingReview);

        let p = step(
            &engine,
            &p,
            req(Role::Reviewer, Action::Review, json!({"renewal_decision": "accept"})),
        );
        assert_eq!(p.renewals[0].status, RenewalStatus::PendingApproval);

        let p = step(&engine, &p, req(Role::Approver, Action::Reject, json!({"reason": "no isolation cert"})));
        assert_eq!(p.status, PermitStatus::Rejected);
        assert_eq!(p.renewals[0].status, RenewalStatus::Rejected);
        assert_eq!(p.renewals[0].rejection.as_ref().unwrap().reason, PARENT_REJECTED_REASON);
    }

    #[test]
    fn bundled_renewal_approved_with_permit() {
        let engine = TransitionEngine::default();
        let p = step(&engine, &permit(), req(Role::Requester, Action::Submit, json!({})));
        let p = step(
            &engine,
            &p,
            req(Role::Requester, Action::ProposeRenewal, json!({"from": "2024-01-01T09:00:00Z", "to": "2024-01-01T16:00:00Z"})),
        );

        let err = engine
            .apply(&p, &req(Role::Reviewer, Action::Review, json!({})), at(1, 9, 0))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);

        let p = step(&engine, &p, req(Role::Reviewer, Action::Review, json!({"renewal_decision": "accept"})));
        let p = step(&engine, &p, req(Role::Approver, Action::Approve, json!({"renewal_decision": "accept"})));
        assert_eq!(p.status, PermitStatus::Active);
        assert_eq!(p.renewals[0].status, RenewalStatus::Approved);
        assert!(p.renewals[0].signatures.approver.is_some());
    }

    #[test]
    fn renewal_round_trip_keeps_status_in_sync() {
        let engine = TransitionEngine::default();
        let p = active(&engine);
        let p = step(
            &engine,
            &p,
            req(Role::Requester, Action::ProposeRenewal, json!({"from": "2024-01-01T09:00:00Z", "to": "2024-01-01T16:00:00Z"})),
        );
        assert_eq!(p.status, PermitStatus::RenewalPendingReview);

        let p = step(&engine, &p, req(Role::Reviewer, Action::Approve, json!({})));
        assert_eq!(p.status, PermitStatus::RenewalPendingApproval);
        assert_eq!(p.status, p.renewals[0].status.parent_status());

        let p = step(&engine, &p, req(Role::Approver, Action::Approve, json!({})));
        assert_eq!(p.status, PermitStatus::Active);
        assert_eq!(p.renewals[0].status, RenewalStatus::Approved);
    }

    #[test]
    fn permit_window_limits() {
        let engine = TransitionEngine::default();
        assert!(engine.validate_permit_window(&TimeWindow::new(at(1, 8, 0), at(8, 8, 0))).is_ok());
        let err = engine
            .validate_permit_window(&TimeWindow::new(at(1, 8, 0), at(8, 8, 1)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPermitWindow);
        let err = engine
            .validate_permit_window(&TimeWindow::new(at(1, 8, 0), at(1, 8, 0)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPermitWindow);
    }

    #[test]
    fn transition_records_from_and_to() {
        let engine = TransitionEngine::default();
        let (_, t) = engine
            .apply(&permit(), &req(Role::Requester, Action::Submit, json!({})), at(1, 8, 0))
            .unwrap();
        assert_eq!(t.from, PermitStatus::New);
        assert_eq!(t.to, PermitStatus::PendingReview);
        assert_eq!(t.action, Action::Submit);
    }
}
