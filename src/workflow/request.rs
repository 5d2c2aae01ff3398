//! Action envelope consumed by the engine and the typed payloads it decodes.
//!
//! The envelope carries an open JSON map so transports stay role-agnostic.
//! Each action decodes that map into its own payload struct; fields that the
//! struct does not name are dropped, which is what keeps one role from
//! writing another role's part of the document.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ErrorKind, PermitError};

use super::permit::{GasReadings, RequestDetails, TimeWindow};
use super::status::{Action, PermitStatus, Role};

/// A single client action against a permit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRequest {
    pub permit_id: String,
    pub role: Role,
    pub actor_name: String,
    pub actor_email: String,
    pub action: Action,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl ActionRequest {
    pub fn new(
        permit_id: impl Into<String>,
        role: Role,
        actor_name: impl Into<String>,
        actor_email: impl Into<String>,
        action: Action,
    ) -> Self {
        Self {
            permit_id: permit_id.into(),
            role,
            actor_name: actor_name.into(),
            actor_email: actor_email.into(),
            action,
            payload: Map::new(),
        }
    }

    /// Attach a payload. Non-object values are ignored.
    pub fn with_payload(mut self, payload: Value) -> Self {
        if let Value::Object(map) = payload {
            self.payload = map;
        }
        self
    }

    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T, PermitError> {
        serde_json::from_value(Value::Object(self.payload.clone()))
            .map_err(|e| PermitError::InvalidPayload(format!("{} payload: {e}", self.action)))
    }
}

/// Outcome reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PermitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ActionResponse {
    pub fn ok(status: PermitStatus) -> Self {
        Self {
            success: true,
            status: Some(status),
            error: None,
            message: None,
        }
    }

    pub fn failed(err: &PermitError) -> Self {
        Self {
            success: false,
            status: None,
            error: Some(err.kind()),
            message: Some(err.to_string()),
        }
    }
}

impl From<Result<PermitStatus, PermitError>> for ActionResponse {
    fn from(result: Result<PermitStatus, PermitError>) -> Self {
        match result {
            Ok(status) => ActionResponse::ok(status),
            Err(e) => ActionResponse::failed(&e),
        }
    }
}

/// Decision on a renewal bundled with the permit's own review or approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenewalDecision {
    Accept,
    Reject,
}

/// `submit`: the requester's form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitPayload {
    #[serde(flatten)]
    pub request: RequestDetails,
}

/// `review`, `approve`, `approve_closure`: a sign-off with optional remarks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignOffPayload {
    pub remarks: Option<String>,
    pub renewal_decision: Option<RenewalDecision>,
    /// Reason recorded when `renewal_decision` is `reject`.
    pub renewal_reason: Option<String>,
    /// When set, must name the tail renewal.
    pub renewal_id: Option<String>,
}

/// `reject`, `reject_closure`.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectPayload {
    pub reason: String,
    #[serde(default)]
    pub renewal_id: Option<String>,
}

/// `initiate_closure`: the receiver's (requester's) closure fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClosurePayload {
    pub remarks: Option<String>,
    pub site_restored: bool,
}

/// `propose_renewal`.
#[derive(Debug, Clone, Deserialize)]
pub struct RenewalProposal {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    #[serde(default)]
    pub readings: GasReadings,
}

impl RenewalProposal {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.from, self.to)
    }
}
