//! Read-only projections handed to document exporters.
//!
//! PDF and spreadsheet renderers live outside this crate. They receive a
//! [`PermitSnapshot`] or a list of [`SheetRow`]s and never see a mutable
//! permit.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::workflow::{
    Document, Permit, PermitStatus, Renewal, RenewalStatus, RoleEmails, Signature, TimeWindow,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitIdentity {
    pub id: String,
    pub role_emails: RoleEmails,
    pub created_at: DateTime<Utc>,
}

/// Everything an exporter needs to render one permit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermitSnapshot {
    pub identity: PermitIdentity,
    pub status: PermitStatus,
    pub window: TimeWindow,
    pub document: Document,
    pub renewals: Vec<Renewal>,
}

pub fn snapshot(permit: &Permit) -> PermitSnapshot {
    PermitSnapshot {
        identity: PermitIdentity {
            id: permit.id.clone(),
            role_emails: permit.role_emails.clone(),
            created_at: permit.created_at,
        },
        status: permit.status,
        window: permit.validity_window,
        document: permit.document.clone(),
        renewals: permit.renewals.clone(),
    }
}

/// One flat row per permit for spreadsheet export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRow {
    pub id: String,
    pub status: String,
    pub work_type: String,
    pub location: String,
    pub valid_from: String,
    pub valid_to: String,
    pub requester: String,
    pub reviewed_by: String,
    pub approved_by: String,
    pub renewals: usize,
    pub approved_renewals: usize,
    pub closed_by: String,
}

impl SheetRow {
    pub const HEADERS: [&'static str; 12] = [
        "Permit",
        "Status",
        "Work type",
        "Location",
        "Valid from",
        "Valid to",
        "Requester",
        "Reviewed by",
        "Approved by",
        "Renewals",
        "Approved renewals",
        "Closed by",
    ];
}

impl From<&Permit> for SheetRow {
    fn from(permit: &Permit) -> Self {
        let doc = &permit.document;
        let sig = |s: &Option<Signature>| {
            s.as_ref().map(ToString::to_string).unwrap_or_default()
        };
        let work_type = serde_json::to_value(doc.request.work_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            id: permit.id.clone(),
            status: permit.status.to_string(),
            work_type,
            location: doc.request.location.clone(),
            valid_from: permit.validity_window.from.to_rfc3339(),
            valid_to: permit.validity_window.to.to_rfc3339(),
            requester: permit.role_emails.requester.clone(),
            reviewed_by: sig(&doc.reviewer_sig),
            approved_by: sig(&doc.approver_sig),
            renewals: permit.renewals.len(),
            approved_renewals: permit
                .renewals
                .iter()
                .filter(|r| r.status == RenewalStatus::Approved)
                .count(),
            closed_by: sig(&doc.closure.issuer_sig),
        }
    }
}

/// Seam for PDF / spreadsheet renderers.
pub trait ExportAdapter {
    fn export_permit(&self, snapshot: &PermitSnapshot, out: &mut dyn Write) -> Result<()>;
    fn export_sheet(&self, rows: &[SheetRow], out: &mut dyn Write) -> Result<()>;
}

/// Writes snapshots and rows as pretty JSON.
#[derive(Debug, Default)]
pub struct JsonExporter;

impl ExportAdapter for JsonExporter {
    fn export_permit(&self, snapshot: &PermitSnapshot, out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, snapshot)?;
        writeln!(out)?;
        Ok(())
    }

    fn export_sheet(&self, rows: &[SheetRow], out: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, rows)?;
        writeln!(out)?;
        Ok(())
    }
}
