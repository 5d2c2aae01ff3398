//! Terminal rendering: colored status lines and permit summaries.
//!
//! Uses `console` for styling. Output goes to stdout; logging goes through
//! `tracing` on stderr.

use console::Style;

use crate::export::SheetRow;
use crate::workflow::{ActionResponse, Permit, PermitStatus, Signature, Worker};

/// Styles shared by every printer.
pub struct Printer {
    green: Style,
    red: Style,
    yellow: Style,
    dim: Style,
    bold: Style,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

impl Printer {
    fn status_style(&self, status: PermitStatus) -> &Style {
        match status {
            PermitStatus::Active | PermitStatus::Closed => &self.green,
            PermitStatus::Rejected => &self.red,
            _ => &self.yellow,
        }
    }

    /// One line per action outcome.
    pub fn response(&self, label: &str, response: &ActionResponse) {
        match (response.success, response.status) {
            (true, Some(status)) => println!(
                "  {} {label} → {}",
                self.green.apply_to("✓"),
                self.status_style(status).apply_to(status)
            ),
            (true, None) => println!("  {} {label}", self.green.apply_to("✓")),
            (false, _) => println!(
                "  {} {label}: {} ({})",
                self.red.apply_to("✗"),
                response.message.as_deref().unwrap_or("failed"),
                response.error.map(|k| k.to_string()).unwrap_or_default()
            ),
        }
    }

    pub fn permit(&self, permit: &Permit) {
        let doc = &permit.document;
        println!(
            "{} {}",
            self.bold.apply_to(&permit.id),
            self.status_style(permit.status).apply_to(permit.status)
        );
        println!("  window     {}", permit.validity_window);
        if !doc.request.location.is_empty() {
            println!("  location   {}", doc.request.location);
        }
        self.signature("requester", &doc.requester_sig);
        self.signature("reviewer", &doc.reviewer_sig);
        self.signature("approver", &doc.approver_sig);
        self.signature("receiver", &doc.closure.receiver_sig);
        self.signature("issuer", &doc.closure.issuer_sig);

        for (i, renewal) in permit.renewals.iter().enumerate() {
            let reason = renewal
                .rejection
                .as_ref()
                .map(|r| format!(" ({})", r.reason))
                .unwrap_or_default();
            println!(
                "  renewal #{} {} {}{}",
                i + 1,
                renewal.window,
                self.yellow.apply_to(renewal.status),
                self.dim.apply_to(reason)
            );
        }
        for remark in &doc.remarks_log {
            println!(
                "  {} {} ({}): {}",
                self.dim.apply_to(remark.at.format("%Y-%m-%d %H:%M")),
                remark.by,
                remark.role,
                remark.text
            );
        }
    }

    fn signature(&self, label: &str, sig: &Option<Signature>) {
        if let Some(sig) = sig {
            println!("  {label:<10} {}", self.dim.apply_to(sig));
        }
    }

    pub fn sheet(&self, rows: &[SheetRow]) {
        println!(
            "{}",
            self.bold.apply_to(format!(
                "{:<10} {:<26} {:<16} {}",
                SheetRow::HEADERS[0],
                SheetRow::HEADERS[1],
                SheetRow::HEADERS[2],
                SheetRow::HEADERS[3]
            ))
        );
        for row in rows {
            println!(
                "{:<10} {:<26} {:<16} {}",
                row.id, row.status, row.work_type, row.location
            );
        }
    }

    pub fn worker(&self, worker: &Worker) {
        let name = worker
            .effective_profile()
            .map(|p| p.name.as_str())
            .unwrap_or("-");
        println!(
            "{} {} {}",
            self.bold.apply_to(&worker.id),
            name,
            self.yellow.apply_to(worker.status)
        );
        if let Some(rejection) = &worker.rejection {
            println!("  rejected by {}: {}", rejection.by, rejection.reason);
        }
    }
}
