//! Command-line interface built on clap.
//!
//! Defines [`Cli`] with the [`Command`] subcommands and the global flags
//! (`--store`, `--verbose`).

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::workflow::{Action, Role};

/// Work-permit lifecycle tracker.
#[derive(Debug, Parser)]
#[command(name = "permit", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the JSON record store (overrides permit.toml and PERMIT_STORE_PATH).
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RoleArg {
    Requester,
    Reviewer,
    Approver,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Requester => Role::Requester,
            RoleArg::Reviewer => Role::Reviewer,
            RoleArg::Approver => Role::Approver,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Submit,
    Review,
    Approve,
    Reject,
    InitiateClosure,
    ApproveClosure,
    RejectClosure,
    ProposeRenewal,
}

impl From<ActionArg> for Action {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Submit => Action::Submit,
            ActionArg::Review => Action::Review,
            ActionArg::Approve => Action::Approve,
            ActionArg::Reject => Action::Reject,
            ActionArg::InitiateClosure => Action::InitiateClosure,
            ActionArg::ApproveClosure => Action::ApproveClosure,
            ActionArg::RejectClosure => Action::RejectClosure,
            ActionArg::ProposeRenewal => Action::ProposeRenewal,
        }
    }
}

/// Who is acting.
#[derive(Debug, Args)]
pub struct Actor {
    /// Name recorded on signatures.
    #[arg(long)]
    pub name: String,

    /// E-mail checked against the permit's role assignment.
    #[arg(long)]
    pub email: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a permit in `New` status.
    Create {
        /// Start of the validity window (RFC 3339).
        #[arg(long)]
        from: DateTime<Utc>,
        /// End of the validity window (RFC 3339).
        #[arg(long)]
        to: DateTime<Utc>,
        #[arg(long)]
        requester: String,
        #[arg(long)]
        reviewer: String,
        #[arg(long)]
        approver: String,
    },

    /// Perform an action on a permit.
    Act {
        permit_id: String,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long, value_enum)]
        action: ActionArg,
        #[command(flatten)]
        actor: Actor,
        /// Action payload as a JSON object.
        #[arg(long)]
        payload: Option<String>,
    },

    /// Request a renewal window on a permit.
    Renew {
        permit_id: String,
        #[command(flatten)]
        actor: Actor,
        #[arg(long)]
        from: DateTime<Utc>,
        #[arg(long)]
        to: DateTime<Utc>,
        #[arg(long, default_value = "")]
        hydrocarbon: String,
        #[arg(long, default_value = "")]
        toxic: String,
        #[arg(long, default_value = "")]
        oxygen: String,
    },

    /// Show one permit.
    Show { permit_id: String },

    /// List all permits.
    List,

    /// Export one permit snapshot, or every permit as sheet rows.
    Export {
        permit_id: Option<String>,
        /// Write to a file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Worker records.
    #[command(subcommand)]
    Worker(WorkerCommand),

    /// Run the built-in walkthrough against an in-memory store.
    Demo,
}

#[derive(Debug, Subcommand)]
pub enum WorkerCommand {
    /// Register a worker; the profile awaits review.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        trade: String,
        #[arg(long, default_value = "")]
        id_number: String,
    },

    /// Propose an edited profile for an approved or rejected worker.
    Propose {
        worker_id: String,
        /// Requester name recorded on the worker history.
        #[arg(long)]
        by: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        company: String,
        #[arg(long, default_value = "")]
        trade: String,
        #[arg(long, default_value = "")]
        id_number: String,
    },

    /// Approve or reject a worker's pending profile.
    Act {
        worker_id: String,
        #[arg(long, value_enum)]
        role: RoleArg,
        #[arg(long)]
        name: String,
        /// Reject with this reason instead of approving.
        #[arg(long)]
        reject: Option<String>,
    },

    /// Show one worker.
    Show { worker_id: String },
}
