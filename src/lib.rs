//! Work-permit lifecycle tracking.
//!
//! Permits move through a three-role approval chain (Requester, Reviewer,
//! Approver), may carry time-boxed renewals, and close through their own
//! sign-off chain. [`workflow::TransitionEngine`] decides every status change;
//! [`service::PermitService`] runs it against a [`store::RecordStore`] with
//! versioned compare-and-swap writes.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod service;
pub mod store;
pub mod ui;
pub mod workflow;

pub use error::{ErrorKind, PermitError, StoreError};
pub use service::{NewPermit, PermitService, RetryConfig};
