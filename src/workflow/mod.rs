mod engine;
mod permit;
pub mod renewal;
mod request;
mod status;
mod worker;

pub use engine::{Limits, Transition, TransitionEngine};
pub use permit::{
    Answer, ClosureRecord, Document, GasReadings, Permit, Rejection, Remark, Renewal,
    RenewalSignatures, RequestDetails, RoleEmails, Signature, TimeWindow, WorkType,
};
pub use request::{
    ActionRequest, ActionResponse, ClosurePayload, RejectPayload, RenewalDecision,
    RenewalProposal, SignOffPayload, SubmitPayload,
};
pub use status::{Action, PermitStatus, RenewalStatus, Role, WorkerStatus};
pub use worker::{Worker, WorkerAction, WorkerProfile};
