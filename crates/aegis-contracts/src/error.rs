//! The unified error taxonomy for the AEGIS governance kernel.
//!
//! All fallible operations return `GovernanceResult<T>`. The enforcement
//! path variants embed the audit entry that was appended before the error
//! was raised, so callers always hold the record of the denial.

use thiserror::Error;

use crate::{audit::AuditEntry, clearance::ClearanceLevel};

/// The unified error type for the AEGIS kernel.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// The agent lacks the clearance the action kind requires. A failed
    /// audit entry is appended before this is raised.
    #[error("clearance violation: {reason}")]
    ClearanceViolation { reason: String, entry: Box<AuditEntry> },

    /// A non-clearance policy rejection (rejected, expired, or revoked
    /// approval). A failed audit entry is appended before this is raised.
    #[error("enforcement rejected action: {reason}")]
    EnforcementRejected { reason: String, entry: Box<AuditEntry> },

    /// The caller-supplied executor failed. A success=false audit entry is
    /// appended before this is raised.
    #[error("execution failed: {reason}")]
    ExecutionFailed { reason: String, entry: Box<AuditEntry> },

    /// Idempotency guard: this action request id has already completed.
    /// No new audit entry is written.
    #[error("action '{action_id}' has already been executed")]
    AlreadyExecuted { action_id: String },

    /// The referenced approval request does not exist.
    #[error("approval request '{approval_id}' not found")]
    ApprovalNotFound { approval_id: String },

    /// The approval request has already left the pending state.
    #[error("approval request '{approval_id}' has already been decided")]
    AlreadyDecided { approval_id: String },

    /// The approver is not in the request's authorized approver set.
    #[error("approver '{approver_id}' is not authorized to decide approval '{approval_id}'")]
    Unauthorized {
        approver_id: String,
        approval_id: String,
    },

    /// The approver is not in the registry.
    #[error("approver '{approver_id}' is not registered")]
    Unregistered { approver_id: String },

    /// The approver already submitted a decision for this request.
    #[error("approver '{approver_id}' already decided approval '{approval_id}'")]
    DuplicateDecision {
        approver_id: String,
        approval_id: String,
    },

    /// An approval state transition violated the state machine.
    #[error("invalid approval transition: {reason}")]
    InvalidTransition { reason: String },

    /// An L2 action was submitted for approval with an empty registry.
    #[error("no approvers are registered")]
    NoApproversRegistered,

    /// Attempt to construct or register a non-L2 approver.
    #[error("approver '{approver_id}' holds clearance {actual}; approvers require L2")]
    InsufficientApproverClearance {
        approver_id: String,
        actual: ClearanceLevel,
    },

    /// A required configuration value is missing or invalid.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The audit trail could not append or serialize an entry.
    ///
    /// Fatal for the operation in flight: an attempt that cannot be
    /// audited cannot be reported as having happened.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },
}

/// Convenience alias used throughout the AEGIS crates.
pub type GovernanceResult<T> = Result<T, GovernanceError>;
