//! Enforcement verdicts and orchestrator outcomes.
//!
//! `PreExecuteOutcome` is what the enforcement engine returns before the
//! executor runs; `ExecuteOutcome` is what Mission Control returns to the
//! caller. Policy-style rejections are outcome variants, not errors; the
//! orchestrator converts them into the error taxonomy after the audit
//! entry is on record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::{ActionId, ActionKind, ActionResult},
    approval::ApprovalRequest,
    audit::AuditEntry,
    clearance::ClearanceLevel,
    identity::AgentId,
};

/// The pure decision produced by `EnforcementEngine::validate`.
#[derive(Debug, Clone)]
pub struct EnforcementVerdict {
    /// Clearance the action kind requires.
    pub required: ClearanceLevel,
    /// Clearance the agent holds.
    pub actual: ClearanceLevel,
    /// True when execution may proceed right now.
    pub allowed: bool,
    /// True for L2 action kinds.
    pub requires_approval: bool,
    /// The gating approval request: a newly built pending one, or the
    /// active one found for this (kind, agent) pair.
    pub approval: Option<ApprovalRequest>,
    /// Populated whenever `allowed` is false.
    pub reason: Option<String>,
}

/// Why a pre-execution rejection occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// The agent's clearance is below the action's requirement.
    Clearance,
    /// The gating approval is rejected, expired, or revoked.
    Approval,
}

/// The result of `EnforcementEngine::pre_execute`.
#[derive(Debug, Clone)]
pub enum PreExecuteOutcome {
    /// All gates passed; run the executor with the sanitized payload.
    Proceed {
        /// The request payload with structurally dangerous keys stripped.
        payload: serde_json::Value,
        /// The consumed approved request, for L2 actions.
        approval: Option<ApprovalRequest>,
    },

    /// A newly created approval request that has not yet been submitted
    /// to the workflow. The orchestrator must submit it and report
    /// "pending" to the caller.
    RequiresApproval { approval: ApprovalRequest },

    /// An approval for this (kind, agent) pair is already pending.
    AwaitingApproval { approval: ApprovalRequest },

    /// The attempt is denied. The orchestrator appends a failed audit
    /// entry and raises the matching error.
    Rejected {
        reason: String,
        kind: RejectionKind,
        /// The terminal approval that caused an approval-path rejection.
        approval: Option<ApprovalRequest>,
    },
}

/// Cleanup obligations reported after a failed execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CleanupAction {
    RollbackPendingChanges,
    ReleaseResources,
}

/// The result of `EnforcementEngine::post_execute`.
#[derive(Debug, Clone)]
pub struct PostExecuteReport {
    /// Cleanup actions the caller should drive; empty on success.
    pub cleanup: Vec<CleanupAction>,
}

/// What Mission Control returns from `execute`.
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// The executor ran; the attempt is on the audit trail.
    Completed {
        result: ActionResult,
        entry: AuditEntry,
    },

    /// The action needs human approval. The executor was not invoked;
    /// re-invoke `execute` after the approval is granted.
    AwaitingApproval { approval: ApprovalRequest },
}

/// A snapshot of one in-flight executor invocation, for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub action_id: ActionId,
    pub kind: ActionKind,
    pub agent_id: AgentId,
    pub started_at: DateTime<Utc>,
}
