//! The governance event taxonomy.
//!
//! Every observable state change in the kernel is announced as a
//! `GovernanceEvent` through the fan-out dispatcher in `aegis-core`.
//! Handlers receive events by reference and must not assume any particular
//! `details` schema beyond what the constructor for each kind documents.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    action::{ActionRequest, ActionResult},
    approval::ApprovalRequest,
    clearance::ClearanceLevel,
};

/// The closed set of event kinds the kernel emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    ActionRequested,
    ActionApproved,
    ActionRejected,
    ActionExecuted,
    ActionFailed,
    ClearanceViolation,
    ApprovalTimeout,
    AuditTamperDetected,
}

impl EventKind {
    /// The kebab-case wire name, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ActionRequested => "action-requested",
            EventKind::ActionApproved => "action-approved",
            EventKind::ActionRejected => "action-rejected",
            EventKind::ActionExecuted => "action-executed",
            EventKind::ActionFailed => "action-failed",
            EventKind::ClearanceViolation => "clearance-violation",
            EventKind::ApprovalTimeout => "approval-timeout",
            EventKind::AuditTamperDetected => "audit-tamper-detected",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        write!(f, "{}", name)
    }
}

/// One governance event, delivered to handlers by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceEvent {
    pub kind: EventKind,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    /// Kind-specific payload; see the constructors for the fields each
    /// kind carries.
    pub details: serde_json::Value,
}

impl GovernanceEvent {
    pub fn new(
        kind: EventKind,
        severity: Severity,
        timestamp: DateTime<Utc>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            severity,
            timestamp,
            details,
        }
    }

    /// An L2 action entered the approval queue. Info.
    pub fn action_requested(at: DateTime<Utc>, approval: &ApprovalRequest) -> Self {
        Self::new(
            EventKind::ActionRequested,
            Severity::Info,
            at,
            json!({
                "approval_id": approval.id.to_string(),
                "action_id": approval.action_id.to_string(),
                "action_kind": approval.action_kind.as_str(),
                "agent_id": approval.requester.id.0,
                "authorized_approvers": approval
                    .authorized_approvers
                    .iter()
                    .map(|a| a.0.clone())
                    .collect::<Vec<_>>(),
                "expires_at": approval.expires_at.to_rfc3339(),
            }),
        )
    }

    /// The approval threshold was met. Info.
    pub fn action_approved(at: DateTime<Utc>, approval: &ApprovalRequest) -> Self {
        Self::new(
            EventKind::ActionApproved,
            Severity::Info,
            at,
            json!({
                "approval_id": approval.id.to_string(),
                "action_id": approval.action_id.to_string(),
                "decided_by": approval.decided_by.as_ref().map(|a| a.0.clone()),
            }),
        )
    }

    /// An approver rejected the request. Warning.
    pub fn action_rejected(at: DateTime<Utc>, approval: &ApprovalRequest) -> Self {
        Self::new(
            EventKind::ActionRejected,
            Severity::Warning,
            at,
            json!({
                "approval_id": approval.id.to_string(),
                "action_id": approval.action_id.to_string(),
                "decided_by": approval.decided_by.as_ref().map(|a| a.0.clone()),
                "reason": approval.rejection_reason,
            }),
        )
    }

    /// An approved request was revoked. Critical; this is the
    /// emergency-override path.
    pub fn approval_revoked(at: DateTime<Utc>, approval: &ApprovalRequest) -> Self {
        Self::new(
            EventKind::ActionRejected,
            Severity::Critical,
            at,
            json!({
                "approval_id": approval.id.to_string(),
                "action_id": approval.action_id.to_string(),
                "revoked": true,
                "reason": approval.rejection_reason,
            }),
        )
    }

    /// Composite emergency-stop notification. Critical.
    pub fn emergency_stop(at: DateTime<Utc>, revoked_approvals: usize, reason: &str) -> Self {
        Self::new(
            EventKind::ActionRejected,
            Severity::Critical,
            at,
            json!({
                "emergency_stop": true,
                "revoked_approvals": revoked_approvals,
                "reason": reason,
            }),
        )
    }

    /// The executor completed successfully. Info.
    pub fn action_executed(at: DateTime<Utc>, request: &ActionRequest) -> Self {
        Self::new(
            EventKind::ActionExecuted,
            Severity::Info,
            at,
            json!({
                "action_id": request.id.to_string(),
                "action_kind": request.kind.as_str(),
                "agent_id": request.agent_id.0,
            }),
        )
    }

    /// The executor failed. Warning.
    pub fn action_failed(at: DateTime<Utc>, request: &ActionRequest, result: &ActionResult) -> Self {
        Self::new(
            EventKind::ActionFailed,
            Severity::Warning,
            at,
            json!({
                "action_id": request.id.to_string(),
                "action_kind": request.kind.as_str(),
                "agent_id": request.agent_id.0,
                "error": result.error,
            }),
        )
    }

    /// An agent attempted an action above its clearance. Critical.
    pub fn clearance_violation(
        at: DateTime<Utc>,
        request: &ActionRequest,
        required: ClearanceLevel,
        actual: ClearanceLevel,
    ) -> Self {
        Self::new(
            EventKind::ClearanceViolation,
            Severity::Critical,
            at,
            json!({
                "action_id": request.id.to_string(),
                "action_kind": request.kind.as_str(),
                "agent_id": request.agent_id.0,
                "required": required.to_string(),
                "actual": actual.to_string(),
            }),
        )
    }

    /// An approval passed its escalation warning or its absolute deadline.
    /// Warning. `phase` is `"escalation"` or `"expiry"`.
    pub fn approval_timeout(at: DateTime<Utc>, approval: &ApprovalRequest, phase: &str) -> Self {
        Self::new(
            EventKind::ApprovalTimeout,
            Severity::Warning,
            at,
            json!({
                "approval_id": approval.id.to_string(),
                "action_id": approval.action_id.to_string(),
                "phase": phase,
                "state": approval.state.to_string(),
            }),
        )
    }

    /// Chain verification found a mismatch. Critical.
    pub fn audit_tamper_detected(at: DateTime<Utc>, sequence: u64, reason_code: &str) -> Self {
        Self::new(
            EventKind::AuditTamperDetected,
            Severity::Critical,
            at,
            json!({
                "sequence": sequence,
                "reason": reason_code,
            }),
        )
    }
}
