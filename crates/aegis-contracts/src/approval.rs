//! Approval requests, states, and decisions.
//!
//! An approval request is the human-in-the-loop artifact created for every
//! L2 attempt. It is born `Pending` and transitions exactly once to one of
//! the four terminal states; terminal states never transition again. The
//! state machine itself lives in `aegis-approval`; these are the records it
//! operates on.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::{ActionId, ActionKind},
    identity::{AgentIdentity, ApproverId},
};

/// Unique identifier for an approval request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApprovalId(pub uuid::Uuid);

impl ApprovalId {
    /// Create a new, unique approval ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ApprovalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ApprovalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle state of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalState {
    /// Awaiting approver decisions.
    Pending,
    /// The approval threshold was met. The only state `revoke` accepts.
    Approved,
    /// An approver rejected the request. A single rejection is final.
    Rejected,
    /// The absolute deadline passed while still pending.
    Expired,
    /// An approved (or, via emergency stop, pending) request was withdrawn.
    Revoked,
}

impl ApprovalState {
    /// True for every state other than `Pending`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ApprovalState::Pending)
    }
}

impl fmt::Display for ApprovalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
            ApprovalState::Expired => "expired",
            ApprovalState::Revoked => "revoked",
        };
        write!(f, "{}", name)
    }
}

/// A request for human sign-off on an L2 action.
///
/// The `evidence_hash` is bound at creation over the request's immutable
/// identifying fields, so a later reader can confirm which action the
/// approvers actually signed off on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: ApprovalId,
    /// The action request this approval gates.
    pub action_id: ActionId,
    /// The gated action's kind; also the correlation key for retries.
    pub action_kind: ActionKind,
    pub state: ApprovalState,
    /// Snapshot of the requesting agent at creation time.
    pub requester: AgentIdentity,
    pub created_at: DateTime<Utc>,
    /// The approver ids allowed to decide this request, chosen at submit
    /// time in registry insertion order. The selection is recoverable from
    /// any audit entry embedding this request.
    pub authorized_approvers: Vec<ApproverId>,
    /// The approver whose decision produced the terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<ApproverId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    /// Populated on rejection and revocation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// The absolute deadline after which the request expires.
    pub expires_at: DateTime<Utc>,
    /// Digest over {action id, action kind, agent id, creation time,
    /// payload digest}, bound at creation.
    pub evidence_hash: String,
}

impl ApprovalRequest {
    /// Build a pending request for the given action.
    ///
    /// The authorized approver set is empty until the workflow submits the
    /// request and chooses one.
    pub fn new_pending(
        action_id: ActionId,
        action_kind: ActionKind,
        requester: AgentIdentity,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
        evidence_hash: String,
    ) -> Self {
        Self {
            id: ApprovalId::new(),
            action_id,
            action_kind,
            state: ApprovalState::Pending,
            requester,
            created_at,
            authorized_approvers: Vec::new(),
            decided_by: None,
            decided_at: None,
            rejection_reason: None,
            expires_at,
            evidence_hash,
        }
    }

    /// True while the request can still accept decisions.
    pub fn is_pending(&self) -> bool {
        self.state == ApprovalState::Pending
    }
}

/// An approver's vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Approve,
    Reject,
}

/// One recorded decision by one approver on one approval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalDecision {
    pub approver: ApproverId,
    pub decision: Decision,
    pub timestamp: DateTime<Utc>,
    /// Optional signature over the decision; opaque bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
