//! Action kinds, the clearance map, and the action request/result pair.
//!
//! `ActionKind` is a closed enumeration: every member is bound to a required
//! clearance at build time by the exhaustive match in
//! [`ActionKind::required_clearance`]. Adding a kind without extending the
//! match is a compile error, which is the point.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{clearance::ClearanceLevel, identity::AgentId};

/// Unique identifier for a single action request.
///
/// Minted by Mission Control on `execute`, or supplied by callers that need
/// to control retry identity themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub uuid::Uuid);

impl ActionId {
    /// Create a new, unique action ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The closed set of action kinds the kernel governs.
///
/// Serialized in kebab-case; the same names appear in event payloads and
/// the audit export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    // L0 — observation only.
    ReadPublic,
    QueryStatus,
    ListResources,

    // L1 — mutating, recoverable.
    ModifyConfig,
    DeployService,
    ManageSecrets,
    ExecuteCommand,

    // L2 — destructive or privilege-bearing; human approval required.
    DestroyResource,
    ModifyProduction,
    TransferFunds,
    DeleteAuditLog,
    EscalatePrivileges,
    ExecuteArbitrary,
}

impl ActionKind {
    /// The fixed action-kind → clearance map.
    ///
    /// Exhaustive on purpose: a new kind without a binding fails to compile.
    pub fn required_clearance(&self) -> ClearanceLevel {
        match self {
            ActionKind::ReadPublic | ActionKind::QueryStatus | ActionKind::ListResources => {
                ClearanceLevel::L0
            }

            ActionKind::ModifyConfig
            | ActionKind::DeployService
            | ActionKind::ManageSecrets
            | ActionKind::ExecuteCommand => ClearanceLevel::L1,

            ActionKind::DestroyResource
            | ActionKind::ModifyProduction
            | ActionKind::TransferFunds
            | ActionKind::DeleteAuditLog
            | ActionKind::EscalatePrivileges
            | ActionKind::ExecuteArbitrary => ClearanceLevel::L2,
        }
    }

    /// The kebab-case wire name, identical to the serde form.
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::ReadPublic => "read-public",
            ActionKind::QueryStatus => "query-status",
            ActionKind::ListResources => "list-resources",
            ActionKind::ModifyConfig => "modify-config",
            ActionKind::DeployService => "deploy-service",
            ActionKind::ManageSecrets => "manage-secrets",
            ActionKind::ExecuteCommand => "execute-command",
            ActionKind::DestroyResource => "destroy-resource",
            ActionKind::ModifyProduction => "modify-production",
            ActionKind::TransferFunds => "transfer-funds",
            ActionKind::DeleteAuditLog => "delete-audit-log",
            ActionKind::EscalatePrivileges => "escalate-privileges",
            ActionKind::ExecuteArbitrary => "execute-arbitrary",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One attempted action against the protected resource plane.
///
/// Created at entry to the orchestrator and immutable thereafter. The
/// payload is opaque to the kernel apart from sanitization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Unique per request. Repeating an id trips the idempotency guard.
    pub id: ActionId,
    /// What the agent is attempting.
    pub kind: ActionKind,
    /// The requesting agent.
    pub agent_id: AgentId,
    /// Wall-clock creation time (UTC).
    pub created_at: DateTime<Utc>,
    /// Opaque payload handed (sanitized) to the executor.
    pub payload: serde_json::Value,
    /// Optional detached signature over the request; opaque bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
    /// Optional caller-side correlation id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

impl ActionRequest {
    /// Build a request with a fresh id.
    pub fn new(
        kind: ActionKind,
        agent_id: AgentId,
        payload: serde_json::Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            agent_id,
            created_at,
            payload,
            signature: None,
            correlation_id: None,
        }
    }

    /// Attach a detached signature.
    #[must_use]
    pub fn with_signature(mut self, signature: Vec<u8>) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Attach a correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        self
    }
}

/// The outcome of executing (or failing to execute) an action request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    /// True only when the executor ran and returned success.
    pub success: bool,
    /// The originating request.
    pub action_id: ActionId,
    /// Wall-clock completion time (UTC).
    pub completed_at: DateTime<Utc>,
    /// Executor output on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    /// Error description on failure (executor error or enforcement reason).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The party that executed the action, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_by: Option<AgentId>,
}

impl ActionResult {
    /// A successful result carrying the executor's output.
    pub fn success(
        action_id: ActionId,
        completed_at: DateTime<Utc>,
        output: serde_json::Value,
    ) -> Self {
        Self {
            success: true,
            action_id,
            completed_at,
            output: Some(output),
            error: None,
            executed_by: None,
        }
    }

    /// A failed result carrying the error description.
    pub fn failure(
        action_id: ActionId,
        completed_at: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            action_id,
            completed_at,
            output: None,
            error: Some(error.into()),
            executed_by: None,
        }
    }

    /// Record which party executed the action.
    #[must_use]
    pub fn executed_by(mut self, agent_id: AgentId) -> Self {
        self.executed_by = Some(agent_id);
        self
    }
}
