//! The audit entry record.
//!
//! One entry per governed attempt, appended by the audit trail and never
//! modified. The two digests (`entry_hash`, `immutable_proof`) together
//! with `previous_hash` make the chain tamper-evident; the byte layouts
//! they commit to are documented in `aegis-audit::chain`, which is the
//! wire contract for audit portability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    action::{ActionRequest, ActionResult},
    approval::ApprovalRequest,
    identity::AgentIdentity,
};

/// A single entry in the hash-chained audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry id (UUID string).
    pub id: String,
    /// Wall-clock append time (UTC).
    pub timestamp: DateTime<Utc>,
    /// Dense, strictly monotonic position in the chain, starting at 1.
    pub sequence: u64,
    /// The attempted action, embedded in full.
    pub request: ActionRequest,
    /// What came of the attempt.
    pub result: ActionResult,
    /// Snapshot of the acting agent.
    pub agent: AgentIdentity,
    /// The approval that gated the action, when one existed. For executed
    /// L2 actions its state is `approved`; for denied attempts it carries
    /// the terminal state that caused the denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalRequest>,
    /// The previous entry's `entry_hash`, or the genesis hash for entry 1.
    pub previous_hash: String,
    /// Digest of this entry's canonical bytes (sans the hash fields).
    pub entry_hash: String,
    /// Digest binding `entry_hash` to its chain position and timestamp.
    pub immutable_proof: String,
}
