//! Agent and approver identities.
//!
//! Identities are issued elsewhere; the kernel treats ids as opaque strings
//! and public keys as opaque bytes. The one structural rule lives here:
//! approvers must hold L2 clearance, enforced at construction.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    clearance::ClearanceLevel,
    error::{GovernanceError, GovernanceResult},
};

/// Stable, opaque identifier for an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Construct an agent id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable, opaque identifier for a human approver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApproverId(pub String);

impl ApproverId {
    /// Construct an approver id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ApproverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity of a requesting agent.
///
/// Snapshotted into approval requests and audit entries, so the record of
/// who attempted what survives later identity changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentIdentity {
    pub id: AgentId,
    pub display_name: String,
    pub clearance: ClearanceLevel,
    /// The session under which this agent is operating.
    pub session_id: String,
    /// Optional public key material; opaque bytes, never interpreted here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Vec<u8>>,
}

impl AgentIdentity {
    /// Build an agent identity without key material.
    pub fn new(
        id: AgentId,
        display_name: impl Into<String>,
        clearance: ClearanceLevel,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            clearance,
            session_id: session_id.into(),
            public_key: None,
        }
    }

    /// Attach public key bytes.
    #[must_use]
    pub fn with_public_key(mut self, public_key: Vec<u8>) -> Self {
        self.public_key = Some(public_key);
        self
    }
}

/// The identity of a registered human approver.
///
/// Construction fails unless the clearance is L2; the approval workflow
/// re-checks the same rule at registration time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproverIdentity {
    pub id: ApproverId,
    pub display_name: String,
    pub clearance: ClearanceLevel,
    /// Optional contact address surfaced to notifier collaborators.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    /// Optional public key material; opaque bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<Vec<u8>>,
}

impl ApproverIdentity {
    /// Build an approver identity.
    ///
    /// Returns `InsufficientApproverClearance` unless `clearance` is L2.
    pub fn new(
        id: ApproverId,
        display_name: impl Into<String>,
        clearance: ClearanceLevel,
    ) -> GovernanceResult<Self> {
        if clearance != ClearanceLevel::L2 {
            return Err(GovernanceError::InsufficientApproverClearance {
                approver_id: id.0,
                actual: clearance,
            });
        }
        Ok(Self {
            id,
            display_name: display_name.into(),
            clearance,
            contact: None,
            public_key: None,
        })
    }

    /// Attach a contact address.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = Some(contact.into());
        self
    }

    /// Attach public key bytes.
    #[must_use]
    pub fn with_public_key(mut self, public_key: Vec<u8>) -> Self {
        self.public_key = Some(public_key);
        self
    }
}
