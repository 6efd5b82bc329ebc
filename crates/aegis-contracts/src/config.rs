//! Governance configuration schema.
//!
//! `GovernanceConfig` deserializes from TOML with serde defaults for every
//! field, so a partial file (or none at all) yields the documented
//! defaults. The config snapshot is embedded in the audit export, making
//! it part of the compliance artifact.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GovernanceError, GovernanceResult};

/// The hash function used for the audit chain and evidence hashes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[default]
    #[serde(rename = "SHA-256")]
    Sha256,
    #[serde(rename = "SHA-384")]
    Sha384,
    #[serde(rename = "SHA-512")]
    Sha512,
}

impl HashAlgorithm {
    /// The canonical algorithm name, as it appears in config and in the
    /// genesis hash input.
    pub fn name(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha512 => "SHA-512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Approval workflow tuning.
///
/// Lives in its own section so the workflow can be constructed standalone;
/// inside Mission Control the top-level `required_approvers` overrides
/// `min_approvers` (see [`GovernanceConfig::approval_policy`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApprovalPolicy {
    /// Affirmative decisions required for approval.
    pub min_approvers: usize,
    /// Upper cap on the chosen approver set.
    pub max_approvers: usize,
    /// When true, every chosen approver must submit an affirmative
    /// decision before the request approves.
    pub require_unanimous: bool,
    /// Time until the first `approval-timeout` warning. Strictly before
    /// the absolute deadline; the default leaves a 60 second gap.
    pub escalation_timeout_ms: u64,
    /// Opaque channel names handed to notifier collaborators.
    pub notify_channels: Vec<String>,
    /// Advisory flag surfaced to notifiers; the kernel does not verify
    /// MFA itself.
    pub require_mfa: bool,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            min_approvers: 1,
            max_approvers: 3,
            require_unanimous: false,
            escalation_timeout_ms: 240_000,
            notify_channels: Vec::new(),
            require_mfa: true,
        }
    }
}

/// Full governance configuration for one Mission Control instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Absolute approval deadline for L2 actions, in milliseconds.
    pub l2_approval_timeout_ms: u64,
    /// Affirmative decisions required for approval. Overrides
    /// `approvals.min_approvers` when Mission Control resolves the policy.
    pub required_approvers: usize,
    /// When true, the expiry timer moves an overdue pending approval to
    /// `expired`; when false it only warns.
    pub auto_reject_on_timeout: bool,
    /// Advisory retention horizon for persistence collaborators.
    pub audit_retention_days: u32,
    pub hash_algorithm: HashAlgorithm,
    /// When false, the append-time tail integrity check is skipped (test
    /// hook; `verify_chain` still detects tampering).
    pub enable_immutable_audit: bool,
    /// Reserved for a future cryptographically-guarded emergency-stop path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_override_key: Option<String>,
    pub approvals: ApprovalPolicy,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            l2_approval_timeout_ms: 300_000,
            required_approvers: 1,
            auto_reject_on_timeout: true,
            audit_retention_days: 365,
            hash_algorithm: HashAlgorithm::default(),
            enable_immutable_audit: true,
            emergency_override_key: None,
            approvals: ApprovalPolicy::default(),
        }
    }
}

impl GovernanceConfig {
    /// Parse `s` as a TOML governance configuration.
    ///
    /// Returns `ConfigError` if the TOML is malformed or does not match
    /// the schema. Missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> GovernanceResult<Self> {
        toml::from_str(s).map_err(|e| GovernanceError::ConfigError {
            reason: format!("failed to parse governance TOML: {}", e),
        })
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> GovernanceResult<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| GovernanceError::ConfigError {
                reason: format!("failed to read config file '{}': {}", path.display(), e),
            })?;
        Self::from_toml_str(&contents)
    }

    /// The effective approval policy for this configuration.
    ///
    /// The top-level `required_approvers` wins over the section's
    /// `min_approvers`.
    pub fn approval_policy(&self) -> ApprovalPolicy {
        let mut policy = self.approvals.clone();
        policy.min_approvers = self.required_approvers;
        policy
    }
}
