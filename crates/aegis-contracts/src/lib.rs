//! # aegis-contracts
//!
//! Shared types, schemas, and contracts for the AEGIS governance kernel.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate — only data definitions, the clearance map, the event taxonomy,
//! the configuration schema, and error types.

pub mod action;
pub mod approval;
pub mod audit;
pub mod clearance;
pub mod config;
pub mod error;
pub mod event;
pub mod execution;
pub mod identity;

#[cfg(test)]
mod tests {
    use super::*;
    use action::ActionKind;
    use clearance::ClearanceLevel;
    use config::{GovernanceConfig, HashAlgorithm};
    use error::GovernanceError;
    use identity::{ApproverId, ApproverIdentity};

    // ── Clearance map ────────────────────────────────────────────────────────

    #[test]
    fn every_action_kind_has_a_clearance_binding() {
        // The match in required_clearance() is exhaustive, so this test is
        // really about the partition being the documented one.
        let l0 = [
            ActionKind::ReadPublic,
            ActionKind::QueryStatus,
            ActionKind::ListResources,
        ];
        let l1 = [
            ActionKind::ModifyConfig,
            ActionKind::DeployService,
            ActionKind::ManageSecrets,
            ActionKind::ExecuteCommand,
        ];
        let l2 = [
            ActionKind::DestroyResource,
            ActionKind::ModifyProduction,
            ActionKind::TransferFunds,
            ActionKind::DeleteAuditLog,
            ActionKind::EscalatePrivileges,
            ActionKind::ExecuteArbitrary,
        ];

        for kind in l0 {
            assert_eq!(kind.required_clearance(), ClearanceLevel::L0);
        }
        for kind in l1 {
            assert_eq!(kind.required_clearance(), ClearanceLevel::L1);
        }
        for kind in l2 {
            assert_eq!(kind.required_clearance(), ClearanceLevel::L2);
        }
    }

    #[test]
    fn clearance_ordering_is_by_rank() {
        assert!(ClearanceLevel::L0 < ClearanceLevel::L1);
        assert!(ClearanceLevel::L1 < ClearanceLevel::L2);

        assert!(ClearanceLevel::L2.has_sufficient(ClearanceLevel::L0));
        assert!(ClearanceLevel::L1.has_sufficient(ClearanceLevel::L1));
        assert!(!ClearanceLevel::L0.has_sufficient(ClearanceLevel::L1));
        assert!(!ClearanceLevel::L1.has_sufficient(ClearanceLevel::L2));
    }

    // ── Approver construction ────────────────────────────────────────────────

    #[test]
    fn approver_construction_requires_l2() {
        let ok = ApproverIdentity::new(
            ApproverId::new("ap-1"),
            "Security Officer",
            ClearanceLevel::L2,
        );
        assert!(ok.is_ok());

        let err = ApproverIdentity::new(
            ApproverId::new("ap-2"),
            "Intern",
            ClearanceLevel::L1,
        );
        match err {
            Err(GovernanceError::InsufficientApproverClearance { approver_id, actual }) => {
                assert_eq!(approver_id, "ap-2");
                assert_eq!(actual, ClearanceLevel::L1);
            }
            other => panic!("expected InsufficientApproverClearance, got {:?}", other),
        }
    }

    // ── Configuration ────────────────────────────────────────────────────────

    #[test]
    fn config_defaults_match_documented_values() {
        let config = GovernanceConfig::default();
        assert_eq!(config.l2_approval_timeout_ms, 300_000);
        assert_eq!(config.required_approvers, 1);
        assert!(config.auto_reject_on_timeout);
        assert_eq!(config.audit_retention_days, 365);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha256);
        assert!(config.enable_immutable_audit);
        assert!(config.emergency_override_key.is_none());

        assert_eq!(config.approvals.min_approvers, 1);
        assert_eq!(config.approvals.max_approvers, 3);
        assert!(!config.approvals.require_unanimous);
        // The escalation warning fires strictly before the absolute deadline.
        assert!(config.approvals.escalation_timeout_ms < config.l2_approval_timeout_ms);
        assert!(config.approvals.require_mfa);
    }

    #[test]
    fn config_parses_from_toml() {
        let toml = r#"
            l2_approval_timeout_ms = 60000
            required_approvers = 2
            hash_algorithm = "SHA-512"

            [approvals]
            require_unanimous = true
            notify_channels = ["ops-room", "pager"]
        "#;

        let config = GovernanceConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.l2_approval_timeout_ms, 60_000);
        assert_eq!(config.required_approvers, 2);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha512);
        // Unspecified fields take their defaults.
        assert!(config.auto_reject_on_timeout);
        assert!(config.approvals.require_unanimous);
        assert_eq!(config.approvals.notify_channels, vec!["ops-room", "pager"]);
    }

    #[test]
    fn config_rejects_malformed_toml() {
        let err = GovernanceConfig::from_toml_str("l2_approval_timeout_ms = \"soon\"");
        match err {
            Err(GovernanceError::ConfigError { reason }) => {
                assert!(reason.contains("failed to parse governance TOML"));
            }
            other => panic!("expected ConfigError, got {:?}", other),
        }
    }

    #[test]
    fn approval_policy_inherits_required_approvers() {
        let mut config = GovernanceConfig::default();
        config.required_approvers = 2;

        let policy = config.approval_policy();
        assert_eq!(policy.min_approvers, 2);
        assert_eq!(policy.max_approvers, 3);
    }

    // ── Error display messages ───────────────────────────────────────────────

    #[test]
    fn error_already_executed_display() {
        let err = GovernanceError::AlreadyExecuted {
            action_id: "act-1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("already been executed"));
        assert!(msg.contains("act-1"));
    }

    #[test]
    fn error_no_approvers_display() {
        let msg = GovernanceError::NoApproversRegistered.to_string();
        assert!(msg.contains("no approvers"));
    }

    #[test]
    fn error_unauthorized_display() {
        let err = GovernanceError::Unauthorized {
            approver_id: "ap-9".to_string(),
            approval_id: "apr-1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("ap-9"));
        assert!(msg.contains("apr-1"));
    }
}
