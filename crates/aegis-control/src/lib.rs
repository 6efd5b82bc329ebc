//! # aegis-control
//!
//! Mission Control: the orchestrator that sequences enforcement, the
//! caller-supplied executor, and the audit append behind one entry point,
//! and owns event fan-out and the emergency stop.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aegis_contracts::{action::ActionKind, config::GovernanceConfig};
//! use aegis_control::MissionControl;
//!
//! let mc = MissionControl::new(GovernanceConfig::default());
//! mc.register_approver(officer)?;
//!
//! match mc.execute(ActionKind::QueryStatus, &agent, payload, |p| run(p))? {
//!     ExecuteOutcome::Completed { result, entry } => { /* done, audited */ }
//!     ExecuteOutcome::AwaitingApproval { approval } => {
//!         // obtain sign-off, then re-invoke execute
//!     }
//! }
//! ```

pub mod control;

pub use control::MissionControl;
