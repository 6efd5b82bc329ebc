//! # aegis-audit
//!
//! Immutable, append-only, hash-chained audit trail for the AEGIS
//! governance kernel.
//!
//! ## Overview
//!
//! Every governed attempt is wrapped in an `AuditEntry` that links to the
//! previous entry via its hash and carries a second digest binding the
//! entry to its chain position. Tampering with any entry — even a single
//! bit — breaks the chain and is detected by `verify_chain`, which emits
//! an `audit-tamper-detected` event with a machine-readable reason code.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aegis_audit::AuditTrail;
//!
//! let trail = AuditTrail::new(config, events, clock);
//! let entry = trail.record(&request, &result, &agent, None)?;
//!
//! assert!(trail.verify_chain());
//! let artifact = trail.export_json()?;
//! let anchor = trail.latest_anchor();
//! ```

pub mod chain;
pub mod trail;

pub use chain::{check_chain, entry_hash, genesis_hash, immutable_proof, ChainStatus, TamperReason};
pub use trail::{AuditExport, AuditTrail};
