//! # aegis-enforce
//!
//! The enforcement engine of the AEGIS governance kernel: clearance
//! arithmetic, the idempotency guard, approval-request creation with its
//! absolute expiry deadline, and payload sanitization.
//!
//! The engine never runs executors and never holds a lock across anything
//! that does; it decides, records, and hands the sanitized payload to the
//! orchestrator.

pub mod engine;
pub mod sanitize;

pub use engine::EnforcementEngine;
pub use sanitize::sanitize_payload;
