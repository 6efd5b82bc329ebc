//! Clearance levels.
//!
//! A totally ordered three-rung ladder attached to both agents and action
//! kinds. Comparison is by rank: `L0 < L1 < L2`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The clearance rank of an agent, approver, or action kind.
///
/// Derives `Ord` in declaration order, which is the rank order. All
/// clearance arithmetic in the kernel reduces to comparisons on this type.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ClearanceLevel {
    /// Read-only, publicly observable operations.
    L0,
    /// Mutating operations on non-critical surfaces.
    L1,
    /// Destructive or high-blast-radius operations; always require approval.
    L2,
}

impl ClearanceLevel {
    /// Numeric rank, 0-based. Exposed for event payloads and log fields.
    pub fn rank(&self) -> u8 {
        match self {
            ClearanceLevel::L0 => 0,
            ClearanceLevel::L1 => 1,
            ClearanceLevel::L2 => 2,
        }
    }

    /// `rank(self) >= rank(required)` — the single clearance predicate the
    /// enforcement engine uses.
    pub fn has_sufficient(&self, required: ClearanceLevel) -> bool {
        *self >= required
    }
}

impl fmt::Display for ClearanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClearanceLevel::L0 => write!(f, "L0"),
            ClearanceLevel::L1 => write!(f, "L1"),
            ClearanceLevel::L2 => write!(f, "L2"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClearanceLevel;

    #[test]
    fn rank_matches_declaration_order() {
        assert_eq!(ClearanceLevel::L0.rank(), 0);
        assert_eq!(ClearanceLevel::L1.rank(), 1);
        assert_eq!(ClearanceLevel::L2.rank(), 2);
    }

    #[test]
    fn display_is_the_rung_name() {
        assert_eq!(ClearanceLevel::L0.to_string(), "L0");
        assert_eq!(ClearanceLevel::L2.to_string(), "L2");
    }

    #[test]
    fn serde_round_trips() {
        let json = serde_json::to_string(&ClearanceLevel::L1).unwrap();
        let decoded: ClearanceLevel = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, ClearanceLevel::L1);
    }
}
