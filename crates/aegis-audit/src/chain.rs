//! Hash-chain primitives: canonical byte layouts and chain verification.
//!
//! The byte sequences fed into the digest are the wire contract for audit
//! portability; any implementation that wants to verify an exported trail
//! must reproduce them exactly. Strings are UTF-8, integers little-endian,
//! timestamps ISO-8601 with millisecond precision and a UTC `Z` suffix
//! (see `aegis_core::canonical_timestamp`).
//!
//! `entry_hash` input, in order:
//!   1. entry id
//!   2. canonical timestamp
//!   3. sequence as 8-byte little-endian
//!   4. action request id
//!   5. success flag as one byte (1/0)
//!   6. agent id
//!   7. previous hash (lowercase hex)
//!
//! `immutable_proof` input, in order:
//!   1. entry hash
//!   2. previous hash
//!   3. sequence as 8-byte little-endian
//!   4. canonical timestamp
//!
//! genesis input, in order:
//!   1. hash algorithm name (e.g. "SHA-256")
//!   2. retention days as 4-byte little-endian
//!   3. canonical creation timestamp

use chrono::{DateTime, Utc};

use aegis_contracts::{audit::AuditEntry, config::HashAlgorithm};
use aegis_core::{canonical_timestamp, ChainHasher};

/// Compute the digest over an entry's canonical identifying fields.
///
/// Returns lowercase hex. The hash fields themselves (`entry_hash`,
/// `immutable_proof`) are not part of the input.
#[allow(clippy::too_many_arguments)]
pub fn entry_hash_fields(
    algorithm: HashAlgorithm,
    entry_id: &str,
    timestamp: &DateTime<Utc>,
    sequence: u64,
    action_id: &str,
    success: bool,
    agent_id: &str,
    previous_hash: &str,
) -> String {
    let mut hasher = ChainHasher::new(algorithm);
    hasher.update(entry_id.as_bytes());
    hasher.update(canonical_timestamp(timestamp).as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(action_id.as_bytes());
    hasher.update([u8::from(success)]);
    hasher.update(agent_id.as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.finalize_hex()
}

/// Recompute the `entry_hash` of a stored entry.
pub fn entry_hash(algorithm: HashAlgorithm, entry: &AuditEntry) -> String {
    entry_hash_fields(
        algorithm,
        &entry.id,
        &entry.timestamp,
        entry.sequence,
        &entry.request.id.to_string(),
        entry.result.success,
        &entry.agent.id.0,
        &entry.previous_hash,
    )
}

/// Compute the proof binding an entry hash to its chain position.
pub fn immutable_proof_fields(
    algorithm: HashAlgorithm,
    entry_hash: &str,
    previous_hash: &str,
    sequence: u64,
    timestamp: &DateTime<Utc>,
) -> String {
    let mut hasher = ChainHasher::new(algorithm);
    hasher.update(entry_hash.as_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(sequence.to_le_bytes());
    hasher.update(canonical_timestamp(timestamp).as_bytes());
    hasher.finalize_hex()
}

/// Recompute the `immutable_proof` of a stored entry.
pub fn immutable_proof(algorithm: HashAlgorithm, entry: &AuditEntry) -> String {
    immutable_proof_fields(
        algorithm,
        &entry.entry_hash,
        &entry.previous_hash,
        entry.sequence,
        &entry.timestamp,
    )
}

/// Compute the genesis hash from the trail's construction parameters.
///
/// The genesis is the `previous_hash` of entry 1 and the anchor of an
/// empty trail.
pub fn genesis_hash(
    algorithm: HashAlgorithm,
    retention_days: u32,
    created_at: &DateTime<Utc>,
) -> String {
    let mut hasher = ChainHasher::new(algorithm);
    hasher.update(algorithm.name().as_bytes());
    hasher.update(retention_days.to_le_bytes());
    hasher.update(canonical_timestamp(created_at).as_bytes());
    hasher.finalize_hex()
}

/// Why a chain failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TamperReason {
    PreviousHashMismatch,
    EntryHashMismatch,
    ProofMismatch,
}

impl TamperReason {
    /// The reason code carried in `audit-tamper-detected` events.
    pub fn as_str(&self) -> &'static str {
        match self {
            TamperReason::PreviousHashMismatch => "PREVIOUS_HASH_MISMATCH",
            TamperReason::EntryHashMismatch => "ENTRY_HASH_MISMATCH",
            TamperReason::ProofMismatch => "PROOF_MISMATCH",
        }
    }
}

/// The result of walking a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainStatus {
    Valid,
    /// The first mismatch found, by sequence number.
    Broken { sequence: u64, reason: TamperReason },
}

impl ChainStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ChainStatus::Valid)
    }
}

/// Walk `entries` and check linkage, entry hashes, and proofs.
///
/// Stops at the first mismatch. Emits nothing; the trail decides whether
/// a failure is announced. An empty chain is valid.
pub fn check_chain(
    algorithm: HashAlgorithm,
    genesis: &str,
    entries: &[AuditEntry],
) -> ChainStatus {
    let mut expected_prev = genesis.to_string();

    for entry in entries {
        if entry.previous_hash != expected_prev {
            return ChainStatus::Broken {
                sequence: entry.sequence,
                reason: TamperReason::PreviousHashMismatch,
            };
        }

        if entry.entry_hash != entry_hash(algorithm, entry) {
            return ChainStatus::Broken {
                sequence: entry.sequence,
                reason: TamperReason::EntryHashMismatch,
            };
        }

        if entry.immutable_proof != immutable_proof(algorithm, entry) {
            return ChainStatus::Broken {
                sequence: entry.sequence,
                reason: TamperReason::ProofMismatch,
            };
        }

        expected_prev = entry.entry_hash.clone();
    }

    ChainStatus::Valid
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn empty_chain_is_valid() {
        assert!(check_chain(HashAlgorithm::Sha256, "genesis", &[]).is_valid());
    }

    #[test]
    fn genesis_differs_across_algorithms() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let g256 = genesis_hash(HashAlgorithm::Sha256, 365, &at);
        let g512 = genesis_hash(HashAlgorithm::Sha512, 365, &at);
        assert_ne!(g256, g512);
        assert_eq!(g256.len(), 64);
        assert_eq!(g512.len(), 128);
    }

    #[test]
    fn genesis_commits_to_retention() {
        let at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_ne!(
            genesis_hash(HashAlgorithm::Sha256, 365, &at),
            genesis_hash(HashAlgorithm::Sha256, 30, &at),
        );
    }

    #[test]
    fn entry_hash_is_deterministic() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let a = entry_hash_fields(
            HashAlgorithm::Sha256,
            "entry-1",
            &at,
            1,
            "action-1",
            true,
            "agent-a",
            "prev",
        );
        let b = entry_hash_fields(
            HashAlgorithm::Sha256,
            "entry-1",
            &at,
            1,
            "action-1",
            true,
            "agent-a",
            "prev",
        );
        assert_eq!(a, b);
    }

    #[test]
    fn entry_hash_commits_to_every_field() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let base = entry_hash_fields(
            HashAlgorithm::Sha256,
            "entry-1",
            &at,
            1,
            "action-1",
            true,
            "agent-a",
            "prev",
        );

        let flipped_success = entry_hash_fields(
            HashAlgorithm::Sha256,
            "entry-1",
            &at,
            1,
            "action-1",
            false,
            "agent-a",
            "prev",
        );
        assert_ne!(base, flipped_success);

        let bumped_sequence = entry_hash_fields(
            HashAlgorithm::Sha256,
            "entry-1",
            &at,
            2,
            "action-1",
            true,
            "agent-a",
            "prev",
        );
        assert_ne!(base, bumped_sequence);
    }
}
