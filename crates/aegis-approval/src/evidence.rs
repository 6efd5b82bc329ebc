//! Evidence hashing.
//!
//! The evidence hash binds an approval request to the immutable
//! identifying fields of the action it gates, at the moment the approval
//! is created. Approvers sign off against this digest; a later reader can
//! recompute it and confirm the payload was not swapped under them.
//!
//! Hash input (bytes, in order):
//!   1. action request id
//!   2. action kind (kebab-case name)
//!   3. requesting agent id
//!   4. canonical creation timestamp (ISO-8601 millis, UTC)
//!   5. digest of the payload's compact JSON encoding

use chrono::{DateTime, Utc};

use aegis_contracts::{action::ActionRequest, config::HashAlgorithm};
use aegis_core::{canonical_timestamp, digest_hex, ChainHasher};

/// Compute the evidence hash for an approval created at `at`.
pub fn evidence_hash(
    algorithm: HashAlgorithm,
    action: &ActionRequest,
    at: &DateTime<Utc>,
) -> String {
    // serde_json produces a stable compact encoding for the same value,
    // which is all the payload digest needs.
    let payload_bytes =
        serde_json::to_vec(&action.payload).expect("JSON value must serialize");
    let payload_digest = digest_hex(algorithm, payload_bytes);

    let mut hasher = ChainHasher::new(algorithm);
    hasher.update(action.id.to_string().as_bytes());
    hasher.update(action.kind.as_str().as_bytes());
    hasher.update(action.agent_id.0.as_bytes());
    hasher.update(canonical_timestamp(at).as_bytes());
    hasher.update(payload_digest.as_bytes());
    hasher.finalize_hex()
}
