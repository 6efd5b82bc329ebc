//! The append-only audit trail.
//!
//! All entries live in a `Vec` behind a `Mutex`; appends are serialized so
//! sequence numbers stay dense and strictly monotonic from 1. Entries are
//! snapshots: every read path clones, and nothing mutates an entry after
//! the append returns.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use aegis_contracts::{
    action::{ActionKind, ActionRequest, ActionResult},
    approval::ApprovalRequest,
    audit::AuditEntry,
    config::GovernanceConfig,
    error::{GovernanceError, GovernanceResult},
    event::GovernanceEvent,
    identity::{AgentId, AgentIdentity},
};
use aegis_core::{Clock, EventDispatcher};

use crate::chain::{
    check_chain, entry_hash, entry_hash_fields, genesis_hash, immutable_proof_fields,
    ChainStatus,
};

// ── Internal mutable state ────────────────────────────────────────────────────

/// The mutable interior of an `AuditTrail`.
///
/// `pub(crate)` so the in-crate tamper tests can mutate stored entries the
/// way an out-of-band attacker would.
pub(crate) struct TrailState {
    /// All entries in append order. `entries[i].sequence == i + 1`.
    pub(crate) entries: Vec<AuditEntry>,

    /// The `entry_hash` of the last entry, or the genesis hash before any
    /// append.
    pub(crate) last_hash: String,
}

// ── Export artifact ───────────────────────────────────────────────────────────

/// The structured dump produced by `export_json` — the compliance artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExport {
    pub genesis_hash: String,
    pub entry_count: usize,
    /// Snapshot of the governance configuration at export time.
    pub config: GovernanceConfig,
    pub entries: Vec<AuditEntry>,
    /// Chain verification result computed at export time.
    pub chain_valid: bool,
}

// ── Trail ─────────────────────────────────────────────────────────────────────

/// An in-memory, append-only audit trail backed by a hash chain.
///
/// # Thread safety
///
/// Every method acquires the internal mutex; callers on arbitrary threads
/// need no additional synchronization. `record` never runs user code, so
/// the lock is held only for the append itself.
pub struct AuditTrail {
    config: GovernanceConfig,
    genesis: String,
    pub(crate) state: Mutex<TrailState>,
    events: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl AuditTrail {
    /// Create an empty trail.
    ///
    /// The genesis hash is computed once here, over the hash algorithm,
    /// the retention horizon, and the construction time.
    pub fn new(
        config: GovernanceConfig,
        events: Arc<EventDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let created_at = clock.now();
        let genesis = genesis_hash(config.hash_algorithm, config.audit_retention_days, &created_at);

        Self {
            config,
            genesis: genesis.clone(),
            state: Mutex::new(TrailState {
                entries: Vec::new(),
                last_hash: genesis,
            }),
            events,
            clock,
        }
    }

    /// The genesis hash computed at construction.
    pub fn genesis_hash(&self) -> &str {
        &self.genesis
    }

    /// Append one entry to the chain and return a copy of it.
    ///
    /// When `enable_immutable_audit` is set, the current tail entry is
    /// re-verified first and a mismatch fails the append with
    /// `AuditWriteFailed` — a trail that is already tampered with must not
    /// accept new entries as though nothing happened.
    pub fn record(
        &self,
        request: &ActionRequest,
        result: &ActionResult,
        agent: &AgentIdentity,
        approval: Option<&ApprovalRequest>,
    ) -> GovernanceResult<AuditEntry> {
        let mut state = self.state.lock().map_err(|e| GovernanceError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })?;

        if self.config.enable_immutable_audit {
            if let Some(tail) = state.entries.last() {
                if tail.entry_hash != entry_hash(self.config.hash_algorithm, tail)
                    || tail.entry_hash != state.last_hash
                {
                    return Err(GovernanceError::AuditWriteFailed {
                        reason: "tail integrity check failed before append".to_string(),
                    });
                }
            }
        }

        let sequence = state.entries.len() as u64 + 1;
        let previous_hash = state.last_hash.clone();
        let id = uuid::Uuid::new_v4().to_string();
        let timestamp = self.clock.now();

        let entry_hash = entry_hash_fields(
            self.config.hash_algorithm,
            &id,
            &timestamp,
            sequence,
            &request.id.to_string(),
            result.success,
            &agent.id.0,
            &previous_hash,
        );
        let immutable_proof = immutable_proof_fields(
            self.config.hash_algorithm,
            &entry_hash,
            &previous_hash,
            sequence,
            &timestamp,
        );

        let entry = AuditEntry {
            id,
            timestamp,
            sequence,
            request: request.clone(),
            result: result.clone(),
            agent: agent.clone(),
            approval: approval.cloned(),
            previous_hash,
            entry_hash: entry_hash.clone(),
            immutable_proof,
        };

        debug!(
            sequence,
            action_id = %request.id,
            success = result.success,
            "audit entry appended"
        );

        state.entries.push(entry.clone());
        state.last_hash = entry_hash;

        Ok(entry)
    }

    /// Walk the whole chain, checking linkage, entry hashes, and proofs.
    ///
    /// On the first mismatch, emits exactly one `audit-tamper-detected`
    /// event at critical severity and returns false.
    pub fn verify_chain(&self) -> bool {
        let status = {
            let state = self.state.lock().expect("audit state lock poisoned");
            check_chain(self.config.hash_algorithm, &self.genesis, &state.entries)
        };

        match status {
            ChainStatus::Valid => true,
            ChainStatus::Broken { sequence, reason } => {
                warn!(sequence, reason = reason.as_str(), "audit chain verification failed");
                self.events.emit(&GovernanceEvent::audit_tamper_detected(
                    self.clock.now(),
                    sequence,
                    reason.as_str(),
                ));
                false
            }
        }
    }

    /// Fetch one entry by its id.
    pub fn get(&self, id: &str) -> Option<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        state.entries.iter().find(|e| e.id == id).cloned()
    }

    /// All entries in chain order.
    pub fn all(&self) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        state.entries.clone()
    }

    /// Entries whose primary action is of the given kind.
    pub fn by_action(&self, kind: ActionKind) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        state
            .entries
            .iter()
            .filter(|e| e.request.kind == kind)
            .cloned()
            .collect()
    }

    /// Entries recorded for the given agent.
    pub fn by_agent(&self, agent_id: &AgentId) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        state
            .entries
            .iter()
            .filter(|e| &e.agent.id == agent_id)
            .cloned()
            .collect()
    }

    /// Entries whose timestamp falls in `[start, end]`.
    pub fn by_time_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<AuditEntry> {
        let state = self.state.lock().expect("audit state lock poisoned");
        state
            .entries
            .iter()
            .filter(|e| e.timestamp >= start && e.timestamp <= end)
            .cloned()
            .collect()
    }

    /// Number of entries appended so far.
    pub fn len(&self) -> usize {
        let state = self.state.lock().expect("audit state lock poisoned");
        state.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the full trail as the JSON compliance artifact.
    ///
    /// `chain_valid` is computed here, silently: export never emits tamper
    /// events, it only reports.
    pub fn export_json(&self) -> GovernanceResult<String> {
        let (entries, chain_valid) = {
            let state = self.state.lock().expect("audit state lock poisoned");
            let status = check_chain(self.config.hash_algorithm, &self.genesis, &state.entries);
            (state.entries.clone(), status.is_valid())
        };

        let export = AuditExport {
            genesis_hash: self.genesis.clone(),
            entry_count: entries.len(),
            config: self.config.clone(),
            entries,
            chain_valid,
        };

        serde_json::to_string_pretty(&export).map_err(|e| GovernanceError::AuditWriteFailed {
            reason: format!("failed to serialize audit export: {}", e),
        })
    }

    /// The last entry hash, or the genesis hash on an empty trail.
    ///
    /// A compact commitment to the whole trail, suitable for external
    /// timestamping.
    pub fn latest_anchor(&self) -> String {
        let state = self.state.lock().expect("audit state lock poisoned");
        state.last_hash.clone()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;
    use serde_json::json;

    use aegis_contracts::{
        action::{ActionKind, ActionRequest, ActionResult},
        clearance::ClearanceLevel,
        config::HashAlgorithm,
        event::EventKind,
        identity::{AgentId, AgentIdentity},
    };
    use aegis_core::ManualClock;

    use super::*;

    fn fixed_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn make_trail() -> (AuditTrail, Arc<EventDispatcher>) {
        let events = Arc::new(EventDispatcher::new());
        let clock = Arc::new(ManualClock::starting_at(fixed_start()));
        let trail = AuditTrail::new(GovernanceConfig::default(), events.clone(), clock);
        (trail, events)
    }

    fn make_agent(id: &str) -> AgentIdentity {
        AgentIdentity::new(AgentId::new(id), id, ClearanceLevel::L0, "sess-1")
    }

    fn record_one(trail: &AuditTrail, agent: &AgentIdentity, kind: ActionKind) -> AuditEntry {
        let request = ActionRequest::new(kind, agent.id.clone(), json!({}), fixed_start());
        let result = ActionResult::success(request.id.clone(), fixed_start(), json!({"ok": true}));
        trail.record(&request, &result, agent, None).unwrap()
    }

    /// Sequence numbers are dense and start at 1.
    #[test]
    fn sequences_are_dense_from_one() {
        let (trail, _) = make_trail();
        let agent = make_agent("agent-a");

        for expected in 1..=3u64 {
            let entry = record_one(&trail, &agent, ActionKind::QueryStatus);
            assert_eq!(entry.sequence, expected);
        }

        let all = trail.all();
        for (idx, entry) in all.iter().enumerate() {
            assert_eq!(entry.sequence, idx as u64 + 1);
        }
    }

    /// Entry 1 links to the genesis; entry n links to entry n-1.
    #[test]
    fn entries_link_through_the_genesis() {
        let (trail, _) = make_trail();
        let agent = make_agent("agent-a");

        let first = record_one(&trail, &agent, ActionKind::QueryStatus);
        let second = record_one(&trail, &agent, ActionKind::ReadPublic);

        assert_eq!(first.previous_hash, trail.genesis_hash());
        assert_eq!(second.previous_hash, first.entry_hash);
        assert!(trail.verify_chain());
    }

    /// Mutating a stored entry's hash breaks verification and emits exactly
    /// one tamper event with the ENTRY_HASH_MISMATCH reason.
    #[test]
    fn tamper_with_entry_hash_is_detected() {
        let (trail, events) = make_trail();
        let agent = make_agent("agent-a");
        record_one(&trail, &agent, ActionKind::QueryStatus);
        record_one(&trail, &agent, ActionKind::QueryStatus);

        let tamper_events = Arc::new(AtomicUsize::new(0));
        let seen_reason = Arc::new(Mutex::new(String::new()));
        let t = tamper_events.clone();
        let r = seen_reason.clone();
        events.subscribe(EventKind::AuditTamperDetected, move |event| {
            t.fetch_add(1, Ordering::SeqCst);
            *r.lock().unwrap() = event.details["reason"].as_str().unwrap_or("").to_string();
        });

        // Out-of-band mutation of the first entry's stored hash. The
        // second entry still links to the original value, so the entry
        // hash check trips first.
        {
            let mut state = trail.state.lock().unwrap();
            state.entries[0].entry_hash = "0".repeat(64);
        }

        assert!(!trail.verify_chain());
        assert_eq!(tamper_events.load(Ordering::SeqCst), 1);
        assert_eq!(&*seen_reason.lock().unwrap(), "ENTRY_HASH_MISMATCH");
    }

    /// Mutating payload bits of a past entry is equally fatal.
    #[test]
    fn tamper_with_result_flag_is_detected() {
        let (trail, _) = make_trail();
        let agent = make_agent("agent-a");
        record_one(&trail, &agent, ActionKind::QueryStatus);

        {
            let mut state = trail.state.lock().unwrap();
            state.entries[0].result.success = false;
        }

        assert!(!trail.verify_chain());
    }

    /// A broken link between entries reports PREVIOUS_HASH_MISMATCH.
    #[test]
    fn tamper_with_linkage_is_detected() {
        let (trail, events) = make_trail();
        let agent = make_agent("agent-a");
        record_one(&trail, &agent, ActionKind::QueryStatus);
        record_one(&trail, &agent, ActionKind::QueryStatus);

        let seen_reason = Arc::new(Mutex::new(String::new()));
        let r = seen_reason.clone();
        events.subscribe(EventKind::AuditTamperDetected, move |event| {
            *r.lock().unwrap() = event.details["reason"].as_str().unwrap_or("").to_string();
        });

        {
            let mut state = trail.state.lock().unwrap();
            state.entries[1].previous_hash = "f".repeat(64);
        }

        assert!(!trail.verify_chain());
        assert_eq!(&*seen_reason.lock().unwrap(), "PREVIOUS_HASH_MISMATCH");
    }

    /// With immutable audit on, an append on a tampered trail fails.
    #[test]
    fn append_refused_after_tamper_when_immutable() {
        let (trail, _) = make_trail();
        let agent = make_agent("agent-a");
        record_one(&trail, &agent, ActionKind::QueryStatus);

        {
            let mut state = trail.state.lock().unwrap();
            state.entries[0].result.success = false;
        }

        let request =
            ActionRequest::new(ActionKind::QueryStatus, agent.id.clone(), json!({}), fixed_start());
        let result = ActionResult::success(request.id.clone(), fixed_start(), json!({}));
        let err = trail.record(&request, &result, &agent, None);

        match err {
            Err(GovernanceError::AuditWriteFailed { reason }) => {
                assert!(reason.contains("tail integrity"));
            }
            other => panic!("expected AuditWriteFailed, got {:?}", other),
        }
    }

    /// The test hook: with immutable audit off, the append is accepted and
    /// verification still reports the damage.
    #[test]
    fn append_allowed_after_tamper_when_not_immutable() {
        let events = Arc::new(EventDispatcher::new());
        let clock = Arc::new(ManualClock::starting_at(fixed_start()));
        let mut config = GovernanceConfig::default();
        config.enable_immutable_audit = false;
        let trail = AuditTrail::new(config, events, clock);
        let agent = make_agent("agent-a");

        record_one(&trail, &agent, ActionKind::QueryStatus);
        {
            let mut state = trail.state.lock().unwrap();
            state.entries[0].result.success = false;
        }

        record_one(&trail, &agent, ActionKind::QueryStatus);
        assert_eq!(trail.len(), 2);
        assert!(!trail.verify_chain());
    }

    /// Export-then-parse preserves count, hashes, and the validity flag.
    #[test]
    fn export_round_trips() {
        let (trail, _) = make_trail();
        let agent = make_agent("agent-a");
        let first = record_one(&trail, &agent, ActionKind::QueryStatus);
        let second = record_one(&trail, &agent, ActionKind::ReadPublic);

        let json = trail.export_json().unwrap();
        let export: AuditExport = serde_json::from_str(&json).unwrap();

        assert_eq!(export.entry_count, 2);
        assert_eq!(export.genesis_hash, trail.genesis_hash());
        assert!(export.chain_valid);
        assert_eq!(export.entries[0].entry_hash, first.entry_hash);
        assert_eq!(export.entries[1].entry_hash, second.entry_hash);
        assert_eq!(export.config.hash_algorithm, HashAlgorithm::Sha256);

        // The parsed entries still verify with the chain primitives.
        assert!(check_chain(
            HashAlgorithm::Sha256,
            &export.genesis_hash,
            &export.entries
        )
        .is_valid());
    }

    /// Export reports a broken chain without emitting tamper events.
    #[test]
    fn export_reports_invalid_chain_silently() {
        let (trail, events) = make_trail();
        let agent = make_agent("agent-a");
        record_one(&trail, &agent, ActionKind::QueryStatus);

        let tamper_events = Arc::new(AtomicUsize::new(0));
        let t = tamper_events.clone();
        events.subscribe(EventKind::AuditTamperDetected, move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });

        {
            let mut state = trail.state.lock().unwrap();
            state.entries[0].result.success = false;
        }

        let export: AuditExport = serde_json::from_str(&trail.export_json().unwrap()).unwrap();
        assert!(!export.chain_valid);
        assert_eq!(tamper_events.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn queries_filter_by_kind_agent_and_time() {
        let (trail, _) = make_trail();
        let alpha = make_agent("alpha");
        let beta = make_agent("beta");

        record_one(&trail, &alpha, ActionKind::QueryStatus);
        record_one(&trail, &beta, ActionKind::ReadPublic);
        record_one(&trail, &alpha, ActionKind::ReadPublic);

        assert_eq!(trail.by_action(ActionKind::ReadPublic).len(), 2);
        assert_eq!(trail.by_agent(&AgentId::new("alpha")).len(), 2);
        assert_eq!(trail.by_agent(&AgentId::new("gamma")).len(), 0);

        let all = trail.all();
        let hits = trail.by_time_range(all[0].timestamp, all[2].timestamp);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn anchor_tracks_the_tail() {
        let (trail, _) = make_trail();
        assert_eq!(trail.latest_anchor(), trail.genesis_hash());

        let agent = make_agent("agent-a");
        let entry = record_one(&trail, &agent, ActionKind::QueryStatus);
        assert_eq!(trail.latest_anchor(), entry.entry_hash);
    }

    #[test]
    fn get_finds_entries_by_id() {
        let (trail, _) = make_trail();
        let agent = make_agent("agent-a");
        let entry = record_one(&trail, &agent, ActionKind::QueryStatus);

        assert!(trail.get(&entry.id).is_some());
        assert!(trail.get("nope").is_none());
    }
}
