//! The enforcement engine.
//!
//! Every gate an action must pass before its executor may run lives here,
//! checked in a fixed order:
//!
//!   idempotency → clearance → approval state → sanitization
//!
//! The executor call site is downstream in Mission Control and is only
//! reachable when `pre_execute` returns `Proceed`. Denials are outcome
//! variants, not errors; the orchestrator audits them and raises the
//! matching error afterwards.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use aegis_contracts::{
    action::{ActionId, ActionRequest, ActionResult},
    approval::{ApprovalId, ApprovalRequest, ApprovalState},
    clearance::ClearanceLevel,
    config::GovernanceConfig,
    error::{GovernanceError, GovernanceResult},
    event::GovernanceEvent,
    execution::{
        CleanupAction, EnforcementVerdict, PostExecuteReport, PreExecuteOutcome, RejectionKind,
    },
    identity::AgentIdentity,
};
use aegis_core::{Clock, EventDispatcher};

use aegis_approval::{evidence_hash, ApprovalStore};

use crate::sanitize::sanitize_payload;

/// The clearance and policy gate in front of every executor invocation.
///
/// Owns the idempotency set; shares the approval store with the workflow
/// and the event dispatcher and clock with the rest of the kernel.
pub struct EnforcementEngine {
    config: GovernanceConfig,
    /// Action request ids observed completed. Grows for the lifetime of
    /// the orchestrator; truncation is a persistence-collaborator concern.
    completed: Mutex<HashSet<String>>,
    store: Arc<ApprovalStore>,
    events: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl EnforcementEngine {
    pub fn new(
        config: GovernanceConfig,
        store: Arc<ApprovalStore>,
        events: Arc<EventDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            completed: Mutex::new(HashSet::new()),
            store,
            events,
            clock,
        }
    }

    /// The pure enforcement decision for one request.
    ///
    /// Looks up the required clearance, compares ranks, and for L2 kinds
    /// resolves the gating approval: the active request for this
    /// (kind, agent) pair when one exists, otherwise a newly built pending
    /// request (evidence hash bound here, expiry stamped from the
    /// configured deadline). No state is mutated and no timer is
    /// scheduled; that is `pre_execute`'s job.
    pub fn validate(&self, request: &ActionRequest, agent: &AgentIdentity) -> EnforcementVerdict {
        let required = request.kind.required_clearance();
        let actual = agent.clearance;

        if !actual.has_sufficient(required) {
            return EnforcementVerdict {
                required,
                actual,
                allowed: false,
                requires_approval: false,
                approval: None,
                reason: Some(format!(
                    "Insufficient clearance: action '{}' requires {}, agent '{}' holds {}",
                    request.kind, required, agent.id, actual
                )),
            };
        }

        if required != ClearanceLevel::L2 {
            return EnforcementVerdict {
                required,
                actual,
                allowed: true,
                requires_approval: false,
                approval: None,
                reason: None,
            };
        }

        match self.store.active_for(request.kind, &agent.id) {
            Some(active) => {
                let (allowed, reason) = match active.state {
                    ApprovalState::Pending => {
                        (false, Some("approval pending".to_string()))
                    }
                    ApprovalState::Approved => (true, None),
                    ApprovalState::Rejected => (
                        false,
                        Some(format!(
                            "approval rejected: {}",
                            active.rejection_reason.as_deref().unwrap_or("no reason given")
                        )),
                    ),
                    ApprovalState::Expired => {
                        (false, Some("approval expired before a decision".to_string()))
                    }
                    ApprovalState::Revoked => (
                        false,
                        Some(format!(
                            "approval revoked: {}",
                            active.rejection_reason.as_deref().unwrap_or("no reason given")
                        )),
                    ),
                };
                EnforcementVerdict {
                    required,
                    actual,
                    allowed,
                    requires_approval: true,
                    approval: Some(active),
                    reason,
                }
            }
            None => {
                let now = self.clock.now();
                let expires_at = now
                    + chrono::Duration::milliseconds(self.config.l2_approval_timeout_ms as i64);
                let evidence = evidence_hash(self.config.hash_algorithm, request, &now);
                let approval = ApprovalRequest::new_pending(
                    request.id.clone(),
                    request.kind,
                    agent.clone(),
                    now,
                    expires_at,
                    evidence,
                );

                EnforcementVerdict {
                    required,
                    actual,
                    allowed: false,
                    requires_approval: true,
                    approval: Some(approval),
                    reason: Some("approval required".to_string()),
                }
            }
        }
    }

    /// Run every pre-execution gate for one request.
    ///
    /// Errors only on the idempotency guard; every policy denial is an
    /// outcome variant so the orchestrator can audit it first.
    pub fn pre_execute(
        &self,
        request: &ActionRequest,
        agent: &AgentIdentity,
    ) -> GovernanceResult<PreExecuteOutcome> {
        let action_id = request.id.to_string();
        {
            let completed = self.completed.lock().expect("idempotency set lock poisoned");
            if completed.contains(&action_id) {
                return Err(GovernanceError::AlreadyExecuted { action_id });
            }
        }

        // Lazy expiry: virtual-clock hosts may consult an overdue approval
        // before its timer thread has fired.
        if self.config.auto_reject_on_timeout {
            if let Some(active) = self.store.active_for(request.kind, &agent.id) {
                if active.is_pending() {
                    if let Some(expired) = self.store.expire_if_due(&active.id, self.clock.now()) {
                        warn!(approval_id = %expired.id, "approval expired on consultation");
                        self.events.emit(&GovernanceEvent::approval_timeout(
                            self.clock.now(),
                            &expired,
                            "expiry",
                        ));
                    }
                }
            }
        }

        let verdict = self.validate(request, agent);

        if !verdict.allowed {
            if !verdict.requires_approval {
                // Clearance violation: announce at critical severity with
                // both levels, then hand the denial back for auditing.
                warn!(
                    action_id = %request.id,
                    kind = %request.kind,
                    agent_id = %agent.id,
                    required = %verdict.required,
                    actual = %verdict.actual,
                    "clearance violation"
                );
                self.events.emit(&GovernanceEvent::clearance_violation(
                    self.clock.now(),
                    request,
                    verdict.required,
                    verdict.actual,
                ));
                return Ok(PreExecuteOutcome::Rejected {
                    reason: verdict.reason.unwrap_or_else(|| "insufficient clearance".into()),
                    kind: RejectionKind::Clearance,
                    approval: None,
                });
            }

            let approval = verdict
                .approval
                .expect("requires_approval verdicts always carry the approval");

            return Ok(match approval.state {
                // A newly built request has no chosen approvers yet; it
                // still needs to be submitted to the workflow. The
                // absolute expiry timer starts now either way.
                ApprovalState::Pending if approval.authorized_approvers.is_empty() => {
                    self.schedule_expiry(approval.id.clone());
                    PreExecuteOutcome::RequiresApproval { approval }
                }
                ApprovalState::Pending => PreExecuteOutcome::AwaitingApproval { approval },
                _ => PreExecuteOutcome::Rejected {
                    reason: verdict.reason.unwrap_or_else(|| "approval not granted".into()),
                    kind: RejectionKind::Approval,
                    approval: Some(approval),
                },
            });
        }

        // Fallthrough: an approved L2 request is single-use. Detach it
        // from the active index so the next attempt needs fresh approval.
        if let Some(approved) = &verdict.approval {
            debug!(approval_id = %approved.id, action_id = %request.id, "consuming approved request");
            self.store.consume_active(request.kind, &agent.id);
        }

        Ok(PreExecuteOutcome::Proceed {
            payload: sanitize_payload(&request.payload),
            approval: verdict.approval,
        })
    }

    /// Record the completion of one request and report cleanup work.
    ///
    /// Emits `action-executed` on success, `action-failed` on error; a
    /// failed execution also reports the rollback obligations the caller
    /// should drive.
    pub fn post_execute(
        &self,
        request: &ActionRequest,
        result: &ActionResult,
    ) -> PostExecuteReport {
        self.mark_completed(&request.id);
        let now = self.clock.now();

        if result.success {
            info!(action_id = %request.id, kind = %request.kind, "action executed");
            self.events
                .emit(&GovernanceEvent::action_executed(now, request));
            PostExecuteReport { cleanup: Vec::new() }
        } else {
            warn!(
                action_id = %request.id,
                kind = %request.kind,
                error = result.error.as_deref().unwrap_or(""),
                "action failed"
            );
            self.events
                .emit(&GovernanceEvent::action_failed(now, request, result));
            PostExecuteReport {
                cleanup: vec![
                    CleanupAction::RollbackPendingChanges,
                    CleanupAction::ReleaseResources,
                ],
            }
        }
    }

    /// Mark a request id as observed completed.
    ///
    /// `post_execute` calls this for executed requests; the orchestrator
    /// also calls it for audited denials, so a denied id cannot produce a
    /// second audit entry either.
    pub fn mark_completed(&self, id: &ActionId) {
        let mut completed = self.completed.lock().expect("idempotency set lock poisoned");
        completed.insert(id.to_string());
    }

    /// Whether a request id has already completed.
    pub fn is_completed(&self, id: &ActionId) -> bool {
        let completed = self.completed.lock().expect("idempotency set lock poisoned");
        completed.contains(&id.to_string())
    }

    /// One-shot absolute deadline for a newly created approval.
    ///
    /// Fires once at `l2_approval_timeout_ms`; if the request is still
    /// pending it transitions to `expired` (when `auto_reject_on_timeout`
    /// is set) and an `approval-timeout` warning is emitted.
    fn schedule_expiry(&self, approval_id: ApprovalId) {
        let store = self.store.clone();
        let events = self.events.clone();
        let clock = self.clock.clone();
        let auto_reject = self.config.auto_reject_on_timeout;
        let delay = Duration::from_millis(self.config.l2_approval_timeout_ms);

        self.clock.schedule(
            delay,
            Box::new(move || {
                let Some(request) = store.get(&approval_id) else {
                    // Never submitted (e.g. no approvers were registered).
                    return;
                };
                if !request.is_pending() {
                    return;
                }

                if auto_reject {
                    if let Some(expired) = store.expire_if_due(&approval_id, clock.now()) {
                        warn!(approval_id = %approval_id, "approval expired at absolute deadline");
                        events.emit(&GovernanceEvent::approval_timeout(
                            clock.now(),
                            &expired,
                            "expiry",
                        ));
                    }
                } else {
                    warn!(approval_id = %approval_id, "approval past deadline; auto-reject disabled");
                    events.emit(&GovernanceEvent::approval_timeout(clock.now(), &request, "expiry"));
                }
            }),
        );
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;

    use aegis_contracts::{
        action::ActionKind,
        event::EventKind,
        identity::{AgentId, ApproverId},
    };
    use aegis_core::ManualClock;

    use super::*;

    fn fixed_start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    struct Harness {
        engine: EnforcementEngine,
        store: Arc<ApprovalStore>,
        events: Arc<EventDispatcher>,
        clock: Arc<ManualClock>,
    }

    fn make_harness(config: GovernanceConfig) -> Harness {
        let store = Arc::new(ApprovalStore::new());
        let events = Arc::new(EventDispatcher::new());
        let clock = Arc::new(ManualClock::starting_at(fixed_start()));
        let engine = EnforcementEngine::new(config, store.clone(), events.clone(), clock.clone());
        Harness {
            engine,
            store,
            events,
            clock,
        }
    }

    fn make_agent(id: &str, clearance: ClearanceLevel) -> AgentIdentity {
        AgentIdentity::new(AgentId::new(id), id, clearance, "sess-1")
    }

    fn make_request(kind: ActionKind, agent: &AgentIdentity) -> ActionRequest {
        ActionRequest::new(kind, agent.id.clone(), json!({"resource_id": "r-1"}), fixed_start())
    }

    /// Drive a new L2 request to its pending, workflow-submitted shape.
    fn submit_l2(h: &Harness, agent: &AgentIdentity) -> (ActionRequest, ApprovalRequest) {
        let request = make_request(ActionKind::DestroyResource, agent);
        let outcome = h.engine.pre_execute(&request, agent).unwrap();
        let mut approval = match outcome {
            PreExecuteOutcome::RequiresApproval { approval } => approval,
            other => panic!("expected RequiresApproval, got {:?}", other),
        };
        approval.authorized_approvers = vec![ApproverId::new("ap-1")];
        h.store.insert(approval.clone());
        (request, approval)
    }

    // ── Clearance ─────────────────────────────────────────────────────────────

    #[test]
    fn l0_agent_passes_through_for_l0_action() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L0);
        let request = make_request(ActionKind::QueryStatus, &agent);

        match h.engine.pre_execute(&request, &agent).unwrap() {
            PreExecuteOutcome::Proceed { approval, .. } => assert!(approval.is_none()),
            other => panic!("expected Proceed, got {:?}", other),
        }
    }

    #[test]
    fn insufficient_clearance_is_rejected_with_a_critical_event() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L0);
        let request = make_request(ActionKind::ModifyConfig, &agent);

        let violations = Arc::new(AtomicUsize::new(0));
        let v = violations.clone();
        h.events.subscribe(EventKind::ClearanceViolation, move |event| {
            assert_eq!(event.details["required"], "L1");
            assert_eq!(event.details["actual"], "L0");
            v.fetch_add(1, Ordering::SeqCst);
        });

        match h.engine.pre_execute(&request, &agent).unwrap() {
            PreExecuteOutcome::Rejected { reason, kind, .. } => {
                assert_eq!(kind, RejectionKind::Clearance);
                assert!(reason.contains("Insufficient clearance"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert_eq!(violations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn higher_clearance_covers_lower_actions() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L1);
        let request = make_request(ActionKind::ReadPublic, &agent);

        let verdict = h.engine.validate(&request, &agent);
        assert!(verdict.allowed);
        assert!(!verdict.requires_approval);
    }

    // ── Idempotency ───────────────────────────────────────────────────────────

    #[test]
    fn repeated_request_id_is_rejected() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L0);
        let request = make_request(ActionKind::QueryStatus, &agent);

        h.engine.pre_execute(&request, &agent).unwrap();
        let result = ActionResult::success(request.id.clone(), fixed_start(), json!({}));
        h.engine.post_execute(&request, &result);

        match h.engine.pre_execute(&request, &agent) {
            Err(GovernanceError::AlreadyExecuted { action_id }) => {
                assert_eq!(action_id, request.id.to_string());
            }
            other => panic!("expected AlreadyExecuted, got {:?}", other),
        }
    }

    // ── Approval lifecycle ────────────────────────────────────────────────────

    #[test]
    fn first_l2_attempt_creates_a_pending_approval() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let request = make_request(ActionKind::DestroyResource, &agent);

        match h.engine.pre_execute(&request, &agent).unwrap() {
            PreExecuteOutcome::RequiresApproval { approval } => {
                assert!(approval.is_pending());
                assert_eq!(approval.action_id, request.id);
                assert!(!approval.evidence_hash.is_empty());
                assert_eq!(
                    approval.expires_at,
                    fixed_start() + chrono::Duration::milliseconds(300_000)
                );
            }
            other => panic!("expected RequiresApproval, got {:?}", other),
        }
    }

    #[test]
    fn second_attempt_reports_the_pending_approval() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let (_, approval) = submit_l2(&h, &agent);

        // A retry mints a fresh request id; correlation is (kind, agent).
        let retry = make_request(ActionKind::DestroyResource, &agent);
        match h.engine.pre_execute(&retry, &agent).unwrap() {
            PreExecuteOutcome::AwaitingApproval { approval: found } => {
                assert_eq!(found.id, approval.id);
            }
            other => panic!("expected AwaitingApproval, got {:?}", other),
        }
    }

    #[test]
    fn approved_request_falls_through_and_is_consumed() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let (_, approval) = submit_l2(&h, &agent);

        h.store.update(&approval.id, |req, _| req.state = ApprovalState::Approved);

        let retry = make_request(ActionKind::DestroyResource, &agent);
        match h.engine.pre_execute(&retry, &agent).unwrap() {
            PreExecuteOutcome::Proceed { approval: attached, .. } => {
                assert_eq!(attached.unwrap().id, approval.id);
            }
            other => panic!("expected Proceed, got {:?}", other),
        }

        // Single-use: the next attempt starts a fresh approval.
        let third = make_request(ActionKind::DestroyResource, &agent);
        match h.engine.pre_execute(&third, &agent).unwrap() {
            PreExecuteOutcome::RequiresApproval { approval: fresh } => {
                assert_ne!(fresh.id, approval.id);
            }
            other => panic!("expected RequiresApproval, got {:?}", other),
        }
    }

    #[test]
    fn rejected_approval_blocks_with_its_reason() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let (_, approval) = submit_l2(&h, &agent);

        h.store.update(&approval.id, |req, _| {
            req.state = ApprovalState::Rejected;
            req.rejection_reason = Some("risky".to_string());
        });

        let retry = make_request(ActionKind::DestroyResource, &agent);
        match h.engine.pre_execute(&retry, &agent).unwrap() {
            PreExecuteOutcome::Rejected { reason, kind, approval: attached } => {
                assert_eq!(kind, RejectionKind::Approval);
                assert!(reason.contains("risky"));
                assert!(attached.is_some());
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    // ── Payload sanitization ──────────────────────────────────────────────────

    #[test]
    fn proceed_carries_the_sanitized_payload() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L0);
        let request = ActionRequest::new(
            ActionKind::QueryStatus,
            agent.id.clone(),
            json!({"q": "status", "__proto__": {"polluted": true}}),
            fixed_start(),
        );

        match h.engine.pre_execute(&request, &agent).unwrap() {
            PreExecuteOutcome::Proceed { payload, .. } => {
                assert_eq!(payload, json!({"q": "status"}));
            }
            other => panic!("expected Proceed, got {:?}", other),
        }
    }

    // ── Timeouts ──────────────────────────────────────────────────────────────

    #[test]
    fn expiry_timer_expires_a_pending_approval() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let (_, approval) = submit_l2(&h, &agent);

        let timeouts = Arc::new(AtomicUsize::new(0));
        let t = timeouts.clone();
        h.events.subscribe(EventKind::ApprovalTimeout, move |event| {
            assert_eq!(event.details["phase"], "expiry");
            t.fetch_add(1, Ordering::SeqCst);
        });

        h.clock.advance(std::time::Duration::from_millis(300_000));

        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.store.get(&approval.id).unwrap().state,
            ApprovalState::Expired
        );

        let retry = make_request(ActionKind::DestroyResource, &agent);
        match h.engine.pre_execute(&retry, &agent).unwrap() {
            PreExecuteOutcome::Rejected { reason, kind, .. } => {
                assert_eq!(kind, RejectionKind::Approval);
                assert!(reason.contains("expired"));
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn expiry_timer_leaves_decided_approvals_alone() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let (_, approval) = submit_l2(&h, &agent);

        h.store.update(&approval.id, |req, _| req.state = ApprovalState::Approved);
        h.clock.advance(std::time::Duration::from_millis(300_000));

        assert_eq!(
            h.store.get(&approval.id).unwrap().state,
            ApprovalState::Approved
        );
    }

    #[test]
    fn auto_reject_off_warns_but_keeps_the_request_pending() {
        let mut config = GovernanceConfig::default();
        config.auto_reject_on_timeout = false;
        let h = make_harness(config);
        let agent = make_agent("agent-b", ClearanceLevel::L2);
        let (_, approval) = submit_l2(&h, &agent);

        let timeouts = Arc::new(AtomicUsize::new(0));
        let t = timeouts.clone();
        h.events.subscribe(EventKind::ApprovalTimeout, move |_| {
            t.fetch_add(1, Ordering::SeqCst);
        });

        h.clock.advance(std::time::Duration::from_millis(300_000));
        assert_eq!(timeouts.load(Ordering::SeqCst), 1);
        assert_eq!(
            h.store.get(&approval.id).unwrap().state,
            ApprovalState::Pending
        );
    }

    #[test]
    fn overdue_approval_expires_lazily_on_consultation() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-b", ClearanceLevel::L2);

        // Insert an already-overdue pending approval directly, bypassing
        // pre_execute so no timer was ever scheduled for it.
        let request = make_request(ActionKind::DestroyResource, &agent);
        let overdue = ApprovalRequest::new_pending(
            request.id.clone(),
            request.kind,
            agent.clone(),
            fixed_start() - chrono::Duration::minutes(10),
            fixed_start() - chrono::Duration::minutes(5),
            "evidence".to_string(),
        );
        let overdue_id = overdue.id.clone();
        h.store.insert(overdue);

        let retry = make_request(ActionKind::DestroyResource, &agent);
        match h.engine.pre_execute(&retry, &agent).unwrap() {
            PreExecuteOutcome::Rejected { reason, .. } => assert!(reason.contains("expired")),
            other => panic!("expected Rejected, got {:?}", other),
        }
        assert_eq!(
            h.store.get(&overdue_id).unwrap().state,
            ApprovalState::Expired
        );
    }

    // ── Post-execution ────────────────────────────────────────────────────────

    #[test]
    fn post_execute_emits_and_reports_cleanup_on_failure() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L0);
        let request = make_request(ActionKind::QueryStatus, &agent);

        let failed = Arc::new(AtomicUsize::new(0));
        let f = failed.clone();
        h.events.subscribe(EventKind::ActionFailed, move |_| {
            f.fetch_add(1, Ordering::SeqCst);
        });

        let result = ActionResult::failure(request.id.clone(), fixed_start(), "boom");
        let report = h.engine.post_execute(&request, &result);

        assert_eq!(
            report.cleanup,
            vec![
                CleanupAction::RollbackPendingChanges,
                CleanupAction::ReleaseResources
            ]
        );
        assert_eq!(failed.load(Ordering::SeqCst), 1);
        assert!(h.engine.is_completed(&request.id));
    }

    #[test]
    fn post_execute_emits_executed_on_success() {
        let h = make_harness(GovernanceConfig::default());
        let agent = make_agent("agent-a", ClearanceLevel::L0);
        let request = make_request(ActionKind::QueryStatus, &agent);

        let executed = Arc::new(AtomicUsize::new(0));
        let e = executed.clone();
        h.events.subscribe(EventKind::ActionExecuted, move |_| {
            e.fetch_add(1, Ordering::SeqCst);
        });

        let result = ActionResult::success(request.id.clone(), fixed_start(), json!({}));
        let report = h.engine.post_execute(&request, &result);

        assert!(report.cleanup.is_empty());
        assert_eq!(executed.load(Ordering::SeqCst), 1);
    }
}
