//! Mission Control: the single entry point of the governance kernel.
//!
//! One orchestrator instance owns the enforcement engine, the approval
//! workflow, and the audit trail for its lifetime, and wires them around
//! the caller-supplied executor:
//!
//!   pre_execute → [executor] → post_execute → audit append
//!
//! The executor is untrusted caller code. It only runs when every
//! enforcement gate has passed, and no component lock is held across the
//! invocation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, info, warn};

use aegis_contracts::{
    action::{ActionKind, ActionRequest, ActionResult},
    approval::{ApprovalId, ApprovalRequest},
    config::GovernanceConfig,
    error::{GovernanceError, GovernanceResult},
    event::{EventKind, GovernanceEvent},
    execution::{ExecuteOutcome, ExecutionContext, PreExecuteOutcome, RejectionKind},
    identity::{AgentIdentity, ApproverId, ApproverIdentity},
};
use aegis_core::{Clock, EventDispatcher, EventSubscription, SystemClock};

use aegis_approval::{ApprovalStore, ApprovalWorkflow};
use aegis_audit::AuditTrail;
use aegis_enforce::EnforcementEngine;

/// The governance orchestrator.
///
/// All public methods are safe to call from arbitrary threads; each owned
/// component guards its own state, and the one shared event dispatcher
/// means a handler registered here observes all of them.
pub struct MissionControl {
    config: GovernanceConfig,
    events: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
    enforcement: EnforcementEngine,
    workflow: ApprovalWorkflow,
    audit: AuditTrail,
    contexts: Mutex<HashMap<String, ExecutionContext>>,
}

impl MissionControl {
    /// Build an orchestrator on the system clock.
    pub fn new(config: GovernanceConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Build an orchestrator on an injected clock (virtual time in tests).
    pub fn with_clock(config: GovernanceConfig, clock: Arc<dyn Clock>) -> Self {
        let events = Arc::new(EventDispatcher::new());
        let store = Arc::new(ApprovalStore::new());

        let enforcement = EnforcementEngine::new(
            config.clone(),
            store.clone(),
            events.clone(),
            clock.clone(),
        );
        let workflow = ApprovalWorkflow::new(
            config.approval_policy(),
            store,
            events.clone(),
            clock.clone(),
        );
        let audit = AuditTrail::new(config.clone(), events.clone(), clock.clone());

        Self {
            config,
            events,
            clock,
            enforcement,
            workflow,
            audit,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// The configuration this instance was built with.
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    // ── Approver management ───────────────────────────────────────────────────

    /// Register a human approver (must hold L2).
    pub fn register_approver(&self, approver: ApproverIdentity) -> GovernanceResult<()> {
        self.workflow.register_approver(approver)
    }

    /// Remove an approver from the registry.
    pub fn unregister_approver(&self, id: &ApproverId) {
        self.workflow.unregister_approver(id);
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Govern and run one action with a fresh request id.
    ///
    /// Returns `Completed` with the audit entry, `AwaitingApproval` with
    /// the pending reference (re-invoke after approval), or an error
    /// carrying the audit entry of the denial.
    pub fn execute<F>(
        &self,
        kind: ActionKind,
        agent: &AgentIdentity,
        payload: Value,
        executor: F,
    ) -> GovernanceResult<ExecuteOutcome>
    where
        F: FnOnce(&Value) -> Result<Value, String>,
    {
        let request = ActionRequest::new(kind, agent.id.clone(), payload, self.clock.now());
        self.execute_request(request, agent, executor)
    }

    /// Govern and run a caller-built request.
    ///
    /// The caller controls the request id here, which is what makes the
    /// idempotency guard reachable: re-submitting an executed id fails
    /// with `AlreadyExecuted` and writes nothing.
    pub fn execute_request<F>(
        &self,
        request: ActionRequest,
        agent: &AgentIdentity,
        executor: F,
    ) -> GovernanceResult<ExecuteOutcome>
    where
        F: FnOnce(&Value) -> Result<Value, String>,
    {
        debug!(
            action_id = %request.id,
            kind = %request.kind,
            agent_id = %agent.id,
            "execute requested"
        );

        let (payload, approval) = match self.enforcement.pre_execute(&request, agent)? {
            PreExecuteOutcome::RequiresApproval { approval } => {
                // First L2 attempt: hand the new request to the workflow,
                // which chooses approvers and announces it. The executor
                // is not invoked.
                let submitted = self.workflow.submit(approval)?;
                info!(
                    action_id = %request.id,
                    approval_id = %submitted.id,
                    "execution suspended awaiting approval"
                );
                return Ok(ExecuteOutcome::AwaitingApproval { approval: submitted });
            }

            PreExecuteOutcome::AwaitingApproval { approval } => {
                return Ok(ExecuteOutcome::AwaitingApproval { approval });
            }

            PreExecuteOutcome::Rejected {
                reason,
                kind,
                approval,
            } => {
                return Err(self.audit_rejection(&request, agent, reason, kind, approval));
            }

            PreExecuteOutcome::Proceed { payload, approval } => (payload, approval),
        };

        // Track the in-flight invocation. The map lock is released before
        // the executor runs; no component lock may be held across it.
        {
            let mut contexts = self.contexts.lock().expect("context map lock poisoned");
            contexts.insert(
                request.id.to_string(),
                ExecutionContext {
                    action_id: request.id.clone(),
                    kind: request.kind,
                    agent_id: agent.id.clone(),
                    started_at: self.clock.now(),
                },
            );
        }

        let outcome = executor(&payload);

        {
            let mut contexts = self.contexts.lock().expect("context map lock poisoned");
            contexts.remove(&request.id.to_string());
        }

        let completed_at = self.clock.now();
        let result = match &outcome {
            Ok(output) => ActionResult::success(request.id.clone(), completed_at, output.clone())
                .executed_by(agent.id.clone()),
            Err(error) => ActionResult::failure(request.id.clone(), completed_at, error.clone())
                .executed_by(agent.id.clone()),
        };

        let report = self.enforcement.post_execute(&request, &result);
        if !report.cleanup.is_empty() {
            debug!(cleanup = ?report.cleanup, action_id = %request.id, "cleanup actions reported");
        }

        let entry = self.audit.record(&request, &result, agent, approval.as_ref())?;

        match outcome {
            Ok(_) => Ok(ExecuteOutcome::Completed { result, entry }),
            Err(error) => Err(GovernanceError::ExecutionFailed {
                reason: error,
                entry: Box::new(entry),
            }),
        }
    }

    /// Audit a pre-execution denial and build the matching error.
    fn audit_rejection(
        &self,
        request: &ActionRequest,
        agent: &AgentIdentity,
        reason: String,
        kind: RejectionKind,
        approval: Option<ApprovalRequest>,
    ) -> GovernanceError {
        let result = ActionResult::failure(request.id.clone(), self.clock.now(), reason.clone());
        let entry = match self.audit.record(request, &result, agent, approval.as_ref()) {
            Ok(entry) => entry,
            Err(audit_err) => return audit_err,
        };

        // A denied id is spent: it must never become the primary action of
        // a second audit entry.
        self.enforcement.mark_completed(&request.id);

        match kind {
            RejectionKind::Clearance => GovernanceError::ClearanceViolation {
                reason,
                entry: Box::new(entry),
            },
            RejectionKind::Approval => GovernanceError::EnforcementRejected {
                reason,
                entry: Box::new(entry),
            },
        }
    }

    // ── Approvals ─────────────────────────────────────────────────────────────

    /// Record an affirmative decision on a pending approval.
    pub fn approve_action(
        &self,
        approval_id: &ApprovalId,
        approver_id: &ApproverId,
        signature: Option<Vec<u8>>,
        reason: Option<String>,
    ) -> GovernanceResult<ApprovalRequest> {
        self.workflow.approve(approval_id, approver_id, signature, reason)
    }

    /// Reject a pending approval. A single rejection is final.
    pub fn reject_action(
        &self,
        approval_id: &ApprovalId,
        approver_id: &ApproverId,
        reason: impl Into<String>,
        signature: Option<Vec<u8>>,
    ) -> GovernanceResult<ApprovalRequest> {
        self.workflow.reject(approval_id, approver_id, reason, signature)
    }

    /// Withdraw an approved request (approved state only).
    pub fn revoke_approval(
        &self,
        approval_id: &ApprovalId,
        by: &ApproverId,
        reason: impl Into<String>,
    ) -> GovernanceResult<ApprovalRequest> {
        self.workflow.revoke(approval_id, by, reason)
    }

    /// All approvals still pending.
    pub fn pending_approvals(&self) -> Vec<ApprovalRequest> {
        self.workflow.pending()
    }

    /// Fetch one approval by id.
    pub fn approval(&self, approval_id: &ApprovalId) -> Option<ApprovalRequest> {
        self.workflow.get(approval_id)
    }

    // ── Emergency stop ────────────────────────────────────────────────────────

    /// Revoke every pending approval in one privileged sweep.
    ///
    /// This is the documented exception to the revoke guard: the workflow
    /// moves pending requests straight to `revoked`. One composite
    /// `action-rejected` event at critical severity carries the count and
    /// the reason. Executors already in flight are not cancelled; their
    /// retries will fail against the revoked approvals.
    pub fn emergency_stop(&self, reason: &str) {
        let pending = self.workflow.pending();
        let mut revoked = 0usize;
        for request in &pending {
            if self.workflow.revoke_unchecked(&request.id, reason).is_some() {
                revoked += 1;
            }
        }

        warn!(revoked, reason, "emergency stop");
        self.events
            .emit(&GovernanceEvent::emergency_stop(self.clock.now(), revoked, reason));
    }

    // ── Audit ─────────────────────────────────────────────────────────────────

    /// The owned audit trail, for range queries and anchoring.
    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    /// Walk the chain; false (plus one tamper event) on any mismatch.
    pub fn verify_audit_integrity(&self) -> bool {
        self.audit.verify_chain()
    }

    /// Serialize the trail as the JSON compliance artifact.
    pub fn export_audit_trail(&self) -> GovernanceResult<String> {
        self.audit.export_json()
    }

    // ── Events & observability ────────────────────────────────────────────────

    /// Register a handler for one event kind across all subcomponents.
    pub fn on_event<F>(&self, kind: EventKind, handler: F) -> EventSubscription
    where
        F: Fn(&GovernanceEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(kind, handler)
    }

    /// Remove a handler registered through `on_event`.
    pub fn unsubscribe(&self, subscription: &EventSubscription) {
        self.events.unsubscribe(subscription);
    }

    /// Snapshot of the in-flight executor invocations.
    pub fn active_contexts(&self) -> Vec<ExecutionContext> {
        let contexts = self.contexts.lock().expect("context map lock poisoned");
        contexts.values().cloned().collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
