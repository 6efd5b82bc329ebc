//! The approval state machine and approver registry.
//!
//! ```text
//!                approve(N >= threshold)
//! pending ─────────────────────────────→ approved ──revoke──→ revoked
//!   │
//!   ├── reject ──────────────────────→ rejected
//!   │
//!   └── timeout(expiry) ─────────────→ expired
//! ```
//!
//! Terminal states do not transition. The one exception is the privileged
//! emergency-stop path (`revoke_unchecked`), which may revoke a *pending*
//! request; direct callers go through `revoke`, whose guard requires
//! `approved`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use aegis_contracts::{
    approval::{ApprovalDecision, ApprovalId, ApprovalRequest, ApprovalState, Decision},
    clearance::ClearanceLevel,
    config::ApprovalPolicy,
    error::{GovernanceError, GovernanceResult},
    event::GovernanceEvent,
    identity::{ApproverId, ApproverIdentity},
};
use aegis_core::{Clock, EventDispatcher};

use crate::store::ApprovalStore;

/// The human-in-the-loop approval workflow.
///
/// Holds the approver registry (insertion-ordered; the first-N selection
/// strategy depends on it) and drives every state transition on the
/// shared [`ApprovalStore`].
pub struct ApprovalWorkflow {
    policy: ApprovalPolicy,
    approvers: Mutex<Vec<ApproverIdentity>>,
    store: Arc<ApprovalStore>,
    events: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl ApprovalWorkflow {
    pub fn new(
        policy: ApprovalPolicy,
        store: Arc<ApprovalStore>,
        events: Arc<EventDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy,
            approvers: Mutex::new(Vec::new()),
            store,
            events,
            clock,
        }
    }

    // ── Approver registry ─────────────────────────────────────────────────────

    /// Register an approver.
    ///
    /// Fails with `InsufficientApproverClearance` unless the approver
    /// holds L2 (re-checked here even though `ApproverIdentity::new`
    /// enforces the same rule). Re-registering an id replaces the entry
    /// in place, keeping its position in the selection order.
    pub fn register_approver(&self, approver: ApproverIdentity) -> GovernanceResult<()> {
        if approver.clearance != ClearanceLevel::L2 {
            return Err(GovernanceError::InsufficientApproverClearance {
                approver_id: approver.id.0.clone(),
                actual: approver.clearance,
            });
        }

        let mut approvers = self.approvers.lock().expect("approver registry lock poisoned");
        match approvers.iter().position(|a| a.id == approver.id) {
            Some(idx) => approvers[idx] = approver,
            None => {
                debug!(approver_id = %approver.id, "approver registered");
                approvers.push(approver);
            }
        }
        Ok(())
    }

    /// Remove an approver. Unknown ids no-op.
    pub fn unregister_approver(&self, id: &ApproverId) {
        let mut approvers = self.approvers.lock().expect("approver registry lock poisoned");
        approvers.retain(|a| &a.id != id);
    }

    /// Number of registered approvers.
    pub fn approver_count(&self) -> usize {
        self.approvers.lock().expect("approver registry lock poisoned").len()
    }

    fn is_registered(&self, id: &ApproverId) -> bool {
        self.approvers
            .lock()
            .expect("approver registry lock poisoned")
            .iter()
            .any(|a| &a.id == id)
    }

    // ── Submission ────────────────────────────────────────────────────────────

    /// Submit a newly created pending request to the workflow.
    ///
    /// Chooses the authorized approver set (the first
    /// `min(min_approvers, registry size)` approvers in registration
    /// order, capped by `max_approvers`), stores the request, emits
    /// `action-requested`, and schedules the escalation warning. The
    /// absolute expiry deadline is the enforcement engine's timer, not
    /// ours; escalation only warns.
    pub fn submit(&self, mut approval: ApprovalRequest) -> GovernanceResult<ApprovalRequest> {
        let chosen: Vec<ApproverId> = {
            let approvers = self.approvers.lock().expect("approver registry lock poisoned");
            if approvers.is_empty() {
                return Err(GovernanceError::NoApproversRegistered);
            }
            let n = self
                .policy
                .min_approvers
                .min(approvers.len())
                .min(self.policy.max_approvers)
                .max(1);
            approvers.iter().take(n).map(|a| a.id.clone()).collect()
        };

        approval.authorized_approvers = chosen;
        let stored = approval.clone();
        self.store.insert(approval);

        info!(
            approval_id = %stored.id,
            action_id = %stored.action_id,
            approvers = stored.authorized_approvers.len(),
            "approval submitted"
        );
        self.events
            .emit(&GovernanceEvent::action_requested(self.clock.now(), &stored));

        self.schedule_escalation(stored.id.clone());
        Ok(stored)
    }

    /// Warn (once) when a request is still pending at the escalation mark.
    fn schedule_escalation(&self, id: ApprovalId) {
        let store = self.store.clone();
        let events = self.events.clone();
        let clock = self.clock.clone();
        let delay = Duration::from_millis(self.policy.escalation_timeout_ms);

        self.clock.schedule(
            delay,
            Box::new(move || {
                if let Some(request) = store.get(&id) {
                    if request.is_pending() {
                        warn!(approval_id = %id, "approval still pending at escalation deadline");
                        events.emit(&GovernanceEvent::approval_timeout(
                            clock.now(),
                            &request,
                            "escalation",
                        ));
                    }
                }
            }),
        );
    }

    // ── Decisions ─────────────────────────────────────────────────────────────

    /// Validate that `approver_id` may decide `request` right now.
    ///
    /// Check order is part of the contract: unknown request, already
    /// decided, unauthorized, unregistered, duplicate.
    fn check_decision(
        request: &ApprovalRequest,
        decisions: &[ApprovalDecision],
        approver_id: &ApproverId,
        registered: bool,
    ) -> GovernanceResult<()> {
        if request.state != ApprovalState::Pending {
            return Err(GovernanceError::AlreadyDecided {
                approval_id: request.id.to_string(),
            });
        }
        if !request.authorized_approvers.contains(approver_id) {
            return Err(GovernanceError::Unauthorized {
                approver_id: approver_id.0.clone(),
                approval_id: request.id.to_string(),
            });
        }
        if !registered {
            return Err(GovernanceError::Unregistered {
                approver_id: approver_id.0.clone(),
            });
        }
        if decisions.iter().any(|d| &d.approver == approver_id) {
            return Err(GovernanceError::DuplicateDecision {
                approver_id: approver_id.0.clone(),
                approval_id: request.id.to_string(),
            });
        }
        Ok(())
    }

    /// Record an affirmative decision and re-evaluate the threshold.
    pub fn approve(
        &self,
        approval_id: &ApprovalId,
        approver_id: &ApproverId,
        signature: Option<Vec<u8>>,
        reason: Option<String>,
    ) -> GovernanceResult<ApprovalRequest> {
        let registered = self.is_registered(approver_id);
        let now = self.clock.now();
        let policy = self.policy.clone();

        let updated = self
            .store
            .update(approval_id, |request, decisions| {
                Self::check_decision(request, decisions, approver_id, registered)?;

                decisions.push(ApprovalDecision {
                    approver: approver_id.clone(),
                    decision: Decision::Approve,
                    timestamp: now,
                    signature,
                    reason,
                });

                let chosen = request.authorized_approvers.len();
                let affirmative = decisions
                    .iter()
                    .filter(|d| d.decision == Decision::Approve)
                    .count();

                let threshold_met = if policy.require_unanimous {
                    // Every chosen approver must have decided, affirmatively.
                    decisions.len() == chosen && affirmative == chosen
                } else {
                    affirmative >= policy.min_approvers.min(chosen).max(1)
                };

                if threshold_met {
                    request.state = ApprovalState::Approved;
                    request.decided_by = Some(approver_id.clone());
                    request.decided_at = Some(now);
                }
                Ok(request.clone())
            })
            .ok_or_else(|| GovernanceError::ApprovalNotFound {
                approval_id: approval_id.to_string(),
            })??;

        if updated.state == ApprovalState::Approved {
            info!(approval_id = %updated.id, decided_by = %approver_id, "approval granted");
            self.events
                .emit(&GovernanceEvent::action_approved(now, &updated));
        }
        Ok(updated)
    }

    /// Record a rejection. A single rejection is final.
    pub fn reject(
        &self,
        approval_id: &ApprovalId,
        approver_id: &ApproverId,
        reason: impl Into<String>,
        signature: Option<Vec<u8>>,
    ) -> GovernanceResult<ApprovalRequest> {
        let registered = self.is_registered(approver_id);
        let now = self.clock.now();
        let reason = reason.into();
        let recorded_reason = reason.clone();

        let updated = self
            .store
            .update(approval_id, |request, decisions| {
                Self::check_decision(request, decisions, approver_id, registered)?;

                decisions.push(ApprovalDecision {
                    approver: approver_id.clone(),
                    decision: Decision::Reject,
                    timestamp: now,
                    signature,
                    reason: Some(recorded_reason.clone()),
                });

                request.state = ApprovalState::Rejected;
                request.decided_by = Some(approver_id.clone());
                request.decided_at = Some(now);
                request.rejection_reason = Some(recorded_reason);
                Ok(request.clone())
            })
            .ok_or_else(|| GovernanceError::ApprovalNotFound {
                approval_id: approval_id.to_string(),
            })??;

        warn!(approval_id = %updated.id, decided_by = %approver_id, reason = %reason, "approval rejected");
        self.events
            .emit(&GovernanceEvent::action_rejected(now, &updated));
        Ok(updated)
    }

    // ── Revocation ────────────────────────────────────────────────────────────

    /// Withdraw an approved request. Only legal from `approved`.
    pub fn revoke(
        &self,
        approval_id: &ApprovalId,
        by: &ApproverId,
        reason: impl Into<String>,
    ) -> GovernanceResult<ApprovalRequest> {
        let now = self.clock.now();
        let reason = reason.into();
        let recorded_reason = reason.clone();

        let updated = self
            .store
            .update(approval_id, |request, _| {
                if request.state != ApprovalState::Approved {
                    return Err(GovernanceError::InvalidTransition {
                        reason: format!(
                            "cannot revoke approval '{}' from state '{}'",
                            request.id, request.state
                        ),
                    });
                }
                request.state = ApprovalState::Revoked;
                request.decided_by = Some(by.clone());
                request.decided_at = Some(now);
                request.rejection_reason = Some(recorded_reason);
                Ok(request.clone())
            })
            .ok_or_else(|| GovernanceError::ApprovalNotFound {
                approval_id: approval_id.to_string(),
            })??;

        warn!(approval_id = %updated.id, by = %by, reason = %reason, "approval revoked");
        self.events
            .emit(&GovernanceEvent::approval_revoked(now, &updated));
        Ok(updated)
    }

    /// Privileged revocation that also accepts pending requests.
    ///
    /// This is the emergency-stop path. It moves the state silently; the
    /// orchestrator emits one composite critical event for the whole
    /// sweep. Not for direct external use: callers that want to stop a
    /// pending request reject it instead.
    pub fn revoke_unchecked(
        &self,
        approval_id: &ApprovalId,
        reason: &str,
    ) -> Option<ApprovalRequest> {
        let now = self.clock.now();
        self.store.update(approval_id, |request, _| {
            if matches!(
                request.state,
                ApprovalState::Pending | ApprovalState::Approved
            ) {
                request.state = ApprovalState::Revoked;
                request.decided_at = Some(now);
                request.rejection_reason = Some(reason.to_string());
                Some(request.clone())
            } else {
                None
            }
        })?
    }

    // ── Views ─────────────────────────────────────────────────────────────────

    /// All requests still pending.
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        self.store.pending()
    }

    /// Fetch one request by id.
    pub fn get(&self, approval_id: &ApprovalId) -> Option<ApprovalRequest> {
        self.store.get(approval_id)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
