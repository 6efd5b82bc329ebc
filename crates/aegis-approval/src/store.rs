//! Shared approval state.
//!
//! One `ApprovalStore` is shared (by `Arc`) between the approval workflow,
//! which drives the state machine, and the enforcement engine, which
//! consults approval state on every L2 attempt and expires overdue
//! requests. A single mutex guards all three maps so every observer sees
//! one consistent view.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use aegis_contracts::{
    action::ActionKind,
    approval::{ApprovalDecision, ApprovalId, ApprovalRequest, ApprovalState},
    identity::AgentId,
};

#[derive(Default)]
struct StoreInner {
    by_id: HashMap<ApprovalId, ApprovalRequest>,
    /// The approval currently gating each (kind, agent) pair. Retries of
    /// the same action by the same agent resolve through this index.
    active: HashMap<(ActionKind, AgentId), ApprovalId>,
    decisions: HashMap<ApprovalId, Vec<ApprovalDecision>>,
}

/// Mutex-guarded approval state shared across kernel components.
#[derive(Default)]
pub struct ApprovalStore {
    inner: Mutex<StoreInner>,
}

impl ApprovalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inner<R>(&self, f: impl FnOnce(&mut StoreInner) -> R) -> R {
        let mut guard = self.inner.lock().expect("approval store lock poisoned");
        f(&mut guard)
    }

    /// Store a request and make it the active approval for its
    /// (kind, agent) pair.
    pub fn insert(&self, request: ApprovalRequest) {
        self.with_inner(|inner| {
            inner
                .active
                .insert((request.action_kind, request.requester.id.clone()), request.id.clone());
            inner.decisions.entry(request.id.clone()).or_default();
            inner.by_id.insert(request.id.clone(), request);
        });
    }

    /// Fetch a request snapshot by id.
    pub fn get(&self, id: &ApprovalId) -> Option<ApprovalRequest> {
        self.with_inner(|inner| inner.by_id.get(id).cloned())
    }

    /// The decisions recorded so far for a request.
    pub fn decisions(&self, id: &ApprovalId) -> Vec<ApprovalDecision> {
        self.with_inner(|inner| inner.decisions.get(id).cloned().unwrap_or_default())
    }

    /// The approval currently gating this (kind, agent) pair, if any.
    pub fn active_for(&self, kind: ActionKind, agent: &AgentId) -> Option<ApprovalRequest> {
        self.with_inner(|inner| {
            let id = inner.active.get(&(kind, agent.clone()))?;
            inner.by_id.get(id).cloned()
        })
    }

    /// Detach the active index entry for a spent approval.
    ///
    /// The request record itself stays for audit references; only the
    /// (kind, agent) correlation is released, so the next attempt creates
    /// a fresh approval.
    pub fn consume_active(&self, kind: ActionKind, agent: &AgentId) {
        self.with_inner(|inner| {
            inner.active.remove(&(kind, agent.clone()));
        });
    }

    /// All requests still pending, in no particular order.
    pub fn pending(&self) -> Vec<ApprovalRequest> {
        self.with_inner(|inner| {
            inner
                .by_id
                .values()
                .filter(|r| r.is_pending())
                .cloned()
                .collect()
        })
    }

    /// Run `f` against a stored request and its decision list, under the
    /// store lock. Returns `None` when the id is unknown.
    pub fn update<R>(
        &self,
        id: &ApprovalId,
        f: impl FnOnce(&mut ApprovalRequest, &mut Vec<ApprovalDecision>) -> R,
    ) -> Option<R> {
        self.with_inner(|inner| {
            let request = inner.by_id.get_mut(id)?;
            let decisions = inner.decisions.entry(id.clone()).or_default();
            Some(f(request, decisions))
        })
    }

    /// Move a pending request past its deadline to `expired`.
    ///
    /// Returns the updated snapshot when the transition happened; `None`
    /// when the request is unknown, already terminal, or not yet due.
    pub fn expire_if_due(&self, id: &ApprovalId, now: DateTime<Utc>) -> Option<ApprovalRequest> {
        self.with_inner(|inner| {
            let request = inner.by_id.get_mut(id)?;
            if request.is_pending() && now >= request.expires_at {
                request.state = ApprovalState::Expired;
                Some(request.clone())
            } else {
                None
            }
        })
    }
}
