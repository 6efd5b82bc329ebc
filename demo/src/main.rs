//! AEGIS Governance Kernel — Demo CLI
//!
//! Walks the governance flows end to end with real components: clearance
//! enforcement, human-in-the-loop approval, emergency stop, and the
//! hash-chained audit export.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- passthrough
//!   cargo run -p demo -- denied
//!   cargo run -p demo -- approval
//!   cargo run -p demo -- rejection
//!   cargo run -p demo -- emergency-stop

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use aegis_contracts::{
    action::ActionKind,
    clearance::ClearanceLevel,
    config::GovernanceConfig,
    error::{GovernanceError, GovernanceResult},
    event::EventKind,
    execution::ExecuteOutcome,
    identity::{AgentId, AgentIdentity, ApproverId, ApproverIdentity},
};
use aegis_control::MissionControl;

// ── CLI definition ────────────────────────────────────────────────────────────

/// AEGIS — governance kernel demo.
///
/// Each subcommand runs one of the end-to-end governance scenarios,
/// demonstrating clearance enforcement, approval workflow, emergency stop,
/// and audit chain integrity.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "AEGIS governance kernel demo",
    long_about = "Runs AEGIS governance scenarios showing clearance enforcement,\n\
                  human-in-the-loop approval, emergency stop, and the audit export.\n\n\
                  Scenarios:\n\
                  1. Passthrough     — L0 read executes immediately\n\
                  2. Denied          — L0 agent blocked from an L1 action\n\
                  3. Approval        — L2 action suspended, approved, executed\n\
                  4. Rejection       — L2 action suspended and rejected\n\
                  5. Emergency Stop  — pending approvals revoked in one sweep"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all five governance scenarios in sequence.
    RunAll,
    /// Scenario 1: L0 pass-through (query-status executes immediately).
    Passthrough,
    /// Scenario 2: clearance violation (L0 agent attempts modify-config).
    Denied,
    /// Scenario 3: L2 approval flow (suspend → approve → execute).
    Approval,
    /// Scenario 4: L2 rejection flow (suspend → reject → retry fails).
    Rejection,
    /// Scenario 5: emergency stop revokes all pending approvals.
    EmergencyStop,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging; set RUST_LOG=debug for the kernel's internals.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    println!("AEGIS governance kernel demo");
    println!("============================\n");

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::Passthrough => run_passthrough(),
        Command::Denied => run_denied(),
        Command::Approval => run_approval(),
        Command::Rejection => run_rejection(),
        Command::EmergencyStop => run_emergency_stop(),
    };

    match result {
        Ok(()) => println!("All selected scenarios completed."),
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_all() -> GovernanceResult<()> {
    run_passthrough()?;
    run_denied()?;
    run_approval()?;
    run_rejection()?;
    run_emergency_stop()?;
    Ok(())
}

// ── Shared fixtures ───────────────────────────────────────────────────────────

fn make_kernel() -> GovernanceResult<MissionControl> {
    let mc = MissionControl::new(GovernanceConfig::default());
    mc.register_approver(
        ApproverIdentity::new(
            ApproverId::new("officer-1"),
            "Duty Officer",
            ClearanceLevel::L2,
        )?
        .with_contact("officer@ops.example"),
    )?;

    // Print every event the kernel announces.
    for kind in [
        EventKind::ActionRequested,
        EventKind::ActionApproved,
        EventKind::ActionRejected,
        EventKind::ActionExecuted,
        EventKind::ActionFailed,
        EventKind::ClearanceViolation,
        EventKind::ApprovalTimeout,
        EventKind::AuditTamperDetected,
    ] {
        mc.on_event(kind, move |event| {
            println!("  [event] {} ({})", event.kind, event.severity);
        });
    }

    Ok(mc)
}

fn reader_agent() -> AgentIdentity {
    AgentIdentity::new(
        AgentId::new("status-reader"),
        "Status Reader",
        ClearanceLevel::L0,
        "sess-demo",
    )
}

fn operator_agent() -> AgentIdentity {
    AgentIdentity::new(
        AgentId::new("fleet-operator"),
        "Fleet Operator",
        ClearanceLevel::L2,
        "sess-demo",
    )
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

fn run_passthrough() -> GovernanceResult<()> {
    println!("Scenario 1: L0 pass-through");
    let mc = make_kernel()?;

    let outcome = mc.execute(
        ActionKind::QueryStatus,
        &reader_agent(),
        json!({}),
        |_payload| Ok(json!({"status": "ok"})),
    )?;

    if let ExecuteOutcome::Completed { result, entry } = outcome {
        println!(
            "  executed: success={} sequence={} anchor={}",
            result.success,
            entry.sequence,
            &entry.entry_hash[..16]
        );
    }
    println!("  chain valid: {}\n", mc.verify_audit_integrity());
    Ok(())
}

fn run_denied() -> GovernanceResult<()> {
    println!("Scenario 2: clearance violation");
    let mc = make_kernel()?;

    match mc.execute(
        ActionKind::ModifyConfig,
        &reader_agent(),
        json!({"key": "timeout", "value": 30}),
        |_payload| Ok(json!({})),
    ) {
        Err(GovernanceError::ClearanceViolation { reason, entry }) => {
            println!("  denied: {}", reason);
            println!("  audited at sequence {}\n", entry.sequence);
        }
        _ => eprintln!("  unexpected outcome\n"),
    }
    Ok(())
}

fn run_approval() -> GovernanceResult<()> {
    println!("Scenario 3: L2 approval flow");
    let mc = make_kernel()?;
    let operator = operator_agent();
    let payload = json!({"resource_id": "r-1"});

    let approval = match mc.execute(
        ActionKind::DestroyResource,
        &operator,
        payload.clone(),
        |_payload| Ok(json!({})),
    )? {
        ExecuteOutcome::AwaitingApproval { approval } => approval,
        ExecuteOutcome::Completed { .. } => unreachable!("L2 actions suspend first"),
    };
    println!(
        "  suspended: approval {} evidence {}",
        approval.id,
        &approval.evidence_hash[..16]
    );

    mc.approve_action(&approval.id, &ApproverId::new("officer-1"), None, None)?;
    println!("  approved by officer-1");

    if let ExecuteOutcome::Completed { result, entry } = mc.execute(
        ActionKind::DestroyResource,
        &operator,
        payload,
        |sanitized| Ok(json!({"destroyed": sanitized["resource_id"]})),
    )? {
        println!(
            "  executed: success={} approval attached={}",
            result.success,
            entry.approval.is_some()
        );
    }

    println!("  audit export:\n{}\n", mc.export_audit_trail()?);
    Ok(())
}

fn run_rejection() -> GovernanceResult<()> {
    println!("Scenario 4: L2 rejection flow");
    let mc = make_kernel()?;
    let operator = operator_agent();

    let approval = match mc.execute(
        ActionKind::TransferFunds,
        &operator,
        json!({"amount": 100_000}),
        |_payload| Ok(json!({})),
    )? {
        ExecuteOutcome::AwaitingApproval { approval } => approval,
        ExecuteOutcome::Completed { .. } => unreachable!("L2 actions suspend first"),
    };

    mc.reject_action(
        &approval.id,
        &ApproverId::new("officer-1"),
        "amount above the daily limit",
        None,
    )?;
    println!("  rejected by officer-1");

    match mc.execute(
        ActionKind::TransferFunds,
        &operator,
        json!({"amount": 100_000}),
        |_payload| Ok(json!({})),
    ) {
        Err(GovernanceError::EnforcementRejected { reason, .. }) => {
            println!("  retry blocked: {}\n", reason);
        }
        _ => eprintln!("  unexpected outcome\n"),
    }
    Ok(())
}

fn run_emergency_stop() -> GovernanceResult<()> {
    println!("Scenario 5: emergency stop");
    let mc = make_kernel()?;
    let operator = operator_agent();

    for kind in [ActionKind::DestroyResource, ActionKind::ModifyProduction] {
        mc.execute(kind, &operator, json!({}), |_payload| Ok(json!({})))?;
    }
    println!("  pending approvals: {}", mc.pending_approvals().len());

    mc.emergency_stop("incident response drill");
    println!("  pending after stop: {}\n", mc.pending_approvals().len());
    Ok(())
}
