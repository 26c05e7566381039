//! The `lifecycle` command

use std::time::Duration;

use azpgctl_core::lifecycle::{DelayGate, NoGate, PhaseGate, ReadinessGate};
use azpgctl_core::{LifecyclePlan, LroOptions, run_lifecycle};
use tracing::info;

use super::CommandContext;
use super::progress::Spinner;
use crate::cli::{GateKind, LifecycleArgs};
use crate::error::Result as CliResult;
use crate::gate::PromptGate;
use crate::output::print_output;

fn build_plan(args: &LifecycleArgs, ctx: &CommandContext<'_>) -> LifecyclePlan {
    let mut settings = ctx.conn_mgr.config.lifecycle.clone();
    if let Some(group) = &args.resource_group {
        settings.resource_group = group.clone();
    }
    if let Some(server) = &args.server_name {
        settings.server_name = server.clone();
    }
    if let Some(location) = &args.location {
        settings.location = location.clone();
    }
    if let Some(on_failure) = args.on_failure {
        settings.on_failure = on_failure;
    }
    LifecyclePlan::from_settings(&settings)
}

fn build_gate(args: &LifecycleArgs) -> Box<dyn PhaseGate> {
    match args.gate {
        GateKind::None => Box::new(NoGate),
        GateKind::Prompt => Box::new(PromptGate::stdin()),
        GateKind::Delay => Box::new(DelayGate(Duration::from_secs(args.gate_delay_secs))),
        GateKind::Ready => Box::new(ReadinessGate),
    }
}

pub async fn handle_lifecycle_command(
    args: &LifecycleArgs,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let client = ctx.conn_mgr.create_client()?;
    let plan = build_plan(args, ctx);
    let gate = build_gate(args);
    info!(
        "Running lifecycle for {}/{} (gate: {:?}, on failure: {:?})",
        plan.resource_group, plan.server_name, args.gate, plan.on_failure
    );

    // The prompt gate reads stdin, which a spinner would overdraw
    let spinner = (args.gate != GateKind::Prompt).then(|| {
        Spinner::new(
            format!("Lifecycle {}/{}", plan.resource_group, plan.server_name),
            ctx.cancel.clone(),
        )
    });
    let options = match &spinner {
        Some(spinner) => spinner.options().clone(),
        None => LroOptions::default().with_cancel(ctx.cancel.clone()),
    };

    let result = run_lifecycle(&client, &plan, gate.as_ref(), &options).await;
    if let Some(spinner) = &spinner {
        spinner.finish();
    }

    match result {
        Ok(report) => print_output(report, ctx.output)?,
        Err(e) => {
            // Partial report: stages completed and resources created
            print_output(&e.report, ctx.output)?;
            return Err(e.into());
        }
    }
    Ok(())
}
