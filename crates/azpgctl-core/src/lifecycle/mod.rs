//! Linear provision / update / restore / teardown sequence
//!
//! ```text
//! Init -> GroupCreated -> ServerCreated -> FirewallRuleCreated
//!      -> PasswordChanged -> RestorePointCaptured -> ServerRestored
//!      -> ServersDeleted -> Done
//! ```
//!
//! Each phase awaits its control-plane call before the next one starts. A
//! [`PhaseGate`] runs before the password change, the restore point and the
//! teardown. The first failure stops the sequence in the terminal `Failed`
//! stage and is reported together with the last stage that completed.

mod gate;

pub use gate::{DelayGate, GateContext, NoGate, PhaseGate, ReadinessGate};

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ResourceClient;
use crate::config::LifecycleSettings;
use crate::error::CoreError;
use crate::models::ServerProperties;
use crate::progress::LroOptions;
use crate::servers;

/// Progress through the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleStage {
    Init,
    GroupCreated,
    ServerCreated,
    FirewallRuleCreated,
    PasswordChanged,
    RestorePointCaptured,
    ServerRestored,
    ServersDeleted,
    Done,
    Failed,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleStage::Init => "init",
            LifecycleStage::GroupCreated => "group-created",
            LifecycleStage::ServerCreated => "server-created",
            LifecycleStage::FirewallRuleCreated => "firewall-rule-created",
            LifecycleStage::PasswordChanged => "password-changed",
            LifecycleStage::RestorePointCaptured => "restore-point-captured",
            LifecycleStage::ServerRestored => "server-restored",
            LifecycleStage::ServersDeleted => "servers-deleted",
            LifecycleStage::Done => "done",
            LifecycleStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What to do with the resource group when a phase fails
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OnFailure {
    /// Stop and leave everything in place
    #[default]
    Abort,
    /// Stop and delete the resource group, best effort
    DeleteResourceGroup,
}

/// Inputs for [`run_lifecycle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecyclePlan {
    pub resource_group: String,
    pub location: String,
    pub server_name: String,
    pub restored_server_name: String,
    pub server: ServerProperties,
    pub new_administrator_password: String,
    pub firewall_rule_name: String,
    pub firewall_start_ip: String,
    pub firewall_end_ip: String,
    /// How far before "now" the restore point is taken
    pub restore_offset: Duration,
    pub on_failure: OnFailure,
}

impl LifecyclePlan {
    pub fn from_settings(settings: &LifecycleSettings) -> Self {
        Self {
            resource_group: settings.resource_group.clone(),
            location: settings.location.clone(),
            server_name: settings.server_name.clone(),
            restored_server_name: settings.restored_server_name(),
            server: ServerProperties {
                administrator_login: settings.administrator_login.clone(),
                administrator_password: settings.administrator_password.clone(),
                version: settings.version,
                tier: settings.tier,
                compute_units: settings.compute_units,
                storage_gb: settings.storage_gb,
            },
            new_administrator_password: settings.new_administrator_password.clone(),
            firewall_rule_name: settings.firewall_rule_name.clone(),
            firewall_start_ip: settings.firewall_start_ip.clone(),
            firewall_end_ip: settings.firewall_end_ip.clone(),
            restore_offset: Duration::from_secs(settings.restore_offset_secs),
            on_failure: settings.on_failure,
        }
    }
}

/// A phase failed; `stage` is the last one that completed
///
/// `report` is in the `Failed` stage and still lists what was completed and
/// created before the failure.
#[derive(Error, Debug)]
#[error("lifecycle stopped after stage '{stage}': {source}")]
pub struct LifecycleError {
    pub stage: LifecycleStage,
    pub report: Box<LifecycleReport>,
    #[source]
    pub source: CoreError,
}

/// Outcome of a lifecycle run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleReport {
    pub resource_group: String,
    pub stage: LifecycleStage,
    pub completed: Vec<LifecycleStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_server_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_point: Option<DateTime<Utc>>,
}

impl LifecycleReport {
    fn new(resource_group: &str) -> Self {
        Self {
            resource_group: resource_group.to_string(),
            stage: LifecycleStage::Init,
            completed: Vec::new(),
            server_id: None,
            restored_server_id: None,
            restore_point: None,
        }
    }

    fn advance(&mut self, stage: LifecycleStage) {
        tracing::info!("Lifecycle stage: {}", stage);
        self.stage = stage;
        self.completed.push(stage);
    }
}

/// Run the whole sequence.
///
/// # Errors
///
/// Returns a [`LifecycleError`] carrying the last completed stage and the
/// cause. With [`OnFailure::DeleteResourceGroup`] the group is deleted first
/// unless the run was cancelled; the outcome of that cleanup is only logged.
pub async fn run_lifecycle(
    client: &ResourceClient,
    plan: &LifecyclePlan,
    gate: &dyn PhaseGate,
    options: &LroOptions,
) -> Result<LifecycleReport, LifecycleError> {
    let mut report = LifecycleReport::new(&plan.resource_group);

    match execute(client, plan, gate, options, &mut report).await {
        Ok(()) => Ok(report),
        Err(source) => {
            let stage = report.stage;
            tracing::error!("Lifecycle failed after stage {}: {}", stage, source);
            if plan.on_failure == OnFailure::DeleteResourceGroup {
                cleanup(client, plan, stage, &source, options).await;
            }
            report.stage = LifecycleStage::Failed;
            Err(LifecycleError {
                stage,
                report: Box::new(report),
                source,
            })
        }
    }
}

async fn execute(
    client: &ResourceClient,
    plan: &LifecyclePlan,
    gate: &dyn PhaseGate,
    options: &LroOptions,
    report: &mut LifecycleReport,
) -> Result<(), CoreError> {
    let group = client.resource_group_id(&plan.resource_group);
    client
        .create_resource_group_with(&group, &plan.location, options)
        .await?;
    report.advance(LifecycleStage::GroupCreated);

    let server = servers::create_server(
        client,
        &plan.resource_group,
        &plan.server_name,
        &plan.location,
        plan.server.clone(),
        options,
    )
    .await?;
    report.server_id = server.id;
    report.advance(LifecycleStage::ServerCreated);

    servers::create_firewall_rule(
        client,
        &plan.resource_group,
        &plan.server_name,
        &plan.firewall_rule_name,
        &plan.firewall_start_ip,
        &plan.firewall_end_ip,
        options,
    )
    .await?;
    report.advance(LifecycleStage::FirewallRuleCreated);

    let ctx = GateContext {
        client,
        resource_group: &plan.resource_group,
        server_name: &plan.server_name,
        options,
    };

    gate.wait(LifecycleStage::PasswordChanged, &ctx).await?;
    servers::change_administrator_password(
        client,
        &plan.resource_group,
        &plan.server_name,
        &plan.new_administrator_password,
        options,
    )
    .await?;
    report.advance(LifecycleStage::PasswordChanged);

    gate.wait(LifecycleStage::RestorePointCaptured, &ctx).await?;
    let restore_point = servers::restore_point_before_now(plan.restore_offset);
    report.restore_point = Some(restore_point);
    report.advance(LifecycleStage::RestorePointCaptured);

    let restored = servers::restore_server(
        client,
        &plan.resource_group,
        &plan.server_name,
        &plan.restored_server_name,
        restore_point,
        options,
    )
    .await?;
    report.restored_server_id = restored.id;
    report.advance(LifecycleStage::ServerRestored);

    gate.wait(LifecycleStage::ServersDeleted, &ctx).await?;
    for name in [&plan.server_name, &plan.restored_server_name] {
        match servers::delete_server(client, &plan.resource_group, name, options).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => tracing::warn!("Server {} was already gone", name),
            Err(e) => return Err(e),
        }
    }
    report.advance(LifecycleStage::ServersDeleted);

    report.advance(LifecycleStage::Done);
    Ok(())
}

async fn cleanup(
    client: &ResourceClient,
    plan: &LifecyclePlan,
    stage: LifecycleStage,
    cause: &CoreError,
    options: &LroOptions,
) {
    if stage < LifecycleStage::GroupCreated {
        tracing::info!("Resource group was never created, nothing to clean up");
        return;
    }
    if matches!(cause, CoreError::Cancelled) {
        tracing::warn!(
            "Run was cancelled, leaving resource group {} in place",
            plan.resource_group
        );
        return;
    }

    let group = client.resource_group_id(&plan.resource_group);
    tracing::info!("Deleting resource group {}", plan.resource_group);
    match client.delete_resource_group_with(&group, options).await {
        Ok(()) => tracing::info!("Deleted resource group {}", plan.resource_group),
        Err(e) => tracing::warn!(
            "Failed to delete resource group {}: {}",
            plan.resource_group,
            e
        ),
    }
}
