//! Server commands

use chrono::{DateTime, Utc};
use serde_json::json;
use std::time::Duration;
use tracing::info;

use azpgctl_core::models::ServerProperties;
use azpgctl_core::servers;

use super::CommandContext;
use super::progress::Spinner;
use crate::cli::ServerCommands;
use crate::error::{AppError, Result as CliResult};
use crate::output::print_output;

pub async fn handle_server_command(
    cmd: &ServerCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let client = ctx.conn_mgr.create_client()?;
    let settings = &ctx.conn_mgr.config.lifecycle;

    match cmd {
        ServerCommands::Create {
            target,
            location,
            admin_user,
            admin_password,
            version,
            tier,
            compute_units,
            storage_gb,
        } => {
            let (group, name) = ctx.server_target(target);
            let location = location.as_deref().unwrap_or(&settings.location);
            let properties = ServerProperties {
                administrator_login: admin_user
                    .clone()
                    .unwrap_or_else(|| settings.administrator_login.clone()),
                administrator_password: admin_password
                    .clone()
                    .unwrap_or_else(|| settings.administrator_password.clone()),
                version: version.unwrap_or(settings.version),
                tier: tier.unwrap_or(settings.tier),
                compute_units: compute_units.or(settings.compute_units),
                storage_gb: storage_gb.or(settings.storage_gb),
            };
            info!(
                "Creating server {}/{} (PostgreSQL {}, {})",
                group, name, properties.version, properties.tier
            );

            let spinner = Spinner::new(format!("Creating server {}", name), ctx.cancel.clone());
            let result = servers::create_server(
                &client,
                &group,
                &name,
                location,
                properties,
                spinner.options(),
            )
            .await;
            spinner.finish();
            print_output(result?, ctx.output)?;
        }
        ServerCommands::Get { target } => {
            let (group, name) = ctx.server_target(target);
            let server = client
                .get_with(&client.server_id(&group, &name), Some(&ctx.cancel))
                .await?;
            print_output(server, ctx.output)?;
        }
        ServerCommands::SetPassword { target, password } => {
            let (group, name) = ctx.server_target(target);
            let password = password
                .as_deref()
                .unwrap_or(&settings.new_administrator_password);
            info!("Changing administrator password on {}/{}", group, name);

            let spinner = Spinner::new(format!("Updating server {}", name), ctx.cancel.clone());
            let result = servers::change_administrator_password(
                &client,
                &group,
                &name,
                password,
                spinner.options(),
            )
            .await;
            spinner.finish();
            print_output(result?, ctx.output)?;
        }
        ServerCommands::Restore {
            target,
            target_name,
            restore_point,
        } => {
            let (group, name) = ctx.server_target(target);
            let target_name = target_name
                .clone()
                .or_else(|| settings.restored_server_name.clone())
                .unwrap_or_else(|| format!("{}-restored", name));
            let restore_point = match restore_point {
                Some(value) => parse_restore_point(value)?,
                None => servers::restore_point_before_now(Duration::from_secs(
                    settings.restore_offset_secs,
                )),
            };

            let spinner = Spinner::new(
                format!("Restoring {} into {}", name, target_name),
                ctx.cancel.clone(),
            );
            let result = servers::restore_server(
                &client,
                &group,
                &name,
                &target_name,
                restore_point,
                spinner.options(),
            )
            .await;
            spinner.finish();
            print_output(result?, ctx.output)?;
        }
        ServerCommands::Delete { target } => {
            let (group, name) = ctx.server_target(target);
            info!("Deleting server {}/{}", group, name);

            let spinner = Spinner::new(format!("Deleting server {}", name), ctx.cancel.clone());
            let result = servers::delete_server(&client, &group, &name, spinner.options()).await;
            spinner.finish();
            result?;

            print_output(
                json!({"deleted": client.server_id(&group, &name).to_string()}),
                ctx.output,
            )?;
        }
        ServerCommands::Wait { target } => {
            let (group, name) = ctx.server_target(target);
            let spinner = Spinner::new(format!("Waiting for {}", name), ctx.cancel.clone());
            let result =
                servers::wait_for_server_ready(&client, &group, &name, spinner.options()).await;
            spinner.finish();
            print_output(result?, ctx.output)?;
        }
    }
    Ok(())
}

fn parse_restore_point(value: &str) -> CliResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::InvalidInput {
            message: format!("restore point '{}' is not RFC 3339: {}", value, e),
        })
}
