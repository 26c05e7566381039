//! Resource group commands

use serde_json::json;
use tracing::info;

use super::CommandContext;
use super::progress::Spinner;
use crate::cli::GroupCommands;
use crate::error::Result as CliResult;
use crate::output::print_output;

pub async fn handle_group_command(
    cmd: &GroupCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let client = ctx.conn_mgr.create_client()?;
    let settings = &ctx.conn_mgr.config.lifecycle;

    match cmd {
        GroupCommands::Create { name, location } => {
            let name = name.as_deref().unwrap_or(&settings.resource_group);
            let location = location.as_deref().unwrap_or(&settings.location);
            info!("Creating resource group {} in {}", name, location);

            let spinner = Spinner::new(
                format!("Creating resource group {}", name),
                ctx.cancel.clone(),
            );
            let result = client
                .create_resource_group_with(
                    &client.resource_group_id(name),
                    location,
                    spinner.options(),
                )
                .await;
            spinner.finish();

            print_output(result?, ctx.output)?;
        }
        GroupCommands::Delete { name } => {
            let name = name.as_deref().unwrap_or(&settings.resource_group);
            let group = client.resource_group_id(name);
            info!("Deleting resource group {}", name);

            let spinner = Spinner::new(
                format!("Deleting resource group {}", name),
                ctx.cancel.clone(),
            );
            let result = client
                .delete_resource_group_with(&group, spinner.options())
                .await;
            spinner.finish();
            result?;

            print_output(json!({"deleted": group.to_string()}), ctx.output)?;
        }
    }
    Ok(())
}
