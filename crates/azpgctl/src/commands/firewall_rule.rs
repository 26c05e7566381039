//! Firewall rule commands

use tracing::info;

use azpgctl_core::servers;

use super::CommandContext;
use super::progress::Spinner;
use crate::cli::FirewallRuleCommands;
use crate::error::Result as CliResult;
use crate::output::print_output;

pub async fn handle_firewall_rule_command(
    cmd: &FirewallRuleCommands,
    ctx: &CommandContext<'_>,
) -> CliResult<()> {
    let client = ctx.conn_mgr.create_client()?;
    let settings = &ctx.conn_mgr.config.lifecycle;

    match cmd {
        FirewallRuleCommands::Create {
            target,
            rule_name,
            start_ip,
            end_ip,
        } => {
            let (group, server) = ctx.server_target(target);
            let rule_name = rule_name.as_deref().unwrap_or(&settings.firewall_rule_name);
            let start_ip = start_ip.as_deref().unwrap_or(&settings.firewall_start_ip);
            let end_ip = end_ip.as_deref().unwrap_or(&settings.firewall_end_ip);
            info!(
                "Creating firewall rule {} on {} ({} - {})",
                rule_name, server, start_ip, end_ip
            );

            let spinner = Spinner::new(
                format!("Creating firewall rule {}", rule_name),
                ctx.cancel.clone(),
            );
            let result = servers::create_firewall_rule(
                &client,
                &group,
                &server,
                rule_name,
                start_ip,
                end_ip,
                spinner.options(),
            )
            .await;
            spinner.finish();
            print_output(result?, ctx.output)?;
        }
    }
    Ok(())
}
