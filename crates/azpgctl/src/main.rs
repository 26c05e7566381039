use clap::{CommandFactory, Parser};
use clap_complete::{generate, shells};
use azpgctl_core::Config;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod gate;
mod output;

use cli::{Cli, Commands};
use commands::CommandContext;
use connection::ConnectionManager;
use error::{AppError, Result as CliResult};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.verbose);

    let conn_mgr = match load_connection_manager(&cli) {
        Ok(conn_mgr) => conn_mgr,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(1);
        }
    };

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if let Err(e) = execute_command(&cli, &conn_mgr, cancel).await {
        e.print_diagnostic();
        std::process::exit(1);
    }
}

/// Load configuration from the specified path or the default location
fn load_connection_manager(cli: &Cli) -> CliResult<ConnectionManager> {
    let config = if let Some(config_file) = &cli.config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        Config::load_from_path(&path)?
    } else {
        debug!("Loading config from default location");
        Config::load()?
    };
    Ok(ConnectionManager::new(config))
}

/// Cancel in-flight polling on Ctrl-C
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupted, cancelling");
                cancel.cancel();
            }
            Err(e) => debug!("Unable to listen for Ctrl-C: {}", e),
        }
    });
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "azpgctl=warn,azpgctl_core=warn",
            1 => "azpgctl=info,azpgctl_core=info",
            2 => "azpgctl=debug,azpgctl_core=debug",
            _ => "azpgctl=trace,azpgctl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(
    cli: &Cli,
    conn_mgr: &ConnectionManager,
    cancel: CancellationToken,
) -> Result<(), AppError> {
    // Log command execution with sanitized parameters
    trace!("Executing command: {}", format_command(&cli.command));
    info!("Command: {}", format_command(&cli.command));

    let ctx = CommandContext {
        conn_mgr,
        output: cli.output,
        cancel,
    };

    let start = std::time::Instant::now();
    let result = match &cli.command {
        Commands::Completions { shell } => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Commands::Lifecycle(args) => {
            commands::lifecycle::handle_lifecycle_command(args, &ctx).await
        }
        Commands::Group(cmd) => commands::group::handle_group_command(cmd, &ctx).await,
        Commands::Server(cmd) => commands::server::handle_server_command(cmd, &ctx).await,
        Commands::FirewallRule(cmd) => {
            commands::firewall_rule::handle_firewall_rule_command(cmd, &ctx).await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (without sensitive data)
fn format_command(command: &Commands) -> String {
    use cli::{FirewallRuleCommands, GroupCommands, ServerCommands};

    fn or_default(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("<default>")
    }

    match command {
        Commands::Completions { shell } => format!("completions {:?}", shell),
        Commands::Lifecycle(args) => format!(
            "lifecycle --gate {:?} --resource-group {} --server-name {}",
            args.gate,
            or_default(&args.resource_group),
            or_default(&args.server_name)
        ),
        Commands::Group(cmd) => match cmd {
            GroupCommands::Create { name, .. } => format!("group create {}", or_default(name)),
            GroupCommands::Delete { name } => format!("group delete {}", or_default(name)),
        },
        Commands::Server(cmd) => {
            let (verb, target) = match cmd {
                ServerCommands::Create { target, .. } => {
                    ("create [credentials redacted]", target)
                }
                ServerCommands::Get { target } => ("get", target),
                ServerCommands::SetPassword { target, .. } => {
                    ("set-password [credentials redacted]", target)
                }
                ServerCommands::Restore { target, .. } => ("restore", target),
                ServerCommands::Delete { target } => ("delete", target),
                ServerCommands::Wait { target } => ("wait", target),
            };
            format!(
                "server {} -g {} -n {}",
                verb,
                or_default(&target.resource_group),
                or_default(&target.name)
            )
        }
        Commands::FirewallRule(FirewallRuleCommands::Create {
            target, rule_name, ..
        }) => format!(
            "firewall-rule create {} on {}",
            or_default(rule_name),
            or_default(&target.name)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_command_redacts_passwords() {
        let cli = parse(&[
            "azpgctl",
            "server",
            "set-password",
            "-g",
            "g1",
            "-n",
            "s1",
            "--password",
            "hunter2",
        ]);
        let formatted = format_command(&cli.command);
        assert_eq!(formatted, "server set-password [credentials redacted] -g g1 -n s1");
        assert!(!formatted.contains("hunter2"));

        let cli = parse(&[
            "azpgctl",
            "server",
            "create",
            "--admin-password",
            "Welcome1234",
        ]);
        let formatted = format_command(&cli.command);
        assert!(!formatted.contains("Welcome1234"));
        assert!(formatted.contains("<default>"));
    }

    #[test]
    fn test_lifecycle_defaults() {
        let cli = parse(&["azpgctl", "lifecycle"]);
        let Commands::Lifecycle(args) = cli.command else {
            panic!("expected lifecycle");
        };
        assert_eq!(args.gate, cli::GateKind::Ready);
        assert_eq!(args.gate_delay_secs, 30);
        assert!(args.on_failure.is_none());
    }

    #[test]
    fn test_lifecycle_on_failure_flag() {
        let cli = parse(&["azpgctl", "lifecycle", "--on-failure", "delete-resource-group"]);
        let Commands::Lifecycle(args) = cli.command else {
            panic!("expected lifecycle");
        };
        assert_eq!(
            args.on_failure,
            Some(azpgctl_core::OnFailure::DeleteResourceGroup)
        );
    }

    #[test]
    fn test_server_version_values() {
        assert!(Cli::try_parse_from(["azpgctl", "server", "create", "--version", "9.6"]).is_ok());
        assert!(Cli::try_parse_from(["azpgctl", "server", "create", "--version", "10"]).is_err());
    }
}
