//! CLI structure and command definitions
//!
//! Two layers:
//! 1. Single-step commands (`group`, `server`, `firewall-rule`)
//! 2. The end-to-end `lifecycle` demo that chains them

use clap::{Args, Parser, Subcommand};

use azpgctl_core::OnFailure;

pub mod resources;

pub use resources::*;

/// Azure Database for PostgreSQL management CLI
#[derive(Parser, Debug)]
#[command(name = "azpgctl")]
#[command(
    version,
    about = "Provision, restore and tear down Azure Database for PostgreSQL servers"
)]
#[command(long_about = "
Provision, restore and tear down Azure Database for PostgreSQL servers

Credentials are read from AZURE_SUBSCRIPTION_ID, AZURE_TENANT_ID,
AZURE_CLIENT_ID and AZURE_CLIENT_SECRET, falling back to the [credentials]
section of the config file.

EXAMPLES:
    # Run the whole demo: create, update, restore, delete
    azpgctl lifecycle

    # Pause for Enter between phases
    azpgctl lifecycle --gate prompt

    # Clean up the resource group if anything fails
    azpgctl lifecycle --on-failure delete-resource-group

    # Individual steps
    azpgctl group create --name pg-demo --location westus
    azpgctl server create --resource-group pg-demo --name pg-95 --version 9.5
    azpgctl server get --resource-group pg-demo --name pg-95 -o yaml
    azpgctl server restore --resource-group pg-demo --name pg-95 --target-name pg-95-restored

For more help on a specific command, run:
    azpgctl <command> --help
")]
pub struct Cli {
    /// Path to alternate configuration file
    #[arg(long, global = true, env = "AZPGCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full server lifecycle
    #[command(after_help = "EXAMPLES:
    # Run with defaults from the [lifecycle] config section
    azpgctl lifecycle

    # Wait 60 seconds between phases instead of polling readiness
    azpgctl lifecycle --gate delay --gate-delay-secs 60
")]
    Lifecycle(LifecycleArgs),

    /// Resource group operations
    #[command(subcommand)]
    Group(GroupCommands),

    /// PostgreSQL server operations
    #[command(subcommand)]
    Server(ServerCommands),

    /// Server firewall rule operations
    #[command(subcommand, name = "firewall-rule")]
    FirewallRule(FirewallRuleCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// How to wait between lifecycle phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GateKind {
    /// Do not wait
    None,
    /// Wait for Enter on stdin
    Prompt,
    /// Sleep for --gate-delay-secs
    Delay,
    /// Poll until the server reports Ready
    Ready,
}

#[derive(Args, Debug)]
pub struct LifecycleArgs {
    /// How to wait between phases
    #[arg(long, value_enum, default_value = "ready")]
    pub gate: GateKind,

    /// Seconds to sleep between phases with --gate delay
    #[arg(long, default_value = "30")]
    pub gate_delay_secs: u64,

    /// What to do with the resource group when a phase fails
    #[arg(long, value_enum)]
    pub on_failure: Option<OnFailure>,

    /// Resource group (default from config)
    #[arg(long)]
    pub resource_group: Option<String>,

    /// Server name (default from config)
    #[arg(long)]
    pub server_name: Option<String>,

    /// Azure region (default from config)
    #[arg(long)]
    pub location: Option<String>,
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
    Elvish,
}
