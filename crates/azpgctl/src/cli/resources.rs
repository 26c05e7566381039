//! Single-step resource commands
//!
//! Every name and sizing flag is optional; unset values come from the
//! `[lifecycle]` section of the config file.

use clap::{Args, Subcommand};

use azpgctl_core::models::{ServerVersion, SkuTier};

#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Create or update a resource group
    Create {
        /// Resource group name
        #[arg(long)]
        name: Option<String>,
        /// Azure region
        #[arg(long)]
        location: Option<String>,
    },
    /// Delete a resource group and everything in it
    Delete {
        /// Resource group name
        #[arg(long)]
        name: Option<String>,
    },
}

/// Resource group and server name shared by server commands
#[derive(Args, Debug, Clone)]
pub struct ServerTarget {
    /// Resource group containing the server
    #[arg(long, short = 'g')]
    pub resource_group: Option<String>,

    /// Server name
    #[arg(long, short = 'n')]
    pub name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ServerCommands {
    /// Create a server
    #[command(after_help = "EXAMPLES:
    azpgctl server create -g pg-demo -n pg-95 --version 9.5 --tier basic --compute-units 50 --storage-gb 50
")]
    Create {
        #[command(flatten)]
        target: ServerTarget,
        /// Azure region
        #[arg(long)]
        location: Option<String>,
        /// Administrator login
        #[arg(long)]
        admin_user: Option<String>,
        /// Administrator password
        #[arg(long, env = "AZPGCTL_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
        /// PostgreSQL version
        #[arg(long, value_enum)]
        version: Option<ServerVersion>,
        /// Pricing tier
        #[arg(long, value_enum)]
        tier: Option<SkuTier>,
        /// SKU capacity
        #[arg(long)]
        compute_units: Option<u32>,
        /// Storage size in GB
        #[arg(long)]
        storage_gb: Option<u32>,
    },
    /// Show a server
    Get {
        #[command(flatten)]
        target: ServerTarget,
    },
    /// Change the administrator password
    SetPassword {
        #[command(flatten)]
        target: ServerTarget,
        /// New administrator password
        #[arg(long, env = "AZPGCTL_NEW_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Restore a server to a point in time into a new server
    Restore {
        #[command(flatten)]
        target: ServerTarget,
        /// Name of the new server
        #[arg(long)]
        target_name: Option<String>,
        /// RFC 3339 restore point; defaults to now minus the configured offset
        #[arg(long)]
        restore_point: Option<String>,
    },
    /// Delete a server
    Delete {
        #[command(flatten)]
        target: ServerTarget,
    },
    /// Wait until a server reports Ready
    Wait {
        #[command(flatten)]
        target: ServerTarget,
    },
}

#[derive(Subcommand, Debug)]
pub enum FirewallRuleCommands {
    /// Create or update a firewall rule
    Create {
        #[command(flatten)]
        target: ServerTarget,
        /// Rule name
        #[arg(long)]
        rule_name: Option<String>,
        /// First allowed IPv4 address
        #[arg(long)]
        start_ip: Option<String>,
        /// Last allowed IPv4 address
        #[arg(long)]
        end_ip: Option<String>,
    },
}
