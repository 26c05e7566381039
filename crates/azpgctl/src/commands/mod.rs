//! Command implementations

pub mod firewall_rule;
pub mod group;
pub mod lifecycle;
pub mod progress;
pub mod server;

use tokio_util::sync::CancellationToken;

use crate::cli::{OutputFormat, ServerTarget};
use crate::connection::ConnectionManager;

/// Everything a command handler needs besides its own arguments
pub struct CommandContext<'a> {
    pub conn_mgr: &'a ConnectionManager,
    pub output: OutputFormat,
    pub cancel: CancellationToken,
}

impl CommandContext<'_> {
    /// Resource group and server name, falling back to the `[lifecycle]` defaults
    pub fn server_target(&self, target: &ServerTarget) -> (String, String) {
        let settings = &self.conn_mgr.config.lifecycle;
        (
            target
                .resource_group
                .clone()
                .unwrap_or_else(|| settings.resource_group.clone()),
            target
                .name
                .clone()
                .unwrap_or_else(|| settings.server_name.clone()),
        )
    }
}
