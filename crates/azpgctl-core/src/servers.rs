//! PostgreSQL server workflows
//!
//! Thin compositions over [`ResourceClient`] that build the typed request
//! body, convert it to a [`GenericResource`] and wait for the operation.

use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

use crate::client::{ResourceClient, UpdateMethod};
use crate::error::{CoreError, Result};
use crate::models::{
    FirewallRule, IntoGenericResource, ServerForRestore, ServerProperties, ServerUpdate,
};
use crate::progress::{LroOptions, ProgressEvent, cancellable};
use crate::resource::GenericResource;

/// `properties.userVisibleState` of a server that accepts connections
pub const READY_STATE: &str = "Ready";

/// Create a server and wait for completion
///
/// # Arguments
///
/// * `client` - The control-plane client
/// * `resource_group` - Group the server is created in
/// * `server_name` - Name of the new server
/// * `location` - Azure region, e.g. `westus`
/// * `properties` - Administrator, version, tier and sizing
/// * `options` - Cancellation and progress callback
///
/// # Example
///
/// ```rust,ignore
/// use azpgctl_core::models::{ServerProperties, ServerVersion, SkuTier};
/// use azpgctl_core::servers::create_server;
///
/// let properties = ServerProperties {
///     administrator_login: "azadmin".to_string(),
///     administrator_password: "Welcome1234".to_string(),
///     version: ServerVersion::V9_5,
///     tier: SkuTier::Basic,
///     compute_units: Some(50),
///     storage_gb: Some(50),
/// };
///
/// let server = create_server(&client, "g1", "s1", "westus", properties, &Default::default()).await?;
/// println!("{}", server.id.unwrap_or_default());
/// ```
pub async fn create_server(
    client: &ResourceClient,
    resource_group: &str,
    server_name: &str,
    location: &str,
    properties: ServerProperties,
    options: &LroOptions,
) -> Result<GenericResource> {
    let id = client.server_id(resource_group, server_name);
    let body = properties.into_create_request(location).to_generic()?;
    client
        .create_or_update_with(&id, &body, UpdateMethod::Put, options)
        .await
}

/// Change the administrator password with a PATCH carrying only that field
pub async fn change_administrator_password(
    client: &ResourceClient,
    resource_group: &str,
    server_name: &str,
    new_password: &str,
    options: &LroOptions,
) -> Result<GenericResource> {
    let id = client.server_id(resource_group, server_name);
    let body = ServerUpdate::password(new_password).to_generic()?;
    client
        .create_or_update_with(&id, &body, UpdateMethod::Patch, options)
        .await
}

/// Create a firewall rule allowing `start_ip..=end_ip`
pub async fn create_firewall_rule(
    client: &ResourceClient,
    resource_group: &str,
    server_name: &str,
    rule_name: &str,
    start_ip: &str,
    end_ip: &str,
    options: &LroOptions,
) -> Result<GenericResource> {
    let id = client.firewall_rule_id(resource_group, server_name, rule_name);
    let body = FirewallRule::new(start_ip, end_ip).to_generic()?;
    client
        .create_or_update_with(&id, &body, UpdateMethod::Put, options)
        .await
}

/// Restore `source_server` as it was at `restore_point` into a new server
///
/// The source is read first for its resource id and location, which the
/// restore body must carry.
pub async fn restore_server(
    client: &ResourceClient,
    resource_group: &str,
    source_server: &str,
    target_server: &str,
    restore_point: DateTime<Utc>,
    options: &LroOptions,
) -> Result<GenericResource> {
    let source_id = client.server_id(resource_group, source_server);
    let source = client
        .get_with(&source_id, options.cancel.as_ref())
        .await?;

    let source_server_id = source.id.unwrap_or_else(|| source_id.to_string());
    let location = source.location.ok_or_else(|| {
        CoreError::validation(
            "location",
            format!("source server '{}' reported no location", source_server),
        )
    })?;

    tracing::info!(
        "Restoring {} at {} into {}",
        source_server,
        restore_point.to_rfc3339(),
        target_server
    );
    let target_id = client.server_id(resource_group, target_server);
    let body = ServerForRestore::new(location, source_server_id, restore_point).to_generic()?;
    client
        .create_or_update_with(&target_id, &body, UpdateMethod::Put, options)
        .await
}

pub async fn delete_server(
    client: &ResourceClient,
    resource_group: &str,
    server_name: &str,
    options: &LroOptions,
) -> Result<()> {
    let id = client.server_id(resource_group, server_name);
    client.delete_with(&id, options).await
}

/// Wait until the server reports `userVisibleState == Ready`
///
/// Bounded by the client's polling timeout.
pub async fn wait_for_server_ready(
    client: &ResourceClient,
    resource_group: &str,
    server_name: &str,
    options: &LroOptions,
) -> Result<GenericResource> {
    let id = client.server_id(resource_group, server_name);
    let operation = format!("wait for {} ready", server_name);
    let timeout = client.polling().timeout();
    let interval = client.polling().interval();
    let start = Instant::now();

    loop {
        let server = client.get_with(&id, options.cancel.as_ref()).await?;
        let state = server
            .property_str("userVisibleState")
            .unwrap_or("Unknown")
            .to_string();
        if state.eq_ignore_ascii_case(READY_STATE) {
            tracing::debug!("{} is ready", server_name);
            return Ok(server);
        }

        options.emit(ProgressEvent::Polling {
            operation: operation.clone(),
            status: state,
            elapsed: start.elapsed(),
        });
        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            return Err(CoreError::PollTimeout(timeout));
        }
        cancellable(
            options.cancel.as_ref(),
            tokio::time::sleep(interval.min(remaining)),
        )
        .await?;
    }
}

/// Restore point `offset` before now
pub fn restore_point_before_now(offset: Duration) -> DateTime<Utc> {
    let offset = chrono::Duration::from_std(offset).unwrap_or(chrono::Duration::zero());
    Utc::now() - offset
}
