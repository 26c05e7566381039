//! Connection management for the resource manager client

use std::sync::Arc;

use anyhow::Context;
use azpgctl_core::client::USER_AGENT;
use azpgctl_core::{ClientConfig, ClientSecretCredential, Config, ResourceClient};
use tracing::{debug, info};

use crate::error::Result as CliResult;

/// Connection manager for creating authenticated clients
#[derive(Clone)]
pub struct ConnectionManager {
    pub config: Config,
}

impl ConnectionManager {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Create a resource client from the service principal credentials
    ///
    /// Environment variables take precedence over the config file; a
    /// missing value fails before any network call.
    pub fn create_client(&self) -> CliResult<ResourceClient> {
        debug!("Creating resource manager client");
        let credentials = self.config.resolve_credentials()?;
        debug!(
            "Resolved credentials for subscription {} (client {})",
            credentials.subscription_id, credentials.client_id
        );

        let client_config =
            ClientConfig::from_config(&self.config, credentials.subscription_id.clone())?;

        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.config.polling.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        let authority = self.config.endpoints.authority_url()?;
        let credential = ClientSecretCredential::new(
            http.clone(),
            &authority,
            &credentials.tenant_id,
            credentials.client_id,
            credentials.client_secret,
            self.config.endpoints.token_resource.clone(),
        )?;

        info!(
            "Using resource manager at {}",
            client_config.base_url.as_str()
        );
        Ok(ResourceClient::with_http(
            http,
            client_config,
            Arc::new(credential),
        ))
    }
}
