//! Generic resource client for the Azure Resource Manager control plane
//!
//! [`ResourceClient`] issues GET / PUT / PATCH / DELETE against
//! resource-group scoped resources and drives accepted mutations to a
//! terminal state (see [`crate::progress`]). It holds no mutable state apart
//! from the credential's token cache, so it is cheap to clone and share.

use std::sync::Arc;

use reqwest::header::HeaderMap;
use reqwest::{Method, Response, StatusCode};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::auth::TokenCredential;
use crate::config::{Config, PollingConfig};
use crate::error::{CoreError, Result};
use crate::progress::{
    LroOptions, PendingOperation, PollTarget, cancellable, parse_resource, poll_target, remote,
    retry_after,
};
use crate::resource::{GenericResource, ResourceGroupId, ResourceId, validate_body};

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("azpgctl/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_BASE_URL: &str = "https://management.azure.com";
pub const DEFAULT_SERVER_API_VERSION: &str = "2017-04-30-preview";
pub const DEFAULT_RESOURCE_GROUP_API_VERSION: &str = "2017-05-10";

pub const POSTGRES_NAMESPACE: &str = "Microsoft.DBforPostgreSQL";
pub const SERVERS_TYPE: &str = "servers";
pub const FIREWALL_RULES_TYPE: &str = "firewallRules";

/// HTTP verb for [`ResourceClient::create_or_update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMethod {
    /// Replace the whole resource
    Put,
    /// Merge the supplied fields into the existing resource
    Patch,
}

impl UpdateMethod {
    fn as_method(self) -> Method {
        match self {
            UpdateMethod::Put => Method::PUT,
            UpdateMethod::Patch => Method::PATCH,
        }
    }
}

/// Immutable settings for a [`ResourceClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub subscription_id: String,
    /// api-version for provider resources
    pub api_version: String,
    /// api-version for resource groups
    pub resource_group_api_version: String,
    pub polling: PollingConfig,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: Url, subscription_id: impl Into<String>) -> Self {
        Self {
            base_url,
            subscription_id: subscription_id.into(),
            api_version: DEFAULT_SERVER_API_VERSION.to_string(),
            resource_group_api_version: DEFAULT_RESOURCE_GROUP_API_VERSION.to_string(),
            polling: PollingConfig::default(),
            user_agent: USER_AGENT.to_string(),
        }
    }

    /// Take endpoints, api versions and polling policy from `config`
    pub fn from_config(config: &Config, subscription_id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            base_url: config.endpoints.resource_manager_url()?,
            subscription_id: subscription_id.into(),
            api_version: config.api.server.clone(),
            resource_group_api_version: config.api.resource_group.clone(),
            polling: config.polling.clone(),
            user_agent: USER_AGENT.to_string(),
        })
    }

    pub fn with_polling(mut self, polling: PollingConfig) -> Self {
        self.polling = polling;
        self
    }
}

/// Authenticated control-plane client
#[derive(Clone)]
pub struct ResourceClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    credential: Arc<dyn TokenCredential>,
}

impl std::fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ResourceClient {
    /// Build a client with its own HTTP connection pool
    pub fn new(config: ClientConfig, credential: Arc<dyn TokenCredential>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.polling.request_timeout())
            .build()?;
        Ok(Self::with_http(http, config, credential))
    }

    /// Build a client around an existing `reqwest::Client`
    pub fn with_http(
        http: reqwest::Client,
        config: ClientConfig,
        credential: Arc<dyn TokenCredential>,
    ) -> Self {
        Self {
            http,
            config: Arc::new(config),
            credential,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.config.polling
    }

    pub fn subscription_id(&self) -> &str {
        &self.config.subscription_id
    }

    pub fn resource_group_id(&self, resource_group: &str) -> ResourceGroupId {
        ResourceGroupId::new(&self.config.subscription_id, resource_group)
    }

    /// Identity of a PostgreSQL server
    pub fn server_id(&self, resource_group: &str, server_name: &str) -> ResourceId {
        ResourceId::new(
            &self.config.subscription_id,
            resource_group,
            POSTGRES_NAMESPACE,
            "",
            SERVERS_TYPE,
            server_name,
        )
    }

    /// Identity of a firewall rule nested under `servers/{server_name}`
    pub fn firewall_rule_id(
        &self,
        resource_group: &str,
        server_name: &str,
        rule_name: &str,
    ) -> ResourceId {
        ResourceId::new(
            &self.config.subscription_id,
            resource_group,
            POSTGRES_NAMESPACE,
            format!("{}/{}", SERVERS_TYPE, server_name),
            FIREWALL_RULES_TYPE,
            rule_name,
        )
    }

    fn resource_url(&self, id: &ResourceId) -> Result<Url> {
        id.url(&self.config.base_url, &self.config.api_version)
    }

    fn group_url(&self, group: &ResourceGroupId) -> Result<Url> {
        group.url(&self.config.base_url, &self.config.resource_group_api_version)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&GenericResource>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response> {
        let token = cancellable(cancel, self.credential.token()).await??;

        tracing::debug!("{} {}", method, url);
        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(token.secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = cancellable(cancel, request.send()).await??;
        tracing::trace!("Response status: {}", response.status());
        Ok(response)
    }

    /// GET an absolute URL; used for polling operation and status URLs
    pub(crate) async fn get_url(
        &self,
        url: Url,
        cancel: Option<&CancellationToken>,
    ) -> Result<Response> {
        self.send(Method::GET, url, None, cancel).await
    }

    async fn fetch(
        &self,
        url: Url,
        resource: String,
        cancel: Option<&CancellationToken>,
    ) -> Result<GenericResource> {
        let response = self.get_url(url, cancel).await?;
        let status = response.status();
        let text = response.text().await?;

        match status {
            StatusCode::OK => Ok(serde_json::from_str(&text)?),
            StatusCode::NOT_FOUND => Err(CoreError::NotFound { resource }),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(CoreError::Unauthorized {
                status: status.as_u16(),
                body: text,
            }),
            _ => Err(remote(status, &text)),
        }
    }

    /// Read a resource.
    ///
    /// # Errors
    ///
    /// `NotFound` on 404, `Unauthorized` on 401/403, `Remote` otherwise.
    pub async fn get(&self, id: &ResourceId) -> Result<GenericResource> {
        self.get_with(id, None).await
    }

    pub async fn get_with(
        &self,
        id: &ResourceId,
        cancel: Option<&CancellationToken>,
    ) -> Result<GenericResource> {
        let url = self.resource_url(id)?;
        self.fetch(url, id.to_string(), cancel).await
    }

    /// Create or update a resource and wait for the operation to finish
    pub async fn create_or_update(
        &self,
        id: &ResourceId,
        body: &GenericResource,
        method: UpdateMethod,
    ) -> Result<GenericResource> {
        self.create_or_update_with(id, body, method, &LroOptions::default())
            .await
    }

    /// Same as [`create_or_update`](Self::create_or_update), with cancellation
    /// and progress reporting.
    ///
    /// The body is sent exactly as serialized; validation runs before any
    /// request is made.
    pub async fn create_or_update_with(
        &self,
        id: &ResourceId,
        body: &GenericResource,
        method: UpdateMethod,
        options: &LroOptions,
    ) -> Result<GenericResource> {
        let url = self.resource_url(id)?;
        validate_body(body)?;

        let operation = format!("{} {}", method.as_method(), id);
        let response = self
            .send(method.as_method(), url.clone(), Some(body), options.cancel.as_ref())
            .await?;
        self.finish_write(&operation, &url, id.to_string(), response, options)
            .await
    }

    /// Delete a resource and wait for the operation to finish.
    ///
    /// # Errors
    ///
    /// `NotFound` when the service answers 204 or 404, i.e. there was
    /// nothing to delete.
    pub async fn delete(&self, id: &ResourceId) -> Result<()> {
        self.delete_with(id, &LroOptions::default()).await
    }

    pub async fn delete_with(&self, id: &ResourceId, options: &LroOptions) -> Result<()> {
        let url = self.resource_url(id)?;
        self.finish_delete(&format!("DELETE {}", id), url, id.to_string(), options)
            .await
    }

    /// Create (or update) a resource group in `location`
    pub async fn create_resource_group(
        &self,
        group: &ResourceGroupId,
        location: &str,
    ) -> Result<GenericResource> {
        self.create_resource_group_with(group, location, &LroOptions::default())
            .await
    }

    pub async fn create_resource_group_with(
        &self,
        group: &ResourceGroupId,
        location: &str,
        options: &LroOptions,
    ) -> Result<GenericResource> {
        let url = self.group_url(group)?;
        let body = GenericResource {
            location: Some(location.to_string()),
            ..Default::default()
        };

        let operation = format!("PUT {}", group);
        let response = self
            .send(Method::PUT, url.clone(), Some(&body), options.cancel.as_ref())
            .await?;
        self.finish_write(&operation, &url, group.to_string(), response, options)
            .await
    }

    /// Delete a resource group and everything in it
    pub async fn delete_resource_group(&self, group: &ResourceGroupId) -> Result<()> {
        self.delete_resource_group_with(group, &LroOptions::default())
            .await
    }

    pub async fn delete_resource_group_with(
        &self,
        group: &ResourceGroupId,
        options: &LroOptions,
    ) -> Result<()> {
        let url = self.group_url(group)?;
        self.finish_delete(&format!("DELETE {}", group), url, group.to_string(), options)
            .await
    }

    async fn finish_write(
        &self,
        operation: &str,
        url: &Url,
        resource: String,
        response: Response,
        options: &LroOptions,
    ) -> Result<GenericResource> {
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        if !matches!(
            status,
            StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED
        ) {
            return Err(remote(status, &text));
        }

        let body = parse_resource(&text);
        match poll_target(status, &headers, body.as_ref(), Some(url)) {
            Some(target) => {
                let done = self.wait(operation, target, &headers, options).await?;
                match done {
                    Some(resource) => Ok(resource),
                    None => {
                        self.fetch(url.clone(), resource, options.cancel.as_ref())
                            .await
                    }
                }
            }
            None => match body {
                Some(body) if status != StatusCode::ACCEPTED => Ok(body),
                _ => {
                    self.fetch(url.clone(), resource, options.cancel.as_ref())
                        .await
                }
            },
        }
    }

    async fn finish_delete(
        &self,
        operation: &str,
        url: Url,
        resource: String,
        options: &LroOptions,
    ) -> Result<()> {
        let response = self
            .send(Method::DELETE, url.clone(), None, options.cancel.as_ref())
            .await?;
        let status = response.status();
        let headers = response.headers().clone();
        let text = response.text().await?;

        match status {
            StatusCode::NO_CONTENT | StatusCode::NOT_FOUND => Err(CoreError::NotFound { resource }),
            StatusCode::OK | StatusCode::ACCEPTED => {
                let target = match poll_target(status, &headers, None, None) {
                    Some(target) => Some(target),
                    // Accepted without a status URL: the resource is gone on 404
                    None if status == StatusCode::ACCEPTED => Some(PollTarget::Deletion(url)),
                    None => None,
                };
                if let Some(target) = target {
                    self.wait(operation, target, &headers, options).await?;
                }
                Ok(())
            }
            _ => Err(remote(status, &text)),
        }
    }

    async fn wait(
        &self,
        operation: &str,
        target: PollTarget,
        headers: &HeaderMap,
        options: &LroOptions,
    ) -> Result<Option<GenericResource>> {
        tracing::info!("{} accepted, polling {:?}", operation, target);
        PendingOperation::new(operation, target)
            .with_first_delay(retry_after(headers))
            .wait(self, options)
            .await
    }
}
