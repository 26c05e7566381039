//! # azpgctl-core
//!
//! Control-plane engine for managed PostgreSQL servers on Azure Resource
//! Manager. The CLI is a thin layer over this crate.
//!
//! ## Layers
//!
//! - [`client`] - authenticated GET / PUT / PATCH / DELETE against the generic
//!   resource API, with long-running-operation polling
//! - [`models`] - typed request bodies that convert to [`GenericResource`]
//! - [`servers`] - create / update / restore / delete workflows
//! - [`lifecycle`] - the linear provision-to-teardown sequence
//! - [`config`] and [`auth`] - settings, credentials and bearer tokens
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use azpgctl_core::{ClientConfig, ClientSecretCredential, Config, ResourceClient};
//!
//! let config = Config::load()?;
//! let creds = config.resolve_credentials()?;
//! let http = reqwest::Client::new();
//! let credential = ClientSecretCredential::new(
//!     http.clone(),
//!     &config.endpoints.authority_url()?,
//!     &creds.tenant_id,
//!     creds.client_id,
//!     creds.client_secret,
//!     config.endpoints.token_resource.clone(),
//! )?;
//! let client = ResourceClient::with_http(
//!     http,
//!     ClientConfig::from_config(&config, creds.subscription_id)?,
//!     Arc::new(credential),
//! );
//!
//! let server = client.get(&client.server_id("g1", "s1")).await?;
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod progress;
pub mod resource;
pub mod servers;

pub use auth::{AccessToken, ClientSecretCredential, StaticToken, TokenCredential};
pub use client::{ClientConfig, ResourceClient, UpdateMethod};
pub use config::{Config, ConfigError};
pub use error::{CoreError, Result};
pub use lifecycle::{
    LifecycleError, LifecyclePlan, LifecycleReport, LifecycleStage, OnFailure, PhaseGate,
    run_lifecycle,
};
pub use progress::{LroOptions, ProgressCallback, ProgressEvent};
pub use resource::{GenericResource, ResourceGroupId, ResourceId, Sku};
