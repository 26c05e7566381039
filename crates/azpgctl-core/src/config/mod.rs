//! Configuration and credential management for azpgctl
//!
// Allow nested config module - this is intentional for the config subsystem

#![allow(clippy::module_inception)]
//!
//! Settings come from an optional TOML file; the service principal can also
//! be supplied entirely through `AZURE_*` environment variables.
//!
//! # Features
//!
//! - Environment variable expansion in config files
//! - Secure credential storage using OS keyring (optional)
//! - Platform-specific config file locations
//! - Polling policy and lifecycle defaults with serde defaults

pub mod config;
pub mod credential;
pub mod error;
pub mod polling;

// Re-export main types for convenience
pub use config::{
    ApiVersions, Config, CredentialSettings, ENV_CLIENT_ID, ENV_CLIENT_SECRET,
    ENV_SUBSCRIPTION_ID, ENV_TENANT_ID, Endpoints, LifecycleSettings, ResolvedCredentials,
};
pub use credential::CredentialStore;
pub use error::{ConfigError, Result};
pub use polling::PollingConfig;
