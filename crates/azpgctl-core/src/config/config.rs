//! Configuration management for azpgctl
//!
//! Settings live in a TOML file with one section per concern. Every value
//! has a default, so an absent file is valid; credentials normally come from
//! the `AZURE_*` environment variables.
//!
//! ```toml
//! [credentials]
//! subscription_id = "${AZURE_SUBSCRIPTION_ID}"
//! client_secret = "keyring:azpgctl-client-secret"
//!
//! [polling]
//! interval_secs = 15
//!
//! [lifecycle]
//! resource_group = "postgresql_from_rust"
//! server_name = "pg-95-basic"
//! ```

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use super::credential::CredentialStore;
use super::error::{ConfigError, Result};
use super::polling::PollingConfig;
use crate::lifecycle::OnFailure;
use crate::models::{ServerVersion, SkuTier};

pub const ENV_SUBSCRIPTION_ID: &str = "AZURE_SUBSCRIPTION_ID";
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub credentials: CredentialSettings,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub api: ApiVersions,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub lifecycle: LifecycleSettings,
}

/// Service principal settings; environment variables take precedence
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct CredentialSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    /// Plaintext or `keyring:<entry>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

/// Fully resolved service principal
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub subscription_id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("subscription_id", &self.subscription_id)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<REDACTED>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Endpoints {
    #[serde(default = "default_resource_manager")]
    pub resource_manager: String,
    #[serde(default = "default_authority")]
    pub authority: String,
    /// Token audience requested from the authority
    #[serde(default = "default_token_resource")]
    pub token_resource: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            resource_manager: default_resource_manager(),
            authority: default_authority(),
            token_resource: default_token_resource(),
        }
    }
}

impl Endpoints {
    pub fn resource_manager_url(&self) -> Result<Url> {
        parse_url(&self.resource_manager)
    }

    pub fn authority_url(&self) -> Result<Url> {
        parse_url(&self.authority)
    }
}

fn parse_url(value: &str) -> Result<Url> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        url: value.to_string(),
        message: e.to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ApiVersions {
    /// Used for PostgreSQL servers and their child resources
    #[serde(default = "default_server_api_version")]
    pub server: String,
    #[serde(default = "default_resource_group_api_version")]
    pub resource_group: String,
}

impl Default for ApiVersions {
    fn default() -> Self {
        Self {
            server: default_server_api_version(),
            resource_group: default_resource_group_api_version(),
        }
    }
}

/// Parameters for the demo lifecycle and defaults for single-step commands
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LifecycleSettings {
    pub resource_group: String,
    pub location: String,
    pub server_name: String,
    pub restored_server_name: Option<String>,
    pub administrator_login: String,
    pub administrator_password: String,
    pub new_administrator_password: String,
    pub version: ServerVersion,
    pub tier: SkuTier,
    pub compute_units: Option<u32>,
    pub storage_gb: Option<u32>,
    pub firewall_rule_name: String,
    pub firewall_start_ip: String,
    pub firewall_end_ip: String,
    /// Restore point is taken this many seconds before "now"
    pub restore_offset_secs: u64,
    pub on_failure: OnFailure,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            resource_group: "postgresql_from_rust".to_string(),
            location: "westus".to_string(),
            server_name: "azpgctl-95-basic".to_string(),
            restored_server_name: None,
            administrator_login: "azadmin".to_string(),
            administrator_password: "Welcome1234".to_string(),
            new_administrator_password: "Welcome0000".to_string(),
            version: ServerVersion::V9_5,
            tier: SkuTier::Basic,
            compute_units: Some(50),
            storage_gb: Some(50),
            firewall_rule_name: "all".to_string(),
            firewall_start_ip: "0.0.0.0".to_string(),
            firewall_end_ip: "255.255.255.255".to_string(),
            restore_offset_secs: 300,
            on_failure: OnFailure::Abort,
        }
    }
}

impl LifecycleSettings {
    pub fn restored_server_name(&self) -> String {
        self.restored_server_name
            .clone()
            .unwrap_or_else(|| format!("{}-restored", self.server_name))
    }
}

impl Config {
    /// Resolve the four service principal values.
    ///
    /// Fails on the first missing value, naming its environment variable.
    pub fn resolve_credentials(&self) -> Result<ResolvedCredentials> {
        let store = CredentialStore::new();
        let c = &self.credentials;
        Ok(ResolvedCredentials {
            subscription_id: store.resolve(
                "subscription_id",
                c.subscription_id.as_deref(),
                ENV_SUBSCRIPTION_ID,
            )?,
            tenant_id: store.resolve("tenant_id", c.tenant_id.as_deref(), ENV_TENANT_ID)?,
            client_id: store.resolve("client_id", c.client_id.as_deref(), ENV_CLIENT_ID)?,
            client_secret: store.resolve(
                "client_secret",
                c.client_secret.as_deref(),
                ENV_CLIENT_SECRET,
            )?,
        })
    }

    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        Self::parse(&content)
    }

    /// Parse TOML content after environment variable expansion
    pub fn parse(content: &str) -> Result<Self> {
        let expanded_content = Self::expand_env_vars(content);
        let config: Config = toml::from_str(&expanded_content)?;
        config.polling.validate()?;
        Ok(config)
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, `~/.config/azpgctl/config.toml` is used when it exists,
    /// falling back to `~/Library/Application Support/com.azpgctl.azpgctl/`.
    ///
    /// On Linux: ~/.config/azpgctl/config.toml
    /// On Windows: %APPDATA%\azpgctl\azpgctl\config\config.toml
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("azpgctl")
                    .join("config.toml");

                if linux_style_path.exists() {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("com", "azpgctl", "azpgctl").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand `${VAR}` and `${VAR:-default}` references.
    ///
    /// Unset variables are left as-is so unused sections still parse.
    fn expand_env_vars(content: &str) -> String {
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

fn default_resource_manager() -> String {
    "https://management.azure.com".to_string()
}

fn default_authority() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_token_resource() -> String {
    "https://management.azure.com/".to_string()
}

fn default_server_api_version() -> String {
    "2017-04-30-preview".to_string()
}

fn default_resource_group_api_version() -> String {
    "2017-05-10".to_string()
}
