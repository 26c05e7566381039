//! Typed request models for PostgreSQL servers and firewall rules
//!
//! These serialize to the same JSON shape as [`GenericResource`], so each one
//! converts into a generic body right before a request. The `additional` maps
//! carry provider properties that are not modelled here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::Result;
use crate::resource::{GenericResource, Sku};

/// Supported PostgreSQL server versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum ServerVersion {
    #[serde(rename = "9.5")]
    #[value(name = "9.5")]
    V9_5,
    #[serde(rename = "9.6")]
    #[value(name = "9.6")]
    V9_6,
}

impl ServerVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerVersion::V9_5 => "9.5",
            ServerVersion::V9_6 => "9.6",
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pricing tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum SkuTier {
    Basic,
    Standard,
}

impl SkuTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkuTier::Basic => "Basic",
            SkuTier::Standard => "Standard",
        }
    }

    /// SKU name for a given capacity, e.g. `PGSQLB50`
    pub fn sku_name(&self, compute_units: u32) -> String {
        let letter = match self {
            SkuTier::Basic => 'B',
            SkuTier::Standard => 'S',
        };
        format!("PGSQL{}{}", letter, compute_units)
    }
}

impl fmt::Display for SkuTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CreateMode {
    Default,
    PointInTimeRestore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SslEnforcement {
    Enabled,
    Disabled,
}

/// Flattened server parameters used at call sites.
///
/// Only lives long enough to be turned into a [`ServerForCreate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerProperties {
    pub administrator_login: String,
    pub administrator_password: String,
    pub version: ServerVersion,
    pub tier: SkuTier,
    /// SKU capacity; the tier default when unset
    pub compute_units: Option<u32>,
    /// Storage size in GB, sent as `storageMB`; the tier default when unset
    pub storage_gb: Option<u32>,
}

impl ServerProperties {
    pub fn into_create_request(self, location: impl Into<String>) -> ServerForCreate {
        let sku = Sku {
            name: self.compute_units.map(|units| self.tier.sku_name(units)),
            tier: Some(self.tier.as_str().to_string()),
            capacity: self.compute_units,
        };

        ServerForCreate {
            location: location.into(),
            sku: Some(sku),
            properties: ServerPropertiesForDefaultCreate {
                create_mode: CreateMode::Default,
                administrator_login: self.administrator_login,
                administrator_login_password: self.administrator_password,
                version: self.version,
                ssl_enforcement: SslEnforcement::Enabled,
                storage_mb: self.storage_gb.map(|gb| u64::from(gb) * 1024),
                additional: Map::new(),
            },
        }
    }
}

/// Conversion of a typed body into the generic wire representation
pub trait IntoGenericResource: Serialize {
    fn to_generic(&self) -> Result<GenericResource> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

/// Full PUT body for a new server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerForCreate {
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    pub properties: ServerPropertiesForDefaultCreate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPropertiesForDefaultCreate {
    pub create_mode: CreateMode,
    pub administrator_login: String,
    pub administrator_login_password: String,
    pub version: ServerVersion,
    pub ssl_enforcement: SslEnforcement,
    #[serde(rename = "storageMB", default, skip_serializing_if = "Option::is_none")]
    pub storage_mb: Option<u64>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl IntoGenericResource for ServerForCreate {}

/// PUT body for a point-in-time restore into a new server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerForRestore {
    pub location: String,
    pub properties: ServerPropertiesForRestore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPropertiesForRestore {
    pub create_mode: CreateMode,
    pub source_server_id: String,
    pub restore_point_in_time: DateTime<Utc>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ServerForRestore {
    pub fn new(
        location: impl Into<String>,
        source_server_id: impl Into<String>,
        restore_point_in_time: DateTime<Utc>,
    ) -> Self {
        Self {
            location: location.into(),
            properties: ServerPropertiesForRestore {
                create_mode: CreateMode::PointInTimeRestore,
                source_server_id: source_server_id.into(),
                restore_point_in_time,
                additional: Map::new(),
            },
        }
    }
}

impl IntoGenericResource for ServerForRestore {}

/// PATCH body; only fields that are set are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    pub properties: ServerUpdateProperties,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdateProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub administrator_login_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<ServerVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_enforcement: Option<SslEnforcement>,
    #[serde(rename = "storageMB", default, skip_serializing_if = "Option::is_none")]
    pub storage_mb: Option<u64>,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl ServerUpdate {
    pub fn password(new_password: impl Into<String>) -> Self {
        Self {
            sku: None,
            properties: ServerUpdateProperties {
                administrator_login_password: Some(new_password.into()),
                ..Default::default()
            },
        }
    }
}

impl IntoGenericResource for ServerUpdate {}

/// PUT body for a server firewall rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirewallRule {
    pub properties: FirewallRuleProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirewallRuleProperties {
    pub start_ip_address: String,
    pub end_ip_address: String,
    #[serde(flatten)]
    pub additional: Map<String, Value>,
}

impl FirewallRule {
    pub fn new(start_ip_address: impl Into<String>, end_ip_address: impl Into<String>) -> Self {
        Self {
            properties: FirewallRuleProperties {
                start_ip_address: start_ip_address.into(),
                end_ip_address: end_ip_address.into(),
                additional: Map::new(),
            },
        }
    }
}

impl IntoGenericResource for FirewallRule {}
