//! Resource identity and the generic resource body
//!
//! Every object on the control plane is addressed by a [`ResourceId`]:
//!
//! ```text
//! /subscriptions/{sub}/resourcegroups/{group}/providers/{namespace}/{parent...}/{type}/{name}
//! ```
//!
//! Bodies are exchanged as [`GenericResource`]: a location, an optional SKU,
//! tags, and a `properties` bag whose schema belongs to the provider.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{CoreError, Result};

const RESOURCE_GROUP_MAX_LEN: usize = 90;

fn resource_group_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-\w._()]+$").expect("valid resource group pattern"))
}

fn kind_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[-\w._,()]+$").expect("valid kind pattern"))
}

/// Check a resource group name against the ARM naming rules.
pub fn validate_resource_group_name(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len == 0 {
        return Err(CoreError::validation(
            "resourceGroupName",
            "must be at least 1 character",
        ));
    }
    if len > RESOURCE_GROUP_MAX_LEN {
        return Err(CoreError::validation(
            "resourceGroupName",
            format!(
                "must be at most {} characters, got {}",
                RESOURCE_GROUP_MAX_LEN, len
            ),
        ));
    }
    if !resource_group_pattern().is_match(name) {
        return Err(CoreError::validation(
            "resourceGroupName",
            format!("'{}' does not match pattern ^[-\\w._()]+$", name),
        ));
    }
    Ok(())
}

/// Check a request body before it is sent.
///
/// `kind` is optional, but when present it must match `^[-\w._,()]+$`.
pub fn validate_body(body: &GenericResource) -> Result<()> {
    if let Some(kind) = &body.kind
        && !kind_pattern().is_match(kind)
    {
        return Err(CoreError::validation(
            "parameters.kind",
            format!("'{}' does not match pattern ^[-\\w._,()]+$", kind),
        ));
    }
    Ok(())
}

/// Append path segments and the api-version to a base URL.
///
/// Segments are percent-encoded with the URL path-segment set, so names
/// such as `rg_(test)-1.0` appear verbatim.
pub(crate) fn build_url<I, S>(base: &Url, segments: I, api_version: &str) -> Result<Url>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| CoreError::validation("baseUrl", format!("'{}' cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);
    url.query_pairs_mut().append_pair("api-version", api_version);
    Ok(url)
}

/// Identity of a resource group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceGroupId {
    pub subscription_id: String,
    pub name: String,
}

impl ResourceGroupId {
    pub fn new(subscription_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_resource_group_name(&self.name)
    }

    pub fn url(&self, base: &Url, api_version: &str) -> Result<Url> {
        self.validate()?;
        build_url(
            base,
            [
                "subscriptions",
                self.subscription_id.as_str(),
                "resourcegroups",
                self.name.as_str(),
            ],
            api_version,
        )
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}",
            self.subscription_id, self.name
        )
    }
}

/// Identity of a provider resource inside a resource group
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    pub subscription_id: String,
    pub resource_group: String,
    pub provider_namespace: String,
    /// Parent path such as `servers/s1`; empty for top-level resources
    pub parent_resource_path: String,
    pub resource_type: String,
    pub resource_name: String,
}

impl ResourceId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        provider_namespace: impl Into<String>,
        parent_resource_path: impl Into<String>,
        resource_type: impl Into<String>,
        resource_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            provider_namespace: provider_namespace.into(),
            parent_resource_path: parent_resource_path.into(),
            resource_type: resource_type.into(),
            resource_name: resource_name.into(),
        }
    }

    pub fn group(&self) -> ResourceGroupId {
        ResourceGroupId::new(&self.subscription_id, &self.resource_group)
    }

    pub fn validate(&self) -> Result<()> {
        validate_resource_group_name(&self.resource_group)?;
        if self.resource_name.is_empty() {
            return Err(CoreError::validation(
                "resourceName",
                "must not be empty",
            ));
        }
        if self.provider_namespace.is_empty() || self.resource_type.is_empty() {
            return Err(CoreError::validation(
                "resourceType",
                "provider namespace and resource type are required",
            ));
        }
        Ok(())
    }

    fn segments(&self) -> Vec<&str> {
        let mut segments = vec![
            "subscriptions",
            self.subscription_id.as_str(),
            "resourcegroups",
            self.resource_group.as_str(),
            "providers",
            self.provider_namespace.as_str(),
        ];
        segments.extend(
            self.parent_resource_path
                .split('/')
                .filter(|segment| !segment.is_empty()),
        );
        segments.extend(
            self.resource_type
                .split('/')
                .filter(|segment| !segment.is_empty()),
        );
        segments.push(self.resource_name.as_str());
        segments
    }

    /// Full request URL; validates the identity first.
    pub fn url(&self, base: &Url, api_version: &str) -> Result<Url> {
        self.validate()?;
        build_url(base, self.segments(), api_version)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/{}/",
            self.subscription_id, self.resource_group, self.provider_namespace
        )?;
        let parent = self.parent_resource_path.trim_matches('/');
        if !parent.is_empty() {
            write!(f, "{}/", parent)?;
        }
        write!(f, "{}/{}", self.resource_type, self.resource_name)
    }
}

/// SKU descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sku {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// Provider-agnostic resource representation
///
/// Every field is optional and skipped when unset, so a body carrying only
/// `properties` serializes to exactly `{"properties": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
}

impl GenericResource {
    /// A body with only the given properties set
    pub fn with_properties(properties: Map<String, Value>) -> Self {
        Self {
            properties: Some(properties),
            ..Default::default()
        }
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.as_ref().and_then(|p| p.get(key))
    }

    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.property(key).and_then(Value::as_str)
    }

    /// `properties.provisioningState`, when the provider reports one
    pub fn provisioning_state(&self) -> Option<&str> {
        self.property_str("provisioningState")
    }
}
