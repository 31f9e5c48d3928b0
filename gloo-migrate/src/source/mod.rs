//! Typed model of the legacy gateway resources.
//!
//! Only fields the migration reads are typed. Option blocks keep every other
//! key in an `other` overflow map so the translator can report them as
//! unsupported instead of silently dropping them.

pub mod cache;
pub mod gateway;
pub mod listener;
pub mod options;
pub mod policy;
pub mod settings;
pub mod upstream;
pub mod virtual_service;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identity::{ResourceIdentity, SourceKind};

pub use cache::SourceCache;
pub use gateway::GatewaySpec;
pub use listener::{HttpListenerOptionSpec, HttpListenerOptions, ListenerOptionSpec, ListenerOptions};
pub use options::{RouteOptionSpec, RouteOptions, VirtualHostOptionSpec, VirtualHostOptions};
pub use settings::SettingsSpec;
pub use upstream::UpstreamSpec;
pub use virtual_service::{RouteTableSpec, VirtualServiceSpec};

/// Keys a block did not type. Values are raw JSON.
pub type Overflow = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }
}

/// Reference to another resource by name. An empty namespace means "the
/// referencing resource's namespace".
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(default)]
pub struct ResourceRef {
    pub name: String,
    pub namespace: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    pub fn namespace_or<'a>(&'a self, default: &'a str) -> &'a str {
        if self.namespace.is_empty() {
            default
        } else {
            &self.namespace
        }
    }
}

/// Policy attachment reference used by the option resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetRef {
    pub group: String,
    pub kind: String,
    pub name: String,
    pub namespace: String,
    pub section_name: Option<String>,
}

/// Where a resource was read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Provenance {
    #[default]
    Inline,
    File(PathBuf),
    Snapshot(String),
}

/// A source document: metadata, typed spec and where it came from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Resource<S> {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: S,
    #[serde(skip)]
    pub provenance: Provenance,
}

impl<S> Resource<S> {
    pub fn new(metadata: ObjectMeta, spec: S) -> Self {
        Self {
            metadata,
            spec,
            provenance: Provenance::Inline,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}

pub type Gateway = Resource<GatewaySpec>;
pub type VirtualService = Resource<VirtualServiceSpec>;
pub type RouteTable = Resource<RouteTableSpec>;
pub type Upstream = Resource<UpstreamSpec>;
pub type VirtualHostOption = Resource<VirtualHostOptionSpec>;
pub type RouteOption = Resource<RouteOptionSpec>;
pub type ListenerOption = Resource<ListenerOptionSpec>;
pub type HttpListenerOption = Resource<HttpListenerOptionSpec>;
pub type AuthConfig = Resource<Value>;
pub type Settings = Resource<SettingsSpec>;

/// Every source document kind.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResource {
    Gateway(Gateway),
    VirtualService(VirtualService),
    RouteTable(RouteTable),
    Upstream(Upstream),
    VirtualHostOption(VirtualHostOption),
    RouteOption(RouteOption),
    ListenerOption(ListenerOption),
    HttpListenerOption(HttpListenerOption),
    AuthConfig(AuthConfig),
    Settings(Settings),
}

impl SourceResource {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Gateway(_) => SourceKind::Gateway,
            Self::VirtualService(_) => SourceKind::VirtualService,
            Self::RouteTable(_) => SourceKind::RouteTable,
            Self::Upstream(_) => SourceKind::Upstream,
            Self::VirtualHostOption(_) => SourceKind::VirtualHostOption,
            Self::RouteOption(_) => SourceKind::RouteOption,
            Self::ListenerOption(_) => SourceKind::ListenerOption,
            Self::HttpListenerOption(_) => SourceKind::HttpListenerOption,
            Self::AuthConfig(_) => SourceKind::AuthConfig,
            Self::Settings(_) => SourceKind::Settings,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            Self::Gateway(r) => &r.metadata,
            Self::VirtualService(r) => &r.metadata,
            Self::RouteTable(r) => &r.metadata,
            Self::Upstream(r) => &r.metadata,
            Self::VirtualHostOption(r) => &r.metadata,
            Self::RouteOption(r) => &r.metadata,
            Self::ListenerOption(r) => &r.metadata,
            Self::HttpListenerOption(r) => &r.metadata,
            Self::AuthConfig(r) => &r.metadata,
            Self::Settings(r) => &r.metadata,
        }
    }

    pub fn identity(&self) -> ResourceIdentity {
        let meta = self.metadata();
        ResourceIdentity::new(self.kind(), meta.namespace.clone(), meta.name.clone())
    }

    pub fn set_provenance(&mut self, provenance: Provenance) {
        let slot = match self {
            Self::Gateway(r) => &mut r.provenance,
            Self::VirtualService(r) => &mut r.provenance,
            Self::RouteTable(r) => &mut r.provenance,
            Self::Upstream(r) => &mut r.provenance,
            Self::VirtualHostOption(r) => &mut r.provenance,
            Self::RouteOption(r) => &mut r.provenance,
            Self::ListenerOption(r) => &mut r.provenance,
            Self::HttpListenerOption(r) => &mut r.provenance,
            Self::AuthConfig(r) => &mut r.provenance,
            Self::Settings(r) => &mut r.provenance,
        };
        *slot = provenance;
    }

    /// Decode a document whose `kind` has already been read.
    ///
    /// Returns `Ok(None)` for kinds the migration does not read.
    pub fn from_document(kind: &str, document: Value) -> Result<Option<Self>, serde_json::Error> {
        let Some(kind) = SourceKind::from_document_kind(kind) else {
            return Ok(None);
        };
        let resource = match kind {
            SourceKind::Gateway => Self::Gateway(serde_json::from_value(document)?),
            SourceKind::VirtualService => Self::VirtualService(serde_json::from_value(document)?),
            SourceKind::RouteTable => Self::RouteTable(serde_json::from_value(document)?),
            SourceKind::Upstream => Self::Upstream(serde_json::from_value(document)?),
            SourceKind::VirtualHostOption => Self::VirtualHostOption(serde_json::from_value(document)?),
            SourceKind::RouteOption => Self::RouteOption(serde_json::from_value(document)?),
            SourceKind::ListenerOption => Self::ListenerOption(serde_json::from_value(document)?),
            SourceKind::HttpListenerOption => Self::HttpListenerOption(serde_json::from_value(document)?),
            SourceKind::AuthConfig => Self::AuthConfig(serde_json::from_value(document)?),
            SourceKind::Settings => Self::Settings(serde_json::from_value(document)?),
            SourceKind::WireListener | SourceKind::WireRouteConfiguration | SourceKind::WireCluster => {
                return Ok(None)
            }
        };
        Ok(Some(resource))
    }
}

/// True when a JSON value carries no information: null, false, zero, or an
/// empty string, array or object.
pub fn is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
