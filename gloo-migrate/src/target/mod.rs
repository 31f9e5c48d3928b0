//! Target resource model: Gateway API and kgateway objects.
//!
//! Only serialization is needed, so every spec type derives `Serialize` and
//! omits empty fields.

pub mod backend;
pub mod builder;
pub mod gateway;
pub mod policy;
pub mod render;
pub mod route;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::source::ObjectMeta;

pub use backend::{BackendConfigPolicySpec, BackendSpec, ParameterSpec};
pub use builder::TargetBuilder;
pub use gateway::{GatewaySpec, ListenerSetSpec};
pub use policy::{GatewayExtensionSpec, HttpListenerPolicySpec, TrafficPolicySpec};
pub use route::{DirectResponseSpec, HttpRouteSpec, TcpRouteSpec};

pub const GATEWAY_API_GROUP: &str = "gateway.networking.k8s.io";
pub const GATEWAY_API_X_GROUP: &str = "gateway.networking.x-k8s.io";
pub const KGATEWAY_GROUP: &str = "gateway.kgateway.dev";
pub const EXTAUTH_GROUP: &str = "extauth.solo.io";

/// Target kinds, in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TargetKind {
    Gateway,
    ListenerSet,
    HttpRoute,
    TcpRoute,
    Backend,
    BackendConfigPolicy,
    TrafficPolicy,
    HttpListenerPolicy,
    GatewayExtension,
    DirectResponse,
    Parameter,
    AuthConfig,
}

impl TargetKind {
    pub const ALL: [TargetKind; 12] = [
        TargetKind::Gateway,
        TargetKind::ListenerSet,
        TargetKind::HttpRoute,
        TargetKind::TcpRoute,
        TargetKind::Backend,
        TargetKind::BackendConfigPolicy,
        TargetKind::TrafficPolicy,
        TargetKind::HttpListenerPolicy,
        TargetKind::GatewayExtension,
        TargetKind::DirectResponse,
        TargetKind::Parameter,
        TargetKind::AuthConfig,
    ];

    /// The `kind` field written to the document.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gateway => "Gateway",
            Self::ListenerSet => "XListenerSet",
            Self::HttpRoute => "HTTPRoute",
            Self::TcpRoute => "TCPRoute",
            Self::Backend => "Backend",
            Self::BackendConfigPolicy => "BackendConfigPolicy",
            Self::TrafficPolicy => "TrafficPolicy",
            Self::HttpListenerPolicy => "HTTPListenerPolicy",
            Self::GatewayExtension => "GatewayExtension",
            Self::DirectResponse => "DirectResponse",
            Self::Parameter => "Parameter",
            Self::AuthConfig => "AuthConfig",
        }
    }

    pub fn group(self) -> &'static str {
        match self {
            Self::Gateway | Self::HttpRoute | Self::TcpRoute => GATEWAY_API_GROUP,
            Self::ListenerSet => GATEWAY_API_X_GROUP,
            Self::AuthConfig => EXTAUTH_GROUP,
            _ => KGATEWAY_GROUP,
        }
    }

    pub fn api_version(self) -> &'static str {
        match self {
            Self::Gateway | Self::HttpRoute => "gateway.networking.k8s.io/v1",
            Self::TcpRoute => "gateway.networking.k8s.io/v1alpha2",
            Self::ListenerSet => "gateway.networking.x-k8s.io/v1alpha1",
            Self::AuthConfig => "extauth.solo.io/v1",
            _ => "gateway.kgateway.dev/v1alpha1",
        }
    }

    /// Snake-case label used in summaries.
    pub fn label(self) -> &'static str {
        match self {
            Self::Gateway => "gateway",
            Self::ListenerSet => "listener_set",
            Self::HttpRoute => "http_route",
            Self::TcpRoute => "tcp_route",
            Self::Backend => "backend",
            Self::BackendConfigPolicy => "backend_config_policy",
            Self::TrafficPolicy => "traffic_policy",
            Self::HttpListenerPolicy => "http_listener_policy",
            Self::GatewayExtension => "gateway_extension",
            Self::DirectResponse => "direct_response",
            Self::Parameter => "parameter",
            Self::AuthConfig => "auth_config",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a target resource: unique within the target cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub kind: TargetKind,
    pub namespace: String,
    pub name: String,
}

impl TargetKey {
    pub fn new(kind: TargetKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Metadata plus spec of one target object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object<S> {
    pub metadata: ObjectMeta,
    pub spec: S,
}

impl<S> Object<S> {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, spec: S) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }
}

pub type Gateway = Object<GatewaySpec>;
pub type ListenerSet = Object<ListenerSetSpec>;
pub type HttpRoute = Object<HttpRouteSpec>;
pub type TcpRoute = Object<TcpRouteSpec>;
pub type Backend = Object<BackendSpec>;
pub type BackendConfigPolicy = Object<BackendConfigPolicySpec>;
pub type TrafficPolicy = Object<TrafficPolicySpec>;
pub type HttpListenerPolicy = Object<HttpListenerPolicySpec>;
pub type GatewayExtension = Object<GatewayExtensionSpec>;
pub type DirectResponse = Object<DirectResponseSpec>;
pub type Parameter = Object<ParameterSpec>;
/// AuthConfigs are copied through unchanged.
pub type AuthConfig = Object<Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum TargetResource {
    Gateway(Gateway),
    ListenerSet(ListenerSet),
    HttpRoute(HttpRoute),
    TcpRoute(TcpRoute),
    Backend(Backend),
    BackendConfigPolicy(BackendConfigPolicy),
    TrafficPolicy(TrafficPolicy),
    HttpListenerPolicy(HttpListenerPolicy),
    GatewayExtension(GatewayExtension),
    DirectResponse(DirectResponse),
    Parameter(Parameter),
    AuthConfig(AuthConfig),
}

macro_rules! target_variants {
    ($($variant:ident,)*) => {
        impl TargetResource {
            pub fn kind(&self) -> TargetKind {
                match self {
                    $(Self::$variant(_) => TargetKind::$variant,)*
                }
            }

            pub fn metadata(&self) -> &ObjectMeta {
                match self {
                    $(Self::$variant(object) => &object.metadata,)*
                }
            }

            pub(crate) fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
                let kind = self.kind();
                match self {
                    $(Self::$variant(object) => render::document(kind, &object.metadata, &object.spec),)*
                }
            }
        }

        $(
            impl From<$variant> for TargetResource {
                fn from(object: $variant) -> Self {
                    Self::$variant(object)
                }
            }
        )*
    };
}

target_variants! {
    Gateway,
    ListenerSet,
    HttpRoute,
    TcpRoute,
    Backend,
    BackendConfigPolicy,
    TrafficPolicy,
    HttpListenerPolicy,
    GatewayExtension,
    DirectResponse,
    Parameter,
    AuthConfig,
}

impl TargetResource {
    pub fn key(&self) -> TargetKey {
        let meta = self.metadata();
        TargetKey::new(self.kind(), meta.namespace.clone(), meta.name.clone())
    }
}

/// `{name}` reference within the policy's namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalRef {
    pub name: String,
}

impl LocalRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NamespacedRef {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Attachment from a policy to a Gateway, route, Backend or Service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyTargetRef {
    pub group: String,
    pub kind: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_name: Option<String>,
}

impl PolicyTargetRef {
    pub fn gateway(name: impl Into<String>) -> Self {
        Self::of(TargetKind::Gateway, name)
    }

    pub fn http_route(name: impl Into<String>) -> Self {
        Self::of(TargetKind::HttpRoute, name)
    }

    pub fn backend(name: impl Into<String>) -> Self {
        Self::of(TargetKind::Backend, name)
    }

    /// Core-group Service.
    pub fn service(name: impl Into<String>) -> Self {
        Self {
            group: String::new(),
            kind: "Service".to_string(),
            name: name.into(),
            section_name: None,
        }
    }

    pub fn of(kind: TargetKind, name: impl Into<String>) -> Self {
        Self {
            group: kind.group().to_string(),
            kind: kind.as_str().to_string(),
            name: name.into(),
            section_name: None,
        }
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section_name = Some(section.into());
        self
    }
}

/// Reference to a Service or Backend used by extensions and sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendObjectReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u32>,
}

impl BackendObjectReference {
    pub fn service(name: impl Into<String>, namespace: Option<String>, port: Option<u32>) -> Self {
        Self {
            group: None,
            kind: None,
            name: name.into(),
            namespace,
            port,
        }
    }

    pub fn backend(name: impl Into<String>, namespace: Option<String>) -> Self {
        Self {
            group: Some(KGATEWAY_GROUP.to_string()),
            kind: Some(TargetKind::Backend.as_str().to_string()),
            name: name.into(),
            namespace,
            port: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{PolicyTargetRef, TargetKind};

    #[test]
    fn kinds_carry_their_api_group() {
        assert_eq!(TargetKind::HttpRoute.api_version(), "gateway.networking.k8s.io/v1");
        assert_eq!(TargetKind::ListenerSet.as_str(), "XListenerSet");
        assert_eq!(TargetKind::TrafficPolicy.api_version(), "gateway.kgateway.dev/v1alpha1");
        assert_eq!(TargetKind::AuthConfig.api_version(), "extauth.solo.io/v1");
        assert_eq!(TargetKind::TcpRoute.api_version(), "gateway.networking.k8s.io/v1alpha2");
        assert_eq!(TargetKind::TcpRoute.group(), "gateway.networking.k8s.io");
    }

    #[test]
    fn policy_target_refs_use_kind_groups() {
        let gw = PolicyTargetRef::gateway("gateway-proxy").with_section("http");
        assert_eq!(gw.group, "gateway.networking.k8s.io");
        assert_eq!(gw.section_name.as_deref(), Some("http"));
        let svc = PolicyTargetRef::service("petstore");
        assert_eq!(svc.group, "");
        assert_eq!(svc.kind, "Service");
    }
}
