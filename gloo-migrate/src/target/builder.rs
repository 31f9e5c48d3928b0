//! Keyed accumulation of target resources.

use std::collections::BTreeMap;

use tracing::debug;

use super::{
    AuthConfig, Backend, BackendConfigPolicy, DirectResponse, Gateway, GatewayExtension, HttpListenerPolicy,
    HttpRoute, ListenerSet, Parameter, TargetKey, TargetKind, TargetResource, TcpRoute, TrafficPolicy,
};

/// Every target resource produced by one run.
///
/// Upserting an existing key replaces the stored value wholesale; callers
/// merge before they upsert. Iteration follows [`TargetKey`] order, which is
/// kind first and then namespace and name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetBuilder {
    resources: BTreeMap<TargetKey, TargetResource>,
}

macro_rules! typed_accessors {
    ($($variant:ident, $ty:ty, $get:ident, $get_mut:ident, $all:ident;)*) => {
        $(
            pub fn $get(&self, namespace: &str, name: &str) -> Option<&$ty> {
                match self.resources.get(&TargetKey::new(TargetKind::$variant, namespace, name)) {
                    Some(TargetResource::$variant(object)) => Some(object),
                    _ => None,
                }
            }

            pub fn $get_mut(&mut self, namespace: &str, name: &str) -> Option<&mut $ty> {
                match self.resources.get_mut(&TargetKey::new(TargetKind::$variant, namespace, name)) {
                    Some(TargetResource::$variant(object)) => Some(object),
                    _ => None,
                }
            }

            pub fn $all(&self) -> impl Iterator<Item = &$ty> {
                self.resources.values().filter_map(|resource| match resource {
                    TargetResource::$variant(object) => Some(object),
                    _ => None,
                })
            }
        )*
    };
}

impl TargetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the value it replaced.
    pub fn upsert(&mut self, resource: impl Into<TargetResource>) -> Option<TargetResource> {
        let resource = resource.into();
        let key = resource.key();
        let replaced = self.resources.insert(key.clone(), resource);
        if replaced.is_some() {
            debug!(resource = %key, "replaced target resource");
        }
        replaced
    }

    pub fn remove(&mut self, key: &TargetKey) -> Option<TargetResource> {
        self.resources.remove(key)
    }

    pub fn get(&self, key: &TargetKey) -> Option<&TargetResource> {
        self.resources.get(key)
    }

    pub fn contains(&self, key: &TargetKey) -> bool {
        self.resources.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn count(&self, kind: TargetKind) -> usize {
        self.resources.keys().filter(|key| key.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetResource> {
        self.resources.values()
    }

    typed_accessors! {
        Gateway, Gateway, gateway, gateway_mut, gateways;
        ListenerSet, ListenerSet, listener_set, listener_set_mut, listener_sets;
        HttpRoute, HttpRoute, http_route, http_route_mut, http_routes;
        TcpRoute, TcpRoute, tcp_route, tcp_route_mut, tcp_routes;
        Backend, Backend, backend, backend_mut, backends;
        BackendConfigPolicy, BackendConfigPolicy, backend_config_policy, backend_config_policy_mut, backend_config_policies;
        TrafficPolicy, TrafficPolicy, traffic_policy, traffic_policy_mut, traffic_policies;
        HttpListenerPolicy, HttpListenerPolicy, http_listener_policy, http_listener_policy_mut, http_listener_policies;
        GatewayExtension, GatewayExtension, gateway_extension, gateway_extension_mut, gateway_extensions;
        DirectResponse, DirectResponse, direct_response, direct_response_mut, direct_responses;
        Parameter, Parameter, parameter, parameter_mut, parameters;
        AuthConfig, AuthConfig, auth_config, auth_config_mut, auth_configs;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::TargetBuilder;
    use crate::target::route::DirectResponseSpec;
    use crate::target::{Object, TargetKey, TargetKind};

    fn direct(status: u32) -> Object<DirectResponseSpec> {
        Object::new("default", "teapot", DirectResponseSpec { status, body: None })
    }

    #[test]
    fn upsert_replaces_value_under_same_key() {
        let mut builder = TargetBuilder::new();
        assert!(builder.upsert(direct(418)).is_none());
        assert!(builder.upsert(direct(200)).is_some());
        assert_eq!(builder.len(), 1);
        assert_eq!(builder.direct_response("default", "teapot").map(|d| d.spec.status), Some(200));
    }

    #[test]
    fn typed_lookup_checks_kind() {
        let mut builder = TargetBuilder::new();
        builder.upsert(direct(418));
        assert!(builder.http_route("default", "teapot").is_none());
        assert_eq!(builder.count(TargetKind::DirectResponse), 1);
        assert_eq!(builder.count(TargetKind::HttpRoute), 0);
    }

    #[test]
    fn removed_key_is_gone() {
        let mut builder = TargetBuilder::new();
        builder.upsert(direct(418));
        let key = TargetKey::new(TargetKind::DirectResponse, "default", "teapot");
        assert!(builder.remove(&key).is_some());
        assert!(!builder.contains(&key));
        assert!(builder.remove(&key).is_none());
    }

    #[test]
    fn mutable_access_edits_in_place() {
        let mut builder = TargetBuilder::new();
        builder.upsert(direct(418));
        if let Some(object) = builder.direct_response_mut("default", "teapot") {
            object.spec.body = Some("short and stout".to_string());
        }
        let stored = builder.direct_response("default", "teapot").expect("stored");
        assert_eq!(stored.spec.body.as_deref(), Some("short and stout"));
    }
}
