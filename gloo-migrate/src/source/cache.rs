//! Source cache: every loaded document keyed by identity.

use std::collections::BTreeMap;

use crate::identity::{ResourceIdentity, SourceKind};

use super::{
    AuthConfig, Gateway, HttpListenerOption, ListenerOption, RouteOption, RouteTable, Settings, SourceResource,
    Upstream, VirtualHostOption, VirtualService,
};

/// All source documents for one run.
///
/// Populated once by a front end and then only read; iteration is in
/// identity order so every run visits resources identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceCache {
    resources: BTreeMap<ResourceIdentity, SourceResource>,
}

macro_rules! typed_accessors {
    ($($variant:ident, $ty:ty, $get:ident, $all:ident;)*) => {
        $(
            pub fn $get(&self, namespace: &str, name: &str) -> Option<&$ty> {
                match self.resources.get(&ResourceIdentity::new(SourceKind::$variant, namespace, name)) {
                    Some(SourceResource::$variant(resource)) => Some(resource),
                    _ => None,
                }
            }

            pub fn $all(&self) -> impl Iterator<Item = &$ty> {
                self.resources.values().filter_map(|resource| match resource {
                    SourceResource::$variant(resource) => Some(resource),
                    _ => None,
                })
            }
        )*
    };
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resource, returning the one it replaced under the same identity.
    pub fn insert(&mut self, resource: SourceResource) -> Option<SourceResource> {
        self.resources.insert(resource.identity(), resource)
    }

    pub fn get(&self, identity: &ResourceIdentity) -> Option<&SourceResource> {
        self.resources.get(identity)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn count(&self, kind: SourceKind) -> usize {
        self.resources.keys().filter(|id| id.kind == kind).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceResource> {
        self.resources.values()
    }

    typed_accessors! {
        Gateway, Gateway, gateway, gateways;
        VirtualService, VirtualService, virtual_service, virtual_services;
        RouteTable, RouteTable, route_table, route_tables;
        Upstream, Upstream, upstream, upstreams;
        VirtualHostOption, VirtualHostOption, virtual_host_option, virtual_host_options;
        RouteOption, RouteOption, route_option, route_options;
        ListenerOption, ListenerOption, listener_option, listener_options;
        HttpListenerOption, HttpListenerOption, http_listener_option, http_listener_options;
        AuthConfig, AuthConfig, auth_config, auth_configs;
        Settings, Settings, settings, all_settings;
    }
}

impl FromIterator<SourceResource> for SourceCache {
    fn from_iter<I: IntoIterator<Item = SourceResource>>(iter: I) -> Self {
        let mut cache = Self::new();
        for resource in iter {
            cache.insert(resource);
        }
        cache
    }
}
