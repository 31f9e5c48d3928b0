//! Reference resolution against the source cache.

use thiserror::Error;

use crate::identity::{ResourceIdentity, SourceKind};
use crate::rules::{BackendLookup, Findings, Mapped};
use crate::source::{
    AuthConfig, ResourceRef, RouteOption, RouteTable, SourceCache, SourceResource, Upstream, VirtualHostOption,
    VirtualService,
};
use crate::target::BackendObjectReference;

/// A reference whose target is not in the source cache. Callers decide how
/// serious that is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{identity} not found")]
pub struct NotFound {
    pub identity: ResourceIdentity,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    cache: &'a SourceCache,
}

macro_rules! typed_resolve {
    ($($variant:ident, $ty:ty, $fn:ident;)*) => {
        $(
            pub fn $fn(&self, reference: &ResourceRef, from_namespace: &str) -> Result<&'a $ty, NotFound> {
                match self.resolve(reference, SourceKind::$variant, from_namespace)? {
                    SourceResource::$variant(resource) => Ok(resource),
                    _ => Err(NotFound {
                        identity: identity_of(reference, SourceKind::$variant, from_namespace),
                    }),
                }
            }
        )*
    };
}

impl<'a> Resolver<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self { cache }
    }

    /// Look up `reference` as a resource of `kind`. An empty namespace on the
    /// reference means `from_namespace`.
    pub fn resolve(
        &self,
        reference: &ResourceRef,
        kind: SourceKind,
        from_namespace: &str,
    ) -> Result<&'a SourceResource, NotFound> {
        let identity = identity_of(reference, kind, from_namespace);
        self.cache.get(&identity).ok_or(NotFound { identity })
    }

    typed_resolve! {
        Upstream, Upstream, upstream;
        VirtualService, VirtualService, virtual_service;
        RouteTable, RouteTable, route_table;
        VirtualHostOption, VirtualHostOption, virtual_host_option;
        RouteOption, RouteOption, route_option;
        AuthConfig, AuthConfig, auth_config;
    }
}

impl BackendLookup for Resolver<'_> {
    fn backend_ref(&self, upstream: &ResourceRef, from_namespace: &str) -> Mapped<BackendObjectReference> {
        match self.upstream(upstream, from_namespace) {
            Ok(found) => Mapped::clean(upstream_backend_ref(found)),
            Err(missing) => {
                let mut findings = Findings::new();
                findings.unknown_reference(missing.to_string());
                let namespace = upstream.namespace_or(from_namespace).to_string();
                Mapped::new(BackendObjectReference::backend(upstream.name.clone(), Some(namespace)), findings)
            }
        }
    }
}

fn identity_of(reference: &ResourceRef, kind: SourceKind, from_namespace: &str) -> ResourceIdentity {
    ResourceIdentity::new(kind, reference.namespace_or(from_namespace), reference.name.clone())
}

/// Kube upstreams are referenced through their Service; everything else
/// through the Backend generated for it.
pub fn upstream_backend_ref(upstream: &Upstream) -> BackendObjectReference {
    match &upstream.spec.kube {
        Some(kube) => {
            let namespace = if kube.service_namespace.is_empty() {
                upstream.namespace()
            } else {
                &kube.service_namespace
            };
            BackendObjectReference::service(
                kube.service_name.clone(),
                Some(namespace.to_string()),
                Some(kube.service_port),
            )
        }
        None => BackendObjectReference::backend(upstream.name().to_string(), Some(upstream.namespace().to_string())),
    }
}

const KUBE_SERVICE_SUFFIX: &str = ".svc.cluster.local";

/// What a proxy cluster name points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterName {
    /// `direction|port|subset|name.namespace.svc.cluster.local`
    KubernetesService { name: String, namespace: String, port: u32 },
    /// `direction|port|subset|host` with a host outside the cluster domain.
    LegacyBackend { host: String, port: u32 },
    /// Any other name; the cluster's own endpoints describe it.
    External { name: String },
}

/// Split a generated cluster name into its parts.
pub fn disambiguate(name: &str) -> ClusterName {
    let parts: Vec<&str> = name.split('|').collect();
    let [_direction, port, _subset, service] = parts.as_slice() else {
        return ClusterName::External { name: name.to_string() };
    };
    let Ok(port) = port.parse::<u32>() else {
        return ClusterName::External { name: name.to_string() };
    };
    if let Some(fqdn) = service.strip_suffix(KUBE_SERVICE_SUFFIX) {
        if let Some((service_name, namespace)) = fqdn.split_once('.') {
            if !service_name.is_empty() && !namespace.is_empty() && !namespace.contains('.') {
                return ClusterName::KubernetesService {
                    name: service_name.to_string(),
                    namespace: namespace.to_string(),
                    port,
                };
            }
        }
    }
    ClusterName::LegacyBackend {
        host: service.to_string(),
        port,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{disambiguate, ClusterName, Resolver};
    use crate::diagnostics::Category;
    use crate::identity::SourceKind;
    use crate::rules::BackendLookup;
    use crate::source::upstream::KubeUpstream;
    use crate::source::{ObjectMeta, Resource, ResourceRef, SourceCache, SourceResource, UpstreamSpec};

    fn cache() -> SourceCache {
        let kube = UpstreamSpec {
            kube: Some(KubeUpstream {
                service_name: "petstore".to_string(),
                service_namespace: "default".to_string(),
                service_port: 8080,
                selector: None,
            }),
            ..UpstreamSpec::default()
        };
        [SourceResource::Upstream(Resource::new(ObjectMeta::new("gloo-system", "default-petstore-8080"), kube))]
            .into_iter()
            .collect()
    }

    #[test]
    fn namespace_defaults_to_the_referencing_resource() {
        let cache = cache();
        let resolver = Resolver::new(&cache);
        let reference = ResourceRef::new("", "default-petstore-8080");
        assert!(resolver.upstream(&reference, "gloo-system").is_ok());
        let missing = resolver.resolve(&reference, SourceKind::Upstream, "default").expect_err("other namespace");
        assert_eq!(missing.to_string(), "Upstream default/default-petstore-8080 not found");
    }

    #[test]
    fn kube_upstreams_resolve_to_their_service() {
        let cache = cache();
        let resolver = Resolver::new(&cache);
        let mapped = resolver.backend_ref(&ResourceRef::new("gloo-system", "default-petstore-8080"), "default");
        assert!(mapped.findings.is_empty());
        assert_eq!(mapped.value.kind, None);
        assert_eq!(mapped.value.name, "petstore");
        assert_eq!(mapped.value.port, Some(8080));
    }

    #[test]
    fn missing_upstream_keeps_the_literal_name() {
        let cache = cache();
        let mapped = Resolver::new(&cache).backend_ref(&ResourceRef::new("", "auth0"), "default");
        assert_eq!(mapped.value.name, "auth0");
        assert_eq!(mapped.value.kind.as_deref(), Some("Backend"));
        assert_eq!(mapped.findings.count(Category::UnknownReference), 1);
    }

    #[test]
    fn cluster_names_split_on_three_delimiters() {
        assert_eq!(
            disambiguate("outbound|8080||petstore.default.svc.cluster.local"),
            ClusterName::KubernetesService {
                name: "petstore".to_string(),
                namespace: "default".to_string(),
                port: 8080
            }
        );
        assert_eq!(
            disambiguate("outbound|443||api.example.com"),
            ClusterName::LegacyBackend {
                host: "api.example.com".to_string(),
                port: 443
            }
        );
        assert_eq!(
            disambiguate("default-petstore-8080_gloo-system"),
            ClusterName::External {
                name: "default-petstore-8080_gloo-system".to_string()
            }
        );
    }
}
