//! Front end for configuration dumps.
//!
//! A decoded [`WireSnapshot`] is turned back into the source resources that
//! would have produced it: one Gateway per wildcard listener, one
//! VirtualService per virtual host, and an Upstream for every cluster a
//! route sends traffic to that is not a plain Kubernetes service. The result
//! is an ordinary [`SourceCache`] that the translator reads like any other
//! input, plus the findings made while rebuilding it.

mod fields;
mod filters;
mod route;
mod upstream;

use std::collections::BTreeSet;

use envoy_dump_core::listener::{ChainFilter, FilterChain, HttpConnectionManager, TcpProxy, WireListener};
use envoy_dump_core::route::{RouteConfiguration, VirtualHost};
use envoy_dump_core::tls::DownstreamTls;
use envoy_dump_core::WireSnapshot;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::config::MigrateConfig;
use crate::diagnostics::{Category, Recorder};
use crate::identity::{sanitize_name, ResourceIdentity, SourceKind};
use crate::source::{Provenance, SourceCache, SourceResource};

use fields::Fields;

/// Rebuild source resources from a snapshot.
pub fn decompile(snapshot: &WireSnapshot, config: &MigrateConfig) -> (SourceCache, Recorder) {
    let mut decompiler = Decompiler::new(snapshot, &config.decompile.namespace);
    decompiler.decode_notes();
    for listener in &snapshot.listeners {
        decompiler.listener(listener);
    }
    decompiler.finish()
}

struct Document {
    kind: &'static str,
    origin: String,
    body: Value,
}

pub(crate) struct Decompiler<'a> {
    snapshot: &'a WireSnapshot,
    namespace: &'a str,
    documents: Vec<Document>,
    names: BTreeSet<(&'static str, String)>,
    diagnostics: Recorder,
}

impl<'a> Decompiler<'a> {
    fn new(snapshot: &'a WireSnapshot, namespace: &'a str) -> Self {
        Self {
            snapshot,
            namespace,
            documents: Vec::new(),
            names: BTreeSet::new(),
            diagnostics: Recorder::new(),
        }
    }

    fn record(&mut self, category: Category, source: &ResourceIdentity, message: impl Into<String>) {
        self.diagnostics.record(category, source, message);
    }

    pub(crate) fn unsupported(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::Unsupported, source, message);
    }

    pub(crate) fn ignored(&mut self, source: &ResourceIdentity, message: impl Into<String>) {
        self.record(Category::Ignored, source, message);
    }

    /// Report the keys of a wire block that nothing read, once per block.
    pub(crate) fn leftover(&mut self, source: &ResourceIdentity, path: &str, other: &Map<String, Value>) {
        if let Some(message) = Fields::new(other).leftover_message(path) {
            self.unsupported(source, message);
        }
    }

    /// Claim a name for a new document, suffixing on collision.
    fn claim_name(&mut self, kind: &'static str, base: &str, suffix: &str) -> String {
        let mut name = sanitize_name(base);
        if self.names.contains(&(kind, name.clone())) {
            name = sanitize_name(&format!("{base}-{suffix}"));
        }
        let mut n = 2;
        while self.names.contains(&(kind, name.clone())) {
            name = sanitize_name(&format!("{base}-{suffix}-{n}"));
            n += 1;
        }
        self.names.insert((kind, name.clone()));
        name
    }

    fn push(&mut self, kind: &'static str, name: &str, origin: String, spec: Value) {
        self.names.insert((kind, name.to_string()));
        self.documents.push(Document {
            kind,
            origin,
            body: json!({
                "kind": kind,
                "metadata": {"name": name, "namespace": self.namespace},
                "spec": spec,
            }),
        });
    }

    fn decode_notes(&mut self) {
        for note in &self.snapshot.notes {
            let identity = ResourceIdentity::wire(SourceKind::WireListener, note_owner(&note.location));
            self.diagnostics.record(
                Category::Unsupported,
                &identity,
                format!("{}: {}", note.location, note.message),
            );
        }
    }

    fn listener(&mut self, listener: &WireListener) {
        let wire = ResourceIdentity::wire(SourceKind::WireListener, listener.name.clone());
        if !listener.is_wildcard() {
            self.ignored(
                &wire,
                format!(
                    "listener bound to {}:{} is not on a wildcard address",
                    listener.address, listener.port
                ),
            );
            return;
        }

        let mut plain = Vec::new();
        let mut secure = Vec::new();
        let mut tcp = Vec::new();
        for (index, chain) in listener.filter_chains.iter().enumerate() {
            let tls = chain.transport_socket.as_ref().and_then(|socket| socket.downstream_tls());
            for filter in &chain.filters {
                match filter {
                    ChainFilter::ConnectionManager(hcm) => {
                        let refs = self.connection_manager(&wire, listener, chain, tls.as_ref(), hcm);
                        if tls.is_some() {
                            secure.extend(refs);
                        } else {
                            plain.extend(refs);
                        }
                    }
                    ChainFilter::TcpProxy(proxy) => {
                        if let Some(host) = self.tcp_host(&wire, index, chain, tls.as_ref(), proxy) {
                            tcp.push(host);
                        }
                    }
                    ChainFilter::Other(other) => {
                        self.ignored(&wire, format!("network filter {} is not migrated", other.name));
                    }
                }
            }
        }

        if plain.is_empty() && secure.is_empty() && tcp.is_empty() {
            self.ignored(&wire, "listener serves no HTTP virtual hosts or TCP hosts");
            return;
        }
        let proxy = format!("ingress-{}", listener.port);
        let origin = format!("listener {}", listener.name);
        if !plain.is_empty() {
            let name = self.claim_name("Gateway", &proxy, "http");
            let body = ("httpGateway", json!({"virtualServices": plain}));
            self.push("Gateway", &name, origin.clone(), gateway_spec(listener, &proxy, false, body));
        }
        if !secure.is_empty() {
            let name = self.claim_name("Gateway", &proxy, "tls");
            let body = ("httpGateway", json!({"virtualServices": secure}));
            self.push("Gateway", &name, origin.clone(), gateway_spec(listener, &proxy, true, body));
        }
        if !tcp.is_empty() {
            let name = self.claim_name("Gateway", &proxy, "tcp");
            let body = ("tcpGateway", json!({"tcpHosts": tcp}));
            self.push("Gateway", &name, origin, gateway_spec(listener, &proxy, false, body));
        }
        debug!(listener = %listener.name, "listener decompiled");
    }

    /// A TCP host forwarding the chain to its cluster. SNI names and the
    /// certificate of a TLS chain go into the host's `sslConfig`.
    fn tcp_host(
        &mut self,
        wire: &ResourceIdentity,
        index: usize,
        chain: &FilterChain,
        tls: Option<&DownstreamTls>,
        proxy: &TcpProxy,
    ) -> Option<Value> {
        let Some(cluster) = proxy.cluster.as_deref() else {
            self.unsupported(wire, format!("filter chain {index} proxies TCP without a single cluster"));
            return None;
        };
        let base = if proxy.stat_prefix.is_empty() { format!("tcp-{index}") } else { proxy.stat_prefix.clone() };
        let mut host = Map::new();
        host.insert("name".into(), json!(sanitize_name(&base)));
        host.insert("destination".into(), json!({"single": self.destination(cluster)}));
        match tls {
            Some(tls) => {
                host.insert("sslConfig".into(), self.ssl_config(wire, chain, tls));
            }
            None if !chain.server_names.is_empty() => {
                host.insert("sslConfig".into(), json!({"sniDomains": chain.server_names}));
            }
            None => {}
        }
        Some(Value::Object(host))
    }

    /// Returns references to the virtual services built for the manager.
    fn connection_manager(
        &mut self,
        wire: &ResourceIdentity,
        listener: &WireListener,
        chain: &FilterChain,
        tls: Option<&DownstreamTls>,
        hcm: &HttpConnectionManager,
    ) -> Vec<Value> {
        let snapshot = self.snapshot;
        let route_config: &RouteConfiguration = match (&hcm.route_config, &hcm.rds) {
            (Some(inline), _) => inline,
            (None, Some(name)) => match snapshot.route_config(name) {
                Some(found) => found,
                None => {
                    self.record(
                        Category::UnknownReference,
                        wire,
                        format!("route configuration {name} is not in the snapshot"),
                    );
                    return Vec::new();
                }
            },
            (None, None) => {
                self.ignored(wire, format!("connection manager {} has no routes", hcm.stat_prefix));
                return Vec::new();
            }
        };

        route_config
            .virtual_hosts
            .iter()
            .map(|vhost| self.virtual_host(listener, chain, tls, hcm, vhost))
            .collect()
    }

    fn virtual_host(
        &mut self,
        listener: &WireListener,
        chain: &FilterChain,
        tls: Option<&DownstreamTls>,
        hcm: &HttpConnectionManager,
        vhost: &VirtualHost,
    ) -> Value {
        let base = if vhost.name.is_empty() { "virtual-host" } else { vhost.name.as_str() };
        let name = self.claim_name("VirtualService", base, &listener.port.to_string());
        let owner = ResourceIdentity::new(SourceKind::VirtualService, self.namespace, name.clone());

        let routes: Vec<Value> = vhost
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| self.route(&owner, hcm, index, route))
            .collect();
        let options = self.filter_options(&owner, hcm, &vhost.typed_per_filter_config, filters::Scope::VirtualHost);
        self.leftover(&owner, &format!("virtual host {}", vhost.name), &vhost.other);

        let mut host = Map::new();
        host.insert("domains".into(), json!(vhost.domains));
        host.insert("routes".into(), Value::Array(routes));
        if !options.is_empty() {
            host.insert("options".into(), Value::Object(options));
        }
        let mut spec = Map::new();
        spec.insert("virtualHost".into(), Value::Object(host));
        if let Some(tls) = tls {
            spec.insert("sslConfig".into(), self.ssl_config(&owner, chain, tls));
        }

        self.push(
            "VirtualService",
            &name,
            format!("listener {} virtual host {}", listener.name, vhost.name),
            Value::Object(spec),
        );
        json!({"name": name, "namespace": self.namespace})
    }

    fn ssl_config(&mut self, owner: &ResourceIdentity, chain: &FilterChain, tls: &DownstreamTls) -> Value {
        let mut ssl = Map::new();
        match tls.certificate_secrets.as_slice() {
            [] => self.unsupported(owner, "TLS filter chain has no SDS certificate, add a secretRef"),
            [first, rest @ ..] => {
                ssl.insert("secretRef".into(), json!({"name": first, "namespace": self.namespace}));
                if !rest.is_empty() {
                    self.unsupported(
                        owner,
                        format!("TLS filter chain has {} certificates, only {first} is kept", rest.len() + 1),
                    );
                }
            }
        }
        if !chain.server_names.is_empty() {
            ssl.insert("sniDomains".into(), json!(chain.server_names));
        }
        Value::Object(ssl)
    }

    fn finish(self) -> (SourceCache, Recorder) {
        let mut diagnostics = self.diagnostics;
        let mut resources = Vec::with_capacity(self.documents.len());
        for document in self.documents {
            match SourceResource::from_document(document.kind, document.body) {
                Ok(Some(mut resource)) => {
                    resource.set_provenance(Provenance::Snapshot(document.origin));
                    resources.push(resource);
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(kind = document.kind, error = %err, "decompiled document does not decode");
                    let identity = ResourceIdentity::wire(SourceKind::WireListener, document.origin);
                    diagnostics.record(
                        Category::Unsupported,
                        &identity,
                        format!("rebuilt {} does not decode: {err}", document.kind),
                    );
                }
            }
        }
        info!(
            resources = resources.len(),
            diagnostics = diagnostics.len(),
            "snapshot decompiled"
        );
        (resources.into_iter().collect(), diagnostics)
    }
}

/// `body` is the gateway type key with its content.
fn gateway_spec(listener: &WireListener, proxy: &str, ssl: bool, body: (&str, Value)) -> Value {
    let (key, content) = body;
    let mut spec = Map::new();
    spec.insert("bindAddress".into(), json!(listener.address));
    spec.insert("bindPort".into(), json!(listener.port));
    spec.insert("proxyNames".into(), json!([proxy]));
    spec.insert("ssl".into(), json!(ssl));
    spec.insert(key.into(), content);
    Value::Object(spec)
}

/// The first segment of a note location names the record it came from.
fn note_owner(location: &str) -> &str {
    location.split('/').next().unwrap_or(location)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::decompile;
    use crate::config::MigrateConfig;
    use crate::diagnostics::Category;
    use crate::identity::SourceKind;
    use crate::source::{Provenance, SourceResource};
    use crate::target::TargetKind;
    use crate::translate::translate_with;

    fn snapshot(listeners: Value, routes: Value, clusters: Value) -> envoy_dump_core::WireSnapshot {
        let dump = json!({
            "configs": [
                {"@type": "type.googleapis.com/envoy.admin.v3.ListenersConfigDump", "dynamic_listeners": listeners},
                {"@type": "type.googleapis.com/envoy.admin.v3.RoutesConfigDump", "dynamic_route_configs": routes},
                {"@type": "type.googleapis.com/envoy.admin.v3.ClustersConfigDump", "dynamic_active_clusters": clusters}
            ]
        });
        envoy_dump_core::decode(dump.to_string().as_bytes()).expect("dump decodes")
    }

    fn http_listener(address: &str, port: u32, rds: &str) -> Value {
        json!({
            "name": format!("listener-{port}"),
            "active_state": {"listener": {
                "name": format!("listener-{port}"),
                "address": {"socket_address": {"address": address, "port_value": port}},
                "filter_chains": [{
                    "filters": [{
                        "name": "envoy.filters.network.http_connection_manager",
                        "typed_config": {
                            "@type": "type.googleapis.com/envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager",
                            "stat_prefix": "http",
                            "rds": {"route_config_name": rds},
                            "http_filters": [{
                                "name": "envoy.filters.http.router",
                                "typed_config": {"@type": "type.googleapis.com/envoy.extensions.filters.http.router.v3.Router"}
                            }]
                        }
                    }]
                }]
            }}
        })
    }

    fn route_config(name: &str, routes: Value) -> Value {
        json!({"route_config": {
            "name": name,
            "virtual_hosts": [{"name": "gloo-system_shop", "domains": ["shop.example.com"], "routes": routes}]
        }})
    }

    #[test]
    fn unknown_rate_limit_action_yields_one_finding() {
        let snapshot = snapshot(
            json!([http_listener("0.0.0.0", 8080, "listener-8080-routes")]),
            json!([route_config("listener-8080-routes", json!([{
                "match": {"prefix": "/"},
                "route": {"cluster": "outbound|8080||shop.apps.svc.cluster.local"},
                "typed_per_filter_config": {
                    "envoy.filters.http.ratelimit": {
                        "@type": "type.googleapis.com/envoy.extensions.filters.http.ratelimit.v3.RateLimitPerRoute",
                        "rate_limits": [{"actions": [
                            {"generic_key": {"descriptor_value": "per-route"}},
                            {"masked_remote_address": {"v4_prefix_mask_len": 16}}
                        ]}]
                    }
                }
            }]))]),
            json!([]),
        );
        let config = MigrateConfig::default();
        let (source, ledger) = decompile(&snapshot, &config);
        assert!(ledger.is_empty());
        let out = translate_with(&source, &config, ledger);

        assert_eq!(out.target.count(TargetKind::HttpRoute), 1);
        assert_eq!(out.target.count(TargetKind::TrafficPolicy), 1);
        let unsupported: Vec<&str> = out
            .diagnostics
            .of(Category::Unsupported)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(unsupported, vec!["rateLimit action maskedRemoteAddress is not supported"]);
    }

    #[test]
    fn kubernetes_cluster_becomes_kube_destination() {
        let snapshot = snapshot(
            json!([http_listener("::", 8443, "routes")]),
            json!([route_config("routes", json!([{
                "match": {"path": "/healthz"},
                "route": {"cluster": "outbound|9080||reviews.bookinfo.svc.cluster.local", "timeout": "15s"}
            }]))]),
            json!([]),
        );
        let config = MigrateConfig::default();
        let (source, ledger) = decompile(&snapshot, &config);
        assert!(ledger.is_empty());

        let vs = source.virtual_services().next().expect("virtual service");
        assert_eq!(vs.name(), "gloo-system-shop");
        assert_eq!(vs.namespace(), config.decompile.namespace);
        assert!(matches!(vs.provenance, Provenance::Snapshot(_)));
        let route = &vs.spec.virtual_host.routes[0];
        assert_eq!(route.matchers[0].exact.as_deref(), Some("/healthz"));
        let kube = route
            .route_action
            .as_ref()
            .and_then(|a| a.single.as_ref())
            .and_then(|d| d.kube.as_ref())
            .expect("kube destination");
        assert_eq!(kube.service.name, "reviews");
        assert_eq!(kube.service.namespace, "bookinfo");
        assert_eq!(kube.port, 9080);
        assert_eq!(
            route.options.as_ref().and_then(|o| o.timeout.as_deref()),
            Some("15s")
        );

        let gateway = source.gateways().next().expect("gateway");
        assert_eq!(gateway.name(), "ingress-8443");
        assert_eq!(gateway.spec.bind_port, 8443);
        assert_eq!(source.count(SourceKind::Upstream), 0);
    }

    #[test]
    fn pinned_listener_and_missing_routes_are_reported() {
        let snapshot = snapshot(
            json!([
                http_listener("127.0.0.1", 19000, "admin"),
                http_listener("0.0.0.0", 8080, "absent")
            ]),
            json!([]),
            json!([]),
        );
        let (source, ledger) = decompile(&snapshot, &MigrateConfig::default());
        assert_eq!(source.len(), 0);
        assert_eq!(ledger.of(Category::Ignored).count(), 2);
        let missing: Vec<&str> = ledger
            .of(Category::UnknownReference)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(missing, vec!["route configuration absent is not in the snapshot"]);
        assert!(source.gateways().next().is_none());
        assert!(SourceResource::from_document("Listener", json!({})).expect("skips").is_none());
    }
    fn shop_route(route: Value) -> envoy_dump_core::WireSnapshot {
        snapshot(
            json!([http_listener("0.0.0.0", 8080, "routes")]),
            json!([route_config("routes", json!([route]))]),
            json!([]),
        )
    }

    fn unsupported(ledger: &crate::diagnostics::Recorder) -> Vec<&str> {
        ledger.of(Category::Unsupported).map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn deny_rbac_is_dropped_not_inverted() {
        let snapshot = shop_route(json!({
            "match": {"prefix": "/admin"},
            "route": {"cluster": "outbound|8080||shop.apps.svc.cluster.local"},
            "typed_per_filter_config": {
                "envoy.filters.http.rbac": {
                    "@type": "type.googleapis.com/envoy.extensions.filters.http.rbac.v3.RBACPerRoute",
                    "rbac": {"rules": {
                        "action": "DENY",
                        "policies": {"block-admin": {
                            "principals": [{"any": true}],
                            "permissions": [{"any": true}]
                        }}
                    }}
                }
            }
        }));
        let (source, ledger) = decompile(&snapshot, &MigrateConfig::default());

        let vs = source.virtual_services().next().expect("virtual service");
        let options = vs.spec.virtual_host.routes[0].options.as_ref();
        assert!(options.and_then(|o| o.policy.rbac.as_ref()).is_none());
        assert_eq!(
            unsupported(&ledger),
            vec!["envoy.filters.http.rbac rbac action DENY is not supported, the config is not migrated"]
        );
    }

    #[test]
    fn empty_rbac_per_route_disables_the_filter() {
        let snapshot = shop_route(json!({
            "match": {"prefix": "/public"},
            "route": {"cluster": "outbound|8080||shop.apps.svc.cluster.local"},
            "typed_per_filter_config": {
                "envoy.filters.http.rbac": {
                    "@type": "type.googleapis.com/envoy.extensions.filters.http.rbac.v3.RBACPerRoute"
                }
            }
        }));
        let (source, ledger) = decompile(&snapshot, &MigrateConfig::default());
        assert!(ledger.is_empty());

        let vs = source.virtual_services().next().expect("virtual service");
        let rbac = vs.spec.virtual_host.routes[0]
            .options
            .as_ref()
            .and_then(|o| o.policy.rbac.as_ref())
            .expect("rbac option");
        assert!(rbac.disable);
        assert!(rbac.policies.is_empty());
    }

    #[test]
    fn rbac_policy_with_condition_is_left_out() {
        let snapshot = shop_route(json!({
            "match": {"prefix": "/"},
            "route": {"cluster": "outbound|8080||shop.apps.svc.cluster.local"},
            "typed_per_filter_config": {
                "envoy.filters.http.rbac": {
                    "@type": "type.googleapis.com/envoy.extensions.filters.http.rbac.v3.RBACPerRoute",
                    "rbac": {"rules": {
                        "action": "ALLOW",
                        "policies": {"gated": {
                            "principals": [],
                            "permissions": [{"url_path": {"path": {"prefix": "/"}}}],
                            "condition": {"call_expr": {"function": "_==_"}}
                        }}
                    }}
                }
            }
        }));
        let (source, ledger) = decompile(&snapshot, &MigrateConfig::default());

        let vs = source.virtual_services().next().expect("virtual service");
        let rbac = vs.spec.virtual_host.routes[0]
            .options
            .as_ref()
            .and_then(|o| o.policy.rbac.as_ref())
            .expect("rbac kept");
        assert_eq!(rbac.policies.len(), 0);
        assert_eq!(
            unsupported(&ledger),
            vec![
                "envoy.filters.http.rbac rbac policy gated fields condition are not supported, the policy is not migrated"
            ]
        );
    }

    #[test]
    fn jwt_requires_all_is_not_widened() {
        let mut listener = http_listener("0.0.0.0", 8080, "routes");
        let filters = listener
            .pointer_mut("/active_state/listener/filter_chains/0/filters/0/typed_config/http_filters")
            .and_then(Value::as_array_mut)
            .expect("http filters");
        filters.insert(
            0,
            json!({
                "name": "io.solo.filters.http.solo_jwt_authn_staged",
                "typed_config": {
                    "@type": "type.googleapis.com/envoy.config.filter.http.solo_jwt_authn.v2.JwtWithStage",
                    "stage": 0,
                    "jwt_authn": {
                        "providers": {
                            "issuer-a": {"issuer": "https://a.example.com"},
                            "issuer-b": {"issuer": "https://b.example.com"}
                        },
                        "requirement_map": {"both": {"requires_all": {"requirements": [
                            {"provider_name": "issuer-a"},
                            {"provider_name": "issuer-b"}
                        ]}}}
                    }
                }
            }),
        );
        let snapshot = snapshot(
            json!([listener]),
            json!([route_config("routes", json!([{
                "match": {"prefix": "/"},
                "route": {"cluster": "outbound|8080||shop.apps.svc.cluster.local"},
                "typed_per_filter_config": {
                    "io.solo.filters.http.solo_jwt_authn_staged": {
                        "@type": "type.googleapis.com/envoy.config.filter.http.solo_jwt_authn.v2.StagedJwtAuthnPerRoute",
                        "jwt_configs": {"0": {"requirement": "both"}}
                    }
                }
            }]))]),
            json!([]),
        );
        let (source, ledger) = decompile(&snapshot, &MigrateConfig::default());

        let vs = source.virtual_services().next().expect("virtual service");
        let options = vs.spec.virtual_host.routes[0].options.as_ref();
        assert!(options.and_then(|o| o.jwt_providers_staged.as_ref()).is_none());
        assert_eq!(
            unsupported(&ledger),
            vec![
                "io.solo.filters.http.solo_jwt_authn_staged requirement both uses requires_all, the JWT config is not migrated"
            ]
        );
    }

    #[test]
    fn unread_route_fields_are_reported() {
        let snapshot = shop_route(json!({
            "match": {"prefix": "/", "runtime_fraction": {"default_value": {"numerator": 50}}},
            "route": {
                "cluster": "outbound|8080||shop.apps.svc.cluster.local",
                "hash_policy": [{"header": {"header_name": "x-user"}}]
            }
        }));
        let (_, ledger) = decompile(&snapshot, &MigrateConfig::default());
        assert_eq!(
            unsupported(&ledger),
            vec![
                "route routes[0] match fields runtime_fraction are not supported",
                "route routes[0] action fields hash_policy are not supported",
            ]
        );
    }

    #[test]
    fn static_tls_cluster_translates_without_findings() {
        let snapshot = snapshot(
            json!([http_listener("0.0.0.0", 8080, "routes")]),
            json!([route_config("routes", json!([{
                "match": {"prefix": "/partner"},
                "route": {"cluster": "outbound|443||api.partner.io"}
            }]))]),
            json!([{"cluster": {
                "name": "outbound|443||api.partner.io",
                "type": "STRICT_DNS",
                "load_assignment": {"endpoints": [{"lb_endpoints": [
                    {"endpoint": {"address": {"socket_address": {"address": "api.partner.io", "port_value": 443}}}}
                ]}]},
                "transport_socket": {
                    "name": "envoy.transport_sockets.tls",
                    "typed_config": {
                        "@type": "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.UpstreamTlsContext",
                        "sni": "api.partner.io"
                    }
                }
            }}]),
        );
        let config = MigrateConfig::default();
        let (source, ledger) = decompile(&snapshot, &config);
        assert!(ledger.is_empty());
        let upstream = source.upstreams().next().expect("upstream");
        assert_eq!(upstream.name(), "api.partner.io-443");

        let out = translate_with(&source, &config, ledger);
        assert_eq!(out.diagnostics.of(Category::Unsupported).count(), 0);
        assert_eq!(out.diagnostics.of(Category::UpdateRequired).count(), 0);
        assert_eq!(out.target.count(TargetKind::BackendConfigPolicy), 1);
    }

    #[test]
    fn fault_filter_becomes_fault_options() {
        let snapshot = shop_route(json!({
            "match": {"prefix": "/"},
            "route": {"cluster": "outbound|8080||shop.apps.svc.cluster.local"},
            "typed_per_filter_config": {
                "envoy.filters.http.fault": {
                    "@type": "type.googleapis.com/envoy.extensions.filters.http.fault.v3.HTTPFault",
                    "abort": {"http_status": 503, "percentage": {"numerator": 250000, "denominator": "MILLION"}}
                }
            }
        }));
        let config = MigrateConfig::default();
        let (source, ledger) = decompile(&snapshot, &config);
        assert!(ledger.is_empty());

        let vs = source.virtual_services().next().expect("virtual service");
        let faults = vs.spec.virtual_host.routes[0]
            .options
            .as_ref()
            .and_then(|o| o.policy.other.get("faults"))
            .expect("faults option");
        assert_eq!(faults, &json!({"abort": {"percentage": 25, "httpStatus": 503}}));

        let out = translate_with(&source, &config, ledger);
        let unsupported: Vec<&str> = out
            .diagnostics
            .of(Category::Unsupported)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(unsupported, vec!["routeOptions.faults is not supported"]);
    }

    #[test]
    fn tcp_proxy_chain_becomes_tcp_gateway_and_route() {
        let listener = json!({
            "name": "listener-5432",
            "active_state": {"listener": {
                "name": "listener-5432",
                "address": {"socket_address": {"address": "0.0.0.0", "port_value": 5432}},
                "filter_chains": [{
                    "filters": [{
                        "name": "envoy.filters.network.tcp_proxy",
                        "typed_config": {
                            "@type": "type.googleapis.com/envoy.extensions.filters.network.tcp_proxy.v3.TcpProxy",
                            "stat_prefix": "postgres",
                            "cluster": "outbound|5432||pg.db.svc.cluster.local"
                        }
                    }]
                }]
            }}
        });
        let snapshot = snapshot(json!([listener]), json!([]), json!([]));
        let config = MigrateConfig::default();
        let (source, ledger) = decompile(&snapshot, &config);
        assert!(ledger.is_empty());

        let gateway = source.gateways().next().expect("gateway");
        assert_eq!(gateway.name(), "ingress-5432");
        let hosts = &gateway.spec.tcp_gateway.as_ref().expect("tcp gateway").tcp_hosts;
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "postgres");

        let out = translate_with(&source, &config, ledger);
        let route = out
            .target
            .tcp_route(&config.decompile.namespace, "ingress-5432-postgres")
            .expect("tcp route");
        let backend = &route.spec.rules[0].backend_refs[0];
        assert_eq!((backend.name.as_str(), backend.port), ("pg", Some(5432)));
        assert_eq!(out.diagnostics.of(Category::Unsupported).count(), 0);
    }
}
