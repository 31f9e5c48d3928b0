//! TCP gateways: listeners per host and SNI domain on the Gateway, and one
//! TCPRoute per host forwarding to its destination.

use crate::context::Context;
use crate::identity::{sanitize_name, ResourceIdentity};
use crate::rules::{BackendLookup, Findings};
use crate::source::gateway::{TcpGateway, TcpHost};
use crate::source::virtual_service::Destination;
use crate::source::Gateway as SourceGateway;
use crate::target::gateway::{AllowedRoutes, GatewayTls, Listener, ListenerNamespaces, RouteGroupKind};
use crate::target::route::{HttpBackendRef, ParentReference, TcpRouteRule};
use crate::target::{Gateway, Object, TargetKind, TcpRouteSpec, GATEWAY_API_GROUP};

use super::gateway::listener_tls;
use super::route::http_backend;

/// Listeners and backends of one TCP host. Listener names are completed
/// with the proxy name when they are attached.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct TcpEntry {
    route_name: String,
    listeners: Vec<Listener>,
    backend_refs: Vec<HttpBackendRef>,
    parent_refs: Vec<ParentReference>,
}

pub(super) fn tcp_entries(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    gateway: &SourceGateway,
    tcp: &TcpGateway,
) -> Vec<TcpEntry> {
    let mut findings = Findings::new();
    findings.overflow("tcpGateway", &tcp.other);
    if tcp.options.is_some() {
        findings.unsupported("tcpGateway.options is not supported");
    }
    ctx.report(identity, findings);

    let port = gateway.spec.bind_port;
    let mut entries = Vec::with_capacity(tcp.tcp_hosts.len());
    for (index, host) in tcp.tcp_hosts.iter().enumerate() {
        let host_name = if host.name.is_empty() { format!("tcp-{index}") } else { host.name.clone() };
        let mut findings = Findings::new();
        findings.overflow(&format!("tcpHost {host_name}"), &host.other);
        ctx.report(identity, findings);

        let backend_refs = tcp_backends(ctx, identity, gateway.namespace(), &host_name, host);
        let listeners = host_listeners(ctx, identity, gateway.namespace(), port, &host_name, host);
        entries.push(TcpEntry {
            route_name: sanitize_name(&format!("{}-{host_name}", gateway.name())),
            listeners,
            backend_refs,
            parent_refs: Vec::new(),
        });
    }
    entries
}

/// One TLS listener per SNI domain, or a single listener when the host
/// matches every connection.
fn host_listeners(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    namespace: &str,
    port: u32,
    host_name: &str,
    host: &TcpHost,
) -> Vec<Listener> {
    let allowed = AllowedRoutes {
        namespaces: ListenerNamespaces::all(),
        kinds: vec![RouteGroupKind {
            kind: TargetKind::TcpRoute.as_str().to_string(),
        }],
    };
    let Some(ssl) = &host.ssl_config else {
        return vec![Listener {
            name: sanitize_name(&format!("{port}-{host_name}")),
            hostname: None,
            port,
            protocol: "TCP".to_string(),
            tls: None,
            allowed_routes: Some(allowed),
        }];
    };

    let tls = if ssl.secret_ref.is_some() {
        listener_tls(ctx, identity, namespace, ssl)
    } else {
        GatewayTls {
            mode: "Passthrough".to_string(),
            certificate_refs: Vec::new(),
        }
    };
    let entry = |name: String, hostname: Option<String>| Listener {
        name,
        hostname,
        port,
        protocol: "TLS".to_string(),
        tls: Some(tls.clone()),
        allowed_routes: Some(allowed.clone()),
    };
    if ssl.sni_domains.is_empty() {
        return vec![entry(sanitize_name(&format!("{port}-{host_name}")), None)];
    }
    ssl.sni_domains
        .iter()
        .map(|sni| entry(sanitize_name(&format!("{port}-{host_name}-{sni}")), Some(sni.clone())))
        .collect()
}

fn tcp_backends(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    namespace: &str,
    host_name: &str,
    host: &TcpHost,
) -> Vec<HttpBackendRef> {
    let Some(action) = &host.destination else {
        ctx.unsupported(identity, format!("tcpHost {host_name} has no destination"));
        return Vec::new();
    };
    let mut findings = Findings::new();
    findings.overflow(&format!("tcpHost {host_name} destination"), &action.other);
    if action.upstream_group.is_some() {
        findings.unsupported(format!("tcpHost {host_name} destination upstreamGroup is not supported"));
    }
    if action.forward_sni_cluster_name.is_some() {
        findings.unsupported(format!("tcpHost {host_name} destination forwardSniClusterName is not supported"));
    }
    ctx.report(identity, findings);

    if let Some(single) = &action.single {
        return tcp_backend(ctx, identity, namespace, host_name, single).into_iter().collect();
    }
    let Some(multi) = &action.multi else {
        return Vec::new();
    };
    multi
        .destinations
        .iter()
        .filter_map(|weighted| {
            if weighted.options.is_some() {
                ctx.unsupported(identity, format!("tcpHost {host_name} destination options are not supported"));
            }
            let mut backend = tcp_backend(ctx, identity, namespace, host_name, &weighted.destination)?;
            backend.weight = weighted.weight;
            Some(backend)
        })
        .collect()
}

fn tcp_backend(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    namespace: &str,
    host_name: &str,
    destination: &Destination,
) -> Option<HttpBackendRef> {
    if destination.subset.is_some() || destination.destination_spec.is_some() {
        ctx.unsupported(
            identity,
            format!("tcpHost {host_name} destination subset and destinationSpec are not supported"),
        );
    }
    if let Some(upstream) = &destination.upstream {
        let resolver = ctx.resolver();
        let backend = ctx.absorb(identity, resolver.backend_ref(upstream, namespace));
        return Some(http_backend(backend));
    }
    if let Some(kube) = &destination.kube {
        return Some(HttpBackendRef {
            name: kube.service.name.clone(),
            namespace: Some(kube.service.namespace_or(namespace).to_string()),
            port: Some(kube.port),
            ..HttpBackendRef::default()
        });
    }
    ctx.unsupported(identity, format!("tcpHost {host_name} destination has neither an upstream nor a kube service"));
    None
}

/// Put the entries' listeners on the proxy Gateway and remember where each
/// route attaches.
pub(super) fn attach(entries: &mut [TcpEntry], proxy: &str, target: &mut Gateway) {
    for entry in entries {
        for listener in &entry.listeners {
            let name = sanitize_name(&format!("{proxy}-{}", listener.name));
            if !target.spec.listeners.iter().any(|l| l.name == name) {
                target.spec.listeners.push(Listener {
                    name: name.clone(),
                    ..listener.clone()
                });
            }
            entry.parent_refs.push(ParentReference {
                group: Some(GATEWAY_API_GROUP.to_string()),
                kind: Some(TargetKind::Gateway.as_str().to_string()),
                name: proxy.to_string(),
                namespace: Some(target.namespace().to_string()),
                section_name: Some(name),
            });
        }
    }
}

pub(super) fn upsert_routes(ctx: &mut Context<'_>, identity: &ResourceIdentity, namespace: &str, entries: Vec<TcpEntry>) {
    for entry in entries {
        if entry.backend_refs.is_empty() {
            continue;
        }
        let spec = TcpRouteSpec {
            parent_refs: entry.parent_refs,
            rules: vec![TcpRouteRule {
                backend_refs: entry.backend_refs,
            }],
        };
        ctx.upsert_from(identity, Object::new(namespace, entry.route_name, spec));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::config::MigrateConfig;
    use crate::context::Context;
    use crate::diagnostics::Category;
    use crate::translate::gateway::translate_gateways;
    use crate::translate::testing::cache;

    #[test]
    fn sni_hosts_get_tls_listeners_and_a_tcp_route() {
        let source = cache(vec![json!({
            "kind": "Gateway",
            "metadata": {"name": "tcp-proxy", "namespace": "gloo-system"},
            "spec": {
                "bindPort": 9443,
                "tcpGateway": {"tcpHosts": [{
                    "name": "postgres",
                    "destination": {"single": {"kube": {"ref": {"name": "pg", "namespace": "db"}, "port": 5432}}},
                    "sslConfig": {
                        "secretRef": {"name": "pg-tls", "namespace": "gloo-system"},
                        "sniDomains": ["pg.example.com", "db.example.com"]
                    }
                }]}
            }
        })]);
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        translate_gateways(&mut ctx);
        let out = ctx.finish();

        let gateway = out.target.gateway("gloo-system", "gateway-proxy").expect("gateway");
        let listeners: Vec<(&str, Option<&str>, &str)> = gateway
            .spec
            .listeners
            .iter()
            .map(|l| (l.name.as_str(), l.hostname.as_deref(), l.protocol.as_str()))
            .collect();
        assert_eq!(
            listeners,
            vec![
                ("gateway-proxy-9443-postgres-pg.example.com", Some("pg.example.com"), "TLS"),
                ("gateway-proxy-9443-postgres-db.example.com", Some("db.example.com"), "TLS"),
            ]
        );
        let allowed = gateway.spec.listeners[0].allowed_routes.as_ref().expect("allowed routes");
        assert_eq!(allowed.kinds[0].kind, "TCPRoute");
        assert_eq!(
            gateway.spec.listeners[0].tls.as_ref().map(|t| t.certificate_refs[0].name.as_str()),
            Some("pg-tls")
        );

        let route = out.target.tcp_route("gloo-system", "tcp-proxy-postgres").expect("tcp route");
        let sections: Vec<Option<&str>> = route.spec.parent_refs.iter().map(|p| p.section_name.as_deref()).collect();
        assert_eq!(
            sections,
            vec![
                Some("gateway-proxy-9443-postgres-pg.example.com"),
                Some("gateway-proxy-9443-postgres-db.example.com"),
            ]
        );
        let backend = &route.spec.rules[0].backend_refs[0];
        assert_eq!((backend.name.as_str(), backend.namespace.as_deref(), backend.port), ("pg", Some("db"), Some(5432)));
        assert_eq!(out.diagnostics.of(Category::Unsupported).count(), 0);
        assert_eq!(out.diagnostics.of(Category::NoReferences).count(), 0);
    }

    #[test]
    fn plain_host_gets_one_tcp_listener() {
        let source = cache(vec![
            json!({
                "kind": "Gateway",
                "metadata": {"name": "tcp-proxy", "namespace": "gloo-system"},
                "spec": {
                    "bindPort": 6379,
                    "tcpGateway": {"tcpHosts": [{
                        "name": "redis",
                        "destination": {"single": {"upstream": {"name": "redis", "namespace": "gloo-system"}}}
                    }]}
                }
            }),
            json!({
                "kind": "Upstream",
                "metadata": {"name": "redis", "namespace": "gloo-system"},
                "spec": {"static": {"hosts": [{"addr": "10.0.0.7", "port": 6379}]}}
            }),
        ]);
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        translate_gateways(&mut ctx);
        let out = ctx.finish();

        let gateway = out.target.gateway("gloo-system", "gateway-proxy").expect("gateway");
        assert_eq!(gateway.spec.listeners.len(), 1);
        assert_eq!(gateway.spec.listeners[0].protocol, "TCP");
        assert!(gateway.spec.listeners[0].hostname.is_none());

        let route = out.target.tcp_route("gloo-system", "tcp-proxy-redis").expect("tcp route");
        let backend = &route.spec.rules[0].backend_refs[0];
        assert_eq!(backend.kind.as_deref(), Some("Backend"));
        assert_eq!(backend.name, "redis");
    }
}
