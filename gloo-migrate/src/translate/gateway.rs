//! Gateways: one target Gateway per proxy, listeners per selected virtual
//! service or TCP host, and the listener-level policies.

use std::collections::BTreeMap;

use tracing::debug;

use crate::context::Context;
use crate::identity::{sanitize_name, ResourceIdentity, SourceKind};
use crate::rules::{access_log, cors, pascal_case, rate_limit, trace, BackendLookup, Findings};
use crate::source::gateway::HttpGateway;
use crate::source::listener::{HttpConnectionManagerSettings, UpgradeToggle};
use crate::source::upstream::SslConfig;
use crate::source::{Gateway as SourceGateway, HttpListenerOptions, ListenerOptions, VirtualService};
use crate::target::gateway::{
    AllowedListeners, AllowedRoutes, GatewayTls, Listener, ListenerNamespaces, ParentGatewayReference,
    SecretObjectReference,
};
use crate::target::policy::{Buffer, ListenerHealthCheck, UpgradeConfig};
use crate::target::route::ParentReference;
use crate::target::{
    GatewaySpec, HttpListenerPolicySpec, ListenerSetSpec, Object, PolicyTargetRef, TargetKind, TrafficPolicySpec,
    GATEWAY_API_GROUP, GATEWAY_API_X_GROUP,
};

use super::settings::{ext_auth_extension, ext_proc_extension, rate_limit_extension};
use super::{identity_of, tcp};

/// Annotation carrying the listener buffer limit, which has no Gateway field.
pub const BUFFER_LIMIT_ANNOTATION: &str = "kgateway.dev/per-connection-buffer-limit-bytes";

const PLACEHOLDER_LISTENER: &str = "dummy";
const PLACEHOLDER_PORT: u32 = 8123;

/// Where the route of a virtual service attaches, and what its virtual host
/// policies target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub parent_ref: ParentReference,
    pub policy_target: PolicyTargetRef,
}

/// Attachments of every selected virtual service.
pub type Attachments = BTreeMap<ResourceIdentity, Vec<Attachment>>;

pub fn translate_gateways(ctx: &mut Context<'_>) -> Attachments {
    let source = ctx.source;
    let mut attachments = Attachments::new();
    for gateway in source.gateways() {
        translate_gateway(ctx, gateway, &mut attachments);
    }
    attachments
}

fn translate_gateway(ctx: &mut Context<'_>, gateway: &SourceGateway, attachments: &mut Attachments) {
    let identity = identity_of(SourceKind::Gateway, gateway);
    let namespace = gateway.namespace();
    let spec = &gateway.spec;
    let config = ctx.config;
    let proxies = spec.proxy_names_or(&config.default_proxy_name);

    let mut findings = Findings::new();
    findings.overflow("gateway", &spec.other);
    if spec.hybrid_gateway.is_some() {
        findings.unsupported("hybridGateway is not supported");
    }
    ctx.report(&identity, findings);

    let http = match (&spec.http_gateway, spec.tcp_gateway.is_some() || spec.hybrid_gateway.is_some()) {
        (Some(http), _) => Some(http.clone()),
        (None, false) => Some(HttpGateway::default()),
        (None, true) => None,
    };
    let selected = match &http {
        Some(http) => select_virtual_services(ctx, &identity, gateway, http),
        None => Vec::new(),
    };
    let mut tcp_entries = match &spec.tcp_gateway {
        Some(tcp) => tcp::tcp_entries(ctx, &identity, gateway, tcp),
        None => Vec::new(),
    };
    if selected.is_empty() && spec.tcp_gateway.is_none() {
        ctx.no_references(&identity, "gateway does not contain virtual services");
    }

    let mut listeners = Vec::new();
    for vs in &selected {
        let vs_identity = identity_of(SourceKind::VirtualService, *vs);
        let entries = virtual_service_listeners(ctx, &vs_identity, vs, spec.bind_port);
        listeners.push((vs_identity, *vs, entries));
    }

    for proxy in &proxies {
        let mut target = ctx
            .target
            .gateway(namespace, proxy)
            .cloned()
            .unwrap_or_else(|| Object::new(namespace, proxy.clone(), GatewaySpec::default()));
        target.spec.gateway_class_name = config.gateway_class_name.clone();
        target.metadata.labels.extend(gateway.metadata.labels.clone());
        if let Some(limit) = spec.options.as_ref().and_then(|o| o.per_connection_buffer_limit_bytes) {
            target
                .metadata
                .annotations
                .insert(BUFFER_LIMIT_ANNOTATION.to_string(), limit.to_string());
        }

        for (vs_identity, vs, entries) in &listeners {
            let listener_name = sanitize_name(&format!(
                "{proxy}-{}-{}-{}",
                spec.bind_port,
                vs.name(),
                vs.namespace()
            ));
            let attachment = if config.use_listener_sets {
                let set = ListenerSetSpec {
                    parent_ref: ParentGatewayReference {
                        group: GATEWAY_API_GROUP.to_string(),
                        kind: TargetKind::Gateway.as_str().to_string(),
                        name: proxy.clone(),
                        namespace: Some(namespace.to_string()),
                    },
                    listeners: entries.clone(),
                };
                ctx.upsert_from(vs_identity, Object::new(vs.namespace(), listener_name.clone(), set));
                Attachment {
                    parent_ref: ParentReference {
                        group: Some(GATEWAY_API_X_GROUP.to_string()),
                        kind: Some(TargetKind::ListenerSet.as_str().to_string()),
                        name: listener_name.clone(),
                        namespace: Some(vs.namespace().to_string()),
                        section_name: None,
                    },
                    policy_target: PolicyTargetRef::of(TargetKind::ListenerSet, listener_name.clone()),
                }
            } else {
                for entry in entries {
                    if !target.spec.listeners.iter().any(|l| l.name == entry.name) {
                        target.spec.listeners.push(entry.clone());
                    }
                }
                Attachment {
                    parent_ref: ParentReference {
                        group: Some(GATEWAY_API_GROUP.to_string()),
                        kind: Some(TargetKind::Gateway.as_str().to_string()),
                        name: proxy.clone(),
                        namespace: Some(namespace.to_string()),
                        section_name: None,
                    },
                    policy_target: PolicyTargetRef::http_route(vs.name()),
                }
            };
            debug!(virtual_service = %vs_identity, listener = %listener_name, "attached");
            let slot = attachments.entry(vs_identity.clone()).or_default();
            if !slot.contains(&attachment) {
                slot.push(attachment);
            }
        }

        if config.use_listener_sets {
            target.spec.allowed_listeners = Some(AllowedListeners::all());
            if !target.spec.listeners.iter().any(|l| l.name == PLACEHOLDER_LISTENER) {
                target.spec.listeners.push(placeholder_listener());
            }
        } else if selected.is_empty() && spec.tcp_gateway.is_none() {
            let name = sanitize_name(&format!("{proxy}-{}", spec.bind_port));
            if !target.spec.listeners.iter().any(|l| l.name == name) {
                target.spec.listeners.push(Listener::http(name, None, spec.bind_port));
            }
        }
        tcp::attach(&mut tcp_entries, proxy, &mut target);
        ctx.upsert(target);
    }
    tcp::upsert_routes(ctx, &identity, namespace, tcp_entries);

    translate_gateway_options(ctx, &identity, gateway, http.as_ref(), &proxies);
}

/// Explicit refs first, then the label selector, then every virtual service
/// in the allowed namespaces.
fn select_virtual_services<'a>(
    ctx: &mut Context<'a>,
    identity: &ResourceIdentity,
    gateway: &SourceGateway,
    http: &HttpGateway,
) -> Vec<&'a VirtualService> {
    let source = ctx.source;
    let namespace = gateway.namespace();
    if http.virtual_service_expressions.is_some() {
        ctx.unsupported(identity, "virtualServiceExpressions is not supported");
    }

    let candidates: Vec<&'a VirtualService> = if !http.virtual_services.is_empty() {
        let resolver = ctx.resolver();
        http.virtual_services
            .iter()
            .filter_map(|reference| match resolver.virtual_service(reference, namespace) {
                Ok(vs) => Some(vs),
                Err(missing) => {
                    ctx.unknown_reference(identity, missing.to_string());
                    None
                }
            })
            .collect()
    } else {
        let all_namespaces =
            http.virtual_service_namespaces.iter().any(|n| n == "*")
                || (http.virtual_service_namespaces.is_empty() && !http.virtual_service_selector.is_empty());
        source
            .virtual_services()
            .filter(|vs| {
                all_namespaces
                    || if http.virtual_service_namespaces.is_empty() {
                        vs.namespace() == namespace
                    } else {
                        http.virtual_service_namespaces.iter().any(|n| n == vs.namespace())
                    }
            })
            .filter(|vs| {
                http.virtual_service_selector
                    .iter()
                    .all(|(key, value)| vs.metadata.labels.get(key) == Some(value))
            })
            .collect()
    };

    // Secure gateways only serve virtual services with TLS, plain ones only
    // those without.
    candidates
        .into_iter()
        .filter(|vs| vs.spec.ssl_config.is_some() == gateway.spec.ssl)
        .collect()
}

/// Listener entries for one virtual service: one per domain.
fn virtual_service_listeners(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    vs: &VirtualService,
    port: u32,
) -> Vec<Listener> {
    let tls = vs.spec.ssl_config.as_ref().map(|ssl| listener_tls(ctx, identity, vs.namespace(), ssl));
    let entry = |name: String, hostname: Option<String>| Listener {
        name,
        hostname,
        port,
        protocol: if tls.is_some() { "HTTPS" } else { "HTTP" }.to_string(),
        tls: tls.clone(),
        allowed_routes: Some(AllowedRoutes {
            namespaces: ListenerNamespaces::all(),
            kinds: Vec::new(),
        }),
    };

    let domains = &vs.spec.virtual_host.domains;
    if domains.is_empty() {
        return vec![entry(sanitize_name(vs.name()), None)];
    }
    let mut out = Vec::new();
    for domain in domains {
        if domain.contains(':') {
            ctx.ignored(
                identity,
                format!(
                    "contains port in hostname {domain}, its being ignored for ListenerSet {}/{}",
                    vs.name(),
                    vs.namespace()
                ),
            );
            continue;
        }
        let hostname = (domain != "*").then(|| domain.clone());
        out.push(entry(sanitize_name(&format!("{}-{domain}", vs.name())), hostname));
    }
    out
}

pub(super) fn listener_tls(ctx: &mut Context<'_>, identity: &ResourceIdentity, namespace: &str, ssl: &SslConfig) -> GatewayTls {
    let mut findings = Findings::new();
    if ssl.ssl_files.is_some() {
        findings.unsupported("sslConfig sslFiles is not supported on listeners");
    }
    if ssl.sds.is_some() {
        findings.unsupported("sslConfig sds is not supported");
    }
    if !ssl.verify_subject_alt_name.is_empty() {
        findings.unsupported("sslConfig verifySubjectAltName is not supported on listeners");
    }
    if !ssl.alpn_protocols.is_empty() {
        findings.unsupported("sslConfig alpnProtocols is not supported on listeners");
    }
    if ssl.ocsp_staple_policy.is_some() {
        findings.unsupported("sslConfig ocspStaplePolicy is not supported");
    }
    ctx.report(identity, findings);

    GatewayTls {
        mode: "Terminate".to_string(),
        certificate_refs: ssl
            .secret_ref
            .iter()
            .map(|secret| {
                SecretObjectReference::secret(Some(secret.namespace_or(namespace).to_string()), secret.name.clone())
            })
            .collect(),
    }
}

fn placeholder_listener() -> Listener {
    let mut selector = BTreeMap::new();
    selector.insert(PLACEHOLDER_LISTENER.to_string(), PLACEHOLDER_LISTENER.to_string());
    Listener {
        allowed_routes: Some(AllowedRoutes {
            namespaces: ListenerNamespaces::selector(selector),
            kinds: Vec::new(),
        }),
        ..Listener::http(PLACEHOLDER_LISTENER, None, PLACEHOLDER_PORT)
    }
}

/// Listener and HTTP listener options of a gateway become policies named
/// after the gateway and targeting each of its proxies.
fn translate_gateway_options(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    gateway: &SourceGateway,
    http: Option<&HttpGateway>,
    proxies: &[String],
) {
    let namespace = gateway.namespace();
    let mut listener = match &gateway.spec.options {
        Some(options) => listener_policy(ctx, identity, options),
        None => HttpListenerPolicySpec::default(),
    };
    let mut traffic = TrafficPolicySpec::default();
    if let Some(options) = http.and_then(|h| h.options.as_ref()) {
        let (t, l) = http_listener_policies(ctx, identity, namespace, gateway.name(), options);
        traffic = t;
        listener.tracing = l.tracing;
        listener.upgrade_config = l.upgrade_config;
        listener.use_remote_address = l.use_remote_address;
        listener.xff_num_trusted_hops = l.xff_num_trusted_hops;
        listener.server_header_transformation = l.server_header_transformation;
        listener.stream_idle_timeout = l.stream_idle_timeout;
        listener.health_check = l.health_check;
    }

    let targets: Vec<PolicyTargetRef> = proxies.iter().map(PolicyTargetRef::gateway).collect();
    if !listener.is_empty() {
        listener.target_refs = targets.clone();
        ctx.upsert(Object::new(namespace, gateway.name(), listener));
    }
    if !traffic.is_empty() {
        traffic.target_refs = targets;
        ctx.upsert(Object::new(namespace, gateway.name(), traffic));
    }
}

/// Access logging of a listener.
pub(crate) fn listener_policy(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    source: &ListenerOptions,
) -> HttpListenerPolicySpec {
    let mut findings = Findings::new();
    findings.overflow("options", &source.other);
    let logs = source
        .access_logging_service
        .iter()
        .flat_map(|service| service.access_log.iter())
        .map(|log| findings.absorb(access_log::access_log(log)))
        .collect();
    ctx.report(owner, findings);
    HttpListenerPolicySpec {
        access_log: logs,
        ..HttpListenerPolicySpec::default()
    }
}

/// HTTP listener options. Per-listener auth, rate limit and processing
/// servers become GatewayExtensions named after `name`; the rest splits into
/// a TrafficPolicy and an HTTPListenerPolicy.
pub(crate) fn http_listener_policies(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    name: &str,
    source: &HttpListenerOptions,
) -> (TrafficPolicySpec, HttpListenerPolicySpec) {
    if let Some(extauth) = &source.extauth {
        ext_auth_extension(ctx, owner, namespace, &format!("{name}-extauth"), extauth);
    }
    if let Some(ext_proc) = &source.ext_proc {
        ext_proc_extension(ctx, owner, namespace, &format!("{name}-ext-proc"), ext_proc);
    }
    if let Some(server) = &source.ratelimit_server {
        rate_limit_extension(ctx, owner, namespace, &format!("{name}-rate-limit"), server);
    }

    let mut findings = Findings::new();
    findings.overflow("httpListenerOptions", &source.other);
    let traffic = TrafficPolicySpec {
        rate_limit: source
            .http_local_ratelimit
            .as_ref()
            .and_then(|local| findings.absorb(rate_limit::local(local))),
        csrf: source.csrf.as_ref().and_then(|csrf| findings.absorb(cors::csrf(csrf))),
        buffer: source
            .buffer
            .as_ref()
            .and_then(|b| b.max_request_bytes)
            .map(|bytes| Buffer {
                max_request_size: Some(bytes.to_string()),
                disable: None,
            }),
        ..TrafficPolicySpec::default()
    };

    let mut listener = HttpListenerPolicySpec {
        health_check: source.health_check.as_ref().map(|h| ListenerHealthCheck { path: h.path.clone() }),
        ..HttpListenerPolicySpec::default()
    };
    if let Some(hcm) = &source.http_connection_manager_settings {
        let resolver = ctx.resolver();
        connection_manager(&mut listener, hcm, namespace, &resolver, &mut findings);
    }
    ctx.report(owner, findings);
    (traffic, listener)
}

fn connection_manager(
    listener: &mut HttpListenerPolicySpec,
    source: &HttpConnectionManagerSettings,
    namespace: &str,
    lookup: &dyn BackendLookup,
    findings: &mut Findings,
) {
    findings.overflow("httpConnectionManagerSettings", &source.other);
    listener.xff_num_trusted_hops = source.xff_num_trusted_hops;
    listener.use_remote_address = source.use_remote_address.filter(|enabled| *enabled);
    listener.stream_idle_timeout = source.stream_idle_timeout.clone();
    listener.server_header_transformation = source.server_header_transformation.as_deref().map(pascal_case);

    let enabled = |toggle: &Option<UpgradeToggle>| {
        toggle.as_ref().is_some_and(|t| t.enabled != Some(false))
    };
    let mut upgrades = Vec::new();
    for upgrade in &source.upgrades {
        if enabled(&upgrade.websocket) {
            upgrades.push("websocket".to_string());
        }
        if enabled(&upgrade.connect) {
            upgrades.push("CONNECT".to_string());
        }
    }
    if !upgrades.is_empty() {
        listener.upgrade_config = Some(UpgradeConfig {
            enabled_upgrades: upgrades,
        });
    }

    if let Some(tracing) = &source.tracing {
        listener.tracing = Some(findings.absorb(trace::tracing(tracing, namespace, lookup)));
    }
}
