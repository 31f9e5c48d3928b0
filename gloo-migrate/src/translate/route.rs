//! One source route to one HTTPRoute rule.

use tracing::debug;

use crate::context::Context;
use crate::identity::{sanitize_name, synthetic_name, ResourceIdentity, SourceKind};
use crate::rules::{matchers, pascal_case, weights, BackendLookup, Findings};
use crate::source::virtual_service::{
    DelegateAction, Destination, DirectResponseAction, RedirectAction, Route, RouteAction, RouteTableSelector,
};
use crate::source::{ResourceRef, RouteOptions};
use crate::target::backend::AwsLambdaParameter;
use crate::target::route::{
    HttpBackendRef, HttpPathModifier, HttpRouteFilter, HttpRouteRule, RequestRedirect, UrlRewrite,
};
use crate::target::{
    BackendObjectReference, DirectResponseSpec, Object, ParameterSpec, TargetKind, TrafficPolicySpec,
    GATEWAY_API_GROUP, KGATEWAY_GROUP,
};

use super::options::{route_policy, rule_defaults};

/// Group of the label-selector backend ref used for route delegation.
pub const DELEGATION_GROUP: &str = "delegation.kgateway.dev";
/// Label a delegated route table must carry when selected by label.
pub const DELEGATION_LABEL: &str = "delegation.kgateway.dev/label";
/// Label carrying a route table's weight.
pub const ROUTE_WEIGHT_LABEL: &str = "kgateway.dev/route-weight";

const DEFAULT_REDIRECT_CODE: u16 = 301;

/// Translate route `index` of `owner`. Policies the route needs are written
/// to the context and referenced from the rule through filters.
pub(crate) fn translate_route(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    index: usize,
    route: &Route,
) -> HttpRouteRule {
    let mut findings = Findings::new();
    findings.overflow(&format!("routes.{index}"), &route.other);
    if route.inheritable_matchers == Some(true) {
        findings.unsupported("inheritableMatchers is not supported");
    }
    if route.inheritable_path_matchers == Some(true) {
        findings.unsupported("inheritablePathMatchers is not supported");
    }

    let mut rule = HttpRouteRule {
        matches: route
            .matchers
            .iter()
            .map(|m| findings.absorb(matchers::route_match(m)))
            .collect(),
        ..HttpRouteRule::default()
    };
    let prefix_only = route.matchers.iter().all(|m| m.exact.is_none() && m.regex.is_none());
    ctx.report(owner, findings);

    if let Some(action) = &route.route_action {
        route_action(ctx, owner, namespace, action, &mut rule);
    } else if let Some(redirect) = &route.redirect_action {
        let filter = redirect_filter(ctx, owner, redirect, prefix_only);
        rule.filters.push(filter);
    } else if let Some(direct) = &route.direct_response_action {
        direct_response(ctx, owner, namespace, index, route, direct, &mut rule);
    } else if let Some(delegate) = &route.delegate_action {
        delegate_action(ctx, owner, namespace, delegate, &mut rule);
    } else {
        ctx.unsupported(owner, format!("route {} has no action", route.name_or(&index.to_string())));
    }

    if let Some(options) = &route.options {
        let name = synthetic_name(route.name_or("route-association"), owner, &format!("routes/{index}/options"));
        let policy = route_policy(ctx, owner, namespace, options);
        attach_policy(ctx, namespace, &name, policy, &mut rule);
        rule_options(ctx, owner, options, prefix_only, &mut rule);
    }
    let delegated = route
        .options_config_refs
        .iter()
        .flat_map(|refs| refs.delegate_options.iter());
    for reference in delegated {
        delegated_route_option(ctx, owner, namespace, reference, prefix_only, &mut rule);
    }
    rule
}

fn attach_policy(ctx: &mut Context<'_>, namespace: &str, name: &str, policy: TrafficPolicySpec, rule: &mut HttpRouteRule) {
    if policy.is_empty() {
        return;
    }
    ctx.upsert(Object::new(namespace, name, policy));
    push_extension(rule, "TrafficPolicy", name);
}

fn push_extension(rule: &mut HttpRouteRule, kind: &str, name: &str) {
    rule.filters.push(HttpRouteFilter::extension_ref(KGATEWAY_GROUP, kind, name));
}

fn route_action(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    action: &RouteAction,
    rule: &mut HttpRouteRule,
) {
    if let Some(single) = &action.single {
        if let Some(backend) = destination(ctx, owner, namespace, single, rule) {
            rule.backend_refs.push(backend);
        }
    }
    if let Some(multi) = &action.multi {
        let requested: Vec<Option<u32>> = multi.destinations.iter().map(|d| d.weight).collect();
        let weights = ctx.absorb(owner, weights::distribute(&requested));
        for (weighted, weight) in multi.destinations.iter().zip(weights) {
            if weighted.options.is_some() {
                ctx.unsupported(owner, "weighted destination options are not supported");
            }
            if let Some(mut backend) = destination(ctx, owner, namespace, &weighted.destination, rule) {
                backend.weight = weight;
                rule.backend_refs.push(backend);
            }
        }
    }
    if action.upstream_group.is_some() {
        ctx.unsupported(owner, "routeAction upstreamGroup is not supported");
    }
    if action.cluster_header.is_some() {
        ctx.unsupported(owner, "routeAction clusterHeader is not supported");
    }
    if action.dynamic_forward_proxy.is_some() {
        ctx.unsupported(owner, "routeAction dynamicForwardProxy is not supported");
    }
}

fn destination(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    source: &Destination,
    rule: &mut HttpRouteRule,
) -> Option<HttpBackendRef> {
    if source.subset.is_some() {
        ctx.unsupported(owner, "destination subset is not supported");
    }
    if let Some(spec) = &source.destination_spec {
        let mut findings = Findings::new();
        findings.overflow("destinationSpec", &spec.other);
        if let Some(aws) = &spec.aws {
            if aws.response_transformation {
                findings.unsupported("destinationSpec.aws.responseTransformation is not supported");
            }
            if aws.unwrap_as_api_gateway {
                findings.unsupported("destinationSpec.aws.unwrapAsApiGateway is not supported");
            }
            let name = sanitize_name(&aws.logical_name);
            let parameter = ParameterSpec {
                lambda: AwsLambdaParameter {
                    logical_name: aws.logical_name.clone(),
                    invocation_style: aws.invocation_style.as_deref().map(pascal_case),
                },
            };
            ctx.upsert(Object::new(namespace, name.clone(), parameter));
            push_extension(rule, "Parameter", &name);
        }
        ctx.report(owner, findings);
    }

    if let Some(upstream) = &source.upstream {
        let resolver = ctx.resolver();
        let backend = ctx.absorb(owner, resolver.backend_ref(upstream, namespace));
        if let Ok(found) = resolver.upstream(upstream, namespace) {
            if let (Some(kube), Some(true)) = (&found.spec.kube, found.spec.use_http2) {
                let service_namespace = if kube.service_namespace.is_empty() {
                    found.namespace()
                } else {
                    kube.service_namespace.as_str()
                };
                ctx.update_required(
                    owner,
                    format!(
                        "service {service_namespace}/{} uses http2, update its k8s service appProtocol=http2",
                        kube.service_name
                    ),
                );
            }
        }
        return Some(http_backend(backend));
    }
    if let Some(kube) = &source.kube {
        return Some(HttpBackendRef {
            name: kube.service.name.clone(),
            namespace: Some(kube.service.namespace_or(namespace).to_string()),
            port: Some(kube.port),
            ..HttpBackendRef::default()
        });
    }
    ctx.unsupported(owner, "destination has neither an upstream nor a kube service");
    None
}

pub(super) fn http_backend(source: BackendObjectReference) -> HttpBackendRef {
    HttpBackendRef {
        group: source.group,
        kind: source.kind,
        name: source.name,
        namespace: source.namespace,
        port: source.port,
        weight: None,
    }
}

fn redirect_filter(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    source: &RedirectAction,
    prefix_only: bool,
) -> HttpRouteFilter {
    let status_code = match source.response_code.as_deref() {
        None => DEFAULT_REDIRECT_CODE,
        Some(code) => redirect_code(code).unwrap_or_else(|| {
            ctx.unsupported(owner, format!("redirect responseCode {code} is not supported, using 301"));
            DEFAULT_REDIRECT_CODE
        }),
    };
    let mut path = source.path_redirect.as_ref().map(HttpPathModifier::full_path);
    if let Some(prefix) = &source.prefix_rewrite {
        if prefix_only {
            path = Some(HttpPathModifier::prefix(prefix.clone()));
        } else {
            ctx.unsupported(owner, "redirect prefixRewrite needs prefix matchers");
        }
    }
    if source.regex_rewrite.is_some() {
        ctx.unsupported(owner, "redirect regexRewrite is not supported");
    }
    if source.strip_query {
        ctx.unsupported(owner, "redirect stripQuery is not supported");
    }
    HttpRouteFilter::redirect(RequestRedirect {
        scheme: source.https_redirect.then(|| "https".to_string()),
        hostname: source.host_redirect.clone(),
        path,
        port: source.port_redirect,
        status_code,
    })
}

fn redirect_code(name: &str) -> Option<u16> {
    match name {
        "MOVED_PERMANENTLY" => Some(301),
        "FOUND" => Some(302),
        "SEE_OTHER" => Some(303),
        "TEMPORARY_REDIRECT" => Some(307),
        "PERMANENT_REDIRECT" => Some(308),
        _ => None,
    }
}

fn direct_response(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    index: usize,
    route: &Route,
    source: &DirectResponseAction,
    rule: &mut HttpRouteRule,
) {
    let name = match route.name.as_deref().filter(|n| !n.is_empty()) {
        Some(route_name) => sanitize_name(&format!("directresponse-{}-{route_name}", owner.name)),
        None => synthetic_name(
            &format!("directresponse-{}", owner.name),
            owner,
            &format!("routes/{index}/directResponseAction"),
        ),
    };
    let spec = DirectResponseSpec {
        status: source.status,
        body: source.body.clone(),
    };
    ctx.upsert(Object::new(namespace, name.clone(), spec));
    push_extension(rule, "DirectResponse", &name);
}

fn delegate_action(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    source: &DelegateAction,
    rule: &mut HttpRouteRule,
) {
    if let Some(selector) = &source.selector {
        delegate_by_selector(ctx, owner, namespace, selector, rule);
        return;
    }
    let reference = match (&source.route_table, &source.name) {
        (Some(reference), _) => reference.clone(),
        (None, Some(name)) => ResourceRef::new(source.namespace.clone().unwrap_or_default(), name.clone()),
        (None, None) => {
            ctx.unsupported(owner, "delegateAction has neither a ref nor a selector");
            return;
        }
    };
    let target_namespace = reference.namespace_or(namespace).to_string();
    match ctx.resolver().route_table(&reference, namespace) {
        Ok(table) => {
            let identity = super::identity_of(SourceKind::RouteTable, table);
            debug!(route_table = %identity, "delegated by reference");
            ctx.mark_attached(identity);
        }
        Err(_) => ctx.unknown_reference(
            owner,
            format!("references RouteTable {target_namespace}/{} that does not exist", reference.name),
        ),
    }
    rule.backend_refs.push(HttpBackendRef {
        group: Some(GATEWAY_API_GROUP.to_string()),
        kind: Some(TargetKind::HttpRoute.as_str().to_string()),
        name: reference.name.clone(),
        namespace: Some(target_namespace),
        ..HttpBackendRef::default()
    });
}

fn delegate_by_selector(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    selector: &RouteTableSelector,
    rule: &mut HttpRouteRule,
) {
    if selector.expressions.is_some() {
        ctx.unsupported(owner, "delegateAction selector expressions are not supported");
    }
    if selector.labels.len() > 1 {
        ctx.unsupported(owner, "delegateAction selector with more than one label is not supported, using the first");
    }
    let Some((key, value)) = selector.labels.iter().next() else {
        ctx.unsupported(owner, "delegateAction selector without labels is not supported");
        return;
    };
    ctx.update_required(
        owner,
        format!("delegated route tables selected by label {key}={value} must carry label {DELEGATION_LABEL}={value}"),
    );

    let namespaces: Vec<&str> = if selector.namespaces.is_empty() {
        vec![namespace]
    } else {
        selector.namespaces.iter().map(String::as_str).collect()
    };
    let any_namespace = namespaces.contains(&"*");
    let source = ctx.source;
    for table in source.route_tables() {
        let in_scope = any_namespace || namespaces.contains(&table.namespace());
        let matches = selector.labels.iter().all(|(k, v)| table.metadata.labels.get(k) == Some(v));
        if in_scope && matches {
            ctx.mark_attached(super::identity_of(SourceKind::RouteTable, table));
        }
    }
    for ns in namespaces {
        rule.backend_refs.push(HttpBackendRef {
            group: Some(DELEGATION_GROUP.to_string()),
            kind: Some("label".to_string()),
            name: value.clone(),
            namespace: Some(if ns == "*" { "all" } else { ns }.to_string()),
            ..HttpBackendRef::default()
        });
    }
}

/// The rule-level part of route options. Values the rule already carries
/// are kept.
fn rule_options(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    source: &RouteOptions,
    prefix_only: bool,
    rule: &mut HttpRouteRule,
) {
    if let Some(timeout) = &source.timeout {
        let timeouts = rule.timeouts.get_or_insert_with(Default::default);
        if timeouts.request.is_none() {
            timeouts.request = Some(timeout.clone());
        }
    }
    rule_defaults(ctx, owner, &source.policy).apply(rule);

    if source.regex_rewrite.is_some() {
        ctx.unsupported(owner, "routeOptions.regexRewrite is not supported");
    }
    let mut rewrite = UrlRewrite {
        hostname: source.host_rewrite.clone(),
        path: None,
    };
    if let Some(prefix) = &source.prefix_rewrite {
        if prefix_only {
            rewrite.path = Some(HttpPathModifier::prefix(prefix.clone()));
        } else {
            ctx.unsupported(owner, "routeOptions.prefixRewrite needs prefix matchers");
        }
    }
    if rewrite.hostname.is_none() && rewrite.path.is_none() {
        return;
    }
    match rule.filters.iter_mut().find_map(|f| f.url_rewrite.as_mut()) {
        Some(existing) => {
            if existing.hostname.is_none() {
                existing.hostname = rewrite.hostname;
            }
            if existing.path.is_none() {
                existing.path = rewrite.path;
            }
        }
        None => rule.filters.push(HttpRouteFilter::rewrite(rewrite)),
    }
}

/// A RouteOption pulled in by reference. It becomes a TrafficPolicy named
/// after itself; its rule-level fields fill in what the route left unset.
fn delegated_route_option(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    reference: &ResourceRef,
    prefix_only: bool,
    rule: &mut HttpRouteRule,
) {
    let target_namespace = reference.namespace_or(namespace);
    if target_namespace != namespace {
        ctx.unsupported(
            owner,
            format!(
                "RouteOption {target_namespace}/{} is outside namespace {namespace}",
                reference.name
            ),
        );
        return;
    }
    let Ok(option) = ctx.resolver().route_option(reference, namespace) else {
        ctx.unknown_reference(
            owner,
            format!("references RouteOption {target_namespace}/{} that does not exist", reference.name),
        );
        return;
    };
    let identity = super::identity_of(SourceKind::RouteOption, option);
    let first_use = !ctx.is_attached(&identity);
    ctx.mark_attached(identity.clone());

    if first_use {
        let policy = route_policy(ctx, &identity, namespace, &option.spec.options);
        attach_policy(ctx, namespace, option.name(), policy, rule);
    } else if ctx.target.traffic_policy(namespace, option.name()).is_some() {
        push_extension(rule, "TrafficPolicy", option.name());
    }
    rule_options(ctx, &identity, &option.spec.options, prefix_only, rule);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    use super::translate_route;
    use crate::config::MigrateConfig;
    use crate::context::{Context, Translation};
    use crate::diagnostics::Category;
    use crate::identity::{ResourceIdentity, SourceKind};
    use crate::source::virtual_service::Route;
    use crate::target::route::HttpRouteRule;
    use crate::translate::testing::cache;

    fn owner() -> ResourceIdentity {
        ResourceIdentity::new(SourceKind::VirtualService, "gloo-system", "shop")
    }

    fn run(documents: Vec<Value>, route: Value) -> (HttpRouteRule, Translation) {
        let source = cache(documents);
        let config = MigrateConfig::default();
        let route: Route = serde_json::from_value(route).expect("route decodes");
        let mut ctx = Context::new(&source, &config);
        let rule = translate_route(&mut ctx, &owner(), "gloo-system", 0, &route);
        (rule, ctx.finish())
    }

    fn messages(out: &Translation, category: Category) -> Vec<String> {
        out.diagnostics.of(category).map(|d| d.message.clone()).collect()
    }

    #[test]
    fn redirect_maps_code_scheme_and_prefix() {
        let (rule, out) = run(
            vec![],
            json!({
                "matchers": [{"prefix": "/old"}],
                "redirectAction": {"httpsRedirect": true, "responseCode": "FOUND", "prefixRewrite": "/new"}
            }),
        );
        let redirect = rule.filters[0].request_redirect.as_ref().expect("redirect");
        assert_eq!(redirect.status_code, 302);
        assert_eq!(redirect.scheme.as_deref(), Some("https"));
        assert_eq!(
            redirect.path.as_ref().and_then(|p| p.replace_prefix_match.as_deref()),
            Some("/new")
        );
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn unknown_redirect_code_falls_back() {
        let (rule, out) = run(vec![], json!({"redirectAction": {"responseCode": "GONE"}}));
        assert_eq!(rule.filters[0].request_redirect.as_ref().map(|r| r.status_code), Some(301));
        assert_eq!(out.diagnostics.of(Category::Unsupported).count(), 1);
    }

    #[test]
    fn multi_destination_weights_are_filled() {
        let (rule, out) = run(
            vec![],
            json!({"routeAction": {"multi": {"destinations": [
                {"weight": 30, "destination": {"kube": {"ref": {"name": "a"}, "port": 80}}},
                {"destination": {"kube": {"ref": {"name": "b"}, "port": 80}}},
                {"destination": {"kube": {"ref": {"name": "c", "namespace": "other"}, "port": 80}}}
            ]}}}),
        );
        let weights: Vec<Option<u32>> = rule.backend_refs.iter().map(|b| b.weight).collect();
        assert_eq!(weights, vec![Some(30), Some(35), Some(35)]);
        assert_eq!(rule.backend_refs[2].namespace.as_deref(), Some("other"));
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn http2_kube_upstream_needs_service_update() {
        let (rule, out) = run(
            vec![json!({
                "kind": "Upstream",
                "metadata": {"name": "grpc", "namespace": "gloo-system"},
                "spec": {"useHttp2": true, "kube": {"serviceName": "grpc-svc", "serviceNamespace": "apps", "servicePort": 9000}}
            })],
            json!({"routeAction": {"single": {"upstream": {"name": "grpc"}}}}),
        );
        assert_eq!(rule.backend_refs[0].name, "grpc-svc");
        assert_eq!(
            messages(&out, Category::UpdateRequired),
            vec!["service apps/grpc-svc uses http2, update its k8s service appProtocol=http2"]
        );
    }

    #[test]
    fn selector_delegation_marks_matching_tables() {
        let (rule, out) = run(
            vec![
                json!({
                    "kind": "RouteTable",
                    "metadata": {"name": "orders", "namespace": "gloo-system", "labels": {"team": "orders"}},
                    "spec": {"routes": []}
                }),
                json!({
                    "kind": "RouteTable",
                    "metadata": {"name": "carts", "namespace": "gloo-system", "labels": {"team": "carts"}},
                    "spec": {"routes": []}
                }),
            ],
            json!({"matchers": [{"prefix": "/orders"}], "delegateAction": {"selector": {"labels": {"team": "orders"}}}}),
        );
        let backend = &rule.backend_refs[0];
        assert_eq!(backend.group.as_deref(), Some(super::DELEGATION_GROUP));
        assert_eq!(backend.name, "orders");
        assert_eq!(backend.namespace.as_deref(), Some("gloo-system"));
        assert_eq!(out.diagnostics.of(Category::UpdateRequired).count(), 1);
    }

    #[test]
    fn missing_route_table_still_emits_reference() {
        let (rule, out) = run(vec![], json!({"delegateAction": {"ref": {"name": "gone"}}}));
        assert_eq!(rule.backend_refs[0].kind.as_deref(), Some("HTTPRoute"));
        assert_eq!(
            messages(&out, Category::UnknownReference),
            vec!["references RouteTable gloo-system/gone that does not exist"]
        );
    }

    #[test]
    fn direct_response_is_named_after_route() {
        let (rule, out) = run(
            vec![],
            json!({"name": "Teapot", "directResponseAction": {"status": 418, "body": "short and stout"}}),
        );
        let reference = rule.filters[0].extension_ref.as_ref().expect("extension ref");
        assert_eq!(reference.kind, "DirectResponse");
        assert_eq!(reference.name, "directresponse-shop-teapot");
        let direct = out
            .target
            .direct_response("gloo-system", "directresponse-shop-teapot")
            .expect("direct response");
        assert_eq!(direct.spec.status, 418);
    }

    #[test]
    fn route_options_split_between_rule_and_policy() {
        let (rule, out) = run(
            vec![json!({
                "kind": "RouteOption",
                "metadata": {"name": "slow", "namespace": "gloo-system"},
                "spec": {"options": {"timeout": "30s", "hostRewrite": "ignored.example.com"}}
            })],
            json!({
                "matchers": [{"prefix": "/api"}],
                "routeAction": {"single": {"kube": {"ref": {"name": "api"}, "port": 8080}}},
                "options": {
                    "timeout": "5s",
                    "hostRewrite": "api.internal",
                    "prefixRewrite": "/",
                    "cors": {"allowOrigin": ["https://shop.example.com"]}
                },
                "optionsConfigRefs": {"delegateOptions": [{"name": "slow"}, {"name": "elsewhere", "namespace": "other"}]}
            }),
        );
        assert_eq!(rule.timeouts.as_ref().and_then(|t| t.request.as_deref()), Some("5s"));
        let rewrite = rule.filters.iter().find_map(|f| f.url_rewrite.as_ref()).expect("rewrite");
        assert_eq!(rewrite.hostname.as_deref(), Some("api.internal"));
        assert_eq!(rewrite.path.as_ref().and_then(|p| p.replace_prefix_match.as_deref()), Some("/"));

        let policies: Vec<&str> = rule
            .filters
            .iter()
            .filter_map(|f| f.extension_ref.as_ref())
            .map(|r| r.kind.as_str())
            .collect();
        assert_eq!(policies, vec!["TrafficPolicy"]);
        assert_eq!(
            messages(&out, Category::Unsupported),
            vec!["RouteOption other/elsewhere is outside namespace gloo-system"]
        );
    }
}
