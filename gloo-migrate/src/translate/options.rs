//! Option blocks shared by routes, virtual hosts and the standalone option
//! resources.
//!
//! Policy fields land in a [`TrafficPolicySpec`]. Header manipulation,
//! retries and timeouts have rule-level equivalents in the HTTPRoute and are
//! returned as [`RuleDefaults`] instead.

use crate::context::Context;
use crate::identity::{ResourceIdentity, SourceKind};
use crate::rules::{ai, cors, jwt, rate_limit, rbac, retry, transformation, waf, Findings, Mapped};
use crate::source::options::PolicyOptions;
use crate::source::policy::{
    BufferPerRoute, ExtAuthExtension, HeaderManipulation, HeaderValueOption, LbHash, RateLimitExtension, RetryPolicy,
};
use crate::source::{RouteOptions, TargetRef, VirtualHostOptions};
use crate::target::policy::{Buffer, CookieHash, Empty, ExtAuthPolicy, HashPolicy, HeaderHash, RateLimitPolicy};
use crate::target::route::{HeaderModifier, HttpHeader, HttpRouteFilter, HttpRouteRetry, HttpRouteRule};
use crate::target::{LocalRef, NamespacedRef, Object, PolicyTargetRef, TrafficPolicySpec};

use super::identity_of;

/// Map the policy fields common to routes and virtual hosts.
pub(crate) fn policy_options(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    path: &str,
    source: &PolicyOptions,
) -> TrafficPolicySpec {
    let resolver = ctx.resolver();
    let mut spec = TrafficPolicySpec::default();

    if let Some(extauth) = &source.extauth {
        spec.ext_auth = ext_auth(ctx, owner, namespace, path, extauth);
    }
    if let Some(source) = &source.waf {
        spec.waf = ctx.absorb(owner, waf::waf(source));
    }
    if let Some(source) = &source.cors {
        spec.cors = ctx.absorb(owner, cors::cors(source));
    }
    if let Some(source) = &source.csrf {
        spec.csrf = ctx.absorb(owner, cors::csrf(source));
    }
    if let Some(source) = &source.ratelimit {
        let extension = ctx.config.rate_limit_extension.clone();
        spec.rate_limit = ctx.absorb(owner, rate_limit::global(source, &extension));
    }
    if let Some(source) = &source.staged_transformations {
        spec.transformation = ctx.absorb(owner, transformation::staged(source));
    }
    if let Some(source) = &source.jwt_staged {
        spec.jwt = ctx.absorb(owner, jwt::staged(source, namespace, &resolver));
    }
    if let Some(source) = &source.rbac {
        spec.rbac = ctx.absorb(owner, rbac::rbac(source));
    }
    if let Some(source) = &source.buffer_per_route {
        spec.buffer = buffer(source);
    }

    let mut findings = Findings::new();
    findings.overflow(path, &source.other);
    ctx.report(owner, findings);
    spec
}

/// Route options: the shared policy fields plus the route-only ones.
pub(crate) fn route_policy(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    source: &RouteOptions,
) -> TrafficPolicySpec {
    let resolver = ctx.resolver();
    let mut spec = policy_options(ctx, owner, namespace, "routeOptions", &source.policy);

    if let Some(staged) = &source.jwt_providers_staged {
        if spec.jwt.is_some() {
            ctx.ignored(owner, "jwtProvidersStaged is ignored because jwtStaged is set");
        } else {
            spec.jwt = ctx.absorb(owner, jwt::staged(staged, namespace, &resolver));
        }
    }
    if let Some(source) = &source.ai {
        spec.ai = ctx.absorb(owner, ai::ai(source, namespace));
    }
    if let Some(lb_hash) = &source.lb_hash {
        spec.hash_policies = hash_policies(lb_hash);
    }
    spec.auto_host_rewrite = source.auto_host_rewrite.filter(|enabled| *enabled);
    spec
}

/// Virtual host options: the shared policy fields plus the early and regular
/// rate limit stages, which both end up as global rate limits.
pub(crate) fn vhost_policy(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    source: &VirtualHostOptions,
) -> TrafficPolicySpec {
    let mut spec = policy_options(ctx, owner, namespace, "virtualHostOptions", &source.policy);

    let staged = match (&source.ratelimit_early, &source.ratelimit_regular) {
        (Some(early), None) => {
            ctx.unsupported(owner, "ratelimitEarly is not supported, applying as regular rate limits");
            Some(early)
        }
        (Some(_), Some(regular)) => {
            ctx.unsupported(owner, "ratelimitEarly is not supported, dropped in favour of ratelimitRegular");
            Some(regular)
        }
        (None, regular) => regular.as_ref(),
    };
    if let Some(staged) = staged {
        let mapped = global_rate_limit(ctx, staged);
        let extra = ctx.absorb(owner, mapped);
        merge_rate_limit(&mut spec.rate_limit, extra);
    }
    spec
}

fn global_rate_limit(ctx: &Context<'_>, source: &RateLimitExtension) -> Mapped<Option<RateLimitPolicy>> {
    rate_limit::global(source, &ctx.config.rate_limit_extension)
}

/// Append the global descriptors of `extra` to `into`.
pub(crate) fn merge_rate_limit(into: &mut Option<RateLimitPolicy>, extra: Option<RateLimitPolicy>) {
    let Some(extra) = extra else {
        return;
    };
    let Some(existing) = into.as_mut() else {
        *into = Some(extra);
        return;
    };
    match (existing.global.as_mut(), extra.global) {
        (Some(global), Some(more)) => global.rate_limits.extend(more.rate_limits),
        (None, more) => existing.global = more,
        (Some(_), None) => {}
    }
    if existing.local.is_none() {
        existing.local = extra.local;
    }
}

/// External auth: a `configRef` copies the AuthConfig through and points the
/// policy at it together with the global auth extension.
fn ext_auth(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    path: &str,
    source: &ExtAuthExtension,
) -> Option<ExtAuthPolicy> {
    let mut findings = Findings::new();
    findings.overflow(&format!("{path}.extauth"), &source.other);
    ctx.report(owner, findings);

    if source.disable {
        return Some(ExtAuthPolicy {
            disable: Some(Empty {}),
            ..ExtAuthPolicy::default()
        });
    }
    let reference = source.config_ref.as_ref()?;
    let config_namespace = reference.namespace_or(namespace).to_string();
    match ctx.resolver().auth_config(reference, namespace) {
        Ok(found) => ctx.upsert(Object {
            metadata: found.metadata.clone(),
            spec: found.spec.clone(),
        }),
        Err(_) => ctx.unknown_reference(
            owner,
            format!("references AuthConfig {config_namespace}/{} that does not exist", reference.name),
        ),
    }
    Some(ExtAuthPolicy {
        extension_ref: Some(LocalRef::new(ctx.config.ext_auth_extension.clone())),
        auth_config_ref: Some(NamespacedRef {
            name: reference.name.clone(),
            namespace: Some(config_namespace),
        }),
        disable: None,
    })
}

fn buffer(source: &BufferPerRoute) -> Option<Buffer> {
    if source.disabled {
        return Some(Buffer {
            max_request_size: None,
            disable: Some(Empty {}),
        });
    }
    let bytes = source.buffer.as_ref()?.max_request_bytes?;
    Some(Buffer {
        max_request_size: Some(bytes.to_string()),
        disable: None,
    })
}

fn hash_policies(source: &LbHash) -> Vec<HashPolicy> {
    source
        .hash_policies
        .iter()
        .map(|p| HashPolicy {
            header: p.header.clone().map(|name| HeaderHash { name }),
            cookie: p.cookie.as_ref().map(|c| CookieHash {
                name: c.name.clone(),
                path: c.path.clone(),
                ttl: c.ttl.clone(),
            }),
            source_ip: p.source_ip.then_some(Empty {}),
            terminal: p.terminal.then_some(true),
        })
        .collect()
}

/// Rule-level settings a virtual host hands down to every rule of its route.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RuleDefaults {
    pub filters: Vec<HttpRouteFilter>,
    pub retry: Option<HttpRouteRetry>,
    pub backend_timeout: Option<String>,
}

impl RuleDefaults {
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty() && self.retry.is_none() && self.backend_timeout.is_none()
    }

    /// Fill in what `self` leaves unset from `other`.
    pub fn merge(&mut self, other: RuleDefaults) {
        for filter in other.filters {
            merge_filter(&mut self.filters, filter);
        }
        if self.retry.is_none() {
            self.retry = other.retry;
            if self.backend_timeout.is_none() {
                self.backend_timeout = other.backend_timeout;
            }
        }
    }

    /// Apply to one rule. Anything the rule already sets wins.
    pub fn apply(&self, rule: &mut HttpRouteRule) {
        for filter in &self.filters {
            merge_filter(&mut rule.filters, filter.clone());
        }
        if rule.retry.is_none() && self.retry.is_some() {
            rule.retry = self.retry.clone();
            if let Some(timeout) = &self.backend_timeout {
                let timeouts = rule.timeouts.get_or_insert_with(Default::default);
                if timeouts.backend_request.is_none() {
                    timeouts.backend_request = Some(timeout.clone());
                }
            }
        }
    }
}

/// Header manipulation and retries of a virtual host.
pub(crate) fn rule_defaults(ctx: &mut Context<'_>, owner: &ResourceIdentity, source: &PolicyOptions) -> RuleDefaults {
    let mut defaults = RuleDefaults::default();
    if let Some(headers) = &source.header_manipulation {
        defaults.filters = header_filters(headers);
    }
    if let Some(retries) = &source.retries {
        let (retry, per_try) = ctx.absorb(owner, route_retry(retries));
        defaults.retry = Some(retry);
        defaults.backend_timeout = per_try;
    }
    defaults
}

/// Request and response header modifier filters. `append: false` overwrites.
pub(crate) fn header_filters(source: &HeaderManipulation) -> Vec<HttpRouteFilter> {
    let mut filters = Vec::new();
    let request = modifier(&source.request_headers_to_add, &source.request_headers_to_remove);
    if !request.is_empty() {
        filters.push(HttpRouteFilter::request_headers(request));
    }
    let response = modifier(&source.response_headers_to_add, &source.response_headers_to_remove);
    if !response.is_empty() {
        filters.push(HttpRouteFilter::response_headers(response));
    }
    filters
}

fn modifier(add: &[HeaderValueOption], remove: &[String]) -> HeaderModifier {
    let mut out = HeaderModifier::default();
    for option in add {
        let header = HttpHeader {
            name: option.header.key.clone(),
            value: option.header.value.clone(),
        };
        if option.append == Some(false) {
            out.set.push(header);
        } else {
            out.add.push(header);
        }
    }
    out.remove = remove.to_vec();
    out
}

/// Merge a header modifier filter into a filter list. Names the list
/// already sets keep their value.
fn merge_filter(filters: &mut Vec<HttpRouteFilter>, filter: HttpRouteFilter) {
    let Some(existing) = filters.iter_mut().find(|f| f.filter_type == filter.filter_type) else {
        filters.push(filter);
        return;
    };
    let pairs = [
        (existing.request_header_modifier.as_mut(), filter.request_header_modifier),
        (existing.response_header_modifier.as_mut(), filter.response_header_modifier),
    ];
    for (into, from) in pairs {
        let (Some(into), Some(from)) = (into, from) else {
            continue;
        };
        for header in from.set {
            if !into.set.iter().any(|h| h.name.eq_ignore_ascii_case(&header.name)) {
                into.set.push(header);
            }
        }
        into.add.extend(from.add);
        for name in from.remove {
            if !into.remove.contains(&name) {
                into.remove.push(name);
            }
        }
    }
}

/// Rule retry plus the per-try timeout, which becomes the rule's backend
/// request timeout.
pub(crate) fn route_retry(source: &RetryPolicy) -> Mapped<(HttpRouteRetry, Option<String>)> {
    let mut findings = Findings::new();
    findings.overflow("retries", &source.other);
    let codes = findings.absorb(retry::retry_codes(&source.retry_on, &source.retriable_status_codes));
    let backoff = source.retry_back_off.as_ref().and_then(|b| {
        if b.max_interval.is_some() {
            findings.unsupported("retries.retryBackOff.maxInterval is not supported");
        }
        b.base_interval.clone()
    });
    let retry = HttpRouteRetry {
        codes,
        attempts: source.num_retries,
        backoff,
    };
    Mapped::new((retry, source.per_try_timeout.clone()), findings)
}

/// Translate the option resources that attach by target reference only.
///
/// Options another resource already pulled in by reference are skipped. An
/// option neither referenced nor targeted attaches to nothing.
pub fn translate_detached_options(ctx: &mut Context<'_>) {
    let source = ctx.source;

    for option in source.virtual_host_options() {
        let identity = identity_of(SourceKind::VirtualHostOption, option);
        if ctx.is_attached(&identity) {
            continue;
        }
        let targets: Vec<&TargetRef> = option.spec.all_target_refs().collect();
        if targets.is_empty() {
            ctx.no_references(&identity, "VirtualHostOption is not referenced and has no targetRefs");
            continue;
        }
        let spec = vhost_policy(ctx, &identity, option.namespace(), &option.spec.options);
        let defaults = rule_defaults(ctx, &identity, &option.spec.options.policy);
        if !defaults.is_empty() {
            ctx.unsupported(
                &identity,
                "headerManipulation and retries on a targeted VirtualHostOption are not supported",
            );
        }
        attach_targeted(ctx, &identity, option.namespace(), option.name(), spec, &targets);
    }

    for option in source.route_options() {
        let identity = identity_of(SourceKind::RouteOption, option);
        if ctx.is_attached(&identity) {
            continue;
        }
        let targets: Vec<&TargetRef> = option.spec.all_target_refs().collect();
        if targets.is_empty() {
            ctx.no_references(&identity, "RouteOption is not referenced and has no targetRefs");
            continue;
        }
        let spec = route_policy(ctx, &identity, option.namespace(), &option.spec.options);
        attach_targeted(ctx, &identity, option.namespace(), option.name(), spec, &targets);
    }

    for option in source.listener_options() {
        let identity = identity_of(SourceKind::ListenerOption, option);
        if option.spec.target_refs.is_empty() {
            ctx.no_references(&identity, "ListenerOption has no targetRefs");
            continue;
        }
        if option.spec.options.per_connection_buffer_limit_bytes.is_some() {
            ctx.unsupported(&identity, "perConnectionBufferLimitBytes on a ListenerOption is not supported");
        }
        let mut policy = super::gateway::listener_policy(ctx, &identity, &option.spec.options);
        policy.target_refs = target_refs(ctx, &identity, option.namespace(), &option.spec.target_refs);
        if policy.is_empty() {
            ctx.ignored(&identity, "ListenerOption produces no policy");
        } else {
            ctx.upsert(Object::new(option.namespace(), option.name(), policy));
        }
    }

    for option in source.http_listener_options() {
        let identity = identity_of(SourceKind::HttpListenerOption, option);
        if option.spec.target_refs.is_empty() {
            ctx.no_references(&identity, "HttpListenerOption has no targetRefs");
            continue;
        }
        let refs = target_refs(ctx, &identity, option.namespace(), &option.spec.target_refs);
        let (mut traffic, mut listener) = super::gateway::http_listener_policies(
            ctx,
            &identity,
            option.namespace(),
            option.name(),
            &option.spec.options,
        );
        let produced = !traffic.is_empty() || !listener.is_empty();
        if !traffic.is_empty() {
            traffic.target_refs = refs.clone();
            ctx.upsert(Object::new(option.namespace(), option.name(), traffic));
        }
        if !listener.is_empty() {
            listener.target_refs = refs;
            ctx.upsert(Object::new(option.namespace(), option.name(), listener));
        }
        if !produced {
            ctx.ignored(&identity, "HttpListenerOption produces no policy");
        }
    }
}

fn attach_targeted(
    ctx: &mut Context<'_>,
    identity: &ResourceIdentity,
    namespace: &str,
    name: &str,
    mut spec: TrafficPolicySpec,
    targets: &[&TargetRef],
) {
    if spec.is_empty() {
        ctx.ignored(identity, format!("{} produces no policy", identity.kind));
        return;
    }
    let owned: Vec<TargetRef> = targets.iter().map(|t| (*t).clone()).collect();
    spec.target_refs = target_refs(ctx, identity, namespace, &owned);
    ctx.upsert(Object::new(namespace, name, spec));
}

/// Policy target refs are namespace-local; a ref into another namespace is
/// dropped.
fn target_refs(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    refs: &[TargetRef],
) -> Vec<PolicyTargetRef> {
    refs.iter()
        .filter_map(|r| {
            if !r.namespace.is_empty() && r.namespace != namespace {
                ctx.unsupported(
                    owner,
                    format!("targetRef {} {}/{} is outside namespace {namespace}", r.kind, r.namespace, r.name),
                );
                return None;
            }
            Some(PolicyTargetRef {
                group: r.group.clone(),
                kind: r.kind.clone(),
                name: r.name.clone(),
                section_name: r.section_name.clone().filter(|s| !s.is_empty()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{header_filters, route_retry, translate_detached_options, vhost_policy, RuleDefaults};
    use crate::config::MigrateConfig;
    use crate::context::Context;
    use crate::diagnostics::Category;
    use crate::identity::{ResourceIdentity, SourceKind};
    use crate::source::policy::{HeaderManipulation, RetryPolicy};
    use crate::source::{SourceCache, VirtualHostOptions};
    use crate::target::route::{HttpHeader, HttpRouteFilter, HttpRouteRetry, HttpRouteRule, HeaderModifier};
    use crate::translate::testing::cache;

    fn owner() -> ResourceIdentity {
        ResourceIdentity::new(SourceKind::VirtualService, "default", "shop")
    }

    #[test]
    fn early_and_regular_rate_limits_merge_into_one_global_policy() {
        let options: VirtualHostOptions = serde_json::from_value(json!({
            "ratelimitRegular": {"rateLimits": [{"actions": [{"genericKey": {"descriptorValue": "regular"}}]}]},
            "ratelimit": {"rateLimits": [{"actions": [{"remoteAddress": {}}]}]}
        }))
        .expect("options decode");
        let source = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        let spec = vhost_policy(&mut ctx, &owner(), "default", &options);
        let out = ctx.finish();

        let global = spec.rate_limit.and_then(|r| r.global).expect("global rate limit");
        assert_eq!(global.extension_ref.name, "global-rate-limit-settings");
        assert_eq!(global.rate_limits.len(), 2);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn early_rate_limits_alone_are_applied_as_regular() {
        let options: VirtualHostOptions = serde_json::from_value(json!({
            "ratelimitEarly": {"rateLimits": [{"actions": [{"genericKey": {"descriptorValue": "early"}}]}]}
        }))
        .expect("options decode");
        let source = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        let spec = vhost_policy(&mut ctx, &owner(), "default", &options);
        let out = ctx.finish();

        assert!(spec.rate_limit.is_some());
        let messages: Vec<&str> = out.diagnostics.entries().iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["ratelimitEarly is not supported, applying as regular rate limits"]);
    }

    #[test]
    fn auth_config_refs_are_copied_and_missing_ones_flagged() {
        let options: VirtualHostOptions = serde_json::from_value(json!({
            "extauth": {"configRef": {"name": "basic-auth", "namespace": "gloo-system"}}
        }))
        .expect("options decode");
        let with_config = cache(vec![json!({
            "kind": "AuthConfig",
            "metadata": {"name": "basic-auth", "namespace": "gloo-system"},
            "spec": {"configs": [{"basicAuth": {"realm": "shop"}}]}
        })]);
        let config = MigrateConfig::default();

        let mut ctx = Context::new(&with_config, &config);
        let spec = vhost_policy(&mut ctx, &owner(), "default", &options);
        let out = ctx.finish();
        let auth = spec.ext_auth.expect("ext auth");
        assert_eq!(auth.extension_ref.map(|r| r.name).as_deref(), Some("global-extauth-settings"));
        assert_eq!(auth.auth_config_ref.and_then(|r| r.namespace).as_deref(), Some("gloo-system"));
        assert!(out.target.auth_config("gloo-system", "basic-auth").is_some());

        let empty = SourceCache::new();
        let mut ctx = Context::new(&empty, &config);
        let spec = vhost_policy(&mut ctx, &owner(), "default", &options);
        let out = ctx.finish();
        assert!(spec.ext_auth.is_some());
        assert_eq!(out.diagnostics.of(Category::UnknownReference).count(), 1);
    }

    #[test]
    fn append_false_headers_overwrite() {
        let headers: HeaderManipulation = serde_json::from_value(json!({
            "requestHeadersToAdd": [
                {"header": {"key": "x-env", "value": "prod"}, "append": false},
                {"header": {"key": "x-trace", "value": "on"}}
            ],
            "responseHeadersToRemove": ["server"]
        }))
        .expect("headers decode");
        let filters = header_filters(&headers);
        assert_eq!(filters.len(), 2);
        let request = filters[0].request_header_modifier.as_ref().expect("request modifier");
        assert_eq!(request.set[0].name, "x-env");
        assert_eq!(request.add[0].name, "x-trace");
        let response = filters[1].response_header_modifier.as_ref().expect("response modifier");
        assert_eq!(response.remove, vec!["server".to_string()]);
    }

    #[test]
    fn rule_values_win_over_virtual_host_defaults() {
        let defaults = RuleDefaults {
            filters: vec![HttpRouteFilter::request_headers(HeaderModifier {
                set: vec![
                    HttpHeader {
                        name: "x-env".to_string(),
                        value: "vhost".to_string(),
                    },
                    HttpHeader {
                        name: "x-team".to_string(),
                        value: "edge".to_string(),
                    },
                ],
                ..HeaderModifier::default()
            })],
            retry: Some(HttpRouteRetry {
                attempts: Some(5),
                ..HttpRouteRetry::default()
            }),
            backend_timeout: Some("2s".to_string()),
        };
        let mut rule = HttpRouteRule {
            filters: vec![HttpRouteFilter::request_headers(HeaderModifier {
                set: vec![HttpHeader {
                    name: "x-env".to_string(),
                    value: "route".to_string(),
                }],
                ..HeaderModifier::default()
            })],
            retry: Some(HttpRouteRetry {
                attempts: Some(1),
                ..HttpRouteRetry::default()
            }),
            ..HttpRouteRule::default()
        };
        defaults.apply(&mut rule);

        assert_eq!(rule.filters.len(), 1);
        let set = &rule.filters[0].request_header_modifier.as_ref().expect("modifier").set;
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].value, "route");
        assert_eq!(rule.retry.as_ref().and_then(|r| r.attempts), Some(1));
        assert!(rule.timeouts.is_none());
    }

    #[test]
    fn per_try_timeout_becomes_backend_timeout() {
        let retries: RetryPolicy = serde_json::from_value(json!({
            "retryOn": "gateway-error,connect-failure",
            "numRetries": 3,
            "perTryTimeout": "1s",
            "retryBackOff": {"baseInterval": "100ms", "maxInterval": "1s"}
        }))
        .expect("retries decode");
        let mapped = route_retry(&retries);
        let (retry, per_try) = mapped.value;
        assert_eq!(retry.codes, vec![502, 503, 504]);
        assert_eq!(retry.attempts, Some(3));
        assert_eq!(retry.backoff.as_deref(), Some("100ms"));
        assert_eq!(per_try.as_deref(), Some("1s"));
        assert_eq!(
            mapped.findings.messages(),
            vec!["retries.retryBackOff.maxInterval is not supported"]
        );
    }

    #[test]
    fn targeted_and_orphaned_options() {
        let source = cache(vec![
            json!({
                "kind": "RouteOption",
                "metadata": {"name": "faults", "namespace": "default"},
                "spec": {
                    "targetRefs": [{"group": "gateway.networking.k8s.io", "kind": "HTTPRoute", "name": "shop"}],
                    "options": {"cors": {"allowOrigin": ["https://shop.example.com"]}}
                }
            }),
            json!({
                "kind": "VirtualHostOption",
                "metadata": {"name": "lonely", "namespace": "default"},
                "spec": {"options": {"cors": {"allowOrigin": ["*"]}}}
            }),
        ]);
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        translate_detached_options(&mut ctx);
        let out = ctx.finish();

        let policy = out.target.traffic_policy("default", "faults").expect("route option policy");
        assert_eq!(policy.spec.target_refs[0].kind, "HTTPRoute");
        assert!(out.target.traffic_policy("default", "lonely").is_none());
        assert_eq!(out.diagnostics.of(Category::NoReferences).count(), 1);
    }
}
