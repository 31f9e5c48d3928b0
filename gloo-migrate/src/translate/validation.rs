//! Corrections made after every stage so the output fits the validation
//! limits of the Gateway API CRDs.
//!
//! A rule carrying a URLRewrite filter may only have one match, an
//! HTTPRoute holds at most [`MAX_ROUTE_RULES`] rules and a ListenerSet at
//! most [`MAX_LISTENER_SET_LISTENERS`] listeners. Oversized resources are
//! split into `{name}-{i}` parts and every reference to the original is
//! pointed at all of the parts.

use tracing::debug;

use crate::context::Context;
use crate::identity::{ResourceIdentity, SourceKind};
use crate::target::route::{HttpBackendRef, HttpRouteRule, ParentReference};
use crate::target::{PolicyTargetRef, TargetKey, TargetKind, TargetResource};

pub const MAX_ROUTE_RULES: usize = 16;
pub const MAX_LISTENER_SET_LISTENERS: usize = 64;

const URL_REWRITE: &str = "URLRewrite";

pub fn correct(ctx: &mut Context<'_>) {
    split_rewrites_per_match(ctx);
    split_listener_sets(ctx);
    split_http_routes(ctx);
}

fn route_keys(ctx: &Context<'_>) -> Vec<(String, String)> {
    ctx.target
        .http_routes()
        .map(|route| (route.namespace().to_string(), route.name().to_string()))
        .collect()
}

/// Source resource to charge a correction to.
fn origin(ctx: &Context<'_>, kind: TargetKind, namespace: &str, name: &str) -> ResourceIdentity {
    ctx.origin_of(&TargetKey::new(kind, namespace, name))
        .cloned()
        .unwrap_or_else(|| ResourceIdentity::new(SourceKind::VirtualService, namespace, name))
}

fn split_rewrites_per_match(ctx: &mut Context<'_>) {
    for (namespace, name) in route_keys(ctx) {
        let Some(route) = ctx.target.http_route_mut(&namespace, &name) else {
            continue;
        };
        let mut split = Vec::new();
        let mut rules = Vec::with_capacity(route.spec.rules.len());
        for (index, rule) in std::mem::take(&mut route.spec.rules).into_iter().enumerate() {
            let rewrites = rule.filters.iter().any(|f| f.filter_type == URL_REWRITE);
            if !rewrites || rule.matches.len() < 2 {
                rules.push(rule);
                continue;
            }
            split.push((index, rule.matches.len()));
            for matched in &rule.matches {
                rules.push(HttpRouteRule {
                    matches: vec![matched.clone()],
                    ..rule.clone()
                });
            }
        }
        route.spec.rules = rules;

        let owner = origin(ctx, TargetKind::HttpRoute, &namespace, &name);
        for (index, matches) in split {
            ctx.correction(
                &owner,
                format!("HTTPRoute rule {index} has a URLRewrite filter and {matches} matches, splitting into one rule per match"),
            );
        }
    }
}

fn split_listener_sets(ctx: &mut Context<'_>) {
    let oversized: Vec<(String, String)> = ctx
        .target
        .listener_sets()
        .filter(|set| set.spec.listeners.len() > MAX_LISTENER_SET_LISTENERS)
        .map(|set| (set.namespace().to_string(), set.name().to_string()))
        .collect();
    for (namespace, name) in oversized {
        let key = TargetKey::new(TargetKind::ListenerSet, &namespace, &name);
        let owner = origin(ctx, TargetKind::ListenerSet, &namespace, &name);
        let Some(TargetResource::ListenerSet(set)) = ctx.target.remove(&key) else {
            continue;
        };
        let parts: Vec<_> = set.spec.listeners.chunks(MAX_LISTENER_SET_LISTENERS).collect();
        ctx.correction(
            &owner,
            format!(
                "ListenerSet contains too many listeners {}, splitting into {} new ListenerSet",
                set.spec.listeners.len(),
                parts.len()
            ),
        );
        let mut names = Vec::with_capacity(parts.len());
        for (i, listeners) in parts.into_iter().enumerate() {
            let mut part = set.clone();
            part.metadata.name = format!("{name}-{i}");
            part.spec.listeners = listeners.to_vec();
            names.push(part.metadata.name.clone());
            ctx.upsert_from(&owner, part);
        }
        retarget_parents(ctx, &namespace, &name, &names);
        retarget_policies(ctx, TargetKind::ListenerSet, &namespace, &name, &names);
        debug!(listener_set = %name, parts = names.len(), "listener set split");
    }
}

fn split_http_routes(ctx: &mut Context<'_>) {
    for (namespace, name) in route_keys(ctx) {
        let key = TargetKey::new(TargetKind::HttpRoute, &namespace, &name);
        let oversized = ctx
            .target
            .http_route(&namespace, &name)
            .is_some_and(|route| route.spec.rules.len() > MAX_ROUTE_RULES);
        if !oversized {
            continue;
        }
        let owner = origin(ctx, TargetKind::HttpRoute, &namespace, &name);
        let Some(TargetResource::HttpRoute(route)) = ctx.target.remove(&key) else {
            continue;
        };
        let parts: Vec<_> = route.spec.rules.chunks(MAX_ROUTE_RULES).collect();
        ctx.correction(
            &owner,
            format!(
                "HTTPRoute contains too many route rules {}, splitting into {} new HTTPRoutes",
                route.spec.rules.len(),
                parts.len()
            ),
        );
        let mut names = Vec::with_capacity(parts.len());
        for (i, rules) in parts.into_iter().enumerate() {
            let mut part = route.clone();
            part.metadata.name = format!("{name}-{i}");
            part.spec.rules = rules.to_vec();
            names.push(part.metadata.name.clone());
            ctx.upsert_from(&owner, part);
        }
        retarget_delegation(ctx, &namespace, &name, &names);
        retarget_policies(ctx, TargetKind::HttpRoute, &namespace, &name, &names);
        debug!(http_route = %name, parts = names.len(), "http route split");
    }
}

/// Routes attached to a split ListenerSet attach to every part.
fn retarget_parents(ctx: &mut Context<'_>, namespace: &str, name: &str, parts: &[String]) {
    let kind = TargetKind::ListenerSet.as_str();
    for (route_namespace, route_name) in route_keys(ctx) {
        let Some(route) = ctx.target.http_route_mut(&route_namespace, &route_name) else {
            continue;
        };
        let matches = |parent: &ParentReference| {
            parent.kind.as_deref() == Some(kind)
                && parent.name == name
                && parent.namespace.as_deref().unwrap_or(&route_namespace) == namespace
        };
        route.spec.parent_refs = expand(std::mem::take(&mut route.spec.parent_refs), &matches, parts, |parent, part| {
            ParentReference {
                name: part.to_string(),
                ..parent.clone()
            }
        });
    }
}

/// Parents delegating to a split route by name delegate to every part.
fn retarget_delegation(ctx: &mut Context<'_>, namespace: &str, name: &str, parts: &[String]) {
    let kind = TargetKind::HttpRoute.as_str();
    for (route_namespace, route_name) in route_keys(ctx) {
        let Some(route) = ctx.target.http_route_mut(&route_namespace, &route_name) else {
            continue;
        };
        let matches = |backend: &HttpBackendRef| {
            backend.kind.as_deref() == Some(kind)
                && backend.name == name
                && backend.namespace.as_deref().unwrap_or(&route_namespace) == namespace
        };
        for rule in &mut route.spec.rules {
            rule.backend_refs = expand(std::mem::take(&mut rule.backend_refs), &matches, parts, |backend, part| {
                HttpBackendRef {
                    name: part.to_string(),
                    ..backend.clone()
                }
            });
        }
    }
}

/// Policies are namespace-local, so only those next to the split resource
/// can target it.
fn retarget_policies(ctx: &mut Context<'_>, kind: TargetKind, namespace: &str, name: &str, parts: &[String]) {
    let matches = |target: &PolicyTargetRef| target.kind == kind.as_str() && target.name == name;
    let rename = |target: &PolicyTargetRef, part: &str| PolicyTargetRef {
        name: part.to_string(),
        ..target.clone()
    };

    let traffic: Vec<String> = ctx
        .target
        .traffic_policies()
        .filter(|p| p.namespace() == namespace && p.spec.target_refs.iter().any(&matches))
        .map(|p| p.name().to_string())
        .collect();
    for policy_name in traffic {
        if let Some(policy) = ctx.target.traffic_policy_mut(namespace, &policy_name) {
            policy.spec.target_refs = expand(std::mem::take(&mut policy.spec.target_refs), &matches, parts, &rename);
        }
    }

    let listener: Vec<String> = ctx
        .target
        .http_listener_policies()
        .filter(|p| p.namespace() == namespace && p.spec.target_refs.iter().any(&matches))
        .map(|p| p.name().to_string())
        .collect();
    for policy_name in listener {
        if let Some(policy) = ctx.target.http_listener_policy_mut(namespace, &policy_name) {
            policy.spec.target_refs = expand(std::mem::take(&mut policy.spec.target_refs), &matches, parts, &rename);
        }
    }
}

/// Replace every matching entry with one copy per part, keeping order.
fn expand<T: Clone>(
    entries: Vec<T>,
    matches: impl Fn(&T) -> bool,
    parts: &[String],
    rename: impl Fn(&T, &str) -> T,
) -> Vec<T> {
    let mut out = Vec::with_capacity(entries.len() + parts.len());
    for entry in entries {
        if matches(&entry) {
            out.extend(parts.iter().map(|part| rename(&entry, part)));
        } else {
            out.push(entry);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{correct, MAX_LISTENER_SET_LISTENERS};
    use crate::config::MigrateConfig;
    use crate::context::Context;
    use crate::diagnostics::Category;
    use crate::identity::{ResourceIdentity, SourceKind};
    use crate::source::SourceCache;
    use crate::target::gateway::{Listener, ListenerSetSpec};
    use crate::target::route::{
        HttpBackendRef, HttpPathMatch, HttpRouteFilter, HttpRouteMatch, HttpRouteRule, ParentReference, UrlRewrite,
        PATH_PREFIX,
    };
    use crate::target::{
        HttpRouteSpec, Object, PolicyTargetRef, TargetKind, TrafficPolicySpec, GATEWAY_API_GROUP, GATEWAY_API_X_GROUP,
    };

    fn prefix_rule(prefix: &str) -> HttpRouteRule {
        HttpRouteRule {
            matches: vec![HttpRouteMatch {
                path: Some(HttpPathMatch::new(PATH_PREFIX, prefix)),
                ..HttpRouteMatch::default()
            }],
            ..HttpRouteRule::default()
        }
    }

    #[test]
    fn rewrite_rule_with_two_matches_becomes_two_rules() {
        let source = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "gloo-system", "shop");

        let mut rewrite = prefix_rule("/api");
        rewrite.matches.push(prefix_rule("/v1").matches.remove(0));
        rewrite.filters.push(HttpRouteFilter::rewrite(UrlRewrite::default()));
        let spec = HttpRouteSpec {
            rules: vec![prefix_rule("/healthz"), rewrite],
            ..HttpRouteSpec::default()
        };
        ctx.upsert_from(&vs, Object::new("gloo-system", "shop", spec));

        correct(&mut ctx);
        let out = ctx.finish();
        let route = out.target.http_route("gloo-system", "shop").expect("route");
        let prefixes: Vec<String> = route
            .spec
            .rules
            .iter()
            .map(|rule| {
                assert_eq!(rule.matches.len(), 1);
                rule.matches[0].path.as_ref().map(|p| p.value.clone()).unwrap_or_default()
            })
            .collect();
        assert_eq!(prefixes, vec!["/healthz", "/api", "/v1"]);
        assert_eq!(route.spec.rules[2].filters.len(), 1);
        let corrections: Vec<&str> = out
            .diagnostics
            .of(Category::ValidationCorrection)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            corrections,
            vec!["HTTPRoute rule 1 has a URLRewrite filter and 2 matches, splitting into one rule per match"]
        );
    }

    #[test]
    fn route_with_seventeen_rules_is_split_and_references_follow() {
        let source = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        let table = ResourceIdentity::new(SourceKind::RouteTable, "apps", "catalog");
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "apps", "shop");

        let rules: Vec<HttpRouteRule> = (0..17).map(|i| prefix_rule(&format!("/items/{i}"))).collect();
        ctx.upsert_from(
            &table,
            Object::new(
                "apps",
                "catalog",
                HttpRouteSpec {
                    rules,
                    ..HttpRouteSpec::default()
                },
            ),
        );
        let mut parent_rule = prefix_rule("/");
        parent_rule.backend_refs.push(HttpBackendRef {
            group: Some(GATEWAY_API_GROUP.to_string()),
            kind: Some(TargetKind::HttpRoute.as_str().to_string()),
            name: "catalog".to_string(),
            namespace: Some("apps".to_string()),
            ..HttpBackendRef::default()
        });
        ctx.upsert_from(
            &vs,
            Object::new(
                "apps",
                "shop",
                HttpRouteSpec {
                    rules: vec![parent_rule],
                    ..HttpRouteSpec::default()
                },
            ),
        );
        ctx.upsert(Object::new(
            "apps",
            "catalog-policy",
            TrafficPolicySpec {
                target_refs: vec![PolicyTargetRef::http_route("catalog")],
                ..TrafficPolicySpec::default()
            },
        ));

        correct(&mut ctx);
        let out = ctx.finish();

        assert!(out.target.http_route("apps", "catalog").is_none());
        let first = out.target.http_route("apps", "catalog-0").expect("first part");
        let second = out.target.http_route("apps", "catalog-1").expect("second part");
        assert_eq!(first.spec.rules.len(), 16);
        assert_eq!(second.spec.rules.len(), 1);

        let parent = out.target.http_route("apps", "shop").expect("parent");
        let delegated: Vec<&str> = parent.spec.rules[0].backend_refs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(delegated, vec!["catalog-0", "catalog-1"]);

        let policy = out.target.traffic_policy("apps", "catalog-policy").expect("policy");
        let targets: Vec<&str> = policy.spec.target_refs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(targets, vec!["catalog-0", "catalog-1"]);

        let corrections: Vec<_> = out.diagnostics.of(Category::ValidationCorrection).collect();
        assert_eq!(corrections.len(), 1);
        assert_eq!(corrections[0].source, table);
        assert_eq!(
            corrections[0].message,
            "HTTPRoute contains too many route rules 17, splitting into 2 new HTTPRoutes"
        );
    }

    #[test]
    fn listener_set_over_the_limit_is_split_and_routes_attach_to_each_part() {
        let source = SourceCache::new();
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "apps", "shop");

        let listeners: Vec<Listener> = (0..=MAX_LISTENER_SET_LISTENERS)
            .map(|i| Listener::http(format!("shop-{i}"), Some(format!("host{i}.example.com")), 8080))
            .collect();
        ctx.upsert_from(
            &vs,
            Object::new(
                "apps",
                "edge-8080-shop-apps",
                ListenerSetSpec {
                    listeners,
                    ..ListenerSetSpec::default()
                },
            ),
        );
        ctx.upsert_from(
            &vs,
            Object::new(
                "apps",
                "shop",
                HttpRouteSpec {
                    parent_refs: vec![ParentReference {
                        group: Some(GATEWAY_API_X_GROUP.to_string()),
                        kind: Some(TargetKind::ListenerSet.as_str().to_string()),
                        name: "edge-8080-shop-apps".to_string(),
                        namespace: Some("apps".to_string()),
                        section_name: None,
                    }],
                    rules: vec![prefix_rule("/")],
                    ..HttpRouteSpec::default()
                },
            ),
        );
        ctx.upsert(Object::new(
            "apps",
            "shop",
            TrafficPolicySpec {
                target_refs: vec![PolicyTargetRef::of(TargetKind::ListenerSet, "edge-8080-shop-apps")],
                ..TrafficPolicySpec::default()
            },
        ));

        correct(&mut ctx);
        let out = ctx.finish();

        assert_eq!(out.target.count(TargetKind::ListenerSet), 2);
        let first = out.target.listener_set("apps", "edge-8080-shop-apps-0").expect("first part");
        let second = out.target.listener_set("apps", "edge-8080-shop-apps-1").expect("second part");
        assert_eq!(first.spec.listeners.len(), 64);
        assert_eq!(second.spec.listeners.len(), 1);

        let route = out.target.http_route("apps", "shop").expect("route");
        let parents: Vec<&str> = route.spec.parent_refs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(parents, vec!["edge-8080-shop-apps-0", "edge-8080-shop-apps-1"]);
        let policy = out.target.traffic_policy("apps", "shop").expect("policy");
        assert_eq!(policy.spec.target_refs.len(), 2);

        let corrections: Vec<&str> = out
            .diagnostics
            .of(Category::ValidationCorrection)
            .map(|d| d.message.as_str())
            .collect();
        assert_eq!(
            corrections,
            vec!["ListenerSet contains too many listeners 65, splitting into 2 new ListenerSet"]
        );
    }
}
