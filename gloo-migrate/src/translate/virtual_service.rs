//! Virtual services become HTTPRoutes attached where the gateway stage put
//! their listeners.

use tracing::debug;

use crate::context::Context;
use crate::identity::{ResourceIdentity, SourceKind};
use crate::rules::Findings;
use crate::source::{ResourceRef, VirtualService};
use crate::target::route::ParentReference;
use crate::target::{HttpRouteSpec, Object, PolicyTargetRef};

use super::gateway::Attachments;
use super::identity_of;
use super::options::{rule_defaults, vhost_policy, RuleDefaults};
use super::route::translate_route;

pub fn translate_virtual_services(ctx: &mut Context<'_>, attachments: &Attachments) {
    let source = ctx.source;
    for vs in source.virtual_services() {
        translate_virtual_service(ctx, vs, attachments);
    }
}

fn translate_virtual_service(ctx: &mut Context<'_>, vs: &VirtualService, attachments: &Attachments) {
    let identity = identity_of(SourceKind::VirtualService, vs);
    let namespace = vs.namespace();
    let host = &vs.spec.virtual_host;

    let mut findings = Findings::new();
    findings.overflow("virtualService", &vs.spec.other);
    ctx.report(&identity, findings);

    let attached = attachments.get(&identity).map(Vec::as_slice).unwrap_or_default();
    if attached.is_empty() {
        ctx.no_references(&identity, "virtual service is not selected by any gateway");
    }
    let mut parent_refs: Vec<ParentReference> = Vec::new();
    for attachment in attached {
        if !parent_refs.contains(&attachment.parent_ref) {
            parent_refs.push(attachment.parent_ref.clone());
        }
    }
    let mut targets: Vec<PolicyTargetRef> = Vec::new();
    for attachment in attached {
        if !targets.contains(&attachment.policy_target) {
            targets.push(attachment.policy_target.clone());
        }
    }
    if targets.is_empty() {
        targets.push(PolicyTargetRef::http_route(vs.name()));
    }

    let mut defaults = RuleDefaults::default();
    if let Some(options) = &host.options {
        let mut policy = vhost_policy(ctx, &identity, namespace, options);
        if !policy.is_empty() {
            policy.target_refs = targets.clone();
            ctx.upsert(Object::new(namespace, vs.name(), policy));
        }
        defaults = rule_defaults(ctx, &identity, &options.policy);
    }
    let delegated = host
        .options_config_refs
        .iter()
        .flat_map(|refs| refs.delegate_options.iter());
    for reference in delegated {
        if let Some(extra) = delegated_host_option(ctx, &identity, namespace, reference, &targets) {
            defaults.merge(extra);
        }
    }

    let mut rules = Vec::with_capacity(host.routes.len());
    for (index, route) in host.routes.iter().enumerate() {
        let mut rule = translate_route(ctx, &identity, namespace, index, route);
        defaults.apply(&mut rule);
        rules.push(rule);
    }

    let spec = HttpRouteSpec {
        parent_refs,
        hostnames: host
            .domains
            .iter()
            .filter(|d| d.as_str() != "*" && !d.contains(':'))
            .cloned()
            .collect(),
        rules,
    };
    let mut route = Object::new(namespace, vs.name(), spec);
    route.metadata.labels = vs.metadata.labels.clone();
    debug!(virtual_service = %identity, rules = route.spec.rules.len(), "http route built");
    ctx.upsert_from(&identity, route);
}

/// A VirtualHostOption pulled in by reference. Its policy part becomes a
/// TrafficPolicy named after the option; several virtual services sharing it
/// add their targets to the same policy.
fn delegated_host_option(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    reference: &ResourceRef,
    targets: &[PolicyTargetRef],
) -> Option<RuleDefaults> {
    let option_namespace = reference.namespace_or(namespace);
    if option_namespace != namespace {
        ctx.unsupported(
            owner,
            format!(
                "VirtualHostOption {option_namespace}/{} is outside namespace {namespace}",
                reference.name
            ),
        );
        return None;
    }
    let Ok(option) = ctx.resolver().virtual_host_option(reference, namespace) else {
        ctx.unknown_reference(
            owner,
            format!(
                "references VirtualHostOption {option_namespace}/{} that does not exist",
                reference.name
            ),
        );
        return None;
    };
    let identity = identity_of(SourceKind::VirtualHostOption, option);
    let first_use = !ctx.is_attached(&identity);
    ctx.mark_attached(identity.clone());

    if let Some(existing) = ctx.target.traffic_policy_mut(namespace, option.name()) {
        for target in targets {
            if !existing.spec.target_refs.contains(target) {
                existing.spec.target_refs.push(target.clone());
            }
        }
    } else if first_use {
        let mut policy = vhost_policy(ctx, &identity, namespace, &option.spec.options);
        if policy.is_empty() {
            ctx.ignored(&identity, "VirtualHostOption produces no policy");
        } else {
            policy.target_refs = targets.to_vec();
            ctx.upsert(Object::new(namespace, option.name(), policy));
        }
    }
    Some(rule_defaults(ctx, &identity, &option.spec.options.policy))
}
