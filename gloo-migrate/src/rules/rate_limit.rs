//! Rate limit descriptors and token buckets.

use crate::source::is_unset;
use crate::source::policy::{
    LocalRateLimit as SourceLocal, RateLimitAction as SourceAction, RateLimitActions as SourceActions,
    RateLimitExtension,
};
use crate::target::policy::{
    Empty, GenericKeyAction, GlobalRateLimit, HeaderValueMatchAction, LocalRateLimit, MetadataAction, MetadataKey,
    RateLimitAction, RateLimitActions, RateLimitPolicy, RequestHeadersAction, TokenBucket,
};
use crate::target::LocalRef;

use super::matchers::rate_limit_header;
use super::{Findings, Mapped};

/// Convert one descriptor action. Keys with no target action kind are
/// reported one finding each; an action left with no kind maps to `None`.
pub fn action(source: &SourceAction) -> Mapped<Option<RateLimitAction>> {
    let mut findings = Findings::new();
    for (key, value) in &source.other {
        if !is_unset(value) {
            findings.unsupported(format!("rateLimit action {key} is not supported"));
        }
    }

    let present = |v: &Option<serde_json::Value>| v.is_some().then_some(Empty {});
    let out = RateLimitAction {
        source_cluster: present(&source.source_cluster),
        destination_cluster: present(&source.destination_cluster),
        remote_address: present(&source.remote_address),
        request_headers: source.request_headers.as_ref().map(|h| RequestHeadersAction {
            header_name: h.header_name.clone(),
            descriptor_key: h.descriptor_key.clone(),
            skip_if_absent: h.skip_if_absent.then_some(true),
        }),
        generic_key: source.generic_key.as_ref().map(|g| GenericKeyAction {
            descriptor_value: g.descriptor_value.clone(),
            descriptor_key: g.descriptor_key.clone(),
        }),
        header_value_match: source.header_value_match.as_ref().map(|m| HeaderValueMatchAction {
            descriptor_value: m.descriptor_value.clone(),
            expect_match: m.expect_match,
            headers: m.headers.iter().map(rate_limit_header).collect(),
        }),
        metadata: source.metadata.as_ref().map(|m| MetadataAction {
            descriptor_key: m.descriptor_key.clone(),
            metadata_key: MetadataKey {
                key: m.metadata_key.key.clone(),
                path: m.metadata_key.path.iter().map(|p| p.key.clone()).collect(),
            },
            default_value: m.default_value.clone(),
            source: m.source.clone(),
        }),
    };

    let value = (out != RateLimitAction::default()).then_some(out);
    Mapped::new(value, findings)
}

pub fn descriptor(source: &SourceActions) -> Mapped<Option<RateLimitActions>> {
    let mut findings = Findings::new();
    if source.limit.as_ref().is_some_and(|l| !is_unset(l)) {
        findings.unsupported("rateLimit action limit is not supported");
    }
    let mut out = RateLimitActions::default();
    for a in &source.actions {
        out.actions.extend(findings.absorb(action(a)));
    }
    for a in &source.set_actions {
        out.set_actions.extend(findings.absorb(action(a)));
    }
    let empty = out.actions.is_empty() && out.set_actions.is_empty();
    Mapped::new((!empty).then_some(out), findings)
}

/// Global rate limiting through the named rate limit extension.
pub fn global(source: &RateLimitExtension, extension: &str) -> Mapped<Option<RateLimitPolicy>> {
    let mut findings = Findings::new();
    if source.include_vh_rate_limits {
        findings.unsupported("rateLimit includeVhRateLimits is not supported");
    }
    let rate_limits: Vec<RateLimitActions> = source
        .rate_limits
        .iter()
        .filter_map(|d| findings.absorb(descriptor(d)))
        .collect();
    if rate_limits.is_empty() {
        return Mapped::new(None, findings);
    }
    let policy = RateLimitPolicy {
        global: Some(GlobalRateLimit {
            extension_ref: LocalRef::new(extension),
            rate_limits,
        }),
        local: None,
    };
    Mapped::new(Some(policy), findings)
}

pub fn local(source: &SourceLocal) -> Mapped<Option<RateLimitPolicy>> {
    let mut findings = Findings::new();
    findings.overflow("httpLocalRatelimit", &source.other);
    let policy = source.default_limit.as_ref().map(|bucket| RateLimitPolicy {
        global: None,
        local: Some(LocalRateLimit {
            token_bucket: TokenBucket {
                max_tokens: bucket.max_tokens,
                tokens_per_fill: bucket.tokens_per_fill,
                fill_interval: bucket.fill_interval.clone(),
            },
        }),
    });
    Mapped::new(policy, findings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{descriptor, global};
    use crate::source::policy::{RateLimitActions, RateLimitExtension};

    fn actions(raw: serde_json::Value) -> RateLimitActions {
        serde_json::from_value(raw).expect("actions decode")
    }

    #[test]
    fn unknown_action_kind_yields_one_finding() {
        let source = actions(json!({
            "actions": [
                {"genericKey": {"descriptorValue": "per-route"}},
                {"maskedRemoteAddress": {"v4PrefixMaskLen": 16}}
            ]
        }));
        let mapped = descriptor(&source);
        let out = mapped.value.expect("descriptor kept");
        assert_eq!(out.actions.len(), 1);
        assert_eq!(
            out.actions[0].generic_key.as_ref().map(|g| g.descriptor_value.as_str()),
            Some("per-route")
        );
        assert_eq!(
            mapped.findings.messages(),
            vec!["rateLimit action maskedRemoteAddress is not supported"]
        );
    }

    #[test]
    fn limit_override_is_reported() {
        let source = actions(json!({
            "actions": [{"remoteAddress": {}}],
            "limit": {"dynamicMetadata": {"metadataKey": {"key": "envoy.lb"}}}
        }));
        let mapped = descriptor(&source);
        assert!(mapped.value.expect("kept").actions[0].remote_address.is_some());
        assert_eq!(mapped.findings.messages(), vec!["rateLimit action limit is not supported"]);
    }

    #[test]
    fn global_policy_points_at_extension() {
        let source = RateLimitExtension {
            rate_limits: vec![actions(json!({
                "setActions": [{"requestHeaders": {"headerName": "x-user", "descriptorKey": "user"}}]
            }))],
            include_vh_rate_limits: false,
        };
        let policy = global(&source, "rate-limit").value.expect("policy");
        let global = policy.global.expect("global");
        assert_eq!(global.extension_ref.name, "rate-limit");
        assert_eq!(global.rate_limits[0].set_actions[0].request_headers.as_ref().map(|h| h.descriptor_key.as_str()), Some("user"));
    }
}
