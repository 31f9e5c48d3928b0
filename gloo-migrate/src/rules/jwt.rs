//! JWT providers, staged before or after external auth.

use crate::source::policy::{JwtProvider as SourceProvider, JwtStage, JwtStaged};
use crate::target::policy::{
    ClaimToHeader, Jwks, JwksAsyncFetch, JwtPolicy, JwtProvider, LocalJwks, RemoteJwks, StagedJwt, TokenHeader,
    TokenSource,
};

use super::{pascal_case, BackendLookup, Findings, Mapped};

pub fn staged(source: &JwtStaged, namespace: &str, lookup: &dyn BackendLookup) -> Mapped<Option<StagedJwt>> {
    let mut findings = Findings::new();
    let out = StagedJwt {
        before_ext_auth: source
            .before_ext_auth
            .as_ref()
            .map(|s| findings.absorb(stage("beforeExtAuth", s, namespace, lookup))),
        after_ext_auth: source
            .after_ext_auth
            .as_ref()
            .map(|s| findings.absorb(stage("afterExtAuth", s, namespace, lookup))),
    };
    let empty = out.before_ext_auth.is_none() && out.after_ext_auth.is_none();
    Mapped::new((!empty).then_some(out), findings)
}

fn stage(name: &str, source: &JwtStage, namespace: &str, lookup: &dyn BackendLookup) -> Mapped<JwtPolicy> {
    let mut findings = Findings::new();
    let providers = source
        .providers
        .iter()
        .map(|(provider_name, p)| {
            let path = format!("jwtStaged.{name}.providers.{provider_name}");
            (provider_name.clone(), findings.absorb(provider(&path, p, namespace, lookup)))
        })
        .collect();
    let validation_policy = if source.allow_missing_or_failed_jwt {
        Some("AllowMissingOrFailed".to_string())
    } else {
        source.validation_policy.as_deref().map(pascal_case)
    };
    Mapped::new(
        JwtPolicy {
            providers,
            validation_policy,
            disable: source.disable.then_some(true),
        },
        findings,
    )
}

pub fn provider(
    path: &str,
    source: &SourceProvider,
    namespace: &str,
    lookup: &dyn BackendLookup,
) -> Mapped<JwtProvider> {
    let mut findings = Findings::new();
    findings.overflow(path, &source.other);

    let jwks = source.jwks.as_ref().map(|jwks| Jwks {
        local: jwks.local.as_ref().map(|l| LocalJwks { key: l.key.clone() }),
        remote: jwks.remote.as_ref().map(|r| RemoteJwks {
            url: r.url.clone(),
            backend_ref: r
                .upstream_ref
                .as_ref()
                .map(|u| findings.absorb(lookup.backend_ref(u, namespace))),
            cache_duration: r.cache_duration.clone(),
            async_fetch: r.async_fetch.as_ref().map(|a| JwksAsyncFetch {
                fast_listener: a.get("fastListener").and_then(|v| v.as_bool()),
            }),
        }),
    });

    let out = JwtProvider {
        issuer: source.issuer.clone(),
        audiences: source.audiences.clone(),
        jwks,
        token_source: source.token_source.as_ref().map(|t| TokenSource {
            headers: t
                .headers
                .iter()
                .map(|h| TokenHeader {
                    header: h.header.clone(),
                    prefix: h.prefix.clone(),
                })
                .collect(),
            query_params: t.query_params.clone(),
        }),
        keep_token: source.keep_token.then_some(true),
        claims_to_headers: source
            .claims_to_headers
            .iter()
            .map(|c| ClaimToHeader {
                claim: c.claim.clone(),
                header: c.header.clone(),
                append: c.append.then_some(true),
            })
            .collect(),
        clock_skew_seconds: source.clock_skew_seconds,
        attach_failed_status_to_metadata: source.attach_failed_status_to_metadata.clone(),
    };
    Mapped::new(out, findings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::staged;
    use crate::rules::SameNameBackends;
    use crate::source::policy::JwtStaged;

    #[test]
    fn providers_map_with_remote_jwks_backend() {
        let source: JwtStaged = serde_json::from_value(json!({
            "afterExtAuth": {
                "allowMissingOrFailedJwt": true,
                "providers": {
                    "auth0": {
                        "issuer": "https://acme.auth0.com/",
                        "audiences": ["shop"],
                        "keepToken": true,
                        "jwks": {"remote": {
                            "url": "https://acme.auth0.com/.well-known/jwks.json",
                            "upstreamRef": {"name": "auth0", "namespace": "gloo-system"}
                        }},
                        "claimsToHeaders": [{"claim": "sub", "header": "x-sub"}]
                    }
                }
            }
        }))
        .expect("jwt decodes");

        let mapped = staged(&source, "default", &SameNameBackends);
        assert!(mapped.findings.is_empty());
        let after = mapped.value.and_then(|s| s.after_ext_auth).expect("after stage");
        assert_eq!(after.validation_policy.as_deref(), Some("AllowMissingOrFailed"));
        let provider = &after.providers["auth0"];
        assert_eq!(provider.keep_token, Some(true));
        let backend = provider
            .jwks
            .as_ref()
            .and_then(|j| j.remote.as_ref())
            .and_then(|r| r.backend_ref.as_ref())
            .expect("backend ref");
        assert_eq!(backend.name, "auth0");
        assert_eq!(backend.namespace.as_deref(), Some("gloo-system"));
    }

    #[test]
    fn validation_policy_is_pascal_cased() {
        let source: JwtStaged = serde_json::from_value(json!({
            "beforeExtAuth": {"validationPolicy": "REQUIRE_VALID", "providers": {}}
        }))
        .expect("jwt decodes");
        let before = staged(&source, "default", &SameNameBackends)
            .value
            .and_then(|s| s.before_ext_auth)
            .expect("before stage");
        assert_eq!(before.validation_policy.as_deref(), Some("RequireValid"));
    }
}
