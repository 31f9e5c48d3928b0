//! AI gateway route policies.

use crate::source::policy::{AiAuthToken, AiRegex, AiRoute, AiWebhook};
use crate::target::policy::{
    AiPolicy, CustomResponse, FieldDefault, Message, Moderation, OpenAiModeration, PromptEnrichment, PromptGuard,
    PromptGuardRequest, PromptGuardResponse, PromptRegex, RegexMatch, SingleAuthToken, Webhook, WebhookHost,
};
use crate::target::route::HttpHeaderMatch;
use crate::target::LocalRef;

use super::{Findings, Mapped};

/// Map an AI route. `namespace` is the namespace of the owning resource;
/// secrets must live beside it.
pub fn ai(source: &AiRoute, namespace: &str) -> Mapped<Option<AiPolicy>> {
    let mut findings = Findings::new();
    findings.overflow("ai", &source.other);

    let defaults = source
        .defaults
        .iter()
        .map(|d| FieldDefault {
            field: d.field.clone(),
            value: d.value.to_string(),
            override_value: d.override_value.then_some(true),
        })
        .collect();

    let prompt_enrichment = source.prompt_enrichment.as_ref().map(|e| PromptEnrichment {
        prepend: e.prepend.iter().map(|m| message(&m.role, &m.content)).collect(),
        append: e.append.iter().map(|m| message(&m.role, &m.content)).collect(),
    });

    let prompt_guard = source.prompt_guard.as_ref().map(|guard| PromptGuard {
        request: guard.request.as_ref().map(|req| PromptGuardRequest {
            custom_response: req.custom_response.as_ref().map(|c| CustomResponse {
                message: (!c.message.is_empty()).then(|| c.message.clone()),
                status_code: c.status_code,
            }),
            regex: req.regex.as_ref().map(regex),
            webhook: req.webhook.as_ref().map(|w| findings.absorb(webhook(w))),
            moderation: req
                .moderation
                .as_ref()
                .and_then(|m| m.openai.as_ref())
                .map(|openai| Moderation {
                    openai: OpenAiModeration {
                        model: openai.model.clone(),
                        auth_token: openai
                            .auth_token
                            .as_ref()
                            .and_then(|t| findings.absorb(auth_token(t, namespace))),
                    },
                }),
        }),
        response: guard.response.as_ref().map(|resp| PromptGuardResponse {
            regex: resp.regex.as_ref().map(regex),
            webhook: resp.webhook.as_ref().map(|w| findings.absorb(webhook(w))),
        }),
    });

    let policy = AiPolicy {
        route_type: source.route_type.clone(),
        defaults,
        prompt_enrichment,
        prompt_guard,
    };
    let empty = policy == AiPolicy::default();
    Mapped::new((!empty).then_some(policy), findings)
}

fn message(role: &str, content: &str) -> Message {
    Message {
        role: role.to_string(),
        content: content.to_string(),
    }
}

fn regex(source: &AiRegex) -> PromptRegex {
    PromptRegex {
        matches: source
            .matches
            .iter()
            .map(|m| RegexMatch {
                pattern: m.pattern.clone(),
                name: m.name.clone(),
            })
            .collect(),
        builtins: source.builtins.clone(),
        action: source.action.clone(),
    }
}

/// Only exact and regex forwarding survive; the other match types fall back
/// to exact.
fn webhook(source: &AiWebhook) -> Mapped<Webhook> {
    let mut findings = Findings::new();
    let forward_headers = source
        .forward_headers
        .iter()
        .map(|h| {
            let match_type = match h.match_type.as_deref().unwrap_or("EXACT") {
                "REGEX" => "RegularExpression",
                "EXACT" => "Exact",
                other => {
                    findings.unsupported(format!(
                        "ai headerMatch '{}' is not supported",
                        other.to_ascii_lowercase()
                    ));
                    "Exact"
                }
            };
            HttpHeaderMatch {
                match_type: match_type.to_string(),
                name: h.key.clone(),
                value: String::new(),
            }
        })
        .collect();
    Mapped::new(
        Webhook {
            host: WebhookHost {
                host: source.host.clone(),
                port: source.port,
            },
            forward_headers,
        },
        findings,
    )
}

fn auth_token(source: &AiAuthToken, namespace: &str) -> Mapped<Option<SingleAuthToken>> {
    let mut findings = Findings::new();
    if let Some(inline) = &source.inline {
        return Mapped::clean(Some(SingleAuthToken {
            kind: "Inline".to_string(),
            inline: Some(inline.clone()),
            secret_ref: None,
        }));
    }
    let Some(secret) = &source.secret_ref else {
        return Mapped::clean(None);
    };
    let secret_ns = secret.namespace_or(namespace);
    if secret_ns != namespace {
        findings.unknown_reference(format!(
            "ai secret {secret_ns}/{} must be in namespace {namespace}",
            secret.name
        ));
    }
    let token = SingleAuthToken {
        kind: "SecretRef".to_string(),
        inline: None,
        secret_ref: Some(LocalRef::new(secret.name.clone())),
    };
    Mapped::new(Some(token), findings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::ai;
    use crate::diagnostics::Category;
    use crate::source::policy::AiRoute;

    fn route(raw: serde_json::Value) -> AiRoute {
        serde_json::from_value(raw).expect("ai decodes")
    }

    #[test]
    fn defaults_are_json_encoded_and_rag_is_reported() {
        let source = route(json!({
            "routeType": "CHAT",
            "defaults": [{"field": "temperature", "value": 0.5, "override": true}],
            "rag": {"datastore": {}},
            "semanticCache": {"mode": "READ_WRITE"}
        }));
        let mapped = ai(&source, "default");
        let policy = mapped.value.expect("policy");
        assert_eq!(policy.defaults[0].value, "0.5");
        assert_eq!(policy.defaults[0].override_value, Some(true));
        assert_eq!(
            mapped.findings.messages(),
            vec!["ai.rag is not supported", "ai.semanticCache is not supported"]
        );
    }

    #[test]
    fn webhook_contains_falls_back_to_exact() {
        let source = route(json!({
            "promptGuard": {"request": {"webhook": {
                "host": "guard.ai.svc", "port": 8000,
                "forwardHeaders": [{"key": "x-user", "matchType": "CONTAINS"}]
            }}}
        }));
        let mapped = ai(&source, "default");
        let policy = mapped.value.expect("policy");
        let webhook = policy
            .prompt_guard
            .and_then(|g| g.request)
            .and_then(|r| r.webhook)
            .expect("webhook");
        assert_eq!(webhook.forward_headers[0].match_type, "Exact");
        assert_eq!(mapped.findings.messages(), vec!["ai headerMatch 'contains' is not supported"]);
    }

    #[test]
    fn cross_namespace_secret_is_an_unknown_reference() {
        let source = route(json!({
            "promptGuard": {"request": {"moderation": {"openai": {
                "model": "omni-moderation-latest",
                "authToken": {"secretRef": {"name": "openai", "namespace": "ai-secrets"}}
            }}}}
        }));
        let mapped = ai(&source, "default");
        assert_eq!(mapped.findings.count(Category::UnknownReference), 1);
        let token = mapped
            .value
            .and_then(|p| p.prompt_guard)
            .and_then(|g| g.request)
            .and_then(|r| r.moderation)
            .and_then(|m| m.openai.auth_token)
            .expect("token");
        assert_eq!(token.secret_ref.map(|s| s.name), Some("openai".to_string()));
    }
}
