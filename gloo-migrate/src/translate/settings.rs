//! Global settings become GatewayExtensions.

use crate::context::Context;
use crate::identity::{sanitize_name, ResourceIdentity, SourceKind};
use crate::rules::Findings;
use crate::source::policy::{ExtAuthSettings, ExtProcSettings, RateLimitServerSettings};
use crate::source::ResourceRef;
use crate::target::policy::{ExtensionProvider, GrpcService};
use crate::target::{BackendObjectReference, GatewayExtensionSpec, Object};

use super::identity_of;

pub const EXT_PROC_EXTENSION: &str = "global-ext-proc-settings";

pub fn translate_settings(ctx: &mut Context<'_>) {
    let source = ctx.source;
    let config = ctx.config;
    for settings in source.all_settings() {
        let identity = identity_of(SourceKind::Settings, settings);
        let namespace = settings.namespace();
        let spec = &settings.spec;

        if let Some(server) = &spec.ratelimit_server {
            rate_limit_extension(ctx, &identity, namespace, &config.rate_limit_extension, server);
        }
        if let Some(extauth) = &spec.extauth {
            ext_auth_extension(ctx, &identity, namespace, &config.ext_auth_extension, extauth);
        }
        for (name, extauth) in &spec.named_extauth {
            ext_auth_extension(ctx, &identity, namespace, &sanitize_name(name), extauth);
        }
        if let Some(ext_proc) = &spec.ext_proc {
            ext_proc_extension(ctx, &identity, namespace, EXT_PROC_EXTENSION, ext_proc);
        }

        if spec.upstream_options.is_some() {
            ctx.unsupported(&identity, "settings upstreamOptions is not supported");
        }
        if let Some(gloo) = &spec.gloo {
            if gloo.aws_options.is_some() {
                ctx.unsupported(&identity, "settings gloo.awsOptions is not supported");
            }
            let mut findings = Findings::new();
            findings.overflow("settings.gloo", &gloo.other);
            ctx.report(&identity, findings);
        }
        let mut findings = Findings::new();
        findings.overflow("settings", &spec.other);
        ctx.report(&identity, findings);
    }
}

pub(crate) fn ext_auth_extension(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    name: &str,
    source: &ExtAuthSettings,
) {
    let port = ctx.config.ext_auth_port;
    let backend_ref = server_ref(ctx, owner, source.extauthz_server_ref.as_ref(), namespace, port, "extauth");
    if source.request_timeout.is_some() {
        ctx.update_required(owner, "extAuth settings requestTimeout needs to be set on the GatewayExtension");
    }
    let mut findings = Findings::new();
    findings.overflow("extauth", &source.other);
    ctx.report(owner, findings);

    let provider = ExtensionProvider {
        grpc_service: Some(GrpcService {
            backend_ref,
            authority: source.grpc_service.as_ref().and_then(|g| g.authority.clone()),
        }),
        ..ExtensionProvider::default()
    };
    ctx.upsert(Object::new(
        namespace,
        name,
        GatewayExtensionSpec::new(GatewayExtensionSpec::EXT_AUTH, provider),
    ));
}

pub(crate) fn rate_limit_extension(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    name: &str,
    source: &RateLimitServerSettings,
) {
    let port = ctx.config.rate_limit_port;
    let backend_ref = server_ref(ctx, owner, source.ratelimit_server_ref.as_ref(), namespace, port, "rate limit");
    let mut findings = Findings::new();
    findings.overflow("ratelimitServer", &source.other);
    ctx.report(owner, findings);

    let provider = ExtensionProvider {
        grpc_service: Some(GrpcService {
            backend_ref,
            authority: source.grpc_service.as_ref().and_then(|g| g.authority.clone()),
        }),
        fail_open: (!source.deny_on_fail).then_some(true),
        timeout: source.request_timeout.clone(),
    };
    ctx.upsert(Object::new(
        namespace,
        name,
        GatewayExtensionSpec::new(GatewayExtensionSpec::RATE_LIMIT, provider),
    ));
}

pub(crate) fn ext_proc_extension(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    namespace: &str,
    name: &str,
    source: &ExtProcSettings,
) {
    let port = ctx.config.ext_proc_port;
    let grpc = source.grpc_service.as_ref();
    let backend_ref = server_ref(
        ctx,
        owner,
        grpc.and_then(|g| g.ext_proc_server_ref.as_ref()),
        namespace,
        port,
        "extProc",
    );
    let mut findings = Findings::new();
    findings.overflow("extProc", &source.other);
    ctx.report(owner, findings);

    let provider = ExtensionProvider {
        grpc_service: Some(GrpcService {
            backend_ref,
            authority: grpc.and_then(|g| g.authority.clone()),
        }),
        ..ExtensionProvider::default()
    };
    ctx.upsert(Object::new(
        namespace,
        name,
        GatewayExtensionSpec::new(GatewayExtensionSpec::EXT_PROC, provider),
    ));
}

/// Where an extension server lives. A kube upstream is reached through its
/// Service on the configured port, any other upstream through its Backend.
fn server_ref(
    ctx: &mut Context<'_>,
    owner: &ResourceIdentity,
    reference: Option<&ResourceRef>,
    namespace: &str,
    port: u16,
    what: &str,
) -> Option<BackendObjectReference> {
    let reference = reference?;
    let upstream_namespace = reference.namespace_or(namespace).to_string();
    match ctx.resolver().upstream(reference, namespace) {
        Ok(upstream) => Some(match &upstream.spec.kube {
            Some(kube) => {
                let service_namespace = if kube.service_namespace.is_empty() {
                    upstream_namespace
                } else {
                    kube.service_namespace.clone()
                };
                BackendObjectReference::service(
                    kube.service_name.clone(),
                    Some(service_namespace),
                    Some(u32::from(port)),
                )
            }
            None => BackendObjectReference::backend(upstream.name().to_string(), Some(upstream_namespace)),
        }),
        Err(missing) => {
            ctx.unknown_reference(owner, format!("{what} server {missing}"));
            Some(BackendObjectReference::service(
                reference.name.clone(),
                Some(upstream_namespace),
                Some(u32::from(port)),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::translate_settings;
    use crate::config::MigrateConfig;
    use crate::context::Context;
    use crate::diagnostics::Category;
    use crate::translate::testing::cache;

    #[test]
    fn servers_become_gateway_extensions() {
        let source = cache(vec![
            json!({
                "kind": "Settings",
                "metadata": {"name": "default", "namespace": "gloo-system"},
                "spec": {
                    "extauth": {
                        "extauthzServerRef": {"name": "extauth", "namespace": "gloo-system"},
                        "requestTimeout": "2s"
                    },
                    "ratelimitServer": {
                        "ratelimitServerRef": {"name": "rate-limit", "namespace": "gloo-system"},
                        "denyOnFail": false
                    },
                    "namedExtauth": {"Passthrough": {"extauthzServerRef": {"name": "passthrough"}}}
                }
            }),
            json!({
                "kind": "Upstream",
                "metadata": {"name": "extauth", "namespace": "gloo-system"},
                "spec": {"kube": {"serviceName": "extauth", "serviceNamespace": "gloo-system", "servicePort": 8083}}
            }),
            json!({
                "kind": "Upstream",
                "metadata": {"name": "rate-limit", "namespace": "gloo-system"},
                "spec": {"kube": {"serviceName": "rate-limit", "serviceNamespace": "gloo-system", "servicePort": 18081}}
            }),
        ]);
        let config = MigrateConfig::default();
        let mut ctx = Context::new(&source, &config);
        translate_settings(&mut ctx);
        let out = ctx.finish();

        let extauth = out
            .target
            .gateway_extension("gloo-system", "global-extauth-settings")
            .expect("extauth extension");
        let grpc = extauth.spec.ext_auth.as_ref().and_then(|p| p.grpc_service.as_ref()).expect("grpc");
        let backend = grpc.backend_ref.as_ref().expect("backend ref");
        assert_eq!(backend.name, "extauth");
        assert_eq!(backend.port, Some(8083));

        let rate_limit = out
            .target
            .gateway_extension("gloo-system", "global-rate-limit-settings")
            .expect("rate limit extension");
        assert_eq!(rate_limit.spec.rate_limit.as_ref().and_then(|p| p.fail_open), Some(true));

        assert!(out.target.gateway_extension("gloo-system", "passthrough").is_some());
        assert_eq!(out.diagnostics.of(Category::UpdateRequired).count(), 1);
        assert_eq!(out.diagnostics.of(Category::UnknownReference).count(), 1);
    }
}
