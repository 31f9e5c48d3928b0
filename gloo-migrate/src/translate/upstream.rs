//! Upstreams become Backends and BackendConfigPolicies.
//!
//! Kube upstreams produce no Backend: routes reference the Service directly
//! and connection tuning attaches to the Service.

use tracing::debug;

use crate::context::Context;
use crate::identity::SourceKind;
use crate::rules::tls::backend_tls;
use crate::rules::Findings;
use crate::source::upstream::{AwsUpstream, ConnectionConfig, HealthCheck as SourceHealthCheck, StaticUpstream};
use crate::source::{Upstream, UpstreamSpec};
use crate::target::backend::{
    AwsAuth, AwsBackend, AwsLambda, CommonHttpProtocolOptions, GrpcHealthCheck, HealthCheck, Http1ProtocolOptions,
    HttpHealthCheck, StaticHost, TcpKeepalive,
};
use crate::target::{BackendConfigPolicySpec, BackendSpec, LocalRef, Object, PolicyTargetRef};

use super::identity_of;

const UNSUPPORTED_TYPES: &[&str] = &["ai", "awsec2", "consul", "azure", "gcp"];

pub fn translate_upstreams(ctx: &mut Context<'_>) {
    let source = ctx.source;
    for upstream in source.upstreams() {
        translate_upstream(ctx, upstream);
    }
}

fn translate_upstream(ctx: &mut Context<'_>, upstream: &Upstream) {
    let identity = identity_of(SourceKind::Upstream, upstream);
    let namespace = upstream.namespace();
    let spec = &upstream.spec;
    let mut findings = Findings::new();

    let unsupported_present = [
        spec.ai.is_some(),
        spec.aws_ec2.is_some(),
        spec.consul.is_some(),
        spec.azure.is_some(),
        spec.gcp.is_some(),
    ];
    for (kind, present) in UNSUPPORTED_TYPES.iter().zip(unsupported_present) {
        if present {
            findings.unsupported(format!("{kind} upstream is not supported"));
        }
    }
    findings.overflow("upstream", &spec.other);

    let backend = if let Some(hosts) = &spec.static_hosts {
        Some(static_backend(hosts, spec.use_http2, spec.ssl_config.is_some(), &mut findings))
    } else if let Some(aws) = &spec.aws {
        Some(aws_backend(aws, namespace, &mut findings))
    } else {
        None
    };
    let has_backend = backend.is_some();
    if let Some(backend) = backend {
        let mut object = Object::new(namespace, upstream.name(), backend);
        object.metadata.labels = upstream.metadata.labels.clone();
        debug!(upstream = %identity, "backend");
        ctx.upsert(object);
    }

    let mut policy = backend_policy(spec, namespace, &mut findings);
    if !policy.is_empty() {
        let target = match &spec.kube {
            Some(kube) => {
                if let Some(selector) = &kube.selector {
                    if !crate::source::is_unset(selector) {
                        findings.unsupported("kube upstream selector is not supported");
                    }
                }
                let service_namespace = if kube.service_namespace.is_empty() {
                    namespace
                } else {
                    &kube.service_namespace
                };
                if service_namespace == namespace {
                    Some(PolicyTargetRef::service(kube.service_name.clone()))
                } else {
                    findings.unsupported(format!(
                        "service {service_namespace}/{} is outside namespace {namespace}, connection settings cannot attach to it",
                        kube.service_name
                    ));
                    None
                }
            }
            None if has_backend => Some(PolicyTargetRef::backend(upstream.name())),
            None => None,
        };
        if let Some(target) = target {
            policy.target_refs.push(target);
            ctx.upsert(Object::new(namespace, upstream.name(), policy));
        }
    }

    ctx.report(&identity, findings);
}

/// `useTls` only needs attention when no `sslConfig` carries the TLS
/// settings into the BackendConfigPolicy.
fn static_backend(
    source: &StaticUpstream,
    use_http2: Option<bool>,
    has_ssl_config: bool,
    findings: &mut Findings,
) -> BackendSpec {
    let hosts = source
        .hosts
        .iter()
        .map(|host| {
            if host.health_check_config.is_some() {
                findings.unsupported("static upstream healthCheckConfig is not supported");
            }
            if host.load_balancing_weight.is_some() {
                findings.unsupported("static upstream loadBalancingWeight is not supported");
            }
            if host.sni_addr.as_deref().is_some_and(|s| !s.is_empty()) {
                findings.unsupported("static upstream sni is not supported");
            }
            StaticHost {
                host: host.addr.clone(),
                port: host.port,
            }
        })
        .collect();
    if source.auto_sni_rewrite == Some(true) {
        findings.unsupported("static upstream autoSniRewrite is not supported");
    }
    if source.use_tls == Some(true) && !has_ssl_config {
        findings.update_required("static upstream useTls needs a BackendConfigPolicy tls block");
    }
    let mut spec = BackendSpec::static_hosts(hosts);
    if use_http2 == Some(true) {
        if let Some(backend) = spec.static_backend.as_mut() {
            backend.app_protocol = Some("http2".to_string());
        }
    }
    spec
}

fn aws_backend(source: &AwsUpstream, namespace: &str, findings: &mut Findings) -> BackendSpec {
    findings.overflow("aws", &source.other);
    if source.role_arn.as_deref().is_some_and(|r| !r.is_empty()) {
        findings.unsupported("aws roleArn is not supported");
    }
    let auth = source.secret_ref.as_ref().and_then(|secret| {
        let secret_namespace = secret.namespace_or(namespace);
        if secret_namespace == namespace {
            Some(AwsAuth {
                auth_type: "Secret".to_string(),
                secret_ref: LocalRef::new(secret.name.clone()),
            })
        } else {
            findings.unsupported(format!(
                "aws secret {secret_namespace}/{} is outside namespace {namespace}",
                secret.name
            ));
            None
        }
    });
    if source.lambda_functions.len() > 1 {
        let rest: Vec<&str> = source.lambda_functions[1..]
            .iter()
            .map(|f| f.logical_name.as_str())
            .collect();
        findings.unsupported(format!(
            "aws upstream maps only its first lambda function, dropped: {}",
            rest.join(", ")
        ));
    }
    let lambda = source.lambda_functions.first().map(|f| AwsLambda {
        function_name: f.lambda_function_name.clone(),
        qualifier: f.qualifier.clone().filter(|q| !q.is_empty()),
    });
    BackendSpec::aws(AwsBackend {
        account_id: source.aws_account_id.clone().filter(|a| !a.is_empty()),
        region: source.region.clone(),
        auth,
        lambda,
    })
}

fn backend_policy(spec: &UpstreamSpec, namespace: &str, findings: &mut Findings) -> BackendConfigPolicySpec {
    let mut policy = BackendConfigPolicySpec {
        tls: spec
            .ssl_config
            .as_ref()
            .and_then(|ssl| findings.absorb(backend_tls(ssl, namespace))),
        ..BackendConfigPolicySpec::default()
    };
    if let Some(connection) = &spec.connection_config {
        apply_connection(&mut policy, connection, findings);
    }
    if let Some((first, rest)) = spec.health_checks.split_first() {
        if !rest.is_empty() {
            findings.ignored("healthChecks only using first health check");
        }
        policy.health_check = Some(health_check(first, findings));
    }
    policy
}

fn apply_connection(policy: &mut BackendConfigPolicySpec, source: &ConnectionConfig, findings: &mut Findings) {
    policy.connect_timeout = source.connect_timeout.clone();
    policy.per_connection_buffer_limit_bytes = source.per_connection_buffer_limit_bytes;
    policy.tcp_keepalive = source.tcp_keepalive.as_ref().map(|k| TcpKeepalive {
        keep_alive_probes: k.keepalive_probes,
        keep_alive_time: k.keepalive_time.clone(),
        keep_alive_interval: k.keepalive_interval.clone(),
    });

    let mut common = CommonHttpProtocolOptions {
        max_requests_per_connection: source.max_requests_per_connection,
        ..CommonHttpProtocolOptions::default()
    };
    if let Some(options) = &source.common_http_protocol_options {
        common.idle_timeout = options.idle_timeout.clone();
        common.max_headers_count = options.max_headers_count;
        common.max_stream_duration = options.max_stream_duration.clone();
        if options.headers_with_underscores_action.is_some() {
            findings.unsupported("commonHttpProtocolOptions headersWithUnderscoresAction is not supported");
        }
    }
    if common != CommonHttpProtocolOptions::default() {
        policy.common_http_protocol_options = Some(common);
    }

    policy.http1_protocol_options = source.http1_protocol_options.as_ref().map(|h| Http1ProtocolOptions {
        enable_trailers: h.enable_trailers,
        override_stream_error_on_invalid_http_message: h.override_stream_error_on_invalid_http_message,
        header_format: if h.proper_case_header_key_format == Some(true) {
            Some("ProperCaseHeaderKeyFormat".to_string())
        } else if h.preserve_case_header_key_format == Some(true) {
            Some("PreserveCaseHeaderKeyFormat".to_string())
        } else {
            None
        },
    });
}

fn health_check(source: &SourceHealthCheck, findings: &mut Findings) -> HealthCheck {
    findings.overflow("healthCheck", &source.other);
    HealthCheck {
        timeout: source.timeout.clone(),
        interval: source.interval.clone(),
        unhealthy_threshold: source.unhealthy_threshold,
        healthy_threshold: source.healthy_threshold,
        http: source.http_health_check.as_ref().map(|http| {
            findings.overflow("healthCheck.httpHealthCheck", &http.other);
            HttpHealthCheck {
                host: http.host.clone().filter(|h| !h.is_empty()),
                path: http.path.clone(),
                method: http.method.clone().unwrap_or_else(|| "GET".to_string()),
            }
        }),
        grpc: source.grpc_health_check.as_ref().map(|grpc| {
            findings.overflow("healthCheck.grpcHealthCheck", &grpc.other);
            GrpcHealthCheck {
                service_name: grpc.service_name.clone(),
                authority: grpc.authority.clone(),
            }
        }),
    }
}
