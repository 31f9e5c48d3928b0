//! Listener tracing settings.

use crate::source::listener::TracingSettings;
use crate::target::policy::{
    AttributeLiteral, AttributeMetadata, AttributeMetadataKey, AttributeSource, CustomAttribute, GrpcService,
    OpenTelemetryProvider, Tracing, TracingProvider,
};
use crate::target::BackendObjectReference;

use super::{pascal_case, BackendLookup, Findings, Mapped};

const UNSUPPORTED_PROVIDERS: &[(&str, &str)] = &[
    ("datadogConfig", "Datadog"),
    ("openCensusConfig", "OpenCensus"),
    ("zipkinConfig", "Zipkin"),
];

pub fn tracing(source: &TracingSettings, namespace: &str, lookup: &dyn BackendLookup) -> Mapped<Tracing> {
    let mut findings = Findings::new();
    let mut other = source.other.clone();
    for (key, provider) in UNSUPPORTED_PROVIDERS {
        if other.remove(*key).is_some() {
            findings.unsupported(format!("{provider} tracing is not supported"));
        }
    }
    findings.overflow("tracing", &other);

    let percent = |v: Option<f64>| v.map(|p| p.clamp(0.0, 100.0).round() as u32);
    let mut out = Tracing {
        client_sampling: source.trace_percentages.as_ref().and_then(|t| percent(t.client_sample_percentage)),
        random_sampling: source.trace_percentages.as_ref().and_then(|t| percent(t.random_sample_percentage)),
        overall_sampling: source.trace_percentages.as_ref().and_then(|t| percent(t.overall_sample_percentage)),
        spawn_upstream_span: source.spawn_upstream_span.filter(|s| *s),
        verbose: source.verbose.filter(|v| *v),
        ..Tracing::default()
    };

    for tag in &source.literals_for_tags {
        out.attributes.push(CustomAttribute {
            name: tag.tag.clone(),
            literal: Some(AttributeLiteral { value: tag.value.clone() }),
            ..CustomAttribute::default()
        });
    }
    for tag in &source.environment_variables_for_tags {
        out.attributes.push(CustomAttribute {
            name: tag.tag.clone(),
            environment: Some(AttributeSource {
                name: tag.name.clone(),
                default_value: tag.default_value.clone(),
            }),
            ..CustomAttribute::default()
        });
    }
    for header in &source.request_headers_for_tags {
        out.attributes.push(CustomAttribute {
            name: header.clone(),
            request_header: Some(AttributeSource {
                name: header.clone(),
                default_value: None,
            }),
            ..CustomAttribute::default()
        });
    }
    for tag in &source.metadata_for_tags {
        if tag.value.namespace.as_deref().is_some_and(|n| !n.is_empty()) {
            findings.unsupported(format!("tracing metadataForTags {} value.namespace is not supported", tag.tag));
        }
        if tag.value.nested_field_delimiter.as_deref().is_some_and(|d| !d.is_empty()) {
            findings.unsupported(format!(
                "tracing metadataForTags {} value.nestedFieldDelimiter is not supported",
                tag.tag
            ));
        }
        out.attributes.push(CustomAttribute {
            name: tag.tag.clone(),
            metadata: Some(AttributeMetadata {
                kind: tag.kind.as_deref().map(pascal_case).unwrap_or_else(|| "Request".to_string()),
                metadata_key: AttributeMetadataKey { key: tag.value.key.clone() },
                default_value: tag.default_value.clone().filter(|d| !d.is_empty()),
            }),
            ..CustomAttribute::default()
        });
    }

    if let Some(otel) = &source.open_telemetry_config {
        let backend_ref = if let Some(upstream) = &otel.collector_upstream_ref {
            Some(findings.absorb(lookup.backend_ref(upstream, namespace)))
        } else if let Some(cluster) = otel.cluster_name.as_ref().filter(|c| !c.is_empty()) {
            findings.unknown_reference(format!("tracing collector cluster {cluster} must be exposed as a Backend"));
            Some(BackendObjectReference::backend(cluster.clone(), None))
        } else {
            None
        };
        out.provider = TracingProvider {
            open_telemetry: Some(OpenTelemetryProvider {
                grpc_service: GrpcService {
                    backend_ref,
                    authority: otel.grpc_service.as_ref().and_then(|g| g.authority.clone()),
                },
                service_name: otel.service_name.clone().filter(|s| !s.is_empty()),
            }),
        };
    }

    Mapped::new(out, findings)
}
