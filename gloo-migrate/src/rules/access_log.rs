//! Listener access logging.

use crate::source::listener::{AccessLog as SourceLog, AccessLogFilter as SourceFilter, ComparisonFilter as SourceComparison};
use crate::target::policy::{
    AccessLog, AccessLogFilter, AccessLogGrpcService, ComparisonFilter, FileSink, FilterType, GrpcStatusFilter,
    HeaderFilter, ResponseFlagFilter,
};
use crate::target::BackendObjectReference;

use super::matchers::envoy_header;
use super::{Findings, Mapped};

pub fn access_log(source: &SourceLog) -> Mapped<AccessLog> {
    let mut findings = Findings::new();

    let file_sink = source.file_sink.as_ref().map(|f| FileSink {
        path: f.path.clone(),
        string_format: f.string_format.clone().filter(|s| !s.is_empty()),
        json_format: f.json_format.clone(),
    });

    let grpc_service = source.grpc_service.as_ref().map(|g| {
        let backend_ref = match &g.static_cluster_name {
            Some(cluster) if !cluster.is_empty() => {
                findings.unknown_reference(format!("access log cluster {cluster} must be exposed as a Backend"));
                BackendObjectReference::backend(cluster.clone(), None)
            }
            _ => BackendObjectReference::default(),
        };
        if !g.filter_state_objects_to_log.is_empty() {
            findings.unsupported("accessLoggingService grpcService filterStateObjectsToLog is not supported");
        }
        AccessLogGrpcService {
            log_name: g.log_name.clone(),
            backend_ref,
            additional_request_headers_to_log: g.additional_request_headers_to_log.clone(),
            additional_response_headers_to_log: g.additional_response_headers_to_log.clone(),
            additional_response_trailers_to_log: g.additional_response_trailers_to_log.clone(),
        }
    });

    let filter = source.filter.as_ref().map(|f| findings.absorb(filter(f)));
    Mapped::new(
        AccessLog {
            file_sink,
            grpc_service,
            filter,
        },
        findings,
    )
}

/// A top-level `and`/`or` list becomes the matching list; any other filter
/// is a single filter. Nested lists have no target equivalent.
fn filter(source: &SourceFilter) -> Mapped<AccessLogFilter> {
    let mut findings = Findings::new();
    let mut out = AccessLogFilter::default();
    let mut list = |filters: &[SourceFilter]| -> Vec<FilterType> {
        filters
            .iter()
            .map(|f| findings.absorb(single(f)))
            .filter(|f| !f.is_empty())
            .collect()
    };
    if let Some(or) = &source.or_filter {
        out.or_filter = list(&or.filters);
    } else if let Some(and) = &source.and_filter {
        out.and_filter = list(&and.filters);
    } else {
        let one = findings.absorb(single(source));
        out.single = (!one.is_empty()).then_some(one);
    }
    Mapped::new(out, findings)
}

fn single(source: &SourceFilter) -> Mapped<FilterType> {
    let mut findings = Findings::new();
    if source.and_filter.is_some() || source.or_filter.is_some() {
        findings.unsupported("accessLoggingService nested filter lists are not supported");
    }
    if source.runtime_filter.is_some() {
        findings.unsupported("accessLoggingService runtimeFilter is not supported");
    }
    let out = FilterType {
        status_code_filter: source
            .status_code_filter
            .as_ref()
            .map(|c| findings.absorb(comparison("statusCodeFilter", c))),
        duration_filter: source
            .duration_filter
            .as_ref()
            .map(|c| findings.absorb(comparison("durationFilter", c))),
        not_health_check_filter: source.not_health_check_filter.as_ref().map(|_| true),
        traceable_filter: source.traceable_filter.as_ref().map(|_| true),
        header_filter: source
            .header_filter
            .as_ref()
            .and_then(|h| findings.absorb(envoy_header(&h.header)))
            .map(|header| HeaderFilter { header }),
        response_flag_filter: source.response_flag_filter.as_ref().map(|r| ResponseFlagFilter {
            flags: r.flags.clone(),
        }),
        grpc_status_filter: source.grpc_status_filter.as_ref().map(|g| GrpcStatusFilter {
            statuses: g.statuses.clone(),
            exclude: g.exclude.then_some(true),
        }),
    };
    Mapped::new(out, findings)
}

fn comparison(name: &str, source: &SourceComparison) -> Mapped<ComparisonFilter> {
    let mut findings = Findings::new();
    if let Some(key) = source.comparison.value.runtime_key.as_deref().filter(|k| !k.is_empty()) {
        findings.unsupported(format!("accessLoggingService {name} runtime key {key} is not supported"));
    }
    Mapped::new(
        ComparisonFilter {
            op: source.comparison.op.clone().unwrap_or_else(|| "EQ".to_string()),
            value: source.comparison.value.default_value,
        },
        findings,
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::access_log;
    use crate::diagnostics::Category;
    use crate::source::listener::AccessLog;

    fn log(raw: serde_json::Value) -> AccessLog {
        serde_json::from_value(raw).expect("access log decodes")
    }

    #[test]
    fn or_filters_stay_or_filters() {
        let source = log(json!({
            "fileSink": {"path": "/dev/stdout", "stringFormat": "%REQ(:PATH)%"},
            "filter": {"orFilter": {"filters": [
                {"statusCodeFilter": {"comparison": {"op": "GE", "value": {"defaultValue": 500}}}},
                {"notHealthCheckFilter": {}}
            ]}}
        }));
        let mapped = access_log(&source);
        assert!(mapped.findings.is_empty());
        let filter = mapped.value.filter.expect("filter");
        assert!(filter.and_filter.is_empty());
        assert_eq!(filter.or_filter.len(), 2);
        assert_eq!(filter.or_filter[0].status_code_filter.as_ref().map(|c| c.value), Some(500));
        assert_eq!(filter.or_filter[1].not_health_check_filter, Some(true));
    }

    #[test]
    fn single_filter_is_returned() {
        let source = log(json!({
            "fileSink": {"path": "/dev/stdout"},
            "filter": {"durationFilter": {"comparison": {"op": "GE", "value": {"defaultValue": 1000}}}}
        }));
        let filter = access_log(&source).value.filter.expect("filter");
        let single = filter.single.expect("single filter");
        assert_eq!(single.duration_filter.map(|d| d.op), Some("GE".to_string()));
    }

    #[test]
    fn grpc_cluster_is_flagged_for_follow_up() {
        let source = log(json!({
            "grpcService": {"logName": "edge", "staticClusterName": "als", "filterStateObjectsToLog": ["x"]}
        }));
        let mapped = access_log(&source);
        let grpc = mapped.value.grpc_service.expect("grpc sink");
        assert_eq!(grpc.backend_ref.name, "als");
        assert_eq!(mapped.findings.count(Category::UnknownReference), 1);
        assert_eq!(mapped.findings.count(Category::Unsupported), 1);
    }
}
