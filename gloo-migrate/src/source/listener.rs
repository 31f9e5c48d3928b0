//! Listener-level options carried by gateways and the listener option resources.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::policy::{
    BufferSettings, CsrfPolicy, EnvoyHeaderMatcher, ExtAuthSettings, ExtProcSettings, GrpcService, LocalRateLimit,
    RateLimitServerSettings,
};
use super::{Overflow, ResourceRef, TargetRef};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListenerOptions {
    pub access_logging_service: Option<AccessLoggingService>,
    pub per_connection_buffer_limit_bytes: Option<u32>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessLoggingService {
    pub access_log: Vec<AccessLog>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessLog {
    pub file_sink: Option<FileSink>,
    pub grpc_service: Option<GrpcAccessLog>,
    pub filter: Option<AccessLogFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileSink {
    pub path: String,
    pub string_format: Option<String>,
    pub json_format: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcAccessLog {
    pub log_name: String,
    pub static_cluster_name: Option<String>,
    pub additional_request_headers_to_log: Vec<String>,
    pub additional_response_headers_to_log: Vec<String>,
    pub additional_response_trailers_to_log: Vec<String>,
    pub filter_state_objects_to_log: Vec<String>,
}

/// Access log filter tree. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessLogFilter {
    pub and_filter: Option<FilterList>,
    pub or_filter: Option<FilterList>,
    pub duration_filter: Option<ComparisonFilter>,
    pub status_code_filter: Option<ComparisonFilter>,
    pub header_filter: Option<HeaderFilter>,
    pub grpc_status_filter: Option<GrpcStatusFilter>,
    pub not_health_check_filter: Option<Value>,
    pub response_flag_filter: Option<ResponseFlagFilter>,
    pub traceable_filter: Option<Value>,
    pub runtime_filter: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterList {
    pub filters: Vec<AccessLogFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComparisonFilter {
    pub comparison: Comparison,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comparison {
    /// `EQ`, `GE` or `LE`.
    pub op: Option<String>,
    pub value: RuntimeUInt32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeUInt32 {
    pub default_value: u32,
    pub runtime_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderFilter {
    pub header: EnvoyHeaderMatcher,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcStatusFilter {
    pub statuses: Vec<String>,
    pub exclude: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseFlagFilter {
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpListenerOptions {
    pub extauth: Option<ExtAuthSettings>,
    pub ext_proc: Option<ExtProcSettings>,
    pub ratelimit_server: Option<RateLimitServerSettings>,
    pub http_local_ratelimit: Option<LocalRateLimit>,
    pub csrf: Option<CsrfPolicy>,
    pub buffer: Option<BufferSettings>,
    pub health_check: Option<HealthCheckFilter>,
    pub http_connection_manager_settings: Option<HttpConnectionManagerSettings>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCheckFilter {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpConnectionManagerSettings {
    pub xff_num_trusted_hops: Option<u32>,
    pub use_remote_address: Option<bool>,
    pub stream_idle_timeout: Option<String>,
    pub upgrades: Vec<UpgradeConfig>,
    /// `OVERWRITE`, `APPEND_IF_ABSENT` or `PASS_THROUGH`.
    pub server_header_transformation: Option<String>,
    pub tracing: Option<TracingSettings>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpgradeConfig {
    pub websocket: Option<UpgradeToggle>,
    pub connect: Option<UpgradeToggle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpgradeToggle {
    /// Absent means enabled.
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracingSettings {
    pub trace_percentages: Option<TracePercentages>,
    pub literals_for_tags: Vec<LiteralTag>,
    pub environment_variables_for_tags: Vec<EnvironmentTag>,
    pub request_headers_for_tags: Vec<String>,
    pub metadata_for_tags: Vec<MetadataTag>,
    pub open_telemetry_config: Option<OpenTelemetryConfig>,
    pub spawn_upstream_span: Option<bool>,
    pub verbose: Option<bool>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TracePercentages {
    pub client_sample_percentage: Option<f64>,
    pub random_sample_percentage: Option<f64>,
    pub overall_sample_percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LiteralTag {
    pub tag: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvironmentTag {
    pub tag: String,
    pub name: String,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataTag {
    pub tag: String,
    pub kind: Option<String>,
    pub value: MetadataTagValue,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataTagValue {
    pub namespace: Option<String>,
    pub key: String,
    pub nested_field_delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpenTelemetryConfig {
    pub collector_upstream_ref: Option<ResourceRef>,
    pub cluster_name: Option<String>,
    pub service_name: Option<String>,
    pub grpc_service: Option<GrpcService>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListenerOptionSpec {
    pub options: ListenerOptions,
    pub target_refs: Vec<TargetRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpListenerOptionSpec {
    pub options: HttpListenerOptions,
    pub target_refs: Vec<TargetRef>,
}
