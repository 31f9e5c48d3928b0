use serde::Deserialize;
use serde_json::Value;

use super::{Overflow, ResourceRef};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamSpec {
    pub kube: Option<KubeUpstream>,
    #[serde(rename = "static")]
    pub static_hosts: Option<StaticUpstream>,
    pub aws: Option<AwsUpstream>,
    pub aws_ec2: Option<Value>,
    pub consul: Option<Value>,
    pub azure: Option<Value>,
    pub gcp: Option<Value>,
    pub ai: Option<Value>,
    pub ssl_config: Option<SslConfig>,
    pub connection_config: Option<ConnectionConfig>,
    pub health_checks: Vec<HealthCheck>,
    pub use_http2: Option<bool>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeUpstream {
    pub service_name: String,
    pub service_namespace: String,
    pub service_port: u32,
    pub selector: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticUpstream {
    pub hosts: Vec<StaticHost>,
    pub use_tls: Option<bool>,
    pub auto_sni_rewrite: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StaticHost {
    pub addr: String,
    pub port: u32,
    pub health_check_config: Option<Value>,
    pub load_balancing_weight: Option<u32>,
    pub sni_addr: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsUpstream {
    pub region: String,
    pub secret_ref: Option<ResourceRef>,
    pub aws_account_id: Option<String>,
    pub lambda_functions: Vec<LambdaFunction>,
    pub role_arn: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LambdaFunction {
    pub lambda_function_name: String,
    pub logical_name: String,
    pub qualifier: Option<String>,
}

/// TLS settings for a virtual service (downstream) or upstream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SslConfig {
    pub secret_ref: Option<ResourceRef>,
    pub ssl_files: Option<SslFiles>,
    pub sds: Option<Value>,
    pub sni: Option<String>,
    pub sni_domains: Vec<String>,
    pub verify_subject_alt_name: Vec<String>,
    pub alpn_protocols: Vec<String>,
    pub one_way_tls: Option<bool>,
    pub allow_renegotiation: Option<bool>,
    pub parameters: Option<SslParameters>,
    pub ocsp_staple_policy: Option<Value>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SslFiles {
    pub tls_cert: Option<String>,
    pub tls_key: Option<String>,
    pub root_ca: Option<String>,
    pub ocsp_staple: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SslParameters {
    /// `TLS_AUTO`, `TLSv1_0` .. `TLSv1_3`.
    pub minimum_protocol_version: Option<String>,
    pub maximum_protocol_version: Option<String>,
    pub cipher_suites: Vec<String>,
    pub ecdh_curves: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub max_requests_per_connection: Option<u32>,
    pub connect_timeout: Option<String>,
    pub tcp_keepalive: Option<TcpKeepAlive>,
    pub per_connection_buffer_limit_bytes: Option<u32>,
    pub common_http_protocol_options: Option<CommonHttpProtocolOptions>,
    pub http1_protocol_options: Option<Http1ProtocolOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpKeepAlive {
    pub keepalive_probes: Option<u32>,
    pub keepalive_time: Option<String>,
    pub keepalive_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommonHttpProtocolOptions {
    pub idle_timeout: Option<String>,
    pub max_headers_count: Option<u32>,
    pub max_stream_duration: Option<String>,
    pub headers_with_underscores_action: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Http1ProtocolOptions {
    pub enable_trailers: Option<bool>,
    pub override_stream_error_on_invalid_http_message: Option<bool>,
    pub proper_case_header_key_format: Option<bool>,
    pub preserve_case_header_key_format: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HealthCheck {
    pub timeout: Option<String>,
    pub interval: Option<String>,
    pub unhealthy_threshold: Option<u32>,
    pub healthy_threshold: Option<u32>,
    pub http_health_check: Option<HttpHealthCheck>,
    pub grpc_health_check: Option<GrpcHealthCheck>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpHealthCheck {
    pub host: Option<String>,
    pub path: String,
    pub method: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcHealthCheck {
    pub service_name: Option<String>,
    pub authority: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}
