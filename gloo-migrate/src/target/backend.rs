//! Backend, BackendConfigPolicy, Parameter.

use serde::Serialize;

use super::{LocalRef, PolicyTargetRef};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendSpec {
    /// `Static` or `AWS`.
    #[serde(rename = "type")]
    pub backend_type: String,
    #[serde(rename = "static", skip_serializing_if = "Option::is_none")]
    pub static_backend: Option<StaticBackend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aws: Option<AwsBackend>,
}

impl BackendSpec {
    pub fn static_hosts(hosts: Vec<StaticHost>) -> Self {
        Self {
            backend_type: "Static".to_string(),
            static_backend: Some(StaticBackend {
                hosts,
                app_protocol: None,
            }),
            aws: None,
        }
    }

    pub fn aws(aws: AwsBackend) -> Self {
        Self {
            backend_type: "AWS".to_string(),
            static_backend: None,
            aws: Some(aws),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticBackend {
    pub hosts: Vec<StaticHost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_protocol: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticHost {
    pub host: String,
    pub port: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsBackend {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AwsAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lambda: Option<AwsLambda>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsAuth {
    /// Always `Secret`.
    #[serde(rename = "type")]
    pub auth_type: String,
    pub secret_ref: LocalRef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsLambda {
    pub function_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
}

/// Per-route lambda selector referenced by an ExtensionRef filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub lambda: AwsLambdaParameter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AwsLambdaParameter {
    pub logical_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocation_style: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfigPolicySpec {
    pub target_refs: Vec<PolicyTargetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_connection_buffer_limit_bytes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_keepalive: Option<TcpKeepalive>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_http_protocol_options: Option<CommonHttpProtocolOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http1_protocol_options: Option<Http1ProtocolOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<BackendTls>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<HealthCheck>,
}

impl BackendConfigPolicySpec {
    /// True when nothing beyond the target refs is set.
    pub fn is_empty(&self) -> bool {
        self.connect_timeout.is_none()
            && self.per_connection_buffer_limit_bytes.is_none()
            && self.tcp_keepalive.is_none()
            && self.common_http_protocol_options.is_none()
            && self.http1_protocol_options.is_none()
            && self.tls.is_none()
            && self.health_check.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TcpKeepalive {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive_probes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonHttpProtocolOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_headers_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stream_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_requests_per_connection: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Http1ProtocolOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_trailers: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_stream_error_on_invalid_http_message: Option<bool>,
    /// `ProperCaseHeaderKeyFormat` or `PreserveCaseHeaderKeyFormat`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendTls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_files: Option<TlsFiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sni: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub verify_subject_alt_name: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<TlsParameters>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alpn_protocols: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_renegotiation: Option<bool>,
    #[serde(rename = "oneWayTLS", skip_serializing_if = "Option::is_none")]
    pub one_way_tls: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsFiles {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_key: Option<String>,
    #[serde(rename = "rootCA", skip_serializing_if = "Option::is_none")]
    pub root_ca: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_min_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_max_version: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cipher_suites: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ecdh_curves: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unhealthy_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthy_threshold: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpHealthCheck>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc: Option<GrpcHealthCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpHealthCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub path: String,
    pub method: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcHealthCheck {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}
