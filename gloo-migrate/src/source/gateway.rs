use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::listener::{HttpListenerOptions, ListenerOptions};
use super::upstream::SslConfig;
use super::virtual_service::{Destination, MultiDestination};
use super::{Overflow, ResourceRef};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GatewaySpec {
    pub bind_address: Option<String>,
    pub bind_port: u32,
    pub proxy_names: Vec<String>,
    pub ssl: bool,
    pub http_gateway: Option<HttpGateway>,
    pub tcp_gateway: Option<TcpGateway>,
    pub hybrid_gateway: Option<Value>,
    pub options: Option<ListenerOptions>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpGateway {
    pub virtual_services: Vec<ResourceRef>,
    pub virtual_service_selector: BTreeMap<String, String>,
    pub virtual_service_expressions: Option<Value>,
    pub virtual_service_namespaces: Vec<String>,
    pub options: Option<HttpListenerOptions>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpGateway {
    pub tcp_hosts: Vec<TcpHost>,
    pub options: Option<Value>,
    #[serde(flatten)]
    pub other: Overflow,
}

/// One forwarded connection target, optionally matched on SNI.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpHost {
    pub name: String,
    pub destination: Option<TcpAction>,
    pub ssl_config: Option<SslConfig>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpAction {
    pub single: Option<Destination>,
    pub multi: Option<MultiDestination>,
    pub upstream_group: Option<ResourceRef>,
    pub forward_sni_cluster_name: Option<Value>,
    #[serde(flatten)]
    pub other: Overflow,
}

impl GatewaySpec {
    /// Proxy names, falling back to the given default when none are listed.
    pub fn proxy_names_or(&self, default: &str) -> Vec<String> {
        if self.proxy_names.is_empty() {
            vec![default.to_string()]
        } else {
            self.proxy_names.clone()
        }
    }
}
