use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::options::{RouteOptions, VirtualHostOptions};
use super::upstream::SslConfig;
use super::{Overflow, ResourceRef};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualServiceSpec {
    pub virtual_host: VirtualHost,
    pub ssl_config: Option<SslConfig>,
    pub display_name: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualHost {
    pub domains: Vec<String>,
    pub routes: Vec<Route>,
    pub options: Option<VirtualHostOptions>,
    pub options_config_refs: Option<OptionsConfigRefs>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptionsConfigRefs {
    pub delegate_options: Vec<ResourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteTableSpec {
    pub routes: Vec<Route>,
    pub weight: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Route {
    pub name: Option<String>,
    pub matchers: Vec<Matcher>,
    pub inheritable_matchers: Option<bool>,
    pub inheritable_path_matchers: Option<bool>,
    pub route_action: Option<RouteAction>,
    pub redirect_action: Option<RedirectAction>,
    pub direct_response_action: Option<DirectResponseAction>,
    pub delegate_action: Option<DelegateAction>,
    pub options: Option<RouteOptions>,
    pub options_config_refs: Option<OptionsConfigRefs>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Matcher {
    pub prefix: Option<String>,
    pub exact: Option<String>,
    pub regex: Option<String>,
    pub headers: Vec<RouteHeaderMatcher>,
    pub query_parameters: Vec<QueryParameterMatcher>,
    pub methods: Vec<String>,
    pub case_sensitive: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteHeaderMatcher {
    pub name: String,
    pub value: Option<String>,
    pub regex: bool,
    pub invert_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryParameterMatcher {
    pub name: String,
    pub value: Option<String>,
    pub regex: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteAction {
    pub single: Option<Destination>,
    pub multi: Option<MultiDestination>,
    pub upstream_group: Option<ResourceRef>,
    pub cluster_header: Option<String>,
    pub dynamic_forward_proxy: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Destination {
    pub upstream: Option<ResourceRef>,
    pub kube: Option<KubeDestination>,
    pub destination_spec: Option<DestinationSpec>,
    pub subset: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KubeDestination {
    #[serde(rename = "ref")]
    pub service: ResourceRef,
    pub port: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DestinationSpec {
    pub aws: Option<AwsDestinationSpec>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsDestinationSpec {
    pub logical_name: String,
    pub invocation_style: Option<String>,
    pub response_transformation: bool,
    pub unwrap_as_api_gateway: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MultiDestination {
    pub destinations: Vec<WeightedDestination>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WeightedDestination {
    pub destination: Destination,
    pub weight: Option<u32>,
    pub options: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RedirectAction {
    pub host_redirect: Option<String>,
    pub path_redirect: Option<String>,
    pub prefix_rewrite: Option<String>,
    pub regex_rewrite: Option<Value>,
    /// `MOVED_PERMANENTLY`, `FOUND`, `SEE_OTHER`, `TEMPORARY_REDIRECT` or
    /// `PERMANENT_REDIRECT`.
    pub response_code: Option<String>,
    pub https_redirect: bool,
    pub strip_query: bool,
    pub port_redirect: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DirectResponseAction {
    pub status: u32,
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DelegateAction {
    #[serde(rename = "ref")]
    pub route_table: Option<ResourceRef>,
    pub selector: Option<RouteTableSelector>,
    pub name: Option<String>,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteTableSelector {
    pub labels: BTreeMap<String, String>,
    pub namespaces: Vec<String>,
    pub expressions: Option<Value>,
}

impl Route {
    /// Display name used in diagnostics and synthesized resource names.
    pub fn name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.name.as_deref().filter(|n| !n.is_empty()).unwrap_or(fallback)
    }
}
