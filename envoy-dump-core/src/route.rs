//! Route configuration records.
//!
//! Field names follow the proto JSON emitted by the admin endpoint. Blocks a
//! caller rebuilds from keep the keys they do not model in `other`, so nothing
//! is dropped without the caller seeing it. Per-filter payloads are kept as
//! raw JSON so callers can unwrap them through [`crate::registry`].

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteConfiguration {
    pub name: String,
    pub virtual_hosts: Vec<VirtualHost>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct VirtualHost {
    pub name: String,
    pub domains: Vec<String>,
    pub routes: Vec<Route>,
    pub typed_per_filter_config: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Route {
    pub name: String,
    #[serde(rename = "match")]
    pub matcher: RouteMatch,
    pub route: Option<RouteAction>,
    pub redirect: Option<RedirectAction>,
    pub direct_response: Option<DirectResponseAction>,
    pub typed_per_filter_config: BTreeMap<String, Value>,
    pub request_headers_to_add: Vec<HeaderValueOption>,
    pub request_headers_to_remove: Vec<String>,
    pub response_headers_to_add: Vec<HeaderValueOption>,
    pub response_headers_to_remove: Vec<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteMatch {
    pub prefix: Option<String>,
    pub path: Option<String>,
    pub safe_regex: Option<RegexMatcher>,
    pub headers: Vec<HeaderMatcher>,
    pub query_parameters: Vec<QueryParameterMatcher>,
    pub case_sensitive: Option<bool>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegexMatcher {
    pub regex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StringMatcher {
    pub exact: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub contains: Option<String>,
    pub safe_regex: Option<RegexMatcher>,
    pub ignore_case: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HeaderMatcher {
    pub name: String,
    pub string_match: Option<StringMatcher>,
    pub exact_match: Option<String>,
    pub safe_regex_match: Option<RegexMatcher>,
    pub present_match: Option<bool>,
    pub invert_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QueryParameterMatcher {
    pub name: String,
    pub string_match: Option<StringMatcher>,
    pub present_match: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouteAction {
    pub cluster: Option<String>,
    pub weighted_clusters: Option<WeightedClusters>,
    pub cluster_header: Option<String>,
    pub prefix_rewrite: Option<String>,
    pub regex_rewrite: Option<Value>,
    pub timeout: Option<String>,
    pub retry_policy: Option<RetryPolicy>,
    pub host_rewrite_literal: Option<String>,
    pub auto_host_rewrite: Option<bool>,
    /// Route-level rate limit descriptors, kept raw for field tracking.
    pub rate_limits: Vec<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WeightedClusters {
    pub clusters: Vec<ClusterWeight>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClusterWeight {
    pub name: String,
    pub weight: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub retry_on: String,
    pub num_retries: Option<u32>,
    pub per_try_timeout: Option<String>,
    pub retriable_status_codes: Vec<u32>,
    pub retry_back_off: Option<RetryBackOff>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryBackOff {
    pub base_interval: Option<String>,
    pub max_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RedirectAction {
    pub https_redirect: bool,
    pub scheme_redirect: Option<String>,
    pub host_redirect: Option<String>,
    pub port_redirect: Option<u32>,
    pub path_redirect: Option<String>,
    pub prefix_rewrite: Option<String>,
    pub strip_query: bool,
    /// Proto enum name such as `FOUND` or `PERMANENT_REDIRECT`.
    pub response_code: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl RedirectAction {
    /// Numeric status for the proto enum name; envoy defaults to 301.
    pub fn status_code(&self) -> u16 {
        match self.response_code.as_deref() {
            Some("FOUND") => 302,
            Some("SEE_OTHER") => 303,
            Some("TEMPORARY_REDIRECT") => 307,
            Some("PERMANENT_REDIRECT") => 308,
            _ => 301,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DirectResponseAction {
    pub status: u32,
    pub body: Option<DataSource>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DataSource {
    pub inline_string: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderValueOption {
    pub header: HeaderValue,
    pub append_action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderValue {
    pub key: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{RedirectAction, Route};

    #[test]
    fn route_decodes_match_keyword() {
        let route: Route = serde_json::from_value(json!({
            "name": "r0",
            "match": {"prefix": "/api"},
            "route": {"cluster": "outbound|80||api.default.svc.cluster.local", "timeout": "15s"}
        }))
        .expect("route decodes");
        assert_eq!(route.matcher.prefix.as_deref(), Some("/api"));
        let action = route.route.expect("route action");
        assert_eq!(action.timeout.as_deref(), Some("15s"));
        assert!(action.rate_limits.is_empty());
        assert!(route.other.is_empty());
    }

    #[test]
    fn unmodelled_keys_are_kept_per_block() {
        let route: Route = serde_json::from_value(json!({
            "match": {"prefix": "/", "runtime_fraction": {"default_value": {"numerator": 5}}},
            "route": {
                "cluster": "outbound|80||api.default.svc.cluster.local",
                "hash_policy": [{"header": {"header_name": "x-user"}}],
                "idle_timeout": "30s"
            },
            "request_headers_to_remove": ["x-debug"]
        }))
        .expect("route decodes");
        assert!(route.other.is_empty());
        assert_eq!(route.request_headers_to_remove, vec!["x-debug".to_string()]);
        assert_eq!(route.matcher.other.keys().collect::<Vec<_>>(), vec!["runtime_fraction"]);
        let action = route.route.expect("route action");
        assert_eq!(action.other.keys().collect::<Vec<_>>(), vec!["hash_policy", "idle_timeout"]);
    }

    #[test]
    fn redirect_status_defaults_to_moved_permanently() {
        let redirect = RedirectAction::default();
        assert_eq!(redirect.status_code(), 301);
        let temporary = RedirectAction {
            response_code: Some("TEMPORARY_REDIRECT".to_string()),
            ..RedirectAction::default()
        };
        assert_eq!(temporary.status_code(), 307);
    }
}
