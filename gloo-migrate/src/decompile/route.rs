//! Proxy routes back to virtual service routes.

use envoy_dump_core::listener::HttpConnectionManager;
use envoy_dump_core::route::{
    DirectResponseAction, HeaderMatcher, HeaderValueOption, RedirectAction, Route, RouteAction, RouteMatch,
    StringMatcher,
};
use serde_json::{json, Map, Value};

use crate::identity::ResourceIdentity;

use super::fields::{camel_case, camel_keys, Fields};
use super::filters::Scope;
use super::Decompiler;

const METHOD_HEADER: &str = ":method";

impl Decompiler<'_> {
    pub(super) fn route(
        &mut self,
        owner: &ResourceIdentity,
        hcm: &HttpConnectionManager,
        index: usize,
        route: &Route,
    ) -> Value {
        let label = if route.name.is_empty() { format!("routes[{index}]") } else { route.name.clone() };
        let mut out = Map::new();
        if !route.name.is_empty() {
            out.insert("name".into(), json!(route.name));
        }
        out.insert("matchers".into(), json!([self.matcher(owner, &label, &route.matcher)]));

        let mut options = self.filter_options(owner, hcm, &route.typed_per_filter_config, Scope::Route);
        if let Some(headers) = self.header_manipulation(owner, &label, route) {
            options.insert("headerManipulation".into(), headers);
        }

        if let Some(action) = &route.route {
            let destination = self.route_action(owner, &label, action, &mut options);
            out.insert("routeAction".into(), destination);
        } else if let Some(redirect) = &route.redirect {
            out.insert("redirectAction".into(), redirect_action(redirect));
            self.leftover(owner, &format!("route {label} redirect"), &redirect.other);
        } else if let Some(direct) = &route.direct_response {
            out.insert("directResponseAction".into(), self.direct_response(owner, &label, direct));
        }

        if !options.is_empty() {
            out.insert("options".into(), Value::Object(options));
        }
        self.leftover(owner, &format!("route {label}"), &route.other);
        Value::Object(out)
    }

    fn matcher(&mut self, owner: &ResourceIdentity, label: &str, source: &RouteMatch) -> Value {
        let mut out = Map::new();
        if let Some(prefix) = &source.prefix {
            out.insert("prefix".into(), json!(prefix));
        } else if let Some(path) = &source.path {
            out.insert("exact".into(), json!(path));
        } else if let Some(regex) = &source.safe_regex {
            out.insert("regex".into(), json!(regex.regex));
        }

        let mut methods = Vec::new();
        let mut headers = Vec::new();
        for header in &source.headers {
            if header.name == METHOD_HEADER && !header.invert_match {
                if let Some(method) = exact_value(header) {
                    methods.push(json!(method));
                    continue;
                }
            }
            match route_header(header) {
                Some(converted) => headers.push(converted),
                None => self.unsupported(
                    owner,
                    format!("route {label} header matcher {} has no equivalent", header.name),
                ),
            }
        }
        let mut query = Vec::new();
        for param in &source.query_parameters {
            let converted = match (&param.string_match, param.present_match) {
                (Some(m), _) => string_match_value(m).map(|(value, regex)| {
                    json!({"name": param.name, "value": value, "regex": regex})
                }),
                (None, _) => Some(json!({"name": param.name})),
            };
            match converted {
                Some(converted) => query.push(converted),
                None => self.unsupported(
                    owner,
                    format!("route {label} query parameter matcher {} has no equivalent", param.name),
                ),
            }
        }

        if !headers.is_empty() {
            out.insert("headers".into(), Value::Array(headers));
        }
        if !query.is_empty() {
            out.insert("queryParameters".into(), Value::Array(query));
        }
        if !methods.is_empty() {
            out.insert("methods".into(), Value::Array(methods));
        }
        if let Some(case_sensitive) = source.case_sensitive {
            out.insert("caseSensitive".into(), json!(case_sensitive));
        }
        self.leftover(owner, &format!("route {label} match"), &source.other);
        Value::Object(out)
    }

    fn route_action(
        &mut self,
        owner: &ResourceIdentity,
        label: &str,
        action: &RouteAction,
        options: &mut Map<String, Value>,
    ) -> Value {
        let mut out = Map::new();
        if let Some(cluster) = &action.cluster {
            out.insert("single".into(), self.destination(cluster));
        } else if let Some(weighted) = &action.weighted_clusters {
            let destinations: Vec<Value> = weighted
                .clusters
                .iter()
                .map(|entry| {
                    let mut destination = Map::new();
                    destination.insert("destination".into(), self.destination(&entry.name));
                    if let Some(weight) = entry.weight {
                        destination.insert("weight".into(), json!(weight));
                    }
                    Value::Object(destination)
                })
                .collect();
            out.insert("multi".into(), json!({"destinations": destinations}));
        } else if let Some(header) = &action.cluster_header {
            out.insert("clusterHeader".into(), json!(header));
        }

        if let Some(rewrite) = &action.prefix_rewrite {
            options.insert("prefixRewrite".into(), json!(rewrite));
        }
        if let Some(rewrite) = &action.regex_rewrite {
            options.insert("regexRewrite".into(), camel_keys(rewrite, &[]));
        }
        if let Some(timeout) = &action.timeout {
            options.insert("timeout".into(), json!(timeout));
        }
        if let Some(host) = &action.host_rewrite_literal {
            options.insert("hostRewrite".into(), json!(host));
        }
        if action.auto_host_rewrite == Some(true) {
            options.insert("autoHostRewrite".into(), json!(true));
        }
        if let Some(retry) = &action.retry_policy {
            let mut retries = Map::new();
            if !retry.retry_on.is_empty() {
                retries.insert("retryOn".into(), json!(retry.retry_on));
            }
            if let Some(n) = retry.num_retries {
                retries.insert("numRetries".into(), json!(n));
            }
            if let Some(timeout) = &retry.per_try_timeout {
                retries.insert("perTryTimeout".into(), json!(timeout));
            }
            if !retry.retriable_status_codes.is_empty() {
                retries.insert("retriableStatusCodes".into(), json!(retry.retriable_status_codes));
            }
            if let Some(back_off) = &retry.retry_back_off {
                retries.insert(
                    "retryBackOff".into(),
                    json!({"baseInterval": back_off.base_interval, "maxInterval": back_off.max_interval}),
                );
            }
            options.insert("retries".into(), Value::Object(retries));
            self.leftover(owner, &format!("route {label} retry policy"), &retry.other);
        }
        for (i, raw) in action.rate_limits.iter().enumerate() {
            let path = format!("route {label} rate_limits[{i}]");
            if let Some(descriptor) = self.rate_limit_descriptor(owner, &path, raw) {
                push_rate_limit(options, descriptor);
            }
        }
        self.leftover(owner, &format!("route {label} action"), &action.other);
        Value::Object(out)
    }

    fn direct_response(&mut self, owner: &ResourceIdentity, label: &str, source: &DirectResponseAction) -> Value {
        let mut out = Map::new();
        out.insert("status".into(), json!(source.status));
        if let Some(body) = &source.body {
            if let Some(inline) = &body.inline_string {
                out.insert("body".into(), json!(inline));
            }
            if let Some(file) = &body.filename {
                self.unsupported(owner, format!("route {label} direct response body file {file} is not supported"));
            }
        }
        self.leftover(owner, &format!("route {label} direct response"), &source.other);
        Value::Object(out)
    }

    fn header_manipulation(&mut self, owner: &ResourceIdentity, label: &str, route: &Route) -> Option<Value> {
        let mut out = Map::new();
        let request = self.headers_to_add(owner, label, &route.request_headers_to_add);
        if !request.is_empty() {
            out.insert("requestHeadersToAdd".into(), Value::Array(request));
        }
        if !route.request_headers_to_remove.is_empty() {
            out.insert("requestHeadersToRemove".into(), json!(route.request_headers_to_remove));
        }
        let response = self.headers_to_add(owner, label, &route.response_headers_to_add);
        if !response.is_empty() {
            out.insert("responseHeadersToAdd".into(), Value::Array(response));
        }
        if !route.response_headers_to_remove.is_empty() {
            out.insert("responseHeadersToRemove".into(), json!(route.response_headers_to_remove));
        }
        (!out.is_empty()).then_some(Value::Object(out))
    }

    fn headers_to_add(&mut self, owner: &ResourceIdentity, label: &str, source: &[HeaderValueOption]) -> Vec<Value> {
        let mut out = Vec::with_capacity(source.len());
        for option in source {
            let mut entry = Map::new();
            entry.insert(
                "header".into(),
                json!({"key": option.header.key, "value": option.header.value}),
            );
            match option.append_action.as_deref() {
                None => {}
                Some("APPEND_IF_EXISTS_OR_ADD") => {
                    entry.insert("append".into(), json!(true));
                }
                Some("OVERWRITE_IF_EXISTS_OR_ADD") => {
                    entry.insert("append".into(), json!(false));
                }
                Some(other) => self.unsupported(
                    owner,
                    format!(
                        "route {label} header {} uses append action {other}, it is added unconditionally",
                        option.header.key
                    ),
                ),
            }
            out.push(Value::Object(entry));
        }
        out
    }

    /// One rate limit descriptor. Action kinds are carried through under
    /// their own names so unknown ones surface when the descriptor is
    /// translated.
    pub(super) fn rate_limit_descriptor(&mut self, owner: &ResourceIdentity, path: &str, raw: &Value) -> Option<Value> {
        let Some(map) = raw.as_object() else {
            self.unsupported(owner, format!("{path} is not an object"));
            return None;
        };
        let mut fields = Fields::new(map);
        let actions: Vec<Value> = fields.array("actions").iter().map(rate_limit_action).collect();
        let limit = fields.take("limit").map(|l| camel_keys(l, &[]));
        if let Some(message) = fields.leftover_message(path) {
            self.unsupported(owner, message);
        }
        if actions.is_empty() {
            return None;
        }
        let mut out = Map::new();
        out.insert("actions".into(), Value::Array(actions));
        if let Some(limit) = limit {
            out.insert("limit".into(), limit);
        }
        Some(Value::Object(out))
    }
}

pub(super) fn push_rate_limit(options: &mut Map<String, Value>, descriptor: Value) {
    let ratelimit = options
        .entry("ratelimit")
        .or_insert_with(|| json!({"rateLimits": []}));
    if let Some(list) = ratelimit.get_mut("rateLimits").and_then(Value::as_array_mut) {
        list.push(descriptor);
    }
}

fn rate_limit_action(raw: &Value) -> Value {
    let Some(map) = raw.as_object() else {
        return json!({});
    };
    map.iter()
        .map(|(key, value)| {
            let converted = match (key.as_str(), value) {
                ("header_value_match", Value::Object(inner)) => {
                    let mut out: Map<String, Value> = inner
                        .iter()
                        .filter(|(k, _)| k.as_str() != "headers")
                        .map(|(k, v)| (camel_case(k), camel_keys(v, &[])))
                        .collect();
                    let headers: Vec<Value> = inner
                        .get("headers")
                        .and_then(Value::as_array)
                        .map(|list| list.iter().map(envoy_header_matcher).collect())
                        .unwrap_or_default();
                    out.insert("headers".into(), Value::Array(headers));
                    Value::Object(out)
                }
                _ => camel_keys(value, &[]),
            };
            (camel_case(key), converted)
        })
        .collect::<Map<String, Value>>()
        .into()
}

/// A raw header matcher in the flat form rate limit actions use.
fn envoy_header_matcher(raw: &Value) -> Value {
    let Ok(matcher) = serde_json::from_value::<HeaderMatcher>(raw.clone()) else {
        return camel_keys(raw, &[]);
    };
    let mut out = Map::new();
    out.insert("name".into(), json!(matcher.name));
    if let Some(exact) = &matcher.exact_match {
        out.insert("exactMatch".into(), json!(exact));
    }
    if let Some(regex) = &matcher.safe_regex_match {
        out.insert("safeRegexMatch".into(), json!({"regex": regex.regex}));
    }
    if let Some(m) = &matcher.string_match {
        if let Some(exact) = &m.exact {
            out.insert("exactMatch".into(), json!(exact));
        }
        if let Some(prefix) = &m.prefix {
            out.insert("prefixMatch".into(), json!(prefix));
        }
        if let Some(suffix) = &m.suffix {
            out.insert("suffixMatch".into(), json!(suffix));
        }
        if let Some(regex) = &m.safe_regex {
            out.insert("safeRegexMatch".into(), json!({"regex": regex.regex}));
        }
    }
    if let Some(present) = matcher.present_match {
        out.insert("presentMatch".into(), json!(present));
    }
    if matcher.invert_match {
        out.insert("invertMatch".into(), json!(true));
    }
    Value::Object(out)
}

fn exact_value(header: &HeaderMatcher) -> Option<&str> {
    header
        .exact_match
        .as_deref()
        .or_else(|| header.string_match.as_ref().and_then(|m| m.exact.as_deref()))
}

/// A header matcher in the value-or-regex form routes use. `None` when the
/// matcher needs a kind that form cannot express.
fn route_header(header: &HeaderMatcher) -> Option<Value> {
    let (value, regex) = if let Some(exact) = &header.exact_match {
        (Some(exact.clone()), false)
    } else if let Some(regex) = &header.safe_regex_match {
        (Some(regex.regex.clone()), true)
    } else if let Some(m) = &header.string_match {
        let (value, regex) = string_match_value(m)?;
        (Some(value), regex)
    } else {
        (None, false)
    };
    let mut out = Map::new();
    out.insert("name".into(), json!(header.name));
    if let Some(value) = value {
        out.insert("value".into(), json!(value));
    }
    if regex {
        out.insert("regex".into(), json!(true));
    }
    if header.invert_match {
        out.insert("invertMatch".into(), json!(true));
    }
    Some(Value::Object(out))
}

/// Value and regex flag for a string matcher. Prefix, suffix and contains
/// matchers are rewritten as anchored regexes.
fn string_match_value(m: &StringMatcher) -> Option<(String, bool)> {
    if m.ignore_case {
        return None;
    }
    if let Some(exact) = &m.exact {
        return Some((exact.clone(), false));
    }
    if let Some(regex) = &m.safe_regex {
        return Some((regex.regex.clone(), true));
    }
    if let Some(prefix) = &m.prefix {
        return Some((format!("{}.*", escape_regex(prefix)), true));
    }
    if let Some(suffix) = &m.suffix {
        return Some((format!(".*{}", escape_regex(suffix)), true));
    }
    if let Some(contains) = &m.contains {
        return Some((format!(".*{}.*", escape_regex(contains)), true));
    }
    None
}

fn escape_regex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if "\\.+*?()|[]{}^$".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn redirect_action(source: &RedirectAction) -> Value {
    let mut out = Map::new();
    if let Some(host) = &source.host_redirect {
        out.insert("hostRedirect".into(), json!(host));
    }
    if let Some(path) = &source.path_redirect {
        out.insert("pathRedirect".into(), json!(path));
    }
    if let Some(prefix) = &source.prefix_rewrite {
        out.insert("prefixRewrite".into(), json!(prefix));
    }
    if let Some(port) = source.port_redirect {
        out.insert("portRedirect".into(), json!(port));
    }
    if source.https_redirect || source.scheme_redirect.as_deref() == Some("https") {
        out.insert("httpsRedirect".into(), json!(true));
    }
    if source.strip_query {
        out.insert("stripQuery".into(), json!(true));
    }
    let code = match source.status_code() {
        302 => "FOUND",
        303 => "SEE_OTHER",
        307 => "TEMPORARY_REDIRECT",
        308 => "PERMANENT_REDIRECT",
        _ => "MOVED_PERMANENTLY",
    };
    out.insert("responseCode".into(), json!(code));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{escape_regex, rate_limit_action, redirect_action, route_header};
    use envoy_dump_core::route::{HeaderMatcher, RedirectAction};

    #[test]
    fn header_value_match_headers_are_flattened() {
        let raw = json!({"header_value_match": {
            "descriptor_value": "internal",
            "expect_match": true,
            "headers": [{"name": "x-tier", "string_match": {"prefix": "int"}}]
        }});
        assert_eq!(
            rate_limit_action(&raw),
            json!({"headerValueMatch": {
                "descriptorValue": "internal",
                "expectMatch": true,
                "headers": [{"name": "x-tier", "prefixMatch": "int"}]
            }})
        );
    }

    #[test]
    fn prefix_header_becomes_regex() {
        let header: HeaderMatcher = serde_json::from_value(json!({
            "name": "x-version",
            "string_match": {"prefix": "v1."}
        }))
        .expect("matcher decodes");
        assert_eq!(
            route_header(&header),
            Some(json!({"name": "x-version", "value": "v1\\..*", "regex": true}))
        );
        assert_eq!(escape_regex("a+b"), "a\\+b");
    }

    #[test]
    fn redirect_keeps_code_and_scheme() {
        let redirect: RedirectAction = serde_json::from_value(json!({
            "scheme_redirect": "https",
            "host_redirect": "shop.example.com",
            "response_code": "FOUND"
        }))
        .expect("redirect decodes");
        assert_eq!(
            redirect_action(&redirect),
            json!({"hostRedirect": "shop.example.com", "httpsRedirect": true, "responseCode": "FOUND"})
        );
    }
}
