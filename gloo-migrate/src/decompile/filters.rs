//! Per-filter configs on routes and virtual hosts back to option blocks.

use std::collections::BTreeMap;

use envoy_dump_core::listener::HttpConnectionManager;
use envoy_dump_core::registry::unwrap_any;
use envoy_dump_core::{FilterKind, TypedFilter};
use serde_json::{json, Map, Value};

use crate::diagnostics::Category;
use crate::identity::ResourceIdentity;
use crate::rules::fraction::to_percent;
use crate::source::policy::FractionalPercent;

use super::fields::{camel_keys, comma_list, Fields};
use super::route::push_rate_limit;
use super::Decompiler;

/// Transformation templates keep user-chosen keys under these fields.
const USER_MAPS: &[&str] = &["headers", "extractors"];

const STAGE_AFTER_EXT_AUTH: &str = "0";
const STAGE_BEFORE_EXT_AUTH: &str = "1";
const PRINCIPAL_METADATA_KEY: &str = "principal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    Route,
    VirtualHost,
}

impl Scope {
    fn jwt_key(self) -> &'static str {
        match self {
            Self::Route => "jwtProvidersStaged",
            Self::VirtualHost => "jwtStaged",
        }
    }
}

impl Decompiler<'_> {
    /// Options recovered from `typed_per_filter_config`. Fields of a config
    /// that were not read are reported once per config.
    pub(super) fn filter_options(
        &mut self,
        owner: &ResourceIdentity,
        hcm: &HttpConnectionManager,
        configs: &BTreeMap<String, Value>,
        scope: Scope,
    ) -> Map<String, Value> {
        let mut options = Map::new();
        for (name, raw) in configs {
            let filter = match unwrap_any(name, Some(raw)) {
                Ok(filter) => filter,
                Err(note) => {
                    self.unsupported(owner, format!("per-filter config {}: {}", note.location, note.message));
                    continue;
                }
            };
            let mut fields = Fields::new(&filter.config);
            match filter.kind {
                FilterKind::Cors => {
                    if let Some(cors) = cors(&mut fields) {
                        options.insert("cors".into(), cors);
                    }
                }
                FilterKind::Waf => {
                    options.insert("waf".into(), waf(&mut fields));
                }
                FilterKind::Transformation => {
                    if let Some(staged) = self.transformations(owner, name, &mut fields) {
                        options.insert("stagedTransformations".into(), staged);
                    }
                }
                FilterKind::Rbac => {
                    if let Some(rbac) = self.rbac(owner, name, &mut fields) {
                        options.insert("rbac".into(), rbac);
                    }
                }
                FilterKind::Jwt => {
                    if let Some(staged) = self.jwt(owner, hcm, &filter, &mut fields) {
                        options.insert(scope.jwt_key().into(), staged);
                    }
                }
                FilterKind::ExtAuthz => {
                    if let Some(extauth) = self.ext_authz(owner, name, &mut fields) {
                        options.insert("extauth".into(), extauth);
                    }
                }
                FilterKind::RateLimit => self.rate_limit_per_route(owner, name, &mut fields, &mut options),
                FilterKind::Fault => {
                    if let Some(faults) = self.faults(owner, name, &mut fields) {
                        options.insert("faults".into(), faults);
                    }
                }
                other => {
                    self.unsupported(
                        owner,
                        format!("per-filter config {name} ({}) is not supported", other.as_str()),
                    );
                    continue;
                }
            }
            if let Some(message) = fields.leftover_message(name) {
                self.unsupported(owner, message);
            }
        }
        options
    }

    fn transformations(&mut self, owner: &ResourceIdentity, name: &str, fields: &mut Fields<'_>) -> Option<Value> {
        let mut early = Vec::new();
        let mut regular = Vec::new();

        // Single-stage form predating `transformations`.
        let legacy_request = fields.take("request_transformation");
        let legacy_response = fields.take("response_transformation");
        let legacy_clear = fields.bool("clear_route_cache");
        if legacy_request.is_some() || legacy_response.is_some() {
            regular.push(request_match(legacy_clear, legacy_request, legacy_response));
        }

        for (index, entry) in fields.array("transformations").iter().enumerate() {
            let stage = entry.get("stage").and_then(Value::as_u64).unwrap_or(0);
            let target = match stage {
                0 => &mut regular,
                1 => &mut early,
                _ => {
                    self.ignored(
                        owner,
                        format!("{name} transformations[{index}] runs in stage {stage}, which is not migrated"),
                    );
                    continue;
                }
            };
            if let Some(matched) = entry.get("request_match") {
                if matched.get("match").is_some() {
                    self.unsupported(
                        owner,
                        format!("{name} transformations[{index}] request_match.match is not supported"),
                    );
                }
                target.push(request_match(
                    matched.get("clear_route_cache").and_then(Value::as_bool).unwrap_or(false),
                    matched.get("request_transformation"),
                    matched.get("response_transformation"),
                ));
            } else if entry.get("response_match").is_some() {
                self.unsupported(
                    owner,
                    format!("{name} transformations[{index}] response_match is not supported"),
                );
            }
        }

        if early.is_empty() && regular.is_empty() {
            return None;
        }
        let mut staged = Map::new();
        if !early.is_empty() {
            staged.insert("early".into(), json!({"requestTransforms": early}));
        }
        if !regular.is_empty() {
            staged.insert("regular".into(), json!({"requestTransforms": regular}));
        }
        Some(Value::Object(staged))
    }

    /// A per-route RBAC config without `rbac` is how the proxy turns the
    /// filter off for a route, so it maps to `disable: true`.
    ///
    /// Only ALLOW rules have a target form. Any other action drops the whole
    /// config. A policy with fields that cannot be carried over is dropped
    /// on its own.
    fn rbac(&mut self, owner: &ResourceIdentity, name: &str, fields: &mut Fields<'_>) -> Option<Value> {
        let Some(rbac) = fields.object("rbac") else {
            return Some(json!({"disable": true}));
        };
        let mut rbac_fields = Fields::new(rbac);
        let rules = rbac_fields.object("rules");
        if let Some(message) = rbac_fields.leftover_message(&format!("{name} rbac")) {
            self.unsupported(owner, message);
        }
        let Some(rules) = rules else {
            return Some(json!({"disable": true}));
        };

        let mut rule_fields = Fields::new(rules);
        let action = rule_fields.str("action").unwrap_or("ALLOW");
        if action != "ALLOW" {
            self.unsupported(
                owner,
                format!("{name} rbac action {action} is not supported, the config is not migrated"),
            );
            return None;
        }

        let mut policies = Map::new();
        for (policy_name, policy) in rule_fields.object("policies").into_iter().flatten() {
            let Some(policy) = policy.as_object() else {
                self.unsupported(owner, format!("{name} rbac policy {policy_name} is not an object"));
                continue;
            };
            let mut policy_fields = Fields::new(policy);
            let mut principals = Vec::new();
            for raw in policy_fields.array("principals") {
                let mut principal = JwtPrincipal::default();
                if principal.read(raw) {
                    principals.push(principal.into_value());
                } else {
                    self.unsupported(
                        owner,
                        format!("{name} rbac policy {policy_name} has a principal that is not a JWT claim match"),
                    );
                }
            }
            let mut permissions = Permissions::default();
            for raw in policy_fields.array("permissions") {
                if !permissions.read(raw) {
                    self.unsupported(
                        owner,
                        format!("{name} rbac policy {policy_name} has a permission other than path prefix or method"),
                    );
                }
            }
            if let Some(message) = policy_fields.leftover_message(&format!("{name} rbac policy {policy_name}")) {
                self.unsupported(owner, format!("{message}, the policy is not migrated"));
                continue;
            }
            let mut out = Map::new();
            out.insert("principals".into(), Value::Array(principals));
            if let Some(permissions) = permissions.into_value() {
                out.insert("permissions".into(), permissions);
            }
            policies.insert(policy_name.clone(), Value::Object(out));
        }
        if let Some(message) = rule_fields.leftover_message(&format!("{name} rbac rules")) {
            self.unsupported(owner, message);
        }
        Some(json!({"policies": policies}))
    }

    /// Abort and delay injection. A missing `percentage` applies to every
    /// request.
    fn faults(&mut self, owner: &ResourceIdentity, name: &str, fields: &mut Fields<'_>) -> Option<Value> {
        let mut out = Map::new();
        if let Some(abort) = fields.object("abort") {
            let mut abort_fields = Fields::new(abort);
            let percentage = self.fault_percentage(owner, &mut abort_fields);
            match abort_fields.take("http_status").and_then(Value::as_u64) {
                Some(status) => {
                    out.insert("abort".into(), json!({"percentage": percentage, "httpStatus": status}));
                }
                None => self.unsupported(owner, format!("{name} abort without http_status is not supported")),
            }
            if let Some(message) = abort_fields.leftover_message(&format!("{name} abort")) {
                self.unsupported(owner, message);
            }
        }
        if let Some(delay) = fields.object("delay") {
            let mut delay_fields = Fields::new(delay);
            let percentage = self.fault_percentage(owner, &mut delay_fields);
            match delay_fields.str("fixed_delay") {
                Some(fixed) => {
                    out.insert("delay".into(), json!({"percentage": percentage, "fixedDelay": fixed}));
                }
                None => self.unsupported(owner, format!("{name} delay without fixed_delay is not supported")),
            }
            if let Some(message) = delay_fields.leftover_message(&format!("{name} delay")) {
                self.unsupported(owner, message);
            }
        }
        (!out.is_empty()).then_some(Value::Object(out))
    }

    fn fault_percentage(&mut self, owner: &ResourceIdentity, fields: &mut Fields<'_>) -> u32 {
        let Some(raw) = fields.object("percentage") else {
            return 100;
        };
        let fraction = FractionalPercent {
            numerator: raw
                .get("numerator")
                .and_then(Value::as_u64)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0),
            denominator: raw.get("denominator").and_then(Value::as_str).map(str::to_string),
        };
        let mapped = to_percent(&fraction);
        for finding in mapped.findings {
            self.record(finding.category, owner, finding.message);
        }
        mapped.value
    }

    fn jwt(
        &mut self,
        owner: &ResourceIdentity,
        hcm: &HttpConnectionManager,
        filter: &TypedFilter,
        fields: &mut Fields<'_>,
    ) -> Option<Value> {
        let configs = fields.object("jwt_configs")?;
        let mut staged = Map::new();
        for (stage, config) in configs {
            let key = match stage.as_str() {
                STAGE_AFTER_EXT_AUTH => "afterExtAuth",
                STAGE_BEFORE_EXT_AUTH => "beforeExtAuth",
                other => {
                    self.ignored(owner, format!("{} stage {other} is not a known JWT stage", filter.name));
                    continue;
                }
            };
            let Some(listener) = listener_jwt(hcm, &filter.name, stage) else {
                self.record(
                    Category::UnknownReference,
                    owner,
                    format!("{} stage {stage} has no matching JWT filter on the listener", filter.name),
                );
                continue;
            };
            let requirement = config.get("requirement").and_then(Value::as_str).unwrap_or_default();
            let authn = listener.config.get("jwt_authn");
            let found = authn
                .and_then(|a| a.pointer("/filter_state_rules/requires"))
                .and_then(|r| r.get(requirement))
                .or_else(|| authn.and_then(|a| a.get("requirement_map")).and_then(|r| r.get(requirement)));
            let Some(found) = found else {
                self.record(
                    Category::UnknownReference,
                    owner,
                    format!("{} requirement {requirement} is not defined on the listener", filter.name),
                );
                continue;
            };

            let mut resolved = Requirement::default();
            resolved.read(found);
            if resolved.requires_all {
                self.unsupported(
                    owner,
                    format!(
                        "{} requirement {requirement} uses requires_all, the JWT config is not migrated",
                        filter.name
                    ),
                );
                return None;
            }
            let mut providers = Map::new();
            for provider_name in &resolved.providers {
                let Some(raw) = authn.and_then(|a| a.get("providers")).and_then(|p| p.get(provider_name)) else {
                    self.record(
                        Category::UnknownReference,
                        owner,
                        format!("{} provider {provider_name} is not defined on the listener", filter.name),
                    );
                    continue;
                };
                let mut provider = self.jwt_provider(owner, provider_name, raw);
                let claims = config
                    .get("claims_to_headers")
                    .and_then(|c| c.get(provider_name))
                    .and_then(|c| c.get("claims"))
                    .and_then(Value::as_array);
                if let (Some(claims), Value::Object(map)) = (claims, &mut provider) {
                    let converted: Vec<Value> = claims
                        .iter()
                        .map(|c| {
                            json!({
                                "claim": c.get("claim").cloned().unwrap_or(Value::Null),
                                "header": c.get("header").cloned().unwrap_or(Value::Null),
                                "append": c.get("append").and_then(Value::as_bool).unwrap_or(false),
                            })
                        })
                        .collect();
                    map.insert("claimsToHeaders".into(), Value::Array(converted));
                }
                providers.insert(provider_name.clone(), provider);
            }
            let mut out = Map::new();
            out.insert("providers".into(), Value::Object(providers));
            if let Some(policy) = resolved.validation_policy {
                out.insert("validationPolicy".into(), json!(policy));
            }
            staged.insert(key.into(), Value::Object(out));
        }
        (!staged.is_empty()).then_some(Value::Object(staged))
    }

    fn jwt_provider(&mut self, owner: &ResourceIdentity, name: &str, raw: &Value) -> Value {
        let empty = Map::new();
        let map = raw.as_object().unwrap_or(&empty);
        let mut fields = Fields::new(map);
        let mut out = Map::new();

        if let Some(issuer) = fields.str("issuer") {
            out.insert("issuer".into(), json!(issuer));
        }
        let audiences = fields.array("audiences");
        if !audiences.is_empty() {
            out.insert("audiences".into(), json!(audiences));
        }
        if let Some(remote) = fields.object("remote_jwks") {
            let mut jwks = Map::new();
            if let Some(uri) = remote.get("http_uri") {
                jwks.insert("url".into(), uri.get("uri").cloned().unwrap_or(Value::Null));
                if let Some(cluster) = uri.get("cluster").and_then(Value::as_str) {
                    jwks.insert("upstreamRef".into(), self.upstream_ref(cluster));
                }
            }
            if let Some(duration) = remote.get("cache_duration") {
                jwks.insert("cacheDuration".into(), duration.clone());
            }
            if let Some(fetch) = remote.get("async_fetch") {
                jwks.insert("asyncFetch".into(), camel_keys(fetch, &[]));
            }
            out.insert("jwks".into(), json!({"remote": jwks}));
        } else if let Some(local) = fields.object("local_jwks") {
            let key = local.get("inline_string").cloned().unwrap_or(Value::Null);
            out.insert("jwks".into(), json!({"local": {"key": key}}));
        }

        let headers: Vec<Value> = fields
            .array("from_headers")
            .iter()
            .map(|h| {
                let mut header = Map::new();
                header.insert("header".into(), h.get("name").cloned().unwrap_or(Value::Null));
                if let Some(prefix) = h.get("value_prefix").filter(|p| !p.is_null()) {
                    header.insert("prefix".into(), prefix.clone());
                }
                Value::Object(header)
            })
            .collect();
        let params = fields.array("from_params");
        if !headers.is_empty() || !params.is_empty() {
            out.insert("tokenSource".into(), json!({"headers": headers, "queryParams": params}));
        }
        if fields.bool("forward") {
            out.insert("keepToken".into(), json!(true));
        }
        if let Some(skew) = fields.take("clock_skew_seconds") {
            out.insert("clockSkewSeconds".into(), skew.clone());
        }
        // Set by the control plane for every provider.
        fields.take("payload_in_metadata");

        if let Some(message) = fields.leftover_message(&format!("JWT provider {name}")) {
            self.unsupported(owner, message);
        }
        Value::Object(out)
    }

    fn ext_authz(&mut self, owner: &ResourceIdentity, name: &str, fields: &mut Fields<'_>) -> Option<Value> {
        if fields.bool("disabled") {
            return Some(json!({"disable": true}));
        }
        let settings = fields.object("check_settings")?;
        let mut extensions = settings
            .get("context_extensions")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let config_id = extensions.remove("config_id");
        let extra: Vec<&String> = extensions.keys().collect();
        if !extra.is_empty() || settings.keys().any(|k| k != "context_extensions") {
            self.unsupported(owner, format!("{name} check settings other than config_id are not supported"));
        }
        let config_id = config_id.as_ref().and_then(Value::as_str)?;
        let (config_name, config_namespace) = parse_config_ref(config_id);
        Some(json!({"configRef": {"name": config_name, "namespace": config_namespace}}))
    }

    fn rate_limit_per_route(
        &mut self,
        owner: &ResourceIdentity,
        name: &str,
        fields: &mut Fields<'_>,
        options: &mut Map<String, Value>,
    ) {
        for (index, raw) in fields.array("rate_limits").iter().enumerate() {
            let path = format!("{name} rate_limits[{index}]");
            if let Some(descriptor) = self.rate_limit_descriptor(owner, &path, raw) {
                push_rate_limit(options, descriptor);
            }
        }
        if fields.str("vh_rate_limits") == Some("INCLUDE") {
            if let Some(ratelimit) = options.get_mut("ratelimit").and_then(Value::as_object_mut) {
                ratelimit.insert("includeVhRateLimits".into(), json!(true));
            }
        }
        fields.take("override_option");
    }
}

fn cors(fields: &mut Fields<'_>) -> Option<Value> {
    let mut out = Map::new();
    let mut origins = Vec::new();
    let mut regexes = Vec::new();
    for matcher in fields.array("allow_origin_string_match") {
        if let Some(exact) = matcher.get("exact").and_then(Value::as_str) {
            origins.push(json!(exact));
        } else if let Some(regex) = matcher.pointer("/safe_regex/regex").and_then(Value::as_str) {
            regexes.push(json!(regex));
        } else if let Some(prefix) = matcher.get("prefix").and_then(Value::as_str) {
            regexes.push(json!(format!("{}.*", prefix.replace('.', "\\."))));
        }
    }
    if !origins.is_empty() {
        out.insert("allowOrigin".into(), Value::Array(origins));
    }
    if !regexes.is_empty() {
        out.insert("allowOriginRegex".into(), Value::Array(regexes));
    }
    for (from, to) in [
        ("allow_methods", "allowMethods"),
        ("allow_headers", "allowHeaders"),
        ("expose_headers", "exposeHeaders"),
    ] {
        if let Some(list) = fields.str(from).map(comma_list).filter(|l| !l.is_empty()) {
            out.insert(to.into(), json!(list));
        }
    }
    if let Some(max_age) = fields.take("max_age") {
        out.insert("maxAge".into(), max_age.clone());
    }
    if let Some(credentials) = fields.take("allow_credentials").and_then(Value::as_bool) {
        out.insert("allowCredentials".into(), json!(credentials));
    }
    let filter_off = fields
        .take("filter_enabled")
        .and_then(|f| f.pointer("/default_value/numerator"))
        .and_then(Value::as_u64)
        == Some(0);
    let shadowed = fields
        .take("shadow_enabled")
        .and_then(|f| f.pointer("/default_value/numerator"))
        .and_then(Value::as_u64)
        .is_some_and(|n| n != 100);
    if filter_off || shadowed {
        out.insert("disableForRoute".into(), json!(true));
    }
    (!out.is_empty()).then_some(Value::Object(out))
}

fn waf(fields: &mut Fields<'_>) -> Value {
    let mut out = Map::new();
    if fields.bool("disabled") {
        out.insert("disabled".into(), json!(true));
    }
    if let Some(message) = fields.str("custom_intervention_message") {
        out.insert("customInterventionMessage".into(), json!(message));
    }
    let rule_sets: Vec<Value> = fields.array("rule_sets").iter().map(|r| camel_keys(r, &[])).collect();
    if !rule_sets.is_empty() {
        out.insert("ruleSets".into(), Value::Array(rule_sets));
    }
    for (from, to) in [
        ("request_headers_only", "requestHeadersOnly"),
        ("response_headers_only", "responseHeadersOnly"),
        ("audit_logging", "auditLogging"),
    ] {
        if let Some(value) = fields.take(from) {
            out.insert(to.into(), camel_keys(value, &[]));
        }
    }
    Value::Object(out)
}

fn request_match(clear_route_cache: bool, request: Option<&Value>, response: Option<&Value>) -> Value {
    let mut out = Map::new();
    if clear_route_cache {
        out.insert("clearRouteCache".into(), json!(true));
    }
    if let Some(request) = request {
        out.insert("requestTransformation".into(), camel_keys(request, USER_MAPS));
    }
    if let Some(response) = response {
        out.insert("responseTransformation".into(), camel_keys(response, USER_MAPS));
    }
    Value::Object(out)
}

/// The listener JWT filter answering for `name` at `stage`.
fn listener_jwt<'h>(hcm: &'h HttpConnectionManager, name: &str, stage: &str) -> Option<&'h TypedFilter> {
    let stage_of = |f: &TypedFilter| {
        f.config
            .get("stage")
            .and_then(Value::as_u64)
            .unwrap_or(0)
            .to_string()
    };
    let all: Vec<&TypedFilter> = hcm.http_filters_of(FilterKind::Jwt).filter(|f| stage_of(f) == stage).collect();
    all.iter()
        .find(|f| f.name == name)
        .or_else(|| all.first())
        .copied()
}

/// Providers named by a requirement tree, and the validation policy its
/// allow-missing leaves imply.
#[derive(Debug, Default)]
struct Requirement {
    providers: Vec<String>,
    validation_policy: Option<&'static str>,
    requires_all: bool,
}

impl Requirement {
    fn read(&mut self, raw: &Value) {
        if let Some(name) = raw.get("provider_name").and_then(Value::as_str) {
            self.push(name);
        } else if let Some(name) = raw.pointer("/provider_and_audiences/provider_name").and_then(Value::as_str) {
            self.push(name);
        } else if let Some(list) = raw.pointer("/requires_any/requirements").and_then(Value::as_array) {
            list.iter().for_each(|r| self.read(r));
        } else if let Some(list) = raw.pointer("/requires_all/requirements").and_then(Value::as_array) {
            self.requires_all = true;
            list.iter().for_each(|r| self.read(r));
        } else if raw.get("allow_missing_or_failed").is_some() {
            self.validation_policy = Some("ALLOW_MISSING_OR_FAILED");
        } else if raw.get("allow_missing").is_some() {
            self.validation_policy = Some("ALLOW_MISSING");
        }
    }

    fn push(&mut self, name: &str) {
        if !self.providers.iter().any(|p| p == name) {
            self.providers.push(name.to_string());
        }
    }
}

/// Claims gathered from metadata matchers on the JWT payload.
#[derive(Debug, Default)]
struct JwtPrincipal {
    claims: Map<String, Value>,
    provider: Option<String>,
    matcher: Option<&'static str>,
}

impl JwtPrincipal {
    /// A single metadata matcher or an AND of them.
    fn read(&mut self, raw: &Value) -> bool {
        match raw.pointer("/and_ids/ids").and_then(Value::as_array) {
            Some(ids) => ids.iter().all(|id| self.read_claim(id)),
            None => self.read_claim(raw),
        }
    }

    fn read_claim(&mut self, raw: &Value) -> bool {
        let Some(metadata) = raw.get("metadata") else {
            return false;
        };
        let path: Vec<&str> = metadata
            .get("path")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|segment| segment.get("key").and_then(Value::as_str))
            .collect();
        let Some((first, claim_path)) = path.split_first() else {
            return false;
        };
        if claim_path.is_empty() {
            return false;
        }
        if *first != PRINCIPAL_METADATA_KEY {
            self.provider = Some((*first).to_string());
        }
        let value = metadata.get("value");
        let (claim, matcher) = if let Some(exact) = value.and_then(|v| v.pointer("/string_match/exact")) {
            (exact.clone(), None)
        } else if let Some(exact) = value.and_then(|v| v.pointer("/list_match/one_of/string_match/exact")) {
            (exact.clone(), Some("LIST_CONTAINS"))
        } else if let Some(flag) = value.and_then(|v| v.get("bool_match")).and_then(Value::as_bool) {
            (json!(flag.to_string()), Some("BOOLEAN"))
        } else {
            return false;
        };
        self.claims.insert(claim_path.join("."), claim);
        if matcher.is_some() {
            self.matcher = matcher;
        }
        true
    }

    fn into_value(self) -> Value {
        let mut principal = Map::new();
        principal.insert("claims".into(), Value::Object(self.claims));
        if let Some(provider) = self.provider {
            principal.insert("provider".into(), json!(provider));
        }
        if let Some(matcher) = self.matcher {
            principal.insert("matcher".into(), json!(matcher));
        }
        json!({"jwtPrincipal": principal})
    }
}

#[derive(Debug, Default)]
struct Permissions {
    path_prefix: Option<String>,
    methods: Vec<String>,
}

impl Permissions {
    /// One rule or an AND of rules. A rule is a path prefix, a method, or
    /// an OR of methods.
    fn read(&mut self, raw: &Value) -> bool {
        match raw.pointer("/and_rules/rules").and_then(Value::as_array) {
            Some(rules) => rules.iter().all(|rule| self.read_rule(rule)),
            None => self.read_rule(raw),
        }
    }

    fn read_rule(&mut self, raw: &Value) -> bool {
        if raw.get("any").is_some() {
            return true;
        }
        if let Some(prefix) = raw.pointer("/url_path/path/prefix").and_then(Value::as_str) {
            self.path_prefix = Some(prefix.to_string());
            return true;
        }
        if let Some(rules) = raw.pointer("/or_rules/rules").and_then(Value::as_array) {
            return !rules.is_empty() && rules.iter().all(|rule| self.read_method(rule));
        }
        self.read_method(raw)
    }

    fn read_method(&mut self, raw: &Value) -> bool {
        let Some(header) = raw.get("header") else {
            return false;
        };
        if header.get("name").and_then(Value::as_str) != Some(":method") {
            return false;
        }
        let method = header
            .get("exact_match")
            .or_else(|| header.pointer("/string_match/exact"))
            .and_then(Value::as_str);
        match method {
            Some(method) => {
                self.methods.push(method.to_string());
                true
            }
            None => false,
        }
    }

    fn into_value(self) -> Option<Value> {
        if self.path_prefix.is_none() && self.methods.is_empty() {
            return None;
        }
        let mut out = Map::new();
        if let Some(prefix) = self.path_prefix {
            out.insert("pathPrefix".into(), json!(prefix));
        }
        if !self.methods.is_empty() {
            out.insert("methods".into(), json!(self.methods));
        }
        Some(Value::Object(out))
    }
}

/// Split an ext auth `config_id` of the form `name.namespace`. An id
/// without a dot names a config in `default`.
fn parse_config_ref(config_id: &str) -> (&str, &str) {
    match config_id.split_once('.') {
        Some((name, namespace)) => (name, namespace),
        None => (config_id, "default"),
    }
}
