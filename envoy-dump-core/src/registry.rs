//! Registry of filter schemas the decoder knows how to unwrap.
//!
//! Each schema is submitted with [`inventory::submit!`] next to the kind it
//! describes, so the lookup table is assembled at link time. A typed payload
//! whose type name matches no schema is reported to the caller and skipped.

use serde_json::{Map, Value};

use crate::envelope::DecodeNote;

/// Filter families recognised inside listeners and per-route configs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FilterKind {
    ConnectionManager,
    TcpProxy,
    Router,
    HealthCheck,
    RateLimit,
    ExtAuthz,
    Rbac,
    Jwt,
    Transformation,
    Waf,
    AwsLambda,
    Cors,
    Fault,
    Stats,
}

impl FilterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionManager => "http_connection_manager",
            Self::TcpProxy => "tcp_proxy",
            Self::Router => "router",
            Self::HealthCheck => "health_check",
            Self::RateLimit => "ratelimit",
            Self::ExtAuthz => "ext_authz",
            Self::Rbac => "rbac",
            Self::Jwt => "jwt",
            Self::Transformation => "transformation",
            Self::Waf => "waf",
            Self::AwsLambda => "aws_lambda",
            Self::Cors => "cors",
            Self::Fault => "fault",
            Self::Stats => "stats",
        }
    }
}

/// One registered schema: the kind and every fully-qualified message name
/// that decodes to it.
pub struct FilterSchema {
    pub kind: FilterKind,
    pub type_names: &'static [&'static str],
}

inventory::collect!(FilterSchema);

inventory::submit! {
    FilterSchema {
        kind: FilterKind::ConnectionManager,
        type_names: &["envoy.extensions.filters.network.http_connection_manager.v3.HttpConnectionManager"],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::TcpProxy,
        type_names: &["envoy.extensions.filters.network.tcp_proxy.v3.TcpProxy"],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Router,
        type_names: &["envoy.extensions.filters.http.router.v3.Router"],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::HealthCheck,
        type_names: &[
            "envoy.extensions.filters.http.health_check.v3.HealthCheck",
            "envoy.config.filter.http.health_check.v2.HealthCheck",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::RateLimit,
        type_names: &[
            "envoy.extensions.filters.http.ratelimit.v3.RateLimit",
            "envoy.extensions.filters.http.ratelimit.v3.RateLimitPerRoute",
            "envoy.config.filter.http.ratelimit.v2.RateLimit",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::ExtAuthz,
        type_names: &[
            "envoy.extensions.filters.http.ext_authz.v3.ExtAuthz",
            "envoy.extensions.filters.http.ext_authz.v3.ExtAuthzPerRoute",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Rbac,
        type_names: &[
            "envoy.extensions.filters.http.rbac.v3.RBAC",
            "envoy.extensions.filters.http.rbac.v3.RBACPerRoute",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Jwt,
        type_names: &[
            "envoy.config.filter.http.solo_jwt_authn.v2.JwtWithStage",
            "envoy.config.filter.http.solo_jwt_authn.v2.StagedJwtAuthnPerRoute",
            "envoy.extensions.filters.http.jwt_authn.v3.JwtAuthentication",
            "envoy.extensions.filters.http.jwt_authn.v3.PerRouteConfig",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Transformation,
        type_names: &[
            "envoy.api.v2.filter.http.FilterTransformations",
            "envoy.api.v2.filter.http.RouteTransformations",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Waf,
        type_names: &[
            "envoy.config.filter.http.modsecurity.v2.ModSecurity",
            "envoy.config.filter.http.modsecurity.v2.ModSecurityPerRoute",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::AwsLambda,
        type_names: &[
            "envoy.config.filter.http.aws_lambda.v2.AWSLambdaConfig",
            "envoy.config.filter.http.aws_lambda.v2.AWSLambdaPerRoute",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Cors,
        type_names: &[
            "envoy.extensions.filters.http.cors.v3.Cors",
            "envoy.extensions.filters.http.cors.v3.CorsPolicy",
        ],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Fault,
        type_names: &["envoy.extensions.filters.http.fault.v3.HTTPFault"],
    }
}

inventory::submit! {
    FilterSchema {
        kind: FilterKind::Stats,
        type_names: &[
            "envoy.extensions.filters.http.grpc_stats.v3.FilterConfig",
            "envoy.config.filter.http.stats.v2.FilterConfig",
        ],
    }
}

const TYPED_STRUCT_NAMES: &[&str] = &["udpa.type.v1.TypedStruct", "xds.type.v3.TypedStruct"];

/// A filter payload whose schema has been identified.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedFilter {
    /// Filter instance name, e.g. `envoy.filters.http.cors`.
    pub name: String,
    pub kind: FilterKind,
    /// Fully-qualified message name with any `TypedStruct` wrapper removed.
    pub type_name: String,
    /// Message fields, without the `@type` key.
    pub config: Map<String, Value>,
}

/// Strip a `type.googleapis.com/` style prefix.
pub fn type_name(type_url: &str) -> &str {
    type_url.rsplit('/').next().unwrap_or(type_url)
}

/// Look up the kind registered for a type URL or bare message name.
pub fn lookup(type_url: &str) -> Option<FilterKind> {
    let name = type_name(type_url);
    inventory::iter::<FilterSchema>
        .into_iter()
        .find(|schema| schema.type_names.contains(&name))
        .map(|schema| schema.kind)
}

/// Unwrap one `Any`-encoded payload into a [`TypedFilter`].
///
/// `TypedStruct` wrappers are opened and their inner `type_url` is used for
/// the lookup. Returns a note naming the filter when the payload is missing
/// or its type is not registered.
pub fn unwrap_any(name: &str, any: Option<&Value>) -> Result<TypedFilter, DecodeNote> {
    let Some(Value::Object(fields)) = any else {
        return Err(DecodeNote::new(name, "filter has no typed config"));
    };
    let outer = fields.get("@type").and_then(Value::as_str).unwrap_or_default();

    let (type_url, config) = if TYPED_STRUCT_NAMES.contains(&type_name(outer)) {
        let inner = fields.get("type_url").and_then(Value::as_str).unwrap_or_default();
        let value = match fields.get("value") {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        };
        (inner, value)
    } else {
        let mut map = fields.clone();
        map.remove("@type");
        (outer, map)
    };

    match lookup(type_url) {
        Some(kind) => Ok(TypedFilter {
            name: name.to_string(),
            kind,
            type_name: type_name(type_url).to_string(),
            config,
        }),
        None => Err(DecodeNote::new(
            name,
            format!("unsupported filter type {}", type_name(type_url)),
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{lookup, unwrap_any, FilterKind};

    #[test]
    fn lookup_accepts_full_type_urls() {
        assert_eq!(
            lookup("type.googleapis.com/envoy.extensions.filters.http.cors.v3.CorsPolicy"),
            Some(FilterKind::Cors)
        );
        assert_eq!(
            lookup("envoy.extensions.filters.http.fault.v3.HTTPFault"),
            Some(FilterKind::Fault)
        );
        assert_eq!(lookup("envoy.extensions.filters.http.buffer.v3.Buffer"), None);
    }

    #[test]
    fn unwrap_opens_typed_struct() {
        let any = json!({
            "@type": "type.googleapis.com/udpa.type.v1.TypedStruct",
            "type_url": "type.googleapis.com/envoy.config.filter.http.solo_jwt_authn.v2.JwtWithStage",
            "value": {"stage": 1}
        });
        let filter = unwrap_any("io.solo.filters.http.solo_jwt_authn_staged", Some(&any))
            .expect("typed struct decodes");
        assert_eq!(filter.kind, FilterKind::Jwt);
        assert_eq!(filter.type_name, "envoy.config.filter.http.solo_jwt_authn.v2.JwtWithStage");
        assert_eq!(filter.config.get("stage"), Some(&json!(1)));
    }

    #[test]
    fn unwrap_reports_unknown_types() {
        let any = json!({"@type": "type.googleapis.com/envoy.extensions.filters.http.buffer.v3.Buffer"});
        let note = unwrap_any("envoy.filters.http.buffer", Some(&any)).expect_err("buffer is not registered");
        assert_eq!(note.location, "envoy.filters.http.buffer");
        assert!(note.message.contains("Buffer"));
    }

    #[test]
    fn unwrap_strips_type_key() {
        let any = json!({
            "@type": "type.googleapis.com/envoy.extensions.filters.http.ext_authz.v3.ExtAuthzPerRoute",
            "disabled": true
        });
        let filter = unwrap_any("envoy.filters.http.ext_authz", Some(&any)).expect("decodes");
        assert!(!filter.config.contains_key("@type"));
        assert_eq!(filter.config.get("disabled"), Some(&json!(true)));
    }
}
