//! Transport socket helpers.

use serde::Deserialize;
use serde_json::Value;

pub const TLS_TRANSPORT_SOCKET: &str = "envoy.transport_sockets.tls";
pub const ISTIO_MTLS_MATCH: &str = "tlsMode-istio";
const KUBERNETES_SECRET_PREFIX: &str = "kubernetes://";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportSocket {
    pub name: String,
    pub typed_config: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransportSocketMatch {
    pub name: String,
    pub transport_socket: Option<TransportSocket>,
}

/// TLS settings recovered from an upstream transport socket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamTls {
    pub sni: Option<String>,
    /// Secret names with any `kubernetes://` prefix removed.
    pub certificate_secrets: Vec<String>,
    pub subject_alt_names: Vec<String>,
    pub alpn_protocols: Vec<String>,
}

/// TLS settings recovered from a downstream (listener) transport socket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownstreamTls {
    pub certificate_secrets: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTlsContext {
    sni: Option<String>,
    common_tls_context: RawCommonTlsContext,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCommonTlsContext {
    tls_certificate_sds_secret_configs: Vec<RawSdsSecret>,
    alpn_protocols: Vec<String>,
    validation_context: Option<RawValidationContext>,
    combined_validation_context: Option<RawCombinedValidation>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSdsSecret {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCombinedValidation {
    default_validation_context: Option<RawValidationContext>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawValidationContext {
    match_subject_alt_names: Vec<RawSanMatcher>,
    match_typed_subject_alt_names: Vec<RawTypedSanMatcher>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSanMatcher {
    exact: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTypedSanMatcher {
    matcher: RawSanMatcher,
}

impl TransportSocket {
    pub fn is_tls(&self) -> bool {
        self.name == TLS_TRANSPORT_SOCKET || self.name.ends_with(".tls")
    }

    fn context(&self) -> Option<RawTlsContext> {
        if !self.is_tls() {
            return None;
        }
        let config = self.typed_config.clone()?;
        serde_json::from_value(config).ok()
    }

    /// Read an `UpstreamTlsContext`; `None` for non-TLS sockets.
    pub fn upstream_tls(&self) -> Option<UpstreamTls> {
        let ctx = self.context()?;
        let common = ctx.common_tls_context;
        let mut subject_alt_names = Vec::new();
        let validation = common
            .validation_context
            .or(common.combined_validation_context.and_then(|c| c.default_validation_context));
        if let Some(validation) = validation {
            subject_alt_names.extend(validation.match_subject_alt_names.into_iter().filter_map(|m| m.exact));
            subject_alt_names.extend(
                validation
                    .match_typed_subject_alt_names
                    .into_iter()
                    .filter_map(|m| m.matcher.exact),
            );
        }
        Some(UpstreamTls {
            sni: ctx.sni.filter(|s| !s.is_empty()),
            certificate_secrets: secret_names(&common.tls_certificate_sds_secret_configs),
            subject_alt_names,
            alpn_protocols: common.alpn_protocols,
        })
    }

    /// Read a `DownstreamTlsContext`; `None` for non-TLS sockets.
    pub fn downstream_tls(&self) -> Option<DownstreamTls> {
        let ctx = self.context()?;
        Some(DownstreamTls {
            certificate_secrets: secret_names(&ctx.common_tls_context.tls_certificate_sds_secret_configs),
        })
    }
}

fn secret_names(configs: &[RawSdsSecret]) -> Vec<String> {
    configs
        .iter()
        .map(|s| s.name.strip_prefix(KUBERNETES_SECRET_PREFIX).unwrap_or(&s.name).to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::TransportSocket;

    #[test]
    fn upstream_tls_reads_sni_secret_and_sans() {
        let socket = TransportSocket {
            name: "envoy.transport_sockets.tls".to_string(),
            typed_config: Some(json!({
                "@type": "type.googleapis.com/envoy.extensions.transport_sockets.tls.v3.UpstreamTlsContext",
                "sni": "payments.example.com",
                "common_tls_context": {
                    "tls_certificate_sds_secret_configs": [{"name": "kubernetes://client-cert"}],
                    "combined_validation_context": {
                        "default_validation_context": {
                            "match_subject_alt_names": [{"exact": "spiffe://payments"}]
                        }
                    }
                }
            })),
        };
        let tls = socket.upstream_tls().expect("tls socket");
        assert_eq!(tls.sni.as_deref(), Some("payments.example.com"));
        assert_eq!(tls.certificate_secrets, vec!["client-cert".to_string()]);
        assert_eq!(tls.subject_alt_names, vec!["spiffe://payments".to_string()]);
    }

    #[test]
    fn plain_sockets_have_no_tls() {
        let socket = TransportSocket {
            name: "envoy.transport_sockets.raw_buffer".to_string(),
            typed_config: None,
        };
        assert!(socket.upstream_tls().is_none());
    }
}
