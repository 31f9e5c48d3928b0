use crate::source::upstream::SslConfig;
use crate::target::backend::{BackendTls, TlsFiles, TlsParameters};
use crate::target::LocalRef;

use super::{Findings, Mapped};

/// Upstream TLS settings. The referenced secret must live in the policy's
/// namespace.
pub fn backend_tls(source: &SslConfig, namespace: &str) -> Mapped<Option<BackendTls>> {
    let mut findings = Findings::new();
    findings.overflow("sslConfig", &source.other);
    if source.sds.is_some() {
        findings.unsupported("sslConfig sds is not supported");
    }
    if !source.sni_domains.is_empty() {
        findings.ignored("sslConfig sniDomains only applies to downstream TLS");
    }
    if source.ocsp_staple_policy.is_some() {
        findings.unsupported("sslConfig ocspStaplePolicy is not supported");
    }

    let secret_ref = source.secret_ref.as_ref().and_then(|secret| {
        let secret_ns = secret.namespace_or(namespace);
        if secret_ns == namespace {
            Some(LocalRef::new(secret.name.clone()))
        } else {
            findings.unsupported(format!(
                "sslConfig secret {secret_ns}/{} is outside namespace {namespace}",
                secret.name
            ));
            None
        }
    });

    let tls_files = source.ssl_files.as_ref().map(|files| {
        if files.ocsp_staple.is_some() {
            findings.unsupported("sslConfig sslFiles ocspStaple is not supported");
        }
        TlsFiles {
            tls_certificate: files.tls_cert.clone(),
            tls_key: files.tls_key.clone(),
            root_ca: files.root_ca.clone(),
        }
    });

    let parameters = source.parameters.as_ref().map(|p| TlsParameters {
        tls_min_version: p.minimum_protocol_version.as_deref().map(protocol_version),
        tls_max_version: p.maximum_protocol_version.as_deref().map(protocol_version),
        cipher_suites: p.cipher_suites.clone(),
        ecdh_curves: p.ecdh_curves.clone(),
    });

    let tls = BackendTls {
        secret_ref,
        tls_files,
        sni: source.sni.clone().filter(|s| !s.is_empty()),
        verify_subject_alt_name: source.verify_subject_alt_name.clone(),
        parameters,
        alpn_protocols: source.alpn_protocols.clone(),
        allow_renegotiation: source.allow_renegotiation.filter(|r| *r),
        one_way_tls: source.one_way_tls.filter(|o| *o),
    };
    let empty = tls == BackendTls::default();
    Mapped::new((!empty).then_some(tls), findings)
}

/// `TLSv1_2` becomes `1.2`; `TLS_AUTO` becomes `AUTO`.
fn protocol_version(raw: &str) -> String {
    match raw.strip_prefix("TLSv") {
        Some(version) => version.replace('_', "."),
        None if raw == "TLS_AUTO" => "AUTO".to_string(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::backend_tls;
    use crate::diagnostics::Category;
    use crate::source::upstream::SslConfig;

    #[test]
    fn local_secret_and_parameters_are_mapped() {
        let source: SslConfig = serde_json::from_value(json!({
            "secretRef": {"name": "petstore-client", "namespace": "gloo-system"},
            "sni": "petstore.example.com",
            "parameters": {"minimumProtocolVersion": "TLSv1_2", "maximumProtocolVersion": "TLS_AUTO"}
        }))
        .expect("ssl decodes");
        let mapped = backend_tls(&source, "gloo-system");
        assert!(mapped.findings.is_empty());
        let tls = mapped.value.expect("tls");
        assert_eq!(tls.secret_ref.map(|s| s.name), Some("petstore-client".to_string()));
        let params = tls.parameters.expect("parameters");
        assert_eq!(params.tls_min_version.as_deref(), Some("1.2"));
        assert_eq!(params.tls_max_version.as_deref(), Some("AUTO"));
    }

    #[test]
    fn foreign_secret_is_dropped() {
        let source: SslConfig = serde_json::from_value(json!({
            "secretRef": {"name": "client", "namespace": "certs"}
        }))
        .expect("ssl decodes");
        let mapped = backend_tls(&source, "default");
        assert!(mapped.value.is_none());
        assert_eq!(mapped.findings.count(Category::Unsupported), 1);
    }
}
