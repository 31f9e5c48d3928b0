//! Cluster names back to route destinations.

use envoy_dump_core::tls::UpstreamTls;
use envoy_dump_core::WireCluster;
use serde_json::{json, Map, Value};

use crate::identity::{sanitize_name, ResourceIdentity, SourceKind};
use crate::resolve::{disambiguate, ClusterName};

use super::Decompiler;

impl Decompiler<'_> {
    /// The destination a route uses to reach `cluster`. Kubernetes service
    /// clusters point at the service directly; anything else goes through
    /// an Upstream rebuilt from the cluster record.
    pub(super) fn destination(&mut self, cluster: &str) -> Value {
        match disambiguate(cluster) {
            ClusterName::KubernetesService { name, namespace, port } => {
                self.check_service_tls(cluster);
                json!({"kube": {"ref": {"name": name, "namespace": namespace}, "port": port}})
            }
            _ => json!({"upstream": self.upstream_ref(cluster)}),
        }
    }

    /// Reference to an Upstream standing for `cluster`, rebuilt on first
    /// use only. A cluster that cannot be rebuilt still yields the reference
    /// so the translator reports the dangling name.
    pub(super) fn upstream_ref(&mut self, cluster: &str) -> Value {
        let name = upstream_name(cluster);
        if self.names.insert(("Upstream", name.clone())) {
            if let Some(spec) = self.upstream_spec(cluster) {
                self.push("Upstream", &name, format!("cluster {cluster}"), spec);
            }
        }
        json!({"name": name, "namespace": self.namespace})
    }

    fn upstream_spec(&mut self, cluster: &str) -> Option<Value> {
        let snapshot = self.snapshot;
        let record = snapshot.cluster(cluster);
        let wire = ResourceIdentity::wire(SourceKind::WireCluster, cluster);

        if let ClusterName::KubernetesService { name, namespace, port } = disambiguate(cluster) {
            return Some(json!({"kube": {
                "serviceName": name,
                "serviceNamespace": namespace,
                "servicePort": port,
            }}));
        }

        let mut hosts = record.map(WireCluster::endpoints).unwrap_or_default();
        if hosts.is_empty() {
            if let ClusterName::LegacyBackend { host, port } = disambiguate(cluster) {
                hosts.push((host, port));
            }
        }
        let Some(record) = record else {
            if hosts.is_empty() {
                return None;
            }
            return Some(static_spec(&hosts, None, self.namespace));
        };
        if hosts.is_empty() {
            self.unsupported(
                &wire,
                format!(
                    "cluster has no static endpoints ({} discovery), add an Upstream for {}",
                    record.discovery_type.as_deref().unwrap_or("unknown"),
                    record.service_name()
                ),
            );
            return None;
        }
        let tls = record.tls_socket().and_then(|socket| socket.upstream_tls());
        if let Some(tls) = &tls {
            if tls.certificate_secrets.len() > 1 {
                self.unsupported(&wire, "only the first client certificate of the cluster is kept");
            }
        }
        Some(static_spec(&hosts, tls.as_ref(), self.namespace))
    }

    fn check_service_tls(&mut self, cluster: &str) {
        let snapshot = self.snapshot;
        let Some(record) = snapshot.cluster(cluster) else {
            return;
        };
        if record.tls_socket().is_some() {
            let wire = ResourceIdentity::wire(SourceKind::WireCluster, cluster);
            self.unsupported(
                &wire,
                "TLS origination to a Kubernetes service is not carried over, add a BackendTLSPolicy",
            );
        }
    }
}

fn upstream_name(cluster: &str) -> String {
    match disambiguate(cluster) {
        ClusterName::KubernetesService { name, namespace, port } => {
            sanitize_name(&format!("{namespace}-{name}-{port}"))
        }
        ClusterName::LegacyBackend { host, port } => sanitize_name(&format!("{host}-{port}")),
        ClusterName::External { name } => sanitize_name(&name),
    }
}

/// TLS settings go to `sslConfig` alone; `useTls` is only written when the
/// context carries nothing `sslConfig` could hold.
fn static_spec(hosts: &[(String, u32)], tls: Option<&UpstreamTls>, namespace: &str) -> Value {
    let entries: Vec<Value> = hosts
        .iter()
        .map(|(addr, port)| json!({"addr": addr, "port": port}))
        .collect();

    let mut spec = Map::new();
    let mut static_hosts = Map::new();
    static_hosts.insert("hosts".into(), Value::Array(entries));
    if let Some(tls) = tls {
        let mut ssl = Map::new();
        if let Some(secret) = tls.certificate_secrets.first() {
            ssl.insert("secretRef".into(), json!({"name": secret, "namespace": namespace}));
        }
        if let Some(sni) = &tls.sni {
            ssl.insert("sni".into(), json!(sni));
        }
        if !tls.subject_alt_names.is_empty() {
            ssl.insert("verifySubjectAltName".into(), json!(tls.subject_alt_names));
        }
        if !tls.alpn_protocols.is_empty() {
            ssl.insert("alpnProtocols".into(), json!(tls.alpn_protocols));
        }
        if ssl.is_empty() {
            static_hosts.insert("useTls".into(), json!(true));
        } else {
            spec.insert("sslConfig".into(), Value::Object(ssl));
        }
    }
    spec.insert("static".into(), Value::Object(static_hosts));
    Value::Object(spec)
}
