//! Cluster records.

use serde::Deserialize;

use crate::listener::Address;
use crate::tls::{TransportSocket, TransportSocketMatch, ISTIO_MTLS_MATCH};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct WireCluster {
    pub name: String,
    /// Discovery type such as `EDS` or `STRICT_DNS`.
    #[serde(rename = "type")]
    pub discovery_type: Option<String>,
    pub eds_cluster_config: Option<EdsClusterConfig>,
    pub load_assignment: Option<ClusterLoadAssignment>,
    pub transport_socket: Option<TransportSocket>,
    pub transport_socket_matches: Vec<TransportSocketMatch>,
    pub connect_timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EdsClusterConfig {
    pub service_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClusterLoadAssignment {
    pub endpoints: Vec<LocalityLbEndpoints>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LocalityLbEndpoints {
    pub lb_endpoints: Vec<LbEndpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LbEndpoint {
    pub endpoint: Option<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Endpoint {
    pub address: Option<Address>,
}

impl WireCluster {
    /// Name used to identify the logical service: the EDS service name when
    /// present, the cluster name otherwise.
    pub fn service_name(&self) -> &str {
        self.eds_cluster_config
            .as_ref()
            .map(|eds| eds.service_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.name)
    }

    /// Statically assigned `(host, port)` endpoints.
    pub fn endpoints(&self) -> Vec<(String, u32)> {
        self.load_assignment
            .iter()
            .flat_map(|la| la.endpoints.iter())
            .flat_map(|locality| locality.lb_endpoints.iter())
            .filter_map(|lb| lb.endpoint.as_ref()?.address.as_ref()?.socket_address.as_ref())
            .map(|sa| (sa.address.clone(), sa.port_value))
            .collect()
    }

    /// True when the cluster negotiates istio mutual TLS.
    pub fn has_istio_mtls(&self) -> bool {
        self.transport_socket_matches.iter().any(|m| m.name == ISTIO_MTLS_MATCH)
    }

    /// The TLS transport socket, looking through socket matches as well.
    pub fn tls_socket(&self) -> Option<&TransportSocket> {
        self.transport_socket.iter().find(|s| s.is_tls()).or_else(|| {
            self.transport_socket_matches
                .iter()
                .filter(|m| m.name != ISTIO_MTLS_MATCH)
                .filter_map(|m| m.transport_socket.as_ref())
                .find(|s| s.is_tls())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::WireCluster;

    #[test]
    fn service_name_prefers_eds_config() {
        let cluster: WireCluster = serde_json::from_value(json!({
            "name": "outbound|8080||reviews.bookinfo.svc.cluster.local",
            "type": "EDS",
            "eds_cluster_config": {"service_name": "outbound|9080||reviews.bookinfo.svc.cluster.local"},
            "transport_socket_matches": [{"name": "tlsMode-istio"}]
        }))
        .expect("cluster decodes");
        assert_eq!(cluster.service_name(), "outbound|9080||reviews.bookinfo.svc.cluster.local");
        assert!(cluster.has_istio_mtls());
        assert!(cluster.tls_socket().is_none());
    }

    #[test]
    fn endpoints_flatten_localities() {
        let cluster: WireCluster = serde_json::from_value(json!({
            "name": "legacy",
            "load_assignment": {"endpoints": [
                {"lb_endpoints": [{"endpoint": {"address": {"socket_address": {"address": "10.0.0.1", "port_value": 443}}}}]},
                {"lb_endpoints": [{"endpoint": {"address": {"socket_address": {"address": "10.0.0.2", "port_value": 443}}}}]}
            ]}
        }))
        .expect("cluster decodes");
        assert_eq!(
            cluster.endpoints(),
            vec![("10.0.0.1".to_string(), 443), ("10.0.0.2".to_string(), 443)]
        );
    }
}
