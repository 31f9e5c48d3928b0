//! Top-level configuration dump envelope.
//!
//! A dump is a JSON object with a `configs` array. Each element carries an
//! `@type` tag; exactly three tags are decoded (listeners, routes, clusters)
//! and every other section is skipped.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cluster::WireCluster;
use crate::error::DecodeError;
use crate::listener::{RawListener, WireListener};
use crate::route::RouteConfiguration;

pub const LISTENERS_DUMP: &str = "envoy.admin.v3.ListenersConfigDump";
pub const ROUTES_DUMP: &str = "envoy.admin.v3.RoutesConfigDump";
pub const CLUSTERS_DUMP: &str = "envoy.admin.v3.ClustersConfigDump";

/// A filter or payload the decoder could not interpret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeNote {
    /// Slash-separated path to the skipped element.
    pub location: String,
    pub message: String,
}

impl DecodeNote {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }

    /// Prefix the location with an enclosing path.
    pub fn within(mut self, parent: &str) -> Self {
        self.location = format!("{parent}/{}", self.location);
        self
    }
}

/// Everything decoded from one dump.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireSnapshot {
    pub listeners: Vec<WireListener>,
    pub route_configs: Vec<RouteConfiguration>,
    pub clusters: Vec<WireCluster>,
    pub notes: Vec<DecodeNote>,
}

impl WireSnapshot {
    pub fn route_config(&self, name: &str) -> Option<&RouteConfiguration> {
        self.route_configs.iter().find(|rc| rc.name == name)
    }

    pub fn cluster(&self, name: &str) -> Option<&WireCluster> {
        self.clusters.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionKind {
    Listeners,
    Routes,
    Clusters,
}

impl SectionKind {
    fn from_type_url(type_url: &str) -> Option<Self> {
        match crate::registry::type_name(type_url) {
            LISTENERS_DUMP => Some(Self::Listeners),
            ROUTES_DUMP => Some(Self::Routes),
            CLUSTERS_DUMP => Some(Self::Clusters),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListenersDump {
    static_listeners: Vec<StaticListener>,
    dynamic_listeners: Vec<DynamicListener>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StaticListener {
    listener: RawListener,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DynamicListener {
    name: String,
    active_state: Option<StaticListener>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RoutesDump {
    static_route_configs: Vec<RouteConfigEntry>,
    dynamic_route_configs: Vec<RouteConfigEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RouteConfigEntry {
    route_config: RouteConfiguration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClustersDump {
    static_clusters: Vec<ClusterEntry>,
    dynamic_active_clusters: Vec<ClusterEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ClusterEntry {
    cluster: WireCluster,
}

/// Decode a configuration dump from raw bytes.
///
/// # Errors
///
/// Returns [`DecodeError::Json`] when the bytes are not JSON or a known
/// section does not match its schema, and [`DecodeError::Malformed`] when
/// the envelope has no `configs` array or a section has no `@type`.
pub fn decode(bytes: &[u8]) -> Result<WireSnapshot, DecodeError> {
    let root: Value = serde_json::from_slice(bytes)?;
    let configs = root
        .get("configs")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::Malformed("missing top-level `configs` array".to_string()))?;

    let mut snapshot = WireSnapshot::default();
    for (idx, section) in configs.iter().enumerate() {
        let type_url = section
            .get("@type")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::Malformed(format!("config section {idx} has no @type")))?;
        match SectionKind::from_type_url(type_url) {
            Some(SectionKind::Listeners) => {
                let dump: ListenersDump = serde_json::from_value(section.clone())?;
                decode_listeners(dump, &mut snapshot)?;
            }
            Some(SectionKind::Routes) => {
                let dump: RoutesDump = serde_json::from_value(section.clone())?;
                snapshot.route_configs.extend(
                    dump.static_route_configs
                        .into_iter()
                        .chain(dump.dynamic_route_configs)
                        .map(|entry| entry.route_config),
                );
            }
            Some(SectionKind::Clusters) => {
                let dump: ClustersDump = serde_json::from_value(section.clone())?;
                snapshot.clusters.extend(
                    dump.static_clusters
                        .into_iter()
                        .chain(dump.dynamic_active_clusters)
                        .map(|entry| entry.cluster),
                );
            }
            None => debug!(type_url, "skipping unrecognized config section"),
        }
    }

    info!(
        listeners = snapshot.listeners.len(),
        route_configs = snapshot.route_configs.len(),
        clusters = snapshot.clusters.len(),
        notes = snapshot.notes.len(),
        "decoded configuration dump"
    );
    Ok(snapshot)
}

/// Read and decode a configuration dump file.
///
/// # Errors
///
/// Returns [`DecodeError::Io`] if the file cannot be read, otherwise the
/// same errors as [`decode`].
pub fn decode_file(path: &Path) -> Result<WireSnapshot, DecodeError> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

fn decode_listeners(dump: ListenersDump, snapshot: &mut WireSnapshot) -> Result<(), DecodeError> {
    let statics = dump.static_listeners.into_iter().map(|s| s.listener);
    let dynamics = dump.dynamic_listeners.into_iter().filter_map(|d| match d.active_state {
        Some(active) => Some(active.listener),
        None => {
            debug!(listener = %d.name, "skipping listener without active state");
            None
        }
    });
    for raw in statics.chain(dynamics) {
        let listener = raw.decode(&mut snapshot.notes)?;
        snapshot.listeners.push(listener);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{decode, decode_file};
    use crate::error::DecodeError;

    #[test]
    fn unknown_sections_are_skipped() {
        let dump = json!({
            "configs": [
                {"@type": "type.googleapis.com/envoy.admin.v3.BootstrapConfigDump", "bootstrap": {}},
                {"@type": "type.googleapis.com/envoy.admin.v3.ClustersConfigDump",
                 "dynamic_active_clusters": [{"cluster": {"name": "outbound|80||web.default.svc.cluster.local"}}]}
            ]
        });
        let snapshot = decode(dump.to_string().as_bytes()).expect("decodes");
        assert_eq!(snapshot.clusters.len(), 1);
        assert!(snapshot.cluster("outbound|80||web.default.svc.cluster.local").is_some());
        assert!(snapshot.notes.is_empty());
    }

    #[test]
    fn missing_configs_array_is_fatal() {
        let err = decode(br#"{"listeners": []}"#).expect_err("not a dump");
        match err {
            DecodeError::Malformed(message) => assert!(message.contains("configs")),
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn invalid_json_is_fatal() {
        let err = decode(b"{not json").expect_err("invalid");
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn routes_come_from_static_and_dynamic_entries() {
        let dump = json!({
            "configs": [{
                "@type": "type.googleapis.com/envoy.admin.v3.RoutesConfigDump",
                "static_route_configs": [{"route_config": {"name": "static"}}],
                "dynamic_route_configs": [{"route_config": {"name": "dynamic", "virtual_hosts": [
                    {"name": "vh", "domains": ["*"], "routes": [{"match": {"prefix": "/"}, "direct_response": {"status": 200}}]}
                ]}}]
            }]
        });
        let snapshot = decode(dump.to_string().as_bytes()).expect("decodes");
        assert_eq!(snapshot.route_configs.len(), 2);
        let dynamic = snapshot.route_config("dynamic").expect("dynamic route config");
        assert_eq!(dynamic.virtual_hosts[0].routes[0].direct_response.as_ref().map(|d| d.status), Some(200));
    }

    #[test]
    fn decode_file_reports_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = decode_file(&dir.path().join("absent.json")).expect_err("missing file");
        assert!(matches!(err, DecodeError::Io(_)));
    }
}
