//! Listener records and their network filter chains.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::envelope::DecodeNote;
use crate::registry::{unwrap_any, FilterKind, TypedFilter};
use crate::route::RouteConfiguration;
use crate::tls::TransportSocket;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Address {
    pub socket_address: Option<SocketAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SocketAddress {
    pub address: String,
    pub port_value: u32,
}

/// A decoded listener.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireListener {
    pub name: String,
    pub address: String,
    pub port: u32,
    pub filter_chains: Vec<FilterChain>,
}

impl WireListener {
    /// True when bound on every IPv4 or IPv6 address.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.address.as_str(), "0.0.0.0" | "::")
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChain {
    pub server_names: Vec<String>,
    pub transport_socket: Option<TransportSocket>,
    pub filters: Vec<ChainFilter>,
}

/// A network filter from a filter chain.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainFilter {
    ConnectionManager(HttpConnectionManager),
    TcpProxy(TcpProxy),
    Other(TypedFilter),
}

/// The HTTP connection manager with its HTTP filters already unwrapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpConnectionManager {
    pub stat_prefix: String,
    /// Route configuration name when routes are served over RDS.
    pub rds: Option<String>,
    pub route_config: Option<RouteConfiguration>,
    pub http_filters: Vec<TypedFilter>,
}

impl HttpConnectionManager {
    pub fn http_filters_of(&self, kind: FilterKind) -> impl Iterator<Item = &TypedFilter> {
        self.http_filters.iter().filter(move |f| f.kind == kind)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TcpProxy {
    pub stat_prefix: String,
    pub cluster: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawListener {
    name: String,
    address: Address,
    filter_chains: Vec<RawFilterChain>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilterChain {
    filter_chain_match: Option<RawFilterChainMatch>,
    filters: Vec<RawFilter>,
    transport_socket: Option<TransportSocket>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilterChainMatch {
    server_names: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawFilter {
    name: String,
    typed_config: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConnectionManager {
    stat_prefix: String,
    rds: Option<RawRds>,
    route_config: Option<RouteConfiguration>,
    http_filters: Vec<RawFilter>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRds {
    route_config_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTcpProxy {
    stat_prefix: String,
    cluster: Option<String>,
}

impl RawListener {
    pub(crate) fn decode(self, notes: &mut Vec<DecodeNote>) -> Result<WireListener, serde_json::Error> {
        let socket = self.address.socket_address.unwrap_or_default();
        let mut filter_chains = Vec::with_capacity(self.filter_chains.len());
        for (idx, chain) in self.filter_chains.into_iter().enumerate() {
            let location = format!("{}/filter_chains/{idx}", self.name);
            filter_chains.push(decode_chain(&location, chain, notes)?);
        }
        Ok(WireListener {
            name: self.name,
            address: socket.address,
            port: socket.port_value,
            filter_chains,
        })
    }
}

fn decode_chain(
    location: &str,
    chain: RawFilterChain,
    notes: &mut Vec<DecodeNote>,
) -> Result<FilterChain, serde_json::Error> {
    let mut filters = Vec::new();
    for raw in chain.filters {
        let filter = match unwrap_any(&raw.name, raw.typed_config.as_ref()) {
            Ok(filter) => filter,
            Err(note) => {
                debug!(location, filter = %raw.name, "skipping unrecognized network filter");
                notes.push(note.within(location));
                continue;
            }
        };
        filters.push(match filter.kind {
            FilterKind::ConnectionManager => {
                let raw_hcm: RawConnectionManager = serde_json::from_value(Value::Object(filter.config))?;
                ChainFilter::ConnectionManager(decode_connection_manager(location, raw_hcm, notes))
            }
            FilterKind::TcpProxy => {
                let raw_tcp: RawTcpProxy = serde_json::from_value(Value::Object(filter.config))?;
                ChainFilter::TcpProxy(TcpProxy {
                    stat_prefix: raw_tcp.stat_prefix,
                    cluster: raw_tcp.cluster,
                })
            }
            _ => ChainFilter::Other(filter),
        });
    }
    Ok(FilterChain {
        server_names: chain.filter_chain_match.map(|m| m.server_names).unwrap_or_default(),
        transport_socket: chain.transport_socket,
        filters,
    })
}

fn decode_connection_manager(
    location: &str,
    raw: RawConnectionManager,
    notes: &mut Vec<DecodeNote>,
) -> HttpConnectionManager {
    let mut http_filters = Vec::with_capacity(raw.http_filters.len());
    for filter in raw.http_filters {
        match unwrap_any(&filter.name, filter.typed_config.as_ref()) {
            Ok(decoded) => http_filters.push(decoded),
            Err(note) => {
                debug!(location, filter = %filter.name, "skipping unrecognized http filter");
                notes.push(note.within(location));
            }
        }
    }
    HttpConnectionManager {
        stat_prefix: raw.stat_prefix,
        rds: raw.rds.map(|r| r.route_config_name).filter(|n| !n.is_empty()),
        route_config: raw.route_config,
        http_filters,
    }
}
