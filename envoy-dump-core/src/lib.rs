//! Decoder for proxy administrative configuration dumps.
//!
//! Turns the JSON emitted by a proxy's `config_dump` endpoint into typed
//! listener, route and cluster records. Embedded filter payloads are matched
//! against a fixed [`registry`] of known schemas; payloads that match nothing
//! are skipped and reported as [`DecodeNote`]s so callers can surface them.

pub mod cluster;
pub mod envelope;
pub mod error;
pub mod listener;
pub mod registry;
pub mod route;
pub mod tls;

pub use cluster::WireCluster;
pub use envelope::{decode, decode_file, DecodeNote, WireSnapshot};
pub use error::DecodeError;
pub use listener::{ChainFilter, FilterChain, HttpConnectionManager, TcpProxy, WireListener};
pub use registry::{FilterKind, TypedFilter};
pub use route::{Route, RouteConfiguration, VirtualHost};
