//! Resource identities and deterministic synthetic names.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

/// Kinds that can appear as the origin of a diagnostic.
///
/// The first group are document kinds held in the source cache. The
/// `Wire*` kinds identify records of a decoded proxy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SourceKind {
    Upstream,
    Settings,
    Gateway,
    VirtualService,
    RouteTable,
    VirtualHostOption,
    RouteOption,
    ListenerOption,
    HttpListenerOption,
    AuthConfig,
    WireListener,
    WireRouteConfiguration,
    WireCluster,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upstream => "Upstream",
            Self::Settings => "Settings",
            Self::Gateway => "Gateway",
            Self::VirtualService => "VirtualService",
            Self::RouteTable => "RouteTable",
            Self::VirtualHostOption => "VirtualHostOption",
            Self::RouteOption => "RouteOption",
            Self::ListenerOption => "ListenerOption",
            Self::HttpListenerOption => "HTTPListenerOption",
            Self::AuthConfig => "AuthConfig",
            Self::WireListener => "Listener",
            Self::WireRouteConfiguration => "RouteConfiguration",
            Self::WireCluster => "Cluster",
        }
    }

    /// Map a document `kind` to a cache kind. Wire kinds never match.
    pub fn from_document_kind(kind: &str) -> Option<Self> {
        match kind {
            "Upstream" => Some(Self::Upstream),
            "Settings" => Some(Self::Settings),
            "Gateway" => Some(Self::Gateway),
            "VirtualService" => Some(Self::VirtualService),
            "RouteTable" => Some(Self::RouteTable),
            "VirtualHostOption" => Some(Self::VirtualHostOption),
            "RouteOption" => Some(Self::RouteOption),
            "ListenerOption" => Some(Self::ListenerOption),
            "HttpListenerOption" | "HTTPListenerOption" => Some(Self::HttpListenerOption),
            "AuthConfig" => Some(Self::AuthConfig),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(kind, namespace, name)`: unique within a kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ResourceIdentity {
    pub kind: SourceKind,
    pub namespace: String,
    pub name: String,
}

impl ResourceIdentity {
    pub fn new(kind: SourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity for a snapshot record, which has no namespace.
    pub fn wire(kind: SourceKind, name: impl Into<String>) -> Self {
        Self::new(kind, "", name)
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} {}", self.kind, self.name)
        } else {
            write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
        }
    }
}

const SUFFIX_LEN: usize = 10;
const MAX_NAME_LEN: usize = 253;

/// Name for a resource with no 1:1 source counterpart.
///
/// The suffix is the first hex characters of a SHA-256 over the owner
/// identity and the field path, so the same owner and path always produce
/// the same name.
pub fn synthetic_name(base: &str, owner: &ResourceIdentity, field_path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(owner.to_string().as_bytes());
    hasher.update(b"/");
    hasher.update(field_path.as_bytes());
    let digest = hasher.finalize();
    let suffix: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{}-{}", sanitize_name(base), &suffix[..SUFFIX_LEN])
}

/// Coerce a string into a DNS-1123 subdomain name.
///
/// Lowercases, maps `*` to `star`, replaces other invalid characters with
/// `-`, trims leading/trailing separators and truncates to 253 characters.
pub fn sanitize_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            'a'..='z' | '0'..='9' | '-' | '.' => out.push(ch),
            'A'..='Z' => out.push(ch.to_ascii_lowercase()),
            '*' => out.push_str("star"),
            _ => out.push('-'),
        }
    }
    let trimmed = out.trim_matches(|c| c == '-' || c == '.');
    let mut name: String = trimmed.chars().take(MAX_NAME_LEN).collect();
    while name.ends_with(['-', '.']) {
        name.pop();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::{sanitize_name, synthetic_name, ResourceIdentity, SourceKind};

    #[test]
    fn synthetic_names_are_stable_per_owner_and_path() {
        let owner = ResourceIdentity::new(SourceKind::VirtualService, "default", "petstore");
        let first = synthetic_name("petstore", &owner, "routes/0/options");
        let again = synthetic_name("petstore", &owner, "routes/0/options");
        let other = synthetic_name("petstore", &owner, "routes/1/options");
        assert_eq!(first, again);
        assert_ne!(first, other);
        assert!(first.starts_with("petstore-"));
        assert_eq!(first.len(), "petstore-".len() + 10);
    }

    #[test]
    fn sanitize_maps_wildcards_and_invalid_characters() {
        assert_eq!(sanitize_name("*.Example.com"), "star.example.com");
        assert_eq!(sanitize_name("gloo-system_default:80"), "gloo-system-default-80");
        assert_eq!(sanitize_name("--edge--"), "edge");
    }

    #[test]
    fn identity_display_omits_empty_namespace() {
        let wire = ResourceIdentity::wire(SourceKind::WireListener, "listener-8080");
        assert_eq!(wire.to_string(), "Listener listener-8080");
        let doc = ResourceIdentity::new(SourceKind::Upstream, "gloo-system", "petstore");
        assert_eq!(doc.to_string(), "Upstream gloo-system/petstore");
    }
}
