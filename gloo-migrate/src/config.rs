use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Knobs for one migration run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrateConfig {
    /// `gatewayClassName` of every generated Gateway.
    pub gateway_class_name: String,
    /// Proxy name used when a source Gateway lists none.
    pub default_proxy_name: String,
    /// Put virtual service listeners in ListenerSets instead of on the Gateway.
    pub use_listener_sets: bool,
    /// GatewayExtension name referenced by external auth policies.
    pub ext_auth_extension: String,
    /// GatewayExtension name referenced by global rate limit policies.
    pub rate_limit_extension: String,
    pub ext_auth_port: u16,
    pub rate_limit_port: u16,
    pub ext_proc_port: u16,
    pub decompile: DecompileConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecompileConfig {
    /// Namespace for every resource recovered from a snapshot.
    pub namespace: String,
    pub gateway_class_name: String,
}

const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml"));

/// Load a config file, replacing the built-in defaults entirely.
///
/// # Errors
///
/// Returns [`ConfigLoadError::Io`] if the file cannot be read and
/// [`ConfigLoadError::Parse`] if it is not valid TOML for [`MigrateConfig`].
pub fn load_config(path: &Path) -> Result<MigrateConfig, ConfigLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
        path: path.display().to_string(),
        source,
    })
}

impl Default for MigrateConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|_| fallback_config())
    }
}

fn fallback_config() -> MigrateConfig {
    MigrateConfig {
        gateway_class_name: "gloo-gateway-v2".to_string(),
        default_proxy_name: "gateway-proxy".to_string(),
        use_listener_sets: false,
        ext_auth_extension: "global-extauth-settings".to_string(),
        rate_limit_extension: "global-rate-limit-settings".to_string(),
        ext_auth_port: 8083,
        rate_limit_port: 18081,
        ext_proc_port: 4444,
        decompile: DecompileConfig {
            namespace: "gloo-system".to_string(),
            gateway_class_name: "gloo-gateway".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{fallback_config, load_config, ConfigLoadError, MigrateConfig, DEFAULT_CONFIG};

    #[test]
    fn embedded_defaults_parse_and_match_fallback() {
        let parsed: MigrateConfig = toml::from_str(DEFAULT_CONFIG).expect("embedded config parses");
        assert_eq!(parsed, fallback_config());
        assert_eq!(MigrateConfig::default().gateway_class_name, "gloo-gateway-v2");
    }

    #[test]
    fn load_config_reads_user_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("migrate.toml");
        let custom = DEFAULT_CONFIG.replace("use_listener_sets = false", "use_listener_sets = true");
        fs::write(&path, custom).expect("write config");

        let config = load_config(&path).expect("config loads");
        assert!(config.use_listener_sets);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("migrate.toml");
        fs::write(&path, format!("{DEFAULT_CONFIG}\nsurprise = 1\n")).expect("write config");

        let err = load_config(&path).expect_err("unknown key");
        match err {
            ConfigLoadError::Parse { .. } => {}
            other => panic!("unexpected error variant: {other}"),
        }
    }
}
