use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::policy::{ExtAuthSettings, ExtProcSettings, RateLimitServerSettings};
use super::Overflow;

/// Global settings. Only the blocks that produce output or diagnostics are
/// typed; the rest of the (large) settings surface stays in `other`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsSpec {
    pub ratelimit_server: Option<RateLimitServerSettings>,
    pub extauth: Option<ExtAuthSettings>,
    pub named_extauth: BTreeMap<String, ExtAuthSettings>,
    pub ext_proc: Option<ExtProcSettings>,
    pub upstream_options: Option<UpstreamOptions>,
    pub gloo: Option<GlooOptions>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpstreamOptions {
    pub ssl_parameters: Option<Value>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GlooOptions {
    pub aws_options: Option<AwsOptions>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AwsOptions {
    pub enable_credentials_discovey: Option<bool>,
    pub credential_discovery: Option<Value>,
    pub fallback_to_first_function: Option<bool>,
    pub propagate_original_routing: Option<bool>,
    pub service_account_credentials: Option<Value>,
}
