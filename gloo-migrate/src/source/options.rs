//! Route and virtual host option containers.

use serde::Deserialize;
use serde_json::Value;

use super::policy::{
    AiRoute, BufferPerRoute, CorsPolicy, CsrfPolicy, ExtAuthExtension, HeaderManipulation, JwtStaged, LbHash,
    RateLimitExtension, RbacExtension, RetryPolicy, TransformationStages, WafSettings,
};
use super::{Overflow, TargetRef};

/// Options valid on both routes and virtual hosts. Unrecognised keys of
/// either container land in `other`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PolicyOptions {
    pub extauth: Option<ExtAuthExtension>,
    pub waf: Option<WafSettings>,
    pub cors: Option<CorsPolicy>,
    pub csrf: Option<CsrfPolicy>,
    pub ratelimit: Option<RateLimitExtension>,
    pub staged_transformations: Option<TransformationStages>,
    pub jwt_staged: Option<JwtStaged>,
    pub rbac: Option<RbacExtension>,
    pub buffer_per_route: Option<BufferPerRoute>,
    pub header_manipulation: Option<HeaderManipulation>,
    pub retries: Option<RetryPolicy>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteOptions {
    pub prefix_rewrite: Option<String>,
    pub regex_rewrite: Option<Value>,
    pub timeout: Option<String>,
    pub host_rewrite: Option<String>,
    pub auto_host_rewrite: Option<bool>,
    pub ai: Option<AiRoute>,
    pub lb_hash: Option<LbHash>,
    pub jwt_providers_staged: Option<JwtStaged>,
    #[serde(flatten)]
    pub policy: PolicyOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualHostOptions {
    pub ratelimit_early: Option<RateLimitExtension>,
    pub ratelimit_regular: Option<RateLimitExtension>,
    #[serde(flatten)]
    pub policy: PolicyOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VirtualHostOptionSpec {
    pub options: VirtualHostOptions,
    pub target_refs: Vec<TargetRef>,
    pub target_ref: Option<TargetRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteOptionSpec {
    pub options: RouteOptions,
    pub target_refs: Vec<TargetRef>,
    pub target_ref: Option<TargetRef>,
}

impl VirtualHostOptionSpec {
    pub fn all_target_refs(&self) -> impl Iterator<Item = &TargetRef> {
        self.target_refs.iter().chain(self.target_ref.iter())
    }
}

impl RouteOptionSpec {
    pub fn all_target_refs(&self) -> impl Iterator<Item = &TargetRef> {
        self.target_refs.iter().chain(self.target_ref.iter())
    }
}
