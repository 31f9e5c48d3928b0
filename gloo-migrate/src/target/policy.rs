//! Attachable policy resources: TrafficPolicy, HTTPListenerPolicy and
//! GatewayExtension.

use std::collections::BTreeMap;

use serde::Serialize;

use super::route::HttpHeaderMatch;
use super::{BackendObjectReference, LocalRef, NamespacedRef, PolicyTargetRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

// ---- TrafficPolicy ----

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficPolicySpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_refs: Vec<PolicyTargetRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<StagedTransformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_auth: Option<ExtAuthPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<RateLimitPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csrf: Option<CsrfPolicy>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub hash_policies: Vec<HashPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_host_rewrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<Buffer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waf: Option<WafPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<StagedJwt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rbac: Option<RbacPolicy>,
}

impl TrafficPolicySpec {
    /// True when no policy field is set. Target refs do not count.
    pub fn is_empty(&self) -> bool {
        self.ai.is_none()
            && self.transformation.is_none()
            && self.ext_auth.is_none()
            && self.rate_limit.is_none()
            && self.cors.is_none()
            && self.csrf.is_none()
            && self.hash_policies.is_empty()
            && self.auto_host_rewrite.is_none()
            && self.buffer.is_none()
            && self.waf.is_none()
            && self.jwt.is_none()
            && self.rbac.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtAuthPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_ref: Option<LocalRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_config_ref: Option<NamespacedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<Empty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<GlobalRateLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalRateLimit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRateLimit {
    pub extension_ref: LocalRef,
    pub rate_limits: Vec<RateLimitActions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitActions {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<RateLimitAction>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub set_actions: Vec<RateLimitAction>,
}

/// One descriptor action; exactly one field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitAction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_cluster: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_cluster: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<RequestHeadersAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_address: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generic_key: Option<GenericKeyAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_value_match: Option<HeaderValueMatchAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataAction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestHeadersAction {
    pub header_name: String,
    pub descriptor_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_if_absent: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericKeyAction {
    pub descriptor_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderValueMatchAction {
    pub descriptor_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expect_match: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<RateLimitHeaderMatcher>,
}

/// Envoy-style header matcher; only the fields set on the source are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitHeaderMatcher {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix_match: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub present_match: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invert_match: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataAction {
    pub descriptor_key: String,
    pub metadata_key: MetadataKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataKey {
    pub key: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRateLimit {
    pub token_bucket: TokenBucket,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBucket {
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_per_fill: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsPolicy {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_origins: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_methods: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow_headers: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expose_headers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_credentials: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsrfPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_enabled: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage_shadowed: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_origins: Vec<StringMatcher>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StringMatcher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_regex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<CookieHash>,
    #[serde(rename = "sourceIP", skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<Empty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderHash {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieHash {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Buffer {
    /// Byte count as a resource quantity string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_request_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<Empty>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WafPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<WafRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WafRule {
    pub rule_str: String,
}

// ---- transformations ----

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedTransformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub early: Option<RequestResponseTransformations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regular: Option<RequestResponseTransformations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_routing: Option<RequestResponseTransformations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_request_response_info: Option<bool>,
    /// `Escape` or `DontEscape`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_characters: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponseTransformations {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub requests: Vec<RequestMatcher>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<ResponseMatcher>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMatcher {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<TransformationRequestMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRequestMatcher {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<TransformationHeaderMatcher>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMatcher {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<TransformationHeaderMatcher>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code_details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transformation: Option<Transformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationHeaderMatcher {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub regex: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub invert_match: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transformation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<TransformationTemplate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_templates: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extractors: BTreeMap<String, Extraction>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers_to_append: Vec<HeaderToAppend>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers_to_remove: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_transformation: Option<BodyTransformation>,
    /// `ParseAsJson` or `DontParse`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_body_behavior: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_error_on_parse: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dynamic_metadata_values: Vec<DynamicMetadataValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_characters: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_transformer: Option<SpanTransformer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<bool>,
    pub regex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subgroup: Option<u32>,
    /// `Extract`, `SingleReplace` or `ReplaceAll`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderToAppend {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyTransformation {
    /// `Body`, `Passthrough`, `MergeExtractorsToBody` or `MergeJsonKeys`.
    #[serde(rename = "type")]
    pub body_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicMetadataValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_namespace: Option<String>,
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanTransformer {
    pub name: String,
}

// ---- JWT ----

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedJwt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_ext_auth: Option<JwtPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_ext_auth: Option<JwtPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtPolicy {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub providers: BTreeMap<String, JwtProvider>,
    /// `RequireValid`, `AllowMissing` or `AllowMissingOrFailed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_policy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks: Option<Jwks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_source: Option<TokenSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_token: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub claims_to_headers: Vec<ClaimToHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_skew_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_failed_status_to_metadata: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Jwks {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<LocalJwks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteJwks>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalJwks {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteJwks {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_ref: Option<BackendObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub async_fetch: Option<JwksAsyncFetch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwksAsyncFetch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fast_listener: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSource {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<TokenHeader>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query_params: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenHeader {
    pub header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimToHeader {
    pub claim: String,
    pub header: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub append: Option<bool>,
}

// ---- RBAC ----

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacPolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub policies: BTreeMap<String, RbacRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacRule {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub principals: Vec<RbacPrincipal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<RbacPermissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nested_claim_delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacPrincipal {
    pub jwt_principal: JwtPrincipal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtPrincipal {
    pub claims: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// `ExactString`, `Boolean` or `ListContains`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RbacPermissions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<String>,
}

// ---- AI ----

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiPolicy {
    /// `CHAT` or `CHAT_STREAMING`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_type: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub defaults: Vec<FieldDefault>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_enrichment: Option<PromptEnrichment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_guard: Option<PromptGuard>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefault {
    pub field: String,
    /// JSON-encoded default value.
    pub value: String,
    #[serde(rename = "override", skip_serializing_if = "Option::is_none")]
    pub override_value: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptEnrichment {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prepend: Vec<Message>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub append: Vec<Message>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptGuard {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<PromptGuardRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<PromptGuardResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptGuardRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_response: Option<CustomResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<PromptRegex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Webhook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation: Option<Moderation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptGuardResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<PromptRegex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook: Option<Webhook>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRegex {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub matches: Vec<RegexMatch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub builtins: Vec<String>,
    /// `MASK` or `REJECT`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegexMatch {
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub host: WebhookHost,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forward_headers: Vec<HttpHeaderMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookHost {
    pub host: String,
    pub port: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Moderation {
    #[serde(rename = "openAIModeration")]
    pub openai: OpenAiModeration,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiModeration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<SingleAuthToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleAuthToken {
    /// `Inline` or `SecretRef`.
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<LocalRef>,
}

// ---- HTTPListenerPolicy ----

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpListenerPolicySpec {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_refs: Vec<PolicyTargetRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub access_log: Vec<AccessLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracing: Option<Tracing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_config: Option<UpgradeConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_remote_address: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xff_num_trusted_hops: Option<u32>,
    /// `Overwrite`, `AppendIfAbsent` or `PassThrough`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_header_transformation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_idle_timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check: Option<ListenerHealthCheck>,
}

impl HttpListenerPolicySpec {
    pub fn is_empty(&self) -> bool {
        self.access_log.is_empty()
            && self.tracing.is_none()
            && self.upgrade_config.is_none()
            && self.use_remote_address.is_none()
            && self.xff_num_trusted_hops.is_none()
            && self.server_header_transformation.is_none()
            && self.stream_idle_timeout.is_none()
            && self.health_check.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeConfig {
    pub enabled_upgrades: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerHealthCheck {
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_sink: Option<FileSink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_service: Option<AccessLogGrpcService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<AccessLogFilter>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSink {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_format: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogGrpcService {
    pub log_name: String,
    pub backend_ref: BackendObjectReference,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_request_headers_to_log: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_response_headers_to_log: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_response_trailers_to_log: Vec<String>,
}

/// Either a single filter or a boolean combination of filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogFilter {
    #[serde(flatten)]
    pub single: Option<FilterType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub and_filter: Vec<FilterType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub or_filter: Vec<FilterType>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code_filter: Option<ComparisonFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_filter: Option<ComparisonFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_health_check_filter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceable_filter: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_filter: Option<HeaderFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_flag_filter: Option<ResponseFlagFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_status_filter: Option<GrpcStatusFilter>,
}

impl FilterType {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonFilter {
    /// `EQ`, `GE` or `LE`.
    pub op: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderFilter {
    pub header: HttpHeaderMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseFlagFilter {
    pub flags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcStatusFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub statuses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracing {
    pub provider: TracingProvider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_sampling: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub random_sampling: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_sampling: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<CustomAttribute>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spawn_upstream_span: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TracingProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_telemetry: Option<OpenTelemetryProvider>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenTelemetryProvider {
    pub grpc_service: GrpcService,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomAttribute {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal: Option<AttributeLiteral>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<AttributeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_header: Option<AttributeSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AttributeMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeLiteral {
    pub value: String,
}

/// Environment variable or request header source for a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSource {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    /// `Request`, `Route`, `Cluster` or `Host`.
    pub kind: String,
    pub metadata_key: AttributeMetadataKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadataKey {
    pub key: String,
}

// ---- GatewayExtension ----

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayExtensionSpec {
    /// `ExtAuth`, `RateLimit` or `ExtProc`.
    #[serde(rename = "type")]
    pub extension_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_auth: Option<ExtensionProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limit: Option<ExtensionProvider>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ext_proc: Option<ExtensionProvider>,
}

impl GatewayExtensionSpec {
    pub const EXT_AUTH: &'static str = "ExtAuth";
    pub const RATE_LIMIT: &'static str = "RateLimit";
    pub const EXT_PROC: &'static str = "ExtProc";

    pub fn new(extension_type: &str, provider: ExtensionProvider) -> Self {
        let mut spec = Self {
            extension_type: extension_type.to_string(),
            ..Self::default()
        };
        match extension_type {
            Self::RATE_LIMIT => spec.rate_limit = Some(provider),
            Self::EXT_PROC => spec.ext_proc = Some(provider),
            _ => spec.ext_auth = Some(provider),
        }
        spec
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionProvider {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grpc_service: Option<GrpcService>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrpcService {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend_ref: Option<BackendObjectReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
}
