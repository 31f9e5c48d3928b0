//! Policy blocks shared by route, virtual host and listener options.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use super::{Overflow, ResourceRef};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FractionalPercent {
    pub numerator: u32,
    /// `HUNDRED`, `TEN_THOUSAND` or `MILLION`; absent means `HUNDRED`.
    pub denominator: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuntimeFractionalPercent {
    pub default_value: FractionalPercent,
    pub runtime_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegexSpec {
    pub regex: String,
}

/// Envoy-style string matcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StringMatcher {
    pub exact: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub safe_regex: Option<RegexSpec>,
    pub ignore_case: bool,
}

/// Header matcher as used by rate limit actions and response transforms.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderMatcher {
    pub name: String,
    pub value: Option<String>,
    pub regex: bool,
    pub invert_match: bool,
}

/// Envoy-style header matcher used by access log filters and rate limit
/// actions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvoyHeaderMatcher {
    pub name: String,
    pub exact_match: Option<String>,
    pub regex_match: Option<String>,
    pub prefix_match: Option<String>,
    pub suffix_match: Option<String>,
    pub safe_regex_match: Option<RegexSpec>,
    pub present_match: Option<bool>,
    pub invert_match: bool,
}

// ---- external auth ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtAuthExtension {
    pub disable: bool,
    pub config_ref: Option<ResourceRef>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GrpcService {
    pub authority: Option<String>,
}

/// External auth server settings (global or per listener).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtAuthSettings {
    pub extauthz_server_ref: Option<ResourceRef>,
    pub grpc_service: Option<GrpcService>,
    pub request_timeout: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}

/// Rate limit server settings (global or per listener).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitServerSettings {
    pub ratelimit_server_ref: Option<ResourceRef>,
    pub grpc_service: Option<GrpcService>,
    pub request_timeout: Option<String>,
    pub deny_on_fail: bool,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtProcGrpcService {
    pub ext_proc_server_ref: Option<ResourceRef>,
    pub authority: Option<String>,
}

/// External processing server settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtProcSettings {
    pub grpc_service: Option<ExtProcGrpcService>,
    #[serde(flatten)]
    pub other: Overflow,
}

// ---- rate limiting ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitExtension {
    pub rate_limits: Vec<RateLimitActions>,
    pub include_vh_rate_limits: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitActions {
    pub actions: Vec<RateLimitAction>,
    pub set_actions: Vec<RateLimitAction>,
    pub limit: Option<Value>,
}

/// One descriptor action. Exactly one field is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RateLimitAction {
    pub source_cluster: Option<Value>,
    pub destination_cluster: Option<Value>,
    pub request_headers: Option<RequestHeadersAction>,
    pub remote_address: Option<Value>,
    pub generic_key: Option<GenericKeyAction>,
    pub header_value_match: Option<HeaderValueMatchAction>,
    pub metadata: Option<MetadataAction>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestHeadersAction {
    pub header_name: String,
    pub descriptor_key: String,
    pub skip_if_absent: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenericKeyAction {
    pub descriptor_value: String,
    pub descriptor_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderValueMatchAction {
    pub descriptor_value: String,
    pub expect_match: Option<bool>,
    pub headers: Vec<EnvoyHeaderMatcher>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataAction {
    pub descriptor_key: String,
    pub metadata_key: MetadataKey,
    pub default_value: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataKey {
    pub key: String,
    pub path: Vec<MetadataPathSegment>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetadataPathSegment {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenBucket {
    pub max_tokens: u32,
    pub tokens_per_fill: Option<u32>,
    pub fill_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalRateLimit {
    pub default_limit: Option<TokenBucket>,
    #[serde(flatten)]
    pub other: Overflow,
}

// ---- CORS / CSRF ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsPolicy {
    pub allow_origin: Vec<String>,
    pub allow_origin_regex: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    /// Seconds as an integer string, or a duration such as `"1h"`.
    pub max_age: Option<Value>,
    pub allow_credentials: Option<bool>,
    pub disable_for_route: Option<bool>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CsrfPolicy {
    pub filter_enabled: Option<RuntimeFractionalPercent>,
    pub shadow_enabled: Option<RuntimeFractionalPercent>,
    pub additional_origins: Vec<StringMatcher>,
    #[serde(flatten)]
    pub other: Overflow,
}

// ---- transformations ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformationStages {
    pub early: Option<RequestResponseTransformations>,
    pub regular: Option<RequestResponseTransformations>,
    pub post_routing: Option<RequestResponseTransformations>,
    pub inherit_transformation: bool,
    pub log_request_response_info: Option<bool>,
    pub escape_characters: Option<bool>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestResponseTransformations {
    pub request_transforms: Vec<RequestMatch>,
    pub response_transforms: Vec<ResponseMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RequestMatch {
    pub matcher: Option<TransformMatcher>,
    pub clear_route_cache: bool,
    pub request_transformation: Option<Transformation>,
    pub response_transformation: Option<Transformation>,
}

/// Route-style matcher on a request transform. Only header matches carry
/// over; path, method and query keys stay in `other`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformMatcher {
    pub headers: Vec<HeaderMatcher>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseMatch {
    pub matchers: Vec<HeaderMatcher>,
    pub response_code_details: Option<Value>,
    pub response_transformation: Option<Transformation>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Transformation {
    pub transformation_template: Option<TransformationTemplate>,
    pub header_body_transform: Option<Value>,
    pub xslt_transformation: Option<Value>,
    pub log_request_response_info: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InjaTemplate {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderToAppend {
    pub key: String,
    pub value: InjaTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Extraction {
    pub header: Option<String>,
    pub body: Option<Value>,
    pub regex: String,
    pub subgroup: u32,
    /// `EXTRACT`, `SINGLE_REPLACE` or `REPLACE_ALL`.
    pub mode: Option<String>,
    pub replacement_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DynamicMetadataValue {
    pub metadata_namespace: Option<String>,
    pub key: String,
    pub value: InjaTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpanTransformer {
    pub name: InjaTemplate,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransformationTemplate {
    pub advanced_templates: bool,
    pub extractors: BTreeMap<String, Extraction>,
    pub headers: BTreeMap<String, InjaTemplate>,
    pub headers_to_append: Vec<HeaderToAppend>,
    pub headers_to_remove: Vec<String>,
    pub body: Option<InjaTemplate>,
    pub passthrough: Option<Value>,
    pub merge_extractors_to_body: Option<Value>,
    pub merge_json_keys: Option<Value>,
    /// `ParseAsJson` (default) or `DontParse`.
    pub parse_body_behavior: Option<String>,
    pub ignore_error_on_parse: bool,
    pub dynamic_metadata_values: Vec<DynamicMetadataValue>,
    pub escape_characters: Option<bool>,
    pub span_transformer: Option<SpanTransformer>,
    #[serde(flatten)]
    pub other: Overflow,
}

// ---- JWT ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwtStaged {
    pub before_ext_auth: Option<JwtStage>,
    pub after_ext_auth: Option<JwtStage>,
}

/// One JWT stage: providers for virtual hosts, or just `disable` for routes.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwtStage {
    pub disable: bool,
    pub providers: BTreeMap<String, JwtProvider>,
    pub allow_missing_or_failed_jwt: bool,
    /// `REQUIRE_VALID`, `ALLOW_MISSING` or `ALLOW_MISSING_OR_FAILED`.
    pub validation_policy: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwtProvider {
    pub jwks: Option<Jwks>,
    pub audiences: Vec<String>,
    pub issuer: Option<String>,
    pub token_source: Option<TokenSource>,
    pub keep_token: bool,
    pub claims_to_headers: Vec<ClaimToHeader>,
    pub clock_skew_seconds: Option<u32>,
    pub attach_failed_status_to_metadata: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Jwks {
    pub remote: Option<RemoteJwks>,
    pub local: Option<LocalJwks>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteJwks {
    pub url: String,
    pub upstream_ref: Option<ResourceRef>,
    pub cache_duration: Option<String>,
    pub async_fetch: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocalJwks {
    pub key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenSource {
    pub headers: Vec<TokenHeader>,
    pub query_params: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenHeader {
    pub header: String,
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClaimToHeader {
    pub claim: String,
    pub header: String,
    pub append: bool,
}

// ---- RBAC ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RbacExtension {
    pub disable: bool,
    pub policies: BTreeMap<String, RbacPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RbacPolicy {
    pub principals: Vec<RbacPrincipal>,
    pub permissions: Option<RbacPermissions>,
    pub nested_claim_delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RbacPrincipal {
    pub jwt_principal: Option<JwtPrincipal>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JwtPrincipal {
    pub claims: BTreeMap<String, String>,
    pub provider: Option<String>,
    /// `EXACT_STRING`, `BOOLEAN` or `LIST_CONTAINS`.
    pub matcher: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RbacPermissions {
    pub path_prefix: Option<String>,
    pub methods: Vec<String>,
}

// ---- WAF ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WafSettings {
    pub disabled: bool,
    pub custom_intervention_message: Option<String>,
    pub rule_sets: Vec<WafRuleSet>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WafRuleSet {
    pub rule_str: Option<String>,
    #[serde(flatten)]
    pub other: Overflow,
}

// ---- AI ----

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiRoute {
    /// `CHAT` or `CHAT_STREAMING`.
    pub route_type: Option<String>,
    pub defaults: Vec<AiFieldDefault>,
    pub prompt_enrichment: Option<AiPromptEnrichment>,
    pub prompt_guard: Option<AiPromptGuard>,
    #[serde(flatten)]
    pub other: Overflow,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiFieldDefault {
    pub field: String,
    pub value: Value,
    #[serde(rename = "override")]
    pub override_value: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiPromptEnrichment {
    pub prepend: Vec<AiMessage>,
    pub append: Vec<AiMessage>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiPromptGuard {
    pub request: Option<AiGuardRequest>,
    pub response: Option<AiGuardResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiGuardRequest {
    pub custom_response: Option<AiCustomResponse>,
    pub regex: Option<AiRegex>,
    pub webhook: Option<AiWebhook>,
    pub moderation: Option<AiModeration>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiGuardResponse {
    pub regex: Option<AiRegex>,
    pub webhook: Option<AiWebhook>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiCustomResponse {
    pub message: String,
    pub status_code: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiRegex {
    pub matches: Vec<AiRegexMatch>,
    pub builtins: Vec<String>,
    /// `MASK` or `REJECT`.
    pub action: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiRegexMatch {
    pub pattern: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiWebhook {
    pub host: String,
    pub port: u32,
    pub forward_headers: Vec<AiForwardHeader>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiForwardHeader {
    pub key: String,
    /// `EXACT`, `PREFIX`, `SUFFIX`, `CONTAINS` or `REGEX`.
    pub match_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiModeration {
    pub openai: Option<AiOpenAiModeration>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiOpenAiModeration {
    pub model: Option<String>,
    pub auth_token: Option<AiAuthToken>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AiAuthToken {
    pub secret_ref: Option<ResourceRef>,
    pub inline: Option<String>,
}

// ---- misc ----

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BufferSettings {
    pub max_request_bytes: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BufferPerRoute {
    pub disabled: bool,
    pub buffer: Option<BufferSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LbHash {
    pub hash_policies: Vec<HashPolicy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HashPolicy {
    pub header: Option<String>,
    pub cookie: Option<CookieHash>,
    pub source_ip: bool,
    pub terminal: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CookieHash {
    pub name: String,
    pub ttl: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderManipulation {
    pub request_headers_to_add: Vec<HeaderValueOption>,
    pub request_headers_to_remove: Vec<String>,
    pub response_headers_to_add: Vec<HeaderValueOption>,
    pub response_headers_to_remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderValueOption {
    pub header: HeaderValue,
    /// Absent or true appends; false overwrites.
    pub append: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeaderValue {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryBackOff {
    pub base_interval: Option<String>,
    pub max_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    pub retry_on: String,
    pub num_retries: Option<u32>,
    pub per_try_timeout: Option<String>,
    pub retriable_status_codes: Vec<u32>,
    pub retry_back_off: Option<RetryBackOff>,
    #[serde(flatten)]
    pub other: Overflow,
}
