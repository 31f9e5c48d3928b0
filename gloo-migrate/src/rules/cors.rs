//! Cross-origin policies: CORS and CSRF.

use serde_json::Value;

use crate::source::policy::{CorsPolicy as SourceCors, CsrfPolicy as SourceCsrf};
use crate::target::policy::{CorsPolicy, CsrfPolicy};

use super::fraction::runtime_to_percent;
use super::matchers::string_matcher;
use super::{Findings, Mapped};

pub fn cors(source: &SourceCors) -> Mapped<Option<CorsPolicy>> {
    let mut findings = Findings::new();
    if !source.allow_origin_regex.is_empty() {
        findings.unsupported("cors allowOriginRegex is not supported");
    }
    if source.disable_for_route == Some(true) {
        findings.unsupported("cors disableForRoute is not supported");
    }
    findings.overflow("cors", &source.other);

    let max_age = match &source.max_age {
        None => None,
        Some(raw) => {
            let parsed = max_age_seconds(raw);
            if parsed.is_none() {
                findings.ignored(format!("cors maxAge {raw} is not a valid duration"));
            }
            parsed
        }
    };

    let policy = CorsPolicy {
        allow_origins: source.allow_origin.clone(),
        allow_methods: source.allow_methods.clone(),
        allow_headers: source.allow_headers.clone(),
        expose_headers: source.expose_headers.clone(),
        allow_credentials: source.allow_credentials,
        max_age,
    };
    let empty = policy == CorsPolicy::default();
    Mapped::new((!empty).then_some(policy), findings)
}

pub fn csrf(source: &SourceCsrf) -> Mapped<Option<CsrfPolicy>> {
    let mut findings = Findings::new();
    findings.overflow("csrf", &source.other);
    let policy = CsrfPolicy {
        percentage_enabled: source.filter_enabled.as_ref().map(|f| findings.absorb(runtime_to_percent(f))),
        percentage_shadowed: source.shadow_enabled.as_ref().map(|f| findings.absorb(runtime_to_percent(f))),
        additional_origins: source.additional_origins.iter().map(string_matcher).collect(),
    };
    Mapped::new(Some(policy), findings)
}

/// `maxAge` arrives either as seconds or as a duration string.
fn max_age_seconds(raw: &Value) -> Option<u32> {
    match raw {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s
            .parse::<u32>()
            .ok()
            .or_else(|| parse_duration(s).and_then(|secs| u32::try_from(secs).ok())),
        _ => None,
    }
}

/// Parse a Go-style duration (`90s`, `1h30m`, `1.5s`) into whole seconds.
pub(crate) fn parse_duration(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let mut total = 0.0_f64;
    let mut rest = raw;
    while !rest.is_empty() {
        let split = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if split == 0 {
            return None;
        }
        let value: f64 = rest[..split].parse().ok()?;
        let unit_len = rest[split..]
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len() - split);
        let unit = &rest[split..split + unit_len];
        let scale = match unit {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 0.001,
            "us" | "µs" => 0.000_001,
            "ns" => 0.000_000_001,
            _ => return None,
        };
        total += value * scale;
        rest = &rest[split + unit_len..];
    }
    Some(total.floor() as u64)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{cors, csrf, parse_duration};
    use crate::diagnostics::Category;
    use crate::source::policy::{CorsPolicy, CsrfPolicy, FractionalPercent, RuntimeFractionalPercent};

    #[test]
    fn max_age_accepts_seconds_and_durations() {
        let mut source = CorsPolicy {
            allow_origin: vec!["https://shop.example.com".to_string()],
            max_age: Some(json!("1h")),
            ..CorsPolicy::default()
        };
        assert_eq!(cors(&source).value.and_then(|c| c.max_age), Some(3600));

        source.max_age = Some(json!(600));
        assert_eq!(cors(&source).value.and_then(|c| c.max_age), Some(600));

        source.max_age = Some(json!("soon"));
        let mapped = cors(&source);
        assert_eq!(mapped.value.and_then(|c| c.max_age), None);
        assert_eq!(mapped.findings.count(Category::Ignored), 1);
    }

    #[test]
    fn regex_origins_and_route_disable_are_reported() {
        let source = CorsPolicy {
            allow_origin_regex: vec![".*\\.example\\.com".to_string()],
            disable_for_route: Some(true),
            ..CorsPolicy::default()
        };
        let mapped = cors(&source);
        assert!(mapped.value.is_none());
        assert_eq!(mapped.findings.count(Category::Unsupported), 2);
    }

    #[test]
    fn csrf_fractions_become_percentages() {
        let source = CsrfPolicy {
            filter_enabled: Some(RuntimeFractionalPercent {
                default_value: FractionalPercent {
                    numerator: 500_000,
                    denominator: Some("MILLION".to_string()),
                },
                runtime_key: None,
            }),
            ..CsrfPolicy::default()
        };
        let policy = csrf(&source).value.expect("policy");
        assert_eq!(policy.percentage_enabled, Some(50));
        assert_eq!(policy.percentage_shadowed, None);
    }

    #[test]
    fn durations_combine_units() {
        assert_eq!(parse_duration("1h30m"), Some(5400));
        assert_eq!(parse_duration("1.5s"), Some(1));
        assert_eq!(parse_duration("250ms"), Some(0));
        assert_eq!(parse_duration("10x"), None);
        assert_eq!(parse_duration("s"), None);
    }
}
