//! Request matchers: route matches, header matches in the various shapes the
//! source schema uses, and string matchers.

use crate::source::policy::{EnvoyHeaderMatcher, HeaderMatcher, StringMatcher as SourceStringMatcher};
use crate::source::virtual_service::{Matcher, QueryParameterMatcher, RouteHeaderMatcher};
use crate::target::policy::{RateLimitHeaderMatcher, StringMatcher, TransformationHeaderMatcher};
use crate::target::route::{HttpHeaderMatch, HttpPathMatch, HttpRouteMatch, PATH_EXACT, PATH_PREFIX, REGULAR_EXPRESSION};

use super::{Findings, Mapped};

const HEADER_EXACT: &str = "Exact";
/// Gateway API has no presence match; any value matches instead.
const ANY_VALUE: &str = ".*";

/// Map one route matcher. A matcher with no path condition matches every
/// path, which is what the target does when `path` is left out.
pub fn route_match(matcher: &Matcher) -> Mapped<HttpRouteMatch> {
    let mut findings = Findings::new();
    let mut out = HttpRouteMatch::default();

    out.path = if let Some(prefix) = &matcher.prefix {
        Some(HttpPathMatch::new(PATH_PREFIX, prefix.clone()))
    } else if let Some(exact) = &matcher.exact {
        Some(HttpPathMatch::new(PATH_EXACT, exact.clone()))
    } else {
        matcher
            .regex
            .as_ref()
            .map(|regex| HttpPathMatch::new(REGULAR_EXPRESSION, regex.clone()))
    };

    if matcher.case_sensitive == Some(false) {
        findings.unsupported("matcher caseSensitive false is not supported");
    }

    for header in &matcher.headers {
        if let Some(mapped) = findings.absorb(route_header(header)) {
            out.headers.push(mapped);
        }
    }
    for param in &matcher.query_parameters {
        out.query_params.push(query_param(param));
    }

    match matcher.methods.as_slice() {
        [] => {}
        [method, rest @ ..] => {
            out.method = Some(method.to_ascii_uppercase());
            if !rest.is_empty() {
                findings.unsupported(format!(
                    "matcher methods {} are not supported, only the first method is kept",
                    rest.join(", ")
                ));
            }
        }
    }

    Mapped::new(out, findings)
}

/// An inverted header match has no target equivalent and is dropped.
pub fn route_header(header: &RouteHeaderMatcher) -> Mapped<Option<HttpHeaderMatch>> {
    let mut findings = Findings::new();
    if header.invert_match {
        findings.unsupported(format!("header matcher {} invertMatch is not supported", header.name));
        return Mapped::new(None, findings);
    }
    let value = header.value.as_deref().unwrap_or_default();
    let matched = if value.is_empty() {
        header_match(REGULAR_EXPRESSION, &header.name, ANY_VALUE)
    } else if header.regex {
        header_match(REGULAR_EXPRESSION, &header.name, value)
    } else {
        header_match(HEADER_EXACT, &header.name, value)
    };
    Mapped::new(Some(matched), findings)
}

pub fn query_param(param: &QueryParameterMatcher) -> HttpHeaderMatch {
    match param.value.as_deref() {
        None | Some("") => header_match(REGULAR_EXPRESSION, &param.name, ANY_VALUE),
        Some(value) if param.regex => header_match(REGULAR_EXPRESSION, &param.name, value),
        Some(value) => header_match(HEADER_EXACT, &param.name, value),
    }
}

/// Envoy header matcher to a Gateway API header match.
///
/// Prefix and suffix become anchored regular expressions. Presence and
/// inversion cannot be expressed and yield `None`.
pub fn envoy_header(header: &EnvoyHeaderMatcher) -> Mapped<Option<HttpHeaderMatch>> {
    let mut findings = Findings::new();
    if header.invert_match {
        findings.unsupported(format!("header matcher {} invertMatch is not supported", header.name));
        return Mapped::new(None, findings);
    }
    let matched = if let Some(exact) = &header.exact_match {
        header_match(HEADER_EXACT, &header.name, exact)
    } else if let Some(regex) = header.safe_regex_match.as_ref().map(|r| &r.regex).or(header.regex_match.as_ref()) {
        header_match(REGULAR_EXPRESSION, &header.name, regex)
    } else if let Some(prefix) = &header.prefix_match {
        header_match(REGULAR_EXPRESSION, &header.name, &format!("{}.*", regex_escape(prefix)))
    } else if let Some(suffix) = &header.suffix_match {
        header_match(REGULAR_EXPRESSION, &header.name, &format!(".*{}", regex_escape(suffix)))
    } else {
        findings.unsupported(format!("header matcher {} presentMatch is not supported", header.name));
        return Mapped::new(None, findings);
    };
    Mapped::new(Some(matched), findings)
}

/// Envoy header matcher to the rate limit descriptor form, which keeps the
/// envoy field names.
pub fn rate_limit_header(header: &EnvoyHeaderMatcher) -> RateLimitHeaderMatcher {
    RateLimitHeaderMatcher {
        name: header.name.clone(),
        exact_match: header.exact_match.clone(),
        regex_match: header
            .safe_regex_match
            .as_ref()
            .map(|r| r.regex.clone())
            .or_else(|| header.regex_match.clone()),
        prefix_match: header.prefix_match.clone(),
        suffix_match: header.suffix_match.clone(),
        present_match: header.present_match,
        invert_match: header.invert_match.then_some(true),
    }
}

pub fn transformation_header(header: &HeaderMatcher) -> TransformationHeaderMatcher {
    TransformationHeaderMatcher {
        name: header.name.clone(),
        value: header.value.clone(),
        regex: header.regex,
        invert_match: header.invert_match,
    }
}

pub fn string_matcher(matcher: &SourceStringMatcher) -> StringMatcher {
    StringMatcher {
        exact: matcher.exact.clone(),
        prefix: matcher.prefix.clone(),
        suffix: matcher.suffix.clone(),
        safe_regex: matcher.safe_regex.as_ref().map(|r| r.regex.clone()),
        ignore_case: matcher.ignore_case.then_some(true),
    }
}

fn header_match(match_type: &str, name: &str, value: &str) -> HttpHeaderMatch {
    HttpHeaderMatch {
        match_type: match_type.to_string(),
        name: name.to_string(),
        value: value.to_string(),
    }
}

fn regex_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if "\\.+*?()|[]{}^$".contains(ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{envoy_header, route_match};
    use crate::diagnostics::Category;
    use crate::source::policy::EnvoyHeaderMatcher;
    use crate::source::virtual_service::{Matcher, QueryParameterMatcher, RouteHeaderMatcher};

    #[test]
    fn header_kinds_map_to_exact_regex_and_presence() {
        let matcher = Matcher {
            prefix: Some("/api".to_string()),
            headers: vec![
                RouteHeaderMatcher {
                    name: "x-env".to_string(),
                    value: Some("prod".to_string()),
                    ..RouteHeaderMatcher::default()
                },
                RouteHeaderMatcher {
                    name: "x-trace".to_string(),
                    value: Some("[0-9]+".to_string()),
                    regex: true,
                    ..RouteHeaderMatcher::default()
                },
                RouteHeaderMatcher {
                    name: "x-debug".to_string(),
                    ..RouteHeaderMatcher::default()
                },
            ],
            ..Matcher::default()
        };
        let mapped = route_match(&matcher);
        assert!(mapped.findings.is_empty());
        let headers: Vec<_> = mapped
            .value
            .headers
            .iter()
            .map(|h| (h.match_type.as_str(), h.value.as_str()))
            .collect();
        assert_eq!(
            headers,
            vec![("Exact", "prod"), ("RegularExpression", "[0-9]+"), ("RegularExpression", ".*")]
        );
        assert_eq!(mapped.value.path.map(|p| p.match_type), Some("PathPrefix".to_string()));
    }

    #[test]
    fn only_first_method_is_kept() {
        let matcher = Matcher {
            exact: Some("/login".to_string()),
            methods: vec!["post".to_string(), "PUT".to_string()],
            query_parameters: vec![QueryParameterMatcher {
                name: "v".to_string(),
                value: Some("2".to_string()),
                regex: false,
            }],
            ..Matcher::default()
        };
        let mapped = route_match(&matcher);
        assert_eq!(mapped.value.method.as_deref(), Some("POST"));
        assert_eq!(mapped.value.query_params[0].match_type, "Exact");
        assert_eq!(mapped.findings.count(Category::Unsupported), 1);
    }

    #[test]
    fn inverted_header_is_dropped_and_reported() {
        let matcher = Matcher {
            headers: vec![RouteHeaderMatcher {
                name: "x-canary".to_string(),
                value: Some("true".to_string()),
                invert_match: true,
                ..RouteHeaderMatcher::default()
            }],
            ..Matcher::default()
        };
        let mapped = route_match(&matcher);
        assert!(mapped.value.headers.is_empty());
        assert_eq!(mapped.findings.messages(), vec!["header matcher x-canary invertMatch is not supported"]);
    }

    #[test]
    fn envoy_suffix_uses_the_suffix_value() {
        let header = EnvoyHeaderMatcher {
            name: "host".to_string(),
            suffix_match: Some(".example.com".to_string()),
            ..EnvoyHeaderMatcher::default()
        };
        let mapped = envoy_header(&header).value.expect("mapped");
        assert_eq!(mapped.value, r".*\.example\.com");
    }
}
