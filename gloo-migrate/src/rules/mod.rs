//! Field mapping rules.
//!
//! Each rule maps one source block to its target shape and returns the value
//! together with the findings it produced. Rules never fail: a field that
//! cannot be mapped is left out of the value and named in a finding, and the
//! remaining fields are still mapped.

pub mod access_log;
pub mod ai;
pub mod cors;
pub mod fraction;
pub mod jwt;
pub mod matchers;
pub mod rate_limit;
pub mod rbac;
pub mod retry;
pub mod tls;
pub mod trace;
pub mod transformation;
pub mod waf;
pub mod weights;

use crate::diagnostics::Category;
use crate::source::{is_unset, Overflow, ResourceRef};
use crate::target::BackendObjectReference;

/// A diagnostic not yet bound to a source resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub category: Category,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings(Vec<Finding>);

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: Category, message: impl Into<String>) {
        self.0.push(Finding {
            category,
            message: message.into(),
        });
    }

    pub fn unsupported(&mut self, message: impl Into<String>) {
        self.push(Category::Unsupported, message);
    }

    pub fn unknown_reference(&mut self, message: impl Into<String>) {
        self.push(Category::UnknownReference, message);
    }

    pub fn ignored(&mut self, message: impl Into<String>) {
        self.push(Category::Ignored, message);
    }

    pub fn update_required(&mut self, message: impl Into<String>) {
        self.push(Category::UpdateRequired, message);
    }

    pub fn correction(&mut self, message: impl Into<String>) {
        self.push(Category::ValidationCorrection, message);
    }

    /// One `Unsupported` finding per overflow key that carries a value.
    pub fn overflow(&mut self, path: &str, other: &Overflow) {
        for (key, value) in other {
            if !is_unset(value) {
                self.unsupported(format!("{path}.{key} is not supported"));
            }
        }
    }

    /// Take the value of a nested rule, keeping its findings.
    pub fn absorb<T>(&mut self, mapped: Mapped<T>) -> T {
        self.0.extend(mapped.findings.0);
        mapped.value
    }

    pub fn extend(&mut self, other: Findings) {
        self.0.extend(other.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn count(&self, category: Category) -> usize {
        self.0.iter().filter(|f| f.category == category).count()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|f| f.message.as_str()).collect()
    }
}

impl IntoIterator for Findings {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Output of a rule: the mapped value plus what could not be mapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapped<T> {
    pub value: T,
    pub findings: Findings,
}

impl<T> Mapped<T> {
    pub fn new(value: T, findings: Findings) -> Self {
        Self { value, findings }
    }

    pub fn clean(value: T) -> Self {
        Self::new(value, Findings::new())
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Mapped<U> {
        Mapped {
            value: f(self.value),
            findings: self.findings,
        }
    }
}

/// Turns an upstream reference into the backend object a policy points at.
///
/// Implementations record an unresolved reference as a finding and still
/// return a reference carrying the literal name.
pub trait BackendLookup {
    fn backend_ref(&self, upstream: &ResourceRef, from_namespace: &str) -> Mapped<BackendObjectReference>;
}

/// Convert `SCREAMING_SNAKE` enum names into `PascalCase`.
pub(crate) fn pascal_case(raw: &str) -> String {
    raw.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Lookup that treats every upstream as an existing Backend of the same name.
#[cfg(test)]
pub(crate) struct SameNameBackends;

#[cfg(test)]
impl BackendLookup for SameNameBackends {
    fn backend_ref(&self, upstream: &ResourceRef, from_namespace: &str) -> Mapped<BackendObjectReference> {
        let namespace = upstream.namespace_or(from_namespace).to_string();
        Mapped::clean(BackendObjectReference::backend(upstream.name.clone(), Some(namespace)))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{pascal_case, Findings, Mapped};
    use crate::diagnostics::Category;
    use crate::source::Overflow;

    #[test]
    fn overflow_reports_only_set_keys() {
        let mut other = Overflow::new();
        other.insert("faults".to_string(), json!({"abort": {"httpStatus": 503}}));
        other.insert("tracing".to_string(), json!({}));
        other.insert("hostRewriteHeader".to_string(), json!(""));

        let mut findings = Findings::new();
        findings.overflow("routeOptions", &other);
        assert_eq!(findings.messages(), vec!["routeOptions.faults is not supported"]);
    }

    #[test]
    fn absorb_keeps_nested_findings() {
        let mut inner = Findings::new();
        inner.ignored("already the default");
        let mut outer = Findings::new();
        let value = outer.absorb(Mapped::new(7, inner));
        assert_eq!(value, 7);
        assert_eq!(outer.count(Category::Ignored), 1);
    }

    #[test]
    fn pascal_case_handles_enum_names() {
        assert_eq!(pascal_case("REQUIRE_VALID"), "RequireValid");
        assert_eq!(pascal_case("ALLOW_MISSING_OR_FAILED"), "AllowMissingOrFailed");
        assert_eq!(pascal_case("CHAT"), "Chat");
    }
}
