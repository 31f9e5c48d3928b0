//! Append-only ledger of translation gaps.
//!
//! Every non-fatal problem found while translating is recorded here against
//! the source resource it came from. Entries are never edited or removed.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::identity::ResourceIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// A cross-reference that did not resolve; a placeholder was emitted.
    UnknownReference,
    /// A source feature with no target equivalent; the field was dropped.
    Unsupported,
    /// Skipped because the target already behaves this way by default.
    Ignored,
    /// Translated, but needs a manual follow-up outside the output.
    UpdateRequired,
    /// A resource that should attach to something but attaches to nothing.
    NoReferences,
    /// A value adjusted to satisfy a target schema constraint.
    ValidationCorrection,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::UnknownReference,
        Category::Unsupported,
        Category::Ignored,
        Category::UpdateRequired,
        Category::NoReferences,
        Category::ValidationCorrection,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownReference => "UNKNOWN_REFERENCE",
            Self::Unsupported => "UNSUPPORTED",
            Self::Ignored => "IGNORED",
            Self::UpdateRequired => "UPDATE_REQUIRED",
            Self::NoReferences => "NO_REFERENCES",
            Self::ValidationCorrection => "VALIDATION_CORRECTION",
        }
    }

    /// Whether entries of this category must be reviewed before the output
    /// is trusted as complete.
    pub fn needs_review(self) -> bool {
        matches!(self, Self::UnknownReference | Self::Unsupported | Self::UpdateRequired)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub category: Category,
    pub source: ResourceIdentity,
    pub message: String,
}

/// Per-category totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub unknown_reference: usize,
    pub unsupported: usize,
    pub ignored: usize,
    pub update_required: usize,
    pub no_references: usize,
    pub validation_correction: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::UnknownReference => self.unknown_reference,
            Category::Unsupported => self.unsupported,
            Category::Ignored => self.ignored,
            Category::UpdateRequired => self.update_required,
            Category::NoReferences => self.no_references,
            Category::ValidationCorrection => self.validation_correction,
        }
    }

    fn bump(&mut self, category: Category) {
        let slot = match category {
            Category::UnknownReference => &mut self.unknown_reference,
            Category::Unsupported => &mut self.unsupported,
            Category::Ignored => &mut self.ignored,
            Category::UpdateRequired => &mut self.update_required,
            Category::NoReferences => &mut self.no_references,
            Category::ValidationCorrection => &mut self.validation_correction,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Recorder {
    entries: Vec<Diagnostic>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, category: Category, source: &ResourceIdentity, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(%category, source = %source, %message, "diagnostic");
        self.entries.push(Diagnostic {
            category,
            source: source.clone(),
            message,
        });
    }

    /// Append every entry of another recorder, preserving order.
    pub fn append(&mut self, other: Recorder) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn of(&self, category: Category) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.category == category)
    }

    pub fn counts(&self) -> CategoryCounts {
        let mut counts = CategoryCounts::default();
        for entry in &self.entries {
            counts.bump(entry.category);
        }
        counts
    }

    /// Entries grouped by originating resource, in identity order.
    pub fn by_source(&self) -> BTreeMap<&ResourceIdentity, Vec<&Diagnostic>> {
        let mut grouped: BTreeMap<&ResourceIdentity, Vec<&Diagnostic>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(&entry.source).or_default().push(entry);
        }
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Recorder};
    use crate::identity::{ResourceIdentity, SourceKind};

    #[test]
    fn counts_track_each_category() {
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "default", "shop");
        let us = ResourceIdentity::new(SourceKind::Upstream, "default", "cart");
        let mut recorder = Recorder::new();
        recorder.record(Category::Unsupported, &vs, "faults is not supported");
        recorder.record(Category::Unsupported, &us, "circuitBreakers is not supported");
        recorder.record(Category::UnknownReference, &vs, "upstream default/missing not found");

        let counts = recorder.counts();
        assert_eq!(counts.unsupported, 2);
        assert_eq!(counts.unknown_reference, 1);
        assert_eq!(counts.ignored, 0);
        assert_eq!(counts.total(), 3);
        assert_eq!(recorder.of(Category::Unsupported).count(), 2);
    }

    #[test]
    fn grouping_by_source_keeps_insertion_order() {
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "default", "shop");
        let mut recorder = Recorder::new();
        recorder.record(Category::Ignored, &vs, "first");
        recorder.record(Category::Unsupported, &vs, "second");

        let grouped = recorder.by_source();
        let entries = &grouped[&vs];
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].message, "second");
    }

    #[test]
    fn append_preserves_both_ledgers() {
        let listener = ResourceIdentity::wire(SourceKind::WireListener, "listener-8080");
        let mut front = Recorder::new();
        front.record(Category::Unsupported, &listener, "unsupported filter type x");
        let mut main = Recorder::new();
        main.append(front);
        main.record(Category::Ignored, &listener, "later");
        assert_eq!(main.len(), 2);
        assert_eq!(main.entries()[0].category, Category::Unsupported);
    }
}
