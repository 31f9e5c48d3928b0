use serde::Serialize;

use crate::context::Translation;
use crate::diagnostics::CategoryCounts;

/// Aggregate counts for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrateSummary {
    /// Source resources (or snapshot records) the run started from.
    pub read: usize,
    /// Target resources emitted.
    pub produced: usize,
    #[serde(flatten)]
    pub diagnostics: CategoryCounts,
}

pub fn summarize(read: usize, translation: &Translation) -> MigrateSummary {
    MigrateSummary {
        read,
        produced: translation.target.len(),
        diagnostics: translation.diagnostics.counts(),
    }
}

impl MigrateSummary {
    /// Entries a reviewer has to resolve before the output is complete.
    pub fn blocking(&self) -> usize {
        self.diagnostics.unsupported + self.diagnostics.unknown_reference
    }
}

pub fn render(summary: MigrateSummary) -> String {
    let d = summary.diagnostics;
    format!(
        "migrate_summary read={} produced={} unknown_reference={} unsupported={} ignored={} update_required={} no_references={} validation_correction={}",
        summary.read,
        summary.produced,
        d.unknown_reference,
        d.unsupported,
        d.ignored,
        d.update_required,
        d.no_references,
        d.validation_correction
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{render, summarize};
    use crate::context::Translation;
    use crate::diagnostics::{Category, Recorder};
    use crate::identity::{ResourceIdentity, SourceKind};

    #[test]
    fn render_lists_every_category() {
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "default", "shop");
        let mut diagnostics = Recorder::new();
        diagnostics.record(Category::Unsupported, &vs, "faults is not supported");
        diagnostics.record(Category::Ignored, &vs, "httpConnectionManagerSettings.useRemoteAddress");
        let translation = Translation {
            diagnostics,
            ..Translation::default()
        };

        let summary = summarize(3, &translation);
        assert_eq!(summary.blocking(), 1);
        assert_eq!(
            render(summary),
            "migrate_summary read=3 produced=0 unknown_reference=0 unsupported=1 ignored=1 update_required=0 no_references=0 validation_correction=0"
        );
    }
}
