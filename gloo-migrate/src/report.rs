use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::diagnostics::{Category, Diagnostic, Recorder};
use crate::summary::{self, MigrateSummary};

fn paint(category: Category) -> ColoredString {
    let label = category.as_str();
    match category {
        Category::UnknownReference | Category::Unsupported => label.red(),
        Category::UpdateRequired => label.yellow(),
        Category::NoReferences => label.magenta(),
        Category::ValidationCorrection => label.cyan(),
        Category::Ignored => label.dimmed(),
    }
}

/// Diagnostics grouped by source resource, then the summary line.
pub fn render_text(diagnostics: &Recorder, summary: MigrateSummary) -> String {
    let mut out = Vec::new();
    for (source, entries) in diagnostics.by_source() {
        out.push(source.to_string().bold().to_string());
        for entry in entries {
            out.push(format!("  {} {}", paint(entry.category), entry.message));
        }
    }
    out.push(summary::render(summary).cyan().to_string());
    out.join("\n")
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: MigrateSummary,
    diagnostics: &'a [Diagnostic],
}

pub fn render_json(diagnostics: &Recorder, summary: MigrateSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&JsonReport {
        summary,
        diagnostics: diagnostics.entries(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::{render_json, render_text};
    use crate::context::Translation;
    use crate::diagnostics::{Category, Recorder};
    use crate::identity::{ResourceIdentity, SourceKind};
    use crate::summary::summarize;

    fn ledger() -> Recorder {
        let vs = ResourceIdentity::new(SourceKind::VirtualService, "default", "shop");
        let us = ResourceIdentity::new(SourceKind::Upstream, "default", "cart");
        let mut recorder = Recorder::new();
        recorder.record(Category::Unsupported, &vs, "faults is not supported");
        recorder.record(Category::UnknownReference, &us, "secret default/cart-tls not found");
        recorder
    }

    #[test]
    fn text_groups_by_source_and_ends_with_summary() {
        colored::control::set_override(false);
        let diagnostics = ledger();
        let summary = summarize(2, &Translation::default());
        let text = render_text(&diagnostics, summary);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Upstream default/cart",
                "  UNKNOWN_REFERENCE secret default/cart-tls not found",
                "VirtualService default/shop",
                "  UNSUPPORTED faults is not supported",
                "migrate_summary read=2 produced=0 unknown_reference=0 unsupported=0 ignored=0 update_required=0 no_references=0 validation_correction=0",
            ]
        );
    }

    #[test]
    fn json_carries_summary_and_entries() {
        let diagnostics = ledger();
        let translation = Translation {
            diagnostics: diagnostics.clone(),
            ..Translation::default()
        };
        let rendered = render_json(&diagnostics, summarize(2, &translation)).expect("json");
        let value: Value = serde_json::from_str(&rendered).expect("parse");
        assert_eq!(value["summary"]["unsupported"], 1);
        assert_eq!(value["summary"]["read"], 2);
        assert_eq!(value["diagnostics"][1]["category"], "UnknownReference");
        assert_eq!(value["diagnostics"][0]["source"]["name"], "shop");
    }
}
