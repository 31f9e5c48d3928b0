use crate::source::policy::WafSettings;
use crate::target::policy::{WafPolicy, WafRule};

use super::{Findings, Mapped};

/// Inline rule strings carry over; rule sets loaded from files, directories
/// or config maps and the core rule set do not.
pub fn waf(source: &WafSettings) -> Mapped<Option<WafPolicy>> {
    let mut findings = Findings::new();
    findings.overflow("waf", &source.other);
    let mut rules = Vec::new();
    for (i, set) in source.rule_sets.iter().enumerate() {
        findings.overflow(&format!("waf.ruleSets[{i}]"), &set.other);
        if let Some(rule_str) = set.rule_str.as_ref().filter(|r| !r.is_empty()) {
            rules.push(WafRule {
                rule_str: rule_str.clone(),
            });
        }
    }
    let policy = WafPolicy {
        disabled: source.disabled.then_some(true),
        custom_message: source.custom_intervention_message.clone(),
        rules,
    };
    let empty = policy == WafPolicy::default();
    Mapped::new((!empty).then_some(policy), findings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::waf;
    use crate::source::policy::WafSettings;

    #[test]
    fn inline_rules_survive_file_sources_do_not() {
        let source: WafSettings = serde_json::from_value(json!({
            "customInterventionMessage": "blocked",
            "ruleSets": [
                {"ruleStr": "SecRuleEngine On"},
                {"files": ["/etc/waf/crs.conf"]}
            ],
            "coreRuleSet": {"customSettingsString": "x"}
        }))
        .expect("waf decodes");
        let mapped = waf(&source);
        let policy = mapped.value.expect("policy");
        assert_eq!(policy.rules.len(), 1);
        assert_eq!(policy.custom_message.as_deref(), Some("blocked"));
        assert_eq!(
            mapped.findings.messages(),
            vec!["waf.coreRuleSet is not supported", "waf.ruleSets[1].files is not supported"]
        );
    }
}
