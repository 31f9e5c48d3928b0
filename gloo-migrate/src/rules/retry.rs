use std::collections::BTreeSet;

use super::{Findings, Mapped};

/// `retryOn` tokens that expand to explicit status codes.
const CODE_TOKENS: &[(&str, &[u32])] = &[
    ("gateway-error", &[502, 503, 504]),
    ("5xx", &[500, 501, 502, 503, 504]),
    ("retriable-4xx", &[409]),
];

/// Tokens the target retries on without being asked.
const DEFAULT_TOKENS: &[&str] = &["connect-failure", "refused-stream", "reset", "retriable-status-codes"];

/// Split a comma-separated `retryOn` value into status codes.
///
/// Codes from the explicit list are merged with the expanded tokens and the
/// result is sorted. Tokens with neither a code equivalent nor a target
/// default are reported together in one finding.
pub fn retry_codes(retry_on: &str, explicit: &[u32]) -> Mapped<Vec<u32>> {
    let mut codes: BTreeSet<u32> = explicit.iter().copied().collect();
    let mut leftover = Vec::new();
    for token in retry_on.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if let Some((_, expansion)) = CODE_TOKENS.iter().find(|(name, _)| *name == token) {
            codes.extend(expansion.iter().copied());
        } else if !DEFAULT_TOKENS.contains(&token) {
            leftover.push(token);
        }
    }

    let mut findings = Findings::new();
    if !leftover.is_empty() {
        findings.unsupported(format!("retryOn {} is not supported", leftover.join(", ")));
    }
    Mapped::new(codes.into_iter().collect(), findings)
}
