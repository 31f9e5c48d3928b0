use crate::source::policy::{FractionalPercent, RuntimeFractionalPercent};

use super::{Findings, Mapped};

/// Normalize a fractional percent to an integer percent.
///
/// The denominator defaults to `HUNDRED`. Unknown denominators are treated
/// as `HUNDRED` and reported; results above 100 are clamped.
pub fn to_percent(fraction: &FractionalPercent) -> Mapped<u32> {
    let mut findings = Findings::new();
    let divisor = match fraction.denominator.as_deref() {
        None | Some("") | Some("HUNDRED") => 1,
        Some("TEN_THOUSAND") => 100,
        Some("MILLION") => 10_000,
        Some(other) => {
            findings.unsupported(format!("fraction denominator {other} is not supported, using HUNDRED"));
            1
        }
    };
    let mut percent = fraction.numerator / divisor;
    if percent > 100 {
        findings.correction(format!("fraction {percent}% clamped to 100%"));
        percent = 100;
    }
    Mapped::new(percent, findings)
}

/// Same as [`to_percent`] for a runtime-keyed fraction; the runtime key
/// itself has no target equivalent.
pub fn runtime_to_percent(fraction: &RuntimeFractionalPercent) -> Mapped<u32> {
    let mut mapped = to_percent(&fraction.default_value);
    if let Some(key) = fraction.runtime_key.as_deref().filter(|k| !k.is_empty()) {
        mapped.findings.unsupported(format!("runtime key {key} is not supported"));
    }
    mapped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::to_percent;
    use crate::diagnostics::Category;
    use crate::source::policy::FractionalPercent;

    fn fraction(numerator: u32, denominator: Option<&str>) -> FractionalPercent {
        FractionalPercent {
            numerator,
            denominator: denominator.map(str::to_string),
        }
    }

    #[test]
    fn million_denominator_divides_by_ten_thousand() {
        assert_eq!(to_percent(&fraction(0, Some("MILLION"))).value, 0);
        assert_eq!(to_percent(&fraction(250_000, Some("MILLION"))).value, 25);
        assert_eq!(to_percent(&fraction(1_000_000, Some("MILLION"))).value, 100);
    }

    #[test]
    fn hundred_is_the_default_denominator() {
        assert_eq!(to_percent(&fraction(40, None)).value, 40);
        assert_eq!(to_percent(&fraction(4_000, Some("TEN_THOUSAND"))).value, 40);
    }

    #[test]
    fn overflowing_fraction_is_clamped_and_reported() {
        let mapped = to_percent(&fraction(150, None));
        assert_eq!(mapped.value, 100);
        assert_eq!(mapped.findings.count(Category::ValidationCorrection), 1);
    }
}
