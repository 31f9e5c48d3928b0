use super::{Findings, Mapped};

const TOTAL: u32 = 100;

/// Fill in weights for destinations that have none.
///
/// When no destination has a weight the input is returned unchanged and the
/// split stays implicit. Otherwise every unweighted destination gets
/// `ceil((100 - S) / U)`, at least 1, where `S` is the explicit sum and `U`
/// the unweighted count. If rounding overshoots 100 the trailing unweighted
/// destinations give back the surplus, never dropping below 1.
pub fn distribute(weights: &[Option<u32>]) -> Mapped<Vec<Option<u32>>> {
    let mut findings = Findings::new();
    if weights.iter().all(Option::is_none) {
        return Mapped::clean(weights.to_vec());
    }

    let explicit: u32 = weights.iter().flatten().sum();
    let unweighted = weights.iter().filter(|w| w.is_none()).count() as u32;
    if explicit > TOTAL {
        findings.update_required(format!("destination weights sum to {explicit}, more than {TOTAL}"));
    }
    if unweighted == 0 {
        return Mapped::new(weights.to_vec(), findings);
    }

    let remaining = TOTAL.saturating_sub(explicit);
    let share = remaining.div_ceil(unweighted).max(1);
    let mut filled: Vec<u32> = weights.iter().map(|w| w.unwrap_or(share)).collect();

    let mut surplus = filled.iter().sum::<u32>().saturating_sub(TOTAL);
    for (slot, original) in filled.iter_mut().zip(weights).rev() {
        if surplus == 0 {
            break;
        }
        if original.is_none() {
            let give = surplus.min(slot.saturating_sub(1));
            *slot -= give;
            surplus -= give;
        }
    }
    if surplus > 0 && explicit <= TOTAL {
        findings.correction(format!(
            "{unweighted} unweighted destinations need at least weight 1, total exceeds {TOTAL}"
        ));
    }

    Mapped::new(filled.into_iter().map(Some).collect(), findings)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::distribute;

    fn total(weights: &[Option<u32>]) -> u32 {
        weights.iter().flatten().sum()
    }

    #[test]
    fn no_explicit_weights_stay_implicit() {
        let mapped = distribute(&[None, None]);
        assert_eq!(mapped.value, vec![None, None]);
        assert!(mapped.findings.is_empty());
    }

    #[test]
    fn remainder_is_split_with_ceil_rounding() {
        let mapped = distribute(&[Some(40), None, None, None]);
        assert_eq!(mapped.value, vec![Some(40), Some(20), Some(20), Some(20)]);
        assert_eq!(total(&mapped.value), 100);
    }

    #[test]
    fn rounding_surplus_comes_off_the_last_destination() {
        let mapped = distribute(&[Some(11), None, None, None]);
        assert_eq!(mapped.value, vec![Some(11), Some(30), Some(30), Some(29)]);
        assert_eq!(total(&mapped.value), 100);
        assert!(mapped.findings.is_empty());
    }

    #[test]
    fn full_explicit_weight_still_gives_minimum_one() {
        let mapped = distribute(&[Some(100), None]);
        assert_eq!(mapped.value, vec![Some(100), Some(1)]);
        assert_eq!(mapped.findings.len(), 1);
    }

    #[test]
    fn totals_hit_one_hundred_across_splits() {
        for explicit in [0u32, 1, 33, 50, 97] {
            for unweighted in 1..=3usize {
                let mut input = vec![Some(explicit)];
                input.extend(std::iter::repeat(None).take(unweighted));
                let mapped = distribute(&input);
                assert_eq!(total(&mapped.value), 100, "explicit {explicit}, unweighted {unweighted}");
            }
        }
    }
}
