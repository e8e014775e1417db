//! Legacy normalization, deduplication and physical filtering.

use crate::classify::RiskRules;
use coexsim_common::{round_to, InterferenceCandidate, ProductType, RiskSymbol};
use std::collections::HashSet;
use tracing::debug;

/// Mathematical identity of a candidate.
///
/// Frequency is held in hundredths of a MHz so the key is hashable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    product_type: ProductType,
    centi_mhz: i64,
    aggressors: Vec<String>,
    victim: String,
}

impl DedupKey {
    /// Build the key for a candidate.
    pub fn of(candidate: &InterferenceCandidate) -> Self {
        let mut aggressors = candidate.aggressors.clone();
        aggressors.sort();
        DedupKey {
            product_type: candidate.product_type,
            centi_mhz: (round_to(candidate.frequency_mhz, 2) * 100.0).round() as i64,
            aggressors,
            victim: candidate.victim.clone().unwrap_or_default(),
        }
    }
}

/// Convert a legacy risk marker to the graded severity model.
///
/// A legacy warning with a victim is re-scored by the heuristic. A legacy
/// warning without a victim becomes safe. A legacy pass keeps its victim
/// with severity 1, or severity 0 when there is no victim.
pub fn normalize_legacy(candidate: &mut InterferenceCandidate, rules: &RiskRules) {
    match candidate.risk {
        RiskSymbol::LegacyWarning => {
            if candidate.has_victim() {
                let victim = candidate.victim.clone().unwrap_or_default();
                let (risk, severity) = rules.classify(
                    candidate.frequency_mhz,
                    &victim,
                    &candidate.aggressor_list(),
                    candidate.product_type,
                );
                candidate.risk = risk;
                candidate.severity = severity;
            } else {
                candidate.victim = None;
                candidate.risk = RiskSymbol::Safe;
                candidate.severity = 0;
            }
        }
        RiskSymbol::LegacyPass => {
            candidate.risk = RiskSymbol::Safe;
            candidate.severity = if candidate.has_victim() { 1 } else { 0 };
        }
        _ => {}
    }
}

/// Collapse mathematically identical candidates, keeping the first seen.
///
/// Legacy markers are normalized before the key is computed. Running this
/// twice yields the same list as running it once.
pub fn deduplicate(candidates: Vec<InterferenceCandidate>, rules: &RiskRules) -> Vec<InterferenceCandidate> {
    let before = candidates.len();
    let mut seen = HashSet::with_capacity(before);
    let mut kept = Vec::with_capacity(before);

    for mut candidate in candidates {
        normalize_legacy(&mut candidate, rules);
        if seen.insert(DedupKey::of(&candidate)) {
            kept.push(candidate);
        }
    }

    debug!(before, after = kept.len(), "deduplicated candidates");
    kept
}

/// Drop candidates whose frequency is not strictly positive.
///
/// Returns the kept candidates and the number removed.
pub fn filter_non_physical(candidates: Vec<InterferenceCandidate>) -> (Vec<InterferenceCandidate>, usize) {
    let (valid, invalid): (Vec<_>, Vec<_>) = candidates.into_iter().partition(|c| c.frequency_mhz > 0.0);
    (valid, invalid.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        product_type: ProductType,
        freq: f64,
        aggressors: &[&str],
        victim: Option<&str>,
        risk: RiskSymbol,
        severity: u8,
    ) -> InterferenceCandidate {
        InterferenceCandidate {
            product_type,
            subtype: "Fundamental-only".to_string(),
            formula: format!("{} @ {}", product_type, freq),
            frequency_mhz: freq,
            aggressors: aggressors.iter().map(|s| s.to_string()).collect(),
            victim: victim.map(str::to_string),
            risk,
            severity,
            details: String::new(),
        }
    }

    #[test]
    fn test_aggressor_order_does_not_matter() {
        let rules = RiskRules::default();
        let a = candidate(ProductType::Im3, 705.0, &["LTE_B13", "LTE_B26"], Some("LTE_B12"), RiskSymbol::High, 4);
        let mut b = candidate(ProductType::Im3, 705.001, &["LTE_B26", "LTE_B13"], Some("LTE_B12"), RiskSymbol::High, 4);
        b.subtype = "Other".to_string();

        let deduped = deduplicate(vec![a.clone(), b], &rules);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0], a);
    }

    #[test]
    fn test_distinct_victims_are_kept() {
        let rules = RiskRules::default();
        let a = candidate(ProductType::H2, 1574.0, &["LTE_B13"], Some("GNSS_L1"), RiskSymbol::Critical, 5);
        let b = candidate(ProductType::H2, 1574.0, &["LTE_B13"], None, RiskSymbol::Safe, 0);
        assert_eq!(deduplicate(vec![a, b], &rules).len(), 2);
    }

    #[test]
    fn test_deduplicate_is_idempotent() {
        let rules = RiskRules::default();
        let input = vec![
            candidate(ProductType::Im2, 100.0, &["A", "B"], None, RiskSymbol::Safe, 0),
            candidate(ProductType::Im2, 100.0, &["B", "A"], None, RiskSymbol::Safe, 0),
            candidate(ProductType::Im5, 1575.42, &["A", "B"], Some("GNSS_L1"), RiskSymbol::LegacyWarning, 0),
            candidate(ProductType::Im5, 1575.42, &["A", "B"], Some("GNSS_L1"), RiskSymbol::Critical, 5),
        ];
        let once = deduplicate(input, &rules);
        let twice = deduplicate(once.clone(), &rules);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_legacy_warning_is_rescored() {
        let rules = RiskRules::default();
        let mut c = candidate(ProductType::H2, 1574.0, &["LTE_B13"], Some("GNSS_L1"), RiskSymbol::LegacyWarning, 0);
        normalize_legacy(&mut c, &rules);
        assert_eq!(c.risk, RiskSymbol::Critical);
        assert_eq!(c.severity, 5);

        let mut orphan = candidate(ProductType::H2, 1574.0, &["LTE_B13"], None, RiskSymbol::LegacyWarning, 0);
        normalize_legacy(&mut orphan, &rules);
        assert_eq!(orphan.risk, RiskSymbol::Safe);
        assert_eq!(orphan.severity, 0);
    }

    #[test]
    fn test_legacy_pass_keeps_victim_invariant() {
        let rules = RiskRules::default();
        let mut hit = candidate(ProductType::Im3, 800.0, &["A", "B"], Some("LTE_B5"), RiskSymbol::LegacyPass, 0);
        normalize_legacy(&mut hit, &rules);
        assert_eq!((hit.risk, hit.severity), (RiskSymbol::Safe, 1));

        let mut miss = candidate(ProductType::Im3, 800.0, &["A", "B"], None, RiskSymbol::LegacyPass, 0);
        normalize_legacy(&mut miss, &rules);
        assert_eq!((miss.risk, miss.severity), (RiskSymbol::Safe, 0));
    }

    #[test]
    fn test_filter_non_physical() {
        let input = vec![
            candidate(ProductType::Im3, -12.0, &["A", "B"], None, RiskSymbol::Safe, 0),
            candidate(ProductType::Aclr, 0.0, &["A"], None, RiskSymbol::Safe, 0),
            candidate(ProductType::Im3, 12.0, &["A", "B"], None, RiskSymbol::Safe, 0),
        ];
        let (valid, removed) = filter_non_physical(input);
        assert_eq!(removed, 2);
        assert_eq!(valid.len(), 1);
        assert!(valid.iter().all(|c| c.frequency_mhz > 0.0));
    }
}
