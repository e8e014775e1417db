//! Presentation ordering.

use coexsim_common::{InterferenceCandidate, ProductType};
use std::cmp::Ordering;

/// Typical signal level per family, lowest number strongest.
pub const SIGNAL_PRIORITY: [(ProductType, u8); 10] = [
    (ProductType::H2, 1),
    (ProductType::Im2, 2),
    (ProductType::H3, 3),
    (ProductType::Im3, 4),
    (ProductType::H4, 5),
    (ProductType::Im4, 6),
    (ProductType::H5, 7),
    (ProductType::Im5, 8),
    (ProductType::Im7, 9),
    (ProductType::Aclr, 10),
];

/// Priority for families missing from [`SIGNAL_PRIORITY`].
pub const UNKNOWN_PRIORITY: u8 = 99;

/// Signal priority of a product family.
pub fn signal_priority(product_type: ProductType) -> u8 {
    SIGNAL_PRIORITY
        .iter()
        .find(|(t, _)| *t == product_type)
        .map(|(_, p)| *p)
        .unwrap_or(UNKNOWN_PRIORITY)
}

/// Inverted severity: 1 for severity 5 up to 5 for severity 1, 10 when safe.
pub fn severity_priority(severity: u8) -> u8 {
    if severity > 0 {
        6u8.saturating_sub(severity.min(5))
    } else {
        10
    }
}

/// Total order used for ranked output.
pub fn compare(a: &InterferenceCandidate, b: &InterferenceCandidate) -> Ordering {
    severity_priority(a.severity)
        .cmp(&severity_priority(b.severity))
        .then_with(|| signal_priority(a.product_type).cmp(&signal_priority(b.product_type)))
        .then_with(|| a.product_type.as_str().cmp(b.product_type.as_str()))
        .then_with(|| a.formula.cmp(&b.formula))
        .then_with(|| a.frequency_mhz.total_cmp(&b.frequency_mhz))
}

/// Sort candidates in place. Equal keys keep their input order.
pub fn rank_candidates(candidates: &mut [InterferenceCandidate]) {
    candidates.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;
    use coexsim_common::RiskSymbol;

    fn candidate(product_type: ProductType, severity: u8, formula: &str) -> InterferenceCandidate {
        InterferenceCandidate {
            product_type,
            subtype: String::new(),
            formula: formula.to_string(),
            frequency_mhz: 1000.0,
            aggressors: vec!["A".to_string()],
            victim: if severity > 0 { Some("V".to_string()) } else { None },
            risk: RiskSymbol::from_severity(severity),
            severity,
            details: String::new(),
        }
    }

    #[test]
    fn test_severity_five_first_and_safe_last() {
        let mut list = vec![
            candidate(ProductType::H2, 0, "a"),
            candidate(ProductType::Im7, 1, "b"),
            candidate(ProductType::Im3, 5, "c"),
            candidate(ProductType::H2, 3, "d"),
            candidate(ProductType::Im5, 5, "e"),
        ];
        rank_candidates(&mut list);

        let severities: Vec<u8> = list.iter().map(|c| c.severity).collect();
        assert_eq!(severities, vec![5, 5, 3, 1, 0]);
        // IM3 outranks IM5 at equal severity.
        assert_eq!(list[0].product_type, ProductType::Im3);
    }

    #[test]
    fn test_signal_priority_table() {
        assert!(signal_priority(ProductType::H2) < signal_priority(ProductType::Im2));
        assert!(signal_priority(ProductType::Im2) < signal_priority(ProductType::H3));
        assert!(signal_priority(ProductType::Im7) < signal_priority(ProductType::Aclr));
        assert_eq!(severity_priority(5), 1);
        assert_eq!(severity_priority(1), 5);
        assert_eq!(severity_priority(0), 10);
    }

    #[test]
    fn test_formula_breaks_ties() {
        let mut list = vec![candidate(ProductType::Im3, 4, "z"), candidate(ProductType::Im3, 4, "a")];
        rank_candidates(&mut list);
        assert_eq!(list[0].formula, "a");
    }
}
