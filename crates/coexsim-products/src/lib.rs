//! # coexsim-products
//!
//! Nonlinear product enumeration and heuristic scoring for multi-radio
//! coexistence analysis.
//!
//! This crate provides:
//! - Mixing terms tagged by exponent sum ([`mixing`])
//! - Exhaustive harmonic/IMD/ACLR enumeration ([`generator`])
//! - Legacy normalization and deduplication ([`canonical`])
//! - Heuristic risk scoring with tunable tables ([`classify`])
//! - Deterministic presentation order ([`ranking`])
//! - One-to-one band screening ([`pairwise`])
//! - Band selection checks ([`validate`])
//!
//! The main entry point is [`calculate_all_products`].

pub mod canonical;
pub mod classify;
pub mod generator;
pub mod mixing;
pub mod pairwise;
pub mod ranking;
pub mod validate;

pub use canonical::{deduplicate, filter_non_physical, normalize_legacy};
pub use classify::RiskRules;
pub use generator::{overlap_alerts, ProductGenerator};
pub use pairwise::{aclr_check, evaluate, hits_rx, risk_level, PairwiseRow, ProximityRisk};
pub use ranking::rank_candidates;
pub use validate::validate_band_configuration;

use coexsim_common::{Band, InterferenceCandidate};
use serde::{Deserialize, Serialize};
use tracing::info;

// ============================================================================
// Generation Options
// ============================================================================

/// Which product families to enumerate and how wide to make receive windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Symmetric guard added around every window (MHz).
    pub guard_mhz: f64,
    /// Enumerate IM2 beat terms.
    pub imd2: bool,
    /// Enumerate standard/extended IM4.
    pub imd4: bool,
    /// Enumerate standard/extended IM5.
    pub imd5: bool,
    /// Enumerate IM7.
    pub imd7: bool,
    /// ACLR proximity margin (MHz). ACLR checks are off when not positive.
    pub aclr_margin_mhz: f64,
}

impl GenerationOptions {
    /// Default guard margin (MHz).
    pub const DEFAULT_GUARD_MHZ: f64 = 0.0;
    /// Default ACLR margin (MHz).
    pub const DEFAULT_ACLR_MARGIN_MHZ: f64 = 0.0;
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            guard_mhz: Self::DEFAULT_GUARD_MHZ,
            imd2: true,
            imd4: false,
            imd5: true,
            imd7: false,
            aclr_margin_mhz: Self::DEFAULT_ACLR_MARGIN_MHZ,
        }
    }
}

// ============================================================================
// Product Set
// ============================================================================

/// Ranked candidates plus free-text alerts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductSet {
    /// Deduplicated, ranked, physically valid candidates.
    pub candidates: Vec<InterferenceCandidate>,
    /// Overlap alerts and informational notes.
    pub alerts: Vec<String>,
}

impl ProductSet {
    /// Candidates that hit a victim receiver.
    pub fn risks(&self) -> impl Iterator<Item = &InterferenceCandidate> {
        self.candidates.iter().filter(|c| c.severity > 0)
    }
}

/// Enumerate, deduplicate, rank and filter every product for a band selection.
pub fn calculate_all_products(
    bands: &[Band],
    options: &GenerationOptions,
    rules: &RiskRules,
) -> ProductSet {
    let mut alerts = overlap_alerts(bands, options.guard_mhz);

    let raw = ProductGenerator::new(bands, options, rules).generate();
    let mut candidates = deduplicate(raw, rules);
    rank_candidates(&mut candidates);

    let (candidates, invalid) = filter_non_physical(candidates);
    if invalid > 0 {
        alerts.push(format!(
            "Note: {} products with invalid frequencies (≤ 0 MHz) were filtered out",
            invalid
        ));
    }

    info!(
        bands = bands.len(),
        candidates = candidates.len(),
        filtered = invalid,
        "product generation complete"
    );
    ProductSet { candidates, alerts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coexsim_common::ProductType;

    fn band(code: &str, tx: (f64, f64), rx: (f64, f64)) -> Band {
        Band::new(code, tx, rx, "LTE")
    }

    fn demo_bands() -> Vec<Band> {
        vec![
            band("LTE_B13", (777.0, 787.0), (746.0, 756.0)),
            band("LTE_B26", (814.0, 849.0), (859.0, 894.0)),
            Band::new("BLE", (2402.0, 2480.0), (2402.0, 2480.0), "BLE"),
            Band::receive_only("GNSS_L1", (1559.0, 1606.0), "GNSS"),
        ]
    }

    #[test]
    fn test_lte_b13_second_harmonic_hits_gnss() {
        let bands = vec![
            band("LTE_B13", (777.0, 787.0), (746.0, 756.0)),
            Band::receive_only("GNSS_L1", (1559.0, 1606.0), "GNSS"),
        ];
        let options = GenerationOptions { guard_mhz: 1.0, ..GenerationOptions::default() };
        let set = calculate_all_products(&bands, &options, &RiskRules::default());

        let first = &set.candidates[0];
        assert_eq!(first.product_type, ProductType::H2);
        assert!((first.frequency_mhz - 1574.0).abs() < 1e-9);
        assert_eq!(first.victim.as_deref(), Some("GNSS_L1"));
        assert_eq!(first.severity, 5);
    }

    #[test]
    fn test_all_frequencies_positive() {
        for guard in [0.0, 1.0, 10.0, 50.0] {
            let options = GenerationOptions {
                guard_mhz: guard,
                imd4: true,
                imd7: true,
                aclr_margin_mhz: 30.0,
                ..GenerationOptions::default()
            };
            let set = calculate_all_products(&demo_bands(), &options, &RiskRules::default());
            assert!(!set.candidates.is_empty());
            assert!(set.candidates.iter().all(|c| c.frequency_mhz > 0.0));
        }
    }

    #[test]
    fn test_filtered_count_is_reported() {
        let set = calculate_all_products(&demo_bands(), &GenerationOptions::default(), &RiskRules::default());
        assert!(set
            .alerts
            .iter()
            .any(|a| a.starts_with("Note: ") && a.ends_with("were filtered out")));
    }

    #[test]
    fn test_no_receive_only_aggressor_and_unique_keys() {
        let options = GenerationOptions { imd4: true, imd7: true, aclr_margin_mhz: 50.0, ..GenerationOptions::default() };
        let set = calculate_all_products(&demo_bands(), &options, &RiskRules::default());
        assert!(set.candidates.iter().all(|c| !c.aggressors.iter().any(|a| a == "GNSS_L1")));

        let again = deduplicate(set.candidates.clone(), &RiskRules::default());
        assert_eq!(again.len(), set.candidates.len());
    }

    #[test]
    fn test_ranked_output_order() {
        let set = calculate_all_products(&demo_bands(), &GenerationOptions::default(), &RiskRules::default());
        let severities: Vec<u8> = set.candidates.iter().map(|c| c.severity).collect();
        let first_safe = severities.iter().position(|&s| s == 0).unwrap_or(severities.len());
        assert!(severities[..first_safe].windows(2).all(|w| w[0] >= w[1]));
        assert!(severities[first_safe..].iter().all(|&s| s == 0));
        assert!(set.risks().all(|c| c.has_victim()));
    }

    #[test]
    fn test_options_and_rules_from_yaml() {
        let options: GenerationOptions = serde_yaml::from_str("guard_mhz: 1.5\nimd7: true\n").unwrap();
        assert!((options.guard_mhz - 1.5).abs() < f64::EPSILON);
        assert!(options.imd7);
        assert!(options.imd5);

        let rules: RiskRules = serde_yaml::from_str("multi_aggressor_bonus: 0\nboosted_types: [\"IM5\"]\n").unwrap();
        assert_eq!(rules.multi_aggressor_bonus, 0);
        assert_eq!(rules.boosted_types, vec![ProductType::Im5]);
        assert_eq!(rules.victim_keywords, RiskRules::default().victim_keywords);
    }
}
