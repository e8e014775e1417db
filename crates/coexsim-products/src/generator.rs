//! Exhaustive product enumeration.
//!
//! Every computed frequency is tested against every selected band as a
//! potential victim and one raw candidate is emitted per victim. Receive-only
//! bands never act as aggressors and zero edges are never mixed.

use crate::classify::RiskRules;
use crate::mixing::{ordinal, MixingTerm, Sign, Tone};
use crate::pairwise::aclr_check;
use crate::GenerationOptions;
use coexsim_common::{round_to, Band, InterferenceCandidate, ProductType, RiskSymbol};
use tracing::{debug, warn};

/// Harmonic orders enumerated for every aggressor.
pub const HARMONIC_ORDERS: [u32; 4] = [2, 3, 4, 5];

// ============================================================================
// Overlap Alerts
// ============================================================================

fn windows_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    !(a.1 < b.0 || b.1 < a.0)
}

/// Pairwise TX/TX, RX/RX and TX-in-RX overlap alerts.
pub fn overlap_alerts(bands: &[Band], guard: f64) -> Vec<String> {
    let mut alerts = Vec::new();
    for (i, b1) in bands.iter().enumerate() {
        for b2 in &bands[i + 1..] {
            let (t1, t2) = (b1.guarded_tx(guard), b2.guarded_tx(guard));
            let (r1, r2) = (b1.guarded_rx(guard), b2.guarded_rx(guard));

            if b1.has_tx() && b2.has_tx() && windows_overlap(t1, t2) {
                alerts.push(format!(
                    "Tx band overlap: {} ({}-{} MHz) and {} ({}-{} MHz)",
                    b1.code, b1.tx_low, b1.tx_high, b2.code, b2.tx_low, b2.tx_high
                ));
            }
            if windows_overlap(r1, r2) {
                alerts.push(format!(
                    "Rx band overlap: {} ({}-{} MHz) and {} ({}-{} MHz)",
                    b1.code, b1.rx_low, b1.rx_high, b2.code, b2.rx_low, b2.rx_high
                ));
            }
            if b1.has_tx() && windows_overlap(t1, r2) {
                alerts.push(format!("Tx({}) overlaps Rx({})", b1.code, b2.code));
            }
            if b2.has_tx() && windows_overlap(t2, r1) {
                alerts.push(format!("Tx({}) overlaps Rx({})", b2.code, b1.code));
            }
        }
    }
    alerts
}

// ============================================================================
// Generator
// ============================================================================

/// Transmitting bands with their selection index.
fn transmitters(bands: &[Band]) -> impl Iterator<Item = (usize, &Band)> {
    bands.iter().enumerate().filter(|(_, b)| b.has_tx())
}

/// Nonzero transmit edges of a band, low first.
fn tones(band: &Band) -> Vec<Tone<'_>> {
    band.tx_edges()
        .into_iter()
        .filter(|(_, freq)| *freq != 0.0)
        .map(|(edge, freq)| Tone::new(&band.code, edge, freq))
        .collect()
}

/// Accumulates raw candidates for one band selection.
pub struct ProductGenerator<'a> {
    bands: &'a [Band],
    options: &'a GenerationOptions,
    rules: &'a RiskRules,
    candidates: Vec<InterferenceCandidate>,
}

impl<'a> ProductGenerator<'a> {
    /// Create a generator over the selected bands.
    pub fn new(bands: &'a [Band], options: &'a GenerationOptions, rules: &'a RiskRules) -> Self {
        ProductGenerator { bands, options, rules, candidates: Vec::new() }
    }

    /// Run every enabled enumeration and return the raw candidates.
    pub fn generate(mut self) -> Vec<InterferenceCandidate> {
        self.harmonics();
        if self.options.imd2 {
            self.beat_terms();
        }
        self.intermod_pairs();
        if self.options.aclr_margin_mhz > 0.0 {
            self.adjacent_channel();
        }
        debug!(count = self.candidates.len(), "generated raw candidates");
        self.candidates
    }

    /// One candidate per victim band for a product frequency.
    fn push_for_victims(
        &mut self,
        product_type: ProductType,
        subtype: &str,
        formula: String,
        frequency: f64,
        aggressors: &[&str],
        details: String,
    ) {
        let aggressor_list = aggressors.join(", ");
        let guard = self.options.guard_mhz;
        for victim in self.bands {
            let (risk, severity, victim_code) = if victim.rx_contains(frequency, guard) {
                let (risk, severity) =
                    self.rules.classify(frequency, &victim.code, &aggressor_list, product_type);
                (risk, severity, Some(victim.code.clone()))
            } else {
                (RiskSymbol::Safe, 0, None)
            };
            self.candidates.push(InterferenceCandidate {
                product_type,
                subtype: subtype.to_string(),
                formula: formula.clone(),
                frequency_mhz: round_to(frequency, 2),
                aggressors: aggressors.iter().map(|s| s.to_string()).collect(),
                victim: victim_code,
                risk,
                severity,
                details: details.clone(),
            });
        }
    }

    /// Tag a two-tone term by its exponent sum and emit it.
    fn emit_term<'t>(
        &mut self,
        term: MixingTerm,
        x: &Tone<'t>,
        y: &Tone<'t>,
        subtype: &str,
        pair: (&str, &str),
    ) {
        let Some(product_type) = term.product_type() else {
            warn!(m = term.m, n = term.n, "skipping unsupported mixing order");
            return;
        };
        let frequency = term.frequency(x.freq, y.freq);
        let details = format!(
            "{} ({}): {} = {:.1} MHz ({}={}, {}={})",
            product_type,
            subtype,
            term.arithmetic(x.freq, y.freq),
            frequency,
            tone_role(x, pair),
            x.code,
            tone_role(y, pair),
            y.code
        );
        self.push_for_victims(product_type, subtype, term.formula(x, y), frequency, &[pair.0, pair.1], details);
    }

    fn harmonics(&mut self) {
        for (_, band) in transmitters(self.bands) {
            for order in HARMONIC_ORDERS {
                let term = MixingTerm::harmonic(order);
                let Some(product_type) = term.product_type() else {
                    warn!(order, "skipping unsupported harmonic order");
                    continue;
                };
                for tone in tones(band) {
                    let frequency = term.frequency(tone.freq, 0.0);
                    let formula = format!("{}×Tx_{}({})", order, tone.edge.as_str(), band.code);
                    let details = format!(
                        "{} harmonic: {} = {:.1} MHz (Band: {})",
                        ordinal(order),
                        term.arithmetic(tone.freq, 0.0),
                        frequency,
                        band.code
                    );
                    self.push_for_victims(product_type, "Harmonic", formula, frequency, &[band.code.as_str()], details);
                }
            }
        }
    }

    fn beat_terms(&mut self) {
        let aggressors: Vec<_> = transmitters(self.bands).collect();
        for (k, (_, b1)) in aggressors.iter().enumerate() {
            for (_, b2) in &aggressors[k + 1..] {
                let pair = (b1.code.as_str(), b2.code.as_str());
                for a in tones(b1) {
                    for b in tones(b2) {
                        for sign in [Sign::Plus, Sign::Minus] {
                            let term = MixingTerm::new(1, 1, sign);
                            if term.frequency(a.freq, b.freq) > 0.0 {
                                self.emit_term(term, &a, &b, "Beat Frequency", pair);
                            }
                            if sign == Sign::Minus && term.frequency(b.freq, a.freq) > 0.0 {
                                self.emit_term(term, &b, &a, "Beat Frequency", pair);
                            }
                        }
                    }
                }
            }
        }
    }

    fn intermod_pairs(&mut self) {
        let aggressors: Vec<_> = transmitters(self.bands).collect();
        for &(i, b1) in &aggressors {
            for &(j, b2) in &aggressors {
                if i != j {
                    self.intermod_pair(b1, b2);
                }
            }
        }
    }

    /// Products of one ordered aggressor pair `(A, B)`.
    fn intermod_pair(&mut self, b1: &Band, b2: &Band) {
        let pair = (b1.code.as_str(), b2.code.as_str());
        let (a_tones, b_tones) = (tones(b1), tones(b2));

        // Leading tone from A, then leading tone from B.
        let nested: [(u32, u32, &str, &str); 3] = [
            (2, 1, "Fundamental-only", "Fundamental-only"),
            (4, 1, "2H×A ± B (Mixed Harmonic)", "2H×B ± A (Mixed Harmonic)"),
            (2, 2, "2H×A ± 2H×B (Double Harmonic)", "2H×B ± 2H×A (Double Harmonic)"),
        ];
        for (m, n, a_first, b_first) in nested {
            for a in &a_tones {
                for b in &b_tones {
                    for sign in Sign::BOTH {
                        self.emit_term(MixingTerm::new(m, n, sign), a, b, a_first, pair);
                    }
                }
            }
            for b in &b_tones {
                for a in &a_tones {
                    for sign in Sign::BOTH {
                        self.emit_term(MixingTerm::new(m, n, sign), b, a, b_first, pair);
                    }
                }
            }
        }

        if self.options.imd4 {
            for a in &a_tones {
                for b in &b_tones {
                    self.emit_term(MixingTerm::new(2, 2, Sign::Plus), a, b, "Standard (2f₁+2f₂)", pair);
                    for (c1, c2) in [(3, 1), (1, 3)] {
                        let subtype = format!("Extended ({}f₁+{}f₂)", c1, c2);
                        self.emit_term(MixingTerm::new(c1, c2, Sign::Plus), a, b, &subtype, pair);
                    }
                }
            }
        }

        if self.options.imd5 {
            for a in &a_tones {
                for b in &b_tones {
                    for sign in Sign::BOTH {
                        self.emit_term(MixingTerm::new(3, 2, sign), a, b, "Standard (3f₁±2f₂)", pair);
                    }
                    for sign in Sign::BOTH {
                        self.emit_term(MixingTerm::new(2, 3, sign), a, b, "Extended (2f₁±3f₂)", pair);
                    }
                }
            }
        }

        if self.options.imd7 {
            for a in &a_tones {
                for b in &b_tones {
                    for sign in Sign::BOTH {
                        self.emit_term(MixingTerm::new(4, 3, sign), a, b, "Standard (4f₁±3f₂)", pair);
                    }
                }
            }
        }
    }

    fn adjacent_channel(&mut self) {
        let margin = self.options.aclr_margin_mhz;
        for (i, b1) in transmitters(self.bands) {
            for (j, b2) in self.bands.iter().enumerate() {
                if i == j {
                    continue;
                }
                let gap = (b1.tx_high - b2.rx_low).abs();
                let (risk, severity, victim) = if aclr_check(b1.tx_high, b2.rx_low, margin) {
                    let (risk, severity) =
                        self.rules.classify(b2.rx_low, &b2.code, &b1.code, ProductType::Aclr);
                    (risk, severity, Some(b2.code.clone()))
                } else {
                    (RiskSymbol::Safe, 0, None)
                };
                self.candidates.push(InterferenceCandidate {
                    product_type: ProductType::Aclr,
                    subtype: "Adjacent-channel".to_string(),
                    formula: format!("{}_tx_high vs {}_rx_low", b1.code, b2.code),
                    frequency_mhz: round_to(gap, 2),
                    aggressors: vec![b1.code.clone()],
                    victim,
                    risk,
                    severity,
                    details: format!(
                        "ACLR: {} MHz vs {} MHz (gap: {:.1} MHz)",
                        b1.tx_high, b2.rx_low, gap
                    ),
                });
            }
        }
    }
}

/// `A` when the tone comes from the first band of the pair, else `B`.
fn tone_role(tone: &Tone<'_>, pair: (&str, &str)) -> &'static str {
    if tone.code == pair.0 {
        "A"
    } else {
        "B"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b13() -> Band {
        Band::new("LTE_B13", (777.0, 787.0), (746.0, 756.0), "LTE")
    }

    fn b26() -> Band {
        Band::new("LTE_B26", (814.0, 849.0), (859.0, 894.0), "LTE")
    }

    fn gnss() -> Band {
        Band::receive_only("GNSS_L1", (1559.0, 1606.0), "GNSS")
    }

    fn run(bands: &[Band], options: &GenerationOptions) -> Vec<InterferenceCandidate> {
        let rules = RiskRules::default();
        ProductGenerator::new(bands, options, &rules).generate()
    }

    #[test]
    fn test_harmonic_lands_in_gnss() {
        let bands = vec![b13(), gnss()];
        let options = GenerationOptions { guard_mhz: 1.0, ..GenerationOptions::default() };
        let raw = run(&bands, &options);

        let hit = raw
            .iter()
            .find(|c| c.product_type == ProductType::H2 && c.victim.as_deref() == Some("GNSS_L1"))
            .expect("2H into GNSS_L1");
        assert!((hit.frequency_mhz - 1574.0).abs() < 1e-9);
        assert_eq!(hit.severity, 5);
        assert_eq!(hit.formula, "2×Tx_high(LTE_B13)");
        assert_eq!(hit.details, "2nd harmonic: 2×787 = 1574.0 MHz (Band: LTE_B13)");
    }

    #[test]
    fn test_one_candidate_per_victim() {
        let bands = vec![b13(), gnss()];
        let raw = run(&bands, &GenerationOptions::default());
        // 4 orders x 2 edges x 2 victims, no pairs since GNSS cannot transmit.
        assert_eq!(raw.len(), 16);
        assert!(raw.iter().all(|c| c.aggressors == vec!["LTE_B13".to_string()]));
    }

    #[test]
    fn test_receive_only_never_aggresses() {
        let bands = vec![b13(), gnss(), b26()];
        let options = GenerationOptions {
            imd4: true,
            imd7: true,
            aclr_margin_mhz: 100.0,
            ..GenerationOptions::default()
        };
        let raw = run(&bands, &options);
        assert!(!raw.is_empty());
        assert!(raw.iter().all(|c| !c.aggressors.iter().any(|a| a == "GNSS_L1")));
        assert!(raw.iter().any(|c| c.victim.as_deref() == Some("GNSS_L1")));
    }

    #[test]
    fn test_mixed_harmonic_products_are_tagged_by_order() {
        let bands = vec![b13(), b26()];
        let raw = run(&bands, &GenerationOptions::default());

        let mixed: Vec<_> = raw.iter().filter(|c| c.subtype.contains("Mixed Harmonic")).collect();
        assert!(!mixed.is_empty());
        assert!(mixed.iter().all(|c| c.product_type == ProductType::Im5));

        let double: Vec<_> = raw.iter().filter(|c| c.subtype.contains("Double Harmonic")).collect();
        assert!(!double.is_empty());
        assert!(double.iter().all(|c| c.product_type == ProductType::Im4));
    }

    #[test]
    fn test_imd3_formula_and_details() {
        let bands = vec![b13(), b26()];
        let raw = run(&bands, &GenerationOptions::default());
        let c = raw
            .iter()
            .find(|c| c.formula == "2×LTE_B13_low - LTE_B26_high")
            .expect("2A - B");
        assert_eq!(c.product_type, ProductType::Im3);
        assert!((c.frequency_mhz - 705.0).abs() < 1e-9);
        assert_eq!(
            c.details,
            "IM3 (Fundamental-only): 2×777 - 849 = 705.0 MHz (A=LTE_B13, B=LTE_B26)"
        );
        assert_eq!(c.aggressors, vec!["LTE_B13".to_string(), "LTE_B26".to_string()]);
    }

    #[test]
    fn test_beat_terms_only_positive() {
        let bands = vec![b13(), b26()];
        let raw = run(&bands, &GenerationOptions::default());
        let beats: Vec<_> = raw.iter().filter(|c| c.product_type == ProductType::Im2).collect();
        assert!(!beats.is_empty());
        assert!(beats.iter().all(|c| c.frequency_mhz > 0.0));
        assert!(beats.iter().any(|c| c.formula == "LTE_B26_high - LTE_B13_low"));

        let no_beats = run(&bands, &GenerationOptions { imd2: false, ..GenerationOptions::default() });
        assert!(no_beats.iter().all(|c| c.product_type != ProductType::Im2));
    }

    #[test]
    fn test_optional_orders_follow_flags() {
        let bands = vec![b13(), b26()];
        let defaults = run(&bands, &GenerationOptions::default());
        assert!(defaults.iter().all(|c| c.product_type != ProductType::Im7));
        assert!(defaults.iter().all(|c| !c.subtype.starts_with("Standard (2f")));
        assert!(defaults.iter().any(|c| c.subtype == "Standard (3f₁±2f₂)"));

        let all = run(
            &bands,
            &GenerationOptions { imd4: true, imd7: true, ..GenerationOptions::default() },
        );
        assert!(all.iter().any(|c| c.product_type == ProductType::Im7));
        assert!(all.iter().any(|c| c.subtype == "Extended (3f₁+1f₂)"));
        assert!(all.iter().any(|c| c.formula == "3×LTE_B13_low + LTE_B26_low"));
    }

    #[test]
    fn test_adjacent_channel_reports_gap() {
        let tx = Band::new("TX_A", (800.0, 824.0), (700.0, 710.0), "LTE");
        let rx = Band::new("RX_B", (900.0, 910.0), (826.0, 850.0), "LTE");
        let bands = vec![tx, rx];
        let options = GenerationOptions { aclr_margin_mhz: 5.0, ..GenerationOptions::default() };
        let raw = run(&bands, &options);

        let aclr: Vec<_> = raw.iter().filter(|c| c.product_type == ProductType::Aclr).collect();
        assert_eq!(aclr.len(), 2);
        let hit = aclr.iter().find(|c| c.formula == "TX_A_tx_high vs RX_B_rx_low").expect("ACLR hit");
        assert!((hit.frequency_mhz - 2.0).abs() < 1e-9);
        assert_eq!(hit.victim.as_deref(), Some("RX_B"));
        assert!(hit.severity >= 1);
        assert_eq!(hit.details, "ACLR: 824 MHz vs 826 MHz (gap: 2.0 MHz)");
    }

    #[test]
    fn test_overlap_alerts() {
        let a = Band::new("A", (700.0, 750.0), (800.0, 850.0), "LTE");
        let b = Band::new("B", (740.0, 760.0), (845.0, 870.0), "LTE");
        let alerts = overlap_alerts(&[a, b, gnss()], 0.0);
        assert!(alerts.contains(&"Tx band overlap: A (700-750 MHz) and B (740-760 MHz)".to_string()));
        assert!(alerts.contains(&"Rx band overlap: A (800-850 MHz) and B (845-870 MHz)".to_string()));
        assert!(!alerts.iter().any(|a| a.contains("Tx(GNSS_L1)")));
    }
}
