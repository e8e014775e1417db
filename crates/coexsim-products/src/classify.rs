//! Heuristic risk classification.
//!
//! Used when no quantitative system configuration is available. The rule
//! tables live in [`RiskRules`] so they can be tuned from configuration;
//! the defaults reproduce the calibrated heuristic. Rules are applied in a
//! fixed order and every step clamps to `1..=5`, so the order matters.

use coexsim_common::{ProductType, RiskSymbol};
use serde::{Deserialize, Serialize};

/// Highest heuristic severity.
pub const MAX_SEVERITY: u8 = 5;

/// Victim technology keyword and the severity it implies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    /// Case-insensitive substring matched against the victim code.
    pub pattern: String,
    /// Severity floor when matched.
    pub severity: u8,
}

/// Named frequency range with an associated severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalBandRule {
    /// Range name. Names containing `GNSS` force severity 5 for GNSS victims.
    pub name: String,
    /// Inclusive lower bound (MHz).
    pub low_mhz: f64,
    /// Inclusive upper bound (MHz).
    pub high_mhz: f64,
    /// Severity floor when the frequency falls inside.
    pub severity: u8,
}

impl CriticalBandRule {
    fn contains(&self, freq: f64) -> bool {
        self.low_mhz <= freq && freq <= self.high_mhz
    }
}

/// Victim/aggressor technology pair that coexists in a shared ISM window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoexistencePair {
    /// Upper-case substring of the victim code.
    pub victim: String,
    /// Upper-case substring of the aggressor list.
    pub aggressor: String,
}

/// Ordered heuristic rule tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskRules {
    /// Victim keywords, first match wins.
    pub victim_keywords: Vec<KeywordRule>,
    /// Critical frequency ranges, first match wins.
    pub critical_bands: Vec<CriticalBandRule>,
    /// Product types that get the order bonus.
    pub boosted_types: Vec<ProductType>,
    /// Bonus for low-order products.
    pub order_bonus: u8,
    /// Bonus when more than one aggressor is listed.
    pub multi_aggressor_bonus: u8,
    /// Aggressor codes treated as public-safety transmitters.
    pub public_safety_aggressors: Vec<String>,
    /// Bonus for public-safety aggressors.
    pub public_safety_bonus: u8,
    /// Technology pairs sharing the ISM window.
    pub coexistence_pairs: Vec<CoexistencePair>,
    /// Inclusive ISM window (MHz) for the coexistence bonus.
    pub ism_window_mhz: (f64, f64),
    /// Coexistence bonus.
    pub coexistence_bonus: u8,
    /// Victim keywords identifying satellite navigation receivers.
    pub gnss_victim_keywords: Vec<String>,
    /// Digit sequences of GNSS carrier frequencies.
    pub gnss_frequency_markers: Vec<String>,
    /// Bonus when a GNSS victim is hit near a carrier.
    pub gnss_marker_bonus: u8,
}

fn keyword(pattern: &str, severity: u8) -> KeywordRule {
    KeywordRule { pattern: pattern.to_string(), severity }
}

fn critical(name: &str, low_mhz: f64, high_mhz: f64, severity: u8) -> CriticalBandRule {
    CriticalBandRule { name: name.to_string(), low_mhz, high_mhz, severity }
}

impl Default for RiskRules {
    fn default() -> Self {
        RiskRules {
            victim_keywords: vec![
                keyword("GNSS", 5),
                keyword("GPS", 5),
                keyword("LTE_B13", 5),
                keyword("LTE_B14", 5),
                keyword("BLE", 3),
                keyword("WiFi", 3),
                keyword("Wi-Fi", 3),
                keyword("HaLow", 2),
            ],
            critical_bands: vec![
                critical("GNSS_L1", 1559.0, 1610.0, 5),
                critical("GNSS_L2", 1210.0, 1250.0, 5),
                critical("GNSS_L5", 1160.0, 1195.0, 4),
                critical("ISM_24", 2400.0, 2500.0, 4),
                critical("ISM_58", 5725.0, 5875.0, 3),
                critical("WiFi_24", 2400.0, 2495.0, 4),
                critical("WiFi_5", 5150.0, 5925.0, 3),
                critical("BLE_ISM", 2402.0, 2485.0, 4),
                critical("FirstNet", 755.0, 770.0, 5),
                critical("PublicSafety", 758.0, 780.0, 5),
                critical("Cellular_UL", 820.0, 900.0, 4),
                critical("LTE_Low", 700.0, 900.0, 3),
                critical("LTE_Mid", 1700.0, 2200.0, 3),
                critical("LTE_High", 2300.0, 2700.0, 2),
            ],
            boosted_types: vec![ProductType::H2, ProductType::H3, ProductType::Im2, ProductType::Im3],
            order_bonus: 1,
            multi_aggressor_bonus: 1,
            public_safety_aggressors: vec!["LTE_B13".to_string(), "LTE_B14".to_string()],
            public_safety_bonus: 1,
            coexistence_pairs: vec![
                CoexistencePair { victim: "BLE".to_string(), aggressor: "WIFI".to_string() },
                CoexistencePair { victim: "WIFI".to_string(), aggressor: "BLE".to_string() },
            ],
            ism_window_mhz: (2400.0, 2500.0),
            coexistence_bonus: 1,
            gnss_victim_keywords: vec!["GNSS".to_string(), "GPS".to_string()],
            gnss_frequency_markers: vec!["1575".to_string(), "1227".to_string(), "1176".to_string()],
            gnss_marker_bonus: 1,
        }
    }
}

fn bump(severity: u8, bonus: u8) -> u8 {
    severity.saturating_add(bonus).min(MAX_SEVERITY)
}

impl RiskRules {
    /// Classify a product hitting `victim_code`.
    ///
    /// `aggressors` is the comma-joined aggressor list as shown to users.
    /// Returns the symbol and a severity in `1..=5`.
    pub fn classify(
        &self,
        frequency_mhz: f64,
        victim_code: &str,
        aggressors: &str,
        product_type: ProductType,
    ) -> (RiskSymbol, u8) {
        let victim_upper = victim_code.to_uppercase();
        let aggressors_upper = aggressors.to_uppercase();
        let mut severity: u8 = 1;

        if let Some(rule) = self
            .victim_keywords
            .iter()
            .find(|rule| victim_upper.contains(&rule.pattern.to_uppercase()))
        {
            severity = severity.max(rule.severity);
        }

        if let Some(rule) = self.critical_bands.iter().find(|rule| rule.contains(frequency_mhz)) {
            severity = severity.max(rule.severity);
            if rule.name.contains("GNSS") && victim_upper.contains("GNSS") {
                severity = MAX_SEVERITY;
            }
        }

        if self.boosted_types.contains(&product_type) {
            severity = bump(severity, self.order_bonus);
        }

        if aggressors.contains(',') || aggressors.to_lowercase().contains(" and ") {
            severity = bump(severity, self.multi_aggressor_bonus);
        }

        if self
            .public_safety_aggressors
            .iter()
            .any(|code| aggressors.contains(code.as_str()))
        {
            severity = bump(severity, self.public_safety_bonus);
        }

        let coexisting = self.coexistence_pairs.iter().any(|pair| {
            victim_upper.contains(&pair.victim) && aggressors_upper.contains(&pair.aggressor)
        });
        let (ism_low, ism_high) = self.ism_window_mhz;
        if coexisting && ism_low <= frequency_mhz && frequency_mhz <= ism_high {
            severity = bump(severity, self.coexistence_bonus);
        }

        let gnss_victim = self
            .gnss_victim_keywords
            .iter()
            .any(|k| victim_upper.contains(k.as_str()));
        if gnss_victim {
            let digits = frequency_mhz.to_string();
            if self.gnss_frequency_markers.iter().any(|m| digits.contains(m.as_str())) {
                severity = bump(severity, self.gnss_marker_bonus);
            }
        }

        let severity = severity.clamp(1, MAX_SEVERITY);
        (RiskSymbol::from_severity(severity), severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gnss_victim_harmonic_is_critical() {
        let rules = RiskRules::default();
        let (symbol, severity) = rules.classify(1574.0, "GNSS_L1", "LTE_B13", ProductType::H2);
        assert_eq!(severity, 5);
        assert_eq!(symbol, RiskSymbol::Critical);
    }

    #[test]
    fn test_baseline_severity_for_unknown_victim() {
        let rules = RiskRules::default();
        // 3500 MHz is outside every critical range; IM5 gets no order bonus.
        let (symbol, severity) = rules.classify(3500.0, "LTE_B42", "LTE_B1", ProductType::Im5);
        assert_eq!(severity, 1);
        assert_eq!(symbol, RiskSymbol::Safe);
    }

    #[test]
    fn test_rule_order_is_cumulative() {
        let rules = RiskRules::default();
        // LTE_Mid range gives 3, IM5 no bonus, two aggressors +1.
        let (_, severity) = rules.classify(1800.0, "LTE_B3", "LTE_B1, LTE_B7", ProductType::Im5);
        assert_eq!(severity, 4);

        // Same product as IM3 picks up the order bonus too.
        let (_, severity) = rules.classify(1800.0, "LTE_B3", "LTE_B1, LTE_B7", ProductType::Im3);
        assert_eq!(severity, 5);
    }

    #[test]
    fn test_public_safety_aggressor_bonus() {
        let rules = RiskRules::default();
        // LTE_High range: 2; 3H +1; LTE_B13 aggressor +1.
        let (_, severity) = rules.classify(2331.0, "LTE_B30", "LTE_B13", ProductType::H3);
        assert_eq!(severity, 4);
    }

    #[test]
    fn test_ism_coexistence_bonus() {
        let rules = RiskRules::default();
        // BLE keyword 3, ISM_24 4, IM5 no bonus, two aggressors +1, WiFi aggressor +1.
        let (_, with_wifi) = rules.classify(2450.0, "BLE", "WiFi_2G, LTE_B7", ProductType::Im5);
        let (_, without_wifi) = rules.classify(2450.0, "BLE", "LTE_B41, LTE_B7", ProductType::Im5);
        assert_eq!(with_wifi, 5);
        assert_eq!(without_wifi, 5);

        let (_, single) = rules.classify(2450.0, "BLE", "WiFi_2G", ProductType::Im7);
        assert_eq!(single, 5);
        let (_, single_lte) = rules.classify(2450.0, "BLE", "LTE_B7", ProductType::Im7);
        assert_eq!(single_lte, 4);
    }

    #[test]
    fn test_severity_never_exceeds_five() {
        let rules = RiskRules::default();
        let (_, severity) = rules.classify(1575.42, "GNSS_L1", "LTE_B13, LTE_B14", ProductType::Im3);
        assert_eq!(severity, 5);
    }

    #[test]
    fn test_custom_rules_are_respected() {
        let mut rules = RiskRules::default();
        rules.victim_keywords = vec![KeywordRule { pattern: "lora".to_string(), severity: 4 }];
        rules.critical_bands.clear();
        let (_, severity) = rules.classify(868.0, "LoRa_EU", "LTE_B20", ProductType::Im5);
        assert_eq!(severity, 4);
    }
}
