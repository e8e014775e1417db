//! Receiver desensitization.
//!
//! Maps an interference level at the victim input to a noise-floor rise and a
//! risk tier, using technology defaults keyed by band-code keywords.

use crate::params::SystemParameters;
use crate::propagation::{system_isolation, PropagationError};
use coexsim_common::{ProductType, RiskSymbol};
use serde::{Deserialize, Serialize};
use std::fmt;

fn has_any(code: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| code.contains(k))
}

fn is_gnss(code_upper: &str) -> bool {
    has_any(code_upper, &["GNSS", "GPS"])
}

// ============================================================================
// Risk Tier
// ============================================================================

/// Quantitative risk tier derived from desensitization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantRiskLevel {
    /// Receiver effectively blocked.
    Critical,
    /// Significant degradation.
    High,
    /// Noticeable impact.
    Medium,
    /// Measurable but minor.
    Low,
    /// Below measurement relevance.
    Negligible,
}

impl QuantRiskLevel {
    /// Display symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            QuantRiskLevel::Critical => "🔴",
            QuantRiskLevel::High => "🟠",
            QuantRiskLevel::Medium => "🟡",
            QuantRiskLevel::Low => "🔵",
            QuantRiskLevel::Negligible => "✅",
        }
    }

    /// Sort priority, higher is worse.
    pub fn priority(&self) -> u8 {
        match self {
            QuantRiskLevel::Critical => 5,
            QuantRiskLevel::High => 4,
            QuantRiskLevel::Medium => 3,
            QuantRiskLevel::Low => 2,
            QuantRiskLevel::Negligible => 1,
        }
    }

    /// Matching heuristic risk symbol.
    pub fn risk_symbol(&self) -> RiskSymbol {
        match self {
            QuantRiskLevel::Critical => RiskSymbol::Critical,
            QuantRiskLevel::High => RiskSymbol::High,
            QuantRiskLevel::Medium => RiskSymbol::Medium,
            QuantRiskLevel::Low => RiskSymbol::Low,
            QuantRiskLevel::Negligible => RiskSymbol::Safe,
        }
    }

    fn from_thresholds(desense_db: f64, cuts: [f64; 4]) -> Self {
        if desense_db >= cuts[0] {
            QuantRiskLevel::Critical
        } else if desense_db >= cuts[1] {
            QuantRiskLevel::High
        } else if desense_db >= cuts[2] {
            QuantRiskLevel::Medium
        } else if desense_db >= cuts[3] {
            QuantRiskLevel::Low
        } else {
            QuantRiskLevel::Negligible
        }
    }
}

impl fmt::Display for QuantRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuantRiskLevel::Critical => "Critical",
            QuantRiskLevel::High => "High",
            QuantRiskLevel::Medium => "Medium",
            QuantRiskLevel::Low => "Low",
            QuantRiskLevel::Negligible => "Negligible",
        };
        f.write_str(label)
    }
}

/// GNSS desense cut points for Critical/High/Medium/Low (dB).
pub const GNSS_THRESHOLDS_DB: [f64; 4] = [8.0, 3.0, 1.0, 0.5];
/// Public-safety cut points (dB).
pub const PUBLIC_SAFETY_THRESHOLDS_DB: [f64; 4] = [6.0, 3.0, 1.0, 0.5];
/// Generic receiver cut points (dB).
pub const GENERIC_THRESHOLDS_DB: [f64; 4] = [12.0, 6.0, 3.0, 1.0];

/// Risk tier for a desense level on `victim`.
pub fn assess_quantitative_risk(desense_db: f64, victim: &str) -> QuantRiskLevel {
    let cuts = if is_gnss(&victim.to_uppercase()) {
        GNSS_THRESHOLDS_DB
    } else {
        GENERIC_THRESHOLDS_DB
    };
    QuantRiskLevel::from_thresholds(desense_db, cuts)
}

/// Severity 1..=5, symbol and an explanation for a quantitative result.
///
/// GNSS and public-safety victims use stricter cut points than generic ones.
pub fn assess_severity_quantitative(
    interference_dbm: f64,
    _sensitivity_dbm: f64,
    desense_db: f64,
    victim: &str,
    _product_type: ProductType,
) -> (RiskSymbol, u8, String) {
    let upper = victim.to_uppercase();
    let d = desense_db;

    let (level, reason) = if is_gnss(&upper) {
        let level = QuantRiskLevel::from_thresholds(d, GNSS_THRESHOLDS_DB);
        let reason = match level {
            QuantRiskLevel::Critical => format!("GPS dead zone ({:.1}dB desense, {:.0}dBm)", d, interference_dbm),
            QuantRiskLevel::High => format!("GPS acquisition degraded ({:.1}dB desense)", d),
            QuantRiskLevel::Medium => format!("GPS tracking affected ({:.1}dB desense)", d),
            QuantRiskLevel::Low => format!("Minor GPS impact ({:.1}dB desense)", d),
            QuantRiskLevel::Negligible => format!("Negligible ({:.2}dB)", d),
        };
        (level, reason)
    } else if has_any(&upper, &["B13", "B14", "FIRSTNET", "PUBLIC"]) {
        let level = QuantRiskLevel::from_thresholds(d, PUBLIC_SAFETY_THRESHOLDS_DB);
        let reason = match level {
            QuantRiskLevel::Critical => format!("Public safety critical ({:.1}dB desense)", d),
            QuantRiskLevel::High => format!("Public safety degraded ({:.1}dB desense)", d),
            QuantRiskLevel::Medium => format!("Public safety impacted ({:.1}dB desense)", d),
            QuantRiskLevel::Low => format!("Minor public safety impact ({:.1}dB)", d),
            QuantRiskLevel::Negligible => format!("Negligible ({:.2}dB)", d),
        };
        (level, reason)
    } else {
        let level = QuantRiskLevel::from_thresholds(d, GENERIC_THRESHOLDS_DB);
        let reason = match level {
            QuantRiskLevel::Critical => {
                format!("Receiver saturation ({:.1}dB desense, {:.0}dBm)", d, interference_dbm)
            }
            QuantRiskLevel::High => format!("Significant degradation ({:.1}dB desense)", d),
            QuantRiskLevel::Medium => format!("Performance loss ({:.1}dB desense)", d),
            QuantRiskLevel::Low => format!("Minor degradation ({:.1}dB desense)", d),
            QuantRiskLevel::Negligible => format!("Negligible ({:.2}dB)", d),
        };
        (level, reason)
    };

    (level.risk_symbol(), level.priority(), reason)
}

// ============================================================================
// Noise Floor and Desensitization
// ============================================================================

/// Keyword table for [`victim_noise_floor`]: (keyword, bandwidth Hz, NF dB).
const NOISE_FLOOR_DEFAULTS: [(&str, f64, f64); 10] = [
    ("GNSS", 2e6, 2.0),
    ("GPS", 2e6, 2.0),
    ("LTE", 10e6, 6.0),
    ("WIFI", 20e6, 6.0),
    ("WI-FI", 20e6, 6.0),
    ("BLE", 1e6, 8.0),
    ("BLUETOOTH", 1e6, 8.0),
    ("HALOW", 1e6, 7.0),
    ("LORA", 125e3, 6.0),
    ("ZIGBEE", 2e6, 8.0),
];

/// Estimated noise floor (dBm) for a receiver technology at -174 dBm/Hz.
///
/// An explicit bandwidth override must be positive.
pub fn victim_noise_floor(victim: &str, bandwidth_hz: Option<f64>) -> Result<f64, PropagationError> {
    let upper = victim.to_uppercase();
    let (mut bw, nf) = NOISE_FLOOR_DEFAULTS
        .iter()
        .find(|(k, _, _)| upper.contains(k))
        .map(|(_, bw, nf)| (*bw, *nf))
        .unwrap_or((10e6, 6.0));

    if let Some(explicit) = bandwidth_hz {
        if explicit <= 0.0 {
            return Err(PropagationError::NonPositiveBandwidth(explicit));
        }
        bw = explicit;
    }

    Ok(SystemParameters::DEFAULT_THERMAL_NOISE_DENSITY + 10.0 * bw.log10() + nf)
}

/// Desensitization from interference over noise (dB).
///
/// Interference 20 dB or more below the floor contributes nothing.
pub fn calculate_desensitization(interference_dbm: f64, noise_floor_dbm: f64) -> f64 {
    if interference_dbm <= noise_floor_dbm - 20.0 {
        return 0.0;
    }
    10.0 * (1.0 + 10f64.powf((interference_dbm - noise_floor_dbm) / 10.0)).log10()
}

/// Receiver sensitivity (dBm) for a victim band code.
pub fn victim_sensitivity(victim: &str, params: &SystemParameters) -> f64 {
    let upper = victim.to_uppercase();
    if is_gnss(&upper) {
        params.gnss_sensitivity
    } else if upper.contains("NR_N") || upper.contains("LTE") {
        params.lte_sensitivity
    } else if has_any(&upper, &["WIFI", "WI-FI"]) {
        params.wifi_sensitivity
    } else if upper.contains("BLE") {
        params.ble_sensitivity
    } else if upper.contains("HALOW") {
        params.halow_sensitivity
    } else {
        -100.0
    }
}

/// Transmit power (dBm) for an aggressor band code.
pub fn aggressor_power(code: &str, params: &SystemParameters) -> f64 {
    let upper = code.to_uppercase();
    // Wi-Fi first so that `WiFi_5G` is not read as 5G NR.
    if has_any(&upper, &["WIFI", "WI-FI", "WLAN"]) {
        params.wifi_tx_power
    } else if has_any(&upper, &["LTE", "NR_N", "5G"]) {
        params.lte_tx_power
    } else if has_any(&upper, &["BLE", "BLUETOOTH"]) {
        params.ble_tx_power
    } else if upper.contains("HALOW") {
        params.halow_tx_power
    } else if has_any(&upper, &["ISM", "ZIGBEE", "THREAD"]) {
        10.0
    } else if has_any(&upper, &["LORA", "SIGFOX", "LORAWAN"]) {
        14.0
    } else if is_gnss(&upper) {
        0.0
    } else {
        20.0
    }
}

// ============================================================================
// Victim Analysis
// ============================================================================

/// Receiver-side view of one interference level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictimAnalysis {
    /// Level at the victim input after isolation (dBm).
    pub interference_at_victim_dbm: f64,
    /// Victim sensitivity (dBm).
    pub sensitivity_dbm: f64,
    /// Sensitivity minus interference (dB, positive is safe).
    pub margin_db: f64,
    /// Noise-floor rise (dB).
    pub desensitization_db: f64,
    /// Sensitivity after desense (dBm).
    pub effective_sensitivity_dbm: f64,
    /// Thermal noise plus noise figure (dBm).
    pub noise_floor_dbm: f64,
    /// Signal 3 dB above sensitivity over interference (dB).
    pub sir_db: f64,
    /// Risk tier.
    pub risk_level: QuantRiskLevel,
    /// Isolation applied on the way in (dB).
    pub isolation_applied_db: f64,
    /// Receiver bandwidth assumed (Hz).
    pub rx_bandwidth_hz: f64,
    /// Carrier-to-noise requirement (dB).
    pub required_cnr_db: f64,
}

/// Analyze an interference level arriving at `victim`.
pub fn interference_at_victim(at_tx_dbm: f64, victim: &str, params: &SystemParameters) -> VictimAnalysis {
    let isolation = system_isolation(params, 1000.0);
    let interference = at_tx_dbm - isolation;
    let sensitivity = victim_sensitivity(victim, params);

    let upper = victim.to_uppercase();
    let gnss = upper.contains("GNSS");
    let (bandwidth, nf, cnr): (f64, f64, f64) = if gnss {
        (2e6, 2.0, 15.0)
    } else if upper.contains("NR_N") {
        (20e6, params.noise_figure, 10.0)
    } else if upper.contains("LTE") {
        (10e6, params.noise_figure, 10.0)
    } else if has_any(&upper, &["WIFI", "WI-FI"]) {
        (20e6, params.noise_figure, 12.0)
    } else if upper.contains("BLE") {
        (1e6, params.noise_figure, 8.0)
    } else {
        (5e6, params.noise_figure, 10.0)
    };

    let noise_floor = params.thermal_noise_density + 10.0 * bandwidth.log10() + nf;

    let desense = if interference <= noise_floor {
        0.0
    } else {
        let mut d = 10.0 * (1.0 + 10f64.powf((interference - noise_floor) / 10.0)).log10();
        if interference > sensitivity {
            let scale = if gnss { 0.6 } else { 0.4 };
            d = d.max((interference - sensitivity) * scale);
        }
        d.min(if gnss { 15.0 } else { 30.0 })
    };

    let sir = if interference > -200.0 { (sensitivity + 3.0) - interference } else { 999.0 };

    VictimAnalysis {
        interference_at_victim_dbm: interference,
        sensitivity_dbm: sensitivity,
        margin_db: sensitivity - interference,
        desensitization_db: desense,
        effective_sensitivity_dbm: sensitivity + desense,
        noise_floor_dbm: noise_floor,
        sir_db: sir,
        risk_level: assess_quantitative_risk(desense, victim),
        isolation_applied_db: isolation,
        rx_bandwidth_hz: bandwidth,
        required_cnr_db: cnr,
    }
}

// ============================================================================
// Duty Cycle
// ============================================================================

/// Scale continuous desensitization for an intermittent aggressor.
///
/// At 95 % or more the aggressor counts as continuous; at 1 % or less it is
/// negligible. In between the reduction is floored at 10 % of the input.
pub fn apply_duty_cycle_correction(continuous_db: f64, duty_cycle: f64) -> f64 {
    if duty_cycle >= 0.95 {
        return continuous_db;
    }
    if duty_cycle <= 0.01 {
        return 0.0;
    }
    let dc = duty_cycle.clamp(0.01, 0.99);
    let corrected = continuous_db + 10.0 * dc.log10();
    corrected.max(continuous_db * 0.1).max(0.0)
}

/// TDD cellular bands that follow the configured LTE duty cycle.
const TDD_BANDS: [&str; 13] = [
    "B38", "B39", "B40", "B41", "B42", "B43", "B44", "B48", "N38", "N41", "N77", "N78", "N79",
];

/// Typical duty cycle for the technology behind a band code.
pub fn technology_duty_cycle(code: &str, params: &SystemParameters) -> f64 {
    let upper = code.to_uppercase();
    if has_any(&upper, &TDD_BANDS) {
        params.lte_duty_cycle
    } else if has_any(&upper, &["WIFI", "WI-FI", "WLAN"]) {
        params.wifi_duty_cycle
    } else if has_any(&upper, &["LTE", "NR_N", "5G"]) {
        1.0
    } else if has_any(&upper, &["BLE", "BLUETOOTH"]) {
        params.ble_duty_cycle
    } else if upper.contains("HALOW") {
        params.halow_duty_cycle
    } else if is_gnss(&upper) {
        1.0
    } else if has_any(&upper, &["ISM", "ZIGBEE", "THREAD", "MATTER"]) {
        0.2
    } else if has_any(&upper, &["LORA", "SIGFOX"]) {
        0.01
    } else {
        0.5
    }
}
