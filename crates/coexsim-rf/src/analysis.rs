//! Quantitative analysis of a candidate list.

use crate::desense::{
    aggressor_power, apply_duty_cycle_correction, assess_quantitative_risk, assess_severity_quantitative,
    interference_at_victim, technology_duty_cycle, QuantRiskLevel,
};
use crate::params::SystemParameters;
use crate::propagation::{
    assess_interference_level, estimate_per_from_snr, harmonic_level, imd_level, InterferenceLevel, LinkAssessment,
    PropagationError,
};
use coexsim_common::{Band, InterferenceCandidate, ProductType};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fundamental assumed when the aggressor band is unknown (MHz).
pub const DEFAULT_FUNDAMENTAL_MHZ: f64 = 1000.0;

/// Carrier-relative level assumed for products without a nonlinearity model (dBc).
pub const DEFAULT_NONLINEARITY_DBC: f64 = -50.0;

/// Options for the quantitative pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisOptions {
    /// Time-average desensitization over the strongest aggressor's duty cycle.
    pub duty_cycle: bool,
}

/// Power levels and receiver impact for one (candidate, victim) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantitativeResult {
    /// Product frequency (MHz).
    pub frequency_mhz: f64,
    /// Product family.
    pub product_type: ProductType,
    /// Aggressor band codes.
    pub aggressors: Vec<String>,
    /// Victim band code.
    pub victim: String,
    /// Strongest aggressor TX power (dBm).
    pub aggressor_power_dbm: f64,
    /// Product level relative to carrier (dBc).
    pub interference_level_dbc: f64,
    /// Product level from the propagation model (dBm).
    pub interference_at_tx_dbm: f64,
    /// Level at the victim input after isolation (dBm).
    pub interference_at_victim_dbm: f64,
    /// Victim sensitivity (dBm).
    pub victim_sensitivity_dbm: f64,
    /// Sensitivity minus interference (dB, positive is safe).
    pub interference_margin_db: f64,
    /// Noise-floor rise for a continuous aggressor (dB).
    pub desensitization_db: f64,
    /// Duty cycle applied to the strongest aggressor (1.0 when uncorrected).
    pub duty_cycle: f64,
    /// Time-averaged noise-floor rise (dB). Equals `desensitization_db` when uncorrected.
    pub average_desensitization_db: f64,
    /// Risk tier of the averaged desense.
    pub risk_level: QuantRiskLevel,
    /// Severity 1..=5 with victim-class cut points.
    pub severity: u8,
    /// Why the product got its severity.
    pub severity_reason: String,
    /// Packet error rate estimate at the victim's signal-to-interference ratio.
    pub packet_error_rate: f64,
    /// Direct antenna coupling of the strongest aggressor at the product frequency.
    pub antenna_coupling: LinkAssessment,
    /// Nonlinearity term used.
    pub formula: String,
    /// Dominant coefficient.
    pub coefficient: String,
}

/// Propagated level for one candidate at `tx_power_dbm`.
///
/// Harmonics are evaluated at the first aggressor's TX centre; products with
/// no nonlinearity model get a flat estimate.
pub fn propagate(
    candidate: &InterferenceCandidate,
    bands: &[Band],
    tx_power_dbm: f64,
    params: &SystemParameters,
) -> Result<InterferenceLevel, PropagationError> {
    if let Some(order) = candidate.product_type.harmonic_order() {
        let fundamental = candidate
            .aggressors
            .first()
            .and_then(|code| bands.iter().find(|b| &b.code == code && b.tx_low > 0.0))
            .map(Band::tx_center)
            .unwrap_or(DEFAULT_FUNDAMENTAL_MHZ);
        return harmonic_level(tx_power_dbm, order, params, fundamental);
    }

    if candidate.product_type.is_intermod() {
        return Ok(imd_level(tx_power_dbm, tx_power_dbm, candidate.product_type, params));
    }

    Ok(InterferenceLevel {
        dbc: DEFAULT_NONLINEARITY_DBC,
        at_output_dbm: tx_power_dbm + DEFAULT_NONLINEARITY_DBC,
        formula: "Default nonlinearity estimate".to_string(),
        coefficient: "mixed".to_string(),
    })
}

/// One result per candidate that has aggressors, a victim and a positive frequency.
///
/// Products whose propagation fails are logged and skipped.
pub fn analyze_interference(
    candidates: &[InterferenceCandidate],
    bands: &[Band],
    params: &SystemParameters,
    options: &AnalysisOptions,
) -> Vec<QuantitativeResult> {
    let mut results = Vec::new();

    for candidate in candidates {
        let victim = match candidate.victim.as_deref() {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };
        if candidate.aggressors.is_empty() || candidate.frequency_mhz <= 0.0 {
            continue;
        }

        let (strongest, tx_power) = strongest_aggressor(&candidate.aggressors, params);

        let level = match propagate(candidate, bands, tx_power, params) {
            Ok(level) => level,
            Err(e) => {
                warn!(formula = %candidate.formula, error = %e, "skipping product");
                continue;
            }
        };

        let analysis = interference_at_victim(level.at_output_dbm, victim, params);
        let duty_cycle = if options.duty_cycle { technology_duty_cycle(strongest, params) } else { 1.0 };
        let average = if options.duty_cycle {
            apply_duty_cycle_correction(analysis.desensitization_db, duty_cycle)
        } else {
            analysis.desensitization_db
        };
        let (_, severity, severity_reason) = assess_severity_quantitative(
            analysis.interference_at_victim_dbm,
            analysis.sensitivity_dbm,
            average,
            victim,
            candidate.product_type,
        );

        results.push(QuantitativeResult {
            frequency_mhz: candidate.frequency_mhz,
            product_type: candidate.product_type,
            aggressors: candidate.aggressors.clone(),
            victim: victim.to_string(),
            aggressor_power_dbm: tx_power,
            interference_level_dbc: level.dbc,
            interference_at_tx_dbm: level.at_output_dbm,
            interference_at_victim_dbm: analysis.interference_at_victim_dbm,
            victim_sensitivity_dbm: analysis.sensitivity_dbm,
            interference_margin_db: analysis.margin_db,
            desensitization_db: analysis.desensitization_db,
            duty_cycle,
            average_desensitization_db: average,
            risk_level: assess_quantitative_risk(average, victim),
            severity,
            severity_reason,
            packet_error_rate: estimate_per_from_snr(analysis.sir_db, victim_modulation(victim)),
            antenna_coupling: assess_interference_level(
                candidate.frequency_mhz,
                tx_power,
                analysis.sensitivity_dbm,
                params,
            ),
            formula: level.formula,
            coefficient: level.coefficient,
        });
    }

    debug!(candidates = candidates.len(), results = results.len(), "quantitative analysis complete");
    results
}

/// Highest-power aggressor code and its power, first one on ties.
fn strongest_aggressor<'a>(aggressors: &'a [String], params: &SystemParameters) -> (&'a str, f64) {
    let mut best = ("", f64::NEG_INFINITY);
    for code in aggressors {
        let power = aggressor_power(code, params);
        if power > best.1 {
            best = (code.as_str(), power);
        }
    }
    best
}

/// Modulation curve for [`estimate_per_from_snr`] by victim technology.
fn victim_modulation(victim: &str) -> &'static str {
    let upper = victim.to_uppercase();
    if upper.contains("WIFI") || upper.contains("WI-FI") {
        "64QAM"
    } else if ["ZIGBEE", "THREAD", "MATTER"].iter().any(|k| upper.contains(k)) {
        "OQPSK"
    } else {
        "generic"
    }
}

/// Order results worst tier first, then by averaged desensitization descending.
pub fn sort_summary(results: &mut [QuantitativeResult]) {
    results.sort_by(|a, b| {
        b.risk_level
            .priority()
            .cmp(&a.risk_level.priority())
            .then_with(|| b.average_desensitization_db.total_cmp(&a.average_desensitization_db))
    });
}
