//! Physical propagation of nonlinear products.
//!
//! Harmonic and intermodulation levels are derived from the front-end
//! linearity figures, then walked through TX filtering, isolation and RX
//! rejection to a level at the victim input.

use crate::desense::QuantRiskLevel;
use crate::params::{PaClass, SystemParameters};
use coexsim_common::ProductType;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors from single-call propagation helpers.
#[derive(Debug, Error, PartialEq)]
pub enum PropagationError {
    /// Harmonic order outside 2..=5.
    #[error("Harmonic order {0} not supported (2-5 only)")]
    UnsupportedHarmonicOrder(u32),

    /// A bandwidth the caller supplied explicitly was not positive.
    #[error("Bandwidth must be positive, got {0} Hz")]
    NonPositiveBandwidth(f64),
}

// ============================================================================
// Harmonic Distortion
// ============================================================================

/// HD3 (dBc) from the input third-order intercept and PA class.
pub fn hd3_from_iip3(tx_power_dbm: f64, iip3_dbm: f64, pa_class: PaClass) -> f64 {
    let delta = tx_power_dbm - iip3_dbm;
    let mut hd3 = -2.0 * delta + pa_class.hd3_correction();

    // Small-signal region is cleaner, deep compression slightly worse.
    if delta < 5.0 {
        hd3 += 5.0;
    } else if delta > 15.0 {
        hd3 -= 3.0;
    }

    hd3.clamp(-70.0, -20.0)
}

/// HD2 (dBc) from the input second-order intercept and bias tuning.
pub fn hd2_from_iip2(tx_power_dbm: f64, iip2_dbm: f64, bias_optimized: bool) -> f64 {
    let delta = tx_power_dbm - iip2_dbm;
    let bias = if bias_optimized { 3.0 } else { -2.0 };
    let symmetry = if delta < 10.0 {
        3.0
    } else if delta > 20.0 {
        -5.0
    } else {
        0.0
    };

    (-delta + bias + symmetry).clamp(-60.0, -15.0)
}

/// HD4 and HD5 (dBc) derived from HD2/HD3.
///
/// Above 10 dB past IIP3 both grow with a compression correction.
pub fn higher_order_harmonics(hd2_dbc: f64, hd3_dbc: f64, tx_power_dbm: f64, iip3_dbm: f64) -> (f64, f64) {
    let mut hd4 = hd2_dbc - 30.0;
    let mut hd5 = hd3_dbc - 20.0;

    let delta = tx_power_dbm - iip3_dbm;
    if delta > 10.0 {
        let compression = (delta - 10.0) * 0.15;
        hd4 += compression * 0.5;
        hd5 += compression * 0.3;
    }

    (hd4.max(-85.0), hd5.max(-90.0))
}

/// Harmonic levels relative to the carrier for one TX power.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarmonicLevels {
    /// Second harmonic.
    pub hd2_dbc: f64,
    /// Third harmonic.
    pub hd3_dbc: f64,
    /// Fourth harmonic.
    pub hd4_dbc: f64,
    /// Fifth harmonic.
    pub hd5_dbc: f64,
    /// How the levels were obtained.
    pub method: String,
}

impl HarmonicLevels {
    /// Level for `order`, if in 2..=5.
    pub fn get(&self, order: u32) -> Option<f64> {
        match order {
            2 => Some(self.hd2_dbc),
            3 => Some(self.hd3_dbc),
            4 => Some(self.hd4_dbc),
            5 => Some(self.hd5_dbc),
            _ => None,
        }
    }
}

/// All harmonic levels for `tx_power_dbm` under `params`.
pub fn system_harmonic_levels(tx_power_dbm: f64, params: &SystemParameters) -> HarmonicLevels {
    let hd2 = hd2_from_iip2(tx_power_dbm, params.iip2, params.bias_point_optimized);
    let hd3 = hd3_from_iip3(tx_power_dbm, params.iip3, params.pa_class);
    let (hd4, hd5) = higher_order_harmonics(hd2, hd3, tx_power_dbm, params.iip3);

    HarmonicLevels {
        hd2_dbc: hd2,
        hd3_dbc: hd3,
        hd4_dbc: hd4,
        hd5_dbc: hd5,
        method: "Calculated from IIP3/IIP2 + TX Power (polynomial coefficients)".to_string(),
    }
}

// ============================================================================
// Isolation
// ============================================================================

/// Maximum practical isolation (dB).
pub const MAX_ISOLATION_DB: f64 = 60.0;

/// Combine isolation paths without simply adding them.
///
/// The weakest nonzero path limits; each stronger path adds at most 6 dB,
/// scaled by `(1 - coupling_factor) * 0.5`. A frequency correction follows
/// and the result is clamped to `[0, 60]` dB.
pub fn total_isolation(
    antenna_db: f64,
    pcb_db: f64,
    shield_db: f64,
    frequency_mhz: f64,
    coupling_factor: f64,
) -> f64 {
    let mut paths: Vec<f64> = [antenna_db, pcb_db, shield_db].into_iter().filter(|&v| v > 0.0).collect();
    if paths.is_empty() {
        return 0.0;
    }
    paths.sort_by(f64::total_cmp);

    let limiting = paths[0];
    let additional: f64 = paths[1..]
        .iter()
        .map(|&iso| (iso - limiting).min(6.0) * (1.0 - coupling_factor) * 0.5)
        .sum();

    let freq_factor = if frequency_mhz > 3000.0 {
        -3.0
    } else if frequency_mhz > 2000.0 {
        -2.0
    } else if frequency_mhz > 1000.0 {
        -1.0
    } else if frequency_mhz > 500.0 {
        0.0
    } else {
        1.0
    };

    (limiting + additional + freq_factor).clamp(0.0, MAX_ISOLATION_DB)
}

/// Total isolation of a parameter set at `frequency_mhz`.
pub fn system_isolation(params: &SystemParameters, frequency_mhz: f64) -> f64 {
    total_isolation(
        params.antenna_isolation,
        params.pcb_isolation,
        params.shielding,
        frequency_mhz,
        params.coupling_factor,
    )
}

/// Antenna family, for harmonic pattern corrections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AntennaType {
    /// Patch antenna.
    Patch,
    /// Dipole antenna.
    Dipole,
    /// Helical antenna.
    Helical,
    /// Unknown or mixed.
    #[default]
    Default,
}

/// Isolation correction at a harmonic (dB, negative means worse).
///
/// Harmonics above 4 GHz and 6 GHz earn back some free-space loss.
pub fn harmonic_isolation_adjustment(fundamental_mhz: f64, order: u32, antenna: AntennaType) -> f64 {
    let table: [f64; 4] = match antenna {
        AntennaType::Patch => [-2.0, -4.0, -3.0, -5.0],
        AntennaType::Dipole => [2.0, -2.0, 1.0, -3.0],
        AntennaType::Helical => [-1.0, -2.0, -3.0, -4.0],
        AntennaType::Default => [-1.0, -2.0, -2.0, -3.0],
    };
    let mut adjustment = match order {
        2..=5 => table[(order - 2) as usize],
        _ => -2.0,
    };

    let harmonic_mhz = fundamental_mhz * order as f64;
    if harmonic_mhz > 6000.0 {
        adjustment += 4.0;
    } else if harmonic_mhz > 4000.0 {
        adjustment += 2.0;
    }
    adjustment
}

// ============================================================================
// Filtering
// ============================================================================

/// Receive filter technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Maximally flat.
    #[default]
    Butterworth,
    /// Steeper transition with passband ripple.
    Chebyshev,
    /// Surface acoustic wave.
    Saw,
    /// Bulk acoustic wave.
    Baw,
}

impl FilterType {
    /// Ultimate stopband rejection (dB).
    pub fn max_rejection(&self) -> f64 {
        match self {
            FilterType::Butterworth => 60.0,
            FilterType::Chebyshev => 70.0,
            FilterType::Saw => 50.0,
            FilterType::Baw => 55.0,
        }
    }
}

/// Receive filter rejection at an offset from the filter centre (dB).
///
/// Non-positive frequency or bandwidth returns 0 dB.
pub fn rx_filter_rejection(
    freq_mhz: f64,
    center_mhz: f64,
    bandwidth_mhz: f64,
    order: u32,
    filter: FilterType,
) -> f64 {
    if bandwidth_mhz <= 0.0 || freq_mhz <= 0.0 || center_mhz <= 0.0 {
        return 0.0;
    }

    let offset = (freq_mhz - center_mhz).abs();
    let corner = bandwidth_mhz / 2.0;
    if offset <= corner {
        return 0.0;
    }

    let x = offset / corner;
    let n = order as f64;
    let rejection = match filter {
        FilterType::Chebyshev if x <= 2.0 => n * 24.0 * x.log10() * 0.7,
        FilterType::Chebyshev => n * 24.0 * x.log10(),
        FilterType::Saw if x <= 1.5 => n * 15.0 * (x - 1.0),
        FilterType::Saw => n * 8.0 + 20.0 * (x / 1.5).log10(),
        FilterType::Baw if x <= 1.5 => n * 16.0 * (x - 1.0),
        FilterType::Baw => n * 9.0 + 22.0 * (x / 1.5).log10(),
        FilterType::Butterworth if x <= 2.0 => n * 20.0 * x.log10() * 0.5,
        FilterType::Butterworth => n * 20.0 * x.log10(),
    };

    rejection.clamp(0.0, filter.max_rejection())
}

/// Piecewise-linear filter attenuation estimate (dB).
pub fn filter_attenuation(freq_mhz: f64, center_mhz: f64, bandwidth_mhz: f64, stopband_db: f64) -> f64 {
    let edge_offset = (freq_mhz - center_mhz).abs() - bandwidth_mhz / 2.0;
    if edge_offset <= 0.0 {
        0.0
    } else if edge_offset < bandwidth_mhz {
        edge_offset / bandwidth_mhz * stopband_db
    } else {
        stopband_db
    }
}

/// Free-space path loss (dB). Non-positive inputs return 0 dB.
pub fn path_loss_db(freq_mhz: f64, distance_m: f64) -> f64 {
    if freq_mhz <= 0.0 || distance_m <= 0.0 {
        return 0.0;
    }
    20.0 * distance_m.log10() + 20.0 * freq_mhz.log10() + 92.45
}

// ============================================================================
// Intermodulation
// ============================================================================

/// IMD output power (dBm) from an intercept point.
///
/// Orders 5 and 7 assume IIP5/IIP7 sit 10/15 dB above the given IIP3.
pub fn imd_from_intercept(p_in_dbm: f64, iip_dbm: f64, order: u32) -> f64 {
    match order {
        2 => 2.0 * p_in_dbm - iip_dbm,
        3 => 3.0 * p_in_dbm - 2.0 * iip_dbm,
        4 => (2.0 * p_in_dbm - iip_dbm) - 18.0,
        5 => 5.0 * p_in_dbm - 4.0 * (iip_dbm + 10.0),
        7 => 7.0 * p_in_dbm - 6.0 * (iip_dbm + 15.0),
        n => {
            let n = n as f64;
            n * p_in_dbm - (n - 1.0) * (iip_dbm + (n - 3.0) * 5.0)
        }
    }
}

// ============================================================================
// Product Levels
// ============================================================================

/// A propagated product level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterferenceLevel {
    /// Level relative to the fundamental at the victim.
    pub dbc: f64,
    /// Absolute level after filtering, isolation and RX rejection (dBm).
    pub at_output_dbm: f64,
    /// Polynomial term responsible.
    pub formula: String,
    /// Dominant coefficient.
    pub coefficient: String,
}

/// Harmonic level at the victim input.
///
/// `fundamental_mhz` sets the frequency at which isolation is evaluated.
pub fn harmonic_level(
    fundamental_dbm: f64,
    order: u32,
    params: &SystemParameters,
    fundamental_mhz: f64,
) -> Result<InterferenceLevel, PropagationError> {
    let (formula, coefficient, extra_filter, rx_scale, limit) = match order {
        2 => ("2H = a₂V²", "a₂ = 0.0562", 0.0, 0.5, -15.0),
        3 => ("3H = a₃V³", "a₃ = 0.01", 3.0, 0.7, -25.0),
        4 => ("4H = a₄V⁴", "a₄ = 0.0018", 6.0, 0.8, -35.0),
        5 => ("5H = a₅V⁵", "a₅ = 0.001", 10.0, 0.9, -45.0),
        n => return Err(PropagationError::UnsupportedHarmonicOrder(n)),
    };

    let levels = system_harmonic_levels(fundamental_dbm, params);
    let hd = levels.get(order).ok_or(PropagationError::UnsupportedHarmonicOrder(order))?;

    let at_tx = fundamental_dbm + hd;
    let after_filter = at_tx - (params.tx_harmonic_filtering + extra_filter);

    let base_isolation = system_isolation(params, fundamental_mhz * order as f64);
    let isolation = base_isolation + harmonic_isolation_adjustment(fundamental_mhz, order, AntennaType::Default);
    let at_victim_input = after_filter - isolation;

    let mut at_victim = at_victim_input - params.out_of_band_rejection * rx_scale;
    let fundamental_at_victim = fundamental_dbm - base_isolation;
    let mut dbc = at_victim - fundamental_at_victim;

    if dbc > limit {
        dbc = limit;
        at_victim = fundamental_at_victim + dbc;
    }

    Ok(InterferenceLevel {
        dbc,
        at_output_dbm: at_victim,
        formula: formula.to_string(),
        coefficient: coefficient.to_string(),
    })
}

/// Intermodulation level at the victim input for two tones.
///
/// Non-intermod product types fall back to a generic third-order estimate.
pub fn imd_level(
    power1_dbm: f64,
    power2_dbm: f64,
    product_type: ProductType,
    params: &SystemParameters,
) -> InterferenceLevel {
    let p_in = power1_dbm.max(power2_dbm);

    let (formula, coefficient, order, intercept) = match product_type {
        ProductType::Im2 => (
            "a₂V₁V₂ (2nd order beat/sum products)".to_string(),
            "a₂ = 0.0562",
            2,
            Some(params.iip2),
        ),
        ProductType::Im3 => (
            "a₃(2V₁²V₂ + 2V₁V₂²) + 5th order contributions".to_string(),
            "a₃ = 0.01 + a₅ contributions",
            3,
            Some(params.iip3),
        ),
        ProductType::Im4 => (
            "a₄(3V₁³V₂ + 3V₁V₂³ + mixed terms)".to_string(),
            "a₄ = 0.0018",
            4,
            Some(params.iip2),
        ),
        ProductType::Im5 => (
            "a₅(3V₁²2V₂² + 3V₂²2V₁²)".to_string(),
            "a₅ = 0.001",
            5,
            Some(params.iip3),
        ),
        ProductType::Im7 => (
            "a₇ higher-order polynomial terms (estimated)".to_string(),
            "a₇ ≈ 0.0001 (estimated)",
            7,
            Some(params.iip3),
        ),
        other => (format!("Unknown {} product", other), "unknown", 3, None),
    };

    let base_dbc = match intercept {
        Some(iip) => imd_from_intercept(p_in, iip, order) - p_in,
        None => -70.0,
    };
    let at_tx = p_in + base_dbc;

    let tx_filter = if order % 2 == 0 { params.tx_harmonic_filtering * 0.3 } else { 0.0 };

    let base_isolation = system_isolation(params, 1000.0);
    let mut tech_isolation = 0.0;
    if params.wifi_ble_isolation > 0.0 {
        tech_isolation += params.wifi_ble_isolation * 0.4;
    }
    if params.cellular_wifi_isolation > 0.0 {
        tech_isolation += params.cellular_wifi_isolation * 0.4;
    }

    let mut rx_filter = params.rx_preselector;
    if order % 2 == 0 || order >= 5 {
        rx_filter += params.out_of_band_rejection * 0.3;
    }

    let mut at_victim = at_tx - tx_filter - (base_isolation + tech_isolation) - rx_filter;
    let fundamental_at_victim = p_in - base_isolation;
    let mut dbc = at_victim - fundamental_at_victim;

    let limit = match order {
        2 => -10.0,
        3 => -15.0,
        4 => -25.0,
        5 => -30.0,
        7 => -35.0,
        _ => -40.0,
    };
    if dbc > limit {
        dbc = limit;
        at_victim = fundamental_at_victim + dbc;
    }

    InterferenceLevel {
        dbc,
        at_output_dbm: at_victim,
        formula,
        coefficient: coefficient.to_string(),
    }
}

// ============================================================================
// Link Budget Helpers
// ============================================================================

/// Coarse board-level interference assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkAssessment {
    /// Interference frequency (MHz).
    pub frequency_mhz: f64,
    /// Aggressor power (dBm).
    pub aggressor_power_dbm: f64,
    /// Free-space loss over 5 cm (dB).
    pub path_loss_db: f64,
    /// Antenna isolation plus path loss (dB).
    pub total_isolation_db: f64,
    /// Level at the victim input (dBm).
    pub interference_at_victim_dbm: f64,
    /// Victim sensitivity (dBm).
    pub victim_sensitivity_dbm: f64,
    /// Sensitivity minus interference (dB).
    pub margin_db: f64,
    /// Impact level from the margin.
    pub impact: QuantRiskLevel,
}

/// Board separation assumed by [`assess_interference_level`] (m).
pub const BOARD_SEPARATION_M: f64 = 0.05;

/// Assess interference from antenna isolation and short-range path loss.
pub fn assess_interference_level(
    freq_mhz: f64,
    aggressor_power_dbm: f64,
    victim_sensitivity_dbm: f64,
    params: &SystemParameters,
) -> LinkAssessment {
    let path_loss = path_loss_db(freq_mhz, BOARD_SEPARATION_M);
    let isolation = params.antenna_isolation + path_loss;
    let at_victim = aggressor_power_dbm - isolation;
    let margin = victim_sensitivity_dbm - at_victim;

    let impact = if margin < 6.0 {
        QuantRiskLevel::Critical
    } else if margin < 12.0 {
        QuantRiskLevel::High
    } else if margin < 20.0 {
        QuantRiskLevel::Medium
    } else {
        QuantRiskLevel::Low
    };

    LinkAssessment {
        frequency_mhz: freq_mhz,
        aggressor_power_dbm,
        path_loss_db: path_loss,
        total_isolation_db: isolation,
        interference_at_victim_dbm: at_victim,
        victim_sensitivity_dbm,
        margin_db: margin,
        impact,
    }
}

/// Packet error rate step estimate from SNR.
///
/// Recognised modulations are `OQPSK` and `64QAM`; anything else uses a
/// conservative generic curve.
pub fn estimate_per_from_snr(snr_db: f64, modulation: &str) -> f64 {
    let (poor, fair, poor_per, fair_per) = match modulation {
        "OQPSK" => (4.0, 8.0, 0.5, 0.1),
        "64QAM" => (15.0, 20.0, 0.5, 0.1),
        _ => (6.0, 12.0, 0.3, 0.05),
    };
    if snr_db < poor {
        poor_per
    } else if snr_db < fair {
        fair_per
    } else {
        0.01
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_isolation_bounds() {
        for antenna in [0.0, 5.0, 25.0, 60.0, 120.0] {
            for pcb in [0.0, 10.0, 80.0] {
                for shield in [0.0, 15.0, 90.0] {
                    for freq in [100.0, 800.0, 1500.0, 2500.0, 5000.0] {
                        for coupling in [0.0, 0.3, 1.0] {
                            let iso = total_isolation(antenna, pcb, shield, freq, coupling);
                            assert!((0.0..=MAX_ISOLATION_DB).contains(&iso));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_isolation_is_not_additive() {
        // min 20, one extra path: min(5, 6) * 0.7 * 0.5 = 1.75, no freq correction at 1000 MHz
        let iso = total_isolation(25.0, 20.0, 0.0, 1000.0, 0.3);
        assert!((iso - 21.75).abs() < 1e-9);
        assert_eq!(total_isolation(0.0, 0.0, 0.0, 1000.0, 0.3), 0.0);
    }

    #[test]
    fn test_hd_clamps() {
        assert_eq!(hd3_from_iip3(50.0, -20.0, PaClass::C), -70.0);
        assert_eq!(hd3_from_iip3(-40.0, 10.0, PaClass::A), -20.0);
        assert_eq!(hd2_from_iip2(80.0, 0.0, false), -60.0);
        assert_eq!(hd2_from_iip2(-30.0, 20.0, true), -15.0);

        // 23 dBm, IIP3 -10: delta 33, -66 + 0 - 3 = -69
        assert!((hd3_from_iip3(23.0, -10.0, PaClass::Ab) + 69.0).abs() < 1e-9);
        // 23 dBm, IIP2 20: delta 3, -3 + 3 + 3 = 3, clamped to -15
        assert!((hd2_from_iip2(23.0, 20.0, true) + 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_higher_orders_follow_hd2_hd3() {
        let (hd4, hd5) = higher_order_harmonics(-40.0, -50.0, 0.0, 0.0);
        assert!((hd4 + 70.0).abs() < 1e-9);
        assert!((hd5 + 70.0).abs() < 1e-9);

        let (hd4, _) = higher_order_harmonics(-60.0, -70.0, 30.0, 0.0);
        assert!((hd4 - (-90.0f64 + 20.0 * 0.15 * 0.5).max(-85.0)).abs() < 1e-9);
    }

    #[test]
    fn test_harmonic_isolation_adjustment() {
        assert_eq!(harmonic_isolation_adjustment(800.0, 2, AntennaType::Default), -1.0);
        assert_eq!(harmonic_isolation_adjustment(800.0, 3, AntennaType::Patch), -4.0);
        // 1000 * 5 = 5 GHz earns +2
        assert_eq!(harmonic_isolation_adjustment(1000.0, 5, AntennaType::Dipole), -1.0);
        // 2400 * 3 = 7.2 GHz earns +4
        assert_eq!(harmonic_isolation_adjustment(2400.0, 3, AntennaType::Helical), 2.0);
        assert_eq!(harmonic_isolation_adjustment(100.0, 7, AntennaType::Default), -2.0);
    }

    #[test]
    fn test_rx_filter_rejection() {
        assert_eq!(rx_filter_rejection(1575.0, 1575.0, 2.0, 5, FilterType::Butterworth), 0.0);
        assert_eq!(rx_filter_rejection(1575.0, 1575.0, 0.0, 5, FilterType::Saw), 0.0);
        assert_eq!(rx_filter_rejection(-1.0, 1575.0, 2.0, 5, FilterType::Baw), 0.0);
        // Far stopband hits the Butterworth ceiling.
        assert_eq!(rx_filter_rejection(2400.0, 1575.0, 2.0, 5, FilterType::Butterworth), 60.0);
        assert_eq!(rx_filter_rejection(2400.0, 1575.0, 2.0, 5, FilterType::Chebyshev), 70.0);
        // SAW transition: x = 1.25, 5 * 15 * 0.25
        let saw = rx_filter_rejection(1576.25, 1575.0, 2.0, 5, FilterType::Saw);
        assert!((saw - 18.75).abs() < 1e-9);
    }

    #[test]
    fn test_path_loss_and_filter_attenuation() {
        assert_eq!(path_loss_db(0.0, 0.1), 0.0);
        assert_eq!(path_loss_db(1000.0, 0.0), 0.0);
        let fspl = path_loss_db(1000.0, 1.0);
        assert!((fspl - 152.45).abs() < 1e-9);

        assert_eq!(filter_attenuation(1000.0, 1000.0, 20.0, 40.0), 0.0);
        assert!((filter_attenuation(1020.0, 1000.0, 20.0, 40.0) - 20.0).abs() < 1e-9);
        assert_eq!(filter_attenuation(1100.0, 1000.0, 20.0, 40.0), 40.0);
    }

    #[test]
    fn test_imd_from_intercept() {
        assert!((imd_from_intercept(0.0, 10.0, 3) + 20.0).abs() < 1e-9);
        assert!((imd_from_intercept(10.0, 20.0, 2) - 0.0).abs() < 1e-9);
        assert!((imd_from_intercept(10.0, 20.0, 4) + 18.0).abs() < 1e-9);
        assert!((imd_from_intercept(0.0, 0.0, 5) + 40.0).abs() < 1e-9);
        assert!((imd_from_intercept(0.0, 0.0, 7) + 90.0).abs() < 1e-9);
        // Generic order 9: 9p - 8(iip + 30)
        assert!((imd_from_intercept(0.0, 0.0, 9) + 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_harmonic_level_respects_limits() {
        let params = SystemParameters::default();
        for order in 2..=5 {
            let level = harmonic_level(23.0, order, &params, 782.0).unwrap();
            let limit = [-15.0, -25.0, -35.0, -45.0][(order - 2) as usize];
            assert!(level.dbc <= limit);
            assert!(level.at_output_dbm < 23.0);
        }
        assert_eq!(
            harmonic_level(23.0, 6, &params, 782.0),
            Err(PropagationError::UnsupportedHarmonicOrder(6))
        );
    }

    #[test]
    fn test_harmonic_level_chain() {
        let params = SystemParameters::default();
        let level = harmonic_level(23.0, 2, &params, 782.0).unwrap();
        // HD2 -15, filter 40, isolation 21.75 - 1 (1564 MHz) - 1 (pattern), rejection 30
        let base_iso = total_isolation(25.0, 20.0, 0.0, 1564.0, 0.3);
        let expected = 23.0 - 15.0 - 40.0 - (base_iso - 1.0) - 30.0;
        assert!((level.at_output_dbm - expected).abs() < 1e-9);
        assert!((level.dbc - (expected - (23.0 - base_iso))).abs() < 1e-9);
        assert_eq!(level.formula, "2H = a₂V²");
    }

    #[test]
    fn test_imd_level_formulas_and_limits() {
        let params = SystemParameters::default();
        for (ptype, limit) in [
            (ProductType::Im2, -10.0),
            (ProductType::Im3, -15.0),
            (ProductType::Im4, -25.0),
            (ProductType::Im5, -30.0),
            (ProductType::Im7, -35.0),
        ] {
            let level = imd_level(23.0, 18.0, ptype, &params);
            assert!(level.dbc <= limit, "{} above limit", ptype);
        }
        let unknown = imd_level(23.0, 23.0, ProductType::Aclr, &params);
        assert_eq!(unknown.formula, "Unknown ACLR product");
        assert_eq!(unknown.coefficient, "unknown");
    }

    #[test]
    fn test_assess_interference_level() {
        let params = SystemParameters::default();
        // 5 cm at 1575 MHz is about 130.4 dB, so 23 dBm lands near -132.4 dBm.
        let strong = assess_interference_level(1575.0, 23.0, -130.0, &params);
        assert_eq!(strong.impact, QuantRiskLevel::Critical);
        let quiet = assess_interference_level(1575.0, 23.0, -100.0, &params);
        assert_eq!(quiet.impact, QuantRiskLevel::Low);
        let weak = assess_interference_level(1575.0, -40.0, -150.0, &params);
        assert!((weak.margin_db - (-150.0 - weak.interference_at_victim_dbm)).abs() < 1e-9);
    }

    #[test]
    fn test_per_estimates() {
        assert_eq!(estimate_per_from_snr(3.0, "OQPSK"), 0.5);
        assert_eq!(estimate_per_from_snr(9.0, "OQPSK"), 0.01);
        assert_eq!(estimate_per_from_snr(17.0, "64QAM"), 0.1);
        assert_eq!(estimate_per_from_snr(10.0, "16QAM"), 0.05);
    }
}
