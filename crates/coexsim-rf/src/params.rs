//! System and tolerance parameters.
//!
//! [`SystemParameters`] is the flat record every quantitative calculation
//! reads from. It is built once, from a preset or from YAML overrides, and
//! copied (never mutated in place) when the Monte Carlo sampler perturbs it.

use serde::{Deserialize, Serialize};

// ============================================================================
// Power Amplifier Class
// ============================================================================

/// Power amplifier bias class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaClass {
    /// Class A: most linear.
    #[serde(rename = "A")]
    A,
    /// Class AB: the usual handset compromise.
    #[default]
    #[serde(rename = "AB")]
    Ab,
    /// Class B.
    #[serde(rename = "B")]
    B,
    /// Class C: least linear.
    #[serde(rename = "C")]
    C,
}

impl PaClass {
    /// HD3 correction applied on top of the IIP3 estimate (dB).
    pub fn hd3_correction(&self) -> f64 {
        match self {
            PaClass::A => 5.0,
            PaClass::Ab => 0.0,
            PaClass::B => -3.0,
            PaClass::C => -8.0,
        }
    }

    /// Class label as written in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaClass::A => "A",
            PaClass::Ab => "AB",
            PaClass::B => "B",
            PaClass::C => "C",
        }
    }
}

// ============================================================================
// System Parameters
// ============================================================================

/// Complete RF front-end description used by the quantitative models.
///
/// Powers are in dBm, isolation and filtering in dB, duty cycles in 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SystemParameters {
    // TX powers
    /// Cellular (LTE/NR) transmit power.
    pub lte_tx_power: f64,
    /// Wi-Fi transmit power.
    pub wifi_tx_power: f64,
    /// BLE transmit power.
    pub ble_tx_power: f64,
    /// Wi-Fi HaLow transmit power.
    pub halow_tx_power: f64,

    // Isolation
    /// Antenna-to-antenna isolation.
    pub antenna_isolation: f64,
    /// PCB trace/ground isolation.
    pub pcb_isolation: f64,
    /// Shield can isolation.
    pub shielding: f64,

    // Filtering
    /// TX harmonic filter attenuation at the second harmonic.
    pub tx_harmonic_filtering: f64,
    /// RX preselector rejection applied to IMD products.
    pub rx_preselector: f64,
    /// Out-of-band rejection of the victim receive chain.
    pub out_of_band_rejection: f64,

    // Technology coupling offsets
    /// Extra LTE to GNSS coupling (negative means worse).
    pub lte_to_gnss_coupling: f64,
    /// Wi-Fi/BLE triplexer isolation.
    pub wifi_ble_isolation: f64,
    /// Cellular/Wi-Fi isolation.
    pub cellular_wifi_isolation: f64,

    // Linearity
    /// Input third-order intercept point (dBm).
    pub iip3: f64,
    /// Input second-order intercept point (dBm).
    pub iip2: f64,
    /// Output third-order intercept point (dBm).
    pub oip3: f64,
    /// 1 dB compression point (dBm).
    pub compression_point: f64,
    /// PA drain efficiency.
    pub pa_efficiency: f64,
    /// PA class.
    pub pa_class: PaClass,
    /// Whether the PA bias point was tuned for even-order suppression.
    pub bias_point_optimized: bool,

    // Receiver sensitivities
    /// Cellular sensitivity.
    pub lte_sensitivity: f64,
    /// Wi-Fi sensitivity.
    pub wifi_sensitivity: f64,
    /// BLE sensitivity.
    pub ble_sensitivity: f64,
    /// GNSS sensitivity.
    pub gnss_sensitivity: f64,
    /// HaLow sensitivity.
    pub halow_sensitivity: f64,

    // Environment
    /// Operating temperature (°C).
    pub temperature: f64,
    /// Receiver noise figure.
    pub noise_figure: f64,
    /// Thermal noise density (dBm/Hz).
    pub thermal_noise_density: f64,

    // Duty cycles
    /// Cellular duty cycle (TDD).
    pub lte_duty_cycle: f64,
    /// Wi-Fi duty cycle.
    pub wifi_duty_cycle: f64,
    /// BLE duty cycle.
    pub ble_duty_cycle: f64,
    /// GNSS duty cycle.
    pub gnss_duty_cycle: f64,
    /// HaLow duty cycle.
    pub halow_duty_cycle: f64,

    /// How strongly isolation paths couple when combined (0..=1).
    pub coupling_factor: f64,

    /// Human-readable configuration name.
    pub configuration_name: String,
    /// Free-form notes.
    pub configuration_notes: String,
}

impl SystemParameters {
    /// Default isolation coupling factor.
    pub const DEFAULT_COUPLING_FACTOR: f64 = 0.3;
    /// Reference temperature for linearity derating (°C).
    pub const REFERENCE_TEMPERATURE_C: f64 = 25.0;
    /// Thermal noise density at room temperature (dBm/Hz).
    pub const DEFAULT_THERMAL_NOISE_DENSITY: f64 = -174.0;

    /// Parameters for a named preset, falling back to `None` for unknown names.
    pub fn preset(name: &str) -> Option<Self> {
        preset(name)
    }
}

impl Default for SystemParameters {
    fn default() -> Self {
        SystemParameters {
            lte_tx_power: 23.0,
            wifi_tx_power: 18.0,
            ble_tx_power: 10.0,
            halow_tx_power: 20.0,
            antenna_isolation: 25.0,
            pcb_isolation: 20.0,
            shielding: 0.0,
            tx_harmonic_filtering: 40.0,
            rx_preselector: 0.0,
            out_of_band_rejection: 60.0,
            lte_to_gnss_coupling: -10.0,
            wifi_ble_isolation: 10.0,
            cellular_wifi_isolation: 15.0,
            iip3: -10.0,
            iip2: 20.0,
            oip3: 10.0,
            compression_point: 5.0,
            pa_efficiency: 0.35,
            pa_class: PaClass::Ab,
            bias_point_optimized: true,
            lte_sensitivity: -105.0,
            wifi_sensitivity: -85.0,
            ble_sensitivity: -95.0,
            gnss_sensitivity: -150.0,
            halow_sensitivity: -90.0,
            temperature: Self::REFERENCE_TEMPERATURE_C,
            noise_figure: 6.0,
            thermal_noise_density: Self::DEFAULT_THERMAL_NOISE_DENSITY,
            lte_duty_cycle: 0.5,
            wifi_duty_cycle: 0.4,
            ble_duty_cycle: 0.05,
            gnss_duty_cycle: 1.0,
            halow_duty_cycle: 0.3,
            coupling_factor: Self::DEFAULT_COUPLING_FACTOR,
            configuration_name: "Default".to_string(),
            configuration_notes: String::new(),
        }
    }
}

// ============================================================================
// Presets
// ============================================================================

/// Names accepted by [`preset`], aliases included.
pub const PRESET_NAMES: [&str; 10] = [
    "default",
    "mobile_device_typical",
    "mobile_device_poor",
    "iot_device_typical",
    "base_station",
    "laboratory_reference",
    "desktop_professional",
    "mobile_device",
    "iot_gateway",
    "automotive",
];

/// Look up a named parameter preset.
pub fn preset(name: &str) -> Option<SystemParameters> {
    let base = SystemParameters::default();
    let params = match name {
        "default" => base,
        "mobile_device_typical" | "mobile_device" => SystemParameters {
            antenna_isolation: 25.0,
            iip3: -12.0,
            iip2: 15.0,
            ..base
        },
        "mobile_device_poor" => SystemParameters {
            antenna_isolation: 20.0,
            wifi_tx_power: 20.0,
            ble_tx_power: 20.0,
            iip3: -15.0,
            iip2: 10.0,
            bias_point_optimized: false,
            lte_sensitivity: -102.0,
            wifi_sensitivity: -82.0,
            ble_sensitivity: -92.0,
            gnss_sensitivity: -147.0,
            ..base
        },
        "iot_device_typical" | "iot_gateway" => SystemParameters {
            antenna_isolation: 20.0,
            lte_tx_power: 20.0,
            wifi_tx_power: 15.0,
            iip3: -18.0,
            iip2: 12.0,
            lte_sensitivity: -108.0,
            wifi_sensitivity: -88.0,
            ble_sensitivity: -98.0,
            gnss_sensitivity: -145.0,
            ..base
        },
        "base_station" => SystemParameters {
            antenna_isolation: 40.0,
            lte_tx_power: 43.0,
            wifi_tx_power: 30.0,
            ble_tx_power: 20.0,
            iip3: -5.0,
            iip2: 25.0,
            lte_sensitivity: -120.0,
            wifi_sensitivity: -95.0,
            ble_sensitivity: -105.0,
            gnss_sensitivity: -155.0,
            ..base
        },
        "laboratory_reference" => SystemParameters {
            antenna_isolation: 50.0,
            lte_tx_power: 20.0,
            wifi_tx_power: 20.0,
            ble_tx_power: 20.0,
            iip3: 0.0,
            iip2: 30.0,
            pa_class: PaClass::A,
            lte_sensitivity: -130.0,
            wifi_sensitivity: -105.0,
            ble_sensitivity: -115.0,
            gnss_sensitivity: -160.0,
            thermal_noise_density: -130.0,
            tx_harmonic_filtering: 60.0,
            ..base
        },
        "desktop_professional" => SystemParameters {
            antenna_isolation: 20.0,
            pcb_isolation: 0.0,
            shielding: 0.0,
            tx_harmonic_filtering: 40.0,
            wifi_tx_power: 20.0,
            ble_tx_power: 20.0,
            iip3: -10.0,
            iip2: 20.0,
            lte_sensitivity: -102.0,
            wifi_sensitivity: -82.0,
            ble_sensitivity: -92.0,
            gnss_sensitivity: -147.0,
            configuration_name: "Desktop Professional".to_string(),
            configuration_notes: "Professional desktop system - HD levels calculated from IIP3/IIP2"
                .to_string(),
            ..base
        },
        "automotive" => SystemParameters {
            lte_tx_power: 27.0,
            iip2: 18.0,
            ..base
        },
        _ => return None,
    };
    Some(params)
}

// ============================================================================
// Tolerances
// ============================================================================

/// Manufacturing and thermal spreads for Monte Carlo sampling (±dB unless noted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToleranceParameters {
    /// TX power spread.
    pub tx_power_tolerance: f64,
    /// IIP3 spread.
    pub iip3_tolerance: f64,
    /// IIP2 spread.
    pub iip2_tolerance: f64,
    /// Isolation degradation spread.
    pub isolation_tolerance: f64,
    /// TX filter degradation spread.
    pub filter_tolerance: f64,
    /// Receiver sensitivity spread.
    pub sensitivity_tolerance: f64,
    /// IIP3 derating per °C away from 25 °C.
    pub temperature_coefficient: f64,
}

impl Default for ToleranceParameters {
    fn default() -> Self {
        ToleranceParameters {
            tx_power_tolerance: 1.0,
            iip3_tolerance: 2.0,
            iip2_tolerance: 3.0,
            isolation_tolerance: 3.0,
            filter_tolerance: 2.0,
            sensitivity_tolerance: 2.0,
            temperature_coefficient: 0.05,
        }
    }
}
