//! # coexsim-rf
//!
//! Quantitative RF models for coexsim.
//!
//! This crate provides:
//! - Front-end parameter records and presets ([`params`])
//! - Harmonic/IMD level estimation through the isolation chain ([`propagation`])
//! - Noise floor, desensitization and risk tiers ([`desense`])
//! - Per-candidate quantitative analysis ([`analysis`])
//! - Tolerance-driven worst-case sampling ([`montecarlo`])

pub mod analysis;
pub mod desense;
pub mod montecarlo;
pub mod params;
pub mod propagation;

pub use analysis::{analyze_interference, propagate, sort_summary, AnalysisOptions, QuantitativeResult};
pub use desense::{
    aggressor_power, apply_duty_cycle_correction, assess_quantitative_risk, assess_severity_quantitative,
    calculate_desensitization, interference_at_victim, technology_duty_cycle, victim_noise_floor,
    victim_sensitivity, QuantRiskLevel, VictimAnalysis,
};
pub use montecarlo::{sample, sample_worst, MonteCarloConfig, MonteCarloStats, Scenario, WorstCase};
pub use params::{preset, PaClass, SystemParameters, ToleranceParameters, PRESET_NAMES};
pub use propagation::{
    harmonic_level, imd_level, system_harmonic_levels, total_isolation, InterferenceLevel, PropagationError,
};
