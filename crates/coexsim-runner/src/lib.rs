//! # coexsim-runner
//!
//! Analysis pipeline and CLI support for coexsim.
//!
//! This crate provides:
//! - The end-to-end analysis run ([`run_analysis`])
//! - The reference demo scenarios ([`demo_scenarios`], [`run_demo`])
//! - Text rendering of reports ([`report`])

pub mod report;

use coexsim_common::{BandCatalog, BandTable, InterferenceCandidate};
use coexsim_model::{AnalysisConfig, ModelError};
use coexsim_products::{calculate_all_products, validate_band_configuration, GenerationOptions, RiskRules};
use coexsim_rf::{analyze_interference, sample_worst, sort_summary, MonteCarloStats, QuantitativeResult, Scenario};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while running an analysis.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Model error.
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// ============================================================================
// Reports
// ============================================================================

/// Monte Carlo outcome for the worst candidate.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloSummary {
    /// Sampled scenario.
    pub scenario: Scenario,
    /// Statistics over all iterations.
    pub stats: MonteCarloStats,
    /// Human-readable report.
    pub report: String,
}

/// Everything produced by one analysis run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    /// Run name from the configuration.
    pub name: Option<String>,
    /// Selected band codes.
    pub bands: Vec<String>,
    /// Band configuration warnings.
    pub warnings: Vec<String>,
    /// Overlap alerts and notes from product generation.
    pub alerts: Vec<String>,
    /// Ranked candidates.
    pub candidates: Vec<InterferenceCandidate>,
    /// Power-level results, worst first.
    pub quantitative: Vec<QuantitativeResult>,
    /// Worst-case sampling, when enabled.
    pub monte_carlo: Option<MonteCarloSummary>,
}

impl AnalysisReport {
    /// Candidates with severity 4 or 5.
    pub fn critical(&self) -> impl Iterator<Item = &InterferenceCandidate> {
        self.candidates.iter().filter(|c| c.severity >= 4)
    }
}

/// Run a resolved configuration against `catalog`.
///
/// An empty band selection yields a report carrying only the validation warning.
pub fn run_analysis(config: &AnalysisConfig, catalog: &BandTable) -> Result<AnalysisReport, RunnerError> {
    let bands = config.resolve_bands(catalog)?;
    let mut report = AnalysisReport {
        name: config.name.clone(),
        bands: bands.iter().map(|b| b.code.clone()).collect(),
        warnings: validate_band_configuration(&bands),
        ..AnalysisReport::default()
    };
    if bands.is_empty() {
        warn!("no bands selected, skipping product generation");
        return Ok(report);
    }

    let set = calculate_all_products(&bands, &config.generation, &config.risk_rules);
    report.alerts = set.alerts;
    report.candidates = set.candidates;

    if config.quantitative {
        let mut results = analyze_interference(&report.candidates, &bands, &config.system, &config.desense);
        sort_summary(&mut results);
        report.quantitative = results;
    }

    if let Some(mc) = &config.monte_carlo {
        report.monte_carlo = sample_worst(&config.system, &config.tolerances, &report.candidates, mc).map(
            |(scenario, stats)| {
                let text = stats.report(&scenario.label());
                MonteCarloSummary { scenario, stats, report: text }
            },
        );
    }

    info!(
        bands = report.bands.len(),
        candidates = report.candidates.len(),
        critical = report.critical().count(),
        quantitative = report.quantitative.len(),
        "analysis complete"
    );
    Ok(report)
}

// ============================================================================
// Demo Scenarios
// ============================================================================

/// A named reference band combination.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoScenario {
    /// Short title.
    pub title: &'static str,
    /// What the scenario demonstrates.
    pub description: &'static str,
    /// Band codes from the built-in catalog.
    pub bands: &'static [&'static str],
    /// Impact label used in the summary.
    pub impact: &'static str,
}

/// The four reference coexistence scenarios.
pub fn demo_scenarios() -> Vec<DemoScenario> {
    vec![
        DemoScenario {
            title: "LTE Band 13 2nd Harmonic → GPS L1 Interference",
            description: "LTE B13 (777-787 MHz) 2nd harmonic interferes with GPS L1 (1575.42 MHz)",
            bands: &["LTE_B13", "GNSS_L1"],
            impact: "GPS Interference",
        },
        DemoScenario {
            title: "LTE Band 4 3rd Harmonic → Wi-Fi 5G Interference",
            description: "LTE B4 (1710-1755 MHz) 3rd harmonic interferes with Wi-Fi 5G (5150-5925 MHz)",
            bands: &["LTE_B4", "WiFi_5G"],
            impact: "Wi-Fi 5G Interference",
        },
        DemoScenario {
            title: "LTE Band 26 3rd Harmonic → Wi-Fi 2.4G/BLE Interference",
            description: "LTE B26 (814-849 MHz) 3rd harmonic interferes with ISM band (2400-2500 MHz)",
            bands: &["LTE_B26", "WiFi_2G", "BLE"],
            impact: "ISM Band Interference",
        },
        DemoScenario {
            title: "Multi-LTE IM3 → BLE Coexistence Critical",
            description: "Multiple LTE bands creating IM3 products hitting BLE (2402-2480 MHz)",
            bands: &["LTE_B13", "LTE_B26", "BLE"],
            impact: "BLE Coexistence",
        },
    ]
}

/// Generation options used by the demo.
pub fn demo_options() -> GenerationOptions {
    GenerationOptions {
        guard_mhz: 1.0,
        imd2: true,
        imd4: false,
        imd5: true,
        imd7: false,
        ..GenerationOptions::default()
    }
}

/// Run every demo scenario with heuristic scoring.
pub fn run_demo(catalog: &BandTable) -> Result<Vec<(DemoScenario, AnalysisReport)>, RunnerError> {
    let options = demo_options();
    let rules = RiskRules::default();

    demo_scenarios()
        .into_iter()
        .map(|scenario| {
            let codes: Vec<String> = scenario.bands.iter().map(|s| s.to_string()).collect();
            let bands = catalog.select(&codes).map_err(ModelError::from)?;
            let set = calculate_all_products(&bands, &options, &rules);
            let report = AnalysisReport {
                name: Some(scenario.title.to_string()),
                bands: codes,
                warnings: validate_band_configuration(&bands),
                alerts: set.alerts,
                candidates: set.candidates,
                ..AnalysisReport::default()
            };
            Ok((scenario, report))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coexsim_common::{Band, ProductType};
    use coexsim_model::{builtin_catalog, load_config_from_str, load_configs_from_str};
    use coexsim_rf::MonteCarloConfig;

    #[test]
    fn test_empty_selection_reports_warning() {
        let config = AnalysisConfig::default();
        let report = run_analysis(&config, &BandTable::new()).unwrap();
        assert_eq!(report.warnings, vec!["No bands selected for analysis".to_string()]);
        assert!(report.candidates.is_empty());
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_unknown_band_is_error() {
        let config = AnalysisConfig { bands: vec!["NOPE".to_string()], ..AnalysisConfig::default() };
        assert!(matches!(
            run_analysis(&config, &BandTable::new()),
            Err(RunnerError::Model(ModelError::UnknownBand(_)))
        ));
    }

    #[test]
    fn test_b13_harmonic_hits_gnss() {
        let catalog = builtin_catalog().unwrap();
        let config = load_config_from_str("bands: [LTE_B13, GNSS_L1]\nanalysis:\n  guard_mhz: 1.0\n").unwrap();
        let report = run_analysis(&config, &catalog).unwrap();

        let hit = report
            .candidates
            .iter()
            .find(|c| c.product_type == ProductType::H2 && c.victim.as_deref() == Some("GNSS_L1"))
            .unwrap();
        assert_eq!(hit.severity, 5);
        assert!(report.quantitative.is_empty());
        assert!(report.monte_carlo.is_none());
    }

    #[test]
    fn test_quantitative_and_monte_carlo() {
        let catalog = builtin_catalog().unwrap();
        let yaml = r#"
bands: [LTE_B13, GNSS_L1]
system:
  preset: mobile_device_poor
monte_carlo:
  iterations: 50
  seed: 3
"#;
        let config = load_config_from_str(yaml).unwrap();
        let report = run_analysis(&config, &catalog).unwrap();

        assert!(!report.quantitative.is_empty());
        assert!(report.quantitative.iter().all(|r| r.victim == "GNSS_L1"));

        let mc = report.monte_carlo.unwrap();
        assert_eq!(mc.stats.num_iterations, 50);
        assert_eq!(mc.scenario.victim_code, "GNSS_L1");
        assert!(mc.report.contains("Iterations: 50"));
    }

    #[test]
    fn test_duty_cycle_lowers_average_desense() {
        let catalog = builtin_catalog().unwrap();
        let base = "bands: [BLE, WiFi_2G]\nsystem:\n  preset: default\n";

        let continuous = run_analysis(&load_config_from_str(base).unwrap(), &catalog).unwrap();
        assert!(!continuous.quantitative.is_empty());
        assert!(continuous
            .quantitative
            .iter()
            .all(|r| r.duty_cycle == 1.0 && r.average_desensitization_db == r.desensitization_db));

        let config = load_configs_from_str(&[base, "desense:\n  duty_cycle: true\n"]).unwrap();
        assert!(config.desense.duty_cycle);
        let averaged = run_analysis(&config, &catalog).unwrap();
        assert_eq!(averaged.quantitative.len(), continuous.quantitative.len());
        assert!(averaged
            .quantitative
            .iter()
            .all(|r| r.duty_cycle < 1.0 && r.average_desensitization_db <= r.desensitization_db));
        assert!(averaged
            .quantitative
            .iter()
            .any(|r| r.average_desensitization_db < r.desensitization_db));
    }

    #[test]
    fn test_monte_carlo_without_candidates() {
        let bands = vec![Band::receive_only("GNSS_L1", (1559.0, 1606.0), "GNSS")];
        let catalog = BandTable::from_bands(bands).unwrap();
        let config = AnalysisConfig {
            bands: vec!["GNSS_L1".to_string()],
            monte_carlo: Some(MonteCarloConfig::new(10)),
            ..AnalysisConfig::default()
        };
        let report = run_analysis(&config, &catalog).unwrap();
        assert!(report.candidates.is_empty());
        assert!(report.monte_carlo.is_none());
    }

    #[test]
    fn test_demo_scenarios() {
        let catalog = builtin_catalog().unwrap();
        let runs = run_demo(&catalog).unwrap();
        assert_eq!(runs.len(), 4);
        for (scenario, report) in &runs {
            assert_eq!(report.bands.len(), scenario.bands.len());
            assert!(!report.candidates.is_empty(), "{} produced nothing", scenario.title);
        }
        assert!(runs[0].1.critical().count() > 0);
    }
}
