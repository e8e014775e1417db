//! Plain-text rendering of analysis reports.

use crate::{AnalysisReport, DemoScenario};
use coexsim_common::BandTable;
use coexsim_rf::{preset, PRESET_NAMES};
use std::fmt::Write;

/// Rows printed per section before truncating.
pub const MAX_ROWS: usize = 10;

const RULE_WIDTH: usize = 60;

fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

/// Render a full analysis report.
pub fn render_text(report: &AnalysisReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "{}", report.name.as_deref().unwrap_or("Interference analysis"));
    let _ = writeln!(out, "{}", rule());
    let _ = writeln!(out, "Bands: {}", report.bands.join(", "));

    for warning in &report.warnings {
        let _ = writeln!(out, "Warning: {}", warning);
    }
    for alert in &report.alerts {
        let _ = writeln!(out, "{}", alert);
    }
    if report.bands.is_empty() {
        return out;
    }

    render_candidates(&mut out, report);

    if !report.quantitative.is_empty() {
        let _ = writeln!(out, "\nDesensitization summary:");
        for r in report.quantitative.iter().take(MAX_ROWS) {
            let _ = writeln!(
                out,
                "   {} {} @ {:.1} MHz  {} → {}  I={:.1} dBm  desense={:.2} dB ({})",
                r.risk_level.symbol(),
                r.product_type,
                r.frequency_mhz,
                r.aggressors.join(", "),
                r.victim,
                r.interference_at_victim_dbm,
                r.average_desensitization_db,
                r.risk_level,
            );
            let _ = writeln!(out, "      {}", r.severity_reason);
            if r.duty_cycle < 1.0 {
                let _ = writeln!(
                    out,
                    "      duty cycle {:.0}%, continuous desense {:.2} dB",
                    r.duty_cycle * 100.0,
                    r.desensitization_db
                );
            }
        }
    }

    if let Some(mc) = &report.monte_carlo {
        let _ = writeln!(out, "\n{}", mc.report);
    }
    out
}

fn render_candidates(out: &mut String, report: &AnalysisReport) {
    let critical: Vec<_> = report.critical().collect();
    let _ = writeln!(out, "Total products: {}", report.candidates.len());
    let _ = writeln!(out, "Critical/High risks: {}", critical.len());

    if !critical.is_empty() {
        let _ = writeln!(out, "\nCRITICAL INTERFERENCE DETECTED:");
        for c in critical.iter().take(MAX_ROWS) {
            let _ = writeln!(
                out,
                "   {} {} @ {:.1} MHz (Sev: {})",
                c.risk.emoji(),
                c.product_type,
                c.frequency_mhz,
                c.severity
            );
            let _ = writeln!(out, "      Formula: {}", c.formula);
            let _ = writeln!(out, "      {} → {}", c.aggressor_list(), c.victim.as_deref().unwrap_or("-"));
        }
    }

    let range = report
        .candidates
        .iter()
        .map(|c| c.frequency_mhz)
        .fold(None, |acc: Option<(f64, f64)>, f| match acc {
            Some((lo, hi)) => Some((lo.min(f), hi.max(f))),
            None => Some((f, f)),
        });
    if let Some((lo, hi)) = range {
        let _ = writeln!(out, "\nFrequency range: {:.1} - {:.1} MHz", lo, hi);
    }
}

/// Render the demo runs followed by a per-scenario summary.
pub fn render_demo(runs: &[(DemoScenario, AnalysisReport)]) -> String {
    let mut out = String::new();
    for (scenario, report) in runs {
        let _ = writeln!(out, "\n{}", rule());
        let _ = writeln!(out, "{}", scenario.title);
        let _ = writeln!(out, "{}", rule());
        let _ = writeln!(out, "Description: {}", scenario.description);
        let _ = writeln!(out, "Bands: {}", report.bands.join(", "));
        if report.candidates.is_empty() {
            let _ = writeln!(out, "No results generated");
            continue;
        }
        render_candidates(&mut out, report);
    }

    let _ = writeln!(out, "\n{}", rule());
    let _ = writeln!(out, "SUMMARY OF CRITICAL SCENARIOS");
    let _ = writeln!(out, "{}", rule());
    let mut total = 0;
    for (i, (scenario, report)) in runs.iter().enumerate() {
        let count = report.critical().count();
        total += count;
        let _ = writeln!(out, "{}. {}: {} critical products", i + 1, scenario.impact, count);
    }
    let _ = writeln!(out, "\nTOTAL CRITICAL INTERFERENCE PRODUCTS: {}", total);
    out
}

/// List the system presets with their headline values.
pub fn render_presets() -> String {
    let mut out = String::new();
    for name in PRESET_NAMES {
        if let Some(p) = preset(name) {
            let _ = writeln!(
                out,
                "{:<24} LTE {:>5.1} dBm  isolation {:>4.1}/{:>4.1}/{:>4.1} dB  IIP3 {:>5.1} dBm  {}",
                name,
                p.lte_tx_power,
                p.antenna_isolation,
                p.pcb_isolation,
                p.shielding,
                p.iip3,
                p.configuration_name,
            );
        }
    }
    out
}

/// List every band in the catalog.
pub fn render_bands(catalog: &BandTable) -> String {
    let mut out = String::new();
    for band in catalog.iter() {
        let tx = if band.is_receive_only() {
            "RX only".to_string()
        } else {
            format!("TX {:.1}-{:.1}", band.tx_low, band.tx_high)
        };
        let _ = writeln!(
            out,
            "{:<14} {:<18} RX {:.1}-{:.1}  {:<16} {}",
            band.code, tx, band.rx_low, band.rx_high, band.category, band.label
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_demo;
    use coexsim_model::builtin_catalog;

    #[test]
    fn test_render_empty_report() {
        let report = AnalysisReport {
            warnings: vec!["No bands selected for analysis".to_string()],
            ..AnalysisReport::default()
        };
        let text = render_text(&report);
        assert!(text.contains("Warning: No bands selected for analysis"));
        assert!(!text.contains("Total products"));
    }

    #[test]
    fn test_render_demo_summary() {
        let runs = run_demo(&builtin_catalog().unwrap()).unwrap();
        let text = render_demo(&runs);
        assert!(text.contains("SUMMARY OF CRITICAL SCENARIOS"));
        assert!(text.contains("1. GPS Interference:"));
        assert!(text.contains("4. BLE Coexistence:"));
        assert!(text.contains("TOTAL CRITICAL INTERFERENCE PRODUCTS:"));
    }

    #[test]
    fn test_render_presets_and_bands() {
        let presets = render_presets();
        assert_eq!(presets.lines().count(), PRESET_NAMES.len());
        assert!(presets.contains("mobile_device_typical"));

        let catalog = builtin_catalog().unwrap();
        let bands = render_bands(&catalog);
        assert_eq!(bands.lines().count(), catalog.len());
        assert!(bands.lines().any(|l| l.starts_with("GNSS_L1") && l.contains("RX only")));
    }
}
