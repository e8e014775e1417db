//! Monte Carlo worst-case sampling.
//!
//! Each iteration draws a perturbed copy of the base [`SystemParameters`]
//! within the configured tolerances, recomputes one interference scenario and
//! records the resulting desensitization.
//!
//! Iteration `i` draws from its own ChaCha stream (`seed`, stream `i`), so
//! statistics do not depend on how iterations are scheduled. With the
//! `parallel` feature the iterations run on the rayon pool.

use crate::desense::{aggressor_power, interference_at_victim};
use crate::params::{SystemParameters, ToleranceParameters};
use crate::propagation::{harmonic_level, imd_level};
use coexsim_common::{InterferenceCandidate, ProductType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// ============================================================================
// Configuration
// ============================================================================

/// Sampling options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonteCarloConfig {
    /// Number of iterations.
    pub iterations: usize,
    /// Operating temperature range (°C), sampled uniformly.
    pub temperature_range: (f64, f64),
    /// Base seed.
    pub seed: u64,
}

impl MonteCarloConfig {
    /// Default iteration count.
    pub const DEFAULT_ITERATIONS: usize = 1000;
    /// Default temperature range (°C).
    pub const DEFAULT_TEMPERATURE_RANGE: (f64, f64) = (-40.0, 85.0);
    /// Default seed.
    pub const DEFAULT_SEED: u64 = 42;

    /// Options with `iterations` and the default range and seed.
    pub fn new(iterations: usize) -> Self {
        MonteCarloConfig { iterations, ..Self::default() }
    }
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            iterations: Self::DEFAULT_ITERATIONS,
            temperature_range: Self::DEFAULT_TEMPERATURE_RANGE,
            seed: Self::DEFAULT_SEED,
        }
    }
}

/// The aggressor/victim/product tuple being sampled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Transmitting band code.
    pub aggressor_code: String,
    /// Receiving band code.
    pub victim_code: String,
    /// Product family.
    pub product_type: ProductType,
    /// Product frequency (MHz).
    pub frequency_mhz: f64,
}

impl Default for Scenario {
    fn default() -> Self {
        Scenario {
            aggressor_code: "LTE_B1".to_string(),
            victim_code: "GENERIC".to_string(),
            product_type: ProductType::Im3,
            frequency_mhz: 1000.0,
        }
    }
}

impl Scenario {
    /// Scenario for one candidate. Missing aggressor or victim fall back to
    /// `LTE_B1` and `GNSS_L1`.
    pub fn from_candidate(candidate: &InterferenceCandidate) -> Self {
        Scenario {
            aggressor_code: candidate.aggressors.first().cloned().unwrap_or_else(|| "LTE_B1".to_string()),
            victim_code: candidate
                .victim
                .clone()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "GNSS_L1".to_string()),
            product_type: candidate.product_type,
            frequency_mhz: candidate.frequency_mhz,
        }
    }

    /// Short label for reports.
    pub fn label(&self) -> String {
        format!(
            "{} {} → {} @ {:.1} MHz",
            self.product_type, self.aggressor_code, self.victim_code, self.frequency_mhz
        )
    }
}

// ============================================================================
// Results
// ============================================================================

/// Parameter deltas of the worst iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstCase {
    /// Cellular TX power minus nominal (dB).
    pub tx_power_offset: f64,
    /// IIP3 minus nominal (dB).
    pub iip3_offset: f64,
    /// Nominal antenna isolation minus sampled (dB).
    pub isolation_degradation: f64,
    /// Sampled temperature (°C).
    pub temperature_c: f64,
    /// Shift applied to every receiver sensitivity (dB).
    pub sensitivity_offset: f64,
    /// Desensitization reached (dB).
    pub desensitization_db: f64,
}

/// Distribution of desensitization over all iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloStats {
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
    /// 99th percentile (maximum below 100 iterations).
    pub p99: f64,
    /// Mean.
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Worst iteration.
    pub worst_case: WorstCase,
    /// Iterations run.
    pub num_iterations: usize,
}

impl MonteCarloStats {
    fn from_outcomes(outcomes: Vec<WorstCase>) -> Option<Self> {
        let mut worst: Option<WorstCase> = None;
        let mut values = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            values.push(outcome.desensitization_db);
            if worst.as_ref().map_or(true, |w| outcome.desensitization_db > w.desensitization_db) {
                worst = Some(outcome);
            }
        }
        let worst_case = worst?;

        values.sort_by(f64::total_cmp);
        let n = values.len();
        let at = |q: f64| values[((q * n as f64) as usize).min(n - 1)];
        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;

        Some(MonteCarloStats {
            p50: at(0.50),
            p95: at(0.95),
            p99: if n >= 100 { at(0.99) } else { values[n - 1] },
            mean,
            std_dev: variance.sqrt(),
            min: values[0],
            max: values[n - 1],
            worst_case,
            num_iterations: n,
        })
    }

    /// Plain-text summary.
    pub fn report(&self, scenario_name: &str) -> String {
        let wc = &self.worst_case;
        [
            "=== Monte Carlo Analysis Report ===".to_string(),
            format!("Scenario: {}", scenario_name),
            format!("Iterations: {}", self.num_iterations),
            String::new(),
            "Desensitization Distribution:".to_string(),
            format!("  Median (P50):  {:.2} dB", self.p50),
            format!("  P95:           {:.2} dB", self.p95),
            format!("  P99:           {:.2} dB", self.p99),
            format!("  Mean:          {:.2} dB", self.mean),
            format!("  Std Dev:       {:.2} dB", self.std_dev),
            format!("  Range:         {:.2} to {:.2} dB", self.min, self.max),
            String::new(),
            "Worst-Case Conditions:".to_string(),
            format!("  TX Power Offset:      {:+.2} dB", wc.tx_power_offset),
            format!("  IIP3 Offset:          {:+.2} dB", wc.iip3_offset),
            format!("  Isolation Degradation: {:.2} dB", wc.isolation_degradation),
            format!("  Temperature:           {:.1} C", wc.temperature_c),
            format!("  Resulting Desense:     {:.2} dB", wc.desensitization_db),
        ]
        .join("\n")
    }
}

// ============================================================================
// Sampling
// ============================================================================

/// Zero-mean Gaussian draw. A non-finite spread yields 0.
pub fn sample_gaussian<R: Rng>(rng: &mut R, std_dev: f64) -> f64 {
    match Normal::new(0.0, std_dev.abs()) {
        Ok(normal) => normal.sample(rng),
        Err(_) => 0.0,
    }
}

/// A perturbed copy of `base` and the temperature it was derated for.
///
/// Isolation and TX filtering only ever degrade. One sensitivity draw shifts
/// all receivers together.
pub fn perturb<R: Rng>(
    base: &SystemParameters,
    tolerances: &ToleranceParameters,
    temperature_range: (f64, f64),
    rng: &mut R,
) -> (SystemParameters, f64) {
    let mut p = base.clone();

    let tx_sd = tolerances.tx_power_tolerance / 2.0;
    p.lte_tx_power += sample_gaussian(rng, tx_sd);
    p.wifi_tx_power += sample_gaussian(rng, tx_sd);
    p.ble_tx_power += sample_gaussian(rng, tx_sd);
    p.iip3 += sample_gaussian(rng, tolerances.iip3_tolerance / 2.0);
    p.iip2 += sample_gaussian(rng, tolerances.iip2_tolerance / 2.0);

    let iso = sample_gaussian(rng, tolerances.isolation_tolerance / 2.0).abs();
    p.antenna_isolation -= iso;
    p.pcb_isolation -= iso * 0.5;
    p.shielding -= iso * 0.3;

    p.tx_harmonic_filtering -= sample_gaussian(rng, tolerances.filter_tolerance / 2.0).abs();
    p.coupling_factor = (p.coupling_factor + sample_gaussian(rng, 0.05)).clamp(0.0, 1.0);

    let (lo, hi) = if temperature_range.0 <= temperature_range.1 {
        temperature_range
    } else {
        (temperature_range.1, temperature_range.0)
    };
    let temperature = rng.gen_range(lo..=hi);
    p.iip3 -= (temperature - SystemParameters::REFERENCE_TEMPERATURE_C) * tolerances.temperature_coefficient;
    p.temperature = temperature;

    let sensitivity = sample_gaussian(rng, tolerances.sensitivity_tolerance / 2.0);
    p.lte_sensitivity += sensitivity;
    p.wifi_sensitivity += sensitivity;
    p.ble_sensitivity += sensitivity;
    p.gnss_sensitivity += sensitivity;
    p.halow_sensitivity += sensitivity;

    (p, temperature)
}

/// Desensitization for `scenario` under `params`.
///
/// Propagation failures fall back to the aggressor power minus 50 dB.
pub fn scenario_desense(scenario: &Scenario, params: &SystemParameters) -> f64 {
    let tx_power = aggressor_power(&scenario.aggressor_code, params);

    let level = match scenario.product_type.harmonic_order() {
        Some(order) => {
            let fundamental = scenario.frequency_mhz / order as f64;
            harmonic_level(tx_power, order, params, fundamental).map(|l| l.at_output_dbm)
        }
        None => Ok(imd_level(tx_power, tx_power, scenario.product_type, params).at_output_dbm),
    };
    let at_output = level.unwrap_or(tx_power - 50.0);

    interference_at_victim(at_output, &scenario.victim_code, params).desensitization_db
}

fn run_iteration(
    index: usize,
    base: &SystemParameters,
    tolerances: &ToleranceParameters,
    scenario: &Scenario,
    config: &MonteCarloConfig,
) -> WorstCase {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    rng.set_stream(index as u64);

    let (varied, temperature) = perturb(base, tolerances, config.temperature_range, &mut rng);
    let desense = scenario_desense(scenario, &varied);

    WorstCase {
        tx_power_offset: varied.lte_tx_power - base.lte_tx_power,
        iip3_offset: varied.iip3 - base.iip3,
        isolation_degradation: base.antenna_isolation - varied.antenna_isolation,
        temperature_c: temperature,
        sensitivity_offset: varied.gnss_sensitivity - base.gnss_sensitivity,
        desensitization_db: desense,
    }
}

/// Run the sampler. Returns `None` when no iterations are requested.
pub fn sample(
    base: &SystemParameters,
    tolerances: &ToleranceParameters,
    scenario: &Scenario,
    config: &MonteCarloConfig,
) -> Option<MonteCarloStats> {
    info!(iterations = config.iterations, scenario = %scenario.label(), "starting Monte Carlo");

    #[cfg(feature = "parallel")]
    let outcomes: Vec<WorstCase> = (0..config.iterations)
        .into_par_iter()
        .map(|i| run_iteration(i, base, tolerances, scenario, config))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<WorstCase> = (0..config.iterations)
        .map(|i| run_iteration(i, base, tolerances, scenario, config))
        .collect();

    let stats = MonteCarloStats::from_outcomes(outcomes)?;
    debug!(
        p50 = stats.p50,
        p95 = stats.p95,
        max = stats.max,
        worst_temperature = stats.worst_case.temperature_c,
        "Monte Carlo complete"
    );
    Some(stats)
}

/// Candidate with the most severe risk symbol, first one on ties.
pub fn worst_candidate(candidates: &[InterferenceCandidate]) -> Option<&InterferenceCandidate> {
    let mut worst: Option<&InterferenceCandidate> = None;
    for candidate in candidates {
        if worst.map_or(true, |w| candidate.risk.rank() < w.risk.rank()) {
            worst = Some(candidate);
        }
    }
    worst
}

/// Sample the worst candidate of a result list.
pub fn sample_worst(
    base: &SystemParameters,
    tolerances: &ToleranceParameters,
    candidates: &[InterferenceCandidate],
    config: &MonteCarloConfig,
) -> Option<(Scenario, MonteCarloStats)> {
    let scenario = Scenario::from_candidate(worst_candidate(candidates)?);
    let stats = sample(base, tolerances, &scenario, config)?;
    Some((scenario, stats))
}
