//! Pairwise transmitter/receiver screening.
//!
//! A lighter check than the full generator: one transmitting band against one
//! receiving band, reporting product spans and a proximity level instead of
//! scored candidates.

use crate::GenerationOptions;
use coexsim_common::Band;
use serde::{Deserialize, Serialize};

/// True when a product span touches the receive window.
///
/// Either edge inside the window, or the span covering it entirely.
pub fn hits_rx(freq_low: f64, freq_high: f64, rx_low: f64, rx_high: f64) -> bool {
    (rx_low <= freq_low && freq_low <= rx_high)
        || (rx_low <= freq_high && freq_high <= rx_high)
        || (freq_low <= rx_low && freq_high >= rx_high)
}

/// Adjacent-channel leakage risk: the TX upper edge within `margin` of the RX lower edge.
pub fn aclr_check(tx_high: f64, rx_low: f64, margin: f64) -> bool {
    (tx_high - rx_low).abs() <= margin
}

/// Proximity of a product span to a receive window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProximityRisk {
    /// In band or within 1 MHz.
    High,
    /// Within 5 MHz.
    Med,
    /// Within 20 MHz.
    Low,
    /// Further away.
    Minimal,
}

/// Classify how close a span is to a window.
pub fn risk_level(freq_low: f64, freq_high: f64, rx_low: f64, rx_high: f64) -> ProximityRisk {
    let inside = |f: f64| rx_low <= f && f <= rx_high;
    if inside(freq_low) || inside(freq_high) {
        return ProximityRisk::High;
    }

    let distance = [
        (freq_low - rx_low).abs(),
        (freq_low - rx_high).abs(),
        (freq_high - rx_low).abs(),
        (freq_high - rx_high).abs(),
    ]
    .into_iter()
    .fold(f64::INFINITY, f64::min);

    if distance < 1.0 {
        ProximityRisk::High
    } else if distance < 5.0 {
        ProximityRisk::Med
    } else if distance < 20.0 {
        ProximityRisk::Low
    } else {
        ProximityRisk::Minimal
    }
}

/// One screened product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseRow {
    /// Family label, e.g. `3H` or `IM5`.
    pub product: String,
    /// Symbolic formula.
    pub formula: String,
    /// Lower edge of the product span (MHz).
    pub freq_low: f64,
    /// Upper edge of the product span (MHz).
    pub freq_high: f64,
    /// True when the span touches the guarded receive window.
    pub risk: bool,
    /// Proximity level.
    pub level: ProximityRisk,
}

impl PairwiseRow {
    fn span(product: &str, formula: String, low: f64, high: f64, rx: (f64, f64)) -> Self {
        PairwiseRow {
            product: product.to_string(),
            formula,
            freq_low: low,
            freq_high: high,
            risk: hits_rx(low, high, rx.0, rx.1),
            level: risk_level(low, high, rx.0, rx.1),
        }
    }

    fn point(product: &str, formula: &str, freq: f64, rx: (f64, f64)) -> Self {
        PairwiseRow {
            product: product.to_string(),
            formula: formula.to_string(),
            freq_low: freq,
            freq_high: freq,
            risk: rx.0 <= freq && freq <= rx.1,
            level: risk_level(freq, freq, rx.0, rx.1),
        }
    }
}

/// The four crossed edge differences `m·P - n·Q` between windows `X` and `Y`.
fn difference_combos(m: f64, n: f64, x: (f64, f64), y: (f64, f64)) -> [(f64, String); 4] {
    let (mi, ni) = (m as u32, n as u32);
    [
        (m * x.0 - n * y.1, format!("{}·X_low − {}Y_high", mi, coeff(ni))),
        (m * x.1 - n * y.0, format!("{}·X_high − {}Y_low", mi, coeff(ni))),
        (m * y.0 - n * x.1, format!("{}·Y_low − {}X_high", mi, coeff(ni))),
        (m * y.1 - n * x.0, format!("{}·Y_high − {}X_low", mi, coeff(ni))),
    ]
}

fn coeff(n: u32) -> String {
    if n == 1 {
        String::new()
    } else {
        format!("{}·", n)
    }
}

/// Screen one transmitter against one receiver.
///
/// Returns no rows when `tx_band` is receive-only.
pub fn evaluate(tx_band: &Band, rx_band: &Band, options: &GenerationOptions) -> Vec<PairwiseRow> {
    if tx_band.is_receive_only() {
        return Vec::new();
    }
    let rx = rx_band.guarded_rx(options.guard_mhz);
    let mut rows = Vec::new();

    for order in 2..=5u32 {
        let n = order as f64;
        rows.push(PairwiseRow::span(
            &format!("{}H", order),
            format!("{}×Tx({})", order, tx_band.code),
            tx_band.tx_low * n,
            tx_band.tx_high * n,
            rx,
        ));
    }

    if rx_band.has_tx() {
        for f1 in [tx_band.tx_low, tx_band.tx_high] {
            for f2 in [rx_band.tx_low, rx_band.tx_high] {
                if f1 <= 0.0 || f2 <= 0.0 {
                    continue;
                }
                let sum = format!("Tx({}) + Tx({})", tx_band.code, rx_band.code);
                rows.push(PairwiseRow::point("IM2", &sum, f1 + f2, rx));
                let diff = (f1 - f2).abs();
                if diff > 0.0 {
                    let label = format!("|Tx({}) - Tx({})|", tx_band.code, rx_band.code);
                    rows.push(PairwiseRow::point("IM2", &label, diff, rx));
                }
            }
        }
    }

    let x = (tx_band.tx_low, tx_band.tx_high);
    let y = (rx_band.tx_low, rx_band.tx_high);

    for (freq, label) in difference_combos(2.0, 1.0, x, y) {
        rows.push(PairwiseRow::point("IM3", &label, freq, rx));
    }

    if options.imd4 {
        let combos = [
            (2.0 * x.0 + 2.0 * y.1, "2·X_low + 2·Y_high"),
            (2.0 * x.1 + 2.0 * y.0, "2·X_high + 2·Y_low"),
            (2.0 * y.0 + 2.0 * x.1, "2·Y_low + 2·X_high"),
            (2.0 * y.1 + 2.0 * x.0, "2·Y_high + 2·X_low"),
        ];
        for (freq, label) in combos {
            rows.push(PairwiseRow::point("IM4", label, freq, rx));
        }
    }

    if options.imd5 {
        for (freq, label) in difference_combos(3.0, 2.0, x, y) {
            rows.push(PairwiseRow::point("IM5", &label, freq, rx));
        }
    }

    if options.imd7 {
        for (freq, label) in difference_combos(4.0, 3.0, x, y) {
            rows.push(PairwiseRow::point("IM7", &label, freq, rx));
        }
    }

    if options.aclr_margin_mhz > 0.0 {
        let risk = aclr_check(tx_band.tx_high, rx_band.rx_low, options.aclr_margin_mhz);
        rows.push(PairwiseRow {
            product: "ACLR".to_string(),
            formula: "Tx_high vs Rx_low".to_string(),
            freq_low: tx_band.tx_high,
            freq_high: rx_band.rx_low,
            risk,
            level: if risk { ProximityRisk::High } else { ProximityRisk::Low },
        });
    }

    rows
}
