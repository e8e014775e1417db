//! # coexsim-common
//!
//! Common types shared by the coexsim interference analysis crates.
//!
//! This crate provides core primitives including:
//! - Frequency band definitions ([`Band`], [`BandEdge`])
//! - Band lookup ([`BandCatalog`], [`BandTable`])
//! - Product families ([`ProductType`])
//! - Risk markers ([`RiskSymbol`])
//! - Candidate records ([`InterferenceCandidate`])

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while building or querying band data.
#[derive(Debug, Error, PartialEq)]
pub enum CoexError {
    /// Band code not present in the catalog.
    #[error("Unknown band code: {0}")]
    UnknownBand(String),

    /// Band code defined more than once.
    #[error("Duplicate band code: {0}")]
    DuplicateBand(String),

    /// Band windows violate the catalog invariants.
    #[error("Invalid band {code}: {reason}")]
    InvalidBand {
        /// Offending band code.
        code: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Product type string could not be parsed.
    #[error("Unknown product type: {0}")]
    UnknownProductType(String),
}

// ============================================================================
// Numeric Helpers
// ============================================================================

/// Round a value to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

// ============================================================================
// Band Types
// ============================================================================

/// Which edge of a transmit window a tone was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandEdge {
    /// Lower edge.
    Low,
    /// Upper edge.
    High,
}

impl BandEdge {
    /// Lowercase label used in formulas.
    pub fn as_str(&self) -> &'static str {
        match self {
            BandEdge::Low => "low",
            BandEdge::High => "high",
        }
    }
}

/// A named frequency allocation with separate transmit and receive windows.
///
/// All frequencies are in MHz. A band with `tx_low == tx_high == 0.0` is
/// receive-only (e.g. GNSS) and never acts as an aggressor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Unique band code, e.g. `LTE_B13`.
    pub code: String,
    /// Lower transmit edge (MHz).
    pub tx_low: f64,
    /// Upper transmit edge (MHz).
    pub tx_high: f64,
    /// Lower receive edge (MHz).
    pub rx_low: f64,
    /// Upper receive edge (MHz).
    pub rx_high: f64,
    /// Human-readable label.
    #[serde(default)]
    pub label: String,
    /// Technology category, e.g. `LTE` or `GNSS`.
    #[serde(default)]
    pub category: String,
}

impl Band {
    /// Create a band with an empty label.
    pub fn new(
        code: impl Into<String>,
        tx: (f64, f64),
        rx: (f64, f64),
        category: impl Into<String>,
    ) -> Self {
        Band {
            code: code.into(),
            tx_low: tx.0,
            tx_high: tx.1,
            rx_low: rx.0,
            rx_high: rx.1,
            label: String::new(),
            category: category.into(),
        }
    }

    /// Create a receive-only band (transmit window set to the 0/0 sentinel).
    pub fn receive_only(code: impl Into<String>, rx: (f64, f64), category: impl Into<String>) -> Self {
        Band::new(code, (0.0, 0.0), rx, category)
    }

    /// True when the band uses the receive-only sentinel.
    pub fn is_receive_only(&self) -> bool {
        self.tx_low == 0.0 && self.tx_high == 0.0
    }

    /// True when the band can transmit.
    pub fn has_tx(&self) -> bool {
        !self.is_receive_only()
    }

    /// Transmit edges tagged by side, low first.
    pub fn tx_edges(&self) -> [(BandEdge, f64); 2] {
        [(BandEdge::Low, self.tx_low), (BandEdge::High, self.tx_high)]
    }

    /// Transmit window midpoint.
    pub fn tx_center(&self) -> f64 {
        (self.tx_low + self.tx_high) / 2.0
    }

    /// Receive window expanded by `guard` on both sides.
    pub fn guarded_rx(&self, guard: f64) -> (f64, f64) {
        (self.rx_low - guard, self.rx_high + guard)
    }

    /// Transmit window expanded by `guard` on both sides.
    pub fn guarded_tx(&self, guard: f64) -> (f64, f64) {
        (self.tx_low - guard, self.tx_high + guard)
    }

    /// True when `freq` lies inside the guarded receive window (inclusive).
    pub fn rx_contains(&self, freq: f64, guard: f64) -> bool {
        let (low, high) = self.guarded_rx(guard);
        low <= freq && freq <= high
    }

    /// Check the catalog invariants for this band.
    pub fn check(&self) -> Result<(), CoexError> {
        if !(self.rx_low < self.rx_high) {
            return Err(CoexError::InvalidBand {
                code: self.code.clone(),
                reason: format!("rx_low {} must be below rx_high {}", self.rx_low, self.rx_high),
            });
        }
        if self.has_tx() && !(self.tx_low < self.tx_high) {
            return Err(CoexError::InvalidBand {
                code: self.code.clone(),
                reason: format!("tx_low {} must be below tx_high {}", self.tx_low, self.tx_high),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Band Catalog
// ============================================================================

/// Read-only lookup of band code to band definition.
pub trait BandCatalog {
    /// Look up a band by code.
    fn band(&self, code: &str) -> Option<&Band>;

    /// All codes known to the catalog, in a stable order.
    fn codes(&self) -> Vec<&str>;

    /// Resolve a list of codes into bands, preserving the requested order.
    fn select(&self, codes: &[String]) -> Result<Vec<Band>, CoexError> {
        codes
            .iter()
            .map(|code| {
                self.band(code)
                    .cloned()
                    .ok_or_else(|| CoexError::UnknownBand(code.clone()))
            })
            .collect()
    }
}

/// In-memory band catalog keyed by code.
#[derive(Debug, Clone, Default)]
pub struct BandTable {
    bands: BTreeMap<String, Band>,
}

impl BandTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a list of bands, rejecting duplicates and invalid windows.
    pub fn from_bands(bands: impl IntoIterator<Item = Band>) -> Result<Self, CoexError> {
        let mut table = BandTable::new();
        for band in bands {
            table.insert(band)?;
        }
        Ok(table)
    }

    /// Add a band to the table.
    pub fn insert(&mut self, band: Band) -> Result<(), CoexError> {
        band.check()?;
        if self.bands.contains_key(&band.code) {
            return Err(CoexError::DuplicateBand(band.code));
        }
        self.bands.insert(band.code.clone(), band);
        Ok(())
    }

    /// Add or replace a band.
    pub fn upsert(&mut self, band: Band) -> Result<(), CoexError> {
        band.check()?;
        self.bands.insert(band.code.clone(), band);
        Ok(())
    }

    /// Number of bands in the table.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    /// True when the table has no bands.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Iterate over bands in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        self.bands.values()
    }
}

impl BandCatalog for BandTable {
    fn band(&self, code: &str) -> Option<&Band> {
        self.bands.get(code)
    }

    fn codes(&self) -> Vec<&str> {
        self.bands.keys().map(|s| s.as_str()).collect()
    }
}

// ============================================================================
// Product Types
// ============================================================================

/// Family of a nonlinear product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProductType {
    /// Second harmonic.
    #[serde(rename = "2H")]
    H2,
    /// Third harmonic.
    #[serde(rename = "3H")]
    H3,
    /// Fourth harmonic.
    #[serde(rename = "4H")]
    H4,
    /// Fifth harmonic.
    #[serde(rename = "5H")]
    H5,
    /// Second-order intermodulation (beat terms).
    #[serde(rename = "IM2")]
    Im2,
    /// Third-order intermodulation.
    #[serde(rename = "IM3")]
    Im3,
    /// Fourth-order intermodulation.
    #[serde(rename = "IM4")]
    Im4,
    /// Fifth-order intermodulation.
    #[serde(rename = "IM5")]
    Im5,
    /// Seventh-order intermodulation.
    #[serde(rename = "IM7")]
    Im7,
    /// Adjacent-channel leakage.
    #[serde(rename = "ACLR")]
    Aclr,
}

impl ProductType {
    /// Every product type in canonical order.
    pub const ALL: [ProductType; 10] = [
        ProductType::H2,
        ProductType::H3,
        ProductType::H4,
        ProductType::H5,
        ProductType::Im2,
        ProductType::Im3,
        ProductType::Im4,
        ProductType::Im5,
        ProductType::Im7,
        ProductType::Aclr,
    ];

    /// Short name, e.g. `2H` or `IM3`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::H2 => "2H",
            ProductType::H3 => "3H",
            ProductType::H4 => "4H",
            ProductType::H5 => "5H",
            ProductType::Im2 => "IM2",
            ProductType::Im3 => "IM3",
            ProductType::Im4 => "IM4",
            ProductType::Im5 => "IM5",
            ProductType::Im7 => "IM7",
            ProductType::Aclr => "ACLR",
        }
    }

    /// Harmonic type for a multiplication order, if supported.
    pub fn from_harmonic_order(order: u32) -> Option<Self> {
        match order {
            2 => Some(ProductType::H2),
            3 => Some(ProductType::H3),
            4 => Some(ProductType::H4),
            5 => Some(ProductType::H5),
            _ => None,
        }
    }

    /// Intermodulation type for an exponent sum, if supported.
    pub fn from_intermod_order(order: u32) -> Option<Self> {
        match order {
            2 => Some(ProductType::Im2),
            3 => Some(ProductType::Im3),
            4 => Some(ProductType::Im4),
            5 => Some(ProductType::Im5),
            7 => Some(ProductType::Im7),
            _ => None,
        }
    }

    /// Harmonic multiplication order, for harmonic types.
    pub fn harmonic_order(&self) -> Option<u32> {
        match self {
            ProductType::H2 => Some(2),
            ProductType::H3 => Some(3),
            ProductType::H4 => Some(4),
            ProductType::H5 => Some(5),
            _ => None,
        }
    }

    /// Intermodulation order, for IMD types.
    pub fn intermod_order(&self) -> Option<u32> {
        match self {
            ProductType::Im2 => Some(2),
            ProductType::Im3 => Some(3),
            ProductType::Im4 => Some(4),
            ProductType::Im5 => Some(5),
            ProductType::Im7 => Some(7),
            _ => None,
        }
    }

    /// True for 2H..5H.
    pub fn is_harmonic(&self) -> bool {
        self.harmonic_order().is_some()
    }

    /// True for IM2..IM7.
    pub fn is_intermod(&self) -> bool {
        self.intermod_order().is_some()
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = CoexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ProductType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| CoexError::UnknownProductType(trimmed.to_string()))
    }
}

// ============================================================================
// Risk Markers
// ============================================================================

/// Risk marker attached to a candidate.
///
/// The five graded symbols map one-to-one onto severities; the two legacy
/// markers come from older result sets and are normalized before deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSymbol {
    /// Severity 5.
    Critical,
    /// Severity 4.
    High,
    /// Severity 3.
    Medium,
    /// Severity 2.
    Low,
    /// Severity 1 or no victim.
    Safe,
    /// Pre-severity "at risk" marker (⚠️).
    LegacyWarning,
    /// Pre-severity "clear" marker (✓).
    LegacyPass,
}

impl RiskSymbol {
    /// Symbol for a heuristic or quantitative severity level.
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            s if s >= 5 => RiskSymbol::Critical,
            4 => RiskSymbol::High,
            3 => RiskSymbol::Medium,
            2 => RiskSymbol::Low,
            _ => RiskSymbol::Safe,
        }
    }

    /// Display glyph.
    pub fn emoji(&self) -> &'static str {
        match self {
            RiskSymbol::Critical => "🔴",
            RiskSymbol::High => "🟠",
            RiskSymbol::Medium => "🟡",
            RiskSymbol::Low => "🔵",
            RiskSymbol::Safe => "✅",
            RiskSymbol::LegacyWarning => "⚠️",
            RiskSymbol::LegacyPass => "✓",
        }
    }

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            RiskSymbol::Critical => "Critical",
            RiskSymbol::High => "High",
            RiskSymbol::Medium => "Medium",
            RiskSymbol::Low => "Low",
            RiskSymbol::Safe => "Safe",
            RiskSymbol::LegacyWarning => "Warning",
            RiskSymbol::LegacyPass => "Pass",
        }
    }

    /// Sort rank, most severe first. Legacy markers rank with safe.
    pub fn rank(&self) -> u8 {
        match self {
            RiskSymbol::Critical => 0,
            RiskSymbol::High => 1,
            RiskSymbol::Medium => 2,
            RiskSymbol::Low => 3,
            _ => 4,
        }
    }

    /// True for the two pre-severity markers.
    pub fn is_legacy(&self) -> bool {
        matches!(self, RiskSymbol::LegacyWarning | RiskSymbol::LegacyPass)
    }
}

impl fmt::Display for RiskSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}

// ============================================================================
// Interference Candidates
// ============================================================================

/// One computed product frequency tested against one potential victim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterferenceCandidate {
    /// Product family.
    pub product_type: ProductType,
    /// Descriptive subfamily, e.g. "Fundamental-only".
    pub subtype: String,
    /// Symbolic arithmetic, e.g. `2×LTE_B13_low - LTE_B26_high`.
    pub formula: String,
    /// Product frequency in MHz, rounded to 2 decimals. For ACLR this is the gap.
    pub frequency_mhz: f64,
    /// Aggressor band codes (1 or 2).
    pub aggressors: Vec<String>,
    /// Victim band code when the frequency landed in a guarded RX window.
    pub victim: Option<String>,
    /// Risk marker.
    pub risk: RiskSymbol,
    /// 0 = safe, 1..=5 increasing risk. Non-zero only with a victim.
    pub severity: u8,
    /// Explanatory text.
    pub details: String,
}

impl InterferenceCandidate {
    /// True when a victim receiver was hit.
    pub fn has_victim(&self) -> bool {
        self.victim.as_deref().map_or(false, |v| !v.trim().is_empty())
    }

    /// Aggressor codes joined with `", "`.
    pub fn aggressor_list(&self) -> String {
        self.aggressors.join(", ")
    }
}
