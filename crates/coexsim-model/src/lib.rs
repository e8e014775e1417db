//! # coexsim-model
//!
//! YAML configuration loading for coexsim.
//!
//! This crate provides:
//! - The built-in band catalog and catalog files ([`builtin_catalog`], [`load_catalog`])
//! - Layered analysis configuration ([`load_configs`], [`load_configs_from_str`])
//! - Resolution of band selections and system presets ([`AnalysisConfig`])
//!
//! ## Layering
//!
//! Several YAML documents may be supplied. Later documents override earlier
//! ones section by section and key by key:
//! - `analysis`, `desense`, `tolerances`, `monte_carlo` and `risk_rules` merge per key
//! - `bands` replaces the previous selection
//! - `custom_bands` merge by code
//! - `system.preset` replaces, `system.overrides` merge per key

use coexsim_common::{Band, BandCatalog, BandTable, CoexError};
use coexsim_products::{GenerationOptions, RiskRules};
use coexsim_rf::{preset, AnalysisOptions, MonteCarloConfig, SystemParameters, ToleranceParameters};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Built-in band catalog document.
pub const BUILTIN_BANDS_YAML: &str = include_str!("../data/bands.yaml");

/// Preset used when no layer names one.
pub const DEFAULT_PRESET: &str = "default";

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ModelError {
    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Band definition rejected by the catalog.
    #[error("Band error: {0}")]
    BandError(CoexError),

    /// Requested band code is not in the catalog.
    #[error("Unknown band code: {0}")]
    UnknownBand(String),

    /// Requested system preset does not exist.
    #[error("Unknown system preset: {0}")]
    UnknownPreset(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<CoexError> for ModelError {
    fn from(err: CoexError) -> Self {
        match err {
            CoexError::UnknownBand(code) => ModelError::UnknownBand(code),
            other => ModelError::BandError(other),
        }
    }
}

// ============================================================================
// Band Catalog
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogYaml {
    bands: Vec<Band>,
}

/// Parse a band catalog document.
pub fn load_catalog_from_str(yaml_str: &str) -> Result<BandTable, ModelError> {
    let catalog: CatalogYaml = serde_yaml::from_str(yaml_str)?;
    Ok(BandTable::from_bands(catalog.bands)?)
}

/// Load a band catalog file.
pub fn load_catalog(path: &Path) -> Result<BandTable, ModelError> {
    let yaml = std::fs::read_to_string(path)?;
    load_catalog_from_str(&yaml)
}

/// The catalog shipped with the crate.
pub fn builtin_catalog() -> Result<BandTable, ModelError> {
    load_catalog_from_str(BUILTIN_BANDS_YAML)
}

// ============================================================================
// YAML Schema (one layer)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SystemYaml {
    preset: Option<String>,
    overrides: Mapping,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AnalysisConfigYaml {
    name: Option<String>,
    analysis: Mapping,
    bands: Option<Vec<String>>,
    custom_bands: Vec<Band>,
    quantitative: Option<bool>,
    desense: Mapping,
    system: Option<SystemYaml>,
    tolerances: Mapping,
    monte_carlo: Option<Mapping>,
    risk_rules: Mapping,
}

// ============================================================================
// Resolved Configuration
// ============================================================================

/// A fully resolved analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisConfig {
    /// Optional run name.
    pub name: Option<String>,
    /// Requested band codes, in order.
    pub bands: Vec<String>,
    /// Bands defined inline, merged by code.
    pub custom_bands: Vec<Band>,
    /// Product enumeration options.
    pub generation: GenerationOptions,
    /// Heuristic classification tables.
    pub risk_rules: RiskRules,
    /// Preset the system parameters started from.
    pub preset: String,
    /// Resolved front-end parameters.
    pub system: SystemParameters,
    /// Run the power-level analysis.
    pub quantitative: bool,
    /// Options for the power-level analysis.
    pub desense: AnalysisOptions,
    /// Manufacturing and thermal tolerances.
    pub tolerances: ToleranceParameters,
    /// Worst-case sampling, when enabled.
    pub monte_carlo: Option<MonteCarloConfig>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            name: None,
            bands: Vec::new(),
            custom_bands: Vec::new(),
            generation: GenerationOptions::default(),
            risk_rules: RiskRules::default(),
            preset: DEFAULT_PRESET.to_string(),
            system: SystemParameters::default(),
            quantitative: false,
            desense: AnalysisOptions::default(),
            tolerances: ToleranceParameters::default(),
            monte_carlo: None,
        }
    }
}

impl AnalysisConfig {
    /// Resolve the band selection against `catalog`.
    ///
    /// Custom bands shadow catalog entries with the same code. An empty code
    /// list selects the custom bands in declaration order.
    pub fn resolve_bands(&self, catalog: &BandTable) -> Result<Vec<Band>, ModelError> {
        if self.bands.is_empty() {
            return Ok(self.custom_bands.clone());
        }

        let mut table = catalog.clone();
        for band in &self.custom_bands {
            table.upsert(band.clone())?;
        }
        Ok(table.select(&self.bands)?)
    }
}

// ============================================================================
// Loading API
// ============================================================================

/// Load an analysis configuration from one file.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ModelError> {
    load_configs(&[path])
}

/// Parse an analysis configuration from one YAML string.
pub fn load_config_from_str(yaml_str: &str) -> Result<AnalysisConfig, ModelError> {
    load_configs_from_str(&[yaml_str])
}

/// Load and merge several configuration files, later files overriding earlier ones.
pub fn load_configs(paths: &[&Path]) -> Result<AnalysisConfig, ModelError> {
    if paths.is_empty() {
        return Err(ModelError::InvalidConfig("No configuration files provided".to_string()));
    }

    let yaml_strings: Result<Vec<String>, std::io::Error> = paths
        .iter()
        .map(|path| std::fs::read_to_string(path))
        .collect();
    let yaml_strings = yaml_strings?;
    let yaml_strs: Vec<&str> = yaml_strings.iter().map(|s| s.as_str()).collect();

    load_configs_from_str(&yaml_strs)
}

/// Merge several configuration strings, later strings overriding earlier ones.
pub fn load_configs_from_str(yaml_strs: &[&str]) -> Result<AnalysisConfig, ModelError> {
    if yaml_strs.is_empty() {
        return Err(ModelError::InvalidConfig("No configuration strings provided".to_string()));
    }

    let mut name = None;
    let mut bands = Vec::new();
    let mut custom: BTreeMap<String, Band> = BTreeMap::new();
    let mut custom_order: Vec<String> = Vec::new();
    let mut analysis = Mapping::new();
    let mut desense = Mapping::new();
    let mut tolerances = Mapping::new();
    let mut risk_rules = Mapping::new();
    let mut monte_carlo: Option<Mapping> = None;
    let mut quantitative = None;
    let mut system_seen = false;
    let mut preset_name = DEFAULT_PRESET.to_string();
    let mut overrides = Mapping::new();

    for yaml_str in yaml_strs {
        let layer: AnalysisConfigYaml = serde_yaml::from_str(yaml_str)?;

        if layer.name.is_some() {
            name = layer.name;
        }
        if let Some(codes) = layer.bands {
            bands = codes;
        }
        for band in layer.custom_bands {
            if !custom.contains_key(&band.code) {
                custom_order.push(band.code.clone());
            }
            custom.insert(band.code.clone(), band);
        }

        merge_mapping(&mut analysis, layer.analysis);
        merge_mapping(&mut desense, layer.desense);
        merge_mapping(&mut tolerances, layer.tolerances);
        merge_mapping(&mut risk_rules, layer.risk_rules);
        if let Some(section) = layer.monte_carlo {
            merge_mapping(monte_carlo.get_or_insert_with(Mapping::new), section);
        }

        if layer.quantitative.is_some() {
            quantitative = layer.quantitative;
        }
        if let Some(system) = layer.system {
            system_seen = true;
            if let Some(p) = system.preset {
                preset_name = p;
            }
            merge_mapping(&mut overrides, system.overrides);
        }
    }

    let custom_bands = custom_order
        .iter()
        .filter_map(|code| custom.remove(code))
        .collect::<Vec<_>>();
    for band in &custom_bands {
        band.check()?;
    }

    let system = resolve_system(&preset_name, overrides)?;
    let monte_carlo = match monte_carlo {
        Some(mut section) => {
            let enabled = match section.remove("enabled") {
                Some(Value::Bool(flag)) => flag,
                Some(other) => {
                    return Err(ModelError::InvalidConfig(format!(
                        "monte_carlo.enabled must be a boolean, got {:?}",
                        other
                    )))
                }
                None => true,
            };
            let config: MonteCarloConfig = from_mapping(section)?;
            enabled.then_some(config)
        }
        None => None,
    };

    let config = AnalysisConfig {
        name,
        bands,
        custom_bands,
        generation: from_mapping(analysis)?,
        risk_rules: from_mapping(risk_rules)?,
        preset: preset_name,
        system,
        quantitative: quantitative.unwrap_or(system_seen || monte_carlo.is_some()),
        desense: from_mapping(desense)?,
        tolerances: from_mapping(tolerances)?,
        monte_carlo,
    };

    debug!(
        layers = yaml_strs.len(),
        bands = config.bands.len(),
        custom_bands = config.custom_bands.len(),
        preset = %config.preset,
        "configuration loaded"
    );
    Ok(config)
}

/// Start from a named preset and apply per-field overrides.
pub fn resolve_system(preset_name: &str, overrides: Mapping) -> Result<SystemParameters, ModelError> {
    let base = preset(preset_name).ok_or_else(|| ModelError::UnknownPreset(preset_name.to_string()))?;
    if overrides.is_empty() {
        return Ok(base);
    }

    let mut fields = match serde_yaml::to_value(&base)? {
        Value::Mapping(m) => m,
        _ => return Err(ModelError::InvalidConfig("system parameters are not a mapping".to_string())),
    };
    merge_mapping(&mut fields, overrides);
    Ok(serde_yaml::from_value(Value::Mapping(fields))?)
}

fn merge_mapping(target: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        target.insert(key, value);
    }
}

fn from_mapping<T: DeserializeOwned>(mapping: Mapping) -> Result<T, ModelError> {
    Ok(serde_yaml::from_value(Value::Mapping(mapping))?)
}
