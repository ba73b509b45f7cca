//! Configuration management for wrfcf.
//!
//! The lookup tables driving the postprocessing stages are JSON documents
//! compiled into the crate. They are layered with the following precedence:
//! 1. A user JSON overlay (highest priority)
//! 2. The unit harmonization table, merged under `unit_harmonization_map`
//! 3. The bundled defaults (lowest priority)
//!
//! A loaded [`WrfConfig`] is never mutated; stages receive it by reference.

use clap::Parser;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::dataset::Attributes;
use crate::error::{Result, WrfError};

const DEFAULTS: &str = include_str!("../config/defaults.json");
const UNIT_HARMONIZATION: &str = include_str!("../config/unit_harmonization.json");

/// Canonical unit whose synonyms mark a `units` attribute for removal
pub const INVALID_UNIT: &str = "invalid";

/// Conditional attribute block keys selected by the `HYBRID_OPT` global attribute
pub const HYBRID_OPT_ZERO: &str = "HYBRID_OPT==0";
pub const HYBRID_OPT_NONZERO: &str = "HYBRID_OPT!=0";

static BUILTIN: Lazy<WrfConfig> =
    Lazy::new(|| WrfConfig::defaults().expect("bundled configuration must be valid"));

/// Command-line arguments for wrfcf
#[derive(Parser, Debug)]
#[command(name = "wrfcf")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the raw WRF NetCDF file
    pub netcdf_file: PathBuf,

    /// Path to a JSON file overriding the bundled lookup tables
    #[arg(short, long, env = "WRFCF_CONFIG")]
    pub config: Option<PathBuf>,

    /// Keep the raw `Times` strings instead of decoding a `Time` coordinate
    #[arg(long)]
    pub no_decode_times: bool,

    /// Skip the derived diagnostic fields
    #[arg(long)]
    pub no_diagnostics: bool,

    /// Keep the source fields of the derived diagnostics
    #[arg(long)]
    pub keep_components: bool,

    /// Destagger all staggered data variables after postprocessing
    #[arg(long)]
    pub destagger: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "WRFCF_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

/// The lookup tables used by the postprocessing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrfConfig {
    /// Variable name to CF attribute block
    pub cf_attribute_map: BTreeMap<String, Attributes>,

    /// Condition key (`HYBRID_OPT==0` / `HYBRID_OPT!=0`) to variable attribute blocks
    pub conditional_cf_attribute_map: BTreeMap<String, BTreeMap<String, Attributes>>,

    /// Canonical unit to the raw spellings that should be rewritten to it
    pub unit_harmonization_map: BTreeMap<String, Vec<String>>,

    pub latitude_coords: Vec<String>,
    pub longitude_coords: Vec<String>,
    pub vertical_coords: Vec<String>,

    #[serde(default)]
    pub time_coords: Vec<String>,

    pub horizontal_dims: Vec<String>,

    /// Source variable to the dimension it becomes the coordinate of
    pub assign_coord_to_dim_map: BTreeMap<String, String>,

    /// Old dimension name to new dimension name
    pub rename_dim_map: BTreeMap<String, String>,

    /// Characters stripped from every `units` attribute
    pub brackets_to_clean_from_units: Vec<String>,

    #[serde(skip)]
    raw: Value,
}

impl WrfConfig {
    /// The process-wide bundled configuration
    pub fn builtin() -> &'static WrfConfig {
        &BUILTIN
    }

    /// Parse the bundled defaults
    pub fn defaults() -> Result<Self> {
        Self::from_value(Self::default_value()?)
    }

    /// Load a JSON overlay from a file on top of the bundled defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Apply a JSON overlay on top of the bundled defaults
    pub fn from_json_str(overlay: &str) -> Result<Self> {
        let overlay: Value = serde_json::from_str(overlay)?;
        let mut value = Self::default_value()?;
        merge(&mut value, overlay);
        let config = Self::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    fn default_value() -> Result<Value> {
        let mut value: Value = serde_json::from_str(DEFAULTS)?;
        let units: Value = serde_json::from_str(UNIT_HARMONIZATION)?;
        merge(
            &mut value,
            serde_json::json!({ "unit_harmonization_map": units }),
        );
        Ok(value)
    }

    fn from_value(value: Value) -> Result<Self> {
        let mut config: WrfConfig = serde_json::from_value(value.clone())?;
        config.raw = value;
        Ok(config)
    }

    /// Look up a dot-separated key path, e.g. `cf_attribute_map.T2.standard_name`
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.raw, |node, key| node.as_object()?.get(key))
    }

    /// Invert the harmonization table into raw spelling to canonical unit
    pub fn inverted_unit_map(&self) -> BTreeMap<&str, &str> {
        self.unit_harmonization_map
            .iter()
            .flat_map(|(canonical, synonyms)| {
                synonyms
                    .iter()
                    .map(move |raw| (raw.as_str(), canonical.as_str()))
            })
            .collect()
    }

    /// Attribute blocks for the `HYBRID_OPT` condition
    pub fn conditional_attrs(
        &self,
        hybrid_opt_nonzero: bool,
    ) -> Option<&BTreeMap<String, Attributes>> {
        let key = if hybrid_opt_nonzero {
            HYBRID_OPT_NONZERO
        } else {
            HYBRID_OPT_ZERO
        };
        self.conditional_cf_attribute_map.get(key)
    }

    /// Latitude and longitude coordinate names together
    pub fn lat_lon_coords(&self) -> BTreeSet<&str> {
        self.latitude_coords
            .iter()
            .chain(&self.longitude_coords)
            .map(String::as_str)
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        for key in [HYBRID_OPT_ZERO, HYBRID_OPT_NONZERO] {
            if !self.conditional_cf_attribute_map.contains_key(key) {
                return Err(WrfError::Config {
                    message: format!("conditional_cf_attribute_map is missing {}", key),
                });
            }
        }

        let mut seen: BTreeMap<&str, &str> = BTreeMap::new();
        for (canonical, synonyms) in &self.unit_harmonization_map {
            if canonical.is_empty() {
                return Err(WrfError::Config {
                    message: "Canonical unit names cannot be empty".to_string(),
                });
            }
            for raw in synonyms {
                if let Some(previous) = seen.insert(raw.as_str(), canonical.as_str()) {
                    return Err(WrfError::Config {
                        message: format!(
                            "Unit {:?} is listed under both {} and {}",
                            raw, previous, canonical
                        ),
                    });
                }
            }
        }

        for bracket in &self.brackets_to_clean_from_units {
            if bracket.chars().count() != 1 {
                return Err(WrfError::Config {
                    message: format!(
                        "Invalid bracket: {:?}. Entries must be single characters",
                        bracket
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Validate a log level string
pub fn validate_log_level(level: &str) -> Result<()> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(WrfError::Config {
            message: format!(
                "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                level
            ),
        }),
    }
}

/// Deep-merge `overlay` into `base`; objects merge key by key, anything else replaces
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
