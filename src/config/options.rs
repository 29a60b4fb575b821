// src/config/options.rs
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::consts::*;
use crate::error::{Error, Result};

/* ---------------- Extraction ---------------- */

/// Inclusive window of years accepted as date-span anchors.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExtractOptions {
    pub year_min: i32,
    pub year_max: i32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self { year_min: YEAR_MIN, year_max: YEAR_MAX }
    }
}

impl ExtractOptions {
    pub fn accepts_year(&self, year: i32) -> bool {
        (self.year_min..=self.year_max).contains(&year)
    }
}

/* ---------------- Aggregation ---------------- */

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AggregateOptions {
    /// Prices below this (local currency) are scraping noise.
    pub price_floor: f64,
    /// Distinct vantage countries a flight needs to stay in the batch.
    pub min_countries: usize,
    /// Flight spreads below this percentage get no cheapest country.
    pub materiality_pct: f64,
    pub trim_proportion: f64,
    /// Seed for the mode tie-break shuffle.
    pub seed: u64,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            price_floor: PRICE_FLOOR,
            min_countries: MIN_COUNTRIES,
            materiality_pct: MATERIALITY_PCT,
            trim_proportion: TRIM_PROPORTION,
            seed: SHUFFLE_SEED,
        }
    }
}

/* ---------------- Dataset configuration file ---------------- */

/// Per-dataset entry of the configuration file.
#[derive(Clone, Debug, Deserialize)]
pub struct DatasetConfig {
    pub conversion_rate_file: PathBuf,
    pub query_date: String,
}

/// The JSON configuration file:
/// `{"data_configurations": {"<file>": {...}}, "aggregate": {...}, "extract": {...}}`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub data_configurations: HashMap<String, DatasetConfig>,
    #[serde(default)]
    pub aggregate: AggregateOptions,
    #[serde(default)]
    pub extract: ExtractOptions,
    /// Directory relative paths in the file resolve against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        let mut cfg: PipelineConfig = serde_json::from_str(&text)?;
        cfg.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(cfg)
    }

    pub fn dataset(&self, filename: &str) -> Result<&DatasetConfig> {
        self.data_configurations
            .get(filename)
            .ok_or_else(|| Error::config(format!("no data configuration for '{filename}'")))
    }

    /// Load the currency → USD multiplier table for a dataset.
    pub fn load_rates(&self, dataset: &DatasetConfig) -> Result<HashMap<String, f64>> {
        let path = self.resolve(&dataset.conversion_rate_file);
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        let rates: HashMap<String, f64> = serde_json::from_str(&text)?;
        if let Some((code, rate)) = rates.iter().find(|(_, r)| !(r.is_finite() && **r > 0.0)) {
            return Err(Error::config(format!("rate for '{code}' must be positive, got {rate}")));
        }
        Ok(rates)
    }

    pub fn resolve(&self, p: &Path) -> PathBuf {
        if p.is_absolute() { p.to_path_buf() } else { self.base_dir.join(p) }
    }
}

/* ---------------- Export ---------------- */

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ExportFormat {
    #[default]
    Csv,
    Tsv,
}

impl ExportFormat {
    pub fn ext(&self) -> &'static str {
        match self { ExportFormat::Csv => "csv", ExportFormat::Tsv => "tsv" }
    }
    pub fn delim(&self) -> char {
        match self { ExportFormat::Csv => ',', ExportFormat::Tsv => '\t' }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "tsv" => Some(ExportFormat::Tsv),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportOptions {
    pub format: ExportFormat,
    pub include_headers: bool,
    out_path: OutputPath,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Csv,
            include_headers: true,
            out_path: OutputPath::default(),
        }
    }
}

impl ExportOptions {
    pub fn with_stem(stem: &str) -> Self {
        let mut opts = Self::default();
        opts.out_path.file_stem = OsString::from(stem);
        opts
    }

    /// `<dir>/<stem>.<ext>`; the extension always follows the format.
    pub fn out_path(&self) -> PathBuf {
        let stem = self.out_path.file_stem.to_string_lossy();
        self.out_path.dir.join(join!(stem.as_ref(), ".", self.format.ext()))
    }

    /// Parse user text into dir + stem. Ignores a typed extension.
    pub fn set_path(&mut self, text: &str) {
        let p = Path::new(text.trim());
        if let Some(parent) = p.parent() {
            self.out_path.dir = parent.to_path_buf();
        }
        if let Some(stem) = p.file_stem() {
            self.out_path.file_stem = stem.to_os_string();
        }
    }

    pub fn delim(&self) -> char {
        self.format.delim()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct OutputPath {
    dir: PathBuf,
    file_stem: OsString, // without extension
}

impl Default for OutputPath {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_OUT_DIR),
            file_stem: OsString::from(DEFAULT_RAW_FILE),
        }
    }
}
