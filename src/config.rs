//! Pipeline configuration.
//!
//! Handles loading, validating, and merging a TOML config file that
//! describes which stages to run and how results are saved. Stock defaults
//! are overridden by whatever the user file specifies.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [resize]
//! filter = "lanczos3"       # nearest | triangle | catmull-rom | gaussian | lanczos3
//! discard_input = false     # drop the unresized input from the result
//! dimensions = []           # unnamed sizes, [[width, height], ...]
//!
//! [resize.sizes]            # named sizes, tagged "size=<name>"
//! sm = [360, 0]             # height 0 = keep aspect ratio
//! md = [640, 0]
//! lg = [960, 0]
//!
//! [compress]
//! jpeg_qualities = [75]     # one JPEG variant per quality
//! compress_original = false
//!
//! [tag]
//! tags = []
//!
//! [output]
//! format = "jpeg"           # jpeg | png
//! quality = 95
//!
//! [processing]
//! max_processes = 4         # Max parallel files (omit for auto = CPU cores)
//!
//! [logging]
//! level = "info"
//! format = "pretty"         # pretty | json
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want. Tables are
//! merged key by key, except the size lists: a file that sets
//! `resize.sizes` or `resize.dimensions` replaces the stock sizes entirely.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{Dimensions, EncodeFormat, Quality, ResampleFilter};
use crate::pipeline::Pipeline;
use crate::stages::{Compression, Compressor, DimensionProvider, Resizer, Tagger};
use crate::tags::Tags;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Full configuration: stages plus CLI-side output settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Resize stage.
    pub resize: ResizeConfig,
    /// Compression stage.
    pub compress: CompressConfig,
    /// Fixed tags for every variant.
    pub tag: TagConfig,
    /// How variants are written to disk.
    pub output: OutputConfig,
    /// Parallelism across input files.
    pub processing: ProcessingConfig,
    pub logging: LoggingConfig,
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resize.sizes.is_empty() && !self.resize.dimensions.is_empty() {
            return Err(ConfigError::Validation(
                "resize.sizes and resize.dimensions are mutually exclusive".into(),
            ));
        }
        for (name, dim) in &self.resize.sizes {
            if name.is_empty() {
                return Err(ConfigError::Validation(
                    "resize.sizes names must not be empty".into(),
                ));
            }
            if *dim == [0, 0] {
                return Err(ConfigError::Validation(format!(
                    "resize.sizes.{name} needs a non-zero width or height"
                )));
            }
        }
        if self.resize.dimensions.iter().any(|d| *d == [0, 0]) {
            return Err(ConfigError::Validation(
                "resize.dimensions entries need a non-zero width or height".into(),
            ));
        }
        if let Some(q) = self
            .compress
            .jpeg_qualities
            .iter()
            .find(|q| !(1..=100).contains(*q))
        {
            return Err(ConfigError::Validation(format!(
                "compress.jpeg_qualities must be 1-100, got {q}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }

    /// Build the stage list: resize, compress, tag. Stages with nothing
    /// configured are left out.
    pub fn build_pipeline(&self) -> Pipeline {
        let mut pipeline = Pipeline::builder();

        if let Some(provider) = self.resize.provider() {
            pipeline = pipeline.then(
                Resizer::new(provider)
                    .filter(self.resize.filter)
                    .discard_input(self.resize.discard_input),
            );
        }

        if !self.compress.jpeg_qualities.is_empty() {
            let compressions = self
                .compress
                .jpeg_qualities
                .iter()
                .map(|q| Compression::jpeg(Quality::new(*q)))
                .collect();
            pipeline = pipeline.then(
                Compressor::many(compressions).compress_original(self.compress.compress_original),
            );
        }

        if !self.tag.tags.is_empty() {
            pipeline = pipeline.then(Tagger::fixed(Tags::new(self.tag.tags.clone())));
        }

        pipeline
    }
}

/// Resize stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Resampling filter.
    pub filter: ResampleFilter,
    /// Drop the unresized input from the stage output.
    pub discard_input: bool,
    /// Named sizes as `[width, height]`; a zero edge keeps the aspect ratio.
    pub sizes: BTreeMap<String, [u32; 2]>,
    /// Unnamed sizes as `[width, height]`.
    pub dimensions: Vec<[u32; 2]>,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            filter: ResampleFilter::default(),
            discard_input: false,
            sizes: BTreeMap::from([
                ("sm".to_string(), [360, 0]),
                ("md".to_string(), [640, 0]),
                ("lg".to_string(), [960, 0]),
            ]),
            dimensions: Vec::new(),
        }
    }
}

impl ResizeConfig {
    /// The configured sizes, or `None` when the resize stage is disabled.
    pub fn provider(&self) -> Option<DimensionProvider> {
        if !self.sizes.is_empty() {
            Some(
                self.sizes
                    .iter()
                    .map(|(name, dim)| (name.clone(), Dimensions::from(*dim)))
                    .collect(),
            )
        } else if !self.dimensions.is_empty() {
            Some(DimensionProvider::List(
                self.dimensions.iter().copied().map(Dimensions::from).collect(),
            ))
        } else {
            None
        }
    }
}

/// Compression stage settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressConfig {
    /// JPEG qualities (1-100); one compressed variant per entry.
    pub jpeg_qualities: Vec<u32>,
    /// Also compress the original instead of keeping it at full fidelity.
    pub compress_original: bool,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            jpeg_qualities: vec![75],
            compress_original: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TagConfig {
    pub tags: Vec<String>,
}

/// File format for saved variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

/// How variants are written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// JPEG quality used when saving (ignored for PNG).
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Jpeg,
            quality: 95,
        }
    }
}

impl OutputConfig {
    pub fn encode_format(&self) -> EncodeFormat {
        match self.format {
            OutputFormat::Jpeg => EncodeFormat::Jpeg(Quality::new(self.quality)),
            OutputFormat::Png => EncodeFormat::Png,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of files processed in parallel.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(PipelineConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Empty the stock size lists in `base` when `overlay` defines its own,
/// so user sizes replace the defaults instead of adding to them.
///
/// The keys are emptied rather than removed: a missing key would be filled
/// back in from `ResizeConfig::default()` on deserialize.
fn clear_overridden_sizes(base: &mut toml::Value, overlay: &toml::Value) {
    let overrides = overlay
        .get("resize")
        .and_then(|r| r.as_table())
        .is_some_and(|r| r.contains_key("sizes") || r.contains_key("dimensions"));
    if !overrides {
        return;
    }
    if let Some(resize) = base.get_mut("resize").and_then(|r| r.as_table_mut()) {
        resize.insert("sizes".into(), toml::Value::Table(toml::map::Map::new()));
        resize.insert("dimensions".into(), toml::Value::Array(Vec::new()));
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    mut base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<PipelineConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => {
            clear_overridden_sizes(&mut base, &ov);
            merge_toml(base, ov)
        }
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result. A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# image-variants configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Resize stage
# ---------------------------------------------------------------------------
[resize]
# Resampling filter: nearest, triangle, catmull-rom, gaussian, lanczos3.
filter = "lanczos3"

# Drop the unresized input from the stage output. When false, the input is
# kept as the first image of every fan-out.
discard_input = false

# Unnamed sizes as [width, height]. Mutually exclusive with [resize.sizes].
dimensions = []

# Named sizes as [width, height]. Each resized variant is tagged
# "size=<name>". A height (or width) of 0 keeps the source aspect ratio.
# Setting this table replaces these defaults entirely.
[resize.sizes]
sm = [360, 0]
md = [640, 0]
lg = [960, 0]

# ---------------------------------------------------------------------------
# Compression stage
# ---------------------------------------------------------------------------
[compress]
# One JPEG-compressed variant per quality (1-100). Empty disables the stage.
jpeg_qualities = [75]

# Also compress the original image. By default it is passed through at full
# fidelity.
compress_original = false

# ---------------------------------------------------------------------------
# Tagging stage
# ---------------------------------------------------------------------------
[tag]
# Tags added to every variant. Empty disables the stage.
tags = []

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# File format for saved variants: jpeg or png.
format = "jpeg"

# JPEG quality used when saving (1-100). Ignored for png.
quality = 95

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum number of input files processed in parallel.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[logging]
# trace, debug, info, warn or error. RUST_LOG overrides this.
level = "info"

# pretty or json. Logs always go to stderr.
format = "pretty"
"##
}
