//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/hofbauer/hofbauer.toml`
//! 3. Local config: `./hofbauer.toml`, or an explicit `--config` file
//! 4. Environment variables: `HOFBAUER_*` prefix, `__` between sections

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::{Precision, Sampling, TraversalOrder};

/// Chebyshev block approximation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ApproximationConfig {
    /// Chebyshev order `K = N` per block
    pub order: usize,
    /// Coefficient-space DCT passes per block (1 = plain collocation)
    pub refinement_passes: usize,
    /// Compute blocks on the rayon pool
    pub parallel: bool,
    /// Reuse blocks for repeated (operator, source, target) triples
    pub cache_blocks: bool,
}

impl Default for ApproximationConfig {
    fn default() -> Self {
        Self {
            order: 8,
            refinement_passes: 1,
            parallel: true,
            cache_blocks: true,
        }
    }
}

/// Hofbauer tower construction settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TowerConfig {
    pub depth: usize,
    /// Decimal digits kept when comparing domain bounds
    pub precision: u32,
    /// Compare bounds bit for bit, ignoring `precision`
    pub exact_bounds: bool,
    pub traversal: TraversalOrder,
}

impl Default for TowerConfig {
    fn default() -> Self {
        Self {
            depth: 4,
            precision: 12,
            exact_bounds: false,
            traversal: TraversalOrder::Lifo,
        }
    }
}

impl TowerConfig {
    pub fn precision(&self) -> Precision {
        if self.exact_bounds {
            Precision::Exact
        } else {
            Precision::Decimals(self.precision)
        }
    }
}

/// Sample placement inside an Ulam bin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UlamSampling {
    #[default]
    Grid,
    Uniform,
}

/// Ulam baseline settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UlamConfig {
    pub bins: usize,
    /// Sample points per bin
    pub samples: usize,
    pub sampling: UlamSampling,
    pub seed: u64,
}

impl Default for UlamConfig {
    fn default() -> Self {
        Self {
            bins: 64,
            samples: 100,
            sampling: UlamSampling::Grid,
            seed: 42,
        }
    }
}

impl UlamConfig {
    pub fn sampling(&self) -> Sampling {
        match self.sampling {
            UlamSampling::Grid => Sampling::Grid,
            UlamSampling::Uniform => Sampling::Uniform { seed: self.seed },
        }
    }
}

/// Raw sections for intermediate parsing: `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawApproximationConfig {
    pub order: Option<usize>,
    pub refinement_passes: Option<usize>,
    pub parallel: Option<bool>,
    pub cache_blocks: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawTowerConfig {
    pub depth: Option<usize>,
    pub precision: Option<u32>,
    pub exact_bounds: Option<bool>,
    pub traversal: Option<TraversalOrder>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawUlamConfig {
    pub bins: Option<usize>,
    pub samples: Option<usize>,
    pub sampling: Option<UlamSampling>,
    pub seed: Option<u64>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub output_dir: Option<PathBuf>,
    pub approximation: RawApproximationConfig,
    pub tower: RawTowerConfig,
    pub ulam: RawUlamConfig,
}

/// Unified configuration for hofbauer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory for matrix output files given as relative paths
    pub output_dir: PathBuf,
    pub approximation: ApproximationConfig,
    pub tower: TowerConfig,
    pub ulam: UlamConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            approximation: ApproximationConfig::default(),
            tower: TowerConfig::default(),
            ulam: UlamConfig::default(),
        }
    }
}

/// Get the XDG config directory for hofbauer.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "hofbauer").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("hofbauer.toml"))
}

/// Path of the local config file in the working directory.
pub fn local_config_path() -> PathBuf {
    PathBuf::from("hofbauer.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// Expand `~` and `$VAR` in `output_dir`.
    fn expand_paths(&mut self) {
        let raw = self.output_dir.to_string_lossy().to_string();
        match shellexpand::full(&raw) {
            Ok(expanded) => self.output_dir = PathBuf::from(expanded.as_ref()),
            Err(e) => tracing::warn!("cannot expand output_dir {}: {}", raw, e),
        }
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        let a = &overlay.approximation;
        let t = &overlay.tower;
        let u = &overlay.ulam;
        Self {
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            approximation: ApproximationConfig {
                order: a.order.unwrap_or(self.approximation.order),
                refinement_passes: a
                    .refinement_passes
                    .unwrap_or(self.approximation.refinement_passes),
                parallel: a.parallel.unwrap_or(self.approximation.parallel),
                cache_blocks: a.cache_blocks.unwrap_or(self.approximation.cache_blocks),
            },
            tower: TowerConfig {
                depth: t.depth.unwrap_or(self.tower.depth),
                precision: t.precision.unwrap_or(self.tower.precision),
                exact_bounds: t.exact_bounds.unwrap_or(self.tower.exact_bounds),
                traversal: t.traversal.unwrap_or(self.tower.traversal),
            },
            ulam: UlamConfig {
                bins: u.bins.unwrap_or(self.ulam.bins),
                samples: u.samples.unwrap_or(self.ulam.samples),
                sampling: u.sampling.unwrap_or(self.ulam.sampling),
                seed: u.seed.unwrap_or(self.ulam.seed),
            },
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local` - Explicit config file; `./hofbauer.toml` is used when `None`
    ///
    /// An explicit file must exist. The implicit files are optional.
    pub fn load(local: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                let raw = load_raw_settings(&global_path)?;
                current = current.merge_with(&raw);
            }
        }

        match local {
            Some(path) => {
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
            None => {
                let path = local_config_path();
                if path.exists() {
                    let raw = load_raw_settings(&path)?;
                    current = current.merge_with(&raw);
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Load a single file on top of the defaults, ignoring every other layer.
    pub fn from_file(path: &Path) -> Result<Self, ApplicationError> {
        let raw = load_raw_settings(path)?;
        let mut settings = Self::default().merge_with(&raw);
        settings.expand_paths();
        Ok(settings)
    }

    /// Apply HOFBAUER_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("HOFBAUER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Some(val) = get_opt::<usize>(&config, "approximation.order")? {
            settings.approximation.order = val;
        }
        if let Some(val) = get_opt::<usize>(&config, "approximation.refinement_passes")? {
            settings.approximation.refinement_passes = val;
        }
        if let Some(val) = get_opt::<bool>(&config, "approximation.parallel")? {
            settings.approximation.parallel = val;
        }
        if let Some(val) = get_opt::<bool>(&config, "approximation.cache_blocks")? {
            settings.approximation.cache_blocks = val;
        }
        if let Some(val) = get_opt::<usize>(&config, "tower.depth")? {
            settings.tower.depth = val;
        }
        if let Some(val) = get_opt::<u32>(&config, "tower.precision")? {
            settings.tower.precision = val;
        }
        if let Some(val) = get_opt::<bool>(&config, "tower.exact_bounds")? {
            settings.tower.exact_bounds = val;
        }
        if let Some(val) = get_opt::<TraversalOrder>(&config, "tower.traversal")? {
            settings.tower.traversal = val;
        }
        if let Some(val) = get_opt::<usize>(&config, "ulam.bins")? {
            settings.ulam.bins = val;
        }
        if let Some(val) = get_opt::<usize>(&config, "ulam.samples")? {
            settings.ulam.samples = val;
        }
        if let Some(val) = get_opt::<UlamSampling>(&config, "ulam.sampling")? {
            settings.ulam.sampling = val;
        }
        if let Some(val) = get_opt::<u64>(&config, "ulam.seed")? {
            settings.ulam.seed = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# hofbauer configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/hofbauer/hofbauer.toml
#   Local:  ./hofbauer.toml (or --config FILE)
#   Env:    HOFBAUER_* variables, e.g. HOFBAUER_TOWER__DEPTH=6

# Directory for matrix files written with --output
# output_dir = "."

[approximation]
# Chebyshev order per block (K = N)
# order = 8
# Coefficient-space DCT passes per block
# refinement_passes = 1
# parallel = true
# cache_blocks = true

[tower]
# depth = 4
# Decimal digits used to identify equal domains
# precision = 12
# Compare domain bounds bit for bit instead
# exact_bounds = false
# "lifo" or "fifo"
# traversal = "lifo"

[ulam]
# bins = 64
# samples = 100
# "grid" or "uniform"
# sampling = "grid"
# seed = 42
"#
        .to_string()
    }
}

/// A missing key is `None`; a present key that does not parse is an error.
fn get_opt<T: for<'de> Deserialize<'de>>(
    config: &Config,
    key: &str,
) -> Result<Option<T>, ApplicationError> {
    match config.get::<T>(key) {
        Ok(val) => Ok(Some(val)),
        Err(ConfigError::NotFound(_)) => Ok(None),
        Err(e) => Err(ApplicationError::Config {
            message: format!("{key}: {e}"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
