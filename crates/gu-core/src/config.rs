//! Engine configuration.
//!
//! Loading configuration from files, environment, or a CLI is explicitly out
//! of scope; this module only defines the recognized fields and the
//! thinnest possible parsing entry point, [`Config::from_toml_str`].

use serde::Deserialize;
use thiserror::Error;

/// Sampling strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Use a fixed sampling probability (`sampling.p`) every phase.
    Fixed,
    /// Derive sampling probability from the Parameter Oracle each phase.
    Adaptive,
}

/// `B_est` source for the Parameter Oracle's sampling/batch-size formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Use only the most recently observed maximum ball size.
    Last,
    /// Use a monotone running maximum across the whole run.
    PeakHold,
}

/// Stall-threshold strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallMode {
    /// Use a fixed threshold (`stall.t_base`) every phase.
    HardThreshold,
    /// Derive the threshold from the expected sparse-degree distribution
    /// under the current phase's sampling probability.
    Dynamic,
}

/// Finisher strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishStrategy {
    /// Gather the residual to rank 0 and run sequential greedy matching.
    /// Only valid when the residual count is at most `S`.
    Gather,
    /// Continue the distributed pipeline at full sampling density until the
    /// residual is empty or the phase budget is exhausted.
    Distributed,
}

/// Sampling-related configuration (`sampling.*`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// `sampling.mode`.
    pub mode: SamplingMode,
    /// `sampling.p`, used only when `mode == Fixed`.
    pub p: f64,
    /// `sampling.safety`, the adaptive safety factor.
    pub safety: f64,
    /// `sampling.estimator`.
    pub estimator: Estimator,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Adaptive,
            p: 0.5,
            safety: 0.5,
            estimator: Estimator::PeakHold,
        }
    }
}

/// Stall-related configuration (`stall.*`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct StallConfig {
    /// `stall.mode`.
    pub mode: StallMode,
    /// `stall.T_base`.
    pub t_base: u64,
}

impl Default for StallConfig {
    fn default() -> Self {
        Self {
            mode: StallMode::Dynamic,
            t_base: 64,
        }
    }
}

/// Memory Guard thresholds.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Soft threshold as a fraction of the memory limit (default `0.75`).
    pub soft_frac: f64,
    /// Hard threshold as a fraction of the memory limit (default `0.90`).
    pub hard_frac: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            soft_frac: 0.75,
            hard_frac: 0.90,
        }
    }
}

/// Finisher configuration (`finish.*`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FinishConfig {
    /// `finish.strategy`.
    pub strategy: FinishStrategy,
    /// `finish.small_threshold_factor`.
    pub small_threshold_factor: f64,
}

impl Default for FinishConfig {
    fn default() -> Self {
        Self {
            strategy: FinishStrategy::Gather,
            small_threshold_factor: 2.0,
        }
    }
}

/// Sampled invariant-check configuration (`checks.*`).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// Fraction of Integrator passes, in `[0, 1]`, that re-verify the
    /// confirmed matching with [`crate::checks::check_matching_is_disjoint`].
    /// `0.0` disables sampled checking entirely.
    pub sample_rate: f64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self { sample_rate: 0.1 }
    }
}

/// Full recognized configuration surface.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory-budget exponent: `S = c_mem * n^alpha`, `0 < alpha < 1`.
    pub alpha: f64,
    /// Memory-budget constant factor.
    pub c_mem: f64,
    /// Optional hard override for `R` (otherwise derived by the oracle).
    pub r_rounds: Option<u32>,
    /// Hard cap on the number of phases before the Finisher takes over.
    pub phase_budget: u64,
    /// Sampling configuration.
    pub sampling: SamplingConfig,
    /// Stalling configuration.
    pub stall: StallConfig,
    /// Memory Guard configuration.
    pub memory: MemoryConfig,
    /// Finisher configuration.
    pub finish: FinishConfig,
    /// Sampled invariant-check configuration.
    pub checks: CheckConfig,
    /// Enables the expensive sampled correctness checks.
    pub test_mode: bool,
    /// Safety divisor `c` used for batch sizing (`|batch| * B_max <= S / c`).
    pub batch_safety_c: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            c_mem: 8.0,
            r_rounds: None,
            phase_budget: 64,
            sampling: SamplingConfig::default(),
            stall: StallConfig::default(),
            memory: MemoryConfig::default(),
            finish: FinishConfig::default(),
            checks: CheckConfig::default(),
            test_mode: false,
            batch_safety_c: 2.0,
        }
    }
}

/// Errors validating or parsing a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `alpha` was outside `(0, 1)`.
    #[error("alpha must satisfy 0 < alpha < 1, got {0}")]
    InvalidAlpha(f64),
    /// `c_mem` was not positive.
    #[error("c_mem must be positive, got {0}")]
    InvalidCMem(f64),
    /// `memory.soft_frac` was not below `memory.hard_frac`.
    #[error("memory.soft_frac ({soft}) must be less than memory.hard_frac ({hard})")]
    InvalidMemoryThresholds {
        /// Configured soft fraction.
        soft: f64,
        /// Configured hard fraction.
        hard: f64,
    },
    /// The TOML document could not be parsed into a [`Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Parses a TOML document into a [`Config`], filling unspecified fields
    /// with defaults. This is the single thin parsing entry point an
    /// external config collaborator calls; it does not locate, merge, or
    /// watch files.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if `raw` is not valid TOML for this
    /// shape.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Config = toml::from_str(raw)?;
        Ok(cfg)
    }

    /// Validates field ranges the rest of the engine assumes hold.
    ///
    /// # Errors
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if !(self.c_mem > 0.0) {
            return Err(ConfigError::InvalidCMem(self.c_mem));
        }
        if !(self.memory.soft_frac < self.memory.hard_frac) {
            return Err(ConfigError::InvalidMemoryThresholds {
                soft: self.memory.soft_frac,
                hard: self.memory.hard_frac,
            });
        }
        Ok(())
    }

    /// Computes the per-machine edge budget `S = c_mem * n^alpha`.
    #[must_use]
    pub fn edge_budget(&self, n: u64) -> usize {
        let s = self.c_mem * (n.max(1) as f64).powf(self.alpha);
        s.ceil().max(1.0) as usize
    }
}
