//! Configuration system
//!
//! Pool sizing and auto-shrink parameters, loadable from TOML or RON files
//! through the [`Config`] trait.

pub use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Pick the format from the extension
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot be used
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Sizing for a single pool
///
/// `max_size == 0` means the pool grows without bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Number of resources created up front, and the target of `shrink()`
    pub initial_size: usize,
    /// Hard cap on owned resources; `0` is unbounded
    pub max_size: usize,
}

impl PoolSettings {
    /// Create pool settings
    pub const fn new(initial_size: usize, max_size: usize) -> Self {
        Self { initial_size, max_size }
    }

    /// Clamp `initial_size` so it never exceeds a non-zero `max_size`
    pub const fn normalized(self) -> Self {
        if self.max_size != 0 && self.initial_size > self.max_size {
            Self {
                initial_size: self.max_size,
                max_size: self.max_size,
            }
        } else {
            self
        }
    }
}

/// Auto-shrink timing and slack
///
/// Periods are stored in milliseconds so config files stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoShrinkSettings {
    /// Delay between active-count samples
    pub sample_period_ms: u64,
    /// Delay between shrink cycles
    pub shrink_period_ms: u64,
    /// Extra idle resources kept above the sampled average
    pub buffer: usize,
    /// Upper bound of the random delay before the first cycle
    pub max_start_jitter_ms: u64,
}

impl AutoShrinkSettings {
    /// Default delay between samples
    pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 5_000;
    /// Default delay between shrink cycles
    pub const DEFAULT_SHRINK_PERIOD_MS: u64 = 60_000;
    /// Default start jitter bound
    pub const DEFAULT_MAX_START_JITTER_MS: u64 = 10_000;

    /// Set the sample period
    pub fn with_sample_period(mut self, period: Duration) -> Self {
        self.sample_period_ms = duration_to_ms(period);
        self
    }

    /// Set the shrink period
    pub fn with_shrink_period(mut self, period: Duration) -> Self {
        self.shrink_period_ms = duration_to_ms(period);
        self
    }

    /// Set the idle buffer kept after a shrink
    pub const fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    /// Set the start jitter bound; zero starts sampling immediately
    pub fn with_max_start_jitter(mut self, jitter: Duration) -> Self {
        self.max_start_jitter_ms = duration_to_ms(jitter);
        self
    }

    /// Delay between samples
    pub const fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    /// Delay between shrink cycles
    pub const fn shrink_period(&self) -> Duration {
        Duration::from_millis(self.shrink_period_ms)
    }

    /// Upper bound of the start jitter
    pub const fn max_start_jitter(&self) -> Duration {
        Duration::from_millis(self.max_start_jitter_ms)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_period_ms == 0 {
            return Err(ConfigError::Invalid("auto-shrink sample period must be at least 1 ms".to_string()));
        }
        if self.shrink_period_ms == 0 {
            return Err(ConfigError::Invalid("auto-shrink shrink period must be at least 1 ms".to_string()));
        }
        Ok(())
    }
}

impl Default for AutoShrinkSettings {
    fn default() -> Self {
        Self {
            sample_period_ms: Self::DEFAULT_SAMPLE_PERIOD_MS,
            shrink_period_ms: Self::DEFAULT_SHRINK_PERIOD_MS,
            buffer: 0,
            max_start_jitter_ms: Self::DEFAULT_MAX_START_JITTER_MS,
        }
    }
}

fn duration_to_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Top-level pooling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolingConfig {
    /// Log filter used by binaries that drive the pools
    pub log_level: String,
    /// Sizing applied to pools created without explicit settings
    pub default_pool: PoolSettings,
    /// Shrinker attached to newly created default pools, if any
    pub auto_shrink: Option<AutoShrinkSettings>,
}

impl PoolingConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Invalid(format!("unknown log level '{}'", self.log_level)));
        }
        if let Some(auto_shrink) = &self.auto_shrink {
            auto_shrink.validate()?;
        }
        Ok(())
    }

    /// Parsed log filter, falling back to `Info`
    pub fn log_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

impl Default for PoolingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            default_pool: PoolSettings::default(),
            auto_shrink: None,
        }
    }
}

impl Config for PoolingConfig {}
