//! TOML Configuration File Support
//!
//! Configuration for the interaction broker, read from
//! `~/.config/interaction/interaction.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [broker]
//! ask_timeout_ms = 30000
//! max_queue_depth = 256
//! max_widgets = 32
//! optimistic_hide = true
//! tick_interval_ms = 100
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Broker settings used at runtime
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrokerConfig {
    /// How long an async ask waits for an answer (0 = forever)
    pub ask_timeout_ms: u64,
    /// Maximum queued dialogs (0 = unlimited)
    pub max_queue_depth: usize,
    /// Maximum widgets per dialog (0 = unlimited)
    pub max_widgets: usize,
    /// Treat a delivered hide request as done without waiting for the interface
    pub optimistic_hide: bool,
    /// Interval between manage ticks for the driving control loop
    pub tick_interval_ms: u64,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            ask_timeout_ms: 0,
            max_queue_depth: 0,
            max_widgets: 64,
            optimistic_hide: true,
            tick_interval_ms: 100,
        }
    }
}

impl BrokerConfig {
    /// Ask timeout, `None` when asks wait forever
    #[must_use]
    pub fn ask_timeout(&self) -> Option<Duration> {
        (self.ask_timeout_ms > 0).then(|| Duration::from_millis(self.ask_timeout_ms))
    }

    /// Interval between manage ticks
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Check the values make sense together
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for a zero tick interval.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Broker section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerToml {
    /// Ask timeout in milliseconds (0 = wait forever)
    pub ask_timeout_ms: Option<u64>,

    /// Maximum queued dialogs (0 = unlimited)
    pub max_queue_depth: Option<usize>,

    /// Maximum widgets per dialog (0 = unlimited)
    pub max_widgets: Option<usize>,

    /// Whether hide requests complete without acknowledgement
    pub optimistic_hide: Option<bool>,

    /// Manage tick interval in milliseconds
    pub tick_interval_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionToml {
    /// Broker configuration section
    pub broker: BrokerToml,
}

/// Loaded configuration together with where it came from
#[derive(Clone, Debug)]
pub struct InteractionConfigFile {
    /// Broker settings
    pub broker: BrokerConfig,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    source: ConfigSource,
}

impl Default for InteractionConfigFile {
    fn default() -> Self {
        Self {
            broker: BrokerConfig::default(),
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl InteractionConfigFile {
    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/interaction/interaction.toml` or
/// `~/.config/interaction/interaction.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("interaction").join("interaction.toml"))
}

/// Load configuration from the default path, then the environment
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
/// A missing config file is not an error (defaults are used).
pub fn load_config() -> Result<InteractionConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path, then the environment
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed,
/// or if the resulting values do not validate.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<InteractionConfigFile, ConfigError> {
    let mut config = InteractionConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: InteractionToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, |key| std::env::var(key).ok());
    config.broker.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut InteractionConfigFile, toml: &InteractionToml) {
    let broker = &toml.broker;
    if let Some(timeout) = broker.ask_timeout_ms {
        config.broker.ask_timeout_ms = timeout;
    }
    if let Some(depth) = broker.max_queue_depth {
        config.broker.max_queue_depth = depth;
    }
    if let Some(widgets) = broker.max_widgets {
        config.broker.max_widgets = widgets;
    }
    if let Some(optimistic) = broker.optimistic_hide {
        config.broker.optimistic_hide = optimistic;
    }
    if let Some(interval) = broker.tick_interval_ms {
        config.broker.tick_interval_ms = interval;
    }
}

/// Apply environment variable overrides to the config
///
/// `lookup` maps a variable name to its value.
fn apply_env_config<F>(config: &mut InteractionConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ms) = lookup("INTERACTION_ASK_TIMEOUT_MS").and_then(|v| v.parse().ok()) {
        config.broker.ask_timeout_ms = ms;
        config.source = ConfigSource::Env;
    }
    if let Some(depth) = lookup("INTERACTION_MAX_QUEUE_DEPTH").and_then(|v| v.parse().ok()) {
        config.broker.max_queue_depth = depth;
        config.source = ConfigSource::Env;
    }
    if let Some(widgets) = lookup("INTERACTION_MAX_WIDGETS").and_then(|v| v.parse().ok()) {
        config.broker.max_widgets = widgets;
        config.source = ConfigSource::Env;
    }
    if let Some(value) = lookup("INTERACTION_OPTIMISTIC_HIDE") {
        config.broker.optimistic_hide = value != "0" && value.to_lowercase() != "false";
        config.source = ConfigSource::Env;
    }
    if let Some(ms) = lookup("INTERACTION_TICK_MS").and_then(|v| v.parse().ok()) {
        config.broker.tick_interval_ms = ms;
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Tick interval override (milliseconds)
    pub tick_interval_ms: Option<u64>,

    /// Ask timeout override (milliseconds)
    pub ask_timeout_ms: Option<u64>,

    /// Optimistic hide override
    pub optimistic_hide: Option<bool>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set tick interval override
    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = Some(ms);
        self
    }

    /// Set ask timeout override
    #[must_use]
    pub fn with_ask_timeout_ms(mut self, ms: u64) -> Self {
        self.ask_timeout_ms = Some(ms);
        self
    }

    /// Set optimistic hide override
    #[must_use]
    pub fn with_optimistic_hide(mut self, optimistic: bool) -> Self {
        self.optimistic_hide = Some(optimistic);
        self
    }

    /// Whether any override is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tick_interval_ms.is_none()
            && self.ask_timeout_ms.is_none()
            && self.optimistic_hide.is_none()
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the overridden values do not validate.
    pub fn apply(&self, config: &mut InteractionConfigFile) -> Result<(), ConfigError> {
        if let Some(ms) = self.tick_interval_ms {
            config.broker.tick_interval_ms = ms;
        }
        if let Some(ms) = self.ask_timeout_ms {
            config.broker.ask_timeout_ms = ms;
        }
        if let Some(optimistic) = self.optimistic_hide {
            config.broker.optimistic_hide = optimistic;
        }
        if !self.is_empty() {
            config.source = ConfigSource::Cli;
        }
        config.broker.validate()
    }
}
