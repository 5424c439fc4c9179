//! Configuration management for nutriscan
//!
//! Config stored at: ~/.config/nutriscan/config.json

use nutriscan_domain::service::NormalizerConfig;
use nutriscan_health::GeneratorConfig;
use nutriscan_infra::DEFAULT_LOOKUP_BASE_URL;
use nutriscan_types::{
    ConfigError, OutputFormat, Result, DEFAULT_MIN_BARCODE_DIGITS, DEFAULT_SALT_TO_SODIUM_FACTOR,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const KNOWN_BACKENDS: &[&str] = &["gemini", "none"];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Text-generation backend (gemini, none)
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Model name override (optional)
    #[serde(default)]
    pub model: Option<String>,

    /// Environment variable holding the backend API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_lookup_base_url")]
    pub lookup_base_url: String,

    #[serde(default = "default_timeout_secs")]
    pub lookup_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Shortest digit string accepted as a barcode
    #[serde(default = "default_min_barcode_digits")]
    pub min_barcode_digits: usize,

    /// Sodium (g) per gram of salt, used when sodium is not reported
    #[serde(default = "default_salt_to_sodium_factor")]
    pub salt_to_sodium_factor: f64,

    /// Default output format (json, table)
    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_backend() -> String {
    "gemini".to_string()
}

fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}

fn default_lookup_base_url() -> String {
    DEFAULT_LOOKUP_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_min_barcode_digits() -> usize {
    DEFAULT_MIN_BARCODE_DIGITS
}

fn default_salt_to_sodium_factor() -> f64 {
    DEFAULT_SALT_TO_SODIUM_FACTOR
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            model: None,
            api_key_env: default_api_key_env(),
            lookup_base_url: default_lookup_base_url(),
            lookup_timeout_secs: default_timeout_secs(),
            generation_timeout_secs: default_timeout_secs(),
            min_barcode_digits: default_min_barcode_digits(),
            salt_to_sodium_factor: default_salt_to_sodium_factor(),
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or(ConfigError::NotFound)?
            .join("nutriscan");
        Ok(config_dir)
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load config from the default location, or defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if !KNOWN_BACKENDS.contains(&self.backend.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "backend must be one of {}, got {:?}",
                KNOWN_BACKENDS.join(", "),
                self.backend
            )));
        }
        if self.min_barcode_digits == 0 {
            return Err(ConfigError::InvalidValue(
                "min_barcode_digits must be at least 1".to_string(),
            ));
        }
        if !self.salt_to_sodium_factor.is_finite() || self.salt_to_sodium_factor <= 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "salt_to_sodium_factor must be positive, got {}",
                self.salt_to_sodium_factor
            )));
        }
        Ok(())
    }

    pub fn set_backend(&mut self, backend: &str) -> std::result::Result<(), ConfigError> {
        let backend = backend.trim().to_lowercase();
        if !KNOWN_BACKENDS.contains(&backend.as_str()) {
            return Err(ConfigError::InvalidValue(format!(
                "unknown backend {:?} (expected {})",
                backend,
                KNOWN_BACKENDS.join(", ")
            )));
        }
        self.backend = backend;
        Ok(())
    }

    /// API key from the configured environment variable, if set
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    pub fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::default()
            .with_backend(&self.backend)
            .with_model(self.model.clone())
            .with_api_key(self.api_key())
            .with_timeout_secs(self.generation_timeout_secs)
    }

    pub fn normalizer_config(&self) -> NormalizerConfig {
        NormalizerConfig {
            salt_to_sodium_factor: self.salt_to_sodium_factor,
        }
    }
}

impl std::fmt::Display for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Nutriscan Configuration")?;
        writeln!(f, "=======================")?;
        writeln!(f)?;
        writeln!(f, "Backend:            {}", self.backend)?;
        writeln!(
            f,
            "Model:              {}",
            self.model.as_deref().unwrap_or("(default)")
        )?;
        writeln!(
            f,
            "API key env:        {} ({})",
            self.api_key_env,
            if self.api_key().is_some() { "set" } else { "not set" }
        )?;
        writeln!(f, "Lookup URL:         {}", self.lookup_base_url)?;
        writeln!(f, "Lookup timeout:     {}s", self.lookup_timeout_secs)?;
        writeln!(f, "Generation timeout: {}s", self.generation_timeout_secs)?;
        writeln!(f, "Min barcode digits: {}", self.min_barcode_digits)?;
        writeln!(f, "Salt to sodium:     {}", self.salt_to_sodium_factor)?;
        writeln!(f, "Output format:      {}", self.output_format)?;

        if let Ok(path) = Self::config_path() {
            writeln!(f)?;
            writeln!(f, "Config file:        {}", path.display())?;
        }

        Ok(())
    }
}
