//! Health assessment - Nutri-Score and ingredient analysis
//!
//! Model output is treated as untrusted text. Every public entry point returns
//! a usable result: the Nutri-Score falls back to the local calculator, and
//! ingredient analysis degrades to keyword matching or an explanatory summary.

pub mod ai;
pub mod ingredient_analyzer;
pub mod json_extract;
pub mod nutriscore_engine;

pub use ai::backend_impl::{GeminiBackend, OfflineBackend};
pub use ai::prompts::{build_ingredient_prompt, build_nutriscore_prompt};
pub use ai::AiBackend;
pub use ingredient_analyzer::{parse_ingredient_response, IngredientAnalyzer, ANALYSIS_UNAVAILABLE};
pub use json_extract::{extract_balanced_object, extract_json_from_response};
pub use nutriscore_engine::{parse_model_nutriscore, NutriScoreEngine};

use tracing::warn;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Which text-generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Gemini,
    None,
}

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub backend: BackendKind,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Gemini,
            model: None,
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl GeneratorConfig {
    pub fn with_backend(mut self, backend: &str) -> Self {
        self.backend = match backend.trim().to_lowercase().as_str() {
            "none" | "offline" | "off" => BackendKind::None,
            _ => BackendKind::Gemini,
        };
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Build the configured backend.
///
/// A missing API key or a client that cannot be constructed yields an
/// [`OfflineBackend`], so scans still complete with local scoring.
pub fn build_backend(config: &GeneratorConfig) -> Box<dyn AiBackend> {
    match config.backend {
        BackendKind::None => Box::new(OfflineBackend::new("text generation disabled in config")),
        BackendKind::Gemini => {
            let Some(api_key) = config.api_key.clone() else {
                warn!("no Gemini API key, health assessment will use local fallbacks");
                return Box::new(OfflineBackend::new("no Gemini API key configured"));
            };
            let model = config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());
            match GeminiBackend::new(api_key, model, config.timeout_secs) {
                Ok(backend) => Box::new(backend),
                Err(e) => {
                    warn!(error = %e, "could not build Gemini client");
                    Box::new(OfflineBackend::new(e.to_string()))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = GeneratorConfig::default()
            .with_backend("None")
            .with_model(Some("m".to_string()))
            .with_api_key(Some("  ".to_string()))
            .with_timeout_secs(3);
        assert_eq!(config.backend, BackendKind::None);
        assert_eq!(config.model.as_deref(), Some("m"));
        assert!(config.api_key.is_none());
        assert_eq!(config.timeout_secs, 3);

        assert_eq!(GeneratorConfig::default().with_backend("gemini").backend, BackendKind::Gemini);
    }

    #[test]
    fn test_build_backend_offline_without_key() {
        let backend = build_backend(&GeneratorConfig::default());
        assert_eq!(backend.name(), "none");
        assert!(backend.send_prompt("hi").is_err());

        let disabled = build_backend(&GeneratorConfig::default().with_backend("none"));
        assert_eq!(disabled.name(), "none");
    }

    #[test]
    fn test_build_backend_gemini_with_key() {
        let config = GeneratorConfig::default().with_api_key(Some("secret".to_string()));
        assert_eq!(build_backend(&config).name(), "gemini");
    }
}
