//! Configuration loading and engine tuning constants.
//!
//! Every confidence threshold the engine uses is a configuration field with
//! a serde default, so deployments can tune them against representative
//! documents without recompiling.

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::Deserialize;
use thiserror::Error;

use recollate_server::ServerConfig;

const CONFIG_FILE: &str = "config/settings";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("unable to resolve project directories")]
    MissingProjectDirs,
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub providers: ProviderConfig,
    pub catalog: CatalogSettings,
}

/// Location of the rule catalog; `None` selects the built-in default.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct CatalogSettings {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// A strategy result at or above this confidence short-circuits the
    /// remaining (more expensive) strategies.
    pub high_confidence_cutoff: f32,
    /// Character budget for per-page diagnostic summaries and LLM payloads.
    pub summary_chars: usize,
    pub classifier: ClassifierConfig,
    pub page_number: PageNumberConfig,
    pub business: BusinessConfig,
    pub structural: StructuralConfig,
    pub dates: DateConfig,
    pub semantic: SemanticConfig,
    pub llm: LlmConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            high_confidence_cutoff: 0.90,
            summary_chars: 400,
            classifier: ClassifierConfig::default(),
            page_number: PageNumberConfig::default(),
            business: BusinessConfig::default(),
            structural: StructuralConfig::default(),
            dates: DateConfig::default(),
            semantic: SemanticConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Characters sampled from each page during profile auto-detection.
    pub sample_chars: usize,
    /// Minimum aggregate keyword hits for a profile to be selected.
    pub min_profile_hits: usize,
    /// Fixed score increment per matching boost pattern.
    pub boost_increment: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            sample_chars: 500,
            min_profile_hits: 3,
            boost_increment: 1.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct PageNumberConfig {
    /// Minimum fraction of pages carrying a detected number.
    pub min_coverage: f32,
    /// Confidence penalty per duplicate detected number.
    pub duplicate_penalty: f32,
    /// Confidence penalty per out-of-range detected number.
    pub out_of_range_penalty: f32,
}

impl Default for PageNumberConfig {
    fn default() -> Self {
        Self {
            min_coverage: 0.40,
            duplicate_penalty: 0.15,
            out_of_range_penalty: 0.10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct BusinessConfig {
    /// Minimum fraction of classified pages before the strategy commits.
    pub min_classified_fraction: f32,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            min_classified_fraction: 0.30,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct StructuralConfig {
    /// Pages shorter than this (chars) qualify as cover-page candidates.
    pub cover_max_chars: usize,
    /// Pages longer than this (chars) count as dense body text.
    pub body_min_chars: usize,
    /// Minimum number of pages with a distinctive role before the strategy
    /// commits.
    pub min_distinct_roles: usize,
}

impl Default for StructuralConfig {
    fn default() -> Self {
        Self {
            cover_max_chars: 600,
            body_min_chars: 800,
            min_distinct_roles: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DateConfig {
    /// Minimum number of dated pages before the strategy commits.
    pub min_count: usize,
    /// Minimum fraction of dated pages before the strategy commits.
    pub min_fraction: f32,
    /// Confidence assigned once the thresholds are met.
    pub baseline_confidence: f32,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self {
            min_count: 2,
            min_fraction: 0.50,
            baseline_confidence: 0.60,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct SemanticConfig {
    /// Chain construction needs at least this many pages to be meaningful.
    pub min_pages: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self { min_pages: 3 }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct LlmConfig {
    pub timeout_secs: u64,
    /// Cap on the confidence a reasoning service may claim; keeps a
    /// non-deterministic source from outranking clean deterministic reads.
    pub max_confidence: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_confidence: 0.85,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    pub embedding_model: String,
    pub embedding_dim: usize,
    pub reasoning_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            embedding_model: "gemini-embedding-001".to_string(),
            embedding_dim: 768,
            reasoning_model: "gemini-2.5-flash".to_string(),
        }
    }
}

/// Loads configuration with the usual precedence: user config directory,
/// then a workspace-local `config/settings` file, then `RECOLLATE__*`
/// environment variables. Every source is optional.
pub fn load() -> Result<AppConfig, AppConfigError> {
    let mut builder = Config::builder();
    if let Ok(dirs) = project_dirs() {
        let user_file = dirs.config_dir().join("settings");
        builder = builder.add_source(File::from(user_file).required(false));
    }
    let builder = builder
        .add_source(File::with_name(CONFIG_FILE).required(false))
        .add_source(Environment::with_prefix("RECOLLATE").separator("__"));

    let cfg = builder.build()?.try_deserialize()?;
    Ok(cfg)
}

pub fn project_dirs() -> Result<ProjectDirs, AppConfigError> {
    ProjectDirs::from("dev", "recollate", "recollate").ok_or(AppConfigError::MissingProjectDirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_defaults_are_sane() {
        let engine = EngineConfig::default();
        assert!(engine.high_confidence_cutoff > 0.5 && engine.high_confidence_cutoff <= 1.0);
        assert!(engine.page_number.min_coverage > 0.0);
        assert!(engine.dates.baseline_confidence <= engine.high_confidence_cutoff);
        assert!(engine.llm.max_confidence < engine.high_confidence_cutoff);
    }

    #[test]
    fn empty_sources_yield_full_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").expect("defaults deserialize");
        assert_eq!(cfg.providers.embedding_dim, 768);
        assert!(cfg.catalog.path.is_none());
        assert_eq!(cfg.engine.llm.timeout_secs, 30);
    }
}
