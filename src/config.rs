//! Config load, defaults, validation.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Root config: catalog, remote agent service, scoring/prerequisite tuning.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub catalog: Option<CatalogConfig>,
    pub remote: Option<RemoteConfig>,
    pub scoring: Option<ScoringConfig>,
    pub prerequisites: Option<PrereqConfig>,
    /// Reply locale, default "fr".
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogConfig {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteConfig {
    pub api_base: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Relevance weights for `search_courses`. Product-tuned values; kept
/// configurable rather than hard-coded.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScoringConfig {
    pub label_weight: Option<i32>,
    pub description_weight: Option<i32>,
    pub skill_weight: Option<i32>,
    pub module_weight: Option<i32>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrereqConfig {
    pub base_confidence: Option<f32>,
    pub excellent_confidence: Option<f32>,
    pub challenging_confidence: Option<f32>,
    pub overlap_bonus: Option<f32>,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(s) => write!(f, "config io: {}", s),
            ConfigError::Parse(s) => write!(f, "config parse: {}", s),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `$FORMABOT_CONFIG` if set, else `./formabot.toml`.
pub fn default_config_path() -> PathBuf {
    std::env::var("FORMABOT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("formabot.toml"))
}

/// Load config from `path`. A missing file yields the default config.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(s) => toml::from_str(&s).map_err(|e| ConfigError::Parse(e.to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(ConfigError::Io(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Resolved tuning (defaults applied)
// ---------------------------------------------------------------------------

/// Resolved relevance weights (defaults: 10 label, 5 description, 3 per
/// skill, 2 per module; top 3 results).
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub label: i32,
    pub description: i32,
    pub skill: i32,
    pub module: i32,
    pub max_results: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            label: 10,
            description: 5,
            skill: 3,
            module: 2,
            max_results: 3,
        }
    }
}

impl ScoringWeights {
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();
        let s = cfg.scoring.clone().unwrap_or_default();
        Self {
            label: s.label_weight.unwrap_or(d.label),
            description: s.description_weight.unwrap_or(d.description),
            skill: s.skill_weight.unwrap_or(d.skill),
            module: s.module_weight.unwrap_or(d.module),
            max_results: s.max_results.unwrap_or(d.max_results).max(1),
        }
    }
}

/// Resolved prerequisite-fit confidences (defaults: 0.8 base, 0.95
/// excellent, 0.6 challenging, +0.1 overlap bonus, capped at 1.0).
#[derive(Debug, Clone, Copy)]
pub struct PrereqTuning {
    pub base_confidence: f32,
    pub excellent_confidence: f32,
    pub challenging_confidence: f32,
    pub overlap_bonus: f32,
}

impl Default for PrereqTuning {
    fn default() -> Self {
        Self {
            base_confidence: 0.8,
            excellent_confidence: 0.95,
            challenging_confidence: 0.6,
            overlap_bonus: 0.1,
        }
    }
}

impl PrereqTuning {
    pub fn from_config(cfg: &Config) -> Self {
        let d = Self::default();
        let p = cfg.prerequisites.clone().unwrap_or_default();
        Self {
            base_confidence: p.base_confidence.unwrap_or(d.base_confidence),
            excellent_confidence: p.excellent_confidence.unwrap_or(d.excellent_confidence),
            challenging_confidence: p.challenging_confidence.unwrap_or(d.challenging_confidence),
            overlap_bonus: p.overlap_bonus.unwrap_or(d.overlap_bonus),
        }
    }
}
