//! Environment-driven configuration
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Quality tag strings can be overridden from the environment
//! - 1.0.0: Initial release with directory and log level settings

use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Quality tags placed before the LLM prompt
pub const DEFAULT_QUALITY_PREFIX: &str = "masterpiece, best quality, amazing quality";

/// Quality tags placed after the LLM prompt
pub const DEFAULT_QUALITY_SUFFIX: &str = "very aesthetic, absurdres, newest";

/// Standard negatives prepended to every negative prompt
pub const DEFAULT_NEGATIVE_BASE: &str = "lowres, bad anatomy, bad hands, text, error, missing fingers, extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, blurry";

/// Fixed tag strings wrapped around the LLM output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityTags {
    pub prefix: String,
    pub suffix: String,
    pub negative_base: String,
}

impl Default for QualityTags {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_QUALITY_PREFIX.to_string(),
            suffix: DEFAULT_QUALITY_SUFFIX.to_string(),
            negative_base: DEFAULT_NEGATIVE_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one JSON file per persona
    pub persona_dir: PathBuf,
    /// Directory scanned for named prompt templates
    pub templates_dir: PathBuf,
    /// JSON file with api_url / api_key / model_name fallbacks
    pub credentials_path: PathBuf,
    pub log_level: String,
    pub quality_tags: QualityTags,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let persona_dir = env::var("PERSONA_DIR").unwrap_or_else(|_| "personas".to_string());
        let templates_dir =
            env::var("PROMPT_TEMPLATES_DIR").unwrap_or_else(|_| "prompts".to_string());
        let credentials_path =
            env::var("DIRECTOR_CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        if persona_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("PERSONA_DIR must not be empty"));
        }

        let defaults = QualityTags::default();
        let quality_tags = QualityTags {
            prefix: env_or("QUALITY_PREFIX", defaults.prefix),
            suffix: env_or("QUALITY_SUFFIX", defaults.suffix),
            negative_base: env_or("NEGATIVE_BASE", defaults.negative_base),
        };

        Ok(Config {
            persona_dir: PathBuf::from(persona_dir),
            templates_dir: PathBuf::from(templates_dir),
            credentials_path: PathBuf::from(credentials_path),
            log_level,
            quality_tags,
        })
    }
}

fn env_or(key: &str, default: String) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
}
