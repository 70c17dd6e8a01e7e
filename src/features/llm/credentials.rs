//! API credential resolution
//!
//! Each value comes from the caller override first, then the JSON config file,
//! then the environment.
//!
//! - **Version**: 1.1.1
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.1: Config file read into a typed struct
//! - 1.1.0: Environment fallback (OPENAI_BASE_URL / OPENAI_API_KEY / OPENAI_MODEL)
//! - 1.0.0: Overrides with config.json fallback, auto-created from config.json.example

use log::{info, warn};
use serde::Deserialize;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{DirectorError, DirectorResult};

/// Per-call overrides; empty strings mean "not set"
#[derive(Debug, Clone, Default)]
pub struct ApiOverrides {
    pub api_url: String,
    pub api_key: String,
    pub model_name: String,
}

/// Fully resolved endpoint, key and model
#[derive(Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    pub api_url: String,
    pub api_key: String,
    pub model_name: String,
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_url", &self.api_url)
            .field("api_key", &"***")
            .field("model_name", &self.model_name)
            .finish()
    }
}

/// Contents of `config.json`; missing fields read as empty
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CredentialsFile {
    api_url: String,
    api_key: String,
    model_name: String,
}

#[derive(Debug, Clone)]
pub struct CredentialResolver {
    config_path: PathBuf,
    use_env: bool,
}

impl CredentialResolver {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            use_env: true,
        }
    }

    /// Skip the environment fallback
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    pub fn resolve(&self, overrides: &ApiOverrides) -> DirectorResult<ApiCredentials> {
        let config = self.read_config_file()?;
        let location = self.config_path.display();

        let api_key = self.param(&overrides.api_key, &config.api_key, "OPENAI_API_KEY");
        if api_key.is_empty() {
            return Err(DirectorError::CredentialError(format!(
                "API Key not found! Set it in the request or in {location}"
            )));
        }

        let api_url = self.param(&overrides.api_url, &config.api_url, "OPENAI_BASE_URL");
        if api_url.is_empty() {
            return Err(DirectorError::CredentialError(format!(
                "API URL not found! Set it in the request or in {location}"
            )));
        }

        let model_name = self.param(&overrides.model_name, &config.model_name, "OPENAI_MODEL");
        if model_name.is_empty() {
            return Err(DirectorError::CredentialError(format!(
                "Model Name not found! Please specify 'model_name' (e.g. 'gpt-4o') in the request or in {location}"
            )));
        }

        Ok(ApiCredentials {
            api_url,
            api_key,
            model_name,
        })
    }

    fn param(&self, override_value: &str, from_file: &str, env_key: &str) -> String {
        let value = override_value.trim();
        if !value.is_empty() {
            return value.to_string();
        }

        let from_file = from_file.trim();
        if !from_file.is_empty() {
            return from_file.to_string();
        }

        if self.use_env {
            if let Ok(v) = std::env::var(env_key) {
                return v.trim().to_string();
            }
        }
        String::new()
    }

    /// Read the config file. A missing file is copied from `<path>.example` when
    /// one exists; a file that fails to parse counts as empty.
    fn read_config_file(&self) -> DirectorResult<CredentialsFile> {
        if !self.config_path.exists() {
            let example = example_path(&self.config_path);
            if example.exists() {
                fs::copy(&example, &self.config_path).map_err(|e| {
                    DirectorError::CredentialError(format!(
                        "Failed to create {} from example: {e}",
                        self.config_path.display()
                    ))
                })?;
                info!("Auto-created {} from example", self.config_path.display());
                return Err(DirectorError::CredentialError(format!(
                    "{} created from example. Please fill in your API details.",
                    self.config_path.display()
                )));
            }
            return Ok(CredentialsFile::default());
        }

        let parsed = fs::read_to_string(&self.config_path)
            .map_err(|e| e.to_string())
            .and_then(|contents| {
                serde_json::from_str::<CredentialsFile>(&contents).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(file) => Ok(file),
            Err(e) => {
                warn!("Failed to parse {}: {e}", self.config_path.display());
                Ok(CredentialsFile::default())
            }
        }
    }
}

fn example_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".example");
    PathBuf::from(name)
}
