//! Template selection: the embedded director template or a file from the templates directory
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::loader::PromptTemplate;
use crate::core::{DirectorError, DirectorResult};

/// Choice string selecting the embedded template
pub const BUILTIN_TEMPLATE_CHOICE: &str = "default";

/// Director template compiled into the binary
const BUILTIN_TEMPLATE: &str = include_str!("../../../prompts/director.json");

/// Which system-prompt template to use for a round-trip
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TemplateChoice {
    #[default]
    Builtin,
    /// File name inside the templates directory
    Named(String),
}

impl TemplateChoice {
    pub fn from_choice(choice: &str) -> Self {
        let choice = choice.trim();
        if choice.is_empty() || choice == BUILTIN_TEMPLATE_CHOICE {
            TemplateChoice::Builtin
        } else {
            TemplateChoice::Named(choice.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    dir: PathBuf,
}

impl TemplateLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The embedded director template
    pub fn builtin() -> DirectorResult<PromptTemplate> {
        PromptTemplate::from_json_str(BUILTIN_TEMPLATE)
    }

    /// Template files available in the directory, sorted. A missing directory is empty.
    pub fn list(&self) -> DirectorResult<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            DirectorError::ConfigError(format!("{}: {e}", self.dir.display()))
        })?;

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect();
        files.sort();
        Ok(files)
    }

    /// Built-in choice followed by every template file
    pub fn options(&self) -> DirectorResult<Vec<String>> {
        let mut options = vec![BUILTIN_TEMPLATE_CHOICE.to_string()];
        options.extend(self.list()?);
        Ok(options)
    }

    pub fn template(&self, choice: &TemplateChoice) -> DirectorResult<PromptTemplate> {
        match choice {
            TemplateChoice::Builtin => Self::builtin(),
            TemplateChoice::Named(name) => {
                let is_bare = Path::new(name).file_name().and_then(|n| n.to_str())
                    == Some(name.as_str());
                if !is_bare {
                    return Err(DirectorError::ConfigError(format!(
                        "Invalid template name: {name}"
                    )));
                }
                debug!("Loading prompt template {name}");
                PromptTemplate::load(self.dir.join(name))
            }
        }
    }

    /// Rendered system prompt for a choice
    pub fn system_prompt(&self, choice: &TemplateChoice) -> DirectorResult<String> {
        Ok(self.template(choice)?.render())
    }
}
