//! # Persona Store
//!
//! File-backed repository of persona records. Every read and write goes through
//! `resolve` / `save`; all paths stay inside the persona directory.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.3.0: Temp file and persona directory are fsynced around the rename
//! - 1.2.0: Saves go through a temp file + rename so a crash never leaves a half-written record
//! - 1.1.0: Smart create falls back to a fresh record when the existing file is unreadable
//! - 1.0.0: Initial release

use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::choices::{CREATE_SMART_CHOICE, FORCE_RESET_CHOICE};
use super::record::{InferenceCache, PersonaRecord, PersonaState, SystemMeta};
use crate::core::{DirectorError, DirectorResult};

/// Name used when the requested name has nothing usable in it
pub const DEFAULT_PERSONA_NAME: &str = "New_Character";

/// Maximum length (in characters) of a sanitized persona name
pub const MAX_NAME_CHARS: usize = 100;

const PERSONA_EXTENSION: &str = ".json";

/// How the target persona is chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Load the named persona if it exists, otherwise start a new one
    CreateSmart,
    /// Always start from an empty state under the new name
    ForceReset,
    /// Load an existing persona file; missing or unreadable is an error
    SelectExisting(String),
}

impl Selector {
    /// Map a selector option string back to a selector
    pub fn from_choice(choice: &str) -> Self {
        match choice {
            CREATE_SMART_CHOICE => Selector::CreateSmart,
            FORCE_RESET_CHOICE => Selector::ForceReset,
            other => Selector::SelectExisting(other.to_string()),
        }
    }
}

/// Outcome of resolving a selector
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub record: PersonaRecord,
    pub filename: String,
    pub is_new_creation: bool,
}

#[derive(Debug, Clone)]
pub struct PersonaStore {
    dir: PathBuf,
}

impl PersonaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name a selector targets, without touching the disk
    pub fn target_filename(selector: &Selector, new_name: &str) -> String {
        match selector {
            Selector::CreateSmart | Selector::ForceReset => persona_filename(new_name),
            Selector::SelectExisting(filename) => filename.clone(),
        }
    }

    /// Resolve a selector to the record it designates
    pub fn resolve(&self, selector: &Selector, new_name: &str) -> DirectorResult<Resolution> {
        self.ensure_dir()?;
        let filename = Self::target_filename(selector, new_name);

        match selector {
            Selector::ForceReset => {
                info!("Reset Character: {filename}");
                Ok(Resolution {
                    record: PersonaRecord::empty(),
                    filename,
                    is_new_creation: true,
                })
            }
            Selector::CreateSmart => {
                let path = self.path_for(&filename)?;
                if !path.exists() {
                    info!("Created New Character: {filename}");
                    return Ok(Resolution {
                        record: PersonaRecord::empty(),
                        filename,
                        is_new_creation: true,
                    });
                }

                match self.read_record(&path) {
                    Ok(record) => {
                        info!("Smart Mode: Resuming existing {filename}");
                        Ok(Resolution {
                            record,
                            filename,
                            is_new_creation: false,
                        })
                    }
                    Err(e) => {
                        warn!("Error reading file, resetting {filename}: {e}");
                        Ok(Resolution {
                            record: PersonaRecord::empty(),
                            filename,
                            is_new_creation: true,
                        })
                    }
                }
            }
            Selector::SelectExisting(_) => {
                let record = self.load(&filename)?;
                info!("Loaded File: {filename}");
                Ok(Resolution {
                    record,
                    filename,
                    is_new_creation: false,
                })
            }
        }
    }

    /// Load and migrate an existing persona file
    pub fn load(&self, filename: &str) -> DirectorResult<PersonaRecord> {
        let path = self
            .path_for(filename)
            .map_err(|_| DirectorError::NotFound(filename.to_string()))?;
        if !path.is_file() {
            return Err(DirectorError::NotFound(filename.to_string()));
        }
        self.read_record(&path)
    }

    /// Overwrite the persona file with a fully wrapped record
    pub fn save(
        &self,
        filename: &str,
        state: &PersonaState,
        positive_prompt: &str,
        negative_prompt: &str,
        last_instruction: &str,
    ) -> DirectorResult<PersonaRecord> {
        self.ensure_dir()?;
        let path = self.path_for(filename)?;

        let mut state = state.clone();
        state.strip_reasoning();

        let record = PersonaRecord {
            updated_state: state,
            inference_cache: InferenceCache {
                positive_prompt: Some(positive_prompt.to_string()),
                negative_prompt: Some(negative_prompt.to_string()),
            },
            system_meta: SystemMeta {
                last_instruction: Some(last_instruction.to_string()),
                updated_at: Some(Utc::now()),
            },
        };

        let bytes = to_pretty_bytes(&record)
            .map_err(|e| DirectorError::PersistenceError(format!("{filename}: {e}")))?;
        self.write_atomic(&path, &bytes)?;

        info!("State saved to {filename}");
        Ok(record)
    }

    /// Persona files in the directory, sorted by name
    pub fn list(&self) -> DirectorResult<Vec<String>> {
        self.ensure_dir()?;
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            DirectorError::ReadError(format!("{}: {e}", self.dir.display()))
        })?;

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(PERSONA_EXTENSION) && !name.starts_with('.'))
            .collect();
        files.sort();
        Ok(files)
    }

    fn ensure_dir(&self) -> DirectorResult<()> {
        if !self.dir.exists() {
            debug!("Creating persona directory {}", self.dir.display());
            fs::create_dir_all(&self.dir).map_err(|e| {
                DirectorError::PersistenceError(format!("{}: {e}", self.dir.display()))
            })?;
        }
        Ok(())
    }

    /// Join a bare file name onto the persona directory
    fn path_for(&self, filename: &str) -> DirectorResult<PathBuf> {
        let candidate = Path::new(filename);
        let is_bare = candidate.file_name().and_then(|n| n.to_str()) == Some(filename);
        if filename.is_empty() || !is_bare || filename == "." || filename == ".." {
            return Err(DirectorError::NotFound(filename.to_string()));
        }
        Ok(self.dir.join(filename))
    }

    fn read_record(&self, path: &Path) -> DirectorResult<PersonaRecord> {
        let contents = fs::read_to_string(path)
            .map_err(|e| DirectorError::ReadError(format!("{}: {e}", path.display())))?;
        PersonaRecord::from_json_str(&contents)
            .map_err(|e| DirectorError::ReadError(format!("{}: {e}", path.display())))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> DirectorResult<()> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("persona");
        let temp_path = self
            .dir
            .join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        if let Err(e) = write_synced(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(DirectorError::PersistenceError(format!(
                "{}: {e}",
                temp_path.display()
            )));
        }

        // Rename temp -> dest (same directory, so same filesystem)
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(DirectorError::PersistenceError(format!(
                "{}: {e}",
                path.display()
            )));
        }

        // Fsync the directory entry so the rename survives a crash
        if let Ok(dir) = fs::File::open(&self.dir) {
            if let Err(e) = dir.sync_all() {
                debug!("Directory sync failed for {}: {e}", self.dir.display());
            }
        }
        Ok(())
    }
}

/// Create `path` exclusively, write `bytes` and flush them to disk
fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Sanitize a free-text persona name and append `.json`
pub fn persona_filename(name: &str) -> String {
    format!("{}{PERSONA_EXTENSION}", sanitize_name(name))
}

/// Keep alphanumerics, space, hyphen and underscore; collapse every other run
/// of characters into a single underscore.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if is_allowed(c) {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('_');
            in_run = true;
        }
    }

    let has_content = name.chars().any(|c| is_allowed(c) && !c.is_whitespace());
    let trimmed = out.trim();
    if !has_content || trimmed.is_empty() {
        return DEFAULT_PERSONA_NAME.to_string();
    }

    let truncated: String = trimmed.chars().take(MAX_NAME_CHARS).collect();
    truncated.trim_end().to_string()
}

fn is_allowed(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, ' ' | '-' | '_')
}

/// 4-space indented JSON, non-ASCII kept verbatim
fn to_pretty_bytes<T: Serialize>(value: &T) -> serde_json::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::personas::record::Slot;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, PersonaStore) {
        let dir = TempDir::new().unwrap();
        let store = PersonaStore::new(dir.path().join("personas"));
        (dir, store)
    }

    fn state(character: &str) -> PersonaState {
        let mut state = PersonaState::new();
        state.set_slot(Slot::Character, character);
        state
    }

    #[test]
    fn test_sanitize_collapses_disallowed_runs() {
        assert_eq!(sanitize_name("My/Char*Name!"), "My_Char_Name_");
        assert_eq!(sanitize_name("a//**b"), "a_b");
        assert_eq!(sanitize_name("Aria Blue-2_x"), "Aria Blue-2_x");
    }

    #[test]
    fn test_sanitize_falls_back_to_default() {
        assert_eq!(sanitize_name(""), DEFAULT_PERSONA_NAME);
        assert_eq!(sanitize_name("   "), DEFAULT_PERSONA_NAME);
        assert_eq!(sanitize_name("!!!/***"), DEFAULT_PERSONA_NAME);
    }

    #[test]
    fn test_sanitize_truncates_to_limit() {
        let long = "a".repeat(200);
        assert_eq!(sanitize_name(&long).chars().count(), MAX_NAME_CHARS);
        assert_eq!(persona_filename(&long), format!("{}.json", "a".repeat(100)));
    }

    #[test]
    fn test_sanitize_keeps_unicode_letters() {
        assert_eq!(persona_filename("初音ミク"), "初音ミク.json");
    }

    #[test]
    fn test_selector_from_choice() {
        assert_eq!(Selector::from_choice(CREATE_SMART_CHOICE), Selector::CreateSmart);
        assert_eq!(Selector::from_choice(FORCE_RESET_CHOICE), Selector::ForceReset);
        assert_eq!(
            Selector::from_choice("Aria.json"),
            Selector::SelectExisting("Aria.json".to_string())
        );
    }

    #[test]
    fn test_smart_create_missing_file_is_new() {
        let (_tmp, store) = store();
        let resolution = store.resolve(&Selector::CreateSmart, "Aria").unwrap();

        assert_eq!(resolution.filename, "Aria.json");
        assert!(resolution.is_new_creation);
        assert_eq!(resolution.record, PersonaRecord::empty());
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_smart_create_resumes_existing_file() {
        let (_tmp, store) = store();
        store.save("Aria.json", &state("aria"), "pos", "neg", "first").unwrap();

        let resolution = store.resolve(&Selector::CreateSmart, "Aria").unwrap();
        assert!(!resolution.is_new_creation);
        assert_eq!(resolution.record.updated_state.slot(Slot::Character), "aria");
        assert_eq!(resolution.record.last_instruction(), Some("first"));
    }

    #[test]
    fn test_smart_create_corrupt_file_starts_fresh() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("Aria.json"), "{not json").unwrap();

        let resolution = store.resolve(&Selector::CreateSmart, "Aria").unwrap();
        assert!(resolution.is_new_creation);
        assert_eq!(resolution.record, PersonaRecord::empty());
    }

    #[test]
    fn test_wrapped_file_with_odd_field_types_is_resumed() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.dir().join("Aria.json"),
            r#"{"updated_state":{"character":"aria, 1girl"},"inference_cache":{"positive_prompt":"p"},"system_meta":{"last_instruction":"x","updated_at":"2024-05-01"}}"#,
        )
        .unwrap();

        let smart = store.resolve(&Selector::CreateSmart, "Aria").unwrap();
        assert!(!smart.is_new_creation);
        assert_eq!(smart.record.updated_state.slot(Slot::Character), "aria, 1girl");

        let existing = store
            .resolve(&Selector::SelectExisting("Aria.json".to_string()), "")
            .unwrap();
        assert_eq!(existing.record, smart.record);
        assert_eq!(existing.record.last_instruction(), Some("x"));
    }

    #[test]
    fn test_save_into_blocked_target_is_persistence_error() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir().join("Aria.json")).unwrap();

        let err = store
            .save("Aria.json", &state("aria"), "p", "n", "one")
            .unwrap_err();
        assert!(matches!(err, DirectorError::PersistenceError(_)));

        let names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["Aria.json".to_string()]);
    }

    #[test]
    fn test_force_reset_ignores_existing_file_until_save() {
        let (_tmp, store) = store();
        store.save("Aria.json", &state("aria"), "pos", "neg", "first").unwrap();

        let resolution = store.resolve(&Selector::ForceReset, "Aria").unwrap();
        assert!(resolution.is_new_creation);
        assert!(resolution.record.updated_state.is_empty());

        // Nothing on disk changes until a save happens
        let on_disk = store.load("Aria.json").unwrap();
        assert_eq!(on_disk.updated_state.slot(Slot::Character), "aria");
    }

    #[test]
    fn test_select_existing_missing_is_not_found() {
        let (_tmp, store) = store();
        let err = store
            .resolve(&Selector::SelectExisting("Ghost.json".to_string()), "")
            .unwrap_err();
        assert!(matches!(err, DirectorError::NotFound(_)));
    }

    #[test]
    fn test_select_existing_corrupt_is_read_error() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("Bad.json"), "[[[").unwrap();

        let err = store
            .resolve(&Selector::SelectExisting("Bad.json".to_string()), "")
            .unwrap_err();
        assert!(matches!(err, DirectorError::ReadError(_)));
    }

    #[test]
    fn test_select_existing_rejects_paths_outside_dir() {
        let (_tmp, store) = store();
        for name in ["../secret.json", "sub/Aria.json", "..", ""] {
            let err = store
                .resolve(&Selector::SelectExisting(name.to_string()), "")
                .unwrap_err();
            assert!(matches!(err, DirectorError::NotFound(_)), "{name}");
        }
    }

    #[test]
    fn test_select_existing_migrates_legacy_file() {
        let (_tmp, store) = store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(
            store.dir().join("Miku.json"),
            r#"{"character": "hatsune_miku, 1girl", "outfit": "idol costume"}"#,
        )
        .unwrap();

        let resolution = store
            .resolve(&Selector::SelectExisting("Miku.json".to_string()), "")
            .unwrap();
        assert!(!resolution.is_new_creation);
        assert_eq!(
            resolution.record.updated_state.slot(Slot::Character),
            "hatsune_miku, 1girl"
        );
        assert_eq!(resolution.record.inference_cache, InferenceCache::default());
        assert_eq!(resolution.record.last_instruction(), None);
    }

    #[test]
    fn test_save_writes_wrapped_record_without_reasoning() {
        let (_tmp, store) = store();
        let mut map = state("aria").as_map().clone();
        map.insert("reasoning".to_string(), json!("scratch"));
        let s = PersonaState::from_map(map);

        store.save("Aria.json", &s, "pos", "neg", "make it so").unwrap();

        let raw = fs::read_to_string(store.dir().join("Aria.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["updated_state"], json!({"character": "aria"}));
        assert_eq!(value["inference_cache"]["positive_prompt"], "pos");
        assert_eq!(value["inference_cache"]["negative_prompt"], "neg");
        assert_eq!(value["system_meta"]["last_instruction"], "make it so");
        assert!(value["system_meta"]["updated_at"].is_string());
        assert!(raw.contains("\n    \"updated_state\""));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let (_tmp, store) = store();
        store.save("Aria.json", &state("a"), "p", "n", "one").unwrap();
        store.save("Aria.json", &state("b"), "p", "n", "two").unwrap();

        let names: Vec<String> = fs::read_dir(store.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["Aria.json".to_string()]);
        assert_eq!(store.load("Aria.json").unwrap().last_instruction(), Some("two"));
    }

    #[test]
    fn test_list_returns_sorted_json_files() {
        let (_tmp, store) = store();
        store.save("Zed.json", &state("z"), "", "", "z").unwrap();
        store.save("Aria.json", &state("a"), "", "", "a").unwrap();
        fs::write(store.dir().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.list().unwrap(), vec!["Aria.json", "Zed.json"]);
    }
}
