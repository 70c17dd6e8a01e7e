//! Merging a parsed LLM response into persona state and assembling final prompts
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Quality prefix/suffix and negative base come from `QualityTags`
//! - 1.0.0: Initial release

use serde_json::Value;

use super::parser::{excerpt, JsonObject};
use crate::core::{normalize, DirectorError, DirectorResult, QualityTags};
use crate::features::personas::PersonaState;

/// State and raw prompts taken from one LLM response
#[derive(Debug, Clone, PartialEq)]
pub struct MergedUpdate {
    pub state: PersonaState,
    pub positive_prompt: String,
    pub negative_prompt: String,
}

/// Read `updated_state`, `positive_prompt` and `negative_prompt` from a response.
///
/// A missing `updated_state` keeps `current`. `reasoning` is always stripped.
/// An empty positive prompt is rebuilt from the slots.
pub fn merge(parsed: &JsonObject, current: &PersonaState) -> DirectorResult<MergedUpdate> {
    let mut state = match parsed.get("updated_state") {
        None | Some(Value::Null) => current.clone(),
        Some(Value::Object(map)) => PersonaState::from_map(map.clone()),
        Some(other) => {
            return Err(DirectorError::UnparsableResponse(format!(
                "updated_state is not an object: {}",
                excerpt(&other.to_string(), 200)
            )))
        }
    };
    state.strip_reasoning();

    let mut positive_prompt = string_field(parsed, "positive_prompt");
    if positive_prompt.is_empty() {
        positive_prompt = state.compose_prompt();
    }
    let negative_prompt = string_field(parsed, "negative_prompt");

    Ok(MergedUpdate {
        state,
        positive_prompt,
        negative_prompt,
    })
}

/// Wrap the prompts with the quality tags and normalize them
pub fn assemble(tags: &QualityTags, positive_prompt: &str, negative_prompt: &str) -> (String, String) {
    let positive = normalize(&format!(
        "{}, {}, {}",
        tags.prefix, positive_prompt, tags.suffix
    ));
    let negative = normalize(&format!("{}, {}", tags.negative_base, negative_prompt));
    (positive, negative)
}

fn string_field(parsed: &JsonObject, key: &str) -> String {
    parsed
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::personas::Slot;
    use serde_json::json;

    fn object(value: Value) -> JsonObject {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_merge_takes_updated_state_and_prompts() {
        let parsed = object(json!({
            "updated_state": {"reasoning": "swap outfit", "character": "aria", "outfit": "maid"},
            "positive_prompt": "aria, maid",
            "negative_prompt": "armor"
        }));
        let merged = merge(&parsed, &PersonaState::new()).unwrap();

        assert!(merged.state.get("reasoning").is_none());
        assert_eq!(merged.state.slot(Slot::Outfit), "maid");
        assert_eq!(merged.positive_prompt, "aria, maid");
        assert_eq!(merged.negative_prompt, "armor");
    }

    #[test]
    fn test_merge_missing_state_keeps_current() {
        let mut current = PersonaState::new();
        current.set_slot(Slot::Character, "aria");

        let merged = merge(&object(json!({"positive_prompt": "x"})), &current).unwrap();
        assert_eq!(merged.state, current);
        assert_eq!(merged.negative_prompt, "");
    }

    #[test]
    fn test_merge_rebuilds_missing_positive_prompt() {
        let parsed = object(json!({
            "updated_state": {
                "meta": "highres",
                "character": "aria, 1girl",
                "style": "anime style",
                "location": ""
            }
        }));
        let merged = merge(&parsed, &PersonaState::new()).unwrap();
        assert_eq!(merged.positive_prompt, "anime style, aria, 1girl, highres");
    }

    #[test]
    fn test_merge_rejects_non_object_state() {
        let parsed = object(json!({"updated_state": "aria"}));
        let err = merge(&parsed, &PersonaState::new()).unwrap_err();
        assert!(matches!(err, DirectorError::UnparsableResponse(_)));
    }

    #[test]
    fn test_assemble_dedups_overlapping_quality_tags() {
        let tags = QualityTags {
            prefix: "masterpiece, best quality".to_string(),
            suffix: "absurdres".to_string(),
            negative_base: "lowres, blurry".to_string(),
        };
        let (positive, negative) =
            assemble(&tags, "Best Quality, 1girl, masterpiece, red hair", "blurry, indoors");

        assert_eq!(positive, "masterpiece, best quality, 1girl, red hair, absurdres");
        assert_eq!(negative, "lowres, blurry, indoors");
    }

    #[test]
    fn test_assemble_empty_llm_prompts() {
        let tags = QualityTags::default();
        let (positive, negative) = assemble(&tags, "", "");
        assert_eq!(positive, normalize(&format!("{}, {}", tags.prefix, tags.suffix)));
        assert_eq!(negative, normalize(&tags.negative_base));
    }
}
