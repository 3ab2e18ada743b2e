use std::collections::BTreeMap;
use std::sync::Arc;

use dlg_core::{DialogueError, SessionSnapshot, StoryData};
use dlg_runtime::{DialogueEngine, DialogueEngineOptions, Localization};

#[derive(Clone)]
pub struct CreateEngineFromJsonOptions {
    pub story_json: String,
    pub variables: BTreeMap<String, String>,
    pub localization: Option<Arc<dyn Localization>>,
}

#[derive(Clone)]
pub struct ResumeEngineFromJsonOptions {
    pub story_json: String,
    pub snapshot: SessionSnapshot,
    pub localization: Option<Arc<dyn Localization>>,
}

pub fn parse_story_json(text: &str) -> Result<StoryData, DialogueError> {
    serde_json::from_str(text).map_err(|error| {
        DialogueError::invalid_input(
            "API_STORY_JSON_INVALID",
            format!("Failed to parse story JSON: {}", error),
        )
    })
}

/// Reads a flat `{ "<line id>": "<text>" }` table.
pub fn parse_localization_json(text: &str) -> Result<BTreeMap<String, String>, DialogueError> {
    serde_json::from_str(text).map_err(|error| {
        DialogueError::invalid_input(
            "API_LOCALIZATION_JSON_INVALID",
            format!("Failed to parse localization JSON: {}", error),
        )
    })
}

pub fn create_engine_from_json(
    options: CreateEngineFromJsonOptions,
) -> Result<DialogueEngine, DialogueError> {
    let story = parse_story_json(&options.story_json)?;
    DialogueEngine::new(DialogueEngineOptions {
        story: Arc::new(story),
        variables: options.variables,
        localization: options.localization,
    })
}

pub fn resume_engine_from_json(
    options: ResumeEngineFromJsonOptions,
) -> Result<DialogueEngine, DialogueError> {
    let story = parse_story_json(&options.story_json)?;
    let mut engine = DialogueEngine::new(DialogueEngineOptions {
        story: Arc::new(story),
        variables: BTreeMap::new(),
        localization: options.localization,
    })?;
    engine.resume(options.snapshot)?;
    Ok(engine)
}
