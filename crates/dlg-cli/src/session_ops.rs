use std::path::Path;
use std::sync::Arc;

use dlg_api::{
    create_engine_from_json, resume_engine_from_json, CreateEngineFromJsonOptions,
    ResumeEngineFromJsonOptions,
};
use dlg_core::DialogueError;
use dlg_runtime::{DialogueEngine, Localization};
use tracing::debug;

use crate::{
    emit_boundary, load_player_state, load_story_for_state, save_player_state, BoundaryEvent,
    BoundaryResult, LoadedStory, PlayerState, PLAYER_STATE_SCHEMA,
};

fn localization_for(story: &LoadedStory) -> Option<Arc<dyn Localization>> {
    story
        .localization
        .clone()
        .map(|table| Arc::new(table) as Arc<dyn Localization>)
}

pub(crate) fn create_engine_for_story(story: &LoadedStory) -> Result<DialogueEngine, DialogueError> {
    create_engine_from_json(CreateEngineFromJsonOptions {
        story_json: story.story_json.clone(),
        variables: story.variables.clone(),
        localization: localization_for(story),
    })
}

pub(crate) fn resume_engine_for_state(
    story: &LoadedStory,
    state: &PlayerState,
) -> Result<DialogueEngine, DialogueError> {
    resume_engine_from_json(ResumeEngineFromJsonOptions {
        story_json: story.story_json.clone(),
        snapshot: state.snapshot.clone(),
        localization: localization_for(story),
    })
}

pub(crate) fn save_engine_state(
    path: &Path,
    engine: &DialogueEngine,
    story: &LoadedStory,
) -> Result<(), DialogueError> {
    let state = PlayerState {
        schema_version: PLAYER_STATE_SCHEMA.to_string(),
        story_path: story.path.clone(),
        locale_path: story.locale_path.clone(),
        snapshot: engine.snapshot(),
    };
    save_player_state(path, &state)?;
    debug!(path = %path.display(), "saved player state");
    Ok(())
}

pub(crate) fn load_engine_from_state(
    path: &Path,
) -> Result<(LoadedStory, PlayerState, DialogueEngine), DialogueError> {
    let state = load_player_state(path)?;
    let story = load_story_for_state(&state)?;
    let engine = resume_engine_for_state(&story, &state)?;
    Ok((story, state, engine))
}

/// Loads a save made for `story`; a save for another story file is rejected.
pub(crate) fn load_engine_from_state_for_story(
    path: &Path,
    story: &LoadedStory,
) -> Result<(PlayerState, DialogueEngine), DialogueError> {
    let state = load_player_state(path)?;
    if state.story_path != story.path {
        return Err(DialogueError::invalid_input(
            "CLI_STATE_STORY_MISMATCH",
            format!(
                "State story mismatch. expected={} actual={}",
                story.path, state.story_path
            ),
        ));
    }
    let engine = resume_engine_for_state(story, &state)?;
    Ok((state, engine))
}

pub(crate) fn emit_boundary_with_saved_state(
    engine: &DialogueEngine,
    boundary: BoundaryResult,
    state_out: &str,
    story: &LoadedStory,
) -> Result<i32, DialogueError> {
    if boundary.event == BoundaryEvent::Choices {
        save_engine_state(Path::new(state_out), engine, story)?;
        emit_boundary(boundary, Some(state_out.to_string()));
        return Ok(0);
    }

    emit_boundary(boundary, None);
    Ok(0)
}
