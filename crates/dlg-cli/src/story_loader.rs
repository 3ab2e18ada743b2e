use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use dlg_api::parse_localization_json;
use dlg_core::DialogueError;

use crate::{map_cli_locale_read, map_cli_story_path, map_cli_story_read, LoadedStory, PlayerState};

pub(crate) fn load_story(
    story: &str,
    locale: Option<&str>,
    variables: BTreeMap<String, String>,
) -> Result<LoadedStory, DialogueError> {
    let story_path = resolve_file(story, "CLI_STORY_NOT_FOUND", "CLI_STORY_NOT_FILE", "story")?;
    let story_json = fs::read_to_string(&story_path).map_err(map_cli_story_read)?;

    let (locale_path, localization) = match locale {
        Some(locale) => {
            let locale_path =
                resolve_file(locale, "CLI_LOCALE_NOT_FOUND", "CLI_LOCALE_NOT_FILE", "locale")?;
            let raw = fs::read_to_string(&locale_path).map_err(map_cli_locale_read)?;
            (
                Some(locale_path.to_string_lossy().to_string()),
                Some(parse_localization_json(&raw)?),
            )
        }
        None => (None, None),
    };

    Ok(LoadedStory {
        path: story_path.to_string_lossy().to_string(),
        locale_path,
        story_json,
        localization,
        variables,
    })
}

/// Reloads the files a saved state points at. Variables come back through the snapshot.
pub(crate) fn load_story_for_state(state: &PlayerState) -> Result<LoadedStory, DialogueError> {
    load_story(
        &state.story_path,
        state.locale_path.as_deref(),
        BTreeMap::new(),
    )
}

pub(crate) fn resolve_file(
    raw: &str,
    missing_code: &'static str,
    not_file_code: &'static str,
    label: &str,
) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(raw);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_story_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(DialogueError::invalid_input(
            missing_code,
            format!("{} does not exist: {}", label, absolute.display()),
        ));
    }

    if !absolute.is_file() {
        return Err(DialogueError::invalid_input(
            not_file_code,
            format!("{} is not a file: {}", label, absolute.display()),
        ));
    }

    absolute.canonicalize().map_err(map_cli_story_path)
}
