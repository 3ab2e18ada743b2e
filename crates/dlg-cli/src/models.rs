use std::collections::BTreeMap;

use dlg_core::SessionSnapshot;
use serde::{Deserialize, Serialize};

pub(crate) const PLAYER_STATE_SCHEMA: &str = "player-state.v1";

#[derive(Debug, Clone)]
pub(crate) struct LoadedStory {
    /// Canonical story path, recorded in saved state.
    pub(crate) path: String,
    pub(crate) locale_path: Option<String>,
    pub(crate) story_json: String,
    pub(crate) localization: Option<BTreeMap<String, String>>,
    pub(crate) variables: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PlayerState {
    pub(crate) schema_version: String,
    pub(crate) story_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) locale_path: Option<String>,
    pub(crate) snapshot: SessionSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BoundaryLine {
    Dialogue {
        speaker: Option<String>,
        text: String,
    },
    Action {
        text: String,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) lines: Vec<BoundaryLine>,
    pub(crate) choices: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

pub(crate) struct PlayCommandContext<'a> {
    pub(crate) state_file: &'a str,
    pub(crate) story: &'a LoadedStory,
}
