use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use dlg_core::{DialogueError, HistoryEntry, PendingChoice, StoryData};

use super::frame_stack::Cursor;
use super::path_tracker::PathTracker;
use super::variables::VariableStore;

/// Lookup side of a localization table, keyed by rendered-line identity.
pub trait Localization: Send + Sync {
    fn lookup(&self, id: &str) -> Option<&str>;
}

#[derive(Debug, Default)]
pub struct EmptyLocalization;

impl Localization for EmptyLocalization {
    fn lookup(&self, _id: &str) -> Option<&str> {
        None
    }
}

impl Localization for BTreeMap<String, String> {
    fn lookup(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

impl Localization for HashMap<String, String> {
    fn lookup(&self, id: &str) -> Option<&str> {
        self.get(id).map(String::as_str)
    }
}

#[derive(Clone)]
pub struct DialogueEngineOptions {
    pub story: Arc<StoryData>,
    /// Caller defaults. Story-persisted variables never overwrite these.
    pub variables: BTreeMap<String, String>,
    pub localization: Option<Arc<dyn Localization>>,
}

impl DialogueEngineOptions {
    pub fn new(story: Arc<StoryData>) -> Self {
        Self {
            story,
            variables: BTreeMap::new(),
            localization: None,
        }
    }
}

pub struct DialogueEngine {
    pub(super) story: Arc<StoryData>,
    pub(super) localization: Arc<dyn Localization>,
    pub(super) variables: VariableStore,
    pub(super) paths: PathTracker,
    pub(super) cursor: Cursor,
    pub(super) pending_choices: Option<Vec<PendingChoice>>,
    pub(super) ended: bool,
}

impl DialogueEngine {
    pub fn new(options: DialogueEngineOptions) -> Result<Self, DialogueError> {
        if options.story.nodes.is_empty() {
            return Err(DialogueError::invalid_input(
                "STORY_EMPTY",
                "The story data doesn't have at least one node.",
            ));
        }

        let mut variables = VariableStore::from_defaults(options.variables);
        variables.seed(options.story.variables.iter());

        Ok(Self {
            story: options.story,
            localization: options
                .localization
                .unwrap_or_else(|| Arc::new(EmptyLocalization)),
            variables,
            paths: PathTracker::new(),
            cursor: Cursor::at_node(0),
            pending_choices: None,
            ended: false,
        })
    }

    /// Moves the cursor back to node 0. Path counters survive; history only grows.
    pub fn restart(&mut self, reset_history: bool) {
        self.cursor = Cursor::at_node(0);
        self.pending_choices = None;
        self.ended = false;
        if reset_history {
            self.paths.push_root();
        }
    }

    pub fn story(&self) -> &Arc<StoryData> {
        &self.story
    }

    pub fn waiting_choice(&self) -> bool {
        self.pending_choices.is_some()
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn current_node_index(&self) -> usize {
        self.paths.current().node_index
    }

    pub fn current_node_name(&self) -> Option<&str> {
        self.story
            .node(self.current_node_index())
            .and_then(|node| node.display_name())
    }

    pub fn current_node_id(&self) -> String {
        self.story.node_id(self.current_node_index())
    }

    pub fn history(&self) -> &[HistoryEntry] {
        self.paths.history()
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name)
    }

    pub fn path_count(&self, name: &str) -> u32 {
        self.paths.count(name)
    }

    pub fn path_exists(&self, name: &str) -> bool {
        self.paths.exists(name)
    }
}
