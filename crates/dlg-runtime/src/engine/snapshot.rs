use dlg_core::{DialogueError, SessionSnapshot};

use super::frame_stack::Cursor;
use super::lifecycle::DialogueEngine;
use super::path_tracker::PathTracker;
use super::variables::VariableStore;

impl DialogueEngine {
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            node_index: self.cursor.node_index,
            frames: self.cursor.to_snapshot(),
            pending_choices: self.pending_choices.clone(),
            ended: self.ended,
            variables: self.variables.snapshot(),
            history: self.paths.history().to_vec(),
            path_counters: self.paths.records(),
            node_counters: self.paths.node_counters(),
        }
    }

    /// Replaces the whole session state. The engine is left untouched on error.
    pub fn resume(&mut self, snapshot: SessionSnapshot) -> Result<(), DialogueError> {
        if snapshot.history.is_empty() {
            return Err(DialogueError::invalid_input(
                "SNAPSHOT_HISTORY_EMPTY",
                "Snapshot history must contain at least one entry.",
            ));
        }
        if let Some(entry) = snapshot
            .history
            .iter()
            .find(|entry| self.story.node(entry.node_index).is_none())
        {
            return Err(DialogueError::invalid_input(
                "SNAPSHOT_NODE_NOT_FOUND",
                format!("Snapshot history refers to missing node {}.", entry.node_index),
            ));
        }
        if let Some(pending) = &snapshot.pending_choices {
            if let Some(choice) = pending
                .iter()
                .find(|choice| matches!(choice.target, Some(target) if self.story.node(target).is_none()))
            {
                return Err(DialogueError::invalid_input(
                    "SNAPSHOT_NODE_NOT_FOUND",
                    format!("Snapshot choice \"{}\" targets a missing node.", choice.item.id),
                ));
            }
        }

        let cursor = Cursor::from_snapshot(&self.story, snapshot.node_index, &snapshot.frames)?;

        let mut variables = VariableStore::default();
        variables.seed(snapshot.variables);

        self.cursor = cursor;
        self.variables = variables;
        self.paths = PathTracker::restore(
            snapshot.history,
            snapshot.path_counters,
            snapshot.node_counters,
        );
        self.pending_choices = snapshot.pending_choices;
        self.ended = snapshot.ended;
        Ok(())
    }
}
