use std::sync::Arc;

use dlg_core::{ChoiceItem, DialogueError, EngineOutput, LineData, PendingChoice};
use tracing::{debug, warn};

use super::eval::Evaluator;
use super::lifecycle::DialogueEngine;
use super::step::select_branch;

impl DialogueEngine {
    /// Node body exhausted: gather the visible choices, or end the path when there are none.
    pub(super) fn enter_choice_boundary(&mut self) -> Result<EngineOutput, DialogueError> {
        let story = Arc::clone(&self.story);
        let node_index = self.cursor.node_index;
        let node = story.node(node_index).ok_or_else(|| {
            DialogueError::invalid_input(
                "ENGINE_NODE_NOT_FOUND",
                format!("Node {} not found.", node_index),
            )
        })?;

        let mut visible = Vec::new();
        {
            let evaluator = Evaluator::new(&self.variables, &self.paths);
            collect_choice_lines(&evaluator, &node.choices, &mut visible)?;
        }

        if visible.is_empty() {
            debug!(node = node_index, "no visible choices, ending path");
            self.ended = true;
            return Ok(EngineOutput::End);
        }

        let node_id = story.node_id(node_index);
        let pending = visible
            .into_iter()
            .map(|(index, text, target)| {
                let id = format!("{}${}", node_id, index);
                let text = self.render_text(&id, text, node_index);
                PendingChoice {
                    item: ChoiceItem { index, id, text },
                    target,
                }
            })
            .collect::<Vec<_>>();

        let items = pending
            .iter()
            .map(|choice| choice.item.clone())
            .collect::<Vec<_>>();
        self.pending_choices = Some(pending);
        Ok(EngineOutput::Choices { items })
    }

    pub fn choose(&mut self, index: usize) -> Result<(), DialogueError> {
        let Some(pending) = self.pending_choices.as_ref() else {
            return Err(DialogueError::invalid_state(
                "ENGINE_NO_PENDING_CHOICE",
                "No pending choice is available.",
            ));
        };

        let target = pending
            .iter()
            .find(|choice| choice.item.index == index)
            .and_then(|choice| choice.target);

        match target {
            Some(target) => {
                self.jump_to(target, Some(index))?;
                self.pending_choices = None;
            }
            None => {
                warn!(
                    node = self.cursor.node_index,
                    choice = index,
                    "choice has no target, ending path"
                );
                self.pending_choices = None;
                self.ended = true;
            }
        }
        Ok(())
    }

    /// Choices shown at the current pause, if any.
    pub fn pending_choices(&self) -> Option<Vec<ChoiceItem>> {
        self.pending_choices.as_ref().map(|pending| {
            pending
                .iter()
                .map(|choice| choice.item.clone())
                .collect()
        })
    }
}

/// Choice lines in order, descending into the first holding branch of each conditional.
fn collect_choice_lines<'s>(
    evaluator: &Evaluator<'_>,
    lines: &'s [LineData],
    out: &mut Vec<(usize, &'s str, Option<usize>)>,
) -> Result<(), DialogueError> {
    for line in lines {
        match line {
            LineData::Choice {
                index,
                text,
                target,
            } => out.push((*index, text.as_str(), *target)),
            LineData::Conditional(block) => {
                if let Some(branch) = select_branch(evaluator, block)? {
                    if let Some((_, body)) = block.branch(branch) {
                        collect_choice_lines(evaluator, body, out)?;
                    }
                }
            }
            _ => debug!("skipping non-choice line among choice lines"),
        }
    }
    Ok(())
}
