use std::sync::Arc;

use dlg_core::{ConditionalBlock, DialogueError, EngineOutput, LineData, StoryData};
use tracing::debug;

use super::action::run_action;
use super::eval::Evaluator;
use super::frame_stack::Cursor;
use super::lifecycle::DialogueEngine;
use super::template::TextTemplater;

/// Upper bound on jumps followed by a single `next_output` call.
pub const WALK_GUARD: usize = 10_000;

pub(super) enum Resolved<'s> {
    Dialogue {
        index: usize,
        speaker: Option<&'s str>,
        text: &'s str,
    },
    Action(&'s str),
    Jump(usize),
    Exhausted,
}

/// Moves the cursor to the next line that needs the engine's attention. Conditionals are
/// entered (or skipped) and disabled jumps passed over on the way; the returned line itself
/// is not consumed.
pub(super) fn resolve_next<'s>(
    story: &'s StoryData,
    evaluator: &Evaluator<'_>,
    cursor: &mut Cursor,
) -> Result<Resolved<'s>, DialogueError> {
    loop {
        let Some(frame) = cursor.top() else {
            return Ok(Resolved::Exhausted);
        };
        let lines = cursor.lines(story)?;
        let Some(line) = lines.get(frame.next_line) else {
            if cursor.depth() == 1 {
                return Ok(Resolved::Exhausted);
            }
            cursor.leave_branch();
            continue;
        };

        match line {
            LineData::Dialogue {
                index,
                speaker,
                text,
            } => {
                return Ok(Resolved::Dialogue {
                    index: *index,
                    speaker: speaker.as_deref(),
                    text,
                })
            }
            LineData::Action { text } => return Ok(Resolved::Action(text)),
            LineData::Jump {
                target: Some(target),
            } => return Ok(Resolved::Jump(*target)),
            LineData::Jump { target: None } => cursor.bump()?,
            LineData::Conditional(block) => {
                cursor.bump()?;
                if let Some(branch) = select_branch(evaluator, block)? {
                    cursor.enter_branch(frame.next_line, branch);
                }
            }
            LineData::Choice { index, .. } => {
                debug!(choice = index, "skipping choice line found among body lines");
                cursor.bump()?;
            }
        }
    }
}

/// First branch, in declaration order, whose comparison holds.
pub(super) fn select_branch(
    evaluator: &Evaluator<'_>,
    block: &ConditionalBlock,
) -> Result<Option<usize>, DialogueError> {
    for branch in 0..block.branch_count() {
        let Some((comparison, _)) = block.branch(branch) else {
            break;
        };
        if evaluator.condition(comparison)? {
            debug!(branch, comparison, "conditional branch selected");
            return Ok(Some(branch));
        }
    }
    debug!(comparison = %block.comparison, "no conditional branch holds");
    Ok(None)
}

impl DialogueEngine {
    pub fn next_output(&mut self) -> Result<EngineOutput, DialogueError> {
        if self.pending_choices.is_some() {
            return Err(DialogueError::invalid_state(
                "ENGINE_WAITING_CHOICE",
                "A choice must be made before advancing.",
            ));
        }

        if self.ended {
            return Ok(EngineOutput::End);
        }

        let story = Arc::clone(&self.story);
        let mut guard = 0usize;
        while guard < WALK_GUARD {
            guard += 1;

            let resolved = {
                let evaluator = Evaluator::new(&self.variables, &self.paths);
                resolve_next(&story, &evaluator, &mut self.cursor)?
            };

            match resolved {
                Resolved::Dialogue {
                    index,
                    speaker,
                    text,
                } => {
                    self.cursor.bump()?;
                    let node_index = self.cursor.node_index;
                    let id = format!("{}.{}", story.node_id(node_index), index);
                    let text = self.render_text(&id, text, node_index);
                    return Ok(EngineOutput::Dialogue {
                        id,
                        speaker: speaker.map(str::to_string),
                        text,
                    });
                }
                Resolved::Action(text) => {
                    run_action(&mut self.variables, text)?;
                    self.cursor.bump()?;
                    return Ok(EngineOutput::Action {
                        text: text.to_string(),
                    });
                }
                Resolved::Jump(target) => {
                    self.jump_to(target, None)?;
                }
                Resolved::Exhausted => return self.enter_choice_boundary(),
            }
        }

        Err(DialogueError::invalid_state(
            "ENGINE_GUARD_EXCEEDED",
            format!("Execution guard exceeded {} iterations.", WALK_GUARD),
        ))
    }

    /// The next dialogue or action unit if it is reachable without following a jump or
    /// reaching the choice set. Never runs actions or moves the cursor.
    pub fn peek_next(&self) -> Result<Option<EngineOutput>, DialogueError> {
        if self.pending_choices.is_some() || self.ended {
            return Ok(None);
        }

        let mut cursor = self.cursor.clone();
        let evaluator = Evaluator::new(&self.variables, &self.paths);
        let output = match resolve_next(&self.story, &evaluator, &mut cursor)? {
            Resolved::Dialogue {
                index,
                speaker,
                text,
            } => {
                let node_index = cursor.node_index;
                let id = format!("{}.{}", self.story.node_id(node_index), index);
                let text = self.render_text(&id, text, node_index);
                Some(EngineOutput::Dialogue {
                    id,
                    speaker: speaker.map(str::to_string),
                    text,
                })
            }
            Resolved::Action(text) => Some(EngineOutput::Action {
                text: text.to_string(),
            }),
            Resolved::Jump(_) | Resolved::Exhausted => None,
        };
        Ok(output)
    }

    pub fn is_next_line_jump(&self) -> Result<bool, DialogueError> {
        if self.pending_choices.is_some() || self.ended {
            return Ok(false);
        }
        let mut cursor = self.cursor.clone();
        let evaluator = Evaluator::new(&self.variables, &self.paths);
        Ok(matches!(
            resolve_next(&self.story, &evaluator, &mut cursor)?,
            Resolved::Jump(_)
        ))
    }

    /// Evaluates a condition against the live variable store and path counters.
    pub fn evaluate_condition(&self, expr: &str) -> Result<bool, DialogueError> {
        Evaluator::new(&self.variables, &self.paths).condition(expr)
    }

    pub(super) fn render_text(&self, id: &str, raw: &str, node_index: usize) -> String {
        TextTemplater::new(&*self.localization, &self.variables, &self.paths)
            .render(id, raw, node_index)
    }

    pub(super) fn jump_to(
        &mut self,
        target: usize,
        choice_index: Option<usize>,
    ) -> Result<(), DialogueError> {
        if self.story.node(target).is_none() {
            return Err(DialogueError::invalid_input(
                "ENGINE_NODE_NOT_FOUND",
                format!("Jump target node {} not found.", target),
            ));
        }

        let origin = self.cursor.node_index;
        let origin_id = self.story.node_id(origin);
        self.paths
            .record_departure(origin, &origin_id, choice_index, target);
        debug!(from = %origin_id, to = target, choice = ?choice_index, "jump");
        self.cursor = Cursor::at_node(target);
        Ok(())
    }
}
