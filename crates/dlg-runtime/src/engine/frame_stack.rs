use dlg_core::{BranchRef, DialogueError, LineData, SnapshotFrame, StoryData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RuntimeFrame {
    /// `None` only for the node's body frame.
    pub(crate) branch: Option<BranchRef>,
    pub(crate) next_line: usize,
}

/// Position inside the active node: the body frame plus one frame per entered conditional branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub(crate) node_index: usize,
    pub(crate) frames: Vec<RuntimeFrame>,
}

impl Cursor {
    pub(crate) fn at_node(node_index: usize) -> Self {
        Self {
            node_index,
            frames: vec![RuntimeFrame {
                branch: None,
                next_line: 0,
            }],
        }
    }

    pub(crate) fn top(&self) -> Option<RuntimeFrame> {
        self.frames.last().copied()
    }

    pub(crate) fn depth(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn bump(&mut self) -> Result<(), DialogueError> {
        let frame = self.frames.last_mut().ok_or_else(no_frame)?;
        frame.next_line += 1;
        Ok(())
    }

    pub(crate) fn enter_branch(&mut self, line: usize, branch: usize) {
        self.frames.push(RuntimeFrame {
            branch: Some(BranchRef { line, branch }),
            next_line: 0,
        });
    }

    pub(crate) fn leave_branch(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Lines walked by the top frame.
    pub(crate) fn lines<'s>(&self, story: &'s StoryData) -> Result<&'s [LineData], DialogueError> {
        frame_lines(story, self.node_index, &self.frames)
    }

    pub(crate) fn to_snapshot(&self) -> Vec<SnapshotFrame> {
        self.frames
            .iter()
            .map(|frame| SnapshotFrame {
                branch: frame.branch,
                next_line: frame.next_line,
            })
            .collect()
    }

    /// Rebuilds a cursor and checks every frame still resolves against `story`.
    pub(crate) fn from_snapshot(
        story: &StoryData,
        node_index: usize,
        frames: &[SnapshotFrame],
    ) -> Result<Self, DialogueError> {
        let cursor = Self {
            node_index,
            frames: frames
                .iter()
                .map(|frame| RuntimeFrame {
                    branch: frame.branch,
                    next_line: frame.next_line,
                })
                .collect(),
        };
        for depth in 1..=cursor.frames.len() {
            frame_lines(story, node_index, &cursor.frames[..depth])?;
        }
        Ok(cursor)
    }
}

pub(crate) fn frame_lines<'s>(
    story: &'s StoryData,
    node_index: usize,
    frames: &[RuntimeFrame],
) -> Result<&'s [LineData], DialogueError> {
    let node = story.node(node_index).ok_or_else(|| {
        DialogueError::invalid_input(
            "ENGINE_NODE_NOT_FOUND",
            format!("Node {} not found.", node_index),
        )
    })?;

    let Some((root, nested)) = frames.split_first() else {
        return Err(no_frame());
    };
    if root.branch.is_some() {
        return Err(frame_invalid(node_index));
    }

    let mut lines = node.lines.as_slice();
    for frame in nested {
        let Some(BranchRef { line, branch }) = frame.branch else {
            return Err(frame_invalid(node_index));
        };
        let Some(LineData::Conditional(block)) = lines.get(line) else {
            return Err(frame_invalid(node_index));
        };
        let Some((_, body)) = block.branch(branch) else {
            return Err(frame_invalid(node_index));
        };
        lines = body;
    }
    Ok(lines)
}

fn no_frame() -> DialogueError {
    DialogueError::invalid_state("ENGINE_NO_FRAME", "No traversal frame available.")
}

fn frame_invalid(node_index: usize) -> DialogueError {
    DialogueError::invalid_state(
        "ENGINE_FRAME_INVALID",
        format!("Traversal frame does not match node {}.", node_index),
    )
}

#[cfg(test)]
mod frame_stack_tests {
    use super::*;
    use crate::engine::runtime_test_support::*;

    #[test]
    fn nested_frames_resolve_to_branch_bodies() {
        let story = story(vec![node(
            None,
            vec![
                dialogue(0, "before"),
                cond(
                    "a",
                    vec![dialogue(1, "primary")],
                    vec![alt("", vec![dialogue(2, "else"), dialogue(3, "more")])],
                ),
            ],
            vec![],
        )]);

        let mut cursor = Cursor::at_node(0);
        assert_eq!(cursor.lines(&story).expect("root").len(), 2);
        cursor.enter_branch(1, 1);
        let lines = cursor.lines(&story).expect("alternative");
        assert_eq!(lines.len(), 2);
        assert_eq!(cursor.depth(), 2);

        cursor.bump().expect("bump");
        assert_eq!(cursor.top().map(|frame| frame.next_line), Some(1));
        cursor.leave_branch();
        cursor.leave_branch();
        assert_eq!(cursor.depth(), 1);
    }

    #[test]
    fn frames_pointing_at_non_conditionals_are_rejected() {
        let story = story(vec![node(None, vec![dialogue(0, "plain")], vec![])]);
        let frames = vec![
            SnapshotFrame {
                branch: None,
                next_line: 1,
            },
            SnapshotFrame {
                branch: Some(BranchRef { line: 0, branch: 0 }),
                next_line: 0,
            },
        ];
        let error = Cursor::from_snapshot(&story, 0, &frames).expect_err("invalid frame");
        assert_eq!(error.code, "ENGINE_FRAME_INVALID");

        let error = Cursor::from_snapshot(&story, 4, &frames[..1]).expect_err("missing node");
        assert_eq!(error.code, "ENGINE_NODE_NOT_FOUND");

        let error = Cursor::from_snapshot(&story, 0, &[]).expect_err("no frames");
        assert_eq!(error.code, "ENGINE_NO_FRAME");
    }

    #[test]
    fn snapshot_frames_round_trip() {
        let story = story(vec![node(
            None,
            vec![cond("", vec![dialogue(0, "x")], vec![])],
            vec![],
        )]);
        let mut cursor = Cursor::at_node(0);
        cursor.bump().expect("bump");
        cursor.enter_branch(0, 0);
        let restored =
            Cursor::from_snapshot(&story, 0, &cursor.to_snapshot()).expect("restore");
        assert_eq!(restored, cursor);
    }
}
