mod action;
mod boundary;
mod eval;
mod frame_stack;
mod lifecycle;
mod path_tracker;
mod snapshot;
mod step;
mod template;
mod variables;


pub use lifecycle::{DialogueEngine, DialogueEngineOptions, EmptyLocalization, Localization};
pub use step::WALK_GUARD;
pub use variables::VariableStore;

#[cfg(test)]
pub(crate) mod runtime_test_support {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    pub(crate) use super::{DialogueEngine, DialogueEngineOptions};
    pub(crate) use dlg_core::{
        ConditionalBlock, ConditionalBranch, EngineOutput, HistoryEntry, LineData, NodeData,
        StoryData,
    };

    pub(crate) fn story(nodes: Vec<NodeData>) -> StoryData {
        StoryData {
            version: "test".to_string(),
            nodes,
            variables: BTreeMap::new(),
        }
    }

    pub(crate) fn node(name: Option<&str>, lines: Vec<LineData>, choices: Vec<LineData>) -> NodeData {
        NodeData {
            name: name.map(str::to_string),
            lines,
            choices,
        }
    }

    pub(crate) fn dialogue(index: usize, text: &str) -> LineData {
        LineData::Dialogue {
            index,
            speaker: None,
            text: text.to_string(),
        }
    }

    pub(crate) fn speaker_line(index: usize, speaker: &str, text: &str) -> LineData {
        LineData::Dialogue {
            index,
            speaker: Some(speaker.to_string()),
            text: text.to_string(),
        }
    }

    pub(crate) fn action(text: &str) -> LineData {
        LineData::Action {
            text: text.to_string(),
        }
    }

    pub(crate) fn jump(target: usize) -> LineData {
        LineData::Jump {
            target: Some(target),
        }
    }

    pub(crate) fn jump_none() -> LineData {
        LineData::Jump { target: None }
    }

    pub(crate) fn cond(
        comparison: &str,
        lines: Vec<LineData>,
        alternatives: Vec<ConditionalBranch>,
    ) -> LineData {
        LineData::Conditional(ConditionalBlock {
            comparison: comparison.to_string(),
            lines,
            alternatives,
        })
    }

    pub(crate) fn alt(comparison: &str, lines: Vec<LineData>) -> ConditionalBranch {
        ConditionalBranch {
            comparison: comparison.to_string(),
            lines,
        }
    }

    pub(crate) fn choice(index: usize, text: &str, target: Option<usize>) -> LineData {
        LineData::Choice {
            index,
            text: text.to_string(),
            target,
        }
    }

    pub(crate) fn engine_for(nodes: Vec<NodeData>) -> DialogueEngine {
        engine_with_vars(nodes, &[])
    }

    pub(crate) fn engine_with_vars(nodes: Vec<NodeData>, vars: &[(&str, &str)]) -> DialogueEngine {
        DialogueEngine::new(DialogueEngineOptions {
            story: Arc::new(story(nodes)),
            variables: vars
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
            localization: None,
        })
        .expect("engine should build")
    }

    /// Collects every output until End, answering choice sets from `picks` and then with the
    /// first offered item.
    pub(crate) fn drive_to_end(engine: &mut DialogueEngine, picks: &[usize]) -> Vec<EngineOutput> {
        let mut picks = picks.iter().copied();
        let mut outputs = Vec::new();
        for _ in 0..1_000usize {
            let output = engine.next_output().expect("next should pass");
            outputs.push(output.clone());
            match output {
                EngineOutput::Choices { items } => {
                    let index = picks
                        .next()
                        .or_else(|| items.first().map(|item| item.index))
                        .unwrap_or(0);
                    engine.choose(index).expect("choose should pass");
                }
                EngineOutput::End => return outputs,
                EngineOutput::Dialogue { .. } | EngineOutput::Action { .. } => {}
            }
        }
        panic!("story did not end within 1000 outputs");
    }
}
