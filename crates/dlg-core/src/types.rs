use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Immutable story tree handed to a session. Node 0 is the entry node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryData {
    #[serde(default)]
    pub version: String,
    pub nodes: Vec<NodeData>,
    /// Persisted variable pairs merged into the store at session start.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

impl StoryData {
    pub fn node(&self, index: usize) -> Option<&NodeData> {
        self.nodes.get(index)
    }

    pub fn node_id(&self, index: usize) -> String {
        match self.nodes.get(index) {
            Some(node) => node.id(index),
            None => index.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lines: Vec<LineData>,
    #[serde(default)]
    pub choices: Vec<LineData>,
}

impl NodeData {
    /// Explicit name, or the positional index when the node is unnamed.
    pub fn id(&self, index: usize) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => index.to_string(),
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LineData {
    #[serde(rename_all = "camelCase")]
    Dialogue {
        index: usize,
        #[serde(default)]
        speaker: Option<String>,
        text: String,
    },
    Action {
        text: String,
    },
    Jump {
        #[serde(default)]
        target: Option<usize>,
    },
    Conditional(ConditionalBlock),
    Choice {
        index: usize,
        text: String,
        #[serde(default)]
        target: Option<usize>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalBlock {
    #[serde(default)]
    pub comparison: String,
    #[serde(default)]
    pub lines: Vec<LineData>,
    #[serde(default)]
    pub alternatives: Vec<ConditionalBranch>,
}

impl ConditionalBlock {
    /// Branch 0 is the primary body, branch `n` is `alternatives[n - 1]`.
    pub fn branch(&self, branch: usize) -> Option<(&str, &[LineData])> {
        if branch == 0 {
            return Some((self.comparison.as_str(), self.lines.as_slice()));
        }
        self.alternatives
            .get(branch - 1)
            .map(|alt| (alt.comparison.as_str(), alt.lines.as_slice()))
    }

    pub fn branch_count(&self) -> usize {
        self.alternatives.len() + 1
    }
}

/// An else-if (or, with an empty comparison, else) arm of a conditional block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalBranch {
    #[serde(default)]
    pub comparison: String,
    #[serde(default)]
    pub lines: Vec<LineData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceItem {
    pub index: usize,
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineOutput {
    Dialogue {
        id: String,
        speaker: Option<String>,
        text: String,
    },
    Action {
        text: String,
    },
    Choices {
        items: Vec<ChoiceItem>,
    },
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub node_index: usize,
    pub choice_index: Option<usize>,
}

impl HistoryEntry {
    pub fn root() -> Self {
        Self {
            node_index: 0,
            choice_index: None,
        }
    }
}

/// Which conditional branch a cursor frame walks: the block sits at `line` of the parent frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchRef {
    pub line: usize,
    pub branch: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotFrame {
    pub branch: Option<BranchRef>,
    pub next_line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChoice {
    pub item: ChoiceItem,
    pub target: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCounterRecord {
    pub node_id: String,
    pub choice_index: Option<usize>,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub node_index: usize,
    pub frames: Vec<SnapshotFrame>,
    #[serde(default)]
    pub pending_choices: Option<Vec<PendingChoice>>,
    #[serde(default)]
    pub ended: bool,
    pub variables: BTreeMap<String, String>,
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub path_counters: Vec<PathCounterRecord>,
    #[serde(default)]
    pub node_counters: BTreeMap<usize, u32>,
}

#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn node_id_prefers_name_and_falls_back_to_index() {
        let story = StoryData {
            version: String::new(),
            nodes: vec![
                NodeData {
                    name: Some("hub".to_string()),
                    ..NodeData::default()
                },
                NodeData::default(),
                NodeData {
                    name: Some(String::new()),
                    ..NodeData::default()
                },
            ],
            variables: BTreeMap::new(),
        };
        assert_eq!(story.node_id(0), "hub");
        assert_eq!(story.node_id(1), "1");
        assert_eq!(story.node_id(2), "2");
        assert_eq!(story.nodes[2].display_name(), None);
    }

    #[test]
    fn conditional_branch_indexes_primary_then_alternatives() {
        let block = ConditionalBlock {
            comparison: "a".to_string(),
            lines: vec![LineData::Action {
                text: "x = 1".to_string(),
            }],
            alternatives: vec![ConditionalBranch {
                comparison: String::new(),
                lines: Vec::new(),
            }],
        };
        assert_eq!(block.branch_count(), 2);
        assert_eq!(block.branch(0).map(|(cmp, _)| cmp), Some("a"));
        assert_eq!(block.branch(1).map(|(cmp, lines)| (cmp, lines.len())), Some(("", 0)));
        assert!(block.branch(2).is_none());
    }

    #[test]
    fn story_json_uses_kind_tags() {
        let story: StoryData = serde_json::from_str(
            r#"{
  "nodes": [
    {
      "name": "start",
      "lines": [
        {"kind": "dialogue", "index": 0, "speaker": "Ann", "text": "Hi"},
        {"kind": "action", "text": "met = true"},
        {"kind": "conditional", "comparison": "met", "lines": [{"kind": "jump", "target": 1}],
         "alternatives": [{"comparison": "", "lines": [{"kind": "jump"}]}]}
      ],
      "choices": [{"kind": "choice", "index": 0, "text": "Go", "target": 1}]
    },
    {}
  ],
  "variables": {"Gold": "3"}
}"#,
        )
        .expect("story should deserialize");

        assert_eq!(story.nodes.len(), 2);
        assert!(matches!(
            story.nodes[0].lines[2],
            LineData::Conditional(ConditionalBlock { ref alternatives, .. }) if alternatives.len() == 1
        ));
        assert_eq!(story.variables.get("Gold").map(String::as_str), Some("3"));
        assert!(story.nodes[1].lines.is_empty());
    }

    #[test]
    fn engine_output_serializes_with_kind() {
        let json = serde_json::to_string(&EngineOutput::End).expect("serialize");
        assert_eq!(json, r#"{"kind":"end"}"#);
    }
}
