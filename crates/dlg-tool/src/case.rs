use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "dlg-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Caller defaults handed to the engine before the story's own variables.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub actions: Vec<TestAction>,
    #[serde(default)]
    pub expected_events: Vec<ExpectedEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TestAction {
    Choose {
        index: usize,
    },
    /// Consumed at an `end` event to replay the story from node 0.
    Restart {
        #[serde(default, rename = "resetHistory")]
        reset_history: bool,
    },
}

impl TestAction {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Choose { .. } => "choose",
            Self::Restart { .. } => "restart",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExpectedEvent {
    Dialogue {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speaker: Option<String>,
        text: String,
    },
    Action {
        text: String,
    },
    Choices {
        choices: Vec<String>,
    },
    End,
}
