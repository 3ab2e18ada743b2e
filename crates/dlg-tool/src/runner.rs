use std::path::Path;
use std::sync::Arc;

use dlg_api::{create_engine_from_json, CreateEngineFromJsonOptions};
use dlg_core::EngineOutput;
use dlg_runtime::Localization;

use crate::source::{read_story_from_dir, read_test_case};
use crate::{DlgToolError, ExpectedEvent, TestAction, TestCase};

const MAX_STEPS: usize = 5_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub observed_events: Vec<ExpectedEvent>,
    pub consumed_actions: usize,
    pub steps: usize,
}

pub fn run_case(story_dir: &Path, case: &TestCase) -> Result<RunReport, DlgToolError> {
    let source = read_story_from_dir(story_dir)?;
    let mut engine = create_engine_from_json(CreateEngineFromJsonOptions {
        story_json: source.story_json,
        variables: case.variables.clone(),
        localization: source
            .localization
            .map(|table| Arc::new(table) as Arc<dyn Localization>),
    })?;

    let mut observed_events = Vec::new();
    let mut action_index = 0usize;

    for step in 1..=MAX_STEPS {
        match engine.next_output()? {
            EngineOutput::Dialogue { speaker, text, .. } => {
                observed_events.push(ExpectedEvent::Dialogue { speaker, text });
            }
            EngineOutput::Action { text } => {
                observed_events.push(ExpectedEvent::Action { text });
            }
            EngineOutput::Choices { items } => {
                observed_events.push(ExpectedEvent::Choices {
                    choices: items.into_iter().map(|item| item.text).collect(),
                });
                let event_index = observed_events.len() - 1;
                let action =
                    case.actions
                        .get(action_index)
                        .ok_or_else(|| DlgToolError::MissingAction {
                            event_index,
                            expected_action_kind: "choose".to_string(),
                        })?;
                match action {
                    TestAction::Choose { index } => engine.choose(*index)?,
                    _ => {
                        return Err(DlgToolError::ActionKindMismatch {
                            event_index,
                            expected_action_kind: "choose".to_string(),
                            actual_action_kind: action.kind_name().to_string(),
                        })
                    }
                }
                action_index += 1;
            }
            EngineOutput::End => {
                observed_events.push(ExpectedEvent::End);
                let event_index = observed_events.len() - 1;
                match case.actions.get(action_index) {
                    Some(TestAction::Restart { reset_history }) => {
                        engine.restart(*reset_history);
                        action_index += 1;
                    }
                    Some(action) => {
                        return Err(DlgToolError::ActionKindMismatch {
                            event_index,
                            expected_action_kind: "restart".to_string(),
                            actual_action_kind: action.kind_name().to_string(),
                        })
                    }
                    None => {
                        return Ok(RunReport {
                            observed_events,
                            consumed_actions: action_index,
                            steps: step,
                        })
                    }
                }
            }
        }
    }

    Err(DlgToolError::GuardExceeded {
        max_steps: MAX_STEPS,
    })
}

pub fn assert_case(story_dir: &Path, case_path: &Path) -> Result<(), DlgToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(story_dir, &case)?;

    if report.observed_events.len() != case.expected_events.len() {
        let observed = serde_json::to_string_pretty(&report.observed_events)
            .map_err(DlgToolError::EventSerialize)?;
        return Err(DlgToolError::EventCountMismatch {
            expected: case.expected_events.len(),
            actual: report.observed_events.len(),
            observed,
        });
    }

    for (index, (expected, actual)) in case
        .expected_events
        .iter()
        .zip(report.observed_events.iter())
        .enumerate()
    {
        if expected != actual {
            let expected = serde_json::to_string(expected).map_err(DlgToolError::EventSerialize)?;
            let actual = serde_json::to_string(actual).map_err(DlgToolError::EventSerialize)?;
            return Err(DlgToolError::EventMismatch {
                index,
                expected,
                actual,
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::TESTCASE_SCHEMA_V1;

    fn temp_dir(name: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should move forward")
            .as_nanos();
        std::env::temp_dir().join(format!("dlg-tool-runner-{}-{}", name, nanos))
    }

    fn write_file(path: &Path, content: &str) {
        let parent = path.parent().expect("path should have parent");
        fs::create_dir_all(parent).expect("parent dir should be created");
        fs::write(path, content).expect("file should be written");
    }

    fn case(actions: Vec<TestAction>, expected_events: Vec<ExpectedEvent>) -> TestCase {
        TestCase {
            schema_version: TESTCASE_SCHEMA_V1.to_string(),
            variables: Default::default(),
            actions,
            expected_events,
        }
    }

    fn dialogue(text: &str) -> ExpectedEvent {
        ExpectedEvent::Dialogue {
            speaker: None,
            text: text.to_string(),
        }
    }

    const LINEAR: &str = r#"{"nodes":[{"lines":[{"kind":"dialogue","index":0,"text":"Hello"}]}]}"#;

    const FORK: &str = r#"{
  "nodes": [
    {
      "name": "fork",
      "lines": [{"kind":"action","text":"seen = true"}],
      "choices": [
        {"kind":"choice","index":0,"text":"Left","target":1},
        {"kind":"choice","index":1,"text":"Right","target":1}
      ]
    },
    {"lines":[{"kind":"dialogue","index":0,"speaker":"Echo","text":"Went {%seen%}"}]}
  ]
}"#;

    #[test]
    fn run_case_executes_linear_story() {
        let root = temp_dir("linear");
        write_file(&root.join("story.json"), LINEAR);

        let case = case(vec![], vec![dialogue("Hello"), ExpectedEvent::End]);
        let report = run_case(&root, &case).expect("run should pass");
        assert_eq!(report.consumed_actions, 0);
        assert_eq!(report.observed_events, case.expected_events);
    }

    #[test]
    fn run_case_consumes_choices_and_restarts() {
        let root = temp_dir("fork");
        write_file(&root.join("story.json"), FORK);

        let case = case(
            vec![
                TestAction::Choose { index: 1 },
                TestAction::Restart {
                    reset_history: true,
                },
                TestAction::Choose { index: 0 },
            ],
            vec![],
        );
        let report = run_case(&root, &case).expect("run should pass");
        assert_eq!(report.consumed_actions, 3);

        let went = ExpectedEvent::Dialogue {
            speaker: Some("Echo".to_string()),
            text: "Went true".to_string(),
        };
        let round = vec![
            ExpectedEvent::Action {
                text: "seen = true".to_string(),
            },
            ExpectedEvent::Choices {
                choices: vec!["Left".to_string(), "Right".to_string()],
            },
            went,
            ExpectedEvent::End,
        ];
        assert_eq!(report.observed_events, [round.clone(), round].concat());
    }

    #[test]
    fn run_case_applies_case_variables_and_localization() {
        let root = temp_dir("localized");
        write_file(
            &root.join("story.json"),
            r#"{"nodes":[{"lines":[{"kind":"dialogue","index":0,"text":"Hi"}]}]}"#,
        );
        write_file(&root.join("localization.json"), r#"{"0.0":"Hola {%who%}"}"#);

        let mut case = case(vec![], vec![dialogue("Hola Ash"), ExpectedEvent::End]);
        case.variables.insert("who".to_string(), "Ash".to_string());
        let report = run_case(&root, &case).expect("run should pass");
        assert_eq!(report.observed_events, case.expected_events);
    }

    #[test]
    fn run_case_reports_missing_or_wrong_actions() {
        let root = temp_dir("actions");
        write_file(&root.join("story.json"), FORK);

        let missing = run_case(&root, &case(vec![], vec![])).expect_err("missing action");
        assert!(matches!(missing, DlgToolError::MissingAction { .. }));

        let wrong = run_case(
            &root,
            &case(
                vec![TestAction::Restart {
                    reset_history: false,
                }],
                vec![],
            ),
        )
        .expect_err("wrong kind");
        assert!(matches!(wrong, DlgToolError::ActionKindMismatch { .. }));

        let unused = run_case(
            &root,
            &case(
                vec![
                    TestAction::Choose { index: 0 },
                    TestAction::Choose { index: 0 },
                ],
                vec![],
            ),
        )
        .expect_err("unused action at end");
        assert!(matches!(unused, DlgToolError::ActionKindMismatch { .. }));
    }

    #[test]
    fn run_case_surfaces_engine_errors() {
        let root = temp_dir("engine-error");
        write_file(
            &root.join("story.json"),
            r#"{"nodes":[{"lines":[{"kind":"action","text":"x = 1 / 0"}]}]}"#,
        );
        let error = run_case(&root, &case(vec![], vec![])).expect_err("division by zero");
        assert!(matches!(error, DlgToolError::Engine(ref inner) if inner.code == "EXPR_DIVIDE_BY_ZERO"));
    }

    #[test]
    fn run_case_reports_guard_exceeded() {
        let root = temp_dir("guard");
        write_file(
            &root.join("story.json"),
            r#"{"nodes":[{"name":"loop","lines":[{"kind":"dialogue","index":0,"text":"tick"},{"kind":"jump","target":0}]}]}"#,
        );
        let error = run_case(&root, &case(vec![], vec![])).expect_err("guard should fail");
        assert!(matches!(error, DlgToolError::GuardExceeded { .. }));
    }

    #[test]
    fn assert_case_reports_count_and_value_mismatches() {
        let root = temp_dir("assert");
        write_file(&root.join("story.json"), LINEAR);

        let count_case = root.join("count.json");
        write_file(
            &count_case,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectedEvents":[{"kind":"end"}]}"#,
        );
        let count_error = assert_case(&root, &count_case).expect_err("count mismatch");
        assert!(matches!(count_error, DlgToolError::EventCountMismatch { .. }));

        let value_case = root.join("value.json");
        write_file(
            &value_case,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectedEvents":[{"kind":"dialogue","text":"Wrong"},{"kind":"end"}]}"#,
        );
        let value_error = assert_case(&root, &value_case).expect_err("value mismatch");
        assert!(matches!(value_error, DlgToolError::EventMismatch { .. }));
    }

    #[test]
    fn assert_case_passes_with_matching_expected_events() {
        let root = temp_dir("assert-pass");
        write_file(&root.join("story.json"), LINEAR);
        let case_path = root.join("testcase.json");
        write_file(
            &case_path,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectedEvents":[{"kind":"dialogue","text":"Hello"},{"kind":"end"}]}"#,
        );
        assert_case(&root, &case_path).expect("assert should pass");
    }
}
