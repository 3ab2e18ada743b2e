use dlg_core::{DialogueError, EngineOutput};
use dlg_runtime::DialogueEngine;

use crate::{BoundaryEvent, BoundaryLine, BoundaryResult};

const MAX_BOUNDARY_LINES: usize = 10_000;

pub(crate) fn run_to_boundary(engine: &mut DialogueEngine) -> Result<BoundaryResult, DialogueError> {
    let mut lines = Vec::new();

    while lines.len() < MAX_BOUNDARY_LINES {
        match engine.next_output()? {
            EngineOutput::Dialogue { speaker, text, .. } => {
                lines.push(BoundaryLine::Dialogue { speaker, text })
            }
            EngineOutput::Action { text } => lines.push(BoundaryLine::Action { text }),
            EngineOutput::Choices { items } => {
                return Ok(BoundaryResult {
                    event: BoundaryEvent::Choices,
                    lines,
                    choices: items
                        .into_iter()
                        .map(|item| (item.index, item.text))
                        .collect(),
                })
            }
            EngineOutput::End => {
                return Ok(BoundaryResult {
                    event: BoundaryEvent::End,
                    lines,
                    choices: Vec::new(),
                })
            }
        }
    }

    Err(DialogueError::invalid_state(
        "CLI_BOUNDARY_GUARD",
        format!(
            "No choice or end reached within {} lines.",
            MAX_BOUNDARY_LINES
        ),
    ))
}

pub(crate) fn emit_boundary(boundary: BoundaryResult, state_out: Option<String>) {
    println!("RESULT:OK");
    match boundary.event {
        BoundaryEvent::Choices => println!("EVENT:CHOICES"),
        BoundaryEvent::End => println!("EVENT:END"),
    }

    for line in boundary.lines {
        match line {
            BoundaryLine::Dialogue { speaker, text } => {
                if let Some(speaker) = speaker {
                    println!(
                        "SPEAKER_JSON:{}",
                        serde_json::to_string(&speaker).expect("string json")
                    );
                }
                println!(
                    "TEXT_JSON:{}",
                    serde_json::to_string(&text).expect("string json")
                );
            }
            BoundaryLine::Action { text } => {
                println!(
                    "ACTION_JSON:{}",
                    serde_json::to_string(&text).expect("string json")
                );
            }
        }
    }

    for (index, text) in boundary.choices {
        println!(
            "CHOICE:{}|{}",
            index,
            serde_json::to_string(&text).expect("string json")
        );
    }

    println!(
        "STATE_OUT:{}",
        state_out.unwrap_or_else(|| "NONE".to_string())
    );
}

#[cfg(test)]
mod boundary_runner_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::{create_engine_for_story, load_story};

    #[test]
    fn run_to_boundary_collects_lines_until_choices() {
        let story = load_story(&demo_story_path("02-hub"), None, Default::default())
            .expect("story should load");
        let mut engine = create_engine_for_story(&story).expect("engine should build");

        let boundary = run_to_boundary(&mut engine).expect("boundary should resolve");
        assert_eq!(boundary.event, BoundaryEvent::Choices);
        assert_eq!(
            boundary.lines,
            vec![BoundaryLine::Dialogue {
                speaker: Some("Keeper".to_string()),
                text: "Welcome.".to_string(),
            }]
        );
        assert_eq!(
            boundary.choices,
            vec![
                (0, "Ask about the well".to_string()),
                (2, "Leave".to_string())
            ]
        );
    }

    #[test]
    fn run_to_boundary_reports_end_with_actions() {
        let story = load_story(&demo_story_path("01-linear"), None, Default::default())
            .expect("story should load");
        let mut engine = create_engine_for_story(&story).expect("engine should build");

        let boundary = run_to_boundary(&mut engine).expect("boundary should resolve");
        assert_eq!(boundary.event, BoundaryEvent::End);
        assert!(boundary.choices.is_empty());
        assert!(boundary
            .lines
            .iter()
            .any(|line| matches!(line, BoundaryLine::Action { .. })));

        emit_boundary(boundary, None);
    }

    #[test]
    fn run_to_boundary_stops_runaway_dialogue_loops() {
        let path = temp_path("looping-story.json");
        write_file(
            &path,
            r#"{"nodes":[{"lines":[{"kind":"dialogue","index":0,"text":"again"},{"kind":"jump","target":0}]}]}"#,
        );
        let story = load_story(path.to_string_lossy().as_ref(), None, Default::default())
            .expect("story should load");
        let mut engine = create_engine_for_story(&story).expect("engine should build");

        let error = run_to_boundary(&mut engine).expect_err("loop should hit the guard");
        assert_eq!(error.code, "CLI_BOUNDARY_GUARD");
    }
}
