use std::io::{self, BufRead, Write};
use std::path::Path;

use dlg_core::{DialogueError, EngineOutput};
use dlg_runtime::DialogueEngine;

use crate::{
    create_engine_for_story, load_engine_from_state_for_story, map_play_io, save_engine_state,
    PlayCommandAction, PlayCommandContext,
};

const COMMANDS: &str = "commands: :help :save :load :restart :history :vars :quit";

pub(crate) fn run_play_line_mode(
    context: &PlayCommandContext<'_>,
    engine: &mut DialogueEngine,
) -> Result<i32, DialogueError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_play_line_mode_with_io(context, engine, &mut reader, &mut writer)
}

pub(crate) fn run_play_line_mode_with_io(
    context: &PlayCommandContext<'_>,
    engine: &mut DialogueEngine,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, DialogueError> {
    writeln!(writer, "Dialogue player").map_err(map_play_io)?;
    writeln!(writer, "{}", COMMANDS).map_err(map_play_io)?;

    loop {
        // A loaded save may already be paused on its choices.
        let output = match engine.pending_choices() {
            Some(items) => EngineOutput::Choices { items },
            None => engine.next_output()?,
        };
        match output {
            EngineOutput::Dialogue { speaker, text, .. } => {
                writeln!(writer).map_err(map_play_io)?;
                let written = match speaker {
                    Some(speaker) => writeln!(writer, "{}: {}", speaker, text),
                    None => writeln!(writer, "{}", text),
                };
                written.map_err(map_play_io)?;
            }
            EngineOutput::Action { text } => {
                writeln!(writer, "  ({})", text).map_err(map_play_io)?;
            }
            EngineOutput::Choices { items } => {
                writeln!(writer).map_err(map_play_io)?;
                for item in &items {
                    writeln!(writer, "  [{}] {}", item.index, item.text).map_err(map_play_io)?;
                }
                loop {
                    let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                        return Ok(0);
                    };
                    match handle_play_command(raw.as_str(), context, engine, writer)? {
                        PlayCommandAction::Continue => continue,
                        PlayCommandAction::RefreshBoundary => break,
                        PlayCommandAction::Quit => return Ok(0),
                        PlayCommandAction::NotHandled => {}
                    }
                    match raw.trim().parse::<usize>() {
                        Ok(choice) if items.iter().any(|item| item.index == choice) => {
                            engine.choose(choice)?;
                            break;
                        }
                        _ => {
                            writeln!(writer, "unknown choice: {}", raw).map_err(map_play_io)?;
                        }
                    }
                }
            }
            EngineOutput::End => {
                writeln!(writer).map_err(map_play_io)?;
                writeln!(writer, "[END]").map_err(map_play_io)?;
                return Ok(0);
            }
        }
    }
}

pub(crate) fn handle_play_command(
    raw: &str,
    context: &PlayCommandContext<'_>,
    engine: &mut DialogueEngine,
    writer: &mut dyn Write,
) -> Result<PlayCommandAction, DialogueError> {
    match raw.trim() {
        ":help" => {
            writeln!(writer, "{}", COMMANDS).map_err(map_play_io)?;
            Ok(PlayCommandAction::Continue)
        }
        ":save" => {
            save_engine_state(Path::new(context.state_file), engine, context.story)?;
            writeln!(writer, "saved: {}", context.state_file).map_err(map_play_io)?;
            Ok(PlayCommandAction::Continue)
        }
        ":load" => {
            let (_, resumed) =
                load_engine_from_state_for_story(Path::new(context.state_file), context.story)?;
            *engine = resumed;
            writeln!(writer, "loaded: {}", context.state_file).map_err(map_play_io)?;
            Ok(PlayCommandAction::RefreshBoundary)
        }
        ":restart" => {
            *engine = create_engine_for_story(context.story)?;
            writeln!(writer, "restarted").map_err(map_play_io)?;
            Ok(PlayCommandAction::RefreshBoundary)
        }
        ":history" => {
            let story = engine.story();
            for (step, entry) in engine.history().iter().enumerate() {
                let node_id = story.node_id(entry.node_index);
                let written = match entry.choice_index {
                    Some(choice) => writeln!(writer, "{:>3} {} <- choice {}", step, node_id, choice),
                    None => writeln!(writer, "{:>3} {}", step, node_id),
                };
                written.map_err(map_play_io)?;
            }
            Ok(PlayCommandAction::Continue)
        }
        ":vars" => {
            for (name, value) in engine.variables().iter() {
                writeln!(writer, "{} = {}", name, value).map_err(map_play_io)?;
            }
            Ok(PlayCommandAction::Continue)
        }
        ":quit" => {
            writeln!(writer, "bye").map_err(map_play_io)?;
            Ok(PlayCommandAction::Quit)
        }
        _ => Ok(PlayCommandAction::NotHandled),
    }
}

/// Reads one line after printing `prefix`. `None` once input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, DialogueError> {
    write!(writer, "{}", prefix).map_err(map_play_io)?;
    writer.flush().map_err(map_play_io)?;
    let mut input = String::new();
    if reader.read_line(&mut input).map_err(map_play_io)? == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}
