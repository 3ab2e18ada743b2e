use std::ffi::OsString;

use clap::Parser;
use dlg_core::DialogueError;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_play;
mod models;
mod session_ops;
mod state_store;
mod story_loader;

pub(crate) use boundary_runner::{emit_boundary, run_to_boundary};
pub(crate) use cli_args::{AgentArgs, AgentCommand, ChooseArgs, Cli, Mode, PlayArgs, StartArgs};
pub(crate) use error_map::{
    emit_error, map_cli_locale_read, map_cli_state_encode, map_cli_state_invalid,
    map_cli_state_read, map_cli_state_write, map_cli_story_path, map_cli_story_read, map_play_io,
};
pub(crate) use line_play::run_play_line_mode;
pub(crate) use models::{
    BoundaryEvent, BoundaryLine, BoundaryResult, LoadedStory, PlayCommandAction,
    PlayCommandContext, PlayerState, PLAYER_STATE_SCHEMA,
};
pub(crate) use session_ops::{
    create_engine_for_story, emit_boundary_with_saved_state, load_engine_from_state,
    load_engine_from_state_for_story, save_engine_state,
};
pub(crate) use state_store::{load_player_state, save_player_state};
pub(crate) use story_loader::{load_story, load_story_for_state};

const DEFAULT_STATE_FILE: &str = ".dialogue/save.json";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Play(args) => run_play(args),
    }
}

fn run_play(args: PlayArgs) -> Result<i32, DialogueError> {
    let state_file = args
        .state_file
        .unwrap_or_else(|| DEFAULT_STATE_FILE.to_string());
    let story = load_story(
        &args.story,
        args.locale.as_deref(),
        args.vars.into_iter().collect(),
    )?;
    let mut engine = create_engine_for_story(&story)?;
    let context = PlayCommandContext {
        state_file: &state_file,
        story: &story,
    };
    run_play_line_mode(&context, &mut engine)
}

#[cfg(test)]
pub(crate) mod cli_test_support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("dlg-cli-{}-{}", nanos, name))
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }

    pub(crate) fn demo_story_path(name: &str) -> String {
        dlg_test_example::story_path(name)
            .to_string_lossy()
            .to_string()
    }

    pub(crate) fn demo_locale_path(name: &str) -> String {
        dlg_test_example::story_dir(name)
            .join("localization.json")
            .to_string_lossy()
            .to_string()
    }
}
