use std::path::Path;

use dlg_core::DialogueError;
use dlg_runtime::DialogueEngine;

use crate::{
    create_engine_for_story, emit_boundary_with_saved_state, load_engine_from_state, load_story,
    run_to_boundary, AgentArgs, AgentCommand, ChooseArgs, StartArgs,
};

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, DialogueError> {
    match args.command {
        AgentCommand::Start(args) => run_start(args),
        AgentCommand::Choose(args) => run_choose(args),
    }
}

pub(super) fn run_start(args: StartArgs) -> Result<i32, DialogueError> {
    let story = load_story(
        &args.story,
        args.locale.as_deref(),
        args.vars.into_iter().collect(),
    )?;
    let mut engine = create_engine_for_story(&story)?;

    let boundary = run_to_boundary(&mut engine)?;
    emit_boundary_with_saved_state(&engine, boundary, &args.state_out, &story)
}

pub(super) fn run_choose(args: ChooseArgs) -> Result<i32, DialogueError> {
    run_state_transition(&args.state_in, &args.state_out, |engine| {
        engine.choose(args.choice)
    })
}

fn run_state_transition(
    state_in: &str,
    state_out: &str,
    transition: impl FnOnce(&mut DialogueEngine) -> Result<(), DialogueError>,
) -> Result<i32, DialogueError> {
    let (story, _state, mut engine) = load_engine_from_state(Path::new(state_in))?;
    transition(&mut engine)?;
    let boundary = run_to_boundary(&mut engine)?;
    emit_boundary_with_saved_state(&engine, boundary, state_out, &story)
}
