use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dlg-cli")]
#[command(about = "Branching dialogue player CLI")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Start(StartArgs),
    Choose(ChooseArgs),
}

#[derive(Debug, Args)]
pub(crate) struct StartArgs {
    #[arg(long = "story")]
    pub(crate) story: String,
    /// Localization table, a flat JSON object keyed by line id.
    #[arg(long = "locale")]
    pub(crate) locale: Option<String>,
    #[arg(long = "var", value_parser = parse_var)]
    pub(crate) vars: Vec<(String, String)>,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct ChooseArgs {
    #[arg(long = "state-in")]
    pub(crate) state_in: String,
    #[arg(long = "choice")]
    pub(crate) choice: usize,
    #[arg(long = "state-out")]
    pub(crate) state_out: String,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "story")]
    pub(crate) story: String,
    #[arg(long = "locale")]
    pub(crate) locale: Option<String>,
    #[arg(long = "var", value_parser = parse_var)]
    pub(crate) vars: Vec<(String, String)>,
    #[arg(long = "state-file")]
    pub(crate) state_file: Option<String>,
}

/// `name=value`; the value may itself contain `=`.
pub(crate) fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got \"{}\"", raw)),
    }
}
