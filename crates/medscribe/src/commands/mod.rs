//! Command dispatch: bridges CLI args -> core services -> output formatting.

pub mod ai;
pub mod config_cmd;
pub mod entitlements;
pub mod serve;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command that talks to upstreams or evaluates entitlements.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status(args) => entitlements::status(&args, global).await,
        Command::Gate(args) => entitlements::gate(&args, global).await,
        Command::Limits => entitlements::limits(global),
        Command::Evaluate(args) => entitlements::evaluate(&args, global),
        Command::Generate(args) => ai::generate(&args, global).await,
        Command::Write(args) => ai::write(&args, global).await,
        Command::Enhance(args) => ai::enhance(&args, global).await,
        Command::Transcribe(args) => ai::transcribe(&args, global).await,
        Command::Serve(args) => serve::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(args, global),
        Command::Completions(_) => Err(CliError::Internal(
            "completions are generated before dispatch".into(),
        )),
    }
}
