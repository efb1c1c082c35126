/*!
run.rs - dispatch one command line.

  cmdroute run team invite Steve
  cmdroute run -- team create blue --color blue
*/

use anyhow::Result;
use clap::Args;

use cmdroute::Outcome;

use super::shared::{Session, join_words};

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Command line words (root label first)
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true, value_name = "WORDS")]
    pub words: Vec<String>,
}

/// Returns whether a handler ran successfully.
pub fn execute_run(session: &Session, args: RunArgs) -> Result<bool> {
    let line = join_words(&args.words);
    log::debug!("dispatching: {line}");
    let outcome = session.manager.dispatch_line(&session.issuer, &line);
    match &outcome {
        Outcome::Executed { command } => log::debug!("executed {command}"),
        Outcome::Rejected(rejected) => log::debug!("rejected: {}", rejected.message()),
        other => log::debug!("outcome: {other:?}"),
    }
    Ok(outcome.is_success())
}
