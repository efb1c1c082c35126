use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;
mod utils;

use cmd::{CompleteArgs, GlobalOpts, HelpArgs, ReplArgs, RunArgs};

/// cmdroute - declarative command routing playground
///
/// Runs, completes and documents commands registered on a `CommandManager`.
/// The built-in `team` root is always available; `--config` adds commands
/// from a YAML or JSON command file.
///
///   cmdroute -p team.invite run team invite Steve
///   cmdroute run t create blue --color blue --private
///   cmdroute -p '*' complete --next team invite
///   cmdroute help team create
///   cmdroute -c demos/commands.yaml repl
///
/// Global flags go before the subcommand; `run` and `complete` take every
/// word after it as part of the command line.
///
/// Global flags / env:
///   -v / -vv          Increase verbosity
///   -q / --quiet      Errors only
///   RUST_LOG          Log filter when neither -v nor -q is given (default warn)
///   -c / --config     Command file (or CMDROUTE_CONFIG env)
///   -l / --locale     Issuer locale (e.g. de, en_us)
///   -p / --permission Grant a permission (repeatable, `*` grants all)
#[derive(Parser, Debug)]
#[command(
    name = "cmdroute",
    version,
    author,
    about = "cmdroute - declarative command routing playground",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Command file (YAML, or JSON by extension)
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Locale of the console issuer
    #[arg(short = 'l', long = "locale", global = true, value_name = "LOCALE")]
    locale: Option<String>,

    /// Permission granted to the console issuer (repeatable)
    #[arg(short = 'p', long = "permission", global = true, value_name = "NODE")]
    permissions: Vec<String>,

    /// Disable ANSI colours
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch one command line
    Run(RunArgs),

    /// Print completions for a partial command line
    Complete(CompleteArgs),

    /// List roots, or show paged help for one root
    Help(HelpArgs),

    /// Read command lines from stdin
    Repl(ReplArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level).context("Failed to initialize logging")?;

    let opts = GlobalOpts {
        config: cli.config,
        locale: cli.locale,
        permissions: cli.permissions,
        no_color: cli.no_color,
    };
    let session = match cmd::build_session(&opts) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(2);
        }
    };

    match cli.command {
        Commands::Run(args) => {
            if !cmd::execute_run(&session, args)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Complete(args) => cmd::execute_complete(&session, args),
        Commands::Help(args) => cmd::execute_help(&session, args),
        Commands::Repl(args) => cmd::execute_repl(&session, args),
    }
}
