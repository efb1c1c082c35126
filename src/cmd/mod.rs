/*!
Subcommands of the `cmdroute` demo binary.

Layout:
  src/cmd/
    mod.rs          (this file)
    shared.rs       (GlobalOpts, ConsoleIssuer, build_session)
    demo.rs         (built-in `team` root + command-file handlers)
    format.rs       (column table)
    run.rs          (RunArgs      + execute_run)
    complete.rs     (CompleteArgs + execute_complete)
    help.rs         (HelpArgs     + execute_help)
    repl.rs         (ReplArgs     + execute_repl)

Conventions:
  - Each subcommand module exposes one public `execute_*` function taking
    the shared `Session`.
  - Argument structs derive `clap::Args` and are kept minimal.
*/

pub mod complete;
pub mod demo;
pub mod format;
pub mod help;
pub mod repl;
pub mod run;
pub mod shared;

pub use complete::{CompleteArgs, execute_complete};
pub use help::{HelpArgs, execute_help};
pub use repl::{ReplArgs, execute_repl};
pub use run::{RunArgs, execute_run};
pub use shared::{GlobalOpts, build_session};
