/*!
repl.rs - read commands from stdin until EOF or `exit`.

A line ending in `?` prints completions for the text before it instead of
running it: `team inv?`, `team invite ?`.
*/

use anyhow::{Context, Result};
use clap::Args;
use std::io::{BufRead, Write};

use super::shared::Session;

#[derive(Args, Debug)]
pub struct ReplArgs {
    /// Prompt shown before each line
    #[arg(long, default_value = "> ")]
    pub prompt: String,
}

#[derive(Debug, PartialEq, Eq)]
enum ReplInput<'a> {
    Quit,
    Skip,
    Complete(&'a str),
    Dispatch(&'a str),
}

fn classify(line: &str) -> ReplInput<'_> {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    match trimmed.trim() {
        "" => ReplInput::Skip,
        "exit" | "quit" => ReplInput::Quit,
        _ => match trimmed.strip_suffix('?') {
            Some(partial) => ReplInput::Complete(partial.trim_start()),
            None => ReplInput::Dispatch(trimmed.trim()),
        },
    }
}

pub fn execute_repl(session: &Session, args: ReplArgs) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut failures = 0usize;
    loop {
        write!(stdout, "{}", args.prompt)?;
        stdout.flush()?;
        let mut line = String::new();
        let read = stdin.lock().read_line(&mut line).context("Failed to read stdin")?;
        if read == 0 {
            break;
        }
        match classify(&line) {
            ReplInput::Quit => break,
            ReplInput::Skip => {}
            ReplInput::Complete(partial) => {
                let suggestions = session.manager.complete_line(&session.issuer, partial);
                println!("{}", suggestions.join("  "));
            }
            ReplInput::Dispatch(command) => {
                if !session.manager.dispatch_line(&session.issuer, command).is_success() {
                    failures += 1;
                }
            }
        }
    }
    log::debug!("repl finished ({failures} failed command(s))");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_lines() {
        assert_eq!(classify("exit\n"), ReplInput::Quit);
        assert_eq!(classify("   \n"), ReplInput::Skip);
        assert_eq!(classify("team inv?\n"), ReplInput::Complete("team inv"));
        assert_eq!(classify("team invite ?\n"), ReplInput::Complete("team invite "));
        assert_eq!(classify("team invite Steve\r\n"), ReplInput::Dispatch("team invite Steve"));
    }
}
