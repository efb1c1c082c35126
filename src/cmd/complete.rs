/*!
complete.rs - tab-completion suggestions for a partial line.

  cmdroute complete team in            -> invite
  cmdroute complete --next team invite -> Steve Alex Notch Herobrine
  cmdroute complete --json t           -> {"line":"t","suggestions":["team","t"]}
*/

use anyhow::Result;
use clap::Args;

use super::format::table;
use super::shared::{Session, join_words};

#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Complete the next word instead of the last one (as if a space followed)
    #[arg(long)]
    pub next: bool,

    /// Partial command line
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "WORDS")]
    pub words: Vec<String>,
}

pub fn completion_line(args: &CompleteArgs) -> String {
    let mut line = join_words(&args.words);
    if args.next && !line.is_empty() {
        line.push(' ');
    }
    line
}

pub fn execute_complete(session: &Session, args: CompleteArgs) -> Result<()> {
    let line = completion_line(&args);
    let suggestions = session.manager.complete_line(&session.issuer, &line);
    log::debug!("{} suggestion(s) for '{line}'", suggestions.len());

    if args.json {
        let out = serde_json::json!({
            "line": line,
            "suggestions": suggestions,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        eprintln!("(no suggestions)");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = suggestions
        .into_iter()
        .enumerate()
        .map(|(i, s)| vec![(i + 1).to_string(), s])
        .collect();
    println!("{}", table(&["#", "SUGGESTION"], &rows, &session.style));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_appends_space() {
        let args = CompleteArgs {
            json: false,
            next: true,
            words: vec!["team".into(), "invite".into()],
        };
        assert_eq!(completion_line(&args), "team invite ");
        let args = CompleteArgs { next: false, ..args };
        assert_eq!(completion_line(&args), "team invite");
    }
}
