/*!
help.rs - list roots, or page through the commands of one root.

  cmdroute help                   -> every root the issuer can use
  cmdroute help team invite       -> commands under `team` matching "invite"
  cmdroute help team --page 2
*/

use anyhow::{Result, bail};
use clap::Args;

use super::format::table;
use super::shared::Session;

#[derive(Args, Debug)]
pub struct HelpArgs {
    /// Root label to show help for
    pub root: Option<String>,

    /// Search terms
    pub search: Vec<String>,

    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Results per page (defaults to the configured page size)
    #[arg(long)]
    pub per_page: Option<usize>,
}

pub fn execute_help(session: &Session, args: HelpArgs) -> Result<()> {
    let Some(root) = args.root else {
        println!("{}", root_table(session));
        return Ok(());
    };

    let Some(mut help) = session.manager.generate_help(&session.issuer, &root) else {
        bail!("Unknown root '{root}'");
    };
    if let Some(per_page) = args.per_page {
        help.set_per_page(per_page);
    }
    help.set_search(args.search);
    help.set_page(args.page);
    help.show_help(&session.manager, &session.issuer);
    Ok(())
}

/// ROOT / ALIASES / COMMANDS for every root with at least one permitted command.
fn root_table(session: &Session) -> String {
    let rows: Vec<Vec<String>> = session
        .manager
        .root_labels()
        .into_iter()
        .filter_map(|label| {
            let commands = session.manager.root_commands(&label);
            let permitted = commands.iter().filter(|c| c.has_permission(&session.issuer)).count();
            if permitted == 0 {
                return None;
            }
            let mut aliases: Vec<String> = Vec::new();
            for alias in commands.iter().flat_map(|c| c.root().aliases()) {
                if !aliases.contains(alias) {
                    aliases.push(alias.clone());
                }
            }
            Some(vec![label, aliases.join(", "), permitted.to_string()])
        })
        .collect();
    table(&["ROOT", "ALIASES", "COMMANDS"], &rows, &session.style)
}
