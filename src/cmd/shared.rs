/*!
shared.rs - shared helpers for subcommands.

Focus:
  - GlobalOpts: flags every subcommand sees
  - ConsoleIssuer: the terminal user as a `CommandIssuer`
  - build_session: manager + demo commands + optional command file
*/

use anyhow::{Context, Result};
use std::any::Any;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use cmdroute::{AnsiFormatter, CommandFile, CommandIssuer, CommandManager, Locale, ManagerSettings, StyleOptions};

use super::demo::{self, Roster};

/// Environment fallback for `--config`.
pub const CONFIG_ENV: &str = "CMDROUTE_CONFIG";

/* ---- Options ---- */

#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub locale: Option<String>,
    pub permissions: Vec<String>,
    pub no_color: bool,
}

impl GlobalOpts {
    /// Flag first, then the environment. Blank values count as unset.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            std::env::var(CONFIG_ENV)
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
        })
    }

    pub fn style(&self) -> StyleOptions {
        if self.no_color {
            StyleOptions::plain()
        } else {
            StyleOptions::detect()
        }
    }
}

/* ---- Issuer ---- */

/// The person at the terminal. `*` grants every permission.
#[derive(Debug, Clone)]
pub struct ConsoleIssuer {
    name: String,
    permissions: HashSet<String>,
    locale: Option<Locale>,
}

impl ConsoleIssuer {
    pub fn new(name: &str, permissions: &[String], locale: Option<Locale>) -> Self {
        Self {
            name: name.to_string(),
            permissions: permissions.iter().map(|p| p.trim().to_lowercase()).collect(),
            locale,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CommandIssuer for ConsoleIssuer {
    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains("*") || self.permissions.contains(&permission.to_lowercase())
    }

    fn locale(&self) -> Option<Locale> {
        self.locale.clone()
    }

    fn send_message(&self, text: &str) {
        println!("{text}");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/* ---- Session ---- */

pub struct Session {
    pub manager: CommandManager,
    pub issuer: ConsoleIssuer,
    pub style: StyleOptions,
}

/// Build the manager the subcommands work against, loading the command
/// file named by `--config` or the environment.
pub fn build_session(opts: &GlobalOpts) -> Result<Session> {
    let file = match opts.config_path() {
        Some(path) => {
            let file = CommandFile::from_path(&path)
                .with_context(|| format!("Failed to load command file {}", path.display()))?;
            log::debug!("loaded command file {} ({} command(s))", path.display(), file.commands.len());
            Some(file)
        }
        None => None,
    };
    build_session_with(opts, file)
}

/// The demo `team` root is always installed; `file`, when given, adds its
/// settings, messages and commands on top.
pub fn build_session_with(opts: &GlobalOpts, file: Option<CommandFile>) -> Result<Session> {
    let settings = file.as_ref().map(|f| f.settings.clone()).unwrap_or_else(ManagerSettings::default);
    let manager = CommandManager::with_settings(settings);
    let style = opts.style();
    manager.set_formatter(AnsiFormatter::new(style.clone()));

    let roster = Arc::new(Roster::default());
    demo::install(&manager, &roster).context("Failed to register demo commands")?;

    if let Some(file) = &file {
        let count = manager
            .load_commands(file, &demo::handlers())
            .context("Failed to register commands from the command file")?;
        log::info!("registered {count} command(s) from the command file");
    }

    let locale = opts.locale.as_deref().map(Locale::new);
    let issuer = ConsoleIssuer::new("console", &opts.permissions, locale);
    Ok(Session {
        manager,
        issuer,
        style,
    })
}

/// Rebuild a line from argv words so quoting survives the round trip.
pub fn join_words(words: &[String]) -> String {
    shell_words::join(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_permission() {
        let all = ConsoleIssuer::new("console", &["*".to_string()], None);
        assert!(all.has_permission("team.invite"));
        let some = ConsoleIssuer::new("console", &["Team.Invite".to_string()], None);
        assert!(some.has_permission("team.invite"));
        assert!(!some.has_permission("team.kick"));
    }

    #[test]
    fn explicit_config_wins() {
        let opts = GlobalOpts {
            config: Some(PathBuf::from("commands.yaml")),
            ..Default::default()
        };
        assert_eq!(opts.config_path(), Some(PathBuf::from("commands.yaml")));
    }

    #[test]
    fn unreadable_config_fails() {
        let session = build_session(&GlobalOpts {
            config: Some(PathBuf::new()),
            ..Default::default()
        });
        assert!(session.is_err());
    }

    #[test]
    fn session_without_file_has_demo_root() {
        let opts = GlobalOpts {
            no_color: true,
            ..Default::default()
        };
        let session = build_session_with(&opts, None).unwrap();
        assert_eq!(session.manager.root_labels(), vec!["team".to_string()]);
    }

    #[test]
    fn command_file_adds_roots_and_settings() {
        let file = CommandFile::from_yaml_str(
            r#"
settings:
  help_per_page: 3
commands:
  - root: ping
    handler: echo
"#,
        )
        .unwrap();
        let opts = GlobalOpts {
            no_color: true,
            ..Default::default()
        };
        let session = build_session_with(&opts, Some(file)).unwrap();
        assert_eq!(session.manager.settings().help_per_page, 3);
        assert!(session.manager.root_labels().contains(&"ping".to_string()));
        assert!(session.manager.root_labels().contains(&"team".to_string()));
    }

    #[test]
    fn join_quotes_spaces() {
        let words = vec!["team".to_string(), "kick".into(), "Steve".into(), "being rude".into()];
        assert_eq!(join_words(&words), "team kick Steve 'being rude'");
    }
}
