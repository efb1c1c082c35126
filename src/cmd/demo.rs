/*!
demo.rs - the built-in `team` root.

A small in-memory team system that exercises the routing features the
library offers: a host type resolver (`player`), a completion provider
(`@players`), aliases, a permission, variadic text, flags and switches,
range-checked defaults, an int/string overload, and an issuer-aware
`locale` parameter.
*/

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use cmdroute::{
    Arguments, BoundValue, CommandDefinition, CommandError, CommandManager, HandlerTable, Locale,
    ParameterDefinition, RegistrationError, ResolveError, Value,
};

use super::shared::ConsoleIssuer;

pub const NO_PLAYER_FOUND: &str = "team.no_player_found";
pub const TEAM_EXISTS: &str = "team.exists";
pub const NO_SUCH_TEAM: &str = "team.no_such_team";
pub const ALREADY_INVITED: &str = "team.already_invited";

const MESSAGES: &[(&str, &str)] = &[
    (NO_PLAYER_FOUND, "Error: No player matching <c2>{search}</c2> is online."),
    (TEAM_EXISTS, "Error: A team named <c2>{name}</c2> already exists."),
    (NO_SUCH_TEAM, "Error: No team <c2>{team}</c2>."),
    (ALREADY_INVITED, "Error: <c2>{player}</c2> has already been invited."),
    ("team.describe.invite", "Invite an online player to your team"),
    ("team.describe.kick", "Remove a player, optionally with a reason"),
];

const TEAMS_PER_PAGE: usize = 5;

/* ---- Domain ---- */

/// An online player, as produced by the `player` resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    pub color: Option<String>,
    pub private: bool,
    pub invites: Vec<String>,
}

/// Who is online and which teams exist.
#[derive(Debug)]
pub struct Roster {
    online: Vec<String>,
    teams: Mutex<BTreeMap<String, Team>>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new(["Steve", "Alex", "Notch", "Herobrine"])
    }
}

impl Roster {
    pub fn new<S: Into<String>>(online: impl IntoIterator<Item = S>) -> Self {
        Self {
            online: online.into_iter().map(Into::into).collect(),
            teams: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn online(&self) -> &[String] {
        &self.online
    }

    /// Case-insensitive full name only.
    pub fn find_exact(&self, search: &str) -> Option<Player> {
        self.online
            .iter()
            .find(|p| p.eq_ignore_ascii_case(search))
            .map(|p| Player(p.clone()))
    }

    /// Exact name first, then a unique case-insensitive prefix.
    pub fn find_player(&self, search: &str) -> Option<Player> {
        if let Some(exact) = self.find_exact(search) {
            return Some(exact);
        }
        let needle = search.to_lowercase();
        let mut matches = self.online.iter().filter(|p| p.to_lowercase().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(only), None) => Some(Player(only.clone())),
            _ => None,
        }
    }

    pub fn create(&self, team: Team) -> Result<(), CommandError> {
        let mut teams = self.teams.lock();
        let key = team.name.to_lowercase();
        if teams.contains_key(&key) {
            return Err(CommandError::user(TEAM_EXISTS).with("name", team.name));
        }
        teams.insert(key, team);
        Ok(())
    }

    /// Teams in name order.
    pub fn teams(&self) -> Vec<Team> {
        self.teams.lock().values().cloned().collect()
    }

    pub fn team_by_name(&self, name: &str) -> Option<Team> {
        self.teams.lock().get(&name.to_lowercase()).cloned()
    }

    /// 1-based position in name order.
    pub fn team_by_index(&self, index: i64) -> Option<Team> {
        let index = usize::try_from(index).ok()?.checked_sub(1)?;
        self.teams.lock().values().nth(index).cloned()
    }

    /// Invite to the first team, creating a lobby when none exists.
    pub fn invite(&self, player: &Player) -> Result<String, CommandError> {
        let mut teams = self.teams.lock();
        let team = teams.entry("lobby".to_string()).or_insert_with(|| Team {
            name: "lobby".to_string(),
            color: None,
            private: false,
            invites: Vec::new(),
        });
        if team.invites.iter().any(|p| p == &player.0) {
            return Err(CommandError::user(ALREADY_INVITED).with("player", player.0.clone()));
        }
        team.invites.push(player.0.clone());
        Ok(team.name.clone())
    }
}

/* ---- Registration ---- */

/// Register the `player` type, `@players`, demo messages and the `team` root.
pub fn install(manager: &CommandManager, roster: &Arc<Roster>) -> Result<(), RegistrationError> {
    manager
        .locales_mut()
        .add_message_strings(Locale::english(), MESSAGES.iter().copied());

    // `exact` turns off prefix matching for one parameter.
    let lookup = Arc::clone(roster);
    manager.register_type_resolver("player", move |ctx| {
        let search = ctx.require_arg()?;
        let found = if ctx.has_option("exact") {
            lookup.find_exact(&search)
        } else {
            lookup.find_player(&search)
        };
        found
            .map(Value::new)
            .ok_or_else(|| ResolveError::new(NO_PLAYER_FOUND).with("search", search))
    });

    let online = Arc::clone(roster);
    manager.register_completion_provider("@players", move |_| online.online().to_vec());

    manager.register_root_command("team", team_commands(roster)?)?;
    Ok(())
}

fn team_commands(roster: &Arc<Roster>) -> Result<Vec<CommandDefinition>, RegistrationError> {
    let invite = {
        let roster = Arc::clone(roster);
        CommandDefinition::builder("team|t")
            .subcommand("invite|inv")
            .permission("team.invite")
            .description("{@@team.describe.invite}")
            .parameter(ParameterDefinition::new("player", "player").completion("@players"))
            .handler(move |issuer, args| {
                let player = args
                    .get::<Player>("player")
                    .ok_or_else(|| CommandError::Fault(anyhow::anyhow!("player not bound")))?;
                let team = roster.invite(player)?;
                let inviter = issuer
                    .as_any()
                    .downcast_ref::<ConsoleIssuer>()
                    .map(|c| c.name().to_string())
                    .unwrap_or_else(|| "someone".to_string());
                issuer.send_message(&format!("{inviter} invited {} to {team}.", player.0));
                Ok(())
            })
            .build()?
    };

    let kick = CommandDefinition::builder("team|t")
        .subcommand("kick")
        .permission("team.kick")
        .description("{@@team.describe.kick}")
        .parameter(
            ParameterDefinition::new("player", "player")
                .options("exact")
                .completion("@players"),
        )
        .parameter(ParameterDefinition::new("reason", "string").variadic().optional())
        .handler(|issuer, args| {
            let player = args.get::<Player>("player").map(|p| p.0.as_str()).unwrap_or("?");
            let reason: Vec<&str> = args.get_many::<String>("reason").into_iter().map(String::as_str).collect();
            if reason.is_empty() {
                issuer.send_message(&format!("Kicked {player}."));
            } else {
                issuer.send_message(&format!("Kicked {player}: {}", reason.join(" ")));
            }
            Ok(())
        })
        .build()?;

    let create = {
        let roster = Arc::clone(roster);
        CommandDefinition::builder("team|t")
            .subcommand("create|new")
            .description("Create a team")
            .search_tags("make found")
            .parameter(ParameterDefinition::new("name", "string").length(Some(3), Some(16)))
            .parameter(
                ParameterDefinition::new("color", "string")
                    .flag()
                    .optional()
                    .one_of(["red", "green", "blue", "yellow"])
                    .completion("red|green|blue|yellow"),
            )
            .parameter(ParameterDefinition::switch("private"))
            .handler(move |issuer, args| {
                let name = args.get::<String>("name").cloned().unwrap_or_default();
                let team = Team {
                    name: name.clone(),
                    color: args.get::<String>("color").map(|c| c.to_lowercase()),
                    private: args.flag("private"),
                    invites: Vec::new(),
                };
                let summary = describe_team(&team);
                roster.create(team)?;
                issuer.send_message(&format!("Created {summary}."));
                Ok(())
            })
            .build()?
    };

    let list = {
        let roster = Arc::clone(roster);
        CommandDefinition::builder("team|t")
            .subcommand("list")
            .description("List teams")
            .parameter(
                ParameterDefinition::new("page", "int")
                    .optional()
                    .default_input("1")
                    .range(Some(1.0), None),
            )
            .handler(move |issuer, args| {
                let page = args.get::<i64>("page").copied().unwrap_or(1).max(1) as usize;
                let teams = roster.teams();
                if teams.is_empty() {
                    issuer.send_message("No teams yet.");
                    return Ok(());
                }
                let pages = teams.len().div_ceil(TEAMS_PER_PAGE);
                let shown: Vec<&Team> = teams.iter().skip((page - 1) * TEAMS_PER_PAGE).take(TEAMS_PER_PAGE).collect();
                if shown.is_empty() {
                    return Err(CommandError::text(format!("Page {page} of {pages} is empty.")));
                }
                for (i, team) in shown.iter().enumerate() {
                    issuer.send_message(&format!("{}. {}", (page - 1) * TEAMS_PER_PAGE + i + 1, describe_team(team)));
                }
                issuer.send_message(&format!("Page {page}/{pages}"));
                Ok(())
            })
            .build()?
    };

    // `team show 2` picks by position, `team show blue` by name.
    let show_by_index = {
        let roster = Arc::clone(roster);
        CommandDefinition::builder("team|t")
            .subcommand("show")
            .description("Show a team by its list position")
            .parameter(ParameterDefinition::new("index", "int"))
            .handler(move |issuer, args| {
                let index = args.get::<i64>("index").copied().unwrap_or_default();
                let team = roster
                    .team_by_index(index)
                    .ok_or_else(|| CommandError::user(NO_SUCH_TEAM).with("team", index.to_string()))?;
                issuer.send_message(&describe_team(&team));
                Ok(())
            })
            .build()?
    };
    let show_by_name = {
        let roster = Arc::clone(roster);
        CommandDefinition::builder("team|t")
            .subcommand("show")
            .description("Show a team by name")
            .parameter(ParameterDefinition::new("name", "string"))
            .handler(move |issuer, args| {
                let name = args.get::<String>("name").cloned().unwrap_or_default();
                let team = roster
                    .team_by_name(&name)
                    .ok_or_else(|| CommandError::user(NO_SUCH_TEAM).with("team", name))?;
                issuer.send_message(&describe_team(&team));
                Ok(())
            })
            .build()?
    };

    let locale = CommandDefinition::builder("team|t")
        .subcommand("locale")
        .description("Show the locale messages are sent in")
        .parameter(
            ParameterDefinition::new("locale", "locale")
                .optional()
                .completion("@locales"),
        )
        .handler(|issuer, args| {
            let locale = args.get::<Locale>("locale").cloned().unwrap_or_default();
            issuer.send_message(&format!("Locale: {locale}"));
            Ok(())
        })
        .build()?;

    Ok(vec![invite, kick, create, list, show_by_index, show_by_name, locale])
}

fn describe_team(team: &Team) -> String {
    let mut out = team.name.clone();
    if let Some(color) = &team.color {
        out.push_str(&format!(" ({color})"));
    }
    if team.private {
        out.push_str(" [private]");
    }
    if !team.invites.is_empty() {
        out.push_str(&format!(" invites: {}", team.invites.join(", ")));
    }
    out
}

/* ---- Command-file handlers ---- */

/// Handlers a command file may name.
///
/// `echo` prints every bound argument; `info` prints the command's usage.
pub fn handlers() -> HandlerTable {
    let mut table = HandlerTable::new();
    table
        .register("echo", |issuer, args| {
            for line in describe_arguments(args) {
                issuer.send_message(&line);
            }
            Ok(())
        })
        .register("info", |issuer, args| {
            issuer.send_message(&format!("{} argument(s) bound", args.iter().filter(|(_, b)| !b.is_absent()).count()));
            Ok(())
        });
    table
}

/// `name = value` lines for every binding, in declaration order.
pub fn describe_arguments(args: &Arguments) -> Vec<String> {
    args.iter()
        .map(|(name, bound)| {
            let shown = match bound {
                BoundValue::Absent => "-".to_string(),
                BoundValue::Single(v) => describe_value(v),
                BoundValue::Many(vs) => {
                    let parts: Vec<String> = vs.iter().map(describe_value).collect();
                    format!("[{}]", parts.join(", "))
                }
            };
            format!("{name} = {shown}")
        })
        .collect()
}

pub fn describe_value(value: &Value) -> String {
    if let Some(s) = value.downcast_ref::<String>() {
        s.clone()
    } else if let Some(n) = value.downcast_ref::<i64>() {
        n.to_string()
    } else if let Some(f) = value.downcast_ref::<f64>() {
        f.to_string()
    } else if let Some(b) = value.downcast_ref::<bool>() {
        b.to_string()
    } else if let Some(p) = value.downcast_ref::<Player>() {
        p.0.clone()
    } else if let Some(l) = value.downcast_ref::<Locale>() {
        l.to_string()
    } else {
        format!("<{}>", value.type_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdroute::{CommandIssuer, Outcome};
    use parking_lot::Mutex as PlMutex;
    use std::any::Any;

    #[derive(Default)]
    struct Recorder {
        lines: PlMutex<Vec<String>>,
        admin: bool,
    }

    impl CommandIssuer for Recorder {
        fn has_permission(&self, _permission: &str) -> bool {
            self.admin
        }
        fn send_message(&self, text: &str) {
            self.lines.lock().push(text.to_string());
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn setup() -> (CommandManager, Arc<Roster>) {
        let manager = CommandManager::new();
        let roster = Arc::new(Roster::default());
        install(&manager, &roster).unwrap();
        (manager, roster)
    }

    #[test]
    fn find_player_exact_then_unique_prefix() {
        let roster = Roster::default();
        assert_eq!(roster.find_player("steve"), Some(Player("Steve".into())));
        assert_eq!(roster.find_player("Not"), Some(Player("Notch".into())));
        assert_eq!(roster.find_player("Zed"), None);
        let ambiguous = Roster::new(["Ann", "Anna"]);
        assert_eq!(ambiguous.find_player("an"), None);
        assert_eq!(ambiguous.find_player("ann"), Some(Player("Ann".into())));
    }

    #[test]
    fn invite_through_alias() {
        let (manager, roster) = setup();
        let admin = Recorder {
            admin: true,
            ..Default::default()
        };
        let outcome = manager.dispatch_line(&admin, "t inv steve");
        assert!(outcome.is_success(), "{outcome:?}");
        assert_eq!(admin.lines.lock().as_slice(), ["someone invited Steve to lobby."]);
        assert_eq!(roster.teams()[0].invites, vec!["Steve".to_string()]);

        let again = manager.dispatch_line(&admin, "team invite Steve");
        assert!(matches!(again, Outcome::UserFailure { .. }));
        assert!(admin.lines.lock()[1].contains("already been invited"));
    }

    #[test]
    fn unknown_player_message() {
        let (manager, _) = setup();
        let admin = Recorder {
            admin: true,
            ..Default::default()
        };
        let outcome = manager.dispatch_line(&admin, "team kick Zed");
        assert!(matches!(outcome, Outcome::Rejected(_)));
        let lines = admin.lines.lock();
        assert!(lines[0].starts_with("Error: No player matching Zed is online."));
    }

    #[test]
    fn kick_needs_the_full_name() {
        let (manager, _) = setup();
        let admin = Recorder {
            admin: true,
            ..Default::default()
        };
        assert!(matches!(manager.dispatch_line(&admin, "team kick Not"), Outcome::Rejected(_)));
        assert!(manager.dispatch_line(&admin, "team kick notch spamming").is_success());
        assert!(manager.dispatch_line(&admin, "team invite Not").is_success());
        let lines = admin.lines.lock();
        assert!(lines[0].starts_with("Error: No player matching Not is online."));
        assert_eq!(lines[1], "Kicked Notch: spamming");
        assert_eq!(lines[2], "someone invited Notch to lobby.");
    }

    #[test]
    fn show_overloads_pick_by_type() {
        let (manager, _) = setup();
        let user = Recorder::default();
        assert!(manager.dispatch_line(&user, "team create blue --color BLUE").is_success());
        assert!(manager.dispatch_line(&user, "team new alpha --private").is_success());
        user.lines.lock().clear();

        assert!(manager.dispatch_line(&user, "team show 2").is_success());
        assert!(manager.dispatch_line(&user, "team show alpha").is_success());
        assert_eq!(user.lines.lock().as_slice(), ["blue (blue)", "alpha [private]"]);
    }

    #[test]
    fn create_validates_name_and_color() {
        let (manager, roster) = setup();
        let user = Recorder::default();
        assert!(matches!(manager.dispatch_line(&user, "team create ab"), Outcome::Rejected(_)));
        assert!(matches!(
            manager.dispatch_line(&user, "team create gamma --color purple"),
            Outcome::Rejected(_)
        ));
        assert!(roster.teams().is_empty());
    }

    #[test]
    fn list_defaults_to_first_page() {
        let (manager, _) = setup();
        let user = Recorder::default();
        assert!(manager.dispatch_line(&user, "team list").is_success());
        assert_eq!(user.lines.lock().as_slice(), ["No teams yet."]);
        assert!(matches!(manager.dispatch_line(&user, "team list 0"), Outcome::Rejected(_)));
    }

    #[test]
    fn player_completion_and_permission_filter() {
        let (manager, _) = setup();
        let admin = Recorder {
            admin: true,
            ..Default::default()
        };
        assert_eq!(manager.complete_line(&admin, "team invite "), vec!["Steve", "Alex", "Notch", "Herobrine"]);
        assert_eq!(manager.complete_line(&admin, "team invite he"), vec!["Herobrine"]);
        let user = Recorder::default();
        assert!(manager.complete_line(&user, "team invite ").is_empty());
    }

    #[test]
    fn describes_bound_arguments() {
        let (manager, _) = setup();
        let mut table = handlers();
        let captured = Arc::new(PlMutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        table.register("capture", move |_, args| {
            sink.lock().extend(describe_arguments(args));
            Ok(())
        });
        let file = cmdroute::CommandFile::from_yaml_str(
            r#"
commands:
  - root: echo
    handler: capture
    parameters:
      - { name: count, type: int }
      - { name: words, variadic: true, optional: true }
"#,
        )
        .unwrap();
        assert_eq!(manager.load_commands(&file, &table).unwrap(), 1);
        let user = Recorder::default();
        assert!(manager.dispatch_line(&user, "echo 3 a b").is_success());
        assert_eq!(captured.lock().as_slice(), ["count = 3", "words = [a, b]"]);
    }
}
