/*!
config.rs

Manager settings and data-driven command definitions.

A command file (YAML or JSON) carries three optional sections:

```yaml
settings:
  default_locale: en
  help_per_page: 10
messages:
  de:
    cmdroute.unknown_command: "Unbekannter Befehl <c2>{command}</c2>."
commands:
  - root: team
    path: "invite|inv"
    permission: team.invite
    handler: echo
    parameters:
      - { name: player, type: string, completion: "@players" }
```

Commands name their handler; the host provides handlers through a
`HandlerTable`.
*/

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::definition::{CommandDefinition, Constraint, Handler, ParameterDefinition, TypeKey};
use crate::error::{CommandError, RegistrationError};
use crate::issuer::CommandIssuer;
use crate::locales::Locale;
use crate::resolution::DEFAULT_FLAG_PREFIX;
use crate::value::Arguments;

/* -------------------------------------------------------------------------- */
/* Settings                                                                   */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerSettings {
    pub default_locale: Locale,
    pub help_per_page: usize,
    pub flag_prefix: String,
    /// Append the usage line to resolution failures.
    pub show_usage_on_failure: bool,
    /// Offered by the `@locales` completion.
    pub supported_locales: Vec<Locale>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            default_locale: Locale::english(),
            help_per_page: 10,
            flag_prefix: DEFAULT_FLAG_PREFIX.to_string(),
            show_usage_on_failure: true,
            supported_locales: vec![Locale::english()],
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Command files                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid YAML command file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON command file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandFile {
    pub settings: ManagerSettings,
    /// locale -> message key -> text
    pub messages: BTreeMap<Locale, BTreeMap<String, String>>,
    pub commands: Vec<CommandSpec>,
}

impl CommandFile {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSpec {
    pub root: String,
    /// Space separated levels; `|` separates aliases (`"invite|inv"`).
    pub path: String,
    pub permission: Option<String>,
    pub description: String,
    pub syntax: Option<String>,
    pub conditions: Vec<String>,
    pub search_tags: Option<String>,
    pub handler: String,
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub qualifier: Option<String>,
    pub optional: bool,
    pub variadic: bool,
    pub min_arity: usize,
    pub contextual: bool,
    pub flag: bool,
    pub switch: bool,
    /// Resolved as if typed when the parameter is left out.
    pub default: Option<String>,
    pub completion: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub regex: Option<String>,
    pub values: Vec<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub conditions: Vec<String>,
    /// Resolver options, `name=value,switch`.
    pub options: Option<String>,
    pub description: Option<String>,
}

impl Default for ParameterSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            type_name: "string".to_string(),
            qualifier: None,
            optional: false,
            variadic: false,
            min_arity: 0,
            contextual: false,
            flag: false,
            switch: false,
            default: None,
            completion: None,
            min: None,
            max: None,
            regex: None,
            values: Vec::new(),
            min_length: None,
            max_length: None,
            conditions: Vec::new(),
            options: None,
            description: None,
        }
    }
}

impl ParameterSpec {
    pub fn to_parameter(&self, command: &str) -> Result<ParameterDefinition, RegistrationError> {
        let mut p = if self.switch {
            ParameterDefinition::switch(&self.name)
        } else {
            let key = match &self.qualifier {
                Some(q) => TypeKey::qualified(&self.type_name, q),
                None => TypeKey::new(&self.type_name),
            };
            ParameterDefinition::new(&self.name, key)
        };
        if self.optional {
            p = p.optional();
        }
        if self.variadic {
            p = p.variadic().min_arity(self.min_arity);
        }
        if self.contextual {
            p = p.contextual();
        }
        if self.flag && !self.switch {
            p = p.flag();
        }
        if let Some(d) = &self.default {
            p = p.default_input(d.clone());
        }
        if let Some(c) = &self.completion {
            p = p.completion(c.clone());
        }
        if self.min.is_some() || self.max.is_some() {
            p = p.range(self.min, self.max);
        }
        if self.min_length.is_some() || self.max_length.is_some() {
            p = p.length(self.min_length, self.max_length);
        }
        if let Some(raw) = &self.regex {
            let anchored = Regex::new(raw)
                .and_then(|re| Constraint::pattern(&re))
                .map_err(|e| {
                    RegistrationError::invalid(command, format!("parameter '{}': bad regex: {e}", self.name))
                })?;
            p = p.constraint(anchored);
        }
        if !self.values.is_empty() {
            p = p.one_of(self.values.iter().cloned());
        }
        for c in &self.conditions {
            p = p.condition(c.clone());
        }
        if let Some(o) = &self.options {
            p = p.options(o);
        }
        if let Some(d) = &self.description {
            p = p.description(d.clone());
        }
        Ok(p)
    }
}

impl CommandSpec {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.root, self.path).trim().to_string()
    }

    pub fn to_definition(&self, handlers: &HandlerTable) -> Result<CommandDefinition, RegistrationError> {
        let name = self.display_name();
        let Some(handler) = handlers.get(&self.handler) else {
            log::debug!(
                "'{name}' names handler '{}'; known handlers: {}",
                self.handler,
                handlers.names().join(", ")
            );
            return Err(RegistrationError::UnknownHandler(self.handler.clone()));
        };
        let mut b = CommandDefinition::builder(&self.root)
            .subcommand(&self.path)
            .description(self.description.clone())
            .handler_arc(handler);
        if let Some(p) = &self.permission {
            b = b.permission(p.clone());
        }
        if let Some(s) = &self.syntax {
            b = b.syntax(s.clone());
        }
        if let Some(t) = &self.search_tags {
            b = b.search_tags(t.clone());
        }
        for c in &self.conditions {
            b = b.condition(c.clone());
        }
        for p in &self.parameters {
            b = b.parameter(p.to_parameter(&name)?);
        }
        b.build()
    }
}

/* -------------------------------------------------------------------------- */
/* Handlers                                                                   */
/* -------------------------------------------------------------------------- */

/// Named handlers that command files can refer to.
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, handler: F) -> &mut Self
    where
        F: Fn(&dyn CommandIssuer, &Arguments) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).cloned()
    }

    /// Registered handler names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"
settings:
  help_per_page: 5
messages:
  de:
    team.hello: "Hallo"
commands:
  - root: team
    path: "create|new"
    handler: echo
    description: Create a team
    parameters:
      - { name: name, min_length: 3 }
      - { name: size, type: int, optional: true, default: "4", min: 1, max: 10 }
      - { name: color, flag: true, optional: true, values: [red, blue] }
      - { name: private, switch: true }
      - { name: leader, type: player, optional: true, options: "exact,limit=1" }
"#;

    fn handlers() -> HandlerTable {
        let mut table = HandlerTable::new();
        table.register("echo", |_, _| Ok(()));
        table
    }

    #[test]
    fn yaml_file_parses_with_defaults() {
        let file = CommandFile::from_yaml_str(FILE).unwrap();
        assert_eq!(file.settings.help_per_page, 5);
        assert_eq!(file.settings.flag_prefix, "--");
        assert_eq!(file.messages[&Locale::new("de")]["team.hello"], "Hallo");
        assert_eq!(file.commands[0].parameters[0].type_name, "string");
    }

    #[test]
    fn specs_build_definitions() {
        let file = CommandFile::from_yaml_str(FILE).unwrap();
        let def = file.commands[0].to_definition(&handlers()).unwrap();
        assert_eq!(def.command_name(), "team create");
        assert_eq!(def.syntax(), "<name> [size] [--color <string>] [--private] [leader]");
        assert!(def.parameter("private").unwrap().is_switch());
        let leader = def.parameter("leader").unwrap().resolver_options();
        assert!(leader.has("exact"));
        assert_eq!(leader.value("limit"), Some("1"));
    }

    #[test]
    fn unknown_handler_and_bad_regex() {
        let mut spec = CommandSpec {
            root: "team".into(),
            handler: "missing".into(),
            ..Default::default()
        };
        assert!(matches!(
            spec.to_definition(&handlers()),
            Err(RegistrationError::UnknownHandler(h)) if h == "missing"
        ));
        spec.handler = "echo".into();
        spec.parameters.push(ParameterSpec {
            name: "code".into(),
            regex: Some("(".into()),
            ..Default::default()
        });
        assert!(matches!(
            spec.to_definition(&handlers()),
            Err(RegistrationError::InvalidDefinition { .. })
        ));
    }

    #[test]
    fn handler_names_are_sorted() {
        let mut table = handlers();
        table.register("audit", |_, _| Ok(())).register("ban", |_, _| Ok(()));
        assert_eq!(table.names(), vec!["audit", "ban", "echo"]);
    }

    #[test]
    fn json_file_parses() {
        let file = CommandFile::from_json_str(
            r#"{"commands":[{"root":"ping","handler":"echo","parameters":[{"name":"n","type":"int"}]}]}"#,
        )
        .unwrap();
        assert_eq!(file.commands[0].parameters[0].type_name, "int");
        assert!(file.settings.show_usage_on_failure);
    }
}
