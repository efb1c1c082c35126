//! Named conditions checked after all parameters are bound.
//!
//! A condition is referenced as `name` or `name:config` on a command or a
//! parameter. Several may be combined with `|`. The built-in `perm:<key>`
//! requires a permission.

use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::{CommandDefinition, ParameterDefinition};
use crate::error::ResolveError;
use crate::issuer::{CommandIssuer, has_all_permissions};
use crate::locales::keys;
use crate::value::{Arguments, BoundValue};

pub type Condition = Arc<dyn Fn(&ConditionContext<'_>) -> Result<(), ResolveError> + Send + Sync>;

pub struct ConditionContext<'a> {
    issuer: &'a dyn CommandIssuer,
    command: &'a CommandDefinition,
    parameter: Option<&'a ParameterDefinition>,
    arguments: &'a Arguments,
    config: Option<&'a str>,
}

impl<'a> ConditionContext<'a> {
    pub fn new(
        issuer: &'a dyn CommandIssuer,
        command: &'a CommandDefinition,
        parameter: Option<&'a ParameterDefinition>,
        arguments: &'a Arguments,
        config: Option<&'a str>,
    ) -> Self {
        Self {
            issuer,
            command,
            parameter,
            arguments,
            config,
        }
    }

    pub fn issuer(&self) -> &'a dyn CommandIssuer {
        self.issuer
    }

    pub fn command(&self) -> &'a CommandDefinition {
        self.command
    }

    /// The parameter the condition is attached to (`None` for command-level).
    pub fn parameter(&self) -> Option<&'a ParameterDefinition> {
        self.parameter
    }

    /// Binding of the attached parameter.
    pub fn value(&self) -> Option<&'a BoundValue> {
        self.parameter.and_then(|p| self.arguments.bound(p.name()))
    }

    pub fn arguments(&self) -> &'a Arguments {
        self.arguments
    }

    pub fn config(&self) -> Option<&'a str> {
        self.config
    }
}

pub struct ConditionRegistry {
    conditions: HashMap<String, Condition>,
}

impl Default for ConditionRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register("perm", |c| match c.config() {
            Some(perm) if !has_all_permissions(c.issuer(), perm) => {
                Err(ResolveError::new(keys::PERMISSION_DENIED).without_usage())
            }
            _ => Ok(()),
        });
        reg
    }
}

impl ConditionRegistry {
    pub fn empty() -> Self {
        Self {
            conditions: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: &str, condition: F) -> Option<Condition>
    where
        F: Fn(&ConditionContext<'_>) -> Result<(), ResolveError> + Send + Sync + 'static,
    {
        let name = name.trim().to_lowercase();
        log::trace!("condition registered: {name}");
        self.conditions.insert(name, Arc::new(condition))
    }

    pub fn get(&self, name: &str) -> Option<Condition> {
        self.conditions.get(&name.trim().to_lowercase()).cloned()
    }
}

/// Split a condition list into `(name, config)` pairs.
pub fn parse_conditions(spec: &str) -> Vec<(String, Option<String>)> {
    spec.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.split_once(':') {
            Some((n, c)) => (n.trim().to_lowercase(), Some(c.trim().to_string())),
            None => (s.to_lowercase(), None),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_lists() {
        assert_eq!(
            parse_conditions("Level:min=5 | perm:team.admin|x"),
            vec![
                ("level".to_string(), Some("min=5".to_string())),
                ("perm".to_string(), Some("team.admin".to_string())),
                ("x".to_string(), None),
            ]
        );
        assert!(parse_conditions("").is_empty());
    }

    #[test]
    fn registration_is_case_insensitive() {
        let mut reg = ConditionRegistry::default();
        reg.register("InGame", |_| Ok(()));
        assert!(reg.get("ingame").is_some());
        assert!(reg.get("perm").is_some());
        assert!(reg.get("missing").is_none());
    }
}
