//! Error kinds used across the crate.
//!
//! Registration problems are fatal and returned from the registration API.
//! Resolver and handler failures are plain values that the dispatcher turns
//! into issuer-visible messages.

use std::fmt;

use thiserror::Error;

/// Raised while building or registering a command.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Two commands share a path and cannot be told apart by their parameters.
    #[error("command '{command}' conflicts with an existing registration: {reason}")]
    Conflict { command: String, reason: String },

    /// The definition breaks a structural rule (parameter order, names, ...).
    #[error("invalid definition for '{command}': {reason}")]
    InvalidDefinition { command: String, reason: String },

    /// A config-defined command names a handler that was never provided.
    #[error("no handler named '{0}' is available")]
    UnknownHandler(String),
}

impl RegistrationError {
    pub(crate) fn invalid(command: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistrationError::InvalidDefinition {
            command: command.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn conflict(command: impl Into<String>, reason: impl Into<String>) -> Self {
        RegistrationError::Conflict {
            command: command.into(),
            reason: reason.into(),
        }
    }
}

/// A localizable failure: a message key plus `{placeholder}` replacements.
///
/// Resolvers and conditions return this when input is unacceptable. The key is
/// looked up in the issuer's locale when the failure is reported.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ResolveError {
    pub key: String,
    pub replacements: Vec<(String, String)>,
    /// Whether the usage line should follow the message.
    pub show_usage: bool,
}

impl ResolveError {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            replacements: Vec::new(),
            show_usage: true,
        }
    }

    /// Add a `{placeholder}` replacement. The braces are added when missing.
    pub fn with(mut self, placeholder: &str, value: impl Into<String>) -> Self {
        self.replacements.push((placeholder_token(placeholder), value.into()));
        self
    }

    pub fn without_usage(mut self) -> Self {
        self.show_usage = false;
        self
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)?;
        for (k, v) in &self.replacements {
            write!(f, " {k}={v}")?;
        }
        Ok(())
    }
}

/// What a handler returns when it does not succeed.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Business-rule failure with a message key, shown to the issuer.
    #[error("{key}")]
    User {
        key: String,
        replacements: Vec<(String, String)>,
    },

    /// Business-rule failure with ready text, shown verbatim.
    #[error("{0}")]
    UserText(String),

    /// Unexpected fault. Logged; the issuer only sees a generic message.
    #[error(transparent)]
    Fault(#[from] anyhow::Error),
}

impl CommandError {
    pub fn user(key: impl Into<String>) -> Self {
        CommandError::User {
            key: key.into(),
            replacements: Vec::new(),
        }
    }

    pub fn text(message: impl Into<String>) -> Self {
        CommandError::UserText(message.into())
    }

    /// Add a replacement to a `User` error; other variants are returned as-is.
    pub fn with(mut self, placeholder: &str, value: impl Into<String>) -> Self {
        if let CommandError::User { replacements, .. } = &mut self {
            replacements.push((placeholder_token(placeholder), value.into()));
        }
        self
    }

    pub fn is_user_facing(&self) -> bool {
        !matches!(self, CommandError::Fault(_))
    }
}

impl From<ResolveError> for CommandError {
    fn from(err: ResolveError) -> Self {
        CommandError::User {
            key: err.key,
            replacements: err.replacements,
        }
    }
}

pub(crate) fn placeholder_token(name: &str) -> String {
    if name.starts_with('{') && name.ends_with('}') {
        name.to_string()
    } else {
        format!("{{{name}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_get_braces_once() {
        let err = ResolveError::new("k").with("num", "5").with("{min}", "1");
        assert_eq!(
            err.replacements,
            vec![
                ("{num}".to_string(), "5".to_string()),
                ("{min}".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn anyhow_converts_to_fault() {
        fn handler() -> Result<(), CommandError> {
            let r: anyhow::Result<()> = Err(anyhow::anyhow!("disk on fire"));
            r?;
            Ok(())
        }
        let err = handler().unwrap_err();
        assert!(!err.is_user_facing());
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn resolve_error_becomes_user_failure() {
        let err: CommandError = ResolveError::new("team.full").with("team", "red").into();
        match err {
            CommandError::User { key, replacements } => {
                assert_eq!(key, "team.full");
                assert_eq!(replacements[0].0, "{team}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
