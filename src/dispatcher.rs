//! Dispatch: route, resolve each candidate, invoke the winner, report.
//!
//! The issuer gets exactly one message for a failed dispatch and none from
//! the framework for a successful one.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::definition::CommandDefinition;
use crate::error::CommandError;
use crate::format::MessageType;
use crate::issuer::CommandIssuer;
use crate::locales::keys;
use crate::manager::CommandManager;
use crate::resolution::{Rejected, ResolutionContext, resolve};
use crate::value::Arguments;

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A handler ran and returned `Ok`.
    Executed { command: String },
    UnknownCommand,
    PermissionDenied,
    /// Every candidate failed resolution; the best rejection was reported.
    Rejected(Rejected),
    /// The handler refused with a user-facing error.
    UserFailure { command: String },
    /// The handler faulted or panicked.
    InvocationFailed { command: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Executed { .. })
    }
}

/// Split a command line with shell-style quoting; unbalanced quotes fall
/// back to whitespace splitting.
pub(crate) fn split_line(line: &str) -> Vec<String> {
    shell_words::split(line).unwrap_or_else(|e| {
        log::debug!("falling back to whitespace split for {line:?}: {e}");
        line.split_whitespace().map(str::to_string).collect()
    })
}

impl CommandManager {
    /// Dispatch `tokens` (everything after the label) under `root_label`.
    /// `raw_label` is what the issuer typed and is used in messages.
    pub fn dispatch(
        &self,
        issuer: &dyn CommandIssuer,
        root_label: &str,
        raw_label: &str,
        tokens: &[String],
    ) -> Outcome {
        let candidates = self.find_candidates(root_label, tokens);
        if candidates.is_empty() {
            log::debug!("no command under '{root_label}'");
            let replacements = [("{command}".to_string(), raw_label.to_string())];
            self.send_message(issuer, MessageType::Error, keys::UNKNOWN_COMMAND, &replacements);
            return Outcome::UnknownCommand;
        }

        let total = candidates.len();
        let permitted: Vec<_> = candidates
            .into_iter()
            .filter(|c| c.command.has_permission(issuer))
            .collect();
        if permitted.is_empty() {
            log::debug!("issuer lacks permission for all {total} candidate(s) of '{root_label}'");
            self.send_message(issuer, MessageType::Error, keys::PERMISSION_DENIED, &[]);
            return Outcome::PermissionDenied;
        }

        let prefix = self.flag_prefix();
        let mut best: Option<(Rejected, Arc<CommandDefinition>)> = None;
        for candidate in permitted {
            let command = candidate.command;
            let args = &tokens[candidate.consumed..];
            let ctx = ResolutionContext::new(issuer, &command, args).with_flag_prefix(&prefix);
            match resolve(ctx, self.registries()) {
                Ok(arguments) => return self.invoke(issuer, &command, &arguments),
                Err(rejected) => {
                    log::debug!(
                        "candidate '{}' {} rejected at depth {:?}: {}",
                        command.command_name(),
                        command.signature(),
                        rejected.rank(),
                        rejected.message()
                    );
                    if best.as_ref().is_none_or(|(b, _)| rejected.outranks(b)) {
                        best = Some((rejected, command));
                    }
                }
            }
        }

        let Some((rejected, command)) = best else {
            return Outcome::UnknownCommand;
        };
        self.report_rejection(issuer, raw_label, &command, &rejected);
        Outcome::Rejected(rejected)
    }

    /// Dispatch a whole line: the first token is the label (a leading `/` is
    /// ignored), the rest are arguments.
    pub fn dispatch_line(&self, issuer: &dyn CommandIssuer, line: &str) -> Outcome {
        let tokens = split_line(line);
        let Some((label, rest)) = tokens.split_first() else {
            let replacements = [("{command}".to_string(), String::new())];
            self.send_message(issuer, MessageType::Error, keys::UNKNOWN_COMMAND, &replacements);
            return Outcome::UnknownCommand;
        };
        let label = label.strip_prefix('/').unwrap_or(label);
        self.dispatch(issuer, label, label, rest)
    }

    fn report_rejection(
        &self,
        issuer: &dyn CommandIssuer,
        raw_label: &str,
        command: &CommandDefinition,
        rejected: &Rejected,
    ) {
        let err = rejected.message();
        let mut text = self.format_message(issuer, MessageType::Error, &err.key, &err.replacements);
        if err.show_usage && self.settings().show_usage_on_failure {
            text.push('\n');
            text.push_str(&self.usage_line(issuer, raw_label, command));
        }
        issuer.send_message(&text);
    }

    fn invoke(&self, issuer: &dyn CommandIssuer, command: &CommandDefinition, arguments: &Arguments) -> Outcome {
        let name = command.command_name();
        log::debug!("executing '{name}' {}", command.signature());
        let result = panic::catch_unwind(AssertUnwindSafe(|| command.invoke(issuer, arguments)));
        match result {
            Ok(Ok(())) => Outcome::Executed { command: name },
            Ok(Err(CommandError::User { key, replacements })) => {
                self.send_message(issuer, MessageType::Error, &key, &replacements);
                Outcome::UserFailure { command: name }
            }
            Ok(Err(CommandError::UserText(text))) => {
                issuer.send_message(&self.format_text(MessageType::Error, &text));
                Outcome::UserFailure { command: name }
            }
            Ok(Err(CommandError::Fault(err))) => {
                log::error!("command '{name}' failed: {err:#}");
                self.send_message(issuer, MessageType::Error, keys::ERROR_PERFORMING_COMMAND, &[]);
                Outcome::InvocationFailed { command: name }
            }
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                log::error!("command '{name}' panicked: {detail}");
                self.send_message(issuer, MessageType::Error, keys::ERROR_PERFORMING_COMMAND, &[]);
                Outcome::InvocationFailed { command: name }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_lines_split_like_a_shell() {
        assert_eq!(split_line(r#"team kick Steve "being rude""#), vec!["team", "kick", "Steve", "being rude"]);
        assert_eq!(split_line(r#"say "unterminated"#), vec!["say", "\"unterminated"]);
        assert!(split_line("   ").is_empty());
    }
}
