//! Tab completion.
//!
//! Read-only: handlers never run, nothing is registered or bound for real.
//! Suggestions come from two places, in this order:
//!   1. child segment names/aliases when the typed tokens walk the path
//!   2. the completion source of the parameter the partial token would fill
//! The result is filtered by the partial token (case-insensitive) and
//! deduplicated in first-seen order.

use std::collections::HashSet;

use crate::definition::{CommandDefinition, ParameterDefinition};
use crate::dispatcher::split_line;
use crate::issuer::CommandIssuer;
use crate::manager::CommandManager;
use crate::registry::{CompletionContext, CompletionSource};
use crate::resolution::{CompletionTarget, locate_completion};
use crate::value::Arguments;

impl CommandManager {
    /// Suggestions for `partial`, given the complete `tokens` before it.
    pub fn complete(
        &self,
        issuer: &dyn CommandIssuer,
        root_label: &str,
        tokens: &[String],
        partial: &str,
    ) -> Vec<String> {
        let tree = self.tree_snapshot();
        let Some(root) = tree.root(root_label) else {
            return Vec::new();
        };

        let mut out = root.next_segments(tokens, issuer);
        let prefix = self.flag_prefix();
        for candidate in root.find_candidates(tokens) {
            let command = &candidate.command;
            if !command.has_permission(issuer) {
                continue;
            }
            let preceding = &tokens[candidate.consumed..];
            let (target, bound) =
                locate_completion(issuer, command, preceding, partial, &prefix, self.registries());
            match target {
                CompletionTarget::Parameter(param) => {
                    out.extend(self.parameter_completions(issuer, command, param, partial, &bound));
                }
                CompletionTarget::FlagMarkers(markers) => out.extend(markers),
                CompletionTarget::Nothing => {}
            }
        }
        filter_unique(out, partial)
    }

    /// Complete a raw line. A trailing space means the partial token is
    /// empty; a lone partial label completes root labels.
    pub fn complete_line(&self, issuer: &dyn CommandIssuer, line: &str) -> Vec<String> {
        let mut tokens = split_line(line);
        let partial = if line.is_empty() || line.ends_with(char::is_whitespace) {
            String::new()
        } else {
            tokens.pop().unwrap_or_default()
        };

        if tokens.is_empty() {
            let partial = partial.strip_prefix('/').unwrap_or(&partial);
            let labels = self
                .tree_snapshot()
                .roots()
                .iter()
                .filter(|r| r.any_permitted(issuer))
                .flat_map(|r| r.segment().names().map(str::to_string).collect::<Vec<_>>())
                .collect();
            return filter_unique(labels, partial);
        }

        let label = tokens.remove(0);
        let label = label.strip_prefix('/').unwrap_or(&label);
        self.complete(issuer, label, &tokens, &partial)
    }

    fn parameter_completions(
        &self,
        issuer: &dyn CommandIssuer,
        command: &CommandDefinition,
        param: &ParameterDefinition,
        partial: &str,
        bound: &Arguments,
    ) -> Vec<String> {
        let registries = self.registries();
        let source = match param.completion_key() {
            Some(key) => registries.completion_source(key),
            None => registries
                .type_completion(param.type_key())
                .map(|provider| CompletionSource::Provider { provider, config: None }),
        };
        match source {
            Some(CompletionSource::Provider { provider, config }) => {
                let ctx = CompletionContext::new(issuer, command, param, partial, config.as_deref(), bound);
                provider(&ctx)
            }
            Some(CompletionSource::Literal(values)) => values,
            None => Vec::new(),
        }
    }
}

fn filter_unique(items: Vec<String>, partial: &str) -> Vec<String> {
    let needle = partial.to_lowercase();
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|s| s.to_lowercase().starts_with(&needle))
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_keeps_first_occurrence() {
        let items = vec!["Steve".into(), "alex".into(), "steve".into(), "Steve".into()];
        assert_eq!(filter_unique(items, "ST"), vec!["Steve", "steve"]);
        assert!(filter_unique(vec!["a".into()], "b").is_empty());
    }
}
