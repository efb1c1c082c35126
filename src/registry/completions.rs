//! Completion providers.
//!
//! Keys follow the `@name` / `@name:config` convention; a key without `@` is a
//! literal list (`red|green|blue`). Providers see the partial token and the
//! values already resolved for earlier parameters.

use std::collections::HashMap;
use std::sync::Arc;

use crate::definition::{CommandDefinition, ParameterDefinition};
use crate::issuer::CommandIssuer;
use crate::value::Arguments;

pub type CompletionProvider = Arc<dyn Fn(&CompletionContext<'_>) -> Vec<String> + Send + Sync>;

/// Upper bound on what `@range` will enumerate.
const RANGE_LIMIT: i64 = 1000;

pub struct CompletionContext<'a> {
    issuer: &'a dyn CommandIssuer,
    command: &'a CommandDefinition,
    parameter: &'a ParameterDefinition,
    input: &'a str,
    config: Option<&'a str>,
    bound: &'a Arguments,
}

impl<'a> CompletionContext<'a> {
    pub fn new(
        issuer: &'a dyn CommandIssuer,
        command: &'a CommandDefinition,
        parameter: &'a ParameterDefinition,
        input: &'a str,
        config: Option<&'a str>,
        bound: &'a Arguments,
    ) -> Self {
        Self {
            issuer,
            command,
            parameter,
            input,
            config,
            bound,
        }
    }

    pub fn issuer(&self) -> &'a dyn CommandIssuer {
        self.issuer
    }

    pub fn command(&self) -> &'a CommandDefinition {
        self.command
    }

    pub fn parameter(&self) -> &'a ParameterDefinition {
        self.parameter
    }

    /// The partial token being completed.
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Text after `:` in the completion key, if any.
    pub fn config(&self) -> Option<&'a str> {
        self.config
    }

    /// Values resolved for the preceding tokens (best effort).
    pub fn bound(&self) -> &'a Arguments {
        self.bound
    }
}

#[derive(Clone)]
pub enum CompletionSource {
    Provider {
        provider: CompletionProvider,
        config: Option<String>,
    },
    Literal(Vec<String>),
}

pub struct CompletionRegistry {
    providers: HashMap<String, CompletionProvider>,
}

impl Default for CompletionRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register_builtins();
        reg
    }
}

impl CompletionRegistry {
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Register (or replace) a provider. `key` may carry the leading `@`.
    pub fn register<F>(&mut self, key: &str, provider: F) -> Option<CompletionProvider>
    where
        F: Fn(&CompletionContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        let key = normalize_key(key);
        log::trace!("completion provider registered: @{key}");
        self.providers.insert(key, Arc::new(provider))
    }

    pub fn get(&self, key: &str) -> Option<CompletionProvider> {
        self.providers.get(&normalize_key(key)).cloned()
    }

    /// Interpret a completion key as given on a parameter.
    pub fn source(&self, spec: &str) -> Option<CompletionSource> {
        let spec = spec.trim();
        if let Some(rest) = spec.strip_prefix('@') {
            let (name, config) = match rest.split_once(':') {
                Some((n, c)) => (n, Some(c.to_string())),
                None => (rest, None),
            };
            let provider = self.get(name);
            if provider.is_none() {
                log::debug!("no completion provider registered for @{name}");
            }
            return provider.map(|provider| CompletionSource::Provider { provider, config });
        }
        let values: Vec<String> = spec
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        (!values.is_empty()).then_some(CompletionSource::Literal(values))
    }

    fn register_builtins(&mut self) {
        self.register("nothing", |_| Vec::new());
        self.register("bool", |_| vec!["true".to_string(), "false".to_string()]);
        self.register("range", |c| {
            let Some((min, max)) = c.config().and_then(parse_range) else {
                return Vec::new();
            };
            (min..=max.min(min.saturating_add(RANGE_LIMIT)))
                .map(|n| n.to_string())
                .collect()
        });
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().trim_start_matches('@').to_lowercase()
}

/// Parse `min-max`, allowing a negative lower bound (`-5-5`).
fn parse_range(config: &str) -> Option<(i64, i64)> {
    let config = config.trim();
    let split_at = config.get(1..)?.find('-')? + 1;
    let min = config[..split_at].trim().parse::<i64>().ok()?;
    let max = config[split_at + 1..].trim().parse::<i64>().ok()?;
    (min <= max).then_some((min, max))
}
