//! Type resolvers: turn tokens into values.
//!
//! A resolver receives a `ResolveContext` positioned at the parameter being
//! bound. It pops as many tokens as it needs (usually one) and returns a
//! `Value`, or a `ResolveError` describing why the input is unacceptable.
//!
//! Built-ins:
//!   string  one token as `String`
//!   int     one token as `i64`
//!   float   one token as finite `f64`
//!   bool    true/false/yes/no/on/off/1/0
//!   text    every remaining token joined by single spaces
//!   locale  the issuer's locale, or a typed tag when not contextual

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::definition::{CommandDefinition, ParameterDefinition, ResolverOptions, TypeKey};
use crate::error::ResolveError;
use crate::issuer::CommandIssuer;
use crate::locales::{Locale, keys};
use crate::value::{Arguments, Value};

pub type Resolver =
    Arc<dyn Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync>;

/// Per-parameter view handed to a resolver.
pub struct ResolveContext<'a> {
    issuer: &'a dyn CommandIssuer,
    command: &'a CommandDefinition,
    parameter: &'a ParameterDefinition,
    tokens: &'a mut VecDeque<String>,
    bound: &'a Arguments,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        issuer: &'a dyn CommandIssuer,
        command: &'a CommandDefinition,
        parameter: &'a ParameterDefinition,
        tokens: &'a mut VecDeque<String>,
        bound: &'a Arguments,
    ) -> Self {
        Self {
            issuer,
            command,
            parameter,
            tokens,
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

    /// Values bound to earlier parameters.
    pub fn bound(&self) -> &'a Arguments {
        self.bound
    }

    pub fn qualifier(&self) -> Option<&'a str> {
        self.parameter.type_key().qualifier()
    }

    pub fn options(&self) -> &'a ResolverOptions {
        self.parameter.resolver_options()
    }

    /// Switch-style option, e.g. `exact`.
    pub fn has_option(&self, name: &str) -> bool {
        self.parameter.resolver_options().has(name)
    }

    /// Value of `name=value`; `None` when absent or given without a value.
    pub fn option_value(&self, name: &str) -> Option<&'a str> {
        self.parameter.resolver_options().value(name)
    }

    pub fn is_optional(&self) -> bool {
        self.parameter.is_optional()
    }

    pub fn first_arg(&self) -> Option<&str> {
        self.tokens.front().map(String::as_str)
    }

    pub fn pop_arg(&mut self) -> Option<String> {
        self.tokens.pop_front()
    }

    /// Pop one token or fail with the missing-argument message.
    pub fn require_arg(&mut self) -> Result<String, ResolveError> {
        self.pop_arg().ok_or_else(|| {
            ResolveError::new(keys::MISSING_ARGUMENT).with("parameter", self.parameter.name())
        })
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len()
    }

    pub fn take_remaining(&mut self) -> Vec<String> {
        self.tokens.drain(..).collect()
    }
}

/// A resolver plus how the pipeline should call it.
#[derive(Clone)]
pub struct ResolverEntry {
    pub resolver: Resolver,
    /// Called even when no tokens remain, so the value can come from the
    /// issuer instead.
    pub issuer_aware: bool,
}

pub struct TypeResolverRegistry {
    entries: HashMap<TypeKey, ResolverEntry>,
}

impl Default for TypeResolverRegistry {
    fn default() -> Self {
        let mut reg = Self::empty();
        reg.register_builtins();
        reg
    }
}

impl TypeResolverRegistry {
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) the resolver for `key`. Returns the old entry.
    pub fn register<F>(&mut self, key: impl Into<TypeKey>, resolver: F) -> Option<ResolverEntry>
    where
        F: Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.insert(key.into(), Arc::new(resolver), false)
    }

    pub fn register_issuer_aware<F>(
        &mut self,
        key: impl Into<TypeKey>,
        resolver: F,
    ) -> Option<ResolverEntry>
    where
        F: Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.insert(key.into(), Arc::new(resolver), true)
    }

    fn insert(&mut self, key: TypeKey, resolver: Resolver, issuer_aware: bool) -> Option<ResolverEntry> {
        log::trace!("type resolver registered: {key}");
        self.entries.insert(
            key,
            ResolverEntry {
                resolver,
                issuer_aware,
            },
        )
    }

    /// Exact key first, then the unqualified name.
    pub fn get(&self, key: &TypeKey) -> Option<ResolverEntry> {
        self.entries
            .get(key)
            .or_else(|| {
                key.qualifier()
                    .and_then(|_| self.entries.get(&key.unqualified()))
            })
            .cloned()
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<TypeKey> {
        let mut keys: Vec<TypeKey> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn register_builtins(&mut self) {
        self.register("string", |c| c.require_arg().map(Value::new));
        self.register("int", |c| {
            let raw = c.require_arg()?;
            raw.parse::<i64>()
                .map(Value::new)
                .map_err(|_| ResolveError::new(keys::MUST_BE_A_NUMBER).with("num", raw))
        });
        self.register("float", |c| {
            let raw = c.require_arg()?;
            match raw.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(Value::new(n)),
                _ => Err(ResolveError::new(keys::MUST_BE_A_NUMBER).with("num", raw)),
            }
        });
        self.register("bool", |c| {
            let raw = c.require_arg()?;
            parse_bool(&raw)
                .map(Value::new)
                .ok_or_else(|| ResolveError::new(keys::MUST_BE_A_BOOLEAN).with("input", raw))
        });
        self.register("text", |c| {
            let rest = c.take_remaining();
            if rest.is_empty() {
                return Err(
                    ResolveError::new(keys::MISSING_ARGUMENT).with("parameter", c.parameter().name())
                );
            }
            Ok(Value::new(rest.join(" ")))
        });
        self.register_issuer_aware("locale", |c| {
            if c.parameter().is_contextual() || c.remaining() == 0 {
                return Ok(Value::new(c.issuer().locale().unwrap_or_default()));
            }
            let raw = c.require_arg()?;
            Ok(Value::new(Locale::new(&raw)))
        });
    }
}

pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "on" | "1" => Some(true),
        "false" | "no" | "n" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issuer::CommandIssuer;
    use std::any::Any;

    struct Nobody;
    impl CommandIssuer for Nobody {
        fn has_permission(&self, _: &str) -> bool {
            true
        }
        fn send_message(&self, _: &str) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn run(reg: &TypeResolverRegistry, ty: &str, tokens: &[&str]) -> (Result<Value, ResolveError>, usize) {
        run_with(reg, ParameterDefinition::new("p", ty), tokens)
    }

    fn run_with(
        reg: &TypeResolverRegistry,
        parameter: ParameterDefinition,
        tokens: &[&str],
    ) -> (Result<Value, ResolveError>, usize) {
        let cmd = CommandDefinition::builder("t")
            .parameter(parameter)
            .handler(|_, _| Ok(()))
            .build()
            .unwrap();
        let param = &cmd.parameters()[0];
        let mut toks: VecDeque<String> = tokens.iter().map(|s| s.to_string()).collect();
        let bound = Arguments::new();
        let entry = reg.get(param.type_key()).expect("resolver");
        let mut ctx = ResolveContext::new(&Nobody, &cmd, param, &mut toks, &bound);
        let out = (entry.resolver)(&mut ctx);
        (out, toks.len())
    }

    #[test]
    fn builtin_int_and_float() {
        let reg = TypeResolverRegistry::default();
        let (v, left) = run(&reg, "int", &["42", "x"]);
        assert_eq!(v.unwrap().downcast_ref::<i64>(), Some(&42));
        assert_eq!(left, 1);

        let (err, _) = run(&reg, "int", &["4x"]);
        let err = err.unwrap_err();
        assert_eq!(err.key, keys::MUST_BE_A_NUMBER);
        assert_eq!(err.replacements, vec![("{num}".to_string(), "4x".to_string())]);

        let (err, _) = run(&reg, "float", &["inf"]);
        assert!(err.is_err());
    }

    #[test]
    fn builtin_text_joins_rest() {
        let reg = TypeResolverRegistry::default();
        let (v, left) = run(&reg, "text", &["hello", "big", "world"]);
        assert_eq!(v.unwrap().downcast_ref::<String>().map(String::as_str), Some("hello big world"));
        assert_eq!(left, 0);
    }

    #[test]
    fn qualified_falls_back_to_bare_name() {
        let mut reg = TypeResolverRegistry::default();
        assert!(reg.get(&TypeKey::qualified("string", "upper")).is_some());
        reg.register(TypeKey::qualified("string", "upper"), |c| {
            c.require_arg().map(|s| Value::new(s.to_uppercase()))
        });
        let entry = reg.get(&TypeKey::qualified("string", "upper")).unwrap();
        assert!(!entry.issuer_aware);
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = TypeResolverRegistry::default();
        let previous = reg.register("int", |_| Ok(Value::new(7i64)));
        assert!(previous.is_some());
        let (v, _) = run(&reg, "int", &["1"]);
        assert_eq!(v.unwrap().downcast_ref::<i64>(), Some(&7));
    }

    #[test]
    fn locale_comes_from_issuer_unless_typed() {
        let reg = TypeResolverRegistry::default();
        assert!(reg.get(&TypeKey::new("locale")).unwrap().issuer_aware);
        let (v, _) = run(&reg, "locale", &[]);
        assert_eq!(v.unwrap().downcast_ref::<Locale>(), Some(&Locale::english()));
        let (v, left) = run(&reg, "locale", &["de-DE"]);
        assert_eq!(v.unwrap().downcast_ref::<Locale>().map(Locale::as_str), Some("de_de"));
        assert_eq!(left, 0);
    }

    #[test]
    fn resolvers_read_parameter_options() {
        let mut reg = TypeResolverRegistry::default();
        reg.register("word", |c| {
            let raw = c.require_arg()?;
            let limit = c.option_value("max").and_then(|m| m.parse::<usize>().ok()).unwrap_or(usize::MAX);
            let word: String = raw.chars().take(limit).collect();
            Ok(Value::new(if c.has_option("upper") { word.to_uppercase() } else { word }))
        });

        let (v, _) = run(&reg, "word", &["hello"]);
        assert_eq!(v.unwrap().downcast_ref::<String>().map(String::as_str), Some("hello"));

        let param = ParameterDefinition::new("p", "word").options("upper,max=3");
        let (v, _) = run_with(&reg, param, &["hello"]);
        assert_eq!(v.unwrap().downcast_ref::<String>().map(String::as_str), Some("HEL"));
    }

    #[test]
    fn bool_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
