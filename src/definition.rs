//! Command and parameter metadata.
//!
//! Definitions are built once (builder or config data), validated, and then
//! shared immutably as `Arc<CommandDefinition>`.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::error::{CommandError, RegistrationError, ResolveError};
use crate::issuer::{CommandIssuer, has_all_permissions};
use crate::locales::keys;
use crate::resolution::DEFAULT_FLAG_PREFIX;
use crate::value::{Arguments, Value};

/// Called with the issuer and the bound arguments of a winning candidate.
pub type Handler =
    Arc<dyn Fn(&dyn CommandIssuer, &Arguments) -> Result<(), CommandError> + Send + Sync>;

/* ---- Type keys ---- */

/// Registry key for a parameter type: a name plus an optional qualifier.
///
/// Resolver lookup tries the exact key first and then the bare name, so a
/// qualifier can select a specialised resolver without requiring one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    name: String,
    qualifier: Option<String>,
}

impl TypeKey {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            qualifier: None,
        }
    }

    pub fn qualified(name: &str, qualifier: &str) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            qualifier: Some(qualifier.trim().to_lowercase()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn unqualified(&self) -> TypeKey {
        TypeKey::new(&self.name)
    }
}

impl From<&str> for TypeKey {
    fn from(s: &str) -> Self {
        TypeKey::new(s)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}:{}", self.name, q),
            None => f.write_str(&self.name),
        }
    }
}

/* ---- Path segments ---- */

/// One literal path level: primary name plus aliases, all lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    primary: String,
    aliases: Vec<String>,
}

impl Segment {
    /// Parse `"invite|inv"` into primary `invite` with alias `inv`.
    pub fn parse(spec: &str) -> Option<Segment> {
        let mut names = spec
            .split('|')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let primary = names.next()?;
        let mut aliases: Vec<String> = Vec::new();
        for alias in names {
            if alias != primary && !aliases.contains(&alias) {
                aliases.push(alias);
            }
        }
        Some(Segment { primary, aliases })
    }

    pub fn primary(&self) -> &str {
        &self.primary
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Primary name first, then aliases.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn matches(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.names().any(|n| n == token)
    }

    pub(crate) fn merge_aliases(&mut self, other: &Segment) {
        for alias in other.names() {
            if alias != self.primary && !self.aliases.iter().any(|a| a == alias) {
                self.aliases.push(alias.to_string());
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.primary)
    }
}

/* ---- Constraints ---- */

#[derive(Debug, Clone)]
pub enum Constraint {
    /// Inclusive numeric bounds for `int` / `float` values.
    Range { min: Option<f64>, max: Option<f64> },
    /// Character-count bounds for string values.
    Length { min: Option<usize>, max: Option<usize> },
    /// Whole-string match for string values. Holds the anchored form built
    /// by [`Constraint::pattern`].
    Pattern(Regex),
    /// Case-insensitive allow-list for string values.
    OneOf(Vec<String>),
}

impl Constraint {
    /// Wrap `re` as `^(?:re)$` so alternations are tried against the whole input.
    pub fn pattern(re: &Regex) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{})$", re.as_str())).map(Constraint::Pattern)
    }

    /// Check a resolved value. Values of other types pass untouched.
    pub fn check(&self, value: &Value) -> Result<(), ResolveError> {
        match self {
            Constraint::Range { min, max } => {
                let Some(n) = numeric(value) else {
                    return Ok(());
                };
                if let Some(min) = min
                    && n < *min
                {
                    return Err(ResolveError::new(keys::MUST_BE_MIN_VALUE).with("min", fmt_num(*min)));
                }
                if let Some(max) = max
                    && n > *max
                {
                    return Err(ResolveError::new(keys::MUST_BE_MAX_VALUE).with("max", fmt_num(*max)));
                }
                Ok(())
            }
            Constraint::Length { min, max } => {
                let Some(s) = value.downcast_ref::<String>() else {
                    return Ok(());
                };
                let len = s.chars().count();
                if let Some(min) = min
                    && len < *min
                {
                    return Err(ResolveError::new(keys::MUST_BE_MIN_LENGTH).with("min", min.to_string()));
                }
                if let Some(max) = max
                    && len > *max
                {
                    return Err(ResolveError::new(keys::MUST_BE_MAX_LENGTH).with("max", max.to_string()));
                }
                Ok(())
            }
            Constraint::Pattern(re) => {
                let Some(s) = value.downcast_ref::<String>() else {
                    return Ok(());
                };
                if re.is_match(s) {
                    Ok(())
                } else {
                    Err(ResolveError::new(keys::INVALID_FORMAT).with("input", s.clone()))
                }
            }
            Constraint::OneOf(allowed) => {
                let Some(s) = value.downcast_ref::<String>() else {
                    return Ok(());
                };
                if allowed.iter().any(|a| a.eq_ignore_ascii_case(s)) {
                    Ok(())
                } else {
                    Err(ResolveError::new(keys::PLEASE_SPECIFY_ONE_OF).with("valid", allowed.join(", ")))
                }
            }
        }
    }
}

fn numeric(value: &Value) -> Option<f64> {
    value
        .downcast_ref::<i64>()
        .map(|n| *n as f64)
        .or_else(|| value.downcast_ref::<f64>().copied())
}

fn fmt_num(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/* ---- Parameters ---- */

/// Per-parameter settings a resolver may read, written `name=value,switch`.
/// Names are case-insensitive; a repeated name keeps the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolverOptions(BTreeMap<String, Option<String>>);

impl ResolverOptions {
    pub fn parse(raw: &str) -> Self {
        let mut options = Self::default();
        options.extend(raw);
        options
    }

    fn extend(&mut self, raw: &str) {
        for part in raw.split(',') {
            let (name, value) = match part.split_once('=') {
                Some((name, value)) => (name, Some(value.trim().to_string())),
                None => (part, None),
            };
            let name = name.trim().to_lowercase();
            if !name.is_empty() {
                self.0.insert(name, value);
            }
        }
    }

    /// Present, with or without a value.
    pub fn has(&self, name: &str) -> bool {
        self.0.contains_key(&name.to_lowercase())
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_lowercase()).and_then(|v| v.as_deref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: String,
    /// Boolean switch (`--private`) rather than `--color red`.
    pub switch: bool,
}

#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// Bound as-is, the same allocation every time.
    Value(Value),
    /// Resolved through the parameter's resolver as if the issuer typed it.
    Input(String),
}

#[derive(Debug, Clone)]
pub struct ParameterDefinition {
    name: String,
    type_key: TypeKey,
    optional: bool,
    variadic: bool,
    min_arity: usize,
    contextual: bool,
    flag: Option<FlagSpec>,
    default: Option<DefaultValue>,
    constraints: Vec<Constraint>,
    completion: Option<String>,
    conditions: Vec<String>,
    options: ResolverOptions,
    description: Option<String>,
}

impl ParameterDefinition {
    pub fn new(name: &str, type_key: impl Into<TypeKey>) -> Self {
        Self {
            name: name.trim().to_string(),
            type_key: type_key.into(),
            optional: false,
            variadic: false,
            min_arity: 0,
            contextual: false,
            flag: None,
            default: None,
            constraints: Vec::new(),
            completion: None,
            conditions: Vec::new(),
            options: ResolverOptions::default(),
            description: None,
        }
    }

    /// Switch flag of type `bool`, marker `--name`.
    pub fn switch(name: &str) -> Self {
        let flag = FlagSpec {
            name: name.trim().to_lowercase(),
            switch: true,
        };
        Self {
            flag: Some(flag),
            optional: true,
            ..Self::new(name, "bool")
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    /// Minimum number of tokens a variadic parameter must receive.
    pub fn min_arity(mut self, min: usize) -> Self {
        self.min_arity = min;
        self
    }

    /// Derived from the issuer/environment; consumes no token.
    pub fn contextual(mut self) -> Self {
        self.contextual = true;
        self
    }

    /// Valued flag (`--name value`), matched anywhere in the input.
    pub fn flag(mut self) -> Self {
        self.flag = Some(FlagSpec {
            name: self.name.to_lowercase(),
            switch: false,
        });
        self
    }

    /// Valued flag with a marker name different from the parameter name.
    pub fn flag_named(mut self, marker: &str) -> Self {
        self.flag = Some(FlagSpec {
            name: marker.trim().trim_start_matches('-').to_lowercase(),
            switch: false,
        });
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(DefaultValue::Value(value));
        self
    }

    pub fn default_input(mut self, input: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Input(input.into()));
        self
    }

    pub fn constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn range(self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraint(Constraint::Range { min, max })
    }

    pub fn length(self, min: Option<usize>, max: Option<usize>) -> Self {
        self.constraint(Constraint::Length { min, max })
    }

    pub fn pattern(self, re: Regex) -> Self {
        match Constraint::pattern(&re) {
            Ok(c) => self.constraint(c),
            // only a size limit can refuse the wrapped form
            Err(err) => {
                log::warn!("pattern for '{}' kept unanchored: {err}", self.name);
                self.constraint(Constraint::Pattern(re))
            }
        }
    }

    pub fn one_of<S: Into<String>>(self, values: impl IntoIterator<Item = S>) -> Self {
        self.constraint(Constraint::OneOf(values.into_iter().map(Into::into).collect()))
    }

    /// Completion key override (`@players`, `@range:1-5`, `red|green|blue`).
    pub fn completion(mut self, key: impl Into<String>) -> Self {
        self.completion = Some(key.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    /// Resolver options such as `exact` or `limit=3`; repeated calls merge.
    pub fn options(mut self, raw: &str) -> Self {
        self.options.extend(raw);
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic
    }

    pub fn min_arity_value(&self) -> usize {
        self.min_arity
    }

    pub fn is_contextual(&self) -> bool {
        self.contextual
    }

    pub fn flag_spec(&self) -> Option<&FlagSpec> {
        self.flag.as_ref()
    }

    pub fn is_switch(&self) -> bool {
        self.flag.as_ref().is_some_and(|f| f.switch)
    }

    /// Positional parameters take tokens in order.
    pub fn is_positional(&self) -> bool {
        !self.contextual && self.flag.is_none()
    }

    pub fn default(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn completion_key(&self) -> Option<&str> {
        self.completion.as_deref()
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn resolver_options(&self) -> &ResolverOptions {
        &self.options
    }

    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Usage fragment: `<name>`, `[name]`, `<name...>`, `[--flag <type>]`.
    pub fn syntax(&self) -> Option<String> {
        self.syntax_with_prefix(DEFAULT_FLAG_PREFIX)
    }

    /// Like [`syntax`](Self::syntax), with flags written as `{prefix}name`.
    pub fn syntax_with_prefix(&self, prefix: &str) -> Option<String> {
        if self.contextual {
            return None;
        }
        if let Some(flag) = &self.flag {
            let marker = if flag.switch {
                format!("{prefix}{}", flag.name)
            } else {
                format!("{prefix}{} <{}>", flag.name, self.type_key.name())
            };
            return Some(if self.is_optional() || flag.switch {
                format!("[{marker}]")
            } else {
                marker
            });
        }
        let dots = if self.variadic { "..." } else { "" };
        Some(if self.is_optional() || (self.variadic && self.min_arity == 0) {
            format!("[{}{dots}]", self.name)
        } else {
            format!("<{}{dots}>", self.name)
        })
    }
}

/* ---- Signatures ---- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Required,
    Optional,
    Variadic,
}

/// Shape used to tell overloads at the same path apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    positional: Vec<(TypeKey, Arity)>,
    flags: BTreeSet<String>,
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .positional
            .iter()
            .map(|(t, a)| match a {
                Arity::Required => t.to_string(),
                Arity::Optional => format!("{t}?"),
                Arity::Variadic => format!("{t}..."),
            })
            .chain(self.flags.iter().map(|f| format!("--{f}")))
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

/* ---- Commands ---- */

pub struct CommandDefinition {
    root: Segment,
    path: Vec<Segment>,
    parameters: Vec<ParameterDefinition>,
    handler: Handler,
    permission: Option<String>,
    description: String,
    syntax: Option<String>,
    conditions: Vec<String>,
    search_tags: Option<String>,
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("command", &self.command_name())
            .field("signature", &self.signature().to_string())
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

impl CommandDefinition {
    /// Start a definition under `root` (`"team"` or `"team|t"`).
    pub fn builder(root: &str) -> CommandBuilder {
        CommandBuilder::new(root)
    }

    pub fn root(&self) -> &Segment {
        &self.root
    }

    pub fn root_label(&self) -> &str {
        self.root.primary()
    }

    pub fn path(&self) -> &[Segment] {
        &self.path
    }

    pub fn parameters(&self) -> &[ParameterDefinition] {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn search_tags(&self) -> Option<&str> {
        self.search_tags.as_deref()
    }

    pub fn has_permission(&self, issuer: &dyn CommandIssuer) -> bool {
        self.permission
            .as_deref()
            .is_none_or(|p| has_all_permissions(issuer, p))
    }

    /// `"team invite"`: root plus path primaries.
    pub fn command_name(&self) -> String {
        let mut out = self.root.primary().to_string();
        for seg in &self.path {
            out.push(' ');
            out.push_str(seg.primary());
        }
        out
    }

    /// Path primaries only (`"invite"`), empty for a root default command.
    pub fn subcommand_name(&self) -> String {
        self.path
            .iter()
            .map(Segment::primary)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Parameter syntax, either the explicit override or generated.
    pub fn syntax(&self) -> String {
        self.syntax_with_prefix(DEFAULT_FLAG_PREFIX)
    }

    /// Generated syntax uses `prefix` for flag markers; an override is returned as written.
    pub fn syntax_with_prefix(&self, prefix: &str) -> String {
        if let Some(s) = &self.syntax {
            return s.clone();
        }
        self.parameters
            .iter()
            .filter_map(|p| p.syntax_with_prefix(prefix))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn signature(&self) -> Signature {
        let positional = self
            .parameters
            .iter()
            .filter(|p| p.is_positional())
            .map(|p| {
                let arity = if p.variadic {
                    Arity::Variadic
                } else if p.is_optional() {
                    Arity::Optional
                } else {
                    Arity::Required
                };
                (p.type_key.clone(), arity)
            })
            .collect();
        let flags = self
            .parameters
            .iter()
            .filter_map(|p| p.flag.as_ref().map(|f| f.name.clone()))
            .collect();
        Signature { positional, flags }
    }

    pub fn invoke(&self, issuer: &dyn CommandIssuer, args: &Arguments) -> Result<(), CommandError> {
        (self.handler)(issuer, args)
    }

    fn validate(&self) -> Result<(), RegistrationError> {
        let name = self.command_name();
        let mut seen = HashSet::new();
        let mut flag_names = HashSet::new();
        let mut after_variadic = false;

        for p in &self.parameters {
            if p.name.is_empty() {
                return Err(RegistrationError::invalid(&name, "parameter with empty name"));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(RegistrationError::invalid(
                    &name,
                    format!("duplicate parameter '{}'", p.name),
                ));
            }
            if let Some(flag) = &p.flag {
                if flag.name.is_empty() {
                    return Err(RegistrationError::invalid(&name, "flag with empty marker"));
                }
                if !flag_names.insert(flag.name.as_str()) {
                    return Err(RegistrationError::invalid(
                        &name,
                        format!("duplicate flag '--{}'", flag.name),
                    ));
                }
                if p.variadic || p.contextual {
                    return Err(RegistrationError::invalid(
                        &name,
                        format!("flag '{}' cannot be variadic or contextual", p.name),
                    ));
                }
                if flag.switch && !matches!(&p.default, None | Some(DefaultValue::Value(_))) {
                    return Err(RegistrationError::invalid(
                        &name,
                        format!("switch '{}' cannot take an input default", p.name),
                    ));
                }
            }
            if p.contextual && p.variadic {
                return Err(RegistrationError::invalid(
                    &name,
                    format!("contextual parameter '{}' cannot be variadic", p.name),
                ));
            }
            if p.is_positional() {
                if after_variadic {
                    return Err(RegistrationError::invalid(
                        &name,
                        format!(
                            "parameter '{}' follows a variadic parameter; only contextual or flag parameters may",
                            p.name
                        ),
                    ));
                }
                if p.variadic {
                    after_variadic = true;
                }
            }
        }
        Ok(())
    }
}

/* ---- Builder ---- */

pub struct CommandBuilder {
    root: String,
    path: Vec<String>,
    parameters: Vec<ParameterDefinition>,
    handler: Option<Handler>,
    permission: Option<String>,
    description: String,
    syntax: Option<String>,
    conditions: Vec<String>,
    search_tags: Option<String>,
}

impl CommandBuilder {
    fn new(root: &str) -> Self {
        Self {
            root: root.to_string(),
            path: Vec::new(),
            parameters: Vec::new(),
            handler: None,
            permission: None,
            description: String::new(),
            syntax: None,
            conditions: Vec::new(),
            search_tags: None,
        }
    }

    /// Append path levels. `"invite|inv"` adds one level with an alias;
    /// `"invite accept"` adds two levels.
    pub fn subcommand(mut self, path: &str) -> Self {
        self.path
            .extend(path.split_whitespace().map(str::to_string));
        self
    }

    pub fn parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Replace the generated usage syntax.
    pub fn syntax(mut self, syntax: impl Into<String>) -> Self {
        self.syntax = Some(syntax.into());
        self
    }

    pub fn condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn search_tags(mut self, tags: impl Into<String>) -> Self {
        self.search_tags = Some(tags.into());
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&dyn CommandIssuer, &Arguments) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn handler_arc(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn build(self) -> Result<CommandDefinition, RegistrationError> {
        let display = format!("{} {}", self.root, self.path.join(" "));
        let display = display.trim();
        let root = Segment::parse(&self.root)
            .ok_or_else(|| RegistrationError::invalid(display, "empty root label"))?;
        let path = self
            .path
            .iter()
            .map(|s| {
                Segment::parse(s)
                    .ok_or_else(|| RegistrationError::invalid(display, "empty path segment"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let handler = self
            .handler
            .ok_or_else(|| RegistrationError::invalid(display, "no handler"))?;
        let def = CommandDefinition {
            root,
            path,
            parameters: self.parameters,
            handler,
            permission: self.permission.filter(|p| !p.trim().is_empty()),
            description: self.description,
            syntax: self.syntax,
            conditions: self.conditions,
            search_tags: self.search_tags,
        };
        def.validate()?;
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> CommandBuilder {
        CommandDefinition::builder("team|t").handler(|_, _| Ok(()))
    }

    #[test]
    fn segment_parsing() {
        let s = Segment::parse("Invite|INV|invite").unwrap();
        assert_eq!(s.primary(), "invite");
        assert_eq!(s.aliases(), &["inv".to_string()]);
        assert!(s.matches("InV"));
        assert!(Segment::parse(" | ").is_none());
    }

    #[test]
    fn required_after_variadic_is_rejected() {
        let err = noop()
            .parameter(ParameterDefinition::new("words", "string").variadic())
            .parameter(ParameterDefinition::new("count", "int"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidDefinition { .. }));

        let err = noop()
            .parameter(ParameterDefinition::new("a", "string").variadic())
            .parameter(ParameterDefinition::new("b", "string").variadic())
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistrationError::InvalidDefinition { .. }));
    }

    #[test]
    fn flags_and_contextual_may_follow_variadic() {
        let def = noop()
            .subcommand("say")
            .parameter(ParameterDefinition::new("words", "string").variadic())
            .parameter(ParameterDefinition::new("sender", "string").contextual())
            .parameter(ParameterDefinition::switch("loud"))
            .build()
            .unwrap();
        assert_eq!(def.syntax(), "[words...] [--loud]");
        assert_eq!(def.command_name(), "team say");
    }

    #[test]
    fn syntax_uses_given_flag_prefix() {
        let def = noop()
            .parameter(ParameterDefinition::new("color", "string").flag().optional())
            .parameter(ParameterDefinition::switch("loud"))
            .build()
            .unwrap();
        assert_eq!(def.syntax_with_prefix("-"), "[-color <string>] [-loud]");
        assert_eq!(def.syntax(), "[--color <string>] [--loud]");

        let fixed = noop().syntax("<anything>").build().unwrap();
        assert_eq!(fixed.syntax_with_prefix("-"), "<anything>");
    }

    #[test]
    fn resolver_options_parse_and_merge() {
        let p = ParameterDefinition::new("target", "player")
            .options("Exact, limit = 3,,")
            .options("limit=5,filter=");
        let opts = p.resolver_options();
        assert!(opts.has("exact"));
        assert!(opts.has("EXACT"));
        assert_eq!(opts.value("exact"), None);
        assert_eq!(opts.value("limit"), Some("5"));
        assert_eq!(opts.value("filter"), Some(""));
        assert!(!opts.has("missing"));
        assert_eq!(opts.iter().count(), 3);
        assert!(ParameterDefinition::new("x", "string").resolver_options().is_empty());
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = noop()
            .parameter(ParameterDefinition::new("a", "string"))
            .parameter(ParameterDefinition::new("a", "int"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate parameter"));
    }

    #[test]
    fn missing_handler_rejected() {
        let err = CommandDefinition::builder("team").build().unwrap_err();
        assert!(err.to_string().contains("no handler"));
    }

    #[test]
    fn signatures_distinguish_types_and_arity() {
        let a = noop().parameter(ParameterDefinition::new("n", "int")).build().unwrap();
        let b = noop().parameter(ParameterDefinition::new("s", "string")).build().unwrap();
        let c = noop().parameter(ParameterDefinition::new("m", "int")).build().unwrap();
        let d = noop()
            .parameter(ParameterDefinition::new("n", "int").optional())
            .build()
            .unwrap();
        assert_ne!(a.signature(), b.signature());
        assert_eq!(a.signature(), c.signature());
        assert_ne!(a.signature(), d.signature());
        assert_eq!(d.signature().to_string(), "(int?)");
    }

    #[test]
    fn constraints_check_values() {
        let range = Constraint::Range { min: Some(1.0), max: Some(5.0) };
        assert!(range.check(&Value::new(3i64)).is_ok());
        assert_eq!(range.check(&Value::new(9i64)).unwrap_err().key, keys::MUST_BE_MAX_VALUE);
        assert!(range.check(&Value::new("x".to_string())).is_ok());

        let pat = Constraint::pattern(&Regex::new("[a-z]+").unwrap()).unwrap();
        assert!(pat.check(&Value::new("abc".to_string())).is_ok());
        assert!(pat.check(&Value::new("abc1".to_string())).is_err());

        let alt = Constraint::pattern(&Regex::new("a|ab").unwrap()).unwrap();
        assert!(alt.check(&Value::new("ab".to_string())).is_ok());
        assert!(alt.check(&Value::new("a".to_string())).is_ok());
        assert!(alt.check(&Value::new("abc".to_string())).is_err());

        let one = Constraint::OneOf(vec!["red".into(), "blue".into()]);
        assert!(one.check(&Value::new("RED".to_string())).is_ok());
        let err = one.check(&Value::new("green".to_string())).unwrap_err();
        assert_eq!(err.replacements[0].1, "red, blue");
    }
}
