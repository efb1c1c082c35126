/*!
resolution.rs

Turns the tokens left after routing into bound `Arguments` for one candidate.

Order of work:
  1. flag pre-pass    `--name value` / `--name=value` / `--switch`, anywhere
  2. declaration walk contextual, positional, variadic, defaults
  3. leftover check   unconsumed tokens reject the candidate
  4. conditions       command-level first, then per parameter

Failures are returned as `Rejected` values carrying how deep the attempt got,
so the dispatcher can report the candidate that came closest.
*/

use std::collections::{HashMap, VecDeque};

use crate::definition::{CommandDefinition, DefaultValue, ParameterDefinition, TypeKey};
use crate::error::ResolveError;
use crate::issuer::CommandIssuer;
use crate::locales::keys;
use crate::registry::resolvers::parse_bool;
use crate::registry::{ConditionContext, Registries, ResolveContext, ResolverEntry, parse_conditions};
use crate::value::{Arguments, BoundValue, Value};

pub const DEFAULT_FLAG_PREFIX: &str = "--";

/* -------------------------------------------------------------------------- */
/* Failures                                                                   */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    MissingArgument,
    NotEnoughArguments { min: usize, found: usize },
    TooManyArguments,
    MissingFlagValue { flag: String },
    /// No resolver is registered for the declared type.
    UnknownType(TypeKey),
    /// The resolver or a constraint refused the input.
    Invalid(ResolveError),
}

impl FailureReason {
    /// Localizable message for this reason.
    pub fn message(&self, parameter: Option<&str>) -> ResolveError {
        let parameter = parameter.unwrap_or_default();
        match self {
            FailureReason::MissingArgument => {
                ResolveError::new(keys::MISSING_ARGUMENT).with("parameter", parameter)
            }
            FailureReason::NotEnoughArguments { min, .. } => ResolveError::new(keys::NOT_ENOUGH_ARGUMENTS)
                .with("parameter", parameter)
                .with("min", min.to_string()),
            FailureReason::TooManyArguments => ResolveError::new(keys::TOO_MANY_ARGUMENTS),
            FailureReason::MissingFlagValue { flag } => {
                ResolveError::new(keys::MISSING_FLAG_VALUE).with("flag", flag.as_str())
            }
            FailureReason::UnknownType(_) => ResolveError::new(keys::ERROR_GENERIC_LOGGED).without_usage(),
            FailureReason::Invalid(err) => err.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionFailure {
    /// Parameter being bound when the attempt failed (`None` for leftovers).
    pub parameter: Option<String>,
    pub reason: FailureReason,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionFailure {
    pub condition: String,
    pub parameter: Option<String>,
    pub message: ResolveError,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Resolution(ResolutionFailure),
    Condition(ConditionFailure),
}

/// Why a candidate was rejected, and how far it got.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejected {
    pub rejection: Rejection,
    /// Tokens consumed before the failure (flag markers and values included).
    pub consumed: usize,
    /// Parameters bound before the failure.
    pub bound: usize,
}

impl Rejected {
    /// Ranking key: consumed tokens, then bound parameters, then condition
    /// failures over resolution failures.
    pub fn rank(&self) -> (usize, usize, u8) {
        let kind = match self.rejection {
            Rejection::Resolution(_) => 0,
            Rejection::Condition(_) => 1,
        };
        (self.consumed, self.bound, kind)
    }

    /// Strictly better than `other`; ties keep the earlier candidate.
    pub fn outranks(&self, other: &Rejected) -> bool {
        self.rank() > other.rank()
    }

    pub fn message(&self) -> ResolveError {
        match &self.rejection {
            Rejection::Resolution(f) => f.reason.message(f.parameter.as_deref()),
            Rejection::Condition(c) => c.message.clone(),
        }
    }

    pub fn parameter(&self) -> Option<&str> {
        match &self.rejection {
            Rejection::Resolution(f) => f.parameter.as_deref(),
            Rejection::Condition(c) => c.parameter.as_deref(),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Context                                                                    */
/* -------------------------------------------------------------------------- */

/// State of one resolution attempt. Built fresh per candidate.
pub struct ResolutionContext<'a> {
    issuer: &'a dyn CommandIssuer,
    command: &'a CommandDefinition,
    tokens: VecDeque<String>,
    total: usize,
    bound: Arguments,
    flag_prefix: String,
}

impl<'a> ResolutionContext<'a> {
    pub fn new(issuer: &'a dyn CommandIssuer, command: &'a CommandDefinition, tokens: &[String]) -> Self {
        Self {
            issuer,
            command,
            tokens: tokens.iter().cloned().collect(),
            total: tokens.len(),
            bound: Arguments::new(),
            flag_prefix: DEFAULT_FLAG_PREFIX.to_string(),
        }
    }

    pub fn with_flag_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.flag_prefix = prefix.to_string();
        }
        self
    }

    pub fn issuer(&self) -> &'a dyn CommandIssuer {
        self.issuer
    }

    pub fn command(&self) -> &'a CommandDefinition {
        self.command
    }

    pub fn remaining(&self) -> &VecDeque<String> {
        &self.tokens
    }

    pub fn bound(&self) -> &Arguments {
        &self.bound
    }

    pub fn consumed(&self) -> usize {
        self.total - self.tokens.len()
    }

    fn fail(&self, parameter: Option<&ParameterDefinition>, reason: FailureReason) -> Rejected {
        Rejected {
            rejection: Rejection::Resolution(ResolutionFailure {
                parameter: parameter.map(|p| p.name().to_string()),
                reason,
            }),
            consumed: self.consumed(),
            bound: self.bound.len(),
        }
    }

    fn fail_condition(&self, condition: &str, parameter: Option<&ParameterDefinition>, message: ResolveError) -> Rejected {
        Rejected {
            rejection: Rejection::Condition(ConditionFailure {
                condition: condition.to_string(),
                parameter: parameter.map(|p| p.name().to_string()),
                message,
            }),
            consumed: self.consumed(),
            bound: self.bound.len(),
        }
    }

    fn check_constraints(&self, param: &ParameterDefinition, value: &Value) -> Result<(), Rejected> {
        for constraint in param.constraints() {
            constraint
                .check(value)
                .map_err(|e| self.fail(Some(param), FailureReason::Invalid(e)))?;
        }
        Ok(())
    }

    fn resolver(&self, param: &ParameterDefinition, registries: &Registries) -> Result<ResolverEntry, Rejected> {
        registries.resolver(param.type_key()).ok_or_else(|| {
            log::error!(
                "no resolver registered for type '{}' (parameter '{}' of '{}')",
                param.type_key(),
                param.name(),
                self.command.command_name()
            );
            self.fail(Some(param), FailureReason::UnknownType(param.type_key().clone()))
        })
    }
}

/* -------------------------------------------------------------------------- */
/* Pipeline                                                                   */
/* -------------------------------------------------------------------------- */

enum FlagInput {
    Switch(bool),
    Valued(String),
}

/// Bind every parameter of `ctx.command()` or explain why not.
pub fn resolve(ctx: ResolutionContext<'_>, registries: &Registries) -> Result<Arguments, Rejected> {
    let mut ctx = ctx;
    let command = ctx.command;
    let mut flags = take_flags(&mut ctx)?;

    for param in command.parameters() {
        let binding = bind_parameter(&mut ctx, param, &mut flags, registries)?;
        log::trace!("bound {}.{} = {:?}", command.command_name(), param.name(), binding);
        ctx.bound.bind(param.name(), binding);
    }

    if !ctx.tokens.is_empty() {
        return Err(ctx.fail(None, FailureReason::TooManyArguments));
    }

    check_conditions(&ctx, registries)?;
    Ok(ctx.bound)
}

/// `--name` / `--name=value` split into (name, inline value).
fn split_marker<'t>(token: &'t str, prefix: &str) -> Option<(&'t str, Option<&'t str>)> {
    let rest = token.strip_prefix(prefix)?;
    if rest.is_empty() {
        return None;
    }
    Some(match rest.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (rest, None),
    })
}

fn is_known_marker(command: &CommandDefinition, token: &str, prefix: &str) -> bool {
    split_marker(token, prefix).is_some_and(|(name, _)| {
        command
            .parameters()
            .iter()
            .filter_map(ParameterDefinition::flag_spec)
            .any(|f| f.name.eq_ignore_ascii_case(name))
    })
}

fn find_marker(tokens: &VecDeque<String>, prefix: &str, flag: &str) -> Option<(usize, Option<String>)> {
    tokens.iter().enumerate().find_map(|(i, t)| {
        let (name, inline) = split_marker(t, prefix)?;
        name.eq_ignore_ascii_case(flag)
            .then(|| (i, inline.map(str::to_string)))
    })
}

fn take_flags(ctx: &mut ResolutionContext<'_>) -> Result<HashMap<String, FlagInput>, Rejected> {
    let command = ctx.command;
    let mut found = HashMap::new();
    for param in command.parameters() {
        let Some(flag) = param.flag_spec() else {
            continue;
        };
        let Some((idx, inline)) = find_marker(&ctx.tokens, &ctx.flag_prefix, &flag.name) else {
            continue;
        };
        ctx.tokens.remove(idx);
        let marker = format!("{}{}", ctx.flag_prefix, flag.name);

        let input = if flag.switch {
            match inline {
                None => FlagInput::Switch(true),
                Some(raw) => match parse_bool(&raw) {
                    Some(on) => FlagInput::Switch(on),
                    None => {
                        let err = ResolveError::new(keys::MUST_BE_A_BOOLEAN).with("input", raw);
                        return Err(ctx.fail(Some(param), FailureReason::Invalid(err)));
                    }
                },
            }
        } else {
            let value = match inline {
                Some(raw) => Some(raw),
                None if ctx
                    .tokens
                    .get(idx)
                    .is_some_and(|t| !is_known_marker(command, t, &ctx.flag_prefix)) =>
                {
                    ctx.tokens.remove(idx)
                }
                None => None,
            };
            match value {
                Some(raw) => FlagInput::Valued(raw),
                None => {
                    return Err(ctx.fail(Some(param), FailureReason::MissingFlagValue { flag: marker }));
                }
            }
        };
        log::trace!("flag {marker} taken for {}", command.command_name());
        found.insert(param.name().to_string(), input);
    }
    Ok(found)
}

fn call(
    entry: &ResolverEntry,
    issuer: &dyn CommandIssuer,
    command: &CommandDefinition,
    param: &ParameterDefinition,
    tokens: &mut VecDeque<String>,
    bound: &Arguments,
) -> Result<Value, ResolveError> {
    let mut rc = ResolveContext::new(issuer, command, param, tokens, bound);
    (entry.resolver)(&mut rc)
}

fn bind_parameter(
    ctx: &mut ResolutionContext<'_>,
    param: &ParameterDefinition,
    flags: &mut HashMap<String, FlagInput>,
    registries: &Registries,
) -> Result<BoundValue, Rejected> {
    if param.flag_spec().is_some() {
        return match flags.remove(param.name()) {
            Some(FlagInput::Switch(on)) => Ok(BoundValue::Single(Value::new(on))),
            Some(FlagInput::Valued(raw)) => {
                let entry = ctx.resolver(param, registries)?;
                let mut tokens = VecDeque::from([raw]);
                let value = call(&entry, ctx.issuer, ctx.command, param, &mut tokens, &ctx.bound)
                    .map_err(|e| ctx.fail(Some(param), FailureReason::Invalid(e)))?;
                ctx.check_constraints(param, &value)?;
                Ok(BoundValue::Single(value))
            }
            None if param.is_switch() => Ok(match param.default() {
                Some(DefaultValue::Value(v)) => BoundValue::Single(v.clone()),
                _ => BoundValue::Single(Value::new(false)),
            }),
            None => bind_default(ctx, param, registries),
        };
    }

    if param.is_contextual() {
        let entry = ctx.resolver(param, registries)?;
        let mut none = VecDeque::new();
        let value = call(&entry, ctx.issuer, ctx.command, param, &mut none, &ctx.bound)
            .map_err(|e| ctx.fail(Some(param), FailureReason::Invalid(e)))?;
        ctx.check_constraints(param, &value)?;
        return Ok(BoundValue::Single(value));
    }

    if param.is_variadic() {
        return bind_variadic(ctx, param, registries);
    }

    if ctx.tokens.is_empty() {
        let issuer_aware = registries
            .resolver(param.type_key())
            .is_some_and(|e| e.issuer_aware);
        if !issuer_aware {
            return bind_default(ctx, param, registries);
        }
    }

    let entry = ctx.resolver(param, registries)?;
    let had_tokens = !ctx.tokens.is_empty();
    match call(&entry, ctx.issuer, ctx.command, param, &mut ctx.tokens, &ctx.bound) {
        Ok(value) => {
            ctx.check_constraints(param, &value)?;
            Ok(BoundValue::Single(value))
        }
        Err(_) if !had_tokens && param.is_optional() => bind_default(ctx, param, registries),
        Err(e) => Err(ctx.fail(Some(param), FailureReason::Invalid(e))),
    }
}

fn bind_variadic(
    ctx: &mut ResolutionContext<'_>,
    param: &ParameterDefinition,
    registries: &Registries,
) -> Result<BoundValue, Rejected> {
    let min = param.min_arity_value();
    if ctx.tokens.is_empty() && param.default().is_some() {
        return bind_default(ctx, param, registries);
    }
    if ctx.tokens.len() < min {
        let found = ctx.tokens.len();
        return Err(ctx.fail(Some(param), FailureReason::NotEnoughArguments { min, found }));
    }
    if ctx.tokens.is_empty() {
        return Ok(BoundValue::Many(Vec::new()));
    }

    let entry = ctx.resolver(param, registries)?;
    let mut values = Vec::new();
    while !ctx.tokens.is_empty() {
        let before = ctx.tokens.len();
        let value = call(&entry, ctx.issuer, ctx.command, param, &mut ctx.tokens, &ctx.bound)
            .map_err(|e| ctx.fail(Some(param), FailureReason::Invalid(e)))?;
        ctx.check_constraints(param, &value)?;
        values.push(value);
        if ctx.tokens.len() == before {
            break;
        }
    }
    Ok(BoundValue::Many(values))
}

fn bind_default(
    ctx: &mut ResolutionContext<'_>,
    param: &ParameterDefinition,
    registries: &Registries,
) -> Result<BoundValue, Rejected> {
    match param.default() {
        Some(DefaultValue::Value(v)) => Ok(BoundValue::Single(v.clone())),
        Some(DefaultValue::Input(input)) => {
            let entry = ctx.resolver(param, registries)?;
            let mut tokens: VecDeque<String> = input.split_whitespace().map(str::to_string).collect();
            let mut values = Vec::new();
            loop {
                let before = tokens.len();
                let value = call(&entry, ctx.issuer, ctx.command, param, &mut tokens, &ctx.bound)
                    .map_err(|e| ctx.fail(Some(param), FailureReason::Invalid(e)))?;
                ctx.check_constraints(param, &value)?;
                values.push(value);
                if !param.is_variadic() || tokens.is_empty() || tokens.len() == before {
                    break;
                }
            }
            if param.is_variadic() {
                Ok(BoundValue::Many(values))
            } else {
                Ok(values.pop().map_or(BoundValue::Absent, BoundValue::Single))
            }
        }
        None if param.is_optional() => Ok(BoundValue::Absent),
        None => Err(ctx.fail(Some(param), FailureReason::MissingArgument)),
    }
}

fn check_conditions(ctx: &ResolutionContext<'_>, registries: &Registries) -> Result<(), Rejected> {
    let command = ctx.command;
    let attached = command
        .conditions()
        .iter()
        .map(|spec| (None, spec))
        .chain(command.parameters().iter().flat_map(|p| {
            p.conditions().iter().map(move |spec| (Some(p), spec))
        }));

    for (param, spec) in attached {
        // Nothing to check on an optional parameter that was left out.
        if let Some(p) = param
            && ctx.bound.bound(p.name()).is_none_or(BoundValue::is_absent)
        {
            continue;
        }
        for (name, config) in parse_conditions(spec) {
            let Some(condition) = registries.condition(&name) else {
                log::warn!(
                    "unknown condition '{name}' referenced by '{}'",
                    command.command_name()
                );
                let message = ResolveError::new(keys::CONDITION_FAILED).with("condition", name.as_str());
                return Err(ctx.fail_condition(&name, param, message));
            };
            let cc = ConditionContext::new(ctx.issuer, command, param, &ctx.bound, config.as_deref());
            (condition)(&cc).map_err(|e| ctx.fail_condition(&name, param, e))?;
        }
    }
    Ok(())
}

/* -------------------------------------------------------------------------- */
/* Completion support                                                         */
/* -------------------------------------------------------------------------- */

pub(crate) enum CompletionTarget<'c> {
    Parameter(&'c ParameterDefinition),
    /// Partial token starts with the flag prefix: the unused markers.
    FlagMarkers(Vec<String>),
    Nothing,
}

/// Best-effort walk over the tokens before the partial one.
///
/// Resolver failures skip a token instead of aborting, so later parameters
/// can still be located. Returns the parameter the partial token would fill
/// and whatever could be bound along the way.
pub(crate) fn locate_completion<'c>(
    issuer: &dyn CommandIssuer,
    command: &'c CommandDefinition,
    preceding: &[String],
    partial: &str,
    flag_prefix: &str,
    registries: &Registries,
) -> (CompletionTarget<'c>, Arguments) {
    let flag_prefix = if flag_prefix.is_empty() { DEFAULT_FLAG_PREFIX } else { flag_prefix };
    let mut tokens: VecDeque<String> = preceding.iter().cloned().collect();
    let mut bound = Arguments::new();

    if partial.starts_with(flag_prefix) {
        let markers = command
            .parameters()
            .iter()
            .filter_map(ParameterDefinition::flag_spec)
            .filter(|f| find_marker(&tokens, flag_prefix, &f.name).is_none())
            .map(|f| format!("{flag_prefix}{}", f.name))
            .collect();
        return (CompletionTarget::FlagMarkers(markers), bound);
    }

    let mut flag_target = preceding.last().and_then(|last| {
        let (name, inline) = split_marker(last, flag_prefix)?;
        if inline.is_some() {
            return None;
        }
        command.parameters().iter().find(|p| {
            p.flag_spec()
                .is_some_and(|f| !f.switch && f.name.eq_ignore_ascii_case(name))
        })
    });

    for param in command.parameters() {
        let Some(flag) = param.flag_spec() else {
            continue;
        };
        let Some((idx, inline)) = find_marker(&tokens, flag_prefix, &flag.name) else {
            continue;
        };
        tokens.remove(idx);
        if flag.switch {
            bound.bind(param.name(), BoundValue::Single(Value::new(true)));
            continue;
        }
        let Some(raw) = inline.or_else(|| tokens.remove(idx)) else {
            continue;
        };
        if let Some(entry) = registries.resolver(param.type_key()) {
            let mut one = VecDeque::from([raw]);
            if let Ok(v) = call(&entry, issuer, command, param, &mut one, &bound) {
                bound.bind(param.name(), BoundValue::Single(v));
            }
        }
    }

    for param in command.parameters() {
        if param.flag_spec().is_some() {
            continue;
        }
        let entry = registries.resolver(param.type_key());
        if param.is_contextual() {
            if let Some(entry) = entry {
                let mut none = VecDeque::new();
                if let Ok(v) = call(&entry, issuer, command, param, &mut none, &bound) {
                    bound.bind(param.name(), BoundValue::Single(v));
                }
            }
            continue;
        }
        if param.is_variadic() {
            let mut values = Vec::new();
            if let Some(entry) = &entry {
                while !tokens.is_empty() {
                    let before = tokens.len();
                    if let Ok(v) = call(entry, issuer, command, param, &mut tokens, &bound) {
                        values.push(v);
                    }
                    if tokens.len() == before {
                        tokens.pop_front();
                    }
                }
            }
            bound.bind(param.name(), BoundValue::Many(values));
            let target = flag_target.take().unwrap_or(param);
            return (CompletionTarget::Parameter(target), bound);
        }
        if tokens.is_empty() {
            let target = flag_target.take().unwrap_or(param);
            return (CompletionTarget::Parameter(target), bound);
        }
        let Some(entry) = entry else {
            tokens.pop_front();
            continue;
        };
        let before = tokens.len();
        match call(&entry, issuer, command, param, &mut tokens, &bound) {
            Ok(v) => bound.bind(param.name(), BoundValue::Single(v)),
            Err(_) if tokens.len() == before => {
                tokens.pop_front();
            }
            Err(_) => {}
        }
    }

    match flag_target {
        Some(p) => (CompletionTarget::Parameter(p), bound),
        None => (CompletionTarget::Nothing, bound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;

    struct Console;
    impl CommandIssuer for Console {
        fn has_permission(&self, _: &str) -> bool {
            false
        }
        fn send_message(&self, _: &str) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn toks(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn cmd(params: Vec<ParameterDefinition>) -> CommandDefinition {
        params
            .into_iter()
            .fold(CommandDefinition::builder("team"), |b, p| b.parameter(p))
            .handler(|_, _| Ok(()))
            .build()
            .unwrap()
    }

    fn run(command: &CommandDefinition, line: &str) -> Result<Arguments, Rejected> {
        let regs = Registries::new();
        resolve(ResolutionContext::new(&Console, command, &toks(line)), &regs)
    }

    #[test]
    fn leftover_tokens_reject_shorter_signature() {
        let one = cmd(vec![ParameterDefinition::new("a", "int")]);
        let two = cmd(vec![
            ParameterDefinition::new("a", "int"),
            ParameterDefinition::new("b", "int"),
        ]);
        let err = run(&one, "1 2").unwrap_err();
        assert_eq!(err.consumed, 1);
        assert!(matches!(
            err.rejection,
            Rejection::Resolution(ResolutionFailure { reason: FailureReason::TooManyArguments, .. })
        ));
        let args = run(&two, "1 2").unwrap();
        assert_eq!(args.get::<i64>("b"), Some(&2));
    }

    #[test]
    fn missing_required_names_first_unfilled() {
        let c = cmd(vec![
            ParameterDefinition::new("player", "string"),
            ParameterDefinition::new("count", "int"),
        ]);
        let err = run(&c, "steve").unwrap_err();
        assert_eq!(err.parameter(), Some("count"));
        assert_eq!(err.message().key, keys::MISSING_ARGUMENT);
        assert_eq!(err.bound, 1);
    }

    #[test]
    fn flags_anywhere_and_switch_defaults() {
        let c = cmd(vec![
            ParameterDefinition::new("name", "string"),
            ParameterDefinition::new("color", "string").flag().optional(),
            ParameterDefinition::switch("private"),
        ]);
        let args = run(&c, "--COLOR red blue").unwrap();
        assert_eq!(args.get::<String>("name").map(String::as_str), Some("blue"));
        assert_eq!(args.get::<String>("color").map(String::as_str), Some("red"));
        assert!(!args.flag("private"));

        let args = run(&c, "blue --private --color=green").unwrap();
        assert!(args.flag("private"));
        assert_eq!(args.get::<String>("color").map(String::as_str), Some("green"));
        let names: Vec<&str> = args.names().collect();
        assert_eq!(names, vec!["name", "color", "private"]);
    }

    #[test]
    fn valued_flag_without_value() {
        let c = cmd(vec![
            ParameterDefinition::new("color", "string").flag().optional(),
            ParameterDefinition::switch("private"),
        ]);
        let err = run(&c, "--color").unwrap_err();
        assert_eq!(
            err.message(),
            ResolveError::new(keys::MISSING_FLAG_VALUE).with("flag", "--color")
        );
        assert!(run(&c, "--color --private").is_err());
    }

    #[test]
    fn variadic_min_arity_and_order() {
        let c = cmd(vec![ParameterDefinition::new("words", "string").variadic().min_arity(2)]);
        let args = run(&c, "a b c").unwrap();
        assert_eq!(args.get_many::<String>("words"), vec!["a", "b", "c"]);
        let err = run(&c, "a").unwrap_err();
        assert!(matches!(
            err.rejection,
            Rejection::Resolution(ResolutionFailure {
                reason: FailureReason::NotEnoughArguments { min: 2, found: 1 },
                ..
            })
        ));

        let open = cmd(vec![ParameterDefinition::new("words", "int").variadic()]);
        let args = run(&open, "").unwrap();
        assert!(args.get_many::<i64>("words").is_empty());
        assert!(run(&open, "1 x").is_err());
    }

    #[test]
    fn defaults_value_and_input() {
        let shared = Value::new(String::from("none given"));
        let c = cmd(vec![
            ParameterDefinition::new("reason", "string").default_value(shared.clone()),
            ParameterDefinition::new("page", "int").default_input("1"),
            ParameterDefinition::new("extra", "string").optional(),
        ]);
        let args = run(&c, "").unwrap();
        assert!(Value::ptr_eq(args.value("reason").unwrap(), &shared));
        assert_eq!(args.get::<i64>("page"), Some(&1));
        assert!(!args.is_present("extra"));
    }

    #[test]
    fn constraints_reject_bound_values() {
        let c = cmd(vec![ParameterDefinition::new("n", "int").range(Some(1.0), Some(5.0))]);
        assert!(run(&c, "3").is_ok());
        assert_eq!(run(&c, "9").unwrap_err().message().key, keys::MUST_BE_MAX_VALUE);
    }

    #[test]
    fn unknown_type_and_condition() {
        let c = cmd(vec![ParameterDefinition::new("p", "player")]);
        let err = run(&c, "steve").unwrap_err();
        assert_eq!(err.message().key, keys::ERROR_GENERIC_LOGGED);

        let c = CommandDefinition::builder("team")
            .condition("ingame")
            .handler(|_, _| Ok(()))
            .build()
            .unwrap();
        let err = run(&c, "").unwrap_err();
        assert!(matches!(err.rejection, Rejection::Condition(_)));
        assert_eq!(err.message().key, keys::CONDITION_FAILED);
    }

    #[test]
    fn perm_condition_on_parameter() {
        let c = cmd(vec![
            ParameterDefinition::new("target", "string")
                .optional()
                .condition("perm:team.others"),
        ]);
        assert!(run(&c, "").is_ok());
        let err = run(&c, "alex").unwrap_err();
        assert_eq!(err.message().key, keys::PERMISSION_DENIED);
        assert_eq!(err.parameter(), Some("target"));
    }

    #[test]
    fn condition_beats_resolution_at_equal_depth() {
        let cond = Rejected {
            rejection: Rejection::Condition(ConditionFailure {
                condition: "x".into(),
                parameter: None,
                message: ResolveError::new("k"),
            }),
            consumed: 1,
            bound: 1,
        };
        let res = Rejected {
            rejection: Rejection::Resolution(ResolutionFailure {
                parameter: None,
                reason: FailureReason::TooManyArguments,
            }),
            consumed: 1,
            bound: 1,
        };
        assert!(cond.outranks(&res));
        assert!(!res.outranks(&res.clone()));
    }

    #[test]
    fn completion_target_follows_tokens() {
        let regs = Registries::new();
        let c = cmd(vec![
            ParameterDefinition::new("name", "string"),
            ParameterDefinition::new("size", "int"),
            ParameterDefinition::new("color", "string").flag().optional(),
            ParameterDefinition::switch("private"),
        ]);
        let (target, bound) = locate_completion(&Console, &c, &toks("red"), "", "--", &regs);
        assert!(matches!(target, CompletionTarget::Parameter(p) if p.name() == "size"));
        assert_eq!(bound.get::<String>("name").map(String::as_str), Some("red"));

        let (target, _) = locate_completion(&Console, &c, &toks("red --color"), "b", "--", &regs);
        assert!(matches!(target, CompletionTarget::Parameter(p) if p.name() == "color"));

        let (target, _) = locate_completion(&Console, &c, &toks("--private"), "--", "--", &regs);
        match target {
            CompletionTarget::FlagMarkers(m) => assert_eq!(m, vec!["--color"]),
            _ => panic!("expected markers"),
        }

        let (target, _) = locate_completion(&Console, &c, &toks("red 3"), "", "--", &regs);
        assert!(matches!(target, CompletionTarget::Nothing));
    }
}
