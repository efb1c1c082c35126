//! Message catalog and locale fallback.
//!
//! `resolve` walks requested locale -> its language (`en_us` -> `en`) ->
//! default locale -> built-in English, and hands back the raw key when
//! nothing matches. It never fails. `{@@key}` references inside free text
//! (descriptions) are expanded by `replace_i18n`.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Message keys the framework itself sends.
pub mod keys {
    pub const PERMISSION_DENIED: &str = "cmdroute.permission_denied";
    pub const UNKNOWN_COMMAND: &str = "cmdroute.unknown_command";
    pub const INVALID_SYNTAX: &str = "cmdroute.invalid_syntax";
    pub const MISSING_ARGUMENT: &str = "cmdroute.missing_argument";
    pub const NOT_ENOUGH_ARGUMENTS: &str = "cmdroute.not_enough_arguments";
    pub const TOO_MANY_ARGUMENTS: &str = "cmdroute.too_many_arguments";
    pub const MISSING_FLAG_VALUE: &str = "cmdroute.missing_flag_value";
    pub const MUST_BE_A_NUMBER: &str = "cmdroute.must_be_a_number";
    pub const MUST_BE_A_BOOLEAN: &str = "cmdroute.must_be_a_boolean";
    pub const MUST_BE_MIN_VALUE: &str = "cmdroute.must_be_min_value";
    pub const MUST_BE_MAX_VALUE: &str = "cmdroute.must_be_max_value";
    pub const MUST_BE_MIN_LENGTH: &str = "cmdroute.must_be_min_length";
    pub const MUST_BE_MAX_LENGTH: &str = "cmdroute.must_be_max_length";
    pub const INVALID_FORMAT: &str = "cmdroute.invalid_format";
    pub const PLEASE_SPECIFY_ONE_OF: &str = "cmdroute.please_specify_one_of";
    pub const NOT_ALLOWED_ON_CONSOLE: &str = "cmdroute.not_allowed_on_console";
    pub const CONDITION_FAILED: &str = "cmdroute.condition_failed";
    pub const ERROR_GENERIC_LOGGED: &str = "cmdroute.error_generic_logged";
    pub const ERROR_PERFORMING_COMMAND: &str = "cmdroute.error_performing_command";
    pub const HELP_FORMAT: &str = "cmdroute.help_format";
    pub const HELP_PAGE_INFORMATION: &str = "cmdroute.help_page_information";
    pub const HELP_NO_RESULTS: &str = "cmdroute.help_no_results";
    pub const NO_COMMAND_MATCHED_SEARCH: &str = "cmdroute.no_command_matched_search";
}

const BUILTIN_ENGLISH: &[(&str, &str)] = &[
    (
        keys::PERMISSION_DENIED,
        "I'm sorry, but you do not have permission to perform this command.",
    ),
    (keys::UNKNOWN_COMMAND, "Unknown command <c2>{command}</c2>."),
    (keys::INVALID_SYNTAX, "Usage: <c2>{command}</c2> <c3>{syntax}</c3>"),
    (
        keys::MISSING_ARGUMENT,
        "Error: Please specify a value for <c2>{parameter}</c2>.",
    ),
    (
        keys::NOT_ENOUGH_ARGUMENTS,
        "Error: <c2>{parameter}</c2> needs at least <c2>{min}</c2> values.",
    ),
    (keys::TOO_MANY_ARGUMENTS, "Error: Too many arguments given."),
    (
        keys::MISSING_FLAG_VALUE,
        "Error: Flag <c2>{flag}</c2> requires a value.",
    ),
    (keys::MUST_BE_A_NUMBER, "Error: <c2>{num}</c2> must be a number."),
    (
        keys::MUST_BE_A_BOOLEAN,
        "Error: <c2>{input}</c2> must be true or false.",
    ),
    (keys::MUST_BE_MIN_VALUE, "Error: Minimum value is <c2>{min}</c2>."),
    (keys::MUST_BE_MAX_VALUE, "Error: Maximum value is <c2>{max}</c2>."),
    (
        keys::MUST_BE_MIN_LENGTH,
        "Error: Must be at least <c2>{min}</c2> characters long.",
    ),
    (
        keys::MUST_BE_MAX_LENGTH,
        "Error: Must be at most <c2>{max}</c2> characters long.",
    ),
    (
        keys::INVALID_FORMAT,
        "Error: <c2>{input}</c2> is not in the expected format.",
    ),
    (
        keys::PLEASE_SPECIFY_ONE_OF,
        "Error: Please specify one of (<c2>{valid}</c2>).",
    ),
    (
        keys::NOT_ALLOWED_ON_CONSOLE,
        "Error: Console may not execute this command.",
    ),
    (
        keys::CONDITION_FAILED,
        "Error: Requirement <c2>{condition}</c2> is not met.",
    ),
    (
        keys::ERROR_GENERIC_LOGGED,
        "An error occurred. This problem has been logged. Sorry for the inconvenience.",
    ),
    (
        keys::ERROR_PERFORMING_COMMAND,
        "I'm sorry, but there was an error performing this command.",
    ),
    (
        keys::HELP_FORMAT,
        "<c1>{command}</c1> <c2>{parameters}</c2> <c3>{separator} {description}</c3>",
    ),
    (
        keys::HELP_PAGE_INFORMATION,
        "- Showing page <c2>{page}</c2> of <c2>{totalpages}</c2> (<c3>{results}</c3> results).",
    ),
    (keys::HELP_NO_RESULTS, "Error: No more results."),
    (
        keys::NO_COMMAND_MATCHED_SEARCH,
        "No command matched <c2>{search}</c2>.",
    ),
];

static I18N_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{@@(?P<key>[A-Za-z0-9_.\-]+)\}").expect("static pattern"));

/* ---- Locale ---- */

/// Normalized locale identifier: lowercase, `_` separated (`en`, `pt_br`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Locale(String);

impl Locale {
    pub fn new(tag: &str) -> Self {
        Locale(tag.trim().replace('-', "_").to_lowercase())
    }

    pub fn english() -> Self {
        Locale::new("en")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Language part (`pt_br` -> `pt`); `None` when already bare.
    pub fn language(&self) -> Option<Locale> {
        self.0
            .split_once('_')
            .map(|(lang, _)| Locale(lang.to_string()))
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale::english()
    }
}

impl From<String> for Locale {
    fn from(s: String) -> Self {
        Locale::new(&s)
    }
}

impl From<&str> for Locale {
    fn from(s: &str) -> Self {
        Locale::new(s)
    }
}

impl From<Locale> for String {
    fn from(l: Locale) -> Self {
        l.0
    }
}

impl FromStr for Locale {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Locale::new(s))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/* ---- Catalog ---- */

#[derive(Debug, Clone)]
pub struct Locales {
    default_locale: Locale,
    catalogs: HashMap<Locale, HashMap<String, String>>,
}

impl Default for Locales {
    fn default() -> Self {
        Self::new(Locale::english())
    }
}

impl Locales {
    /// Catalog with the built-in English messages loaded.
    pub fn new(default_locale: Locale) -> Self {
        let mut locales = Self {
            default_locale,
            catalogs: HashMap::new(),
        };
        locales.add_message_strings(Locale::english(), BUILTIN_ENGLISH.iter().copied());
        locales
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default_locale
    }

    /// Replace the default locale, returning the previous one.
    pub fn set_default_locale(&mut self, locale: Locale) -> Locale {
        std::mem::replace(&mut self.default_locale, locale)
    }

    /// Add or replace one message. Returns the replaced text.
    pub fn add_message(
        &mut self,
        locale: Locale,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Option<String> {
        self.catalogs
            .entry(locale)
            .or_default()
            .insert(key.into(), message.into())
    }

    pub fn add_message_strings<K, V>(
        &mut self,
        locale: Locale,
        messages: impl IntoIterator<Item = (K, V)>,
    ) where
        K: Into<String>,
        V: Into<String>,
    {
        let catalog = self.catalogs.entry(locale).or_default();
        for (k, v) in messages {
            catalog.insert(k.into(), v.into());
        }
    }

    /// Load a YAML document of (possibly nested) string maps for one locale.
    ///
    /// Nested keys are joined with `.`: `{team: {full: "..."}}` defines
    /// `team.full`. Returns the number of messages added.
    pub fn load_yaml(&mut self, locale: Locale, text: &str) -> Result<usize, serde_yaml::Error> {
        let doc: serde_yaml::Value = serde_yaml::from_str(text)?;
        let mut flat = Vec::new();
        flatten_yaml("", &doc, &mut flat);
        let count = flat.len();
        self.add_message_strings(locale, flat);
        Ok(count)
    }

    /// Locales that have at least one message, sorted.
    pub fn locales(&self) -> Vec<Locale> {
        let mut out: Vec<Locale> = self.catalogs.keys().cloned().collect();
        out.sort();
        out
    }

    /// Raw catalog text for `key`, following the locale fallback chain.
    pub fn lookup(&self, key: &str, locale: Option<&Locale>) -> Option<&str> {
        let mut chain: Vec<Locale> = Vec::with_capacity(4);
        if let Some(l) = locale {
            chain.push(l.clone());
            if let Some(lang) = l.language() {
                chain.push(lang);
            }
        }
        chain.push(self.default_locale.clone());
        if let Some(lang) = self.default_locale.language() {
            chain.push(lang);
        }
        chain.push(Locale::english());
        chain
            .iter()
            .find_map(|l| self.catalogs.get(l).and_then(|c| c.get(key)))
            .map(String::as_str)
    }

    /// Resolve `key` and apply replacements. Unknown keys come back verbatim.
    pub fn resolve(
        &self,
        key: &str,
        locale: Option<&Locale>,
        replacements: &[(String, String)],
    ) -> String {
        let text = self.lookup(key, locale).unwrap_or(key);
        let text = self.replace_i18n(text, locale);
        apply_replacements(&text, replacements)
    }

    /// Like `resolve`, but a missing key is logged and rendered as
    /// `<MISSING_LANGUAGE_KEY:key>` so it stands out in issuer output.
    pub fn message(
        &self,
        key: &str,
        locale: Option<&Locale>,
        replacements: &[(String, String)],
    ) -> String {
        if self.lookup(key, locale).is_none() {
            log::warn!("Missing language key: {key}");
            return format!("<MISSING_LANGUAGE_KEY:{key}>");
        }
        self.resolve(key, locale, replacements)
    }

    /// Expand `{@@key}` references in free text.
    pub fn replace_i18n(&self, text: &str, locale: Option<&Locale>) -> String {
        if !text.contains("{@@") {
            return text.to_string();
        }
        I18N_REF
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let key = &caps["key"];
                self.lookup(key, locale).unwrap_or(key).to_string()
            })
            .into_owned()
    }
}

pub(crate) fn apply_replacements(text: &str, replacements: &[(String, String)]) -> String {
    let mut out = text.to_string();
    for (placeholder, value) in replacements {
        out = out.replace(placeholder.as_str(), value);
    }
    out
}

fn flatten_yaml(prefix: &str, value: &serde_yaml::Value, out: &mut Vec<(String, String)>) {
    let join = |k: &str| {
        if prefix.is_empty() {
            k.to_string()
        } else {
            format!("{prefix}.{k}")
        }
    };
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                flatten_yaml(&join(&key), v, out);
            }
        }
        serde_yaml::Value::String(s) if !prefix.is_empty() => out.push((prefix.to_string(), s.clone())),
        serde_yaml::Value::Number(n) if !prefix.is_empty() => out.push((prefix.to_string(), n.to_string())),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repl(k: &str, v: &str) -> Vec<(String, String)> {
        vec![(k.to_string(), v.to_string())]
    }

    #[test]
    fn falls_back_through_language_and_default() {
        let mut l = Locales::default();
        l.add_message(Locale::new("de"), "team.full", "Team ist voll");
        l.add_message(Locale::english(), "team.full", "Team is full");

        assert_eq!(l.resolve("team.full", Some(&Locale::new("de-AT")), &[]), "Team ist voll");
        assert_eq!(l.resolve("team.full", Some(&Locale::new("fr")), &[]), "Team is full");
        assert_eq!(l.resolve("team.full", None, &[]), "Team is full");
    }

    #[test]
    fn unknown_key_is_returned_raw() {
        let l = Locales::default();
        assert_eq!(l.resolve("nope.key", None, &[]), "nope.key");
        assert_eq!(l.message("nope.key", None, &[]), "<MISSING_LANGUAGE_KEY:nope.key>");
    }

    #[test]
    fn replacements_and_i18n_refs() {
        let mut l = Locales::default();
        l.add_message(Locale::english(), "desc.invite", "Invite a player");
        assert_eq!(
            l.resolve(keys::MUST_BE_A_NUMBER, None, &repl("{num}", "abc")),
            "Error: <c2>abc</c2> must be a number."
        );
        assert_eq!(l.replace_i18n("{@@desc.invite}!", None), "Invite a player!");
        assert_eq!(l.replace_i18n("{@@missing}", None), "missing");
    }

    #[test]
    fn yaml_bundle_is_flattened() {
        let mut l = Locales::default();
        let n = l
            .load_yaml(
                Locale::new("de"),
                "team:\n  full: \"Team ist voll\"\n  invite:\n    sent: Einladung gesendet\n",
            )
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(l.lookup("team.invite.sent", Some(&Locale::new("de"))), Some("Einladung gesendet"));
        assert!(l.locales().contains(&Locale::new("de")));
    }

    #[test]
    fn default_locale_swap() {
        let mut l = Locales::default();
        let prev = l.set_default_locale(Locale::new("de"));
        assert_eq!(prev, Locale::english());
        l.add_message(Locale::new("de"), keys::TOO_MANY_ARGUMENTS, "Zu viele Argumente.");
        assert_eq!(l.resolve(keys::TOO_MANY_ARGUMENTS, None, &[]), "Zu viele Argumente.");
        // Keys the new default lacks still come from the built-in English catalog.
        assert_eq!(l.resolve(keys::HELP_NO_RESULTS, None, &[]), "Error: No more results.");
    }
}
