/*!
format.rs

Message formatting for issuer-facing text.

Catalog messages carry colour tags `<c1>..</c1>`, `<c2>..</c2>` and
`<c3>..</c3>`. A `MessageFormatter` decides what those mean for a given
`MessageType`:
  - PlainFormatter  strips the tags (chat bridges, logs, tests)
  - AnsiFormatter   maps them to ANSI roles (terminals; NO_COLOR respected)

Public API Summary:
  - MessageType
  - MessageFormatter (trait), PlainFormatter, AnsiFormatter
  - StyleOptions::detect() -> StyleOptions
  - color(role, text, &StyleOptions) -> String
  - strip_tags(s) / strip_ansi(s)
*/

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

static COLOR_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<c(?P<n>[1-3])>(?P<body>.*?)</c[1-3]>").expect("static pattern")
});

/* -------------------------------------------------------------------------- */
/* Message Types                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Info,
    Syntax,
    Error,
    Help,
}

pub trait MessageFormatter: Send + Sync {
    fn format(&self, message_type: MessageType, text: &str) -> String;
}

/// Removes colour tags, leaving their content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl MessageFormatter for PlainFormatter {
    fn format(&self, _message_type: MessageType, text: &str) -> String {
        strip_tags(text).into_owned()
    }
}

/* -------------------------------------------------------------------------- */
/* Style Options                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub use_color: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::detect()
    }
}

impl StyleOptions {
    pub fn detect() -> Self {
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
        }
    }

    pub fn plain() -> Self {
        StyleOptions { use_color: false }
    }
}

/* -------------------------------------------------------------------------- */
/* Color                                                                      */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Primary,
    Secondary,
    Accent,
    Success,
    Warning,
    Error,
    Dim,
    Bold,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color || text.as_ref().is_empty() {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Primary => "38;5;45",    // cyan-ish
        Role::Secondary => "38;5;250", // gray
        Role::Accent => "38;5;213",    // magenta/pink
        Role::Success => "38;5;82",    // green
        Role::Warning => "38;5;214",   // orange
        Role::Error => "38;5;196",     // red
        Role::Dim => "2",              // faint
        Role::Bold => "1",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

/* -------------------------------------------------------------------------- */
/* ANSI Formatter                                                             */
/* -------------------------------------------------------------------------- */

/// Maps `<c1>`/`<c2>`/`<c3>` to roles per message type. Untagged text uses
/// the `c1` role.
#[derive(Debug, Clone)]
pub struct AnsiFormatter {
    style: StyleOptions,
}

impl Default for AnsiFormatter {
    fn default() -> Self {
        Self::new(StyleOptions::detect())
    }
}

impl AnsiFormatter {
    pub fn new(style: StyleOptions) -> Self {
        Self { style }
    }

    fn roles(message_type: MessageType) -> [Role; 3] {
        match message_type {
            MessageType::Error => [Role::Error, Role::Warning, Role::Error],
            MessageType::Syntax => [Role::Warning, Role::Success, Role::Secondary],
            MessageType::Info => [Role::Primary, Role::Success, Role::Secondary],
            MessageType::Help => [Role::Accent, Role::Primary, Role::Secondary],
        }
    }
}

impl MessageFormatter for AnsiFormatter {
    fn format(&self, message_type: MessageType, text: &str) -> String {
        let roles = Self::roles(message_type);
        let mut out = String::with_capacity(text.len() + 16);
        let mut last = 0;
        for caps in COLOR_TAG.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&color(roles[0], &text[last..whole.start()], &self.style));
            let idx = caps["n"].parse::<usize>().unwrap_or(1).clamp(1, 3) - 1;
            out.push_str(&color(roles[idx], &caps["body"], &self.style));
            last = whole.end();
        }
        out.push_str(&color(roles[0], &text[last..], &self.style));
        out
    }
}

/* -------------------------------------------------------------------------- */
/* Text Helpers                                                               */
/* -------------------------------------------------------------------------- */

pub fn strip_tags(s: &str) -> Cow<'_, str> {
    if !s.contains("<c") {
        return Cow::Borrowed(s);
    }
    COLOR_TAG.replace_all(s, "$body")
}

pub fn strip_ansi(s: &str) -> Cow<'_, str> {
    // Drops CSI sequences: ESC '[' up to the first letter.
    if !s.contains('\x1b') {
        return Cow::Borrowed(s);
    }
    let mut buf = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for n in chars.by_ref() {
                if n.is_ascii_alphabetic() {
                    break;
                }
            }
            continue;
        }
        buf.push(c);
    }
    Cow::Owned(buf)
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                       */
/* -------------------------------------------------------------------------- */
