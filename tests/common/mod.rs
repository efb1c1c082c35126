#![allow(dead_code)]

use std::any::Any;
use std::collections::HashSet;

use parking_lot::Mutex;

use cmdroute::{CommandIssuer, Locale};

/// Issuer that records every message it receives.
#[derive(Default)]
pub struct Recorder {
    permissions: HashSet<String>,
    locale: Option<Locale>,
    lines: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permissions(permissions: &[&str]) -> Self {
        Self {
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(Locale::new(locale));
        self
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

impl CommandIssuer for Recorder {
    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    fn locale(&self) -> Option<Locale> {
        self.locale.clone()
    }

    fn send_message(&self, text: &str) {
        self.lines.lock().push(text.to_string());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn words(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
