//! Command help: listing, search and pagination for one root.

use std::sync::Arc;

use crate::definition::CommandDefinition;
use crate::format::MessageType;
use crate::issuer::CommandIssuer;
use crate::locales::keys;
use crate::manager::CommandManager;
use crate::resolution::DEFAULT_FLAG_PREFIX;

#[derive(Debug, Clone)]
pub struct HelpEntry {
    command: Arc<CommandDefinition>,
    /// What the issuer reads; `{@@key}` references already expanded.
    description: String,
    search_score: usize,
}

impl HelpEntry {
    fn new(command: Arc<CommandDefinition>, description: String) -> Self {
        Self {
            command,
            description,
            search_score: 1,
        }
    }

    pub fn command(&self) -> &CommandDefinition {
        &self.command
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn search_score(&self) -> usize {
        self.search_score
    }

    pub fn should_show(&self) -> bool {
        self.search_score > 0
    }
}

/// Help for the commands an issuer may run under one root.
#[derive(Debug, Clone)]
pub struct CommandHelp {
    label: String,
    entries: Vec<HelpEntry>,
    page: usize,
    per_page: usize,
    search: Vec<String>,
    flag_prefix: String,
}

impl CommandHelp {
    /// Descriptions are taken as written.
    pub fn new(label: &str, commands: Vec<Arc<CommandDefinition>>, per_page: usize) -> Self {
        let described = commands
            .into_iter()
            .map(|c| {
                let description = c.description().to_string();
                (c, description)
            })
            .collect();
        Self::with_descriptions(label, described, per_page)
    }

    /// Each command paired with the description to show and search.
    pub fn with_descriptions(
        label: &str,
        commands: Vec<(Arc<CommandDefinition>, String)>,
        per_page: usize,
    ) -> Self {
        Self {
            label: label.to_string(),
            entries: commands
                .into_iter()
                .map(|(command, description)| HelpEntry::new(command, description))
                .collect(),
            page: 1,
            per_page: per_page.max(1),
            search: Vec::new(),
            flag_prefix: DEFAULT_FLAG_PREFIX.to_string(),
        }
    }

    /// Marker prefix used when generating parameter syntax.
    pub fn with_flag_prefix(mut self, prefix: &str) -> Self {
        if !prefix.is_empty() {
            self.flag_prefix = prefix.to_string();
        }
        self
    }

    pub fn entries(&self) -> &[HelpEntry] {
        &self.entries
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Pages start at 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_per_page(&mut self, per_page: usize) {
        self.per_page = per_page.max(1);
    }

    pub fn search_terms(&self) -> &[String] {
        &self.search
    }

    /// Re-score every entry against `terms`. An empty search shows everything.
    pub fn set_search(&mut self, terms: Vec<String>) {
        self.search = terms
            .into_iter()
            .map(|t| t.to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();
        for entry in &mut self.entries {
            entry.search_score = score(entry, &self.search, &self.flag_prefix);
        }
    }

    /// Entries to show, best match first. Equal scores keep registration order.
    pub fn results(&self) -> Vec<&HelpEntry> {
        let mut shown: Vec<&HelpEntry> = self.entries.iter().filter(|e| e.should_show()).collect();
        shown.sort_by(|a, b| b.search_score.cmp(&a.search_score));
        shown
    }

    pub fn total_pages(&self, results: usize) -> usize {
        results.div_ceil(self.per_page)
    }

    /// Render the current page as formatted lines for `issuer`.
    pub fn render(&self, manager: &CommandManager, issuer: &dyn CommandIssuer) -> Vec<String> {
        let mut lines = Vec::new();
        let mut results = self.results();
        if results.is_empty() {
            let search = [("{search}".to_string(), self.search.join(" "))];
            lines.push(manager.format_message(issuer, MessageType::Error, keys::NO_COMMAND_MATCHED_SEARCH, &search));
            results = self.entries.iter().collect();
        }

        let total = results.len();
        let start = self.page.saturating_sub(1).checked_mul(self.per_page);
        let Some(start) = start.filter(|s| *s < total) else {
            lines.push(manager.format_message(issuer, MessageType::Help, keys::HELP_NO_RESULTS, &[]));
            return lines;
        };
        let end = start.saturating_add(self.per_page).min(total);

        let formatted: Vec<Vec<(String, String)>> = results[start..end]
            .iter()
            .map(|e| {
                let cmd = e.command();
                let separator = if e.description.is_empty() { "" } else { "-" };
                vec![
                    ("{command}".to_string(), format!("{} {}", self.label, cmd.subcommand_name()).trim().to_string()),
                    ("{parameters}".to_string(), cmd.syntax_with_prefix(&self.flag_prefix)),
                    ("{separator}".to_string(), separator.to_string()),
                    ("{description}".to_string(), e.description.clone()),
                ]
            })
            .collect();

        for replacements in &formatted {
            let text = manager.format_message(issuer, MessageType::Help, keys::HELP_FORMAT, replacements);
            lines.extend(text.lines().map(|l| l.trim_end().to_string()));
        }
        if start > 0 || end < total {
            let info = [
                ("{page}".to_string(), self.page.to_string()),
                ("{totalpages}".to_string(), self.total_pages(total).to_string()),
                ("{results}".to_string(), total.to_string()),
            ];
            lines.push(manager.format_message(issuer, MessageType::Help, keys::HELP_PAGE_INFORMATION, &info));
        }
        lines
    }

    pub fn show_help(&self, manager: &CommandManager, issuer: &dyn CommandIssuer) {
        for line in self.render(manager, issuer) {
            issuer.send_message(&line);
        }
    }
}

/// Subcommand word contains a term: 3, term contains the word: 1,
/// description: 2, syntax: 1, search tags: 2.
fn score(entry: &HelpEntry, terms: &[String], flag_prefix: &str) -> usize {
    if terms.is_empty() {
        return 1;
    }
    let command = entry.command();
    let description = entry.description.to_lowercase();
    let syntax = command.syntax_with_prefix(flag_prefix).to_lowercase();
    let tags = command.search_tags().map(str::to_lowercase);
    let mut score = 0;
    for term in terms {
        for seg in command.path() {
            let word = seg.primary();
            if word.contains(term.as_str()) {
                score += 3;
            } else if term.contains(word) {
                score += 1;
            }
        }
        if description.contains(term.as_str()) {
            score += 2;
        }
        if syntax.contains(term.as_str()) {
            score += 1;
        }
        if tags.as_deref().is_some_and(|t| t.contains(term.as_str())) {
            score += 2;
        }
    }
    score
}

impl CommandManager {
    /// Help for the commands `issuer` may run under `root_label`, paged with
    /// the configured page size. `None` when the root is unknown.
    pub fn generate_help(&self, issuer: &dyn CommandIssuer, root_label: &str) -> Option<CommandHelp> {
        let tree = self.tree_snapshot();
        let root = tree.root(root_label)?;
        let locale = issuer.locale();
        let permitted: Vec<Arc<CommandDefinition>> = root
            .commands()
            .into_iter()
            .filter(|c| c.has_permission(issuer))
            .collect();
        let locales = self.locales();
        let described: Vec<(Arc<CommandDefinition>, String)> = permitted
            .into_iter()
            .map(|c| {
                let description = locales.replace_i18n(c.description(), locale.as_ref());
                (c, description)
            })
            .collect();
        drop(locales);
        let help = CommandHelp::with_descriptions(root.label(), described, self.settings().help_per_page);
        Some(help.with_flag_prefix(&self.flag_prefix()))
    }
}
