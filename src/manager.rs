/*!
manager.rs

`CommandManager` owns everything one host needs: the routing tree, the
registries, the message catalog and the formatter. It is `Send + Sync`; every
piece of mutable state sits behind its own `parking_lot::RwLock` and no lock
is held while host code (resolvers, providers, conditions, handlers) runs.

Dispatch lives in `dispatcher.rs`, completion in `completion.rs`, help in
`help.rs`; they are further `impl CommandManager` blocks.
*/

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::{CommandFile, HandlerTable, ManagerSettings};
use crate::definition::{CommandDefinition, TypeKey};
use crate::error::{RegistrationError, ResolveError};
use crate::format::{MessageFormatter, MessageType, PlainFormatter};
use crate::issuer::CommandIssuer;
use crate::locales::{Locales, keys};
use crate::registry::{CompletionContext, ConditionContext, Registries, ResolveContext};
use crate::resolution::DEFAULT_FLAG_PREFIX;
use crate::tree::{Candidate, CommandTree};
use crate::value::Value;

pub struct CommandManager {
    tree: RwLock<CommandTree>,
    registries: Registries,
    locales: RwLock<Locales>,
    formatter: RwLock<Arc<dyn MessageFormatter>>,
    settings: RwLock<ManagerSettings>,
}

impl Default for CommandManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandManager {
    pub fn new() -> Self {
        Self::with_settings(ManagerSettings::default())
    }

    pub fn with_settings(settings: ManagerSettings) -> Self {
        let manager = Self {
            tree: RwLock::new(CommandTree::new()),
            registries: Registries::new(),
            locales: RwLock::new(Locales::new(settings.default_locale.clone())),
            formatter: RwLock::new(Arc::new(PlainFormatter)),
            settings: RwLock::new(ManagerSettings::default()),
        };
        manager.apply_settings(settings);
        manager
    }

    /// Replace the settings. The default locale and `@locales` follow.
    pub fn apply_settings(&self, settings: ManagerSettings) {
        self.locales
            .write()
            .set_default_locale(settings.default_locale.clone());
        let offered: Vec<String> = settings
            .supported_locales
            .iter()
            .map(|l| l.as_str().to_string())
            .collect();
        self.registries
            .register_completion_provider("@locales", move |_| offered.clone());
        *self.settings.write() = settings;
    }

    pub fn settings(&self) -> ManagerSettings {
        self.settings.read().clone()
    }

    /// Configured flag prefix; blank falls back to `--`.
    pub(crate) fn flag_prefix(&self) -> String {
        let settings = self.settings.read();
        let prefix = settings.flag_prefix.trim();
        if prefix.is_empty() {
            DEFAULT_FLAG_PREFIX.to_string()
        } else {
            prefix.to_string()
        }
    }

    /* ---- Registration ---- */

    /// Register a batch under one root. Either all definitions are
    /// registered or none are.
    pub fn register_root_command(
        &self,
        label: &str,
        definitions: impl IntoIterator<Item = CommandDefinition>,
    ) -> Result<Vec<Arc<CommandDefinition>>, RegistrationError> {
        let definitions: Vec<Arc<CommandDefinition>> = definitions.into_iter().map(Arc::new).collect();
        if let Some(stray) = definitions.iter().find(|d| !d.root().matches(label)) {
            return Err(RegistrationError::invalid(
                stray.command_name(),
                format!("does not belong to root '{label}'"),
            ));
        }
        self.register_all(&definitions)?;
        Ok(definitions)
    }

    pub fn register_command(
        &self,
        definition: CommandDefinition,
    ) -> Result<Arc<CommandDefinition>, RegistrationError> {
        let definition = Arc::new(definition);
        self.tree.write().register(Arc::clone(&definition))?;
        Ok(definition)
    }

    fn register_all(&self, definitions: &[Arc<CommandDefinition>]) -> Result<(), RegistrationError> {
        let mut tree = self.tree.write();
        let mut staged = tree.clone();
        for def in definitions {
            staged.register(Arc::clone(def))?;
        }
        *tree = staged;
        Ok(())
    }

    /// Returns false when nothing matched (already gone).
    pub fn unregister_command(&self, definition: &CommandDefinition) -> bool {
        self.tree.write().unregister(definition)
    }

    pub fn unregister_root_command(&self, label: &str) -> bool {
        let removed = self.tree.write().unregister_root(label);
        if let Some(root) = &removed {
            log::debug!("unregistered root '{}'", root.label());
        }
        removed.is_some()
    }

    pub fn unregister_all(&self) {
        self.tree.write().clear();
    }

    pub fn root_labels(&self) -> Vec<String> {
        self.tree.read().labels()
    }

    pub fn find_candidates(&self, root_label: &str, tokens: &[String]) -> Vec<Candidate> {
        self.tree.read().find_candidates(root_label, tokens)
    }

    /// Every command under `root_label`, in registration order.
    pub fn root_commands(&self, root_label: &str) -> Vec<Arc<CommandDefinition>> {
        self.tree
            .read()
            .root(root_label)
            .map(|r| r.commands())
            .unwrap_or_default()
    }

    /// Snapshot of the tree for read-only walks outside the lock.
    pub(crate) fn tree_snapshot(&self) -> CommandTree {
        self.tree.read().clone()
    }

    /// Register the messages and commands of a command file. Every command is
    /// built before any is registered, and registration is all or nothing.
    pub fn load_commands(&self, file: &CommandFile, handlers: &HandlerTable) -> Result<usize, RegistrationError> {
        let definitions = file
            .commands
            .iter()
            .map(|spec| spec.to_definition(handlers).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        self.register_all(&definitions)?;
        {
            let mut locales = self.locales.write();
            for (locale, messages) in &file.messages {
                locales.add_message_strings(locale.clone(), messages.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
        }
        log::debug!("loaded {} command(s) from config", definitions.len());
        Ok(definitions.len())
    }

    /* ---- Registries ---- */

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn register_type_resolver<F>(&self, key: impl Into<TypeKey>, resolver: F)
    where
        F: Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.registries.register_type_resolver(key, resolver);
    }

    pub fn register_issuer_aware_resolver<F>(&self, key: impl Into<TypeKey>, resolver: F)
    where
        F: Fn(&mut ResolveContext<'_>) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.registries.register_issuer_aware_resolver(key, resolver);
    }

    pub fn register_completion_provider<F>(&self, key: &str, provider: F)
    where
        F: Fn(&CompletionContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        self.registries.register_completion_provider(key, provider);
    }

    pub fn register_condition<F>(&self, name: &str, condition: F)
    where
        F: Fn(&ConditionContext<'_>) -> Result<(), ResolveError> + Send + Sync + 'static,
    {
        self.registries.register_condition(name, condition);
    }

    /* ---- Messages ---- */

    pub fn locales(&self) -> RwLockReadGuard<'_, Locales> {
        self.locales.read()
    }

    pub fn locales_mut(&self) -> RwLockWriteGuard<'_, Locales> {
        self.locales.write()
    }

    pub fn set_formatter(&self, formatter: impl MessageFormatter + 'static) {
        *self.formatter.write() = Arc::new(formatter);
    }

    fn formatter(&self) -> Arc<dyn MessageFormatter> {
        Arc::clone(&self.formatter.read())
    }

    /// Localize `key` for the issuer and run it through the formatter.
    pub fn format_message(
        &self,
        issuer: &dyn CommandIssuer,
        message_type: MessageType,
        key: &str,
        replacements: &[(String, String)],
    ) -> String {
        let locale = issuer.locale();
        let text = self.locales.read().message(key, locale.as_ref(), replacements);
        self.formatter().format(message_type, &text)
    }

    /// Format ready text (no catalog lookup).
    pub fn format_text(&self, message_type: MessageType, text: &str) -> String {
        self.formatter().format(message_type, text)
    }

    pub fn send_message(
        &self,
        issuer: &dyn CommandIssuer,
        message_type: MessageType,
        key: &str,
        replacements: &[(String, String)],
    ) {
        let text = self.format_message(issuer, message_type, key, replacements);
        issuer.send_message(&text);
    }

    /// `Usage: team invite <player>` for one command, as typed under `label`.
    pub fn usage_line(&self, issuer: &dyn CommandIssuer, label: &str, command: &CommandDefinition) -> String {
        let sub = command.subcommand_name();
        let shown = if sub.is_empty() {
            label.to_string()
        } else {
            format!("{label} {sub}")
        };
        let replacements = [
            ("{command}".to_string(), shown),
            ("{syntax}".to_string(), command.syntax_with_prefix(&self.flag_prefix())),
        ];
        self.format_message(issuer, MessageType::Syntax, keys::INVALID_SYNTAX, &replacements)
    }
}
