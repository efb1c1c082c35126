//! Routing tree: root labels, path segments and the overloads at each node.
//!
//! Matching is case-insensitive on primary names and aliases. A node may hold
//! several commands (overloads); they keep registration order.

use std::sync::Arc;

use crate::definition::{CommandDefinition, Segment};
use crate::error::RegistrationError;
use crate::issuer::CommandIssuer;

/// A command reachable from the routed tokens.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub command: Arc<CommandDefinition>,
    /// How many leading tokens were taken by path segments.
    pub consumed: usize,
}

#[derive(Debug, Clone)]
struct Node {
    segment: Segment,
    children: Vec<Node>,
    commands: Vec<Arc<CommandDefinition>>,
}

impl Node {
    fn new(segment: Segment) -> Self {
        Self {
            segment,
            children: Vec::new(),
            commands: Vec::new(),
        }
    }

    fn child(&self, token: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.segment.matches(token))
    }

    fn child_index_by_primary(&self, primary: &str) -> Option<usize> {
        self.children.iter().position(|c| c.segment.primary() == primary)
    }

    fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.children.is_empty()
    }

    fn any_permitted(&self, issuer: &dyn CommandIssuer) -> bool {
        self.commands.iter().any(|c| c.has_permission(issuer))
            || self.children.iter().any(|c| c.any_permitted(issuer))
    }

    fn collect(&self, out: &mut Vec<Arc<CommandDefinition>>) {
        out.extend(self.commands.iter().cloned());
        for child in &self.children {
            child.collect(out);
        }
    }

    /// Check that `segment` can live among this node's children.
    fn check_sibling(&self, segment: &Segment, command: &str) -> Result<(), RegistrationError> {
        for sibling in &self.children {
            if sibling.segment.primary() == segment.primary() {
                continue;
            }
            if let Some(name) = segment.names().find(|n| sibling.segment.matches(n)) {
                return Err(RegistrationError::conflict(
                    command,
                    format!("'{name}' is already used by '{}'", sibling.segment.primary()),
                ));
            }
        }
        Ok(())
    }

    fn remove(&mut self, path: &[Segment], command: &CommandDefinition) -> bool {
        let Some((first, rest)) = path.split_first() else {
            let signature = command.signature();
            let before = self.commands.len();
            self.commands.retain(|c| c.signature() != signature);
            return self.commands.len() != before;
        };
        let Some(idx) = self.child_index_by_primary(first.primary()) else {
            return false;
        };
        let removed = self.children[idx].remove(rest, command);
        if removed && self.children[idx].is_empty() {
            self.children.remove(idx);
        }
        removed
    }
}

/// One root label and everything registered beneath it.
#[derive(Debug, Clone)]
pub struct RootCommand {
    node: Node,
}

impl RootCommand {
    pub fn new(segment: Segment) -> Self {
        Self {
            node: Node::new(segment),
        }
    }

    pub fn label(&self) -> &str {
        self.node.segment.primary()
    }

    pub fn segment(&self) -> &Segment {
        &self.node.segment
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    /// Validate without mutating, so a failed registration leaves no trace.
    fn check(&self, command: &CommandDefinition) -> Result<(), RegistrationError> {
        let name = command.command_name();
        let mut node = Some(&self.node);
        for seg in command.path() {
            let Some(current) = node else {
                break;
            };
            current.check_sibling(seg, &name)?;
            node = current
                .child_index_by_primary(seg.primary())
                .map(|i| &current.children[i]);
        }
        if let Some(leaf) = node {
            let signature = command.signature();
            if leaf.commands.iter().any(|c| c.signature() == signature) {
                return Err(RegistrationError::conflict(
                    name,
                    format!("an overload with signature {signature} is already registered"),
                ));
            }
        }
        Ok(())
    }

    pub fn register(&mut self, command: Arc<CommandDefinition>) -> Result<(), RegistrationError> {
        self.check(&command)?;
        let mut node = &mut self.node;
        for seg in command.path() {
            let idx = match node.child_index_by_primary(seg.primary()) {
                Some(i) => {
                    node.children[i].segment.merge_aliases(seg);
                    i
                }
                None => {
                    node.children.push(Node::new(seg.clone()));
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
        log::debug!(
            "registered '{}' {}",
            command.command_name(),
            command.signature()
        );
        node.commands.push(command);
        Ok(())
    }

    /// Remove the overload with the same path and signature. Unknown
    /// definitions are ignored.
    pub fn unregister(&mut self, command: &CommandDefinition) -> bool {
        let removed = self.node.remove(command.path(), command);
        if removed {
            log::debug!("unregistered '{}' {}", command.command_name(), command.signature());
        }
        removed
    }

    /// Commands at the deepest matched node that has any, with the number of
    /// tokens the path took.
    pub fn find_candidates(&self, tokens: &[String]) -> Vec<Candidate> {
        let mut node = &self.node;
        let mut best = (&self.node, 0);
        for (depth, token) in tokens.iter().enumerate() {
            let Some(child) = node.child(token) else {
                break;
            };
            node = child;
            if !node.commands.is_empty() {
                best = (node, depth + 1);
            }
        }
        let (node, consumed) = best;
        node.commands
            .iter()
            .map(|c| Candidate {
                command: Arc::clone(c),
                consumed,
            })
            .collect()
    }

    /// Child names and aliases below the node reached by `tokens`, when every
    /// token matched a segment. Only children with a permitted command.
    pub fn next_segments(&self, tokens: &[String], issuer: &dyn CommandIssuer) -> Vec<String> {
        let mut node = &self.node;
        for token in tokens {
            match node.child(token) {
                Some(child) => node = child,
                None => return Vec::new(),
            }
        }
        node.children
            .iter()
            .filter(|c| c.any_permitted(issuer))
            .flat_map(|c| c.segment.names().map(str::to_string))
            .collect()
    }

    /// Every command below this root, depth-first in registration order.
    pub fn commands(&self) -> Vec<Arc<CommandDefinition>> {
        let mut out = Vec::new();
        self.node.collect(&mut out);
        out
    }

    pub fn any_permitted(&self, issuer: &dyn CommandIssuer) -> bool {
        self.node.any_permitted(issuer)
    }
}

/// All roots known to a manager.
#[derive(Debug, Clone, Default)]
pub struct CommandTree {
    roots: Vec<RootCommand>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self, label: &str) -> Option<&RootCommand> {
        self.roots.iter().find(|r| r.segment().matches(label))
    }

    pub fn roots(&self) -> &[RootCommand] {
        &self.roots
    }

    /// Primary root labels in registration order.
    pub fn labels(&self) -> Vec<String> {
        self.roots.iter().map(|r| r.label().to_string()).collect()
    }

    pub fn register(&mut self, command: Arc<CommandDefinition>) -> Result<(), RegistrationError> {
        let seg = command.root().clone();
        for other in &self.roots {
            if other.label() == seg.primary() {
                continue;
            }
            if let Some(name) = seg.names().find(|n| other.segment().matches(n)) {
                return Err(RegistrationError::conflict(
                    command.command_name(),
                    format!("root label '{name}' is already used by '{}'", other.label()),
                ));
            }
        }
        match self.roots.iter().position(|r| r.label() == seg.primary()) {
            Some(i) => {
                let root = &mut self.roots[i];
                root.register(command)?;
                root.node.segment.merge_aliases(&seg);
            }
            None => {
                let mut root = RootCommand::new(seg);
                root.register(command)?;
                self.roots.push(root);
            }
        }
        Ok(())
    }

    pub fn unregister(&mut self, command: &CommandDefinition) -> bool {
        let Some(i) = self
            .roots
            .iter()
            .position(|r| r.label() == command.root_label())
        else {
            return false;
        };
        let removed = self.roots[i].unregister(command);
        if removed && self.roots[i].is_empty() {
            self.roots.remove(i);
        }
        removed
    }

    /// Drop a root and everything below it.
    pub fn unregister_root(&mut self, label: &str) -> Option<RootCommand> {
        let i = self.roots.iter().position(|r| r.segment().matches(label))?;
        Some(self.roots.remove(i))
    }

    pub fn clear(&mut self) {
        self.roots.clear();
    }

    pub fn find_candidates(&self, label: &str, tokens: &[String]) -> Vec<Candidate> {
        self.root(label)
            .map(|r| r.find_candidates(tokens))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ParameterDefinition;

    fn def(root: &str, path: &str, params: &[(&str, &str)]) -> Arc<CommandDefinition> {
        let b = params.iter().fold(
            CommandDefinition::builder(root).subcommand(path),
            |b, (n, t)| b.parameter(ParameterDefinition::new(n, *t)),
        );
        Arc::new(b.handler(|_, _| Ok(())).build().unwrap())
    }

    fn toks(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    #[test]
    fn deepest_match_with_backoff() {
        let mut tree = CommandTree::new();
        tree.register(def("team|t", "", &[("page", "int")])).unwrap();
        tree.register(def("team", "invite|inv", &[("p", "string")])).unwrap();
        tree.register(def("team", "admin reset", &[])).unwrap();

        let c = tree.find_candidates("T", &toks("INV steve"));
        assert_eq!(c.len(), 1);
        assert_eq!(c[0].command.command_name(), "team invite");
        assert_eq!(c[0].consumed, 1);

        // `admin` has no commands of its own.
        let c = tree.find_candidates("team", &toks("admin x"));
        assert_eq!(c[0].command.command_name(), "team");
        assert_eq!(c[0].consumed, 0);

        assert!(tree.find_candidates("nope", &[]).is_empty());
    }

    #[test]
    fn identical_signature_conflicts() {
        let mut tree = CommandTree::new();
        tree.register(def("team", "kick", &[("p", "string")])).unwrap();
        let err = tree.register(def("team", "kick", &[("q", "string")])).unwrap_err();
        assert!(matches!(err, RegistrationError::Conflict { .. }));
        tree.register(def("team", "kick", &[("n", "int")])).unwrap();
        assert_eq!(tree.find_candidates("team", &toks("kick")).len(), 2);
    }

    #[test]
    fn alias_collisions_conflict() {
        let mut tree = CommandTree::new();
        tree.register(def("team", "invite|inv", &[])).unwrap();
        let err = tree.register(def("team", "inventory|inv", &[])).unwrap_err();
        assert!(matches!(err, RegistrationError::Conflict { .. }));
        // The failed registration left nothing behind.
        assert!(tree.find_candidates("team", &toks("inventory")).is_empty());

        tree.register(def("guild|g", "", &[])).unwrap();
        assert!(tree.register(def("group|g", "", &[])).is_err());
    }

    #[test]
    fn unregister_prunes_and_is_idempotent() {
        let mut tree = CommandTree::new();
        let d = def("team", "admin reset", &[]);
        tree.register(Arc::clone(&d)).unwrap();
        assert!(tree.unregister(&d));
        assert!(!tree.unregister(&d));
        assert!(tree.root("team").is_none());
        tree.register(Arc::clone(&d)).unwrap();
        assert_eq!(tree.find_candidates("team", &toks("admin reset")).len(), 1);
    }

    #[test]
    fn segments_for_completion() {
        struct Anyone;
        impl CommandIssuer for Anyone {
            fn has_permission(&self, _: &str) -> bool {
                true
            }
            fn send_message(&self, _: &str) {}
            fn as_any(&self) -> &dyn std::any::Any {
                self
            }
        }
        let mut tree = CommandTree::new();
        tree.register(def("team", "invite|inv", &[])).unwrap();
        tree.register(def("team", "kick", &[])).unwrap();
        let root = tree.root("team").unwrap();
        assert_eq!(root.next_segments(&[], &Anyone), vec!["invite", "inv", "kick"]);
        assert!(root.next_segments(&toks("bogus"), &Anyone).is_empty());
        assert_eq!(root.commands().len(), 2);
    }
}
