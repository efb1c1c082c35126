//! The issuer contract: whoever submitted a command.
//!
//! Hosts wrap their own principal (player, console, chat user) in a type that
//! implements `CommandIssuer`. The framework never assumes more than this.

use std::any::Any;

use crate::locales::Locale;

pub trait CommandIssuer: Send + Sync {
    fn has_permission(&self, permission: &str) -> bool;

    /// Preferred locale; `None` means the manager's default locale.
    fn locale(&self) -> Option<Locale> {
        None
    }

    fn send_message(&self, text: &str);

    /// Access to the concrete issuer, so host resolvers can downcast.
    fn as_any(&self) -> &dyn Any;
}

/// Returns true when the issuer holds every permission in `permission`.
///
/// Several keys may be combined with `,`; an empty string always passes.
pub fn has_all_permissions(issuer: &dyn CommandIssuer, permission: &str) -> bool {
    permission
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .all(|p| issuer.has_permission(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Limited;

    impl CommandIssuer for Limited {
        fn has_permission(&self, permission: &str) -> bool {
            permission == "team.use"
        }
        fn send_message(&self, _text: &str) {}
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn combined_permissions_require_all() {
        assert!(has_all_permissions(&Limited, "team.use"));
        assert!(has_all_permissions(&Limited, " "));
        assert!(!has_all_permissions(&Limited, "team.use, team.admin"));
    }
}
