//! Authorization boundary for the admin flows.
//!
//! The engine asks one question, [`Authorizer::is_privileged`], and only when
//! a user tries to enter the admin panel. [`AdminAllowList`] answers it from
//! the configured `[admin].user_ids`.

use std::collections::HashSet;
use std::fmt;

/// Opaque user identifier handed over by a transport, already authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

pub trait Authorizer: Send + Sync {
    fn is_privileged(&self, user: &UserId) -> bool;
}

/// Static allow-list of admin identifiers.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    ids: HashSet<UserId>,
}

impl AdminAllowList {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { ids: ids.into_iter().map(|id| UserId::new(id)).collect() }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Authorizer for AdminAllowList {
    fn is_privileged(&self, user: &UserId) -> bool {
        self.ids.contains(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_matches_exact_ids() {
        let admins = AdminAllowList::new(["7576725871", "console"]);
        assert!(admins.is_privileged(&UserId::from("7576725871")));
        assert!(admins.is_privileged(&UserId::from("console")));
        assert!(!admins.is_privileged(&UserId::from("757672587")));
        assert_eq!(admins.len(), 2);
    }

    #[test]
    fn empty_allow_list_denies_everyone() {
        let admins = AdminAllowList::default();
        assert!(admins.is_empty());
        assert!(!admins.is_privileged(&UserId::from("anyone")));
    }
}
