//! Directory store abstraction.
//!
//! The gateway only needs four directory primitives. Putting them behind a
//! trait lets the same gateway run against a live server through `ldap3` or
//! against the in-memory directory used by tests and local tooling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::entry::LdapEntry;
use crate::error::DirectoryResult;
use crate::filter::Filter;

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search only the base DN.
    Base,
    /// Search one level below the base DN.
    OneLevel,
    /// Search the entire subtree.
    #[default]
    Subtree,
}

impl SearchScope {
    /// Converts to ldap3 scope.
    #[must_use]
    pub const fn to_ldap3(self) -> ldap3::Scope {
        match self {
            Self::Base => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }
}

/// A change to the values of one attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modification {
    /// Adds values; the server reports `attributeOrValueExists` for a value
    /// already present.
    Add(String, Vec<String>),
    /// Deletes values; the server reports `noSuchAttribute` for a value that
    /// is not present.
    Delete(String, Vec<String>),
}

impl Modification {
    /// Returns the modified attribute name.
    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::Add(attr, _) | Self::Delete(attr, _) => attr,
        }
    }
}

/// Attribute list of an entry to create, in insertion order.
pub type EntryAttributes = Vec<(String, Vec<String>)>;

/// The directory primitives used by the gateway.
///
/// Each call is one request/response exchange with the store. Implementations
/// must be safe to share between tasks and hold no per-caller state.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Searches below `base`.
    ///
    /// An empty `attributes` slice requests all user attributes.
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> DirectoryResult<Vec<LdapEntry>>;

    /// Reads a single entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` if the entry does not exist.
    async fn lookup(&self, dn: &str, attributes: &[&str]) -> DirectoryResult<LdapEntry>;

    /// Creates an entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::Conflict` if the entry already exists.
    async fn add(&self, dn: &str, attributes: EntryAttributes) -> DirectoryResult<()>;

    /// Applies attribute modifications to an entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` if the entry does not exist and
    /// `DirectoryError::Rejected` carrying the LDAP result code when the
    /// server refuses a value change.
    async fn modify(&self, dn: &str, modifications: Vec<Modification>) -> DirectoryResult<()>;

    /// Checks that the store answers.
    async fn test_connection(&self) -> DirectoryResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modification_attribute() {
        let add = Modification::Add("member".into(), vec!["uid=a".into()]);
        let del = Modification::Delete("seeAlso".into(), vec![]);
        assert_eq!(add.attribute(), "member");
        assert_eq!(del.attribute(), "seeAlso");
    }

    #[test]
    fn default_scope_is_subtree() {
        assert_eq!(SearchScope::default(), SearchScope::Subtree);
        assert!(matches!(SearchScope::Base.to_ldap3(), ldap3::Scope::Base));
    }
}
