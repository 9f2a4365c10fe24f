//! In-memory directory store.
//!
//! Entries are kept in insertion order and requests follow LDAP semantics
//! closely enough for the gateway: duplicate adds, duplicate values and
//! missing values fail with the result codes a server would return.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::dn::{self, DirectoryLayout};
use crate::entry::LdapEntry;
use crate::error::{result_code, DirectoryError, DirectoryResult};
use crate::filter::{Filter, OBJECT_CLASS};
use crate::store::{DirectoryStore, EntryAttributes, Modification, SearchScope};

/// Directory store kept in process memory.
///
/// Useful for tests and for local tooling without a server.
#[derive(Debug)]
pub struct InMemoryDirectory {
    entries: RwLock<Vec<LdapEntry>>,
    available: AtomicBool,
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Creates a directory holding the organizations and users roots of a
    /// layout.
    #[must_use]
    pub fn with_layout(layout: &DirectoryLayout) -> Self {
        let store = Self::new();
        for base in [layout.orgs_base(), layout.users_base()] {
            let ou = dn::leading_value(&base, "ou").unwrap_or_default();
            let mut attrs = HashMap::new();
            attrs.insert(
                OBJECT_CLASS.to_string(),
                vec!["top".to_string(), "organizationalUnit".to_string()],
            );
            attrs.insert("ou".to_string(), vec![ou]);
            store.put(LdapEntry::new(base, attrs));
        }
        store
    }

    /// Switches the directory on or off.
    ///
    /// While off, every request fails with `StoreUnavailable`.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns whether the directory holds no entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Stores an entry as is, replacing any entry with the same DN.
    ///
    /// Bypasses schema checks; tests use it to seed inconsistent content.
    pub fn put(&self, entry: LdapEntry) {
        let mut entries = self.entries.write();
        entries.retain(|e| !dn::eq(&e.dn, &entry.dn));
        entries.push(entry);
    }

    fn check_available(&self) -> DirectoryResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DirectoryError::unavailable("in-memory directory is offline"))
        }
    }
}

fn in_scope(entry_dn: &str, base: &str, scope: SearchScope) -> bool {
    match scope {
        SearchScope::Base => dn::eq(entry_dn, base),
        SearchScope::OneLevel => dn::parent(entry_dn).is_some_and(|p| dn::eq(&p, base)),
        SearchScope::Subtree => dn::is_descendant_or_self(entry_dn, base),
    }
}

fn find_values<'a>(entry: &'a mut LdapEntry, attr: &str) -> Option<&'a mut Vec<String>> {
    entry
        .attributes
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case(attr))
        .map(|(_, values)| values)
}

fn same_value(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || (a.contains('=') && b.contains('=') && dn::eq(a, b))
}

fn apply(entry: &mut LdapEntry, modification: Modification) -> DirectoryResult<()> {
    match modification {
        Modification::Add(attr, values) => {
            if let Some(existing) = find_values(entry, &attr) {
                if values.iter().any(|v| existing.iter().any(|e| same_value(e, v))) {
                    return Err(DirectoryError::from_result_code(
                        result_code::ATTRIBUTE_OR_VALUE_EXISTS,
                        &entry.dn,
                        &format!("{attr}: value already present"),
                    ));
                }
                existing.extend(values);
            } else {
                entry.attributes.insert(attr, values);
            }
        }
        Modification::Delete(attr, values) => {
            let Some(existing) = find_values(entry, &attr) else {
                return Err(DirectoryError::from_result_code(
                    result_code::NO_SUCH_ATTRIBUTE,
                    &entry.dn,
                    &format!("{attr}: no such attribute"),
                ));
            };
            if values.is_empty() {
                existing.clear();
            } else {
                for value in &values {
                    let Some(pos) = existing.iter().position(|e| same_value(e, value)) else {
                        return Err(DirectoryError::from_result_code(
                            result_code::NO_SUCH_ATTRIBUTE,
                            &entry.dn,
                            &format!("{attr}: no such value"),
                        ));
                    };
                    existing.remove(pos);
                }
            }
            entry.attributes.retain(|_, v| !v.is_empty());
        }
    }
    Ok(())
}

#[async_trait]
impl DirectoryStore for InMemoryDirectory {
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> DirectoryResult<Vec<LdapEntry>> {
        self.check_available()?;
        let entries = self.entries.read();

        if !dn::normalize(base).is_empty() && !entries.iter().any(|e| dn::eq(&e.dn, base)) {
            let below = entries.iter().any(|e| dn::is_descendant_or_self(&e.dn, base));
            if !below {
                return Err(DirectoryError::not_found(base));
            }
        }

        Ok(entries
            .iter()
            .filter(|e| in_scope(&e.dn, base, scope) && filter.matches(e))
            .map(|e| e.clone().project(attributes))
            .collect())
    }

    async fn lookup(&self, dn: &str, attributes: &[&str]) -> DirectoryResult<LdapEntry> {
        self.check_available()?;
        self.entries
            .read()
            .iter()
            .find(|e| dn::eq(&e.dn, dn))
            .map(|e| e.clone().project(attributes))
            .ok_or_else(|| DirectoryError::not_found(dn))
    }

    async fn add(&self, dn: &str, attributes: EntryAttributes) -> DirectoryResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write();
        if entries.iter().any(|e| dn::eq(&e.dn, dn)) {
            return Err(DirectoryError::conflict(dn));
        }

        let mut attrs: HashMap<String, Vec<String>> = HashMap::new();
        for (name, values) in attributes.into_iter().filter(|(_, v)| !v.is_empty()) {
            let existing = attrs.entry(name).or_default();
            for value in values {
                if existing.iter().any(|e| same_value(e, &value)) {
                    return Err(DirectoryError::from_result_code(
                        result_code::ATTRIBUTE_OR_VALUE_EXISTS,
                        dn,
                        "duplicate attribute value",
                    ));
                }
                existing.push(value);
            }
        }
        entries.push(LdapEntry::new(dn, attrs));
        Ok(())
    }

    async fn modify(&self, dn: &str, modifications: Vec<Modification>) -> DirectoryResult<()> {
        self.check_available()?;
        let mut entries = self.entries.write();
        let entry = entries
            .iter_mut()
            .find(|e| dn::eq(&e.dn, dn))
            .ok_or_else(|| DirectoryError::not_found(dn))?;

        // A failed modification leaves the entry untouched.
        let mut updated = entry.clone();
        for modification in modifications {
            apply(&mut updated, modification)?;
        }
        *entry = updated;
        Ok(())
    }

    async fn test_connection(&self) -> DirectoryResult<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORGS: &str = "ou=orgs,dc=georchestra,dc=org";

    fn attrs(pairs: &[(&str, &[&str])]) -> EntryAttributes {
        pairs
            .iter()
            .map(|(k, vs)| ((*k).to_string(), vs.iter().map(|v| (*v).to_string()).collect()))
            .collect()
    }

    async fn seeded() -> InMemoryDirectory {
        let store = InMemoryDirectory::new();
        store
            .add(ORGS, attrs(&[("objectClass", &["organizationalUnit"]), ("ou", &["orgs"])]))
            .await
            .unwrap();
        store
            .add(
                "cn=psc,ou=orgs,dc=georchestra,dc=org",
                attrs(&[("objectClass", &["top", "groupOfMembers"]), ("cn", &["psc"])]),
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn add_twice_conflicts() {
        let store = seeded().await;
        let err = store
            .add("CN=psc,ou=orgs,dc=georchestra,dc=org", attrs(&[]))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn search_honours_scope() {
        let store = seeded().await;

        let sub = store.search(ORGS, SearchScope::Subtree, &Filter::any(), &[]).await.unwrap();
        assert_eq!(sub.len(), 2);

        let one = store.search(ORGS, SearchScope::OneLevel, &Filter::any(), &[]).await.unwrap();
        assert_eq!(one.len(), 1);

        let base = store.search(ORGS, SearchScope::Base, &Filter::any(), &[]).await.unwrap();
        assert_eq!(base[0].dn, ORGS);
    }

    #[tokio::test]
    async fn search_of_missing_base_is_not_found() {
        let store = seeded().await;
        let err = store
            .search("ou=nowhere,dc=georchestra,dc=org", SearchScope::Subtree, &Filter::any(), &[])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn add_rejects_duplicate_values() {
        let store = seeded().await;
        let dn = "cn=other,ou=orgs,dc=georchestra,dc=org";
        let err = store
            .add(
                dn,
                attrs(&[(
                    "member",
                    &[
                        "uid=jdoe,ou=users,dc=georchestra,dc=org",
                        "UID=JDoe,ou=users,dc=georchestra,dc=org",
                    ],
                )]),
            )
            .await
            .unwrap_err();

        assert_eq!(err.result_code(), Some(result_code::ATTRIBUTE_OR_VALUE_EXISTS));
        assert!(store.lookup(dn, &[]).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn modify_uses_ldap_result_codes() {
        let store = seeded().await;
        let dn = "cn=psc,ou=orgs,dc=georchestra,dc=org";
        let member = "uid=jdoe,ou=users,dc=georchestra,dc=org";

        store
            .modify(dn, vec![Modification::Add("member".into(), vec![member.into()])])
            .await
            .unwrap();

        let dup = store
            .modify(dn, vec![Modification::Add("member".into(), vec![member.to_uppercase()])])
            .await
            .unwrap_err();
        assert_eq!(dup.result_code(), Some(result_code::ATTRIBUTE_OR_VALUE_EXISTS));

        store
            .modify(dn, vec![Modification::Delete("member".into(), vec![member.into()])])
            .await
            .unwrap();
        let entry = store.lookup(dn, &[]).await.unwrap();
        assert!(!entry.has_attr("member"));

        let missing = store
            .modify(dn, vec![Modification::Delete("member".into(), vec![member.into()])])
            .await
            .unwrap_err();
        assert_eq!(missing.result_code(), Some(result_code::NO_SUCH_ATTRIBUTE));
    }

    #[tokio::test]
    async fn failed_modify_is_atomic() {
        let store = seeded().await;
        let dn = "cn=psc,ou=orgs,dc=georchestra,dc=org";

        let result = store
            .modify(
                dn,
                vec![
                    Modification::Add("o".into(), vec!["PSC".into()]),
                    Modification::Delete("seeAlso".into(), vec!["x".into()]),
                ],
            )
            .await;
        assert!(result.is_err());
        assert!(!store.lookup(dn, &[]).await.unwrap().has_attr("o"));
    }

    #[tokio::test]
    async fn modify_missing_entry_is_not_found() {
        let store = seeded().await;
        let err = store
            .modify("cn=nope,ou=orgs,dc=georchestra,dc=org", vec![])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn layout_roots_are_seeded() {
        let layout = DirectoryLayout::default();
        let store = InMemoryDirectory::with_layout(&layout);
        assert_eq!(store.len(), 2);

        let root = store.lookup(&layout.users_base(), &[]).await.unwrap();
        assert_eq!(root.get_attr("ou"), Some("users"));
        let orgs = store
            .search(&layout.orgs_base(), SearchScope::Subtree, &Filter::object_class("groupOfMembers"), &[])
            .await
            .unwrap();
        assert!(orgs.is_empty());
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = seeded().await;
        store.set_available(false);
        assert!(store.test_connection().await.unwrap_err().is_unavailable());
        assert!(store.lookup(ORGS, &[]).await.unwrap_err().is_unavailable());

        store.set_available(true);
        assert!(store.test_connection().await.is_ok());
    }
}
