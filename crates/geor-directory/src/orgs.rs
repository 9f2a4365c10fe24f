//! Organization directory gateway.
//!
//! Reads and writes organizations, their extensions and user membership.
//! The directory is the system of record: nothing is cached here and every
//! call goes to the store.
//!
//! ## Consistency
//!
//! `add_user` and `remove_user` read the organization and then modify it.
//! The two requests are not isolated from other writers. Callers needing
//! atomic membership changes must serialize them per organization.

use std::sync::Arc;

use crate::config::DirectoryConfig;
use crate::connection::LdapDirectory;
use crate::dn::{self, DirectoryLayout};
use crate::error::{result_code, DirectoryError, DirectoryResult};
use crate::filter::Filter;
use crate::mapper::{schema, OrgMapper};
use crate::model::{Organization, OrganizationExtension};
use crate::store::{DirectoryStore, Modification, SearchScope};

/// Gateway to the organizations held in the directory.
#[derive(Clone)]
pub struct OrgsDirectory {
    store: Arc<dyn DirectoryStore>,
    mapper: OrgMapper,
}

impl std::fmt::Debug for OrgsDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrgsDirectory")
            .field("layout", self.mapper.layout())
            .finish_non_exhaustive()
    }
}

impl OrgsDirectory {
    /// Creates a gateway over a store.
    pub fn new(store: Arc<dyn DirectoryStore>, layout: DirectoryLayout) -> Self {
        Self {
            store,
            mapper: OrgMapper::new(layout),
        }
    }

    /// Creates a gateway connected to an LDAP server.
    ///
    /// The connection is opened lazily by the first operation.
    pub fn connect(config: DirectoryConfig) -> Self {
        let layout = config.layout();
        Self::new(Arc::new(LdapDirectory::new(config)), layout)
    }

    /// Returns the directory layout.
    #[must_use]
    pub fn layout(&self) -> &DirectoryLayout {
        self.mapper.layout()
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    fn org_filter() -> Filter {
        Filter::object_class(schema::GROUP_OF_MEMBERS)
    }

    /// Lists every organization under the organizations root, in directory
    /// order.
    pub async fn find_all(&self) -> DirectoryResult<Vec<Organization>> {
        let base = self.layout().orgs_base();
        let entries = self
            .store
            .search(&base, SearchScope::Subtree, &Self::org_filter(), &[])
            .await?;

        tracing::debug!(base = %base, count = entries.len(), "listed organizations");
        entries
            .iter()
            .map(|entry| self.mapper.org_from_entry(entry))
            .collect()
    }

    /// Reads one organization.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` when no such organization exists.
    pub async fn find_by_common_name(&self, id: &str) -> DirectoryResult<Organization> {
        let entry = self.store.lookup(&self.layout().org_dn(id), &[]).await?;
        self.mapper.org_from_entry(&entry)
    }

    /// Reads one organization extension.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` when no such extension exists.
    pub async fn find_ext_by_id(&self, id: &str) -> DirectoryResult<OrganizationExtension> {
        let entry = self.store.lookup(&self.layout().org_ext_dn(id), &[]).await?;
        self.mapper.ext_from_entry(&entry)
    }

    /// Finds the organization a user belongs to.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::ConsistencyViolation` when more than one
    /// organization lists the user.
    pub async fn find_for_user(&self, user_id: &str) -> DirectoryResult<Option<Organization>> {
        let filter = Filter::and([
            Filter::equals(schema::MEMBER, self.mapper.member_dn(user_id)),
            Self::org_filter(),
        ]);
        let mut entries = self
            .store
            .search(&self.layout().orgs_base(), SearchScope::Subtree, &filter, &[])
            .await?;

        match entries.len() {
            0 => Ok(None),
            1 => {
                let entry = entries.remove(0);
                self.mapper.org_from_entry(&entry).map(Some)
            }
            n => {
                let dns: Vec<&str> = entries.iter().map(|e| e.dn.as_str()).collect();
                tracing::error!(user = %user_id, orgs = ?dns, "user belongs to several organizations");
                Err(DirectoryError::consistency(format!(
                    "user {user_id} belongs to {n} organizations"
                )))
            }
        }
    }

    /// Creates an organization entry.
    ///
    /// Initial members, if any, are written with the entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::Conflict` if the organization already exists.
    pub async fn insert(&self, org: &Organization) -> DirectoryResult<()> {
        let attributes = self.mapper.org_attributes(org)?;
        let dn = self.layout().org_dn(&org.id);
        self.store.add(&dn, attributes).await?;

        tracing::info!(org = %org.id, dn = %dn, "organization created");
        Ok(())
    }

    /// Creates an organization extension entry.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::Conflict` if the extension already exists.
    pub async fn insert_ext(&self, ext: &OrganizationExtension) -> DirectoryResult<()> {
        let attributes = self.mapper.ext_attributes(ext)?;
        let dn = self.layout().org_ext_dn(&ext.id);
        self.store.add(&dn, attributes).await?;

        tracing::info!(org = %ext.id, dn = %dn, "organization extension created");
        Ok(())
    }

    /// Adds a user to an organization. Adding a current member does nothing.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` when the organization does not exist.
    pub async fn add_user(&self, org_id: &str, user_id: &str) -> DirectoryResult<()> {
        let org_dn = self.layout().org_dn(org_id);
        let member = self.mapper.member_dn(user_id);

        if self.is_member(&org_dn, &member).await? {
            tracing::debug!(org = %org_id, user = %user_id, "user already a member");
            return Ok(());
        }

        let change = vec![Modification::Add(schema::MEMBER.to_string(), vec![member])];
        match self.store.modify(&org_dn, change).await {
            Err(e) if e.result_code() == Some(result_code::ATTRIBUTE_OR_VALUE_EXISTS) => {
                tracing::debug!(org = %org_id, user = %user_id, "user added concurrently");
                Ok(())
            }
            Err(e) => Err(e),
            Ok(()) => {
                tracing::info!(org = %org_id, user = %user_id, "user added to organization");
                Ok(())
            }
        }
    }

    /// Removes a user from an organization. Removing a non-member does
    /// nothing.
    ///
    /// ## Errors
    ///
    /// Returns `DirectoryError::NotFound` when the organization does not exist.
    pub async fn remove_user(&self, org_id: &str, user_id: &str) -> DirectoryResult<()> {
        let org_dn = self.layout().org_dn(org_id);
        let member = self.mapper.member_dn(user_id);

        if !self.is_member(&org_dn, &member).await? {
            tracing::debug!(org = %org_id, user = %user_id, "user is not a member");
            return Ok(());
        }

        let change = vec![Modification::Delete(schema::MEMBER.to_string(), vec![member])];
        match self.store.modify(&org_dn, change).await {
            Err(e) if e.result_code() == Some(result_code::NO_SUCH_ATTRIBUTE) => {
                tracing::debug!(org = %org_id, user = %user_id, "user removed concurrently");
                Ok(())
            }
            Err(e) => Err(e),
            Ok(()) => {
                tracing::info!(org = %org_id, user = %user_id, "user removed from organization");
                Ok(())
            }
        }
    }

    async fn is_member(&self, org_dn: &str, member_dn: &str) -> DirectoryResult<bool> {
        let entry = self.store.lookup(org_dn, &[schema::MEMBER]).await?;
        Ok(entry
            .get_attrs(schema::MEMBER)
            .iter()
            .any(|m| dn::eq(m, member_dn)))
    }

    /// Checks that the directory answers.
    pub async fn test_connection(&self) -> DirectoryResult<()> {
        self.store.test_connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryDirectory;

    fn gateway() -> OrgsDirectory {
        let layout = DirectoryLayout::default();
        OrgsDirectory::new(Arc::new(InMemoryDirectory::with_layout(&layout)), layout)
    }

    #[tokio::test]
    async fn insert_then_read_back() {
        let orgs = gateway();
        let org = Organization::new("psc").with_name("PSC").with_cities(["Paris", "Lyon"]);
        orgs.insert(&org).await.unwrap();

        let found = orgs.find_by_common_name("psc").await.unwrap();
        assert_eq!(found, org);
    }

    #[tokio::test]
    async fn invalid_input_never_reaches_the_store() {
        let orgs = gateway();
        let err = orgs.insert(&Organization::new("")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::InvalidInput(_)));
        assert!(orgs.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn membership_on_missing_org_is_not_found() {
        let orgs = gateway();
        assert!(orgs.add_user("nope", "jdoe").await.unwrap_err().is_not_found());
        assert!(orgs.remove_user("nope", "jdoe").await.unwrap_err().is_not_found());
    }

    #[test]
    fn debug_does_not_expose_store() {
        let text = format!("{:?}", gateway());
        assert!(text.contains("OrgsDirectory"));
        assert!(text.contains("ou=orgs"));
    }
}
