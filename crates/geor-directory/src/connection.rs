//! LDAP client store.
//!
//! `ldap3` multiplexes concurrent operations over a single connection, so the
//! pool keeps one bound handle, hands out clones of it and reconnects once the
//! server side has gone away. A semaphore bounds the number of operations in
//! flight.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

use crate::config::DirectoryConfig;
use crate::entry::LdapEntry;
use crate::error::{from_ldap3, DirectoryError, DirectoryResult};
use crate::filter::Filter;
use crate::store::{DirectoryStore, EntryAttributes, Modification, SearchScope};

/// Connection pool around a shared, bound `ldap3` handle.
pub struct LdapConnectionPool {
    config: Arc<DirectoryConfig>,
    semaphore: Arc<Semaphore>,
    connection: Mutex<Option<Ldap>>,
}

impl LdapConnectionPool {
    /// Creates a pool. No connection is opened until the first operation.
    pub fn new(config: DirectoryConfig) -> Self {
        if config.is_cleartext() {
            tracing::warn!(
                url = %config.url,
                "directory connection is neither ldaps:// nor StartTLS, bind credentials travel in cleartext"
            );
        }
        let max_size = config.pool_max_size;
        Self {
            config: Arc::new(config),
            semaphore: Arc::new(Semaphore::new(max_size)),
            connection: Mutex::new(None),
        }
    }

    /// Gets a connection handle.
    ///
    /// The permit is held until the returned handle is dropped.
    pub async fn get(&self) -> DirectoryResult<PooledConnection> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DirectoryError::unavailable("connection pool closed"))?;

        let mut guard = self.connection.lock().await;
        if let Some(ldap) = guard.as_mut() {
            if !ldap.is_closed() {
                return Ok(PooledConnection::new(ldap.clone(), &self.config, permit));
            }
            tracing::debug!(url = %self.config.url, "directory connection closed, reconnecting");
        }

        let ldap = self.create_connection().await?;
        *guard = Some(ldap.clone());
        Ok(PooledConnection::new(ldap, &self.config, permit))
    }

    /// Opens and binds a new connection.
    async fn create_connection(&self) -> DirectoryResult<Ldap> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection_timeout)
            .set_starttls(self.config.starttls)
            .set_no_tls_verify(self.config.no_tls_verify);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &self.config.url)
            .await
            .map_err(|e| DirectoryError::unavailable(format!("{}: {e}", self.config.url)))?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!(error = %e, "directory connection driver error");
            }
        });

        ldap.with_timeout(self.config.operation_timeout)
            .simple_bind(&self.config.bind_dn, &self.config.bind_credential)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| from_ldap3(e, &self.config.bind_dn))?;

        tracing::info!(url = %self.config.url, bind_dn = %self.config.bind_dn, "connected to directory");
        Ok(ldap)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }
}

/// A connection handle from the pool.
pub struct PooledConnection {
    ldap: Ldap,
    config: Arc<DirectoryConfig>,
    _permit: OwnedSemaphorePermit,
}

impl PooledConnection {
    fn new(ldap: Ldap, config: &Arc<DirectoryConfig>, permit: OwnedSemaphorePermit) -> Self {
        Self {
            ldap,
            config: Arc::clone(config),
            _permit: permit,
        }
    }

    /// Returns the handle with the operation timeout applied.
    pub fn ldap(&mut self) -> &mut Ldap {
        self.ldap.with_timeout(self.config.operation_timeout)
    }
}

// ============================================================================
// LDAP Directory Store
// ============================================================================

/// `DirectoryStore` backed by an LDAP server.
pub struct LdapDirectory {
    pool: LdapConnectionPool,
}

impl LdapDirectory {
    /// Creates a store from a validated configuration.
    pub fn new(config: DirectoryConfig) -> Self {
        Self {
            pool: LdapConnectionPool::new(config),
        }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &LdapConnectionPool {
        &self.pool
    }
}

fn value_set(values: Vec<String>) -> HashSet<String> {
    values.into_iter().collect()
}

fn to_ldap3_mod(modification: Modification) -> Mod<String> {
    match modification {
        Modification::Add(attr, values) => Mod::Add(attr, value_set(values)),
        Modification::Delete(attr, values) => Mod::Delete(attr, value_set(values)),
    }
}

#[async_trait]
impl DirectoryStore for LdapDirectory {
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &Filter,
        attributes: &[&str],
    ) -> DirectoryResult<Vec<LdapEntry>> {
        let encoded = filter.encode();
        tracing::debug!(base, filter = %encoded, "directory search");

        let mut conn = self.pool.get().await?;
        let (entries, _) = conn
            .ldap()
            .search(base, scope.to_ldap3(), &encoded, attributes.to_vec())
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| from_ldap3(e, base))?;

        Ok(entries
            .into_iter()
            .map(|e| LdapEntry::from_search_entry(SearchEntry::construct(e)))
            .collect())
    }

    async fn lookup(&self, dn: &str, attributes: &[&str]) -> DirectoryResult<LdapEntry> {
        tracing::debug!(dn, "directory lookup");

        let mut conn = self.pool.get().await?;
        let (entries, _) = conn
            .ldap()
            .search(dn, Scope::Base, &Filter::any().encode(), attributes.to_vec())
            .await
            .and_then(ldap3::SearchResult::success)
            .map_err(|e| from_ldap3(e, dn))?;

        entries
            .into_iter()
            .next()
            .map(|e| LdapEntry::from_search_entry(SearchEntry::construct(e)))
            .ok_or_else(|| DirectoryError::not_found(dn))
    }

    async fn add(&self, dn: &str, attributes: EntryAttributes) -> DirectoryResult<()> {
        tracing::debug!(dn, "directory add");

        let attrs: Vec<(String, HashSet<String>)> = attributes
            .into_iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(attr, values)| (attr, value_set(values)))
            .collect();

        let mut conn = self.pool.get().await?;
        conn.ldap()
            .add(dn, attrs)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| from_ldap3(e, dn))?;
        Ok(())
    }

    async fn modify(&self, dn: &str, modifications: Vec<Modification>) -> DirectoryResult<()> {
        tracing::debug!(dn, count = modifications.len(), "directory modify");

        let mods: Vec<Mod<String>> = modifications.into_iter().map(to_ldap3_mod).collect();

        let mut conn = self.pool.get().await?;
        conn.ldap()
            .modify(dn, mods)
            .await
            .and_then(ldap3::LdapResult::success)
            .map_err(|e| from_ldap3(e, dn))?;
        Ok(())
    }

    async fn test_connection(&self) -> DirectoryResult<()> {
        let base = self.pool.config().layout().orgs_base();
        self.lookup(&base, &["1.1"]).await.map(|_| ())
    }
}
