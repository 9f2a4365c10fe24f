//! # geor-directory
//!
//! Organization directory gateway for geOrchestra.
//!
//! Organizations live under a configured root of an LDAP directory as
//! `groupOfMembers` entries listing their users; an optional `organization`
//! sibling entry holds extended details. [`OrgsDirectory`] reads and writes
//! them through a [`DirectoryStore`], either a live server via `ldap3`
//! ([`LdapDirectory`]) or process memory ([`InMemoryDirectory`]).
//!
//! ```no_run
//! use geor_directory::{DirectoryConfig, Organization, OrgsDirectory};
//!
//! # async fn run() -> geor_directory::DirectoryResult<()> {
//! let config = DirectoryConfig::builder()
//!     .url("ldap://localhost:389")
//!     .bind_dn("cn=admin,dc=georchestra,dc=org")
//!     .bind_credential("secret")
//!     .starttls(true)
//!     .build()?;
//! let orgs = OrgsDirectory::connect(config);
//!
//! orgs.insert(&Organization::new("psc").with_cities(["Paris", "Lyon"])).await?;
//! orgs.add_user("psc", "testadmin").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod connection;
pub mod dn;
pub mod entry;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod memory;
pub mod model;
pub mod orgs;
pub mod store;

pub use config::{DirectoryConfig, DirectoryConfigBuilder};
pub use connection::{LdapConnectionPool, LdapDirectory};
pub use dn::DirectoryLayout;
pub use entry::LdapEntry;
pub use error::{DirectoryError, DirectoryResult};
pub use filter::Filter;
pub use memory::InMemoryDirectory;
pub use model::{Organization, OrganizationExtension};
pub use orgs::OrgsDirectory;
pub use store::{DirectoryStore, Modification, SearchScope};
