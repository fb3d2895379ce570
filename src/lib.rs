//! Map friendly attribute dictionaries onto an LDAP/Active Directory tree.
//!
//! Callers describe entries as [`AttributeDictionary`]s keyed by names like
//! `display_name` or `address_city`. The [`SchemaTranslator`] turns them into
//! protocol attributes, the [`dn`] and [`filter`] modules address entries
//! safely, and an [`EntryRepository`] performs the directory operations over
//! any [`Connection`]. The [`RelationshipResolver`] walks group memberships,
//! including Active Directory's implicit primary group, and every write fires
//! an [`Event`] on a pluggable [`Dispatcher`].
//!
//! For a general primer on LDAP, the [introduction] in the `ldap3` crate which
//! is used here for interfacing with LDAP is an excellent resource.
//!
//! [introduction]: https://github.com/inejge/ldap3/blob/master/LDAP-primer.md
//!
//! # Getting started
//! ```no_run
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use ldap_mapper::{
//!     config::{Config, ConnectionConfig, DirectoryConfig},
//!     AttributeDictionary, EntryRepository, LdapConnection, ObjectProfile, Registry,
//!     RelationshipResolver, Value,
//! };
//! use url::Url;
//!
//! // Configuration can also be deserialized with serde. It's hand-constructed
//! // here for demonstration purposes.
//! let config = Config {
//!     url: Url::parse("ldaps://dc01.example.com")?,
//!     connection: ConnectionConfig::default(),
//!     bind_dn: "CN=svc-mapper,CN=Users,DC=example,DC=com".to_owned(),
//!     bind_password: "verysecret".to_owned(),
//!     directory: DirectoryConfig::new("DC=example,DC=com"),
//! };
//!
//! let connection = LdapConnection::connect(&config).await?;
//! let hooks = Arc::new(Registry::new());
//! let contacts = EntryRepository::new(
//!     connection,
//!     config.directory.clone(),
//!     ObjectProfile::CONTACT,
//!     hooks.clone(),
//! );
//!
//! let dn = contacts
//!     .create(
//!         &AttributeDictionary::new()
//!             .with("display_name", "Doe, Jane")
//!             .with("email", "jane@example.com")
//!             .with("container", Value::path(["Widgets", "Sales"])),
//!     )
//!     .await?;
//! // CN=Doe\2c Jane,OU=Sales,OU=Widgets,DC=example,DC=com
//! println!("Created {dn}");
//!
//! let resolver = RelationshipResolver::new(&contacts, hooks);
//! let groups = resolver.relationships_of(dn.as_str(), true).await?;
//! println!("Member of {groups:?}");
//! # Ok(())
//! # }
//! ```
//!
//! # Limitations
//! * Only the simple bind is supported.
//! * Multi-valued attributes are sent as sets; the directory decides their
//!   order.
//! * Entries can't be moved or renamed.

pub mod collection;
pub mod config;
pub mod connection;
pub mod dn;
pub mod entry;
pub mod error;
pub mod events;
pub mod filter;
pub mod ldap;
pub mod relationship;
pub mod repository;
pub mod schema;
pub mod sid;

pub use ldap3::{self, SearchEntry};

pub use crate::{
	collection::{ContactView, FromEntry, ResultCollection, UserView},
	config::{Config, ConnectionConfig, DirectoryConfig},
	connection::Connection,
	dn::{DistinguishedName, Rdn},
	entry::SearchEntryExt,
	error::Error,
	events::{Dispatcher, Event, Listener, NullDispatcher, Registry},
	filter::Filter,
	ldap::LdapConnection,
	relationship::{Closure, MembershipSource, RelationshipResolver},
	repository::{EntryRepository, ObjectProfile},
	schema::{
		AttributeDictionary, Codec, SchemaTranslator, TranslateError, TranslatedAttributes, Value,
	},
	sid::Sid,
};
