//! The transport seam between the mapping layer and a directory server.
use std::future::Future;

use ldap3::SearchEntry;

use crate::{error::Error, schema::TranslatedAttributes};

/// A bound session with a directory server.
///
/// Implementations own transport, TLS and bind negotiation. Non-success
/// results from the server are reported as [`Error::DirectoryRejected`].
/// [`crate::ldap::LdapConnection`] implements this on top of `ldap3`.
pub trait Connection: Send + Sync {
	/// Whether the session is bound and ready for operations.
	fn is_bound(&self) -> bool;

	/// Search the subtree below `base` and return all matching entries.
	fn search(
		&self,
		base: &str,
		filter: &str,
		fields: &[&str],
	) -> impl Future<Output = Result<Vec<SearchEntry>, Error>> + Send;

	/// Add a new entry.
	fn add(
		&self,
		dn: &str,
		attributes: &TranslatedAttributes,
	) -> impl Future<Output = Result<(), Error>> + Send;

	/// Replace the given attributes of an existing entry.
	fn modify(
		&self,
		dn: &str,
		attributes: &TranslatedAttributes,
	) -> impl Future<Output = Result<(), Error>> + Send;

	/// Delete an entry.
	fn delete(&self, dn: &str) -> impl Future<Output = Result<(), Error>> + Send;
}
