//! [`Connection`] on top of an `ldap3` session.

use std::{
	collections::HashSet,
	fmt,
	sync::atomic::{AtomicBool, Ordering},
	time::Duration,
};

use ldap3::{
	adapters::{Adapter, EntriesOnly, PagedResults},
	LdapConnAsync, Mod, Scope, SearchEntry,
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info, warn};
use url::Url;

use crate::{config::Config, connection::Connection, error::Error, schema::TranslatedAttributes};

/// A bound session with an LDAP server.
pub struct LdapConnection {
	/// Handle to the session; cloned per operation
	ldap: ldap3::Ldap,
	/// The server the session talks to
	url: Url,
	/// Cleared once the session is unbound
	bound: AtomicBool,
	/// Page size for searches, if paging is enabled
	page_size: Option<i32>,
	/// Timeout for each operation
	operation_timeout: Duration,
	/// The task driving the connection
	driver: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for LdapConnection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("LdapConnection")
			.field("url", &self.url.as_str())
			.field("bound", &self.bound.load(Ordering::SeqCst))
			.field("page_size", &self.page_size)
			.field("operation_timeout", &self.operation_timeout)
			.finish_non_exhaustive()
	}
}

/// Borrow translated attributes in the shape `ldap3` expects.
fn value_sets(attributes: &TranslatedAttributes) -> impl Iterator<Item = (&[u8], HashSet<&[u8]>)> {
	attributes
		.iter()
		.map(|(name, values)| (name.as_bytes(), values.iter().map(Vec::as_slice).collect()))
}

impl LdapConnection {
	/// Connect to the server in `config` and bind with its credentials.
	pub async fn connect(config: &Config) -> Result<Self, Error> {
		let settings = config.connection.to_settings().await?;
		let (conn, mut ldap) = LdapConnAsync::from_url_with_settings(settings, &config.url).await?;
		let driver = tokio::spawn(async move {
			if let Err(err) = conn.drive().await {
				warn!("Ldap connection error {err}");
			}
		});

		ldap.with_timeout(config.connection.operation_timeout);
		Error::check(ldap.simple_bind(&config.bind_dn, &config.bind_password).await?)?;
		info!(url = %config.url, bind_dn = config.bind_dn.as_str(), "Bound to directory");

		Ok(Self {
			ldap,
			url: config.url.clone(),
			bound: AtomicBool::new(true),
			page_size: config.connection.page_size,
			operation_timeout: config.connection.operation_timeout,
			driver: Mutex::new(Some(driver)),
		})
	}

	/// A session handle with the operation timeout applied.
	fn session(&self) -> ldap3::Ldap {
		let mut ldap = self.ldap.clone();
		ldap.with_timeout(self.operation_timeout);
		ldap
	}

	/// End the session and wait for the connection to close.
	pub async fn unbind(&self) -> Result<(), Error> {
		if !self.bound.swap(false, Ordering::SeqCst) {
			return Ok(());
		}
		self.ldap.clone().unbind().await?;

		if let Some(driver) = self.driver.lock().await.take() {
			if let Err(err) = driver.await {
				warn!("Failed to join background task: {err}");
			}
		}
		Ok(())
	}
}

impl Connection for LdapConnection {
	fn is_bound(&self) -> bool {
		self.bound.load(Ordering::SeqCst)
	}

	async fn search(
		&self,
		base: &str,
		filter: &str,
		fields: &[&str],
	) -> Result<Vec<SearchEntry>, Error> {
		let mut adapters: Vec<Box<dyn Adapter<_, _>>> = vec![Box::new(EntriesOnly::new())];
		if let Some(page_size) = self.page_size {
			adapters.push(Box::new(PagedResults::new(page_size)));
		}

		let mut ldap = self.session();
		let mut search = ldap
			.streaming_search_with(adapters, base, Scope::Subtree, filter, fields.to_vec())
			.await?;

		let mut entries = Vec::new();
		while let Some(entry) = search.next().await?.map(SearchEntry::construct) {
			entries.push(entry);
		}
		Error::check(search.finish().await)?;

		debug!(base, filter, count = entries.len(), "Search finished");
		Ok(entries)
	}

	async fn add(&self, dn: &str, attributes: &TranslatedAttributes) -> Result<(), Error> {
		let result = self.session().add(dn, value_sets(attributes).collect()).await?;
		debug!(dn, rc = result.rc, "Add finished");
		Error::check(result)
	}

	async fn modify(&self, dn: &str, attributes: &TranslatedAttributes) -> Result<(), Error> {
		let changes = value_sets(attributes).map(|(name, values)| Mod::Replace(name, values)).collect();
		let result = self.session().modify(dn, changes).await?;
		debug!(dn, rc = result.rc, "Modify finished");
		Error::check(result)
	}

	async fn delete(&self, dn: &str) -> Result<(), Error> {
		let result = self.session().delete(dn).await?;
		debug!(dn, rc = result.rc, "Delete finished");
		Error::check(result)
	}
}
