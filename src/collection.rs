//! Search results and typed views onto them.
use ldap3::SearchEntry;
use time::OffsetDateTime;

use crate::{entry::SearchEntryExt, error::Error, schema::Codec};

/// Types that can be built from a raw search entry.
pub trait FromEntry: Sized {
	/// Hydrate a view from `entry`.
	fn from_entry(entry: &SearchEntry) -> Result<Self, Error>;
}

/// The entries returned by one search, in server order.
///
/// A collection is never modified once built. Entries are only converted into
/// typed views when a caller asks for them.
#[derive(Debug, Clone, Default)]
pub struct ResultCollection {
	/// Raw entries
	entries: Vec<SearchEntry>,
}

impl ResultCollection {
	/// Wrap the entries of a search.
	#[must_use]
	pub fn new(entries: Vec<SearchEntry>) -> Self {
		Self { entries }
	}

	/// Number of entries.
	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Whether the search matched nothing.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// The raw entries.
	pub fn iter(&self) -> std::slice::Iter<'_, SearchEntry> {
		self.entries.iter()
	}

	/// The first entry.
	#[must_use]
	pub fn first(&self) -> Option<&SearchEntry> {
		self.entries.first()
	}

	/// The entry at `index`.
	#[must_use]
	pub fn get(&self, index: usize) -> Option<&SearchEntry> {
		self.entries.get(index)
	}

	/// Hydrate the entry at `index` into a typed view.
	#[must_use]
	pub fn get_as<T: FromEntry>(&self, index: usize) -> Option<Result<T, Error>> {
		self.get(index).map(T::from_entry)
	}

	/// Lazily hydrate every entry into a typed view.
	pub fn hydrate<'a, T: FromEntry + 'a>(&'a self) -> impl Iterator<Item = Result<T, Error>> + 'a {
		self.entries.iter().map(T::from_entry)
	}

	/// Take the raw entries.
	#[must_use]
	pub fn into_inner(self) -> Vec<SearchEntry> {
		self.entries
	}
}

impl From<Vec<SearchEntry>> for ResultCollection {
	fn from(entries: Vec<SearchEntry>) -> Self {
		Self::new(entries)
	}
}

impl IntoIterator for ResultCollection {
	type Item = SearchEntry;
	type IntoIter = std::vec::IntoIter<SearchEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.into_iter()
	}
}

impl<'a> IntoIterator for &'a ResultCollection {
	type Item = &'a SearchEntry;
	type IntoIter = std::slice::Iter<'a, SearchEntry>;

	fn into_iter(self) -> Self::IntoIter {
		self.entries.iter()
	}
}

/// Parse an optional decimal attribute.
fn integer(entry: &SearchEntry, attribute: &str) -> Result<Option<i64>, Error> {
	entry
		.attr_first(attribute)
		.map(|value| value.parse().map_err(|_| Error::Invalid(attribute.to_owned())))
		.transpose()
}

/// Decode an optional timestamp. Sentinels that don't denote an instant,
/// such as "never" in interval attributes, yield `None`.
fn instant(
	entry: &SearchEntry,
	attribute: &str,
	codec: Codec,
) -> Result<Option<OffsetDateTime>, Error> {
	let Some(raw) = entry.attr_first(attribute) else {
		return Ok(None);
	};
	Ok(codec.decode(attribute, raw.as_bytes())?.as_time())
}

/// An owned copy of the first value of an attribute.
fn text(entry: &SearchEntry, attribute: &str) -> Option<String> {
	entry.attr_first(attribute).map(str::to_owned)
}

/// A mail contact as seen in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactView {
	/// Distinguished name
	pub dn: String,
	/// `displayName`
	pub display_name: Option<String>,
	/// `mail`
	pub mail: Option<String>,
	/// `department`
	pub department: Option<String>,
	/// `telephoneNumber`
	pub telephone: Option<String>,
	/// DNs of the groups the contact belongs to
	pub member_of: Vec<String>,
	/// RID of the primary group
	pub primary_group_id: Option<i64>,
}

impl FromEntry for ContactView {
	fn from_entry(entry: &SearchEntry) -> Result<Self, Error> {
		Ok(Self {
			dn: entry.dn.clone(),
			display_name: text(entry, "displayName"),
			mail: text(entry, "mail"),
			department: text(entry, "department"),
			telephone: text(entry, "telephoneNumber"),
			member_of: entry.attr_values("memberOf").to_vec(),
			primary_group_id: integer(entry, "primaryGroupID")?,
		})
	}
}

/// A user account with its logon bookkeeping decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserView {
	/// Distinguished name
	pub dn: String,
	/// `displayName`
	pub display_name: Option<String>,
	/// `sAMAccountName`
	pub username: Option<String>,
	/// `mail`
	pub mail: Option<String>,
	/// DNs of the groups the user belongs to
	pub member_of: Vec<String>,
	/// DN of the user's manager
	pub manager: Option<String>,
	/// `userAccountControl` flags
	pub account_control: Option<i64>,
	/// When the account expires; `None` if it never does
	pub account_expires: Option<OffsetDateTime>,
	/// Last logon on the answering domain controller
	pub last_logon: Option<OffsetDateTime>,
	/// Last logon, replicated across domain controllers
	pub last_logon_timestamp: Option<OffsetDateTime>,
	/// Last logoff
	pub last_logoff: Option<OffsetDateTime>,
	/// Last password change
	pub password_last_set: Option<OffsetDateTime>,
	/// When the account was locked out
	pub lockout_time: Option<OffsetDateTime>,
	/// Last failed logon attempt
	pub bad_password_time: Option<OffsetDateTime>,
	/// `whenCreated`
	pub created: Option<OffsetDateTime>,
	/// `whenChanged`
	pub changed: Option<OffsetDateTime>,
}

impl FromEntry for UserView {
	fn from_entry(entry: &SearchEntry) -> Result<Self, Error> {
		Ok(Self {
			dn: entry.dn.clone(),
			display_name: text(entry, "displayName"),
			username: text(entry, "sAMAccountName"),
			mail: text(entry, "mail"),
			member_of: entry.attr_values("memberOf").to_vec(),
			manager: text(entry, "manager"),
			account_control: integer(entry, "userAccountControl")?,
			account_expires: instant(entry, "accountExpires", Codec::Interval)?,
			last_logon: instant(entry, "lastLogon", Codec::Interval)?,
			last_logon_timestamp: instant(entry, "lastLogonTimestamp", Codec::Interval)?,
			last_logoff: instant(entry, "lastLogoff", Codec::Interval)?,
			password_last_set: instant(entry, "pwdLastSet", Codec::Interval)?,
			lockout_time: instant(entry, "lockoutTime", Codec::Interval)?,
			bad_password_time: instant(entry, "badPasswordTime", Codec::Interval)?,
			created: instant(entry, "whenCreated", Codec::GeneralizedTime)?,
			changed: instant(entry, "whenChanged", Codec::GeneralizedTime)?,
		})
	}
}
