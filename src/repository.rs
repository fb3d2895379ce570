//! Create, read, update and delete directory entries described by attribute
//! dictionaries.
use std::sync::Arc;

use ldap3::SearchEntry;
use tracing::{debug, info, warn};

use crate::{
	collection::ResultCollection,
	config::DirectoryConfig,
	connection::Connection,
	dn::{DistinguishedName, Rdn},
	entry::SearchEntryExt,
	error::Error,
	events::{Dispatcher, Event},
	filter::Filter,
	relationship::MembershipSource,
	schema::{AttributeDictionary, SchemaTranslator, Value},
	sid::Sid,
};

/// Dictionary key holding the container path of a new entry.
pub const CONTAINER: &str = "container";

/// Dictionary key of the display name, which also becomes the entry's CN.
const DISPLAY_NAME: &str = "display_name";

/// Dictionary key controlling address list visibility.
const HIDE_FROM_LISTS: &str = "exchange_hidefromlists";

/// Fields returned by [`EntryRepository::find`] when the caller names none.
pub const DEFAULT_FIELDS: &[&str] = &[
	"distinguishedName",
	"mail",
	"memberOf",
	"department",
	"displayName",
	"telephoneNumber",
	"primaryGroupID",
	"objectSid",
];

/// Fields needed to compute the memberships of an entry.
const MEMBERSHIP_FIELDS: &[&str] = &["memberOf", "primaryGroupID", "objectSid"];

/// Attribute referencing an entry's manager by DN.
const MANAGER: &str = "manager";

/// The kind of object a repository manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectProfile {
	/// Object classes written on creation; the last one is the structural
	/// class used for listings
	pub object_classes: &'static [&'static str],
	/// Dictionary keys that must be present on creation
	pub required: &'static [&'static str],
	/// Object classes left out of listings
	pub excluded_classes: &'static [&'static str],
	/// Hide new entries from Exchange address lists unless told otherwise
	pub hidden_from_address_lists: bool,
}

impl ObjectProfile {
	/// Mail contacts.
	pub const CONTACT: Self = Self {
		object_classes: &["top", "person", "organizationalPerson", "contact"],
		required: &[DISPLAY_NAME, "email", CONTAINER],
		excluded_classes: &[],
		hidden_from_address_lists: true,
	};

	/// User accounts. Computer accounts share the `user` class and are
	/// excluded from listings.
	pub const USER: Self = Self {
		object_classes: &["top", "person", "organizationalPerson", "user"],
		required: &[DISPLAY_NAME, "username", "email", CONTAINER],
		excluded_classes: &["computer"],
		hidden_from_address_lists: false,
	};

	/// The most specific object class.
	#[must_use]
	pub fn structural_class(&self) -> &'static str {
		self.object_classes.last().copied().unwrap_or("top")
	}
}

/// Entry operations against a bound [`Connection`].
#[derive(Debug)]
pub struct EntryRepository<C> {
	/// The directory session
	connection: C,
	/// Friendly name mapping
	translator: SchemaTranslator,
	/// Base DN and primary group settings
	directory: DirectoryConfig,
	/// The kind of entries managed
	profile: ObjectProfile,
	/// Receives create, update and delete events
	hooks: Arc<dyn Dispatcher>,
}

impl<C: Connection> EntryRepository<C> {
	/// A repository using the Active Directory attribute table.
	#[must_use]
	pub fn new(
		connection: C,
		directory: DirectoryConfig,
		profile: ObjectProfile,
		hooks: Arc<dyn Dispatcher>,
	) -> Self {
		Self { connection, translator: SchemaTranslator::default(), directory, profile, hooks }
	}

	/// Use a different attribute table.
	#[must_use]
	pub fn with_translator(mut self, translator: SchemaTranslator) -> Self {
		self.translator = translator;
		self
	}

	/// The underlying connection.
	#[must_use]
	pub fn connection(&self) -> &C {
		&self.connection
	}

	/// The attribute table in use.
	#[must_use]
	pub fn translator(&self) -> &SchemaTranslator {
		&self.translator
	}

	/// The directory settings.
	#[must_use]
	pub fn directory(&self) -> &DirectoryConfig {
		&self.directory
	}

	/// The kind of entries managed.
	#[must_use]
	pub fn profile(&self) -> &ObjectProfile {
		&self.profile
	}

	/// The dispatcher events are fired on.
	#[must_use]
	pub fn hooks(&self) -> &Arc<dyn Dispatcher> {
		&self.hooks
	}

	/// Fail with [`Error::NotBound`] unless the session is usable.
	fn ensure_bound(&self) -> Result<(), Error> {
		if self.connection.is_bound() {
			Ok(())
		} else {
			Err(Error::NotBound)
		}
	}

	/// Check the required fields of the profile before anything is sent.
	fn validate(&self, attributes: &AttributeDictionary) -> Result<(), Error> {
		for &field in self.profile.required {
			let present = match attributes.first(field) {
				Some(Value::String(text)) => !text.is_empty(),
				Some(_) => field == CONTAINER,
				None => false,
			};
			if !present {
				return Err(Error::MissingField(field.to_owned()));
			}
		}
		Ok(())
	}

	/// Create a new entry below the container named in the dictionary.
	///
	/// The dictionary needs the fields the profile requires. `container` is
	/// the organizational unit path, root first; without it the entry is
	/// created directly below the base DN. The display name becomes the CN.
	pub async fn create(&self, attributes: &AttributeDictionary) -> Result<DistinguishedName, Error> {
		self.ensure_bound()?;
		self.validate(attributes)?;

		let mut attributes = attributes.clone();
		let container = match attributes.remove(CONTAINER).as_deref() {
			None => Vec::new(),
			Some([Value::Path(path)]) if path.iter().all(|name| !name.is_empty()) => path.clone(),
			Some([Value::Path(_)]) => {
				return Err(Error::InvalidContainer("empty organizational unit name".to_owned()))
			}
			Some(_) => {
				return Err(Error::InvalidContainer(
					"expected a single path of organizational unit names".to_owned(),
				))
			}
		};
		let display_name = attributes
			.text(DISPLAY_NAME)
			.filter(|name| !name.is_empty())
			.ok_or_else(|| Error::MissingField(DISPLAY_NAME.to_owned()))?
			.to_owned();

		let mut translated = self.translator.to_protocol(&attributes)?;
		translated.retain_non_empty();
		translated.insert_text("cn", [display_name.as_str()]);
		translated.insert_text("objectClass", self.profile.object_classes.iter().copied());
		if self.profile.hidden_from_address_lists && !attributes.contains(HIDE_FROM_LISTS) {
			translated.insert_text(self.translator.protocol_name(HIDE_FROM_LISTS), ["TRUE"]);
		}

		let dn = DistinguishedName::build(&Rdn::cn(&display_name), &container, &self.directory.base_dn);
		self.hooks.fire(&Event::Creating { dn: dn.to_string() });
		self.connection.add(dn.as_str(), &translated).await?;
		info!(%dn, "Created entry");
		self.hooks.fire(&Event::Created { dn: dn.to_string() });
		Ok(dn)
	}

	/// Replace the given attributes of an existing entry. Attributes given
	/// without values are cleared.
	pub async fn modify(&self, dn: &str, attributes: &AttributeDictionary) -> Result<(), Error> {
		self.ensure_bound()?;
		if dn.is_empty() {
			return Err(Error::MissingDn);
		}

		let translated = self.translator.to_protocol(attributes)?;
		if translated.is_empty() {
			return Err(Error::EmptyModification);
		}

		self.hooks.fire(&Event::Updating { dn: dn.to_owned() });
		self.connection.modify(dn, &translated).await?;
		info!(dn, attributes = translated.len(), "Modified entry");
		self.hooks.fire(&Event::Updated { dn: dn.to_owned() });
		Ok(())
	}

	/// Delete an entry.
	pub async fn delete(&self, dn: &str) -> Result<(), Error> {
		self.ensure_bound()?;
		if dn.is_empty() {
			return Err(Error::MissingDn);
		}

		self.hooks.fire(&Event::Deleting { dn: dn.to_owned() });
		self.connection.delete(dn).await?;
		info!(dn, "Deleted entry");
		self.hooks.fire(&Event::Deleted { dn: dn.to_owned() });
		Ok(())
	}

	/// Fetch the entry at `dn`, projecting `fields` or [`DEFAULT_FIELDS`].
	///
	/// Active Directory leaves the primary group out of `memberOf`. When
	/// `memberOf` is projected, the primary group DN is appended to it.
	pub async fn find(&self, dn: &str, fields: Option<&[&str]>) -> Result<ResultCollection, Error> {
		self.ensure_bound()?;
		if dn.is_empty() {
			return Err(Error::MissingDn);
		}

		let fields = fields.unwrap_or(DEFAULT_FIELDS);
		let filter = Filter::equal("distinguishedName", dn).to_string();
		let mut entries = self.connection.search(&self.directory.base_dn, &filter, fields).await?;
		if entries.is_empty() {
			return Err(Error::NotFound(dn.to_owned()));
		}

		if fields.iter().any(|field| field.eq_ignore_ascii_case("memberOf")) {
			for entry in &mut entries {
				let group = self.primary_group(entry).await?;
				let listed =
					entry.attr_values("memberOf").iter().any(|member| member.eq_ignore_ascii_case(&group));
				if !listed {
					entry.push_value("memberOf", group);
				}
			}
		}
		Ok(ResultCollection::new(entries))
	}

	/// Fetch the manager of the entry at `dn`, projecting `fields` or
	/// [`DEFAULT_FIELDS`].
	///
	/// `None` when the entry has no manager or the referenced entry no longer
	/// exists.
	pub async fn manager_of(
		&self,
		dn: &str,
		fields: Option<&[&str]>,
	) -> Result<Option<ResultCollection>, Error> {
		let found = self.find(dn, Some(&[MANAGER][..])).await?;
		let Some(manager) = found.first().and_then(|entry| entry.attr_first(MANAGER)) else {
			return Ok(None);
		};
		match self.find(manager, fields).await {
			Ok(manager) => Ok(Some(manager)),
			Err(Error::NotFound(manager)) => {
				debug!(dn, manager = manager.as_str(), "Manager reference points to a missing entry");
				Ok(None)
			}
			Err(error) => Err(error),
		}
	}

	/// The DN of the primary group of `entry`.
	///
	/// With real primary group lookup enabled, the group's SID is derived
	/// from the entry's SID and looked up. Otherwise, or when that fails, the
	/// configured default group is assumed.
	async fn primary_group(&self, entry: &SearchEntry) -> Result<String, Error> {
		if self.directory.real_primary_group {
			let rid = entry.attr_first("primaryGroupID").and_then(|rid| rid.parse::<u32>().ok());
			let sid = entry.bin_attr_first("objectSid").and_then(Sid::from_bytes);
			if let (Some(rid), Some(sid)) = (rid, sid) {
				let filter = Filter::equal("objectSid", sid.with_rid(rid).to_string()).to_string();
				let groups =
					self.connection.search(&self.directory.base_dn, &filter, &["distinguishedName"]).await?;
				if let Some(group) = groups.into_iter().next() {
					return Ok(group.dn);
				}
				warn!(dn = entry.dn.as_str(), rid, "Primary group not found, assuming the default group");
			}
		}
		Ok(self.directory.default_primary_group_dn())
	}

	/// Search with `filter` and pair each entry DN with a display value: the
	/// first projected field that has one, else the DN itself.
	///
	/// With `sorted`, pairs are ordered by display value; entries with equal
	/// values keep the order the directory returned them in.
	pub async fn all(
		&self,
		filter: &Filter,
		fields: &[&str],
		sorted: bool,
	) -> Result<Vec<(String, String)>, Error> {
		self.ensure_bound()?;

		let entries =
			self.connection.search(&self.directory.base_dn, &filter.to_string(), fields).await?;
		let mut pairs: Vec<(String, String)> = entries
			.into_iter()
			.map(|entry| {
				let display = fields
					.iter()
					.find_map(|field| entry.attr_first(field).filter(|value| !value.is_empty()))
					.map(str::to_owned);
				let display = display.unwrap_or_else(|| entry.dn.clone());
				(entry.dn, display)
			})
			.collect();

		if sorted {
			pairs.sort_by(|a, b| a.1.cmp(&b.1));
		}
		debug!(%filter, count = pairs.len(), "Listed entries");
		Ok(pairs)
	}

	/// List entries of the profile's structural class whose CN matches
	/// `search`, where `*` is a wildcard, with their display names.
	pub async fn list(&self, search: &str, sorted: bool) -> Result<Vec<(String, String)>, Error> {
		let mut predicates = vec![
			Filter::object_class(self.profile.structural_class()),
			Filter::wildcard("cn", search),
		];
		predicates.extend(
			self.profile.excluded_classes.iter().map(|&class| Filter::not(Filter::object_class(class))),
		);
		self.all(&Filter::And(predicates), &["displayName", "cn"], sorted).await
	}
}

impl<C: Connection> MembershipSource for EntryRepository<C> {
	async fn entry_memberships(&self, dn: &str) -> Result<Vec<String>, Error> {
		let found = self.find(dn, Some(MEMBERSHIP_FIELDS)).await?;
		Ok(found.first().map_or_else(Vec::new, |entry| entry.attr_values("memberOf").to_vec()))
	}

	async fn group_memberships(&self, name: &str) -> Result<Vec<String>, Error> {
		self.ensure_bound()?;
		let filter =
			Filter::And(vec![Filter::equal("objectCategory", "group"), Filter::equal("name", name)]);
		let groups =
			self.connection.search(&self.directory.base_dn, &filter.to_string(), &["memberOf"]).await?;
		Ok(groups.iter().flat_map(|group| group.attr_values("memberOf").iter().cloned()).collect())
	}
}
