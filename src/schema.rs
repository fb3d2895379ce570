//! Translation between friendly attribute dictionaries and the attribute names
//! and encodings used on the wire.
//!
//! Callers describe entries with snake case names such as `display_name` or
//! `address_city` and typed [`Value`]s. The [`SchemaTranslator`] maps each name
//! to its protocol attribute (`displayName`, `l`) and encodes the values with
//! the [`Codec`] registered for it. Names without a mapping pass through
//! unchanged, so extension attributes the table does not know about can still
//! be written.
use std::collections::{BTreeMap, HashMap};

use ldap3::SearchEntry;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::config::{AD_TIME_FORMAT, TIME_FORMAT};

/// Number of 100ns intervals between 1601-01-01 and 1970-01-01 (UTC).
pub const INTERVAL_EPOCH_OFFSET: i64 = 116_444_736_000_000_000;

/// The interval value Active Directory uses for "never", e.g. in
/// `accountExpires`.
pub const INTERVAL_NEVER: i64 = i64::MAX;

/// Convert an instant to a count of 100ns intervals since 1601-01-01 UTC.
///
/// Sub-interval precision is truncated towards the past.
#[must_use]
pub fn interval_from_time(time: OffsetDateTime) -> Option<i64> {
	let ticks = time.unix_timestamp_nanos().div_euclid(100) + i128::from(INTERVAL_EPOCH_OFFSET);
	i64::try_from(ticks).ok()
}

/// Convert a count of 100ns intervals since 1601-01-01 UTC to an instant.
#[must_use]
pub fn time_from_interval(ticks: i64) -> Option<OffsetDateTime> {
	let nanos = (i128::from(ticks) - i128::from(INTERVAL_EPOCH_OFFSET)) * 100;
	OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
}

/// Errors produced while translating attributes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
	/// A value of the wrong kind was given for an attribute.
	#[error("Attribute [{attribute}] expects {expected}")]
	UnexpectedKind {
		/// Friendly or protocol name of the attribute
		attribute: String,
		/// Description of the accepted value kinds
		expected: &'static str,
	},
	/// A value read from the directory did not match the attribute's syntax.
	#[error("Attribute [{attribute}] has a malformed value")]
	InvalidValue {
		/// Friendly or protocol name of the attribute
		attribute: String,
	},
	/// A time can't be represented in the target encoding.
	#[error("Attribute [{attribute}] holds a time outside the supported range")]
	TimeOutOfRange {
		/// Friendly or protocol name of the attribute
		attribute: String,
	},
}

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
	/// Text
	String(String),
	/// A boolean flag, `TRUE`/`FALSE` on the wire
	Bool(bool),
	/// An integer
	Integer(i64),
	/// Raw bytes
	Bytes(Vec<u8>),
	/// An instant, encoded according to the attribute's codec
	Time(OffsetDateTime),
	/// An ordered sequence of names, e.g. a container path
	Path(Vec<String>),
}

impl Value {
	/// The text, if this is a string value.
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::String(text) => Some(text),
			_ => None,
		}
	}

	/// The instant, if this is a time value.
	#[must_use]
	pub fn as_time(&self) -> Option<OffsetDateTime> {
		match self {
			Value::Time(time) => Some(*time),
			_ => None,
		}
	}

	/// A path from the given names.
	#[must_use]
	pub fn path<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Value::Path(names.into_iter().map(Into::into).collect())
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::String(value.to_owned())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::String(value)
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Integer(value)
	}
}

impl From<Vec<u8>> for Value {
	fn from(value: Vec<u8>) -> Self {
		Value::Bytes(value)
	}
}

impl From<OffsetDateTime> for Value {
	fn from(value: OffsetDateTime) -> Self {
		Value::Time(value)
	}
}

/// A named attribute inside an [`AttributeDictionary`].
#[derive(Debug, Clone)]
struct Attribute {
	/// The name as the caller spelled it
	name: String,
	/// The values in insertion order
	values: Vec<Value>,
}

/// Friendly attribute names mapped to one or more typed values.
///
/// Names are case-insensitive; the spelling of the first insertion is kept and
/// used for attributes that pass through translation unmapped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<Value>>", into = "BTreeMap<String, Vec<Value>>")]
pub struct AttributeDictionary {
	/// Attributes keyed by lowercased name
	attributes: BTreeMap<String, Attribute>,
}

impl AttributeDictionary {
	/// An empty dictionary.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Builder variant of [`AttributeDictionary::insert`].
	#[must_use]
	pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
		self.insert(name, value);
		self
	}

	/// Set an attribute to a single value, replacing previous values.
	pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
		self.insert_values(name, vec![value.into()]);
	}

	/// Set an attribute to the given values, replacing previous values.
	pub fn insert_values(&mut self, name: &str, values: Vec<Value>) {
		let attribute = self
			.attributes
			.entry(name.to_ascii_lowercase())
			.or_insert_with(|| Attribute { name: name.to_owned(), values: Vec::new() });
		attribute.values = values;
	}

	/// Append a value to an attribute.
	pub fn push(&mut self, name: &str, value: impl Into<Value>) {
		self.attributes
			.entry(name.to_ascii_lowercase())
			.or_insert_with(|| Attribute { name: name.to_owned(), values: Vec::new() })
			.values
			.push(value.into());
	}

	/// All values of an attribute.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&[Value]> {
		self.attributes.get(&name.to_ascii_lowercase()).map(|attribute| attribute.values.as_slice())
	}

	/// The first value of an attribute.
	#[must_use]
	pub fn first(&self, name: &str) -> Option<&Value> {
		self.get(name)?.first()
	}

	/// The first value of an attribute if it is text.
	#[must_use]
	pub fn text(&self, name: &str) -> Option<&str> {
		self.first(name)?.as_str()
	}

	/// Remove an attribute, returning its values.
	pub fn remove(&mut self, name: &str) -> Option<Vec<Value>> {
		self.attributes.remove(&name.to_ascii_lowercase()).map(|attribute| attribute.values)
	}

	/// Whether the attribute is present.
	#[must_use]
	pub fn contains(&self, name: &str) -> bool {
		self.attributes.contains_key(&name.to_ascii_lowercase())
	}

	/// Number of attributes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.attributes.len()
	}

	/// Whether there are no attributes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.attributes.is_empty()
	}

	/// Iterate over names and values, ordered by lowercased name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
		self.attributes.values().map(|attribute| (attribute.name.as_str(), attribute.values.as_slice()))
	}
}

impl PartialEq for AttributeDictionary {
	fn eq(&self, other: &Self) -> bool {
		self.attributes.len() == other.attributes.len()
			&& self
				.attributes
				.iter()
				.zip(&other.attributes)
				.all(|((a, left), (b, right))| a == b && left.values == right.values)
	}
}

impl From<BTreeMap<String, Vec<Value>>> for AttributeDictionary {
	fn from(map: BTreeMap<String, Vec<Value>>) -> Self {
		let mut dictionary = Self::new();
		for (name, values) in map {
			dictionary.insert_values(&name, values);
		}
		dictionary
	}
}

impl From<AttributeDictionary> for BTreeMap<String, Vec<Value>> {
	fn from(dictionary: AttributeDictionary) -> Self {
		dictionary.attributes.into_values().map(|attribute| (attribute.name, attribute.values)).collect()
	}
}

impl<S: AsRef<str>, V: Into<Value>> FromIterator<(S, V)> for AttributeDictionary {
	fn from_iter<T: IntoIterator<Item = (S, V)>>(iter: T) -> Self {
		let mut dictionary = Self::new();
		for (name, value) in iter {
			dictionary.push(name.as_ref(), value);
		}
		dictionary
	}
}

/// Protocol attribute names mapped to their raw encoded values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedAttributes(BTreeMap<String, Vec<Vec<u8>>>);

impl TranslatedAttributes {
	/// An empty attribute set.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Set an attribute, replacing previous values. Names are compared ignoring
	/// case, and the new spelling wins.
	pub fn insert(&mut self, name: impl Into<String>, values: Vec<Vec<u8>>) {
		let name = name.into();
		self.0.retain(|key, _| !key.eq_ignore_ascii_case(&name));
		self.0.insert(name, values);
	}

	/// Set an attribute to textual values, replacing previous values.
	pub fn insert_text<I, S>(&mut self, name: impl Into<String>, values: I)
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.insert(name, values.into_iter().map(|value| value.into().into_bytes()).collect());
	}

	/// The values of an attribute, looked up ignoring case.
	#[must_use]
	pub fn get(&self, name: &str) -> Option<&[Vec<u8>]> {
		self.0.iter().find(|(key, _)| key.eq_ignore_ascii_case(name)).map(|(_, values)| values.as_slice())
	}

	/// The first value of an attribute as text.
	#[must_use]
	pub fn first_str(&self, name: &str) -> Option<&str> {
		self.get(name)?.first().and_then(|value| std::str::from_utf8(value).ok())
	}

	/// Drop empty values, then attributes left without values.
	pub fn retain_non_empty(&mut self) {
		self.0.retain(|_, values| {
			values.retain(|value| !value.is_empty());
			!values.is_empty()
		});
	}

	/// Number of attributes.
	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Whether there are no attributes.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterate over names and values, ordered by name.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &[Vec<u8>])> {
		self.0.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
	}

	/// Build the entry a directory would store for these attributes. Values
	/// that are not valid UTF-8 end up in [`SearchEntry::bin_attrs`], like
	/// `ldap3` does for search results.
	#[must_use]
	pub fn into_entry(self, dn: impl Into<String>) -> SearchEntry {
		let mut entry = SearchEntry { dn: dn.into(), attrs: HashMap::new(), bin_attrs: HashMap::new() };
		for (name, values) in self.0 {
			let text: Result<Vec<String>, _> = values.iter().cloned().map(String::from_utf8).collect();
			match text {
				Ok(text) => {
					entry.attrs.insert(name, text);
				}
				Err(_) => {
					entry.bin_attrs.insert(name, values);
				}
			}
		}
		entry
	}
}

/// How values of an attribute are encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
	/// Plain text; integers are written in decimal
	Text,
	/// `TRUE` or `FALSE`
	Flag,
	/// A decimal integer
	Integer,
	/// 100ns intervals since 1601-01-01 UTC, written as a decimal integer
	Interval,
	/// Generalized time, e.g. `20130516200520.0Z`
	GeneralizedTime,
	/// Opaque bytes
	Binary,
	/// Anything goes; used for names without a mapping
	Raw,
}

impl Codec {
	/// Encode a value for `attribute`.
	pub fn encode(self, attribute: &str, value: &Value) -> Result<Vec<u8>, TranslateError> {
		let unexpected =
			|expected| TranslateError::UnexpectedKind { attribute: attribute.to_owned(), expected };
		let out_of_range = || TranslateError::TimeOutOfRange { attribute: attribute.to_owned() };

		let encoded = match (self, value) {
			(_, Value::Path(_)) => return Err(unexpected("a scalar value")),
			(Codec::Text | Codec::Raw | Codec::Binary, Value::String(text)) => text.clone(),
			(Codec::Text | Codec::Raw | Codec::Integer | Codec::Interval, Value::Integer(number)) => {
				number.to_string()
			}
			(Codec::Flag | Codec::Raw, Value::Bool(flag)) => flag_text(*flag).to_owned(),
			(Codec::Binary | Codec::Raw, Value::Bytes(bytes)) => return Ok(bytes.clone()),
			(Codec::Interval, Value::Time(time)) => {
				interval_from_time(*time).ok_or_else(out_of_range)?.to_string()
			}
			(Codec::GeneralizedTime | Codec::Raw, Value::Time(time)) => time
				.to_offset(UtcOffset::UTC)
				.format(&AD_TIME_FORMAT)
				.map_err(|_| out_of_range())?,
			(Codec::Text, _) => return Err(unexpected("text or an integer")),
			(Codec::Flag, _) => return Err(unexpected("a boolean")),
			(Codec::Integer, _) => return Err(unexpected("an integer")),
			(Codec::Interval, _) => return Err(unexpected("a time or an integer")),
			(Codec::GeneralizedTime, _) => return Err(unexpected("a time")),
			(Codec::Binary, _) => return Err(unexpected("bytes or text")),
		};
		Ok(encoded.into_bytes())
	}

	/// Decode a raw value read from `attribute`.
	pub fn decode(self, attribute: &str, raw: &[u8]) -> Result<Value, TranslateError> {
		let invalid = || TranslateError::InvalidValue { attribute: attribute.to_owned() };

		if matches!(self, Codec::Binary) {
			return Ok(Value::Bytes(raw.to_vec()));
		}
		let Ok(text) = std::str::from_utf8(raw) else {
			return match self {
				Codec::Raw => Ok(Value::Bytes(raw.to_vec())),
				_ => Err(invalid()),
			};
		};

		match self {
			Codec::Text | Codec::Raw => Ok(Value::String(text.to_owned())),
			Codec::Flag => match text {
				"TRUE" => Ok(Value::Bool(true)),
				"FALSE" => Ok(Value::Bool(false)),
				_ => Err(invalid()),
			},
			Codec::Integer => text.parse().map(Value::Integer).map_err(|_| invalid()),
			Codec::Interval => {
				let ticks: i64 = text.parse().map_err(|_| invalid())?;
				Ok(time_from_interval(ticks).map_or(Value::Integer(ticks), Value::Time))
			}
			Codec::GeneralizedTime => PrimitiveDateTime::parse(text, &AD_TIME_FORMAT)
				.or_else(|_| PrimitiveDateTime::parse(text, &TIME_FORMAT))
				.map(|time| Value::Time(time.assume_utc()))
				.map_err(|_| invalid()),
			Codec::Binary => Ok(Value::Bytes(raw.to_vec())),
		}
	}
}

/// The wire representation of a boolean.
fn flag_text(flag: bool) -> &'static str {
	if flag {
		"TRUE"
	} else {
		"FALSE"
	}
}

/// A friendly attribute name with its protocol name and codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeMapping {
	/// The name callers use
	pub friendly: String,
	/// The attribute name in the directory schema
	pub protocol: String,
	/// How values are encoded
	pub codec: Codec,
}

/// Friendly names understood for Active Directory entries.
const ACTIVE_DIRECTORY: &[(&str, &str, Codec)] = &[
	("address_city", "l", Codec::Text),
	("address_code", "postalCode", Codec::Text),
	("address_country", "c", Codec::Text),
	("address_pobox", "postOfficeBox", Codec::Text),
	("address_state", "st", Codec::Text),
	("address_street", "streetAddress", Codec::Text),
	("company", "company", Codec::Text),
	("contact_email", "targetAddress", Codec::Text),
	("department", "department", Codec::Text),
	("description", "description", Codec::Text),
	("display_name", "displayName", Codec::Text),
	("distinguished_name", "distinguishedName", Codec::Text),
	("email", "mail", Codec::Text),
	("fax", "facsimileTelephoneNumber", Codec::Text),
	("firstname", "givenName", Codec::Text),
	("home_directory", "homeDirectory", Codec::Text),
	("home_drive", "homeDrive", Codec::Text),
	("homephone", "homePhone", Codec::Text),
	("initials", "initials", Codec::Text),
	("ipphone", "ipPhone", Codec::Text),
	("logon_name", "userPrincipalName", Codec::Text),
	("manager", "manager", Codec::Text),
	("member_of", "memberOf", Codec::Text),
	("mobile", "mobile", Codec::Text),
	("office", "physicalDeliveryOfficeName", Codec::Text),
	("pager", "pager", Codec::Text),
	("profile_path", "profilePath", Codec::Text),
	("script_path", "scriptPath", Codec::Text),
	("surname", "sn", Codec::Text),
	("telephone", "telephoneNumber", Codec::Text),
	("title", "title", Codec::Text),
	("username", "sAMAccountName", Codec::Text),
	("web_page", "wWWHomePage", Codec::Text),
	("exchange_addressbook", "showInAddressBook", Codec::Text),
	("exchange_altrecipient", "altRecipient", Codec::Text),
	("exchange_deliverandredirect", "deliverAndRedirect", Codec::Flag),
	("exchange_hidefromlists", "msExchHideFromAddressLists", Codec::Flag),
	("exchange_homemdb", "homeMDB", Codec::Text),
	("exchange_mailnickname", "mailNickname", Codec::Text),
	("exchange_proxyaddress", "proxyAddresses", Codec::Text),
	("exchange_usedefaults", "mDBUseDefaults", Codec::Flag),
	("group_rejectpermission", "dlMemRejectPerms", Codec::Text),
	("group_sendpermission", "dlMemSubmitPerms", Codec::Text),
	("primary_group_id", "primaryGroupID", Codec::Integer),
	("user_account_control", "userAccountControl", Codec::Integer),
	("expires", "accountExpires", Codec::Interval),
	("bad_password_time", "badPasswordTime", Codec::Interval),
	("last_logoff", "lastLogoff", Codec::Interval),
	("last_logon", "lastLogon", Codec::Interval),
	("last_logon_timestamp", "lastLogonTimestamp", Codec::Interval),
	("lockout_time", "lockoutTime", Codec::Interval),
	("password_last_set", "pwdLastSet", Codec::Interval),
	("created", "whenCreated", Codec::GeneralizedTime),
	("changed", "whenChanged", Codec::GeneralizedTime),
	("object_guid", "objectGUID", Codec::Binary),
	("object_sid", "objectSid", Codec::Binary),
];

/// Converts [`AttributeDictionary`]s to [`TranslatedAttributes`] and back.
///
/// Translation is a pure function of its input: synthetic attributes such as
/// the object class list are the caller's business.
#[derive(Debug, Clone)]
pub struct SchemaTranslator {
	/// Known attributes
	mappings: Vec<AttributeMapping>,
}

impl Default for SchemaTranslator {
	fn default() -> Self {
		Self::active_directory()
	}
}

impl SchemaTranslator {
	/// A translator without any mappings; everything passes through.
	#[must_use]
	pub fn empty() -> Self {
		Self { mappings: Vec::new() }
	}

	/// A translator knowing the Active Directory user and contact attributes.
	#[must_use]
	pub fn active_directory() -> Self {
		let mappings = ACTIVE_DIRECTORY
			.iter()
			.map(|&(friendly, protocol, codec)| AttributeMapping {
				friendly: friendly.to_owned(),
				protocol: protocol.to_owned(),
				codec,
			})
			.collect();
		Self { mappings }
	}

	/// Register or replace the mapping for a friendly name.
	#[must_use]
	pub fn with_mapping(mut self, friendly: &str, protocol: &str, codec: Codec) -> Self {
		self.mappings.retain(|mapping| !mapping.friendly.eq_ignore_ascii_case(friendly));
		self.mappings.push(AttributeMapping {
			friendly: friendly.to_owned(),
			protocol: protocol.to_owned(),
			codec,
		});
		self
	}

	/// The mapping for a friendly name.
	#[must_use]
	pub fn mapping(&self, friendly: &str) -> Option<&AttributeMapping> {
		self.mappings.iter().find(|mapping| mapping.friendly.eq_ignore_ascii_case(friendly))
	}

	/// The mapping for a protocol name.
	fn by_protocol(&self, protocol: &str) -> Option<&AttributeMapping> {
		self.mappings.iter().find(|mapping| mapping.protocol.eq_ignore_ascii_case(protocol))
	}

	/// The protocol name for a friendly name; unmapped names pass through.
	#[must_use]
	pub fn protocol_name<'a>(&'a self, friendly: &'a str) -> &'a str {
		self.mapping(friendly).map_or(friendly, |mapping| mapping.protocol.as_str())
	}

	/// Translate a dictionary into protocol attributes.
	pub fn to_protocol(
		&self,
		dictionary: &AttributeDictionary,
	) -> Result<TranslatedAttributes, TranslateError> {
		let mut translated = BTreeMap::<String, Vec<Vec<u8>>>::new();
		for (name, values) in dictionary.iter() {
			let (protocol, codec) = match self.mapping(name) {
				Some(mapping) => (mapping.protocol.as_str(), mapping.codec),
				None => (name, Codec::Raw),
			};
			let encoded =
				values.iter().map(|value| codec.encode(name, value)).collect::<Result<Vec<_>, _>>()?;
			translated.entry(protocol.to_owned()).or_default().extend(encoded);
		}
		Ok(TranslatedAttributes(translated))
	}

	/// Decode a search entry into a dictionary keyed by friendly names.
	/// Attributes without a mapping keep their protocol name.
	pub fn from_protocol(&self, entry: &SearchEntry) -> Result<AttributeDictionary, TranslateError> {
		let text = entry.attrs.iter().map(|(name, values)| {
			(name, values.iter().map(String::as_bytes).collect::<Vec<_>>())
		});
		let binary = entry
			.bin_attrs
			.iter()
			.map(|(name, values)| (name, values.iter().map(Vec::as_slice).collect::<Vec<_>>()));

		let mut dictionary = AttributeDictionary::new();
		for (name, values) in text.chain(binary) {
			let (friendly, codec) = match self.by_protocol(name) {
				Some(mapping) => (mapping.friendly.as_str(), mapping.codec),
				None => (name.as_str(), Codec::Raw),
			};
			for raw in values {
				dictionary.push(friendly, codec.decode(friendly, raw)?);
			}
		}
		Ok(dictionary)
	}
}

#[cfg(test)]
mod tests {
	#![allow(clippy::unwrap_used)]

	use time::{macros::datetime, Duration, OffsetDateTime};

	use super::{
		interval_from_time, time_from_interval, AttributeDictionary, Codec, SchemaTranslator,
		TranslateError, TranslatedAttributes, Value, INTERVAL_EPOCH_OFFSET, INTERVAL_NEVER,
	};

	#[test]
	fn interval_epoch() {
		assert_eq!(interval_from_time(OffsetDateTime::UNIX_EPOCH), Some(INTERVAL_EPOCH_OFFSET));
		assert_eq!(interval_from_time(datetime!(1601-01-01 0:00 UTC)), Some(0));
		assert_eq!(time_from_interval(0), Some(datetime!(1601-01-01 0:00 UTC)));
		// 2013-05-16 20:05:20 UTC as written by a domain controller
		assert_eq!(
			time_from_interval(130_132_083_200_000_000),
			Some(datetime!(2013-05-16 20:05:20 UTC))
		);
	}

	#[test]
	fn interval_round_trips_century_boundaries() {
		for time in [
			datetime!(1601-01-01 0:00 UTC),
			datetime!(1700-01-01 0:00 UTC),
			datetime!(1800-01-01 0:00 UTC),
			datetime!(1899-12-31 23:59:59.9999999 UTC),
			datetime!(1900-01-01 0:00 UTC),
			datetime!(2000-01-01 0:00 UTC),
			datetime!(2100-01-01 0:00 UTC),
			datetime!(9999-12-31 23:59:59.9999999 UTC),
		] {
			let ticks = interval_from_time(time).unwrap();
			assert_eq!(time_from_interval(ticks), Some(time), "{time} should round-trip");
		}
	}

	#[test]
	fn interval_truncates_below_tick_precision() {
		let time = datetime!(2020-02-29 12:00 UTC) + Duration::nanoseconds(150);
		let ticks = interval_from_time(time).unwrap();
		assert_eq!(time_from_interval(ticks), Some(time - Duration::nanoseconds(50)));
	}

	#[test]
	fn interval_never_stays_an_integer() {
		let value = Codec::Interval.decode("expires", INTERVAL_NEVER.to_string().as_bytes()).unwrap();
		assert_eq!(value, Value::Integer(INTERVAL_NEVER));
		assert_eq!(
			Codec::Interval.encode("expires", &Value::Integer(INTERVAL_NEVER)).unwrap(),
			b"9223372036854775807"
		);
	}

	#[test]
	fn to_protocol_maps_names_and_codecs() {
		let dictionary = AttributeDictionary::new()
			.with("Display_Name", "Jane Doe")
			.with("email", "jane@example.com")
			.with("exchange_hidefromlists", false)
			.with("expires", datetime!(1970-01-01 0:00 UTC))
			.with("extensionAttribute1", "custom");

		let translated = SchemaTranslator::default().to_protocol(&dictionary).unwrap();
		assert_eq!(translated.first_str("displayName"), Some("Jane Doe"));
		assert_eq!(translated.first_str("mail"), Some("jane@example.com"));
		assert_eq!(translated.first_str("msExchHideFromAddressLists"), Some("FALSE"));
		assert_eq!(translated.first_str("accountExpires"), Some("116444736000000000"));
		assert_eq!(translated.first_str("extensionAttribute1"), Some("custom"));
		assert_eq!(translated.len(), 5);
	}

	#[test]
	fn to_protocol_rejects_wrong_kinds() {
		let translator = SchemaTranslator::default();

		let path = AttributeDictionary::new().with("department", Value::path(["a", "b"]));
		assert!(matches!(
			translator.to_protocol(&path),
			Err(TranslateError::UnexpectedKind { attribute, .. }) if attribute == "department"
		));

		let flag = AttributeDictionary::new().with("exchange_hidefromlists", "maybe");
		assert!(matches!(translator.to_protocol(&flag), Err(TranslateError::UnexpectedKind { .. })));
	}

	#[test]
	fn multiple_values_keep_order() {
		let mut dictionary = AttributeDictionary::new();
		dictionary.push("exchange_proxyaddress", "SMTP:jane@example.com");
		dictionary.push("exchange_proxyaddress", "smtp:jd@example.com");

		let translated = SchemaTranslator::default().to_protocol(&dictionary).unwrap();
		assert_eq!(
			translated.get("proxyAddresses").unwrap(),
			[b"SMTP:jane@example.com".to_vec(), b"smtp:jd@example.com".to_vec()]
		);
	}

	#[test]
	fn round_trip_registered_codecs() {
		let translator = SchemaTranslator::default();
		let dictionary = AttributeDictionary::new()
			.with("display_name", "Doe, Jane")
			.with("exchange_hidefromlists", true)
			.with("primary_group_id", 513_i64)
			.with("last_logon", datetime!(2023-11-05 08:15:42.1234567 UTC))
			.with("expires", datetime!(2100-01-01 0:00 UTC))
			.with("password_last_set", datetime!(1601-01-01 0:00 UTC))
			.with("created", datetime!(2013-05-16 20:05:20 UTC))
			.with("object_sid", vec![1_u8, 1, 0, 0, 0, 0, 0, 5, 0xff, 0xfe, 0, 0])
			.with("extensionAttribute1", "passes through");

		let entry = translator.to_protocol(&dictionary).unwrap().into_entry("CN=Doe\\2c Jane");
		assert!(entry.bin_attrs.contains_key("objectSid"));
		assert_eq!(translator.from_protocol(&entry).unwrap(), dictionary);
	}

	#[test]
	fn from_protocol_rejects_malformed_values() {
		let dictionary = AttributeDictionary::new().with("lastLogon", "yesterday");
		let entry = SchemaTranslator::empty().to_protocol(&dictionary).unwrap().into_entry("CN=x");
		assert_eq!(
			SchemaTranslator::default().from_protocol(&entry),
			Err(TranslateError::InvalidValue { attribute: "last_logon".to_owned() })
		);
	}

	#[test]
	fn custom_mappings_replace_defaults() {
		let translator = SchemaTranslator::default().with_mapping("email", "otherMailbox", Codec::Text);
		assert_eq!(translator.protocol_name("EMAIL"), "otherMailbox");
		assert_eq!(translator.protocol_name("unknown"), "unknown");
	}

	#[test]
	fn dictionary_names_are_case_insensitive() {
		let mut dictionary = AttributeDictionary::new().with("Display_Name", "A");
		dictionary.insert("DISPLAY_NAME", "B");
		assert_eq!(dictionary.len(), 1);
		assert_eq!(dictionary.text("display_name"), Some("B"));
		assert_eq!(dictionary.iter().next().map(|(name, _)| name), Some("Display_Name"));
		assert!(dictionary.remove("display_NAME").is_some());
		assert!(dictionary.is_empty());
	}

	#[test]
	fn translated_names_replace_ignoring_case() {
		let mut attributes = TranslatedAttributes::new();
		attributes.insert_text("objectclass", ["top"]);
		attributes.insert_text("CN", ["Jane"]);
		attributes.insert_text("objectClass", ["top", "contact"]);
		attributes.insert_text("cn", ["Jane Doe"]);

		assert_eq!(attributes.len(), 2);
		assert_eq!(
			attributes.iter().map(|(name, _)| name).collect::<Vec<_>>(),
			["cn", "objectClass"]
		);
		assert_eq!(attributes.first_str("CN"), Some("Jane Doe"));
		assert_eq!(attributes.get("objectclass").unwrap().len(), 2);
	}

	#[test]
	fn raw_accepts_every_scalar() {
		let encode = |value: Value| Codec::Raw.encode("extensionAttribute1", &value);
		assert_eq!(encode(Value::from("text")).unwrap(), b"text");
		assert_eq!(encode(Value::Integer(-3)).unwrap(), b"-3");
		assert_eq!(encode(Value::Bool(true)).unwrap(), b"TRUE");
		assert_eq!(encode(Value::Bytes(vec![0, 159])).unwrap(), [0, 159]);
		assert_eq!(
			encode(Value::Time(datetime!(2013-05-16 20:05:20 UTC))).unwrap(),
			b"20130516200520.0Z"
		);
		assert!(matches!(
			encode(Value::path(["a"])),
			Err(TranslateError::UnexpectedKind { expected: "a scalar value", .. })
		));
	}
}
