//! Distinguished name construction and escaping.
//!
//! Escaping is applied exactly once, when an [`Rdn`] is constructed from a
//! raw value; strings handed to [`DistinguishedName::new`] are trusted to
//! already be escaped.
use std::fmt;

/// Escape a raw attribute value for use inside an RDN.
///
/// Special characters become `\XX` hex pairs. On top of the [RFC 4514] set
/// handled by [`ldap3::dn_escape`], `/` is escaped as well, since Active
/// Directory tooling treats it as a path separator.
///
/// Escaping is not idempotent: running an already escaped value through this
/// function escapes the backslashes a second time.
///
/// [RFC 4514]: https://www.rfc-editor.org/rfc/rfc4514#section-2.4
#[must_use]
pub fn escape(value: &str) -> String {
	ldap3::dn_escape(value).replace('/', "\\2f")
}

/// Reverse [`escape`], decoding both `\c` and `\XX` hex pairs.
#[must_use]
pub fn unescape(value: &str) -> String {
	let bytes = value.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;

	while i < bytes.len() {
		if bytes[i] != b'\\' || i + 1 >= bytes.len() {
			decoded.push(bytes[i]);
			i += 1;
			continue;
		}

		let hex = bytes.get(i + 1..i + 3).and_then(|pair| std::str::from_utf8(pair).ok());
		match hex.and_then(|pair| u8::from_str_radix(pair, 16).ok()) {
			Some(byte) => {
				decoded.push(byte);
				i += 3;
			}
			None => {
				decoded.push(bytes[i + 1]);
				i += 2;
			}
		}
	}

	String::from_utf8_lossy(&decoded).into_owned()
}

/// Split `value` on every `separator` that is not preceded by a backslash.
fn split_unescaped(value: &str, separator: char) -> Vec<&str> {
	let mut parts = Vec::new();
	let mut start = 0;
	let mut escaped = false;

	for (i, ch) in value.char_indices() {
		match ch {
			_ if escaped => escaped = false,
			'\\' => escaped = true,
			_ if ch == separator => {
				parts.push(&value[start..i]);
				start = i + ch.len_utf8();
			}
			_ => {}
		}
	}
	parts.push(&value[start..]);
	parts
}

/// The unescaped value of the first RDN of `dn`, i.e. the name of the entry.
///
/// `CN=Sales\, EMEA,OU=Groups,DC=example,DC=com` yields `Sales, EMEA`.
#[must_use]
pub fn leaf_value(dn: &str) -> Option<String> {
	let leaf = split_unescaped(dn, ',').into_iter().next()?;
	let value = leaf.split_once('=')?.1;
	Some(unescape(value.trim()))
}

/// A single `type=value` component of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rdn {
	/// The attribute type, e.g. `CN` or `OU`
	attribute: String,
	/// The escaped attribute value
	value: String,
}

impl Rdn {
	/// Build an RDN from a raw, unescaped value.
	#[must_use]
	pub fn new(attribute: impl Into<String>, value: &str) -> Self {
		Self { attribute: attribute.into(), value: escape(value) }
	}

	/// A common name RDN.
	#[must_use]
	pub fn cn(value: &str) -> Self {
		Self::new("CN", value)
	}

	/// An organizational unit RDN.
	#[must_use]
	pub fn ou(value: &str) -> Self {
		Self::new("OU", value)
	}
}

impl fmt::Display for Rdn {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}={}", self.attribute, self.value)
	}
}

/// The unique address of a directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DistinguishedName(String);

impl DistinguishedName {
	/// Wrap an already escaped DN string.
	#[must_use]
	pub fn new(dn: impl Into<String>) -> Self {
		Self(dn.into())
	}

	/// Assemble a DN from a leaf RDN, a container path and the base DN.
	///
	/// The container path is given root to leaf, the way a caller reads it.
	/// Directory DNs read leaf to root, so the path is reversed:
	/// `["Widgets", "Sales"]` becomes `OU=Sales,OU=Widgets`.
	#[must_use]
	pub fn build<S: AsRef<str>>(leaf: &Rdn, container: &[S], base_dn: &str) -> Self {
		let mut parts = Vec::with_capacity(container.len() + 2);
		parts.push(leaf.to_string());
		parts.extend(container.iter().rev().map(|ou| Rdn::ou(ou.as_ref()).to_string()));
		if !base_dn.is_empty() {
			parts.push(base_dn.to_owned());
		}
		Self(parts.join(","))
	}

	/// The DN as a string.
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// The RDN components, leaf first, still escaped.
	#[must_use]
	pub fn components(&self) -> Vec<&str> {
		split_unescaped(&self.0, ',').into_iter().map(str::trim).collect()
	}

	/// The unescaped value of the leaf RDN.
	#[must_use]
	pub fn leaf_value(&self) -> Option<String> {
		leaf_value(&self.0)
	}
}

impl fmt::Display for DistinguishedName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl AsRef<str> for DistinguishedName {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl From<DistinguishedName> for String {
	fn from(dn: DistinguishedName) -> Self {
		dn.0
	}
}
