//! Composition of LDAP search filters ([RFC 4515]).
//!
//! [RFC 4515]: https://www.rfc-editor.org/rfc/rfc4515
use std::fmt;

use ldap3::ldap_escape;

/// A search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
	/// `(attribute=value)`, with the value escaped
	Equal {
		/// Attribute to compare
		attribute: String,
		/// Raw value to compare against
		value: String,
	},
	/// `(attribute=*)`
	Present(String),
	/// `(attribute=pattern)` where `*` in the pattern is a wildcard and every
	/// other special character is escaped
	Wildcard {
		/// Attribute to compare
		attribute: String,
		/// Substring pattern
		pattern: String,
	},
	/// Conjunction of all inner filters
	And(Vec<Filter>),
	/// Disjunction of all inner filters
	Or(Vec<Filter>),
	/// Negation of the inner filter
	Not(Box<Filter>),
}

impl Filter {
	/// Equality predicate.
	#[must_use]
	pub fn equal(attribute: impl Into<String>, value: impl Into<String>) -> Self {
		Self::Equal { attribute: attribute.into(), value: value.into() }
	}

	/// Presence predicate.
	#[must_use]
	pub fn present(attribute: impl Into<String>) -> Self {
		Self::Present(attribute.into())
	}

	/// Substring predicate where `*` keeps its wildcard meaning.
	#[must_use]
	pub fn wildcard(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
		Self::Wildcard { attribute: attribute.into(), pattern: pattern.into() }
	}

	/// Negate a filter.
	#[must_use]
	#[allow(clippy::should_implement_trait)]
	pub fn not(filter: Filter) -> Self {
		Self::Not(Box::new(filter))
	}

	/// Equality on `objectClass`.
	#[must_use]
	pub fn object_class(class: &str) -> Self {
		Self::equal("objectClass", class)
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Filter::Equal { attribute, value } => {
				write!(f, "({attribute}={})", ldap_escape(value.as_str()))
			}
			Filter::Present(attribute) => write!(f, "({attribute}=*)"),
			Filter::Wildcard { attribute, pattern } => {
				let escaped: Vec<_> = pattern.split('*').map(ldap_escape).collect();
				write!(f, "({attribute}={})", escaped.join("*"))
			}
			Filter::And(filters) => {
				f.write_str("(&")?;
				filters.iter().try_for_each(|filter| write!(f, "{filter}"))?;
				f.write_str(")")
			}
			Filter::Or(filters) => {
				f.write_str("(|")?;
				filters.iter().try_for_each(|filter| write!(f, "{filter}"))?;
				f.write_str(")")
			}
			Filter::Not(filter) => write!(f, "(!{filter})"),
		}
	}
}
