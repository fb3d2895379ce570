//! Helper methods for extracting data from search results.
use std::collections::HashMap;

use ldap3::SearchEntry;

use crate::error::Error;

/// An extension trait for [`SearchEntry`] that provides convenience methods for
/// extracting data.
///
/// Directory servers are free to return attribute names in a different case
/// than requested, so every lookup ignores ASCII case.
pub trait SearchEntryExt {
	/// All textual values of an attribute, in server order.
	fn attr_values(&self, attr: &str) -> &[String];

	/// Get the first value of an attribute, in binary form
	fn bin_attr_first(&self, attr: &str) -> Option<&[u8]>;

	/// The number of values the server reported for an attribute.
	fn value_count(&self, attr: &str) -> usize;

	/// Get the first value of an attribute. Will return `None` if attribute
	/// value is not valid UTF-8.
	fn attr_first(&self, attr: &str) -> Option<&str> {
		self.attr_values(attr).first().map(String::as_str)
	}

	/// Get the first value of an attribute, interpreted as a boolean.
	fn bool_first(&self, attr: &str) -> Option<Result<bool, Error>> {
		match self.attr_first(attr) {
			Some("TRUE") => Some(Ok(true)),
			Some("FALSE") => Some(Ok(false)),
			Some(_) => Some(Err(Error::Invalid(attr.to_owned()))),
			None => None,
		}
	}

	/// Append a textual value, creating the attribute if needed.
	fn push_value(&mut self, attr: &str, value: String);
}

/// Find the key under which `attr` is stored, ignoring case.
fn find_key<'a, V>(map: &'a HashMap<String, V>, attr: &str) -> Option<&'a String> {
	map.keys().find(|key| key.eq_ignore_ascii_case(attr))
}

impl SearchEntryExt for SearchEntry {
	fn attr_values(&self, attr: &str) -> &[String] {
		find_key(&self.attrs, attr).and_then(|key| self.attrs.get(key)).map_or(&[][..], Vec::as_slice)
	}

	fn bin_attr_first(&self, attr: &str) -> Option<&[u8]> {
		if let Some(value) = self.attr_first(attr) {
			return Some(value.as_bytes());
		}

		let key = find_key(&self.bin_attrs, attr)?;
		self.bin_attrs.get(key)?.first().map(Vec::as_slice)
	}

	fn value_count(&self, attr: &str) -> usize {
		let binary =
			find_key(&self.bin_attrs, attr).and_then(|key| self.bin_attrs.get(key)).map_or(0, Vec::len);
		self.attr_values(attr).len() + binary
	}

	fn push_value(&mut self, attr: &str, value: String) {
		let key = find_key(&self.attrs, attr).cloned().unwrap_or_else(|| attr.to_owned());
		self.attrs.entry(key).or_default().push(value);
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use ldap3::SearchEntry;

	use super::SearchEntryExt;

	fn entry() -> SearchEntry {
		SearchEntry {
			dn: String::from("dontcare"),
			attrs: [(String::from("name"), vec![String::from("Foo Bar"), String::from("Bar McBaz")])]
				.into_iter()
				.collect(),
			bin_attrs: [(String::from("objectSid"), vec![vec![1, 0, 0, 0, 0, 0, 0, 5]])]
				.into_iter()
				.collect(),
		}
	}

	#[test]
	fn attr_first() {
		let entry = entry();
		assert_eq!(
			entry.attr_first("attribute_does_not_exist"),
			None,
			"Undefined attributes should return None"
		);
		assert_eq!(entry.attr_first("name"), Some("Foo Bar"), "Should return the first value");
		assert_ne!(entry.attr_first("name"), Some("Bar McBaz"), "Should return the correct value");
		assert_eq!(entry.attr_first("NAME"), Some("Foo Bar"), "Lookup should ignore case");
	}

	#[test]
	fn binary_values_and_counts() {
		let entry = entry();
		assert_eq!(entry.bin_attr_first("objectsid"), Some(&[1, 0, 0, 0, 0, 0, 0, 5][..]));
		assert_eq!(entry.bin_attr_first("name"), Some("Foo Bar".as_bytes()));
		assert_eq!(entry.value_count("Name"), 2);
		assert_eq!(entry.value_count("objectSid"), 1);
		assert_eq!(entry.value_count("memberOf"), 0);
	}

	#[test]
	fn push_value_keeps_server_casing() {
		let mut entry = SearchEntry {
			dn: String::from("dontcare"),
			attrs: HashMap::from([(String::from("memberOf"), vec![String::from("CN=A")])]),
			bin_attrs: HashMap::new(),
		};
		entry.push_value("memberof", String::from("CN=B"));
		entry.push_value("mail", String::from("a@example.com"));

		assert_eq!(entry.attrs["memberOf"], ["CN=A", "CN=B"]);
		assert_eq!(entry.attr_first("mail"), Some("a@example.com"));
		assert_eq!(entry.value_count("memberOf"), 2);
	}

	#[test]
	fn bool_first() {
		let entry = SearchEntry {
			dn: String::from("dontcare"),
			attrs: HashMap::from([
				(String::from("msExchHideFromAddressLists"), vec![String::from("TRUE")]),
				(String::from("broken"), vec![String::from("yes")]),
			]),
			bin_attrs: HashMap::new(),
		};
		assert!(matches!(entry.bool_first("msExchHideFromAddressLists"), Some(Ok(true))));
		assert!(matches!(entry.bool_first("broken"), Some(Err(_))));
		assert!(entry.bool_first("missing").is_none());
	}
}
