use std::{collections::BTreeMap, error::Error, sync::Mutex};

use ldap3::{ldap_escape, LdapConnAsync, SearchEntry};
use ldap_mapper::{
	config::{Config, ConnectionConfig, DirectoryConfig},
	Connection, ObjectProfile, TranslatedAttributes,
};
use url::Url;

pub const BASE_DN: &str = "dc=example,dc=org";

/// `inetOrgPerson` entries, which the test server's schema knows.
pub const PERSON: ObjectProfile = ObjectProfile {
	object_classes: &["top", "person", "organizationalPerson", "inetOrgPerson"],
	required: &["display_name", "surname", "container"],
	excluded_classes: &[],
	hidden_from_address_lists: false,
};

pub fn config() -> Config {
	Config {
		url: Url::parse("ldap://localhost:1389").unwrap(),
		connection: ConnectionConfig::default(),
		bind_dn: "cn=admin,dc=example,dc=org".to_owned(),
		bind_password: "adminpassword".to_owned(),
		directory: DirectoryConfig::new(BASE_DN),
	}
}

pub async fn ldap_add_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.add(&format!("ou={ou},{BASE_DN}"), vec![("objectClass", ["organizationalUnit"].into())])
		.await?
		.success()?;
	Ok(())
}

pub async fn ldap_delete_organizational_unit(
	ldap: &mut ldap3::Ldap,
	ou: &str,
) -> Result<(), Box<dyn Error>> {
	ldap.delete(&format!("ou={ou},{BASE_DN}")).await?.success()?;
	Ok(())
}

pub async fn ldap_delete_entry(ldap: &mut ldap3::Ldap, dn: &str) -> Result<(), Box<dyn Error>> {
	ldap.delete(dn).await?.success()?;
	Ok(())
}

pub async fn ldap_connect() -> Result<ldap3::Ldap, Box<dyn Error>> {
	let (conn, mut ldap) = LdapConnAsync::new("ldap://localhost:1389").await?;
	let _handle = tokio::spawn(async move {
		if let Err(err) = conn.drive().await {
			panic!("Ldap connection error {err}");
		}
	});
	ldap.simple_bind("cn=admin,dc=example,dc=org", "adminpassword").await?;
	Ok(ldap)
}

pub async fn ldap_read_entry(
	ldap: &mut ldap3::Ldap,
	dn: &str,
) -> Result<SearchEntry, Box<dyn Error>> {
	let (result, _res) =
		ldap.search(dn, ldap3::Scope::Base, "(objectClass=*)", vec!["*"]).await?.success()?;
	let entry = result.first().ok_or("No entry found")?.clone();
	Ok(SearchEntry::construct(entry))
}

/// An in-memory directory. Searches on `distinguishedName` match exactly;
/// every other filter matches all entries.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
	pub entries: Mutex<BTreeMap<String, SearchEntry>>,
}

impl Connection for MemoryDirectory {
	fn is_bound(&self) -> bool {
		true
	}

	async fn search(
		&self,
		_base: &str,
		filter: &str,
		_fields: &[&str],
	) -> Result<Vec<SearchEntry>, ldap_mapper::Error> {
		let entries = self.entries.lock().unwrap();
		let found = match filter.strip_prefix("(distinguishedName=") {
			Some(rest) => entries
				.values()
				.filter(|entry| format!("{})", ldap_escape(entry.dn.as_str())) == rest)
				.cloned()
				.collect(),
			None => entries.values().cloned().collect(),
		};
		Ok(found)
	}

	async fn add(
		&self,
		dn: &str,
		attributes: &TranslatedAttributes,
	) -> Result<(), ldap_mapper::Error> {
		let mut entries = self.entries.lock().unwrap();
		if entries.contains_key(dn) {
			return Err(ldap_mapper::Error::DirectoryRejected {
				code: 68,
				message: "Already exists".to_owned(),
			});
		}
		entries.insert(dn.to_owned(), attributes.clone().into_entry(dn));
		Ok(())
	}

	async fn modify(
		&self,
		dn: &str,
		attributes: &TranslatedAttributes,
	) -> Result<(), ldap_mapper::Error> {
		let mut entries = self.entries.lock().unwrap();
		let entry = entries.get_mut(dn).ok_or_else(|| ldap_mapper::Error::DirectoryRejected {
			code: 32,
			message: "No such object".to_owned(),
		})?;
		let replacement = attributes.clone().into_entry(dn);
		for (name, _) in attributes.iter() {
			entry.attrs.retain(|key, _| !key.eq_ignore_ascii_case(name));
			entry.bin_attrs.retain(|key, _| !key.eq_ignore_ascii_case(name));
		}
		entry.attrs.extend(replacement.attrs.into_iter().filter(|(_, values)| !values.is_empty()));
		entry
			.bin_attrs
			.extend(replacement.bin_attrs.into_iter().filter(|(_, values)| !values.is_empty()));
		Ok(())
	}

	async fn delete(&self, dn: &str) -> Result<(), ldap_mapper::Error> {
		match self.entries.lock().unwrap().remove(dn) {
			Some(_) => Ok(()),
			None => Err(ldap_mapper::Error::DirectoryRejected {
				code: 32,
				message: "No such object".to_owned(),
			}),
		}
	}
}
