#![allow(
	clippy::dbg_macro,
	clippy::expect_used,
	clippy::missing_docs_in_private_items,
	clippy::print_stderr,
	clippy::print_stdout,
	clippy::unwrap_used,
	clippy::bool_assert_comparison
)]
use std::{
	error::Error,
	sync::{Arc, Mutex},
};

use ldap_mapper::{
	AttributeDictionary, ContactView, Dispatcher, EntryRepository, Event, LdapConnection,
	NullDispatcher, ObjectProfile, Registry, SearchEntryExt, Value,
};
use serial_test::serial;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

mod common;

use common::{
	config, ldap_add_organizational_unit, ldap_connect, ldap_delete_entry,
	ldap_delete_organizational_unit, ldap_read_entry, MemoryDirectory, BASE_DN, PERSON,
};

fn init_tracing() {
	let tracing_filter = EnvFilter::default().add_directive(LevelFilter::DEBUG.into());
	let _ = tracing_subscriber::fmt().with_env_filter(tracing_filter).try_init();
}

/// Record the names of all fired events.
fn recording_registry() -> (Arc<Registry>, Arc<Mutex<Vec<&'static str>>>) {
	let registry = Arc::new(Registry::new());
	let events = Arc::new(Mutex::new(Vec::new()));
	let sink = Arc::clone(&events);
	registry.listen(
		"entry.*",
		Arc::new(move |event: &Event| {
			sink.lock().unwrap().push(event.name());
			None
		}),
	);
	(registry, events)
}

#[tokio::test]
async fn contact_lifecycle_in_memory() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let (registry, events) = recording_registry();
	let contacts = EntryRepository::new(
		MemoryDirectory::default(),
		ldap_mapper::DirectoryConfig::new("DC=example,DC=com"),
		ObjectProfile::CONTACT,
		registry,
	);

	let dn = contacts
		.create(
			&AttributeDictionary::new()
				.with("display_name", "Doe, Jane")
				.with("email", "jane@example.com")
				.with("department", "Sales")
				.with("container", Value::path(["Widgets", "Sales"])),
		)
		.await?;
	assert_eq!(dn.as_str(), "CN=Doe\\2c Jane,OU=Sales,OU=Widgets,DC=example,DC=com");

	let found = contacts.find(dn.as_str(), None).await?;
	let contact: ContactView = found.get_as(0).unwrap()?;
	assert_eq!(contact.display_name.as_deref(), Some("Doe, Jane"));
	assert_eq!(contact.department.as_deref(), Some("Sales"));
	assert_eq!(contact.member_of, ["CN=Domain Users,CN=Users,DC=example,DC=com"]);
	assert_eq!(found.first().unwrap().attr_first("msExchHideFromAddressLists"), Some("TRUE"));

	contacts
		.modify(dn.as_str(), &AttributeDictionary::new().with("department", "Marketing"))
		.await?;
	let found = contacts.find(dn.as_str(), Some(&["department"][..])).await?;
	assert_eq!(found.first().unwrap().attr_first("department"), Some("Marketing"));
	assert_eq!(found.first().unwrap().value_count("memberOf"), 0);

	let listed = contacts.list("*", true).await?;
	assert_eq!(listed, [(dn.to_string(), "Doe, Jane".to_owned())]);

	// a second contact with the same name lands on the same DN
	let duplicate = contacts
		.create(
			&AttributeDictionary::new()
				.with("display_name", "Doe, Jane")
				.with("email", "other@example.com")
				.with("container", Value::path(["Widgets", "Sales"])),
		)
		.await;
	assert!(matches!(duplicate, Err(ldap_mapper::Error::DirectoryRejected { code: 68, .. })));

	contacts.delete(dn.as_str()).await?;
	assert!(matches!(
		contacts.find(dn.as_str(), None).await,
		Err(ldap_mapper::Error::NotFound(_))
	));

	assert_eq!(
		*events.lock().unwrap(),
		[
			"entry.creating",
			"entry.created",
			"entry.updating",
			"entry.updated",
			"entry.creating",
			"entry.deleting",
			"entry.deleted"
		]
	);
	Ok(())
}

#[tokio::test]
async fn silenced_hooks_keep_registrations() -> Result<(), Box<dyn Error>> {
	let (registry, events) = recording_registry();
	let silenced: Arc<dyn Dispatcher> = Arc::new(NullDispatcher::new(registry.clone()));
	let contacts = EntryRepository::new(
		MemoryDirectory::default(),
		ldap_mapper::DirectoryConfig::new("DC=example,DC=com"),
		ObjectProfile::CONTACT,
		Arc::clone(&silenced),
	);

	contacts
		.create(
			&AttributeDictionary::new()
				.with("display_name", "Jane Doe")
				.with("email", "jane@example.com")
				.with("container", Value::path(["Sales"])),
		)
		.await?;

	assert!(events.lock().unwrap().is_empty());
	assert!(silenced.has_listeners("entry.created"));
	assert!(registry.has_listeners("entry.created"));
	Ok(())
}

#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn ldap_entry_lifecycle_test() -> Result<(), Box<dyn Error>> {
	init_tracing();

	let mut ldap = ldap_connect().await?;
	let _ = ldap_delete_entry(&mut ldap, &format!("cn=Doe\\2c Jane,ou=mapper,{BASE_DN}")).await;
	let _ = ldap_delete_organizational_unit(&mut ldap, "mapper").await;
	ldap_add_organizational_unit(&mut ldap, "mapper").await?;

	let config = config();
	let connection = LdapConnection::connect(&config).await?;
	let (registry, events) = recording_registry();
	let people = EntryRepository::new(connection, config.directory.clone(), PERSON, registry);

	let dn = people
		.create(
			&AttributeDictionary::new()
				.with("display_name", "Doe, Jane")
				.with("surname", "Doe")
				.with("email", "jane@example.org")
				.with("container", Value::path(["mapper"])),
		)
		.await?;
	assert_eq!(dn.as_str(), "CN=Doe\\2c Jane,OU=mapper,dc=example,dc=org");

	let stored = ldap_read_entry(&mut ldap, dn.as_str()).await?;
	assert_eq!(stored.attr_first("cn"), Some("Doe, Jane"));
	assert_eq!(stored.attr_first("mail"), Some("jane@example.org"));

	let listed = people.list("Doe*", true).await?;
	assert_eq!(listed.len(), 1);
	assert_eq!(listed[0].1, "Doe, Jane");

	people
		.modify(dn.as_str(), &AttributeDictionary::new().with("telephone", "+1 555 0100"))
		.await?;
	let stored = ldap_read_entry(&mut ldap, dn.as_str()).await?;
	assert_eq!(stored.attr_first("telephoneNumber"), Some("+1 555 0100"));

	people.delete(dn.as_str()).await?;
	assert!(people.list("Doe*", true).await?.is_empty());
	assert_eq!(events.lock().unwrap().len(), 6);

	people.connection().unbind().await?;
	assert!(matches!(people.list("*", false).await, Err(ldap_mapper::Error::NotBound)));

	ldap_delete_organizational_unit(&mut ldap, "mapper").await?;
	ldap.unbind().await?;
	Ok(())
}

#[ignore = "docker"]
#[tokio::test]
#[serial]
async fn ldap_rejected_operation_test() -> Result<(), Box<dyn Error>> {
	let config = config();
	let connection = LdapConnection::connect(&config).await?;
	let people =
		EntryRepository::new(connection, config.directory.clone(), PERSON, Arc::new(Registry::new()));

	// the parent container does not exist
	let result = people
		.create(
			&AttributeDictionary::new()
				.with("display_name", "Nobody")
				.with("surname", "Nobody")
				.with("container", Value::path(["missing"])),
		)
		.await;
	assert!(matches!(result, Err(ldap_mapper::Error::DirectoryRejected { code: 32, .. })));

	let result = people.delete(&format!("cn=Nobody,ou=missing,{BASE_DN}")).await;
	assert!(matches!(result, Err(ldap_mapper::Error::DirectoryRejected { code: 32, .. })));

	people.connection().unbind().await?;
	Ok(())
}
