//! Config for the LDAP client.
use std::{path::PathBuf, sync::Arc, time::Duration};

use ldap3::LdapConnSettings;
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// Configuration for which variant of ISO8601 to use for parsing and
/// serializing time. Configured according the syntax definition
/// `( 1.3.6.1.4.1.1466.115.121.1.24 DESC 'Generalized Time' )` described in
/// RFC4517 section 3.1.13
pub const TIME_FORMAT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second]Z");

/// The generalized time variant Active Directory writes, with a zero
/// fraction of a second, e.g. `20130516200520.0Z`.
pub const AD_TIME_FORMAT: &[time::format_description::FormatItem] =
	time::macros::format_description!("[year][month][day][hour][minute][second].0Z");

/// LDAP configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
	/// The URL to connect to the server with. Supports ldap, ldaps, and ldapi
	/// schemes
	pub url: Url,
	/// Connection settings.
	#[serde(default)]
	pub connection: ConnectionConfig,
	/// The DN to bind as
	pub bind_dn: String,
	/// The password for the bind DN
	pub bind_password: String,
	/// Where entries live and how directory quirks are handled
	pub directory: DirectoryConfig,
}

/// Configuration for how to connect to the LDAP server
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
	/// Timeout to establish a connection in seconds.
	pub timeout: u64,

	/// LDAP operation timeout. For search per reply.
	pub operation_timeout: Duration,

	/// If set, enables the [simple paged search control] and sets the page size
	/// to the given value
	///
	/// [simple paged search control]: https://www.rfc-editor.org/rfc/rfc2696.html
	#[serde(default)]
	pub page_size: Option<i32>,

	/// TLS config
	#[serde(default)]
	pub tls: TLSConfig,
}

impl Default for ConnectionConfig {
	fn default() -> Self {
		Self {
			timeout: 5,
			operation_timeout: Duration::from_secs(30),
			page_size: None,
			tls: TLSConfig::default(),
		}
	}
}

/// TLS Configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TLSConfig {
	/// Use StartTLS extended operation for establishing a secure connection,
	/// rather than TLS on a dedicated port.
	pub starttls: bool,

	/// Disable verification of TLS certificates
	pub no_tls_verify: bool,

	/// TLS root certificates path
	pub root_certificates_path: Option<PathBuf>,

	/// Path of the TLS client key to use for the connection
	pub client_key_path: Option<PathBuf>,

	/// Path of the TLS client certificate to use for the connection
	pub client_certificate_path: Option<PathBuf>,
}

/// Settings describing the directory tree and its quirks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DirectoryConfig {
	/// The base DN all entries live under, e.g. `DC=example,DC=com`
	pub base_dn: String,
	/// Look up the real primary group of an entry through its `objectSid`
	/// instead of assuming the default group
	#[serde(default = "default_true")]
	pub real_primary_group: bool,
	/// The group assumed as primary group when the real one can't be
	/// determined. Defaults to `CN=Domain Users,CN=Users,<base_dn>`.
	#[serde(default)]
	pub default_primary_group: Option<String>,
}

/// Serde default helper
fn default_true() -> bool {
	true
}

impl DirectoryConfig {
	/// Settings for the given base DN with real primary group lookup enabled.
	#[must_use]
	pub fn new(base_dn: impl Into<String>) -> Self {
		Self { base_dn: base_dn.into(), real_primary_group: true, default_primary_group: None }
	}

	/// The DN of the group assumed as primary group when the real one can't be
	/// determined.
	#[must_use]
	pub fn default_primary_group_dn(&self) -> String {
		match &self.default_primary_group {
			Some(dn) => dn.clone(),
			None => format!("CN=Domain Users,CN=Users,{}", self.base_dn),
		}
	}
}

impl ConnectionConfig {
	/// Create a [`LdapConnSettings`] based on this [`ConnectionConfig`]
	pub(crate) async fn to_settings(&self) -> Result<LdapConnSettings, Error> {
		let mut settings = LdapConnSettings::new();

		settings = settings.set_conn_timeout(Duration::from_secs(self.timeout));
		settings = settings.set_starttls(self.tls.starttls);
		settings = settings.set_no_tls_verify(self.tls.no_tls_verify);

		if let Some(path) = &self.tls.root_certificates_path {
			let mut roots = RootCertStore::empty();
			let pem = tokio::fs::read(path).await?;
			let certificates = rustls_pemfile::certs(&mut pem.as_slice())?;
			let (added, _) = roots.add_parsable_certificates(&certificates[..]);
			if added == 0 {
				return Err(Error::Invalid("Could not read root certificate".to_owned()));
			}

			let builder = ClientConfig::builder().with_safe_defaults().with_root_certificates(roots);
			let config = match (&self.tls.client_key_path, &self.tls.client_certificate_path) {
				(Some(key_path), Some(cert_path)) => {
					let chain = rustls_pemfile::certs(&mut tokio::fs::read(cert_path).await?.as_slice())?
						.into_iter()
						.map(Certificate)
						.collect();
					let key = rustls_pemfile::pkcs8_private_keys(
						&mut tokio::fs::read(key_path).await?.as_slice(),
					)?
					.into_iter()
					.next()
					.map(PrivateKey)
					.ok_or_else(|| Error::Invalid("Could not read client key".to_owned()))?;
					builder.with_client_auth_cert(chain, key).map_err(|_| {
						Error::Invalid("Could not read client certificates".to_owned())
					})?
				}
				(None, None) => builder.with_no_client_auth(),
				_ => Err(Error::Invalid(
					"Both a client certificate and key file in PKCS8 format must be specified"
						.to_owned(),
				))?,
			};
			settings = settings.set_config(Arc::new(config));
		}
		Ok(settings)
	}
}
