//! Error codes

use crate::schema::TranslateError;

/// Errors that can occur when using this library
#[derive(thiserror::Error, Debug)]
pub enum Error {
	/// A field required by the operation was absent or had the wrong type.
	/// Detected before the directory is contacted.
	#[error("Missing compulsory field [{0}]")]
	MissingField(String),
	/// The container path was not an ordered sequence of names.
	#[error("Invalid container: {0}")]
	InvalidContainer(String),
	/// The directory session is not bound.
	#[error("Not bound to the directory")]
	NotBound,
	/// A search expected to match exactly one entry matched none.
	#[error("No entry found for {0}")]
	NotFound(String),
	/// An operation addressing an existing entry was given an empty DN.
	#[error("Missing compulsory field [distinguishedname]")]
	MissingDn,
	/// A modification translated to an empty attribute set.
	#[error("Modification contains no attributes")]
	EmptyModification,
	/// The directory refused the operation.
	#[error("Directory rejected the operation (rc={code}): {message}")]
	DirectoryRejected {
		/// The LDAP result code
		code: u32,
		/// Diagnostic text sent along by the server
		message: String,
	},
	/// An attribute dictionary could not be translated.
	#[error(transparent)]
	Translation(#[from] TranslateError),
	/// A configuration value or attribute did not conform to the expected
	/// syntax.
	#[error("Malformed data: {0}")]
	Invalid(String),
	/// Reading TLS material failed.
	#[error(transparent)]
	Io(#[from] std::io::Error),
	/// An underlying protocol error or similar occurred, or the LDAP library
	/// was used incorrectly.
	#[error(transparent)]
	Ldap(#[from] ldap3::LdapError),
}

impl Error {
	/// Turn a non-success LDAP result into [`Error::DirectoryRejected`].
	pub(crate) fn check(result: ldap3::LdapResult) -> Result<(), Error> {
		if result.rc == 0 {
			Ok(())
		} else {
			Err(Error::DirectoryRejected { code: result.rc, message: result.text })
		}
	}
}
