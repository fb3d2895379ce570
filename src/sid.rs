//! Windows security identifiers as stored in the binary `objectSid` attribute.
use std::fmt;

/// A parsed security identifier.
///
/// The binary layout is one revision byte, one sub-authority count byte, a
/// 48-bit big-endian identifier authority and the sub-authorities as 32-bit
/// little-endian integers. The last sub-authority is the relative identifier
/// (RID) of the principal within its domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sid {
	/// SID revision, always 1 in practice
	revision: u8,
	/// Identifier authority, e.g. 5 for `SECURITY_NT_AUTHORITY`
	authority: u64,
	/// Domain sub-authorities followed by the RID
	sub_authorities: Vec<u32>,
}

impl Sid {
	/// Parse the binary form. Returns `None` for truncated or oversized input.
	#[must_use]
	pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
		let (&revision, rest) = bytes.split_first()?;
		let (&count, rest) = rest.split_first()?;
		if rest.len() != 6 + 4 * usize::from(count) {
			return None;
		}

		let (authority_bytes, subs) = rest.split_at(6);
		let authority = authority_bytes.iter().fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte));
		let sub_authorities = subs
			.chunks_exact(4)
			.map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
			.collect();

		Some(Self { revision, authority, sub_authorities })
	}

	/// Serialize back into the binary form.
	#[must_use]
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut bytes = Vec::with_capacity(8 + 4 * self.sub_authorities.len());
		bytes.push(self.revision);
		bytes.push(u8::try_from(self.sub_authorities.len()).unwrap_or(u8::MAX));
		bytes.extend_from_slice(&self.authority.to_be_bytes()[2..]);
		for sub in &self.sub_authorities {
			bytes.extend_from_slice(&sub.to_le_bytes());
		}
		bytes
	}

	/// The relative identifier, i.e. the last sub-authority.
	#[must_use]
	pub fn rid(&self) -> Option<u32> {
		self.sub_authorities.last().copied()
	}

	/// The SID of another principal in the same domain, identified by `rid`.
	#[must_use]
	pub fn with_rid(&self, rid: u32) -> Self {
		let mut sid = self.clone();
		match sid.sub_authorities.last_mut() {
			Some(last) => *last = rid,
			None => sid.sub_authorities.push(rid),
		}
		sid
	}
}

impl fmt::Display for Sid {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "S-{}-", self.revision)?;
		if self.authority >> 32 == 0 {
			write!(f, "{}", self.authority)?;
		} else {
			write!(f, "0x{:012X}", self.authority)?;
		}
		for sub in &self.sub_authorities {
			write!(f, "-{sub}")?;
		}
		Ok(())
	}
}
