//! Direct and transitive group membership.
//!
//! Membership cycles are legal in Active Directory, so expansion keeps a
//! visited set of DNs and reports every revisit instead of recursing forever.
use std::{
	collections::{HashSet, VecDeque},
	future::Future,
	sync::Arc,
};

use tracing::debug;

use crate::{
	dn::{self, DistinguishedName},
	error::Error,
	events::{Dispatcher, Event},
};

/// Where the resolver reads memberships from.
///
/// Both methods return the DNs of the groups the subject is a direct member
/// of. [`crate::repository::EntryRepository`] implements this against a
/// directory.
pub trait MembershipSource: Sync {
	/// Groups the entry at `dn` belongs to, primary group included.
	fn entry_memberships(&self, dn: &str) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

	/// Groups the group called `name` belongs to. Unknown groups have none.
	fn group_memberships(&self, name: &str) -> impl Future<Output = Result<Vec<String>, Error>> + Send;
}

/// The groups reachable from an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Closure {
	/// Group names in order of first discovery, direct memberships first
	pub names: Vec<String>,
	/// How many times expansion reached an already visited name
	pub cycles_guarded: usize,
}

/// Folded form used for comparing names.
fn fold(name: &str) -> String {
	name.to_lowercase()
}

/// Folded form used for comparing DNs: components trimmed, case ignored.
fn fold_dn(dn: &str) -> String {
	fold(&DistinguishedName::new(dn).components().join(","))
}

/// The group name for a membership DN; values that don't parse as a DN are
/// used as they are.
fn group_name(membership: &str) -> String {
	dn::leaf_value(membership).unwrap_or_else(|| membership.to_owned())
}

/// Computes membership closures over a [`MembershipSource`].
#[derive(Debug)]
pub struct RelationshipResolver<'a, S> {
	/// Membership lookups
	source: &'a S,
	/// Receives [`Event::CycleGuarded`]
	hooks: Arc<dyn Dispatcher>,
}

impl<'a, S: MembershipSource> RelationshipResolver<'a, S> {
	/// A resolver reading from `source`.
	#[must_use]
	pub fn new(source: &'a S, hooks: Arc<dyn Dispatcher>) -> Self {
		Self { source, hooks }
	}

	/// Names of the groups the entry at `dn` belongs to. With `recursive`,
	/// groups of those groups are included as well.
	pub async fn relationships_of(&self, dn: &str, recursive: bool) -> Result<Vec<String>, Error> {
		Ok(self.closure(dn, recursive).await?.names)
	}

	/// Whether the entry at `dn` is a member of the group called `name`.
	/// Names are compared ignoring case.
	pub async fn is_related_to(&self, dn: &str, name: &str, recursive: bool) -> Result<bool, Error> {
		let wanted = fold(name);
		Ok(self.closure(dn, recursive).await?.names.iter().any(|found| fold(found) == wanted))
	}

	/// Breadth-first expansion of the memberships of `dn`.
	///
	/// Groups are told apart by DN, so same-named entries in different
	/// containers are distinct. The entry itself counts as visited from the
	/// start and never shows up in its own closure.
	pub async fn closure(&self, dn: &str, recursive: bool) -> Result<Closure, Error> {
		let mut closure = Closure::default();
		let mut visited = HashSet::from([fold_dn(dn)]);
		let mut queue = VecDeque::new();

		let direct = self.source.entry_memberships(dn).await?;
		self.merge(dn, &direct, &mut visited, &mut closure, &mut queue);

		while recursive {
			let Some(name) = queue.pop_front() else {
				break;
			};
			let parents = self.source.group_memberships(&name).await?;
			self.merge(dn, &parents, &mut visited, &mut closure, &mut queue);
		}

		debug!(dn, recursive, groups = closure.names.len(), "Resolved memberships");
		Ok(closure)
	}

	/// Add newly discovered groups to the closure and the work queue.
	fn merge(
		&self,
		origin: &str,
		memberships: &[String],
		visited: &mut HashSet<String>,
		closure: &mut Closure,
		queue: &mut VecDeque<String>,
	) {
		for membership in memberships {
			let name = group_name(membership);
			if visited.insert(fold_dn(membership)) {
				closure.names.push(name.clone());
				queue.push_back(name);
			} else {
				closure.cycles_guarded += 1;
				debug!(origin, name, "Skipping already visited group");
				self.hooks.fire(&Event::CycleGuarded { origin: origin.to_owned(), name });
			}
		}
	}
}
