//! Hooks fired around directory writes and relationship resolution.
//!
//! Components receive an `Arc<dyn Dispatcher>` when they are constructed.
//! Wrapping a [`Registry`] in a [`NullDispatcher`] silences every hook without
//! touching call sites, while registrations stay inspectable.
use std::{
	collections::HashMap,
	fmt,
	sync::{Arc, PoisonError, RwLock},
};

/// Something that happened to a directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
	/// An entry is about to be added
	Creating {
		/// DN of the new entry
		dn: String,
	},
	/// An entry was added
	Created {
		/// DN of the new entry
		dn: String,
	},
	/// An entry is about to be modified
	Updating {
		/// DN of the entry
		dn: String,
	},
	/// An entry was modified
	Updated {
		/// DN of the entry
		dn: String,
	},
	/// An entry is about to be deleted
	Deleting {
		/// DN of the entry
		dn: String,
	},
	/// An entry was deleted
	Deleted {
		/// DN of the entry
		dn: String,
	},
	/// Relationship resolution met a name it had already visited
	CycleGuarded {
		/// DN the resolution started from
		origin: String,
		/// The name that was reached again
		name: String,
	},
}

impl Event {
	/// The name listeners subscribe to.
	#[must_use]
	pub fn name(&self) -> &'static str {
		match self {
			Event::Creating { .. } => "entry.creating",
			Event::Created { .. } => "entry.created",
			Event::Updating { .. } => "entry.updating",
			Event::Updated { .. } => "entry.updated",
			Event::Deleting { .. } => "entry.deleting",
			Event::Deleted { .. } => "entry.deleted",
			Event::CycleGuarded { .. } => "relationship.cycle_guarded",
		}
	}
}

/// A listener callback. A `Some` return value ends [`Dispatcher::until`].
pub type Listener = Arc<dyn Fn(&Event) -> Option<String> + Send + Sync>;

/// The listen/fire contract shared by [`Registry`] and [`NullDispatcher`].
pub trait Dispatcher: Send + Sync + fmt::Debug {
	/// Register a listener for an event name or a `*` wildcard pattern.
	fn listen(&self, pattern: &str, listener: Listener);

	/// Whether any listener would receive events named `event`.
	fn has_listeners(&self, event: &str) -> bool;

	/// Listeners for `event`: exact registrations first, then wildcards.
	fn listeners(&self, event: &str) -> Vec<Listener>;

	/// Call every listener for the event, ignoring their results.
	fn fire(&self, event: &Event);

	/// Call listeners until one returns `Some`, and return that result.
	fn until(&self, event: &Event) -> Option<String>;

	/// Remove all listeners registered under `pattern`.
	fn forget(&self, pattern: &str);
}

/// Match `name` against a pattern where `*` stands for any sequence.
fn matches(pattern: &str, name: &str) -> bool {
	let mut parts = pattern.split('*');
	let Some(first) = parts.next() else {
		return name.is_empty();
	};
	let Some(mut rest) = name.strip_prefix(first) else {
		return false;
	};

	let parts: Vec<&str> = parts.collect();
	let Some((last, middle)) = parts.split_last() else {
		return rest.is_empty();
	};
	for part in middle {
		match rest.find(part) {
			Some(index) => rest = &rest[index + part.len()..],
			None => return false,
		}
	}
	rest.ends_with(last)
}

/// The process-wide listener registry.
#[derive(Default)]
pub struct Registry {
	/// Listeners keyed by event name or pattern, in registration order
	listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl Registry {
	/// An empty registry.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}
}

impl fmt::Debug for Registry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
		let mut patterns: Vec<(&String, usize)> =
			listeners.iter().map(|(pattern, registered)| (pattern, registered.len())).collect();
		patterns.sort();
		f.debug_struct("Registry").field("listeners", &patterns).finish()
	}
}

impl Dispatcher for Registry {
	fn listen(&self, pattern: &str, listener: Listener) {
		self.listeners
			.write()
			.unwrap_or_else(PoisonError::into_inner)
			.entry(pattern.to_owned())
			.or_default()
			.push(listener);
	}

	fn has_listeners(&self, event: &str) -> bool {
		!self.listeners(event).is_empty()
	}

	fn listeners(&self, event: &str) -> Vec<Listener> {
		let listeners = self.listeners.read().unwrap_or_else(PoisonError::into_inner);
		let mut found: Vec<Listener> = listeners.get(event).cloned().unwrap_or_default();

		let mut wildcards: Vec<(&String, &Vec<Listener>)> = listeners
			.iter()
			.filter(|(pattern, _)| pattern.contains('*') && matches(pattern, event))
			.collect();
		wildcards.sort_by(|a, b| a.0.cmp(b.0));
		found.extend(wildcards.into_iter().flat_map(|(_, registered)| registered.iter().cloned()));
		found
	}

	fn fire(&self, event: &Event) {
		for listener in self.listeners(event.name()) {
			let _ = listener(event);
		}
	}

	fn until(&self, event: &Event) -> Option<String> {
		self.listeners(event.name())
			.into_iter()
			.find_map(|listener| listener(event).filter(|response| !response.is_empty()))
	}

	fn forget(&self, pattern: &str) {
		self.listeners.write().unwrap_or_else(PoisonError::into_inner).remove(pattern);
	}
}

/// A dispatcher that never calls listeners but keeps registrations on the
/// wrapped dispatcher, so hooks can be re-enabled by swapping it back in.
#[derive(Debug, Clone)]
pub struct NullDispatcher {
	/// The dispatcher registrations are delegated to
	inner: Arc<dyn Dispatcher>,
}

impl NullDispatcher {
	/// Silence `inner`.
	#[must_use]
	pub fn new(inner: Arc<dyn Dispatcher>) -> Self {
		Self { inner }
	}

	/// The wrapped dispatcher.
	#[must_use]
	pub fn inner(&self) -> &Arc<dyn Dispatcher> {
		&self.inner
	}
}

impl Dispatcher for NullDispatcher {
	fn listen(&self, pattern: &str, listener: Listener) {
		self.inner.listen(pattern, listener);
	}

	fn has_listeners(&self, event: &str) -> bool {
		self.inner.has_listeners(event)
	}

	fn listeners(&self, event: &str) -> Vec<Listener> {
		self.inner.listeners(event)
	}

	fn fire(&self, _event: &Event) {}

	fn until(&self, _event: &Event) -> Option<String> {
		None
	}

	fn forget(&self, pattern: &str) {
		self.inner.forget(pattern);
	}
}
