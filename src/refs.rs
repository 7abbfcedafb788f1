//! The live-instance ledger.

use crate::NodeKey;
use core::fmt::{self, Display, Formatter};

/// Identity of one component instance. Never reused within a runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl Display for InstanceId {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
	pub instance: InstanceId,
	pub host: NodeKey,
	pub tag_name: String,
	/// Number of render passes this instance went through.
	pub generation: u64,
}

/// Ordered refs of all connected instances, at most one per host element.
#[derive(Debug, Default, Clone)]
pub struct RefsTable {
	entries: Vec<Ref>,
}

impl RefsTable {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends `entry`, or overwrites the entry of the same host in place.
	///
	/// Returns whether the table grew.
	pub fn record(&mut self, entry: Ref) -> bool {
		match self.entries.iter_mut().find(|existing| existing.host == entry.host) {
			Some(existing) => {
				*existing = entry;
				false
			}
			None => {
				self.entries.push(entry);
				true
			}
		}
	}

	pub fn prune(&mut self, host: NodeKey) -> Option<Ref> {
		let index = self.entries.iter().position(|entry| entry.host == host)?;
		Some(self.entries.remove(index))
	}

	#[must_use]
	pub fn get(&self, host: NodeKey) -> Option<&Ref> {
		self.entries.iter().find(|entry| entry.host == host)
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = &Ref> {
		self.entries.iter()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entry(instance: u64, host: u64, generation: u64) -> Ref {
		Ref {
			instance: InstanceId(instance),
			host: NodeKey(host),
			tag_name: "foo".to_owned(),
			generation,
		}
	}

	#[test]
	fn same_host_overwrites_in_place() {
		let mut refs = RefsTable::new();
		assert!(refs.record(entry(1, 10, 1)));
		assert!(refs.record(entry(2, 20, 1)));
		assert!(!refs.record(entry(1, 10, 2)));
		assert_eq!(refs.len(), 2);
		assert_eq!(refs.iter().map(|r| r.generation).collect::<Vec<_>>(), [2, 1]);
	}

	#[test]
	fn prune_keeps_order() {
		let mut refs = RefsTable::new();
		for i in 0..4 {
			refs.record(entry(i, i, 1));
		}
		assert_eq!(refs.prune(NodeKey(1)).map(|r| r.instance), Some(InstanceId(1)));
		assert_eq!(refs.prune(NodeKey(1)), None);
		assert_eq!(refs.iter().map(|r| r.host.0).collect::<Vec<_>>(), [0, 2, 3]);
	}
}
