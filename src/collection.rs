use crate::{Host, Insertable, IntoNode, Node, Result};
use core::{
	fmt::{self, Debug, Formatter},
	iter::FromIterator,
	slice,
};
use tracing::{instrument, trace};

/// An ordered group of [`Node`]s.
///
/// Items keep the order in which they were added. Every bulk operation is defined in terms of [`Collection::try_each`].
pub struct Collection<H: Host> {
	items: Vec<Node<H>>,
}

impl<H: Host> Debug for Collection<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_list().entries(&self.items).finish()
	}
}

impl<H: Host> Default for Collection<H> {
	fn default() -> Self {
		Self::new()
	}
}

impl<H: Host> From<Vec<Node<H>>> for Collection<H> {
	fn from(items: Vec<Node<H>>) -> Self {
		Self { items }
	}
}

impl<H: Host> FromIterator<Node<H>> for Collection<H> {
	fn from_iter<T: IntoIterator<Item = Node<H>>>(iter: T) -> Self {
		Self { items: iter.into_iter().collect() }
	}
}

impl<H: Host> IntoIterator for Collection<H> {
	type Item = Node<H>;
	type IntoIter = std::vec::IntoIter<Node<H>>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.into_iter()
	}
}

impl<'a, H: Host> IntoIterator for &'a Collection<H> {
	type Item = &'a Node<H>;
	type IntoIter = slice::Iter<'a, Node<H>>;

	fn into_iter(self) -> Self::IntoIter {
		self.items.iter()
	}
}

impl<H: Host> Collection<H> {
	#[must_use]
	pub fn new() -> Self {
		Self { items: Vec::new() }
	}

	/// Adopts every element under `root` that matches `selector`, in document order.
	///
	/// # Errors
	///
	/// Iff the host rejects `selector`.
	#[instrument(skip(host))]
	pub fn select(host: &H, root: &H::Handle, selector: &str) -> Result<Self> {
		let found = host.query_selector_all(root, selector)?;
		trace!("Found {} match(es).", found.len());
		Ok(found.into_iter().map(|live| Node::adopt(host, live)).collect())
	}

	/// Appends `item`, adopting it first if it's a `(host, handle)` pair.
	pub fn add(&mut self, item: impl IntoNode<H>) -> &mut Self {
		self.items.push(item.into_node());
		self
	}

	/// Calls `callback` with each item and its position, back to front iff `reverse`.
	///
	/// The position is always counted from the front.
	pub fn each(&self, mut callback: impl FnMut(&Node<H>, usize), reverse: bool) -> &Self {
		if reverse {
			for (i, node) in self.items.iter().enumerate().rev() {
				callback(node, i)
			}
		} else {
			for (i, node) in self.items.iter().enumerate() {
				callback(node, i)
			}
		}
		self
	}

	/// Like [`Collection::each`], but stops at the first error.
	///
	/// # Errors
	///
	/// The first error returned by `callback`.
	pub fn try_each(&self, mut callback: impl FnMut(&Node<H>, usize) -> Result<()>, reverse: bool) -> Result<&Self> {
		if reverse {
			for (i, node) in self.items.iter().enumerate().rev() {
				callback(node, i)?
			}
		} else {
			for (i, node) in self.items.iter().enumerate() {
				callback(node, i)?
			}
		}
		Ok(self)
	}

	/// [`Node::on`] for each item.
	///
	/// # Errors
	///
	/// The first error. Items before it keep their listener.
	#[instrument(skip(self, listener))]
	pub fn on(&self, event: &str, listener: &H::Listener) -> Result<&Self> {
		self.try_each(|node, _| node.on(event, listener).map(|_| ()), false)
	}

	/// [`Node::off`] for each item.
	///
	/// # Errors
	///
	/// The first error.
	#[instrument(skip(self, listener))]
	pub fn off(&self, event: &str, listener: &H::Listener) -> Result<&Self> {
		self.try_each(|node, _| node.off(event, listener).map(|_| ()), false)
	}

	/// Appends each item to `target`, in order.
	///
	/// # Errors
	///
	/// The first error. Items before it stay inserted.
	#[instrument(skip(self, target))]
	pub fn insert_into(&self, target: &impl Insertable<H>) -> Result<&Self> {
		self.try_each(|node, _| node.insert_into(target).map(|_| ()), false)
	}

	#[must_use]
	pub fn count(&self) -> usize {
		self.items.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	#[must_use]
	pub fn get(&self, index: usize) -> Option<&Node<H>> {
		self.items.get(index)
	}

	pub fn iter(&self) -> slice::Iter<'_, Node<H>> {
		self.items.iter()
	}
}
