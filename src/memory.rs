//! An in-process [`Host`] with an arena-backed element tree, a virtual clock and synchronous event dispatch.
//!
//! [`MemoryHost`] behaves like a browser document where that matters to [`Node`](crate::Node):
//! the class list lives in the `class` attribute, class tokens are validated like `DOMTokenList` does it,
//! detaching requires a parent, and queries match against the whole ancestry but only return descendants of their scope.
//!
//! Time only moves through [`MemoryHost::advance`].

use crate::{Error, Host, Insertable, Result};
use core::{
	cell::RefCell,
	fmt::{self, Debug, Formatter},
	time::Duration,
};
use std::rc::Rc;
use tracing::{instrument, trace, trace_span};

mod selector;
use selector::SelectorList;

/// Handle to an element of one [`MemoryHost`].
///
/// Elements are never freed, so handles stay valid for the lifetime of their host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl Insertable<MemoryHost> for NodeId {
	fn live_handle(&self) -> &NodeId {
		self
	}
}

/// An event as seen by [`MemoryListener`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEvent {
	pub name: String,
	/// Where the event was dispatched.
	pub target: NodeId,
	/// Whose listener is running.
	pub current_target: NodeId,
}

/// Event listener for [`MemoryHost`]. Clones compare equal, separately created listeners don't.
#[derive(Clone)]
pub struct MemoryListener(Rc<dyn Fn(&MemoryEvent)>);

impl MemoryListener {
	pub fn new(callback: impl Fn(&MemoryEvent) + 'static) -> Self {
		Self(Rc::new(callback))
	}
}

impl PartialEq for MemoryListener {
	fn eq(&self, other: &Self) -> bool {
		Rc::as_ptr(&self.0) as *const u8 == Rc::as_ptr(&other.0) as *const u8
	}
}

impl Debug for MemoryListener {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("MemoryListener").field(&(Rc::as_ptr(&self.0) as *const u8)).finish()
	}
}

/// Token returned by [`MemoryHost::schedule`](`Host::schedule`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryTimer(u64);

struct Element {
	tag: String,
	is_document: bool,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	attributes: Vec<(String, String)>,
	text: Option<String>,
	listeners: Vec<(String, MemoryListener)>,
	offset_size: (i32, i32),
}

impl Element {
	fn new(tag: &str) -> Self {
		Self {
			tag: tag.to_ascii_lowercase(),
			is_document: false,
			parent: None,
			children: Vec::new(),
			attributes: Vec::new(),
			text: None,
			listeners: Vec::new(),
			offset_size: (0, 0),
		}
	}

	fn attribute(&self, name: &str) -> Option<&str> {
		self.attributes.iter().find(|(n, _)| n == name).map(|(_, value)| value.as_str())
	}

	fn set_attribute(&mut self, name: &str, value: String) {
		match self.attributes.iter_mut().find(|(n, _)| n == name) {
			Some((_, existing)) => *existing = value,
			None => self.attributes.push((name.to_owned(), value)),
		}
	}

	fn class_tokens(&self) -> Vec<&str> {
		let mut tokens: Vec<&str> = Vec::new();
		for token in self.attribute("class").unwrap_or_default().split_ascii_whitespace() {
			if !tokens.contains(&token) {
				tokens.push(token)
			}
		}
		tokens
	}
}

struct Scheduled {
	timer: MemoryTimer,
	due: Duration,
	callback: Box<dyn FnOnce()>,
}

struct Tree {
	elements: Vec<Element>,
	now: Duration,
	next_timer: u64,
	scheduled: Vec<Scheduled>,
}

impl Tree {
	fn get(&self, id: NodeId) -> Option<&Element> {
		self.elements.get(id.0)
	}

	fn element(&self, id: NodeId) -> Result<&Element> {
		self.get(id).ok_or(Error::UnknownNode)
	}

	fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
		self.elements.get_mut(id.0).ok_or(Error::UnknownNode)
	}

	fn parent_of(&self, id: NodeId) -> Option<NodeId> {
		self.get(id).and_then(|element| element.parent)
	}

	fn is_inclusive_ancestor(&self, ancestor: NodeId, mut id: NodeId) -> bool {
		loop {
			if id == ancestor {
				return true;
			}
			match self.parent_of(id) {
				Some(parent) => id = parent,
				None => return false,
			}
		}
	}

	fn detach(&mut self, child: NodeId) {
		if let Some(parent) = self.parent_of(child) {
			self.elements[parent.0].children.retain(|&c| c != child);
			self.elements[child.0].parent = None;
		}
	}

	/// Descendants of `root` in document order, excluding `root`.
	fn descendants(&self, root: NodeId) -> Vec<NodeId> {
		let mut found = Vec::new();
		let mut stack: Vec<NodeId> = self.elements[root.0].children.iter().rev().copied().collect();
		while let Some(id) = stack.pop() {
			found.push(id);
			stack.extend(self.elements[id.0].children.iter().rev().copied());
		}
		found
	}

	fn copy(&mut self, source: NodeId, deep: bool) -> NodeId {
		let copy = {
			let source = &self.elements[source.0];
			Element {
				tag: source.tag.clone(),
				is_document: false,
				parent: None,
				children: Vec::new(),
				attributes: source.attributes.clone(),
				text: if deep { source.text.clone() } else { None },
				listeners: Vec::new(),
				offset_size: (0, 0),
			}
		};
		let id = NodeId(self.elements.len());
		self.elements.push(copy);
		if deep {
			for child in self.elements[source.0].children.clone() {
				let child_copy = self.copy(child, true);
				self.elements[child_copy.0].parent = Some(id);
				self.elements[id.0].children.push(child_copy);
			}
		}
		id
	}
}

fn validate_token(token: &str) -> Result<()> {
	if token.is_empty() {
		Err(Error::InvalidToken {
			token: token.to_owned(),
			reason: "SyntaxError: the token must not be empty",
		})
	} else if token.contains(|c: char| c.is_ascii_whitespace()) {
		Err(Error::InvalidToken {
			token: token.to_owned(),
			reason: "InvalidCharacterError: the token must not contain whitespace",
		})
	} else {
		Ok(())
	}
}

fn validate_attribute_name(name: &str) -> Result<()> {
	if name.is_empty() || name.contains(|c: char| c.is_ascii_whitespace() || matches!(c, '"' | '\'' | '>' | '/' | '=')) {
		Err(Error::host("setAttribute", format!("InvalidCharacterError: {:?} is not a valid attribute name", name)))
	} else {
		Ok(())
	}
}

/// See the [module documentation](`self`).
///
/// Clones share the same document.
#[derive(Clone)]
pub struct MemoryHost(Rc<RefCell<Tree>>);

impl Debug for MemoryHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let tree = match self.0.try_borrow() {
			Ok(tree) => tree,
			Err(_) => return f.write_str("MemoryHost { <borrowed> }"),
		};
		f.debug_struct("MemoryHost")
			.field("elements", &tree.elements.len())
			.field("now", &tree.now)
			.field("scheduled", &tree.scheduled.len())
			.finish()
	}
}

impl Default for MemoryHost {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryHost {
	/// A host containing only an empty document.
	#[must_use]
	pub fn new() -> Self {
		let mut document = Element::new("#document");
		document.is_document = true;
		Self(Rc::new(RefCell::new(Tree {
			elements: vec![document],
			now: Duration::from_secs(0),
			next_timer: 0,
			scheduled: Vec::new(),
		})))
	}

	/// The lowercase tag name.
	///
	/// # Errors
	///
	/// [`Error::UnknownNode`] iff `id` is not an element of this host.
	pub fn tag_name(&self, id: NodeId) -> Result<String> {
		Ok(self.0.borrow().element(id)?.tag.clone())
	}

	/// # Errors
	///
	/// [`Error::UnknownNode`] iff `id` is not an element of this host.
	pub fn text_content(&self, id: NodeId) -> Result<Option<String>> {
		Ok(self.0.borrow().element(id)?.text.clone())
	}

	/// # Errors
	///
	/// [`Error::UnknownNode`] iff `id` is not an element of this host.
	pub fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
		Ok(self.0.borrow().element(id)?.children.clone())
	}

	/// Sets what [`Host::offset_size`] reports, since nothing is laid out here.
	///
	/// # Errors
	///
	/// [`Error::UnknownNode`] iff `id` is not an element of this host.
	pub fn set_offset_size(&self, id: NodeId, width: i32, height: i32) -> Result<()> {
		self.0.borrow_mut().element_mut(id)?.offset_size = (width, height);
		Ok(())
	}

	/// Runs the listeners for `event` on `target`, then on each of its ancestors.
	///
	/// Returns how many listeners ran.
	///
	/// # Errors
	///
	/// [`Error::UnknownNode`] iff `target` is not an element of this host.
	#[instrument]
	pub fn dispatch(&self, target: NodeId, event: &str) -> Result<usize> {
		let mut path = vec![target];
		{
			let tree = self.0.borrow();
			tree.element(target)?;
			while let Some(parent) = tree.parent_of(*path.last().unwrap_or(&target)) {
				path.push(parent)
			}
		}

		let mut ran = 0;
		for current_target in path {
			let listeners: Vec<MemoryListener> = self.0.borrow().elements[current_target.0]
				.listeners
				.iter()
				.filter(|(name, _)| name == event)
				.map(|(_, listener)| listener.clone())
				.collect();
			let memory_event = MemoryEvent {
				name: event.to_owned(),
				target,
				current_target,
			};
			for listener in listeners {
				(listener.0)(&memory_event);
				ran += 1;
			}
		}
		trace!("Ran {} listener(s).", ran);
		Ok(ran)
	}

	/// Time elapsed on the virtual clock.
	#[must_use]
	pub fn now(&self) -> Duration {
		self.0.borrow().now
	}

	#[must_use]
	pub fn pending_timers(&self) -> usize {
		self.0.borrow().scheduled.len()
	}

	/// Moves the virtual clock forward by `by`, running every callback that comes due on the way, in order.
	///
	/// Callbacks scheduled while advancing run in the same call if they come due before the end.
	#[instrument]
	pub fn advance(&self, by: Duration) {
		let end = self.0.borrow().now + by;
		loop {
			let next = {
				let mut tree = self.0.borrow_mut();
				let index = tree
					.scheduled
					.iter()
					.enumerate()
					.filter(|(_, scheduled)| scheduled.due <= end)
					.min_by_key(|(_, scheduled)| (scheduled.due, scheduled.timer.0))
					.map(|(i, _)| i);
				index.map(|index| {
					let scheduled = tree.scheduled.remove(index);
					tree.now = scheduled.due;
					scheduled
				})
			};
			match next {
				Some(Scheduled { timer, due, callback }) => {
					let span = trace_span!("Running timer", ?timer, ?due);
					let _enter = span.enter();
					callback()
				}
				None => break,
			}
		}
		self.0.borrow_mut().now = end;
	}
}

impl Host for MemoryHost {
	type Handle = NodeId;
	type Listener = MemoryListener;
	type Timer = MemoryTimer;

	fn create_element(&self, tag: &str) -> Result<NodeId> {
		if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
			return Err(Error::host("createElement", format!("InvalidCharacterError: {:?} is not a valid tag name", tag)));
		}
		let mut tree = self.0.borrow_mut();
		let id = NodeId(tree.elements.len());
		tree.elements.push(Element::new(tag));
		Ok(id)
	}

	fn set_text_content(&self, handle: &NodeId, text: Option<&str>) -> Result<()> {
		let mut tree = self.0.borrow_mut();
		for child in tree.element(*handle)?.children.clone() {
			tree.detach(child)
		}
		tree.element_mut(*handle)?.text = text.map(str::to_owned);
		Ok(())
	}

	fn parent(&self, handle: &NodeId) -> Option<NodeId> {
		self.0.borrow().parent_of(*handle)
	}

	fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
		let mut tree = self.0.borrow_mut();
		tree.element(*parent)?;
		if tree.element(*child)?.is_document || tree.is_inclusive_ancestor(*child, *parent) {
			return Err(Error::host("appendChild", "HierarchyRequestError: the new child is an ancestor of the parent"));
		}
		tree.detach(*child);
		tree.elements[child.0].parent = Some(*parent);
		tree.elements[parent.0].children.push(*child);
		Ok(())
	}

	fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<()> {
		let mut tree = self.0.borrow_mut();
		tree.element(*parent)?;
		if tree.element(*child)?.parent != Some(*parent) {
			return Err(Error::host("removeChild", "NotFoundError: the node to be removed is not a child of this node"));
		}
		tree.detach(*child);
		Ok(())
	}

	fn clone_node(&self, handle: &NodeId, deep: bool) -> Result<NodeId> {
		let mut tree = self.0.borrow_mut();
		if tree.element(*handle)?.is_document {
			return Err(Error::host("cloneNode", "NotSupportedError: the document can't be cloned"));
		}
		Ok(tree.copy(*handle, deep))
	}

	fn document_root(&self) -> Result<NodeId> {
		Ok(NodeId(0))
	}

	fn class_name(&self, handle: &NodeId) -> String {
		self.0.borrow().get(*handle).and_then(|element| element.attribute("class")).unwrap_or_default().to_owned()
	}

	fn add_class(&self, handle: &NodeId, name: &str) -> Result<()> {
		validate_token(name)?;
		let mut tree = self.0.borrow_mut();
		let element = tree.element_mut(*handle)?;
		let mut tokens = element.class_tokens();
		if !tokens.contains(&name) {
			tokens.push(name)
		}
		let class = tokens.join(" ");
		element.set_attribute("class", class);
		Ok(())
	}

	fn remove_class(&self, handle: &NodeId, name: &str) -> Result<()> {
		validate_token(name)?;
		let mut tree = self.0.borrow_mut();
		let element = tree.element_mut(*handle)?;
		if element.attribute("class").is_some() {
			let class = element.class_tokens().into_iter().filter(|&token| token != name).collect::<Vec<_>>().join(" ");
			element.set_attribute("class", class);
		}
		Ok(())
	}

	fn contains_class(&self, handle: &NodeId, name: &str) -> bool {
		self.0.borrow().get(*handle).map_or(false, |element| element.class_tokens().contains(&name))
	}

	fn set_attribute(&self, handle: &NodeId, name: &str, value: &str) -> Result<()> {
		validate_attribute_name(name)?;
		self.0.borrow_mut().element_mut(*handle)?.set_attribute(name, value.to_owned());
		Ok(())
	}

	fn remove_attribute(&self, handle: &NodeId, name: &str) -> Result<()> {
		self.0.borrow_mut().element_mut(*handle)?.attributes.retain(|(n, _)| n != name);
		Ok(())
	}

	fn has_attribute(&self, handle: &NodeId, name: &str) -> bool {
		self.0.borrow().get(*handle).map_or(false, |element| element.attribute(name).is_some())
	}

	fn attributes(&self, handle: &NodeId) -> Vec<(String, String)> {
		self.0.borrow().get(*handle).map(|element| element.attributes.clone()).unwrap_or_default()
	}

	fn query_selector(&self, root: &NodeId, selector: &str) -> Result<Option<NodeId>> {
		let selector = SelectorList::parse(selector)?;
		let tree = self.0.borrow();
		tree.element(*root)?;
		Ok(tree.descendants(*root).into_iter().find(|&id| selector.matches(&tree, id)))
	}

	fn query_selector_all(&self, root: &NodeId, selector: &str) -> Result<Vec<NodeId>> {
		let selector = SelectorList::parse(selector)?;
		let tree = self.0.borrow();
		tree.element(*root)?;
		Ok(tree.descendants(*root).into_iter().filter(|&id| selector.matches(&tree, id)).collect())
	}

	fn add_listener(&self, handle: &NodeId, event: &str, listener: &MemoryListener) -> Result<()> {
		let mut tree = self.0.borrow_mut();
		let listeners = &mut tree.element_mut(*handle)?.listeners;
		if !listeners.iter().any(|(name, existing)| name == event && existing == listener) {
			listeners.push((event.to_owned(), listener.clone()))
		}
		Ok(())
	}

	fn remove_listener(&self, handle: &NodeId, event: &str, listener: &MemoryListener) -> Result<()> {
		self.0.borrow_mut().element_mut(*handle)?.listeners.retain(|(name, existing)| !(name == event && existing == listener));
		Ok(())
	}

	fn offset_size(&self, handle: &NodeId) -> (i32, i32) {
		self.0.borrow().get(*handle).map_or((0, 0), |element| element.offset_size)
	}

	fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Result<MemoryTimer> {
		let mut tree = self.0.borrow_mut();
		let timer = MemoryTimer(tree.next_timer);
		tree.next_timer += 1;
		let due = tree.now + delay;
		tree.scheduled.push(Scheduled { timer, due, callback });
		Ok(timer)
	}

	fn cancel(&self, timer: &MemoryTimer) {
		self.0.borrow_mut().scheduled.retain(|scheduled| scheduled.timer != *timer);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::cell::Cell;

	fn tree() -> (MemoryHost, NodeId, NodeId, NodeId) {
		let host = MemoryHost::new();
		let root = host.document_root().unwrap();
		let list = host.create_element("ul").unwrap();
		let item = host.create_element("li").unwrap();
		host.append_child(&root, &list).unwrap();
		host.append_child(&list, &item).unwrap();
		(host, root, list, item)
	}

	#[test]
	fn class_list_lives_in_the_class_attribute() {
		let (host, _, list, _) = tree();
		host.add_class(&list, "a").unwrap();
		host.add_class(&list, "b").unwrap();
		host.add_class(&list, "a").unwrap();
		assert_eq!(host.class_name(&list), "a b");
		assert_eq!(host.attributes(&list), [("class".to_owned(), "a b".to_owned())]);

		host.remove_class(&list, "a").unwrap();
		assert_eq!(host.class_name(&list), "b");
		assert!(!host.contains_class(&list, "a"));
	}

	#[test]
	fn class_tokens_are_validated() {
		let (host, _, list, _) = tree();
		assert!(matches!(host.add_class(&list, ""), Err(Error::InvalidToken { .. })));
		assert!(matches!(host.add_class(&list, "a b"), Err(Error::InvalidToken { .. })));
		assert!(!host.contains_class(&list, ""));
	}

	#[test]
	fn append_rejects_cycles_and_moves_children() {
		let (host, root, list, item) = tree();
		assert!(host.append_child(&item, &list).is_err());
		assert!(host.append_child(&list, &list).is_err());

		host.append_child(&root, &item).unwrap();
		assert_eq!(host.parent(&item), Some(root));
		assert!(host.children(list).unwrap().is_empty());
	}

	#[test]
	fn remove_child_requires_the_actual_parent() {
		let (host, root, list, item) = tree();
		assert!(host.remove_child(&root, &item).is_err());
		host.remove_child(&list, &item).unwrap();
		assert_eq!(host.parent(&item), None);
	}

	#[test]
	fn queries_are_scoped_but_match_against_full_ancestry() {
		let (host, root, list, item) = tree();
		host.set_attribute(&list, "id", "menu").unwrap();
		let second = host.create_element("li").unwrap();
		host.append_child(&list, &second).unwrap();

		assert_eq!(host.query_selector_all(&list, "#menu > li").unwrap(), [item, second]);
		assert!(host.query_selector_all(&list, "ul").unwrap().is_empty());
		assert_eq!(host.query_selector(&root, "li").unwrap(), Some(item));
		assert!(host.query_selector_all(&root, "* > ul").unwrap().is_empty());
		assert!(host.query_selector(&root, "li >").is_err());
	}

	#[test]
	fn deep_and_shallow_clones() {
		let (host, _, list, _) = tree();
		host.set_text_content(&list, Some("ignored")).unwrap();
		let item = host.create_element("li").unwrap();
		host.append_child(&list, &item).unwrap();
		host.add_class(&list, "menu").unwrap();

		let shallow = host.clone_node(&list, false).unwrap();
		assert_eq!(host.class_name(&shallow), "menu");
		assert!(host.children(shallow).unwrap().is_empty());
		assert_eq!(host.parent(&shallow), None);

		let deep = host.clone_node(&list, true).unwrap();
		let copied = host.children(deep).unwrap();
		assert_eq!(copied.len(), 1);
		assert_ne!(copied[0], item);
		assert_eq!(host.tag_name(copied[0]).unwrap(), "li");
	}

	#[test]
	fn dispatch_bubbles() {
		let (host, root, list, item) = tree();
		let seen = Rc::new(RefCell::new(Vec::new()));
		let listener = MemoryListener::new({
			let seen = Rc::clone(&seen);
			move |event| seen.borrow_mut().push((event.target, event.current_target))
		});
		host.add_listener(&item, "click", &listener).unwrap();
		host.add_listener(&item, "click", &listener).unwrap();
		host.add_listener(&root, "click", &listener).unwrap();

		assert_eq!(host.dispatch(item, "click").unwrap(), 2);
		assert_eq!(*seen.borrow(), [(item, item), (item, root)]);

		host.remove_listener(&item, "click", &MemoryListener::new(|_| ())).unwrap();
		host.remove_listener(&root, "click", &listener.clone()).unwrap();
		assert_eq!(host.dispatch(list, "click").unwrap(), 0);
		assert_eq!(host.dispatch(item, "click").unwrap(), 1);
	}

	#[test]
	fn timers_run_in_due_order_and_can_be_cancelled() {
		let host = MemoryHost::new();
		let order = Rc::new(RefCell::new(Vec::new()));
		let push = |label: &'static str| {
			let order = Rc::clone(&order);
			Box::new(move || order.borrow_mut().push(label)) as Box<dyn FnOnce()>
		};

		host.schedule(Duration::from_millis(30), push("late")).unwrap();
		host.schedule(Duration::from_millis(10), push("early")).unwrap();
		let cancelled = host.schedule(Duration::from_millis(20), push("cancelled")).unwrap();
		host.cancel(&cancelled);

		host.advance(Duration::from_millis(15));
		assert_eq!(*order.borrow(), ["early"]);
		assert_eq!(host.now(), Duration::from_millis(15));
		assert_eq!(host.pending_timers(), 1);

		host.advance(Duration::from_millis(15));
		assert_eq!(*order.borrow(), ["early", "late"]);
		assert_eq!(host.pending_timers(), 0);
	}

	#[test]
	fn timers_scheduled_while_advancing_can_fire_in_the_same_call() {
		let host = MemoryHost::new();
		let fired = Rc::new(Cell::new(false));
		host.schedule(Duration::from_millis(5), {
			let host = host.clone();
			let fired = Rc::clone(&fired);
			Box::new(move || {
				host.schedule(Duration::from_millis(5), Box::new(move || fired.set(true))).unwrap();
			})
		})
		.unwrap();

		host.advance(Duration::from_millis(10));
		assert!(fired.get());
	}
}
