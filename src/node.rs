use crate::{Collection, Error, Host, Removal, Result};
use core::{
	cell::{Ref, RefCell},
	fmt::{self, Debug, Formatter},
	time::Duration,
};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{error, instrument, trace, trace_span};

/// Anything that can stand in for a live element as an insertion target or child:
/// a wrapped [`Node`] or one of the host's raw handles.
pub trait Insertable<H: Host> {
	fn live_handle(&self) -> &H::Handle;
}

/// Anything a [`Collection`] can hold after normalisation.
///
/// A raw handle comes paired with its host and is adopted (see [`Node::adopt`]).
/// [`Node`]s are taken as they are.
pub trait IntoNode<H: Host> {
	fn into_node(self) -> Node<H>;
}

impl<H: Host> Insertable<H> for Node<H> {
	fn live_handle(&self) -> &H::Handle {
		&self.live
	}
}

impl<H: Host> IntoNode<H> for Node<H> {
	fn into_node(self) -> Node<H> {
		self
	}
}

impl<'a, H: Host> IntoNode<H> for (&'a H, H::Handle) {
	fn into_node(self) -> Node<H> {
		Node::adopt(self.0, self.1)
	}
}

/// Creation parameters for [`Node::create`].
///
/// Classes and attributes are applied in the order they were given.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ElementOptions {
	pub classes: Vec<String>,
	pub content: Option<String>,
	pub attributes: Vec<(String, String)>,
}

impl ElementOptions {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	#[must_use]
	pub fn class(mut self, name: impl Into<String>) -> Self {
		self.classes.push(name.into());
		self
	}

	#[must_use]
	pub fn classes<I>(mut self, names: I) -> Self
	where
		I: IntoIterator,
		I::Item: Into<String>,
	{
		self.classes.extend(names.into_iter().map(Into::into));
		self
	}

	#[must_use]
	pub fn content(mut self, text: impl Into<String>) -> Self {
		self.content = Some(text.into());
		self
	}

	#[must_use]
	pub fn attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.attributes.push((name.into(), value.into()));
		self
	}
}

/// The cached view of an element's state.
///
/// This may be stale: class membership and attribute presence queries on [`Node`] always consult the live element.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Mirror {
	tag: Option<String>,
	classes: Vec<String>,
	attributes: HashMap<String, String>,
}

impl Mirror {
	/// Only set for elements made through [`Node::create`].
	#[must_use]
	pub fn tag(&self) -> Option<&str> {
		self.tag.as_deref()
	}

	/// Distinct class names, in insertion order.
	#[must_use]
	pub fn classes(&self) -> &[String] {
		&self.classes
	}

	#[must_use]
	pub fn attributes(&self) -> &HashMap<String, String> {
		&self.attributes
	}

	fn has_class(&self, name: &str) -> bool {
		self.classes.iter().any(|class| class == name)
	}

	/// An empty value does not count as set.
	fn has_attribute_value(&self, name: &str) -> bool {
		self.attributes.get(name).map_or(false, |value| !value.is_empty())
	}
}

/// A live element plus a [`Mirror`] of its classes and attributes.
///
/// Every mutating method is synchronous, except for the deferred half of [`Node::remove`],
/// and returns `&Self` so that calls can be chained with `?`.
///
/// # Idempotence
///
/// The class and attribute mutators check both the mirror and the live element first
/// and do nothing if either already satisfies the request:
///
/// - [`add_class`](`Node::add_class`) skips classes present in the mirror **or** on the live element.
/// - [`remove_class`](`Node::remove_class`) skips classes absent from the mirror **or** from the live element.
/// - [`set_attribute`](`Node::set_attribute`) is set-once: it skips names with a non-empty mirror value
///   **or** present on the live element. Remove the attribute first to change it.
/// - [`remove_attribute`](`Node::remove_attribute`) skips names without a non-empty mirror value
///   **or** absent from the live element.
pub struct Node<H: Host> {
	host: H,
	live: H::Handle,
	mirror: Rc<RefCell<Mirror>>,
}

impl<H: Host> Debug for Node<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Node").field("live", &self.live).field("mirror", &*self.mirror.borrow()).finish()
	}
}

impl<H: Host> Node<H> {
	/// Creates a new live element of kind `tag` and wraps it.
	///
	/// The element is not attached anywhere. Each call creates a distinct element;
	/// there is no way to re-run creation on an existing [`Node`].
	///
	/// # Errors
	///
	/// Iff the host refuses the tag, the content, a class token or an attribute.
	#[instrument(skip(host, options))]
	pub fn create(host: &H, tag: &str, options: ElementOptions) -> Result<Self> {
		let ElementOptions { classes, content, attributes } = options;

		let live = host.create_element(tag)?;
		if content.is_some() {
			host.set_text_content(&live, content.as_deref())?;
		}

		let mut mirror = Mirror {
			tag: Some(tag.to_owned()),
			classes: Vec::with_capacity(classes.len()),
			attributes: HashMap::with_capacity(attributes.len()),
		};
		for class in classes {
			host.add_class(&live, &class)?;
			if !mirror.has_class(&class) {
				mirror.classes.push(class)
			}
		}
		for (name, value) in attributes {
			host.set_attribute(&live, &name, &value)?;
			mirror.attributes.insert(name, value);
		}
		sync_class_attribute(host, &live, &mut mirror);

		trace!("Created <{}> with {} class(es) and {} attribute(s).", tag, mirror.classes.len(), mirror.attributes.len());
		Ok(Self {
			host: host.clone(),
			live,
			mirror: Rc::new(RefCell::new(mirror)),
		})
	}

	/// Wraps an existing live element, reading its current classes and attributes into a fresh mirror.
	#[must_use]
	pub fn adopt(host: &H, live: H::Handle) -> Self {
		let class_name = host.class_name(&live);
		let mut classes = Vec::new();
		for class in class_name.split_ascii_whitespace() {
			if !classes.iter().any(|existing| existing == class) {
				classes.push(class.to_owned())
			}
		}
		let attributes = host.attributes(&live).into_iter().collect();

		Self {
			host: host.clone(),
			live,
			mirror: Rc::new(RefCell::new(Mirror { tag: None, classes, attributes })),
		}
	}

	/// [`Node::adopt`], passing through a missing handle.
	#[must_use]
	pub fn adopt_optional(host: &H, live: Option<H::Handle>) -> Option<Self> {
		live.map(|live| Self::adopt(host, live))
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	/// The raw live handle.
	#[must_use]
	pub fn live(&self) -> &H::Handle {
		&self.live
	}

	/// The cached state. Don't hold on to this across mutating calls.
	#[must_use]
	pub fn mirror(&self) -> Ref<'_, Mirror> {
		self.mirror.borrow()
	}

	#[must_use]
	pub fn tag(&self) -> Option<String> {
		self.mirror.borrow().tag.clone()
	}

	#[must_use]
	pub fn classes(&self) -> Ref<'_, [String]> {
		Ref::map(self.mirror.borrow(), |mirror| mirror.classes.as_slice())
	}

	#[must_use]
	pub fn attributes(&self) -> Ref<'_, HashMap<String, String>> {
		Ref::map(self.mirror.borrow(), |mirror| &mirror.attributes)
	}

	/// # Errors
	///
	/// Iff the host refuses `name` as a class token.
	#[instrument(skip(self))]
	pub fn add_class(&self, name: &str) -> Result<&Self> {
		add_class(&self.host, &self.live, &self.mirror, name)?;
		Ok(self)
	}

	/// # Errors
	///
	/// Iff the host refuses `name` as a class token.
	#[instrument(skip(self))]
	pub fn remove_class(&self, name: &str) -> Result<&Self> {
		remove_class(&self.host, &self.live, &self.mirror, name)?;
		Ok(self)
	}

	/// Checks the live element, not the mirror.
	#[must_use]
	pub fn has_class(&self, name: &str) -> bool {
		self.host.contains_class(&self.live, name)
	}

	/// # Errors
	///
	/// Iff the host refuses the attribute name or value.
	#[cfg_attr(feature = "dangerous-logging", instrument(skip(self)))]
	#[cfg_attr(not(feature = "dangerous-logging"), instrument(skip(self, value)))]
	pub fn set_attribute(&self, name: &str, value: &str) -> Result<&Self> {
		if self.mirror.borrow().has_attribute_value(name) || self.has_attribute(name) {
			trace!("Attribute already set. Skipping.");
			return Ok(self);
		}
		self.host.set_attribute(&self.live, name, value)?;
		self.mirror.borrow_mut().attributes.insert(name.to_owned(), value.to_owned());
		Ok(self)
	}

	/// # Errors
	///
	/// Iff the host refuses to remove the attribute.
	#[instrument(skip(self))]
	pub fn remove_attribute(&self, name: &str) -> Result<&Self> {
		if !self.mirror.borrow().has_attribute_value(name) || !self.has_attribute(name) {
			trace!("Attribute not set. Skipping.");
			return Ok(self);
		}
		self.host.remove_attribute(&self.live, name)?;
		self.mirror.borrow_mut().attributes.remove(name);
		Ok(self)
	}

	/// Checks the live element, not the mirror.
	#[must_use]
	pub fn has_attribute(&self, name: &str) -> bool {
		self.host.has_attribute(&self.live, name)
	}

	/// Detaches the element, either right away (for a zero `delay`) or after `delay`.
	///
	/// For a non-zero `delay`, `class_name` (if any) is added right away (through [`Node::add_class`])
	/// and removed again once the element has been detached.
	/// The returned [`Removal`] can cancel the deferred half. Dropping it does not.
	///
	/// Calling this again while a removal is pending schedules a second, independent one.
	///
	/// # Errors
	///
	/// For a zero `delay`, iff the element has no parent.
	/// Otherwise iff `class_name` is refused by the host or the host can't schedule the callback.
	/// Failures while the deferred callback runs are logged.
	#[instrument(skip(self))]
	pub fn remove(&self, delay: Duration, class_name: Option<&str>) -> Result<Removal<H>> {
		if delay == Duration::from_secs(0) {
			self.unbind_from_dom()?;
			return Ok(Removal::completed(self.host.clone()));
		}

		if let Some(class_name) = class_name {
			self.add_class(class_name)?;
		}

		let (removal, fired) = Removal::pending(self.host.clone());
		let host = self.host.clone();
		let live = self.live.clone();
		let mirror = Rc::clone(&self.mirror);
		let class_name = class_name.map(str::to_owned);
		let timer = self.host.schedule(
			delay,
			Box::new(move || {
				fired.set(true);
				let span = trace_span!("Timed removal", ?live, ?class_name);
				let _enter = span.enter();

				if let Err(error) = unbind(&host, &live) {
					return error!("Failed to detach element: {}", error);
				}
				if let Some(class_name) = class_name {
					if let Err(error) = remove_class(&host, &live, &mirror, &class_name) {
						error!("Failed to remove class {:?} after detaching: {}", class_name, error)
					}
				}
			}),
		)?;
		Ok(removal.with_timer(timer))
	}

	/// Detaches the element from its parent.
	///
	/// # Errors
	///
	/// [`Error::Detached`] iff the element has no parent. Otherwise iff the host refuses.
	#[instrument(skip(self))]
	pub fn unbind_from_dom(&self) -> Result<&Self> {
		unbind(&self.host, &self.live)?;
		Ok(self)
	}

	/// Appends this element to `target`.
	///
	/// # Errors
	///
	/// Iff the host refuses the insertion.
	#[instrument(skip(self, target))]
	pub fn insert_into(&self, target: &impl Insertable<H>) -> Result<&Self> {
		self.host.append_child(target.live_handle(), &self.live)?;
		Ok(self)
	}

	/// Appends `child` to this element.
	///
	/// # Errors
	///
	/// Iff the host refuses the insertion.
	#[instrument(skip(self, child))]
	pub fn append_child(&self, child: &impl Insertable<H>) -> Result<&Self> {
		self.host.append_child(&self.live, child.live_handle())?;
		Ok(self)
	}

	/// Registers a non-capturing listener for `event`.
	///
	/// # Errors
	///
	/// Iff the host refuses the listener.
	#[instrument(skip(self, listener))]
	pub fn on(&self, event: &str, listener: &H::Listener) -> Result<&Self> {
		self.host.add_listener(&self.live, event, listener)?;
		Ok(self)
	}

	/// Unregisters a listener previously registered with [`Node::on`]. Matches `listener` by identity.
	///
	/// # Errors
	///
	/// Iff the host refuses.
	#[instrument(skip(self, listener))]
	pub fn off(&self, event: &str, listener: &H::Listener) -> Result<&Self> {
		self.host.remove_listener(&self.live, event, listener)?;
		Ok(self)
	}

	/// Duplicates the live element (with its descendants iff `deep`) and adopts the copy.
	///
	/// The copy's mirror is derived from the copied element and shares nothing with this one.
	///
	/// # Errors
	///
	/// Iff the host can't clone the element.
	#[instrument(skip(self))]
	pub fn clone_node(&self, deep: bool) -> Result<Self> {
		let copy = self.host.clone_node(&self.live, deep)?;
		Ok(Self::adopt(&self.host, copy))
	}

	/// Adopts the first descendant matching `selector`.
	///
	/// # Errors
	///
	/// Iff the host rejects `selector`.
	#[instrument(skip(self))]
	pub fn qs(&self, selector: &str) -> Result<Option<Self>> {
		let found = self.host.query_selector(&self.live, selector)?;
		Ok(Self::adopt_optional(&self.host, found))
	}

	/// Adopts every descendant matching `selector`, in document order.
	///
	/// # Errors
	///
	/// Iff the host rejects `selector`.
	#[instrument(skip(self))]
	pub fn qsa(&self, selector: &str) -> Result<Collection<H>> {
		Collection::select(&self.host, &self.live, selector)
	}

	#[must_use]
	pub fn height(&self) -> i32 {
		self.host.offset_size(&self.live).1
	}

	#[must_use]
	pub fn width(&self) -> i32 {
		self.host.offset_size(&self.live).0
	}
}

fn add_class<H: Host>(host: &H, live: &H::Handle, mirror: &RefCell<Mirror>, name: &str) -> Result<()> {
	if mirror.borrow().has_class(name) || host.contains_class(live, name) {
		trace!("Class already present. Skipping.");
		return Ok(());
	}
	host.add_class(live, name)?;
	let mut mirror = mirror.borrow_mut();
	mirror.classes.push(name.to_owned());
	sync_class_attribute(host, live, &mut mirror);
	Ok(())
}

fn remove_class<H: Host>(host: &H, live: &H::Handle, mirror: &RefCell<Mirror>, name: &str) -> Result<()> {
	if !mirror.borrow().has_class(name) || !host.contains_class(live, name) {
		trace!("Class not present. Skipping.");
		return Ok(());
	}
	host.remove_class(live, name)?;
	let mut mirror = mirror.borrow_mut();
	mirror.classes.retain(|class| class != name);
	sync_class_attribute(host, live, &mut mirror);
	Ok(())
}

/// The `class` entry of the attribute mirror tracks the live class list whenever the element has one.
fn sync_class_attribute<H: Host>(host: &H, live: &H::Handle, mirror: &mut Mirror) {
	if host.has_attribute(live, "class") {
		mirror.attributes.insert("class".to_owned(), host.class_name(live));
	} else {
		mirror.attributes.remove("class");
	}
}

fn unbind<H: Host>(host: &H, live: &H::Handle) -> Result<()> {
	let parent = host.parent(live).ok_or(Error::Detached)?;
	host.remove_child(&parent, live)
}
