//! The capability boundary between [`Node`](`crate::Node`)s and the platform that owns the live element tree.
//!
//! A [`Host`] is expected to be a cheap handle (a unit struct or a reference-counted pointer).
//! Wrappers clone it freely, including into scheduled callbacks.

use crate::Result;
use core::{fmt::Debug, time::Duration};

/// Primitives a live element tree has to provide.
///
/// Listeners are always registered non-capturing.
/// Query results are in document order and never include the root itself.
pub trait Host: Clone + 'static {
	/// Reference to one live element. Cloning it must not duplicate the element.
	type Handle: Clone + PartialEq + Debug + 'static;
	/// Event listener. [`Host::remove_listener`] matches by identity.
	type Listener;
	/// Token identifying a scheduled callback.
	type Timer: Debug + 'static;

	// Lifecycle

	fn create_element(&self, tag: &str) -> Result<Self::Handle>;
	fn set_text_content(&self, handle: &Self::Handle, text: Option<&str>) -> Result<()>;
	fn parent(&self, handle: &Self::Handle) -> Option<Self::Handle>;
	fn append_child(&self, parent: &Self::Handle, child: &Self::Handle) -> Result<()>;
	fn remove_child(&self, parent: &Self::Handle, child: &Self::Handle) -> Result<()>;
	fn clone_node(&self, handle: &Self::Handle, deep: bool) -> Result<Self::Handle>;

	/// The default query scope for the outermost call boundary (see [`Dom`](`crate::Dom`)).
	fn document_root(&self) -> Result<Self::Handle>;

	// Class set

	/// The raw, whitespace-separated class string.
	fn class_name(&self, handle: &Self::Handle) -> String;
	fn add_class(&self, handle: &Self::Handle, name: &str) -> Result<()>;
	fn remove_class(&self, handle: &Self::Handle, name: &str) -> Result<()>;
	fn contains_class(&self, handle: &Self::Handle, name: &str) -> bool;

	// Attributes

	fn set_attribute(&self, handle: &Self::Handle, name: &str, value: &str) -> Result<()>;
	fn remove_attribute(&self, handle: &Self::Handle, name: &str) -> Result<()>;
	fn has_attribute(&self, handle: &Self::Handle, name: &str) -> bool;
	/// All attributes currently present, as `(name, value)` in host order.
	fn attributes(&self, handle: &Self::Handle) -> Vec<(String, String)>;

	// Query

	fn query_selector(&self, root: &Self::Handle, selector: &str) -> Result<Option<Self::Handle>>;
	fn query_selector_all(&self, root: &Self::Handle, selector: &str) -> Result<Vec<Self::Handle>>;

	// Events

	fn add_listener(&self, handle: &Self::Handle, event: &str, listener: &Self::Listener) -> Result<()>;
	fn remove_listener(&self, handle: &Self::Handle, event: &str, listener: &Self::Listener) -> Result<()>;

	// Geometry

	/// Rendered `(width, height)`.
	fn offset_size(&self, handle: &Self::Handle) -> (i32, i32);

	// Timer

	/// Runs `callback` once after `delay`.
	fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Result<Self::Timer>;
	/// Prevents a scheduled callback from running. Cancelling a timer that already fired is a no-op.
	fn cancel(&self, timer: &Self::Timer);
}
