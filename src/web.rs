//! The browser [`Host`], backed by [`web_sys`].
//!
//! [***JavaScript***](https://developer.mozilla.org/en-US/docs/Web/JavaScript) exceptions thrown by DOM calls are returned as [`Error::Host`],
//! carrying the `Debug` rendering of the thrown value.

use crate::{Error, Host, Insertable, Result};
use core::{convert::TryFrom, time::Duration};
use js_sys::Function;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement, Window};

impl Insertable<WebHost> for Element {
	fn live_handle(&self) -> &Element {
		self
	}
}

/// Token of a [`Window`] timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeoutHandle(i32);

fn thrown(operation: &'static str) -> impl FnOnce(JsValue) -> Error {
	move |error| Error::host(operation, format!("{:?}", error))
}

/// [`Host`] for a browser [***Document***](https://developer.mozilla.org/en-US/docs/Web/API/Document).
///
/// Listeners are plain [`Function`]s, so [`Host::remove_listener`] needs the same [`Function`] object that was registered.
#[derive(Debug, Clone)]
pub struct WebHost {
	window: Window,
	document: Document,
}

impl WebHost {
	/// Binds to the global `window` and its `document`.
	///
	/// # Errors
	///
	/// Iff there is no global window or it has no document (for example in a worker).
	pub fn new() -> Result<Self> {
		let window = web_sys::window().ok_or_else(|| Error::host("window", "no global `window` exists"))?;
		let document = window.document().ok_or_else(|| Error::host("window.document", "the window has no document"))?;
		Ok(Self { window, document })
	}

	#[must_use]
	pub fn with_document(window: Window, document: Document) -> Self {
		Self { window, document }
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

impl Host for WebHost {
	type Handle = Element;
	type Listener = Function;
	type Timer = TimeoutHandle;

	fn create_element(&self, tag: &str) -> Result<Element> {
		self.document.create_element(tag).map_err(thrown("createElement"))
	}

	fn set_text_content(&self, handle: &Element, text: Option<&str>) -> Result<()> {
		handle.set_text_content(text);
		Ok(())
	}

	fn parent(&self, handle: &Element) -> Option<Element> {
		handle.parent_element()
	}

	fn append_child(&self, parent: &Element, child: &Element) -> Result<()> {
		parent.append_child(child).map(drop).map_err(thrown("appendChild"))
	}

	fn remove_child(&self, parent: &Element, child: &Element) -> Result<()> {
		parent.remove_child(child).map(drop).map_err(thrown("removeChild"))
	}

	fn clone_node(&self, handle: &Element, deep: bool) -> Result<Element> {
		handle
			.clone_node_with_deep(deep)
			.map_err(thrown("cloneNode"))?
			.dyn_into::<Element>()
			.map_err(|node| Error::host("cloneNode", format!("the copy is not an element: {:?}", node)))
	}

	fn document_root(&self) -> Result<Element> {
		self.document
			.document_element()
			.ok_or_else(|| Error::host("document.documentElement", "the document has no root element"))
	}

	fn class_name(&self, handle: &Element) -> String {
		handle.class_name()
	}

	fn add_class(&self, handle: &Element, name: &str) -> Result<()> {
		handle.class_list().add_1(name).map_err(thrown("classList.add"))
	}

	fn remove_class(&self, handle: &Element, name: &str) -> Result<()> {
		handle.class_list().remove_1(name).map_err(thrown("classList.remove"))
	}

	fn contains_class(&self, handle: &Element, name: &str) -> bool {
		handle.class_list().contains(name)
	}

	fn set_attribute(&self, handle: &Element, name: &str, value: &str) -> Result<()> {
		handle.set_attribute(name, value).map_err(thrown("setAttribute"))
	}

	fn remove_attribute(&self, handle: &Element, name: &str) -> Result<()> {
		handle.remove_attribute(name).map_err(thrown("removeAttribute"))
	}

	fn has_attribute(&self, handle: &Element, name: &str) -> bool {
		handle.has_attribute(name)
	}

	fn attributes(&self, handle: &Element) -> Vec<(String, String)> {
		let attributes = handle.attributes();
		(0..attributes.length())
			.filter_map(|i| attributes.item(i))
			.map(|attribute| (attribute.name(), attribute.value()))
			.collect()
	}

	fn query_selector(&self, root: &Element, selector: &str) -> Result<Option<Element>> {
		root.query_selector(selector).map_err(thrown("querySelector"))
	}

	fn query_selector_all(&self, root: &Element, selector: &str) -> Result<Vec<Element>> {
		let found = root.query_selector_all(selector).map_err(thrown("querySelectorAll"))?;
		Ok((0..found.length())
			.filter_map(|i| found.get(i))
			.filter_map(|node| match node.dyn_into::<Element>() {
				Ok(element) => Some(element),
				Err(node) => {
					warn!("Skipping non-element query result: {:?}", node);
					None
				}
			})
			.collect())
	}

	fn add_listener(&self, handle: &Element, event: &str, listener: &Function) -> Result<()> {
		handle
			.add_event_listener_with_callback_and_bool(event, listener, false)
			.map_err(thrown("addEventListener"))
	}

	fn remove_listener(&self, handle: &Element, event: &str, listener: &Function) -> Result<()> {
		handle
			.remove_event_listener_with_callback_and_bool(event, listener, false)
			.map_err(thrown("removeEventListener"))
	}

	fn offset_size(&self, handle: &Element) -> (i32, i32) {
		match handle.dyn_ref::<HtmlElement>() {
			Some(html_element) => (html_element.offset_width(), html_element.offset_height()),
			None => (handle.client_width(), handle.client_height()),
		}
	}

	fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> Result<TimeoutHandle> {
		let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
		// Frees itself once called. Cancelled callbacks are leaked.
		let closure = Closure::once_into_js(move || callback());
		let handle = self
			.window
			.set_timeout_with_callback_and_timeout_and_arguments_0(closure.unchecked_ref(), millis)
			.map_err(thrown("setTimeout"))?;
		trace!("Scheduled timeout {} in {}ms.", handle, millis);
		Ok(TimeoutHandle(handle))
	}

	fn cancel(&self, timer: &TimeoutHandle) {
		self.window.clear_timeout_with_handle(timer.0)
	}
}
