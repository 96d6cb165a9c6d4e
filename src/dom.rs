use crate::{Collection, ElementOptions, Host, Node, Result};
use tracing::instrument;

/// Entry point bound to one [`Host`].
///
/// This is the only place where queries default to the whole document.
/// [`Node`] and [`Collection`] always take an explicit scope.
#[derive(Debug, Clone)]
pub struct Dom<H: Host> {
	host: H,
}

impl<H: Host> Dom<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self { host }
	}

	#[must_use]
	pub fn host(&self) -> &H {
		&self.host
	}

	/// Creates a detached element with `classes` and `attributes` but no content.
	///
	/// # Errors
	///
	/// See [`Node::create`].
	pub fn element<C, A, K, V>(&self, tag: &str, classes: C, attributes: A) -> Result<Node<H>>
	where
		C: IntoIterator,
		C::Item: Into<String>,
		A: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let options = attributes
			.into_iter()
			.fold(ElementOptions::new().classes(classes), |options, (name, value)| options.attribute(name, value));
		Node::create(&self.host, tag, options)
	}

	/// # Errors
	///
	/// See [`Node::create`].
	pub fn create(&self, tag: &str, options: ElementOptions) -> Result<Node<H>> {
		Node::create(&self.host, tag, options)
	}

	/// Wraps an existing element.
	#[must_use]
	pub fn adopt(&self, live: H::Handle) -> Node<H> {
		Node::adopt(&self.host, live)
	}

	/// Adopts every element in the document that matches `selector`.
	///
	/// # Errors
	///
	/// Iff there is no document root or the host rejects `selector`.
	#[instrument(skip(self))]
	pub fn select(&self, selector: &str) -> Result<Collection<H>> {
		let root = self.host.document_root()?;
		Collection::select(&self.host, &root, selector)
	}

	/// Adopts the first element in the document that matches `selector`.
	///
	/// # Errors
	///
	/// Iff there is no document root or the host rejects `selector`.
	#[instrument(skip(self))]
	pub fn select_one(&self, selector: &str) -> Result<Option<Node<H>>> {
		let root = self.host.document_root()?;
		let found = self.host.query_selector(&root, selector)?;
		Ok(Node::adopt_optional(&self.host, found))
	}
}
