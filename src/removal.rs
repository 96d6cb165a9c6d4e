use crate::Host;
use core::{
	cell::Cell,
	fmt::{self, Debug, Formatter},
};
use std::rc::Rc;
use tracing::trace;

/// Returned by [`Node::remove`](`crate::Node::remove`).
///
/// Dropping a [`Removal`] does **not** cancel it. The deferred detach still happens unless [`Removal::cancel`] is called first.
#[must_use = "Dropping a `Removal` does not cancel it. Bind it to `_` if you don't need to cancel."]
pub struct Removal<H: Host> {
	host: H,
	timer: Option<H::Timer>,
	fired: Rc<Cell<bool>>,
}

impl<H: Host> Debug for Removal<H> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Removal").field("timer", &self.timer).field("fired", &self.fired.get()).finish()
	}
}

impl<H: Host> Removal<H> {
	/// An immediate removal, which has nothing left to do.
	pub(crate) fn completed(host: H) -> Self {
		Self {
			host,
			timer: None,
			fired: Rc::new(Cell::new(true)),
		}
	}

	/// A removal that is pending until the returned flag is set by the scheduled callback.
	pub(crate) fn pending(host: H) -> (Self, Rc<Cell<bool>>) {
		let fired = Rc::new(Cell::new(false));
		(
			Self {
				host,
				timer: None,
				fired: Rc::clone(&fired),
			},
			fired,
		)
	}

	pub(crate) fn with_timer(mut self, timer: H::Timer) -> Self {
		self.timer = Some(timer);
		self
	}

	/// Whether the deferred detach is still scheduled.
	#[must_use]
	pub fn is_pending(&self) -> bool {
		self.timer.is_some() && !self.fired.get()
	}

	/// Unschedules the deferred detach.
	///
	/// The class added by [`Node::remove`](`crate::Node::remove`) stays on the element.
	///
	/// Returns `false` if there was nothing left to cancel.
	pub fn cancel(&mut self) -> bool {
		match self.timer.take() {
			Some(timer) if !self.fired.get() => {
				self.host.cancel(&timer);
				trace!("Cancelled timed removal {:?}.", timer);
				true
			}
			_ => false,
		}
	}
}
