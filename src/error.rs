use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failures surfaced by a [`Host`](`crate::Host`) primitive.
///
/// Disagreement between a [`Node`](`crate::Node`)'s cached mirror and its live element is **not** an error.
/// Those cases are handled by the no-op rules documented on each mutating method.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
	/// The host rejected `operation`. `message` is the host's own description of the failure.
	#[error("{operation} failed: {message}")]
	Host { operation: &'static str, message: String },

	/// Tried to detach an element that currently has no parent.
	#[error("element is not attached to a parent")]
	Detached,

	/// The host refuses `token` as a class name.
	#[error("invalid class token {token:?}: {reason}")]
	InvalidToken { token: String, reason: &'static str },

	/// The handle does not refer to an element known to the host.
	#[error("unknown element handle")]
	UnknownNode,
}

impl Error {
	pub(crate) fn host(operation: &'static str, message: impl Into<String>) -> Self {
		Self::Host {
			operation,
			message: message.into(),
		}
	}
}
