//! A thin wrapper around live DOM elements.
//!
//! A [`Node`] owns one live element and keeps a [`Mirror`] of its classes and attributes.
//! [`Collection`]s group [`Node`]s for bulk event binding and insertion.
//!
//! Everything the wrappers need from the platform goes through a [`Host`]:
//! [`web::WebHost`] for browsers and [`memory::MemoryHost`] for everything else.

#![doc(html_root_url = "https://docs.rs/dom-mirror/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod collection;
mod dom;
mod error;
mod host;
mod node;
mod removal;

pub mod memory;
#[cfg(feature = "web")]
pub mod web;

pub use collection::Collection;
pub use dom::Dom;
pub use error::{Error, Result};
pub use host::Host;
pub use node::{ElementOptions, Insertable, IntoNode, Mirror, Node};
pub use removal::Removal;
