//! The document surface the runtime depends on.
//!
//! Everything the lifecycle needs from a document goes through [`Dom`], so the whole pipeline can run against
//! [`MemoryDocument`](`crate::memory::MemoryDocument`) in tests and against [`WebDom`](`crate::web::WebDom`) in a browser.

use crate::{Props, Result};
use std::rc::Weak;

/// Stable identity of a node within one [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

/// Receives the platform's custom element reactions for defined tags.
///
/// Implementations must tolerate notifications for nodes they already know about,
/// since a [`Dom`] may report insertions the runtime caused itself.
pub trait ElementCallbacks<N> {
	/// `node` was inserted into the document.
	fn connected(&self, node: &N) -> Result<()>;

	/// `node` was removed from the document.
	fn disconnected(&self, node: &N) -> Result<()>;
}

/// A document the runtime can render into.
///
/// Methods take `&self`: implementations use interior mutability and must not hold internal borrows while invoking
/// [`ElementCallbacks`], as those re-enter the runtime and through it the document.
pub trait Dom {
	type Node: Clone + core::fmt::Debug;

	/// Returns the same key for the same node for as long as this document lives.
	fn key(&self, node: &Self::Node) -> NodeKey;

	fn create_element(&self, tag_name: &str) -> Result<Self::Node>;

	/// Parses `markup` into detached top-level nodes.
	fn parse_fragment(&self, markup: &str) -> Result<Vec<Self::Node>>;

	/// Lowercase local name, or [`None`] for non-element nodes.
	fn tag_name(&self, node: &Self::Node) -> Option<String>;

	fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

	/// All attributes in source order.
	fn attributes(&self, node: &Self::Node) -> Vec<(String, String)>;

	fn get_attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<()>;

	/// Replaces all children of `parent` with `children` in one step.
	///
	/// No observer may see the old and new content side by side, or `parent` empty in between.
	fn replace_children(&self, parent: &Self::Node, children: Vec<Self::Node>) -> Result<()>;

	fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<()>;

	fn text_content(&self, node: &Self::Node) -> String;

	fn set_text_content(&self, node: &Self::Node, text: &str) -> Result<()>;

	fn is_connected(&self, node: &Self::Node) -> bool;

	fn head(&self) -> Result<Self::Node>;

	fn is_defined(&self, tag_name: &str) -> bool;

	/// Attaches the props of an API-constructed host to the node itself, so they live exactly as long as it does.
	fn set_initial_props(&self, node: &Self::Node, props: &Props) -> Result<()>;

	fn initial_props(&self, node: &Self::Node) -> Option<Props>;

	fn take_initial_props(&self, node: &Self::Node) -> Option<Props>;

	/// Defines `tag_name` as a custom element that reports to `callbacks`.
	///
	/// Elements of that tag that are already connected are upgraded, that is reported as connected in document order,
	/// before this method returns.
	fn define(&self, tag_name: &str, callbacks: Weak<dyn ElementCallbacks<Self::Node>>) -> Result<()>;
}
