//! An in-memory document with custom element reactions.
//!
//! [`MemoryDocument`] stands in for a browser document wherever there is none: in tests and headless rendering.
//! Defined tags get `connected`/`disconnected` notifications like custom elements do, delivered synchronously after each
//! mutation completes.
//!
//! Nodes are reference counted. Parents own their children and a detached subtree is freed as soon as the last
//! [`MemoryNode`] handle to it goes away.

use crate::{markup, Dom, ElementCallbacks, Error, NodeKey, Props, Result};
use core::{
	cell::{Cell, RefCell},
	fmt,
};
use hashbrown::HashMap;
use html5ever::{parse_document, tendril::TendrilSink};
use markup5ever_rcdom::{Handle, NodeData as ParsedData, RcDom};
use std::rc::{Rc, Weak};
use tracing::{error, trace};

/// Markup is parsed in the context of a `<body>`, like `innerHTML` on an ordinary element.
const FRAGMENT_PREAMBLE: &str = "<!DOCTYPE html><body>";

#[derive(Debug)]
enum NodeData {
	Document,
	Element {
		name: String,
		attributes: RefCell<Vec<(String, String)>>,
	},
	Text(String),
}

struct NodeInner {
	key: u64,
	data: NodeData,
	parent: RefCell<Weak<NodeInner>>,
	children: RefCell<Vec<MemoryNode>>,
	initial_props: RefCell<Option<Props>>,
	live: Rc<Cell<usize>>,
}

impl Drop for NodeInner {
	fn drop(&mut self) {
		self.live.set(self.live.get() - 1);
	}
}

/// A handle to a node of a [`MemoryDocument`]. Compares by identity.
#[derive(Clone)]
pub struct MemoryNode(Rc<NodeInner>);

impl PartialEq for MemoryNode {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

impl Eq for MemoryNode {}

impl fmt::Debug for MemoryNode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.0.data {
			NodeData::Document => write!(f, "#document"),
			NodeData::Element { name, .. } => write!(f, "<{}>#{}", name, self.0.key),
			NodeData::Text(_) => write!(f, "#text#{}", self.0.key),
		}
	}
}

impl MemoryNode {
	fn parent(&self) -> Option<MemoryNode> {
		self.0.parent.borrow().upgrade().map(MemoryNode)
	}

	fn element_name(&self) -> Option<&str> {
		match &self.0.data {
			NodeData::Element { name, .. } => Some(name),
			_ => None,
		}
	}

	fn is_connected(&self) -> bool {
		let mut node = self.clone();
		loop {
			if matches!(node.0.data, NodeData::Document) {
				return true;
			}
			match node.parent() {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn is_inclusive_ancestor_of(&self, other: &MemoryNode) -> bool {
		let mut node = other.clone();
		loop {
			if node == *self {
				return true;
			}
			match node.parent() {
				Some(parent) => node = parent,
				None => return false,
			}
		}
	}

	fn detach(&self) {
		if let Some(parent) = self.parent() {
			parent.0.children.borrow_mut().retain(|child| child != self);
		}
		*self.0.parent.borrow_mut() = Weak::new();
	}

	fn adopt(&self, child: &MemoryNode) {
		*child.0.parent.borrow_mut() = Rc::downgrade(&self.0);
		self.0.children.borrow_mut().push(child.clone());
	}

	/// `self` and all of its descendants, in tree order.
	fn inclusive_descendants(&self) -> Vec<MemoryNode> {
		let mut order = Vec::new();
		let mut stack = vec![self.clone()];
		while let Some(node) = stack.pop() {
			stack.extend(node.0.children.borrow().iter().rev().cloned());
			order.push(node);
		}
		order
	}

	fn has_class(&self, class_name: &str) -> bool {
		match &self.0.data {
			NodeData::Element { attributes, .. } => attributes
				.borrow()
				.iter()
				.any(|(name, value)| name == "class" && value.split_ascii_whitespace().any(|class| class == class_name)),
			_ => false,
		}
	}

	fn attribute(&self, name: &str) -> Option<String> {
		match &self.0.data {
			NodeData::Element { attributes, .. } => attributes.borrow().iter().find(|(n, _)| n == name).map(|(_, value)| value.clone()),
			_ => None,
		}
	}

	fn serialize_children(&self, out: &mut String) {
		for child in self.0.children.borrow().iter() {
			child.serialize(out);
		}
	}

	fn serialize(&self, out: &mut String) {
		match &self.0.data {
			NodeData::Document => self.serialize_children(out),
			NodeData::Text(text) => markup::escape_text(text, out),
			NodeData::Element { name, attributes } => {
				out.push('<');
				out.push_str(name);
				for (attribute, value) in attributes.borrow().iter() {
					out.push(' ');
					out.push_str(attribute);
					out.push_str("=\"");
					markup::escape_attribute(value, out);
					out.push('"');
				}
				out.push('>');
				if markup::is_raw_text(name) {
					for child in self.0.children.borrow().iter() {
						if let NodeData::Text(text) = &child.0.data {
							out.push_str(text);
						}
					}
					out.push_str("</");
					out.push_str(name);
					out.push('>');
				} else if !markup::is_void(name) {
					self.serialize_children(out);
					out.push_str("</");
					out.push_str(name);
					out.push('>');
				}
			}
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reaction {
	Connected,
	Disconnected,
}

type Callbacks = Weak<dyn ElementCallbacks<MemoryNode>>;

/// A document tree held in memory: `<html><head></head><body></body></html>`.
///
/// ```
/// use trellis_dom::memory::MemoryDocument;
///
/// let document = MemoryDocument::new();
/// document.set_inner_html(&document.body(), "<p class=a>one &amp; two</p>").unwrap();
/// assert_eq!(document.inner_html(&document.body()), r#"<p class="a">one &amp; two</p>"#);
/// assert_eq!(document.elements_by_class_name(&document.body(), "a").len(), 1);
/// ```
pub struct MemoryDocument {
	root: MemoryNode,
	head: MemoryNode,
	body: MemoryNode,
	definitions: RefCell<HashMap<String, Callbacks>>,
	next_key: Cell<u64>,
	live: Rc<Cell<usize>>,
}

impl Default for MemoryDocument {
	fn default() -> Self {
		Self::new()
	}
}

impl fmt::Debug for MemoryDocument {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryDocument")
			.field("nodes", &self.live.get())
			.field("defined", &self.definitions.borrow().keys().collect::<Vec<_>>())
			.finish()
	}
}

impl MemoryDocument {
	#[must_use]
	pub fn new() -> Self {
		let live = Rc::new(Cell::new(0));
		let next_key = Cell::new(0);
		let alloc = |data| allocate(&live, &next_key, data);

		let root = alloc(NodeData::Document);
		let html = alloc(element("html", Vec::new()));
		let head = alloc(element("head", Vec::new()));
		let body = alloc(element("body", Vec::new()));
		root.adopt(&html);
		html.adopt(&head);
		html.adopt(&body);

		Self {
			root,
			head,
			body,
			definitions: RefCell::new(HashMap::new()),
			next_key,
			live,
		}
	}

	#[must_use]
	pub fn root(&self) -> MemoryNode {
		self.root.clone()
	}

	#[must_use]
	pub fn body(&self) -> MemoryNode {
		self.body.clone()
	}

	#[must_use]
	pub fn head_element(&self) -> MemoryNode {
		self.head.clone()
	}

	/// How many nodes of this document are still alive, attached or not.
	#[must_use]
	pub fn node_count(&self) -> usize {
		self.live.get()
	}

	#[must_use]
	pub fn parent(&self, node: &MemoryNode) -> Option<MemoryNode> {
		node.parent()
	}

	pub fn create_text(&self, text: &str) -> MemoryNode {
		self.alloc(NodeData::Text(text.to_owned()))
	}

	/// Parses `markup` and replaces the children of `node` with the result.
	pub fn set_inner_html(&self, node: &MemoryNode, markup: &str) -> Result<()> {
		let children = self.parse_fragment(markup)?;
		self.replace_children(node, children)
	}

	#[must_use]
	pub fn inner_html(&self, node: &MemoryNode) -> String {
		let mut html = String::new();
		node.serialize_children(&mut html);
		html
	}

	#[must_use]
	pub fn outer_html(&self, node: &MemoryNode) -> String {
		let mut html = String::new();
		node.serialize(&mut html);
		html
	}

	pub fn remove_child(&self, parent: &MemoryNode, child: &MemoryNode) -> Result<()> {
		if child.parent().as_ref() != Some(parent) {
			return Err(Error::Dom(format!("{:?} is not a child of {:?}", child, parent)));
		}
		let reactions = self.reactions(child, Reaction::Disconnected);
		child.detach();
		self.react(reactions)
	}

	#[must_use]
	pub fn get_element_by_id(&self, id: &str) -> Option<MemoryNode> {
		self.root
			.inclusive_descendants()
			.into_iter()
			.find(|node| node.attribute("id").as_deref() == Some(id))
	}

	/// Descendants of `root` (exclusive) with the given tag, in tree order. `"*"` matches every element.
	#[must_use]
	pub fn elements_by_tag_name(&self, root: &MemoryNode, tag_name: &str) -> Vec<MemoryNode> {
		let tag_name = tag_name.to_ascii_lowercase();
		root.inclusive_descendants()
			.into_iter()
			.skip(1)
			.filter(|node| node.element_name().map_or(false, |name| tag_name == "*" || name == tag_name))
			.collect()
	}

	#[must_use]
	pub fn elements_by_class_name(&self, root: &MemoryNode, class_name: &str) -> Vec<MemoryNode> {
		root.inclusive_descendants().into_iter().skip(1).filter(|node| node.has_class(class_name)).collect()
	}

	fn alloc(&self, data: NodeData) -> MemoryNode {
		allocate(&self.live, &self.next_key, data)
	}

	/// Copies html5ever's tree below `body` into this document, without recursion.
	fn convert(&self, body: &Handle) -> Vec<MemoryNode> {
		let mut roots = Vec::new();
		let mut stack: Vec<(Handle, Option<MemoryNode>)> = body.children.borrow().iter().rev().map(|child| (Rc::clone(child), None)).collect();
		while let Some((handle, parent)) = stack.pop() {
			let node = match &handle.data {
				ParsedData::Text { contents } => self.alloc(NodeData::Text(contents.borrow().to_string())),
				ParsedData::Element { name, attrs, .. } => self.alloc(element(
					&name.local,
					attrs.borrow().iter().map(|attribute| (attribute.name.local.to_string(), attribute.value.to_string())).collect(),
				)),
				// Comments, doctypes and processing instructions aren't kept.
				_ => continue,
			};
			match &parent {
				Some(parent) => parent.adopt(&node),
				None => roots.push(node.clone()),
			}
			if matches!(handle.data, ParsedData::Element { .. }) {
				stack.extend(handle.children.borrow().iter().rev().map(|child| (Rc::clone(child), Some(node.clone()))));
			}
		}
		roots
	}

	/// Reactions for the defined elements in the subtree of `root`, if that subtree is (still) connected.
	fn reactions(&self, root: &MemoryNode, reaction: Reaction) -> Vec<(Callbacks, MemoryNode, Reaction)> {
		if !root.is_connected() {
			return Vec::new();
		}
		let definitions = self.definitions.borrow();
		if definitions.is_empty() {
			return Vec::new();
		}
		root.inclusive_descendants()
			.into_iter()
			.filter_map(|node| {
				let callbacks = definitions.get(node.element_name()?)?;
				Some((Weak::clone(callbacks), node, reaction))
			})
			.collect()
	}

	/// Delivers every reaction with no borrows held. The first error is returned once all were delivered.
	fn react(&self, reactions: Vec<(Callbacks, MemoryNode, Reaction)>) -> Result<()> {
		let mut first_error = None;
		for (callbacks, node, reaction) in reactions {
			let callbacks = match callbacks.upgrade() {
				Some(callbacks) => callbacks,
				None => continue,
			};
			trace!("Delivering {:?} for {:?}.", reaction, node);
			let result = match reaction {
				Reaction::Connected => callbacks.connected(&node),
				Reaction::Disconnected => callbacks.disconnected(&node),
			};
			if let Err(error) = result {
				if first_error.is_some() {
					error!("Another reaction failed: {}", error);
				}
				first_error.get_or_insert(error);
			}
		}
		first_error.map_or(Ok(()), Err)
	}
}

fn allocate(live: &Rc<Cell<usize>>, next_key: &Cell<u64>, data: NodeData) -> MemoryNode {
	let key = next_key.get() + 1;
	next_key.set(key);
	live.set(live.get() + 1);
	MemoryNode(Rc::new(NodeInner {
		key,
		data,
		parent: RefCell::new(Weak::new()),
		children: RefCell::new(Vec::new()),
		initial_props: RefCell::new(None),
		live: Rc::clone(live),
	}))
}

fn element(name: &str, attributes: Vec<(String, String)>) -> NodeData {
	NodeData::Element {
		name: name.to_ascii_lowercase(),
		attributes: RefCell::new(attributes),
	}
}

fn find_body(document: &Handle) -> Option<Handle> {
	let mut stack = vec![Rc::clone(document)];
	while let Some(handle) = stack.pop() {
		if let ParsedData::Element { name, .. } = &handle.data {
			if name.local.as_ref() == "body" {
				return Some(handle);
			}
		}
		stack.extend(handle.children.borrow().iter().rev().cloned());
	}
	None
}

impl Dom for MemoryDocument {
	type Node = MemoryNode;

	fn key(&self, node: &MemoryNode) -> NodeKey {
		NodeKey(node.0.key)
	}

	fn create_element(&self, tag_name: &str) -> Result<MemoryNode> {
		Ok(self.alloc(element(tag_name, Vec::new())))
	}

	fn parse_fragment(&self, markup: &str) -> Result<Vec<MemoryNode>> {
		let mut source = String::with_capacity(FRAGMENT_PREAMBLE.len() + markup.len());
		source.push_str(FRAGMENT_PREAMBLE);
		source.push_str(markup);

		let parsed = parse_document(RcDom::default(), Default::default()).one(source.as_str());
		let body = find_body(&parsed.document).ok_or_else(|| Error::Dom("html5ever produced no <body>".to_owned()))?;
		Ok(self.convert(&body))
	}

	fn tag_name(&self, node: &MemoryNode) -> Option<String> {
		node.element_name().map(str::to_owned)
	}

	fn children(&self, node: &MemoryNode) -> Vec<MemoryNode> {
		node.0.children.borrow().clone()
	}

	fn attributes(&self, node: &MemoryNode) -> Vec<(String, String)> {
		match &node.0.data {
			NodeData::Element { attributes, .. } => attributes.borrow().clone(),
			_ => Vec::new(),
		}
	}

	fn get_attribute(&self, node: &MemoryNode, name: &str) -> Option<String> {
		node.attribute(name)
	}

	fn set_attribute(&self, node: &MemoryNode, name: &str, value: &str) -> Result<()> {
		match &node.0.data {
			NodeData::Element { attributes, .. } => {
				let name = name.to_ascii_lowercase();
				let mut attributes = attributes.borrow_mut();
				match attributes.iter_mut().find(|(n, _)| *n == name) {
					Some((_, existing)) => *existing = value.to_owned(),
					None => attributes.push((name, value.to_owned())),
				}
				Ok(())
			}
			_ => Err(Error::Dom(format!("Can't set attribute `{}` on non-element {:?}", name, node))),
		}
	}

	fn replace_children(&self, parent: &MemoryNode, children: Vec<MemoryNode>) -> Result<()> {
		for child in &children {
			if child.is_inclusive_ancestor_of(parent) {
				return Err(Error::Dom(format!("Can't insert {:?} into its own subtree", child)));
			}
		}

		let old = parent.0.children.borrow().clone();
		let mut reactions = Vec::new();
		for child in &old {
			reactions.extend(self.reactions(child, Reaction::Disconnected));
		}
		for child in &children {
			if child.parent().as_ref() != Some(parent) {
				reactions.extend(self.reactions(child, Reaction::Disconnected));
			}
		}

		for child in &old {
			*child.0.parent.borrow_mut() = Weak::new();
		}
		parent.0.children.borrow_mut().clear();
		for child in &children {
			child.detach();
			parent.adopt(child);
		}

		for child in &children {
			reactions.extend(self.reactions(child, Reaction::Connected));
		}
		drop(old);
		self.react(reactions)
	}

	fn append_child(&self, parent: &MemoryNode, child: &MemoryNode) -> Result<()> {
		if child.is_inclusive_ancestor_of(parent) {
			return Err(Error::Dom(format!("Can't insert {:?} into its own subtree", child)));
		}
		let mut reactions = self.reactions(child, Reaction::Disconnected);
		child.detach();
		parent.adopt(child);
		reactions.extend(self.reactions(child, Reaction::Connected));
		self.react(reactions)
	}

	fn text_content(&self, node: &MemoryNode) -> String {
		node.inclusive_descendants()
			.iter()
			.filter_map(|node| match &node.0.data {
				NodeData::Text(text) => Some(text.as_str()),
				_ => None,
			})
			.collect()
	}

	fn set_text_content(&self, node: &MemoryNode, text: &str) -> Result<()> {
		let text_node = self.create_text(text);
		self.replace_children(node, vec![text_node])
	}

	fn is_connected(&self, node: &MemoryNode) -> bool {
		node.is_connected()
	}

	fn head(&self) -> Result<MemoryNode> {
		Ok(self.head.clone())
	}

	fn is_defined(&self, tag_name: &str) -> bool {
		self.definitions.borrow().contains_key(tag_name)
	}

	fn set_initial_props(&self, node: &MemoryNode, props: &Props) -> Result<()> {
		*node.0.initial_props.borrow_mut() = Some(props.clone());
		Ok(())
	}

	fn initial_props(&self, node: &MemoryNode) -> Option<Props> {
		node.0.initial_props.borrow().clone()
	}

	fn take_initial_props(&self, node: &MemoryNode) -> Option<Props> {
		node.0.initial_props.borrow_mut().take()
	}

	fn define(&self, tag_name: &str, callbacks: Weak<dyn ElementCallbacks<MemoryNode>>) -> Result<()> {
		{
			let mut definitions = self.definitions.borrow_mut();
			if definitions.contains_key(tag_name) {
				return Err(Error::Dom(format!("<{}> is already defined", tag_name)));
			}
			definitions.insert(tag_name.to_owned(), Weak::clone(&callbacks));
		}

		// Upgrade what's already in the document.
		let reactions = self
			.root
			.inclusive_descendants()
			.into_iter()
			.filter(|node| node.element_name() == Some(tag_name))
			.map(|node| (Weak::clone(&callbacks), node, Reaction::Connected))
			.collect::<Vec<_>>();
		trace!("Defined <{}>, upgrading {} element(s).", tag_name, reactions.len());
		self.react(reactions)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Default)]
	struct Recorder(RefCell<Vec<(&'static str, MemoryNode)>>);
	impl ElementCallbacks<MemoryNode> for Recorder {
		fn connected(&self, node: &MemoryNode) -> Result<()> {
			self.0.borrow_mut().push(("connected", node.clone()));
			Ok(())
		}

		fn disconnected(&self, node: &MemoryNode) -> Result<()> {
			self.0.borrow_mut().push(("disconnected", node.clone()));
			if node.attribute("class").as_deref() == Some("fails") {
				return Err(Error::Dom("refused".to_owned()));
			}
			Ok(())
		}
	}

	fn record(document: &MemoryDocument, tag_name: &str) -> Rc<Recorder> {
		let recorder = Rc::new(Recorder::default());
		document
			.define(tag_name, Rc::downgrade(&recorder) as Weak<dyn ElementCallbacks<MemoryNode>>)
			.unwrap();
		recorder
	}

	#[test]
	fn parse_and_serialize() {
		let document = MemoryDocument::new();
		document
			.set_inner_html(&document.body(), "<div class=\"bar\"><x-y a='1'>t</x-y><br></div><p>loose")
			.unwrap();
		assert_eq!(
			document.inner_html(&document.body()),
			r#"<div class="bar"><x-y a="1">t</x-y><br></div><p>loose</p>"#
		);
		assert_eq!(document.text_content(&document.body()), "tloose");
	}

	#[test]
	fn html_parsing_rules_apply() {
		let document = MemoryDocument::new();
		document.set_inner_html(&document.body(), "<a></b>x</a>y<!-- gone --><P Class=Q>&lt;&amp;&gt;</P>").unwrap();
		assert_eq!(document.inner_html(&document.body()), r#"<a>x</a>y<p class="Q">&lt;&amp;&gt;</p>"#);

		document.set_inner_html(&document.body(), "<style>a > b { }</style><p>").unwrap();
		assert_eq!(document.elements_by_tag_name(&document.body(), "style").len(), 1);
		assert_eq!(document.inner_html(&document.body()), "<style>a > b { }</style><p></p>");
	}

	#[test]
	fn malformed_attributes_before_non_ascii_text() {
		let document = MemoryDocument::new();
		document.set_inner_html(&document.body(), "<div =\"a\"é>ünïcode</div>").unwrap();
		let divs = document.elements_by_tag_name(&document.body(), "div");
		assert_eq!(divs.len(), 1);
		assert_eq!(document.text_content(&divs[0]), "ünïcode");

		document.set_inner_html(&document.body(), "<div =x>tëxt</div><p>after</p>").unwrap();
		let div = document.elements_by_tag_name(&document.body(), "div").remove(0);
		assert_eq!(document.text_content(&div), "tëxt");
		let p = document.elements_by_tag_name(&document.body(), "p").remove(0);
		assert_eq!(document.parent(&p), Some(document.body()));
	}

	#[test]
	fn define_upgrades_connected_elements_only() {
		let document = MemoryDocument::new();
		document.set_inner_html(&document.body(), "<x-a></x-a><div><x-a></x-a></div>").unwrap();
		let detached = document.create_element("x-a").unwrap();

		let recorder = record(&document, "x-a");
		assert_eq!(recorder.0.borrow().len(), 2);
		assert!(document
			.define("x-a", Rc::downgrade(&recorder) as Weak<dyn ElementCallbacks<MemoryNode>>)
			.is_err());

		document.append_child(&document.body(), &detached).unwrap();
		assert_eq!(recorder.0.borrow().last(), Some(&("connected", detached)));
	}

	#[test]
	fn replacement_reports_removals_then_insertions() {
		let document = MemoryDocument::new();
		let recorder = record(&document, "x-a");

		document.set_inner_html(&document.body(), "<x-a></x-a>").unwrap();
		let first = document.elements_by_tag_name(&document.body(), "x-a").remove(0);
		document.set_inner_html(&document.body(), "<div><x-a></x-a></div>").unwrap();
		let second = document.elements_by_tag_name(&document.body(), "x-a").remove(0);

		assert_eq!(
			*recorder.0.borrow(),
			[("connected", first.clone()), ("disconnected", first.clone()), ("connected", second.clone())]
		);
		assert!(!document.is_connected(&first));

		let div = document.parent(&second).unwrap();
		document.remove_child(&document.body(), &div).unwrap();
		assert_eq!(recorder.0.borrow().last(), Some(&("disconnected", second)));
	}

	#[test]
	fn every_reaction_is_delivered_despite_failures() {
		let document = MemoryDocument::new();
		let recorder = record(&document, "x-a");
		document
			.set_inner_html(&document.body(), r#"<x-a class="fails"></x-a><x-a class="fails"></x-a><x-a></x-a>"#)
			.unwrap();
		recorder.0.borrow_mut().clear();

		assert!(matches!(document.set_inner_html(&document.body(), "<x-a></x-a>"), Err(Error::Dom(_))));
		let delivered: Vec<_> = recorder.0.borrow().iter().map(|(reaction, _)| *reaction).collect();
		assert_eq!(delivered, ["disconnected", "disconnected", "disconnected", "connected"]);
	}

	#[test]
	fn cycles_are_rejected() {
		let document = MemoryDocument::new();
		let outer = document.create_element("div").unwrap();
		let inner = document.create_element("div").unwrap();
		document.append_child(&outer, &inner).unwrap();
		assert!(document.append_child(&inner, &outer).is_err());
		assert!(document.replace_children(&outer, vec![outer.clone()]).is_err());
	}

	#[test]
	fn detached_nodes_are_freed() {
		let document = MemoryDocument::new();
		let baseline = document.node_count();
		for _ in 0..100 {
			document.set_inner_html(&document.body(), "<div><p>a</p><p>b</p></div>").unwrap();
		}
		assert_eq!(document.node_count(), baseline + 5);

		let kept = document.elements_by_tag_name(&document.body(), "div").remove(0);
		document.set_inner_html(&document.body(), "").unwrap();
		assert_eq!(document.node_count(), baseline + 5);
		drop(kept);
		assert_eq!(document.node_count(), baseline);
	}

	#[test]
	fn initial_props_live_on_the_node() {
		let document = MemoryDocument::new();
		let node = document.create_element("x-a").unwrap();
		assert_eq!(document.initial_props(&node), None);

		let props: Props = [("a", 1)].into_iter().collect();
		document.set_initial_props(&node, &props).unwrap();
		assert_eq!(document.initial_props(&node), Some(props.clone()));
		assert_eq!(document.take_initial_props(&node), Some(props));
		assert_eq!(document.initial_props(&node), None);
	}

	#[test]
	fn lookups() {
		let document = MemoryDocument::new();
		document
			.set_inner_html(&document.body(), r#"<div id="x" class="a b"></div><span class="b"></span>"#)
			.unwrap();
		let x = document.get_element_by_id("x").unwrap();
		assert_eq!(document.tag_name(&x).as_deref(), Some("div"));
		assert_eq!(document.elements_by_class_name(&document.body(), "b").len(), 2);
		assert_eq!(document.elements_by_tag_name(&document.root(), "SPAN").len(), 1);
		assert_eq!(document.elements_by_tag_name(&document.body(), "*").len(), 2);
		assert_eq!(document.get_element_by_id("nope"), None);
	}
}
