//! [`Dom`] over the browser's document, with real custom elements.
//!
//! Each registered tag is defined through `customElements.define` as a minimal `HTMLElement` subclass whose
//! `connectedCallback`/`disconnectedCallback` forward into the runtime. Errors from the runtime are thrown into
//! JavaScript from there, since that is where the platform delivers them.

use crate::{Dom, ElementCallbacks, Error, NodeKey, Props, Result};
use core::cell::{Cell, RefCell};
use hashbrown::HashMap;
use js_sys::{Function, Object, Reflect};
use std::rc::Weak;
use tracing::{error, trace, trace_span};
use wasm_bindgen::{closure::Closure, throw_str, JsCast, JsValue};
use web_sys::{Attr, CustomElementRegistry, Document, DocumentFragment, Element, HtmlTemplateElement, NamedNodeMap, Node, NodeList};

/// Expando property holding a node's [`NodeKey`].
const KEY_PROPERTY: &str = "__trellisDomKey";

/// Expando property holding the JSON of an API-constructed host's initial props until it is first connected.
const PROPS_PROPERTY: &str = "__trellisDomProps";

const CLASS_FACTORY_PARAMETERS: &str = "connected, disconnected";
const CLASS_FACTORY_BODY: &str = "return class extends HTMLElement {\n\
	connectedCallback() { connected(this); }\n\
	disconnectedCallback() { disconnected(this); }\n\
};";

/// Keeps the JavaScript side of a defined tag's callbacks alive.
struct DefinedElement {
	_connected: Closure<dyn Fn(Node)>,
	_disconnected: Closure<dyn Fn(Node)>,
}

pub struct WebDom {
	document: Document,
	next_key: Cell<u64>,
	defined: RefCell<HashMap<String, DefinedElement>>,
}

impl core::fmt::Debug for WebDom {
	fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
		f.debug_struct("WebDom")
			.field("document", &self.document)
			.field("defined", &self.defined.borrow().keys().collect::<Vec<_>>())
			.finish()
	}
}

fn js_error(value: JsValue) -> Error {
	Error::Dom(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
}

fn node_list(list: &NodeList) -> Vec<Node> {
	(0..list.length()).filter_map(|i| list.item(i)).collect()
}

fn load_attribute(attribute: &Attr) -> (String, String) {
	(attribute.local_name(), attribute.value())
}

fn load_attributes(attributes: &NamedNodeMap) -> Vec<(String, String)> {
	(0..attributes.length()).filter_map(|i| attributes.item(i)).map(|attribute| load_attribute(&attribute)).collect()
}

impl WebDom {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			next_key: Cell::new(0),
			defined: RefCell::new(HashMap::new()),
		}
	}

	/// The document of the current `window`.
	pub fn from_window() -> Result<Self> {
		let document = web_sys::window()
			.and_then(|window| window.document())
			.ok_or_else(|| Error::Dom("No `window.document` found.".to_owned()))?;
		Ok(Self::new(document))
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	fn custom_elements(&self) -> Result<CustomElementRegistry> {
		self.document
			.default_view()
			.map(|window| window.custom_elements())
			.ok_or_else(|| Error::Dom("The document has no `defaultView`.".to_owned()))
	}

	fn element<'a>(node: &'a Node, operation: &str) -> Result<&'a Element> {
		node.dyn_ref::<Element>().ok_or_else(|| Error::Dom(format!("Can't {} on non-element {:?}", operation, node)))
	}

	fn forward(callbacks: Weak<dyn ElementCallbacks<Node>>, connected: bool) -> Closure<dyn Fn(Node)> {
		Closure::wrap(Box::new(move |node: Node| {
			let span = trace_span!("Custom element reaction", connected);
			let _enter = span.enter();

			let callbacks = match callbacks.upgrade() {
				Some(callbacks) => callbacks,
				None => {
					trace!("Runtime is gone. Ignoring.");
					return;
				}
			};
			let result = if connected { callbacks.connected(&node) } else { callbacks.disconnected(&node) };
			if let Err(error) = result {
				error!("Custom element reaction failed: {}", error);
				throw_str(&error.to_string())
			}
		}) as Box<dyn Fn(Node)>)
	}
}

impl Dom for WebDom {
	type Node = Node;

	fn key(&self, node: &Node) -> NodeKey {
		let target: &JsValue = node.as_ref();
		let property = JsValue::from_str(KEY_PROPERTY);
		if let Some(key) = Reflect::get(target, &property).ok().and_then(|key| key.as_f64()) {
			#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
			let key = key as u64;
			return NodeKey(key);
		}

		let key = self.next_key.get() + 1;
		self.next_key.set(key);
		#[allow(clippy::cast_precision_loss)]
		let stored = JsValue::from_f64(key as f64);
		if let Err(error) = Reflect::set(target, &property, &stored) {
			error!("Failed to store node key: {:?}", error);
		}
		NodeKey(key)
	}

	fn create_element(&self, tag_name: &str) -> Result<Node> {
		self.document.create_element(tag_name).map(Into::into).map_err(js_error)
	}

	fn parse_fragment(&self, markup: &str) -> Result<Vec<Node>> {
		let template = self
			.document
			.create_element("template")
			.map_err(js_error)?
			.dyn_into::<HtmlTemplateElement>()
			.map_err(|element| js_error(element.into()))?;
		template.set_inner_html(markup);

		// Template contents belong to an inert document. Importing them makes the nodes eligible for upgrades.
		let content: DocumentFragment = template.content();
		let imported = self.document.import_node_with_deep(&content, true).map_err(js_error)?;
		Ok(node_list(&imported.child_nodes()))
	}

	fn tag_name(&self, node: &Node) -> Option<String> {
		node.dyn_ref::<Element>().map(Element::local_name)
	}

	fn children(&self, node: &Node) -> Vec<Node> {
		node_list(&node.child_nodes())
	}

	fn attributes(&self, node: &Node) -> Vec<(String, String)> {
		node.dyn_ref::<Element>().map(|element| load_attributes(&element.attributes())).unwrap_or_default()
	}

	fn get_attribute(&self, node: &Node, name: &str) -> Option<String> {
		node.dyn_ref::<Element>()?.get_attribute(name)
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<()> {
		Self::element(node, "set an attribute")?.set_attribute(name, value).map_err(js_error)
	}

	fn replace_children(&self, parent: &Node, children: Vec<Node>) -> Result<()> {
		let parent = Self::element(parent, "replace children")?;
		let fragment = self.document.create_document_fragment();
		for child in &children {
			fragment.append_child(child).map_err(js_error)?;
		}
		// `replaceChildren` queues its custom element reactions until the whole replacement is done.
		parent.replace_children_with_node_1(&fragment);
		Ok(())
	}

	fn append_child(&self, parent: &Node, child: &Node) -> Result<()> {
		parent.append_child(child).map(drop).map_err(js_error)
	}

	fn text_content(&self, node: &Node) -> String {
		node.text_content().unwrap_or_default()
	}

	fn set_text_content(&self, node: &Node, text: &str) -> Result<()> {
		node.set_text_content(Some(text));
		Ok(())
	}

	fn is_connected(&self, node: &Node) -> bool {
		node.is_connected()
	}

	fn head(&self) -> Result<Node> {
		self.document
			.head()
			.map(JsCast::unchecked_into)
			.ok_or_else(|| Error::Dom("The document has no `<head>`.".to_owned()))
	}

	fn set_initial_props(&self, node: &Node, props: &Props) -> Result<()> {
		let json = serde_json::to_string(&props.to_json()).map_err(|error| Error::Dom(error.to_string()))?;
		let target: &JsValue = node.as_ref();
		Reflect::set(target, &JsValue::from_str(PROPS_PROPERTY), &JsValue::from_str(&json)).map(drop).map_err(js_error)
	}

	fn initial_props(&self, node: &Node) -> Option<Props> {
		let target: &JsValue = node.as_ref();
		let json = Reflect::get(target, &JsValue::from_str(PROPS_PROPERTY)).ok()?.as_string()?;
		match serde_json::from_str::<serde_json::Value>(&json) {
			Ok(value) => Props::from_json(value),
			Err(error) => {
				error!("Failed to read initial props: {}", error);
				None
			}
		}
	}

	fn take_initial_props(&self, node: &Node) -> Option<Props> {
		let props = self.initial_props(node)?;
		if let Err(error) = Reflect::delete_property(node.unchecked_ref::<Object>(), &JsValue::from_str(PROPS_PROPERTY)) {
			error!("Failed to clear initial props: {:?}", error);
		}
		Some(props)
	}

	fn is_defined(&self, tag_name: &str) -> bool {
		self.defined.borrow().contains_key(tag_name) || self.custom_elements().map_or(false, |registry| !registry.get(tag_name).is_undefined())
	}

	fn define(&self, tag_name: &str, callbacks: Weak<dyn ElementCallbacks<Node>>) -> Result<()> {
		let connected = Self::forward(Weak::clone(&callbacks), true);
		let disconnected = Self::forward(callbacks, false);

		let factory = Function::new_with_args(CLASS_FACTORY_PARAMETERS, CLASS_FACTORY_BODY);
		let class = factory.call2(&JsValue::UNDEFINED, connected.as_ref(), disconnected.as_ref()).map_err(js_error)?;

		// `define` upgrades connected elements synchronously, so the closures must be stored first.
		self.defined.borrow_mut().insert(
			tag_name.to_owned(),
			DefinedElement {
				_connected: connected,
				_disconnected: disconnected,
			},
		);
		trace!("Defining <{}>.", tag_name);
		if let Err(error) = self.custom_elements()?.define(tag_name, class.unchecked_ref::<Function>()) {
			self.defined.borrow_mut().remove(tag_name);
			return Err(js_error(error));
		}
		Ok(())
	}
}
