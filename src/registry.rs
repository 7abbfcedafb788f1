//! Component definitions and the tag → definition mapping.

use crate::{lifecycle::Context, Dom, Error, HookResult, Props, Result};
use core::{any::type_name, fmt};
use hashbrown::HashMap;
use std::rc::Rc;
use tracing::{trace, warn};

pub(crate) type RenderFn<D> = Box<dyn Fn(&Context<'_, D>) -> HookResult<String>>;
pub(crate) type HookFn<D> = Box<dyn Fn(&Context<'_, D>) -> HookResult>;
pub(crate) type StyleFn = Box<dyn Fn() -> String>;
pub(crate) type ConstructFn = Box<dyn Fn(&Props) -> HookResult>;

/// What a component is: a render function plus optional style and lifecycle hooks.
///
/// ```
/// use trellis_dom::{memory::MemoryDocument, Definition};
///
/// let definition = Definition::<MemoryDocument>::new("ComponentA")
/// 	.render(|cx| Ok(format!("<div>{}</div>", cx.props().text("label").unwrap_or_default())));
/// assert_eq!(definition.tag_name(), "component-a");
/// ```
pub struct Definition<D: Dom> {
	type_name: String,
	tag_name: String,
	pub(crate) render: Option<RenderFn<D>>,
	pub(crate) style: Option<StyleFn>,
	pub(crate) constructor: Option<ConstructFn>,
	pub(crate) will_connect: Option<HookFn<D>>,
	pub(crate) connected: Option<HookFn<D>>,
	pub(crate) disconnected: Option<HookFn<D>>,
}

impl<D: Dom> Definition<D> {
	/// `type_name` is the upper camel case name the tag is derived from.
	#[must_use]
	pub fn new(type_name: impl Into<String>) -> Self {
		let type_name = type_name.into();
		Self {
			tag_name: kebab_case(&type_name),
			type_name,
			render: None,
			style: None,
			constructor: None,
			will_connect: None,
			connected: None,
			disconnected: None,
		}
	}

	/// Names the definition after `T`, ignoring its module path and generic arguments.
	#[must_use]
	pub fn of<T: ?Sized>() -> Self {
		Self::new(short_type_name(type_name::<T>()))
	}

	#[must_use]
	pub fn type_name(&self) -> &str {
		&self.type_name
	}

	#[must_use]
	pub fn tag_name(&self) -> &str {
		&self.tag_name
	}

	#[must_use]
	pub fn render(mut self, render: impl Fn(&Context<'_, D>) -> HookResult<String> + 'static) -> Self {
		self.render = Some(Box::new(render));
		self
	}

	/// CSS for this tag, fetched once when the first instance attaches.
	#[must_use]
	pub fn style<S: Into<String>>(mut self, style: impl Fn() -> S + 'static) -> Self {
		self.style = Some(Box::new(move || style().into()));
		self
	}

	/// Runs whenever an instance is created, with its initial props and before any DOM presence.
	#[must_use]
	pub fn constructor(mut self, constructor: impl Fn(&Props) -> HookResult + 'static) -> Self {
		self.constructor = Some(Box::new(constructor));
		self
	}

	/// Runs once, on first insertion, before props are extracted from attributes.
	#[must_use]
	pub fn will_connect(mut self, hook: impl Fn(&Context<'_, D>) -> HookResult + 'static) -> Self {
		self.will_connect = Some(Box::new(hook));
		self
	}

	/// Runs once, after the host and all of its nested components are in place.
	#[must_use]
	pub fn connected(mut self, hook: impl Fn(&Context<'_, D>) -> HookResult + 'static) -> Self {
		self.connected = Some(Box::new(hook));
		self
	}

	#[must_use]
	pub fn disconnected(mut self, hook: impl Fn(&Context<'_, D>) -> HookResult + 'static) -> Self {
		self.disconnected = Some(Box::new(hook));
		self
	}
}

impl<D: Dom> fmt::Debug for Definition<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Definition")
			.field("type_name", &self.type_name)
			.field("tag_name", &self.tag_name)
			.field("render", &self.render.is_some())
			.field("style", &self.style.is_some())
			.field("constructor", &self.constructor.is_some())
			.field("will_connect", &self.will_connect.is_some())
			.field("connected", &self.connected.is_some())
			.field("disconnected", &self.disconnected.is_some())
			.finish()
	}
}

pub(crate) struct Registry<D: Dom> {
	definitions: HashMap<String, Rc<Definition<D>>>,
}

impl<D: Dom> Registry<D> {
	pub(crate) fn new() -> Self {
		Self { definitions: HashMap::new() }
	}

	/// Validates and stores `definition`, replacing any previous one for the same tag.
	pub(crate) fn insert(&mut self, definition: Definition<D>) -> Result<Rc<Definition<D>>> {
		if definition.render.is_none() {
			return Err(Error::Registration {
				type_name: definition.type_name,
				reason: "no render function",
			});
		}
		if definition.tag_name.is_empty() {
			return Err(Error::Registration {
				type_name: definition.type_name,
				reason: "the type name doesn't produce a tag name",
			});
		}

		let definition = Rc::new(definition);
		match self.definitions.insert(definition.tag_name.clone(), Rc::clone(&definition)) {
			Some(previous) => warn!(
				"Replaced the definition of <{}> ({} → {}). Live instances keep their original definition.",
				definition.tag_name, previous.type_name, definition.type_name
			),
			None => trace!("Registered <{}>.", definition.tag_name),
		}
		Ok(definition)
	}

	pub(crate) fn get(&self, tag_name: &str) -> Option<Rc<Definition<D>>> {
		self.definitions.get(tag_name).cloned()
	}

	pub(crate) fn len(&self) -> usize {
		self.definitions.len()
	}
}

/// `ComponentA` → `component-a`, `HTMLView` → `html-view`.
///
/// A dash is inserted before an uppercase letter that follows a lowercase letter or digit,
/// or that starts a new word after an acronym.
#[must_use]
pub fn kebab_case(type_name: &str) -> String {
	let chars: Vec<char> = type_name.chars().collect();
	let mut kebab = String::with_capacity(type_name.len() + 4);
	for (i, &c) in chars.iter().enumerate() {
		if c.is_uppercase() {
			if i > 0 {
				let previous = chars[i - 1];
				let next_is_lower = chars.get(i + 1).map_or(false, |next| next.is_lowercase());
				if previous.is_lowercase() || previous.is_ascii_digit() || (previous.is_uppercase() && next_is_lower) {
					kebab.push('-');
				}
			}
			kebab.extend(c.to_lowercase());
		} else {
			kebab.push(c);
		}
	}
	kebab
}

fn short_type_name(full: &str) -> &str {
	let without_generics = full.split('<').next().unwrap_or(full);
	without_generics.rsplit("::").next().unwrap_or(without_generics)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::MemoryDocument;

	#[test]
	fn kebab_case_names() {
		assert_eq!(kebab_case("ComponentA"), "component-a");
		assert_eq!(kebab_case("Foo"), "foo");
		assert_eq!(kebab_case("Quxx"), "quxx");
		assert_eq!(kebab_case("HTMLView"), "html-view");
		assert_eq!(kebab_case("Item2Row"), "item2-row");
		assert_eq!(kebab_case("already-kebab"), "already-kebab");
	}

	#[test]
	fn type_derived_names() {
		struct ComponentB;
		struct Wrapper<T>(T);
		assert_eq!(Definition::<MemoryDocument>::of::<ComponentB>().tag_name(), "component-b");
		assert_eq!(Definition::<MemoryDocument>::of::<Wrapper<ComponentB>>().type_name(), "Wrapper");
	}

	#[test]
	fn registration_requires_render() {
		let mut registry = Registry::<MemoryDocument>::new();
		match registry.insert(Definition::new("NoRender")) {
			Err(Error::Registration { type_name, .. }) => assert_eq!(type_name, "NoRender"),
			other => panic!("unexpected {:?}", other),
		}
		assert_eq!(registry.len(), 0);
	}

	#[test]
	fn reregistration_overwrites() {
		let mut registry = Registry::<MemoryDocument>::new();
		registry.insert(Definition::new("Foo").render(|_| Ok("<i></i>".to_owned()))).unwrap();
		registry.insert(Definition::new("Foo").render(|_| Ok("<b></b>".to_owned())).style(|| "b {}")).unwrap();
		assert_eq!(registry.len(), 1);
		assert!(registry.get("foo").unwrap().style.is_some());
	}
}
