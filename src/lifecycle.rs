//! The per-instance state machine and the runtime that drives it.

use crate::{
	props,
	refs::{InstanceId, Ref, RefsTable},
	registry::{Definition, Registry},
	style::{StyleEntry, StyleManager},
	Config, Dom, ElementCallbacks, Error, NodeKey, Phase, Props, Result,
};
use core::{
	cell::{Cell, RefCell},
	fmt, slice,
};
use hashbrown::HashMap;
use std::rc::{Rc, Weak};
use tracing::{instrument, level_filters::STATIC_MAX_LEVEL, trace, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
	Constructed,
	WillConnect,
	Rendering,
	Attached,
	Connected,
	Disconnected,
}

pub(crate) struct Instance<D: Dom> {
	pub(crate) id: InstanceId,
	pub(crate) definition: Rc<Definition<D>>,
	pub(crate) props: Props,
	pub(crate) state: LifecycleState,
	pub(crate) generation: u64,
}

/// What a hook gets to see of its instance.
pub struct Context<'a, D: Dom> {
	dom: &'a D,
	host: &'a D::Node,
	props: &'a Props,
	tag_name: &'a str,
}

impl<'a, D: Dom> Context<'a, D> {
	pub(crate) fn new(dom: &'a D, host: &'a D::Node, props: &'a Props, tag_name: &'a str) -> Self {
		Self { dom, host, props, tag_name }
	}

	/// In `will_connect` and the constructor these are only the initial props; attributes aren't extracted yet.
	#[must_use]
	pub fn props(&self) -> &'a Props {
		self.props
	}

	#[must_use]
	pub fn host(&self) -> &'a D::Node {
		self.host
	}

	#[must_use]
	pub fn dom(&self) -> &'a D {
		self.dom
	}

	#[must_use]
	pub fn tag_name(&self) -> &'a str {
		self.tag_name
	}

	#[must_use]
	pub fn get_attribute(&self, name: &str) -> Option<String> {
		self.dom.get_attribute(self.host, name)
	}

	pub fn set_attribute(&self, name: &str, value: &str) -> Result<()> {
		self.dom.set_attribute(self.host, name, value)
	}
}

/// The component API of a connected host element.
pub struct ComponentRef<'a, D: Dom + 'static> {
	runtime: &'a Runtime<D>,
	host: D::Node,
}

impl<'a, D: Dom + 'static> ComponentRef<'a, D> {
	#[must_use]
	pub fn host(&self) -> &D::Node {
		&self.host
	}

	pub fn get_props(&self) -> Result<Props> {
		self.runtime.get_props(&self.host)
	}

	/// Merges `partial` over the current props and renders again, synchronously.
	pub fn set_props(&self, partial: Props) -> Result<()> {
		self.runtime.set_props(&self.host, partial)
	}
}

/// Registry, live instances, refs and styles of one document.
///
/// Shared as [`Rc`]; the document's element callbacks hold a [`Weak`] to it, so dropping the last [`Rc`] silences them.
pub struct Runtime<D: Dom + 'static> {
	this: Weak<Self>,
	dom: D,
	pub(crate) config: Config,
	pub(crate) registry: RefCell<Registry<D>>,
	pub(crate) instances: RefCell<HashMap<NodeKey, Instance<D>>>,
	pub(crate) refs: RefCell<RefsTable>,
	pub(crate) styles: RefCell<StyleManager<D::Node>>,
	next_instance: Cell<u64>,
}

impl<D: Dom + 'static> fmt::Debug for Runtime<D> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Runtime")
			.field("config", &self.config)
			.field("definitions", &self.registry.borrow().len())
			.field("instances", &self.instances.borrow().len())
			.field("refs", &self.refs.borrow().len())
			.finish()
	}
}

impl<D: Dom + 'static> ElementCallbacks<D::Node> for Runtime<D> {
	fn connected(&self, node: &D::Node) -> Result<()> {
		self.connected_callback(node)
	}

	fn disconnected(&self, node: &D::Node) -> Result<()> {
		self.disconnected_callback(node)
	}
}

impl<D: Dom + 'static> Runtime<D> {
	#[must_use]
	pub fn new(dom: D) -> Rc<Self> {
		Self::with_config(dom, Config::default())
	}

	#[must_use]
	pub fn with_config(dom: D, config: Config) -> Rc<Self> {
		Rc::new_cyclic(|this| Self {
			this: Weak::clone(this),
			dom,
			styles: RefCell::new(StyleManager::new(config.style_scoping)),
			config,
			registry: RefCell::new(Registry::new()),
			instances: RefCell::new(HashMap::new()),
			refs: RefCell::new(RefsTable::new()),
			next_instance: Cell::new(0),
		})
	}

	#[must_use]
	pub fn dom(&self) -> &D {
		&self.dom
	}

	#[must_use]
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Registers `definition` and returns its tag name.
	///
	/// The platform element is defined on first registration only. Connected elements of the tag are upgraded before this
	/// returns, and their errors surface here.
	#[instrument(skip(self))]
	pub fn add(&self, definition: Definition<D>) -> Result<String> {
		let definition = self.registry.borrow_mut().insert(definition)?;
		let tag_name = definition.tag_name().to_owned();
		if !self.dom.is_defined(&tag_name) {
			let callbacks: Weak<dyn ElementCallbacks<D::Node>> = self.this.clone();
			self.dom.define(&tag_name, callbacks)?;
		}
		Ok(tag_name)
	}

	/// Creates a detached host with `initial` as its base props.
	///
	/// It has no component API until it is inserted into the document. Until then the runtime keeps nothing about it;
	/// `initial` is stored on the node, so dropping the host drops everything.
	#[instrument(skip(self))]
	pub fn construct(&self, tag_name: &str, initial: Props) -> Result<D::Node> {
		let definition = self.registry.borrow().get(tag_name).ok_or_else(|| Error::UnknownTag(tag_name.to_owned()))?;
		Self::run_constructor(&definition, &initial)?;
		let host = self.dom.create_element(tag_name)?;
		self.dom.set_initial_props(&host, &initial)?;
		Ok(host)
	}

	/// [`None`] unless `host` is a [`Connected`](`LifecycleState::Connected`) component.
	#[must_use]
	pub fn component(&self, host: &D::Node) -> Option<ComponentRef<'_, D>> {
		match self.state(host)? {
			LifecycleState::Connected => Some(ComponentRef { runtime: self, host: host.clone() }),
			_ => None,
		}
	}

	#[must_use]
	pub fn state(&self, host: &D::Node) -> Option<LifecycleState> {
		let state = self.instances.borrow().get(&self.dom.key(host)).map(|instance| instance.state);
		state.or_else(|| self.dom.initial_props(host).map(|_| LifecycleState::Constructed))
	}

	pub fn get_props(&self, host: &D::Node) -> Result<Props> {
		match self.instances.borrow().get(&self.dom.key(host)) {
			Some(instance) if instance.state == LifecycleState::Connected => Ok(instance.props.clone()),
			_ => Err(Error::NotConnected),
		}
	}

	/// Re-renders `host` with `partial` merged over its props.
	///
	/// Neither the constructor nor `will_connect` nor the host's own `connected` run again.
	#[instrument(skip(self))]
	pub fn set_props(&self, host: &D::Node, partial: Props) -> Result<()> {
		let key = self.dom.key(host);
		let (definition, props) = {
			let mut instances = self.instances.borrow_mut();
			let instance = match instances.get_mut(&key) {
				Some(instance) if instance.state == LifecycleState::Connected => instance,
				_ => return Err(Error::NotConnected),
			};
			instance.props = instance.props.merge(&partial);
			instance.state = LifecycleState::Rendering;
			(Rc::clone(&instance.definition), instance.props.clone())
		};

		let mut finished = Vec::new();
		let mut deferred = None;
		let rendered = self
			.render(host, &definition, &props)
			.and_then(|fragment| {
				self.compose(host, &fragment, &mut finished, &mut deferred)?;
				Ok(fragment)
			})
			.and_then(|fragment| self.attach(host, fragment, &mut deferred));
		if let Err(error) = rendered {
			// The host is still in the document with its previous content (or what got attached of the new one).
			self.update(key, |instance| instance.state = LifecycleState::Connected);
			return Err(error);
		}

		let entry = {
			let mut instances = self.instances.borrow_mut();
			instances.get_mut(&key).filter(|instance| instance.state == LifecycleState::Attached).map(|instance| {
				instance.state = LifecycleState::Connected;
				Self::ref_of(key, instance)
			})
		};
		if let Some(entry) = entry {
			self.refs.borrow_mut().record(entry);
		}
		let connected = self.connect(&finished);
		deferred.map_or(connected, Err)
	}

	/// Snapshot of the refs table, in connection order.
	#[must_use]
	pub fn refs(&self) -> Vec<Ref> {
		self.refs.borrow().iter().cloned().collect()
	}

	#[must_use]
	pub fn styles(&self) -> Vec<StyleEntry> {
		self.styles.borrow().entries().to_vec()
	}

	/// Platform notification: `node` was inserted into the document.
	#[instrument(skip(self))]
	pub fn connected_callback(&self, node: &D::Node) -> Result<()> {
		if !self.dom.is_connected(node) {
			return Ok(());
		}
		let tag_name = match self.dom.tag_name(node) {
			Some(tag_name) => tag_name,
			None => return Ok(()),
		};

		let state = self.instances.borrow().get(&self.dom.key(node)).map(|instance| instance.state);
		if let Some(state) = state {
			trace!("<{}> is already managed ({:?}).", tag_name, state);
			return Ok(());
		}

		let definition = match self.registry.borrow().get(&tag_name) {
			Some(definition) => definition,
			None => return Ok(()),
		};
		match self.dom.take_initial_props(node) {
			// Constructed through the API, so the constructor already ran.
			Some(initial) => self.insert_instance(node, definition, initial),
			None => self.construct_instance(node, definition, Props::new())?,
		}
		self.mount(node)
	}

	/// Platform notification: `node` was removed from the document.
	#[instrument(skip(self))]
	pub fn disconnected_callback(&self, node: &D::Node) -> Result<()> {
		if self.dom.is_connected(node) {
			trace!("Ignoring a move.");
			return Ok(());
		}
		self.disconnect_subtrees(slice::from_ref(node))
	}

	fn run_constructor(definition: &Definition<D>, initial: &Props) -> Result<()> {
		match &definition.constructor {
			Some(constructor) => constructor(initial).map_err(|source| Error::render(definition.tag_name(), Phase::Construct, source)),
			None => Ok(()),
		}
	}

	fn construct_instance(&self, host: &D::Node, definition: Rc<Definition<D>>, initial: Props) -> Result<()> {
		Self::run_constructor(&definition, &initial)?;
		self.insert_instance(host, definition, initial);
		Ok(())
	}

	fn insert_instance(&self, host: &D::Node, definition: Rc<Definition<D>>, initial: Props) {
		let id = InstanceId(self.next_instance.get() + 1);
		self.next_instance.set(id.0);
		trace!("Constructed <{}> {}.", definition.tag_name(), id);
		self.instances.borrow_mut().insert(
			self.dom.key(host),
			Instance {
				id,
				definition,
				props: initial,
				state: LifecycleState::Constructed,
				generation: 0,
			},
		);
	}

	/// First connection of a constructed instance, including everything it composes.
	fn mount(&self, host: &D::Node) -> Result<()> {
		let fragment = self.first_render(host)?;
		let mut finished = Vec::new();
		let mut deferred = None;
		self.compose(host, &fragment, &mut finished, &mut deferred)?;
		self.attach(host, fragment, &mut deferred)?;
		finished.push(host.clone());
		let connected = self.connect(&finished);
		deferred.map_or(connected, Err)
	}

	/// `will_connect`, prop extraction and `render` for an instance in [`LifecycleState::Constructed`].
	pub(crate) fn first_render(&self, host: &D::Node) -> Result<Vec<D::Node>> {
		let key = self.dom.key(host);
		let (definition, base) = {
			let mut instances = self.instances.borrow_mut();
			let instance = instances.get_mut(&key).ok_or(Error::NotConnected)?;
			instance.state = LifecycleState::WillConnect;
			(Rc::clone(&instance.definition), instance.props.clone())
		};
		let tag_name = definition.tag_name();

		if let Some(will_connect) = &definition.will_connect {
			will_connect(&Context::new(&self.dom, host, &base, tag_name)).map_err(|source| Error::render(tag_name, Phase::WillConnect, source))?;
		}

		let props = props::extract(&self.dom.attributes(host), &base);
		if cfg!(feature = "dangerous-logging") && STATIC_MAX_LEVEL >= Level::TRACE {
			trace!("Props of <{}>: {}", tag_name, props.to_json());
		}
		self.update(key, |instance| {
			instance.props = props.clone();
			instance.state = LifecycleState::Rendering;
		});
		self.render(host, &definition, &props)
	}

	fn render(&self, host: &D::Node, definition: &Definition<D>, props: &Props) -> Result<Vec<D::Node>> {
		let tag_name = definition.tag_name();
		let render = match &definition.render {
			Some(render) => render,
			None => {
				return Err(Error::Registration {
					type_name: definition.type_name().to_owned(),
					reason: "no render function",
				})
			}
		};

		let markup = render(&Context::new(&self.dom, host, props, tag_name)).map_err(|source| Error::render(tag_name, Phase::Render, source))?;
		if cfg!(feature = "dangerous-logging") && STATIC_MAX_LEVEL >= Level::TRACE {
			trace!("Rendered <{}>: {:?}", tag_name, markup);
		} else {
			trace!("Rendered <{}> ({} bytes).", tag_name, markup.len());
		}
		self.update(self.dom.key(host), |instance| instance.generation += 1);
		self.dom.parse_fragment(&markup)
	}

	/// Fires `connected` for each attached host in order, recording its ref first.
	fn connect(&self, hosts: &[D::Node]) -> Result<()> {
		for host in hosts {
			let key = self.dom.key(host);
			let (definition, props, entry) = {
				let mut instances = self.instances.borrow_mut();
				let instance = match instances.get_mut(&key) {
					Some(instance) if instance.state == LifecycleState::Attached => instance,
					// Removed again by an earlier hook.
					_ => continue,
				};
				instance.state = LifecycleState::Connected;
				(Rc::clone(&instance.definition), instance.props.clone(), Self::ref_of(key, instance))
			};

			if self.refs.borrow_mut().record(entry) {
				trace!("Recorded <{}> in refs.", definition.tag_name());
			}
			if let Some(connected) = &definition.connected {
				connected(&Context::new(&self.dom, host, &props, definition.tag_name()))
					.map_err(|source| Error::render(definition.tag_name(), Phase::Connected, source))?;
			}
		}
		Ok(())
	}

	/// Destroys the instance hosted by `node`, if it got past construction.
	///
	/// The instance stays visible as [`LifecycleState::Disconnected`] for the duration of its `disconnected` hook.
	pub(crate) fn disconnect_instance(&self, node: &D::Node) -> Result<()> {
		let key = self.dom.key(node);
		let (definition, props, was_attached, id) = {
			let mut instances = self.instances.borrow_mut();
			let instance = match instances.get_mut(&key) {
				Some(instance) if !matches!(instance.state, LifecycleState::Constructed | LifecycleState::Disconnected) => instance,
				_ => return Ok(()),
			};
			let was_attached = matches!(instance.state, LifecycleState::Attached | LifecycleState::Connected);
			instance.state = LifecycleState::Disconnected;
			(Rc::clone(&instance.definition), instance.props.clone(), was_attached, instance.id)
		};
		self.refs.borrow_mut().prune(key);
		trace!("Disconnected <{}> {}.", definition.tag_name(), id);

		let result = match &definition.disconnected {
			Some(disconnected) if was_attached => disconnected(&Context::new(&self.dom, node, &props, definition.tag_name()))
				.map_err(|source| Error::render(definition.tag_name(), Phase::Disconnected, source)),
			_ => Ok(()),
		};

		let mut instances = self.instances.borrow_mut();
		if instances.get(&key).map_or(false, |instance| instance.id == id) {
			instances.remove(&key);
		}
		result
	}

	/// Forgets an instance that never connected, without running any hooks.
	pub(crate) fn discard_instance(&self, node: &D::Node) {
		let key = self.dom.key(node);
		let removed = self.instances.borrow_mut().remove(&key);
		if let Some(instance) = removed {
			self.refs.borrow_mut().prune(key);
			trace!("Discarded <{}> {}.", instance.definition.tag_name(), instance.id);
		}
	}

	pub(crate) fn has_instance(&self, node: &D::Node) -> bool {
		self.instances.borrow().contains_key(&self.dom.key(node))
	}

	pub(crate) fn definition_for(&self, node: &D::Node) -> Option<Rc<Definition<D>>> {
		let tag_name = self.dom.tag_name(node)?;
		self.registry.borrow().get(&tag_name)
	}

	pub(crate) fn construct_nested(&self, node: &D::Node, definition: Rc<Definition<D>>) -> Result<()> {
		self.construct_instance(node, definition, Props::new())
	}

	pub(crate) fn mark_attached(&self, host: &D::Node) -> Option<Rc<Definition<D>>> {
		let mut instances = self.instances.borrow_mut();
		let instance = instances.get_mut(&self.dom.key(host))?;
		if instance.state != LifecycleState::Connected {
			instance.state = LifecycleState::Attached;
		}
		Some(Rc::clone(&instance.definition))
	}

	fn update(&self, key: NodeKey, update: impl FnOnce(&mut Instance<D>)) {
		if let Some(instance) = self.instances.borrow_mut().get_mut(&key) {
			update(instance)
		}
	}

	fn ref_of(key: NodeKey, instance: &Instance<D>) -> Ref {
		Ref {
			instance: instance.id,
			host: key,
			tag_name: instance.definition.tag_name().to_owned(),
			generation: instance.generation,
		}
	}
}
