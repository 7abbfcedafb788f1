//! Depth-first resolution of nested components, transactional attachment and cascading disconnection.
//!
//! Nothing here recurses on the call stack; traversal state lives in explicit work lists.

use crate::{lifecycle::Runtime, style, Dom, Error, NodeKey, Result};
use std::rc::Rc;
use tracing::{error, trace, trace_span};

enum Step<N> {
	/// Look at `node`, `depth` levels below the host being rendered.
	Visit { node: N, depth: usize, trail: Option<Rc<str>> },
	/// All of `host`'s descendants are done; swap in its rendered content.
	Attach { host: N, fragment: Vec<N> },
}

impl<D: Dom + 'static> Runtime<D> {
	/// Resolves every registered tag in `fragment`, innermost first.
	///
	/// Each nested host is rendered, composed and attached (while still detached from the document) before its enclosing
	/// host's attachment. Attached hosts are appended to `finished` in that order, ready for [`connected`](`crate::Definition::connected`).
	///
	/// If this fails, the nested instances it created are discarded again without running any further hooks.
	pub(crate) fn compose(&self, host: &D::Node, fragment: &[D::Node], finished: &mut Vec<D::Node>, deferred: &mut Option<Error>) -> Result<()> {
		let mut nested = Vec::new();
		let result = self.compose_steps(host, fragment, finished, deferred, &mut nested);
		if result.is_err() {
			for node in &nested {
				self.discard_instance(node);
			}
			finished.clear();
		}
		result
	}

	fn compose_steps(
		&self,
		host: &D::Node,
		fragment: &[D::Node],
		finished: &mut Vec<D::Node>,
		deferred: &mut Option<Error>,
		nested: &mut Vec<D::Node>,
	) -> Result<()> {
		let host_tag = self.dom().tag_name(host).unwrap_or_default();
		let span = trace_span!("Composing", tag = host_tag.as_str(), "fragment.len()" = fragment.len());
		let _enter = span.enter();

		let trail: Option<Rc<str>> = if cfg!(feature = "log-paths") { Some(Rc::from(host_tag.as_str())) } else { None };
		let mut stack: Vec<Step<D::Node>> = fragment
			.iter()
			.rev()
			.map(|node| Step::Visit {
				node: node.clone(),
				depth: 1,
				trail: trail.clone(),
			})
			.collect();

		while let Some(step) = stack.pop() {
			match step {
				Step::Visit { node, depth, trail } => {
					if depth > self.config.depth_limit {
						error!("Depth limit reached");
						return Err(Error::DepthLimit {
							limit: self.config.depth_limit,
							path: match trail {
								Some(trail) => trail.to_string(),
								None => format!("<{}>", host_tag),
							},
						});
					}

					match self.definition_for(&node) {
						Some(definition) if !self.has_instance(&node) => {
							let span = trace_span!("Nested component", tag = definition.tag_name(), depth);
							let _enter = span.enter();

							let trail = trail.map(|trail| Rc::from(format!("{} > {}", trail, definition.tag_name())));
							self.construct_nested(&node, definition)?;
							nested.push(node.clone());
							let rendered = self.first_render(&node)?;

							let visits = rendered
								.iter()
								.rev()
								.map(|child| Step::Visit {
									node: child.clone(),
									depth: depth + 1,
									trail: trail.clone(),
								})
								.collect::<Vec<_>>();
							stack.push(Step::Attach { host: node, fragment: rendered });
							stack.extend(visits);
						}
						_ => {
							let children = self.dom().children(&node);
							stack.extend(children.into_iter().rev().map(|child| Step::Visit {
								node: child,
								depth: depth + 1,
								trail: trail.clone(),
							}));
						}
					}
				}

				Step::Attach { host, fragment } => {
					self.attach(&host, fragment, deferred)?;
					finished.push(host);
				}
			}
		}
		Ok(())
	}

	/// Replaces all children of `host` with `fragment` in one step, then disconnects whatever was displaced and makes sure
	/// the host's style is present.
	///
	/// Once the replacement took place, the rest of this step runs regardless of failing `disconnected` hooks.
	/// The first such failure is stored in `deferred` for the caller to return after it finished its own work.
	pub(crate) fn attach(&self, host: &D::Node, fragment: Vec<D::Node>, deferred: &mut Option<Error>) -> Result<()> {
		let old = self.dom().children(host);
		let incoming: Vec<NodeKey> = fragment.iter().map(|node| self.dom().key(node)).collect();
		trace!("Attaching {} node(s) in place of {}.", incoming.len(), old.len());

		if let Err(error) = self.dom().replace_children(host, fragment) {
			let current: Vec<NodeKey> = self.dom().children(host).iter().map(|node| self.dom().key(node)).collect();
			if current != incoming {
				return Err(error);
			}
			// Replaced, but a reaction to it failed.
			deferred.get_or_insert(error);
		}
		if let Err(error) = self.disconnect_subtrees(&old) {
			deferred.get_or_insert(error);
		}

		if let Some(definition) = self.mark_attached(host) {
			let tag_name = definition.tag_name();
			let pending = self.styles.borrow().is_pending(tag_name);
			if pending {
				let css = definition.style.as_ref().map(|style| style());
				style::inject(&self.styles, self.dom(), tag_name, css)?;
			}
		}
		Ok(())
	}

	/// Disconnects every instance in the given subtrees, in tree order.
	///
	/// All hooks run even if some fail; the first failure is returned afterwards.
	pub(crate) fn disconnect_subtrees(&self, roots: &[D::Node]) -> Result<()> {
		if self.instances.borrow().is_empty() {
			return Ok(());
		}

		let mut first_error = None;
		let mut stack: Vec<D::Node> = roots.iter().rev().cloned().collect();
		while let Some(node) = stack.pop() {
			if let Err(error) = self.disconnect_instance(&node) {
				error!("Disconnection hook failed: {}", error);
				first_error.get_or_insert(error);
			}
			stack.extend(self.dom().children(&node).into_iter().rev());
		}
		first_error.map_or(Ok(()), Err)
	}
}
