//! Per-tag stylesheet injection.

use crate::{Dom, Result};
use core::cell::RefCell;
use hashbrown::HashSet;
use tracing::trace;

/// How CSS that doesn't start with its own tag name is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleScoping {
	/// Prepend `"<tag> "` once, in front of the whole stylesheet.
	///
	/// Only the first selector ends up scoped: `div {} p {}` becomes `tag div {} p {}`.
	/// Selectors are not parsed or rewritten, so multi-rule stylesheets should spell out their own tag instead.
	PrefixTag,
	Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleEntry {
	pub tag_name: String,
	pub css: String,
}

/// Remembers the shared `<style>` element and which tags have been handled.
///
/// It never touches the document itself: [`inject`] does that without holding a borrow of it.
#[derive(Debug)]
pub(crate) struct StyleManager<N> {
	scoping: StyleScoping,
	seen: HashSet<String>,
	entries: Vec<StyleEntry>,
	container: Option<N>,
}

impl<N: Clone> StyleManager<N> {
	pub(crate) fn new(scoping: StyleScoping) -> Self {
		Self {
			scoping,
			seen: HashSet::new(),
			entries: Vec::new(),
			container: None,
		}
	}

	/// Whether `tag_name` still needs its style function called.
	pub(crate) fn is_pending(&self, tag_name: &str) -> bool {
		!self.seen.contains(tag_name)
	}

	/// Marks `tag_name` as handled. Returns the scoped CSS if there is anything to inject.
	fn claim(&mut self, tag_name: &str, css: Option<String>) -> Option<String> {
		if !self.seen.insert(tag_name.to_owned()) {
			return None;
		}
		match css {
			Some(css) if !css.trim().is_empty() => Some(scope(tag_name, &css, self.scoping)),
			_ => None,
		}
	}

	pub(crate) fn entries(&self) -> &[StyleEntry] {
		&self.entries
	}
}

/// Marks `tag_name` as handled and appends its CSS (if any) to the shared container in the document head.
///
/// `styles` is only borrowed between document calls, as creating or filling the container may re-enter the runtime.
pub(crate) fn inject<D: Dom>(styles: &RefCell<StyleManager<D::Node>>, dom: &D, tag_name: &str, css: Option<String>) -> Result<bool> {
	let css = match styles.borrow_mut().claim(tag_name, css) {
		Some(css) => css,
		None => return Ok(false),
	};

	let existing = styles.borrow().container.clone();
	let container = match existing {
		Some(container) => container,
		None => {
			let container = dom.create_element("style")?;
			styles.borrow_mut().container = Some(container.clone());
			dom.append_child(&dom.head()?, &container)?;
			trace!("Created the shared style container.");
			container
		}
	};

	let mut text = dom.text_content(&container);
	if !text.is_empty() {
		text.push('\n');
	}
	text.push_str(&css);
	dom.set_text_content(&container, &text)?;

	trace!("Injected style for <{}> ({} bytes).", tag_name, css.len());
	styles.borrow_mut().entries.push(StyleEntry { tag_name: tag_name.to_owned(), css });
	Ok(true)
}

/// Already self-scoped CSS is returned as-is.
#[must_use]
pub fn scope(tag_name: &str, css: &str, scoping: StyleScoping) -> String {
	let trimmed = css.trim_start();
	let self_scoped = trimmed
		.strip_prefix(tag_name)
		.map_or(false, |rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '-' || c == '_'));
	if self_scoped || scoping == StyleScoping::Verbatim {
		css.to_owned()
	} else {
		format!("{} {}", tag_name, trimmed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn self_scoped_css_is_verbatim() {
		let css = "component-f div { color: red; }";
		assert_eq!(scope("component-f", css, StyleScoping::PrefixTag), css);
	}

	#[test]
	fn other_css_gets_one_prefix() {
		assert_eq!(scope("component-f", "div { color: red; }", StyleScoping::PrefixTag), "component-f div { color: red; }");
		assert_eq!(scope("foo", "foo-bar { }", StyleScoping::PrefixTag), "foo foo-bar { }");
		assert_eq!(scope("foo", "div { }", StyleScoping::Verbatim), "div { }");
	}

	#[test]
	fn only_the_first_selector_is_prefixed() {
		assert_eq!(scope("foo", "div { } p { }", StyleScoping::PrefixTag), "foo div { } p { }");
	}

	#[test]
	fn tags_are_claimed_once() {
		let mut styles = StyleManager::<()>::new(StyleScoping::PrefixTag);
		assert_eq!(styles.claim("foo", Some("div {}".to_owned())), Some("foo div {}".to_owned()));
		assert!(!styles.is_pending("foo"));
		assert_eq!(styles.claim("foo", Some("div {}".to_owned())), None);

		assert_eq!(styles.claim("bar", Some("  ".to_owned())), None);
		assert!(!styles.is_pending("bar"));
	}
}
