//! Serialization helpers for [`MemoryDocument`](`crate::memory::MemoryDocument`).
//!
//! Parsing is html5ever's job; this only writes markup back out.

const VOID_ELEMENTS: &[&str] = &[
	"area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track", "wbr",
];

/// Elements whose text content is serialized without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["iframe", "noembed", "noframes", "plaintext", "script", "style", "xmp"];

pub(crate) fn is_void(name: &str) -> bool {
	VOID_ELEMENTS.contains(&name)
}

pub(crate) fn is_raw_text(name: &str) -> bool {
	RAW_TEXT_ELEMENTS.contains(&name)
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
	for c in text.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			c => out.push(c),
		}
	}
}

pub(crate) fn escape_attribute(value: &str, out: &mut String) {
	for c in value.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			'\u{a0}' => out.push_str("&nbsp;"),
			c => out.push(c),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escaping() {
		let mut out = String::new();
		escape_text("a<b&c\u{a0}", &mut out);
		escape_attribute(r#" "q" "#, &mut out);
		assert_eq!(out, "a&lt;b&amp;c&nbsp; &quot;q&quot; ");
	}

	#[test]
	fn void_elements() {
		assert!(is_void("br"));
		assert!(!is_void("div"));
		assert!(is_raw_text("style"));
		assert!(!is_raw_text("p"));
	}
}
