//! Attribute-to-prop extraction.
//!
//! Props are a JSON object snapshot. Each render pass sees one immutable [`Props`] value;
//! [`Props::merge`] produces the next one instead of mutating.

use serde_json::{Map, Value};
use std::{iter::FromIterator, rc::Rc};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props(Rc<Map<String, Value>>);

impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps a JSON object. Returns [`None`] for any other kind of value.
	#[must_use]
	pub fn from_json(value: Value) -> Option<Self> {
		match value {
			Value::Object(map) => Some(Self(Rc::new(map))),
			_ => None,
		}
	}

	#[must_use]
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Formats a prop for interpolation into markup.
	///
	/// Strings are returned verbatim, anything else as its JSON text.
	#[must_use]
	pub fn text(&self, key: &str) -> Option<String> {
		self.get(key).map(|value| match value {
			Value::String(string) => string.clone(),
			other => other.to_string(),
		})
	}

	/// Shallow merge: keys in `partial` replace keys here.
	#[must_use]
	pub fn merge(&self, partial: &Props) -> Props {
		if partial.is_empty() {
			return self.clone();
		}
		let mut merged = (*self.0).clone();
		merged.extend(partial.0.iter().map(|(k, v)| (k.clone(), v.clone())));
		Self(Rc::new(merged))
	}

	#[must_use]
	pub fn len(&self) -> usize {
		self.0.len()
	}

	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.0.iter()
	}

	#[must_use]
	pub fn to_json(&self) -> Value {
		Value::Object((*self.0).clone())
	}
}

impl From<Map<String, Value>> for Props {
	fn from(map: Map<String, Value>) -> Self {
		Self(Rc::new(map))
	}
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Props {
	fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
		Self(Rc::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect()))
	}
}

impl PartialEq<Value> for Props {
	fn eq(&self, other: &Value) -> bool {
		matches!(other, Value::Object(map) if *map == *self.0)
	}
}

/// `test-item` → `testItem`.
///
/// Every `-` that is followed by a character is dropped and that character is uppercased. A trailing `-` stays.
#[must_use]
pub fn camel_case(kebab: &str) -> String {
	let mut camel = String::with_capacity(kebab.len());
	let mut chars = kebab.chars();
	while let Some(c) = chars.next() {
		if c == '-' {
			match chars.next() {
				Some(next) => camel.extend(next.to_uppercase()),
				None => camel.push('-'),
			}
		} else {
			camel.push(c)
		}
	}
	camel
}

/// Coerces a single attribute value.
///
/// Flags (`disabled`, `empty=""`, `hidden="hidden"`) become their own camel-cased name as string.
/// Everything else is parsed as JSON, falling back to the raw string.
#[must_use]
pub fn coerce(name: &str, value: &str) -> Value {
	if value.is_empty() || value == name {
		return Value::String(camel_case(name));
	}
	serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_owned()))
}

/// Layers attribute-derived props over `base`.
#[must_use]
pub fn extract(attributes: &[(String, String)], base: &Props) -> Props {
	if attributes.is_empty() {
		return base.clone();
	}
	let mut props = (*base.0).clone();
	for (name, value) in attributes {
		props.insert(camel_case(name), coerce(name, value));
	}
	Props(Rc::new(props))
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn attributes(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
		pairs.iter().map(|&(n, v)| (n.to_owned(), v.to_owned())).collect()
	}

	#[test]
	fn camel_case_names() {
		assert_eq!(camel_case("id"), "id");
		assert_eq!(camel_case("test-item"), "testItem");
		assert_eq!(camel_case("data-x-y"), "dataXY");
		assert_eq!(camel_case("a--b"), "a-b");
		assert_eq!(camel_case("trailing-"), "trailing-");
	}

	#[test]
	fn flags_become_their_own_name() {
		assert_eq!(coerce("disabled", ""), json!("disabled"));
		assert_eq!(coerce("empty", ""), json!("empty"));
		assert_eq!(coerce("is-open", "is-open"), json!("isOpen"));
	}

	#[test]
	fn json_values_are_parsed() {
		assert_eq!(coerce("number", "1"), json!(1));
		assert_eq!(coerce("test-item", "true"), json!(true));
		assert_eq!(coerce("data", r#"{"message":"hello"}"#), json!({ "message": "hello" }));
		assert_eq!(coerce("list", "[1, 2]"), json!([1, 2]));
	}

	#[test]
	fn malformed_json_stays_a_string() {
		assert_eq!(coerce("id", "x"), json!("x"));
		assert_eq!(coerce("data", "{oops"), json!("{oops"));
	}

	#[test]
	fn attributes_override_the_base_layer() {
		let base: Props = vec![("number", json!(0)), ("kept", json!("yes"))].into_iter().collect();
		let props = extract(&attributes(&[("number", "5"), ("test-item", "a b")]), &base);
		assert_eq!(props, json!({ "number": 5, "kept": "yes", "testItem": "a b" }));
		assert_eq!(base.get("number"), Some(&json!(0)));
	}

	#[test]
	fn merge_is_shallow_and_new_keys_win() {
		let old = Props::from_json(json!({ "a": { "x": 1 }, "b": 2 })).unwrap();
		let new = old.merge(&Props::from_json(json!({ "a": { "y": 2 }, "c": 3 })).unwrap());
		assert_eq!(new, json!({ "a": { "y": 2 }, "b": 2, "c": 3 }));
		assert_eq!(old, json!({ "a": { "x": 1 }, "b": 2 }));
	}

	#[test]
	fn text_leaves_strings_unquoted() {
		let props = Props::from_json(json!({ "s": "hi", "n": 2, "o": { "k": null } })).unwrap();
		assert_eq!(props.text("s").as_deref(), Some("hi"));
		assert_eq!(props.text("n").as_deref(), Some("2"));
		assert_eq!(props.text("o").as_deref(), Some(r#"{"k":null}"#));
		assert_eq!(props.text("missing"), None);
	}
}
