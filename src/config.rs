use crate::style::StyleScoping;

/// Runtime knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// How many nodes deep composition may descend below the host being rendered.
	pub depth_limit: usize,
	pub style_scoping: StyleScoping,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			depth_limit: 256,
			style_scoping: StyleScoping::PrefixTag,
		}
	}
}

impl Config {
	#[must_use]
	pub fn with_depth_limit(self, depth_limit: usize) -> Self {
		Self { depth_limit, ..self }
	}

	#[must_use]
	pub fn with_style_scoping(self, style_scoping: StyleScoping) -> Self {
		Self { style_scoping, ..self }
	}
}
