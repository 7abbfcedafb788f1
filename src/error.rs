use core::fmt::{self, Display, Formatter};
use thiserror::Error;

/// The error type of user-supplied hooks.
///
/// Whatever a hook returns here is handed back to the caller untouched, as [`Error::Render::source`](`Error::Render`).
pub type HookError = Box<dyn std::error::Error>;

/// Return type of user-supplied hooks.
pub type HookResult<T = ()> = core::result::Result<T, HookError>;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// The point of the lifecycle at which a user hook failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Construct,
	WillConnect,
	Render,
	Connected,
	Disconnected,
}

impl Display for Phase {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Phase::Construct => "constructor",
			Phase::WillConnect => "willConnect",
			Phase::Render => "render",
			Phase::Connected => "connected",
			Phase::Disconnected => "disconnected",
		})
	}
}

#[derive(Debug, Error)]
pub enum Error {
	/// The definition can't be registered, most likely because it has no render function.
	#[error("Can't register component `{type_name}`: {reason}")]
	Registration { type_name: String, reason: &'static str },

	/// A hook or `render` failed. `source` is exactly what the hook returned.
	#[error("`{phase}` of <{tag_name}> failed: {source}")]
	Render {
		tag_name: String,
		phase: Phase,
		#[source]
		source: HookError,
	},

	/// The component API was used before the host was connected (or after it was disconnected).
	#[error("The element is not a connected component")]
	NotConnected,

	#[error("No component is registered for <{0}>")]
	UnknownTag(String),

	/// Nested components (or plain elements) went deeper than [`Config::depth_limit`](`crate::Config::depth_limit`).
	#[error("Depth limit of {limit} reached while composing {path}")]
	DepthLimit { limit: usize, path: String },

	/// The document refused an operation.
	#[error("DOM operation failed: {0}")]
	Dom(String),
}

impl Error {
	pub(crate) fn render(tag_name: &str, phase: Phase, source: HookError) -> Self {
		Self::Render {
			tag_name: tag_name.to_owned(),
			phase,
			source,
		}
	}
}
