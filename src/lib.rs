#![doc(html_root_url = "https://docs.rs/trellis-dom/0.0.1")]
#![warn(clippy::pedantic)]

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

mod compose;
mod config;
pub mod dom;
mod error;
pub mod lifecycle;
mod markup;
pub mod memory;
pub mod props;
pub mod refs;
pub mod registry;
pub mod style;
pub mod web;

pub use config::Config;
pub use dom::{Dom, ElementCallbacks, NodeKey};
pub use error::{Error, HookError, HookResult, Phase, Result};
pub use lifecycle::{ComponentRef, Context, LifecycleState, Runtime};
pub use props::Props;
pub use refs::{InstanceId, Ref, RefsTable};
pub use registry::{kebab_case, Definition};
pub use style::{StyleEntry, StyleScoping};
