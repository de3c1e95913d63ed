//! Leaf components of the engine.
//!
//! - Graph store and validator ([`graph`])
//! - Cancelable hooks and the shared transport bag ([`hook`])
//! - Transition-target sources ([`source`])

pub mod graph;
pub mod hook;
pub mod source;

pub use graph::{StateSpec, StatesSpec, TransitionSpec, TransitionsSpec};
pub use hook::{hook, observer, Hook, HookContext, HookList, Transport};
pub use source::Source;
