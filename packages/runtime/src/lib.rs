//! # Motif Runtime
//!
//! Expands a synchronized design document into a live tree of runtime
//! instances with hierarchical variable scoping.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ document + sync: live entity state          │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ runtime: Engine session                     │
//! │  - Scopes: parent-chained variable envs     │
//! │  - InstanceArena: generational handles      │
//! │  - Builder: definition → instance tree      │
//! │  - RenderHost: seam to the render layer     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Failure contract
//!
//! Instantiation failures are fatal to that build call only:
//! `NotFound`, `InvalidType` and `CouldNotCreateTarget` abort the
//! build, and any partially built subtree is fully deregistered
//! (arena slots freed, scopes destroyed, owned render targets
//! released) before the error reaches the caller. Half-constructed
//! trees are never left registered.
//!
//! ## Concurrency
//!
//! Single-writer and synchronous, like the document itself. Variable
//! change events are delivered on the calling context, in the order
//! the changes were applied.

mod arena;
mod builder;
mod engine;
mod host;
mod instance;
mod scope;

#[cfg(test)]
mod tests_comprehensive;

pub use arena::{InstanceArena, InstanceHandle};
pub use builder::{BuildError, BuildOptions, Builder, ExtensionContext};
pub use engine::{Engine, RUNTIME_ROOT_PAGE_ID};
pub use host::{LifecycleEvent, NullHost, RenderHost, TargetError, TargetId};
pub use instance::{InstanceExtension, Mode, PageLoaderExtension, RuntimeInstance};
pub use scope::{ScopeId, Scopes, VariableAction, VariableEvent};
