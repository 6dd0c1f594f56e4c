//! The seam to the rendering layer.
//!
//! Rendering, layout and platform view wiring are external
//! collaborators; the runtime only needs to create a visual
//! placeholder per instance, mark subtrees dirty, and deliver
//! lifecycle cues. Everything behind this trait is out of scope.

use motif_document::Node;
use thiserror::Error;

use crate::instance::Mode;

/// Opaque identifier of a render target owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Loaded,
    Appeared,
}

#[derive(Debug, Error)]
#[error("could not create render target for node '{node_id}'")]
pub struct TargetError {
    pub node_id: String,
}

pub trait RenderHost {
    /// Instantiate a visual placeholder for `node`.
    fn create_target(&mut self, node: &Node, mode: Mode) -> Result<TargetId, TargetError>;

    fn destroy_target(&mut self, target: TargetId);

    /// Mark the target's subtree as needing layout.
    fn mark_needs_layout(&mut self, target: TargetId);

    /// Whether the target is attached to a visible hierarchy; drives
    /// the `Appeared` lifecycle cue.
    fn is_attached(&self, target: TargetId) -> bool;

    fn notify_lifecycle(&mut self, target: TargetId, event: LifecycleEvent);

    /// Wire the interaction dispatcher to a target. The builder calls
    /// this exactly once per instance.
    fn attach_interactions(&mut self, target: TargetId);
}

/// Host that renders nothing. Useful for headless embedding and
/// tooling; targets are plain counters.
#[derive(Debug, Default)]
pub struct NullHost {
    next: u64,
}

impl RenderHost for NullHost {
    fn create_target(&mut self, _node: &Node, _mode: Mode) -> Result<TargetId, TargetError> {
        let id = TargetId(self.next);
        self.next += 1;
        Ok(id)
    }

    fn destroy_target(&mut self, _target: TargetId) {}

    fn mark_needs_layout(&mut self, _target: TargetId) {}

    fn is_attached(&self, _target: TargetId) -> bool {
        false
    }

    fn notify_lifecycle(&mut self, _target: TargetId, _event: LifecycleEvent) {}

    fn attach_interactions(&mut self, _target: TargetId) {}
}
