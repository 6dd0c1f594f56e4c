//! Runtime instances: the live counterparts of design nodes.

use motif_document::NodeKind;

use crate::arena::InstanceHandle;
use crate::host::TargetId;
use crate::scope::ScopeId;

/// Whether the tree is being built for the editor canvas or for a
/// running app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Edit,
    Live,
}

/// A materialized node. Owns its scope and (usually) its render
/// target; children mirror expansion order, which later lifecycle
/// dispatch relies on.
#[derive(Debug)]
pub struct RuntimeInstance {
    pub node_id: String,
    pub kind: NodeKind,
    pub scope: ScopeId,
    pub target: TargetId,
    pub mode: Mode,
    pub children: Vec<InstanceHandle>,
    /// Kind-specific payload attached by the extension hook; opaque to
    /// the builder.
    pub extension: Option<InstanceExtension>,
    /// False when the render target was supplied by the caller; such
    /// targets are not destroyed on teardown.
    pub(crate) owns_target: bool,
    pub(crate) interactions_wired: bool,
}

impl RuntimeInstance {
    pub(crate) fn new(
        node_id: impl Into<String>,
        kind: NodeKind,
        scope: ScopeId,
        target: TargetId,
        mode: Mode,
        owns_target: bool,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            kind,
            scope,
            target,
            mode,
            children: Vec::new(),
            extension: None,
            owns_target,
            interactions_wired: false,
        }
    }
}

/// Specialized behavior for a fixed set of node kinds, attached via
/// the extension hook so the builder never knows their internals.
#[derive(Debug)]
pub enum InstanceExtension {
    PageLoader(PageLoaderExtension),
}

/// A page loader hosts another page of the same document as a nested
/// sub-runtime scoped under the loader's own scope.
#[derive(Debug)]
pub struct PageLoaderExtension {
    /// Page to load; defaults to the document's initial page.
    pub page_id: Option<String>,
    /// Root of the nested runtime once resolved.
    pub root: Option<InstanceHandle>,
}
