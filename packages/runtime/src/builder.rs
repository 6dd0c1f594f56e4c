//! The instantiation algorithm: definition + overrides → live tree.
//!
//! Expansion walks the node's structural order, so sibling order in
//! the resulting instance tree matches declaration order. Each
//! instance gets a fresh scope chained to its structural parent's
//! scope; after the tree exists, local variable defaults are seeded
//! (never clobbering earlier bindings, so externally-applied overrides
//! win), and a pre-order pass fires lifecycle cues.
//!
//! Structural failures are fatal to the build: the partially built
//! subtree is torn down completely before the error propagates.

use motif_document::{Document, Node, NodeKind};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::arena::{InstanceArena, InstanceHandle};
use crate::host::{LifecycleEvent, RenderHost, TargetError, TargetId};
use crate::instance::{InstanceExtension, Mode, PageLoaderExtension, RuntimeInstance};
use crate::scope::{ScopeId, Scopes};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("node not found: {0}")]
    NotFound(String),

    #[error("node '{id}' is not a {expected}")]
    InvalidType { id: String, expected: &'static str },

    #[error("node '{0}' expands into itself")]
    Cyclic(String),

    #[error(transparent)]
    CouldNotCreateTarget(#[from] TargetError),
}

/// Per-build inputs.
pub struct BuildOptions {
    pub mode: Mode,
    /// Caller-supplied render target for the root instance. Not owned
    /// by the runtime; teardown leaves it alone.
    pub root_target: Option<TargetId>,
    /// Variable overrides applied to the root scope before defaults
    /// are seeded, so they pre-empt them.
    pub overrides: Vec<(String, Value)>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Live,
            root_target: None,
            overrides: Vec::new(),
        }
    }
}

/// What the extension hook sees when deciding whether to specialize an
/// instance.
pub struct ExtensionContext<'a> {
    pub node: &'a Node,
    pub kind: NodeKind,
    pub mode: Mode,
}

pub(crate) type ExtensionHook<'h> =
    dyn FnMut(&ExtensionContext) -> Option<InstanceExtension> + 'h;

/// Borrows the session's parts for the duration of one build.
pub struct Builder<'a> {
    pub(crate) doc: &'a Document,
    pub(crate) scopes: &'a mut Scopes,
    pub(crate) arena: &'a mut InstanceArena,
    pub(crate) host: &'a mut (dyn RenderHost + 'a),
}

impl<'a> Builder<'a> {
    /// Build a runtime tree from a reusable component definition.
    #[instrument(skip(self, opts, hook), fields(node = %node_id))]
    pub fn build_component(
        &mut self,
        node_id: &str,
        parent_scope: ScopeId,
        opts: &BuildOptions,
        hook: &mut ExtensionHook<'_>,
    ) -> Result<InstanceHandle, BuildError> {
        let doc = self.doc;
        let node = doc
            .node(node_id)
            .ok_or_else(|| BuildError::NotFound(node_id.to_string()))?;
        if !node.is_main_component {
            return Err(BuildError::InvalidType {
                id: node_id.to_string(),
                expected: "component definition",
            });
        }
        self.build_root(node, parent_scope, opts, hook)
    }

    /// Build a runtime tree from a page node.
    #[instrument(skip(self, opts, hook), fields(node = %node_id))]
    pub fn build_page(
        &mut self,
        node_id: &str,
        parent_scope: ScopeId,
        opts: &BuildOptions,
        hook: &mut ExtensionHook<'_>,
    ) -> Result<InstanceHandle, BuildError> {
        let doc = self.doc;
        let node = doc
            .node(node_id)
            .ok_or_else(|| BuildError::NotFound(node_id.to_string()))?;
        if node.kind != NodeKind::Page {
            return Err(BuildError::InvalidType {
                id: node_id.to_string(),
                expected: "page",
            });
        }
        self.build_root(node, parent_scope, opts, hook)
    }

    fn build_root(
        &mut self,
        node: &'a Node,
        parent_scope: ScopeId,
        opts: &BuildOptions,
        hook: &mut ExtensionHook<'_>,
    ) -> Result<InstanceHandle, BuildError> {
        let mut expanding = Vec::new();
        let root = self.build_subtree(
            node,
            parent_scope,
            opts.root_target,
            opts.mode,
            hook,
            &mut expanding,
        )?;

        if let Some(instance) = self.arena.get(root) {
            let scope = instance.scope;
            let target = instance.target;
            for (var, value) in &opts.overrides {
                self.scopes.set(scope, var, value.clone());
            }
            self.host.mark_needs_layout(target);
        }

        self.seed_defaults(root);
        self.fire_lifecycle(root);
        debug!(instances = self.arena.len(), "build complete");
        Ok(root)
    }

    /// Guards expansion against cyclic structure: a component that
    /// transitively contains an instance of itself would otherwise
    /// recurse without bound. The `expanding` stack holds the node ids
    /// currently being built on this path; re-entry fails the build.
    fn build_subtree(
        &mut self,
        node: &'a Node,
        parent_scope: ScopeId,
        target_override: Option<TargetId>,
        mode: Mode,
        hook: &mut ExtensionHook<'_>,
        expanding: &mut Vec<String>,
    ) -> Result<InstanceHandle, BuildError> {
        if expanding.iter().any(|id| id == &node.id) {
            return Err(BuildError::Cyclic(node.id.clone()));
        }
        expanding.push(node.id.clone());
        let built = self.build_node(node, parent_scope, target_override, mode, hook, expanding);
        expanding.pop();
        built
    }

    fn build_node(
        &mut self,
        node: &'a Node,
        parent_scope: ScopeId,
        target_override: Option<TargetId>,
        mode: Mode,
        hook: &mut ExtensionHook<'_>,
        expanding: &mut Vec<String>,
    ) -> Result<InstanceHandle, BuildError> {
        let scope = self.scopes.create(Some(parent_scope));
        let owns_target = target_override.is_none();
        let target = match target_override {
            Some(target) => target,
            None => match self.host.create_target(node, mode) {
                Ok(target) => target,
                Err(err) => {
                    self.scopes.destroy(scope);
                    return Err(err.into());
                }
            },
        };

        let mut instance =
            RuntimeInstance::new(node.id.clone(), node.kind, scope, target, mode, owns_target);
        instance.extension = hook(&ExtensionContext {
            node,
            kind: node.kind,
            mode,
        });

        // Children expand from the effective definition: an instance
        // node expands its main component's tree.
        let doc = self.doc;
        let definition = self.effective_definition(node);
        let mut children: Vec<InstanceHandle> = Vec::with_capacity(definition.children.len());
        for child_id in &definition.children {
            let built = doc
                .node(child_id)
                .ok_or_else(|| BuildError::NotFound(child_id.clone()))
                .and_then(|child| self.build_subtree(child, scope, None, mode, hook, expanding));
            match built {
                Ok(handle) => children.push(handle),
                Err(err) => {
                    // No partial tree may stay registered.
                    for handle in children {
                        self.teardown_subtree(handle);
                    }
                    self.scopes.destroy(scope);
                    if owns_target {
                        self.host.destroy_target(target);
                    }
                    return Err(err);
                }
            }
        }
        instance.children = children;

        Ok(self.arena.insert(instance))
    }

    /// Seed every local variable default into its instance's scope,
    /// skipping ids already bound. Idempotent by construction.
    fn seed_defaults(&mut self, handle: InstanceHandle) {
        let (scope, children, vars) = match self.arena.get(handle) {
            Some(instance) => {
                let doc = self.doc;
                let vars: Vec<(String, Value)> = doc
                    .node(&instance.node_id)
                    .map(|node| self.effective_definition(node))
                    .map(|definition| {
                        definition
                            .variables
                            .iter()
                            .map(|var| (var.id.clone(), var.default_value().unwrap_or(Value::Null)))
                            .collect()
                    })
                    .unwrap_or_default();
                (instance.scope, instance.children.clone(), vars)
            }
            None => return,
        };

        for (id, value) in vars {
            self.scopes.seed_default(scope, &id, value);
        }
        for child in children {
            self.seed_defaults(child);
        }
    }

    /// Pre-order lifecycle pass: `Loaded` for everything, `Appeared`
    /// where the target is already attached, interactions wired once.
    fn fire_lifecycle(&mut self, handle: InstanceHandle) {
        let (target, wired, children) = match self.arena.get(handle) {
            Some(instance) => (
                instance.target,
                instance.interactions_wired,
                instance.children.clone(),
            ),
            None => return,
        };

        self.host.notify_lifecycle(target, LifecycleEvent::Loaded);
        if self.host.is_attached(target) {
            self.host.notify_lifecycle(target, LifecycleEvent::Appeared);
        }
        if !wired {
            self.host.attach_interactions(target);
            if let Some(instance) = self.arena.get_mut(handle) {
                instance.interactions_wired = true;
            }
        }

        for child in children {
            self.fire_lifecycle(child);
        }
    }

    /// Deregister an instance tree: children first, then scope, render
    /// target (when owned) and any nested extension runtime.
    pub(crate) fn teardown_subtree(&mut self, handle: InstanceHandle) {
        let instance = match self.arena.remove(handle) {
            Some(instance) => instance,
            None => {
                warn!("teardown of stale instance handle ignored");
                return;
            }
        };
        for child in instance.children {
            self.teardown_subtree(child);
        }
        if let Some(InstanceExtension::PageLoader(ext)) = instance.extension {
            if let Some(nested_root) = ext.root {
                self.teardown_subtree(nested_root);
            }
        }
        self.scopes.destroy(instance.scope);
        if instance.owns_target {
            self.host.destroy_target(instance.target);
        }
    }

    fn effective_definition(&self, node: &'a Node) -> &'a Node {
        match node.main.as_deref().and_then(|id| self.doc.node(id)) {
            Some(main) => main,
            None => node,
        }
    }
}

/// Default extension hook: attaches the page-loader payload and leaves
/// every other kind plain.
pub(crate) fn page_loader_hook(
    initial_page_id: Option<String>,
) -> impl FnMut(&ExtensionContext) -> Option<InstanceExtension> {
    move |ctx| match ctx.kind {
        NodeKind::PageLoader => {
            let page_id = ctx
                .node
                .fields
                .get("pageId")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| initial_page_id.clone());
            Some(InstanceExtension::PageLoader(PageLoaderExtension {
                page_id,
                root: None,
            }))
        }
        _ => None,
    }
}
