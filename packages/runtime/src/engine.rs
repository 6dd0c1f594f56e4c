//! The runtime session: document + scopes + instance arena + host.

use motif_document::{Document, FoundationKind, Node, NodeKind};
use motif_sync::SyncReport;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::arena::{InstanceArena, InstanceHandle};
use crate::builder::{page_loader_hook, BuildError, BuildOptions, Builder};
use crate::host::RenderHost;
use crate::instance::{InstanceExtension, Mode, RuntimeInstance};
use crate::scope::{ScopeId, Scopes, VariableEvent};

/// Id of the synthetic page that anchors the runtime: every built
/// component root is scoped under it, and it under the global scope.
pub const RUNTIME_ROOT_PAGE_ID: &str = "__motif-runtime-root";

/// One live runtime session over one document.
///
/// Owns everything mutable: the document (written only through
/// [`Engine::apply_update`]), the scope arena, and the instance arena.
/// Single-writer; wrap the whole engine in a mutex if it must cross
/// threads.
pub struct Engine<H: RenderHost> {
    doc: Document,
    scopes: Scopes,
    arena: InstanceArena,
    host: H,
    global_scope: ScopeId,
    root_scope: ScopeId,
    mode: Mode,
}

impl<H: RenderHost> Engine<H> {
    pub fn new(mut doc: Document, host: H) -> Self {
        let mut scopes = Scopes::new();
        let global_scope = scopes.create(None);
        let root_scope = scopes.create(Some(global_scope));

        // The runtime's own root page; built component roots hang off
        // its scope.
        doc.add_node(Node::new(RUNTIME_ROOT_PAGE_ID, NodeKind::Page));

        Self {
            doc,
            scopes,
            arena: InstanceArena::new(),
            host,
            global_scope,
            root_scope,
            mode: Mode::Live,
        }
    }

    /// Create a session from a full document snapshot.
    pub fn from_snapshot(snapshot: &Value, host: H) -> Self {
        let mut doc = Document::new();
        let report = motif_sync::load_all(&mut doc, snapshot);
        info!(
            applied = report.applied,
            skipped = report.skipped,
            nodes = doc.node_count(),
            "document snapshot loaded"
        );
        Self::new(doc, host)
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Merge an incremental update into the document.
    pub fn apply_update(&mut self, update: &Value) -> SyncReport {
        motif_sync::apply(&mut self.doc, update)
    }

    // ---- runtime foundation overrides ----
    //
    // Embedders may supply concrete design-system values at startup;
    // these overwrite the payload of already-synced entries and skip
    // unknown ids silently.

    pub fn load_color(&mut self, id: &str, value: Value) {
        self.load_foundation(FoundationKind::Color, id, value);
    }

    pub fn load_gradient(&mut self, id: &str, value: Value) {
        self.load_foundation(FoundationKind::Gradient, id, value);
    }

    pub fn load_typography(&mut self, id: &str, value: Value) {
        self.load_foundation(FoundationKind::Typography, id, value);
    }

    pub fn load_spacing(&mut self, id: &str, value: Value) {
        self.load_foundation(FoundationKind::Spacing, id, value);
    }

    pub fn load_radius(&mut self, id: &str, value: Value) {
        self.load_foundation(FoundationKind::CornerRadius, id, value);
    }

    fn load_foundation(&mut self, kind: FoundationKind, id: &str, value: Value) {
        let payload = match value {
            Value::Object(map) => map,
            scalar => {
                let mut map = Map::new();
                map.insert("value".to_string(), scalar);
                map
            }
        };
        self.doc.foundation.override_payload(kind, id, payload);
    }

    // ---- global variables ----

    pub fn set_global_variable(&mut self, id: &str, value: Value) {
        self.scopes.set(self.global_scope, id, value);
    }

    pub fn global_variable(&self, id: &str) -> Option<&Value> {
        self.scopes.get(self.global_scope, id)
    }

    /// Register a callback for global variable changes. Delivery is
    /// synchronous, on the context that performed the change.
    pub fn on_global_variable_change(&mut self, callback: impl Fn(&VariableEvent) + 'static) {
        self.scopes.subscribe(self.global_scope, callback);
    }

    // ---- builds ----

    pub fn build_component(&mut self, node_id: &str) -> Result<InstanceHandle, BuildError> {
        let opts = BuildOptions {
            mode: self.mode,
            ..BuildOptions::default()
        };
        self.build_component_with(node_id, opts)
    }

    pub fn build_component_with(
        &mut self,
        node_id: &str,
        opts: BuildOptions,
    ) -> Result<InstanceHandle, BuildError> {
        let mut hook = page_loader_hook(self.doc.initial_page_id.clone());
        let root_scope = self.root_scope;
        let root = self
            .builder()
            .build_component(node_id, root_scope, &opts, &mut hook)?;
        self.resolve_page_loaders(root, &mut Vec::new());
        Ok(root)
    }

    pub fn build_page(&mut self, node_id: &str) -> Result<InstanceHandle, BuildError> {
        let opts = BuildOptions {
            mode: self.mode,
            ..BuildOptions::default()
        };
        let mut hook = page_loader_hook(self.doc.initial_page_id.clone());
        let root_scope = self.root_scope;
        let root = self
            .builder()
            .build_page(node_id, root_scope, &opts, &mut hook)?;
        self.resolve_page_loaders(root, &mut Vec::new());
        Ok(root)
    }

    /// Explicitly deregister an instance tree. Handles into the torn
    /// down tree go stale; nothing is kept alive implicitly.
    pub fn teardown(&mut self, handle: InstanceHandle) {
        self.builder().teardown_subtree(handle);
    }

    // ---- access ----

    pub fn instance(&self, handle: InstanceHandle) -> Option<&RuntimeInstance> {
        self.arena.get(handle)
    }

    pub fn instance_count(&self) -> usize {
        self.arena.len()
    }

    /// Resolve a variable from an instance's scope, walking the parent
    /// chain up to the global scope.
    pub fn resolve_variable(&self, handle: InstanceHandle, var: &str) -> Option<&Value> {
        let instance = self.arena.get(handle)?;
        self.scopes.get(instance.scope, var)
    }

    /// Write a variable into an instance's own scope.
    pub fn set_instance_variable(&mut self, handle: InstanceHandle, var: &str, value: Value) {
        if let Some(instance) = self.arena.get(handle) {
            let scope = instance.scope;
            self.scopes.set(scope, var, value);
        }
    }

    pub fn subscribe_instance(
        &mut self,
        handle: InstanceHandle,
        callback: impl Fn(&VariableEvent) + 'static,
    ) {
        if let Some(instance) = self.arena.get(handle) {
            let scope = instance.scope;
            self.scopes.subscribe(scope, callback);
        }
    }

    fn builder(&mut self) -> Builder<'_> {
        Builder {
            doc: &self.doc,
            scopes: &mut self.scopes,
            arena: &mut self.arena,
            host: &mut self.host,
        }
    }

    /// Load nested pages into page-loader instances, depth-first. The
    /// `loading` stack detects loader cycles (a page that transitively
    /// loads itself), which are skipped with a log instead of
    /// recursing forever.
    fn resolve_page_loaders(&mut self, root: InstanceHandle, loading: &mut Vec<String>) {
        let mut pending = Vec::new();
        self.collect_page_loaders(root, &mut pending);

        for loader in pending {
            let (page_id, loader_scope) = match self.arena.get(loader) {
                Some(instance) => match &instance.extension {
                    Some(InstanceExtension::PageLoader(ext)) => {
                        (ext.page_id.clone(), instance.scope)
                    }
                    _ => continue,
                },
                None => continue,
            };
            let page_id = match page_id {
                Some(id) => id,
                None => {
                    warn!("page loader has no page to load, leaving empty");
                    continue;
                }
            };
            if loading.iter().any(|id| *id == page_id) {
                warn!(page = %page_id, "page loader cycle detected, skipping nested load");
                continue;
            }

            loading.push(page_id.clone());
            let opts = BuildOptions {
                mode: self.mode,
                ..BuildOptions::default()
            };
            let mut hook = page_loader_hook(self.doc.initial_page_id.clone());
            let built = self
                .builder()
                .build_page(&page_id, loader_scope, &opts, &mut hook);
            match built {
                Ok(nested_root) => {
                    if let Some(instance) = self.arena.get_mut(loader) {
                        if let Some(InstanceExtension::PageLoader(ext)) = &mut instance.extension {
                            ext.root = Some(nested_root);
                        }
                    }
                    self.resolve_page_loaders(nested_root, loading);
                }
                Err(err) => {
                    warn!(page = %page_id, error = %err, "page loader could not load page");
                }
            }
            loading.pop();
        }
    }

    fn collect_page_loaders(&self, handle: InstanceHandle, out: &mut Vec<InstanceHandle>) {
        let instance = match self.arena.get(handle) {
            Some(instance) => instance,
            None => return,
        };
        if let Some(InstanceExtension::PageLoader(ext)) = &instance.extension {
            if ext.root.is_none() {
                out.push(handle);
            }
        }
        for child in &instance.children {
            self.collect_page_loaders(*child, out);
        }
    }
}
