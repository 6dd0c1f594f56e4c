//! The document aggregate: every entity store plus structural node ops.

use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::asset::{Asset, AssetKind};
use crate::foundation::FoundationRegistry;
use crate::node::Node;
use crate::stylesheet::StyleSheet;
use crate::variable::VariableCollection;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("node not found: {0}")]
    NodeNotFound(String),
}

/// Project-level tab bar configuration, replaced wholesale on update.
#[derive(Debug, Clone, Default)]
pub struct TabBarData {
    pub fields: Map<String, Value>,
}

/// The root in-memory aggregate for one runtime session.
///
/// Created empty (or from a full snapshot via `motif-sync`), then
/// mutated only through the synchronization engine. Single logical
/// writer; callers needing cross-thread access must serialize around
/// the whole document.
#[derive(Debug, Default)]
pub struct Document {
    nodes: HashMap<String, Node>,
    stylesheets: HashMap<String, StyleSheet>,
    assets: HashMap<AssetKind, HashMap<String, Asset>>,
    pub foundation: FoundationRegistry,
    /// Document-global variables.
    pub variables: VariableCollection,
    /// Project-level event listeners, keyed by event id.
    pub events: BTreeMap<String, Value>,
    pub tab_bar: Option<TabBarData>,
    pub initial_page_id: Option<String>,
    /// Prefab trigger records, keyed by trigger id.
    pub prefab_triggers: BTreeMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- nodes ----

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Insert or replace a node entity. Purely a store operation;
    /// structural links are managed via [`Self::attach`]/[`Self::detach`].
    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Make `child_id` a child of `parent_id`, appended at the end.
    /// Idempotent: an already-correctly-parented child is left alone
    /// (position included). A child under a different parent is
    /// detached first.
    pub fn attach(&mut self, parent_id: &str, child_id: &str) -> Result<(), DocumentError> {
        if !self.nodes.contains_key(parent_id) {
            return Err(DocumentError::NodeNotFound(parent_id.to_string()));
        }
        if !self.nodes.contains_key(child_id) {
            return Err(DocumentError::NodeNotFound(child_id.to_string()));
        }

        let current = self.nodes.get(child_id).and_then(|n| n.parent.clone());
        if current.as_deref() == Some(parent_id) {
            return Ok(());
        }
        if current.is_some() {
            self.detach(child_id);
        }

        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children.push(child_id.to_string());
        }
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent = Some(parent_id.to_string());
        }
        Ok(())
    }

    /// Remove `child_id` from its parent's children. No-op for roots.
    pub fn detach(&mut self, child_id: &str) {
        let parent_id = match self.nodes.get(child_id).and_then(|n| n.parent.clone()) {
            Some(id) => id,
            None => return,
        };
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|id| id != child_id);
        }
        if let Some(child) = self.nodes.get_mut(child_id) {
            child.parent = None;
        }
    }

    /// Reorder (and re-parent, where needed) `parent_id`'s children to
    /// exactly `order`. Ids that don't resolve are skipped with a log;
    /// previous children absent from `order` are detached.
    pub fn set_children(&mut self, parent_id: &str, order: &[String]) -> Result<(), DocumentError> {
        if !self.nodes.contains_key(parent_id) {
            return Err(DocumentError::NodeNotFound(parent_id.to_string()));
        }

        let previous: Vec<String> = self
            .nodes
            .get(parent_id)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        for child_id in &previous {
            if !order.contains(child_id) {
                self.detach(child_id);
            }
        }

        let mut resolved = Vec::with_capacity(order.len());
        for child_id in order {
            if !self.nodes.contains_key(child_id) {
                warn!(parent = %parent_id, child = %child_id, "child order references unknown node, skipping");
                continue;
            }
            self.attach(parent_id, child_id)?;
            resolved.push(child_id.clone());
        }
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            parent.children = resolved;
        }
        Ok(())
    }

    /// Remove a node entity. The node is detached first, and its
    /// children are orphaned rather than left with a dangling parent.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        self.detach(id);
        let node = self.nodes.remove(id)?;
        for child_id in &node.children {
            if let Some(child) = self.nodes.get_mut(child_id) {
                child.parent = None;
            }
        }
        Some(node)
    }

    // ---- stylesheets ----

    pub fn stylesheet(&self, id: &str) -> Option<&StyleSheet> {
        self.stylesheets.get(id)
    }

    pub fn add_stylesheet(&mut self, sheet: StyleSheet) {
        self.stylesheets.insert(sheet.id.clone(), sheet);
    }

    pub fn remove_stylesheet(&mut self, id: &str) -> Option<StyleSheet> {
        self.stylesheets.remove(id)
    }

    // ---- assets ----

    pub fn asset(&self, kind: AssetKind, id: &str) -> Option<&Asset> {
        self.assets.get(&kind).and_then(|bucket| bucket.get(id))
    }

    pub fn add_asset(&mut self, asset: Asset) {
        self.assets
            .entry(asset.kind)
            .or_default()
            .insert(asset.id.clone(), asset);
    }

    pub fn remove_asset(&mut self, kind: AssetKind, id: &str) -> Option<Asset> {
        self.assets.get_mut(&kind).and_then(|bucket| bucket.remove(id))
    }

    pub fn asset_count(&self, kind: AssetKind) -> usize {
        self.assets.get(&kind).map(|bucket| bucket.len()).unwrap_or(0)
    }
}
