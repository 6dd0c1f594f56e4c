//! Design nodes: the structural tree entities of a document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::variable::VariableCollection;

/// Type tag for a node. Unknown tags fall back to `Container` so a
/// newer authoring side never stalls an older runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Container,
    Page,
    /// An instance of a reusable component definition (see [`Node::main`]).
    Instance,
    /// Loads another page as a nested sub-runtime.
    PageLoader,
    Text,
    Image,
}

impl NodeKind {
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "container" => Some(Self::Container),
            "page" => Some(Self::Page),
            "instance" => Some(Self::Instance),
            "pageLoader" => Some(Self::PageLoader),
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            _ => None,
        }
    }
}

/// A node in the design tree.
///
/// Structural invariants (enforced by [`crate::Document`]):
/// - ids are unique within a document
/// - `parent`/`children` links are always mutually consistent
/// - a node is detached before it is removed
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    /// For instances: the component definition this node instantiates.
    pub main: Option<String>,
    /// True when this node is itself a reusable component definition.
    pub is_main_component: bool,
    pub parent: Option<String>,
    /// Structural order is significant; it drives instantiation order.
    pub children: Vec<String>,
    /// Node-local variables, seeded into instance scopes at build time.
    pub variables: VariableCollection,
    /// Remaining style/layout fields, kept as an opaque bag. Layout
    /// interpretation is the renderer's concern, not ours.
    pub fields: Map<String, Value>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            main: None,
            is_main_component: false,
            parent: None,
            children: Vec::new(),
            variables: VariableCollection::new(),
            fields: Map::new(),
        }
    }
}
