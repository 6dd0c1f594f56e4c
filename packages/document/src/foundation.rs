//! Design-system foundations: ordered, named design values.
//!
//! Foundations are the one store that owns behavior beyond lookup: the
//! registry maintains a stable explicit order per kind, driven by each
//! entry's `childIndex`, and publishes a change event for every
//! create/update/delete. Order must survive repeated partial updates:
//! an update that does not move `childIndex` must not move the entry.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

/// The five foundation kinds, matching the `foundation` sub-sections
/// of an update payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FoundationKind {
    Color,
    Gradient,
    Typography,
    Spacing,
    CornerRadius,
}

impl FoundationKind {
    /// Payload section key for this kind.
    pub fn section_key(&self) -> &'static str {
        match self {
            Self::Color => "colors",
            Self::Gradient => "gradients",
            Self::Typography => "typography",
            Self::Spacing => "spacing",
            Self::CornerRadius => "cornerRadius",
        }
    }

    pub const ALL: [FoundationKind; 5] = [
        FoundationKind::Spacing,
        FoundationKind::CornerRadius,
        FoundationKind::Color,
        FoundationKind::Gradient,
        FoundationKind::Typography,
    ];
}

/// One foundation entry. The payload holds the kind-specific value
/// (a color fill, a gradient stop list, a typography record, or a
/// scalar for spacing/radius); the runtime treats it as opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundationEntry {
    pub id: String,
    pub kind: FoundationKind,
    /// Explicit ordering key, independent of insertion order.
    pub child_index: i64,
    pub payload: Map<String, Value>,
}

impl FoundationEntry {
    pub fn new(id: impl Into<String>, kind: FoundationKind) -> Self {
        Self {
            id: id.into(),
            kind,
            child_index: 0,
            payload: Map::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoundationAction {
    Create,
    Update,
    Delete,
}

/// Emitted to subscribers once per registry mutation, in application
/// order. The renderer uses these as cues to re-derive presentation.
#[derive(Debug, Clone, PartialEq)]
pub struct FoundationEvent {
    pub id: String,
    pub kind: FoundationKind,
    pub action: FoundationAction,
}

type Subscriber = Box<dyn Fn(&FoundationEvent)>;

/// Per-kind ordered store of foundation entries.
#[derive(Default)]
pub struct FoundationRegistry {
    entries: HashMap<FoundationKind, Vec<FoundationEntry>>,
    subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for FoundationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FoundationRegistry")
            .field("entries", &self.entries)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl FoundationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl Fn(&FoundationEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn get(&self, kind: FoundationKind, id: &str) -> Option<&FoundationEntry> {
        self.entries
            .get(&kind)
            .and_then(|list| list.iter().find(|entry| entry.id == id))
    }

    /// Entries of one kind in their explicit order.
    pub fn iter_kind(&self, kind: FoundationKind) -> impl Iterator<Item = &FoundationEntry> {
        self.entries.get(&kind).into_iter().flatten()
    }

    /// Ids of one kind in their explicit order. Handy for order assertions.
    pub fn order_of(&self, kind: FoundationKind) -> Vec<&str> {
        self.iter_kind(kind).map(|entry| entry.id.as_str()).collect()
    }

    /// Insert or replace an entry, keeping per-kind order stable.
    ///
    /// - create: inserted at the position implied by `child_index`
    /// - update with unchanged `child_index`: replaced in place, no move
    /// - update with changed `child_index`: removed and reinserted
    ///
    /// Emits one create/update event.
    pub fn upsert(&mut self, entry: FoundationEntry) {
        let kind = entry.kind;
        let id = entry.id.clone();
        let list = self.entries.entry(kind).or_default();

        let action = match list.iter().position(|existing| existing.id == entry.id) {
            Some(pos) => {
                if list[pos].child_index == entry.child_index {
                    // Unrelated field edit: stay put.
                    list[pos] = entry;
                } else {
                    debug!(id = %id, from = list[pos].child_index, to = entry.child_index,
                        "foundation entry reordered");
                    list.remove(pos);
                    Self::insert_by_child_index(list, entry);
                }
                FoundationAction::Update
            }
            None => {
                Self::insert_by_child_index(list, entry);
                FoundationAction::Create
            }
        };

        self.publish(FoundationEvent { id, kind, action });
    }

    /// Remove an entry, emitting a delete event when it existed.
    pub fn remove(&mut self, kind: FoundationKind, id: &str) -> Option<FoundationEntry> {
        let list = self.entries.get_mut(&kind)?;
        let pos = list.iter().position(|entry| entry.id == id)?;
        let removed = list.remove(pos);
        self.publish(FoundationEvent {
            id: id.to_string(),
            kind,
            action: FoundationAction::Delete,
        });
        Some(removed)
    }

    /// Overwrite an existing entry's payload in place (runtime
    /// foundation overrides). Unknown ids are ignored.
    pub fn override_payload(&mut self, kind: FoundationKind, id: &str, payload: Map<String, Value>) {
        if let Some(list) = self.entries.get_mut(&kind) {
            if let Some(entry) = list.iter_mut().find(|entry| entry.id == id) {
                entry.payload = payload;
            }
        }
    }

    fn insert_by_child_index(list: &mut Vec<FoundationEntry>, entry: FoundationEntry) {
        // Equal indices keep first-come order.
        let pos = list.partition_point(|existing| existing.child_index <= entry.child_index);
        list.insert(pos, entry);
    }

    fn publish(&self, event: FoundationEvent) {
        for subscriber in &self.subscribers {
            subscriber(&event);
        }
    }
}
