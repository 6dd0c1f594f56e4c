//! Section dispatch and per-kind CRUD handlers.

use motif_document::{
    Document, FoundationEntry, FoundationKind, Node, NodeKind, StyleSheet, TabBarData, Variable,
    VariableCollection,
};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::assets;

/// Reserved marker field declaring per-entity CRUD intent.
pub const CRUD_KEY: &str = "crud";
pub const CRUD_CREATE: &str = "create";
pub const CRUD_UPDATE: &str = "update";
pub const CRUD_DELETE: &str = "delete";

/// Sentinel object standing in for "an actual empty collection" in
/// stylesheet fields, since the transport cannot otherwise express
/// emptiness: `{"__sentinel": "emptyArray"}` is rewritten to `[]`
/// before merge.
pub const EMPTY_ARRAY_SENTINEL_KEY: &str = "__sentinel";
pub const EMPTY_ARRAY_SENTINEL_VALUE: &str = "emptyArray";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("malformed entry '{id}': {reason}")]
    MalformedEntry { id: String, reason: String },
}

/// Per-batch outcome summary. Skipped records were individually logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub applied: usize,
    pub skipped: usize,
}

impl SyncReport {
    fn applied(&mut self) {
        self.applied += 1;
    }

    fn skip(&mut self, err: SyncError) {
        warn!(error = %err, "skipping entity in sync batch");
        self.skipped += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crud {
    Create,
    Update,
    Delete,
}

fn crud_of(record: &Map<String, Value>, default_create: bool) -> Crud {
    match record.get(CRUD_KEY).and_then(Value::as_str) {
        Some(CRUD_CREATE) => Crud::Create,
        Some(CRUD_DELETE) => Crud::Delete,
        Some(CRUD_UPDATE) => Crud::Update,
        Some(other) => {
            warn!(marker = %other, "unknown crud marker, treating as update");
            Crud::Update
        }
        None if default_create => Crud::Create,
        None => Crud::Update,
    }
}

/// Apply an incremental update. Records without a CRUD marker address
/// entities expected to already exist.
pub fn apply(doc: &mut Document, update: &Value) -> SyncReport {
    apply_with(doc, update, false)
}

/// Apply a full snapshot: records lacking a CRUD marker default to
/// create, mirroring initial-load semantics.
pub fn load_all(doc: &mut Document, snapshot: &Value) -> SyncReport {
    apply_with(doc, snapshot, true)
}

fn apply_with(doc: &mut Document, update: &Value, default_create: bool) -> SyncReport {
    let mut report = SyncReport::default();

    let sections = match update.as_object() {
        Some(map) => map,
        None => {
            warn!("update payload is not an object, ignoring");
            return report;
        }
    };

    if let Some(media) = sections.get("media").and_then(Value::as_object) {
        sync_media(doc, media, default_create, &mut report);
    }
    if let Some(nodes) = sections.get("nodes").and_then(Value::as_object) {
        sync_nodes(doc, nodes, &mut report);
    }
    if let Some(sheets) = sections.get("stylesheets").and_then(Value::as_object) {
        sync_stylesheets(doc, sheets, &mut report);
    }
    if let Some(project) = sections.get("project").and_then(Value::as_object) {
        sync_project(doc, project, &mut report);
    }
    if let Some(foundation) = sections.get("foundation").and_then(Value::as_object) {
        for kind in FoundationKind::ALL {
            if let Some(entries) = foundation.get(kind.section_key()).and_then(Value::as_object) {
                sync_foundation(doc, kind, entries, &mut report);
            }
        }
    }

    debug!(applied = report.applied, skipped = report.skipped, "sync batch done");
    report
}

// ---- media ----

fn sync_media(
    doc: &mut Document,
    records: &Map<String, Value>,
    default_create: bool,
    report: &mut SyncReport,
) {
    for (id, record) in records {
        match assets::sync_asset(doc, id, record, default_create) {
            Ok(()) => report.applied(),
            Err(err) => report.skip(err),
        }
    }
}

// ---- nodes ----

/// Nodes always upsert (never implicitly delete). Entities are merged
/// in a first pass and structure is wired in a second one, so a batch
/// may reference nodes it creates in any order.
fn sync_nodes(doc: &mut Document, records: &Map<String, Value>, report: &mut SyncReport) {
    let mut structural: Vec<(&String, &Map<String, Value>)> = Vec::new();

    for (id, record) in records {
        let record = match record.as_object() {
            Some(map) => map,
            None => {
                report.skip(SyncError::MalformedEntry {
                    id: id.clone(),
                    reason: "node record is not an object".into(),
                });
                continue;
            }
        };

        if crud_of(record, false) == Crud::Delete {
            doc.remove_node(id);
            report.applied();
            continue;
        }

        let mut node = doc
            .node(id)
            .cloned()
            .unwrap_or_else(|| Node::new(id.clone(), NodeKind::Container));
        merge_node_fields(&mut node, record);
        doc.add_node(node);
        structural.push((id, record));
        report.applied();
    }

    for (id, record) in structural {
        if let Some(parent_id) = record.get("parent").and_then(Value::as_str) {
            if let Err(err) = doc.attach(parent_id, id) {
                warn!(node = %id, error = %err, "could not re-parent node");
            }
        }
        if let Some(order) = record.get("children").and_then(Value::as_array) {
            let order: Vec<String> = order
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if let Err(err) = doc.set_children(id, &order) {
                warn!(node = %id, error = %err, "could not reorder children");
            }
        }
    }
}

fn merge_node_fields(node: &mut Node, record: &Map<String, Value>) {
    for (field, value) in record {
        match field.as_str() {
            CRUD_KEY | "parent" | "children" => {}
            "type" => {
                if let Some(kind) = value.as_str().and_then(NodeKind::from_type_tag) {
                    node.kind = kind;
                } else {
                    warn!(node = %node.id, tag = ?value, "unknown node type tag, keeping current kind");
                }
            }
            "isMainComponent" => {
                if let Some(flag) = value.as_bool() {
                    node.is_main_component = flag;
                }
            }
            "main" => {
                node.main = value.as_str().map(str::to_string);
            }
            "variables" => {
                if let Some(vars) = value.as_object() {
                    merge_variables(&mut node.variables, vars);
                }
            }
            _ => {
                node.fields.insert(field.clone(), value.clone());
            }
        }
    }
}

// ---- stylesheets ----

fn sync_stylesheets(doc: &mut Document, records: &Map<String, Value>, report: &mut SyncReport) {
    for (id, record) in records {
        let record = match record.as_object() {
            Some(map) => map,
            None => {
                report.skip(SyncError::MalformedEntry {
                    id: id.clone(),
                    reason: "stylesheet record is not an object".into(),
                });
                continue;
            }
        };

        if crud_of(record, false) == Crud::Delete {
            doc.remove_stylesheet(id);
            report.applied();
            continue;
        }

        let mut sheet = doc
            .stylesheet(id)
            .cloned()
            .unwrap_or_else(|| StyleSheet::new(id.clone()));
        for (field, value) in record {
            if field == CRUD_KEY {
                continue;
            }
            sheet.fields.insert(field.clone(), sanitize_sentinels(value));
        }
        doc.add_stylesheet(sheet);
        report.applied();
    }
}

fn is_empty_array_sentinel(value: &Value) -> bool {
    value
        .as_object()
        .map(|map| {
            map.len() == 1
                && map.get(EMPTY_ARRAY_SENTINEL_KEY).and_then(Value::as_str)
                    == Some(EMPTY_ARRAY_SENTINEL_VALUE)
        })
        .unwrap_or(false)
}

fn sanitize_sentinels(value: &Value) -> Value {
    if is_empty_array_sentinel(value) {
        Value::Array(Vec::new())
    } else {
        value.clone()
    }
}

// ---- foundations ----

fn sync_foundation(
    doc: &mut Document,
    kind: FoundationKind,
    records: &Map<String, Value>,
    report: &mut SyncReport,
) {
    for (id, record) in records {
        let record = match record.as_object() {
            Some(map) => map,
            None => {
                report.skip(SyncError::MalformedEntry {
                    id: id.clone(),
                    reason: "foundation record is not an object".into(),
                });
                continue;
            }
        };

        if crud_of(record, false) == Crud::Delete {
            doc.foundation.remove(kind, id);
            report.applied();
            continue;
        }

        let mut entry = doc
            .foundation
            .get(kind, id)
            .cloned()
            .unwrap_or_else(|| FoundationEntry::new(id.clone(), kind));
        for (field, value) in record {
            match field.as_str() {
                CRUD_KEY => {}
                "childIndex" => {
                    if let Some(index) = value.as_i64() {
                        entry.child_index = index;
                    }
                }
                _ => {
                    entry.payload.insert(field.clone(), value.clone());
                }
            }
        }
        doc.foundation.upsert(entry);
        report.applied();
    }
}

// ---- project-level fields ----

fn sync_project(doc: &mut Document, record: &Map<String, Value>, report: &mut SyncReport) {
    if let Some(events) = record.get("events").and_then(Value::as_object) {
        // Event listeners arrive as a complete set and replace the
        // previous one.
        doc.events = events
            .iter()
            .map(|(id, event)| (id.clone(), event.clone()))
            .collect();
        report.applied();
    }

    if let Some(tab_bar) = record.get("tabBarData").and_then(Value::as_object) {
        doc.tab_bar = Some(TabBarData {
            fields: tab_bar.clone(),
        });
        report.applied();
    }

    if let Some(page_id) = record.get("initialPageId").and_then(Value::as_str) {
        doc.initial_page_id = Some(page_id.to_string());
        report.applied();
    }

    if let Some(vars) = record.get("variables").and_then(Value::as_object) {
        merge_variables(&mut doc.variables, vars);
        report.applied();
    }

    if let Some(triggers) = record.get("prefabTriggers").and_then(Value::as_object) {
        for (id, trigger) in triggers {
            doc.prefab_triggers.insert(id.clone(), trigger.clone());
        }
        report.applied();
    }
}

/// Merge a `variables` payload section into a collection. Shared by
/// document-global and node-local variables.
///
/// A record with a delete marker removes the variable; otherwise the
/// variable is upserted and only the fields present are touched. An
/// explicit JSON null clears a field.
pub fn merge_variables(collection: &mut VariableCollection, records: &Map<String, Value>) {
    for (id, record) in records {
        let record = match record.as_object() {
            Some(map) => map,
            None => {
                warn!(variable = %id, "variable record is not an object, skipping");
                continue;
            }
        };

        if crud_of(record, false) == Crud::Delete {
            collection.remove(id);
            continue;
        }

        let mut var = collection
            .get(id)
            .cloned()
            .unwrap_or_else(|| Variable::new(id.clone()));
        if let Some(value) = record.get("value") {
            var.value = if value.is_null() {
                None
            } else {
                Some(value.clone())
            };
        }
        if let Some(default) = record.get("default") {
            var.default = if default.is_null() {
                None
            } else {
                Some(default.clone())
            };
        }
        collection.insert(var);
    }
}
