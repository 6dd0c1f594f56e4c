//! # Motif Sync
//!
//! Merges partial, CRUD-style update payloads into a live
//! [`motif_document::Document`].
//!
//! ## Update payloads
//!
//! An update is a nested, string-keyed JSON structure with recognized
//! top-level sections: `media`, `nodes`, `stylesheets`, `project`, and
//! `foundation` (sub-sectioned by kind). Unknown sections are ignored
//! for forward compatibility.
//!
//! Every entity record may carry a CRUD marker field (`"crud"`) with
//! value `"create"`, `"update"`, or `"delete"`. Records without a
//! marker address entities expected to already exist; during a full
//! snapshot load the missing marker defaults to create instead.
//!
//! ## Merge discipline
//!
//! - delete removes the entity; no other field is interpreted
//! - create constructs a typed entity from the full payload
//! - update merges only the fields present in the payload; nested
//!   metadata records merge field-by-field, and structured collections
//!   (e.g. image size-variant sets) are overlaid, never replaced
//! - a record with no marker addressing a missing entity is logged and
//!   skipped; identity is never fabricated
//!
//! One malformed record never aborts the batch: it is logged, counted
//! in the [`SyncReport`], and the rest of the update proceeds. Merges
//! are idempotent per entity, so redelivering an update is safe.

mod assets;
mod engine;

#[cfg(test)]
mod tests_comprehensive;

pub use engine::{
    apply, load_all, merge_variables, SyncError, SyncReport, CRUD_CREATE, CRUD_DELETE, CRUD_KEY,
    CRUD_UPDATE, EMPTY_ARRAY_SENTINEL_KEY, EMPTY_ARRAY_SENTINEL_VALUE,
};
