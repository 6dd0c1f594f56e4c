//! Asset record CRUD: per-kind construction and field-by-field merge.

use motif_document::{Asset, AssetKind, AssetMeta, AssetState, Document, SizeVariant};
use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::{SyncError, CRUD_CREATE, CRUD_DELETE, CRUD_KEY};

/// Apply one `media` record. Assets are marker-driven: a record with
/// no marker addressing a missing asset is an error (the caller logs
/// and skips it), uniformly for all five kinds.
pub(crate) fn sync_asset(
    doc: &mut Document,
    id: &str,
    record: &Value,
    default_create: bool,
) -> Result<(), SyncError> {
    let record = record.as_object().ok_or_else(|| SyncError::MalformedEntry {
        id: id.to_string(),
        reason: "asset record is not an object".into(),
    })?;

    let kind = record
        .get("type")
        .and_then(Value::as_str)
        .and_then(AssetKind::from_type_tag)
        .ok_or_else(|| SyncError::MalformedEntry {
            id: id.to_string(),
            reason: "missing or unknown asset type discriminator".into(),
        })?;

    let marker = record.get(CRUD_KEY).and_then(Value::as_str);

    if marker == Some(CRUD_DELETE) {
        doc.remove_asset(kind, id);
        return Ok(());
    }

    let exists = doc.asset(kind, id).is_some();
    let create = marker == Some(CRUD_CREATE) || (marker.is_none() && default_create);

    if create && !exists {
        debug!(asset = %id, ?kind, "creating asset");
        let mut asset = Asset::new(id, kind);
        merge_asset_fields(&mut asset, record);
        doc.add_asset(asset);
        return Ok(());
    }

    if exists {
        // Covers explicit updates and redelivered creates alike.
        let mut asset = match doc.asset(kind, id).cloned() {
            Some(asset) => asset,
            None => return Err(SyncError::NotFound(id.to_string())),
        };
        merge_asset_fields(&mut asset, record);
        doc.add_asset(asset);
        return Ok(());
    }

    Err(SyncError::NotFound(id.to_string()))
}

/// Merge only the fields present in the record; everything else is
/// left untouched.
fn merge_asset_fields(asset: &mut Asset, record: &Map<String, Value>) {
    if let Some(state) = record
        .get("state")
        .and_then(Value::as_str)
        .and_then(AssetState::from_tag)
    {
        asset.state = state;
    }

    if let Some(url) = record.get("url").and_then(Value::as_str) {
        asset.url = Some(url.to_string());
    }

    if let Some(meta) = record.get("meta").and_then(Value::as_object) {
        match &mut asset.meta {
            AssetMeta::Image(image) => {
                if let Some(ratio) = meta.get("aspectRatio").and_then(Value::as_f64) {
                    image.aspect_ratio = Some(ratio);
                }
                if let Some(sizes) = meta.get("availableSizes").and_then(Value::as_object) {
                    // Overlay provided variants onto the existing set.
                    for (name, variant) in sizes {
                        if let Some(variant) = parse_size_variant(variant) {
                            image.available_sizes.insert(name.clone(), variant);
                        } else {
                            debug!(asset = %asset.id, variant = %name, "size variant missing url, ignored");
                        }
                    }
                    // A fresh compressed variant becomes the primary url.
                    if let Some(compressed) = image.available_sizes.get("compressed") {
                        if sizes.contains_key("compressed") {
                            asset.url = Some(compressed.url.clone());
                        }
                    }
                }
            }
            AssetMeta::Font(font) => {
                merge_string_field(meta, "fontFamily", &mut font.font_family);
                merge_string_field(meta, "fontSubFamily", &mut font.font_sub_family);
                merge_string_field(meta, "preferredFamily", &mut font.preferred_family);
                merge_string_field(meta, "preferredSubFamily", &mut font.preferred_sub_family);
                merge_string_field(meta, "postScriptName", &mut font.post_script_name);
                merge_string_field(meta, "fileExtension", &mut font.file_extension);
            }
            AssetMeta::Opaque(bag) => {
                for (field, value) in meta {
                    bag.insert(field.clone(), value.clone());
                }
            }
        }
    }
}

fn merge_string_field(meta: &Map<String, Value>, key: &str, slot: &mut Option<String>) {
    if let Some(value) = meta.get(key).and_then(Value::as_str) {
        *slot = Some(value.to_string());
    }
}

fn parse_size_variant(value: &Value) -> Option<SizeVariant> {
    let record = value.as_object()?;
    Some(SizeVariant {
        url: record.get("url").and_then(Value::as_str)?.to_string(),
        width: record.get("width").and_then(Value::as_f64),
        height: record.get("height").and_then(Value::as_f64),
    })
}
