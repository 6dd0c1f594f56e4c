//! Comprehensive sync engine tests: CRUD semantics, partial merges,
//! ordering stability, failure recovery.

use crate::*;
use motif_document::{AssetKind, AssetState, Document, FoundationKind, NodeKind};
use serde_json::json;

fn doc_with_font() -> Document {
    let mut doc = Document::new();
    load_all(
        &mut doc,
        &json!({
            "media": {
                "f1": {
                    "type": "font",
                    "state": "ready",
                    "url": "https://cdn.example/inter.ttf",
                    "meta": { "fontFamily": "Inter" }
                }
            }
        }),
    );
    doc
}

#[test]
fn snapshot_load_creates_without_markers() {
    let doc = doc_with_font();
    let asset = doc.asset(AssetKind::Font, "f1").expect("font created");
    assert_eq!(asset.state, AssetState::Ready);
    assert_eq!(asset.url.as_deref(), Some("https://cdn.example/inter.ttf"));
    assert_eq!(
        asset.meta.as_font().unwrap().font_family.as_deref(),
        Some("Inter")
    );
}

#[test]
fn partial_merge_does_not_clobber_unmentioned_fields() {
    let mut doc = doc_with_font();

    let report = apply(
        &mut doc,
        &json!({
            "media": {
                "f1": {
                    "type": "font",
                    "meta": { "fontSubFamily": "Italic" }
                }
            }
        }),
    );
    assert_eq!(report.skipped, 0);

    let meta = doc.asset(AssetKind::Font, "f1").unwrap().meta.as_font().unwrap().clone();
    assert_eq!(meta.font_family.as_deref(), Some("Inter"));
    assert_eq!(meta.font_sub_family.as_deref(), Some("Italic"));
    let asset = doc.asset(AssetKind::Font, "f1").unwrap();
    assert_eq!(asset.state, AssetState::Ready);
    assert_eq!(asset.url.as_deref(), Some("https://cdn.example/inter.ttf"));
}

#[test]
fn create_then_identical_update_is_idempotent() {
    let payload = json!({
        "media": {
            "img": {
                "crud": "create",
                "type": "image",
                "state": "ready",
                "url": "https://cdn.example/a.png",
                "meta": { "aspectRatio": 1.5 }
            }
        }
    });

    let mut doc = Document::new();
    apply(&mut doc, &payload);
    let first = doc.asset(AssetKind::Image, "img").unwrap().clone();

    apply(&mut doc, &payload);
    let second = doc.asset(AssetKind::Image, "img").unwrap();

    assert_eq!(doc.asset_count(AssetKind::Image), 1);
    assert_eq!(first.meta, second.meta);
    assert_eq!(first.url, second.url);
}

#[test]
fn delete_then_update_does_not_resurrect() {
    let mut doc = doc_with_font();

    apply(
        &mut doc,
        &json!({ "media": { "f1": { "type": "font", "crud": "delete" } } }),
    );
    assert!(doc.asset(AssetKind::Font, "f1").is_none());

    let report = apply(
        &mut doc,
        &json!({ "media": { "f1": { "type": "font", "url": "https://cdn.example/x.ttf" } } }),
    );
    assert_eq!(report.skipped, 1);
    assert!(doc.asset(AssetKind::Font, "f1").is_none());
}

#[test]
fn delete_reads_no_other_field() {
    let mut doc = doc_with_font();
    apply(
        &mut doc,
        &json!({
            "media": {
                "f1": {
                    "type": "font",
                    "crud": "delete",
                    "url": "https://cdn.example/should-not-matter.ttf"
                }
            }
        }),
    );
    assert!(doc.asset(AssetKind::Font, "f1").is_none());
}

#[test]
fn image_size_variants_overlay_and_compressed_wins_url() {
    let mut doc = Document::new();
    load_all(
        &mut doc,
        &json!({
            "media": {
                "img": {
                    "type": "image",
                    "url": "https://cdn.example/raw.png",
                    "meta": {
                        "availableSizes": {
                            "raw": { "url": "https://cdn.example/raw.png", "width": 800.0 }
                        }
                    }
                }
            }
        }),
    );

    apply(
        &mut doc,
        &json!({
            "media": {
                "img": {
                    "type": "image",
                    "meta": {
                        "availableSizes": {
                            "compressed": { "url": "https://cdn.example/small.png", "width": 200.0 }
                        }
                    }
                }
            }
        }),
    );

    let asset = doc.asset(AssetKind::Image, "img").unwrap();
    let meta = asset.meta.as_image().unwrap();
    assert_eq!(meta.available_sizes.len(), 2, "overlay keeps prior variants");
    assert_eq!(asset.url.as_deref(), Some("https://cdn.example/small.png"));
}

#[test]
fn malformed_record_skips_but_batch_continues() {
    let mut doc = Document::new();
    let report = apply(
        &mut doc,
        &json!({
            "media": {
                "bad": { "crud": "create", "url": "https://cdn.example/x" },
                "good": { "crud": "create", "type": "svg", "url": "https://cdn.example/ok.svg" }
            }
        }),
    );
    assert_eq!(report.skipped, 1);
    assert_eq!(report.applied, 1);
    assert!(doc.asset(AssetKind::Svg, "good").is_some());
}

#[test]
fn unknown_sections_are_ignored() {
    let mut doc = Document::new();
    let report = apply(&mut doc, &json!({ "holograms": { "h1": {} } }));
    assert_eq!(report, SyncReport::default());
}

#[test]
fn video_update_merges_like_other_kinds() {
    let mut doc = Document::new();
    load_all(
        &mut doc,
        &json!({
            "media": {
                "v": { "type": "video", "state": "pending", "url": "https://cdn.example/v.mp4" }
            }
        }),
    );
    apply(
        &mut doc,
        &json!({ "media": { "v": { "type": "video", "state": "ready" } } }),
    );
    let asset = doc.asset(AssetKind::Video, "v").unwrap();
    assert_eq!(asset.state, AssetState::Ready);
    assert_eq!(asset.url.as_deref(), Some("https://cdn.example/v.mp4"));
}

// ---- nodes ----

#[test]
fn nodes_upsert_and_wire_structure_regardless_of_batch_order() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({
            "nodes": {
                "page": { "type": "page", "children": ["a", "b"] },
                "a": { "type": "container" },
                "b": { "type": "text" }
            }
        }),
    );

    let page = doc.node("page").unwrap();
    assert_eq!(page.kind, NodeKind::Page);
    assert_eq!(page.children, vec!["a", "b"]);
    assert_eq!(doc.node("a").unwrap().parent.as_deref(), Some("page"));
}

#[test]
fn node_delete_detaches_first() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({
            "nodes": {
                "page": { "type": "page", "children": ["a"] },
                "a": { "type": "container" }
            }
        }),
    );

    apply(&mut doc, &json!({ "nodes": { "a": { "crud": "delete" } } }));
    assert!(doc.node("a").is_none());
    assert!(doc.node("page").unwrap().children.is_empty());
}

#[test]
fn node_reparent_is_idempotent() {
    let mut doc = Document::new();
    let payload = json!({
        "nodes": {
            "page": { "type": "page" },
            "a": { "type": "container", "parent": "page" }
        }
    });
    apply(&mut doc, &payload);
    apply(&mut doc, &payload);
    assert_eq!(doc.node("page").unwrap().children, vec!["a"]);
}

#[test]
fn node_variables_merge() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({
            "nodes": {
                "c": {
                    "type": "container",
                    "isMainComponent": true,
                    "variables": { "count": { "default": 0 } }
                }
            }
        }),
    );
    apply(
        &mut doc,
        &json!({
            "nodes": { "c": { "variables": { "count": { "default": 5 } } } }
        }),
    );

    let node = doc.node("c").unwrap();
    assert!(node.is_main_component);
    assert_eq!(node.variables.get("count").unwrap().default, Some(json!(5)));
}

// ---- stylesheets ----

#[test]
fn stylesheet_partial_field_replacement() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({ "stylesheets": { "s": { "fill": "#fff", "opacity": 1.0 } } }),
    );
    apply(&mut doc, &json!({ "stylesheets": { "s": { "fill": "#000" } } }));

    let sheet = doc.stylesheet("s").unwrap();
    assert_eq!(sheet.field("fill"), Some(&json!("#000")));
    assert_eq!(sheet.field("opacity"), Some(&json!(1.0)));
}

#[test]
fn stylesheet_empty_array_sentinel_is_sanitized() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({
            "stylesheets": {
                "s": { "shadows": { "__sentinel": "emptyArray" } }
            }
        }),
    );
    assert_eq!(doc.stylesheet("s").unwrap().field("shadows"), Some(&json!([])));
}

#[test]
fn stylesheet_delete_removes_wholesale() {
    let mut doc = Document::new();
    apply(&mut doc, &json!({ "stylesheets": { "s": { "fill": "#fff" } } }));
    apply(&mut doc, &json!({ "stylesheets": { "s": { "crud": "delete" } } }));
    assert!(doc.stylesheet("s").is_none());
}

// ---- foundations ----

#[test]
fn foundation_order_stable_under_unrelated_update() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({
            "foundation": {
                "colors": {
                    "a": { "childIndex": 0, "name": "A" },
                    "b": { "childIndex": 1, "name": "B" },
                    "c": { "childIndex": 2, "name": "C" }
                }
            }
        }),
    );
    // HashMap-keyed payload arrives unordered; explicit index decides.
    assert_eq!(doc.foundation.order_of(FoundationKind::Color), vec!["a", "b", "c"]);

    apply(
        &mut doc,
        &json!({ "foundation": { "colors": { "b": { "name": "Brand" } } } }),
    );
    assert_eq!(doc.foundation.order_of(FoundationKind::Color), vec!["a", "b", "c"]);

    apply(
        &mut doc,
        &json!({ "foundation": { "colors": { "b": { "childIndex": 3 } } } }),
    );
    assert_eq!(doc.foundation.order_of(FoundationKind::Color), vec!["a", "c", "b"]);
}

#[test]
fn foundation_delete_removes_entry() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({ "foundation": { "spacing": { "s1": { "childIndex": 0, "value": 8 } } } }),
    );
    apply(
        &mut doc,
        &json!({ "foundation": { "spacing": { "s1": { "crud": "delete" } } } }),
    );
    assert!(doc.foundation.get(FoundationKind::Spacing, "s1").is_none());
}

// ---- project ----

#[test]
fn project_fields_sync() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({
            "project": {
                "events": { "tap-1": { "action": "navigate" } },
                "tabBarData": { "visible": true },
                "initialPageId": "page-1",
                "variables": { "theme": { "value": "dark" } },
                "prefabTriggers": { "t1": { "kind": "onLoad" } }
            }
        }),
    );

    assert_eq!(doc.events.get("tap-1"), Some(&json!({ "action": "navigate" })));
    assert_eq!(doc.tab_bar.as_ref().unwrap().fields.get("visible"), Some(&json!(true)));
    assert_eq!(doc.initial_page_id.as_deref(), Some("page-1"));
    assert_eq!(doc.variables.get("theme").unwrap().value, Some(json!("dark")));
    assert!(doc.prefab_triggers.contains_key("t1"));
}

#[test]
fn variable_delete_marker_removes_binding() {
    let mut doc = Document::new();
    apply(
        &mut doc,
        &json!({ "project": { "variables": { "v": { "value": 1 } } } }),
    );
    apply(
        &mut doc,
        &json!({ "project": { "variables": { "v": { "crud": "delete" } } } }),
    );
    assert!(doc.variables.get("v").is_none());
}
