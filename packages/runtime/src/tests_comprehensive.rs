//! Comprehensive runtime tests: instantiation, scope wiring, default
//! seeding, lifecycle dispatch, failure cleanup, page loaders.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use motif_document::{Document, Node};
use serde_json::json;

use crate::*;

/// Host that records every interaction for assertions. Targets are
/// counters; `fail_for` simulates a renderer that cannot create a
/// placeholder for a given node.
#[derive(Default)]
struct RecordingHost {
    next: u64,
    pub fail_for: Option<String>,
    pub attached: bool,
    pub live_targets: RefCell<HashSet<u64>>,
    pub lifecycle: Rc<RefCell<Vec<(u64, LifecycleEvent)>>>,
    pub interactions: Rc<RefCell<Vec<u64>>>,
    pub layout_marks: Rc<RefCell<Vec<u64>>>,
}

impl RenderHost for RecordingHost {
    fn create_target(&mut self, node: &Node, _mode: Mode) -> Result<TargetId, TargetError> {
        if self.fail_for.as_deref() == Some(node.id.as_str()) {
            return Err(TargetError {
                node_id: node.id.clone(),
            });
        }
        let id = self.next;
        self.next += 1;
        self.live_targets.borrow_mut().insert(id);
        Ok(TargetId(id))
    }

    fn destroy_target(&mut self, target: TargetId) {
        self.live_targets.borrow_mut().remove(&target.0);
    }

    fn mark_needs_layout(&mut self, target: TargetId) {
        self.layout_marks.borrow_mut().push(target.0);
    }

    fn is_attached(&self, _target: TargetId) -> bool {
        self.attached
    }

    fn notify_lifecycle(&mut self, target: TargetId, event: LifecycleEvent) {
        self.lifecycle.borrow_mut().push((target.0, event));
    }

    fn attach_interactions(&mut self, target: TargetId) {
        self.interactions.borrow_mut().push(target.0);
    }
}

/// A document with one component definition `card` (variable `count`
/// defaulting to 0) containing a text and a container child, plus a
/// page `home` holding an instance of it.
fn sample_doc() -> Document {
    let mut doc = Document::new();
    motif_sync::load_all(
        &mut doc,
        &json!({
            "nodes": {
                "card": {
                    "type": "container",
                    "isMainComponent": true,
                    "children": ["title", "body"],
                    "variables": { "count": { "default": 0 } }
                },
                "title": { "type": "text" },
                "body": { "type": "container" },
                "home": { "type": "page", "children": ["card-1"] },
                "card-1": { "type": "instance", "main": "card" }
            }
        }),
    );
    doc
}

fn engine() -> Engine<RecordingHost> {
    Engine::new(sample_doc(), RecordingHost::default())
}

#[test]
fn build_unknown_node_is_not_found() {
    let mut engine = engine();
    assert!(matches!(
        engine.build_component("ghost"),
        Err(BuildError::NotFound(id)) if id == "ghost"
    ));
}

#[test]
fn build_non_component_is_invalid_type() {
    let mut engine = engine();
    assert!(matches!(
        engine.build_component("title"),
        Err(BuildError::InvalidType { .. })
    ));
}

#[test]
fn build_page_rejects_non_page() {
    let mut engine = engine();
    assert!(matches!(
        engine.build_page("card"),
        Err(BuildError::InvalidType { .. })
    ));
}

#[test]
fn expansion_preserves_declaration_order() {
    let mut engine = engine();
    let root = engine.build_component("card").unwrap();

    let instance = engine.instance(root).unwrap();
    let child_ids: Vec<&str> = instance
        .children
        .iter()
        .map(|h| engine.instance(*h).unwrap().node_id.as_str())
        .collect();
    assert_eq!(child_ids, vec!["title", "body"]);
}

#[test]
fn defaults_seed_into_scope() {
    let mut engine = engine();
    let root = engine.build_component("card").unwrap();
    assert_eq!(engine.resolve_variable(root, "count"), Some(&json!(0)));
}

#[test]
fn children_resolve_through_parent_chain() {
    let mut engine = engine();
    let root = engine.build_component("card").unwrap();
    let title = engine.instance(root).unwrap().children[0];
    assert_eq!(engine.resolve_variable(title, "count"), Some(&json!(0)));
}

#[test]
fn overrides_preempt_defaults() {
    let mut engine = engine();
    let root = engine
        .build_component_with(
            "card",
            BuildOptions {
                overrides: vec![("count".to_string(), json!(7))],
                ..BuildOptions::default()
            },
        )
        .unwrap();
    assert_eq!(engine.resolve_variable(root, "count"), Some(&json!(7)));
}

#[test]
fn instance_nodes_expand_their_main_definition() {
    let mut engine = engine();
    let page = engine.build_page("home").unwrap();

    let card_instance = engine.instance(page).unwrap().children[0];
    let card = engine.instance(card_instance).unwrap();
    assert_eq!(card.node_id, "card-1");
    assert_eq!(card.children.len(), 2, "children come from the main definition");
    // Variables seed from the main definition too.
    assert_eq!(engine.resolve_variable(card_instance, "count"), Some(&json!(0)));
}

#[test]
fn global_variables_resolve_through_instance_scopes() {
    let mut engine = engine();
    engine.set_global_variable("theme", json!("dark"));
    let root = engine.build_component("card").unwrap();
    assert_eq!(engine.resolve_variable(root, "theme"), Some(&json!("dark")));
}

#[test]
fn global_variable_change_notifies_subscribers() {
    let seen: Rc<RefCell<Vec<VariableEvent>>> = Rc::default();
    let sink = seen.clone();

    let mut engine = engine();
    engine.on_global_variable_change(move |event| sink.borrow_mut().push(event.clone()));
    engine.set_global_variable("theme", json!("dark"));
    engine.set_global_variable("theme", json!("light"));

    let events = seen.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, VariableAction::Create);
    assert_eq!(events[1].action, VariableAction::Update);
    assert_eq!(events[1].value, Some(json!("light")));
}

#[test]
fn setting_instance_variable_shadows_without_touching_global() {
    let mut engine = engine();
    engine.set_global_variable("v", json!(5));
    let root = engine.build_component("card").unwrap();

    engine.set_instance_variable(root, "v", json!(9));
    assert_eq!(engine.resolve_variable(root, "v"), Some(&json!(9)));
    assert_eq!(engine.global_variable("v"), Some(&json!(5)));
}

#[test]
fn lifecycle_fires_loaded_preorder_and_interactions_once() {
    let mut engine = engine();
    let root = engine.build_component("card").unwrap();

    let root_target = engine.instance(root).unwrap().target.0;
    let lifecycle = engine.host().lifecycle.borrow().clone();
    assert_eq!(lifecycle.len(), 3, "one Loaded per instance");
    assert_eq!(lifecycle[0], (root_target, LifecycleEvent::Loaded));
    assert!(lifecycle.iter().all(|(_, e)| *e == LifecycleEvent::Loaded));

    assert_eq!(engine.host().interactions.borrow().len(), 3);
    assert!(engine.host().layout_marks.borrow().contains(&root_target));
}

#[test]
fn appeared_fires_when_target_attached() {
    let mut engine = Engine::new(
        sample_doc(),
        RecordingHost {
            attached: true,
            ..RecordingHost::default()
        },
    );
    let root = engine.build_component("card").unwrap();
    let root_target = engine.instance(root).unwrap().target.0;

    let lifecycle = engine.host().lifecycle.borrow().clone();
    assert_eq!(lifecycle[0], (root_target, LifecycleEvent::Loaded));
    assert_eq!(lifecycle[1], (root_target, LifecycleEvent::Appeared));
}

#[test]
fn failed_build_leaves_nothing_registered() {
    let mut engine = Engine::new(
        sample_doc(),
        RecordingHost {
            fail_for: Some("body".to_string()),
            ..RecordingHost::default()
        },
    );

    let result = engine.build_component("card");
    assert!(matches!(result, Err(BuildError::CouldNotCreateTarget(_))));
    assert_eq!(engine.instance_count(), 0);
    assert!(
        engine.host().live_targets.borrow().is_empty(),
        "already-created targets are destroyed on failure"
    );
    assert!(engine.host().lifecycle.borrow().is_empty());
}

#[test]
fn self_referential_component_fails_instead_of_recursing() {
    // The sync side accepts this structure without complaint: `card`
    // contains an instance of itself through `inner`.
    let mut doc = Document::new();
    motif_sync::load_all(
        &mut doc,
        &json!({
            "nodes": {
                "card": {
                    "type": "container",
                    "isMainComponent": true,
                    "children": ["inner"]
                },
                "inner": { "type": "instance", "main": "card" }
            }
        }),
    );

    let mut engine = Engine::new(doc, RecordingHost::default());
    let result = engine.build_component("card");
    assert!(matches!(result, Err(BuildError::Cyclic(id)) if id == "inner"));
    assert_eq!(engine.instance_count(), 0);
    assert!(engine.host().live_targets.borrow().is_empty());
}

#[test]
fn repeated_sibling_instances_are_not_a_cycle() {
    let mut doc = Document::new();
    motif_sync::load_all(
        &mut doc,
        &json!({
            "nodes": {
                "row": {
                    "type": "container",
                    "isMainComponent": true,
                    "children": ["badge-1", "badge-2"]
                },
                "badge": { "type": "text", "isMainComponent": true },
                "badge-1": { "type": "instance", "main": "badge" },
                "badge-2": { "type": "instance", "main": "badge" }
            }
        }),
    );

    let mut engine = Engine::new(doc, RecordingHost::default());
    let root = engine.build_component("row").unwrap();
    assert_eq!(engine.instance(root).unwrap().children.len(), 2);
}

#[test]
fn teardown_frees_tree_and_stales_handles() {
    let mut engine = engine();
    let root = engine.build_component("card").unwrap();
    let title = engine.instance(root).unwrap().children[0];

    engine.teardown(root);
    assert_eq!(engine.instance_count(), 0);
    assert!(engine.instance(root).is_none());
    assert!(engine.instance(title).is_none());
    assert!(engine.host().live_targets.borrow().is_empty());
}

#[test]
fn rebuild_after_teardown_reuses_cleanly() {
    let mut engine = engine();
    let first = engine.build_component("card").unwrap();
    engine.teardown(first);

    let second = engine.build_component("card").unwrap();
    assert!(engine.instance(first).is_none(), "old handle stays stale");
    assert_eq!(engine.resolve_variable(second, "count"), Some(&json!(0)));
}

// ---- page loaders ----

fn doc_with_page_loader() -> Document {
    let mut doc = Document::new();
    motif_sync::load_all(
        &mut doc,
        &json!({
            "nodes": {
                "shell": {
                    "type": "container",
                    "isMainComponent": true,
                    "children": ["loader"]
                },
                "loader": { "type": "pageLoader", "pageId": "detail" },
                "detail": { "type": "page", "children": ["detail-text"] },
                "detail-text": { "type": "text" }
            }
        }),
    );
    doc
}

#[test]
fn page_loader_spins_up_nested_runtime() {
    let mut engine = Engine::new(doc_with_page_loader(), RecordingHost::default());
    let root = engine.build_component("shell").unwrap();

    let loader = engine.instance(root).unwrap().children[0];
    let nested_root = match &engine.instance(loader).unwrap().extension {
        Some(InstanceExtension::PageLoader(ext)) => ext.root.expect("nested page built"),
        other => panic!("expected page loader extension, got {other:?}"),
    };

    let nested = engine.instance(nested_root).unwrap();
    assert_eq!(nested.node_id, "detail");
    assert_eq!(nested.children.len(), 1);
}

#[test]
fn page_loader_cycle_is_detected_not_infinite() {
    let mut doc = Document::new();
    motif_sync::load_all(
        &mut doc,
        &json!({
            "nodes": {
                "shell": {
                    "type": "container",
                    "isMainComponent": true,
                    "children": ["loader"]
                },
                "loader": { "type": "pageLoader", "pageId": "p" },
                // The page loads itself through its own loader.
                "p": { "type": "page", "children": ["inner-loader"] },
                "inner-loader": { "type": "pageLoader", "pageId": "p" }
            }
        }),
    );

    let mut engine = Engine::new(doc, RecordingHost::default());
    let root = engine.build_component("shell").unwrap();

    let loader = engine.instance(root).unwrap().children[0];
    let nested_root = match &engine.instance(loader).unwrap().extension {
        Some(InstanceExtension::PageLoader(ext)) => ext.root.expect("first level loads"),
        _ => panic!("expected page loader extension"),
    };
    let inner_loader = engine.instance(nested_root).unwrap().children[0];
    match &engine.instance(inner_loader).unwrap().extension {
        Some(InstanceExtension::PageLoader(ext)) => {
            assert!(ext.root.is_none(), "cyclic load is skipped");
        }
        _ => panic!("expected page loader extension"),
    }
}

#[test]
fn teardown_tears_down_nested_page_runtime() {
    let mut engine = Engine::new(doc_with_page_loader(), RecordingHost::default());
    let root = engine.build_component("shell").unwrap();
    assert!(engine.instance_count() > 2);

    engine.teardown(root);
    assert_eq!(engine.instance_count(), 0);
    assert!(engine.host().live_targets.borrow().is_empty());
}
