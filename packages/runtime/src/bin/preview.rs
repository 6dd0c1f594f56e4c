//! Headless preview: load a document snapshot, optionally apply
//! incremental updates, build a node and print the instance tree.
//!
//! Usage:
//!   motif-preview <snapshot.json> --build <node-id> [--update <update.json>]...

use anyhow::{bail, Context, Result};
use motif_runtime::{Engine, InstanceHandle, NullHost, RenderHost};
use serde_json::Value;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let mut snapshot_path: Option<String> = None;
    let mut build_id: Option<String> = None;
    let mut update_paths: Vec<String> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--build" | "-b" => {
                if i + 1 < args.len() {
                    build_id = Some(args[i + 1].clone());
                    i += 2;
                } else {
                    bail!("--build requires a node id");
                }
            }
            "--update" | "-u" => {
                if i + 1 < args.len() {
                    update_paths.push(args[i + 1].clone());
                    i += 2;
                } else {
                    bail!("--update requires a file path");
                }
            }
            other => {
                snapshot_path = Some(other.to_string());
                i += 1;
            }
        }
    }

    let snapshot_path = snapshot_path.context("usage: motif-preview <snapshot.json> --build <node-id>")?;
    let snapshot = read_json(&snapshot_path)?;

    let mut engine = Engine::from_snapshot(&snapshot, NullHost::default());

    for path in &update_paths {
        let update = read_json(path)?;
        let report = engine.apply_update(&update);
        println!(
            "applied {path}: {} entities merged, {} skipped",
            report.applied, report.skipped
        );
    }

    let build_id = build_id.context("--build <node-id> is required")?;
    let node = engine
        .document()
        .node(&build_id)
        .with_context(|| format!("node '{build_id}' not found in document"))?;

    let root = if node.is_main_component {
        engine.build_component(&build_id)?
    } else {
        engine.build_page(&build_id)?
    };

    println!("built {} instances:", engine.instance_count());
    print_tree(&engine, root, 0);
    Ok(())
}

fn read_json(path: &str) -> Result<Value> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}

fn print_tree<H: RenderHost>(engine: &Engine<H>, handle: InstanceHandle, depth: usize) {
    let instance = match engine.instance(handle) {
        Some(instance) => instance,
        None => return,
    };
    println!(
        "{}{} ({:?})",
        "  ".repeat(depth),
        instance.node_id,
        instance.kind
    );
    for child in &instance.children {
        print_tree(engine, *child, depth + 1);
    }
}
