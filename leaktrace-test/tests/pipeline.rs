use std::sync::Arc;

use leaktrace_core::analyze::{self, HashObject};
use leaktrace_core::TaskRegistry;
use leaktrace_snapshot::search::{self, SearchBound};
use leaktrace_snapshot::{EdgeType, NodeType};
use leaktrace_test::{decode_fixture, SnapshotBuilder};

// ── Retention scenario ───────────────────────────────────────────

// root -app-> Global -cache-> Cache -[0]-> LeakedBuffer
fn retention_fixture() -> (SnapshotBuilder, u64) {
    let mut builder = SnapshotBuilder::new();
    let root = builder.gc_root();
    let global = builder.node("object", "Global");
    let cache = builder.node("object", "Cache");
    let leaked = builder.node("array", "LeakedBuffer");
    builder.edge(root, "property", "app", global);
    builder.edge(global, "property", "cache", cache);
    builder.element(cache, 0, leaked);
    let leaked_id = builder.id(leaked);
    (builder, leaked_id)
}

#[test]
fn leaked_buffer_chain_walks_back_to_the_root() {
    let (builder, leaked_id) = retention_fixture();
    let file = builder.write();
    let graph = decode_fixture(file.path()).unwrap();

    let chains = search::shortest_chains(&graph, leaked_id, SearchBound::MaxDepth(5));
    assert_eq!(chains.len(), 1);

    let chain = &chains[0];
    assert_eq!(chain.len(), 3);
    // Target end first: Cache -[element]-> LeakedBuffer.
    assert_eq!(chain[0].referrer.name, "Cache");
    assert_eq!(chain[0].edge_type, EdgeType::Element);
    assert_eq!(chain[0].node.name, "LeakedBuffer");
    assert_eq!(chain[1].referrer.name, "Global");
    // Root end last.
    assert_eq!(chain[2].referrer.node_type, NodeType::Synthetic);
    assert_eq!(chain[2].node.name, "Global");
}

#[test]
fn weak_edges_do_not_retain() {
    let mut builder = SnapshotBuilder::new();
    let root = builder.gc_root();
    let registry = builder.node("object", "WeakRegistry");
    let target = builder.node("object", "Ephemeral");
    builder.edge(root, "property", "registry", registry);
    builder.edge(registry, "weak", "slot", target);
    let target_id = builder.id(target);

    let file = builder.write();
    let graph = decode_fixture(file.path()).unwrap();
    let chains = search::shortest_chains(&graph, target_id, SearchBound::MaxChains(5));
    assert!(chains.is_empty());
}

#[test]
fn composite_names_are_decomposed_in_chain_endpoints() {
    let mut builder = SnapshotBuilder::new();
    let root = builder.gc_root();
    let holder = builder.node("closure", "src/app.js#handler(line:42)app");
    let victim = builder.node("object", "Captured");
    builder.edge(root, "property", "listeners", holder);
    builder.edge(holder, "context", "captured", victim);
    let victim_id = builder.id(victim);

    let file = builder.write();
    let graph = decode_fixture(file.path()).unwrap();
    let chains = search::shortest_chains(&graph, victim_id, SearchBound::MaxDepth(5));
    assert_eq!(chains.len(), 1);

    let holder_end = &chains[0][0].referrer;
    assert_eq!(holder_end.name, "handler");
    assert_eq!(holder_end.path, "src/app.js");
    assert_eq!(holder_end.line, 42);
}

// ── Batch queries through the task registry ──────────────────────

#[tokio::test]
async fn class_batch_query_over_async_task() {
    let (builder, _) = retention_fixture();
    let file = builder.write();

    let registry = Arc::new(TaskRegistry::new());
    let id = registry
        .create_task_async(file.path().to_path_buf())
        .await
        .unwrap();
    let graph = registry.require_task(id).unwrap();

    let report = analyze::find_chains_for_classes(
        &graph,
        &["LeakedBuffer".to_string(), "Missing".to_string()],
        SearchBound::MaxChains(3),
    );
    assert_eq!(report["LeakedBuffer"].len(), 1);
    assert_eq!(report["LeakedBuffer"][0].len(), 3);
    assert!(report["Missing"].is_empty());

    assert!(registry.destroy_task(id));
    assert!(registry.get_task(id).is_none());
}

#[test]
fn hash_objects_resolve_through_the_hash_slot() {
    let mut builder = SnapshotBuilder::new();
    let root = builder.gc_root();
    let holder = builder.node("object", "SessionStore");
    let session = builder.node("object", "Session");
    let hash_node = builder.node("number", "90210");
    builder.edge(root, "property", "store", holder);
    builder.edge(holder, "property", "active", session);
    builder.edge(session, "property", "hash", hash_node);

    let file = builder.write();
    let graph = decode_fixture(file.path()).unwrap();

    let objects = vec![
        HashObject {
            name: "Session".to_string(),
            hash: 90210,
        },
        HashObject {
            name: "Vanished".to_string(),
            hash: 11111,
        },
    ];
    let report = analyze::find_chains_by_hash_objects(&graph, &objects, SearchBound::MaxChains(3));
    assert_eq!(report.len(), 1);
    assert_eq!(report[0].hash, 90210);
    assert_eq!(report[0].chains.len(), 1);
    assert_eq!(report[0].chains[0][0].referrer.name, "SessionStore");
}
