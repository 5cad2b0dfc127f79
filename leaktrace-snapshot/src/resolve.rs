// Target-node resolution: mapping a human query (object name, class name,
// identity hash) to node-table indices the chain search can start from.
// All lookups are pure reads over the built graph.

use tracing::debug;

use crate::graph::{HeapGraph, NodeType};

/// Property name under which the runtime links an object to the primitive
/// Number node holding its identity hash.
pub const HASH_SLOT_PROPERTY: &str = "hash";

/// Name-matching mode for [`find_nodes_by_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    Substring,
}

/// Scan all nodes for display names matching `query`, optionally limited
/// to one node category. Returns node-table indices in table order.
#[allow(clippy::cast_possible_truncation)]
pub fn find_nodes_by_name(
    graph: &HeapGraph,
    query: &str,
    mode: NameMatch,
    type_filter: Option<NodeType>,
) -> Vec<u32> {
    graph
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, node)| type_filter.is_none_or(|t| node.node_type == t))
        .filter(|(_, node)| match mode {
            NameMatch::Exact => node.name.name == query,
            NameMatch::Substring => node.name.name.contains(query),
        })
        .map(|(index, _)| index as u32)
        .collect()
}

/// All instances of a class, by exact resolved display name.
pub fn find_instances_of_class(graph: &HeapGraph, class_name: &str) -> Vec<u32> {
    find_nodes_by_name(graph, class_name, NameMatch::Exact, None)
}

/// Two-hop identity-hash lookup.
///
/// The runtime stores an object's identity hash as a separate primitive
/// Number node rather than a field on the object itself. Hop one finds the
/// Number node whose display name is the decimal hash text; hop two walks
/// its back-references to the one labeled with the hash-slot property and
/// returns that referrer — the object the hash belongs to.
pub fn resolve_hash_object(graph: &HeapGraph, hash: u64) -> Option<u32> {
    let hash_text = hash.to_string();
    let number = graph
        .nodes()
        .iter()
        .find(|node| node.node_type == NodeType::Number && node.name.name == hash_text)?;
    let holder = number
        .references
        .iter()
        .find(|backref| backref.name_or_index == HASH_SLOT_PROPERTY)
        .map(|backref| backref.from_node);
    if holder.is_none() {
        debug!(hash, "number node found but no hash-slot referrer");
    }
    holder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_snapshot;

    fn build_graph(json: &str) -> HeapGraph {
        HeapGraph::build(decode_snapshot(json.as_bytes()).unwrap()).unwrap()
    }

    // idx0 root, idx1 "Leaky" object, idx2 "LeakyList" object,
    // idx3 number node "12345" linked from idx1 via the hash slot.
    const FIXTURE: &str = r#"{
        "snapshot": {
            "meta": {
                "node_fields": ["type", "name", "id", "edge_count"],
                "node_types": [["hidden", "array", "string", "object", "code", "closure", "regexp", "number", "native", "synthetic"], "string", "number", "number"],
                "edge_fields": ["type", "name_or_index", "to_node"],
                "edge_types": [["context", "element", "property", "internal", "hidden", "shortcut", "weak"], "string_or_number", "node"]
            }
        },
        "nodes": [9, 0, 1, 2,
                  3, 1, 2, 1,
                  3, 2, 3, 0,
                  7, 3, 4, 0],
        "edges": [2, 4, 4,
                  2, 4, 8,
                  2, 5, 12],
        "strings": ["(GC root)", "Leaky", "LeakyList", "12345", "keep", "hash"]
    }"#;

    #[test]
    fn exact_match_with_type_filter() {
        let graph = build_graph(FIXTURE);
        let hits = find_nodes_by_name(&graph, "Leaky", NameMatch::Exact, Some(NodeType::Object));
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn substring_match_spans_classes() {
        let graph = build_graph(FIXTURE);
        let hits = find_nodes_by_name(&graph, "Leaky", NameMatch::Substring, Some(NodeType::Object));
        assert_eq!(hits, vec![1, 2]);
    }

    #[test]
    fn type_filter_excludes_other_categories() {
        let graph = build_graph(FIXTURE);
        let hits = find_nodes_by_name(&graph, "12345", NameMatch::Exact, Some(NodeType::Object));
        assert!(hits.is_empty());
    }

    #[test]
    fn class_instances_by_exact_name() {
        let graph = build_graph(FIXTURE);
        assert_eq!(find_instances_of_class(&graph, "Leaky"), vec![1]);
        assert!(find_instances_of_class(&graph, "Missing").is_empty());
    }

    #[test]
    fn hash_lookup_follows_the_slot_referrer() {
        let graph = build_graph(FIXTURE);
        // The number node "12345" is held by idx1 via the "hash" property.
        assert_eq!(resolve_hash_object(&graph, 12345), Some(1));
    }

    #[test]
    fn hash_lookup_misses_are_none() {
        let graph = build_graph(FIXTURE);
        assert_eq!(resolve_hash_object(&graph, 99999), None);
    }

    #[test]
    fn hash_lookup_requires_the_sentinel_label() {
        // Number node held through a differently named property only.
        let json = r#"{
            "snapshot": {
                "meta": {
                    "node_fields": ["type", "name", "id", "edge_count"],
                    "node_types": [["hidden", "array", "string", "object", "code", "closure", "regexp", "number"], "string", "number", "number"],
                    "edge_fields": ["type", "name_or_index", "to_node"],
                    "edge_types": [["context", "element", "property"], "string_or_number", "node"]
                }
            },
            "nodes": [3, 0, 1, 1,
                      7, 1, 2, 0],
            "edges": [2, 2, 4],
            "strings": ["Owner", "777", "value"]
        }"#;
        let graph = build_graph(json);
        assert_eq!(resolve_hash_object(&graph, 777), None);
    }
}
