// Query entry points — shared by the CLI commands and any embedding host.
//
// Every query is a pure read over one immutable graph. Batch forms fan
// out with rayon: each search allocates its own visited set and queue, so
// parallel searches over the shared graph need no coordination.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use leaktrace_snapshot::resolve;
use leaktrace_snapshot::search::{self, ChainLink, SearchBound};
use leaktrace_snapshot::HeapGraph;

/// One watched object in a hash-based batch query: the display name the
/// caller knew it by, and its runtime identity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashObject {
    pub name: String,
    pub hash: u64,
}

/// Result entry for one resolved hash object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HashObjectChains {
    pub hash: u64,
    pub name: String,
    pub chains: Vec<Vec<ChainLink>>,
}

/// Find retaining chains for every node whose display name equals `name`.
///
/// No matching node is a valid outcome, not an error: the result is empty
/// and the caller reports "no chains found".
pub fn find_chains_by_node_name(
    graph: &HeapGraph,
    name: &str,
    bound: SearchBound,
) -> Vec<Vec<ChainLink>> {
    let targets = resolve::find_instances_of_class(graph, name);
    if targets.is_empty() {
        debug!(name, "no node matches query name");
    }
    targets
        .iter()
        .flat_map(|&index| search::shortest_chains_from_index(graph, index, bound))
        .collect()
}

/// Batch form: one entry per class name, each holding the chains of every
/// matched instance. Classes without instances map to an empty list so the
/// caller can distinguish "asked about" from "omitted".
pub fn find_chains_for_classes(
    graph: &HeapGraph,
    class_names: &[String],
    bound: SearchBound,
) -> BTreeMap<String, Vec<Vec<ChainLink>>> {
    class_names
        .par_iter()
        .map(|class| (class.clone(), find_chains_by_node_name(graph, class, bound)))
        .collect()
}

/// Hash-based batch form: resolve each watched object through the two-hop
/// identity-hash lookup, then search. Entries whose hash resolves to no
/// node are omitted from the result.
pub fn find_chains_by_hash_objects(
    graph: &HeapGraph,
    objects: &[HashObject],
    bound: SearchBound,
) -> Vec<HashObjectChains> {
    objects
        .par_iter()
        .filter_map(|object| {
            let Some(index) = resolve::resolve_hash_object(graph, object.hash) else {
                debug!(hash = object.hash, name = %object.name, "hash object not resolvable; omitted");
                return None;
            };
            Some(HashObjectChains {
                hash: object.hash,
                name: object.name.clone(),
                chains: search::shortest_chains_from_index(graph, index, bound),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use leaktrace_snapshot::decode::decode_snapshot;

    fn build_graph(json: &str) -> HeapGraph {
        HeapGraph::build(decode_snapshot(json.as_bytes()).unwrap()).unwrap()
    }

    // root(id 1) -instance-> B("Leaky", id 2) -next-> C("Leaky", id 3);
    // B also holds its identity hash node "4242" (id 4) in the hash slot.
    const FIXTURE: &str = r#"{
        "snapshot": {
            "meta": {
                "node_fields": ["type", "name", "id", "edge_count"],
                "node_types": [["hidden", "array", "string", "object", "code", "closure", "regexp", "number", "native", "synthetic"], "string", "number", "number"],
                "edge_fields": ["type", "name_or_index", "to_node"],
                "edge_types": [["context", "element", "property", "internal", "hidden", "shortcut", "weak"], "string_or_number", "node"]
            }
        },
        "nodes": [9, 0, 1, 1,
                  3, 1, 2, 2,
                  3, 1, 3, 0,
                  7, 2, 4, 0],
        "edges": [2, 3, 4,
                  2, 4, 8,
                  2, 5, 12],
        "strings": ["(GC root)", "Leaky", "4242", "instance", "next", "hash"]
    }"#;

    #[test]
    fn name_query_covers_all_instances() {
        let graph = build_graph(FIXTURE);
        // Two "Leaky" nodes: B is held directly by the root (suppressed),
        // C is retained through B and yields the one informative chain.
        let chains = find_chains_by_node_name(&graph, "Leaky", SearchBound::MaxChains(5));
        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].len(), 2);
        assert_eq!(chains[0][0].referrer.id, 2);
        assert_eq!(chains[0][0].node.id, 3);

        let unknown = find_chains_by_node_name(&graph, "NotThere", SearchBound::MaxChains(5));
        assert!(unknown.is_empty());
    }

    #[test]
    fn class_batch_keeps_empty_entries() {
        let graph = build_graph(FIXTURE);
        let result = find_chains_for_classes(
            &graph,
            &["Leaky".to_string(), "Ghost".to_string()],
            SearchBound::MaxChains(5),
        );
        assert_eq!(result.len(), 2);
        assert_eq!(result["Leaky"].len(), 1);
        assert!(result["Ghost"].is_empty());
    }

    #[test]
    fn hash_batch_omits_unresolvable_entries() {
        let graph = build_graph(FIXTURE);
        let objects = vec![
            HashObject {
                name: "Leaky".to_string(),
                hash: 4242,
            },
            HashObject {
                name: "Gone".to_string(),
                hash: 1111,
            },
        ];
        let result = find_chains_by_hash_objects(&graph, &objects, SearchBound::MaxChains(5));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].hash, 4242);
        assert_eq!(result[0].name, "Leaky");
        // Hash 4242 resolves to B, whose sole referrer is the root itself;
        // the direct-root link is suppressed, so no chains.
        assert!(result[0].chains.is_empty());
    }
}
