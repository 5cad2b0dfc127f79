// Shortest retaining-chain search.
//
// The question is "who keeps this object alive", so the BFS runs over the
// reverse adjacency (`references`) from the target outward until it reaches
// a GC root. Two callers exist in the wild: one wants a single shortest
// chain under a depth cap, the other wants the top K chains. Both are the
// same traversal with a different stop/prune predicate, expressed here as
// `SearchBound` over one core loop.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{EdgeType, HeapGraph, Node, NodeType};

/// One side of a traversed link: the minimal projection needed to render a
/// human-readable chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    pub id: u64,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub path: String,
    pub line: u32,
}

impl ChainEndpoint {
    fn project(node: &Node) -> Self {
        Self {
            id: node.id,
            name: node.name.name.clone(),
            node_type: node.node_type,
            path: node.name.path.clone(),
            line: node.name.line,
        }
    }
}

/// An edge actually traversed during a search: `referrer` holds `node`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainLink {
    pub referrer: ChainEndpoint,
    pub edge_type: EdgeType,
    pub node: ChainEndpoint,
}

/// Stop/prune policy for the chain search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBound {
    /// Single-shortest-path mode: the first root-reaching path wins, and no
    /// path is extended past this many links.
    MaxDepth(usize),
    /// Multi-path mode: collect up to this many chains, pruning anything
    /// longer than the first (shortest) chain found.
    MaxChains(usize),
}

/// Find shortest reference chains from the node with external id
/// `start_id` back to a GC root.
///
/// An unknown id and a start node that is itself a root both yield an
/// empty result; neither is an error at this layer.
pub fn shortest_chains(graph: &HeapGraph, start_id: u64, bound: SearchBound) -> Vec<Vec<ChainLink>> {
    match graph.node_index_by_id(start_id) {
        Some(start) => shortest_chains_from_index(graph, start, bound),
        None => {
            debug!(start_id, "chain search target not found in snapshot");
            Vec::new()
        }
    }
}

/// Same search, addressed by node-table index.
pub fn shortest_chains_from_index(
    graph: &HeapGraph,
    start: u32,
    bound: SearchBound,
) -> Vec<Vec<ChainLink>> {
    let Some(start_node) = graph.node(start) else {
        return Vec::new();
    };
    // A root has no retaining chain by definition.
    if start_node.is_gc_root() {
        return Vec::new();
    }

    let mut visited: HashSet<u32> = HashSet::from([start]);
    let mut queue: VecDeque<(u32, Vec<ChainLink>)> = VecDeque::from([(start, Vec::new())]);
    let mut chains: Vec<Vec<ChainLink>> = Vec::new();
    let mut shortest_len: Option<usize> = None;

    while let Some((index, path)) = queue.pop_front() {
        let Some(node) = graph.node(index) else {
            continue;
        };

        if node.is_gc_root() {
            if !path.is_empty() {
                match bound {
                    // BFS order guarantees the first hit is shortest.
                    SearchBound::MaxDepth(_) => return vec![path],
                    SearchBound::MaxChains(limit) => {
                        // A longer root path may already be queued from
                        // before the first chain fixed the shortest
                        // length; it is rejected here, not just at
                        // enqueue time.
                        if shortest_len.is_some_and(|s| path.len() > s) {
                            continue;
                        }
                        shortest_len.get_or_insert(path.len());
                        chains.push(path);
                        if chains.len() >= limit {
                            break;
                        }
                    }
                }
            }
            // Roots are never expanded further.
            continue;
        }

        for backref in &node.references {
            if visited.contains(&backref.from_node) {
                continue;
            }
            let Some(referrer) = graph.node(backref.from_node) else {
                continue;
            };
            // A root directly holding the search target is not an
            // informative chain; only paths with at least one real
            // intermediate holder count.
            if referrer.is_gc_root() && path.is_empty() {
                continue;
            }
            // Weak references do not keep an object alive.
            if backref.edge_type == EdgeType::Weak {
                continue;
            }
            let next_len = path.len() + 1;
            match bound {
                SearchBound::MaxDepth(max) if next_len > max => continue,
                SearchBound::MaxChains(_) => {
                    if shortest_len.is_some_and(|s| next_len > s) {
                        continue;
                    }
                }
                SearchBound::MaxDepth(_) => {}
            }

            let mut extended = path.clone();
            extended.push(ChainLink {
                referrer: ChainEndpoint::project(referrer),
                edge_type: backref.edge_type,
                node: ChainEndpoint::project(node),
            });
            visited.insert(backref.from_node);
            queue.push_back((backref.from_node, extended));
        }
    }

    chains
}
