// Integration test utilities and snapshot fixture construction.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;

const NODE_TYPES: &[&str] = &[
    "hidden",
    "array",
    "string",
    "object",
    "code",
    "closure",
    "regexp",
    "number",
    "native",
    "synthetic",
];

const EDGE_TYPES: &[&str] = &[
    "context",
    "element",
    "property",
    "internal",
    "hidden",
    "shortcut",
    "weak",
];

const NODE_STRIDE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(usize);

#[derive(Debug, Clone)]
struct EdgeSpec {
    from: usize,
    type_index: usize,
    name_or_index: i64,
    to: usize,
}

/// Programmatic builder for well-formed snapshot JSON, so integration
/// tests describe heaps as object graphs instead of hand-counted flat
/// integer buffers.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    strings: Vec<String>,
    interned: HashMap<String, usize>,
    // (type index, name string index, external id)
    nodes: Vec<(usize, usize, u64)>,
    edges: Vec<EdgeSpec>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn intern(&mut self, value: &str) -> usize {
        if let Some(&index) = self.interned.get(value) {
            return index;
        }
        let index = self.strings.len();
        self.strings.push(value.to_string());
        self.interned.insert(value.to_string(), index);
        index
    }

    fn type_index(node_type: &str) -> usize {
        NODE_TYPES
            .iter()
            .position(|&t| t == node_type)
            .unwrap_or_else(|| panic!("unknown node type: {node_type}"))
    }

    fn edge_type_index(edge_type: &str) -> usize {
        EDGE_TYPES
            .iter()
            .position(|&t| t == edge_type)
            .unwrap_or_else(|| panic!("unknown edge type: {edge_type}"))
    }

    /// Add a node. External ids are assigned sequentially from 1 in
    /// insertion order.
    pub fn node(&mut self, node_type: &str, name: &str) -> NodeHandle {
        let type_index = Self::type_index(node_type);
        let name_index = self.intern(name);
        let id = self.nodes.len() as u64 + 1;
        self.nodes.push((type_index, name_index, id));
        NodeHandle(self.nodes.len() - 1)
    }

    /// Add a synthetic GC root node.
    pub fn gc_root(&mut self) -> NodeHandle {
        self.node("synthetic", "(GC root)")
    }

    /// Named edge (property, internal, weak, ...).
    pub fn edge(&mut self, from: NodeHandle, edge_type: &str, name: &str, to: NodeHandle) {
        let name_index = self.intern(name) as i64;
        self.edges.push(EdgeSpec {
            from: from.0,
            type_index: Self::edge_type_index(edge_type),
            name_or_index: name_index,
            to: to.0,
        });
    }

    /// Indexed element edge, as emitted for array slots.
    pub fn element(&mut self, from: NodeHandle, index: i64, to: NodeHandle) {
        self.edges.push(EdgeSpec {
            from: from.0,
            type_index: Self::edge_type_index("element"),
            name_or_index: index,
            to: to.0,
        });
    }

    /// External id of a node, as assigned at insertion.
    pub fn id(&self, handle: NodeHandle) -> u64 {
        self.nodes[handle.0].2
    }

    /// Serialize to the flat-buffer snapshot JSON document.
    #[allow(clippy::cast_possible_wrap)]
    pub fn build_json(&self) -> String {
        let mut nodes = Vec::with_capacity(self.nodes.len() * NODE_STRIDE);
        for (index, &(type_index, name_index, id)) in self.nodes.iter().enumerate() {
            let edge_count = self.edges.iter().filter(|e| e.from == index).count();
            nodes.push(type_index as i64);
            nodes.push(name_index as i64);
            nodes.push(id as i64);
            nodes.push(edge_count as i64);
        }

        // Edge records grouped by source node, in node-table order.
        let mut edges = Vec::new();
        for index in 0..self.nodes.len() {
            for spec in self.edges.iter().filter(|e| e.from == index) {
                edges.push(spec.type_index as i64);
                edges.push(spec.name_or_index);
                edges.push((spec.to * NODE_STRIDE) as i64);
            }
        }

        let doc = serde_json::json!({
            "snapshot": {
                "meta": {
                    "node_fields": ["type", "name", "id", "edge_count"],
                    "node_types": [NODE_TYPES, "string", "number", "number"],
                    "edge_fields": ["type", "name_or_index", "to_node"],
                    "edge_types": [EDGE_TYPES, "string_or_number", "node"]
                },
                "node_count": self.nodes.len(),
                "edge_count": self.edges.len()
            },
            "nodes": nodes,
            "edges": edges,
            "strings": self.strings,
        });
        doc.to_string()
    }

    /// Write the snapshot JSON to a temporary file.
    pub fn write(&self) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp snapshot");
        file.write_all(self.build_json().as_bytes())
            .expect("write snapshot fixture");
        file
    }
}

/// Decode a snapshot file through the task registry, the same path the
/// CLI takes.
pub fn decode_fixture(
    path: &Path,
) -> leaktrace_core::Result<std::sync::Arc<leaktrace_snapshot::HeapGraph>> {
    let registry = leaktrace_core::TaskRegistry::new();
    let id = registry.create_task(path)?;
    registry.require_task(id)
}
