// Typed heap graph built from the flat snapshot buffers.
//
// Three passes over the decoded buffers: node records, edge records, then
// back-reference wiring. Edges are stored grouped by their source node in
// table order, so a single running cursor paired with each node's declared
// `edge_count` recovers ownership; reversing those edges onto their targets
// yields the "who holds this object" index the chain search runs on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::decode::RawSnapshot;
use crate::name::DisplayName;
use crate::{Result, SnapshotError};

// ── Type enums ─────────────────────────────────────────────────────

/// Node category as declared by the snapshot's `node_types` enum table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    #[serde(rename = "hidden")]
    Hidden,
    #[serde(rename = "array")]
    Array,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "code")]
    Code,
    #[serde(rename = "closure")]
    Closure,
    #[serde(rename = "regexp")]
    Regexp,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "synthetic")]
    Synthetic,
    #[serde(rename = "concatenated string")]
    ConcatenatedString,
    #[serde(rename = "sliced string")]
    SlicedString,
    #[serde(rename = "symbol")]
    Symbol,
    #[serde(rename = "bigint")]
    Bigint,
    #[serde(rename = "framework")]
    Framework,
    #[serde(other, rename = "unknown")]
    Unknown,
}

impl NodeType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "hidden" => Self::Hidden,
            "array" => Self::Array,
            "string" => Self::String,
            "object" => Self::Object,
            "code" => Self::Code,
            "closure" => Self::Closure,
            "regexp" => Self::Regexp,
            "number" => Self::Number,
            "native" => Self::Native,
            "synthetic" => Self::Synthetic,
            "concatenated string" => Self::ConcatenatedString,
            "sliced string" => Self::SlicedString,
            "symbol" => Self::Symbol,
            "bigint" => Self::Bigint,
            "framework" => Self::Framework,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hidden => "hidden",
            Self::Array => "array",
            Self::String => "string",
            Self::Object => "object",
            Self::Code => "code",
            Self::Closure => "closure",
            Self::Regexp => "regexp",
            Self::Number => "number",
            Self::Native => "native",
            Self::Synthetic => "synthetic",
            Self::ConcatenatedString => "concatenated string",
            Self::SlicedString => "sliced string",
            Self::Symbol => "symbol",
            Self::Bigint => "bigint",
            Self::Framework => "framework",
            Self::Unknown => "unknown",
        }
    }
}

/// Edge category as declared by the snapshot's `edge_types` enum table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeType {
    Context,
    Element,
    Property,
    Internal,
    Hidden,
    Shortcut,
    Weak,
    #[serde(other)]
    Unknown,
}

impl EdgeType {
    pub fn from_name(name: &str) -> Self {
        match name {
            "context" => Self::Context,
            "element" => Self::Element,
            "property" => Self::Property,
            "internal" => Self::Internal,
            "hidden" => Self::Hidden,
            "shortcut" => Self::Shortcut,
            "weak" => Self::Weak,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Context => "context",
            Self::Element => "element",
            Self::Property => "property",
            Self::Internal => "internal",
            Self::Hidden => "hidden",
            Self::Shortcut => "shortcut",
            Self::Weak => "weak",
            Self::Unknown => "unknown",
        }
    }
}

// ── Graph records ──────────────────────────────────────────────────

/// A reverse edge recorded on the *target* node: who points at it, through
/// which edge category, under which label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackRef {
    pub from_node: u32,
    pub edge_type: EdgeType,
    pub name_or_index: String,
}

/// One captured object/value.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: u64,
    pub node_type: NodeType,
    pub name: DisplayName,
    pub edge_count: u32,
    pub references: Vec<BackRef>,
}

impl Node {
    /// GC-root classification: inherently reachable nodes that need no
    /// retaining chain of their own.
    pub fn is_gc_root(&self) -> bool {
        matches!(self.node_type, NodeType::Synthetic | NodeType::Hidden)
            || matches!(self.name.name.as_str(), "(GC root)" | "(root)" | "(global)")
            || self.name.name.starts_with("(V8 internal)")
    }
}

/// One forward reference. `to_node` is a node-table index (the raw field
/// is a slot offset into the flat node buffer); `None` marks a target the
/// builder rejected as out of range.
#[derive(Debug, Clone)]
pub struct Edge {
    pub edge_type: EdgeType,
    pub name_or_index: String,
    pub to_node: Option<u32>,
}

/// Immutable object graph for one snapshot. Built in a single pass and
/// read-only afterwards; safe to share across concurrent searches.
#[derive(Debug, Default)]
pub struct HeapGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    id_to_index: HashMap<u64, u32>,
}

impl HeapGraph {
    /// Decode-and-build convenience for a complete byte stream.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        Self::build(crate::decode::decode_snapshot(reader)?)
    }

    /// Build the typed graph from decoded flat buffers.
    #[allow(clippy::cast_possible_truncation)]
    pub fn build(raw: RawSnapshot) -> Result<Self> {
        let node_stride = raw.schema.node_stride();
        if node_stride == 0 && !raw.nodes.is_empty() {
            return Err(SnapshotError::Schema(
                "node buffer present but node_fields is empty".to_string(),
            ));
        }
        let edge_stride = raw.schema.edge_stride();
        if edge_stride == 0 && !raw.edges.is_empty() {
            return Err(SnapshotError::Schema(
                "edge buffer present but edge_fields is empty".to_string(),
            ));
        }

        let node_count = if node_stride == 0 {
            0
        } else {
            if raw.nodes.len() % node_stride != 0 {
                warn!(
                    values = raw.nodes.len(),
                    stride = node_stride,
                    "node buffer length is not a stride multiple; ignoring trailing values"
                );
            }
            raw.nodes.len() / node_stride
        };

        // Node pass.
        let npos = raw.schema.node_positions;
        let mut nodes = Vec::with_capacity(node_count);
        let mut id_to_index = HashMap::with_capacity(node_count);
        for i in 0..node_count {
            let record = &raw.nodes[i * node_stride..(i + 1) * node_stride];
            let node_type =
                NodeType::from_name(raw.schema.node_type_name(field(record, npos.node_type)));
            let name_index = usize::try_from(field(record, npos.name)).unwrap_or(usize::MAX);
            let name = DisplayName::parse(raw.strings.get(name_index));
            let id = u64::try_from(field(record, npos.id)).unwrap_or(0);
            let edge_count = u32::try_from(field(record, npos.edge_count)).unwrap_or(0);
            id_to_index.insert(id, i as u32);
            nodes.push(Node {
                id,
                node_type,
                name,
                edge_count,
                references: Vec::new(),
            });
        }

        // Edge pass.
        let epos = raw.schema.edge_positions;
        let edge_records = if edge_stride == 0 {
            0
        } else {
            raw.edges.len() / edge_stride
        };
        let mut edges = Vec::with_capacity(edge_records);
        let mut rejected_targets = 0usize;
        for i in 0..edge_records {
            let record = &raw.edges[i * edge_stride..(i + 1) * edge_stride];
            let edge_type =
                EdgeType::from_name(raw.schema.edge_type_name(field(record, epos.edge_type)));
            let raw_name = field(record, epos.name_or_index);
            // Element edges index into arrays; the raw value is the index
            // itself, not a string-table reference.
            let name_or_index = if edge_type == EdgeType::Element {
                raw_name.to_string()
            } else {
                raw.strings
                    .get(usize::try_from(raw_name).unwrap_or(usize::MAX))
                    .to_string()
            };
            let to_node = resolve_target(field(record, epos.to_node), node_stride, node_count);
            if to_node.is_none() {
                rejected_targets += 1;
            }
            edges.push(Edge {
                edge_type,
                name_or_index,
                to_node,
            });
        }
        if rejected_targets > 0 {
            warn!(rejected_targets, "edges with out-of-range targets skipped");
        }

        // Back-reference pass: one running cursor, `edge_count` edges per
        // node in table order. Incoming lists are built separately and
        // attached afterwards so no node grows while it is being read.
        let mut incoming: Vec<Vec<BackRef>> = vec![Vec::new(); node_count];
        let mut cursor = 0usize;
        for (index, node) in nodes.iter().enumerate() {
            let owned = node.edge_count as usize;
            for edge in edges.iter().skip(cursor).take(owned) {
                if let Some(target) = edge.to_node {
                    incoming[target as usize].push(BackRef {
                        from_node: index as u32,
                        edge_type: edge.edge_type,
                        name_or_index: edge.name_or_index.clone(),
                    });
                }
            }
            cursor += owned;
        }
        if cursor != edges.len() {
            warn!(
                declared = cursor,
                actual = edges.len(),
                "sum of node edge_counts disagrees with edge table length"
            );
        }
        for (node, refs) in nodes.iter_mut().zip(incoming) {
            node.references = refs;
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            "heap graph built"
        );
        Ok(Self {
            nodes,
            edges,
            id_to_index,
        })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: u32) -> Option<&Node> {
        self.nodes.get(index as usize)
    }

    pub fn node_index_by_id(&self, id: u64) -> Option<u32> {
        self.id_to_index.get(&id).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn gc_root_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_gc_root()).count()
    }
}

fn field(record: &[i64], position: Option<usize>) -> i64 {
    position.and_then(|p| record.get(p)).copied().unwrap_or(0)
}

#[allow(clippy::cast_possible_truncation)]
fn resolve_target(raw_to_node: i64, node_stride: usize, node_count: usize) -> Option<u32> {
    if node_stride == 0 || raw_to_node < 0 {
        return None;
    }
    let index = (raw_to_node as usize) / node_stride;
    (index < node_count).then(|| index as u32)
}
