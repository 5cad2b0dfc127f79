// Snapshot schema — field order and enum tables for the flat buffers.
//
// Producers declare the record layout in `snapshot.meta`; nothing here is
// hard-coded to a fixed field count, so a producer adding trailing fields
// only widens the stride. Unrecognized field names are retained in the
// field lists but not specially interpreted.

use serde::Deserialize;

/// One entry of a `node_types`/`edge_types` table: either a scalar type
/// name ("number", "string") or the enum row for that field's values.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeEntry {
    Enum(Vec<String>),
    Scalar(String),
}

/// The `snapshot.meta` object as it appears in the file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotMeta {
    #[serde(default)]
    pub node_fields: Vec<String>,
    #[serde(default)]
    pub node_types: Vec<TypeEntry>,
    #[serde(default)]
    pub edge_fields: Vec<String>,
    #[serde(default)]
    pub edge_types: Vec<TypeEntry>,
}

/// The top-level `snapshot` object: meta plus optional declared counts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotHeader {
    #[serde(default)]
    pub meta: SnapshotMeta,
    #[serde(default)]
    pub node_count: Option<u64>,
    #[serde(default)]
    pub edge_count: Option<u64>,
}

/// Positions of the recognized node fields within one node record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NodeFieldPositions {
    pub node_type: Option<usize>,
    pub name: Option<usize>,
    pub id: Option<usize>,
    pub edge_count: Option<usize>,
}

/// Positions of the recognized edge fields within one edge record.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeFieldPositions {
    pub edge_type: Option<usize>,
    pub name_or_index: Option<usize>,
    pub to_node: Option<usize>,
}

/// Resolved record layout for one snapshot: strides, recognized field
/// positions, and the enum rows the `type` fields index into.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub node_fields: Vec<String>,
    pub edge_fields: Vec<String>,
    pub node_positions: NodeFieldPositions,
    pub edge_positions: EdgeFieldPositions,
    node_type_row: Vec<String>,
    edge_type_row: Vec<String>,
    pub declared_node_count: Option<u64>,
    pub declared_edge_count: Option<u64>,
}

fn position(fields: &[String], name: &str) -> Option<usize> {
    fields.iter().position(|f| f == name)
}

fn enum_row(types: &[TypeEntry], index: Option<usize>) -> Vec<String> {
    match index.and_then(|i| types.get(i)) {
        Some(TypeEntry::Enum(row)) => row.clone(),
        _ => Vec::new(),
    }
}

impl Schema {
    pub fn from_header(header: &SnapshotHeader) -> Self {
        let meta = &header.meta;
        let node_positions = NodeFieldPositions {
            node_type: position(&meta.node_fields, "type"),
            name: position(&meta.node_fields, "name"),
            id: position(&meta.node_fields, "id"),
            edge_count: position(&meta.node_fields, "edge_count"),
        };
        let edge_positions = EdgeFieldPositions {
            edge_type: position(&meta.edge_fields, "type"),
            name_or_index: position(&meta.edge_fields, "name_or_index"),
            to_node: position(&meta.edge_fields, "to_node"),
        };
        Self {
            node_type_row: enum_row(&meta.node_types, node_positions.node_type),
            edge_type_row: enum_row(&meta.edge_types, edge_positions.edge_type),
            node_fields: meta.node_fields.clone(),
            edge_fields: meta.edge_fields.clone(),
            node_positions,
            edge_positions,
            declared_node_count: header.node_count,
            declared_edge_count: header.edge_count,
        }
    }

    /// Number of integers per node record.
    pub fn node_stride(&self) -> usize {
        self.node_fields.len()
    }

    /// Number of integers per edge record.
    pub fn edge_stride(&self) -> usize {
        self.edge_fields.len()
    }

    /// Map a raw node `type` value through the node-type enum row.
    /// Out-of-range values resolve to the empty string.
    pub fn node_type_name(&self, value: i64) -> &str {
        lookup_row(&self.node_type_row, value)
    }

    /// Map a raw edge `type` value through the edge-type enum row.
    pub fn edge_type_name(&self, value: i64) -> &str {
        lookup_row(&self.edge_type_row, value)
    }
}

fn lookup_row(row: &[String], value: i64) -> &str {
    usize::try_from(value)
        .ok()
        .and_then(|i| row.get(i))
        .map_or("", String::as_str)
}
