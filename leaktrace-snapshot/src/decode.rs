// Streaming snapshot decoder.
//
// Snapshots routinely run to hundreds of megabytes, so the decoder never
// materializes a generic JSON tree. It drives `serde_json`'s reader-based
// deserializer with hand-written seeds: the top-level visitor dispatches on
// object keys, and the `nodes`/`edges`/`strings` arrays stream element by
// element into flat buffers and the string table. Only `snapshot.meta` is
// small enough to go through derived `Deserialize`.

use std::fmt;
use std::io;

use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use tracing::{debug, warn};

use crate::schema::{Schema, SnapshotHeader};
use crate::strings::StringTable;
use crate::{Result, SnapshotError};

/// Decoded-but-untyped snapshot: the string table, the record schema, and
/// the flat integer buffers exactly as they appeared in the file.
#[derive(Debug, Default)]
pub struct RawSnapshot {
    pub strings: StringTable,
    pub schema: Schema,
    pub nodes: Vec<i64>,
    pub edges: Vec<i64>,
}

/// Decode a snapshot byte stream into flat buffers plus schema.
///
/// Fails only on tokenizer-level JSON errors; a malformed scalar inside the
/// integer arrays is substituted with zero rather than aborting a
/// multi-hundred-megabyte parse.
pub fn decode_snapshot<R: io::Read>(reader: R) -> Result<RawSnapshot> {
    let mut de = serde_json::Deserializer::from_reader(io::BufReader::new(reader));
    let collector = de
        .deserialize_map(TopLevelVisitor)
        .map_err(parse_error)?;
    de.end().map_err(parse_error)?;

    let schema = Schema::from_header(&collector.header);
    check_declared_counts(&schema, &collector);
    debug!(
        strings = collector.strings.len(),
        node_values = collector.nodes.len(),
        edge_values = collector.edges.len(),
        "snapshot decoded"
    );

    Ok(RawSnapshot {
        strings: collector.strings,
        schema,
        nodes: collector.nodes,
        edges: collector.edges,
    })
}

fn parse_error(err: serde_json::Error) -> SnapshotError {
    SnapshotError::Parse {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn check_declared_counts(schema: &Schema, collector: &Collector) {
    if let Some(count) = schema.declared_node_count {
        let expected = count as usize * schema.node_stride();
        if expected != collector.nodes.len() {
            warn!(
                declared = count,
                actual_values = collector.nodes.len(),
                stride = schema.node_stride(),
                "declared node_count disagrees with node buffer length"
            );
        }
    }
    if let Some(count) = schema.declared_edge_count {
        let expected = count as usize * schema.edge_stride();
        if expected != collector.edges.len() {
            warn!(
                declared = count,
                actual_values = collector.edges.len(),
                stride = schema.edge_stride(),
                "declared edge_count disagrees with edge buffer length"
            );
        }
    }
}

#[derive(Default)]
struct Collector {
    header: SnapshotHeader,
    strings: StringTable,
    nodes: Vec<i64>,
    edges: Vec<i64>,
}

// ── Top-level section dispatch ─────────────────────────────────────

struct TopLevelVisitor;

impl<'de> Visitor<'de> for TopLevelVisitor {
    type Value = Collector;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a heap snapshot object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Collector, A::Error> {
        let mut out = Collector::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "snapshot" => out.header = map.next_value()?,
                "strings" => map.next_value_seed(StringsSeed(&mut out.strings))?,
                "nodes" => map.next_value_seed(FlatBufferSeed(&mut out.nodes))?,
                "edges" => map.next_value_seed(FlatBufferSeed(&mut out.edges))?,
                // trace_trees, samples, locations, future sections
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(out)
    }
}

// ── Flat integer buffers (`nodes`, `edges`) ────────────────────────

struct FlatBufferSeed<'a>(&'a mut Vec<i64>);

impl<'de> DeserializeSeed<'de> for FlatBufferSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, de: D) -> std::result::Result<(), D::Error> {
        de.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for FlatBufferSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flat array of integers")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        while let Some(LenientInt(value)) = seq.next_element()? {
            self.0.push(value);
        }
        Ok(())
    }
}

/// An integer decoded under the lenient-numeric policy: anything that is
/// not cleanly an integer becomes zero instead of failing the decode.
struct LenientInt(i64);

impl<'de> serde::Deserialize<'de> for LenientInt {
    fn deserialize<D: Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        de.deserialize_any(LenientIntVisitor)
    }
}

struct LenientIntVisitor;

impl Visitor<'_> for LenientIntVisitor {
    type Value = LenientInt;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer-like scalar")
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<LenientInt, E>
    where
        E: serde::de::Error,
    {
        Ok(LenientInt(v))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<LenientInt, E>
    where
        E: serde::de::Error,
    {
        Ok(LenientInt(i64::try_from(v).unwrap_or(0)))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn visit_f64<E>(self, v: f64) -> std::result::Result<LenientInt, E>
    where
        E: serde::de::Error,
    {
        Ok(LenientInt(if v.is_finite() { v as i64 } else { 0 }))
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<LenientInt, E>
    where
        E: serde::de::Error,
    {
        Ok(LenientInt(parse_lenient(v)))
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<LenientInt, E>
    where
        E: serde::de::Error,
    {
        Ok(LenientInt(i64::from(v)))
    }

    fn visit_unit<E>(self) -> std::result::Result<LenientInt, E>
    where
        E: serde::de::Error,
    {
        Ok(LenientInt(0))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_lenient(text: &str) -> i64 {
    text.parse::<i64>().unwrap_or_else(|_| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map_or(0, |f| f as i64)
    })
}

// ── String table section ───────────────────────────────────────────

struct StringsSeed<'a>(&'a mut StringTable);

impl<'de> DeserializeSeed<'de> for StringsSeed<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, de: D) -> std::result::Result<(), D::Error> {
        de.deserialize_seq(self)
    }
}

impl<'de> Visitor<'de> for StringsSeed<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("the snapshot strings array")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let mut index = 0;
        while let Some(ScalarString(value)) = seq.next_element()? {
            self.0.push_at(index, value);
            index += 1;
        }
        Ok(())
    }
}

/// Any JSON scalar coerced to its string form; non-string scalars do occur
/// in producer output and are stored by their literal text.
struct ScalarString(String);

impl<'de> serde::Deserialize<'de> for ScalarString {
    fn deserialize<D: Deserializer<'de>>(de: D) -> std::result::Result<Self, D::Error> {
        de.deserialize_any(ScalarStringVisitor)
    }
}

struct ScalarStringVisitor;

impl Visitor<'_> for ScalarStringVisitor {
    type Value = ScalarString;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar string-table entry")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString(v.to_string()))
    }

    fn visit_string<E>(self, v: String) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString(v))
    }

    fn visit_i64<E>(self, v: i64) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString(v.to_string()))
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString(v.to_string()))
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString(v.to_string()))
    }

    fn visit_bool<E>(self, v: bool) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString(v.to_string()))
    }

    fn visit_unit<E>(self) -> std::result::Result<ScalarString, E>
    where
        E: serde::de::Error,
    {
        Ok(ScalarString("null".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "snapshot": {
            "meta": {
                "node_fields": ["type", "name", "id", "edge_count"],
                "node_types": [["hidden", "object"], "string", "number", "number"],
                "edge_fields": ["type", "name_or_index", "to_node"],
                "edge_types": [["context", "element", "property"], "string_or_number", "node"]
            },
            "node_count": 2,
            "edge_count": 1
        },
        "nodes": [1, 0, 100, 1, 1, 1, 200, 0],
        "edges": [2, 2, 4],
        "strings": ["alpha", "beta", "next"]
    }"#;

    #[test]
    fn decodes_all_sections() {
        let raw = decode_snapshot(MINIMAL.as_bytes()).unwrap();
        assert_eq!(raw.strings.len(), 3);
        assert_eq!(raw.nodes, vec![1, 0, 100, 1, 1, 1, 200, 0]);
        assert_eq!(raw.edges, vec![2, 2, 4]);
        assert_eq!(raw.schema.node_stride(), 4);
        assert_eq!(raw.schema.node_type_name(1), "object");
    }

    #[test]
    fn string_table_matches_file_array_length() {
        let raw = decode_snapshot(MINIMAL.as_bytes()).unwrap();
        // Property from the format contract: file array size == table size.
        assert_eq!(raw.strings.len(), 3);
        assert_eq!(raw.strings.get(2), "next");
    }

    #[test]
    fn ignores_unknown_sections() {
        let input = r#"{
            "snapshot": {"meta": {"node_fields": ["id"], "node_types": ["number"], "edge_fields": [], "edge_types": []}},
            "trace_function_infos": [1, 2, 3],
            "locations": [[0, 1], [2, 3]],
            "nodes": [7],
            "edges": [],
            "strings": []
        }"#;
        let raw = decode_snapshot(input.as_bytes()).unwrap();
        assert_eq!(raw.nodes, vec![7]);
    }

    #[test]
    fn lenient_numeric_policy_substitutes_zero() {
        let input = r#"{
            "snapshot": {"meta": {"node_fields": ["id"], "node_types": ["number"], "edge_fields": [], "edge_types": []}},
            "nodes": ["12", "bogus", 3.7, null, true],
            "edges": [],
            "strings": []
        }"#;
        let raw = decode_snapshot(input.as_bytes()).unwrap();
        assert_eq!(raw.nodes, vec![12, 0, 3, 0, 1]);
    }

    #[test]
    fn non_string_scalars_in_strings_section() {
        let input = r#"{
            "snapshot": {},
            "nodes": [],
            "edges": [],
            "strings": ["a", 42, null, 1.5]
        }"#;
        let raw = decode_snapshot(input.as_bytes()).unwrap();
        assert_eq!(raw.strings.len(), 4);
        assert_eq!(raw.strings.get(1), "42");
        assert_eq!(raw.strings.get(2), "null");
        assert_eq!(raw.strings.get(3), "1.5");
    }

    #[test]
    fn malformed_stream_reports_position() {
        let err = decode_snapshot(r#"{"nodes": [1, 2"#.as_bytes()).unwrap_err();
        match err {
            SnapshotError::Parse { line, .. } => assert_eq!(line, 1),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn non_object_top_level_is_a_parse_error() {
        let err = decode_snapshot(b"[1, 2, 3]".as_slice()).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { .. }));
    }
}
