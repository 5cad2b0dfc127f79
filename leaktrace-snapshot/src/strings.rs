// Snapshot string table — position-indexed, immutable after decode.
//
// The `strings` array in a snapshot is addressed purely by position; the
// same text may legitimately appear at several indices. The decoder feeds
// entries in array order, and `push_at` only fills an index that is not
// already occupied, so a re-delivered element can never shift the table.

/// Deduplicated-by-position string storage referenced by index from the
/// flat node/edge buffers.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    entries: Vec<String>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` at `index` if that slot has not been filled yet.
    ///
    /// Indices arrive in array order during decode, so the only accepted
    /// write is an append at the current length. A repeated delivery of an
    /// already-filled index is suppressed.
    pub fn push_at(&mut self, index: usize, value: String) {
        if index >= self.entries.len() {
            self.entries.push(value);
        }
    }

    /// Look up a string by table index. Out-of-range indices resolve to
    /// the empty string rather than failing the caller.
    pub fn get(&self, index: usize) -> &str {
        self.entries.get(index).map_or("", String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<String>> for StringTable {
    fn from(entries: Vec<String>) -> Self {
        Self { entries }
    }
}
