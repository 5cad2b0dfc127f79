pub mod decode;
pub mod graph;
pub mod name;
pub mod resolve;
pub mod schema;
pub mod search;
pub mod strings;

pub use decode::{RawSnapshot, decode_snapshot};
pub use graph::{EdgeType, HeapGraph, NodeType};
pub use search::{ChainLink, SearchBound};

/// Error type for the snapshot engine.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    /// The byte stream is not syntactically valid JSON. Carries the
    /// position serde_json reported when tokenization failed.
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    /// The snapshot's declared schema cannot describe its flat buffers
    /// (empty field list, missing required field, truncated record).
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SnapshotError>;
