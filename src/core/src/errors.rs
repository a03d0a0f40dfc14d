use std::io;
use std::path::PathBuf;

use snafu::Snafu;

pub type Result<T> = std::result::Result<T, Error>;

/// The closed error taxonomy for the ingestion/index/accountant core.
///
/// Every downstream crate reuses this type instead of minting its own so
/// that a caller composing ingestor, partition, and accountant never has
/// to juggle multiple incompatible error enums.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("filesystem error at {}: {source}", path.display()))]
    Filesystem { path: PathBuf, source: io::Error },

    #[snafu(display("schema mismatch merging into {what}"))]
    SchemaMismatch { what: String },

    #[snafu(display("unsupported operator {op} for indexer value kind"))]
    UnsupportedOperator { op: String },

    #[snafu(display("protocol violation: {what}"))]
    ProtocolViolation { what: String },

    #[snafu(display("parse error: {what}"))]
    Parse { what: String },

    #[snafu(display("end of input"))]
    EndOfInput,

    #[snafu(display("serialization error: {source}"))]
    Serialization { source: serde_json::Error },

    #[snafu(display("encode/decode error: {what}"))]
    Codec { what: String },
}

// re-exported so callers don't need a direct serde_json dependency just
// to name the Serialization variant's source type.
pub use serde_json;
