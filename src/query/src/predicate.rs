use serde::{Deserialize, Serialize};
use vast_value::{Offset, Op, Tag, Value};

/// A predicate AST node. Represented as a flat tagged union and
/// dispatched by pattern matching rather than a visitor hierarchy, since
/// the whole tree is closed and known up front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Predicate {
    /// Matches against the partition's `first_event_time`/`last_event_time` range.
    Timestamp(Op, Value),
    /// Matches against the event type's name.
    Name(Op, Value),
    /// Matches against every indexer whose leaf carries this tag.
    Type(Tag, Op, Value),
    /// Matches against every indexer whose field path ends with this
    /// suffix and whose leaf tag matches `value`'s tag.
    Schema(Vec<String>, Op, Value),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

/// Identifies one resident indexer inside a partition: the dotted field
/// path from the schema root plus the leaf's offset and tag. Two leaves
/// with the same path and tag are the same indexer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexerKey {
    pub offset: Offset,
    pub path: Vec<String>,
    pub tag: Tag,
}

impl IndexerKey {
    pub fn new(offset: Offset, path: Vec<String>, tag: Tag) -> Self {
        Self { offset, path, tag }
    }

    /// The on-disk path segment under the partition directory, per the
    /// `<type>/<k1>/.../<kN>` layout.
    pub fn path_components(&self) -> Vec<String> {
        let mut components = vec![format!("{:?}", self.tag).to_lowercase()];
        components.extend(self.path.iter().cloned());
        components
    }
}
