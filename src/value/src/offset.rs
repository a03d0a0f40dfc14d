use serde::{Deserialize, Serialize};

/// A path of non-negative indices addressing a leaf inside a nested
/// record. Leaves are numbered left-to-right by [`Offset::flat_at`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Offset(pub Vec<usize>);

impl Offset {
    pub fn new(indices: impl Into<Vec<usize>>) -> Self {
        Self(indices.into())
    }

    pub fn push(&self, index: usize) -> Offset {
        let mut v = self.0.clone();
        v.push(index);
        Offset(v)
    }

    /// Walks leaves left-to-right and returns the leaf at flat index `i`,
    /// given the total ordered list of leaf offsets in a type.
    pub fn flat_at(leaves: &[Offset], i: usize) -> Option<&Offset> {
        leaves.get(i)
    }
}

impl From<Vec<usize>> for Offset {
    fn from(v: Vec<usize>) -> Self {
        Offset(v)
    }
}

impl std::fmt::Display for Offset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}
