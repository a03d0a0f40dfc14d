use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use vast_core::errors::{Error, UnsupportedOperatorSnafu};
use vast_value::{Bitmap, CurriedPredicate, Op, Tag, Value};

use crate::coded::CodedIndex;
use crate::stats::StatsTracker;
use crate::{persist, Indexer};

/// `f64` doesn't implement `Ord`; `OrderedF64` gives the coded index a
/// total order via `f64::total_cmp` so doubles can share the same
/// equality/range scheme as the other scalar indexers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct OrderedF64(f64);

impl Eq for OrderedF64 {}
impl PartialOrd for OrderedF64 {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for OrderedF64 {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DoubleIndexer {
    coded: CodedIndex<OrderedF64>,
    stats: StatsTracker,
}

impl DoubleIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn extract(value: &Value) -> Option<OrderedF64> {
        match value {
            Value::Double(v) => Some(OrderedF64(*v)),
            _ => None,
        }
    }
}

impl Indexer for DoubleIndexer {
    fn tag(&self) -> Tag {
        Tag::Double
    }

    fn len(&self) -> u32 {
        self.coded.len()
    }

    fn ingest_values(&mut self, values: &[Option<Value>]) {
        for value in values {
            match value.as_ref().and_then(Self::extract) {
                Some(key) => self.coded.append_present(key),
                None => self.coded.append_absent(),
            }
        }
    }

    fn lookup(&self, predicate: &CurriedPredicate) -> Result<Bitmap, Error> {
        let key = Self::extract(&predicate.value).context(UnsupportedOperatorSnafu {
            op: format!("{} against non-double constant", predicate.op),
        })?;
        Ok(match predicate.op {
            Op::Eq => self.coded.eq(&key),
            Op::NotEq => self.coded.not_eq(&key),
            Op::Lt => self.coded.select(|k| *k < key),
            Op::Le => self.coded.select(|k| *k <= key),
            Op::Gt => self.coded.select(|k| *k > key),
            Op::Ge => self.coded.select(|k| *k >= key),
            _ => {
                return UnsupportedOperatorSnafu {
                    op: predicate.op.to_string(),
                }
                .fail()
            }
        })
    }

    fn flush(&self, path: &Path) -> Result<(), Error> {
        persist::atomic_write_json(path, self)
    }

    fn stats_tracker(&self) -> &StatsTracker {
        &self.stats
    }

    fn stats_tracker_mut(&mut self) -> &mut StatsTracker {
        &mut self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_and_ordering() {
        let mut idx = DoubleIndexer::new();
        idx.ingest(&[Some(Value::Double(1.5)), Some(Value::Double(-2.0)), None]);
        let ids = idx
            .lookup(&CurriedPredicate::new(Op::Gt, Value::Double(0.0)))
            .unwrap()
            .iter()
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![0]);
    }
}
