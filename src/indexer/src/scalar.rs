use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use vast_core::errors::{Error, UnsupportedOperatorSnafu};
use vast_value::{Bitmap, CurriedPredicate, Op, Tag, Value};

use crate::coded::CodedIndex;
use crate::stats::StatsTracker;
use crate::{persist, Indexer};

/// Generates an equality/range-coded indexer for one ordered scalar Value
/// variant. int64, uint64, duration, and time all share this shape (spec
/// §4.2: "integer: one bitmap per observed byte-value... composed for
/// range predicates"); this macro is the one decomposition, instantiated
/// per tag, rather than four hand-copied near-duplicates.
macro_rules! scalar_indexer {
    ($name:ident, $key:ty, $tag:expr, $variant:ident) => {
        #[derive(Debug, Default, Serialize, Deserialize)]
        pub struct $name {
            coded: CodedIndex<$key>,
            stats: StatsTracker,
        }

        impl $name {
            pub fn new() -> Self {
                Self::default()
            }

            fn extract(value: &Value) -> Option<$key> {
                match value {
                    Value::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }

        impl Indexer for $name {
            fn tag(&self) -> Tag {
                $tag
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
                    op: format!("{} against non-{} constant", predicate.op, stringify!($variant)),
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
    };
}

scalar_indexer!(Int64Indexer, i64, Tag::Int64, Int64);
scalar_indexer!(UInt64Indexer, u64, Tag::UInt64, UInt64);
scalar_indexer!(DurationIndexer, i64, Tag::Duration, Duration);
scalar_indexer!(TimeIndexer, i64, Tag::Time, Time);
scalar_indexer!(PortIndexer, u16, Tag::Port, Port);
scalar_indexer!(BoolIndexer, bool, Tag::Bool, Bool);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_range_queries() {
        let mut idx = Int64Indexer::new();
        idx.ingest(&[
            Some(Value::Int64(1)),
            Some(Value::Int64(2)),
            None,
            Some(Value::Int64(1)),
        ]);
        let ids = |op, v| {
            idx.lookup(&CurriedPredicate::new(op, Value::Int64(v)))
                .unwrap()
                .iter()
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(Op::Eq, 1), vec![0, 3]);
        assert_eq!(ids(Op::Ge, 2), vec![1]);
        assert_eq!(idx.stats().values, 4);
    }

    #[test]
    fn unsupported_operator_is_reported() {
        let idx = Int64Indexer::new();
        let err = idx
            .lookup(&CurriedPredicate::new(Op::Matches, Value::Int64(1)))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperator { .. }));
    }
}
