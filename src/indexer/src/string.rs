use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use vast_core::errors::{Error, UnsupportedOperatorSnafu};
use vast_value::{Bitmap, CurriedPredicate, Op, Tag, Value};

use crate::coded::CodedIndex;
use crate::stats::StatsTracker;
use crate::{persist, Indexer};

/// Backs both `Tag::String` and `Tag::Regex` leaves: a regex-typed field
/// still holds its value as text, and the interesting regex behavior
/// (`Op::Matches`) is a query-side operator any string-shaped field can
/// answer, not a property of the field's own tag.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StringIndexer {
    coded: CodedIndex<String>,
    stats: StatsTracker,
}

impl StringIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn extract(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Regex(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl Indexer for StringIndexer {
    fn tag(&self) -> Tag {
        Tag::String
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
        match predicate.op {
            Op::Eq | Op::NotEq | Op::Prefix | Op::Suffix => {
                let needle = Self::extract(&predicate.value).context(UnsupportedOperatorSnafu {
                    op: format!("{} against non-string constant", predicate.op),
                })?;
                Ok(match predicate.op {
                    Op::Eq => self.coded.eq(&needle),
                    Op::NotEq => self.coded.not_eq(&needle),
                    Op::Prefix => self.coded.select(|k| k.starts_with(&needle)),
                    Op::Suffix => self.coded.select(|k| k.ends_with(&needle)),
                    _ => unreachable!(),
                })
            }
            Op::Matches => {
                let pattern = Self::extract(&predicate.value).context(UnsupportedOperatorSnafu {
                    op: "matches against non-string constant".to_string(),
                })?;
                let re = Regex::new(&pattern).map_err(|e| Error::Parse {
                    what: format!("invalid regex {pattern:?}: {e}"),
                })?;
                Ok(self.coded.select(|k| re.is_match(k)))
            }
            _ => UnsupportedOperatorSnafu {
                op: predicate.op.to_string(),
            }
            .fail(),
        }
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
    fn prefix_suffix_and_matches() {
        let mut idx = StringIndexer::new();
        idx.ingest(&[
            Some(Value::String("foo.bar".into())),
            Some(Value::String("foo.baz".into())),
            Some(Value::String("qux".into())),
        ]);
        let eq = idx
            .lookup(&CurriedPredicate::new(Op::Eq, Value::String("qux".into())))
            .unwrap();
        assert_eq!(eq.iter().collect::<Vec<_>>(), vec![2]);

        let prefix = idx
            .lookup(&CurriedPredicate::new(Op::Prefix, Value::String("foo.".into())))
            .unwrap();
        assert_eq!(prefix.iter().collect::<Vec<_>>(), vec![0, 1]);

        let matches = idx
            .lookup(&CurriedPredicate::new(Op::Matches, Value::String(r"^foo\.ba[rz]$".into())))
            .unwrap();
        assert_eq!(matches.iter().collect::<Vec<_>>(), vec![0, 1]);
    }
}
