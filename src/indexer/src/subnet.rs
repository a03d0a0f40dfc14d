use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use vast_core::errors::{Error, UnsupportedOperatorSnafu};
use vast_value::{Bitmap, CurriedPredicate, Op, Tag, Value};

use crate::coded::CodedIndex;
use crate::stats::StatsTracker;
use crate::{persist, Indexer};

/// Equality-coded over a field whose own values are subnets (net +
/// prefix length), distinct from [`crate::address::AddressIndexer`]'s
/// `Op::In` over an address field and a subnet constant.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SubnetIndexer {
    coded: CodedIndex<(IpAddr, u8)>,
    stats: StatsTracker,
}

impl SubnetIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn extract(value: &Value) -> Option<(IpAddr, u8)> {
        match value {
            Value::Subnet(addr, len) => Some((*addr, *len)),
            _ => None,
        }
    }
}

impl Indexer for SubnetIndexer {
    fn tag(&self) -> Tag {
        Tag::Subnet
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
            op: format!("{} against non-subnet constant", predicate.op),
        })?;
        Ok(match predicate.op {
            Op::Eq => self.coded.eq(&key),
            Op::NotEq => self.coded.not_eq(&key),
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
    fn exact_subnet_equality() {
        let mut idx = SubnetIndexer::new();
        idx.ingest(&[Some(Value::Subnet("10.0.0.0".parse().unwrap(), 8))]);
        let ids = idx
            .lookup(&CurriedPredicate::new(
                Op::Eq,
                Value::Subnet("10.0.0.0".parse().unwrap(), 8),
            ))
            .unwrap()
            .iter()
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![0]);
    }
}
