use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use snafu::OptionExt;
use vast_core::errors::{Error, UnsupportedOperatorSnafu};
use vast_value::{Bitmap, CurriedPredicate, Op, Tag, Value};

use crate::coded::CodedIndex;
use crate::stats::StatsTracker;
use crate::{persist, Indexer};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AddressIndexer {
    coded: CodedIndex<IpAddr>,
    stats: StatsTracker,
}

impl AddressIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn extract(value: &Value) -> Option<IpAddr> {
        match value {
            Value::Address(a) => Some(*a),
            _ => None,
        }
    }
}

/// Address-within-subnet containment, used by `Op::In`/`Op::NotIn` over a
/// `Value::Subnet` constant.
pub fn subnet_contains(addr: IpAddr, net: IpAddr, prefix_len: u8) -> bool {
    match (addr, net) {
        (IpAddr::V4(a), IpAddr::V4(n)) => {
            let mask = if prefix_len == 0 { 0 } else { u32::MAX << (32 - prefix_len) };
            u32::from(a) & mask == u32::from(n) & mask
        }
        (IpAddr::V6(a), IpAddr::V6(n)) => {
            let mask = if prefix_len == 0 { 0 } else { u128::MAX << (128 - prefix_len) };
            u128::from(a) & mask == u128::from(n) & mask
        }
        _ => false,
    }
}

impl Indexer for AddressIndexer {
    fn tag(&self) -> Tag {
        Tag::Address
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
            Op::Eq | Op::NotEq => {
                let key = Self::extract(&predicate.value).context(UnsupportedOperatorSnafu {
                    op: format!("{} against non-address constant", predicate.op),
                })?;
                Ok(match predicate.op {
                    Op::Eq => self.coded.eq(&key),
                    Op::NotEq => self.coded.not_eq(&key),
                    _ => unreachable!(),
                })
            }
            Op::In | Op::NotIn => {
                let (net, prefix_len) = match &predicate.value {
                    Value::Subnet(net, len) => (*net, *len),
                    _ => {
                        return UnsupportedOperatorSnafu {
                            op: format!("{} against non-subnet constant", predicate.op),
                        }
                        .fail()
                    }
                };
                let matching = self.coded.select(|addr| subnet_contains(*addr, net, prefix_len));
                Ok(if predicate.op == Op::In { matching } else { matching.not() })
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
    fn subnet_containment() {
        let mut idx = AddressIndexer::new();
        idx.ingest(&[
            Some(Value::Address("10.0.0.5".parse().unwrap())),
            Some(Value::Address("192.168.1.1".parse().unwrap())),
        ]);
        let ids = idx
            .lookup(&CurriedPredicate::new(
                Op::In,
                Value::Subnet("10.0.0.0".parse().unwrap(), 8),
            ))
            .unwrap()
            .iter()
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![0]);
    }
}
