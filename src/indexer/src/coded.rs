use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use vast_value::Bitmap;

/// An equality-coded bitmap index: one bitmap per distinct observed key,
/// set at the position of every event whose value equals that key. This
/// is the decomposition spec §4.2 leaves unconstrained ("one bitmap per
/// observed byte-value... the specification does not mandate the
/// internal decomposition"); every indexer built on top of it composes
/// these per-key bitmaps to answer its supported operators.
#[derive(Debug, Serialize, Deserialize)]
pub struct CodedIndex<K: Ord + Clone> {
    by_value: BTreeMap<K, Bitmap>,
    len: u32,
}

impl<K: Ord + Clone> Default for CodedIndex<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone> CodedIndex<K> {
    pub fn new() -> Self {
        Self {
            by_value: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> u32 {
        self.len
    }

    /// Records that the event at the current position carries `key`.
    pub fn append_present(&mut self, key: K) {
        let len = self.len;
        self.by_value.entry(key.clone()).or_insert_with(|| {
            let mut bm = Bitmap::new();
            bm.append_n_zeros(len);
            bm
        });
        for (k, bm) in self.by_value.iter_mut() {
            bm.append(*k == key);
        }
        self.len += 1;
    }

    /// Records that the event at the current position does not carry a
    /// value for this indexer at all (the offset wasn't present in its
    /// type).
    pub fn append_absent(&mut self) {
        for bm in self.by_value.values_mut() {
            bm.append(false);
        }
        self.len += 1;
    }

    fn empty(&self) -> Bitmap {
        let mut bm = Bitmap::new();
        bm.append_n_zeros(self.len);
        bm
    }

    pub fn eq(&self, key: &K) -> Bitmap {
        self.by_value.get(key).cloned().unwrap_or_else(|| self.empty())
    }

    pub fn not_eq(&self, key: &K) -> Bitmap {
        self.eq(key).not()
    }

    /// ORs the bitmaps of every key for which `pred` holds, e.g. for a
    /// range predicate over an ordered key space.
    pub fn select(&self, pred: impl Fn(&K) -> bool) -> Bitmap {
        let mut out = self.empty();
        for (k, bm) in self.by_value.iter() {
            if pred(k) {
                out = out.or(bm);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_and_range_over_integers() {
        let mut idx: CodedIndex<i64> = CodedIndex::new();
        idx.append_present(1);
        idx.append_present(2);
        idx.append_present(1);
        idx.append_absent();
        idx.append_present(3);

        assert_eq!(idx.eq(&1).iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(idx.eq(&2).iter().collect::<Vec<_>>(), vec![1]);
        assert_eq!(idx.eq(&9).count_ones(), 0);
        assert_eq!(idx.select(|k| *k >= 2).iter().collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(idx.not_eq(&1).iter().collect::<Vec<_>>(), vec![1, 3, 4]);
    }
}
