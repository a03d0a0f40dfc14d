use roaring::RoaringBitmap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use vast_core::errors::{CodecSnafu, Error};

/// An append-only bitmap where bit position is event id. Wraps
/// [`RoaringBitmap`] as the workspace's stand-in for the spec's EWAH
/// primitive (spec §1 treats EWAH as an external, already-available
/// primitive; `roaring` is the nearest real crate in this corpus).
///
/// Append is monotonic: positions only grow. Random insertion is not
/// supported, matching §4.1.
#[derive(Debug, Clone, Default)]
pub struct Bitmap {
    bits: RoaringBitmap,
    next_id: u32,
}

impl Bitmap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one bit and returns the position it was written at.
    pub fn append(&mut self, bit: bool) -> u32 {
        let pos = self.next_id;
        debug_assert!(
            pos < u32::MAX,
            "bitmap position overflowed u32; event ids must fit in 32 bits"
        );
        if bit {
            self.bits.insert(pos);
        }
        self.next_id += 1;
        pos
    }

    /// Appends `n` zero bits, e.g. to pad a gap of events that don't
    /// carry the indexer's field.
    pub fn append_n_zeros(&mut self, n: u32) {
        self.next_id = self.next_id.saturating_add(n);
    }

    pub fn len(&self) -> u32 {
        self.next_id
    }

    pub fn is_empty(&self) -> bool {
        self.next_id == 0
    }

    pub fn get(&self, id: u32) -> bool {
        self.bits.contains(id)
    }

    pub fn count_ones(&self) -> u64 {
        self.bits.len()
    }

    pub fn and(&self, other: &Bitmap) -> Bitmap {
        Bitmap {
            bits: &self.bits & &other.bits,
            next_id: self.next_id.max(other.next_id),
        }
    }

    pub fn or(&self, other: &Bitmap) -> Bitmap {
        Bitmap {
            bits: &self.bits | &other.bits,
            next_id: self.next_id.max(other.next_id),
        }
    }

    /// Bitwise complement over `[0, len)`. Positions beyond `len` are
    /// never considered set, so `not` only flips bits up to the
    /// bitmap's own current length.
    pub fn not(&self) -> Bitmap {
        let mut full = RoaringBitmap::new();
        if self.next_id > 0 {
            full.insert_range(0..self.next_id);
        }
        Bitmap {
            bits: &full - &self.bits,
            next_id: self.next_id,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.bits.iter()
    }

    pub fn serialize(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.next_id.to_be_bytes());
        self.bits
            .serialize_into(&mut buf)
            .map_err(|_| {
                CodecSnafu {
                    what: "roaring bitmap serialize",
                }
                .build()
            })?;
        Ok(buf)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < 4 {
            return CodecSnafu {
                what: "bitmap frame too short",
            }
            .fail();
        }
        let next_id = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let bits = RoaringBitmap::deserialize_from(&bytes[4..]).map_err(|_| {
            CodecSnafu {
                what: "roaring bitmap deserialize",
            }
            .build()
        })?;
        Ok(Self { bits, next_id })
    }
}

impl Serialize for Bitmap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bytes = self.serialize().map_err(serde::ser::Error::custom)?;
        serializer.serialize_bytes(&bytes)
    }
}

impl<'de> Deserialize<'de> for Bitmap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes: Vec<u8> = Deserialize::deserialize(deserializer)?;
        Bitmap::deserialize(&bytes).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_is_monotonic_and_bit_aligned() {
        let mut bm = Bitmap::new();
        assert_eq!(bm.append(true), 0);
        assert_eq!(bm.append(false), 1);
        assert_eq!(bm.append(true), 2);
        assert!(bm.get(0));
        assert!(!bm.get(1));
        assert!(bm.get(2));
        assert_eq!(bm.count_ones(), 2);
        assert_eq!(bm.len(), 3);
    }

    #[test]
    fn bitwise_ops() {
        let mut a = Bitmap::new();
        a.append(true);
        a.append(false);
        a.append(true);
        let mut b = Bitmap::new();
        b.append(true);
        b.append(true);
        b.append(false);
        assert_eq!(a.and(&b).count_ones(), 1);
        assert_eq!(a.or(&b).count_ones(), 3);
        assert_eq!(a.not().count_ones(), 1);
    }

    #[test]
    fn roundtrips_through_bytes() {
        let mut a = Bitmap::new();
        a.append(true);
        a.append_n_zeros(5);
        a.append(true);
        let bytes = a.serialize().unwrap();
        let b = Bitmap::deserialize(&bytes).unwrap();
        assert_eq!(a.len(), b.len());
        assert_eq!(a.count_ones(), b.count_ones());
        assert_eq!(a.get(0), b.get(0));
        assert_eq!(a.get(6), b.get(6));
    }
}
