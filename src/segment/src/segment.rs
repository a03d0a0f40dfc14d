use std::io::{Cursor, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vast_core::errors::Error;
use vast_value::{Event, Type};

/// A size/count-bounded slice of a segment, stored in arrival order.
pub type Chunk = Vec<Event>;

/// An immutable, content-addressed batch of events. Identity and
/// equality are by `uuid` only (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub uuid: Uuid,
    pub first_event_time: i64,
    pub last_event_time: i64,
    pub schema: Type,
    pub chunks: Vec<Chunk>,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.uuid == other.uuid
    }
}
impl Eq for Segment {}

impl std::hash::Hash for Segment {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.uuid.hash(state);
    }
}

/// On-disk container version. Bumped whenever the frame layout below
/// changes; readers reject unknown versions rather than guess.
const CONTAINER_VERSION: u8 = 1;

impl Segment {
    pub fn event_count(&self) -> usize {
        self.chunks.iter().map(|c| c.len()).sum()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.chunks.iter().flatten()
    }

    /// Serializes the segment to the versioned, zstd-framed container
    /// described in DESIGN.md: a version byte, then a length-prefixed
    /// compressed schema frame, then one length-prefixed compressed
    /// frame per chunk, then the uuid and timestamps. Framing style
    /// mirrors the teacher's `Entry::into_bytes` (length-prefixed,
    /// `byteorder` big-endian).
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::new();
        buf.write_u8(CONTAINER_VERSION)
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        write_frame(&mut buf, &self.schema)?;
        buf.write_u32::<BigEndian>(self.chunks.len() as u32)
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        for chunk in &self.chunks {
            write_frame(&mut buf, chunk)?;
        }
        buf.extend_from_slice(self.uuid.as_bytes());
        buf.write_i64::<BigEndian>(self.first_event_time)
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        buf.write_i64::<BigEndian>(self.last_event_time)
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        Ok(buf)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = Cursor::new(bytes);
        let version = cursor
            .read_u8()
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        if version != CONTAINER_VERSION {
            return Err(Error::Codec {
                what: format!("unsupported segment container version {version}"),
            });
        }
        let schema: Type = read_frame(&mut cursor)?;
        let chunk_count = cursor
            .read_u32::<BigEndian>()
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        let mut chunks = Vec::with_capacity(chunk_count as usize);
        for _ in 0..chunk_count {
            chunks.push(read_frame(&mut cursor)?);
        }
        let mut uuid_bytes = [0u8; 16];
        cursor
            .read_exact(&mut uuid_bytes)
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        let uuid = Uuid::from_bytes(uuid_bytes);
        let first_event_time = cursor
            .read_i64::<BigEndian>()
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        let last_event_time = cursor
            .read_i64::<BigEndian>()
            .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
        Ok(Segment {
            uuid,
            first_event_time,
            last_event_time,
            schema,
            chunks,
        })
    }
}

fn write_frame<T: Serialize>(buf: &mut Vec<u8>, value: &T) -> Result<(), Error> {
    let json = serde_json::to_vec(value).map_err(|source| Error::Serialization { source })?;
    let compressed = zstd::stream::encode_all(Cursor::new(json), 0)
        .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
    buf.write_u32::<BigEndian>(compressed.len() as u32)
        .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
    buf.write_all(&compressed)
        .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
    Ok(())
}

fn read_frame<T: for<'de> Deserialize<'de>>(cursor: &mut Cursor<&[u8]>) -> Result<T, Error> {
    let len = cursor
        .read_u32::<BigEndian>()
        .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
    let mut compressed = vec![0u8; len as usize];
    cursor
        .read_exact(&mut compressed)
        .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
    let json = zstd::stream::decode_all(Cursor::new(compressed))
        .map_err(|source| Error::Filesystem { path: "<in-memory>".into(), source })?;
    serde_json::from_slice(&json).map_err(|source| Error::Serialization { source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use vast_value::{Tag, Value};

    fn sample_segment() -> Segment {
        let schema = Type::record("t", vec![("a".to_string(), Type::Leaf(Tag::Int64))]);
        let events = vec![
            Event::new(0, std::sync::Arc::new(schema.clone()), Value::Record(vec![Value::Int64(1)])),
            Event::new(1, std::sync::Arc::new(schema.clone()), Value::Record(vec![Value::Int64(2)])),
        ];
        Segment {
            uuid: Uuid::now_v7(),
            first_event_time: 100,
            last_event_time: 200,
            schema,
            chunks: vec![events],
        }
    }

    #[test]
    fn roundtrips_through_bytes() {
        let seg = sample_segment();
        let bytes = seg.to_bytes().unwrap();
        let back = Segment::from_bytes(&bytes).unwrap();
        assert_eq!(seg.uuid, back.uuid);
        assert_eq!(seg.event_count(), back.event_count());
        assert_eq!(seg.first_event_time, back.first_event_time);
        assert_eq!(seg.last_event_time, back.last_event_time);
    }

    #[test]
    fn equality_is_by_uuid_only() {
        let a = sample_segment();
        let mut b = a.clone();
        b.first_event_time = 999;
        assert_eq!(a, b);
        let mut c = a.clone();
        c.uuid = Uuid::now_v7();
        assert_ne!(a, c);
    }
}
