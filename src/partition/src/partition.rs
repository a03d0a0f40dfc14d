use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use uuid::Uuid;
use vast_core::errors::{Error, ProtocolViolationSnafu};
use vast_indexer::{self, persist, Indexer};
use vast_query::{select_indexers, split_meta_data, IndexerKey, Predicate};
use vast_segment::Segment;
use vast_value::{Bitmap, CurriedPredicate, Op, Tag, Type, Value};

use crate::metadata::PartitionMetadata;
use crate::state::PartitionState;

struct Resident {
    indexer: Box<dyn Indexer>,
    last_touched: Instant,
}

impl Resident {
    fn new(indexer: Box<dyn Indexer>) -> Self {
        Self { indexer, last_touched: Instant::now() }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }
}

/// A directory on disk plus an in-memory registry of indexers (spec
/// §4.3). Owns its directory exclusively; no two partitions share one.
pub struct Partition {
    dir: PathBuf,
    state: PartitionState,
    batch_size: usize,
    schema: Type,
    metadata: PartitionMetadata,
    indexers: HashMap<IndexerKey, Resident>,
    time: Box<dyn Indexer>,
    name: Box<dyn Indexer>,
}

const TIMESTAMP_FIELD: &str = "timestamp";

impl Partition {
    /// Opens (without loading) the partition rooted at `dir`. The
    /// directory's basename is used as the partition uuid when it
    /// parses as one; otherwise a fresh uuid is minted.
    pub fn new(dir: impl Into<PathBuf>, batch_size: usize) -> Self {
        let dir = dir.into();
        let uuid = dir
            .file_name()
            .and_then(|s| s.to_str())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::now_v7);
        Self {
            dir,
            state: PartitionState::Cold,
            batch_size,
            schema: Type::anonymous_record(Vec::new()),
            metadata: PartitionMetadata::new(uuid),
            indexers: HashMap::new(),
            time: vast_indexer::new_for_tag(Tag::Time),
            name: vast_indexer::new_for_tag(Tag::String),
        }
    }

    pub fn state(&self) -> PartitionState {
        self.state
    }

    pub fn schema(&self) -> &Type {
        &self.schema
    }

    pub fn metadata(&self) -> &PartitionMetadata {
        &self.metadata
    }

    pub fn event_count(&self) -> u32 {
        self.time.len()
    }

    fn schema_path(&self) -> PathBuf {
        self.dir.join("schema")
    }

    fn metadata_path(&self) -> PathBuf {
        self.dir.join("partition.meta")
    }

    fn time_path(&self) -> PathBuf {
        self.dir.join("time.idx")
    }

    fn name_path(&self) -> PathBuf {
        self.dir.join("name.idx")
    }

    fn indexer_path(&self, key: &IndexerKey) -> PathBuf {
        let mut path = self.dir.clone();
        for component in key.path_components() {
            path.push(component);
        }
        path
    }

    /// Transitions `Cold -> Warming -> Warm`, loading metadata, schema,
    /// and the two distinguished indexers from disk if present.
    fn ensure_warm(&mut self) -> Result<(), Error> {
        match self.state {
            PartitionState::Warm => Ok(()),
            PartitionState::Failed => ProtocolViolationSnafu {
                what: "partition is in the failed state and refuses further work".to_string(),
            }
            .fail(),
            PartitionState::Cold | PartitionState::Warming => {
                self.state = PartitionState::Warming;
                if self.schema_path().exists() {
                    self.schema = persist::read_json(&self.schema_path())?;
                }
                if self.metadata_path().exists() {
                    self.metadata = persist::read_json(&self.metadata_path())?;
                }
                if self.time_path().exists() {
                    self.time = vast_indexer::load_or_create(&self.time_path(), Tag::Time)?;
                }
                if self.name_path().exists() {
                    self.name = vast_indexer::load_or_create(&self.name_path(), Tag::String)?;
                }
                self.state = PartitionState::Warm;
                Ok(())
            }
        }
    }

    fn get_or_load(&mut self, key: &IndexerKey) -> Result<&mut Box<dyn Indexer>, Error> {
        if !self.indexers.contains_key(key) {
            let path = self.indexer_path(key);
            let indexer = vast_indexer::load_or_create(&path, key.tag)?;
            self.indexers.insert(key.clone(), Resident::new(indexer));
        }
        let resident = self.indexers.get_mut(key).expect("just inserted");
        resident.touch();
        Ok(&mut resident.indexer)
    }

    /// Drops residents untouched for longer than `idle_window` from
    /// memory; their on-disk state is untouched and reloaded on next
    /// reference (spec §4.3's lazy indexer lifecycle).
    pub fn evict_idle(&mut self, idle_window: Duration) {
        self.indexers.retain(|_, resident| resident.last_touched.elapsed() <= idle_window);
    }

    /// Resolves a dotted field path against an event's own type/value
    /// pair. Field paths come from the partition's merged schema, whose
    /// leaf offsets do not in general line up with a given event's own
    /// (narrower) type, so lookups must walk by name, not by offset.
    fn value_at_path<'a>(value: &'a Value, ty: &Type, path: &[String]) -> Option<&'a Value> {
        match path.split_first() {
            None => Some(value),
            Some((head, rest)) => match ty {
                Type::Record { fields, .. } => {
                    let idx = fields.iter().position(|(name, _)| name == head)?;
                    let sub_value = match value {
                        Value::Record(values) => values.get(idx)?,
                        _ => return None,
                    };
                    Self::value_at_path(sub_value, &fields[idx].1, rest)
                }
                Type::Leaf(_) => None,
            },
        }
    }

    fn extract_time(value: &Value, ty: &Type) -> i64 {
        let path = [TIMESTAMP_FIELD.to_string()];
        match Self::value_at_path(value, ty, &path) {
            Some(Value::Time(t)) => *t,
            _ => 0,
        }
    }

    /// Merges the segment's schema into the partition's, creates
    /// indexers for newly introduced leaves, streams every event to
    /// every resident indexer plus `time`/`name` in `batch_size`
    /// batches, updates metadata, and flushes.
    pub fn ingest(&mut self, segment: Segment) -> Result<(), Error> {
        self.ensure_warm()?;

        let merged = match self.schema.merge(&segment.schema) {
            Ok(merged) => merged,
            Err(err) => {
                log::warn!(
                    "rejecting segment {} for partition {}: {err}",
                    segment.uuid,
                    self.metadata.uuid
                );
                return Ok(());
            }
        };
        let existing_leaves: std::collections::HashSet<Vec<usize>> =
            self.schema.leaves().into_iter().map(|(o, _, _)| o.0).collect();
        self.schema = merged;

        for (offset, path, tag) in self.schema.leaves() {
            if existing_leaves.contains(&offset.0) {
                continue;
            }
            let key = IndexerKey::new(offset, path, tag);
            if !self.indexers.contains_key(&key) {
                self.indexers.insert(key, Resident::new(vast_indexer::new_for_tag(tag)));
            }
        }

        let keys: Vec<IndexerKey> = self.indexers.keys().cloned().collect();
        let events: Vec<&vast_value::Event> = segment.events().collect();

        for batch in events.chunks(self.batch_size.max(1)) {
            for key in &keys {
                let start = self.get_or_load(key)?.len();
                let values = Self::padded_batch(start, batch, |e| {
                    Self::value_at_path(&e.value, &e.ty, &key.path).cloned()
                });
                self.get_or_load(key)?.ingest(&values);
            }
            let times = Self::padded_batch(self.time.len(), batch, |e| {
                Some(Value::Time(Self::extract_time(&e.value, &e.ty)))
            });
            self.time.ingest(&times);
            let names = Self::padded_batch(self.name.len(), batch, |e| {
                Some(Value::String(e.ty.name().unwrap_or("").to_string()))
            });
            self.name.ingest(&names);
        }

        self.metadata.update(&segment);
        self.flush()
    }

    /// Builds one indexer's ingest batch from a chunk of events,
    /// inserting 0-bit padding so bit position tracks `event.id`
    /// exactly rather than arrival order. An indexer currently at
    /// length `start` gets `event.id - start` absent slots before the
    /// event's own value (spec §4.2/§8.2: "missing events appear as
    /// 0-bits up to the next set bit").
    fn padded_batch(
        start: u32,
        batch: &[&vast_value::Event],
        mut value_for: impl FnMut(&vast_value::Event) -> Option<Value>,
    ) -> Vec<Option<Value>> {
        let mut values = Vec::new();
        let mut next_pos = start;
        for event in batch {
            let id = event.id as u32;
            let gap = id.saturating_sub(next_pos);
            values.extend(std::iter::repeat(None).take(gap as usize));
            values.push(value_for(event));
            next_pos = id + 1;
        }
        values
    }

    /// An unsupported operator is a per-request error (spec §7): it is
    /// logged and reported to the caller as an empty bitmap rather than
    /// failing the partition.
    fn lookup_or_warn(indexer: &dyn Indexer, label: &str, curried: &CurriedPredicate) -> Bitmap {
        match indexer.lookup(curried) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                log::warn!("{label} could not evaluate {curried:?}: {err}");
                Bitmap::new()
            }
        }
    }

    fn lookup_one(&mut self, key: &IndexerKey, curried: &CurriedPredicate) -> Result<Bitmap, Error> {
        let indexer = self.get_or_load(key)?;
        Ok(Self::lookup_or_warn(&**indexer, &format!("{key:?}"), curried))
    }

    fn lookup_many(&mut self, keys: &[IndexerKey], curried: &CurriedPredicate) -> Result<Bitmap, Error> {
        if keys.is_empty() {
            return Ok(Bitmap::new());
        }
        let mut result: Option<Bitmap> = None;
        for key in keys {
            let bitmap = self.lookup_one(key, curried)?;
            result = Some(match result {
                Some(acc) => acc.or(&bitmap),
                None => bitmap,
            });
        }
        Ok(result.unwrap_or_else(Bitmap::new))
    }

    fn full_bitmap(&self) -> Bitmap {
        let mut bitmap = Bitmap::new();
        for _ in 0..self.event_count() {
            bitmap.append(true);
        }
        bitmap
    }

    fn eval(&mut self, predicate: &Predicate) -> Result<Bitmap, Error> {
        match predicate {
            Predicate::Timestamp(op, value) => Ok(Self::lookup_or_warn(
                &*self.time,
                "time indexer",
                &CurriedPredicate::new(*op, value.clone()),
            )),
            Predicate::Name(op, value) => Ok(Self::lookup_or_warn(
                &*self.name,
                "name indexer",
                &CurriedPredicate::new(*op, value.clone()),
            )),
            Predicate::Type(tag, op, value) => {
                let keys = select_indexers(&Predicate::Type(*tag, *op, value.clone()), &self.schema);
                self.lookup_many(&keys, &CurriedPredicate::new(*op, value.clone()))
            }
            Predicate::Schema(suffix, op, value) => {
                let keys = select_indexers(
                    &Predicate::Schema(suffix.clone(), *op, value.clone()),
                    &self.schema,
                );
                self.lookup_many(&keys, &CurriedPredicate::new(*op, value.clone()))
            }
            Predicate::And(parts) => {
                if parts.is_empty() {
                    return Ok(self.full_bitmap());
                }
                let mut acc: Option<Bitmap> = None;
                for part in parts {
                    let bitmap = self.eval(part)?;
                    acc = Some(match acc {
                        Some(a) => a.and(&bitmap),
                        None => bitmap,
                    });
                }
                Ok(acc.unwrap())
            }
            Predicate::Or(parts) => {
                let mut acc: Option<Bitmap> = None;
                for part in parts {
                    let bitmap = self.eval(part)?;
                    acc = Some(match acc {
                        Some(a) => a.or(&bitmap),
                        None => bitmap,
                    });
                }
                Ok(acc.unwrap_or_else(Bitmap::new))
            }
            Predicate::Not(inner) => Ok(self.eval(inner)?.not()),
        }
    }

    /// Whether the metadata-only half of a split predicate can already
    /// be shown to match nothing, letting `evaluate` short-circuit
    /// without touching any indexer (spec §4.7's meta/data two-pass).
    fn meta_precheck(&self, meta: &Predicate) -> bool {
        match meta {
            Predicate::Timestamp(op, Value::Time(t)) => match op {
                Op::Gt => *t < self.metadata.last_event_time,
                Op::Ge => *t <= self.metadata.last_event_time,
                Op::Lt => *t > self.metadata.first_event_time,
                Op::Le => *t >= self.metadata.first_event_time,
                Op::Eq => *t >= self.metadata.first_event_time && *t <= self.metadata.last_event_time,
                _ => true,
            },
            Predicate::And(parts) => parts.iter().all(|p| self.meta_precheck(p)),
            _ => true,
        }
    }

    /// Implements the two-pass predicate dispatch of spec §4.7: splits
    /// meta vs. data predicates, uses the meta half as a fast-reject
    /// filter, then evaluates the whole predicate exactly against the
    /// resident indexers (the `time`/`name` indexers already give an
    /// exact, not merely approximate, per-event answer for those leaves).
    pub fn evaluate(&mut self, predicate: &Predicate) -> Result<Bitmap, Error> {
        self.ensure_warm()?;
        if self.metadata.is_empty() {
            return Ok(Bitmap::new());
        }
        let (meta, _data) = split_meta_data(predicate);
        if let Some(meta) = &meta {
            if !self.meta_precheck(meta) {
                return Ok(Bitmap::new());
            }
        }
        self.eval(predicate)
    }

    /// Writes schema and partition metadata atomically (temp file then
    /// rename), then flushes every resident indexer plus `time`/`name`.
    /// A flush failure transitions the partition to `Failed`.
    pub fn flush(&mut self) -> Result<(), Error> {
        let result = self.try_flush();
        if result.is_err() {
            self.state = PartitionState::Failed;
        }
        result
    }

    fn try_flush(&mut self) -> Result<(), Error> {
        persist::atomic_write_json(&self.schema_path(), &self.schema)?;
        persist::atomic_write_json(&self.metadata_path(), &self.metadata)?;
        self.time.flush(&self.time_path())?;
        self.name.flush(&self.name_path())?;
        for (key, resident) in &self.indexers {
            resident.indexer.flush(&self.indexer_path(key))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vast_value::{Event, Type as VType};

    fn make_segment(events: Vec<(u64, i64, i64)>, fields: Vec<(&str, Tag)>) -> Segment {
        let fields: Vec<(String, Type)> =
            fields.into_iter().map(|(n, t)| (n.to_string(), Type::Leaf(t))).collect();
        let ty = std::sync::Arc::new(VType::record("t", fields));
        let evs = events
            .into_iter()
            .map(|(id, ts, a)| {
                Event::new(
                    id,
                    ty.clone(),
                    Value::Record(vec![Value::Time(ts), Value::Int64(a)]),
                )
            })
            .collect();
        Segment {
            uuid: Uuid::now_v7(),
            first_event_time: 0,
            last_event_time: 0,
            schema: (*ty).clone(),
            chunks: vec![evs],
        }
    }

    #[test]
    fn simple_ingest_and_equality_query() {
        let tmp = tempfile::tempdir().unwrap();
        let mut partition = Partition::new(tmp.path(), 8);
        let segment = make_segment(
            vec![(0, 1, 1), (1, 2, 2), (2, 3, 1)],
            vec![(TIMESTAMP_FIELD, Tag::Time), ("a", Tag::Int64)],
        );
        partition.ingest(segment).unwrap();
        let result = partition
            .evaluate(&Predicate::Type(Tag::Int64, Op::Eq, Value::Int64(1)))
            .unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn schema_merge_across_segments() {
        let tmp = tempfile::tempdir().unwrap();
        let mut partition = Partition::new(tmp.path(), 8);
        let seg_a = make_segment(vec![(0, 1, 1)], vec![(TIMESTAMP_FIELD, Tag::Time), ("a", Tag::Int64)]);
        partition.ingest(seg_a).unwrap();

        let ty_b = std::sync::Arc::new(VType::record(
            "t",
            vec![
                (TIMESTAMP_FIELD.to_string(), Type::Leaf(Tag::Time)),
                ("a".to_string(), Type::Leaf(Tag::Int64)),
                ("b".to_string(), Type::Leaf(Tag::String)),
            ],
        ));
        let seg_b = Segment {
            uuid: Uuid::now_v7(),
            first_event_time: 1,
            last_event_time: 1,
            schema: (*ty_b).clone(),
            chunks: vec![vec![Event::new(
                1,
                ty_b.clone(),
                Value::Record(vec![Value::Time(2), Value::Int64(2), Value::String("x".into())]),
            )]],
        };
        partition.ingest(seg_b).unwrap();

        assert_eq!(partition.schema().leaves().len(), 3);
        let b_eq = partition
            .evaluate(&Predicate::Type(Tag::String, Op::Eq, Value::String("x".into())))
            .unwrap();
        assert_eq!(b_eq.iter().collect::<Vec<_>>(), vec![1]);
        let a_eq = partition
            .evaluate(&Predicate::Type(Tag::Int64, Op::Eq, Value::Int64(1)))
            .unwrap();
        assert_eq!(a_eq.iter().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn gaps_in_event_id_pad_with_zero_bits_instead_of_shifting() {
        let tmp = tempfile::tempdir().unwrap();
        let mut partition = Partition::new(tmp.path(), 8);
        // ids 5, 7, 10: two gaps, neither zero-based nor contiguous.
        let segment = make_segment(
            vec![(5, 1, 9), (7, 2, 1), (10, 3, 9)],
            vec![(TIMESTAMP_FIELD, Tag::Time), ("a", Tag::Int64)],
        );
        partition.ingest(segment).unwrap();
        let result = partition
            .evaluate(&Predicate::Type(Tag::Int64, Op::Eq, Value::Int64(1)))
            .unwrap();
        assert_eq!(result.iter().collect::<Vec<_>>(), vec![7]);
        let nines = partition
            .evaluate(&Predicate::Type(Tag::Int64, Op::Eq, Value::Int64(9)))
            .unwrap();
        assert_eq!(nines.iter().collect::<Vec<_>>(), vec![5, 10]);
    }
}
