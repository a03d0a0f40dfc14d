use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vast_core::time::now_micros;
use vast_segment::Segment;

/// Partition-wide summary, updated monotonically as segments are
/// ingested (spec §3, property §8.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionMetadata {
    pub uuid: Uuid,
    pub first_event_time: i64,
    pub last_event_time: i64,
    pub last_modified: i64,
}

impl PartitionMetadata {
    pub fn new(uuid: Uuid) -> Self {
        Self {
            uuid,
            first_event_time: i64::MAX,
            last_event_time: i64::MIN,
            last_modified: now_micros(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_event_time > self.last_event_time
    }

    pub fn update(&mut self, segment: &Segment) {
        self.first_event_time = self.first_event_time.min(segment.first_event_time);
        self.last_event_time = self.last_event_time.max(segment.last_event_time);
        self.last_modified = now_micros();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vast_value::{Tag, Type};

    fn segment(first: i64, last: i64) -> Segment {
        Segment {
            uuid: Uuid::now_v7(),
            first_event_time: first,
            last_event_time: last,
            schema: Type::anonymous_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))]),
            chunks: Vec::new(),
        }
    }

    #[test]
    fn update_is_monotonic() {
        let mut meta = PartitionMetadata::new(Uuid::now_v7());
        meta.update(&segment(100, 200));
        meta.update(&segment(50, 150));
        assert_eq!(meta.first_event_time, 50);
        assert_eq!(meta.last_event_time, 200);
    }
}
