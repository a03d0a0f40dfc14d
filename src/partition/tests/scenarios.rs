use std::sync::Arc;

use uuid::Uuid;
use vast_partition::Partition;
use vast_query::Predicate;
use vast_segment::Segment;
use vast_value::{Event, Op, Tag, Type, Value};

fn timestamped_record(ty_fields: Vec<(String, Type)>, mut values: Vec<Value>) -> (Type, Value) {
    let mut fields = vec![("timestamp".to_string(), Type::Leaf(Tag::Time))];
    fields.extend(ty_fields);
    let mut all_values = vec![Value::Time(0)];
    all_values.append(&mut values);
    (Type::record("t", fields), Value::Record(all_values))
}

fn segment(ty: Type, events: Vec<Value>) -> Segment {
    let ty = Arc::new(ty);
    Segment {
        uuid: Uuid::now_v7(),
        first_event_time: 0,
        last_event_time: 0,
        schema: (*ty).clone(),
        chunks: vec![events
            .into_iter()
            .enumerate()
            .map(|(i, value)| Event::new(i as u64, ty.clone(), value))
            .collect()],
    }
}

#[test]
fn simple_ingest_and_equality_query() {
    let dir = tempfile::tempdir().unwrap();
    let mut partition = Partition::new(dir.path(), 64);

    let (ty, v0) = timestamped_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))], vec![Value::Int64(1)]);
    let (_, v1) = timestamped_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))], vec![Value::Int64(2)]);
    let (_, v2) = timestamped_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))], vec![Value::Int64(1)]);
    partition.ingest(segment(ty, vec![v0, v1, v2])).unwrap();

    let predicate = Predicate::Schema(vec!["a".to_string()], Op::Eq, Value::Int64(1));
    let result = partition.evaluate(&predicate).unwrap();
    assert_eq!(result.iter().collect::<Vec<_>>(), vec![0, 2]);
}

#[test]
fn schema_merge_across_segments() {
    let dir = tempfile::tempdir().unwrap();
    let mut partition = Partition::new(dir.path(), 64);

    let (ty_a, v0) = timestamped_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))], vec![Value::Int64(1)]);
    partition.ingest(segment(ty_a, vec![v0])).unwrap();

    let (ty_b, v1) = timestamped_record(
        vec![("a".to_string(), Type::Leaf(Tag::Int64)), ("b".to_string(), Type::Leaf(Tag::String))],
        vec![Value::Int64(2), Value::String("x".to_string())],
    );
    partition.ingest(segment(ty_b, vec![v1])).unwrap();

    let by_b = partition
        .evaluate(&Predicate::Schema(vec!["b".to_string()], Op::Eq, Value::String("x".to_string())))
        .unwrap();
    assert_eq!(by_b.iter().collect::<Vec<_>>(), vec![1]);

    let by_a = partition.evaluate(&Predicate::Schema(vec!["a".to_string()], Op::Eq, Value::Int64(1))).unwrap();
    assert_eq!(by_a.iter().collect::<Vec<_>>(), vec![0]);
}
