/// The partition lifecycle state machine (spec §4.3). Queries and
/// ingest are serviced only in `Warm`; a fatal indexer flush error
/// transitions to `Failed`, after which the partition refuses further
/// work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionState {
    Cold,
    Warming,
    Warm,
    Failed,
}
