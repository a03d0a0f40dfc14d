use uuid::Uuid;
use vast_segment::Segment;

/// Why the ingestor actor stopped. `Forced` means the 30s grace period
/// elapsed with segments still outstanding (they were written to the
/// orphan directory before exit).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Normal,
    Forced,
}

/// The ingestor's mailbox protocol. `Process` and `Shutdown` are also
/// posted by the actor to itself to drive its own state machine forward.
#[derive(Debug)]
pub enum IngestorMessage {
    /// Load any segments left behind by a previous run.
    Submit,
    /// A freshly sealed segment is ready for ingestion.
    SegmentReady(Segment),
    /// Try to hand the head of the buffer to the receiver.
    Process,
    /// The receiver has durably accepted the named segment.
    Ack(Uuid),
    /// The receiver is (or is no longer) backlogged.
    Backlog(bool),
    /// The receiver's outgoing channel closed; nothing more can be sent.
    SinkDown,
    Shutdown(ExitReason),
}
