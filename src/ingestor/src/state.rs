#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestorState {
    /// Nothing outstanding; free to hand the next segment to the receiver.
    Ready,
    /// A segment is outstanding, waiting on an ack.
    Waiting,
    /// Backlogged: holding everything until told otherwise.
    Paused,
}
