use async_trait::async_trait;
use vast_segment::Segment;

/// The downstream consumer of sealed segments (the partition/query
/// layer). `send_segment` is fire-and-forget: acceptance is reported
/// back asynchronously via `IngestorMessage::Ack`, not a return value.
/// The bool return only signals whether the channel to the receiver is
/// still alive.
#[async_trait]
pub trait Receiver: Send + Sync {
    async fn send_segment(&self, segment: Segment) -> bool;
}
