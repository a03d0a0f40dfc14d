use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use uuid::Uuid;

use vast_core::errors::{Error, ProtocolViolationSnafu};
use vast_segment::Segment;

use crate::message::{ExitReason, IngestorMessage};
use crate::orphan;
use crate::receiver::Receiver;
use crate::state::IngestorState;

/// How long a shutdown request waits for the outstanding segment to be
/// acked before giving up and persisting the buffer to disk.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// The ingestion actor: a single-outstanding-segment pipeline between
/// the segmentizer and the partition layer, with crash recovery via an
/// orphan directory.
pub struct Ingestor<R: Receiver> {
    dir: PathBuf,
    receiver: R,
    state: IngestorState,
    buffer: VecDeque<Segment>,
    /// uuids of segments known to have an orphan file on disk, tracked
    /// so an ack can delete the file instead of leaving a stale orphan.
    orphans: HashSet<Uuid>,
    /// orphans discovered at startup, not yet loaded into `buffer`.
    pending_orphans: Vec<Uuid>,
    backlogged: bool,
    terminating: bool,
}

impl<R: Receiver> Ingestor<R> {
    pub fn new(dir: impl Into<PathBuf>, receiver: R) -> Result<Self, Error> {
        let dir = dir.into().join("ingest").join("segments");
        let mut pending_orphans = orphan::scan(&dir)?;
        pending_orphans.sort();
        let orphans = pending_orphans.iter().copied().collect();
        Ok(Self {
            dir,
            receiver,
            state: IngestorState::Ready,
            buffer: VecDeque::new(),
            orphans,
            pending_orphans,
            backlogged: false,
            terminating: false,
        })
    }

    pub fn state(&self) -> IngestorState {
        self.state
    }

    /// Drives the actor until it exits. `inbox` is its mailbox; `outbox`
    /// is a sender to that same mailbox, used by the actor to post
    /// follow-up messages to itself (`Process`, a delayed `Shutdown`).
    pub async fn run(
        mut self,
        mut inbox: mpsc::Receiver<IngestorMessage>,
        outbox: mpsc::Sender<IngestorMessage>,
    ) -> ExitReason {
        while let Some(message) = inbox.recv().await {
            match message {
                IngestorMessage::Submit => {
                    self.on_submit();
                    let _ = outbox.send(IngestorMessage::Process).await;
                }
                IngestorMessage::SegmentReady(segment) => {
                    self.buffer.push_back(segment);
                    let _ = outbox.send(IngestorMessage::Process).await;
                }
                IngestorMessage::Process => {
                    if let Some(reason) = self.on_process().await {
                        return reason;
                    }
                }
                IngestorMessage::Ack(uuid) => {
                    if let Err(err) = self.on_ack(uuid) {
                        log::error!("{err}");
                        return ExitReason::Forced;
                    }
                    if self.state == IngestorState::Ready {
                        let _ = outbox.send(IngestorMessage::Process).await;
                    }
                }
                IngestorMessage::Backlog(on) => {
                    self.on_backlog(on);
                    if self.state == IngestorState::Ready {
                        let _ = outbox.send(IngestorMessage::Process).await;
                    }
                }
                IngestorMessage::SinkDown => {
                    self.persist_buffer();
                    return ExitReason::Normal;
                }
                IngestorMessage::Shutdown(reason) => {
                    if let Some(final_reason) = self.on_shutdown(reason, &outbox) {
                        return final_reason;
                    }
                }
            }
        }
        ExitReason::Normal
    }

    fn on_submit(&mut self) {
        for uuid in std::mem::take(&mut self.pending_orphans) {
            match orphan::load(&self.dir, uuid) {
                Ok(segment) => self.buffer.push_back(segment),
                Err(err) => {
                    log::error!("dropping unreadable orphan {uuid}: {err}");
                    self.orphans.remove(&uuid);
                }
            }
        }
    }

    async fn on_process(&mut self) -> Option<ExitReason> {
        if self.state != IngestorState::Ready {
            return None;
        }
        let Some(segment) = self.buffer.front().cloned() else {
            return None;
        };
        if self.receiver.send_segment(segment).await {
            self.state = IngestorState::Waiting;
            None
        } else {
            self.persist_buffer();
            Some(ExitReason::Normal)
        }
    }

    fn on_ack(&mut self, uuid: Uuid) -> Result<(), Error> {
        if self.state != IngestorState::Waiting {
            return ProtocolViolationSnafu {
                what: format!("ack for {uuid} received while not waiting on one"),
            }
            .fail();
        }
        let head = self.buffer.front().ok_or_else(|| Error::ProtocolViolation {
            what: format!("ack for {uuid} received with an empty buffer"),
        })?;
        if head.uuid != uuid {
            return ProtocolViolationSnafu {
                what: format!("ack for {uuid} does not match outstanding segment {}", head.uuid),
            }
            .fail();
        }
        if self.orphans.remove(&uuid) {
            if let Err(err) = orphan::remove(&self.dir, uuid) {
                log::warn!("failed to remove orphan file for {uuid}: {err}");
            }
        }
        self.buffer.pop_front();
        self.state = if self.backlogged { IngestorState::Paused } else { IngestorState::Ready };
        Ok(())
    }

    fn on_backlog(&mut self, on: bool) {
        self.backlogged = on;
        self.state = match (self.state, on) {
            (IngestorState::Ready, true) => IngestorState::Paused,
            (IngestorState::Paused, false) => IngestorState::Ready,
            (other, _) => other,
        };
    }

    fn on_shutdown(
        &mut self,
        reason: ExitReason,
        outbox: &mpsc::Sender<IngestorMessage>,
    ) -> Option<ExitReason> {
        if self.buffer.is_empty() {
            return Some(reason);
        }
        if !self.terminating {
            self.terminating = true;
            let outbox = outbox.clone();
            tokio::spawn(async move {
                tokio::time::sleep(SHUTDOWN_GRACE).await;
                let _ = outbox.send(IngestorMessage::Shutdown(reason)).await;
            });
            None
        } else {
            self.persist_buffer();
            Some(ExitReason::Forced)
        }
    }

    /// Writes every buffered segment to the orphan directory so a
    /// future run can recover it. Failures on individual segments are
    /// logged, not propagated: the process exits regardless.
    fn persist_buffer(&self) {
        for segment in &self.buffer {
            if let Err(err) = orphan::write(&self.dir, segment) {
                log::error!("failed to persist outstanding segment {}: {err}", segment.uuid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use vast_value::{Tag, Type};

    fn segment() -> Segment {
        Segment {
            uuid: Uuid::now_v7(),
            first_event_time: 1,
            last_event_time: 2,
            schema: Type::anonymous_record(vec![("a".to_string(), Type::Leaf(Tag::Int64))]),
            chunks: Vec::new(),
        }
    }

    struct RecordingReceiver {
        sent: Arc<AtomicUsize>,
        outbox: mpsc::Sender<IngestorMessage>,
    }

    #[async_trait]
    impl Receiver for RecordingReceiver {
        async fn send_segment(&self, segment: Segment) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            let _ = self.outbox.send(IngestorMessage::Ack(segment.uuid)).await;
            true
        }
    }

    struct SilentReceiver;

    #[async_trait]
    impl Receiver for SilentReceiver {
        async fn send_segment(&self, _segment: Segment) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn single_outstanding_segment_is_acked_then_advances() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let sent = Arc::new(AtomicUsize::new(0));
        let receiver = RecordingReceiver { sent: sent.clone(), outbox: tx.clone() };
        let ingestor = Ingestor::new(dir.path(), receiver).unwrap();

        let handle = tokio::spawn(ingestor.run(rx, tx.clone()));

        let a = segment();
        let b = segment();
        tx.send(IngestorMessage::SegmentReady(a)).await.unwrap();
        tx.send(IngestorMessage::SegmentReady(b)).await.unwrap();
        tx.send(IngestorMessage::Shutdown(ExitReason::Normal)).await.unwrap();

        let reason = handle.await.unwrap();
        assert_eq!(reason, ExitReason::Normal);
        assert_eq!(sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn ack_out_of_order_is_a_protocol_violation() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let ingestor = Ingestor::new(dir.path(), SilentReceiver).unwrap();
        let handle = tokio::spawn(ingestor.run(rx, tx.clone()));

        tx.send(IngestorMessage::SegmentReady(segment())).await.unwrap();
        tx.send(IngestorMessage::Ack(Uuid::now_v7())).await.unwrap();

        let reason = handle.await.unwrap();
        assert_eq!(reason, ExitReason::Forced);
    }

    #[tokio::test]
    async fn shutdown_with_pending_buffer_persists_orphans_on_second_request() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel(16);
        let ingestor = Ingestor::new(dir.path(), SilentReceiver).unwrap();
        let seg = segment();
        let uuid = seg.uuid;
        let handle = tokio::spawn(ingestor.run(rx, tx.clone()));

        tx.send(IngestorMessage::Backlog(true)).await.unwrap();
        tx.send(IngestorMessage::SegmentReady(seg)).await.unwrap();
        tx.send(IngestorMessage::Shutdown(ExitReason::Normal)).await.unwrap();
        tx.send(IngestorMessage::Shutdown(ExitReason::Normal)).await.unwrap();

        let reason = handle.await.unwrap();
        assert_eq!(reason, ExitReason::Forced);
        let segments_dir = dir.path().join("ingest").join("segments");
        let found = orphan::scan(&segments_dir).unwrap();
        assert_eq!(found, vec![uuid]);
    }

    #[tokio::test]
    async fn startup_loads_orphans_left_by_a_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let segments_dir = dir.path().join("ingest").join("segments");
        let seg = segment();
        orphan::write(&segments_dir, &seg).unwrap();

        let (tx, rx) = mpsc::channel(16);
        let sent = Arc::new(AtomicUsize::new(0));
        let receiver = RecordingReceiver { sent: sent.clone(), outbox: tx.clone() };
        let ingestor = Ingestor::new(dir.path(), receiver).unwrap();
        let handle = tokio::spawn(ingestor.run(rx, tx.clone()));

        tx.send(IngestorMessage::Submit).await.unwrap();
        tx.send(IngestorMessage::Shutdown(ExitReason::Normal)).await.unwrap();

        let reason = handle.await.unwrap();
        assert_eq!(reason, ExitReason::Normal);
        assert_eq!(sent.load(Ordering::SeqCst), 1);
        assert!(orphan::scan(&segments_dir).unwrap().is_empty());
    }
}
