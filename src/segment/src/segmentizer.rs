use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context as TaskContext, Poll};

use futures::Stream;
use uuid::Uuid;
use vast_value::{Event, Type};

use crate::segment::{Chunk, Segment};

/// Transforms an unbounded event stream into size/count-bounded,
/// content-addressed segments (spec §4.4). Events arrive in order;
/// segments and the events within them are emitted in arrival order.
pub struct Segmentizer<S> {
    inner: S,
    max_events_per_chunk: usize,
    max_segment_size: usize,
    current_chunk: Chunk,
    current_chunk_size: usize,
    sealed_chunks: Vec<Chunk>,
    sealed_size: usize,
    schema: Option<Type>,
    first_time: Option<i64>,
    last_time: Option<i64>,
    ready: VecDeque<Segment>,
    inner_done: bool,
}

impl<S> Segmentizer<S>
where
    S: Stream<Item = Event> + Unpin,
{
    pub fn new(inner: S, max_events_per_chunk: usize, max_segment_size: usize) -> Self {
        Self {
            inner,
            max_events_per_chunk,
            max_segment_size,
            current_chunk: Vec::new(),
            current_chunk_size: 0,
            sealed_chunks: Vec::new(),
            sealed_size: 0,
            schema: None,
            first_time: None,
            last_time: None,
            ready: VecDeque::new(),
            inner_done: false,
        }
    }

    fn event_size(event: &Event) -> usize {
        serde_json::to_vec(event).map(|v| v.len()).unwrap_or(0)
    }

    fn observe(&mut self, event: &Event, time: i64) {
        self.first_time = Some(self.first_time.map_or(time, |t| t.min(time)));
        self.last_time = Some(self.last_time.map_or(time, |t| t.max(time)));
        match &self.schema {
            None => self.schema = Some((*event.ty).clone()),
            Some(existing) => {
                if let Ok(merged) = existing.merge(&event.ty) {
                    self.schema = Some(merged);
                }
                // a merge conflict inside one chunk is surfaced by the
                // partition on ingest, not here; the segmentizer's job
                // is bounding size, not schema validation.
            }
        }
    }

    /// Appends one event, sealing a chunk and/or the current segment as
    /// the configured bounds require.
    fn push_event(&mut self, event: Event, time: i64) {
        self.observe(&event, time);
        self.current_chunk_size += Self::event_size(&event);
        self.current_chunk.push(event);
        if self.current_chunk.len() >= self.max_events_per_chunk {
            self.seal_chunk();
        }
    }

    fn seal_chunk(&mut self) {
        if self.current_chunk.is_empty() {
            return;
        }
        let chunk = std::mem::take(&mut self.current_chunk);
        let chunk_size = self.current_chunk_size;
        self.current_chunk_size = 0;
        if !self.sealed_chunks.is_empty() && self.sealed_size + chunk_size > self.max_segment_size
        {
            self.seal_segment();
        }
        self.sealed_size += chunk_size;
        self.sealed_chunks.push(chunk);
    }

    fn seal_segment(&mut self) {
        if self.sealed_chunks.is_empty() {
            return;
        }
        let segment = Segment {
            uuid: Uuid::now_v7(),
            first_event_time: self.first_time.unwrap_or_default(),
            last_event_time: self.last_time.unwrap_or_default(),
            schema: self.schema.take().unwrap_or(Type::anonymous_record(Vec::new())),
            chunks: std::mem::take(&mut self.sealed_chunks),
        };
        self.sealed_size = 0;
        self.first_time = None;
        self.last_time = None;
        self.ready.push_back(segment);
    }

    fn flush_all(&mut self) {
        self.seal_chunk();
        self.seal_segment();
    }
}

impl<S> Stream for Segmentizer<S>
where
    S: Stream<Item = Event> + Unpin,
{
    type Item = Segment;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(segment) = self.ready.pop_front() {
                return Poll::Ready(Some(segment));
            }
            if self.inner_done {
                return Poll::Ready(None);
            }
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(event)) => {
                    // timestamp extraction is a partition/indexer concern
                    // in the general model; the segmentizer only needs a
                    // total order over arrival, which event id provides.
                    let time = event.id as i64;
                    self.push_event(event, time);
                }
                Poll::Ready(None) => {
                    self.inner_done = true;
                    self.flush_all();
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
