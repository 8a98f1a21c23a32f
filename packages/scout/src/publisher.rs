//! Bounded event delivery from a run to its single consumer.
//!
//! Every emitted event gets a monotonically increasing sequence number.
//! Intermediate events are dropped (and counted) when the consumer falls
//! behind. One slot is reserved up front for the terminal event, so emitting
//! it never waits on the consumer. A consumer detects drops as gaps in the
//! sequence, see [`LagTracker`].

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError, OwnedPermit};

use crate::events::StreamEvent;

/// An event stamped with its position in the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<E> {
    pub seq: u64,
    pub event: E,
}

/// The consumer went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("event stream closed")]
pub struct SinkClosed;

type TerminalSlot<E> = Arc<Mutex<Option<OwnedPermit<Envelope<E>>>>>;

/// Create a sink/stream pair holding at most `capacity` undelivered
/// intermediate events, plus the reserved terminal slot.
pub fn channel<E: StreamEvent>(capacity: usize) -> (EventSink<E>, EventStream<E>) {
    let (tx, rx) = mpsc::channel(capacity.max(1) + 1);
    // A fresh channel always has room for the reservation.
    let terminal = tx.clone().try_reserve_owned().ok();
    let sink = EventSink {
        tx,
        terminal: Arc::new(Mutex::new(terminal)),
        next_seq: Arc::new(AtomicU64::new(0)),
        dropped: Arc::new(AtomicU64::new(0)),
    };
    (sink, EventStream { rx })
}

/// Producer half. Cheap to clone; clones share the sequence counter and the
/// terminal slot.
pub struct EventSink<E> {
    tx: mpsc::Sender<Envelope<E>>,
    terminal: TerminalSlot<E>,
    next_seq: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            terminal: Arc::clone(&self.terminal),
            next_seq: Arc::clone(&self.next_seq),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<E: StreamEvent> EventSink<E> {
    /// Publish an event. Never waits on the consumer.
    ///
    /// Intermediate events are dropped if the buffer is full. The first
    /// terminal event goes into the reserved slot and is always delivered
    /// while the consumer is connected.
    pub fn emit(&self, event: impl Into<E>) -> Result<(), SinkClosed> {
        if self.tx.is_closed() {
            return Err(SinkClosed);
        }

        let event = event.into();
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let name = event.name();

        if event.is_terminal() {
            if let Some(permit) = self.take_terminal_slot() {
                let _ = permit.send(Envelope { seq, event });
                return Ok(());
            }
            tracing::warn!(seq, event = name, "Terminal slot already used");
        }

        match self.tx.try_send(Envelope { seq, event }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                tracing::debug!(seq, event = name, dropped, "Consumer lagging, dropped event");
                Ok(())
            }
            Err(TrySendError::Closed(_)) => Err(SinkClosed),
        }
    }

    fn take_terminal_slot(&self) -> Option<OwnedPermit<Envelope<E>>> {
        match self.terminal.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    /// Number of intermediate events dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Resolves once the consumer has gone away.
    pub async fn closed(&self) {
        self.tx.closed().await
    }
}

/// Consumer half.
pub struct EventStream<E> {
    rx: mpsc::Receiver<Envelope<E>>,
}

impl<E> EventStream<E> {
    pub async fn recv(&mut self) -> Option<Envelope<E>> {
        self.rx.recv().await
    }
}

impl<E> Stream for EventStream<E> {
    type Item = Envelope<E>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Detects gaps in received sequence numbers.
#[derive(Debug, Default)]
pub struct LagTracker {
    expected: u64,
}

impl LagTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a received sequence number; returns how many were missed
    /// since the previous one, if any.
    pub fn observe(&mut self, seq: u64) -> Option<u64> {
        let missed = seq.saturating_sub(self.expected);
        self.expected = seq + 1;
        (missed > 0).then_some(missed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ProgressEvent;
    use crate::types::candidate::Candidate;
    use uuid::Uuid;

    fn started() -> ProgressEvent {
        ProgressEvent::DiscoveryStarted {
            run_id: Uuid::nil(),
            query: "q".into(),
        }
    }

    fn failed() -> ProgressEvent {
        ProgressEvent::RunFailed {
            run_id: Uuid::nil(),
            code: "search_unavailable".into(),
            error: "down".into(),
        }
    }

    #[tokio::test]
    async fn test_drops_intermediate_when_full_and_keeps_terminal() {
        let (sink, mut stream) = channel::<ProgressEvent>(2);

        for _ in 0..5 {
            sink.emit(started()).unwrap();
        }
        assert_eq!(sink.dropped(), 3);

        let consumer = tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(env) = stream.recv().await {
                let done = env.event.is_terminal();
                seen.push(env.seq);
                if done {
                    break;
                }
            }
            seen
        });

        sink.emit(failed()).unwrap();
        let seen = consumer.await.unwrap();
        assert_eq!(seen, vec![0, 1, 5]);
    }

    #[tokio::test]
    async fn test_emit_after_consumer_dropped_reports_closed() {
        let (sink, stream) = channel::<ProgressEvent>(4);
        drop(stream);

        assert_eq!(sink.emit(started()), Err(SinkClosed));
        assert_eq!(sink.emit(failed()), Err(SinkClosed));
    }

    #[tokio::test]
    async fn test_converts_into_target_event() {
        use crate::events::ChatEvent;

        let (sink, mut stream) = channel::<ChatEvent>(4);
        sink.emit(ProgressEvent::DiscoveryCompleted {
            run_id: Uuid::nil(),
            candidates: vec![Candidate::new("Acme", "https://acme.com", "DE")],
        })
        .unwrap();

        let env = stream.recv().await.unwrap();
        assert_eq!(env.event.name(), "discovery_completed");
    }

    #[tokio::test]
    async fn test_terminal_delivered_to_stalled_consumer() {
        let (sink, mut stream) = channel::<ProgressEvent>(2);

        // Nobody reads until everything has been emitted.
        for _ in 0..4 {
            sink.emit(started()).unwrap();
        }
        sink.emit(failed()).unwrap();
        assert_eq!(sink.dropped(), 2);
        drop(sink);

        let mut seqs = Vec::new();
        while let Some(env) = stream.recv().await {
            seqs.push(env.seq);
        }
        assert_eq!(seqs, vec![0, 1, 4]);
    }

    #[tokio::test]
    async fn test_stream_ends_when_sinks_dropped_without_terminal() {
        let (sink, mut stream) = channel::<ProgressEvent>(2);
        let clone = sink.clone();
        sink.emit(started()).unwrap();
        drop(sink);
        drop(clone);

        assert_eq!(stream.recv().await.map(|e| e.seq), Some(0));
        assert!(stream.recv().await.is_none());
    }

    #[test]
    fn test_lag_tracker_reports_gaps() {
        let mut lag = LagTracker::new();
        assert_eq!(lag.observe(0), None);
        assert_eq!(lag.observe(1), None);
        assert_eq!(lag.observe(4), Some(2));
        assert_eq!(lag.observe(5), None);
    }
}
