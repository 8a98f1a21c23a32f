//! SSE framing for event streams.
//!
//! Converts a run's [`EventStream`] into SSE events named after the event
//! kind, with the sequence number as `id`. Gaps in the sequence (events the
//! publisher dropped for a slow client) surface as a `lagged` event with the
//! number missed. The stream holds a cancellation guard: when the client goes
//! away and axum drops the stream, the producing run is cancelled.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use scout::{EventStream, LagTracker, StreamEvent};
use serde_json::{json, Value};
use tokio_util::sync::{CancellationToken, DropGuard};

/// One SSE message before axum formatting.
#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Lagged { missed: u64 },
    Event { name: &'static str, id: u64, data: Value },
}

impl From<SseFrame> for Event {
    fn from(frame: SseFrame) -> Self {
        match frame {
            SseFrame::Lagged { missed } => Event::default()
                .event("lagged")
                .data(json!({ "missed": missed }).to_string()),
            SseFrame::Event { name, id, data } => Event::default()
                .event(name)
                .id(id.to_string())
                .data(data.to_string()),
        }
    }
}

/// Frames for every envelope, preceded by `lagged` where a gap occurred.
pub fn frames<E: StreamEvent>(events: EventStream<E>) -> impl Stream<Item = SseFrame> + Unpin {
    let mut lag = LagTracker::new();
    events.flat_map(move |envelope| {
        let mut out = Vec::with_capacity(2);
        if let Some(missed) = lag.observe(envelope.seq) {
            out.push(SseFrame::Lagged { missed });
        }
        let data = serde_json::to_value(&envelope.event).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize event");
            json!({ "type": envelope.event.name() })
        });
        out.push(SseFrame::Event {
            name: envelope.event.name(),
            id: envelope.seq,
            data,
        });
        stream::iter(out)
    })
}

/// A stream that cancels its token when dropped.
pub struct CancelOnDrop<S> {
    inner: S,
    _guard: DropGuard,
}

impl<S> CancelOnDrop<S> {
    pub fn new(inner: S, token: CancellationToken) -> Self {
        Self {
            inner,
            _guard: token.drop_guard(),
        }
    }
}

impl<S: Stream + Unpin> Stream for CancelOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

/// SSE response for a run's event stream, cancelling `cancel` on disconnect.
pub fn sse_response<E: StreamEvent>(
    events: EventStream<E>,
    cancel: CancellationToken,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = frames(events).map(|frame| Ok::<_, Infallible>(Event::from(frame)));
    Sse::new(CancelOnDrop::new(events, cancel)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout::{publisher, ProgressEvent};
    use uuid::Uuid;

    fn started() -> ProgressEvent {
        ProgressEvent::DiscoveryStarted {
            run_id: Uuid::nil(),
            query: "q".into(),
        }
    }

    #[tokio::test]
    async fn test_lag_surfaces_as_frame() {
        let (sink, events) = publisher::channel::<ProgressEvent>(1);
        sink.emit(started()).unwrap();
        // buffer full, dropped
        sink.emit(started()).unwrap();
        sink.emit(ProgressEvent::RunFailed {
            run_id: Uuid::nil(),
            code: "search_unavailable".into(),
            error: "down".into(),
        })
        .unwrap();
        drop(sink);

        let frames: Vec<SseFrame> = frames(events).collect().await;
        assert_eq!(frames.len(), 3);
        assert!(matches!(frames[0], SseFrame::Event { name: "discovery_started", id: 0, .. }));
        assert_eq!(frames[1], SseFrame::Lagged { missed: 1 });
        let SseFrame::Event { name, id, data } = &frames[2] else {
            panic!("expected event frame");
        };
        assert_eq!((*name, *id), ("run_failed", 2));
        assert_eq!(data["code"], "search_unavailable");
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_token() {
        let (_sink, events) = publisher::channel::<ProgressEvent>(2);
        let token = CancellationToken::new();
        let stream = CancelOnDrop::new(frames(events), token.clone());

        assert!(!token.is_cancelled());
        drop(stream);
        assert!(token.is_cancelled());
    }
}
