use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};
use scout::{publisher, ChatEvent, ChatInput, ScoutError};
use tokio_util::sync::CancellationToken;

use crate::server::app::AxumAppState;
use crate::server::routes::stream::sse_response;

/// Answer a chat message as an SSE stream of status, progress and a final
/// `complete` (or `error`) event.
pub async fn chat_handler(
    Extension(state): Extension<AxumAppState>,
    Json(input): Json<ChatInput>,
) -> Response {
    let (sink, events) = publisher::channel::<ChatEvent>(state.event_buffer);
    let cancel = CancellationToken::new();

    let assistant = state.assistant.clone();
    let token = cancel.clone();
    tokio::spawn(async move {
        match assistant.respond(&input, &sink, &token).await {
            Ok(()) | Err(ScoutError::RunCancelled) => {}
            Err(e) => tracing::debug!(error = %e, "Chat stream ended with error"),
        }
    });

    sse_response(events, cancel).into_response()
}
