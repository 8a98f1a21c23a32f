//! Streaming scout runs.

use axum::{
    extract::Extension,
    response::{IntoResponse, Response},
    Json,
};
use scout::{publisher, ProgressEvent, ScoutError, ScoutRequest};
use tokio_util::sync::CancellationToken;

use crate::server::app::AxumAppState;
use crate::server::error::ApiError;
use crate::server::routes::stream::sse_response;

/// Start a Discovery → Deep-Dive run and stream its progress as SSE.
///
/// The request is validated before the stream opens so a bad body gets a
/// plain 400 instead of an event stream.
pub async fn run_scout_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ScoutRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;

    let (sink, events) = publisher::channel::<ProgressEvent>(state.event_buffer);
    let cancel = CancellationToken::new();

    let pipeline = state.pipeline.clone();
    let token = cancel.clone();
    tokio::spawn(async move {
        match pipeline.run(&request, &sink, &token).await {
            Ok(summary) => tracing::debug!(
                run_id = %summary.run_id,
                results = summary.results.len(),
                "Scout stream finished"
            ),
            Err(ScoutError::RunCancelled) => tracing::debug!("Scout stream cancelled"),
            Err(e) => tracing::warn!(error = %e, "Scout stream ended with error"),
        }
    });

    Ok(sse_response(events, cancel).into_response())
}
