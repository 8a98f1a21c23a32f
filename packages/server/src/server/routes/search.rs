use axum::{extract::Extension, Json};
use scout::{ScoutRequest, SearchHit};
use serde::Serialize;

use crate::server::app::AxumAppState;

#[derive(Debug, Serialize)]
pub struct LinkupSearchResponse {
    pub success: bool,
    pub results: Vec<SearchHit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Raw search proxy. Upstream failures are reported in the body, not the
/// status code.
pub async fn linkup_search_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<ScoutRequest>,
) -> Json<LinkupSearchResponse> {
    if let Err(e) = request.validate() {
        return Json(LinkupSearchResponse {
            success: false,
            results: Vec::new(),
            error: Some(e.to_string()),
        });
    }

    let query = request.search_query();
    match state.searcher.search(&query).await {
        Ok(results) => {
            tracing::debug!(%query, hits = results.len(), "Search proxied");
            Json(LinkupSearchResponse {
                success: true,
                results,
                error: None,
            })
        }
        Err(e) => {
            tracing::warn!(%query, error = %e, "Search proxy failed");
            Json(LinkupSearchResponse {
                success: false,
                results: Vec::new(),
                error: Some(e.to_string()),
            })
        }
    }
}
