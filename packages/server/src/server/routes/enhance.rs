use axum::{extract::Extension, Json};
use serde::{Deserialize, Serialize};

use crate::server::app::AxumAppState;

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default, alias = "userQuery")]
    pub user_query: String,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    pub refined_query: String,
}

/// Rewrite a free-text thesis into a richer search query.
///
/// Falls back to keyword expansion when the model is unavailable, so this
/// endpoint always answers 200.
pub async fn enhance_query_handler(
    Extension(state): Extension<AxumAppState>,
    Json(request): Json<EnhanceRequest>,
) -> Json<EnhanceResponse> {
    let refined_query = scout::enhance_query(state.llm.as_ref(), &request.user_query).await;
    Json(EnhanceResponse { refined_query })
}
