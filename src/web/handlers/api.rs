use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::models::NlQuery;
use crate::web::state::AppState;

#[derive(Debug, Deserialize, Clone)]
pub struct NlQueryRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub uptime_seconds: i64,
    pub backend: String,
    pub model: String,
    pub expand_categories: bool,
}

// Natural-language question to SQL. Service failures are reported inside the
// record, so this only fails on a blank question.
pub async fn nl_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NlQueryRequest>,
) -> Result<Json<NlQuery>, (StatusCode, String)> {
    let question = payload.question.trim();
    if question.is_empty() {
        warn!("Rejected empty NL-query");
        return Err((
            StatusCode::BAD_REQUEST,
            "Question must not be empty".to_string(),
        ));
    }

    debug!("NL-query: {}", question);
    Ok(Json(state.pipeline.answer(question).await))
}

// System status
pub async fn system_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    let now = chrono::Utc::now();
    let uptime = now.signed_duration_since(state.startup_time).num_seconds();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
        backend: state.config.llm.backend.clone(),
        model: state.config.llm.model.clone(),
        expand_categories: state.config.pipeline.expand_categories,
    })
}
