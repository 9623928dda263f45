use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{require_store_owner, require_user},
    services::assistant,
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    pub store_id: Uuid,
    pub question: String,
}

pub async fn ask(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<AssistantRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    assistant::validate_question(&body.question).map_err(AppError::validation)?;
    require_store_owner(&state, &user, body.store_id).await?;

    let reply = assistant::answer(
        state.store.as_ref(),
        &state.dashboard_cache,
        body.store_id,
        &body.question,
        &state.config.insights,
        Utc::now(),
    )
    .await?;

    Ok(Json(reply))
}

pub async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        Json(json!({
            "error": "Method not allowed. Send a POST request with { storeId, question }."
        })),
    )
}
