use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{require_store_owner, require_user},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardQuery {
    pub store_id: Option<Uuid>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let store_id = query
        .store_id
        .ok_or_else(|| AppError::validation("storeId is required"))?;
    require_store_owner(&state, &user, store_id).await?;

    let data = state
        .dashboard_cache
        .get_or_load(
            state.store.as_ref(),
            store_id,
            &state.config.insights,
            Utc::now(),
        )
        .await?;
    Ok(Json(data.as_ref().clone()))
}
