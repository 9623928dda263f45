use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{require_product_owner, require_user},
    services::predictions,
    state::AppState,
};

pub async fn get_prediction(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    require_product_owner(&state, &user, product_id).await?;

    let forecast = predictions::forecast(
        state.store.as_ref(),
        product_id,
        &state.config.insights,
        Utc::now(),
    )
    .await?;
    Ok(Json(forecast))
}
