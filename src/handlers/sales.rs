use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    middleware::{require_product_owner, require_store_owner, require_user},
    models::{NewSale, SalesQuery},
    services::sales,
    state::AppState,
};

pub async fn list_sales(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<SalesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;

    let rows = match (query.store_id, query.product_id) {
        (Some(store_id), _) => {
            require_store_owner(&state, &user, store_id).await?;
            state.store.list_sales_by_store(store_id).await?
        }
        (None, Some(product_id)) => {
            require_product_owner(&state, &user, product_id).await?;
            state.store.list_sales_by_product(product_id).await?
        }
        (None, None) => {
            return Err(AppError::validation("storeId or productId is required"));
        }
    };

    Ok(Json(rows))
}

pub async fn create_sale(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<NewSale>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    body.validate()?;
    require_store_owner(&state, &user, body.store_id).await?;

    let receipt = sales::record_sale(
        state.store.as_ref(),
        &state.dashboard_cache,
        &state.predictions,
        body,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
