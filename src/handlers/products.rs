use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
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
    middleware::{require_product_owner, require_store_owner, require_user},
    models::{CreateProductRequest, ProductPatch, UpdateStockRequest},
    state::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub store_id: Option<Uuid>,
}

pub async fn list_products(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let store_id = query
        .store_id
        .ok_or_else(|| AppError::validation("storeId is required"))?;
    require_store_owner(&state, &user, store_id).await?;

    let products = state.store.list_products(store_id).await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    require_store_owner(&state, &user, body.store_id).await?;

    let new_product = body.into_new_product(Utc::now())?;
    let store_id = new_product.store_id;
    let product = state.store.create_product(new_product).await?;
    state.dashboard_cache.invalidate(store_id).await;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let product = require_product_owner(&state, &user, id).await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
    Json(patch): Json<ProductPatch>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let existing = require_product_owner(&state, &user, id).await?;
    patch.validate()?;

    let product = state.store.update_product(id, patch).await?;
    state.dashboard_cache.invalidate(existing.product.store_id).await;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let existing = require_product_owner(&state, &user, id).await?;

    state.store.delete_product(id).await?;
    state.dashboard_cache.invalidate(existing.product.store_id).await;
    Ok(Json(json!({ "success": true })))
}

/// Absolute stock adjustment.
pub async fn update_stock(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStockRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let existing = require_product_owner(&state, &user, id).await?;
    body.validate()?;

    let inventory = state.store.set_stock(id, body.quantity).await?;
    state.dashboard_cache.invalidate(existing.product.store_id).await;
    Ok(Json(inventory))
}
