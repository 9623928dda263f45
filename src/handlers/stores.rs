use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{require_store_owner, require_user},
    models::{NewStore, StoreNameRequest},
    state::AppState,
};

pub async fn list_stores(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let stores = state.store.list_stores(user.id).await?;
    Ok(Json(stores))
}

pub async fn create_store(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<StoreNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let name = body.validated_name()?;

    let store = state
        .store
        .create_store(NewStore::new(name, user.id, Utc::now()))
        .await?;
    log::info!("user {} created store {}", user.id, store.id);

    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn get_store(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    let store = require_store_owner(&state, &user, id).await?;
    Ok(Json(store))
}

pub async fn update_store(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
    Json(body): Json<StoreNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    require_store_owner(&state, &user, id).await?;
    let store = state.store.rename_store(id, body.validated_name()?).await?;
    Ok(Json(store))
}

pub async fn delete_store(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&cookies, &state).await?;
    require_store_owner(&state, &user, id).await?;
    state.store.delete_store(id).await?;
    state.dashboard_cache.invalidate(id).await;
    Ok(Json(json!({ "success": true })))
}
