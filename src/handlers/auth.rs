use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use tower_cookies::Cookies;

use crate::{
    error::AppError,
    middleware::{clear_session, require_user, session_cookie},
    models::{LoginRequest, NewUser, RegisterRequest, UpdateProfileRequest, UserResponse},
    state::AppState,
    utils::{create_token, hash_password, verify_password},
};

fn start_session(state: &AppState, cookies: &Cookies, user_id: uuid::Uuid) -> Result<(), AppError> {
    let token = create_token(user_id, &state.config.jwt_secret)?;
    cookies.add(session_cookie(token, state.config.production));
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let email = body.email.trim().to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User with this email already exists".to_string()));
    }

    let password_hash = hash_password(&body.password, state.config.bcrypt_cost)?;
    let user = state
        .store
        .create_user(NewUser {
            email,
            name: body.name.trim().to_string(),
            password_hash,
        })
        .await?;

    start_session(&state, &cookies, user.id)?;
    log::info!("registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(json!({ "user": UserResponse::from(user) }))))
}

pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    body.validate()?;

    let invalid = || AppError::Unauthorized("Invalid email or password".to_string());
    let email = body.email.trim().to_lowercase();
    let user = state.store.find_user_by_email(&email).await?.ok_or_else(invalid)?;
    if !verify_password(&body.password, &user.password_hash) {
        return Err(invalid());
    }

    start_session(&state, &cookies, user.id)?;

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}

pub async fn logout(cookies: Cookies) -> impl IntoResponse {
    clear_session(&cookies);
    Json(json!({ "success": true }))
}

pub async fn me(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse, AppError> {
    let current = require_user(&cookies, &state).await?;
    Ok(Json(json!({ "user": UserResponse::from(current.user) })))
}

pub async fn update_me(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let current = require_user(&cookies, &state).await?;

    let user = match body.name.as_deref().map(str::trim) {
        Some("") => return Err(AppError::validation("Name cannot be empty")),
        Some(name) => state.store.rename_user(current.id, name).await?,
        None => current.user,
    };

    Ok(Json(json!({ "user": UserResponse::from(user) })))
}
