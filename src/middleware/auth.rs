use tower_cookies::{cookie::SameSite, Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{ProductWithInventory, Store, User},
    state::AppState,
    store::StoreError,
    utils::{verify_token, SESSION_DAYS},
};

pub const AUTH_COOKIE: &str = "auth_token";

/// The authenticated caller, resolved from the session cookie.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub user: User,
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

pub async fn require_user(cookies: &Cookies, state: &AppState) -> Result<CurrentUser, AppError> {
    let token = cookies
        .get(AUTH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(unauthorized)?;

    let claims = verify_token(&token, &state.config.jwt_secret).map_err(|e| {
        log::debug!("rejected session token: {}", e);
        unauthorized()
    })?;
    let user_id = claims.user_id().ok_or_else(unauthorized)?;

    // A token for a deleted account is treated like no token at all.
    let user = match state.store.find_user(user_id).await {
        Err(StoreError::NotFound(_)) => return Err(unauthorized()),
        result => result?,
    };

    Ok(CurrentUser { id: user.id, user })
}

/// Loads the store and checks the caller owns it: 404 when it does not
/// exist, 403 when it belongs to someone else.
pub async fn require_store_owner(
    state: &AppState,
    user: &CurrentUser,
    store_id: Uuid,
) -> Result<Store, AppError> {
    let store = state.store.find_store(store_id).await?;
    if store.owner_id != user.id {
        return Err(AppError::Forbidden(
            "Forbidden: You don't have access to this store".to_string(),
        ));
    }
    Ok(store)
}

/// Loads the product and checks ownership through its store.
pub async fn require_product_owner(
    state: &AppState,
    user: &CurrentUser,
    product_id: Uuid,
) -> Result<ProductWithInventory, AppError> {
    let product = state.store.find_product(product_id).await?;
    require_store_owner(state, user, product.product.store_id).await?;
    Ok(product)
}

pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::days(SESSION_DAYS))
        .build()
}

pub fn clear_session(cookies: &Cookies) {
    cookies.remove(Cookie::build((AUTH_COOKIE, "")).path("/").build());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_flags() {
        let cookie = session_cookie("abc".into(), true);
        assert_eq!(cookie.name(), AUTH_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));

        let dev = session_cookie("abc".into(), false);
        assert_eq!(dev.secure(), Some(false));
    }
}
