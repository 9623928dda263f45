pub mod auth;

pub use auth::{
    clear_session, require_product_owner, require_store_owner, require_user, session_cookie,
};
