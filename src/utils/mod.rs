pub mod auth;

pub use auth::{create_token, hash_password, verify_password, verify_token, SESSION_DAYS};
