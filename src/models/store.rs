use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use chrono::{DateTime, Utc};

use crate::error::AppError;

const MAX_STORE_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStore {
    pub name: String,
    pub slug: String,
    pub owner_id: Uuid,
}

impl NewStore {
    pub fn new(name: &str, owner_id: Uuid, now: DateTime<Utc>) -> Self {
        let name = name.trim().to_string();
        let slug = format!("{}-{}", slugify(&name), now.timestamp_millis());
        Self { name, slug, owner_id }
    }
}

#[derive(Debug, Deserialize)]
pub struct StoreNameRequest {
    pub name: String,
}

impl StoreNameRequest {
    pub fn validated_name(&self) -> Result<&str, AppError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Store name is required"));
        }
        if name.chars().count() > MAX_STORE_NAME_LEN {
            return Err(AppError::validation(format!(
                "Store name must be at most {} characters",
                MAX_STORE_NAME_LEN
            )));
        }
        Ok(name)
    }
}

/// Lowercase, alphanumeric runs joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Corner Shop #2 "), "corner-shop-2");
        assert_eq!(slugify("Ünïcode & Co"), "n-code-co");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn store_name_bounds() {
        assert!(StoreNameRequest { name: " ".into() }.validated_name().is_err());
        assert!(StoreNameRequest { name: "x".repeat(101) }.validated_name().is_err());
        assert_eq!(
            StoreNameRequest { name: " Main ".into() }.validated_name().unwrap(),
            "Main"
        );
    }
}
