use std::{env, str::FromStr, time::Duration};

use thiserror::Error;

const MIN_PRODUCTION_SECRET_LEN: usize = 32;
/// Upper bound for day-count settings; larger values overflow date arithmetic.
const MAX_DAYS: u32 = 3650;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variables: {0}")]
    Missing(String),
    #[error("JWT_SECRET must be at least 32 characters in production")]
    WeakSecret,
    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Where persistent state lives.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    Postgres(String),
    Memory,
}

/// Thresholds used by the dashboard aggregation and prediction recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightConfig {
    /// Trailing sales window, in days.
    pub window_days: u32,
    /// A product with at most this many days of stock left is low.
    pub low_days_left: f64,
    /// Average units per day at or above which a product is fast-moving.
    pub fast_moving_per_day: f64,
    /// Reorder horizon, in days of projected demand.
    pub forecast_days: u32,
    /// Units added on top of the projected demand.
    pub safety_buffer: u32,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            low_days_left: 3.0,
            fast_moving_per_day: 5.0,
            forecast_days: 7,
            safety_buffer: 5,
        }
    }
}

impl InsightConfig {
    /// `ceil(avg * forecast_days + safety_buffer)`
    pub fn reorder_quantity(&self, avg_daily_sales: f64) -> i32 {
        (avg_daily_sales * self.forecast_days as f64 + self.safety_buffer as f64).ceil() as i32
    }

    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::days(self.window_days as i64)
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub jwt_secret: String,
    pub port: u16,
    pub production: bool,
    pub dashboard_cache_ttl: Duration,
    pub bcrypt_cost: u32,
    pub insights: InsightConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let use_memory = get("STORAGE").map(|v| v == "memory").unwrap_or(false);
        let database_url = get("DATABASE_URL");
        let jwt_secret = get("JWT_SECRET");

        let mut missing = Vec::new();
        if database_url.is_none() && !use_memory {
            missing.push("DATABASE_URL");
        }
        if jwt_secret.is_none() {
            missing.push("JWT_SECRET");
        }
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }

        let storage = match database_url {
            Some(url) if !use_memory => StorageBackend::Postgres(url),
            _ => StorageBackend::Memory,
        };
        let jwt_secret = jwt_secret.unwrap_or_default();

        let production = get("APP_ENV").map(|v| v == "production").unwrap_or(false);
        if production && jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let defaults = InsightConfig::default();
        let insights = InsightConfig {
            window_days: parse_or(&get, "INSIGHT_WINDOW_DAYS", defaults.window_days)?,
            low_days_left: parse_or(&get, "INSIGHT_LOW_DAYS_LEFT", defaults.low_days_left)?,
            fast_moving_per_day: parse_or(
                &get,
                "INSIGHT_FAST_MOVING_PER_DAY",
                defaults.fast_moving_per_day,
            )?,
            forecast_days: parse_or(&get, "INSIGHT_FORECAST_DAYS", defaults.forecast_days)?,
            safety_buffer: parse_or(&get, "INSIGHT_SAFETY_BUFFER", defaults.safety_buffer)?,
        };
        if insights.window_days == 0 || insights.window_days > MAX_DAYS {
            return Err(ConfigError::Invalid {
                name: "INSIGHT_WINDOW_DAYS",
                value: insights.window_days.to_string(),
            });
        }
        if insights.forecast_days > MAX_DAYS {
            return Err(ConfigError::Invalid {
                name: "INSIGHT_FORECAST_DAYS",
                value: insights.forecast_days.to_string(),
            });
        }

        Ok(Self {
            storage,
            jwt_secret,
            port: parse_or(&get, "PORT", 3000)?,
            production,
            dashboard_cache_ttl: Duration::from_secs(parse_or(&get, "DASHBOARD_CACHE_TTL_SECS", 60)?),
            bcrypt_cost: parse_or(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST)?,
            insights,
        })
    }
}

fn parse_or<T, G>(get: &G, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn reports_all_missing_variables() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("DATABASE_URL, JWT_SECRET".to_string()));
    }

    #[test]
    fn defaults_apply_when_optional_values_absent() {
        let config = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/shelfwise"),
            ("JWT_SECRET", "dev-secret"),
        ]))
        .unwrap();

        assert_eq!(
            config.storage,
            StorageBackend::Postgres("postgres://localhost/shelfwise".to_string())
        );
        assert_eq!(config.port, 3000);
        assert!(!config.production);
        assert_eq!(config.dashboard_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.insights, InsightConfig::default());
    }

    #[test]
    fn memory_storage_does_not_need_database_url() {
        let config =
            AppConfig::from_lookup(lookup(&[("STORAGE", "memory"), ("JWT_SECRET", "s")])).unwrap();
        assert_eq!(config.storage, StorageBackend::Memory);
    }

    #[test]
    fn production_rejects_short_secret() {
        let err = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db"),
            ("JWT_SECRET", "short"),
            ("APP_ENV", "production"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::WeakSecret);
    }

    #[test]
    fn insight_thresholds_can_be_overridden() {
        let config = AppConfig::from_lookup(lookup(&[
            ("STORAGE", "memory"),
            ("JWT_SECRET", "s"),
            ("INSIGHT_WINDOW_DAYS", "14"),
            ("INSIGHT_FAST_MOVING_PER_DAY", "2.5"),
        ]))
        .unwrap();
        assert_eq!(config.insights.window_days, 14);
        assert_eq!(config.insights.fast_moving_per_day, 2.5);
        assert_eq!(config.insights.low_days_left, 3.0);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[
            ("STORAGE", "memory"),
            ("JWT_SECRET", "s"),
            ("PORT", "eighty"),
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "PORT",
                value: "eighty".to_string()
            }
        );
    }

    #[test]
    fn day_counts_are_bounded() {
        let with = |name: &'static str, value: &'static str| {
            AppConfig::from_lookup(lookup(&[("STORAGE", "memory"), ("JWT_SECRET", "s"), (name, value)]))
        };

        assert_eq!(
            with("INSIGHT_WINDOW_DAYS", "4000000000").unwrap_err(),
            ConfigError::Invalid {
                name: "INSIGHT_WINDOW_DAYS",
                value: "4000000000".to_string()
            }
        );
        assert!(with("INSIGHT_WINDOW_DAYS", "0").is_err());
        assert!(with("INSIGHT_WINDOW_DAYS", "3650").is_ok());
        assert!(with("INSIGHT_WINDOW_DAYS", "3651").is_err());
        assert!(with("INSIGHT_FORECAST_DAYS", "3651").is_err());
    }

    #[test]
    fn reorder_quantity_adds_buffer_and_rounds_up() {
        let insights = InsightConfig::default();
        assert_eq!(insights.reorder_quantity(2.0), 19);
        assert_eq!(insights.reorder_quantity(0.0), 5);
        assert_eq!(insights.reorder_quantity(0.1), 6);
    }
}
