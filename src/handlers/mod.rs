pub mod assistant;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod predictions;
pub mod products;
pub mod sales;
pub mod stores;
