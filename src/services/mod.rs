pub mod assistant;
pub mod cache;
pub mod insights;
pub mod predictions;
pub mod sales;

pub use cache::DashboardCache;
pub use predictions::{spawn_prediction_worker, PredictionQueue};
