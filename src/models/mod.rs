pub mod user;
pub mod store;
pub mod inventory;
pub mod sale;
pub mod prediction;

pub use user::{User, NewUser, UserResponse, RegisterRequest, LoginRequest, UpdateProfileRequest};
pub use store::{Store, NewStore, StoreNameRequest};
pub use inventory::{
    Product, Inventory, ProductWithInventory, ProductInventoryRow,
    CreateProductRequest, NewProduct, ProductPatch, UpdateStockRequest,
};
pub use sale::{Sale, NewSale, SaleReceipt, SalesRollup, SalesQuery};
pub use prediction::{Prediction, NewPrediction, Forecast};
