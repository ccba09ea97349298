//! Database Models

// Tenant
pub mod restaurant;

// Catalog Domain
pub mod category;
pub mod ingredient;
pub mod menu_item;
pub mod recipe;
pub mod variant;

// Location
pub mod dining_table;

// Staff
pub mod waiter;

// Runtime
pub mod order;
pub mod reservation;

// Re-exports
pub use restaurant::Restaurant;
pub use category::Category;
pub use menu_item::MenuItem;
pub use variant::{VariantGroup, VariantOption};
pub use ingredient::Ingredient;
pub use recipe::{Recipe, RecipeTarget};
pub use dining_table::DiningTable;
pub use waiter::Waiter;
pub use order::{Order, OrderItem, OrderStatus, SelectedOption};
pub use reservation::Reservation;
