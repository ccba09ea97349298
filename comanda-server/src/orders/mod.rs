//! Order Module
//!
//! Order intake, kitchen workflow and table settlement:
//!
//! - **engine**: Core OrderEngine for placement, mark-ready, billing and settlement
//! - **money**: Decimal rounding rules for money, stock and prep time
//!
//! # Data Flow
//!
//! ```text
//! PlaceOrder → OrderEngine → RestaurantStore (redb, one write txn)
//!                   ↓
//!          KitchenTicket broadcast
//!                   ↓
//!         TCP push channel → 厨房显示屏
//! ```

pub mod engine;
pub mod money;

// Re-exports
pub use engine::{
    KitchenLine, KitchenOrder, OrderEngine, OrderError, OrderLine, OrderResult, PlaceOrder,
    TableBill,
};
