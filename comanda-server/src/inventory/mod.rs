//! Inventory Module
//!
//! Stock ledger and recipe upkeep:
//!
//! - **ledger**: atomic debit/credit, restocking and recipe edge upsert

pub mod ledger;

// Re-exports
pub use ledger::{InventoryLedger, LedgerError, LedgerResult, RecipeSave};
