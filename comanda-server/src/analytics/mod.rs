//! Analytics module
//!
//! 只读统计，汇总营收、厨房效率、菜品利润率和库存预警。

pub mod report;

pub use report::{
    Analytics, AnalyticsError, AnalyticsReport, AnalyticsResult, ItemPerformance,
    LOW_STOCK_THRESHOLD, LowStockAlert,
};
