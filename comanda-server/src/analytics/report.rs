//! Restaurant analytics report
//!
//! 全部基于读快照计算，不加锁不写库：
//! - 当日营收和单量（按 UTC 自然日，只数已结算订单）
//! - 厨房平均备餐时长
//! - 利润率前五的菜品
//! - 低库存预警
//!
//! 未知餐厅 id 不报错，返回一份全零报表。

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::db::models::MenuItem;
use crate::db::{RestaurantStore, StorageError};
use crate::orders::money;
use crate::utils::AppError;

/// 低库存预警线（单位数量）
pub const LOW_STOCK_THRESHOLD: Decimal = Decimal::from_parts(2, 0, 0, false, 0);

/// Analytics errors
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        AppError::Database(err.to_string())
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Full report returned by the analytics endpoint
#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    #[serde(with = "rust_decimal::serde::float")]
    pub revenue_today: Decimal,
    pub orders_count: usize,
    /// "3.2 mins", or "0 mins" when no order was ever marked ready
    pub avg_kitchen_time: String,
    pub top_profitable_items: Vec<ItemPerformance>,
    pub low_stock: Vec<LowStockAlert>,
}

/// Profitability row for one menu item
#[derive(Debug, Serialize)]
pub struct ItemPerformance {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    /// "57.50%"
    pub profit_margin: String,
    #[serde(skip)]
    margin: Decimal,
}

/// Ingredient running low
#[derive(Debug, Serialize)]
pub struct LowStockAlert {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_stock: Decimal,
    pub unit: String,
}

/// Analytics service over the restaurant store
#[derive(Clone)]
pub struct Analytics {
    store: RestaurantStore,
}

impl Analytics {
    pub fn new(store: RestaurantStore) -> Self {
        Self { store }
    }

    /// Build the full report for one restaurant
    pub fn restaurant_report(&self, restaurant_id: &str) -> AnalyticsResult<AnalyticsReport> {
        let orders = self.store.orders_for_restaurant(restaurant_id)?;

        // 当日已结算订单
        let today = Utc::now().date_naive();
        let mut revenue_today = Decimal::ZERO;
        let mut orders_count = 0;
        for order in &orders {
            if !order.status.is_settled() {
                continue;
            }
            let created = Utc
                .timestamp_millis_opt(order.created_at)
                .single()
                .map(|dt| dt.date_naive());
            if created == Some(today) {
                revenue_today += order.total_amount;
                orders_count += 1;
            }
        }

        // 平均备餐时长：分母是所有出过餐的订单
        let ready: Vec<f64> = orders
            .iter()
            .filter_map(|o| o.ready_at.map(|r| money::prep_minutes(o.created_at, r)))
            .collect();
        let avg_kitchen_time = if ready.is_empty() {
            "0 mins".to_string()
        } else {
            let total: f64 = ready.iter().filter(|m| **m > 0.0).sum();
            let avg = (total / ready.len() as f64 * 10.0).round() / 10.0;
            format!("{avg:.1} mins")
        };

        // 利润率排行
        let menu_items = self.store.menu_items_for_restaurant(restaurant_id)?;
        let mut performance = Vec::with_capacity(menu_items.len());
        for item in &menu_items {
            let cost = self.approximate_cost(item)?;
            let margin = profit_margin(item.price, cost);
            // 零价菜不显示小数位，正常菜固定两位
            let rendered = if item.price.is_zero() {
                "0%".to_string()
            } else {
                format!("{margin:.2}%")
            };
            performance.push(ItemPerformance {
                name: item.name.clone(),
                price: item.price,
                cost,
                profit_margin: rendered,
                margin,
            });
        }
        performance.sort_by(|a, b| b.margin.cmp(&a.margin));
        performance.truncate(5);

        // 低库存
        let low_stock = self
            .store
            .ingredients_for_restaurant(restaurant_id)?
            .into_iter()
            .filter(|i| i.current_stock < LOW_STOCK_THRESHOLD)
            .map(|i| LowStockAlert {
                name: i.name,
                current_stock: i.current_stock,
                unit: i.unit,
            })
            .collect();

        Ok(AnalyticsReport {
            revenue_today: money::round_money(revenue_today),
            orders_count,
            avg_kitchen_time,
            top_profitable_items: performance,
            low_stock,
        })
    }

    /// 菜品近似成本 = 基础配方各边 数量 × 食材单位成本
    fn approximate_cost(&self, item: &MenuItem) -> AnalyticsResult<Decimal> {
        let target = crate::db::models::RecipeTarget::menu_item(item.id.clone());
        let mut cost = Decimal::ZERO;
        for recipe in self.store.recipes_for_target(&target)? {
            if let Some(ingredient) = self.store.get_ingredient(&recipe.ingredient_id)? {
                cost += recipe.quantity_required * ingredient.cost_per_unit;
            }
        }
        Ok(cost)
    }
}

/// `(price − cost) / price × 100`, 2dp; zero-priced items report 0
pub fn profit_margin(price: Decimal, cost: Decimal) -> Decimal {
    if price.is_zero() {
        return Decimal::ZERO;
    }
    money::round_money((price - cost) / price * Decimal::ONE_HUNDRED)
}
