//! OrderEngine - order intake, kitchen workflow and table settlement
//!
//! # Order Flow
//!
//! ```text
//! place_order(cmd)
//!     ├─ 1. Resolve restaurant / table / waiter
//!     ├─ 2. Allocate order number (persisted counter)
//!     ├─ 3. Per line: menu item → options → recipe debits → selection rules → pricing
//!     ├─ 4. Persist order + occupy table
//!     ├─ 5. Commit transaction (any failure rolls everything back)
//!     └─ 6. Broadcast kitchen ticket after commit
//! ```
//!
//! 订单号、库存扣减、餐桌占用都发生在同一个 redb 写事务里，
//! 任何一行校验失败，前面行已扣掉的库存随事务一起回滚。

use std::collections::HashSet;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::message::KitchenTicket;
use thiserror::Error;
use tokio::sync::broadcast;

use super::money;
use crate::db::models::{Order, OrderItem, OrderStatus, RecipeTarget, SelectedOption};
use crate::db::{RestaurantStore, StorageError};
use crate::inventory::{InventoryLedger, LedgerError};
use crate::utils::AppError;

/// Kitchen ticket broadcast capacity (一家门店同时在制订单远小于这个数)
const TICKET_CHANNEL_CAPACITY: usize = 1024;

/// Order processing errors
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Restaurant not found: {0}")]
    RestaurantNotFound(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table '{0}' does not belong to this restaurant")]
    TableMismatch(String),

    #[error("Menu item not found: {0}")]
    MenuItemNotFound(String),

    #[error("Menu item '{0}' is not on this restaurant's menu")]
    MenuItemMismatch(String),

    #[error("Quantity must be at least 1 for '{0}'")]
    InvalidQuantity(String),

    #[error(transparent)]
    Inventory(#[from] LedgerError),

    #[error("Selection required for '{0}'")]
    SelectionRequired(String),

    #[error("Only one selection allowed for '{0}'")]
    SingleSelectionOnly(String),

    #[error("Order not found: {0}")]
    OrderNotFound(u64),

    #[error("Order not pending: {0}")]
    NotPending(u64),

    #[error("No active orders")]
    NoActiveOrders,

    #[error("No active orders to settle")]
    NothingToSettle,
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        let message = err.to_string();
        match err {
            OrderError::Storage(_) => AppError::Database(message),

            OrderError::RestaurantNotFound(_)
            | OrderError::TableNotFound(_)
            | OrderError::MenuItemNotFound(_)
            | OrderError::OrderNotFound(_)
            | OrderError::NoActiveOrders => AppError::NotFound(message),

            // 下单路径上食材 id 来自配方边而不是客户端，查不到算内部数据问题
            OrderError::Inventory(e) => match e {
                LedgerError::InsufficientStock { .. } => AppError::InsufficientStock(message),
                LedgerError::IngredientNotFound(_) => AppError::Internal(message),
                other => AppError::from(other),
            },

            OrderError::TableMismatch(_)
            | OrderError::MenuItemMismatch(_)
            | OrderError::InvalidQuantity(_)
            | OrderError::SelectionRequired(_)
            | OrderError::SingleSelectionOnly(_)
            | OrderError::NothingToSettle => AppError::Validation(message),

            OrderError::NotPending(_) => AppError::Conflict(message),
        }
    }
}

pub type OrderResult<T> = Result<T, OrderError>;

// ========== Commands ==========

/// 下单命令（HTTP 层直接反序列化成这个结构）
///
/// `items` 必须出现，允许为空列表（零行订单合计为零也算成功）。
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrder {
    pub restaurant_id: String,
    pub table_id: String,
    #[serde(default)]
    pub waiter_id: Option<String>,
    /// 顾客不留名时记作散客
    #[serde(default = "default_customer_name")]
    pub customer_name: String,
    #[serde(default)]
    pub customer_phone: String,
    pub items: Vec<OrderLine>,
}

/// 一行点单
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLine {
    /// Menu item id
    pub id: String,
    pub qty: u32,
    /// Variant option ids; duplicates count once, unknown ids are dropped
    #[serde(default)]
    pub selected_options: Vec<String>,
}

fn default_customer_name() -> String {
    "Guest".to_string()
}

// ========== Views ==========

/// 桌账：该桌全部活跃订单的合并账单
#[derive(Debug, Serialize)]
pub struct TableBill {
    pub table_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    pub items: Vec<OrderItem>,
}

/// 厨房队列里的一张订单
#[derive(Debug, Serialize)]
pub struct KitchenOrder {
    pub id: u64,
    pub table_name: String,
    pub waiter_name: String,
    pub created_at: i64,
    pub items: Vec<KitchenLine>,
}

/// 厨房看到的一行：数量、菜名、规格拼成一段文字
#[derive(Debug, Serialize)]
pub struct KitchenLine {
    pub quantity: u32,
    pub menu_item_name: String,
    pub variants: String,
}

// ========== Engine ==========

/// Order engine over the restaurant store
///
/// Holds the kitchen ticket broadcast channel; tickets are sent only
/// after the order transaction has committed.
pub struct OrderEngine {
    store: RestaurantStore,
    ledger: InventoryLedger,
    ticket_tx: broadcast::Sender<KitchenTicket>,
}

impl std::fmt::Debug for OrderEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderEngine")
            .field("store", &"<RestaurantStore>")
            .field("ticket_tx", &"<broadcast::Sender>")
            .finish()
    }
}

impl OrderEngine {
    pub fn new(store: RestaurantStore) -> Self {
        let ledger = InventoryLedger::new(store.clone());
        let (ticket_tx, _) = broadcast::channel(TICKET_CHANNEL_CAPACITY);
        Self {
            store,
            ledger,
            ticket_tx,
        }
    }

    /// Subscribe to kitchen ticket broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<KitchenTicket> {
        self.ticket_tx.subscribe()
    }

    /// Get the underlying store
    pub fn store(&self) -> &RestaurantStore {
        &self.store
    }

    /// Place an order: validate, debit stock and persist in one transaction
    ///
    /// Returns the allocated order number.
    pub fn place_order(&self, cmd: PlaceOrder) -> OrderResult<u64> {
        let txn = self.store.begin_write()?;

        let restaurant = self
            .store
            .get_restaurant_txn(&txn, &cmd.restaurant_id)?
            .ok_or_else(|| OrderError::RestaurantNotFound(cmd.restaurant_id.clone()))?;

        let mut table = self
            .store
            .get_table_txn(&txn, &cmd.table_id)?
            .ok_or_else(|| OrderError::TableNotFound(cmd.table_id.clone()))?;
        if table.restaurant_id != restaurant.id {
            return Err(OrderError::TableMismatch(table.name));
        }

        // 服务员是可选的：查不到、离职、不属于本店都静默降级为无人跟单
        let waiter_id = match &cmd.waiter_id {
            Some(id) => self
                .store
                .get_waiter_txn(&txn, id)?
                .filter(|w| w.is_active && w.restaurant_id == restaurant.id)
                .map(|w| w.id),
            None => None,
        };

        let order_id = self.store.next_order_id(&txn)?;

        let mut total = Decimal::ZERO;
        let mut items = Vec::with_capacity(cmd.items.len());
        let mut ticket_lines = Vec::with_capacity(cmd.items.len());

        for line in &cmd.items {
            let menu_item = self
                .store
                .get_menu_item_txn(&txn, &line.id)?
                .ok_or_else(|| OrderError::MenuItemNotFound(line.id.clone()))?;
            if menu_item.restaurant_id != restaurant.id {
                return Err(OrderError::MenuItemMismatch(menu_item.name));
            }
            if line.qty == 0 {
                return Err(OrderError::InvalidQuantity(menu_item.name));
            }
            let quantity = Decimal::from(line.qty);

            let mut seen = HashSet::new();
            let mut options = Vec::new();
            for option_id in &line.selected_options {
                if !seen.insert(option_id.as_str()) {
                    continue;
                }
                if let Some(option) = self.store.get_variant_option_txn(&txn, option_id)? {
                    options.push(option);
                }
            }

            // 消耗边 = 菜品基础配方 + 每个选中规格的附加配方
            let base = RecipeTarget::menu_item(menu_item.id.clone());
            let mut edges = self.store.recipes_for_target_txn(&txn, &base)?;
            for option in &options {
                let target = RecipeTarget::variant_option(option.id.clone());
                edges.extend(self.store.recipes_for_target_txn(&txn, &target)?);
            }

            // 先扣库存再跑规格校验，失败时扣减随事务回滚
            for edge in &edges {
                let required = edge.quantity_required * quantity;
                self.ledger.debit_in_txn(&txn, &edge.ingredient_id, required)?;
            }

            let groups = self.store.variant_groups_for_item_txn(&txn, &menu_item.id)?;
            for group in &groups {
                let chosen = options.iter().filter(|o| o.group_id == group.id).count();
                if group.is_required && chosen == 0 {
                    return Err(OrderError::SelectionRequired(group.name.clone()));
                }
                if !group.allow_multiple && chosen > 1 {
                    return Err(OrderError::SingleSelectionOnly(group.name.clone()));
                }
            }

            // 单价 = 基础价 + 所有选中规格的加价
            let mut unit_price = menu_item.price;
            let mut selected = Vec::with_capacity(options.len());
            for option in options {
                unit_price += option.price_adjustment;
                selected.push(SelectedOption {
                    option_id: option.id,
                    name: option.name,
                    price_adjustment: option.price_adjustment,
                });
            }
            let unit_price = money::round_money(unit_price);
            total += unit_price * quantity;

            ticket_lines.push(format!("{} x {}", line.qty, menu_item.name));
            items.push(OrderItem {
                menu_item_id: menu_item.id,
                menu_item_name: menu_item.name,
                quantity: line.qty,
                price_at_time_of_order: unit_price,
                selected_options: selected,
            });
        }

        let order = Order {
            id: order_id,
            restaurant_id: restaurant.id,
            table_id: table.id.clone(),
            waiter_id,
            customer_name: cmd.customer_name,
            customer_phone: cmd.customer_phone,
            status: OrderStatus::Pending,
            total_amount: money::round_money(total),
            created_at: Utc::now().timestamp_millis(),
            ready_at: None,
            completed_at: None,
            items,
        };
        self.store.put_order_txn(&txn, &order)?;

        table.is_occupied = true;
        self.store.put_table_txn(&txn, &table)?;

        txn.commit().map_err(StorageError::from)?;

        // 提交成功后才通知厨房，订阅端掉线也不影响下单
        let ticket = KitchenTicket {
            id: order.id,
            table: table.name,
            items: ticket_lines,
            total: order.total_amount.to_string(),
        };
        let _ = self.ticket_tx.send(ticket);

        tracing::info!(
            order_id = order.id,
            total = %order.total_amount,
            lines = order.items.len(),
            "order placed"
        );
        Ok(order.id)
    }

    /// Kitchen marks an order ready; returns prep time in minutes
    pub fn mark_ready(&self, order_id: u64) -> OrderResult<Option<f64>> {
        let txn = self.store.begin_write()?;

        let mut order = self
            .store
            .get_order_txn(&txn, order_id)?
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(OrderError::NotPending(order_id));
        }

        order.status = OrderStatus::Ready;
        order.ready_at = Some(Utc::now().timestamp_millis());
        self.store.put_order_txn(&txn, &order)?;
        txn.commit().map_err(StorageError::from)?;

        let prep = order
            .ready_at
            .map(|ready| money::prep_minutes(order.created_at, ready));
        tracing::info!(order_id, prep_minutes = ?prep, "order ready");
        Ok(prep)
    }

    /// Settle a table: complete every active order and free the table
    pub fn settle_table(&self, table_id: &str) -> OrderResult<usize> {
        let txn = self.store.begin_write()?;

        let orders = self.store.active_orders_for_table_txn(&txn, table_id)?;
        if orders.is_empty() {
            return Err(OrderError::NothingToSettle);
        }

        let now = Utc::now().timestamp_millis();
        let settled = orders.len();
        for mut order in orders {
            order.status = OrderStatus::Completed;
            order.completed_at = Some(now);
            self.store.put_order_txn(&txn, &order)?;
        }

        if let Some(mut table) = self.store.get_table_txn(&txn, table_id)? {
            table.is_occupied = false;
            self.store.put_table_txn(&txn, &table)?;
        }

        txn.commit().map_err(StorageError::from)?;

        tracing::info!(table_id, settled, "table settled");
        Ok(settled)
    }

    /// Combined bill for every active order on a table
    pub fn table_bill(&self, table_id: &str) -> OrderResult<TableBill> {
        self.store
            .get_table(table_id)?
            .ok_or_else(|| OrderError::TableNotFound(table_id.to_string()))?;

        let orders = self.store.active_orders_for_table(table_id)?;
        if orders.is_empty() {
            return Err(OrderError::NoActiveOrders);
        }

        let mut subtotal = Decimal::ZERO;
        let mut items = Vec::new();
        for order in orders {
            subtotal += order.total_amount;
            items.extend(order.items);
        }

        let subtotal = money::round_money(subtotal);
        let tax = money::bill_tax(subtotal);
        let grand_total = money::round_money(subtotal + tax);

        Ok(TableBill {
            table_id: table_id.to_string(),
            subtotal,
            tax,
            grand_total,
            items,
        })
    }

    /// Active orders for a restaurant, newest first
    pub fn active_orders(&self, restaurant_id: &str) -> OrderResult<Vec<Order>> {
        // 扫描按订单号升序，前台要最新的在前
        let mut orders = self.store.active_orders_for_restaurant(restaurant_id)?;
        orders.reverse();
        Ok(orders)
    }

    /// Global pending queue for the kitchen display, oldest first
    pub fn kitchen_orders(&self) -> OrderResult<Vec<KitchenOrder>> {
        let orders = self.store.pending_orders()?;

        let mut queue = Vec::with_capacity(orders.len());
        for order in orders {
            let table_name = self
                .store
                .get_table(&order.table_id)?
                .map(|t| t.name)
                .unwrap_or_else(|| order.table_id.clone());
            let waiter_name = match &order.waiter_id {
                Some(id) => self
                    .store
                    .get_waiter(id)?
                    .map(|w| w.name)
                    .unwrap_or_else(|| "Unknown".to_string()),
                None => "Unknown".to_string(),
            };
            let items = order
                .items
                .iter()
                .map(|item| KitchenLine {
                    quantity: item.quantity,
                    menu_item_name: item.menu_item_name.clone(),
                    variants: item
                        .selected_options
                        .iter()
                        .map(|o| o.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();
            queue.push(KitchenOrder {
                id: order.id,
                table_name,
                waiter_name,
                created_at: order.created_at,
                items,
            });
        }
        Ok(queue)
    }
}
