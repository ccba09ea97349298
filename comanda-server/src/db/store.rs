//! redb-based storage layer for the restaurant store
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `restaurants` | `id` | `Restaurant` | 租户根 |
//! | `categories` | `id` | `Category` | 菜单分类 |
//! | `menu_items` | `id` | `MenuItem` | 菜品 |
//! | `variant_groups` | `id` | `VariantGroup` | 规格组 |
//! | `variant_options` | `id` | `VariantOption` | 规格选项 |
//! | `ingredients` | `id` | `Ingredient` | 食材库存 |
//! | `recipes` | `id` | `Recipe` | 配方消耗边 |
//! | `tables` | `id` | `DiningTable` | 餐桌与占用标志 |
//! | `waiters` | `id` | `Waiter` | 服务员 |
//! | `orders` | `u64` | `Order` | 订单（含内嵌行） |
//! | `reservations` | `id` | `Reservation` | 预订 |
//! | `counters` | `&str` | `u64` | 订单号 / 实体序号 |
//!
//! # Consistency
//!
//! redb 同一时刻只允许一个写事务，跨实体的业务操作
//! （下单扣库存、整桌结账、预订冲突检查）在调用方的
//! 写事务里组合，提交即全部生效，放弃即全部回滚。
//!
//! # Ordering
//!
//! UUID 主键在 B-tree 里是字典序，不是插入序。每个实体在创建时
//! 从 `entity_seq` 计数器取一个单调序号，扫描后按 `seq` 排序，
//! 即可恢复稳定的创建顺序（预订自动分配依赖这一点）。

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use rust_decimal::Decimal;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{
    Category, DiningTable, Ingredient, MenuItem, Order, OrderStatus, Recipe, RecipeTarget,
    Reservation, Restaurant, VariantGroup, VariantOption, Waiter,
};

const RESTAURANTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("restaurants");
const CATEGORIES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("categories");
const MENU_ITEMS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("menu_items");
const VARIANT_GROUPS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("variant_groups");
const VARIANT_OPTIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("variant_options");
const INGREDIENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("ingredients");
const RECIPES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("recipes");
const TABLES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tables");
const WAITERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("waiters");
const RESERVATIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("reservations");

/// 订单表，键为持久化序号分配的订单号
const ORDERS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("orders");

/// 计数器表: key = "order_seq" | "entity_seq"
const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_SEQ_KEY: &str = "order_seq";
const ENTITY_SEQ_KEY: &str = "entity_seq";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Restaurant store backed by redb
#[derive(Clone)]
pub struct RestaurantStore {
    db: Arc<Database>,
}

impl RestaurantStore {
    /// Open or create the database at the given path
    ///
    /// redb 默认 `Durability::Immediate`，commit 返回即落盘，
    /// 文件始终处于一致状态，断电后可直接重开。
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(&db)?;
        Ok(Self { db: Arc::new(db) })
    }

    /// 建表并初始化计数器，幂等
    fn init_tables(db: &Database) -> StorageResult<()> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(RESTAURANTS_TABLE)?;
            let _ = write_txn.open_table(CATEGORIES_TABLE)?;
            let _ = write_txn.open_table(MENU_ITEMS_TABLE)?;
            let _ = write_txn.open_table(VARIANT_GROUPS_TABLE)?;
            let _ = write_txn.open_table(VARIANT_OPTIONS_TABLE)?;
            let _ = write_txn.open_table(INGREDIENTS_TABLE)?;
            let _ = write_txn.open_table(RECIPES_TABLE)?;
            let _ = write_txn.open_table(TABLES_TABLE)?;
            let _ = write_txn.open_table(WAITERS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;
            let _ = write_txn.open_table(RESERVATIONS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(ORDER_SEQ_KEY)?.is_none() {
                counters.insert(ORDER_SEQ_KEY, 0u64)?;
            }
            if counters.get(ENTITY_SEQ_KEY)?.is_none() {
                counters.insert(ENTITY_SEQ_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StorageResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Generic Row Helpers ==========

    fn put_row<T: Serialize>(
        txn: &WriteTransaction,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
        row: &T,
    ) -> StorageResult<()> {
        let mut t = txn.open_table(table)?;
        let value = serde_json::to_vec(row)?;
        t.insert(key, value.as_slice())?;
        Ok(())
    }

    fn delete_row(
        txn: &WriteTransaction,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StorageResult<bool> {
        let mut t = txn.open_table(table)?;
        Ok(t.remove(key)?.is_some())
    }

    fn get_row<T: DeserializeOwned>(
        &self,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        match t.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn get_row_txn<T: DeserializeOwned>(
        txn: &WriteTransaction,
        table: TableDefinition<&str, &[u8]>,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let t = txn.open_table(table)?;
        match t.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// 全表扫描并按谓词过滤，调用方负责排序
    fn scan<T, F>(&self, table: TableDefinition<&str, &[u8]>, pred: F) -> StorageResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;
        let mut rows = Vec::new();
        for result in t.iter()? {
            let (_key, value) = result?;
            let row: T = serde_json::from_slice(value.value())?;
            if pred(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    fn scan_txn<T, F>(
        txn: &WriteTransaction,
        table: TableDefinition<&str, &[u8]>,
        pred: F,
    ) -> StorageResult<Vec<T>>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let t = txn.open_table(table)?;
        let mut rows = Vec::new();
        for result in t.iter()? {
            let (_key, value) = result?;
            let row: T = serde_json::from_slice(value.value())?;
            if pred(&row) {
                rows.push(row);
            }
        }
        Ok(rows)
    }

    // ========== Counters ==========

    /// 实体创建序号，单调递增，用于恢复插入顺序
    pub fn next_entity_seq(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut counters = txn.open_table(COUNTERS_TABLE)?;
        let current = counters.get(ENTITY_SEQ_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        counters.insert(ENTITY_SEQ_KEY, next)?;
        Ok(next)
    }

    /// 分配下一个订单号（在调用方事务内，回滚则号不消耗）
    pub fn next_order_id(&self, txn: &WriteTransaction) -> StorageResult<u64> {
        let mut counters = txn.open_table(COUNTERS_TABLE)?;
        let current = counters.get(ORDER_SEQ_KEY)?.map(|g| g.value()).unwrap_or(0);
        let next = current + 1;
        counters.insert(ORDER_SEQ_KEY, next)?;
        Ok(next)
    }

    /// Current order sequence (read-only, health check)
    pub fn current_order_seq(&self) -> StorageResult<u64> {
        let read_txn = self.db.begin_read()?;
        let counters = read_txn.open_table(COUNTERS_TABLE)?;
        Ok(counters.get(ORDER_SEQ_KEY)?.map(|g| g.value()).unwrap_or(0))
    }

    // ========== Restaurants ==========

    pub fn create_restaurant(&self, name: &str, address: &str) -> StorageResult<Restaurant> {
        let txn = self.begin_write()?;
        let restaurant = Restaurant {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            name: name.to_string(),
            address: address.to_string(),
        };
        Self::put_row(&txn, RESTAURANTS_TABLE, &restaurant.id, &restaurant)?;
        txn.commit()?;
        Ok(restaurant)
    }

    pub fn get_restaurant(&self, id: &str) -> StorageResult<Option<Restaurant>> {
        self.get_row(RESTAURANTS_TABLE, id)
    }

    pub fn get_restaurant_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Restaurant>> {
        Self::get_row_txn(txn, RESTAURANTS_TABLE, id)
    }

    // ========== Categories ==========

    pub fn create_category(&self, restaurant_id: &str, name: &str) -> StorageResult<Category> {
        let txn = self.begin_write()?;
        let category = Category {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            restaurant_id: restaurant_id.to_string(),
            name: name.to_string(),
        };
        Self::put_row(&txn, CATEGORIES_TABLE, &category.id, &category)?;
        txn.commit()?;
        Ok(category)
    }

    pub fn categories_for_restaurant(&self, restaurant_id: &str) -> StorageResult<Vec<Category>> {
        let mut rows: Vec<Category> =
            self.scan(CATEGORIES_TABLE, |c: &Category| c.restaurant_id == restaurant_id)?;
        rows.sort_by_key(|c| c.seq);
        Ok(rows)
    }

    // ========== Menu Items ==========

    pub fn create_menu_item(
        &self,
        category: &Category,
        name: &str,
        description: &str,
        price: Decimal,
    ) -> StorageResult<MenuItem> {
        let txn = self.begin_write()?;
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            restaurant_id: category.restaurant_id.clone(),
            category_id: category.id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            price,
            is_available: true,
        };
        Self::put_row(&txn, MENU_ITEMS_TABLE, &item.id, &item)?;
        txn.commit()?;
        Ok(item)
    }

    pub fn update_menu_item_availability(
        &self,
        id: &str,
        is_available: bool,
    ) -> StorageResult<Option<MenuItem>> {
        let txn = self.begin_write()?;
        let updated = match Self::get_row_txn::<MenuItem>(&txn, MENU_ITEMS_TABLE, id)? {
            Some(mut item) => {
                item.is_available = is_available;
                Self::put_row(&txn, MENU_ITEMS_TABLE, id, &item)?;
                Some(item)
            }
            None => None,
        };
        txn.commit()?;
        Ok(updated)
    }

    pub fn get_menu_item(&self, id: &str) -> StorageResult<Option<MenuItem>> {
        self.get_row(MENU_ITEMS_TABLE, id)
    }

    pub fn get_menu_item_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<MenuItem>> {
        Self::get_row_txn(txn, MENU_ITEMS_TABLE, id)
    }

    pub fn menu_items_for_category(&self, category_id: &str) -> StorageResult<Vec<MenuItem>> {
        let mut rows: Vec<MenuItem> =
            self.scan(MENU_ITEMS_TABLE, |m: &MenuItem| m.category_id == category_id)?;
        rows.sort_by_key(|m| m.seq);
        Ok(rows)
    }

    pub fn menu_items_for_restaurant(&self, restaurant_id: &str) -> StorageResult<Vec<MenuItem>> {
        let mut rows: Vec<MenuItem> =
            self.scan(MENU_ITEMS_TABLE, |m: &MenuItem| m.restaurant_id == restaurant_id)?;
        rows.sort_by_key(|m| m.seq);
        Ok(rows)
    }

    // ========== Variant Groups / Options ==========

    pub fn create_variant_group(
        &self,
        item: &MenuItem,
        name: &str,
        is_required: bool,
        allow_multiple: bool,
    ) -> StorageResult<VariantGroup> {
        let txn = self.begin_write()?;
        let group = VariantGroup {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            menu_item_id: item.id.clone(),
            name: name.to_string(),
            is_required,
            allow_multiple,
        };
        Self::put_row(&txn, VARIANT_GROUPS_TABLE, &group.id, &group)?;
        txn.commit()?;
        Ok(group)
    }

    pub fn create_variant_option(
        &self,
        group: &VariantGroup,
        name: &str,
        price_adjustment: Decimal,
    ) -> StorageResult<VariantOption> {
        let txn = self.begin_write()?;
        let option = VariantOption {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            group_id: group.id.clone(),
            name: name.to_string(),
            price_adjustment,
        };
        Self::put_row(&txn, VARIANT_OPTIONS_TABLE, &option.id, &option)?;
        txn.commit()?;
        Ok(option)
    }

    pub fn variant_groups_for_item(&self, menu_item_id: &str) -> StorageResult<Vec<VariantGroup>> {
        let mut rows: Vec<VariantGroup> =
            self.scan(VARIANT_GROUPS_TABLE, |g: &VariantGroup| g.menu_item_id == menu_item_id)?;
        rows.sort_by_key(|g| g.seq);
        Ok(rows)
    }

    pub fn variant_groups_for_item_txn(
        &self,
        txn: &WriteTransaction,
        menu_item_id: &str,
    ) -> StorageResult<Vec<VariantGroup>> {
        let mut rows: Vec<VariantGroup> =
            Self::scan_txn(txn, VARIANT_GROUPS_TABLE, |g: &VariantGroup| {
                g.menu_item_id == menu_item_id
            })?;
        rows.sort_by_key(|g| g.seq);
        Ok(rows)
    }

    pub fn variant_options_for_group(&self, group_id: &str) -> StorageResult<Vec<VariantOption>> {
        let mut rows: Vec<VariantOption> =
            self.scan(VARIANT_OPTIONS_TABLE, |o: &VariantOption| o.group_id == group_id)?;
        rows.sort_by_key(|o| o.seq);
        Ok(rows)
    }

    pub fn variant_options_for_group_txn(
        &self,
        txn: &WriteTransaction,
        group_id: &str,
    ) -> StorageResult<Vec<VariantOption>> {
        let mut rows: Vec<VariantOption> =
            Self::scan_txn(txn, VARIANT_OPTIONS_TABLE, |o: &VariantOption| {
                o.group_id == group_id
            })?;
        rows.sort_by_key(|o| o.seq);
        Ok(rows)
    }

    pub fn get_variant_option_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<VariantOption>> {
        Self::get_row_txn(txn, VARIANT_OPTIONS_TABLE, id)
    }

    // ========== Ingredients ==========

    pub fn create_ingredient(
        &self,
        restaurant_id: &str,
        name: &str,
        unit: &str,
        current_stock: Decimal,
        cost_per_unit: Decimal,
    ) -> StorageResult<Ingredient> {
        let txn = self.begin_write()?;
        let ingredient = Ingredient {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            restaurant_id: restaurant_id.to_string(),
            name: name.to_string(),
            current_stock,
            unit: unit.to_string(),
            cost_per_unit,
        };
        Self::put_row(&txn, INGREDIENTS_TABLE, &ingredient.id, &ingredient)?;
        txn.commit()?;
        Ok(ingredient)
    }

    pub fn get_ingredient(&self, id: &str) -> StorageResult<Option<Ingredient>> {
        self.get_row(INGREDIENTS_TABLE, id)
    }

    pub fn get_ingredient_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Ingredient>> {
        Self::get_row_txn(txn, INGREDIENTS_TABLE, id)
    }

    pub fn put_ingredient_txn(
        &self,
        txn: &WriteTransaction,
        ingredient: &Ingredient,
    ) -> StorageResult<()> {
        Self::put_row(txn, INGREDIENTS_TABLE, &ingredient.id, ingredient)
    }

    pub fn ingredients_for_restaurant(&self, restaurant_id: &str) -> StorageResult<Vec<Ingredient>> {
        let mut rows: Vec<Ingredient> =
            self.scan(INGREDIENTS_TABLE, |i: &Ingredient| i.restaurant_id == restaurant_id)?;
        rows.sort_by_key(|i| i.seq);
        Ok(rows)
    }

    // ========== Recipes ==========

    /// 便捷建边（种子数据/测试用），业务入口是台账的 upsert 语义
    pub fn create_recipe(
        &self,
        target: RecipeTarget,
        ingredient_id: &str,
        quantity_required: Decimal,
    ) -> StorageResult<Recipe> {
        let txn = self.begin_write()?;
        let recipe = Recipe {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            target,
            ingredient_id: ingredient_id.to_string(),
            quantity_required,
        };
        Self::put_row(&txn, RECIPES_TABLE, &recipe.id, &recipe)?;
        txn.commit()?;
        Ok(recipe)
    }

    pub fn recipes_for_target(&self, target: &RecipeTarget) -> StorageResult<Vec<Recipe>> {
        let mut rows: Vec<Recipe> = self.scan(RECIPES_TABLE, |r: &Recipe| &r.target == target)?;
        rows.sort_by_key(|r| r.seq);
        Ok(rows)
    }

    pub fn recipes_for_target_txn(
        &self,
        txn: &WriteTransaction,
        target: &RecipeTarget,
    ) -> StorageResult<Vec<Recipe>> {
        let mut rows: Vec<Recipe> =
            Self::scan_txn(txn, RECIPES_TABLE, |r: &Recipe| &r.target == target)?;
        rows.sort_by_key(|r| r.seq);
        Ok(rows)
    }

    /// 按 (消耗方, 食材) 查唯一配方边
    pub fn find_recipe_txn(
        &self,
        txn: &WriteTransaction,
        target: &RecipeTarget,
        ingredient_id: &str,
    ) -> StorageResult<Option<Recipe>> {
        let rows: Vec<Recipe> = Self::scan_txn(txn, RECIPES_TABLE, |r: &Recipe| {
            &r.target == target && r.ingredient_id == ingredient_id
        })?;
        Ok(rows.into_iter().next())
    }

    pub fn put_recipe_txn(&self, txn: &WriteTransaction, recipe: &Recipe) -> StorageResult<()> {
        Self::put_row(txn, RECIPES_TABLE, &recipe.id, recipe)
    }

    pub fn delete_recipe_txn(&self, txn: &WriteTransaction, id: &str) -> StorageResult<bool> {
        Self::delete_row(txn, RECIPES_TABLE, id)
    }

    // ========== Dining Tables ==========

    pub fn create_table(&self, restaurant_id: &str, name: &str) -> StorageResult<DiningTable> {
        let txn = self.begin_write()?;
        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            restaurant_id: restaurant_id.to_string(),
            name: name.to_string(),
            is_occupied: false,
        };
        Self::put_row(&txn, TABLES_TABLE, &table.id, &table)?;
        txn.commit()?;
        Ok(table)
    }

    pub fn get_table(&self, id: &str) -> StorageResult<Option<DiningTable>> {
        self.get_row(TABLES_TABLE, id)
    }

    pub fn get_table_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<DiningTable>> {
        Self::get_row_txn(txn, TABLES_TABLE, id)
    }

    pub fn put_table_txn(&self, txn: &WriteTransaction, table: &DiningTable) -> StorageResult<()> {
        Self::put_row(txn, TABLES_TABLE, &table.id, table)
    }

    /// 餐桌按创建顺序返回，预订自动分配依赖这个稳定顺序
    pub fn tables_for_restaurant(&self, restaurant_id: &str) -> StorageResult<Vec<DiningTable>> {
        let mut rows: Vec<DiningTable> =
            self.scan(TABLES_TABLE, |t: &DiningTable| t.restaurant_id == restaurant_id)?;
        rows.sort_by_key(|t| t.seq);
        Ok(rows)
    }

    pub fn tables_for_restaurant_txn(
        &self,
        txn: &WriteTransaction,
        restaurant_id: &str,
    ) -> StorageResult<Vec<DiningTable>> {
        let mut rows: Vec<DiningTable> =
            Self::scan_txn(txn, TABLES_TABLE, |t: &DiningTable| {
                t.restaurant_id == restaurant_id
            })?;
        rows.sort_by_key(|t| t.seq);
        Ok(rows)
    }

    // ========== Waiters ==========

    pub fn create_waiter(
        &self,
        restaurant_id: &str,
        name: &str,
        pin_code: &str,
        is_active: bool,
    ) -> StorageResult<Waiter> {
        let txn = self.begin_write()?;
        let waiter = Waiter {
            id: Uuid::new_v4().to_string(),
            seq: self.next_entity_seq(&txn)?,
            restaurant_id: restaurant_id.to_string(),
            name: name.to_string(),
            pin_code: pin_code.to_string(),
            is_active,
        };
        Self::put_row(&txn, WAITERS_TABLE, &waiter.id, &waiter)?;
        txn.commit()?;
        Ok(waiter)
    }

    pub fn get_waiter(&self, id: &str) -> StorageResult<Option<Waiter>> {
        self.get_row(WAITERS_TABLE, id)
    }

    pub fn get_waiter_txn(
        &self,
        txn: &WriteTransaction,
        id: &str,
    ) -> StorageResult<Option<Waiter>> {
        Self::get_row_txn(txn, WAITERS_TABLE, id)
    }

    /// PIN 登录查询：本餐厅 + PIN 匹配 + 在职
    pub fn find_active_waiter_by_pin(
        &self,
        restaurant_id: &str,
        pin: &str,
    ) -> StorageResult<Option<Waiter>> {
        let rows: Vec<Waiter> = self.scan(WAITERS_TABLE, |w: &Waiter| {
            w.restaurant_id == restaurant_id && w.pin_code == pin && w.is_active
        })?;
        Ok(rows.into_iter().min_by_key(|w| w.seq))
    }

    // ========== Orders ==========

    pub fn put_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StorageResult<()> {
        let mut t = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        t.insert(order.id, value.as_slice())?;
        Ok(())
    }

    pub fn get_order(&self, id: u64) -> StorageResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(ORDERS_TABLE)?;
        match t.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_order_txn(&self, txn: &WriteTransaction, id: u64) -> StorageResult<Option<Order>> {
        let t = txn.open_table(ORDERS_TABLE)?;
        match t.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    fn scan_orders<F>(&self, pred: F) -> StorageResult<Vec<Order>>
    where
        F: Fn(&Order) -> bool,
    {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(ORDERS_TABLE)?;
        let mut rows = Vec::new();
        for result in t.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if pred(&order) {
                rows.push(order);
            }
        }
        Ok(rows)
    }

    /// 本餐厅全部订单，按订单号升序（订单号即创建顺序）
    pub fn orders_for_restaurant(&self, restaurant_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.restaurant_id == restaurant_id)
    }

    pub fn active_orders_for_restaurant(&self, restaurant_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.restaurant_id == restaurant_id && o.is_active())
    }

    pub fn active_orders_for_table(&self, table_id: &str) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.table_id == table_id && o.is_active())
    }

    pub fn active_orders_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Vec<Order>> {
        let t = txn.open_table(ORDERS_TABLE)?;
        let mut rows = Vec::new();
        for result in t.iter()? {
            let (_key, value) = result?;
            let order: Order = serde_json::from_slice(value.value())?;
            if order.table_id == table_id && order.is_active() {
                rows.push(order);
            }
        }
        Ok(rows)
    }

    /// 厨房队列：所有待出餐订单，按订单号升序（先来先做）
    pub fn pending_orders(&self) -> StorageResult<Vec<Order>> {
        self.scan_orders(|o| o.status == OrderStatus::Pending)
    }

    // ========== Reservations ==========

    pub fn put_reservation_txn(
        &self,
        txn: &WriteTransaction,
        reservation: &Reservation,
    ) -> StorageResult<()> {
        Self::put_row(txn, RESERVATIONS_TABLE, &reservation.id, reservation)
    }

    pub fn reservations_for_table(&self, table_id: &str) -> StorageResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> = self.scan(RESERVATIONS_TABLE, |r: &Reservation| {
            r.table_id.as_deref() == Some(table_id)
        })?;
        rows.sort_by_key(|r| r.seq);
        Ok(rows)
    }

    pub fn reservations_for_table_txn(
        &self,
        txn: &WriteTransaction,
        table_id: &str,
    ) -> StorageResult<Vec<Reservation>> {
        let mut rows: Vec<Reservation> =
            Self::scan_txn(txn, RESERVATIONS_TABLE, |r: &Reservation| {
                r.table_id.as_deref() == Some(table_id)
            })?;
        rows.sort_by_key(|r| r.seq);
        Ok(rows)
    }
}
