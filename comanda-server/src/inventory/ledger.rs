//! InventoryLedger - atomic stock debits, restocking and recipe upkeep
//!
//! 库存只通过这里变动：
//! - `debit_in_txn` 在调用方事务里检查并扣减（下单路径）
//! - `check_and_debit` / `credit` 独立事务的扣减与入库
//! - `update_ingredient` 一次调用里改成本、补库存
//! - `save_recipe` 配方边 upsert，数量归零即删除
//!
//! 扣减前先读当前值再比较，redb 单写事务天然串行，
//! 两个并发订单不可能都用同一份库存通过检查。

use redb::WriteTransaction;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::db::models::{Ingredient, Recipe, RecipeTarget};
use crate::db::{RestaurantStore, StorageError};
use crate::orders::money;
use crate::utils::AppError;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error("Out of Stock: {name}. Need {required}, have {available}")]
    InsufficientStock {
        name: String,
        required: Decimal,
        available: Decimal,
    },

    #[error("Recipe target not found: {0}")]
    TargetNotFound(String),

    #[error("{0}")]
    Validation(String),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::Storage(_) => AppError::Database(message),
            LedgerError::IngredientNotFound(_) | LedgerError::TargetNotFound(_) => {
                AppError::NotFound(message)
            }
            LedgerError::InsufficientStock { .. } => AppError::InsufficientStock(message),
            LedgerError::Validation(_) => AppError::Validation(message),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Outcome of a recipe save
#[derive(Debug)]
pub enum RecipeSave {
    Saved(Recipe),
    Deleted,
}

/// Inventory ledger over the restaurant store
#[derive(Clone)]
pub struct InventoryLedger {
    store: RestaurantStore,
}

impl InventoryLedger {
    pub fn new(store: RestaurantStore) -> Self {
        Self { store }
    }

    /// Check and debit inside the caller's transaction
    ///
    /// 读的是事务内最新值，同一单前面行刚扣掉的量在这里立刻可见。
    pub fn debit_in_txn(
        &self,
        txn: &WriteTransaction,
        ingredient_id: &str,
        amount: Decimal,
    ) -> LedgerResult<Ingredient> {
        let mut ingredient = self
            .store
            .get_ingredient_txn(txn, ingredient_id)?
            .ok_or_else(|| LedgerError::IngredientNotFound(ingredient_id.to_string()))?;

        if ingredient.current_stock < amount {
            return Err(LedgerError::InsufficientStock {
                name: ingredient.name,
                required: money::round_stock(amount),
                available: ingredient.current_stock,
            });
        }

        ingredient.current_stock = money::round_stock(ingredient.current_stock - amount);
        self.store.put_ingredient_txn(txn, &ingredient)?;
        Ok(ingredient)
    }

    /// Check and debit in a standalone transaction
    pub fn check_and_debit(&self, ingredient_id: &str, amount: Decimal) -> LedgerResult<Ingredient> {
        let txn = self.store.begin_write()?;
        let ingredient = self.debit_in_txn(&txn, ingredient_id, amount)?;
        txn.commit().map_err(StorageError::from)?;
        Ok(ingredient)
    }

    /// Unconditional stock credit (restocking)
    pub fn credit(&self, ingredient_id: &str, amount: Decimal) -> LedgerResult<Ingredient> {
        let txn = self.store.begin_write()?;
        let mut ingredient = self
            .store
            .get_ingredient_txn(&txn, ingredient_id)?
            .ok_or_else(|| LedgerError::IngredientNotFound(ingredient_id.to_string()))?;

        ingredient.current_stock = money::round_stock(ingredient.current_stock + amount);
        self.store.put_ingredient_txn(&txn, &ingredient)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            ingredient = %ingredient.name,
            stock = %ingredient.current_stock,
            "stock credited"
        );
        Ok(ingredient)
    }

    /// Register a new ingredient
    pub fn add_ingredient(
        &self,
        restaurant_id: &str,
        name: &str,
        unit: &str,
        stock: Decimal,
        cost_per_unit: Decimal,
    ) -> LedgerResult<Ingredient> {
        if stock < Decimal::ZERO {
            return Err(LedgerError::Validation(
                "Stock cannot be negative".to_string(),
            ));
        }

        let ingredient = self.store.create_ingredient(
            restaurant_id,
            name,
            unit,
            money::round_stock(stock),
            money::round_money(cost_per_unit),
        )?;
        tracing::info!(ingredient = %ingredient.name, stock = %ingredient.current_stock, "ingredient added");
        Ok(ingredient)
    }

    /// Update unit cost and/or add stock in one call
    pub fn update_ingredient(
        &self,
        ingredient_id: &str,
        new_cost: Option<Decimal>,
        added_stock: Option<Decimal>,
    ) -> LedgerResult<Ingredient> {
        let txn = self.store.begin_write()?;
        let mut ingredient = self
            .store
            .get_ingredient_txn(&txn, ingredient_id)?
            .ok_or_else(|| LedgerError::IngredientNotFound(ingredient_id.to_string()))?;

        if let Some(cost) = new_cost {
            if cost < Decimal::ZERO {
                return Err(LedgerError::Validation(
                    "Cost cannot be negative".to_string(),
                ));
            }
            ingredient.cost_per_unit = money::round_money(cost);
        }
        if let Some(added) = added_stock {
            ingredient.current_stock = money::round_stock(ingredient.current_stock + added);
            if ingredient.current_stock < Decimal::ZERO {
                return Err(LedgerError::Validation(
                    "Stock cannot go negative".to_string(),
                ));
            }
        }

        self.store.put_ingredient_txn(&txn, &ingredient)?;
        txn.commit().map_err(StorageError::from)?;

        tracing::info!(
            ingredient = %ingredient.name,
            stock = %ingredient.current_stock,
            cost = %ingredient.cost_per_unit,
            "ingredient updated"
        );
        Ok(ingredient)
    }

    /// Upsert a recipe edge; a non-positive quantity deletes it instead
    ///
    /// 同一 (消耗方, 食材) 只保留一条边，重复提交改数量而不是加行。
    pub fn save_recipe(
        &self,
        target: RecipeTarget,
        ingredient_id: &str,
        quantity: Decimal,
    ) -> LedgerResult<RecipeSave> {
        let txn = self.store.begin_write()?;

        match &target {
            RecipeTarget::MenuItem(id) => {
                if self.store.get_menu_item_txn(&txn, id)?.is_none() {
                    return Err(LedgerError::TargetNotFound(id.clone()));
                }
            }
            RecipeTarget::VariantOption(id) => {
                if self.store.get_variant_option_txn(&txn, id)?.is_none() {
                    return Err(LedgerError::TargetNotFound(id.clone()));
                }
            }
        }
        if self.store.get_ingredient_txn(&txn, ingredient_id)?.is_none() {
            return Err(LedgerError::IngredientNotFound(ingredient_id.to_string()));
        }

        let existing = self.store.find_recipe_txn(&txn, &target, ingredient_id)?;

        if quantity <= Decimal::ZERO {
            if let Some(recipe) = existing {
                self.store.delete_recipe_txn(&txn, &recipe.id)?;
            }
            txn.commit().map_err(StorageError::from)?;
            return Ok(RecipeSave::Deleted);
        }

        let recipe = match existing {
            Some(mut recipe) => {
                recipe.quantity_required = money::round_stock(quantity);
                recipe
            }
            None => Recipe {
                id: Uuid::new_v4().to_string(),
                seq: self.store.next_entity_seq(&txn)?,
                target,
                ingredient_id: ingredient_id.to_string(),
                quantity_required: money::round_stock(quantity),
            },
        };
        self.store.put_recipe_txn(&txn, &recipe)?;
        txn.commit().map_err(StorageError::from)?;

        Ok(RecipeSave::Saved(recipe))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Restaurant;

    fn dec(num: i64, scale: u32) -> Decimal {
        Decimal::new(num, scale)
    }

    fn ledger() -> (InventoryLedger, Restaurant) {
        let store = RestaurantStore::open_in_memory().unwrap();
        let restaurant = store.create_restaurant("Trattoria Roma", "Via Appia 1").unwrap();
        (InventoryLedger::new(store), restaurant)
    }

    #[test]
    fn test_check_and_debit_decrements_stock() {
        let (ledger, restaurant) = ledger();
        let flour = ledger
            .add_ingredient(&restaurant.id, "Flour", "kg", dec(2000, 3), dec(120, 2))
            .unwrap();

        let updated = ledger.check_and_debit(&flour.id, dec(500, 3)).unwrap();
        assert_eq!(updated.current_stock, dec(1500, 3));

        let err = ledger.check_and_debit(&flour.id, dec(2000, 3)).unwrap_err();
        assert_eq!(err.to_string(), "Out of Stock: Flour. Need 2.000, have 1.500");

        // 失败的扣减不落盘
        let flour = ledger.store.get_ingredient(&flour.id).unwrap().unwrap();
        assert_eq!(flour.current_stock, dec(1500, 3));
    }

    #[test]
    fn test_credit_is_unconditional() {
        let (ledger, restaurant) = ledger();
        let milk = ledger
            .add_ingredient(&restaurant.id, "Milk", "l", dec(100, 3), dec(90, 2))
            .unwrap();

        let updated = ledger.credit(&milk.id, dec(9900, 3)).unwrap();
        assert_eq!(updated.current_stock, dec(10000, 3));
    }

    #[test]
    fn test_update_ingredient_cost_and_stock() {
        let (ledger, restaurant) = ledger();
        let beef = ledger
            .add_ingredient(&restaurant.id, "Beef", "kg", dec(1000, 3), dec(800, 2))
            .unwrap();

        let updated = ledger
            .update_ingredient(&beef.id, Some(dec(950, 2)), Some(dec(2500, 3)))
            .unwrap();
        assert_eq!(updated.cost_per_unit, dec(950, 2));
        assert_eq!(updated.current_stock, dec(3500, 3));

        // 只改成本，库存不动
        let updated = ledger.update_ingredient(&beef.id, Some(dec(1000, 2)), None).unwrap();
        assert_eq!(updated.current_stock, dec(3500, 3));

        let err = ledger
            .update_ingredient("missing", None, Some(dec(1, 0)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::IngredientNotFound(_)));
    }

    #[test]
    fn test_save_recipe_upserts_without_duplicates() {
        let (ledger, restaurant) = ledger();
        let store = &ledger.store;
        let category = store.create_category(&restaurant.id, "Pizzas").unwrap();
        let pizza = store
            .create_menu_item(&category, "Margherita", "", dec(1000, 2))
            .unwrap();
        let flour = ledger
            .add_ingredient(&restaurant.id, "Flour", "kg", dec(2000, 3), dec(120, 2))
            .unwrap();
        let target = RecipeTarget::menu_item(pizza.id.clone());

        let saved = ledger.save_recipe(target.clone(), &flour.id, dec(200, 3)).unwrap();
        let first_id = match saved {
            RecipeSave::Saved(recipe) => {
                assert_eq!(recipe.quantity_required, dec(200, 3));
                recipe.id
            }
            RecipeSave::Deleted => panic!("expected save"),
        };

        // 重复提交同一条边只更新数量
        let saved = ledger.save_recipe(target.clone(), &flour.id, dec(300, 3)).unwrap();
        match saved {
            RecipeSave::Saved(recipe) => {
                assert_eq!(recipe.id, first_id);
                assert_eq!(recipe.quantity_required, dec(300, 3));
            }
            RecipeSave::Deleted => panic!("expected save"),
        }
        assert_eq!(store.recipes_for_target(&target).unwrap().len(), 1);

        // 数量归零删除边
        let saved = ledger.save_recipe(target.clone(), &flour.id, Decimal::ZERO).unwrap();
        assert!(matches!(saved, RecipeSave::Deleted));
        assert!(store.recipes_for_target(&target).unwrap().is_empty());

        // 没有边可删也回 Deleted
        let saved = ledger.save_recipe(target.clone(), &flour.id, dec(-1, 0)).unwrap();
        assert!(matches!(saved, RecipeSave::Deleted));
    }

    #[test]
    fn test_save_recipe_rejects_unknown_target() {
        let (ledger, restaurant) = ledger();
        let flour = ledger
            .add_ingredient(&restaurant.id, "Flour", "kg", dec(2000, 3), dec(120, 2))
            .unwrap();

        let err = ledger
            .save_recipe(RecipeTarget::menu_item("missing"), &flour.id, dec(100, 3))
            .unwrap_err();
        assert!(matches!(err, LedgerError::TargetNotFound(_)));
    }

    #[test]
    fn test_add_ingredient_rejects_negative_stock() {
        let (ledger, restaurant) = ledger();
        let err = ledger
            .add_ingredient(&restaurant.id, "Flour", "kg", dec(-1, 0), Decimal::ZERO)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}
