//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::menu::view::{self as menu_view, CategoryView};
use crate::core::ServerState;
use crate::db::models::RecipeTarget;
use crate::inventory::RecipeSave;
use crate::utils::validation::{MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult};

/// 食材行（管理页不展示成本，成本只走 update-cost 回包）
#[derive(Debug, Serialize)]
pub struct IngredientView {
    pub id: String,
    pub name: String,
    pub current_stock: Decimal,
    pub unit: String,
}

#[derive(Debug, Serialize)]
pub struct InventoryData {
    pub ingredients: Vec<IngredientView>,
    pub menu: Vec<CategoryView>,
}

/// GET /api/inventory/data/{restaurant_id} - 库存管理页数据
pub async fn data(
    State(state): State<ServerState>,
    Path(restaurant_id): Path<String>,
) -> AppResult<Json<InventoryData>> {
    state
        .store
        .get_restaurant(&restaurant_id)?
        .ok_or_else(|| AppError::not_found("Restaurant not found"))?;

    let ingredients = state
        .store
        .ingredients_for_restaurant(&restaurant_id)?
        .into_iter()
        .map(|i| IngredientView {
            id: i.id,
            name: i.name,
            current_stock: i.current_stock,
            unit: i.unit,
        })
        .collect();
    let menu = menu_view::restaurant_menu(&state.store, &restaurant_id)?;

    Ok(Json(InventoryData { ingredients, menu }))
}

#[derive(Debug, Deserialize)]
pub struct SaveRecipeRequest {
    pub ingredient_id: String,
    pub qty: Decimal,
    #[serde(default)]
    pub menu_item_id: Option<String>,
    #[serde(default)]
    pub variant_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveRecipeResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// POST /api/inventory/save - 配方边 upsert
///
/// 消耗方必须恰好指定 menu_item_id 和 variant_id 之一
pub async fn save_recipe(
    State(state): State<ServerState>,
    Json(payload): Json<SaveRecipeRequest>,
) -> AppResult<Json<SaveRecipeResponse>> {
    let target = match (payload.menu_item_id, payload.variant_id) {
        (Some(id), None) => RecipeTarget::menu_item(id),
        (None, Some(id)) => RecipeTarget::variant_option(id),
        _ => {
            return Err(AppError::validation(
                "Provide exactly one of menu_item_id or variant_id",
            ));
        }
    };

    let saved = state
        .ledger
        .save_recipe(target, &payload.ingredient_id, payload.qty)?;
    let response = match saved {
        RecipeSave::Saved(recipe) => SaveRecipeResponse {
            status: "saved",
            id: Some(recipe.id),
        },
        RecipeSave::Deleted => SaveRecipeResponse {
            status: "deleted",
            id: None,
        },
    };
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct AddIngredientRequest {
    pub restaurant_id: String,
    pub name: String,
    pub unit: String,
    pub stock: Decimal,
    /// 登记时可不填成本，之后走 update-cost 补
    #[serde(default)]
    pub cost_per_unit: Decimal,
}

#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub status: &'static str,
}

/// POST /api/inventory/ingredient/add - 登记新食材
pub async fn add_ingredient(
    State(state): State<ServerState>,
    Json(payload): Json<AddIngredientRequest>,
) -> AppResult<Json<AddIngredientResponse>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_required_text(&payload.unit, "unit", MAX_SHORT_TEXT_LEN)?;

    state.ledger.add_ingredient(
        &payload.restaurant_id,
        &payload.name,
        &payload.unit,
        payload.stock,
        payload.cost_per_unit,
    )?;
    Ok(Json(AddIngredientResponse { status: "created" }))
}

#[derive(Debug, Deserialize)]
pub struct UpdateIngredientRequest {
    pub id: String,
    #[serde(default)]
    pub cost_per_unit: Option<Decimal>,
    #[serde(default)]
    pub added_stock: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub struct UpdateIngredientResponse {
    pub status: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    pub new_stock: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

/// POST /api/inventory/update-cost - 改成本 / 补库存
pub async fn update_ingredient(
    State(state): State<ServerState>,
    Json(payload): Json<UpdateIngredientRequest>,
) -> AppResult<Json<UpdateIngredientResponse>> {
    // 入库量 0 视为未提供
    let added = payload.added_stock.filter(|v| !v.is_zero());

    let ingredient = state
        .ledger
        .update_ingredient(&payload.id, payload.cost_per_unit, added)?;
    Ok(Json(UpdateIngredientResponse {
        status: "updated",
        new_stock: ingredient.current_stock,
        cost: ingredient.cost_per_unit,
    }))
}
