//! 菜单视图模型
//!
//! 将目录实体组装成嵌套的菜单响应：
//! 分类 → 菜品 → 规格组 → 规格选项，菜品和选项各自带配方边。
//! 点餐端和库存管理页复用同一棵树。

use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::RestaurantStore;
use crate::db::models::{MenuItem, RecipeTarget};
use crate::utils::AppResult;

// ============ View structs ============

/// 配方边，带食材名称和单位
#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: String,
    pub ingredient_id: String,
    pub ingredient_name: String,
    pub ingredient_unit: String,
    pub quantity_required: Decimal,
}

#[derive(Debug, Serialize)]
pub struct VariantOptionView {
    pub id: String,
    pub name: String,
    pub price_adjustment: Decimal,
    pub recipes: Vec<RecipeView>,
}

#[derive(Debug, Serialize)]
pub struct VariantGroupView {
    pub id: String,
    pub name: String,
    pub is_required: bool,
    pub allow_multiple: bool,
    pub options: Vec<VariantOptionView>,
}

#[derive(Debug, Serialize)]
pub struct MenuItemView {
    pub id: String,
    pub category_id: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub is_available: bool,
    pub variant_groups: Vec<VariantGroupView>,
    pub recipes: Vec<RecipeView>,
}

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub menu_items: Vec<MenuItemView>,
}

// ============ Builders ============

/// 整棵菜单树，分类和菜品都按创建顺序排列
pub fn restaurant_menu(
    store: &RestaurantStore,
    restaurant_id: &str,
) -> AppResult<Vec<CategoryView>> {
    let categories = store.categories_for_restaurant(restaurant_id)?;

    let mut views = Vec::with_capacity(categories.len());
    for category in categories {
        let items = store.menu_items_for_category(&category.id)?;
        let mut item_views = Vec::with_capacity(items.len());
        for item in items {
            item_views.push(menu_item_view(store, item)?);
        }
        views.push(CategoryView {
            id: category.id,
            name: category.name,
            menu_items: item_views,
        });
    }
    Ok(views)
}

fn menu_item_view(store: &RestaurantStore, item: MenuItem) -> AppResult<MenuItemView> {
    let groups = store.variant_groups_for_item(&item.id)?;
    let mut group_views = Vec::with_capacity(groups.len());
    for group in groups {
        let options = store.variant_options_for_group(&group.id)?;
        let mut option_views = Vec::with_capacity(options.len());
        for option in options {
            option_views.push(VariantOptionView {
                recipes: recipe_views(store, &RecipeTarget::variant_option(option.id.clone()))?,
                id: option.id,
                name: option.name,
                price_adjustment: option.price_adjustment,
            });
        }
        group_views.push(VariantGroupView {
            id: group.id,
            name: group.name,
            is_required: group.is_required,
            allow_multiple: group.allow_multiple,
            options: option_views,
        });
    }

    let recipes = recipe_views(store, &RecipeTarget::menu_item(item.id.clone()))?;
    Ok(MenuItemView {
        id: item.id,
        category_id: item.category_id,
        name: item.name,
        description: item.description,
        price: item.price,
        is_available: item.is_available,
        variant_groups: group_views,
        recipes,
    })
}

fn recipe_views(store: &RestaurantStore, target: &RecipeTarget) -> AppResult<Vec<RecipeView>> {
    let edges = store.recipes_for_target(target)?;

    let mut views = Vec::with_capacity(edges.len());
    for edge in edges {
        // 指向已消失食材的孤儿边不渲染（目录没有删食材入口，正常不会出现）
        let Some(ingredient) = store.get_ingredient(&edge.ingredient_id)? else {
            continue;
        };
        views.push(RecipeView {
            id: edge.id,
            ingredient_id: edge.ingredient_id,
            ingredient_name: ingredient.name,
            ingredient_unit: ingredient.unit,
            quantity_required: edge.quantity_required,
        });
    }
    Ok(views)
}
