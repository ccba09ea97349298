//! 完整营业链路集成测试
//!
//! 直接驱动 ServerState 装配出的组件（不走 HTTP 层），
//! 走 下单 → 出餐 → 账单 → 结账 → 报表 的完整链路，
//! 重点验证金额口径、库存守恒和失败时的整单回滚。

use comanda_server::db::RestaurantStore;
use comanda_server::db::models::{
    DiningTable, Ingredient, MenuItem, RecipeTarget, Restaurant, VariantOption,
};
use comanda_server::orders::{OrderError, OrderLine, PlaceOrder};
use comanda_server::{Config, ServerState};
use rust_decimal::Decimal;

fn dec(num: i64, scale: u32) -> Decimal {
    Decimal::new(num, scale)
}

/// 一间只卖玛格丽特的测试餐厅
///
/// 菜价 10.50，家庭装加价 3.50；基础配方 0.250 kg 面粉，
/// 家庭装追加 0.100 kg，初始库存 10.000 kg。
struct Bistro {
    state: ServerState,
    restaurant: Restaurant,
    table: DiningTable,
    pizza: MenuItem,
    mediana: VariantOption,
    familiar: VariantOption,
    harina: Ingredient,
}

fn open_bistro() -> Bistro {
    let store = RestaurantStore::open_in_memory().expect("打开内存存储失败");
    let state = ServerState::with_store(
        Config::with_overrides("/tmp/comanda-lifecycle-test", 0, 0),
        store,
    );

    let restaurant = state
        .store
        .create_restaurant("La Comanda", "Calle Mayor 1")
        .unwrap();
    let table = state.store.create_table(&restaurant.id, "Mesa 1").unwrap();
    let category = state.store.create_category(&restaurant.id, "Pizzas").unwrap();
    let pizza = state
        .store
        .create_menu_item(&category, "Margarita", "Tomate y mozzarella", dec(1050, 2))
        .unwrap();

    let size = state
        .store
        .create_variant_group(&pizza, "Tamaño", true, false)
        .unwrap();
    let mediana = state
        .store
        .create_variant_option(&size, "Mediana", Decimal::ZERO)
        .unwrap();
    let familiar = state
        .store
        .create_variant_option(&size, "Familiar", dec(350, 2))
        .unwrap();

    let harina = state
        .store
        .create_ingredient(&restaurant.id, "Harina", "kg", dec(10_000, 3), dec(120, 2))
        .unwrap();
    state
        .store
        .create_recipe(RecipeTarget::menu_item(pizza.id.clone()), &harina.id, dec(250, 3))
        .unwrap();
    state
        .store
        .create_recipe(
            RecipeTarget::variant_option(familiar.id.clone()),
            &harina.id,
            dec(100, 3),
        )
        .unwrap();

    Bistro {
        state,
        restaurant,
        table,
        pizza,
        mediana,
        familiar,
        harina,
    }
}

impl Bistro {
    fn pizza_order(&self, qty: u32, options: Vec<String>) -> PlaceOrder {
        PlaceOrder {
            restaurant_id: self.restaurant.id.clone(),
            table_id: self.table.id.clone(),
            waiter_id: None,
            customer_name: "Guest".to_string(),
            customer_phone: String::new(),
            items: vec![OrderLine {
                id: self.pizza.id.clone(),
                qty,
                selected_options: options,
            }],
        }
    }

    fn flour_stock(&self) -> Decimal {
        self.state
            .store
            .get_ingredient(&self.harina.id)
            .unwrap()
            .unwrap()
            .current_stock
    }
}

#[test]
fn test_full_service_cycle() {
    let bistro = open_bistro();
    let state = &bistro.state;

    // 下单：2 份家庭装 = (10.50 + 3.50) × 2 = 28.00
    let order_id = state
        .engine
        .place_order(bistro.pizza_order(2, vec![bistro.familiar.id.clone()]))
        .expect("下单应成功");

    let order = state.store.get_order(order_id).unwrap().expect("订单应已落库");
    assert_eq!(order.total_amount, dec(2800, 2));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].price_at_time_of_order, dec(1400, 2));
    assert_eq!(order.items[0].selected_options[0].name, "Familiar");

    // 库存同事务扣减：10.000 - 2 × (0.250 + 0.100) = 9.300
    assert_eq!(bistro.flour_stock(), dec(9300, 3));

    // 桌台占用
    let table = state.store.get_table(&bistro.table.id).unwrap().unwrap();
    assert!(table.is_occupied, "下单后桌台应被占用");

    // 厨房队列
    let queue = state.engine.kitchen_orders().unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, order_id);
    assert_eq!(queue[0].table_name, "Mesa 1");
    assert_eq!(queue[0].items[0].variants, "Familiar");

    // 出餐后离开厨房队列
    let prep = state.engine.mark_ready(order_id).expect("出餐应成功");
    assert!(prep.is_some());
    assert!(state.engine.kitchen_orders().unwrap().is_empty());

    // 账单：28.00 + 5% 税
    let bill = state.engine.table_bill(&bistro.table.id).expect("应能出账单");
    assert_eq!(bill.subtotal, dec(2800, 2));
    assert_eq!(bill.tax, dec(140, 2));
    assert_eq!(bill.grand_total, dec(2940, 2));
    assert_eq!(bill.items.len(), 1);

    // 结账：订单落账，桌台释放
    let settled = state.engine.settle_table(&bistro.table.id).expect("结账应成功");
    assert_eq!(settled, 1);
    let order = state.store.get_order(order_id).unwrap().unwrap();
    assert!(order.status.is_settled());
    assert!(order.completed_at.is_some());
    let table = state.store.get_table(&bistro.table.id).unwrap().unwrap();
    assert!(!table.is_occupied, "结账后桌台应释放");

    // 空桌再结账报错
    let err = state.engine.settle_table(&bistro.table.id).unwrap_err();
    assert!(matches!(err, OrderError::NothingToSettle));

    // 报表口径：当日营收只数已结算订单
    let report = state
        .analytics
        .restaurant_report(&bistro.restaurant.id)
        .unwrap();
    assert_eq!(report.revenue_today, dec(2800, 2));
    assert_eq!(report.orders_count, 1);
    assert_ne!(report.avg_kitchen_time, "0 mins");
}

#[test]
fn test_settle_clears_every_order_on_the_table() {
    let bistro = open_bistro();
    let state = &bistro.state;

    // 同一桌两单：1 × 家庭装 14.00 + 3 × 中装 31.50
    let first = state
        .engine
        .place_order(bistro.pizza_order(1, vec![bistro.familiar.id.clone()]))
        .unwrap();
    let second = state
        .engine
        .place_order(bistro.pizza_order(3, vec![bistro.mediana.id.clone()]))
        .unwrap();

    // 合并账单：小计 45.50，税 2.275 → 2.28
    let bill = state.engine.table_bill(&bistro.table.id).unwrap();
    assert_eq!(bill.subtotal, dec(4550, 2));
    assert_eq!(bill.tax, dec(228, 2));
    assert_eq!(bill.grand_total, dec(4778, 2));
    assert_eq!(bill.items.len(), 2);

    // 一次结账两单全落账
    assert_eq!(state.engine.settle_table(&bistro.table.id).unwrap(), 2);
    for id in [first, second] {
        let order = state.store.get_order(id).unwrap().unwrap();
        assert!(order.status.is_settled(), "订单 {id} 应已结清");
    }
}

#[test]
fn test_required_group_failure_rolls_back_order_and_stock() {
    let bistro = open_bistro();

    // 必选规格未选：下单失败
    let err = bistro
        .state
        .engine
        .place_order(bistro.pizza_order(1, vec![]))
        .unwrap_err();
    assert!(matches!(err, OrderError::SelectionRequired(_)));

    // 整个事务回滚：没有订单、库存原样、桌台空闲
    assert!(bistro
        .state
        .store
        .orders_for_restaurant(&bistro.restaurant.id)
        .unwrap()
        .is_empty());
    assert_eq!(bistro.flour_stock(), dec(10_000, 3));
    assert!(
        !bistro
            .state
            .store
            .get_table(&bistro.table.id)
            .unwrap()
            .unwrap()
            .is_occupied
    );
}

#[test]
fn test_insufficient_stock_rolls_back_whole_order() {
    let bistro = open_bistro();

    // 40 份家庭装需要 40 × 0.350 = 14.000 kg，库存只有 10.000
    let err = bistro
        .state
        .engine
        .place_order(bistro.pizza_order(40, vec![bistro.familiar.id.clone()]))
        .unwrap_err();
    assert!(matches!(err, OrderError::Inventory(_)));

    assert!(bistro
        .state
        .store
        .orders_for_restaurant(&bistro.restaurant.id)
        .unwrap()
        .is_empty());
    assert_eq!(bistro.flour_stock(), dec(10_000, 3));
}

#[test]
fn test_restock_unblocks_rejected_order() {
    let bistro = open_bistro();
    let state = &bistro.state;

    let big_order = || bistro.pizza_order(40, vec![bistro.familiar.id.clone()]);
    assert!(state.engine.place_order(big_order()).is_err());

    // 补货 5 kg 后同一单就能过
    let restocked = state
        .ledger
        .update_ingredient(&bistro.harina.id, None, Some(dec(5000, 3)))
        .expect("补货应成功");
    assert_eq!(restocked.current_stock, dec(15_000, 3));

    state.engine.place_order(big_order()).expect("补货后下单应成功");
    assert_eq!(bistro.flour_stock(), dec(1000, 3));

    // 剩余 1.000 kg 低于预警线，报表给出预警
    let report = state
        .analytics
        .restaurant_report(&bistro.restaurant.id)
        .unwrap();
    assert_eq!(report.low_stock.len(), 1);
    assert_eq!(report.low_stock[0].name, "Harina");
}

#[test]
fn test_bill_for_wrong_table_is_rejected() {
    let bistro = open_bistro();

    let err = bistro.state.engine.table_bill("table:no-such").unwrap_err();
    assert!(matches!(err, OrderError::TableNotFound(_)));

    // 桌台存在但没翻台：区分 404 和空账单
    let err = bistro.state.engine.table_bill(&bistro.table.id).unwrap_err();
    assert!(matches!(err, OrderError::NoActiveOrders));
}
