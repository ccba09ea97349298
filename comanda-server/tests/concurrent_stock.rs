//! 并发扣库存集成测试
//!
//! 库存检查和扣减在同一个写事务里完成，redb 写事务天然串行；
//! 多线程同时下单时每份库存只会被用掉一次，绝不出现超卖或负库存。

use std::sync::{Arc, Barrier};
use std::thread;

use comanda_server::db::RestaurantStore;
use comanda_server::db::models::{DiningTable, MenuItem, RecipeTarget, Restaurant};
use comanda_server::inventory::LedgerError;
use comanda_server::orders::{OrderError, OrderLine, PlaceOrder};
use comanda_server::{Config, ServerState};
use rust_decimal::Decimal;

/// 库存刚好够的份数
const PORTIONS: usize = 20;
/// 同时下单的线程数，约一半注定抢不到
const CONTENDERS: usize = 32;

fn dec(num: i64, scale: u32) -> Decimal {
    Decimal::new(num, scale)
}

/// 只卖土豆饼的测试吧台，每份消耗 0.300 kg 土豆
struct Diner {
    state: ServerState,
    restaurant: Restaurant,
    table: DiningTable,
    tortilla: MenuItem,
    patatas_id: String,
}

fn open_diner(portions: i64) -> Diner {
    let store = RestaurantStore::open_in_memory().expect("打开内存存储失败");
    let state = ServerState::with_store(
        Config::with_overrides("/tmp/comanda-concurrent-test", 0, 0),
        store,
    );

    let restaurant = state
        .store
        .create_restaurant("El Rincón", "Plaza del Sol 3")
        .unwrap();
    let table = state.store.create_table(&restaurant.id, "Barra 1").unwrap();
    let category = state.store.create_category(&restaurant.id, "Tapas").unwrap();
    let tortilla = state
        .store
        .create_menu_item(&category, "Tortilla", "", dec(650, 2))
        .unwrap();

    let patatas = state
        .store
        .create_ingredient(
            &restaurant.id,
            "Patatas",
            "kg",
            Decimal::new(portions * 300, 3),
            dec(80, 2),
        )
        .unwrap();
    state
        .store
        .create_recipe(
            RecipeTarget::menu_item(tortilla.id.clone()),
            &patatas.id,
            dec(300, 3),
        )
        .unwrap();

    Diner {
        state,
        restaurant,
        table,
        tortilla,
        patatas_id: patatas.id,
    }
}

impl Diner {
    fn one_tortilla(&self) -> PlaceOrder {
        PlaceOrder {
            restaurant_id: self.restaurant.id.clone(),
            table_id: self.table.id.clone(),
            waiter_id: None,
            customer_name: String::new(),
            customer_phone: String::new(),
            items: vec![OrderLine {
                id: self.tortilla.id.clone(),
                qty: 1,
                selected_options: vec![],
            }],
        }
    }

    fn potato_stock(&self) -> Decimal {
        self.state
            .store
            .get_ingredient(&self.patatas_id)
            .unwrap()
            .unwrap()
            .current_stock
    }
}

/// 在栅栏上对齐后同时下单，返回成功的单数
fn race_orders(diner: &Diner, contenders: usize) -> usize {
    let barrier = Arc::new(Barrier::new(contenders));
    let mut handles = Vec::with_capacity(contenders);

    for _ in 0..contenders {
        let state = diner.state.clone();
        let order = diner.one_tortilla();
        let barrier = barrier.clone();
        handles.push(thread::spawn(move || {
            barrier.wait();
            match state.engine.place_order(order) {
                Ok(_) => true,
                Err(OrderError::Inventory(LedgerError::InsufficientStock { .. })) => false,
                Err(other) => panic!("意外的下单错误: {other}"),
            }
        }));
    }

    handles
        .into_iter()
        .map(|h| h.join().expect("下单线程崩溃"))
        .filter(|placed| *placed)
        .count()
}

#[test]
fn test_parallel_orders_never_oversell() {
    let diner = open_diner(PORTIONS as i64);

    let placed = race_orders(&diner, CONTENDERS);

    // 刚好卖完 20 份，多一份都不行
    assert_eq!(placed, PORTIONS);
    assert_eq!(diner.potato_stock(), Decimal::ZERO, "库存应精确扣到零");

    // 落库订单数与账面营收都和成功单数一致
    let orders = diner
        .state
        .store
        .orders_for_restaurant(&diner.restaurant.id)
        .unwrap();
    assert_eq!(orders.len(), PORTIONS);
    let revenue: Decimal = orders.iter().map(|o| o.total_amount).sum();
    assert_eq!(revenue, dec(650, 2) * Decimal::from(PORTIONS as u64));
}

#[test]
fn test_two_orders_race_for_last_portion() {
    let diner = open_diner(1);

    let placed = race_orders(&diner, 2);

    assert_eq!(placed, 1, "最后一份只能被一单抢到");
    assert_eq!(diner.potato_stock(), Decimal::ZERO);
}

#[test]
fn test_sold_out_menu_rejects_every_order() {
    let diner = open_diner(1);
    assert_eq!(race_orders(&diner, 1), 1);

    // 卖空之后的并发下单全部拒绝，库存保持为零
    let placed = race_orders(&diner, 4);
    assert_eq!(placed, 0);
    assert_eq!(diner.potato_stock(), Decimal::ZERO);
    assert_eq!(
        diner
            .state
            .store
            .orders_for_restaurant(&diner.restaurant.id)
            .unwrap()
            .len(),
        1
    );
}
