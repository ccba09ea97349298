use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::analytics::Analytics;
use crate::core::Config;
use crate::db::RestaurantStore;
use crate::inventory::InventoryLedger;
use crate::message::{MessageBus, TransportConfig};
use crate::orders::OrderEngine;
use crate::reservations::ReservationScheduler;

/// 服务器状态 - 持有所有组件的共享引用
///
/// ServerState 是门店节点的核心数据结构，克隆成本低，
/// 每个 HTTP handler 通过 axum 的 `State` 提取器拿到一份。
///
/// # 组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | RestaurantStore | 嵌入式数据库 (redb) |
/// | engine | Arc\<OrderEngine\> | 下单/出餐/结账引擎 |
/// | ledger | InventoryLedger | 库存台账 |
/// | scheduler | ReservationScheduler | 预订调度 |
/// | analytics | Analytics | 统计报表 |
/// | bus | MessageBus | 厨房推送总线 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库
    pub store: RestaurantStore,
    /// 订单引擎 (内含出票广播通道，跨克隆共享)
    pub engine: Arc<OrderEngine>,
    /// 库存台账
    pub ledger: InventoryLedger,
    /// 预订调度器
    pub scheduler: ReservationScheduler,
    /// 统计报表
    pub analytics: Analytics,
    /// 厨房推送总线
    pub bus: MessageBus,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构 (data/ 与 logs/)
    /// 2. 数据库 (work_dir/data/comanda.redb)
    /// 3. 各组件 (引擎、台账、调度器、报表、总线)
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        config
            .ensure_work_dir_structure()
            .with_context(|| format!("failed to create work directory {}", config.work_dir))?;

        let store_path = config.store_path();
        let store = RestaurantStore::open(&store_path)
            .with_context(|| format!("failed to open store at {}", store_path.display()))?;

        Ok(Self::with_store(config.clone(), store))
    }

    /// 在已打开的存储上装配状态
    ///
    /// 测试用 `open_in_memory()` 的存储走这里，不碰文件系统。
    pub fn with_store(config: Config, store: RestaurantStore) -> Self {
        let bus = MessageBus::from_config(TransportConfig {
            tcp_listen_addr: config.bus_listen_addr(),
            ..TransportConfig::default()
        });

        Self {
            engine: Arc::new(OrderEngine::new(store.clone())),
            ledger: InventoryLedger::new(store.clone()),
            scheduler: ReservationScheduler::new(store.clone()),
            analytics: Analytics::new(store.clone()),
            config,
            store,
            bus,
        }
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 的监听开始之前调用。
    ///
    /// 启动的任务：
    /// - 厨房推送 TCP 服务 (显示屏直连)
    /// - 出票转发任务 (引擎广播 → kitchen 组)
    pub fn start_background_tasks(&self) {
        let bus = self.bus.clone();
        tokio::spawn(async move {
            if let Err(e) = bus.start_tcp_server().await {
                tracing::error!("Kitchen push channel failed: {}", e);
            }
        });

        self.bus.spawn_ticket_forwarder(self.engine.subscribe());
    }

    /// 获取工作目录
    pub fn work_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.work_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_memory_state() -> ServerState {
        let config = Config::with_overrides("/tmp/comanda-state-test", 0, 0);
        let store = RestaurantStore::open_in_memory().unwrap();
        ServerState::with_store(config, store)
    }

    #[test]
    fn test_components_share_one_store() {
        let state = in_memory_state();
        let restaurant = state.store.create_restaurant("Casa Pepe", "").unwrap();

        // 引擎与台账都看得到同一份目录数据
        let ingredient = state
            .ledger
            .add_ingredient(
                &restaurant.id,
                "Harina",
                "kg",
                rust_decimal::Decimal::TEN,
                rust_decimal::Decimal::ONE,
            )
            .unwrap();
        let report = state.analytics.restaurant_report(&restaurant.id).unwrap();
        assert!(report.low_stock.iter().all(|a| a.name != ingredient.name));
    }

    #[test]
    fn test_clone_shares_ticket_channel() {
        let state = in_memory_state();
        let cloned = state.clone();

        let restaurant = state.store.create_restaurant("Casa Pepe", "").unwrap();
        let category = state.store.create_category(&restaurant.id, "Tapas").unwrap();
        let item = state
            .store
            .create_menu_item(&category, "Tortilla", "", rust_decimal::Decimal::new(650, 2))
            .unwrap();
        let table = state.store.create_table(&restaurant.id, "Mesa 1").unwrap();

        // 克隆出来的状态订阅的是同一条出票通道
        let mut rx = cloned.engine.subscribe();
        state
            .engine
            .place_order(crate::orders::PlaceOrder {
                restaurant_id: restaurant.id.clone(),
                table_id: table.id.clone(),
                waiter_id: None,
                customer_name: "Guest".to_string(),
                customer_phone: String::new(),
                items: vec![crate::orders::OrderLine {
                    id: item.id.clone(),
                    qty: 1,
                    selected_options: vec![],
                }],
            })
            .unwrap();

        let ticket = rx.try_recv().unwrap();
        assert_eq!(ticket.table, "Mesa 1");
    }
}
