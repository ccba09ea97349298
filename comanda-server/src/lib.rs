//! Comanda Server - 餐厅点单与库存后端
//!
//! # 架构概述
//!
//! 单进程门店节点，提供以下核心功能：
//!
//! - **订单引擎** (`orders`): 规格校验、计价、库存扣减、出票，一个事务内完成
//! - **库存台账** (`inventory`): 原子扣减/入库与配方维护
//! - **预订调度** (`reservations`): 两小时窗口冲突检测与自动分桌
//! - **消息总线** (`message`): 厨房显示屏的 TCP 推送通道
//! - **统计报表** (`analytics`): 营收、厨房效率、利润率、库存预警
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! comanda-server/src/
//! ├── core/          # 配置、状态、HTTP 装配
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (redb)
//! ├── orders/        # 订单引擎与金额规则
//! ├── inventory/     # 库存台账
//! ├── reservations/  # 预订调度
//! ├── analytics/     # 统计报表
//! ├── message/       # 消息总线
//! └── utils/         # 错误、日志、校验
//! ```

pub mod analytics;
pub mod api;
pub mod core;
pub mod db;
pub mod inventory;
pub mod message;
pub mod orders;
pub mod reservations;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, Server, ServerState, build_app};
pub use db::RestaurantStore;
pub use inventory::InventoryLedger;
pub use message::{BusMessage, EventType, MessageBus};
pub use orders::OrderEngine;
pub use reservations::ReservationScheduler;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 初始化运行环境
///
/// 加载 .env，建工作目录，按配置初始化日志，返回加载好的配置。
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;
    init_logger_with_file(Some(&config.log_level), Some(&config.log_dir()));

    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ______                                          __
  / ____/  ____    ____ ___    ____ _   ____   ____/ /  ____ _
 / /      / __ \  / __ `__ \  / __ `/  / __ \ / __  /  / __ `/
/ /___   / /_/ / / / / / / / / /_/ /  / / / // /_/ /  / /_/ /
\____/   \____/  /_/ /_/ /_/ \__,_/  /_/ /_/ \__,_/   \__,_/
    "#
    );
}
