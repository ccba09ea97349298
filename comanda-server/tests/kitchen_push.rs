//! 厨房推送通道端到端测试
//!
//! 走真实 TCP 连接：显示终端握手入组后，下单事务提交的出票帧原样到达；
//! 多终端在线时各收一份，没入组的终端收不到，上线前的历史出票不补发。

use std::time::Duration;

use comanda_server::db::RestaurantStore;
use comanda_server::db::models::{DiningTable, MenuItem, Restaurant};
use comanda_server::message::{
    BusMessage, EventType, GROUP_KITCHEN, HandshakePayload, KitchenTicket, PROTOCOL_VERSION,
    TcpTransport,
};
use comanda_server::orders::{OrderLine, PlaceOrder};
use comanda_server::{Config, ServerState};
use rust_decimal::Decimal;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};

/// 等待网络事件的上限，超时视为测试失败
const WAIT: Duration = Duration::from_secs(5);
/// 判定「不会再有帧到达」的观察窗口
const QUIET: Duration = Duration::from_millis(300);

struct PushRig {
    state: ServerState,
    restaurant: Restaurant,
    table: DiningTable,
    paella: MenuItem,
    addr: String,
}

/// 起一套完整推送链路：内存存储 + 订单引擎 + 临时端口上的真实 TCP 服务
async fn start_rig() -> PushRig {
    let store = RestaurantStore::open_in_memory().expect("打开内存存储失败");
    let state = ServerState::with_store(
        Config::with_overrides("/tmp/comanda-push-test", 0, 0),
        store,
    );

    let restaurant = state
        .store
        .create_restaurant("Casa Paella", "Av. del Puerto 9")
        .unwrap();
    let table = state.store.create_table(&restaurant.id, "Terraza 4").unwrap();
    let category = state.store.create_category(&restaurant.id, "Arroces").unwrap();
    let paella = state
        .store
        .create_menu_item(&category, "Paella", "", Decimal::new(1200, 2))
        .unwrap();

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("绑定临时端口失败");
    let addr = listener
        .local_addr()
        .expect("读取监听地址失败")
        .to_string();
    let bus = state.bus.clone();
    tokio::spawn(async move {
        let _ = bus.serve_listener(listener).await;
    });
    state.bus.spawn_ticket_forwarder(state.engine.subscribe());

    PushRig {
        state,
        restaurant,
        table,
        paella,
        addr,
    }
}

impl PushRig {
    fn paella_order(&self, qty: u32) -> PlaceOrder {
        PlaceOrder {
            restaurant_id: self.restaurant.id.clone(),
            table_id: self.table.id.clone(),
            waiter_id: None,
            customer_name: String::new(),
            customer_phone: String::new(),
            items: vec![OrderLine {
                id: self.paella.id.clone(),
                qty,
                selected_options: vec![],
            }],
        }
    }
}

/// 以显示终端身份接入并完成握手
async fn join_group(addr: &str, name: &str, groups: Vec<String>) -> TcpTransport {
    let display = TcpTransport::connect(addr).await.expect("连接推送通道失败");
    display
        .write_message(&BusMessage::handshake(&HandshakePayload {
            version: PROTOCOL_VERSION,
            client_name: name.to_string(),
            groups,
        }))
        .await
        .expect("发送握手帧失败");

    let ack = timeout(WAIT, display.read_message())
        .await
        .expect("等待握手确认超时")
        .expect("读取握手确认失败");
    assert_eq!(ack.event_type, EventType::HandshakeAck);
    display
}

async fn next_frame(display: &TcpTransport) -> BusMessage {
    timeout(WAIT, display.read_message())
        .await
        .expect("等待推送帧超时")
        .expect("读取推送帧失败")
}

#[tokio::test]
async fn test_display_receives_ticket_end_to_end() {
    let rig = start_rig().await;
    let display = join_group(&rig.addr, "kitchen-display-1", vec![GROUP_KITCHEN.to_string()]).await;

    // 收到 ack 之后提交的订单必须到达
    let order_id = rig
        .state
        .engine
        .place_order(rig.paella_order(2))
        .expect("下单应成功");

    let frame = next_frame(&display).await;
    assert_eq!(frame.event_type, EventType::KitchenOrderCreated);
    let ticket: KitchenTicket = frame.parse_payload().expect("解析出票载荷失败");
    assert_eq!(ticket.id, order_id);
    assert_eq!(ticket.table, "Terraza 4");
    assert_eq!(ticket.items, vec!["2 x Paella".to_string()]);
    assert_eq!(ticket.total, "24.00");

    // 心跳原路应答
    display
        .write_message(&BusMessage::ping())
        .await
        .expect("发送心跳失败");
    let pong = next_frame(&display).await;
    assert_eq!(pong.event_type, EventType::Pong);

    rig.state.bus.shutdown();
}

#[tokio::test]
async fn test_ticket_fans_out_to_kitchen_group_only() {
    let rig = start_rig().await;
    let left = join_group(&rig.addr, "pass-left", vec![GROUP_KITCHEN.to_string()]).await;
    let right = join_group(&rig.addr, "pass-right", vec![GROUP_KITCHEN.to_string()]).await;
    let lobby = join_group(&rig.addr, "lobby-screen", vec!["lobby".to_string()]).await;

    let order_id = rig
        .state
        .engine
        .place_order(rig.paella_order(1))
        .expect("下单应成功");

    for display in [&left, &right] {
        let frame = next_frame(display).await;
        let ticket: KitchenTicket = frame.parse_payload().expect("解析出票载荷失败");
        assert_eq!(ticket.id, order_id);
    }

    // 没入 kitchen 组的终端收不到出票
    assert!(
        timeout(QUIET, lobby.read_message()).await.is_err(),
        "lobby 终端不应收到厨房出票"
    );

    rig.state.bus.shutdown();
}

#[tokio::test]
async fn test_late_display_gets_no_replay() {
    let rig = start_rig().await;

    // 终端上线前的订单不补发
    rig.state
        .engine
        .place_order(rig.paella_order(1))
        .expect("下单应成功");
    sleep(Duration::from_millis(200)).await;

    let display = join_group(&rig.addr, "kitchen-display-2", vec![GROUP_KITCHEN.to_string()]).await;
    assert!(
        timeout(QUIET, display.read_message()).await.is_err(),
        "上线前的出票不应补发"
    );

    // 上线后的新订单正常到达
    let second = rig
        .state
        .engine
        .place_order(rig.paella_order(3))
        .expect("下单应成功");
    let frame = next_frame(&display).await;
    let ticket: KitchenTicket = frame.parse_payload().expect("解析出票载荷失败");
    assert_eq!(ticket.id, second);
    assert_eq!(ticket.items, vec!["3 x Paella".to_string()]);

    rig.state.bus.shutdown();
}
