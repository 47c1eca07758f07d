// ==========================================
// 配送员队列 集成测试
// ==========================================
// 测试范围:
// 1. 日期分桶 + 桶内优先级排序
// 2. 实时视图: 提交后整体替换缓存
// 3. 状况变化提示
// 4. 会话持久化
// ==========================================

mod helpers;

use tempfile::TempDir;

use dlvery::app::SessionStore;
use dlvery::domain::types::{ConditionField, ConditionType};
use dlvery::Delivery;
use helpers::api_test_helper::*;
use helpers::test_data_builder::{date, DeliveryBuilder, ItemBuilder};

fn ids(deliveries: &[Delivery]) -> Vec<String> {
    deliveries.iter().map(|d| d.id.clone()).collect()
}

// ==========================================
// 队列分桶与排序
// ==========================================

#[test]
fn test_queue_分桶且优先级先于日期() {
    let env = ApiTestEnv::new().unwrap();
    let today = date("2024-05-02");

    let normal_early = env.insert_delivery(&DeliveryBuilder::new("N1", AGENT_A).date(today).build());
    let damaged = env.insert_delivery(&DeliveryBuilder::new("D1", AGENT_A).damaged().date(today).build());
    let perishable = env.insert_delivery(&DeliveryBuilder::new("P1", AGENT_A).perishable().date(today).build());
    let overdue = env.insert_delivery(&DeliveryBuilder::new("O1", AGENT_A).date(date("2024-04-30")).build());
    let upcoming_late = env.insert_delivery(
        &DeliveryBuilder::new("U2", AGENT_A)
            .perishable()
            .date(date("2024-05-09"))
            .build(),
    );
    let upcoming_soon = env.insert_delivery(
        &DeliveryBuilder::new("U1", AGENT_A)
            .perishable()
            .date(date("2024-05-03"))
            .build(),
    );
    let undated = env.insert_delivery(&DeliveryBuilder::new("X1", AGENT_A).build());
    // 他人配送单不进入队列
    env.insert_delivery(&DeliveryBuilder::new("B1", AGENT_B).perishable().date(today).build());

    let session = env.session(AGENT_A);
    let queue = env.state.agent_api.queue(&session, today).unwrap();

    assert_eq!(ids(&queue.past), vec![overdue]);
    assert_eq!(queue.today.len(), 4);
    assert_eq!(queue.today[0].id, perishable);
    assert_eq!(queue.today[1].id, damaged);
    // 普通件: 无日期的保持原位，有日期的彼此按日期排
    assert!(queue.today[2..].iter().any(|d| d.id == normal_early));
    assert!(queue.today[2..].iter().any(|d| d.id == undated));
    assert_eq!(ids(&queue.upcoming), vec![upcoming_soon, upcoming_late]);

    assert!(queue.today.iter().all(|d| d.agent == AGENT_A));
}

#[test]
fn test_queue_标记或类型任一命中() {
    let env = ApiTestEnv::new().unwrap();
    let today = date("2024-05-02");
    // type 为 perishable 但标记缺失
    let by_type = env.insert_delivery(
        &DeliveryBuilder::new("T1", AGENT_A)
            .condition_type(ConditionType::Perishable)
            .date(today)
            .build(),
    );
    env.insert_delivery(&DeliveryBuilder::new("T2", AGENT_A).damaged().date(today).build());

    let session = env.session(AGENT_A);
    let queue = env.state.agent_api.queue(&session, today).unwrap();
    assert_eq!(queue.today[0].id, by_type);
    assert_eq!(env.state.agent_api.priority_label(&queue.today[0]), ConditionType::Perishable.label());
}

// ==========================================
// 实时视图
// ==========================================

#[test]
fn test_live_view_提交后刷新() {
    let env = ApiTestEnv::new().unwrap();
    let session = env.session(AGENT_A);
    let mut view = env.state.agent_view(&session).unwrap();
    assert!(view.current().is_empty());
    assert!(!view.sync());

    let item_id = env.add_item(ItemBuilder::new("LV1").quantity(2).build());
    // 库存写入不影响配送单视图的内容
    view.sync();
    assert!(view.current().is_empty());

    env.dispatch(&item_id, AGENT_A, 2, "2024-05-02");
    assert!(view.sync());
    assert_eq!(view.current().len(), 1);
    assert_eq!(view.current()[0].sku, "LV1");

    // 他人的派送不进入本视图
    let other = env.add_item(ItemBuilder::new("LV2").build());
    env.dispatch(&other, AGENT_B, 1, "2024-05-02");
    view.sync();
    assert_eq!(view.current().len(), 1);
}

#[tokio::test]
async fn test_live_view_异步等待推送() {
    let env = ApiTestEnv::new().unwrap();
    let mut inventory = env.state.inventory_view().unwrap();
    let before = inventory.version();

    env.add_item(ItemBuilder::new("ASYNC").build());

    assert!(inventory.changed().await);
    assert!(inventory.version() > before);
    assert_eq!(inventory.current().len(), 1);
    assert_eq!(inventory.current()[0].sku, "ASYNC");
}

#[test]
fn test_condition_updates_提示变化() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("CU").build());
    let changed = env.insert_delivery(&DeliveryBuilder::new("CU", AGENT_A).build());
    env.insert_delivery(&DeliveryBuilder::new("OTHER", AGENT_A).build());

    let session = env.session(AGENT_A);
    let api = &env.state.agent_api;
    let before = api.my_deliveries(&session).unwrap();

    env.state
        .inventory_api
        .toggle_condition(&item_id, ConditionField::Damaged)
        .unwrap();

    let after = api.my_deliveries(&session).unwrap();
    let updates = api.condition_updates(&before, &after);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].delivery_id, changed);
    assert_eq!(updates[0].previous, ConditionType::Normal);
    assert_eq!(updates[0].current, ConditionType::Damaged);
}

// ==========================================
// 会话持久化
// ==========================================

#[test]
fn test_session_登录保存与登出清除() {
    let env = ApiTestEnv::new().unwrap();
    let dir = TempDir::new().unwrap();
    let sessions = SessionStore::new(dir.path().join("nested").join("session.json"));

    assert!(env.state.restore_session(&sessions).is_none());

    let session = env.state.login_agent(&sessions, "  alice@dlvery.test ").unwrap();
    assert_eq!(session.agent_email, AGENT_A);

    let restored = env.state.restore_session(&sessions).unwrap();
    assert_eq!(restored, session);

    env.state.logout_agent(&sessions, restored).unwrap();
    assert!(env.state.restore_session(&sessions).is_none());
    assert!(!sessions.path().exists());
}

#[test]
fn test_session_文件损坏按未登录() {
    let env = ApiTestEnv::new().unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "not json").unwrap();

    let sessions = SessionStore::new(&path);
    assert!(env.state.restore_session(&sessions).is_none());
}
