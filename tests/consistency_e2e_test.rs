// ==========================================
// 库存/配送一致性 端到端测试
// ==========================================
// 测试范围:
// 1. 派送: 新建 pending 配送单 + 删除库存（同批次）
// 2. 库存侧切换状况标记 → 同 SKU 配送单同步
// 3. 配送侧修改类型 → 同 SKU 库存同步
// 4. 校验失败不产生任何写入
// ==========================================

mod helpers;

use dlvery::api::ApiError;
use dlvery::domain::delivery::DeliveryFilter;
use dlvery::domain::types::{ConditionField, ConditionType, DeliveryStatus};
use dlvery::ActionType;
use helpers::api_test_helper::*;
use helpers::test_data_builder::{date, DeliveryBuilder, ItemBuilder};

// ==========================================
// 派送
// ==========================================

#[test]
fn test_dispatch_易腐库存生成待发配送单() {
    let env = ApiTestEnv::new().expect("无法创建测试环境");
    let item_id = env.add_item(
        ItemBuilder::new("A1")
            .category("Dairy")
            .quantity(10)
            .perishable()
            .build(),
    );

    let delivery = env.dispatch(&item_id, AGENT_A, 4, "2024-05-02");

    assert!(!delivery.id.is_empty());
    assert_eq!(delivery.sku, "A1");
    assert_eq!(delivery.name, "Dairy");
    assert_eq!(delivery.agent, AGENT_A);
    assert_eq!(delivery.quantity, 4);
    assert_eq!(delivery.status, DeliveryStatus::Pending);
    assert_eq!(delivery.condition_type, ConditionType::Perishable);
    assert!(delivery.perishable);
    assert!(!delivery.damaged);
    assert_eq!(delivery.delivery_date, Some(date("2024-05-02")));

    // 库存整条删除（剩余数量不保留）
    assert!(env.inventory_repo.find_by_id(&item_id).unwrap().is_none());
    assert_eq!(env.inventory_count(), 0);

    let stored = env.delivery_repo.find_by_id(&delivery.id).unwrap().unwrap();
    assert_eq!(stored, delivery);
}

#[test]
fn test_dispatch_同时易腐破损按易腐() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("B1").perishable().damaged().build());

    let delivery = env.dispatch(&item_id, AGENT_A, 1, "2024-05-02");
    assert_eq!(delivery.condition_type, ConditionType::Perishable);
    assert!(delivery.perishable && delivery.damaged);
}

#[test]
fn test_dispatch_校验失败不写入() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("C1").quantity(3).build());
    let api = &env.state.inventory_api;

    let cases: Vec<(&str, i64, &str, &str)> = vec![
        ("", 1, "2024-05-02", "agent required"),
        (AGENT_A, 1, "", "delivery date required"),
        (AGENT_A, 1, "02/05/2024", "invalid delivery date"),
        (AGENT_A, 0, "2024-05-02", "invalid quantity"),
        (AGENT_A, 4, "2024-05-02", "invalid quantity"),
    ];
    for (agent, qty, day, expected) in cases {
        let err = api
            .send_for_delivery(&item_id, agent, qty, day)
            .expect_err("应该校验失败");
        assert!(err.is_validation(), "{:?}", err);
        assert_eq!(err.to_string(), expected);
    }

    let err = api
        .send_for_delivery(&item_id, "stranger@dlvery.test", 1, "2024-05-02")
        .unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("unknown agent"));

    assert_eq!(env.inventory_count(), 1);
    assert_eq!(env.delivery_count(), 0);
}

#[test]
fn test_dispatch_库存不存在() {
    let env = ApiTestEnv::new().unwrap();
    let err = env
        .state
        .inventory_api
        .send_for_delivery("missing", AGENT_A, 1, "2024-05-02")
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    assert_eq!(env.delivery_count(), 0);
}

#[test]
fn test_dispatch_写入审计日志() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("AUD").build());
    let delivery = env.dispatch(&item_id, AGENT_A, 2, "2024-05-02");

    let logs = env
        .state
        .action_log_repo
        .find_by_target(&delivery.id)
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, ActionType::Dispatch.to_string());
    assert_eq!(logs[0].sku.as_deref(), Some("AUD"));
}

// ==========================================
// 库存侧切换状况标记
// ==========================================

#[test]
fn test_toggle_condition_同步全部同SKU配送单() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("D1").build());

    let d1 = env.insert_delivery(&DeliveryBuilder::new("D1", AGENT_A).build());
    let d2 = env.insert_delivery(
        &DeliveryBuilder::new("D1", AGENT_B)
            .damaged()
            .status(DeliveryStatus::InTransit)
            .build(),
    );
    let other = env.insert_delivery(&DeliveryBuilder::new("OTHER", AGENT_A).build());

    let outcome = env
        .state
        .inventory_api
        .toggle_condition(&item_id, ConditionField::Perishable)
        .unwrap();
    assert!(outcome.value);
    assert_eq!(outcome.deliveries_updated, 2);

    let item = env.inventory_repo.find_by_id(&item_id).unwrap().unwrap();
    assert!(item.perishable);

    let first = env.delivery_repo.find_by_id(&d1).unwrap().unwrap();
    assert!(first.perishable);
    assert!(!first.damaged);
    assert_eq!(first.condition_type, ConditionType::Perishable);

    // 另一字段保持原值
    let second = env.delivery_repo.find_by_id(&d2).unwrap().unwrap();
    assert!(second.perishable);
    assert!(second.damaged);
    assert_eq!(second.condition_type, ConditionType::Perishable);
    assert_eq!(second.status, DeliveryStatus::InTransit);

    let untouched = env.delivery_repo.find_by_id(&other).unwrap().unwrap();
    assert!(!untouched.perishable);
    assert_eq!(untouched.condition_type, ConditionType::Normal);

    // 再次切换回退
    let outcome = env
        .state
        .inventory_api
        .toggle_condition(&item_id, ConditionField::Perishable)
        .unwrap();
    assert!(!outcome.value);
    let second = env.delivery_repo.find_by_id(&d2).unwrap().unwrap();
    assert!(!second.perishable);
    assert_eq!(second.condition_type, ConditionType::Damaged);
}

#[test]
fn test_toggle_condition_无配送单() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("E1").build());

    let outcome = env
        .state
        .inventory_api
        .toggle_condition(&item_id, ConditionField::Damaged)
        .unwrap();
    assert!(outcome.value);
    assert_eq!(outcome.deliveries_updated, 0);
    assert!(env.inventory_repo.find_by_id(&item_id).unwrap().unwrap().damaged);
}

#[test]
fn test_toggle_condition_库存不存在() {
    let env = ApiTestEnv::new().unwrap();
    let err = env
        .state
        .inventory_api
        .toggle_condition("missing", ConditionField::Damaged)
        .unwrap_err();
    assert!(err.is_not_found());
}

// ==========================================
// 配送侧修改类型
// ==========================================

#[test]
fn test_change_type_破损同步到库存() {
    let env = ApiTestEnv::new().unwrap();
    let i1 = env.add_item(ItemBuilder::new("F1").perishable().build());
    let i2 = env.add_item(ItemBuilder::new("F1").build());
    let other = env.add_item(ItemBuilder::new("F2").build());
    let delivery_id = env.insert_delivery(&DeliveryBuilder::new("F1", AGENT_A).perishable().build());

    let updated = env
        .state
        .delivery_console_api
        .change_type(&delivery_id, ConditionType::Damaged)
        .unwrap();
    assert_eq!(updated, 2);

    let delivery = env.delivery_repo.find_by_id(&delivery_id).unwrap().unwrap();
    assert_eq!(delivery.condition_type, ConditionType::Damaged);
    assert!(delivery.damaged);
    assert!(!delivery.perishable);

    for id in [&i1, &i2] {
        let item = env.inventory_repo.find_by_id(id).unwrap().unwrap();
        assert!(item.damaged);
        assert!(!item.perishable);
    }
    let untouched = env.inventory_repo.find_by_id(&other).unwrap().unwrap();
    assert!(!untouched.damaged);
}

#[test]
fn test_change_type_正常清除两个标记() {
    let env = ApiTestEnv::new().unwrap();
    let item_id = env.add_item(ItemBuilder::new("G1").perishable().damaged().build());
    let delivery_id = env.insert_delivery(
        &DeliveryBuilder::new("G1", AGENT_A)
            .perishable()
            .damaged()
            .build(),
    );

    env.state
        .delivery_console_api
        .change_type(&delivery_id, ConditionType::Normal)
        .unwrap();

    let item = env.inventory_repo.find_by_id(&item_id).unwrap().unwrap();
    assert!(!item.perishable && !item.damaged);
    let delivery = env.delivery_repo.find_by_id(&delivery_id).unwrap().unwrap();
    assert_eq!(delivery.condition_type, ConditionType::Normal);
    assert!(!delivery.perishable && !delivery.damaged);
}

#[test]
fn test_change_type_无同SKU库存只改配送单() {
    let env = ApiTestEnv::new().unwrap();
    let delivery_id = env.insert_delivery(&DeliveryBuilder::new("H1", AGENT_A).build());

    let updated = env
        .state
        .delivery_console_api
        .change_type(&delivery_id, ConditionType::Perishable)
        .unwrap();
    assert_eq!(updated, 0);
    let delivery = env.delivery_repo.find_by_id(&delivery_id).unwrap().unwrap();
    assert_eq!(delivery.condition_type, ConditionType::Perishable);
}

#[test]
fn test_list_deliveries_按SKU与配送员筛选() {
    let env = ApiTestEnv::new().unwrap();
    env.insert_delivery(&DeliveryBuilder::new("MILK-1", AGENT_A).build());
    env.insert_delivery(&DeliveryBuilder::new("milk-2", AGENT_B).build());
    env.insert_delivery(&DeliveryBuilder::new("RICE", AGENT_A).build());

    let api = &env.state.delivery_console_api;
    let by_sku = api
        .list_deliveries(&DeliveryFilter {
            sku: Some("MILK".to_string()),
            agent: None,
        })
        .unwrap();
    assert_eq!(by_sku.len(), 2);

    let by_agent = api
        .list_deliveries(&DeliveryFilter {
            sku: None,
            agent: Some("  ALICE ".to_string()),
        })
        .unwrap();
    assert_eq!(by_agent.len(), 2);
    assert!(by_agent.iter().all(|d| d.agent == AGENT_A));

    assert_eq!(api.list_deliveries(&DeliveryFilter::default()).unwrap().len(), 3);
}
