// ==========================================
// DLVery 库存配送协同系统 - 库存/配送一致性引擎
// ==========================================
// 职责:
// - 派送: 库存 → 配送单（新建配送单 + 删除库存，单批次原子提交）
// - 库存侧切换状况标记 → 同 SKU 全部配送单逐字段同步
// - 配送侧修改类型 → 同 SKU 全部库存按类型整体同步
// 红线: 引擎只传播状况标记，不创建也不销毁数量
// 已知边界: 同字段并发写入后写者胜；SKU 扫描不分页
// ==========================================

use std::sync::Arc;

use chrono::Utc;

use crate::domain::delivery::Delivery;
use crate::domain::inventory::InventoryItem;
use crate::domain::types::{ConditionField, ConditionType, DeliveryStatus};
use crate::engine::condition::derive_type;
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::normalize::parse_date;
use crate::repository::{DeliveryRepository, InventoryRepository};
use crate::store::{DocumentStore, WriteOp};

/// 切换状况标记的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// 切换后的标记值
    pub value: bool,
    /// 同步更新的配送单数量
    pub deliveries_updated: usize,
}

// ==========================================
// ConsistencyEngine - 一致性引擎
// ==========================================
pub struct ConsistencyEngine {
    store: Arc<dyn DocumentStore>,
    inventory: InventoryRepository,
    deliveries: DeliveryRepository,
}

impl ConsistencyEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - `store`: 集合存储（所有跨文档写入经 `apply_batch` 提交）
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inventory: InventoryRepository::new(store.clone()),
            deliveries: DeliveryRepository::new(store.clone()),
            store,
        }
    }

    // ==========================================
    // 派送
    // ==========================================

    /// 将库存派送给配送员
    ///
    /// 新建 pending 配送单（type 由库存当前标记推导），并删除整条库存。
    /// 即使 `quantity < item.quantity`，剩余数量也随库存一并删除，不做扣减。
    ///
    /// # 参数
    /// - `item_id`: 库存 ID（派送时重新读取，保证标记为最新值）
    /// - `agent`: 配送员邮箱（去首尾空白后不能为空）
    /// - `quantity`: 派送数量，1 ≤ quantity ≤ item.quantity
    /// - `delivery_date`: 配送日期文本（YYYY-MM-DD）
    ///
    /// # 返回
    /// 新建的配送单（含存储生成的 ID）
    pub fn dispatch(
        &self,
        item_id: &str,
        agent: &str,
        quantity: i64,
        delivery_date: &str,
    ) -> EngineResult<Delivery> {
        let agent = agent.trim();
        if agent.is_empty() {
            return Err(EngineError::validation("agent required"));
        }
        if delivery_date.trim().is_empty() {
            return Err(EngineError::validation("delivery date required"));
        }
        let date = parse_date(delivery_date)
            .ok_or_else(|| EngineError::validation("invalid delivery date"))?;

        let item = self
            .inventory
            .find_by_id(item_id)?
            .ok_or_else(|| EngineError::not_found("inventory", item_id))?;

        if quantity < 1 || quantity > item.quantity {
            return Err(EngineError::validation("invalid quantity"));
        }

        let mut delivery = Self::delivery_from_item(&item, agent, quantity, date);
        let ids = self.store.apply_batch(vec![
            DeliveryRepository::create_op(&delivery),
            InventoryRepository::delete_op(&item.id),
        ])?;
        delivery.id = ids.into_iter().next().flatten().unwrap_or_default();

        if quantity < item.quantity {
            tracing::warn!(
                item_id = %item.id,
                sku = %item.sku,
                dispatched = quantity,
                dropped = item.quantity - quantity,
                "派送数量小于库存数量，剩余数量随库存删除"
            );
        }
        tracing::info!(
            delivery_id = %delivery.id,
            sku = %delivery.sku,
            agent = %delivery.agent,
            quantity,
            condition_type = %delivery.condition_type,
            "库存已派送"
        );
        Ok(delivery)
    }

    /// 由库存快照构造 pending 配送单
    fn delivery_from_item(
        item: &InventoryItem,
        agent: &str,
        quantity: i64,
        date: chrono::NaiveDate,
    ) -> Delivery {
        Delivery {
            id: String::new(),
            sku: item.sku.clone(),
            name: item.category.clone(),
            agent: agent.to_string(),
            quantity,
            status: DeliveryStatus::Pending,
            condition_type: derive_type(item.perishable, item.damaged),
            perishable: item.perishable,
            damaged: item.damaged,
            delivery_date: Some(date),
            created_at: Utc::now(),
            delivered_quantity: 0,
            delivered_at: None,
        }
    }

    // ==========================================
    // 库存 → 配送单（逐字段）
    // ==========================================

    /// 翻转库存的单个状况标记，并同步到同 SKU 的全部配送单
    ///
    /// 配送单只改同名字段，另一字段保持原值，type 重新推导。
    /// 库存更新与配送单更新在同一批次提交。
    pub fn toggle_condition(
        &self,
        item_id: &str,
        field: ConditionField,
    ) -> EngineResult<ToggleOutcome> {
        let item = self
            .inventory
            .find_by_id(item_id)?
            .ok_or_else(|| EngineError::not_found("inventory", item_id))?;

        let value = match field {
            ConditionField::Perishable => !item.perishable,
            ConditionField::Damaged => !item.damaged,
        };

        let related = self.deliveries.find_by_sku(&item.sku)?;
        let mut ops: Vec<WriteOp> = Vec::with_capacity(related.len() + 1);
        ops.push(InventoryRepository::condition_op(
            &item.id,
            field,
            value,
            Utc::now(),
        ));
        for delivery in &related {
            let (perishable, damaged) = match field {
                ConditionField::Perishable => (value, delivery.damaged),
                ConditionField::Damaged => (delivery.perishable, value),
            };
            ops.push(DeliveryRepository::condition_op(
                &delivery.id,
                field,
                value,
                derive_type(perishable, damaged),
            ));
        }
        self.store.apply_batch(ops)?;

        tracing::info!(
            item_id = %item.id,
            sku = %item.sku,
            field = %field,
            value,
            deliveries_updated = related.len(),
            "库存状况标记已切换"
        );
        Ok(ToggleOutcome {
            value,
            deliveries_updated: related.len(),
        })
    }

    // ==========================================
    // 配送单 → 库存（按类型整体）
    // ==========================================

    /// 设置配送单类型，并把互斥的两个标记同步到同 SKU 的全部库存
    ///
    /// # 返回
    /// 同步更新的库存数量
    pub fn change_delivery_type(
        &self,
        delivery_id: &str,
        new_type: ConditionType,
    ) -> EngineResult<usize> {
        let delivery = self
            .deliveries
            .find_by_id(delivery_id)?
            .ok_or_else(|| EngineError::not_found("deliveries", delivery_id))?;

        let (perishable, damaged) = new_type.flags();
        let related = self.inventory.find_by_sku(&delivery.sku)?;
        let now = Utc::now();

        let mut ops: Vec<WriteOp> = Vec::with_capacity(related.len() + 1);
        ops.push(DeliveryRepository::type_op(&delivery.id, new_type));
        ops.extend(
            related
                .iter()
                .map(|item| InventoryRepository::flags_op(&item.id, perishable, damaged, now)),
        );
        self.store.apply_batch(ops)?;

        tracing::info!(
            delivery_id = %delivery.id,
            sku = %delivery.sku,
            condition_type = %new_type,
            inventory_updated = related.len(),
            "配送单类型已修改"
        );
        Ok(related.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::InventoryItemInput;
    use crate::store::SqliteDocumentStore;
    use chrono::NaiveDate;

    fn setup() -> (ConsistencyEngine, InventoryRepository, DeliveryRepository) {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteDocumentStore::in_memory().unwrap());
        (
            ConsistencyEngine::new(store.clone()),
            InventoryRepository::new(store.clone()),
            DeliveryRepository::new(store),
        )
    }

    #[test]
    fn test_dispatch_creates_pending_delivery_and_removes_item() {
        let (engine, inventory, deliveries) = setup();
        let item_id = inventory
            .create(&InventoryItemInput::new("A1", "Fruit", 10).perishable(true))
            .unwrap();

        let d = engine.dispatch(&item_id, "agent@x.com", 4, "2024-05-01").unwrap();
        assert!(!d.id.is_empty());
        assert_eq!(d.quantity, 4);
        assert_eq!(d.status, DeliveryStatus::Pending);
        assert_eq!(d.condition_type, ConditionType::Perishable);
        assert_eq!(d.delivery_date, NaiveDate::from_ymd_opt(2024, 5, 1));

        assert!(inventory.find_by_id(&item_id).unwrap().is_none());
        let stored = deliveries.find_by_id(&d.id).unwrap().unwrap();
        assert_eq!(stored.name, "Fruit");
        assert!(stored.perishable);
    }

    #[test]
    fn test_dispatch_validation_has_no_side_effect() {
        let (engine, inventory, deliveries) = setup();
        let item_id = inventory
            .create(&InventoryItemInput::new("A1", "Fruit", 3))
            .unwrap();

        let cases = [
            ("  ", 1, "2024-05-01", "agent required"),
            ("a@x.com", 1, "", "delivery date required"),
            ("a@x.com", 1, "someday", "invalid delivery date"),
            ("a@x.com", 0, "2024-05-01", "invalid quantity"),
            ("a@x.com", 4, "2024-05-01", "invalid quantity"),
        ];
        for (agent, qty, date, msg) in cases {
            match engine.dispatch(&item_id, agent, qty, date) {
                Err(EngineError::Validation(m)) => assert_eq!(m, msg),
                other => panic!("Expected Validation({}), got {:?}", msg, other),
            }
        }
        assert!(inventory.find_by_id(&item_id).unwrap().is_some());
        assert!(deliveries.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_dispatch_missing_item_is_not_found() {
        let (engine, _, _) = setup();
        let result = engine.dispatch("nope", "a@x.com", 1, "2024-05-01");
        assert!(matches!(result, Err(EngineError::NotFound { .. })));
    }

    #[test]
    fn test_toggle_damaged_keeps_perishable_priority() {
        let (engine, inventory, deliveries) = setup();
        let src = inventory
            .create(&InventoryItemInput::new("A1", "Fruit", 5).perishable(true))
            .unwrap();
        let d = engine.dispatch(&src, "a@x.com", 5, "2024-05-01").unwrap();
        let restocked = inventory
            .create(&InventoryItemInput::new("A1", "Fruit", 2).perishable(true))
            .unwrap();

        let outcome = engine
            .toggle_condition(&restocked, ConditionField::Damaged)
            .unwrap();
        assert!(outcome.value);
        assert_eq!(outcome.deliveries_updated, 1);

        let stored = deliveries.find_by_id(&d.id).unwrap().unwrap();
        assert!(stored.perishable);
        assert!(stored.damaged);
        assert_eq!(stored.condition_type, ConditionType::Perishable);
    }

    #[test]
    fn test_change_type_with_no_inventory_returns_zero() {
        let (engine, inventory, deliveries) = setup();
        let src = inventory
            .create(&InventoryItemInput::new("A1", "Fruit", 5))
            .unwrap();
        let d = engine.dispatch(&src, "a@x.com", 5, "2024-05-01").unwrap();

        let count = engine
            .change_delivery_type(&d.id, ConditionType::Perishable)
            .unwrap();
        assert_eq!(count, 0);
        let stored = deliveries.find_by_id(&d.id).unwrap().unwrap();
        assert_eq!(stored.condition_type, ConditionType::Perishable);
        assert!(stored.perishable && !stored.damaged);
    }
}
