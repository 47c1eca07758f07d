// ==========================================
// DLVery 库存配送协同系统 - 库存组 API
// ==========================================
// 职责: 库存录入/编辑/删除/导入、派送、状况标记切换
// 审计: 每个写操作提交后追加 action_log
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::api::error::ApiResult;
use crate::api::validator::{validate_agent, validate_item_input};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::delivery::Delivery;
use crate::domain::inventory::{ImportSummary, InventoryFilter, InventoryItem, InventoryItemInput};
use crate::domain::types::ConditionField;
use crate::domain::user::User;
use crate::engine::{ConsistencyEngine, ToggleOutcome};
use crate::repository::{
    ActionLogRepository, DeliveryRepository, InventoryRepository, UserRepository,
};
use crate::store::StoreResult;

// ==========================================
// InventoryApi - 库存组 API
// ==========================================
pub struct InventoryApi {
    inventory_repo: Arc<InventoryRepository>,
    delivery_repo: Arc<DeliveryRepository>,
    user_repo: Arc<UserRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    consistency_engine: Arc<ConsistencyEngine>,
    config: Arc<ConfigManager>,
}

impl InventoryApi {
    /// 创建新的InventoryApi实例
    pub fn new(
        inventory_repo: Arc<InventoryRepository>,
        delivery_repo: Arc<DeliveryRepository>,
        user_repo: Arc<UserRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        consistency_engine: Arc<ConsistencyEngine>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            inventory_repo,
            delivery_repo,
            user_repo,
            action_log_repo,
            consistency_engine,
            config,
        }
    }

    /// 审计用操作人（库存组角色名）
    fn actor(&self) -> String {
        self.config
            .inventory_role()
            .map(|r| r.as_str().to_string())
            .unwrap_or_else(|_| "InvTeam".to_string())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 全部库存（createdAt 倒序）
    pub fn list_items(&self) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.inventory_repo.list_all()?)
    }

    /// 按筛选条件过滤（纯函数，保持输入顺序）
    pub fn filter_items(items: &[InventoryItem], filter: &InventoryFilter) -> Vec<InventoryItem> {
        items.iter().filter(|i| filter.matches(i)).cloned().collect()
    }

    /// 当前存在在途配送单的 SKU 集合
    pub fn skus_with_deliveries(&self) -> ApiResult<BTreeSet<String>> {
        Ok(self
            .delivery_repo
            .list_all()?
            .into_iter()
            .map(|d| d.sku)
            .filter(|sku| !sku.is_empty())
            .collect())
    }

    /// 可选配送员（配置的配送员角色且邮箱非空）
    pub fn list_agents(&self) -> ApiResult<Vec<User>> {
        let role = self.config.agent_role()?;
        Ok(self
            .user_repo
            .list_by_role(role)?
            .into_iter()
            .filter(|u| !u.email.is_empty())
            .collect())
    }

    // ==========================================
    // 库存维护
    // ==========================================

    /// 新建库存
    ///
    /// # 返回
    /// 新库存 ID
    pub fn create_item(&self, input: &InventoryItemInput) -> ApiResult<String> {
        let input = validate_item_input(input)?;
        let id = self.inventory_repo.create(&input)?;

        info!(item_id = %id, sku = %input.sku, quantity = input.quantity, "库存已新建");
        self.action_log_repo.record(
            ActionLog::new(ActionType::CreateItem, &self.actor())
                .target(&id)
                .sku(&input.sku)
                .payload(json!(input)),
        );
        Ok(id)
    }

    /// 编辑库存（刷新 updatedAt，保留 createdAt）
    pub fn update_item(&self, id: &str, input: &InventoryItemInput) -> ApiResult<()> {
        let input = validate_item_input(input)?;
        self.inventory_repo.update(id, &input)?;

        info!(item_id = %id, sku = %input.sku, "库存已编辑");
        self.action_log_repo.record(
            ActionLog::new(ActionType::UpdateItem, &self.actor())
                .target(id)
                .sku(&input.sku)
                .payload(json!(input)),
        );
        Ok(())
    }

    /// 删除库存（幂等：不存在视为成功）
    pub fn delete_item(&self, id: &str) -> ApiResult<()> {
        match self.inventory_repo.delete(id) {
            Ok(()) => {
                info!(item_id = %id, "库存已删除");
                self.action_log_repo
                    .record(ActionLog::new(ActionType::DeleteItem, &self.actor()).target(id));
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                warn!(item_id = %id, "库存不存在，删除按成功处理");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 按 SKU 批量导入（存在则更新首条，不存在则新建）
    ///
    /// 单条失败只计入 errors，不中断整批
    pub fn import_items(&self, records: &[InventoryItemInput]) -> ApiResult<ImportSummary> {
        let mut summary = ImportSummary::default();

        for (row, record) in records.iter().enumerate() {
            let input = match validate_item_input(record) {
                Ok(input) => input,
                Err(e) => {
                    warn!(row, sku = %record.sku, error = %e, "导入记录校验失败");
                    summary.errors += 1;
                    continue;
                }
            };

            match self.upsert_by_sku(&input) {
                Ok(true) => summary.updated += 1,
                Ok(false) => summary.added += 1,
                Err(e) => {
                    warn!(row, sku = %input.sku, error = %e, "导入记录写入失败");
                    summary.errors += 1;
                }
            }
        }

        info!(
            added = summary.added,
            updated = summary.updated,
            errors = summary.errors,
            "库存导入完成"
        );
        self.action_log_repo.record(
            ActionLog::new(ActionType::ImportItems, &self.actor()).payload(json!(summary)),
        );
        Ok(summary)
    }

    /// 更新同 SKU 的首条库存，没有则新建
    ///
    /// # 返回
    /// true 表示更新，false 表示新建
    fn upsert_by_sku(&self, input: &InventoryItemInput) -> StoreResult<bool> {
        match self.inventory_repo.find_by_sku(&input.sku)?.first() {
            Some(item) => {
                self.inventory_repo.update(&item.id, input)?;
                Ok(true)
            }
            None => {
                self.inventory_repo.create(input)?;
                Ok(false)
            }
        }
    }

    // ==========================================
    // 跨集合操作
    // ==========================================

    /// 派送给配送员（配送员须在可选名单内）
    pub fn send_for_delivery(
        &self,
        item_id: &str,
        agent: &str,
        quantity: i64,
        delivery_date: &str,
    ) -> ApiResult<Delivery> {
        let agents = self.list_agents()?;
        let agent = validate_agent(agent, &agents)?;

        let delivery = self
            .consistency_engine
            .dispatch(item_id, &agent, quantity, delivery_date)?;

        self.action_log_repo.record(
            ActionLog::new(ActionType::Dispatch, &self.actor())
                .target(&delivery.id)
                .sku(&delivery.sku)
                .payload(json!({
                    "itemId": item_id,
                    "agent": delivery.agent,
                    "quantity": delivery.quantity,
                    "deliveryDate": delivery_date.trim(),
                    "type": delivery.condition_type,
                })),
        );
        Ok(delivery)
    }

    /// 切换库存状况标记并同步同 SKU 配送单
    pub fn toggle_condition(&self, item_id: &str, field: ConditionField) -> ApiResult<ToggleOutcome> {
        let outcome = self.consistency_engine.toggle_condition(item_id, field)?;

        self.action_log_repo.record(
            ActionLog::new(ActionType::ToggleCondition, &self.actor())
                .target(item_id)
                .payload(json!({
                    "field": field,
                    "value": outcome.value,
                    "deliveriesUpdated": outcome.deliveries_updated,
                })),
        );
        Ok(outcome)
    }
}
