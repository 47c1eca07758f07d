// ==========================================
// DLVery 库存配送协同系统 - 全部配送单控制台 API
// ==========================================
// 职责: 全部配送单列表/筛选、状态变更、签收确认、类型修改
// 审计: 每个写操作提交后追加 action_log
// ==========================================

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::delivery::{Delivery, DeliveryFilter};
use crate::domain::types::{ConditionType, DeliveryStatus};
use crate::domain::verification::{Verification, VerificationInput};
use crate::engine::{
    ConsistencyEngine, DeliveryConfirmation, DeliveryLifecycle, TransitionOutcome,
};
use crate::repository::{ActionLogRepository, DeliveryRepository};

// ==========================================
// DeliveryConsoleApi - 全部配送单控制台 API
// ==========================================
pub struct DeliveryConsoleApi {
    delivery_repo: Arc<DeliveryRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    lifecycle: Arc<DeliveryLifecycle>,
    consistency_engine: Arc<ConsistencyEngine>,
    config: Arc<ConfigManager>,
}

impl DeliveryConsoleApi {
    /// 创建新的DeliveryConsoleApi实例
    pub fn new(
        delivery_repo: Arc<DeliveryRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        lifecycle: Arc<DeliveryLifecycle>,
        consistency_engine: Arc<ConsistencyEngine>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            delivery_repo,
            action_log_repo,
            lifecycle,
            consistency_engine,
            config,
        }
    }

    fn actor(&self) -> String {
        self.config
            .inventory_role()
            .map(|r| r.as_str().to_string())
            .unwrap_or_else(|_| "InvTeam".to_string())
    }

    fn load(&self, id: &str) -> ApiResult<Delivery> {
        self.delivery_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("deliveries(id={})不存在", id)))
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 全部配送单（createdAt 倒序），按 sku / 配送员包含筛选
    pub fn list_deliveries(&self, filter: &DeliveryFilter) -> ApiResult<Vec<Delivery>> {
        let all = self.delivery_repo.list_all()?;
        let total = all.len();
        let result: Vec<Delivery> = all.into_iter().filter(|d| filter.matches(d)).collect();
        debug!(total, matched = result.len(), "配送单列表筛选");
        Ok(result)
    }

    // ==========================================
    // 状态流转
    // ==========================================

    /// 变更状态；目标为 delivered 时返回 ConfirmationRequired
    pub fn change_status(&self, id: &str, status: DeliveryStatus) -> ApiResult<TransitionOutcome> {
        let delivery = self.load(id)?;
        let outcome = self.lifecycle.change_status(id, status)?;
        record_transition(&self.action_log_repo, &self.actor(), &delivery, &outcome);
        Ok(outcome)
    }

    pub fn begin_confirmation(&self, id: &str) -> ApiResult<DeliveryConfirmation> {
        Ok(self.lifecycle.begin_confirmation(id)?)
    }

    pub fn confirm_delivery(
        &self,
        confirmation: &DeliveryConfirmation,
        input: &VerificationInput,
    ) -> ApiResult<Verification> {
        let verification = self.lifecycle.confirm_delivery(confirmation, input)?;
        record_confirmation(&self.action_log_repo, &self.actor(), confirmation, &verification);
        Ok(verification)
    }

    pub fn cancel_confirmation(&self, confirmation: DeliveryConfirmation) {
        self.lifecycle.cancel_confirmation(confirmation);
    }

    // ==========================================
    // 类型修改
    // ==========================================

    /// 修改配送单类型并同步同 SKU 库存
    ///
    /// # 返回
    /// 同步更新的库存数量
    pub fn change_type(&self, id: &str, condition_type: ConditionType) -> ApiResult<usize> {
        let updated = self
            .consistency_engine
            .change_delivery_type(id, condition_type)?;

        self.action_log_repo.record(
            ActionLog::new(ActionType::ChangeDeliveryType, &self.actor())
                .target(id)
                .payload(json!({
                    "type": condition_type,
                    "inventoryUpdated": updated,
                })),
        );
        Ok(updated)
    }
}

// ==========================================
// 审计辅助（控制台与配送员共用）
// ==========================================

/// 记录状态变更；未变化不记录
pub(crate) fn record_transition(
    action_log_repo: &ActionLogRepository,
    actor: &str,
    delivery: &Delivery,
    outcome: &TransitionOutcome,
) {
    let log = match outcome {
        TransitionOutcome::NoChange => return,
        TransitionOutcome::StatusUpdated(status) => {
            ActionLog::new(ActionType::ChangeStatus, actor).payload(json!({
                "from": delivery.status,
                "to": status,
            }))
        }
        TransitionOutcome::Returned { inventory_id } => {
            ActionLog::new(ActionType::ReturnDelivery, actor).payload(json!({
                "from": delivery.status,
                "inventoryId": inventory_id,
                "quantity": delivery.quantity,
            }))
        }
    };
    action_log_repo.record(log.target(&delivery.id).sku(&delivery.sku));
}

/// 记录签收确认
pub(crate) fn record_confirmation(
    action_log_repo: &ActionLogRepository,
    actor: &str,
    confirmation: &DeliveryConfirmation,
    verification: &Verification,
) {
    action_log_repo.record(
        ActionLog::new(ActionType::ConfirmDelivery, actor)
            .target(confirmation.delivery_id())
            .sku(confirmation.sku())
            .payload(json!({
                "verificationId": verification.id,
                "customerName": verification.customer_name,
                "quantity": confirmation.quantity(),
            })),
    );
}
