// ==========================================
// DLVery 库存配送协同系统 - 配送单生命周期状态机
// ==========================================
// 状态: pending → in_transit → {delivered, returned}
//       pending → returned（未发出直接退回）
//       pending/in_transit → door_lock（仅状态，无后续转换）
// 副作用:
// - in_transit / door_lock: 只更新 status
// - returned: 由配送单快照重建库存 + 删除配送单（单批次）
// - delivered: 必须经确认步骤；写签收凭证 + 删除配送单（单批次）
// 红线: 终态配送单在转换完成后不存在
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use crate::domain::delivery::Delivery;
use crate::domain::inventory::InventoryItemInput;
use crate::domain::types::DeliveryStatus;
use crate::domain::verification::{Verification, VerificationInput};
use crate::engine::error::{EngineError, EngineResult};
use crate::repository::{DeliveryRepository, InventoryRepository, VerificationRepository};
use crate::store::DocumentStore;

// ==========================================
// 转换分类
// ==========================================

/// 一次状态转换需要的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// 目标状态与当前相同
    NoChange,
    /// 只写 status 字段
    StatusOnly,
    /// 退回入库
    Return,
    /// 签收（需确认）
    Confirm,
}

/// 状态转换表
///
/// # 返回
/// - `Ok(kind)`: 合法转换
/// - `Err(InvalidStateTransition)`: 表中未定义的转换
pub fn check_transition(from: DeliveryStatus, to: DeliveryStatus) -> EngineResult<TransitionKind> {
    use crate::domain::types::DeliveryStatus::*;

    if from == to && !from.is_terminal() {
        return Ok(TransitionKind::NoChange);
    }
    match (from, to) {
        (Pending | InTransit, InTransit) => Ok(TransitionKind::StatusOnly),
        (Pending | InTransit, DoorLock) => Ok(TransitionKind::StatusOnly),
        (Pending | InTransit, Returned) => Ok(TransitionKind::Return),
        (InTransit, Delivered) => Ok(TransitionKind::Confirm),
        _ => Err(EngineError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

/// 状态变更结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    NoChange,
    StatusUpdated(DeliveryStatus),
    /// 已退回，附重建库存的 ID
    Returned { inventory_id: String },
}

/// 签收确认凭据
///
/// 由 `begin_confirmation` 发放，`confirm_delivery` / `cancel_confirmation` 消费。
/// 字段只读，调用方无法自行构造凭据。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryConfirmation {
    delivery_id: String,
    agent: String,
    sku: String,
    quantity: i64,
}

impl DeliveryConfirmation {
    fn issue(delivery: Delivery) -> Self {
        Self {
            delivery_id: delivery.id,
            agent: delivery.agent,
            sku: delivery.sku,
            quantity: delivery.quantity,
        }
    }

    pub fn delivery_id(&self) -> &str {
        &self.delivery_id
    }

    /// 发放时配送单所属配送员
    pub fn agent(&self) -> &str {
        &self.agent
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// 测试用：构造任意内容的凭据
    #[cfg(test)]
    pub(crate) fn forged(delivery_id: &str, agent: &str) -> Self {
        Self {
            delivery_id: delivery_id.to_string(),
            agent: agent.to_string(),
            sku: String::new(),
            quantity: 0,
        }
    }
}

// ==========================================
// DeliveryLifecycle - 生命周期状态机
// ==========================================
pub struct DeliveryLifecycle {
    store: Arc<dyn DocumentStore>,
    deliveries: DeliveryRepository,
}

impl DeliveryLifecycle {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            deliveries: DeliveryRepository::new(store.clone()),
            store,
        }
    }

    fn load(&self, delivery_id: &str) -> EngineResult<Delivery> {
        self.deliveries
            .find_by_id(delivery_id)?
            .ok_or_else(|| EngineError::not_found("deliveries", delivery_id))
    }

    /// 变更配送单状态
    ///
    /// 目标为 delivered 时返回 `ConfirmationRequired`，调用方须走确认流程。
    pub fn change_status(
        &self,
        delivery_id: &str,
        to: DeliveryStatus,
    ) -> EngineResult<TransitionOutcome> {
        let delivery = self.load(delivery_id)?;

        match check_transition(delivery.status, to)? {
            TransitionKind::NoChange => {
                tracing::debug!(delivery_id, status = %to, "状态未变化");
                Ok(TransitionOutcome::NoChange)
            }
            TransitionKind::StatusOnly => {
                self.store
                    .apply_batch(vec![DeliveryRepository::status_op(&delivery.id, to)])?;
                tracing::info!(
                    delivery_id,
                    from = %delivery.status,
                    to = %to,
                    "配送状态已更新"
                );
                Ok(TransitionOutcome::StatusUpdated(to))
            }
            TransitionKind::Return => self.return_to_inventory(&delivery),
            TransitionKind::Confirm => Err(EngineError::ConfirmationRequired {
                delivery_id: delivery.id,
            }),
        }
    }

    /// 退回入库：重建库存 + 删除配送单
    fn return_to_inventory(&self, delivery: &Delivery) -> EngineResult<TransitionOutcome> {
        let input = InventoryItemInput {
            sku: delivery.sku.clone(),
            category: delivery.name.clone(),
            quantity: delivery.quantity,
            perishable: delivery.perishable,
            damaged: delivery.damaged,
            expiry: None,
        };
        let ids = self.store.apply_batch(vec![
            InventoryRepository::create_op(&input, Utc::now()),
            DeliveryRepository::delete_op(&delivery.id),
        ])?;
        let inventory_id = ids.into_iter().next().flatten().unwrap_or_default();

        tracing::info!(
            delivery_id = %delivery.id,
            inventory_id = %inventory_id,
            sku = %delivery.sku,
            quantity = delivery.quantity,
            "配送单已退回入库"
        );
        Ok(TransitionOutcome::Returned { inventory_id })
    }

    // ==========================================
    // 签收确认流程
    // ==========================================

    /// 开始签收确认（配送单须为 in_transit）
    pub fn begin_confirmation(&self, delivery_id: &str) -> EngineResult<DeliveryConfirmation> {
        let delivery = self.load(delivery_id)?;
        match check_transition(delivery.status, DeliveryStatus::Delivered)? {
            TransitionKind::Confirm => Ok(DeliveryConfirmation::issue(delivery)),
            _ => Err(EngineError::InvalidStateTransition {
                from: delivery.status.to_string(),
                to: DeliveryStatus::Delivered.to_string(),
            }),
        }
    }

    /// 确认签收
    ///
    /// 签收人与签名在任何写入之前校验，校验失败时凭据仍可重用；
    /// 提交前重新读取配送单：须仍为 in_transit 且仍属于凭据上的配送员，
    /// 否则拒绝（发放后状态变化的凭据即失效）。
    /// 通过后签收凭证与配送单删除同批次提交。
    /// 配送单已被并发删除时整批失败，不会留下孤立凭证。
    pub fn confirm_delivery(
        &self,
        confirmation: &DeliveryConfirmation,
        input: &VerificationInput,
    ) -> EngineResult<Verification> {
        let customer_name = input.customer_name.trim();
        if customer_name.is_empty() {
            return Err(EngineError::validation("customer name required"));
        }
        if input.signature.trim().is_empty() {
            return Err(EngineError::validation("signature required"));
        }

        let delivery = self.load(&confirmation.delivery_id)?;
        if delivery.agent != confirmation.agent {
            tracing::warn!(
                delivery_id = %delivery.id,
                token_agent = %confirmation.agent,
                "签收凭据与配送单所属配送员不一致"
            );
            return Err(EngineError::not_found("deliveries", &delivery.id));
        }
        if check_transition(delivery.status, DeliveryStatus::Delivered)? != TransitionKind::Confirm {
            return Err(EngineError::InvalidStateTransition {
                from: delivery.status.to_string(),
                to: DeliveryStatus::Delivered.to_string(),
            });
        }

        let verified_at = Utc::now();
        let ids = self.store.apply_batch(vec![
            VerificationRepository::create_op(
                &confirmation.delivery_id,
                &confirmation.agent,
                customer_name,
                &input.signature,
                verified_at,
            ),
            DeliveryRepository::delete_op(&confirmation.delivery_id),
        ])?;

        let verification = Verification {
            id: ids.into_iter().next().flatten().unwrap_or_default(),
            delivery_id: confirmation.delivery_id.clone(),
            agent: confirmation.agent.clone(),
            customer_name: customer_name.to_string(),
            signature: input.signature.clone(),
            verified_at,
        };
        tracing::info!(
            delivery_id = %verification.delivery_id,
            verification_id = %verification.id,
            sku = %confirmation.sku,
            "配送单已签收"
        );
        Ok(verification)
    }

    /// 取消签收确认，不产生任何写入
    pub fn cancel_confirmation(&self, confirmation: DeliveryConfirmation) {
        tracing::info!(delivery_id = %confirmation.delivery_id, "签收确认已取消");
    }
}
