// ==========================================
// DLVery 库存配送协同系统 - 配送员 API
// ==========================================
// 职责: 配送员登录、今日队列、状态更新、签收确认、状况变化提示
// 约束: 只能操作分配给会话配送员的配送单，其余一律视为不存在
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;

use crate::api::delivery_console_api::{record_confirmation, record_transition};
use crate::api::error::{ApiError, ApiResult};
use crate::domain::delivery::Delivery;
use crate::domain::session::AgentSession;
use crate::domain::types::DeliveryStatus;
use crate::domain::verification::{Verification, VerificationInput};
use crate::engine::{
    detect_condition_changes, ConditionChange, DeliveryConfirmation, DeliveryLifecycle,
    DeliveryPrioritizer, DeliveryQueue, TransitionOutcome,
};
use crate::repository::{ActionLogRepository, DeliveryRepository};
use crate::store::{DocumentStore, StoreResult, Subscription};

// ==========================================
// AgentApi - 配送员 API
// ==========================================
pub struct AgentApi {
    store: Arc<dyn DocumentStore>,
    delivery_repo: Arc<DeliveryRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    lifecycle: Arc<DeliveryLifecycle>,
    prioritizer: Arc<DeliveryPrioritizer>,
}

impl AgentApi {
    /// 创建新的AgentApi实例
    pub fn new(
        store: Arc<dyn DocumentStore>,
        delivery_repo: Arc<DeliveryRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        lifecycle: Arc<DeliveryLifecycle>,
        prioritizer: Arc<DeliveryPrioritizer>,
    ) -> Self {
        Self {
            store,
            delivery_repo,
            action_log_repo,
            lifecycle,
            prioritizer,
        }
    }

    // ==========================================
    // 会话
    // ==========================================

    /// 登录（邮箱去空白后不能为空）
    pub fn login(&self, email: &str) -> ApiResult<AgentSession> {
        let session = AgentSession::new(email)
            .ok_or_else(|| ApiError::ValidationError("agent email required".to_string()))?;
        info!(agent = %session.agent_email, "配送员已登录");
        Ok(session)
    }

    pub fn logout(&self, session: AgentSession) {
        info!(agent = %session.agent_email, "配送员已登出");
    }

    // ==========================================
    // 队列
    // ==========================================

    /// 订阅本配送员的配送单（createdAt 倒序全量快照）
    pub fn subscribe(&self, session: &AgentSession) -> StoreResult<Subscription> {
        self.delivery_repo.subscribe_for_agent(&session.agent_email)
    }

    /// 读取本配送员的配送单（createdAt 倒序）
    pub fn my_deliveries(&self, session: &AgentSession) -> ApiResult<Vec<Delivery>> {
        let docs = self
            .store
            .get_all(&DeliveryRepository::agent_query(&session.agent_email))?;
        Ok(DeliveryRepository::map_snapshot(&docs))
    }

    /// 今日队列：过期 / 今日 / 未来，桶内按优先级排序
    pub fn queue(&self, session: &AgentSession, today: NaiveDate) -> ApiResult<DeliveryQueue> {
        let deliveries = self.my_deliveries(session)?;
        Ok(self.queue_from(&deliveries, today))
    }

    /// 由已有快照构建队列（供订阅视图使用）
    pub fn queue_from(&self, deliveries: &[Delivery], today: NaiveDate) -> DeliveryQueue {
        self.prioritizer.group_by_date(deliveries, today)
    }

    /// 展示用优先级标签
    pub fn priority_label(&self, delivery: &Delivery) -> &'static str {
        self.prioritizer.priority_type(delivery).label()
    }

    /// 两次快照间状况有变化的配送单
    pub fn condition_updates(&self, previous: &[Delivery], next: &[Delivery]) -> Vec<ConditionChange> {
        detect_condition_changes(previous, next)
    }

    // ==========================================
    // 状态流转（仅限本人配送单）
    // ==========================================

    fn load_owned(&self, session: &AgentSession, id: &str) -> ApiResult<Delivery> {
        match self.delivery_repo.find_by_id(id)? {
            Some(d) if session.owns(&d.agent) => Ok(d),
            _ => Err(ApiError::NotFound(format!("deliveries(id={})不存在", id))),
        }
    }

    pub fn change_status(
        &self,
        session: &AgentSession,
        id: &str,
        status: DeliveryStatus,
    ) -> ApiResult<TransitionOutcome> {
        let delivery = self.load_owned(session, id)?;
        let outcome = self.lifecycle.change_status(id, status)?;
        record_transition(
            &self.action_log_repo,
            &session.agent_email,
            &delivery,
            &outcome,
        );
        Ok(outcome)
    }

    pub fn begin_confirmation(
        &self,
        session: &AgentSession,
        id: &str,
    ) -> ApiResult<DeliveryConfirmation> {
        self.load_owned(session, id)?;
        Ok(self.lifecycle.begin_confirmation(id)?)
    }

    pub fn confirm_delivery(
        &self,
        session: &AgentSession,
        confirmation: &DeliveryConfirmation,
        input: &VerificationInput,
    ) -> ApiResult<Verification> {
        self.load_owned(session, confirmation.delivery_id())?;
        let verification = self.lifecycle.confirm_delivery(confirmation, input)?;
        record_confirmation(
            &self.action_log_repo,
            &session.agent_email,
            confirmation,
            &verification,
        );
        Ok(verification)
    }

    pub fn cancel_confirmation(&self, confirmation: DeliveryConfirmation) {
        self.lifecycle.cancel_confirmation(confirmation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use crate::domain::types::ConditionType;
    use chrono::Utc;

    fn insert(state: &AppState, agent: &str, status: DeliveryStatus) -> String {
        let delivery = Delivery {
            id: String::new(),
            sku: "P9".to_string(),
            name: "Pantry".to_string(),
            agent: agent.to_string(),
            quantity: 1,
            status,
            condition_type: ConditionType::Normal,
            perishable: false,
            damaged: false,
            delivery_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            created_at: Utc::now(),
            delivered_quantity: 0,
            delivered_at: None,
        };
        DeliveryRepository::new(state.store.clone())
            .insert(&delivery)
            .unwrap()
    }

    #[test]
    fn test_confirm_checks_stored_owner() {
        let state = AppState::in_memory().unwrap();
        let alice = state.agent_api.login("a@x.com").unwrap();
        let id = insert(&state, "b@x.com", DeliveryStatus::Pending);

        let token = DeliveryConfirmation::forged(&id, "a@x.com");
        let err = state
            .agent_api
            .confirm_delivery(&alice, &token, &VerificationInput::new("Bob", "sig"))
            .unwrap_err();

        assert!(err.is_not_found());
        assert!(state.agent_api.delivery_repo.find_by_id(&id).unwrap().is_some());
        assert!(state.verification_repo.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_confirm_own_pending_delivery_rejected() {
        let state = AppState::in_memory().unwrap();
        let alice = state.agent_api.login("a@x.com").unwrap();
        let id = insert(&state, "a@x.com", DeliveryStatus::Pending);

        let token = DeliveryConfirmation::forged(&id, "a@x.com");
        let err = state
            .agent_api
            .confirm_delivery(&alice, &token, &VerificationInput::new("Bob", "sig"))
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));
        assert!(state.agent_api.delivery_repo.find_by_id(&id).unwrap().is_some());
        assert!(state.verification_repo.list_all().unwrap().is_empty());
    }
}
