// ==========================================
// DLVery 库存配送协同系统 - 操作日志领域模型
// ==========================================
// 用途: 审计追踪。配送单终态后被删除，操作日志与签收凭证/重建库存共同构成留痕
// 对齐: action_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

// ==========================================
// ActionLog - 操作日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,
    pub action_type: String,      // 操作类型 (存储为字符串)
    pub action_ts: NaiveDateTime, // 操作时间戳 (UTC)
    pub actor: String,            // 操作人（配送员邮箱 / 库存组）
    pub target_id: Option<String>, // 目标文档 ID
    pub sku: Option<String>,
    pub payload_json: Option<JsonValue>,
    pub detail: Option<String>,
}

impl ActionLog {
    /// 以当前时间创建日志
    pub fn new(action_type: ActionType, actor: &str) -> Self {
        Self {
            action_id: uuid::Uuid::new_v4().to_string(),
            action_type: action_type.to_string(),
            action_ts: chrono::Utc::now().naive_utc(),
            actor: actor.to_string(),
            target_id: None,
            sku: None,
            payload_json: None,
            detail: None,
        }
    }

    pub fn target(mut self, target_id: &str) -> Self {
        self.target_id = Some(target_id.to_string());
        self
    }

    pub fn sku(mut self, sku: &str) -> Self {
        self.sku = Some(sku.to_string());
        self
    }

    pub fn payload(mut self, payload: JsonValue) -> Self {
        self.payload_json = Some(payload);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateItem,         // 新建库存
    UpdateItem,         // 编辑库存
    DeleteItem,         // 删除库存
    ImportItems,        // 批量导入
    Dispatch,           // 派送
    ToggleCondition,    // 库存侧切换状况标记
    ChangeDeliveryType, // 配送侧修改类型
    ChangeStatus,       // 状态更新
    ReturnDelivery,     // 退回入库
    ConfirmDelivery,    // 确认签收
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::CreateItem => "CREATE_ITEM",
            ActionType::UpdateItem => "UPDATE_ITEM",
            ActionType::DeleteItem => "DELETE_ITEM",
            ActionType::ImportItems => "IMPORT_ITEMS",
            ActionType::Dispatch => "DISPATCH",
            ActionType::ToggleCondition => "TOGGLE_CONDITION",
            ActionType::ChangeDeliveryType => "CHANGE_DELIVERY_TYPE",
            ActionType::ChangeStatus => "CHANGE_STATUS",
            ActionType::ReturnDelivery => "RETURN_DELIVERY",
            ActionType::ConfirmDelivery => "CONFIRM_DELIVERY",
        };
        f.write_str(s)
    }
}
