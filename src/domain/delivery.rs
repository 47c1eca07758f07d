// ==========================================
// DLVery 库存配送协同系统 - 配送单领域模型
// ==========================================
// 集合: deliveries
// 生命周期: 库存派送时创建 → 状态流转 → 终态(delivered/returned)时删除
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ConditionType, DeliveryStatus};

// ==========================================
// Delivery - 配送单
// ==========================================
// 冗余字段: type 与 (perishable, damaged) 同时存储，读方兼容两者
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub id: String,
    pub sku: String,
    pub name: String,  // 派送时的 category 快照
    pub agent: String, // 配送员邮箱
    pub quantity: i64,
    pub status: DeliveryStatus,
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub perishable: bool,
    pub damaged: bool,
    pub delivery_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub delivered_quantity: i64,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Delivery {
    /// 是否视为易腐（标记或类型任一命中）
    pub fn is_perishable(&self) -> bool {
        self.perishable || self.condition_type == ConditionType::Perishable
    }

    /// 是否视为破损（标记或类型任一命中）
    pub fn is_damaged(&self) -> bool {
        self.damaged || self.condition_type == ConditionType::Damaged
    }

    /// 按标记重新推导的类型
    pub fn derived_type(&self) -> ConditionType {
        ConditionType::from_flags(self.perishable, self.damaged)
    }
}

// ==========================================
// DeliveryFilter - 全部配送单列表筛选
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeliveryFilter {
    /// sku 包含（不区分大小写）
    pub sku: Option<String>,
    /// 配送员邮箱包含（去空白、不区分大小写）
    pub agent: Option<String>,
}

impl DeliveryFilter {
    pub fn matches(&self, delivery: &Delivery) -> bool {
        let sku_match = match self.sku.as_deref() {
            None | Some("") => true,
            Some(term) => delivery.sku.to_lowercase().contains(&term.to_lowercase()),
        };
        let agent_match = match self.agent.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => delivery
                .agent
                .trim()
                .to_lowercase()
                .contains(&term.to_lowercase()),
        };
        sku_match && agent_match
    }
}
