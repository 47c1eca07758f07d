// ==========================================
// DLVery 库存配送协同系统 - 签收凭证领域模型
// ==========================================
// 集合: verifications
// 红线: 仅在确认签收时创建；创建后不可变，核心不删除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub id: String,
    pub delivery_id: String,
    pub agent: String,
    pub customer_name: String,
    pub signature: String, // 签名图片载荷（data URL）
    pub verified_at: DateTime<Utc>,
}

/// 签收确认输入
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationInput {
    pub customer_name: String,
    pub signature: String,
}

impl VerificationInput {
    pub fn new(customer_name: &str, signature: &str) -> Self {
        Self {
            customer_name: customer_name.to_string(),
            signature: signature.to_string(),
        }
    }
}
