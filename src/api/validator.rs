// ==========================================
// DLVery 库存配送协同系统 - 输入校验器
// ==========================================
// 职责: 库存录入/导入、登录邮箱、配送员选择的输入校验
// 约束: 校验在任何写入之前完成；通过后返回规范化（去空白）的输入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::inventory::InventoryItemInput;
use crate::domain::user::User;

/// 校验库存录入
///
/// # 返回
/// - Ok(input): sku/category 已去首尾空白
/// - Err(ValidationError): 缺 sku、缺 category 或数量 < 1
pub fn validate_item_input(input: &InventoryItemInput) -> ApiResult<InventoryItemInput> {
    let sku = input.sku.trim();
    if sku.is_empty() {
        return Err(ApiError::ValidationError("sku required".to_string()));
    }
    let category = input.category.trim();
    if category.is_empty() {
        return Err(ApiError::ValidationError("category required".to_string()));
    }
    if input.quantity < 1 {
        return Err(ApiError::ValidationError("invalid quantity".to_string()));
    }

    Ok(InventoryItemInput {
        sku: sku.to_string(),
        category: category.to_string(),
        ..input.clone()
    })
}

/// 校验配送员是否在可选名单内
pub fn validate_agent(agent: &str, agents: &[User]) -> ApiResult<String> {
    let agent = agent.trim();
    if agent.is_empty() {
        return Err(ApiError::ValidationError("agent required".to_string()));
    }
    if agents.iter().any(|u| u.email == agent) {
        Ok(agent.to_string())
    } else {
        Err(ApiError::ValidationError(format!("unknown agent: {}", agent)))
    }
}
