// ==========================================
// DLVery 库存配送协同系统 - 用户领域模型
// ==========================================
// 集合: users（只读，用于解析可选配送员）
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::UserRole;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// 原始角色字符串（未知角色原样保留）
    pub role: String,
}

impl User {
    pub fn role(&self) -> Option<UserRole> {
        UserRole::parse(&self.role)
    }
}
