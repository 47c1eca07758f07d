// ==========================================
// DLVery 库存配送协同系统 - 领域类型定义
// ==========================================
// 依据: 数据模型 - Delivery.status / Delivery.type / User.role
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 配送状态 (Delivery Status)
// ==========================================
// 终态(delivered/returned)到达后文档即被删除，不做归档
// 序列化格式: snake_case (与存储文档一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,   // 待发
    InTransit, // 在途
    Delivered, // 已签收（终态）
    Returned,  // 已退回（终态）
    DoorLock,  // 门锁/无人（人工介入）
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl DeliveryStatus {
    /// 从存储值解析；未知值返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(DeliveryStatus::Pending),
            "in_transit" => Some(DeliveryStatus::InTransit),
            "delivered" => Some(DeliveryStatus::Delivered),
            "returned" => Some(DeliveryStatus::Returned),
            "door_lock" => Some(DeliveryStatus::DoorLock),
            _ => None,
        }
    }

    /// 转换为存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::InTransit => "in_transit",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Returned => "returned",
            DeliveryStatus::DoorLock => "door_lock",
        }
    }

    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Returned)
    }
}

// ==========================================
// 货品状况类型 (Condition Type)
// ==========================================
// 红线: type 恒由 (perishable, damaged) 推导，优先级 perishable > damaged > normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Normal,
    Perishable,
    Damaged,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

impl ConditionType {
    /// 由两个状况标记推导类型（全系统唯一推导入口）
    pub fn from_flags(perishable: bool, damaged: bool) -> Self {
        if perishable {
            ConditionType::Perishable
        } else if damaged {
            ConditionType::Damaged
        } else {
            ConditionType::Normal
        }
    }

    /// 类型对应的标记 (perishable, damaged)，二者互斥
    pub fn flags(&self) -> (bool, bool) {
        match self {
            ConditionType::Normal => (false, false),
            ConditionType::Perishable => (true, false),
            ConditionType::Damaged => (false, true),
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(ConditionType::Normal),
            "perishable" => Some(ConditionType::Perishable),
            "damaged" => Some(ConditionType::Damaged),
            _ => None,
        }
    }

    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConditionType::Normal => "normal",
            ConditionType::Perishable => "perishable",
            ConditionType::Damaged => "damaged",
        }
    }

    /// 展示文案
    pub fn label(&self) -> &'static str {
        match self {
            ConditionType::Normal => "Normal",
            ConditionType::Perishable => "Perishable",
            ConditionType::Damaged => "Damaged",
        }
    }
}

// ==========================================
// 状况标记字段 (Condition Field)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionField {
    Perishable,
    Damaged,
}

impl ConditionField {
    /// 文档字段名
    pub fn field_name(&self) -> &'static str {
        match self {
            ConditionField::Perishable => "perishable",
            ConditionField::Damaged => "damaged",
        }
    }
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

// ==========================================
// 用户角色 (User Role)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    InvTeam, // 库存组
    DLTeam,  // 配送员
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::InvTeam => "InvTeam",
            UserRole::DLTeam => "DLTeam",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "InvTeam" => Some(UserRole::InvTeam),
            "DLTeam" => Some(UserRole::DLTeam),
            _ => None,
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
