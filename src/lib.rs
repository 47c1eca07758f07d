// ==========================================
// DLVery 库存配送协同系统 - 核心库
// ==========================================
// 范围: 库存/配送一致性、配送单生命周期、配送优先级与分组
// 技术栈: Rust + SQLite（集合文档存储）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 集合存储层 - 文档存储契约与 SQLite 实现
pub mod store;

// 数据仓储层 - 文档映射与写操作构建
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配与实时视图
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ConditionField, ConditionType, DeliveryStatus, UserRole};

// 领域实体
pub use domain::{
    ActionLog, ActionType, AgentSession, Delivery, InventoryItem, InventoryItemInput, User,
    Verification, VerificationInput,
};

// 引擎
pub use engine::{ConsistencyEngine, DeliveryLifecycle, DeliveryPrioritizer, DeliveryQueue};

// API
pub use api::{AgentApi, DeliveryConsoleApi, InventoryApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "DLVery 库存配送协同系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(APP_NAME.starts_with("DLVery"));
    }
}
