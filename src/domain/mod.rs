// ==========================================
// DLVery 库存配送协同系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod delivery;
pub mod inventory;
pub mod session;
pub mod types;
pub mod user;
pub mod verification;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use delivery::{Delivery, DeliveryFilter};
pub use inventory::{ImportSummary, InventoryFilter, InventoryItem, InventoryItemInput};
pub use session::AgentSession;
pub use types::{ConditionField, ConditionType, DeliveryStatus, UserRole};
pub use user::User;
pub use verification::{Verification, VerificationInput};
