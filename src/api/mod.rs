// ==========================================
// DLVery 库存配送协同系统 - API 层
// ==========================================
// 职责: 库存组控制台、全部配送单控制台、配送员控制台的业务接口
// ==========================================

pub mod agent_api;
pub mod delivery_console_api;
pub mod error;
pub mod inventory_api;
pub mod validator;

// 重导出核心类型
pub use agent_api::AgentApi;
pub use delivery_console_api::DeliveryConsoleApi;
pub use error::{ApiError, ApiResult};
pub use inventory_api::InventoryApi;
